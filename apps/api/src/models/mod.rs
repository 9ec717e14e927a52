pub mod job;
pub mod resume;

pub use job::JobRecord;
pub use resume::{ResumeRecord, SkillsSource};

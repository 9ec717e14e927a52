// Ingestion: uploaded files → normalized text → structured resume and job records.

pub mod jobs;
pub mod resume;
pub mod text;

pub use jobs::parse_postings;
pub use resume::parse_resume;
pub use text::read_upload;

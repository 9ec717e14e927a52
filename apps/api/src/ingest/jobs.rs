//! Job posting ingestion: a text dump of postings separated by `====`.
//!
//! Title and company come from heuristics tuned for text copied out of LinkedIn and
//! Indeed pages. Postings where either cannot be found are dropped.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::models::JobRecord;
use crate::skills::{extract_skills, SkillVocabulary};

pub const POSTING_SEPARATOR: &str = "====";

const TITLE_KEYWORDS: &[&str] = &[
    "engineer", "developer", "software", "full stack", "full-stack", "backend", "front end",
    "frontend", "platform", "embedded", "mlops",
];

const NOISE_SUBSTRINGS: &[&str] = &[
    "profile insights",
    "here’s how the job qualifications align with your profile",
    "job details",
    "full job description",
    "benefits",
    "pulled from the full job description",
    "show more",
    "apply",
    "easy apply",
    "promoted by hirer",
    "responses managed off linkedin",
    "matches your job preferences",
    "&nbsp;",
];

const META_SUBSTRINGS: &[&str] = &["reposted", "clicked apply", "applicants"];

const JOB_TYPES: &[&str] = &["full-time", "part-time", "contract", "permanent", "internship", "temporary"];

const REGION_CODES: &[&str] = &[
    "ON", "QC", "BC", "AB", "MB", "NS", "NB", "NL", "PE", "SK", "YT", "NT", "NU",
];

const TITLE_SCAN_LINES: usize = 25;
const COMPANY_SCAN_LINES: usize = 60;
const COMPANY_AFTER_TITLE_LINES: usize = 11;

static RATING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d(\.\d)?$").expect("rating pattern is valid"));
static COMPANY_TAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s{2,}|\s·\s").expect("company tail pattern is valid"));

/// Splits a postings dump into job records. Ids are 1-based chunk positions, so they
/// stay stable when a chunk in the middle is dropped.
pub fn parse_postings(raw: &str, vocabulary: &SkillVocabulary) -> Vec<JobRecord> {
    let mut jobs = Vec::new();
    for (idx, chunk) in raw.split(POSTING_SEPARATOR).enumerate() {
        if chunk.trim().is_empty() {
            continue;
        }

        let (Some(title), Some(company)) = extract_title_company(chunk) else {
            debug!("Skipping posting {} without title/company", idx + 1);
            continue;
        };

        jobs.push(JobRecord {
            id: (idx + 1) as u32,
            title,
            company,
            skills: extract_skills(chunk, vocabulary),
            text: chunk.to_string(),
        });
    }
    jobs
}

pub fn extract_title_company(posting: &str) -> (Option<String>, Option<String>) {
    let lines: Vec<&str> = posting
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    match lines.first() {
        None => return (None, None),
        Some(first) if first.to_lowercase() == "profile insights" => return (None, None),
        Some(_) => {}
    }

    let filtered: Vec<&str> = lines.into_iter().filter(|l| !is_noise_line(l)).collect();

    let title = filtered
        .iter()
        .find(|l| l.to_lowercase().contains("- job post"))
        .or_else(|| filtered.iter().take(TITLE_SCAN_LINES).find(|l| title_like(l)))
        .copied();

    let company = company_from_save_line(&filtered)
        .or_else(|| company_from_dot_line(&filtered))
        .or_else(|| title.and_then(|t| company_after_title(&filtered, t)));

    (title.map(String::from), company)
}

/// "Save <title> at <company>".
fn company_from_save_line(lines: &[&str]) -> Option<String> {
    lines
        .iter()
        .take(COMPANY_SCAN_LINES)
        .filter(|l| l.to_lowercase().starts_with("save "))
        .find_map(|l| l.split_once(" at "))
        .and_then(|(_, rest)| COMPANY_TAIL.split(rest.trim()).next())
        .map(|company| company.trim().to_string())
        .filter(|company| !company.is_empty())
}

/// "Company · Location".
fn company_from_dot_line(lines: &[&str]) -> Option<String> {
    lines.iter().take(COMPANY_SCAN_LINES).find_map(|line| {
        let (left, _) = line.split_once('·')?;
        let left = left.trim();
        let usable = !left.is_empty()
            && !is_location_or_meta(line)
            && !is_job_type(left)
            && !is_location_or_meta(left)
            && !is_rating(left);
        usable.then(|| left.to_string())
    })
}

/// Indeed layout: the first clean line after the title.
fn company_after_title(lines: &[&str], title: &str) -> Option<String> {
    let position = lines.iter().position(|l| *l == title)?;
    lines
        .iter()
        .skip(position + 1)
        .take(COMPANY_AFTER_TITLE_LINES)
        .find(|l| !is_rating(l) && !is_location_or_meta(l) && !is_job_type(l))
        .map(|l| l.to_string())
}

fn is_noise_line(line: &str) -> bool {
    let lowered = line.to_lowercase();
    NOISE_SUBSTRINGS.iter().any(|s| lowered.contains(s))
}

fn is_rating(line: &str) -> bool {
    line.to_lowercase().contains("out of 5 stars") || RATING.is_match(line.trim())
}

fn is_job_type(line: &str) -> bool {
    JOB_TYPES.contains(&line.to_lowercase().as_str())
}

fn is_location_or_meta(line: &str) -> bool {
    let lowered = line.to_lowercase();
    if line.contains('·') && META_SUBSTRINGS.iter().any(|s| lowered.contains(s)) {
        return true;
    }
    if REGION_CODES.iter().any(|code| line.contains(code))
        && (line.contains('·') || line.contains(',') || line.contains('('))
    {
        return true;
    }
    ["hybrid", "remote", "on-site"].iter().any(|s| lowered.contains(s))
}

fn title_like(line: &str) -> bool {
    let lowered = line.to_lowercase();
    let len = line.chars().count();
    !is_noise_line(line)
        && !META_SUBSTRINGS.iter().any(|s| lowered.contains(s))
        && !lowered.starts_with("save ")
        && (4..=90).contains(&len)
        && TITLE_KEYWORDS.iter().any(|k| lowered.contains(k))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINKEDIN: &str = "Northwind Labs · Toronto\nSenior Backend Engineer\nToronto, ON · Reposted 2 days ago · 40 applicants\nHybrid\nFull-time\nEasy Apply\nWe build Python services on AWS with Docker.";

    const INDEED: &str = "Machine Learning Developer - job post\n4.1\nContoso Analytics\nOttawa, ON\nPermanent\nYou will train PyTorch models and ship them with Kubernetes.";

    #[test]
    fn test_linkedin_layout() {
        let (title, company) = extract_title_company(LINKEDIN);
        assert_eq!(title.as_deref(), Some("Senior Backend Engineer"));
        assert_eq!(company.as_deref(), Some("Northwind Labs"));
    }

    #[test]
    fn test_indeed_layout_skips_rating() {
        let (title, company) = extract_title_company(INDEED);
        assert_eq!(title.as_deref(), Some("Machine Learning Developer - job post"));
        assert_eq!(company.as_deref(), Some("Contoso Analytics"));
    }

    #[test]
    fn test_save_line_gives_company() {
        let posting = "Platform Engineer\nSave Platform Engineer at Fabrikam  Inc extra\nRust and Go";
        let (_, company) = extract_title_company(posting);
        assert_eq!(company.as_deref(), Some("Fabrikam"));
    }

    #[test]
    fn test_profile_insights_chunk_is_ignored() {
        assert_eq!(
            extract_title_company("Profile insights\nSoftware Engineer\nAcme"),
            (None, None)
        );
    }

    #[test]
    fn test_parse_postings_keeps_chunk_positions() {
        let raw = format!("{LINKEDIN}\n====\nno title here\n====\n\n====\n{INDEED}");
        let jobs = parse_postings(&raw, &SkillVocabulary::standard());
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].id, 1);
        assert_eq!(jobs[1].id, 4);
        assert_eq!(jobs[0].skills, vec!["AWS", "Docker", "Python"]);
        assert!(jobs[1].skills.contains(&"PyTorch".to_string()));
        assert!(jobs[1].skills.contains(&"Kubernetes".to_string()));
    }

    #[test]
    fn test_helpers() {
        assert!(is_rating("4.5"));
        assert!(is_rating("3.9 out of 5 stars"));
        assert!(!is_rating("45"));
        assert!(is_job_type("Contract"));
        assert!(is_location_or_meta("Remote"));
        assert!(!title_like("Save Software Engineer at Acme"));
    }
}

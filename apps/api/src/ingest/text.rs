//! Raw text handling shared by resume and posting ingestion.

use std::path::Path;

use crate::errors::AppError;

/// Unifies line endings, drops `&nbsp;` and tabs, trims every line, collapses internal
/// whitespace and keeps at most one blank line in a row.
pub fn normalize_text(raw: &str) -> String {
    let unified = raw
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace("&nbsp;", " ")
        .replace('\t', " ");

    let mut lines: Vec<String> = Vec::new();
    let mut blank_run = 0;
    for line in unified.split('\n') {
        let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        lines.push(line);
    }

    lines.join("\n").trim().to_string()
}

/// Decodes an uploaded file: PDFs through `pdf-extract`, anything else as UTF-8.
pub fn read_upload(file_name: &str, bytes: &[u8]) -> Result<String, AppError> {
    let is_pdf = Path::new(file_name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

    if is_pdf {
        pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| AppError::Ingest(format!("could not extract text from '{file_name}': {e}")))
    } else {
        String::from_utf8(bytes.to_vec())
            .map_err(|_| AppError::Ingest(format!("'{file_name}' is not valid UTF-8 text")))
    }
}

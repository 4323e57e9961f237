use crate::error::{AppError, Result};
use std::path::Path;
use tracing::warn;

/// One row of a training or evaluation dataset.
///
/// Column order matches the ticket export format:
/// `title,description,customer_email,category,subcategory,tags,attachments`.
#[derive(Debug, Clone)]
pub struct DatasetRecord {
    pub title: String,
    pub description: String,
    pub customer_email: String,
    pub category: String,
    pub sub_category: String,
    pub tags: String,
    pub attachments: String,
}

/// Read a CSV dataset from disk.
///
/// An optional header row (first cell `title`) is skipped. Rows without at
/// least the five leading columns are dropped with a warning; callers decide
/// whether the surviving rows are enough to work with.
pub fn read_dataset(path: &Path) -> Result<Vec<DatasetRecord>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| AppError::DatasetNotFound(format!("{}: {}", path.display(), e)))?;

    let mut records = Vec::new();
    let mut skipped = 0usize;

    for (line_no, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let fields = split_csv_line(line);

        if line_no == 0 && fields.first().map(|f| f.trim().eq_ignore_ascii_case("title")) == Some(true)
        {
            continue;
        }

        if fields.len() < 5 {
            skipped += 1;
            continue;
        }

        let get = |idx: usize| fields.get(idx).map(|s| s.trim().to_string()).unwrap_or_default();

        records.push(DatasetRecord {
            title: get(0),
            description: get(1),
            customer_email: get(2),
            category: get(3),
            sub_category: get(4),
            tags: get(5),
            attachments: get(6),
        });
    }

    if skipped > 0 {
        warn!(
            path = %path.display(),
            skipped = skipped,
            "Dropped malformed dataset rows"
        );
    }

    Ok(records)
}

/// Split one CSV line, honoring double-quoted fields and `""` escapes
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.is_empty() => in_quotes = true,
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);

    fields
}

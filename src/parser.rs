use thiserror::Error;

/// Minimum number of whitespace-separated fields in a usable access log line.
pub const MIN_FIELDS: usize = 7;

const IP_FIELD: usize = 2;
const STATUS_FIELD: usize = 4;
const URL_FIELD: usize = 6;

/// The fields of one access log line that the analyzer cares about.
///
/// Borrowed from the line it was parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessRecord<'a> {
    pub ip: &'a str,
    pub status_code: &'a str,
    pub url: &'a str,
}

/// Errors that make a single log line unusable
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected at least {required} fields, found {found}")]
    TooFewFields { found: usize, required: usize },

    #[error("field '{field}' (position {index}) is missing")]
    MissingField { field: &'static str, index: usize },
}

/// Return the code part of a status field.
///
/// Squid writes the result as `TAG/CODE` (e.g. `TCP_DENIED/403`); anything after the
/// last `/` is the code. A field without `/` is already a bare code.
pub fn extract_status_code(field: &str) -> &str {
    match field.rfind('/') {
        Some(pos) => &field[pos + 1..],
        None => field,
    }
}

/// Split a log line on whitespace and pick out client IP, status code and URL.
///
/// Fields are taken by position (0-based):
///   2 = client IP, 4 = status (`TAG/CODE` or a bare code), 6 = URL
///
/// Only the field count is validated; the contents of each field are taken as-is.
pub fn parse_log_line(line: &str) -> Result<AccessRecord<'_>, ParseError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < MIN_FIELDS {
        return Err(ParseError::TooFewFields {
            found: fields.len(),
            required: MIN_FIELDS,
        });
    }

    let ip = field_at(&fields, IP_FIELD, "client_ip")?;
    let status = field_at(&fields, STATUS_FIELD, "status")?;
    let url = field_at(&fields, URL_FIELD, "url")?;

    Ok(AccessRecord {
        ip,
        status_code: extract_status_code(status),
        url,
    })
}

fn field_at<'a>(
    fields: &[&'a str],
    index: usize,
    field: &'static str,
) -> Result<&'a str, ParseError> {
    fields
        .get(index)
        .copied()
        .ok_or(ParseError::MissingField { field, index })
}

// ─── Unit Tests ──────────────────────────────────────────────────────────────

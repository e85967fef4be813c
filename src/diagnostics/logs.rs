//! Error log tail.

use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::host::FileReader;

use super::types::LogTail;

/// Lines returned when `lines` is absent, empty or not a number.
pub const DEFAULT_LINES: i64 = 50;

/// Characters PHP's `rtrim` strips by default.
const RTRIM_CHARS: &[char] = &[' ', '\t', '\n', '\r', '\0', '\x0B'];

/// Interpret the `lines` query parameter.
pub fn parse_lines(raw: Option<&str>) -> i64 {
    match raw {
        None | Some("") => DEFAULT_LINES,
        Some(value) => value.parse().unwrap_or(DEFAULT_LINES),
    }
}

/// Last `count` lines of `content`, each right-trimmed, oldest first.
///
/// A zero or negative `count` yields nothing.
pub fn tail_lines(content: &[u8], count: i64) -> Vec<String> {
    let Ok(count) = usize::try_from(count) else {
        return Vec::new();
    };
    if count == 0 {
        return Vec::new();
    }

    let text = String::from_utf8_lossy(content);
    let lines: Vec<&str> = text.split_inclusive('\n').collect();
    let start = lines.len().saturating_sub(count);

    lines[start..]
        .iter()
        .map(|line| line.trim_end_matches(RTRIM_CHARS).to_string())
        .collect()
}

/// Tail the first readable log among `candidates`.
pub async fn tail_error_log(files: &dyn FileReader, candidates: &[PathBuf], count: i64) -> LogTail {
    for path in candidates {
        match files.read(path).await {
            Ok(content) => {
                debug!("Tailing {} ({} bytes)", path.display(), content.len());
                return LogTail {
                    tail: tail_lines(&content, count),
                    source: Some(path.display().to_string()),
                };
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No log at {}", path.display());
            }
            Err(e) => {
                warn!("Skipping unreadable log {}: {}", path.display(), e);
            }
        }
    }

    LogTail {
        tail: Vec::new(),
        source: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::mock::{MockHost, MOCK_DEBUG_LOG, MOCK_ERROR_LOG};
    use pretty_assertions::assert_eq;

    fn ten_lines() -> String {
        (1..=10).map(|i| format!("line {}  \t\n", i)).collect()
    }

    fn candidates() -> Vec<PathBuf> {
        vec![PathBuf::from(MOCK_DEBUG_LOG), PathBuf::from(MOCK_ERROR_LOG)]
    }

    #[test]
    fn lines_param_defaults() {
        assert_eq!(parse_lines(None), 50);
        assert_eq!(parse_lines(Some("")), 50);
        assert_eq!(parse_lines(Some("abc")), 50);
        assert_eq!(parse_lines(Some("3")), 3);
        assert_eq!(parse_lines(Some("0")), 0);
        assert_eq!(parse_lines(Some("-4")), -4);
    }

    #[test]
    fn keeps_last_lines_in_order() {
        let tail = tail_lines(ten_lines().as_bytes(), 3);
        assert_eq!(tail, vec!["line 8", "line 9", "line 10"]);
    }

    #[test]
    fn count_larger_than_file_returns_everything() {
        assert_eq!(tail_lines(b"a\nb\n", 50), vec!["a", "b"]);
    }

    #[test]
    fn zero_or_negative_count_is_empty() {
        assert!(tail_lines(ten_lines().as_bytes(), 0).is_empty());
        assert!(tail_lines(ten_lines().as_bytes(), -5).is_empty());
    }

    #[test]
    fn handles_crlf_blank_lines_and_missing_final_newline() {
        let tail = tail_lines(b"first\r\n\r\nlast", 10);
        assert_eq!(tail, vec!["first", "", "last"]);
    }

    #[test]
    fn empty_file_has_no_lines() {
        assert!(tail_lines(b"", 10).is_empty());
    }

    #[tokio::test]
    async fn prefers_debug_log() {
        let host = MockHost::new()
            .with_file(MOCK_DEBUG_LOG, ten_lines())
            .with_file(MOCK_ERROR_LOG, "php error\n");

        let tail = tail_error_log(&host, &candidates(), 3).await;
        assert_eq!(tail.source.as_deref(), Some(MOCK_DEBUG_LOG));
        assert_eq!(tail.tail, vec!["line 8", "line 9", "line 10"]);
    }

    #[tokio::test]
    async fn falls_back_to_error_log() {
        let host = MockHost::new().with_file(MOCK_ERROR_LOG, "PHP Fatal error: boom\n");

        let tail = tail_error_log(&host, &candidates(), 50).await;
        assert_eq!(
            tail,
            LogTail {
                tail: vec!["PHP Fatal error: boom".to_string()],
                source: Some(MOCK_ERROR_LOG.to_string()),
            }
        );
    }

    #[tokio::test]
    async fn no_log_gives_null_source() {
        let host = MockHost::new();
        let tail = tail_error_log(&host, &candidates(), 50).await;
        assert_eq!(
            tail,
            LogTail {
                tail: Vec::new(),
                source: None,
            }
        );
    }
}

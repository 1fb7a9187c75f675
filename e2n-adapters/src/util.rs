//! Helpers shared by the built-in adapters.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, SecondsFormat, Utc};

use crate::error::AdapterError;

/// Files directly in `dir` matching `pattern`, sorted by path.
pub fn glob_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, AdapterError> {
    let full = dir.join(pattern);
    let full = full.to_string_lossy();
    let paths = glob::glob(&full)
        .map_err(|e| AdapterError::parse(format!("invalid glob pattern {pattern}: {e}")))?;
    let mut files: Vec<PathBuf> = paths.filter_map(Result::ok).filter(|p| p.is_file()).collect();
    files.sort();
    Ok(files)
}

pub fn read_lossy(path: &Path) -> Result<String, AdapterError> {
    let bytes = std::fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Current UTC time as an RFC 3339 string.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Midnight UTC of `date` as an RFC 3339 string.
pub fn date_iso(date: NaiveDate) -> String {
    date.and_time(chrono::NaiveTime::MIN)
        .and_utc()
        .to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Text of every `*.pdf` in `dir`, paired with the file name.
///
/// Pre-extracted `*.txt` files are used when no PDF is present.
pub fn pdf_texts(dir: &Path) -> Result<Vec<(String, PathBuf, String)>, AdapterError> {
    let mut out = Vec::new();
    for path in glob_files(dir, "*.pdf")? {
        let text = pdf_extract::extract_text(&path)
            .map_err(|e| {
                AdapterError::parse(format!(
                    "failed to extract text from {}: {e}",
                    path.display()
                ))
            })?;
        out.push((file_name(&path), path, text));
    }
    if out.is_empty() {
        for path in glob_files(dir, "*.txt")? {
            let text = read_lossy(&path)?;
            out.push((file_name(&path), path, text));
        }
    }
    Ok(out)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Centre frequency of a UHF channel (21..=60) in Hz.
pub fn uhf_channel_to_hz(channel: u32) -> Option<u64> {
    (21..=60)
        .contains(&channel)
        .then(|| (306 + 8 * u64::from(channel)) * 1_000_000)
}

/// Two-digit channel numbers in a text cell, in order of appearance.
pub fn two_digit_numbers(text: &str) -> Vec<u32> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;
    while i + 1 < bytes.len() {
        if bytes[i].is_ascii_digit() && bytes[i + 1].is_ascii_digit() {
            out.push(u32::from(bytes[i] - b'0') * 10 + u32::from(bytes[i + 1] - b'0'));
            i += 2;
        } else {
            i += 1;
        }
    }
    out
}

/// Slice a fixed-width column by character position.
pub fn column(line: &str, start: usize, end: Option<usize>) -> String {
    let chars = line.chars().skip(start);
    let text: String = match end {
        Some(end) => chars.take(end.saturating_sub(start)).collect(),
        None => chars.collect(),
    };
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uhf_channels() {
        assert_eq!(uhf_channel_to_hz(21), Some(474_000_000));
        assert_eq!(uhf_channel_to_hz(60), Some(786_000_000));
        assert_eq!(uhf_channel_to_hz(20), None);
        assert_eq!(uhf_channel_to_hz(61), None);
    }

    #[test]
    fn test_date_iso() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        assert_eq!(date_iso(date), "2025-01-15T00:00:00+00:00");
    }

    #[test]
    fn test_pdf_texts_falls_back_to_text_files() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("list.txt"), "Stand: 01.02.2025").unwrap();
        let texts = pdf_texts(dir.path()).unwrap();
        assert_eq!(texts.len(), 1);
        assert_eq!(texts[0].0, "list.txt");
        assert!(texts[0].2.contains("Stand"));
    }

    #[test]
    fn test_two_digit_numbers() {
        assert_eq!(two_digit_numbers("23, 27 / 5 123"), vec![23, 27, 12]);
        assert!(two_digit_numbers("-").is_empty());
    }

    #[test]
    fn test_column() {
        let line = "BW          ARD         Stuttgart";
        assert_eq!(column(line, 0, Some(12)), "BW");
        assert_eq!(column(line, 12, Some(24)), "ARD");
        assert_eq!(column(line, 24, None), "Stuttgart");
        assert_eq!(column("short", 30, Some(40)), "");
    }
}

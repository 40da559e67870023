use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::logbook::Logbook;
use crate::models::LogEntry;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("data directory not found")]
    NoDataDir,
}

/// Get the path to the local log file, creating its directory.
pub fn default_log_path() -> Result<PathBuf, StorageError> {
    let dir = dirs::data_local_dir()
        .ok_or(StorageError::NoDataDir)?
        .join("cyclecast");
    fs::create_dir_all(&dir)?;
    Ok(dir.join("logs.json"))
}

/// Load log entries from a JSON array. A missing file is an empty log.
pub fn load(path: &Path) -> Result<Vec<LogEntry>, StorageError> {
    let raw = match fs::read(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "no log file yet, starting empty");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };
    let entries: Vec<LogEntry> = serde_json::from_slice(&raw)?;
    tracing::debug!(path = %path.display(), count = entries.len(), "loaded logs");
    Ok(entries)
}

pub fn save(path: &Path, logbook: &Logbook) -> Result<(), StorageError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, export(logbook)?)?;
    tracing::debug!(path = %path.display(), count = logbook.len(), "saved logs");
    Ok(())
}

/// Pretty JSON of every entry, in date order.
pub fn export(logbook: &Logbook) -> Result<String, StorageError> {
    let entries: Vec<&LogEntry> = logbook.entries().collect();
    Ok(serde_json::to_string_pretty(&entries)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LogKind;
    use chrono::NaiveDate;

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let entries = load(&dir.path().join("nope.json")).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("logs.json");
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

        let mut book = Logbook::new();
        book.upsert(date, LogKind::Period, "heavy").unwrap();
        book.upsert(date, LogKind::Cramps, "light").unwrap();
        save(&path, &book).unwrap();

        let loaded = Logbook::from_entries(load(&path).unwrap());
        assert_eq!(
            loaded.entries().collect::<Vec<_>>(),
            book.entries().collect::<Vec<_>>()
        );
    }

    #[test]
    fn reads_upstream_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs.json");
        fs::write(
            &path,
            r#"[
                {"date": "2024-03-01", "type": "period", "value": "medium"},
                {"date": "2024-03-02", "type": "headache", "value": null},
                {"date": "2024-03-03", "type": "cramps"}
            ]"#,
        )
        .unwrap();

        let entries = load(&path).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1].kind, LogKind::Other("headache".into()));
        assert_eq!(entries[2].value, None);
    }

    #[test]
    fn malformed_date_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs.json");
        fs::write(&path, r#"[{"date": "2024-13-01", "type": "period"}]"#).unwrap();
        assert!(matches!(load(&path), Err(StorageError::Serialization(_))));
    }
}

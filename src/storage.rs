use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

use thiserror::Error;

use crate::domain::{Planner, PlannerHeader, SCHEMA_VERSION};
use crate::error::ValidationError;

const NOTIFICATIONS_MARKER: &str = "\n=== NOTIFICATIONS ===\n";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse TOML header: {0}")]
    TomlDecode(#[from] toml::de::Error),
    #[error("failed to encode TOML header: {0}")]
    TomlEncode(#[from] toml::ser::Error),
    #[error("failed to parse notification on line {line}: {source}")]
    JsonDecode {
        line: usize,
        source: serde_json::Error,
    },
    #[error("failed to encode notification: {0}")]
    JsonEncode(serde_json::Error),
    #[error("unsupported planner schema version {0}")]
    Schema(u32),
    #[error("invalid record in planner file: {0}")]
    Invalid(#[from] ValidationError),
}

pub fn load_planner(path: &Path) -> Result<Planner, StorageError> {
    let raw = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            log::debug!("event=planner_missing path={}", path.display());
            return Ok(Planner::new());
        }
        Err(err) => return Err(StorageError::Io(err)),
    };

    if raw.trim().is_empty() {
        return Ok(Planner::new());
    }

    let (header_blob, notifications_blob) =
        if let Some((header, notifications)) = raw.split_once(NOTIFICATIONS_MARKER) {
            (header, notifications)
        } else {
            (raw.as_str(), "")
        };

    let header: PlannerHeader = toml::from_str(header_blob)?;
    if header.schema_version > SCHEMA_VERSION {
        return Err(StorageError::Schema(header.schema_version));
    }

    let mut notifications = Vec::new();
    for (index, line) in notifications_blob.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let notification = serde_json::from_str(line).map_err(|source| StorageError::JsonDecode {
            line: index + 1,
            source,
        })?;
        notifications.push(notification);
    }

    let planner = Planner {
        header,
        notifications,
    };
    planner.validate()?;
    log::info!(
        "event=planner_loaded path={} sessions={} tasks={} notifications={}",
        path.display(),
        planner.header.sessions.len(),
        planner.header.tasks.len(),
        planner.notifications.len()
    );
    Ok(planner)
}

/// Refuses to write a planner that would not load back.
pub fn save_planner(path: &Path, planner: &Planner) -> Result<(), StorageError> {
    planner.validate()?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let header = toml::to_string_pretty(&planner.header)?;
    let mut file = fs::File::create(path)?;
    file.write_all(header.as_bytes())?;
    file.write_all(NOTIFICATIONS_MARKER.as_bytes())?;

    for notification in &planner.notifications {
        let line = serde_json::to_string(notification).map_err(StorageError::JsonEncode)?;
        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")?;
    }

    log::debug!("event=planner_saved path={}", path.display());
    Ok(())
}

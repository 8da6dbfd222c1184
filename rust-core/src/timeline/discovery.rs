//! Finding the recordings that belong to one acquisition session
//!
//! The acquisition software starts a new file periodically and names each one
//! `<prefix><YYYYMMDD_HHMMSS>.log`. Every file sharing the prefix in the same
//! directory is part of the session.

use crate::error::{Result, TraceError};
use chrono::NaiveDateTime;
use log::debug;
use std::path::{Path, PathBuf};

/// Extension of raw recordings
pub const RECORDING_EXTENSION: &str = "log";

/// Layout of the timestamp embedded in recording names
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Width of the embedded timestamp in characters
pub const TIMESTAMP_LEN: usize = 15;

/// A recording found on disk with its acquisition timestamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    pub timestamp: NaiveDateTime,
}

/// Strategy for listing the files of a session
pub trait FileDiscovery {
    /// Human readable description of what is matched, for status messages
    fn pattern(&self, dir: &Path, prefix: &str) -> String;

    /// Session files under `dir` whose names start with `prefix`,
    /// sorted by timestamp ascending
    fn discover(&self, dir: &Path, prefix: &str) -> Result<Vec<DiscoveredFile>>;
}

/// Matches `<prefix>*<timestamp>.<extension>` in a single directory
#[derive(Debug, Clone)]
pub struct TimestampSuffixDiscovery {
    extension: String,
}

impl Default for TimestampSuffixDiscovery {
    fn default() -> Self {
        Self::new(RECORDING_EXTENSION)
    }
}

impl TimestampSuffixDiscovery {
    pub fn new(extension: &str) -> Self {
        Self {
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Name stem of `file_name` if it carries this strategy's extension
    fn stem<'a>(&self, file_name: &'a str) -> Option<&'a str> {
        file_name
            .strip_suffix(self.extension.as_str())?
            .strip_suffix('.')
    }
}

impl FileDiscovery for TimestampSuffixDiscovery {
    fn pattern(&self, dir: &Path, prefix: &str) -> String {
        dir.join(format!("{prefix}*.{}", self.extension))
            .display()
            .to_string()
    }

    fn discover(&self, dir: &Path, prefix: &str) -> Result<Vec<DiscoveredFile>> {
        let entries = std::fs::read_dir(dir).map_err(|e| TraceError::io(dir, e))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| TraceError::io(dir, e))?;
            if let Ok(name) = entry.file_name().into_string() {
                names.push(name);
            }
        }
        // read_dir order is unspecified; fix it so equal timestamps tie-break by name
        names.sort();

        let mut found: Vec<DiscoveredFile> = names
            .into_iter()
            .filter(|name| name.starts_with(prefix))
            .filter_map(|name| {
                let stem = self.stem(&name)?;
                match parse_timestamp(stem) {
                    Some(timestamp) => Some(DiscoveredFile {
                        path: dir.join(&name),
                        timestamp,
                    }),
                    None => {
                        debug!("Skipping {name}: no {TIMESTAMP_FORMAT} suffix");
                        None
                    }
                }
            })
            .collect();

        found.sort_by_key(|file| file.timestamp);
        Ok(found)
    }
}

/// Parse the fixed-width timestamp at the end of a file stem
pub fn parse_timestamp(stem: &str) -> Option<NaiveDateTime> {
    let split = stem.len().checked_sub(TIMESTAMP_LEN)?;
    let suffix = stem.get(split..)?;
    NaiveDateTime::parse_from_str(suffix, TIMESTAMP_FORMAT).ok()
}

/// Session prefix of a reference recording: its name with the timestamp
/// and extension removed
pub fn session_prefix(reference: &Path) -> Option<String> {
    let stem = reference.file_stem()?.to_str()?;
    parse_timestamp(stem)?;
    Some(stem[..stem.len() - TIMESTAMP_LEN].to_string())
}

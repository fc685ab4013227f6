//! Transcript export
//!
//! Plain text is one `[HH:MM:SS] speaker: text` block per entry, each
//! followed by a blank line. Files ending in `.json` get the entries as a
//! JSON array instead.

use super::types::TranscriptEntry;
use crate::{CallbotError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub fn format_transcript(entries: &[TranscriptEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&format!(
            "[{}] {}: {}\n\n",
            entry.clock_time(),
            entry.speaker.label(),
            entry.text
        ));
    }
    out
}

pub fn export_json(entries: &[TranscriptEntry]) -> Result<String> {
    Ok(serde_json::to_string_pretty(entries)?)
}

/// Write the transcript to `path`, creating parent directories as needed.
pub fn export_to_file(entries: &[TranscriptEntry], path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| CallbotError::Export(format!("{}: {}", parent.display(), e)))?;
        }
    }

    let body = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => export_json(entries)?,
        _ => format_transcript(entries),
    };

    fs::write(path, body).map_err(|e| CallbotError::Export(format!("{}: {}", path.display(), e)))?;

    info!("Exported {} transcript entries to {}", entries.len(), path.display());
    Ok(path.to_path_buf())
}

/// File name for an export taken now, e.g. `conversation_20240301_090507.txt`
pub fn default_export_name() -> String {
    format!("conversation_{}.txt", chrono::Local::now().format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::Speaker;
    use chrono::{Local, TimeZone};

    fn entry(speaker: Speaker, text: &str, sec: u32) -> TranscriptEntry {
        TranscriptEntry::new(speaker, text)
            .with_timestamp(Local.with_ymd_and_hms(2024, 3, 1, 10, 0, sec).unwrap())
    }

    #[test]
    fn test_two_entries_two_blocks() {
        let entries = vec![
            entry(Speaker::Bot, "Hello, I'm calling about rice.", 1),
            entry(Speaker::User, "I'm interested", 2),
        ];

        let text = format_transcript(&entries);
        assert_eq!(
            text,
            "[10:00:01] Bot: Hello, I'm calling about rice.\n\n[10:00:02] User: I'm interested\n\n"
        );

        let blocks: Vec<_> = text.split("\n\n").filter(|b| !b.is_empty()).collect();
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn test_empty_transcript() {
        assert_eq!(format_transcript(&[]), "");
    }

    #[test]
    fn test_export_to_file_text_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let entries = vec![entry(Speaker::Bot, "近江ブレンド米", 5)];

        let txt = export_to_file(&entries, dir.path().join("logs/out.txt")).unwrap();
        let written = std::fs::read_to_string(txt).unwrap();
        assert_eq!(written, "[10:00:05] Bot: 近江ブレンド米\n\n");

        let json = export_to_file(&entries, dir.path().join("out.json")).unwrap();
        let parsed: Vec<TranscriptEntry> =
            serde_json::from_str(&std::fs::read_to_string(json).unwrap()).unwrap();
        assert_eq!(parsed, entries);
    }

    #[test]
    fn test_default_export_name() {
        let name = default_export_name();
        assert!(name.starts_with("conversation_"));
        assert!(name.ends_with(".txt"));
    }
}

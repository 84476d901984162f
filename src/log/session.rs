/// Session log
///
/// Every state change made to the image is recorded with:
/// - Sequence number
/// - Timestamp
/// - Operation name
/// - Parameter summary
///
/// The log can be exported as human-readable text or JSON.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;

/// A single log entry representing one operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Sequential operation number (1-based)
    pub sequence: usize,
    pub timestamp: DateTime<Local>,
    pub operation: String,
    pub description: String,
}

impl LogEntry {
    pub fn to_text(&self) -> String {
        format!(
            "[{:03}] {} | {} | {}",
            self.sequence,
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.operation,
            self.description,
        )
    }
}

/// Ordered record of what was done to the image during this session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionLog {
    pub session_id: String,
    pub session_start: DateTime<Local>,
    /// Where the current image came from (file path or capture device)
    pub source: String,
    pub software_version: String,
    pub entries: Vec<LogEntry>,
}

impl SessionLog {
    pub fn new() -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            session_start: Local::now(),
            source: String::new(),
            software_version: env!("CARGO_PKG_VERSION").to_string(),
            entries: Vec::new(),
        }
    }

    pub fn set_source(&mut self, source: &str) {
        self.source = source.to_string();
    }

    /// Add an operation to the log
    pub fn add_entry(&mut self, operation: &str, description: &str) {
        let seq = self.entries.len() + 1;
        self.entries.push(LogEntry {
            sequence: seq,
            timestamp: Local::now(),
            operation: operation.to_string(),
            description: description.to_string(),
        });
        log::info!("[LOG {:03}] {} — {}", seq, operation, description);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Export as human-readable text
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str("═══════════════════════════════════════════════════════════════\n");
        out.push_str("  Image Channel Viewer Session Log\n");
        out.push_str("═══════════════════════════════════════════════════════════════\n");
        out.push_str(&format!("  Session ID:  {}\n", self.session_id));
        out.push_str(&format!(
            "  Started:     {}\n",
            self.session_start.format("%Y-%m-%d %H:%M:%S")
        ));
        out.push_str(&format!("  Source:      {}\n", self.source));
        out.push_str(&format!("  Software:    channel_viewer v{}\n", self.software_version));
        out.push_str(&format!("  Operations:  {}\n", self.entries.len()));
        out.push_str("───────────────────────────────────────────────────────────────\n\n");

        for entry in &self.entries {
            out.push_str(&entry.to_text());
            out.push('\n');
        }

        out.push_str("\n═══════════════════════════════════════════════════════════════\n");
        out.push_str(&format!(
            "  Log exported: {}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        ));
        out
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn save_text(&self, path: &Path) -> io::Result<()> {
        std::fs::write(path, self.to_text())
    }

    pub fn save_json(&self, path: &Path) -> io::Result<()> {
        let json = self.to_json().map_err(io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Save as JSON when the extension says so, text otherwise
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "json" => self.save_json(path),
            _ => self.save_text(path),
        }
    }
}

impl Default for SessionLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_creation_and_entries() {
        let mut log = SessionLog::new();
        assert!(log.is_empty());

        log.add_entry("Load", "photo.png (640×480)");
        assert_eq!(log.len(), 1);
        assert_eq!(log.entries[0].sequence, 1);
        assert_eq!(log.entries[0].operation, "Load");

        log.add_entry("Effect", "Negative");
        assert_eq!(log.len(), 2);
        assert_eq!(log.entries[1].sequence, 2);
    }

    #[test]
    fn test_text_export() {
        let mut log = SessionLog::new();
        log.set_source("photo.png");
        log.add_entry("Effect", "Border (10 px, rgb[128, 0, 128])");
        let text = log.to_text();
        assert!(text.contains("photo.png"));
        assert!(text.contains("Border (10 px"));
        assert!(text.contains("Operations:  1"));
    }

    #[test]
    fn test_json_roundtrip() {
        let mut log = SessionLog::new();
        log.add_entry("Channel", "Red");
        let json = log.to_json().unwrap();
        let parsed: SessionLog = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.entries.len(), 1);
        assert_eq!(parsed.session_id, log.session_id);
    }

    #[test]
    fn test_save_picks_format_from_extension() {
        let mut log = SessionLog::new();
        log.add_entry("Reset", "back to original");
        let dir = std::env::temp_dir();
        let stem = uuid::Uuid::new_v4().to_string();
        let json_path = dir.join(format!("{}.json", stem));
        let txt_path = dir.join(format!("{}.txt", stem));

        log.save(&json_path).unwrap();
        log.save(&txt_path).unwrap();
        let json = std::fs::read_to_string(&json_path).unwrap();
        let txt = std::fs::read_to_string(&txt_path).unwrap();
        assert!(json.trim_start().starts_with('{'));
        assert!(txt.contains("Session Log"));

        let _ = std::fs::remove_file(json_path);
        let _ = std::fs::remove_file(txt_path);
    }
}

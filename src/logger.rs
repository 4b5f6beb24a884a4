use std::fs::{File, OpenOptions};
use std::io::Write;

use chrono::Utc;
use serde_json::{Value, json};
use tracing::warn;

use crate::diff::diff_tables;
use crate::snapshot::Snapshot;
use crate::types::{DonneeTable, Table};

pub enum MessageLogMode {
    /// Every poll with its raw responses and parsed tables.
    Full,
    /// First poll in full, then only DONNEE indices that changed.
    Diffed,
}

/// Appends NDJSON lines describing commands and polls to a file.
pub(crate) struct MessageLogger {
    mode: MessageLogMode,
    file: File,
    previous: Option<(DonneeTable, DonneeTable)>,
}

impl MessageLogger {
    pub fn new(mode: MessageLogMode, path: &str) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            mode,
            file,
            previous: None,
        })
    }

    pub fn log_command(&mut self, action: &str, body: &Value) {
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "cmd",
            "action": action,
            "body": body,
        });
        self.write_line(&entry);
    }

    pub fn log_poll(&mut self, snapshot: &Snapshot) {
        let tables = (snapshot.super_table.clone(), snapshot.accueil_table.clone());

        let entry = match (&self.mode, &self.previous) {
            (MessageLogMode::Diffed, Some((prev_super, prev_accueil))) => {
                let mut changes = Vec::new();
                for (table, prev, curr) in [
                    (Table::Super, prev_super, &snapshot.super_table),
                    (Table::Accueil, prev_accueil, &snapshot.accueil_table),
                ] {
                    for (index, old, new) in diff_tables(prev, curr) {
                        changes.push(json!({
                            "table": table,
                            "index": index,
                            "old": old,
                            "new": new,
                        }));
                    }
                }
                json!({
                    "ts": snapshot.taken_at.to_rfc3339(),
                    "dir": "poll",
                    "changes": changes,
                })
            }
            _ => json!({
                "ts": snapshot.taken_at.to_rfc3339(),
                "dir": "poll",
                "full": true,
                "super_raw": snapshot.super_raw,
                "accueil_raw": snapshot.accueil_raw,
                "reg_raw": snapshot.reg_raw,
                "super": snapshot.super_table,
                "accueil": snapshot.accueil_table,
                "regulator": snapshot.regulator,
            }),
        };

        self.write_line(&entry);
        self.previous = Some(tables);
    }

    fn write_line(&mut self, entry: &Value) {
        if let Ok(line) = serde_json::to_string(entry)
            && let Err(e) = writeln!(self.file, "{line}")
        {
            warn!("failed to write log entry: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldIndexMap;
    use std::io::Read;
    use tempfile::NamedTempFile;

    fn snap(super_raw: &str) -> Snapshot {
        Snapshot::assemble(
            super_raw.into(),
            "DONNEE16=0".into(),
            "28.0,CHAUD".into(),
            FieldIndexMap::default(),
        )
    }

    fn read_lines(path: &str) -> Vec<Value> {
        let mut contents = String::new();
        std::fs::File::open(path)
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        contents
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn log_command_writes_ndjson() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_str().unwrap();
        let mut logger = MessageLogger::new(MessageLogMode::Full, path).unwrap();
        logger.log_command("set_mode", &json!({"mode": "CHAUD"}));

        let lines = read_lines(path);
        assert_eq!(lines[0]["dir"], "cmd");
        assert_eq!(lines[0]["action"], "set_mode");
        assert_eq!(lines[0]["body"]["mode"], "CHAUD");
        assert!(lines[0]["ts"].as_str().is_some());
    }

    #[test]
    fn full_mode_logs_raw_and_tables() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_str().unwrap();
        let mut logger = MessageLogger::new(MessageLogMode::Full, path).unwrap();
        logger.log_poll(&snap("DONNEE5=26.5"));
        logger.log_poll(&snap("DONNEE5=26.5"));

        let lines = read_lines(path);
        assert_eq!(lines.len(), 2);
        for line in &lines {
            assert_eq!(line["full"], true);
            assert_eq!(line["super_raw"], "DONNEE5=26.5");
            assert_eq!(line["super"]["5"], 26.5);
            assert_eq!(line["regulator"]["mode"], "Chaud");
        }
    }

    #[test]
    fn diffed_mode_logs_full_first_then_changes() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_str().unwrap();
        let mut logger = MessageLogger::new(MessageLogMode::Diffed, path).unwrap();
        logger.log_poll(&snap("DONNEE5=26.5 DONNEE6=27"));
        logger.log_poll(&snap("DONNEE5=26.8 DONNEE6=27"));

        let lines = read_lines(path);
        assert_eq!(lines[0]["full"], true);
        let changes = lines[1]["changes"].as_array().unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0]["table"], "super");
        assert_eq!(changes[0]["index"], 5);
        assert_eq!(changes[0]["old"], 26.5);
        assert_eq!(changes[0]["new"], 26.8);
    }

    #[test]
    fn diffed_mode_no_changes_logs_empty_array() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_str().unwrap();
        let mut logger = MessageLogger::new(MessageLogMode::Diffed, path).unwrap();
        logger.log_poll(&snap("DONNEE5=26.5"));
        logger.log_poll(&snap("DONNEE5=26.5"));

        let lines = read_lines(path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["changes"].as_array().unwrap().len(), 0);
    }
}

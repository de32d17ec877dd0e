use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::diff::Diff;
use crate::models::{Phase, RunReport, Subject};
use crate::utils::safe_filename;

pub const NO_CHANGES: &str = "NO CHANGES";

/// Pretty JSON with 4-space indentation. `serde_json::Map` is ordered by key.
pub fn to_snapshot_json(value: &Value) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    Ok(String::from_utf8(buf)?)
}

/// SnapshotStore writes every per-run artifact: backups, pre/post state and changelogs.
/// All files from one run share the same timestamp.
pub struct SnapshotStore {
    backup_dir: PathBuf,
    pre_dir: PathBuf,
    post_dir: PathBuf,
    changelog_dir: PathBuf,
    timestamp: String,
}

impl SnapshotStore {
    pub fn new(config: &Config, timestamp: &str) -> Self {
        Self {
            backup_dir: PathBuf::from(&config.backup_dir),
            pre_dir: PathBuf::from(&config.pre_dir),
            post_dir: PathBuf::from(&config.post_dir),
            changelog_dir: PathBuf::from(&config.changelog_dir),
            timestamp: timestamp.to_string(),
        }
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn backup_path(&self, alias: &str) -> PathBuf {
        self.backup_dir
            .join(format!("{}_Backup_{}.cfg", safe_filename(alias), self.timestamp))
    }

    pub fn snapshot_path(&self, alias: &str, phase: Phase, subject: Subject) -> PathBuf {
        let dir = match phase {
            Phase::Pre => &self.pre_dir,
            Phase::Post => &self.post_dir,
        };
        dir.join(format!(
            "{}_{}_{}_{}.json",
            safe_filename(alias),
            phase.label(),
            subject.file_label(),
            self.timestamp
        ))
    }

    pub fn changelog_path(&self, alias: &str, label: &str) -> PathBuf {
        self.changelog_dir.join(format!(
            "{}_C3PL_Conversion_{}_{}.txt",
            safe_filename(alias),
            label,
            self.timestamp
        ))
    }

    pub fn summary_path(&self) -> PathBuf {
        self.changelog_dir
            .join(format!("C3PL_Summary_{}.json", self.timestamp))
    }

    /// Save the raw running configuration before anything is changed
    pub async fn save_backup(&self, alias: &str, config: &str) -> Result<PathBuf> {
        let path = self.backup_path(alias);
        write_file(&path, config).await?;
        tracing::info!("{}: backup saved to {}", alias, path.display());
        Ok(path)
    }

    pub async fn save_snapshot(&self, alias: &str, phase: Phase, subject: Subject, state: &Value) -> Result<PathBuf> {
        let path = self.snapshot_path(alias, phase, subject);
        write_file(&path, &to_snapshot_json(state)?).await?;
        tracing::info!(
            "{}: stored {} {} state in {}",
            alias,
            phase.label().to_lowercase(),
            subject.title(),
            path.display()
        );
        Ok(path)
    }

    /// Write a structural diff, or NO CHANGES when the states are identical
    pub async fn save_diff(&self, alias: &str, subject: Subject, diff: &Diff) -> Result<PathBuf> {
        let body = if diff.is_empty() {
            NO_CHANGES.to_string()
        } else {
            diff.to_string()
        };
        self.save_changelog(alias, subject.file_label(), &body).await
    }

    pub async fn save_changelog(&self, alias: &str, label: &str, body: &str) -> Result<PathBuf> {
        let path = self.changelog_path(alias, label);
        let body = if body.is_empty() { NO_CHANGES } else { body };
        write_file(&path, body).await?;
        Ok(path)
    }

    pub async fn save_summary(&self, report: &RunReport) -> Result<PathBuf> {
        let path = self.summary_path();
        let value = serde_json::to_value(report)?;
        write_file(&path, &to_snapshot_json(&value)?).await?;
        Ok(path)
    }
}

async fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

//! `.env`-style key/value file
//!
//! The file is owned by the caller and handed to whoever needs it. Changes go
//! through [`EnvFile::update`], which reads the whole file, applies the edit
//! to an owned copy, and swaps the new content in with a single rename.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;

pub const AGENT_ID_KEY: &str = "LETTA_AGENT_ID";
pub const API_KEY_KEY: &str = "LETTA_API_KEY";
pub const DEFAULT_ENV_FILE: &str = ".env.local";

/// Whole-file contents of an env file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvContents {
    text: String,
}

impl EnvContents {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// First non-empty `KEY=value`, trimmed.
    pub fn get(&self, key: &str) -> Option<String> {
        let pattern = Regex::new(&format!("{}=(.+)", regex::escape(key))).ok()?;
        pattern
            .captures(&self.text)
            .map(|caps| caps[1].trim().to_string())
            .filter(|value| !value.is_empty())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.text.contains(&format!("{key}="))
    }

    /// Replace every `KEY=...` with the new value, or append a line.
    pub fn set(&mut self, key: &str, value: &str) {
        if self.contains_key(key) {
            let needle = format!("{key}=");
            let line = format!("{key}={value}");
            let mut replaced = String::with_capacity(self.text.len());
            let mut rest = self.text.as_str();

            // Everything from the key to the line break is replaced; a CRLF
            // break is kept intact
            while let Some(pos) = rest.find(&needle) {
                replaced.push_str(&rest[..pos]);
                replaced.push_str(&line);
                let tail = &rest[pos..];
                rest = &tail[tail.find(['\r', '\n']).unwrap_or(tail.len())..];
            }
            replaced.push_str(rest);
            self.text = replaced;
        } else {
            self.text.push_str(&format!("\n{key}={value}\n"));
        }
    }

    /// Append `KEY=value` unless the key is already present.
    pub fn set_if_absent(&mut self, key: &str, value: &str) {
        if !self.contains_key(key) {
            self.text.push_str(&format!("{key}={value}\n"));
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnvFile {
    path: PathBuf,
}

impl EnvFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `.env.local` inside `dir`
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(DEFAULT_ENV_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read the file. A missing file reads as empty.
    pub fn load(&self) -> Result<EnvContents> {
        if !self.exists() {
            return Ok(EnvContents::default());
        }

        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        Ok(EnvContents::new(text))
    }

    /// Read, edit, and write back the whole file as one step.
    ///
    /// Nothing is written if `edit` fails. The new content lands in a
    /// sibling temp file first and replaces the original with a rename.
    pub fn update<T>(&self, edit: impl FnOnce(&mut EnvContents) -> Result<T>) -> Result<T> {
        let mut contents = self.load()?;
        let result = edit(&mut contents)?;

        let tmp_path = self.tmp_path();
        fs::write(&tmp_path, contents.as_str())
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;

        Ok(result)
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| DEFAULT_ENV_FILE.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_get_trims_and_skips_empty() {
        let contents = EnvContents::new("LETTA_AGENT_ID= agent-123 \nOTHER=1\n");
        assert_eq!(contents.get(AGENT_ID_KEY).as_deref(), Some("agent-123"));
        assert_eq!(contents.get("MISSING"), None);
        assert_eq!(EnvContents::new("LETTA_AGENT_ID=\n").get(AGENT_ID_KEY), None);
    }

    #[test]
    fn test_set_replaces_every_occurrence() {
        let mut contents =
            EnvContents::new("LETTA_AGENT_ID=old\nA=1\n# LETTA_AGENT_ID=older\n");
        contents.set(AGENT_ID_KEY, "agent-$1");
        assert_eq!(
            contents.as_str(),
            "LETTA_AGENT_ID=agent-$1\nA=1\n# LETTA_AGENT_ID=agent-$1\n"
        );
    }

    #[test]
    fn test_set_keeps_crlf_line_endings() {
        let mut contents = EnvContents::new("LETTA_AGENT_ID=old\r\nA=1\r\n");
        contents.set(AGENT_ID_KEY, "new");
        assert_eq!(contents.as_str(), "LETTA_AGENT_ID=new\r\nA=1\r\n");
        assert_eq!(contents.get(AGENT_ID_KEY).as_deref(), Some("new"));
    }

    #[test]
    fn test_set_appends_when_missing() {
        let mut contents = EnvContents::new("A=1");
        contents.set(AGENT_ID_KEY, "agent-9");
        contents.set_if_absent(API_KEY_KEY, "sk-1");
        contents.set_if_absent(API_KEY_KEY, "sk-2");
        assert_eq!(
            contents.as_str(),
            "A=1\nLETTA_AGENT_ID=agent-9\nLETTA_API_KEY=sk-1\n"
        );
    }

    #[test]
    fn test_update_round_trip() {
        let dir = TempDir::new().unwrap();
        let env = EnvFile::in_dir(dir.path());
        assert!(!env.exists());
        assert_eq!(env.load().unwrap(), EnvContents::default());

        env.update(|contents| {
            contents.set(AGENT_ID_KEY, "agent-1");
            Ok(())
        })
        .unwrap();

        assert!(env.exists());
        assert_eq!(
            fs::read_to_string(env.path()).unwrap(),
            "\nLETTA_AGENT_ID=agent-1\n"
        );
        assert!(!dir.path().join(".env.local.tmp").exists());
    }

    #[test]
    fn test_failed_edit_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let env = EnvFile::in_dir(dir.path());
        fs::write(env.path(), "KEEP=1\n").unwrap();

        let result: Result<()> = env.update(|contents| {
            contents.set("KEEP", "2");
            Err(anyhow::anyhow!("abort"))
        });

        assert!(result.is_err());
        assert_eq!(fs::read_to_string(env.path()).unwrap(), "KEEP=1\n");
    }
}

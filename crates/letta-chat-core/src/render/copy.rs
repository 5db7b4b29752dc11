//! Copy-to-clipboard affordance
//!
//! The acknowledgement is kept as timestamps rather than spawned timers.
//! Every successful copy turns the button to "Copied!" and schedules its own
//! revert [`COPY_ACK_DURATION`] later. Reverts are never cancelled, so an
//! earlier copy's revert also clears the state set by a later copy.

use std::io::Write;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use tracing::debug;

pub const COPY_ACK_DURATION: Duration = Duration::from_secs(2);

pub trait Clipboard {
    fn write_text(&mut self, text: &str) -> Result<()>;
}

/// Platform clipboard reached through the usual command-line helpers
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

const CLIPBOARD_COMMANDS: &[(&str, &[&str])] = &[
    ("pbcopy", &[]),
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("clip", &[]),
];

impl Clipboard for SystemClipboard {
    fn write_text(&mut self, text: &str) -> Result<()> {
        for (program, args) in CLIPBOARD_COMMANDS {
            let Ok(mut child) = Command::new(program)
                .args(*args)
                .stdin(Stdio::piped())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()
            else {
                continue;
            };

            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(text.as_bytes())?;
            }

            if child.wait()?.success() {
                return Ok(());
            }
        }

        Err(anyhow!("no clipboard command available"))
    }
}

#[derive(Debug, Default, Clone)]
pub struct CopyButton {
    /// Times of successful copies whose revert may still matter
    copies: Vec<Instant>,
}

impl CopyButton {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `content` to the clipboard exactly as given. Returns whether
    /// the copy went through; failures only show up in the debug log.
    pub fn copy(&mut self, clipboard: &mut impl Clipboard, content: &str, now: Instant) -> bool {
        match clipboard.write_text(content) {
            Ok(()) => {
                // A revert that already fired can't clear anything from now on
                self.copies.retain(|at| *at + COPY_ACK_DURATION > now);
                self.copies.push(now);
                true
            }
            Err(e) => {
                debug!(error = %e, "clipboard write failed");
                false
            }
        }
    }

    /// True when the latest copy at or before `now` has not been followed
    /// by any pending revert firing.
    pub fn is_acknowledged(&self, now: Instant) -> bool {
        let Some(last) = self.copies.iter().filter(|at| **at <= now).max() else {
            return false;
        };
        !self
            .copies
            .iter()
            .map(|at| *at + COPY_ACK_DURATION)
            .any(|revert| revert > *last && revert <= now)
    }

    pub fn title(&self, now: Instant) -> &'static str {
        if self.is_acknowledged(now) {
            "Copied!"
        } else {
            "Copy message"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingClipboard {
        writes: Vec<String>,
    }

    impl Clipboard for RecordingClipboard {
        fn write_text(&mut self, text: &str) -> Result<()> {
            self.writes.push(text.to_string());
            Ok(())
        }
    }

    struct DeniedClipboard;

    impl Clipboard for DeniedClipboard {
        fn write_text(&mut self, _text: &str) -> Result<()> {
            Err(anyhow!("permission denied"))
        }
    }

    #[test]
    fn test_copy_writes_raw_content_and_acknowledges_for_two_seconds() {
        let raw = "Hello\\n\\nimport os\\ndef f():\\n  pass";
        let mut clipboard = RecordingClipboard::default();
        let mut button = CopyButton::new();
        let start = Instant::now();

        assert_eq!(button.title(start), "Copy message");
        assert!(button.copy(&mut clipboard, raw, start));
        assert_eq!(clipboard.writes, vec![raw.to_string()]);

        assert!(button.is_acknowledged(start));
        assert_eq!(button.title(start + Duration::from_millis(1999)), "Copied!");
        assert!(!button.is_acknowledged(start + COPY_ACK_DURATION));
        assert_eq!(button.title(start + Duration::from_secs(3)), "Copy message");
    }

    #[test]
    fn test_first_revert_clears_a_later_copy() {
        let mut clipboard = RecordingClipboard::default();
        let mut button = CopyButton::new();
        let start = Instant::now();

        assert!(button.copy(&mut clipboard, "a", start));
        assert!(button.copy(&mut clipboard, "a", start + Duration::from_millis(1500)));

        assert!(button.is_acknowledged(start + Duration::from_millis(1900)));
        assert!(!button.is_acknowledged(start + Duration::from_millis(2000)));
        assert!(!button.is_acknowledged(start + Duration::from_millis(2500)));
        assert!(!button.is_acknowledged(start + Duration::from_millis(3600)));
    }

    #[test]
    fn test_copy_after_revert_starts_fresh() {
        let mut clipboard = RecordingClipboard::default();
        let mut button = CopyButton::new();
        let start = Instant::now();

        button.copy(&mut clipboard, "a", start);
        button.copy(&mut clipboard, "b", start + Duration::from_millis(2500));

        assert!(button.is_acknowledged(start + Duration::from_millis(3000)));
        assert!(button.is_acknowledged(start + Duration::from_millis(4400)));
        assert!(!button.is_acknowledged(start + Duration::from_millis(4500)));
        assert_eq!(clipboard.writes, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_failed_copy_does_not_flip_state() {
        let mut button = CopyButton::new();
        let now = Instant::now();

        assert!(!button.copy(&mut DeniedClipboard, "text", now));
        assert!(!button.is_acknowledged(now));
    }
}

use std::time::{Duration, Instant};

use crate::error::{InspectorError, Result};

/// Destination for copied coordinate text.
pub trait TextClipboard {
    fn copy_text(&mut self, text: &str) -> Result<()>;
}

/// System clipboard. Initialisation failure is remembered and reported on
/// every copy instead of at startup.
pub struct ArboardClipboard {
    inner: std::result::Result<arboard::Clipboard, String>,
}

impl ArboardClipboard {
    pub fn new() -> Self {
        let inner = arboard::Clipboard::new().map_err(|err| err.to_string());
        if let Err(err) = &inner {
            log::warn!("system clipboard unavailable: {err}");
        }
        Self { inner }
    }
}

impl Default for ArboardClipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl TextClipboard for ArboardClipboard {
    fn copy_text(&mut self, text: &str) -> Result<()> {
        match &mut self.inner {
            Ok(clipboard) => clipboard
                .set_text(text.to_owned())
                .map_err(|err| InspectorError::Clipboard(err.to_string())),
            Err(reason) => Err(InspectorError::Clipboard(reason.clone())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CopyOutcome {
    Copied,
    NotCopied,
}

/// Short-lived status message shown after a copy attempt.
#[derive(Clone, Debug, PartialEq)]
pub struct CopyNotice {
    pub outcome: CopyOutcome,
    pub label: String,
    pub expires_at: Instant,
}

impl CopyNotice {
    pub fn new(
        outcome: CopyOutcome,
        label: impl Into<String>,
        now: Instant,
        ttl: Duration,
    ) -> Self {
        Self {
            outcome,
            label: label.into(),
            expires_at: now + ttl,
        }
    }

    pub fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }

    pub fn message(&self) -> String {
        match self.outcome {
            CopyOutcome::Copied => format!("Copied {}", self.label),
            CopyOutcome::NotCopied => format!("Could not copy {}", self.label),
        }
    }
}

/// Copies once; failures are logged and turned into a `NotCopied` notice.
pub fn copy_with_notice(
    clipboard: &mut dyn TextClipboard,
    text: &str,
    label: &str,
    now: Instant,
    ttl: Duration,
) -> CopyNotice {
    let outcome = match clipboard.copy_text(text) {
        Ok(()) => CopyOutcome::Copied,
        Err(err) => {
            log::warn!("copy of {label} failed: {err}");
            CopyOutcome::NotCopied
        }
    };
    CopyNotice::new(outcome, label, now, ttl)
}


#[cfg(test)]
mod tests {
    use super::testing::MemoryClipboard;
    use super::*;

    #[test]
    fn successful_copy_reports_copied() {
        let mut clipboard = MemoryClipboard::default();
        let now = Instant::now();
        let notice =
            copy_with_notice(&mut clipboard, "1, 2", "center", now, Duration::from_secs(2));
        assert_eq!(notice.outcome, CopyOutcome::Copied);
        assert_eq!(clipboard.contents.as_deref(), Some("1, 2"));
        assert_eq!(notice.message(), "Copied center");
    }

    #[test]
    fn failure_is_not_retried() {
        let mut clipboard = MemoryClipboard {
            fail: true,
            ..Default::default()
        };
        let notice = copy_with_notice(
            &mut clipboard,
            "1, 2",
            "center",
            Instant::now(),
            Duration::from_secs(2),
        );
        assert_eq!(notice.outcome, CopyOutcome::NotCopied);
        assert_eq!(clipboard.attempts, 1);
    }

    #[test]
    fn notice_expires() {
        let now = Instant::now();
        let notice = CopyNotice::new(CopyOutcome::Copied, "bbox", now, Duration::from_millis(500));
        assert!(notice.is_live(now));
        assert!(!notice.is_live(now + Duration::from_millis(500)));
    }
}

//! User-visible feedback events
//!
//! Controllers publish these on a broadcast channel; the UI layer turns
//! them into snackbars.

use serde::Serialize;

/// Default capacity of a feedback channel
pub const FEEDBACK_CHANNEL_CAPACITY: usize = 64;

/// Something the user should be told about
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Feedback {
    /// Settings were written to the device
    Saved {
        /// Settings domain
        domain: &'static str,
    },
    /// Settings could not be written; they remain in memory
    SaveFailed {
        /// Settings domain
        domain: &'static str,
        /// Failure description
        reason: String,
    },
    /// An edit was refused and nothing changed
    Rejected {
        /// Settings domain
        domain: &'static str,
        /// Why the edit was refused
        reason: String,
    },
    /// A language pack finished installing
    DownloadCompleted {
        /// Language code
        lang: String,
    },
    /// A language pack failed; the language was enabled offline
    DownloadFailed {
        /// Language code
        lang: String,
        /// Failure description, if the keyboard gave one
        error: Option<String>,
    },
}

impl Feedback {
    /// Whether this reports a problem
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Feedback::SaveFailed { .. } | Feedback::Rejected { .. } | Feedback::DownloadFailed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(!Feedback::Saved { domain: "typing_settings" }.is_error());
        assert!(Feedback::Rejected { domain: "language_settings", reason: "x".into() }.is_error());
        assert!(!Feedback::DownloadCompleted { lang: "hi".into() }.is_error());
    }

    #[test]
    fn test_serializes_with_kind_tag() {
        let value = serde_json::to_value(Feedback::DownloadFailed {
            lang: "de".into(),
            error: None,
        })
        .unwrap();
        assert_eq!(value["kind"], "download_failed");
        assert_eq!(value["lang"], "de");
    }
}

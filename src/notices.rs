//! User-facing text for feedback events

use app_state::Feedback;
use i18n::{LanguageCatalog, Messages};

fn domain_label(messages: &Messages, domain: &str) -> String {
    let id = format!("domain-{domain}");
    if messages.has_message(&id) {
        messages.format(&id, &[])
    } else {
        domain.to_string()
    }
}

/// Render a feedback event as a short localized notice
pub fn describe(feedback: &Feedback, messages: &Messages, catalog: &LanguageCatalog) -> String {
    match feedback {
        Feedback::Saved { domain } => {
            let label = domain_label(messages, domain);
            messages.format("saved", &[("domain", label.as_str())])
        }
        Feedback::SaveFailed { domain, reason } => {
            let label = domain_label(messages, domain);
            messages.format("save-failed", &[("domain", label.as_str()), ("reason", reason.as_str())])
        }
        Feedback::Rejected { reason, .. } => messages.format("rejected", &[("reason", reason.as_str())]),
        Feedback::DownloadCompleted { lang } => {
            messages.format("download-completed", &[("lang", catalog.display_name(lang))])
        }
        Feedback::DownloadFailed { lang, .. } => {
            messages.format("download-failed", &[("lang", catalog.display_name(lang))])
        }
    }
}

//! Localized feedback messages
//!
//! Message text lives in Fluent resources embedded in the binary. The
//! locale is negotiated from the user's preferred languages, with English
//! as the final fallback.

use fluent::{FluentArgs, FluentBundle, FluentResource};
use fluent_langneg::{negotiate_languages, NegotiationStrategy};
use thiserror::Error;
use unic_langid::LanguageIdentifier;

const DEFAULT_LOCALE: &str = "en";

const RESOURCES: &[(&str, &str)] = &[
    ("en", include_str!("../resources/en.ftl")),
    ("es", include_str!("../resources/es.ftl")),
];

/// Message loading errors
#[derive(Debug, Error)]
pub enum MessageError {
    /// A locale identifier did not parse
    #[error("Invalid locale: {0}")]
    InvalidLocale(String),

    /// An embedded resource is broken
    #[error("Invalid message resource for {locale}: {message}")]
    Resource {
        /// Locale of the resource
        locale: String,
        /// Parser or bundle error
        message: String,
    },
}

/// Result type for message operations
pub type Result<T> = std::result::Result<T, MessageError>;

fn parse_locale(code: &str) -> Result<LanguageIdentifier> {
    code.parse().map_err(|_| MessageError::InvalidLocale(code.to_string()))
}

/// Message bundle for one negotiated locale
pub struct Messages {
    locale: LanguageIdentifier,
    bundle: FluentBundle<FluentResource>,
}

impl Messages {
    /// Build messages for the best match among `preferred` locales
    ///
    /// Unparseable preferences are ignored.
    pub fn new(preferred: &[&str]) -> Result<Self> {
        let requested: Vec<LanguageIdentifier> =
            preferred.iter().filter_map(|code| code.parse().ok()).collect();
        let available = RESOURCES
            .iter()
            .map(|(code, _)| parse_locale(code))
            .collect::<Result<Vec<_>>>()?;
        let default = parse_locale(DEFAULT_LOCALE)?;

        let locale = negotiate_languages(
            &requested,
            &available,
            Some(&default),
            NegotiationStrategy::Lookup,
        )
        .first()
        .map_or_else(|| default.clone(), |l| (*l).clone());

        let source = RESOURCES
            .iter()
            .find(|(code, _)| parse_locale(code).is_ok_and(|l| l == locale))
            .map_or(RESOURCES[0].1, |(_, source)| source);

        let resource = FluentResource::try_new(source.to_string()).map_err(|(_, errors)| {
            MessageError::Resource { locale: locale.to_string(), message: format!("{errors:?}") }
        })?;

        let mut bundle = FluentBundle::new(vec![locale.clone()]);
        bundle.set_use_isolating(false);
        bundle.add_resource(resource).map_err(|errors| MessageError::Resource {
            locale: locale.to_string(),
            message: format!("{errors:?}"),
        })?;

        tracing::debug!(locale = %locale, "loaded messages");
        Ok(Self { locale, bundle })
    }

    /// The negotiated locale
    pub fn locale(&self) -> &LanguageIdentifier {
        &self.locale
    }

    /// Whether a message exists
    pub fn has_message(&self, id: &str) -> bool {
        self.bundle.has_message(id)
    }

    /// Format a message; unknown ids come back unchanged
    pub fn format(&self, id: &str, args: &[(&str, &str)]) -> String {
        let Some(pattern) = self.bundle.get_message(id).and_then(|m| m.value()) else {
            tracing::warn!(id, locale = %self.locale, "missing message");
            return id.to_string();
        };

        let mut fluent_args = FluentArgs::new();
        for (name, value) in args {
            fluent_args.set(*name, *value);
        }

        let mut errors = Vec::new();
        let text = self.bundle.format_pattern(pattern, Some(&fluent_args), &mut errors);
        if !errors.is_empty() {
            tracing::warn!(id, "message formatting errors: {:?}", errors);
        }
        text.into_owned()
    }
}

impl std::fmt::Debug for Messages {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Messages").field("locale", &self.locale).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_english() {
        let messages = Messages::new(&[]).unwrap();
        assert_eq!(messages.locale().to_string(), "en");
        assert_eq!(
            messages.format("download-completed", &[("lang", "Hindi")]),
            "Hindi is ready to use"
        );
    }

    #[test]
    fn test_negotiates_regional_preference() {
        let messages = Messages::new(&["es-MX", "en"]).unwrap();
        assert_eq!(messages.locale().to_string(), "es");
        assert_eq!(messages.format("domain-sound_settings", &[]), "Sonido del teclado");
    }

    #[test]
    fn test_unsupported_locale_falls_back() {
        let messages = Messages::new(&["ja", "not valid!"]).unwrap();
        assert_eq!(messages.locale().to_string(), "en");
    }

    #[test]
    fn test_missing_message_returns_id() {
        let messages = Messages::new(&["en"]).unwrap();
        assert!(!messages.has_message("nope"));
        assert_eq!(messages.format("nope", &[]), "nope");
    }

    #[test]
    fn test_every_locale_has_the_same_messages() {
        let english = Messages::new(&["en"]).unwrap();
        let spanish = Messages::new(&["es"]).unwrap();
        for id in [
            "saved",
            "save-failed",
            "rejected",
            "download-completed",
            "download-failed",
            "domain-typing_settings",
            "domain-emoji_settings",
            "domain-sound_settings",
            "domain-language_settings",
        ] {
            assert!(english.has_message(id), "en missing {id}");
            assert!(spanish.has_message(id), "es missing {id}");
        }
    }
}

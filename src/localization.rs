//! # Localization Module
//!
//! User-facing reply text, kept in a Fluent catalog under `locales/`.
//! The English catalog is compiled into the binary.

use anyhow::{anyhow, Result};
use fluent_bundle::{FluentArgs, FluentBundle, FluentResource, FluentValue};
use unic_langid::LanguageIdentifier;

const EN_MESSAGES: &str = include_str!("../locales/en/main.ftl");

/// Localization manager for pantry replies
pub struct LocalizationManager {
    bundle: FluentBundle<FluentResource>,
}

impl LocalizationManager {
    /// Create a manager with the English catalog loaded
    pub fn new() -> Result<Self> {
        let locale: LanguageIdentifier = "en".parse()?;
        let mut bundle = FluentBundle::new(vec![locale]);
        // Replies are plain text; no bidi isolation marks around arguments
        bundle.set_use_isolating(false);

        let resource = FluentResource::try_new(EN_MESSAGES.to_string())
            .map_err(|(_, errors)| anyhow!("Invalid message catalog: {errors:?}"))?;
        bundle
            .add_resource(resource)
            .map_err(|errors| anyhow!("Duplicate messages in catalog: {errors:?}"))?;

        Ok(Self { bundle })
    }

    /// Get a localized message
    pub fn get_message(&self, key: &str, args: Option<&FluentArgs>) -> String {
        let msg = match self.bundle.get_message(key) {
            Some(msg) => msg,
            None => return format!("Missing translation: {key}"),
        };

        let pattern = match msg.value() {
            Some(pattern) => pattern,
            None => return format!("Missing value for key: {key}"),
        };

        let mut errors = vec![];
        let value = self.bundle.format_pattern(pattern, args, &mut errors);
        if !errors.is_empty() {
            tracing::warn!(key, ?errors, "Message formatted with errors");
        }
        value.into_owned()
    }

    /// Get a localized message with simple string arguments
    pub fn get_message_with_args(&self, key: &str, args: &[(&str, &str)]) -> String {
        let fluent_args = FluentArgs::from_iter(
            args.iter()
                .map(|(k, v)| (*k, FluentValue::from(v.to_string()))),
        );
        self.get_message(key, Some(&fluent_args))
    }
}

thread_local! {
    // FluentBundle is not Sync; each worker thread gets its own copy
    static LOCALIZATION: Option<LocalizationManager> = match LocalizationManager::new() {
        Ok(manager) => Some(manager),
        Err(e) => {
            tracing::error!("Failed to load message catalog: {e:#}");
            None
        }
    };
}

/// Convenience function to get a localized message
pub fn t(key: &str) -> String {
    t_args(key, &[])
}

/// Convenience function to get a localized message with arguments
pub fn t_args(key: &str, args: &[(&str, &str)]) -> String {
    LOCALIZATION.with(|manager| match manager {
        Some(manager) if args.is_empty() => manager.get_message(key, None),
        Some(manager) => manager.get_message_with_args(key, args),
        None => key.to_string(),
    })
}

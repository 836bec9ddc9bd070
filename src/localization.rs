//! # Localization Module
//!
//! Fluent based message lookup. Resources are embedded at compile time and
//! the user's Telegram `language_code` picks the bundle.

use std::collections::HashMap;
use std::sync::OnceLock;

use anyhow::{anyhow, Result};
use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource, FluentValue};
use unic_langid::LanguageIdentifier;

/// Languages with a bundled resource file
pub const SUPPORTED_LANGUAGES: &[&str] = &["en", "bn"];

const FALLBACK_LANGUAGE: &str = "en";

const RESOURCES: &[(&str, &str)] = &[
    ("en", include_str!("../locales/en/main.ftl")),
    ("bn", include_str!("../locales/bn/main.ftl")),
];

/// Localization manager for the bot
pub struct LocalizationManager {
    bundles: HashMap<String, FluentBundle<FluentResource>>,
    default_language: String,
}

impl LocalizationManager {
    /// Create a new localization manager with English as default
    pub fn new() -> Result<Self> {
        Self::with_default_language(FALLBACK_LANGUAGE)
    }

    /// Create a manager whose default is `language` when it is supported
    pub fn with_default_language(language: &str) -> Result<Self> {
        let mut bundles = HashMap::new();
        for (code, source) in RESOURCES {
            let locale: LanguageIdentifier = code.parse()?;
            bundles.insert(code.to_string(), Self::create_bundle(locale, source)?);
        }

        Ok(Self {
            bundles,
            default_language: detect_language(Some(language)).to_string(),
        })
    }

    /// Create a fluent bundle for a specific locale
    fn create_bundle(locale: LanguageIdentifier, source: &str) -> Result<FluentBundle<FluentResource>> {
        let mut bundle = FluentBundle::new_concurrent(vec![locale.clone()]);
        // Bidi isolation marks would end up verbatim in Telegram messages
        bundle.set_use_isolating(false);

        let resource = FluentResource::try_new(source.to_string())
            .map_err(|(_, errors)| anyhow!("invalid ftl for {locale}: {errors:?}"))?;
        bundle
            .add_resource(resource)
            .map_err(|errors| anyhow!("duplicate messages for {locale}: {errors:?}"))?;

        Ok(bundle)
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    /// Pick the bundle language for a Telegram language code
    pub fn language_for<'a>(&'a self, language_code: Option<&str>) -> &'a str {
        if let Some(code) = language_code.map(primary_subtag) {
            if let Some(supported) = SUPPORTED_LANGUAGES.iter().find(|s| **s == code) {
                return supported;
            }
        }
        &self.default_language
    }

    /// Get a localized message in a specific language
    pub fn get_message_in_language(
        &self,
        key: &str,
        language: &str,
        args: Option<&HashMap<&str, &str>>,
    ) -> String {
        let language = self.language_for(Some(language));
        let bundle = match self
            .bundles
            .get(language)
            .or_else(|| self.bundles.get(FALLBACK_LANGUAGE))
        {
            Some(bundle) => bundle,
            None => return format!("Missing translation: {key}"),
        };

        // Fall back to English for keys a translation lacks
        let (bundle, msg) = match bundle.get_message(key) {
            Some(msg) => (bundle, msg),
            None => match self
                .bundles
                .get(FALLBACK_LANGUAGE)
                .and_then(|b| b.get_message(key).map(|m| (b, m)))
            {
                Some(found) => found,
                None => return format!("Missing translation: {key}"),
            },
        };

        let pattern = match msg.value() {
            Some(pattern) => pattern,
            None => return format!("Missing value for key: {key}"),
        };

        let fluent_args = args.map(|args| {
            let mut fluent_args = FluentArgs::new();
            for (name, value) in args {
                fluent_args.set(*name, FluentValue::from(*value));
            }
            fluent_args
        });

        let mut errors = vec![];
        bundle
            .format_pattern(pattern, fluent_args.as_ref(), &mut errors)
            .into_owned()
    }
}

fn primary_subtag(code: &str) -> String {
    code.split(['-', '_'])
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}

/// Map a Telegram language code onto a supported language, English otherwise
pub fn detect_language(language_code: Option<&str>) -> &'static str {
    let code = match language_code {
        Some(code) => primary_subtag(code),
        None => return FALLBACK_LANGUAGE,
    };
    SUPPORTED_LANGUAGES
        .iter()
        .find(|supported| **supported == code)
        .copied()
        .unwrap_or(FALLBACK_LANGUAGE)
}

/// Global localization instance
static LOCALIZATION_MANAGER: OnceLock<LocalizationManager> = OnceLock::new();

/// Initialize the global localization manager with English as default
pub fn init_localization() -> Result<()> {
    init_localization_with_default(FALLBACK_LANGUAGE)
}

/// Initialize the global localization manager; later calls are no-ops
pub fn init_localization_with_default(language: &str) -> Result<()> {
    if LOCALIZATION_MANAGER.get().is_none() {
        let manager = LocalizationManager::with_default_language(language)?;
        let _ = LOCALIZATION_MANAGER.set(manager);
    }
    Ok(())
}

/// Get the global localization manager, initializing it on first use
pub fn get_localization_manager() -> &'static LocalizationManager {
    LOCALIZATION_MANAGER.get_or_init(|| {
        LocalizationManager::new().unwrap_or_else(|e| panic!("embedded locales are invalid: {e}"))
    })
}

/// Convenience function to get a localized message for a user language
pub fn t_lang(key: &str, language_code: Option<&str>) -> String {
    let manager = get_localization_manager();
    let language = manager.language_for(language_code);
    manager.get_message_in_language(key, language, None)
}

/// Convenience function to get a localized message with arguments for a user language
pub fn t_args_lang(key: &str, args: &[(&str, &str)], language_code: Option<&str>) -> String {
    let manager = get_localization_manager();
    let language = manager.language_for(language_code);
    let args_map: HashMap<&str, &str> = args.iter().cloned().collect();
    manager.get_message_in_language(key, language, Some(&args_map))
}

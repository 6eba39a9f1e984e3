//! Language store - Active language and translation lookup.
//!
//! Lookups try the active language, then the default language, then give back the raw
//! key. The catalog is a TOML file with one table per language code:
//!
//! ```toml
//! [en]
//! "coupon.reserved" = "Coupon reserved!"
//!
//! [pt]
//! "coupon.reserved" = "Cupom reservado!"
//! ```

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::{collections::HashMap, path::Path, sync::Arc};

/// Default path of the translation catalog.
pub const DEFAULT_TRANSLATIONS_PATH: &str = "translations.toml";

/// Supported interface languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Portuguese (Brazil)
    Pt,
    /// English (United States)
    En,
    /// Spanish
    Es,
    /// French
    Fr,
    /// German
    De,
    /// Italian
    It,
    /// Chinese (simplified)
    Zh,
    /// Japanese
    Ja,
}

impl Language {
    /// Every supported language.
    pub const ALL: [Self; 8] = [
        Self::Pt,
        Self::En,
        Self::Es,
        Self::Fr,
        Self::De,
        Self::It,
        Self::Zh,
        Self::Ja,
    ];

    /// Two-letter language code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Pt => "pt",
            Self::En => "en",
            Self::Es => "es",
            Self::Fr => "fr",
            Self::De => "de",
            Self::It => "it",
            Self::Zh => "zh",
            Self::Ja => "ja",
        }
    }

    /// BCP-47 locale used for date formatting.
    #[must_use]
    pub const fn locale(self) -> &'static str {
        match self {
            Self::Pt => "pt-BR",
            Self::En => "en-US",
            Self::Es => "es-ES",
            Self::Fr => "fr-FR",
            Self::De => "de-DE",
            Self::It => "it-IT",
            Self::Zh => "zh-CN",
            Self::Ja => "ja-JP",
        }
    }

    /// Parses a language code or locale tag (`"en"`, `"pt-BR"`, `"ja_JP"`).
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        let primary = code
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_lowercase();
        Self::ALL.into_iter().find(|l| l.code() == primary)
    }
}

/// Key → string tables for every language.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tables: HashMap<Language, HashMap<String, String>>,
}

impl Catalog {
    /// Parses a catalog from TOML. Tables for unknown language codes are rejected.
    pub fn parse(contents: &str) -> Result<Self> {
        let raw: HashMap<String, HashMap<String, String>> =
            toml::from_str(contents).map_err(|e| Error::Config {
                message: format!("Failed to parse translation catalog: {e}"),
            })?;

        let mut tables = HashMap::new();
        for (code, table) in raw {
            let language = Language::from_code(&code).ok_or_else(|| Error::Config {
                message: format!("Unknown language '{code}' in translation catalog"),
            })?;
            tables.insert(language, table);
        }
        Ok(Self { tables })
    }

    /// Loads a catalog from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&contents)
    }

    /// Loads the catalog named by `DEALSCOUT_TRANSLATIONS`, or `translations.toml`.
    /// A missing default file yields an empty catalog, so every lookup returns its key.
    pub fn load_default() -> Result<Self> {
        if let Ok(path) = std::env::var("DEALSCOUT_TRANSLATIONS") {
            return Self::load(path);
        }
        if Path::new(DEFAULT_TRANSLATIONS_PATH).exists() {
            Self::load(DEFAULT_TRANSLATIONS_PATH)
        } else {
            tracing::warn!("{DEFAULT_TRANSLATIONS_PATH} not found, replies will show raw keys");
            Ok(Self::default())
        }
    }

    /// Number of languages with a table.
    #[must_use]
    pub fn language_count(&self) -> usize {
        self.tables.len()
    }

    /// Exact lookup in one language.
    #[must_use]
    pub fn lookup(&self, language: Language, key: &str) -> Option<&str> {
        self.tables
            .get(&language)
            .and_then(|table| table.get(key))
            .map(String::as_str)
    }
}

/// Active language plus translation lookup.
#[derive(Debug, Clone)]
pub struct LanguageStore {
    active: Language,
    default: Language,
    catalog: Arc<Catalog>,
}

impl LanguageStore {
    /// Starts in the default language.
    #[must_use]
    pub const fn new(catalog: Arc<Catalog>, default: Language) -> Self {
        Self {
            active: default,
            default,
            catalog,
        }
    }

    /// Currently selected language.
    #[must_use]
    pub const fn language(&self) -> Language {
        self.active
    }

    /// Switch the active language.
    pub fn set_language(&mut self, language: Language) {
        tracing::debug!("Language changed to {}", language.code());
        self.active = language;
    }

    /// BCP-47 locale of the active language.
    #[must_use]
    pub const fn locale(&self) -> &'static str {
        self.active.locale()
    }

    /// Translates `key`: active language, then default language, then the key itself.
    #[must_use]
    pub fn t<'a>(&'a self, key: &'a str) -> &'a str {
        self.catalog
            .lookup(self.active, key)
            .or_else(|| self.catalog.lookup(self.default, key))
            .unwrap_or(key)
    }

    /// Translates `key` and substitutes `{name}` placeholders.
    #[must_use]
    pub fn t_with(&self, key: &str, args: &[(&str, &str)]) -> String {
        let mut text = self.t(key).to_string();
        for (name, value) in args {
            text = text.replace(&format!("{{{name}}}"), value);
        }
        text
    }
}

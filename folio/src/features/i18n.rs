//! Language selection and string lookup.

use crate::fragment::Container;
use crate::prefs::{DEFAULT_LANGUAGE, LANGUAGE_KEY, PreferenceStore};
use crate::registry::{Initializer, PageView};
use async_trait::async_trait;
use folio_shared::errors::{FolioError, FolioResult};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Nested translation tables keyed by language code.
///
/// ```json
/// { "en": { "hero": { "title": "Hello" } }, "es": { "hero": { "title": "Hola" } } }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    languages: BTreeMap<String, Value>,
}

impl Catalog {
    pub fn from_json(raw: &str) -> FolioResult<Self> {
        Self::from_value(serde_json::from_str(raw)?)
    }

    pub fn from_value(value: Value) -> FolioResult<Self> {
        let Value::Object(map) = value else {
            return Err(FolioError::Config(
                "translation catalog must be an object keyed by language".into(),
            ));
        };
        Ok(Self {
            languages: map.into_iter().collect(),
        })
    }

    pub fn languages(&self) -> Vec<&str> {
        self.languages.keys().map(String::as_str).collect()
    }

    pub fn has_language(&self, language: &str) -> bool {
        self.languages.contains_key(language)
    }

    /// Resolve a dotted key such as `about.description1`.
    pub fn lookup(&self, language: &str, key: &str) -> Option<&str> {
        let mut node = self.languages.get(language)?;
        for part in key.split('.') {
            node = node.get(part)?;
        }
        node.as_str()
    }
}

/// A `data-i18n` key found in the page and its text in the current language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub key: String,
    pub text: Option<String>,
}

/// Class of the buttons that pick a language.
pub const LANGUAGE_BUTTON_CLASS: &str = "language-btn";
/// Class of blocks written in a single language.
pub const LANGUAGE_SECTION_CLASS: &str = "language-section";

/// A `language-btn` element; `active` when its language is current.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageButton {
    pub lang: String,
    pub active: bool,
}

/// A `language-section` element; only sections in the current language are
/// visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageSection {
    pub lang: String,
    pub visible: bool,
}

pub struct I18n {
    catalog: Catalog,
    prefs: Arc<dyn PreferenceStore>,
    language: RwLock<String>,
    page: RwLock<Option<PageView>>,
    resolved: RwLock<Vec<Translation>>,
    buttons: RwLock<Vec<String>>,
    sections: RwLock<Vec<String>>,
}

impl I18n {
    pub fn new(catalog: Catalog, prefs: Arc<dyn PreferenceStore>) -> Self {
        let language = prefs
            .get(LANGUAGE_KEY)
            .filter(|lang| catalog.has_language(lang))
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

        Self {
            catalog,
            prefs,
            language: RwLock::new(language),
            page: RwLock::new(None),
            resolved: RwLock::new(Vec::new()),
            buttons: RwLock::new(Vec::new()),
            sections: RwLock::new(Vec::new()),
        }
    }

    pub fn language(&self) -> String {
        self.language.read().clone()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Switch language, persist the choice, and re-apply translations to the
    /// last initialized page.
    pub fn set_language(&self, language: &str) -> FolioResult<()> {
        if !self.catalog.has_language(language) {
            return Err(FolioError::Config(format!(
                "unsupported language '{}'",
                language
            )));
        }
        self.prefs.set(LANGUAGE_KEY, language)?;
        *self.language.write() = language.to_string();
        if let Some(page) = self.page.read().as_ref() {
            *self.resolved.write() = self.resolve(page.container());
        }
        tracing::info!(language, "Language changed");
        Ok(())
    }

    pub fn translate(&self, key: &str) -> Option<String> {
        self.catalog
            .lookup(&self.language(), key)
            .map(str::to_string)
    }

    /// Translate every `data-i18n` key present in `container`.
    pub fn resolve(&self, container: &Container) -> Vec<Translation> {
        let language = self.language();
        container
            .i18n_keys()
            .into_iter()
            .map(|key| {
                let text = self.catalog.lookup(&language, key).map(str::to_string);
                if text.is_none() {
                    tracing::warn!(key, language = %language, "Translation not found");
                }
                Translation {
                    key: key.to_string(),
                    text,
                }
            })
            .collect()
    }

    /// Result of the last page resolution.
    pub fn resolved(&self) -> Vec<Translation> {
        self.resolved.read().clone()
    }

    pub fn language_buttons(&self) -> Vec<LanguageButton> {
        let language = self.language();
        self.buttons
            .read()
            .iter()
            .map(|lang| LanguageButton {
                active: *lang == language,
                lang: lang.clone(),
            })
            .collect()
    }

    pub fn language_sections(&self) -> Vec<LanguageSection> {
        let language = self.language();
        self.sections
            .read()
            .iter()
            .map(|lang| LanguageSection {
                visible: *lang == language,
                lang: lang.clone(),
            })
            .collect()
    }
}

fn data_langs(container: &Container, class: &str) -> Vec<String> {
    container
        .elements_with_class(class)
        .into_iter()
        .filter_map(|tag| tag.data("lang"))
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl Initializer for I18n {
    async fn init(&self, page: &PageView) -> FolioResult<()> {
        let container = page.container();
        let resolved = self.resolve(container);
        let buttons = data_langs(container, LANGUAGE_BUTTON_CLASS);
        let sections = data_langs(container, LANGUAGE_SECTION_CLASS);
        tracing::debug!(
            language = %self.language(),
            keys = resolved.len(),
            buttons = buttons.len(),
            sections = sections.len(),
            "Applied translations"
        );
        *self.resolved.write() = resolved;
        *self.buttons.write() = buttons;
        *self.sections.write() = sections;
        *self.page.write() = Some(page.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::container_from;
    use crate::prefs::MemoryPreferences;

    const CATALOG: &str = r#"{
        "en": { "hero": { "title": "Hello, I'm Héctor" }, "nav": { "home": "Home" } },
        "es": { "hero": { "title": "Hola, soy Héctor" } }
    }"#;

    #[test]
    fn test_lookup_dotted_keys() {
        let catalog = Catalog::from_json(CATALOG).unwrap();
        assert_eq!(catalog.lookup("es", "hero.title"), Some("Hola, soy Héctor"));
        assert_eq!(catalog.lookup("es", "nav.home"), None);
        assert_eq!(catalog.lookup("en", "hero"), None);
        assert_eq!(catalog.lookup("fr", "hero.title"), None);
        assert_eq!(catalog.languages(), vec!["en", "es"]);
    }

    #[test]
    fn test_catalog_must_be_object() {
        assert!(Catalog::from_json("[1, 2]").is_err());
    }

    #[test]
    fn test_language_defaults_and_persists() {
        let prefs = Arc::new(MemoryPreferences::new());
        let i18n = I18n::new(Catalog::from_json(CATALOG).unwrap(), prefs.clone());
        assert_eq!(i18n.language(), "en");
        assert!(prefs.get(LANGUAGE_KEY).is_none());

        i18n.set_language("es").unwrap();
        assert_eq!(prefs.get(LANGUAGE_KEY).as_deref(), Some("es"));
        assert!(i18n.set_language("fr").is_err());
        assert_eq!(i18n.language(), "es");
    }

    #[test]
    fn test_stored_language_used_when_supported() {
        let prefs = Arc::new(MemoryPreferences::new());
        prefs.set(LANGUAGE_KEY, "es").unwrap();
        let i18n = I18n::new(Catalog::from_json(CATALOG).unwrap(), prefs.clone());
        assert_eq!(i18n.translate("hero.title").as_deref(), Some("Hola, soy Héctor"));

        prefs.set(LANGUAGE_KEY, "de").unwrap();
        let i18n = I18n::new(Catalog::from_json(CATALOG).unwrap(), prefs);
        assert_eq!(i18n.language(), "en");
    }

    #[tokio::test]
    async fn test_init_resolves_page_keys() {
        let i18n = I18n::new(
            Catalog::from_json(CATALOG).unwrap(),
            Arc::new(MemoryPreferences::new()),
        );
        let container = container_from(&[(
            "hero",
            r#"<h1 data-i18n="hero.title"></h1><a data-i18n="nav.missing"></a>"#,
        )]);

        i18n.init(&PageView::new(Arc::new(container))).await.unwrap();

        let resolved = i18n.resolved();
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].text.as_deref(), Some("Hello, I'm Héctor"));
        assert_eq!(resolved[1].key, "nav.missing");
        assert!(resolved[1].text.is_none());
    }

    #[tokio::test]
    async fn test_language_switch_updates_buttons_and_sections() {
        let i18n = I18n::new(
            Catalog::from_json(CATALOG).unwrap(),
            Arc::new(MemoryPreferences::new()),
        );
        let container = container_from(&[(
            "about",
            r#"<button class="language-btn" data-lang="en">EN</button>
               <button class="language-btn" data-lang="es">ES</button>
               <div class="language-section" data-lang="en"><h1 data-i18n="hero.title"></h1></div>
               <div class="language-section" data-lang="es"></div>
               <div class="language-section"></div>"#,
        )]);
        i18n.init(&PageView::new(Arc::new(container))).await.unwrap();

        let active: Vec<_> = i18n.language_buttons().into_iter().filter(|b| b.active).collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].lang, "en");
        assert_eq!(
            i18n.language_sections(),
            vec![
                LanguageSection { lang: "en".into(), visible: true },
                LanguageSection { lang: "es".into(), visible: false },
            ]
        );

        i18n.set_language("es").unwrap();
        assert_eq!(
            i18n.language_buttons(),
            vec![
                LanguageButton { lang: "en".into(), active: false },
                LanguageButton { lang: "es".into(), active: true },
            ]
        );
        assert!(i18n.language_sections()[1].visible);
        assert!(!i18n.language_sections()[0].visible);
        assert_eq!(i18n.resolved()[0].text.as_deref(), Some("Hola, soy Héctor"));
    }
}

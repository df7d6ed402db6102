//! Light/dark theme preference.

use crate::prefs::{DEFAULT_THEME, PreferenceStore, THEME_KEY};
use crate::registry::{Initializer, PageView};
use async_trait::async_trait;
use folio_shared::errors::FolioResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

/// Id of the toggle control in the header fragment.
pub const TOGGLE_ID: &str = "theme-toggle";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "dark" => Some(Theme::Dark),
            "light" => Some(Theme::Light),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    /// Fallback used when no preference is stored.
    pub fn fallback() -> Self {
        Theme::parse(DEFAULT_THEME).unwrap_or(Theme::Dark)
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current theme plus persistence.
///
/// Reading the preference never writes it back; only explicit changes do.
pub struct ThemeController {
    prefs: Arc<dyn PreferenceStore>,
    current: watch::Sender<Theme>,
}

impl ThemeController {
    pub fn new(prefs: Arc<dyn PreferenceStore>) -> Self {
        let initial = stored_theme(prefs.as_ref()).unwrap_or_else(Theme::fallback);
        let (current, _) = watch::channel(initial);
        Self { prefs, current }
    }

    pub fn current(&self) -> Theme {
        *self.current.borrow()
    }

    /// Notified on every theme change.
    pub fn subscribe(&self) -> watch::Receiver<Theme> {
        self.current.subscribe()
    }

    /// Explicitly select a theme and persist it.
    pub fn set(&self, theme: Theme) -> FolioResult<()> {
        self.prefs.set(THEME_KEY, theme.as_str())?;
        self.current.send_replace(theme);
        tracing::info!(theme = %theme, "Theme changed");
        Ok(())
    }

    /// Flip between dark and light, persisting the result.
    pub fn toggle(&self) -> FolioResult<Theme> {
        let next = self.current().toggled();
        self.set(next)?;
        Ok(next)
    }

    /// Follow the system color scheme unless the user chose a theme.
    ///
    /// Returns whether the system preference was applied.
    pub fn apply_system_preference(&self, prefers_dark: bool) -> bool {
        if self.prefs.get(THEME_KEY).is_some() {
            return false;
        }
        let theme = if prefers_dark { Theme::Dark } else { Theme::Light };
        self.current.send_replace(theme);
        true
    }
}

fn stored_theme(prefs: &dyn PreferenceStore) -> Option<Theme> {
    let raw = prefs.get(THEME_KEY)?;
    let theme = Theme::parse(&raw);
    if theme.is_none() {
        tracing::warn!(value = %raw, "Ignoring unknown stored theme");
    }
    theme
}

#[async_trait]
impl Initializer for ThemeController {
    async fn init(&self, page: &PageView) -> FolioResult<()> {
        if let Some(theme) = stored_theme(self.prefs.as_ref()) {
            self.current.send_replace(theme);
        }
        if !page.container().has_id(TOGGLE_ID) {
            tracing::debug!("No theme toggle in page");
        }
        tracing::debug!(theme = %self.current(), "Theme applied");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefs::MemoryPreferences;

    #[test]
    fn test_absent_preference_defaults_without_writing() {
        let prefs = Arc::new(MemoryPreferences::new());
        let theme = ThemeController::new(prefs.clone());

        assert_eq!(theme.current(), Theme::Dark);
        assert!(prefs.get(THEME_KEY).is_none());
    }

    #[test]
    fn test_first_toggle_persists_from_fallback() {
        let prefs = Arc::new(MemoryPreferences::new());
        let theme = ThemeController::new(prefs.clone());
        let mut rx = theme.subscribe();

        assert_eq!(theme.toggle().unwrap(), Theme::Light);
        assert_eq!(prefs.get(THEME_KEY).as_deref(), Some("light"));
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), Theme::Light);

        assert_eq!(theme.toggle().unwrap(), Theme::Dark);
        assert_eq!(prefs.get(THEME_KEY).as_deref(), Some("dark"));
    }

    #[test]
    fn test_system_preference_only_without_stored_choice() {
        let prefs = Arc::new(MemoryPreferences::new());
        let theme = ThemeController::new(prefs.clone());

        assert!(theme.apply_system_preference(false));
        assert_eq!(theme.current(), Theme::Light);
        assert!(prefs.get(THEME_KEY).is_none());

        theme.set(Theme::Dark).unwrap();
        assert!(!theme.apply_system_preference(false));
        assert_eq!(theme.current(), Theme::Dark);
    }

    #[test]
    fn test_unknown_stored_value_falls_back() {
        let prefs = Arc::new(MemoryPreferences::new());
        prefs.set(THEME_KEY, "solarized").unwrap();

        assert_eq!(ThemeController::new(prefs).current(), Theme::Dark);
    }
}

//! Light/dark theme preference, persisted under `color-picker-theme`.
//!
//! The default is always light: no OS-level preference is consulted, and any
//! stored value other than `"dark"` reads as light.

use crate::config::THEME_KEY;
use crate::core_modules::storage::KeyValueStorage;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("unknown theme {other:?}, expected light or dark")),
        }
    }
}

/// The theme preference, loaded once and written through on every change.
#[derive(Debug)]
pub struct ThemePreference<S: KeyValueStorage> {
    storage: S,
    theme: Theme,
}

impl<S: KeyValueStorage> ThemePreference<S> {
    pub fn open(storage: S) -> Self {
        let theme = match storage.get(THEME_KEY) {
            Ok(Some(value)) if value.trim() == Theme::Dark.as_str() => Theme::Dark,
            Ok(_) => Theme::Light,
            Err(e) => {
                warn!("theme preference unavailable, using light: {e}");
                Theme::Light
            }
        };
        Self { storage, theme }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn set(&mut self, theme: Theme) -> Theme {
        self.theme = theme;
        if let Err(e) = self.storage.set(THEME_KEY, theme.as_str()) {
            warn!("theme preference kept in memory only: {e}");
        }
        self.theme
    }

    pub fn toggle(&mut self) -> Theme {
        self.set(self.theme.toggled())
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

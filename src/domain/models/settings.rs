use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::error::AppError;

pub const DEFAULT_LAB_NAME: &str = "Medical Laboratory";
pub const DEFAULT_LANGUAGE: &str = "ar";
pub const SUPPORTED_LANGUAGES: [&str; 2] = ["ar", "en"];

/// The one settings row of a deployment.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct SystemSettings {
    pub id: i32,
    pub lab_name: String,
    pub publish_link: String,
    pub default_language: String,
    pub show_finance: bool,
    pub show_language_switch: bool,
    pub updated_at: DateTime<Utc>,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            id: 1,
            lab_name: DEFAULT_LAB_NAME.to_string(),
            publish_link: String::new(),
            default_language: DEFAULT_LANGUAGE.to_string(),
            show_finance: true,
            show_language_switch: true,
            updated_at: Utc::now(),
        }
    }
}

impl SystemSettings {
    pub fn relay_target(&self) -> Option<&str> {
        let link = self.publish_link.trim();
        if link.is_empty() { None } else { Some(link) }
    }

    /// Applies a partial update, rejecting values the lab cannot run with.
    pub fn apply(mut self, update: SettingsUpdate) -> Result<Self, AppError> {
        if let Some(name) = update.lab_name {
            let name = name.trim();
            if name.is_empty() {
                return Err(AppError::Validation("Lab name cannot be empty".into()));
            }
            self.lab_name = name.to_string();
        }
        if let Some(link) = update.publish_link {
            let link = link.trim();
            if !link.is_empty() && !link.starts_with("http://") && !link.starts_with("https://") {
                return Err(AppError::Validation("Publish link must start with http:// or https://".into()));
            }
            self.publish_link = link.to_string();
        }
        if let Some(language) = update.default_language {
            let language = language.trim().to_lowercase();
            if !SUPPORTED_LANGUAGES.contains(&language.as_str()) {
                return Err(AppError::Validation(format!("Unsupported language: {}", language)));
            }
            self.default_language = language;
        }
        if let Some(show) = update.show_finance {
            self.show_finance = show;
        }
        if let Some(show) = update.show_language_switch {
            self.show_language_switch = show;
        }
        Ok(self)
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct SettingsUpdate {
    pub lab_name: Option<String>,
    pub publish_link: Option<String>,
    pub default_language: Option<String>,
    pub show_finance: Option<bool>,
    pub show_language_switch: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct PublicSettings {
    pub lab_name: String,
    pub default_language: String,
    pub show_language_switch: bool,
}

impl From<SystemSettings> for PublicSettings {
    fn from(s: SystemSettings) -> Self {
        Self {
            lab_name: s.lab_name,
            default_language: s.default_language,
            show_language_switch: s.show_language_switch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_partial_update() {
        let updated = SystemSettings::default()
            .apply(SettingsUpdate {
                lab_name: Some("  Nile Lab ".into()),
                default_language: Some("EN".into()),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(updated.lab_name, "Nile Lab");
        assert_eq!(updated.default_language, "en");
        assert!(updated.show_finance);
        assert_eq!(updated.relay_target(), None);
    }

    #[test]
    fn test_apply_rejects_bad_values() {
        let blank = SettingsUpdate { lab_name: Some("   ".into()), ..Default::default() };
        assert!(matches!(SystemSettings::default().apply(blank), Err(AppError::Validation(_))));

        let link = SettingsUpdate { publish_link: Some("ftp://x".into()), ..Default::default() };
        assert!(matches!(SystemSettings::default().apply(link), Err(AppError::Validation(_))));

        let lang = SettingsUpdate { default_language: Some("fr".into()), ..Default::default() };
        assert!(matches!(SystemSettings::default().apply(lang), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_relay_target_trims() {
        let settings = SystemSettings::default()
            .apply(SettingsUpdate { publish_link: Some(" https://relay.example/upload ".into()), ..Default::default() })
            .unwrap();
        assert_eq!(settings.relay_target(), Some("https://relay.example/upload"));
    }
}

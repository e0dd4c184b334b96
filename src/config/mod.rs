use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::dialogs::{DialogLayout, DialogSize, Spinner, TextDirection, Variant};

/// Close transitions that never report completion are cut off after this long
pub const DEFAULT_CLOSE_FALLBACK_MS: u64 = 200;

const MAX_CLOSE_FALLBACK_MS: u64 = 10_000;

/// Color scheme requested by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    Dark,
    #[default]
    System,
}

impl ThemeMode {
    /// Whether the dark palette applies, given the host's preference
    pub fn is_dark(&self, prefers_dark: bool) -> bool {
        match self {
            ThemeMode::Light => false,
            ThemeMode::Dark => true,
            ThemeMode::System => prefers_dark,
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" => Some(ThemeMode::Light),
            "dark" => Some(ThemeMode::Dark),
            "system" => Some(ThemeMode::System),
            _ => None,
        }
    }
}

/// Request fields applied to every request that leaves them unset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestDefaults {
    pub confirm_text: Option<String>,
    pub cancel_text: Option<String>,
    pub variant: Option<Variant>,
    pub dismissible: Option<bool>,
    pub layout: Option<DialogLayout>,
    pub size: Option<DialogSize>,
    pub cancelable_while_loading: Option<bool>,
    pub dir: Option<TextDirection>,
    pub spinner: Option<Spinner>,
}

impl RequestDefaults {
    fn merge_with(&mut self, other: Self) {
        if other.confirm_text.is_some() {
            self.confirm_text = other.confirm_text;
        }
        if other.cancel_text.is_some() {
            self.cancel_text = other.cancel_text;
        }
        if other.variant.is_some() {
            self.variant = other.variant;
        }
        if other.dismissible.is_some() {
            self.dismissible = other.dismissible;
        }
        if other.layout.is_some() {
            self.layout = other.layout;
        }
        if other.size.is_some() {
            self.size = other.size;
        }
        if other.cancelable_while_loading.is_some() {
            self.cancelable_while_loading = other.cancelable_while_loading;
        }
        if other.dir.is_some() {
            self.dir = other.dir;
        }
        if other.spinner.is_some() {
            self.spinner = other.spinner;
        }
    }
}

/// Icon override per variant
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariantIcons {
    pub danger: Option<String>,
    pub warning: Option<String>,
    pub info: Option<String>,
    pub success: Option<String>,
}

impl VariantIcons {
    pub fn for_variant(&self, variant: Variant) -> Option<&str> {
        match variant {
            Variant::Danger => self.danger.as_deref(),
            Variant::Warning => self.warning.as_deref(),
            Variant::Info => self.info.as_deref(),
            Variant::Success => self.success.as_deref(),
            Variant::Default => None,
        }
    }

    fn merge_with(&mut self, other: Self) {
        if other.danger.is_some() {
            self.danger = other.danger;
        }
        if other.warning.is_some() {
            self.warning = other.warning;
        }
        if other.info.is_some() {
            self.info = other.info;
        }
        if other.success.is_some() {
            self.success = other.success;
        }
    }
}

/// Label overrides for built-in text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Translations {
    /// Confirm label when there is no cancel action. Default: "OK"
    pub ok: Option<String>,
    /// Default: "Confirm"
    pub confirm: Option<String>,
    /// Default: "Cancel"
    pub cancel: Option<String>,
    /// Announced while a handler runs. Default: "Loading..."
    pub loading: Option<String>,
    /// Label above the keyword input; `{keyword}` is substituted
    pub keyword_label: Option<String>,
    /// Accessible name of the button group. Default: "Dialog actions"
    pub dialog_actions: Option<String>,
}

impl Translations {
    pub fn ok(&self) -> &str {
        self.ok.as_deref().unwrap_or("OK")
    }

    pub fn confirm(&self) -> &str {
        self.confirm.as_deref().unwrap_or("Confirm")
    }

    pub fn cancel(&self) -> &str {
        self.cancel.as_deref().unwrap_or("Cancel")
    }

    pub fn loading(&self) -> &str {
        self.loading.as_deref().unwrap_or("Loading...")
    }

    pub fn dialog_actions(&self) -> &str {
        self.dialog_actions.as_deref().unwrap_or("Dialog actions")
    }

    pub fn keyword_label(&self, keyword: &str) -> String {
        match &self.keyword_label {
            Some(template) => template.replace("{keyword}", keyword),
            None => format!("Type {} to confirm", keyword),
        }
    }

    fn labels(&self) -> [(&'static str, Option<&String>); 6] {
        [
            ("ok", self.ok.as_ref()),
            ("confirm", self.confirm.as_ref()),
            ("cancel", self.cancel.as_ref()),
            ("loading", self.loading.as_ref()),
            ("keyword_label", self.keyword_label.as_ref()),
            ("dialog_actions", self.dialog_actions.as_ref()),
        ]
    }

    fn merge_with(&mut self, other: Self) {
        if other.ok.is_some() {
            self.ok = other.ok;
        }
        if other.confirm.is_some() {
            self.confirm = other.confirm;
        }
        if other.cancel.is_some() {
            self.cancel = other.cancel;
        }
        if other.loading.is_some() {
            self.loading = other.loading;
        }
        if other.keyword_label.is_some() {
            self.keyword_label = other.keyword_label;
        }
        if other.dialog_actions.is_some() {
            self.dialog_actions = other.dialog_actions;
        }
    }
}

/// Mount-time presenter configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfirmerConfig {
    /// Color scheme
    pub theme: ThemeMode,

    /// Defaults for fields a request leaves unset
    pub defaults: RequestDefaults,

    /// Icon per variant
    pub icons: VariantIcons,

    /// Strip built-in styling from every dialog
    pub unstyled: bool,

    /// Text direction for every dialog
    pub dir: Option<TextDirection>,

    /// Label overrides
    pub translations: Translations,

    /// Busy indicator for every dialog
    pub spinner: Option<Spinner>,

    /// How long to wait for the close transition before giving up on it
    pub close_fallback_ms: u64,
}

impl Default for ConfirmerConfig {
    fn default() -> Self {
        Self {
            theme: ThemeMode::System,
            defaults: RequestDefaults::default(),
            icons: VariantIcons::default(),
            unstyled: false,
            dir: None,
            translations: Translations::default(),
            spinner: None,
            close_fallback_ms: DEFAULT_CLOSE_FALLBACK_MS,
        }
    }
}

impl ConfirmerConfig {
    /// Build the configuration from built-in defaults, the first config file
    /// found (or `explicit`), then the environment
    pub async fn init(explicit: Option<&Path>) -> Result<Self> {
        debug!("Initializing confirmer configuration");

        let mut config = Self::default();

        match explicit {
            Some(path) => {
                let file_config = Self::read_file(path).await?;
                config.merge_with(file_config);
            }
            None => {
                if let Some(file_config) = Self::load_from_file().await? {
                    config.merge_with(file_config);
                }
            }
        }

        config.load_from_env();
        config.validate()?;

        Ok(config)
    }

    /// Candidate config files, highest priority first
    pub fn config_paths() -> Vec<PathBuf> {
        // 1. ./.affirm.json
        // 2. ./affirm.json
        // 3. $CONFIG_DIR/affirm/affirm.json
        let mut paths = vec![PathBuf::from("./.affirm.json"), PathBuf::from("./affirm.json")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("affirm").join("affirm.json"));
        }

        paths
    }

    /// Load the first config file that exists, if any
    pub async fn load_from_file() -> Result<Option<Self>> {
        for path in Self::config_paths() {
            if path.exists() {
                return Self::read_file(&path).await.map(Some);
            }
        }
        Ok(None)
    }

    async fn read_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from: {}", path.display());
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Apply `AFFIRM_*` environment overrides
    pub fn load_from_env(&mut self) {
        if let Ok(theme) = std::env::var("AFFIRM_THEME") {
            match ThemeMode::parse(&theme) {
                Some(theme) => self.theme = theme,
                None => debug!("Ignoring unknown AFFIRM_THEME value: {}", theme),
            }
        }

        if let Ok(dir) = std::env::var("AFFIRM_DIR") {
            match dir.parse::<TextDirection>() {
                Ok(dir) => self.dir = Some(dir),
                Err(e) => debug!("Ignoring AFFIRM_DIR: {}", e),
            }
        }

        if let Ok(unstyled) = std::env::var("AFFIRM_UNSTYLED") {
            self.unstyled = matches!(unstyled.to_lowercase().as_str(), "1" | "true" | "yes");
        }

        if let Ok(fallback) = std::env::var("AFFIRM_CLOSE_FALLBACK_MS") {
            if let Ok(ms) = fallback.parse() {
                self.close_fallback_ms = ms;
            }
        }
    }

    /// Merge another configuration into this one. Fields `other` sets win.
    pub fn merge_with(&mut self, other: Self) {
        if other.theme != ThemeMode::System {
            self.theme = other.theme;
        }
        self.defaults.merge_with(other.defaults);
        self.icons.merge_with(other.icons);
        if other.unstyled {
            self.unstyled = true;
        }
        if other.dir.is_some() {
            self.dir = other.dir;
        }
        self.translations.merge_with(other.translations);
        if other.spinner.is_some() {
            self.spinner = other.spinner;
        }
        if other.close_fallback_ms != DEFAULT_CLOSE_FALLBACK_MS {
            self.close_fallback_ms = other.close_fallback_ms;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.close_fallback_ms == 0 {
            return Err(anyhow::anyhow!("close_fallback_ms must be greater than 0"));
        }

        if self.close_fallback_ms > MAX_CLOSE_FALLBACK_MS {
            return Err(anyhow::anyhow!(
                "close_fallback_ms must be at most {}",
                MAX_CLOSE_FALLBACK_MS
            ));
        }

        for (name, label) in self.translations.labels() {
            if matches!(label, Some(label) if label.trim().is_empty()) {
                return Err(anyhow::anyhow!("translations.{} must not be empty", name));
            }
        }

        Ok(())
    }

    pub fn close_fallback(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.close_fallback_ms)
    }
}

//! Engine configuration.

use serde::Deserialize;

use crate::error::{EngineError, Result};

/// Markup dialect of the template being processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateMode {
    #[default]
    Html,
    Xml,
    Text,
    Javascript,
    Css,
    Raw,
}

/// Settings shared by every engine built over a context.
///
/// ```toml
/// template_mode = "xml"
/// status_variable_suffix = "Status"
/// initial_exec_slots = 4
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub template_mode: TemplateMode,
    /// Appended to the item variable name when an iteration names no status variable.
    pub status_variable_suffix: String,
    /// Scratch slots allocated up front, one per nested processor execution.
    pub initial_exec_slots: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            template_mode: TemplateMode::Html,
            status_variable_suffix: "Stat".to_string(),
            initial_exec_slots: 3,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.status_variable_suffix.is_empty() {
            return Err(EngineError::Configuration(
                "status_variable_suffix must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

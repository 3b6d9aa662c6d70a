//! YAML project definitions: main brand, competitors, prompts and backends.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Backend, ConfigError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitorSpec {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PromptSpec {
    Text(String),
    Detailed {
        text: String,
        #[serde(default = "default_selected")]
        selected: bool,
    },
}

fn default_selected() -> bool {
    true
}

impl PromptSpec {
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            PromptSpec::Text(text) | PromptSpec::Detailed { text, .. } => text,
        }
    }

    #[must_use]
    pub fn is_selected(&self) -> bool {
        match self {
            PromptSpec::Text(_) => true,
            PromptSpec::Detailed { selected, .. } => *selected,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectFile {
    pub name: Option<String>,
    pub company_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub area_of_work: Option<String>,
    #[serde(default)]
    pub competitors: Vec<CompetitorSpec>,
    pub prompts: Vec<PromptSpec>,
    pub backends: Vec<String>,
}

impl ProjectFile {
    /// Project display name, falling back to the company name.
    #[must_use]
    pub fn project_name(&self) -> &str {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(self.company_name.trim())
    }

    /// Backends named by the file, in declaration order.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` for any name outside the supported set.
    pub fn parsed_backends(&self) -> Result<Vec<Backend>, ConfigError> {
        self.backends
            .iter()
            .map(|name| {
                name.parse::<Backend>()
                    .map_err(|e| ConfigError::Validation(e.to_string()))
            })
            .collect()
    }
}

/// Load and validate a project definition from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_project_file(path: &Path) -> Result<ProjectFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ProjectFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_project_file(&content)
}

/// Parse and validate a project definition from YAML text.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or fails validation.
pub fn parse_project_file(content: &str) -> Result<ProjectFile, ConfigError> {
    let file: ProjectFile = serde_yaml::from_str(content).map_err(ConfigError::ProjectFileParse)?;
    validate_project_file(&file)?;
    Ok(file)
}

fn validate_project_file(file: &ProjectFile) -> Result<(), ConfigError> {
    let company = file.company_name.trim();
    if company.is_empty() {
        return Err(ConfigError::Validation(
            "company_name must be non-empty".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for competitor in &file.competitors {
        let name = competitor.name.trim();
        if name.is_empty() {
            return Err(ConfigError::Validation(
                "competitor name must be non-empty".to_string(),
            ));
        }
        if name.to_lowercase() == company.to_lowercase() {
            return Err(ConfigError::Validation(format!(
                "competitor '{name}' is the main brand"
            )));
        }
        if !seen.insert(name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate competitor name: '{name}'"
            )));
        }
    }

    if file.prompts.is_empty() {
        return Err(ConfigError::Validation(
            "at least one prompt is required".to_string(),
        ));
    }
    if file.prompts.iter().any(|p| p.text().trim().is_empty()) {
        return Err(ConfigError::Validation(
            "prompt text must be non-empty".to_string(),
        ));
    }

    if file.backends.is_empty() {
        return Err(ConfigError::Validation(
            "at least one backend is required".to_string(),
        ));
    }
    file.parsed_backends()?;

    Ok(())
}

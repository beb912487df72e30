use serde::{Deserialize, Serialize};

use crate::review::issues::{Category, CONTEXT_LINES};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevuConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    /// Review dimensions offered on the intake screen.
    #[serde(default = "default_categories")]
    pub categories: Vec<Category>,
}

/// [api] section configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Name of the environment variable holding the bearer token.
    #[serde(default = "default_key_env")]
    pub key_env: String,
}

/// [display] section configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Lines of context above/below an issue's lines in detail excerpts.
    #[serde(default = "default_context_lines")]
    pub context_lines: usize,
    #[serde(default = "default_true")]
    pub line_numbers: bool,
    /// Syntax token (e.g. "rs", "py"); detected from the code if unset.
    #[serde(default)]
    pub language: Option<String>,
}

fn default_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "gpt-4-1106-preview".to_string()
}

fn default_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_context_lines() -> usize {
    CONTEXT_LINES
}

fn default_true() -> bool {
    true
}

fn default_categories() -> Vec<Category> {
    vec![
        Category {
            name: "Best Practices".to_string(),
            color: "pink".to_string(),
            description: "Code structure, naming, readability and idiomatic usage.".to_string(),
        },
        Category {
            name: "Security".to_string(),
            color: "purple".to_string(),
            description: "Vulnerabilities, unsafe handling of input and secrets.".to_string(),
        },
        Category {
            name: "Optimisation".to_string(),
            color: "blue".to_string(),
            description: "Unnecessary work, allocations and algorithmic waste.".to_string(),
        },
    ]
}

impl Default for RevuConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            display: DisplayConfig::default(),
            categories: default_categories(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            key_env: default_key_env(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            context_lines: default_context_lines(),
            line_numbers: true,
            language: None,
        }
    }
}

/// Load config by merging global defaults with per-directory overrides.
/// Priority: local `.revu.toml` > global `~/.config/revu/config.toml` >
/// built-in defaults. Merging is deep: individual fields within sections
/// override independently.
pub fn load_config(dir: &str) -> RevuConfig {
    let local_path = format!("{dir}/.revu.toml");
    let global_path = dirs::config_dir()
        .map(|d| d.join("revu/config.toml").to_string_lossy().to_string());

    let global_table = global_path
        .and_then(|p| std::fs::read_to_string(p).ok())
        .and_then(|c| c.parse::<toml::Value>().ok())
        .and_then(|v| match v {
            toml::Value::Table(t) => Some(t),
            _ => None,
        });

    let local_table = std::fs::read_to_string(&local_path)
        .ok()
        .and_then(|c| c.parse::<toml::Value>().ok())
        .and_then(|v| match v {
            toml::Value::Table(t) => Some(t),
            _ => None,
        });

    let merged = match (global_table, local_table) {
        (Some(mut global), Some(local)) => {
            deep_merge(&mut global, local);
            toml::Value::Table(global)
        }
        (Some(global), None) => toml::Value::Table(global),
        (None, Some(local)) => toml::Value::Table(local),
        (None, None) => return RevuConfig::default(),
    };

    merged.try_into().unwrap_or_default()
}

/// Recursively merge `overlay` into `base`. Overlay values win; nested
/// tables are merged recursively.
fn deep_merge(
    base: &mut toml::map::Map<String, toml::Value>,
    overlay: toml::map::Map<String, toml::Value>,
) {
    for (key, value) in overlay {
        match (base.get_mut(&key), &value) {
            (Some(toml::Value::Table(base_table)), toml::Value::Table(overlay_table)) => {
                deep_merge(base_table, overlay_table.clone());
            }
            _ => {
                base.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_are_the_original_three_categories() {
        let config = RevuConfig::default();
        let names: Vec<&str> = config.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Best Practices", "Security", "Optimisation"]);
        assert_eq!(config.display.context_lines, 4);
        assert_eq!(config.api.key_env, "OPENAI_API_KEY");
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: RevuConfig = toml::from_str("[api]\nmodel = \"gpt-4o\"\n").unwrap();
        assert_eq!(config.api.model, "gpt-4o");
        assert_eq!(config.api.endpoint, default_endpoint());
        assert_eq!(config.categories.len(), 3);
    }

    #[test]
    fn local_file_overrides_single_field() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(".revu.toml"),
            "[display]\ncontext_lines = 2\n",
        )
        .unwrap();
        let config = load_config(&dir.path().to_string_lossy());
        assert_eq!(config.display.context_lines, 2);
        assert!(config.display.line_numbers);
        assert_eq!(config.api.model, default_model());
    }

    #[test]
    fn deep_merge_overlay_wins_per_field() {
        let mut base = "[api]\nmodel = \"a\"\nendpoint = \"x\"\n"
            .parse::<toml::Value>()
            .unwrap();
        let overlay = "[api]\nmodel = \"b\"\n".parse::<toml::Value>().unwrap();
        if let (toml::Value::Table(base), toml::Value::Table(overlay)) = (&mut base, overlay) {
            deep_merge(base, overlay);
        }
        let merged: RevuConfig = base.try_into().unwrap();
        assert_eq!(merged.api.model, "b");
        assert_eq!(merged.api.endpoint, "x");
    }

    #[test]
    fn categories_table_replaces_defaults() {
        let config: RevuConfig = toml::from_str(
            "[[categories]]\nname = \"Style\"\ncolor = \"green\"\ndescription = \"d\"\n",
        )
        .unwrap();
        assert_eq!(config.categories.len(), 1);
        assert_eq!(config.categories[0].name, "Style");
    }
}

// Tracking configuration
// Loaded from tagtrend.toml (or the path given with --config)

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tagtrend_core::value::{normalize_bool, normalize_float, normalize_int};
use tagtrend_core::FilterGroup;

use crate::error::ConfigError;

/// Config file used when none is given on the command line.
pub const DEFAULT_CONFIG_FILE: &str = "tagtrend.toml";

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigDocument {
    source: String,
    #[serde(default)]
    sheet: Option<String>,
    #[serde(default)]
    state: StateDocument,
    #[serde(default)]
    filter_groups: Vec<FilterGroupDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct StateDocument {
    cache_dir: String,
    history_file: String,
    registry_file: String,
}

impl Default for StateDocument {
    fn default() -> Self {
        Self {
            cache_dir: "snapshot_cache".into(),
            history_file: "result/history.json".into(),
            registry_file: "config/last_tags.toml".into(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FilterGroupDocument {
    tag: String,
    /// Column -> scalar or list of scalars, in document order.
    #[serde(default)]
    conditions: toml::Table,
}

// ---------------------------------------------------------------------------
// Validated config
// ---------------------------------------------------------------------------

/// Where a run keeps its state, resolved against the config file's directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateLayout {
    pub cache_dir: PathBuf,
    pub history_file: PathBuf,
    pub registry_file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Source workbook or CSV, resolved against the config file's directory.
    pub source: PathBuf,
    /// Sheet selector; `None` selects every sheet.
    pub sheet: Option<String>,
    pub state: StateLayout,
    pub filter_groups: Vec<FilterGroup>,
}

impl Config {
    /// Parse and validate a config document. Relative paths stay relative.
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        Self::from_toml_in(input, Path::new(""))
    }

    /// Read `path`; relative paths inside it resolve against its directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let input = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        let config = Self::from_toml_in(&input, base_dir)?;
        log::debug!(
            "loaded {} filter group(s) from {}",
            config.filter_groups.len(),
            path.display()
        );
        Ok(config)
    }

    fn from_toml_in(input: &str, base_dir: &Path) -> Result<Self, ConfigError> {
        let doc: ConfigDocument =
            toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;

        if doc.source.trim().is_empty() {
            return Err(ConfigError::Validation("source must not be empty".into()));
        }
        let filter_groups = build_filter_groups(&doc.filter_groups)?;
        let sheet = doc.sheet.filter(|s| !s.is_empty());

        Ok(Self {
            source: base_dir.join(&doc.source),
            sheet,
            state: StateLayout {
                cache_dir: base_dir.join(&doc.state.cache_dir),
                history_file: base_dir.join(&doc.state.history_file),
                registry_file: base_dir.join(&doc.state.registry_file),
            },
            filter_groups,
        })
    }
}

// ---------------------------------------------------------------------------
// Filter groups
// ---------------------------------------------------------------------------

fn build_filter_groups(docs: &[FilterGroupDocument]) -> Result<Vec<FilterGroup>, ConfigError> {
    if docs.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[filter_groups]] entry is required".into(),
        ));
    }

    let mut seen = HashSet::new();
    let mut groups = Vec::with_capacity(docs.len());
    for doc in docs {
        let tag = doc.tag.trim();
        if tag.is_empty() {
            return Err(ConfigError::Validation("filter group tag must not be empty".into()));
        }
        if !seen.insert(tag.to_string()) {
            return Err(ConfigError::Validation(format!("duplicate filter group tag '{tag}'")));
        }
        if doc.conditions.is_empty() {
            return Err(ConfigError::Validation(format!(
                "filter group '{tag}' has no conditions"
            )));
        }

        let mut group = FilterGroup::new(tag);
        for (column, value) in &doc.conditions {
            let values = condition_values(tag, column, value)?;
            group = group.with_condition(column.as_str(), values);
        }
        groups.push(group);
    }
    Ok(groups)
}

/// A scalar or a flat list of scalars, spelled the way cells are.
fn condition_values(
    tag: &str,
    column: &str,
    value: &toml::Value,
) -> Result<BTreeSet<String>, ConfigError> {
    let items: Vec<&toml::Value> = match value {
        toml::Value::Array(items) => items.iter().collect(),
        scalar => vec![scalar],
    };
    if items.is_empty() {
        return Err(ConfigError::Validation(format!(
            "filter group '{tag}': condition '{column}' has no values"
        )));
    }

    items
        .into_iter()
        .map(|item| {
            scalar_to_string(item).ok_or_else(|| {
                ConfigError::Validation(format!(
                    "filter group '{tag}': condition '{column}' must be a scalar or a list of scalars"
                ))
            })
        })
        .collect()
}

fn scalar_to_string(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(s) => Some(s.clone()),
        toml::Value::Integer(n) => Some(normalize_int(*n)),
        toml::Value::Float(n) => Some(normalize_float(*n)),
        toml::Value::Boolean(b) => Some(normalize_bool(*b)),
        toml::Value::Datetime(d) => Some(d.to_string()),
        toml::Value::Array(_) | toml::Value::Table(_) => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const VALID: &str = r#"
source = "data/orders.xlsx"
sheet = "Orders"

[[filter_groups]]
tag = "east_open"
[filter_groups.conditions]
region = "east"
status = [1, "2", 3.0, true]

[[filter_groups]]
tag = "west"
[filter_groups.conditions]
region = ["west"]
"#;

    #[test]
    fn parse_valid() {
        let config = Config::from_toml(VALID).unwrap();
        assert_eq!(config.source, PathBuf::from("data/orders.xlsx"));
        assert_eq!(config.sheet.as_deref(), Some("Orders"));
        assert_eq!(config.filter_groups.len(), 2);

        let expected = FilterGroup::new("east_open")
            .with_condition("region", ["east"])
            .with_condition("status", ["1", "2", "3", "TRUE"]);
        assert_eq!(config.filter_groups[0], expected);
    }

    #[test]
    fn state_defaults() {
        let config = Config::from_toml(VALID).unwrap();
        assert_eq!(
            config.state,
            StateLayout {
                cache_dir: "snapshot_cache".into(),
                history_file: "result/history.json".into(),
                registry_file: "config/last_tags.toml".into(),
            }
        );
    }

    #[test]
    fn conditions_keep_document_order() {
        let input = r#"
source = "a.csv"
[[filter_groups]]
tag = "t"
[filter_groups.conditions]
zeta = "1"
alpha = "2"
"#;
        let config = Config::from_toml(input).unwrap();
        let columns: Vec<_> = config.filter_groups[0]
            .conditions
            .iter()
            .map(|c| c.column.as_str())
            .collect();
        assert_eq!(columns, vec!["zeta", "alpha"]);
    }

    #[test]
    fn empty_sheet_selects_all() {
        let input = VALID.replace("sheet = \"Orders\"", "sheet = \"\"");
        assert_eq!(Config::from_toml(&input).unwrap().sheet, None);
    }

    #[test]
    fn load_resolves_paths_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tagtrend.toml");
        fs::write(&path, VALID).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.source, dir.path().join("data/orders.xlsx"));
        assert_eq!(config.state.cache_dir, dir.path().join("snapshot_cache"));
    }

    #[test]
    fn missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    fn invalid(input: &str) -> String {
        match Config::from_toml(input) {
            Err(ConfigError::Validation(msg)) => msg,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_no_groups() {
        assert!(invalid("source = \"a.csv\"").contains("at least one"));
    }

    #[test]
    fn rejects_duplicate_tag() {
        let input = r#"
source = "a.csv"
[[filter_groups]]
tag = "t"
conditions = { a = "1" }
[[filter_groups]]
tag = "t"
conditions = { b = "1" }
"#;
        assert!(invalid(input).contains("duplicate"));
    }

    #[test]
    fn rejects_group_without_conditions() {
        let input = "source = \"a.csv\"\n[[filter_groups]]\ntag = \"t\"\n";
        assert!(invalid(input).contains("no conditions"));
    }

    #[test]
    fn rejects_empty_value_list_and_nested_values() {
        let empty = "source = \"a.csv\"\n[[filter_groups]]\ntag = \"t\"\nconditions = { a = [] }\n";
        assert!(invalid(empty).contains("no values"));

        let nested = "source = \"a.csv\"\n[[filter_groups]]\ntag = \"t\"\nconditions = { a = [[1]] }\n";
        assert!(invalid(nested).contains("scalar"));
    }

    #[test]
    fn rejects_empty_source_and_tag() {
        let no_source = "source = \"\"\n[[filter_groups]]\ntag = \"t\"\nconditions = { a = \"1\" }\n";
        assert!(invalid(no_source).contains("source"));

        let no_tag = "source = \"a.csv\"\n[[filter_groups]]\ntag = \" \"\nconditions = { a = \"1\" }\n";
        assert!(invalid(no_tag).contains("tag"));
    }

    #[test]
    fn unknown_keys_fail_to_parse() {
        let input = format!("colour = \"blue\"\n{VALID}");
        assert!(matches!(Config::from_toml(&input), Err(ConfigError::Parse(_))));
    }
}

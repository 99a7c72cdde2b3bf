use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use toml::Value;
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::source::Config;

/// Section holding settings shared by every namespace.
pub const COMMON_SECTION: &str = "common";

/// Config file name inside the config directory.
pub const FILE_NAME: &str = "imsto.toml";

/// Environment variable naming the config directory.
pub const CONF_ENV: &str = "IMSTO_CONF";

/// Prefix of environment variables that override config keys.
pub const ENV_PREFIX: &str = "IMSTO_";

const DEFAULTS: &str = r#"
[common]
max_quality = 88
max_file_size = 262114
max_width = 1600
max_height = 1600
min_width = 50
min_height = 50
normalize = true
"#;

type Section = BTreeMap<String, String>;

/// TOML-backed configuration with layered lookup.
///
/// [`Config::value`] consults, in order: environment overrides, the
/// requested section, the loaded `[common]` section, and the built-in
/// defaults. The built-in defaults never name an `engine`.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    sections: BTreeMap<String, Section>,
    defaults: Section,
    overrides: Section,
}

impl StoreConfig {
    /// Configuration with only the built-in defaults.
    pub fn empty() -> Self {
        Self {
            sections: BTreeMap::new(),
            defaults: builtin_defaults(),
            overrides: Section::new(),
        }
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let sections = parse_sections(text, "<inline>")?;
        Ok(Self {
            sections,
            ..Self::empty()
        })
    }

    /// Load `imsto.toml` from `dir`.
    pub fn load(dir: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = dir.as_ref().join(FILE_NAME);
        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let sections = parse_sections(&text, &path.display().to_string())?;
        debug!(path = %path.display(), sections = sections.len(), "config loaded");
        Ok(Self {
            sections,
            ..Self::empty()
        })
    }

    /// Load from the directory named by `IMSTO_CONF`.
    pub fn load_from_env() -> ConfigResult<Self> {
        match std::env::var(CONF_ENV) {
            Ok(dir) if !dir.trim().is_empty() => Self::load(dir),
            _ => Err(ConfigError::MissingConfDir),
        }
    }

    /// Apply `IMSTO_<KEY>` variables as overrides for every section.
    ///
    /// `IMSTO_CONF` is skipped; keys are lower-cased, so `IMSTO_LOCAL_ROOT`
    /// overrides `local_root`.
    pub fn with_env_overrides<I>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (name, value) in vars {
            if name == CONF_ENV {
                continue;
            }
            if let Some(key) = name.strip_prefix(ENV_PREFIX) {
                if !key.is_empty() {
                    self.overrides.insert(key.to_ascii_lowercase(), value);
                }
            }
        }
        self
    }

    /// Names of all loaded sections.
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    /// Sections marked `administrable`, mapped to their display label.
    pub fn administrable_sections(&self) -> BTreeMap<String, String> {
        self.sections
            .iter()
            .filter(|(name, _)| name.as_str() != COMMON_SECTION)
            .filter(|(_, section)| section.contains_key("administrable"))
            .map(|(name, section)| {
                let label = section
                    .get("label")
                    .cloned()
                    .unwrap_or_else(|| name.to_uppercase());
                (name.clone(), label)
            })
            .collect()
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::empty()
    }
}

impl Config for StoreConfig {
    fn value(&self, section: &str, key: &str) -> Option<String> {
        let found = self
            .overrides
            .get(key)
            .or_else(|| self.sections.get(section).and_then(|s| s.get(key)))
            .or_else(|| self.sections.get(COMMON_SECTION).and_then(|s| s.get(key)))
            .or_else(|| self.defaults.get(key));
        if found.is_none() {
            debug!(section, key, "config value missing");
        }
        found.cloned()
    }

    fn has_section(&self, section: &str) -> bool {
        self.sections.contains_key(section)
    }
}

fn builtin_defaults() -> Section {
    parse_sections(DEFAULTS, "<defaults>")
        .ok()
        .and_then(|mut s| s.remove(COMMON_SECTION))
        .unwrap_or_default()
}

/// One top-level entry of a config file: a `[section]` table or a bare key
/// that belongs to the common section.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Section(BTreeMap<String, Value>),
    Scalar(Value),
}

fn parse_sections(text: &str, origin: &str) -> ConfigResult<BTreeMap<String, Section>> {
    let raw: BTreeMap<String, RawEntry> =
        toml::from_str(text).map_err(|e: toml::de::Error| ConfigError::Parse {
            origin: origin.to_string(),
            message: e.message().to_string(),
        })?;

    let mut sections: BTreeMap<String, Section> = BTreeMap::new();
    for (name, entry) in raw {
        match entry {
            RawEntry::Section(inner) => {
                let section = sections.entry(name).or_default();
                for (key, value) in inner {
                    if let Some(rendered) = render_scalar(&value) {
                        section.insert(key, rendered);
                    }
                }
            }
            RawEntry::Scalar(value) => {
                // Top-level keys belong to the common section.
                if let Some(rendered) = render_scalar(&value) {
                    sections
                        .entry(COMMON_SECTION.to_string())
                        .or_default()
                        .insert(name, rendered);
                }
            }
        }
    }
    Ok(sections)
}

fn render_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim_matches('"').to_string()),
        Value::Integer(i) => Some(i.to_string()),
        Value::Float(f) => Some(f.to_string()),
        Value::Boolean(b) => Some(b.to_string()),
        Value::Datetime(d) => Some(d.to_string()),
        Value::Array(items) => {
            let parts: Option<Vec<String>> = items.iter().map(render_scalar).collect();
            parts.map(|p| p.join(","))
        }
        Value::Table(_) => None,
    }
}

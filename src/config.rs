//! Configuration module for the mapping resolver.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//! - CLI argument overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `MW_` and use double underscores
//! to separate nested levels:
//! - `MW_RESOLUTION__PARALLEL_THREADS=8` sets `resolution.parallel_threads`
//! - `MW_DIRECTIVES__ROOT_NAMESPACE=Mapping` sets `directives.root_namespace`
//! - `MW_DEBUG=true` sets `debug`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const CONFIG_DIR: &str = ".mapweave";
const CONFIG_FILE: &str = "settings.toml";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Global debug mode
    #[serde(default = "default_false")]
    pub debug: bool,

    /// Annotation vocabulary recognized on types and members
    #[serde(default)]
    pub directives: DirectiveConfig,

    /// Resolution run settings
    #[serde(default)]
    pub resolution: ResolutionConfig,
}

/// Names of the annotations and runtime types the generated code is built around.
///
/// Annotation names are matched with or without the `Attribute` suffix and
/// with or without the `root_namespace` qualifier.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct DirectiveConfig {
    #[serde(default = "default_root_namespace")]
    pub root_namespace: String,

    /// `[Map(typeof(T), MappingDirection.From)]`
    #[serde(default = "default_map_attribute")]
    pub map_attribute: String,

    /// `[MapFrom(typeof(T))]`
    #[serde(default = "default_map_from_attribute")]
    pub map_from_attribute: String,

    /// `[MapTo(typeof(T))]`
    #[serde(default = "default_map_to_attribute")]
    pub map_to_attribute: String,

    #[serde(default = "default_ignore_attribute")]
    pub ignore_attribute: String,

    #[serde(default = "default_property_attribute")]
    pub property_attribute: String,

    #[serde(default = "default_converter_attribute")]
    pub converter_attribute: String,

    /// Two-parameter interface a converter must implement
    #[serde(default = "default_converter_interface")]
    pub converter_interface: String,

    /// Conversion-context type taken by the auxiliary constructor
    #[serde(default = "default_context_type")]
    pub context_type: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ResolutionConfig {
    /// Number of threads used to resolve independent mappings
    #[serde(default = "default_parallel_threads")]
    pub parallel_threads: usize,

    /// Namespaces every plan imports
    #[serde(default = "default_base_imports")]
    pub base_imports: Vec<String>,

    /// Namespace required for element-wise projection of collections
    #[serde(default = "default_collection_namespace")]
    pub collection_namespace: String,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_false() -> bool {
    false
}
fn default_root_namespace() -> String {
    "MapTo".to_string()
}
fn default_map_attribute() -> String {
    "Map".to_string()
}
fn default_map_from_attribute() -> String {
    "MapFrom".to_string()
}
fn default_map_to_attribute() -> String {
    "MapTo".to_string()
}
fn default_ignore_attribute() -> String {
    "IgnoreProperty".to_string()
}
fn default_property_attribute() -> String {
    "MapProperty".to_string()
}
fn default_converter_attribute() -> String {
    "MapTypeConverter".to_string()
}
fn default_converter_interface() -> String {
    "MapTo.ITypeConverter".to_string()
}
fn default_context_type() -> String {
    "MapTo.MappingContext".to_string()
}
fn default_parallel_threads() -> usize {
    num_cpus::get()
}
fn default_base_imports() -> Vec<String> {
    vec!["System".to_string(), "MapTo".to_string()]
}
fn default_collection_namespace() -> String {
    "System.Linq".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            debug: false,
            directives: DirectiveConfig::default(),
            resolution: ResolutionConfig::default(),
        }
    }
}

impl Default for DirectiveConfig {
    fn default() -> Self {
        Self {
            root_namespace: default_root_namespace(),
            map_attribute: default_map_attribute(),
            map_from_attribute: default_map_from_attribute(),
            map_to_attribute: default_map_to_attribute(),
            ignore_attribute: default_ignore_attribute(),
            property_attribute: default_property_attribute(),
            converter_attribute: default_converter_attribute(),
            converter_interface: default_converter_interface(),
            context_type: default_context_type(),
        }
    }
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            parallel_threads: default_parallel_threads(),
            base_imports: default_base_imports(),
            collection_namespace: default_collection_namespace(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        // Try to find the workspace root by looking for .mapweave directory
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join(CONFIG_FILE));

        Self::figment(config_path).extract().map_err(Box::new)
    }

    /// Load configuration from a specific file, still honoring env overrides
    pub fn load_from(path: impl AsRef<std::path::Path>) -> Result<Self, Box<figment::Error>> {
        Self::figment(path.as_ref().to_path_buf())
            .extract()
            .map_err(Box::new)
    }

    fn figment(config_path: PathBuf) -> Figment {
        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(config_path))
            // Layer in environment variables with MW_ prefix
            // Use double underscore (__) to separate nested levels
            .merge(Env::prefixed("MW_").map(|key| {
                key.as_str()
                    .to_lowercase()
                    .replace("__", ".") // Double underscore becomes dot
                    .into()
            }))
    }

    /// Find the workspace config by looking for .mapweave directory
    /// Searches from current directory up to root
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(CONFIG_DIR);
            if config_dir.exists() && config_dir.is_dir() {
                return Some(config_dir.join(CONFIG_FILE));
            }
        }

        None
    }

    /// Validate values figment cannot check on its own
    pub fn validate(&self) -> Result<(), String> {
        if self.resolution.parallel_threads == 0 {
            return Err("resolution.parallel_threads must be at least 1".to_string());
        }
        let d = &self.directives;
        for (key, value) in [
            ("directives.map_attribute", &d.map_attribute),
            ("directives.map_from_attribute", &d.map_from_attribute),
            ("directives.map_to_attribute", &d.map_to_attribute),
            ("directives.ignore_attribute", &d.ignore_attribute),
            ("directives.property_attribute", &d.property_attribute),
            ("directives.converter_attribute", &d.converter_attribute),
            ("directives.converter_interface", &d.converter_interface),
            ("directives.context_type", &d.context_type),
        ] {
            if value.trim().is_empty() {
                return Err(format!("{key} must not be empty"));
            }
        }
        Ok(())
    }

    /// Save current configuration to file
    pub fn save(
        &self,
        path: impl AsRef<std::path::Path>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file under `root`
    pub fn init_config_file(
        root: impl AsRef<std::path::Path>,
        force: bool,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = root.as_ref().join(CONFIG_DIR).join(CONFIG_FILE);

        if config_path.exists() && !force {
            return Err(format!(
                "Configuration file already exists at: {}",
                config_path.display()
            )
            .into());
        }

        Settings::default().save(&config_path)?;
        Ok(config_path)
    }
}

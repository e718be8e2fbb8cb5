// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::*;
use crate::errors::ConfigError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure for the provisioning workflow.
///
/// Every section is optional in the YAML file except `server.model_path`;
/// missing sections fall back to the constants in [`crate::config::consts`].
/// The values are read once at startup and never mutated afterwards.
///
/// # Example
/// ```yaml
/// environment:
///   name: sglang
///   python_version: "3.10"
/// packages:
///   accelerator_toolkit: "12.1"
///   serving:
///     name: "sglang[all]"
///     version: "0.3.0"
/// server:
///   model_path: meta-llama/Meta-Llama-3-8B-Instruct
///   tensor_parallel: 2
///   port: 30000
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub system: SystemConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub environment: EnvironmentConfig,
    #[serde(default)]
    pub packages: PackagesConfig,
    pub server: ServerConfig,
}

/// OS-level packages required before anything else runs.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SystemConfig {
    #[serde(default = "default_system_packages")]
    pub packages: Vec<String>,
    /// Prefix for package manager calls, e.g. `sudo`
    #[serde(default)]
    pub privilege_command: Option<String>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            packages: default_system_packages(),
            privilege_command: None,
        }
    }
}

/// Python distribution manager installation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeConfig {
    pub install_dir: Option<PathBuf>,
    pub installer_url: Option<String>,
    pub artifact: Option<String>,
    pub download_dir: Option<PathBuf>,
}

impl RuntimeConfig {
    /// Installation directory, defaulting to `$HOME/miniconda3`.
    pub fn install_dir(&self) -> PathBuf {
        if let Some(dir) = &self.install_dir {
            return dir.clone();
        }
        std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(FALLBACK_INSTALL_ROOT))
            .join(DEFAULT_INSTALL_DIR_NAME)
    }

    pub fn installer_url(&self) -> &str {
        self.installer_url.as_deref().unwrap_or(DEFAULT_INSTALLER_URL)
    }

    /// Local artifact file name, defaulting to the last segment of the installer URL.
    pub fn artifact_name(&self) -> String {
        match &self.artifact {
            Some(name) => name.clone(),
            None => self
                .installer_url()
                .rsplit('/')
                .next()
                .filter(|segment| !segment.is_empty())
                .unwrap_or("installer.sh")
                .to_string(),
        }
    }

    pub fn artifact_path(&self) -> PathBuf {
        self.download_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(self.artifact_name())
    }

    /// Path of the `conda` executable inside the installation.
    pub fn conda_bin(&self) -> PathBuf {
        self.install_dir().join("bin").join("conda")
    }
}

/// Named, isolated interpreter environment.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentConfig {
    #[serde(default = "default_environment_name")]
    pub name: String,
    #[serde(default = "default_python_version")]
    pub python_version: String,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            name: default_environment_name(),
            python_version: default_python_version(),
        }
    }
}

/// A pip requirement with an optional pinned version.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageSpec {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
}

impl PackageSpec {
    pub fn new(name: &str, version: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            version: version.map(str::to_string),
        }
    }

    /// Requirement string understood by pip (`name==version` or `name`).
    pub fn requirement(&self) -> String {
        match &self.version {
            Some(version) => format!("{}=={}", self.name, version),
            None => self.name.clone(),
        }
    }
}

/// Packages installed into the environment.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackagesConfig {
    #[serde(default = "default_accelerator_toolkit")]
    pub accelerator_toolkit: String,
    #[serde(default = "default_index_url_template")]
    pub index_url_template: String,
    #[serde(default = "default_numerical")]
    pub numerical: PackageSpec,
    #[serde(default = "default_serving")]
    pub serving: PackageSpec,
    #[serde(default)]
    pub auxiliary: Vec<PackageSpec>,
    #[serde(default)]
    pub extra_index_urls: Vec<String>,
}

impl Default for PackagesConfig {
    fn default() -> Self {
        Self {
            accelerator_toolkit: default_accelerator_toolkit(),
            index_url_template: default_index_url_template(),
            numerical: default_numerical(),
            serving: default_serving(),
            auxiliary: Vec::new(),
            extra_index_urls: Vec::new(),
        }
    }
}

impl PackagesConfig {
    /// Wheel index matching the accelerator toolkit (`12.1` -> `.../cu121`).
    pub fn numerical_index_url(&self) -> String {
        let compact: String = self
            .accelerator_toolkit
            .chars()
            .filter(|c| *c != '.')
            .collect();
        self.index_url_template.replace(TOOLKIT_PLACEHOLDER, &compact)
    }
}

/// Value of an extra server flag.
///
/// Booleans render as bare switches (`true`) or are omitted (`false`).
/// Strings pass through verbatim. Numbers are parsed, so they render in
/// canonical form (`0.90` becomes `0.9`); quote a value to keep its text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
    Switch(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

/// External inference server invocation.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_server_module")]
    pub module: String,
    pub model_path: String,
    #[serde(default)]
    pub tokenizer_path: Option<String>,
    #[serde(default = "default_tensor_parallel")]
    pub tensor_parallel: u32,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_dtype")]
    pub dtype: String,
    /// Rendered in canonical form, so `0.90` is emitted as `0.9`.
    #[serde(default = "default_mem_fraction")]
    pub mem_fraction: f64,
    #[serde(default = "default_max_running_requests")]
    pub max_running_requests: u32,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Flags without a dedicated field, keyed by flag name without dashes
    #[serde(default)]
    pub extra_flags: BTreeMap<String, FlagValue>,
    /// Additional environment variables for the server process
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl ServerConfig {
    pub fn tokenizer_path(&self) -> &str {
        self.tokenizer_path.as_deref().unwrap_or(&self.model_path)
    }
}

/// Values supplied on the command line that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub model_path: Option<String>,
    pub tensor_parallel: Option<u32>,
    pub port: Option<u16>,
    pub host: Option<String>,
    pub environment_name: Option<String>,
}

impl Config {
    /// Apply command line overrides. Called once, before validation.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(model_path) = &overrides.model_path {
            self.server.model_path = model_path.clone();
        }
        if let Some(tp) = overrides.tensor_parallel {
            self.server.tensor_parallel = tp;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(host) = &overrides.host {
            self.server.host = host.clone();
        }
        if let Some(name) = &overrides.environment_name {
            self.environment.name = name.clone();
        }
    }
}

fn default_system_packages() -> Vec<String> {
    DEFAULT_SYSTEM_PACKAGES.iter().map(|p| p.to_string()).collect()
}
fn default_environment_name() -> String {
    DEFAULT_ENVIRONMENT_NAME.to_string()
}
fn default_python_version() -> String {
    DEFAULT_PYTHON_VERSION.to_string()
}
fn default_accelerator_toolkit() -> String {
    DEFAULT_ACCELERATOR_TOOLKIT.to_string()
}
fn default_index_url_template() -> String {
    DEFAULT_INDEX_URL_TEMPLATE.to_string()
}
fn default_numerical() -> PackageSpec {
    PackageSpec::new(DEFAULT_NUMERICAL_PACKAGE, None)
}
fn default_serving() -> PackageSpec {
    PackageSpec::new(DEFAULT_SERVING_PACKAGE, None)
}
fn default_server_module() -> String {
    DEFAULT_SERVER_MODULE.to_string()
}
fn default_tensor_parallel() -> u32 {
    DEFAULT_TENSOR_PARALLEL
}
fn default_host() -> String {
    DEFAULT_HOST.to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_dtype() -> String {
    DEFAULT_DTYPE.to_string()
}
fn default_mem_fraction() -> f64 {
    DEFAULT_MEM_FRACTION
}
fn default_max_running_requests() -> u32 {
    DEFAULT_MAX_RUNNING_REQUESTS
}
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

/// Parse a config from YAML text.
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    Ok(serde_yaml::from_str(content)?)
}

/// Load a config from a YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content)
}

/// Load a config, apply overrides, and validate it.
///
/// All validation problems are reported together rather than one at a time.
pub fn load_and_validate_config<P: AsRef<Path>>(
    path: P,
    overrides: &ConfigOverrides,
) -> Result<Config, ConfigError> {
    let mut cfg = load_config(path)?;
    cfg.apply_overrides(overrides);
    crate::config::validate_config(&cfg).map_err(ConfigError::Invalid)?;
    Ok(cfg)
}

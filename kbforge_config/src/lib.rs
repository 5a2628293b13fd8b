use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Conventional settings file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "kbforge.json";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Config {
    /// Folder where the test version of the knowledge base is created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_output_folder: Option<PathBuf>,
    #[serde(default = "Config::default_test_cases_folder")]
    pub test_cases_folder: PathBuf,
    #[serde(default = "Config::default_input_folder")]
    pub input_folder: PathBuf,
    #[serde(default = "Config::default_output_folder")]
    pub output_folder: PathBuf,
    /// Provenance text written at the top of every theme file.
    #[serde(default = "Config::default_header")]
    pub header: String,
    #[serde(default)]
    pub fast_load: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            test_output_folder: None,
            test_cases_folder: Self::default_test_cases_folder(),
            input_folder: Self::default_input_folder(),
            output_folder: Self::default_output_folder(),
            header: Self::default_header(),
            fast_load: false,
        }
    }
}

impl Config {
    fn default_test_cases_folder() -> PathBuf {
        PathBuf::from("testCases")
    }

    fn default_input_folder() -> PathBuf {
        PathBuf::from("data")
    }

    fn default_output_folder() -> PathBuf {
        PathBuf::from("kb")
    }

    fn default_header() -> String {
        format!("Generated by kbforge {}", env!("CARGO_PKG_VERSION"))
    }

    /// Load the settings from `path`, or from the conventional locations:
    /// `kbforge.json` in the working directory, then `~/kbforge/config.json`.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::default_path()?,
        };

        if !config_path.exists() {
            anyhow::bail!(
                "Config file not found at: {}. Please run 'kbforge init' to create config.",
                config_path.display()
            );
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid config {}: {e}", config_path.display()))?;
        info!("Loaded config from {}", config_path.display());

        Ok(config)
    }

    /// The settings file used when none is given.
    pub fn default_path() -> anyhow::Result<PathBuf> {
        let local = PathBuf::from(DEFAULT_CONFIG_FILE);
        if local.exists() {
            return Ok(local);
        }
        Ok(Self::config_dir()?.join("config.json"))
    }

    fn config_dir() -> anyhow::Result<PathBuf> {
        Ok(dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?
            .join("kbforge"))
    }

    /// The folder for test output, which test runs cannot do without.
    pub fn require_test_output_folder(&self) -> anyhow::Result<&Path> {
        self.test_output_folder.as_deref().ok_or_else(|| {
            anyhow::anyhow!("'test_output_folder' is not set: the folder where the test version of the knowledge base should be created")
        })
    }

    /// Write a settings template to `path`, or to `kbforge.json` in the
    /// working directory. Never overwrites an existing file.
    pub fn create_config(path: Option<&Path>) -> anyhow::Result<PathBuf> {
        let config_path = path.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), Path::to_path_buf);

        if config_path.exists() {
            anyhow::bail!(
                "Config file already exists at: {}. Please edit it directly.",
                config_path.display()
            );
        }
        if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let template = Self {
            test_output_folder: Some(PathBuf::from("testOutput")),
            ..Self::default()
        };
        std::fs::write(&config_path, serde_json::to_string_pretty(&template)?)?;
        println!("Config file created at: {}", config_path.display());
        Ok(config_path)
    }
}

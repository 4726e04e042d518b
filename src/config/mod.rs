use crate::models::ToolConfig;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// Configuration manager for loading and saving the YAML tool configuration.
///
/// Manages one file, `wwiserip.yaml`, which locates the external tool bundle
/// and its batch-workflow folders. A missing file means defaults, which are
/// persisted so users have something to edit.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    tool_config_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the specified configuration directory.
    ///
    /// # Arguments
    /// * `config_dir` - Directory containing configuration files (e.g., "config")
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        // Create config directory if it doesn't exist
        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            tool_config_path: config_dir.join("wwiserip.yaml"),
            config_dir,
        })
    }

    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    /// Load the tool configuration file.
    ///
    /// # Returns
    /// The loaded ToolConfig; defaults are written and returned when the file
    /// doesn't exist yet.
    pub fn load_tool_config(&self) -> Result<ToolConfig> {
        if !self.tool_config_path.exists() {
            tracing::warn!(
                "Tool config not found at {}, writing defaults",
                self.tool_config_path
            );
            let config = ToolConfig::default();
            self.save_tool_config(&config)?;
            return Ok(config);
        }

        let file_contents = fs::read_to_string(&self.tool_config_path)
            .with_context(|| format!("Failed to read tool config: {}", self.tool_config_path))?;

        let config: ToolConfig = serde_yaml_ng::from_str(&file_contents)
            .with_context(|| format!("Failed to parse tool config: {}", self.tool_config_path))?;

        tracing::info!("Loaded tool config from {}", self.tool_config_path);
        Ok(config)
    }

    /// Save the tool configuration file.
    ///
    /// # Arguments
    /// * `config` - The ToolConfig to save
    pub fn save_tool_config(&self, config: &ToolConfig) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(config).context("Failed to serialize tool config to YAML")?;

        fs::write(&self.tool_config_path, yaml_string)
            .with_context(|| format!("Failed to write tool config: {}", self.tool_config_path))?;

        tracing::info!("Saved tool config to {}", self.tool_config_path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manager(temp: &TempDir) -> ConfigManager {
        let dir = Utf8PathBuf::from_path_buf(temp.path().join("config")).unwrap();
        ConfigManager::new(dir).unwrap()
    }

    #[test]
    fn test_creates_config_directory() {
        let temp = TempDir::new().unwrap();
        let manager = manager(&temp);
        assert!(manager.config_dir().exists());
    }

    #[test]
    fn test_missing_file_persists_defaults() {
        let temp = TempDir::new().unwrap();
        let manager = manager(&temp);

        let config = manager.load_tool_config().unwrap();
        assert_eq!(config.quickbms, "quickbms.exe");
        assert!(manager.config_dir().join("wwiserip.yaml").exists());
    }

    #[test]
    fn test_round_trip() {
        let temp = TempDir::new().unwrap();
        let manager = manager(&temp);

        let mut config = ToolConfig::default();
        config.tools_dir = "/opt/wwise/tools".to_string();
        config.tool_timeout_secs = 90;
        manager.save_tool_config(&config).unwrap();

        let loaded = manager.load_tool_config().unwrap();
        assert_eq!(loaded.tools_dir, "/opt/wwise/tools");
        assert_eq!(loaded.tool_timeout_secs, 90);
    }
}

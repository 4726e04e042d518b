use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tool configuration from wwiserip.yaml
///
/// Locates the external tool bundle (QuickBMS, vgmstream, bnkextr) and the
/// folders its batch workflow owns. Relative tool paths are resolved against
/// `tools_dir`; the batch script and staging folders are used as written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    #[serde(default = "default_tools_dir")]
    pub tools_dir: String,

    #[serde(default = "default_quickbms")]
    pub quickbms: String,

    #[serde(default = "default_pck_script")]
    pub pck_script: String,

    #[serde(default = "default_vgmstream")]
    pub vgmstream: String,

    #[serde(default = "default_bnkextr")]
    pub bnkextr: String,

    #[serde(default = "default_batch_script")]
    pub batch_script: String,

    #[serde(default = "default_staging_input")]
    pub staging_input_dir: String,

    #[serde(default = "default_staging_output")]
    pub staging_output_dir: String,

    /// Per-invocation timeout in seconds; 0 disables the limit.
    #[serde(default)]
    pub tool_timeout_secs: u64,
}

impl ToolConfig {
    pub fn tool_timeout(&self) -> Option<Duration> {
        match self.tool_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            tools_dir: default_tools_dir(),
            quickbms: default_quickbms(),
            pck_script: default_pck_script(),
            vgmstream: default_vgmstream(),
            bnkextr: default_bnkextr(),
            batch_script: default_batch_script(),
            staging_input_dir: default_staging_input(),
            staging_output_dir: default_staging_output(),
            tool_timeout_secs: 0,
        }
    }
}

fn default_tools_dir() -> String {
    "Wwise-Unpacker/Tools".to_string()
}

fn default_quickbms() -> String {
    "quickbms.exe".to_string()
}

fn default_pck_script() -> String {
    "wwise_pck_extractor.bms".to_string()
}

fn default_vgmstream() -> String {
    "vgmstream-cli.exe".to_string()
}

fn default_bnkextr() -> String {
    "bnkextr.exe".to_string()
}

fn default_batch_script() -> String {
    "Wwise-Unpacker/Unpack_to_wem.bat".to_string()
}

fn default_staging_input() -> String {
    "Wwise-Unpacker/Game Files".to_string()
}

fn default_staging_output() -> String {
    "Wwise-Unpacker/Unpacked_wem".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_config_defaults() {
        let config = ToolConfig::default();
        assert_eq!(config.tools_dir, "Wwise-Unpacker/Tools");
        assert_eq!(config.quickbms, "quickbms.exe");
        assert_eq!(config.tool_timeout_secs, 0);
        assert!(config.tool_timeout().is_none());
    }

    #[test]
    fn test_timeout_zero_means_unlimited() {
        let mut config = ToolConfig::default();
        config.tool_timeout_secs = 120;
        assert_eq!(config.tool_timeout(), Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config: ToolConfig = serde_yaml_ng::from_str("tools_dir: /opt/tools\n").unwrap();
        assert_eq!(config.tools_dir, "/opt/tools");
        assert_eq!(config.vgmstream, "vgmstream-cli.exe");
    }
}

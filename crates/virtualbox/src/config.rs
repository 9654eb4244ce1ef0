//! Runner configuration.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Host-side management tool.
pub const DEFAULT_MANAGE_PROGRAM: &str = "VBoxManage";
/// Guest-side control tool.
pub const DEFAULT_CONTROL_PROGRAM: &str = "VBoxControl";
pub const DEFAULT_ELEVATION_PROGRAM: &str = "sudo";
pub const DEFAULT_ELEVATION_GROUP: &str = "sudo";

/// Environment variables set by the VirtualBox installer on Windows, in
/// lookup order.
const INSTALL_PATH_VARS: [&str; 2] = ["VBOX_INSTALL_PATH", "VBOX_MSI_INSTALL_PATH"];

/// Configuration shared by every runner built from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Log every resolved command line and stream child output live.
    pub verbose: bool,
    /// Name or path of the host-side management tool.
    pub manage_program: String,
    /// Name or path of the guest-side control tool.
    pub control_program: String,
    /// Program prefixed to elevated invocations.
    pub elevation_program: String,
    /// Group whose members may elevate.
    pub elevation_group: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            manage_program: DEFAULT_MANAGE_PROGRAM.to_string(),
            control_program: DEFAULT_CONTROL_PROGRAM.to_string(),
            elevation_program: DEFAULT_ELEVATION_PROGRAM.to_string(),
            elevation_group: DEFAULT_ELEVATION_GROUP.to_string(),
        }
    }
}

impl RunnerConfig {
    /// Set verbosity, keeping everything else.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Resolve the host-side program.
    ///
    /// An explicitly configured program is used as-is. The default is looked
    /// up in the VirtualBox install directory on Windows, where the installer
    /// does not put it on `PATH`.
    pub fn resolve_manage_program(&self) -> String {
        if self.manage_program != DEFAULT_MANAGE_PROGRAM || !cfg!(windows) {
            return self.manage_program.clone();
        }

        INSTALL_PATH_VARS
            .iter()
            .filter_map(|var| env::var_os(var).filter(|v| !v.is_empty()))
            .find_map(|dir| {
                let dir = dir.to_string_lossy().into_owned();
                install_dir_program(&dir, DEFAULT_MANAGE_PROGRAM)
            })
            .unwrap_or_else(|| self.manage_program.clone())
    }
}

/// Join `program` onto the first entry of an install path variable.
fn install_dir_program(install_path: &str, program: &str) -> Option<String> {
    let dir = install_path
        .split(';')
        .map(str::trim)
        .find(|entry| !entry.is_empty())?;
    let file = format!("{program}{}", env::consts::EXE_SUFFIX);
    Some(Path::new(dir).join(file).to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = RunnerConfig::default();
        assert!(!config.verbose);
        assert_eq!(config.manage_program, "VBoxManage");
        assert_eq!(config.control_program, "VBoxControl");
        assert_eq!(config.elevation_program, "sudo");
        assert_eq!(config.elevation_group, "sudo");
    }

    #[test]
    fn test_config_serialization() {
        let config = RunnerConfig {
            verbose: true,
            manage_program: "/opt/vbox/VBoxManage".to_string(),
            control_program: "/usr/bin/VBoxControl".to_string(),
            elevation_program: "doas".to_string(),
            elevation_group: "wheel".to_string(),
        };

        let json = serde_json::to_string(&config).unwrap();
        let parsed: RunnerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_config_partial_uses_defaults() {
        let parsed: RunnerConfig = serde_json::from_str(r#"{"verbose": true}"#).unwrap();
        assert!(parsed.verbose);
        assert_eq!(parsed.manage_program, DEFAULT_MANAGE_PROGRAM);
        assert_eq!(parsed.elevation_group, DEFAULT_ELEVATION_GROUP);
    }

    #[test]
    fn test_explicit_manage_program_is_kept() {
        let config = RunnerConfig {
            manage_program: "/custom/VBoxManage".to_string(),
            ..Default::default()
        };
        assert_eq!(config.resolve_manage_program(), "/custom/VBoxManage");
    }

    #[cfg(not(windows))]
    #[test]
    fn test_default_manage_program_outside_windows() {
        assert_eq!(
            RunnerConfig::default().resolve_manage_program(),
            DEFAULT_MANAGE_PROGRAM
        );
    }

    #[test]
    fn test_install_dir_program() {
        let resolved = install_dir_program(" /opt/vbox ;/other", "VBoxManage").unwrap();
        let expected = Path::new("/opt/vbox")
            .join(format!("VBoxManage{}", env::consts::EXE_SUFFIX))
            .to_string_lossy()
            .into_owned();
        assert_eq!(resolved, expected);
        assert!(install_dir_program(" ; ", "VBoxManage").is_none());
    }
}

//! Host environment description embedded in the pre-prompt.
//!
//! Gives the model enough to propose commands that fit this machine: where
//! the user is, which shell runs the actions, and which OS and locale apply.

use std::path::PathBuf;

/// Snapshot of the environment taken at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemContext {
    pub cwd: PathBuf,
    /// Shell that runs confirmed actions.
    pub shell: String,
    pub os: String,
    pub distro: Option<String>,
    /// Value of `$LANG`, if set.
    pub lang: Option<String>,
}

impl SystemContext {
    /// Gather the context, with `shell` being the configured executor shell.
    pub fn gather(shell: &str) -> Self {
        Self {
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            shell: shell.to_string(),
            os: os_info(),
            distro: distro_info(),
            lang: std::env::var("LANG").ok().filter(|l| !l.is_empty()),
        }
    }

    /// Render as `Key: value` lines for the pre-prompt.
    pub fn describe(&self) -> String {
        let mut lines = vec![format!("OS: {}", self.os)];
        if let Some(distro) = &self.distro {
            lines.push(format!("Distro: {}", distro));
        }
        lines.push(format!("Shell: {}", self.shell));
        lines.push(format!("CWD: {}", self.cwd.display()));
        if let Some(lang) = &self.lang {
            lines.push(format!("Locale: {}", lang));
        }
        lines.join("\n")
    }
}

fn os_info() -> String {
    #[cfg(unix)]
    {
        use std::process::Command;
        if let Ok(output) = Command::new("uname").args(["-s", "-r", "-m"]).output() {
            if output.status.success() {
                let uname = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !uname.is_empty() {
                    return uname;
                }
            }
        }
    }

    format!("{} {}", std::env::consts::OS, std::env::consts::ARCH)
}

/// `PRETTY_NAME` from os-release on Linux, the product version on macOS.
fn distro_info() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        if let Ok(contents) = std::fs::read_to_string("/etc/os-release") {
            return parse_pretty_name(&contents);
        }
    }

    #[cfg(target_os = "macos")]
    {
        use std::process::Command;
        if let Ok(output) = Command::new("sw_vers").arg("-productVersion").output() {
            if output.status.success() {
                let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
                return Some(format!("macOS {}", version));
            }
        }
    }

    None
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_pretty_name(os_release: &str) -> Option<String> {
    os_release
        .lines()
        .find_map(|line| line.strip_prefix("PRETTY_NAME="))
        .map(|name| name.trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
}

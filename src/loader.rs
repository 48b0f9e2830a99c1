//! Initialization commands for a virtualfish session.
//!
//! Builds the ordered statements that set up virtualfish inside a fish
//! session: version and interpreter globals, the base script, then each
//! requested plugin. Feed the result to [`Shell::run_all`](crate::Shell::run_all).

use std::path::{Path, PathBuf};
use std::process::Stdio;

use crate::error::ShellError;
use crate::Result;

/// Base script sourced before any plugin.
pub const BASE_SCRIPT: &str = "virtual.fish";

/// Event emitted once every plugin has been sourced.
pub const SETUP_EVENT: &str = "virtualfish_did_setup_plugins";

const VERSION_QUERY: &str =
    "import importlib.metadata as m; print(m.version('virtualfish'))";

/// Describes how to bootstrap virtualfish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitScript {
    /// Directory holding `virtual.fish` and `<plugin>.fish` files.
    pub base_dir: PathBuf,
    /// Version announced as `VIRTUALFISH_VERSION`.
    pub version: String,
    /// Interpreter announced as `VIRTUALFISH_PYTHON_EXEC`.
    pub interpreter: PathBuf,
    /// Plugin names, sourced in this order.
    pub plugins: Vec<String>,
}

impl InitScript {
    /// Create an init script with no plugins.
    pub fn new(
        base_dir: impl Into<PathBuf>,
        version: impl Into<String>,
        interpreter: impl Into<PathBuf>,
    ) -> Self {
        Self {
            base_dir: base_dir.into(),
            version: version.into(),
            interpreter: interpreter.into(),
            plugins: Vec::new(),
        }
    }

    /// Add a plugin.
    pub fn plugin(mut self, name: impl Into<String>) -> Self {
        self.plugins.push(name.into());
        self
    }

    /// Add several plugins.
    pub fn plugins<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.plugins.extend(names.into_iter().map(Into::into));
        self
    }

    /// Build the ordered list of shell statements.
    ///
    /// Fails with [`ShellError::PluginNotFound`] for the first plugin whose
    /// file does not exist under `base_dir`.
    pub fn commands(&self) -> Result<Vec<String>> {
        let mut commands = vec![
            format!("set -g VIRTUALFISH_VERSION {}", self.version),
            format!(
                "set -g VIRTUALFISH_PYTHON_EXEC {}",
                self.interpreter.display()
            ),
            source(&self.base_dir.join(BASE_SCRIPT)),
        ];

        for name in &self.plugins {
            let path = self.base_dir.join(format!("{name}.fish"));
            if !path.exists() {
                return Err(ShellError::PluginNotFound {
                    name: name.clone(),
                    path,
                });
            }
            commands.push(source(&path));
        }

        commands.push(format!("emit {SETUP_EVENT}"));
        Ok(commands)
    }
}

/// Ask `interpreter` which virtualfish version is installed for it.
pub fn installed_version(interpreter: &Path) -> Result<String> {
    let program = interpreter.display().to_string();
    let output = std::process::Command::new(interpreter)
        .args(["-c", VERSION_QUERY])
        .stdin(Stdio::null())
        .output()
        .map_err(|source| ShellError::Launch {
            program: program.clone(),
            source,
        })?;

    let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if !output.status.success() || version.is_empty() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let reason = stderr.lines().last().unwrap_or("no output").to_string();
        return Err(ShellError::VersionUnknown {
            interpreter: program,
            reason,
        });
    }
    Ok(version)
}

fn source(path: &Path) -> String {
    format!(". {}", path.display())
}

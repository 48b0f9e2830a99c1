//! Command-line interface for shell-driver.
//!
//! Uses lexopt for minimal binary size overhead (~34KB).

use std::ffi::OsString;
use std::path::PathBuf;

/// Command-line arguments.
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Interpreter to launch (overrides config file).
    pub executable: Option<PathBuf>,
    /// Companion REPL script (overrides config file).
    pub script: Option<PathBuf>,
    /// Path to configuration file.
    pub config: Option<PathBuf>,
    /// Per-frame deadline in seconds.
    pub timeout_secs: Option<u64>,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: Option<String>,
    /// Directory with virtualfish scripts; enables init commands.
    pub load_dir: Option<PathBuf>,
    /// Plugins to source after the base script.
    pub plugins: Vec<String>,
    /// Interpreter announced to virtualfish.
    pub interpreter: Option<PathBuf>,
    /// Virtualfish version to announce instead of asking the interpreter.
    pub vf_version: Option<String>,
    /// Print one JSON object per command.
    pub json: bool,
    /// Commands to run. Empty means read them from stdin.
    pub commands: Vec<String>,
    /// Show version and exit.
    pub version: bool,
    /// Show help and exit.
    pub help: bool,
}

/// Parse command-line arguments.
pub fn parse_args() -> Result<Args, ArgsError> {
    parse_args_from(std::env::args_os())
}

/// Parse arguments from an iterator (for testing).
pub fn parse_args_from<I>(args: I) -> Result<Args, ArgsError>
where
    I: IntoIterator<Item = OsString>,
{
    use lexopt::prelude::*;

    let mut result = Args::default();
    let mut parser = lexopt::Parser::from_iter(args);

    while let Some(arg) = parser.next()? {
        match arg {
            Short('h') | Long("help") => {
                result.help = true;
            }
            Short('V') | Long("version") => {
                result.version = true;
            }
            Short('e') | Long("executable") => {
                result.executable = Some(parser.value()?.into());
            }
            Short('s') | Long("script") => {
                result.script = Some(parser.value()?.into());
            }
            Short('c') | Long("config") => {
                result.config = Some(parser.value()?.into());
            }
            Short('t') | Long("timeout") => {
                let value: String = parser.value()?.parse()?;
                let secs = value
                    .parse()
                    .ok()
                    .filter(|&secs: &u64| secs > 0)
                    .ok_or(ArgsError::InvalidValue("timeout", value))?;
                result.timeout_secs = Some(secs);
            }
            Short('l') | Long("log-level") => {
                result.log_level = Some(parser.value()?.parse()?);
            }
            Long("load") => {
                result.load_dir = Some(parser.value()?.into());
            }
            Long("plugin") => {
                result.plugins.push(parser.value()?.parse()?);
            }
            Long("interpreter") => {
                result.interpreter = Some(parser.value()?.into());
            }
            Long("vf-version") => {
                result.vf_version = Some(parser.value()?.parse()?);
            }
            Long("json") => {
                result.json = true;
            }
            Value(val) => {
                let command = val
                    .into_string()
                    .map_err(|v| ArgsError::InvalidValue("command", v.to_string_lossy().into()))?;
                result.commands.push(command);
            }
            _ => return Err(arg.unexpected().into()),
        }
    }

    if !result.plugins.is_empty() && result.load_dir.is_none() {
        return Err(ArgsError::PluginWithoutLoad);
    }

    Ok(result)
}

/// Print help message.
pub fn print_help() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        r#"shell-driver {version}
Run commands in a persistent shell and capture stdout, stderr and status

USAGE:
    shell-driver [OPTIONS] [COMMAND]...

Each COMMAND runs in the same shell session, so variables and the working
directory carry over. With no COMMAND, commands are read from stdin, one
per line.

OPTIONS:
    -e, --executable <PATH>   Interpreter to launch [default: fish]
    -s, --script <PATH>       Companion REPL script [default: bundled repl.fish]
    -c, --config <FILE>       Path to configuration file (JSON)
    -t, --timeout <SECS>      Give up if a frame takes longer than SECS
    -l, --log-level <LVL>     Log level (error, warn, info, debug, trace)
        --load <DIR>          Bootstrap virtualfish from DIR before running
        --plugin <NAME>       Virtualfish plugin to load (repeatable)
        --interpreter <PATH>  Python interpreter announced to virtualfish
        --vf-version <VER>    Virtualfish version [default: asked from interpreter]
        --json                Print one JSON object per command
    -h, --help                Print help
    -V, --version             Print version

ENVIRONMENT VARIABLES:
    SHELL_DRIVER_EXECUTABLE   Interpreter (overrides config)
    SHELL_DRIVER_SCRIPT       Companion script (overrides config)
    SHELL_DRIVER_TIMEOUT      Frame timeout in seconds (overrides config)
    SHELL_DRIVER_LOG_LEVEL    Log level (overrides config)
    RUST_LOG                  Alternative log level setting

EXAMPLES:
    # Run two commands in one fish session
    shell-driver 'set foo bar' 'echo $foo'

    # Use bash with the bundled bash companion
    shell-driver -e bash -s scripts/repl.bash 'cd /tmp' 'pwd'

    # Machine-readable output
    shell-driver --json 'false'
"#
    );
}

/// Map a command's exit status to the process exit code.
///
/// Statuses outside `0..=255` cannot be passed through and become 1, so
/// they never read as success.
pub fn exit_code(status: i32) -> u8 {
    u8::try_from(status).unwrap_or(1)
}

/// Print version.
pub fn print_version() {
    println!("shell-driver {}", env!("CARGO_PKG_VERSION"));
}

/// Argument parsing errors.
#[derive(Debug)]
pub enum ArgsError {
    /// Lexopt parsing error.
    Lexopt(lexopt::Error),
    /// Invalid argument value.
    InvalidValue(&'static str, String),
    /// `--plugin` given without `--load`.
    PluginWithoutLoad,
}

impl std::fmt::Display for ArgsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lexopt(e) => write!(f, "{}", e),
            Self::InvalidValue(name, value) => {
                write!(f, "invalid value for --{}: '{}'", name, value)
            }
            Self::PluginWithoutLoad => write!(f, "--plugin requires --load"),
        }
    }
}

impl std::error::Error for ArgsError {}

impl From<lexopt::Error> for ArgsError {
    fn from(e: lexopt::Error) -> Self {
        Self::Lexopt(e)
    }
}

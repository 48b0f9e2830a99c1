//! shell-driver binary entry point.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use serde::Serialize;
use shell_driver::cli::{self, Args};
use shell_driver::config::Config;
use shell_driver::loader;
use shell_driver::{logging, CommandResult, InitScript, Shell};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info};

/// One line of `--json` output.
#[derive(Serialize)]
struct Report<'a> {
    command: &'a str,
    stdout: String,
    stderr: String,
    status: i32,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {}", e);
            eprintln!("Try 'shell-driver --help' for more information.");
            return ExitCode::from(2);
        }
    };

    if args.help {
        cli::print_help();
        return ExitCode::SUCCESS;
    }

    if args.version {
        cli::print_version();
        return ExitCode::SUCCESS;
    }

    let config = match Config::load(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(2);
        }
    };

    let _ = logging::init_with(config.log_filter());
    info!("shell-driver v{}", env!("CARGO_PKG_VERSION"));

    match run(&args, &config).await {
        Ok(status) => ExitCode::from(cli::exit_code(status)),
        Err(e) => {
            error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Launch a session, run every command, and return the last status.
async fn run(args: &Args, config: &Config) -> Result<i32, Box<dyn std::error::Error>> {
    let mut shell = Shell::launch(config.to_shell_config()?)?;

    if let Some(ref dir) = args.load_dir {
        let interpreter = args
            .interpreter
            .clone()
            .unwrap_or_else(|| PathBuf::from("python3"));
        let version = match args.vf_version {
            Some(ref version) => version.clone(),
            None => loader::installed_version(&interpreter)?,
        };
        let init = InitScript::new(dir, version, interpreter)
            .plugins(args.plugins.iter().cloned());
        for result in shell.run_all(init.commands()?).await? {
            if !result.success() {
                return Err(format!(
                    "init command failed with status {}: {}",
                    result.status,
                    result.stderr_text().trim_end()
                )
                .into());
            }
        }
        debug!("virtualfish loaded from {}", dir.display());
    }

    let mut last_status = 0;
    if args.commands.is_empty() {
        // One command per line, each run as soon as it is read.
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(command) = lines.next_line().await? {
            last_status = execute(&mut shell, &command, args.json).await?;
        }
    } else {
        for command in &args.commands {
            last_status = execute(&mut shell, command, args.json).await?;
        }
    }

    // Shutdown sleeps between escalation steps.
    tokio::task::spawn_blocking(move || shell.shutdown()).await??;
    Ok(last_status)
}

async fn execute(
    shell: &mut Shell,
    command: &str,
    json: bool,
) -> Result<i32, Box<dyn std::error::Error>> {
    let result = shell.run(command).await?;
    report(command, &result, json)?;
    Ok(result.status)
}

fn report(command: &str, result: &CommandResult, json: bool) -> std::io::Result<()> {
    let mut stdout = std::io::stdout().lock();
    if json {
        let line = Report {
            command,
            stdout: result.stdout_text().into_owned(),
            stderr: result.stderr_text().into_owned(),
            status: result.status,
        };
        serde_json::to_writer(&mut stdout, &line)?;
        writeln!(stdout)?;
    } else {
        stdout.write_all(&result.stdout)?;
        std::io::stderr().write_all(&result.stderr)?;
    }
    stdout.flush()
}

#![forbid(unsafe_code)]
#![forbid(unused_must_use)]

use std::{
    io::IsTerminal,
    path::{Path, PathBuf},
    process::{Command, ExitCode},
};

use anyhow::{Context, Result};
use clap::Parser as _;
use comfy_table::{presets, Attribute, Cell, Color, Table};
use log::error;

// Bundling a vendored version of OpenSSL to avoid cross-platform compilation problems
// And avoid requiring OpenSSL on the client machine
use openssl_sys as _;

use runtool::{
    http::Http,
    install::Installer,
    links::PromptChooser,
    paths::{default_config_path, InstallDirs},
    registry::Registry,
    resolver::ToolResolver,
};

use self::{
    args::{Action, Args},
    logger::Logger,
};

mod args;
mod logger;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let Args {
        verbosity,
        config,
        no_prompt,
        action,
    } = Args::parse();

    // Set up the logger
    Logger::new(verbosity).init().unwrap();

    match inner(action, config, no_prompt).await {
        Ok(code) => code,

        Err(err) => {
            error!("{err:?}");
            ExitCode::FAILURE
        }
    }
}

async fn inner(
    action: Action,
    config: Option<PathBuf>,
    no_prompt: bool,
) -> Result<ExitCode> {
    let dirs = InstallDirs::from_env()?;

    // Short-circuit before loading the registry to make things quicker
    // This is especially important given that this action may be called on each user shell's startup
    if matches!(action, Action::BinPath) {
        println!("{}", dirs.bin_dir.display());
        return Ok(ExitCode::SUCCESS);
    }

    let config_path = match config {
        Some(config) => config,
        None => default_config_path()?,
    };

    let registry = Registry::load(config_path).await?;

    let mut installer = Installer::new(dirs, Http::new()?);

    if !no_prompt && std::io::stdin().is_terminal() && std::io::stderr().is_terminal() {
        installer = installer.with_chooser(PromptChooser);
    }

    let resolver = ToolResolver::new(registry, installer);

    match action {
        Action::Run { tool, args } => {
            let executable = resolver.get_executable(&tool).await?;
            run(&executable, &args)
        }

        Action::Which { tool } => {
            let executable = resolver.get_executable(&tool).await?;
            println!("{}", executable.display());
            Ok(ExitCode::SUCCESS)
        }

        Action::List => {
            let mut table = Table::new();

            table
                // Disable borders
                .load_preset(presets::NOTHING)
                .set_header(["Tool", "Source", "Origin", "Installed at"].into_iter().map(
                    |header| {
                        Cell::new(header)
                            .add_attribute(Attribute::Bold)
                            .add_attribute(Attribute::Underlined)
                    },
                ));

            for (name, spec) in resolver.registry().iter() {
                let installed = resolver.installed_path(name)?;

                table.add_row([
                    Cell::new(name).fg(Color::Cyan),
                    Cell::new(spec.class()).fg(Color::Blue),
                    Cell::new(spec.origin()),
                    match installed {
                        Some(path) => Cell::new(path.display()).fg(Color::Green),
                        None => Cell::new("-").fg(Color::DarkGrey),
                    },
                ]);
            }

            println!("{table}");
            Ok(ExitCode::SUCCESS)
        }

        Action::SaveConfig => {
            resolver.save_registry().await?;

            println!(
                "Saved tool definitions to {}",
                resolver.registry().config_path().display()
            );

            Ok(ExitCode::SUCCESS)
        }

        Action::BinPath => unreachable!(),
    }
}

#[cfg(unix)]
fn run(executable: &Path, args: &[String]) -> Result<ExitCode> {
    use std::os::unix::process::CommandExt;

    // Only returns on failure
    let err = Command::new(executable).args(args).exec();

    Err(err).with_context(|| format!("Failed to run '{}'", executable.display()))
}

#[cfg(not(unix))]
fn run(executable: &Path, args: &[String]) -> Result<ExitCode> {
    let status = Command::new(executable)
        .args(args)
        .status()
        .with_context(|| format!("Failed to run '{}'", executable.display()))?;

    Ok(status
        .code()
        .and_then(|code| u8::try_from(code).ok())
        .map_or(ExitCode::FAILURE, ExitCode::from))
}

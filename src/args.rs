use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::LevelFilter;

#[derive(Parser)]
#[clap(version, about, author)]
pub struct Args {
    #[clap(short, long, help = "Level of verbosity", default_value = "info")]
    pub verbosity: LevelFilter,

    #[clap(
        short,
        long,
        env = "RUNTOOL_CONFIG",
        help = "Tool definitions file (.yaml, .yml or .json) [default: ~/.config/runtool/config.yaml]"
    )]
    pub config: Option<PathBuf>,

    #[clap(
        long,
        help = "Never ask which download to pick, use the most specific one instead"
    )]
    pub no_prompt: bool,

    #[clap(subcommand)]
    pub action: Action,
}

#[derive(Subcommand)]
pub enum Action {
    #[clap(about = "Run a tool, installing it first if needed")]
    Run {
        #[clap(help = "Name of the tool")]
        tool: String,

        #[clap(
            help = "Arguments to pass to the tool",
            trailing_var_arg = true,
            allow_hyphen_values = true
        )]
        args: Vec<String>,
    },

    #[clap(about = "Print the path to a tool's executable, installing it first if needed")]
    Which {
        #[clap(help = "Name of the tool")]
        tool: String,
    },

    #[clap(about = "List available tools")]
    List,

    #[clap(about = "Write every tool definition to the configuration file")]
    SaveConfig,

    #[clap(about = "Get path to the binaries directory")]
    BinPath,
}

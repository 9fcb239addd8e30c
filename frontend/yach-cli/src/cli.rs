use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "yach", about = "Inspect a yach configuration tree")]
pub struct Cli {
    /// JSON, YAML or TOML file the tree is seeded from.
    #[arg(long, env = "YACH_SEED")]
    pub seed: Option<PathBuf>,

    #[arg(long, default_value = "warn")]
    pub log_level: String,

    /// Keys starting with this prefix are left out of dumps.
    #[arg(long, default_value = yach_core::config::DEFAULT_SKIP_PREFIX)]
    pub skip_prefix: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print the whole tree.
    Dump {
        /// Print as JSON instead of the indented listing.
        #[arg(long)]
        json: bool,

        #[arg(value_name = "KEY=VALUE")]
        overrides: Vec<String>,
    },
    /// Print the entry at a dotted path.
    Get {
        path: String,

        #[arg(value_name = "KEY=VALUE")]
        overrides: Vec<String>,
    },
    /// Print whether a dotted path exists.
    Has {
        path: String,

        #[arg(value_name = "KEY=VALUE")]
        overrides: Vec<String>,
    },
}

impl Command {
    pub fn overrides(&self) -> &[String] {
        match self {
            Self::Dump { overrides, .. } | Self::Get { overrides, .. } | Self::Has { overrides, .. } => {
                overrides
            }
        }
    }
}

impl Default for Command {
    fn default() -> Self {
        Self::Dump {
            json: false,
            overrides: Vec::new(),
        }
    }
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Command};

    #[test]
    fn overrides_follow_the_command() {
        let cli = Cli::try_parse_from(["yach", "get", "model.depth", "model.depth=4", "x=True"])
            .expect("parse");
        let command = cli.command.expect("command");
        assert!(matches!(command, Command::Get { ref path, .. } if path == "model.depth"));
        assert_eq!(command.overrides(), ["model.depth=4", "x=True"]);
    }

    #[test]
    fn defaults_to_an_empty_dump() {
        let cli = Cli::try_parse_from(["yach", "--skip-prefix", "__"]).expect("parse");
        assert_eq!(cli.skip_prefix, "__");
        assert_eq!(cli.log_level, "warn");
        assert!(matches!(
            cli.command.unwrap_or_default(),
            Command::Dump { json: false, ref overrides } if overrides.is_empty()
        ));
    }

    #[test]
    fn get_requires_a_path() {
        assert!(Cli::try_parse_from(["yach", "get"]).is_err());
    }
}

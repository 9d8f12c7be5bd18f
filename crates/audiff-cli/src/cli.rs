use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "audiff",
    about = "audiff: field-level structural diffs for audit logs",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Diff two JSON documents field by field
    Diff(DiffArgs),
    /// Show the effective diff settings
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct DiffArgs {
    /// The document before the change
    pub old: PathBuf,
    /// The document after the change
    pub new: PathBuf,
    /// Additional field or key name to ignore (repeatable)
    #[arg(short, long = "ignore", value_name = "NAME")]
    pub ignore: Vec<String>,
    /// TOML settings file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct ConfigArgs {
    /// TOML settings file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_diff() {
        let cli = Cli::try_parse_from(["audiff", "diff", "old.json", "new.json"]).unwrap();
        if let Command::Diff(args) = cli.command {
            assert_eq!(args.old, PathBuf::from("old.json"));
            assert_eq!(args.new, PathBuf::from("new.json"));
            assert!(args.ignore.is_empty());
            assert!(args.config.is_none());
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_diff_with_ignores() {
        let cli = Cli::try_parse_from([
            "audiff", "diff", "a.json", "b.json", "--ignore", "Secret", "-i", "Token",
        ])
        .unwrap();
        if let Command::Diff(args) = cli.command {
            assert_eq!(args.ignore, vec!["Secret", "Token"]);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_diff_requires_two_paths() {
        assert!(Cli::try_parse_from(["audiff", "diff", "a.json"]).is_err());
    }

    #[test]
    fn parse_config_file() {
        let cli = Cli::try_parse_from(["audiff", "config", "--config", "audiff.toml"]).unwrap();
        if let Command::Config(args) = cli.command {
            assert_eq!(args.config, Some(PathBuf::from("audiff.toml")));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_verbose() {
        let cli = Cli::try_parse_from(["audiff", "--verbose", "config"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn parse_json_format() {
        let cli = Cli::try_parse_from(["audiff", "diff", "a", "b", "--format", "json"]).unwrap();
        assert!(matches!(cli.format, OutputFormat::Json));
    }
}

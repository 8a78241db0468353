//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::mappings::MappingKind;

/// Top-level CLI parser for `lineage`.
#[derive(Debug, Parser)]
#[command(
    name = "lineage",
    version,
    about = "Trace the rename history of obfuscated symbols across mapping versions"
)]
pub struct Cli {
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Find symbols across the version graph and print their histories.
    Find {
        /// Query key: a class name or package prefix ending in `/`, a member
        /// name, or a composite `name:descriptor` / `index:name` key.
        key: String,
        /// Restrict matches to one symbol kind.
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
        /// Path to the graph manifest.
        #[arg(long)]
        manifest: Option<PathBuf>,
        /// Print histories as JSON instead of indented text.
        #[arg(long)]
        json: bool,
    },
    /// Diff two mapping files and print a change summary.
    Diff {
        /// The base mapping file.
        base: PathBuf,
        /// The successor mapping file.
        successor: PathBuf,
    },
}

/// Symbol kinds selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    /// Class mappings.
    Class,
    /// Field mappings.
    Field,
    /// Method mappings.
    Method,
    /// Parameter mappings.
    Parameter,
    /// Local-variable mappings.
    Local,
}

impl From<KindArg> for MappingKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Class => Self::Class,
            KindArg::Field => Self::Field,
            KindArg::Method => Self::Method,
            KindArg::Parameter => Self::Parameter,
            KindArg::Local => Self::Local,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command, KindArg};
    use clap::Parser;

    #[test]
    fn parses_find_subcommand() {
        let cli = Cli::parse_from(["lineage", "find", "B", "--kind", "class", "--json"]);
        match cli.command {
            Command::Find { key, kind, manifest, json } => {
                assert_eq!(key, "B");
                assert_eq!(kind, Some(KindArg::Class));
                assert!(manifest.is_none());
                assert!(json);
            }
            Command::Diff { .. } => panic!("expected find"),
        }
    }

    #[test]
    fn parses_diff_subcommand() {
        let cli = Cli::parse_from(["lineage", "diff", "v1.tiny", "v2.tiny"]);
        match cli.command {
            Command::Diff { base, successor } => {
                assert_eq!(base.to_str(), Some("v1.tiny"));
                assert_eq!(successor.to_str(), Some("v2.tiny"));
            }
            Command::Find { .. } => panic!("expected diff"),
        }
    }

    #[test]
    fn rejects_unknown_kind() {
        let result = Cli::try_parse_from(["lineage", "find", "B", "--kind", "module"]);
        assert!(result.is_err());
    }
}

//! Command-line arguments
//!
//! Global options override the configuration file; each subcommand carries
//! only the flags it needs.

use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

const PATTERN_HELP: &str = "File path: exact, or a pattern where % matches any characters";

#[derive(Parser, Debug, Clone)]
#[command(name = "licaudit")]
#[command(about = "Collects license information from all input files using ScanCode\n\
                   and saves the results to a local database for further analysis")]
#[command(version)]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long = "config-file", value_name = "FILE", global = true)]
    pub config_file: Option<PathBuf>,

    /// SQLite database path
    #[arg(long = "db", value_name = "FILE", global = true)]
    pub db_path: Option<PathBuf>,

    /// Root of the tree to scan
    #[arg(long = "source-root", value_name = "DIR", global = true)]
    pub source_root: Option<PathBuf>,

    /// Directory holding per-session staging and reports
    #[arg(long = "work-dir", value_name = "DIR", global = true)]
    pub work_root: Option<PathBuf>,

    /// Log level
    #[arg(
        short = 'l',
        long = "log-level",
        value_name = "LEVEL",
        global = true,
        value_parser = ["trace", "debug", "info", "warn", "error", "off"]
    )]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(
        short = 'o',
        long = "log-format",
        value_name = "FORMAT",
        global = true,
        value_parser = ["text", "ext", "json"]
    )]
    pub log_format: Option<String>,

    /// Log file path (use 'none' to disable file logging)
    #[arg(short = 'f', long = "log-file", value_name = "FILE", global = true)]
    pub log_file: Option<PathBuf>,

    /// Force colored output
    #[arg(long = "color", global = true, conflicts_with = "no_color")]
    pub color: bool,

    /// Disable colored output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Debug-level logging (`--verbose` belongs to `scan` and `audit`)
    #[arg(short = 'v', global = true, action = ArgAction::SetTrue)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Scan input and update database with license findings
    Scan(ScanArgs),

    /// Generate report of suspicious files
    Audit(AuditArgs),

    /// View contents of a file
    View {
        /// File to view, e.g. my-repo/node_modules/glob/LICENSE
        #[arg(value_name = "FILE_PATH")]
        path: String,
    },

    /// Generate report of all manually accepted files
    Accepted {
        #[arg(long, value_enum, default_value_t = AcceptedFormat::Csv)]
        output: AcceptedFormat,
    },

    /// Mark suspicious files as accepted
    Accept {
        #[arg(help = PATTERN_HELP)]
        pattern: String,
        /// Reason for accepting
        reason: String,
    },

    /// Un-mark previously accepted files so they appear suspicious again
    Unaccept {
        #[arg(help = PATTERN_HELP)]
        pattern: String,
    },

    /// Manage globally allowed licenses (applied on every audit)
    #[command(subcommand)]
    Licenses(LicensesCommand),

    /// [EXPERIMENTAL] Generate report of files needing attribution
    Attributions,
}

#[derive(ClapArgs, Debug, Clone, PartialEq, Eq)]
pub struct ScanArgs {
    /// File pattern (glob) to scan, relative to the source root.
    /// Example: 'my-repo/node_modules/g*' (quotes avoid shell expansion)
    #[arg(default_value = "**")]
    pub pattern: String,

    /// Print more info, like dirty files being processed
    #[arg(long)]
    pub verbose: bool,

    /// Re-stage every matched file, changed or not
    #[arg(long)]
    pub force: bool,

    /// Skip archive extraction
    #[arg(long = "no-extract")]
    pub no_extract: bool,
}

#[derive(ClapArgs, Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditArgs {
    /// Run on-the-fly ScanCode analysis showing more detailed license info for each finding
    #[arg(long)]
    pub verbose: bool,

    /// Print the report to stdout as well
    #[arg(long)]
    pub print: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptedFormat {
    /// Pipe-separated rows
    Csv,
    /// Hierarchical file structure
    Json,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum LicensesCommand {
    /// List allowed licenses
    List,
    /// Globally allow a license
    #[command(subcommand)]
    Allow(PolicyTarget),
    /// Globally unallow a previously allowed license
    #[command(subcommand)]
    Unallow(PolicyTarget),
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum PolicyTarget {
    /// Specific license, e.g. 'Ruby License'
    Specific { name: String },
    /// License category, e.g. 'Public Domain'
    Category { name: String },
}

impl Args {
    /// Parse process arguments with help colors matching the terminal
    pub fn parse_with_styles(color: bool) -> Self {
        use clap::{CommandFactory, FromArgMatches};
        let matches = Self::command()
            .styles(crate::core::styles::palette_to_clap(color))
            .get_matches();
        Self::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
    }

    /// `--color` forces color, `--no-color` disables it, otherwise follow the terminal
    pub fn use_color(&self) -> bool {
        use std::io::IsTerminal;
        !self.no_color && (self.color || std::io::stdout().is_terminal())
    }

    /// `None` when `--log-file none` or `--log-file -` disables the file
    pub fn log_file_override(&self) -> Option<Option<PathBuf>> {
        self.log_file.as_ref().map(|path| {
            let raw = path.to_string_lossy();
            if raw.eq_ignore_ascii_case("none") || raw == "-" {
                None
            } else {
                Some(path.clone())
            }
        })
    }
}

pub mod categories;
pub mod convert;
pub mod init;
pub mod report;
pub mod status;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "giro", about = "Categorized reports from CAMT-V2 bank statement exports.")]
pub struct Cli {
    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the settings file and the input/output directories.
    Init {
        /// Directory holding the statement exports (default: ~/Documents/giro)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Build the report for one category, or for all of them with `alles`.
    Report(ReportArgs),
    /// List the category identifiers and their patterns.
    Categories,
    /// Show the input files and the base record set of an account and year.
    Status(BaseArgs),
    /// Convert a legacy 11-column CSV-MT940 export to the CAMT-V2 layout.
    Convert {
        /// Legacy export to convert
        file: String,
        /// Output path (default: <file>.camtv2.csv)
        #[arg(long)]
        output: Option<String>,
    },
}

/// Selects the base record set.
#[derive(Args, Clone, Debug)]
pub struct BaseArgs {
    /// Account token in the file names giro-<account>-<from>-<to>.camtv2.csv
    #[arg(long)]
    pub account: Option<String>,
    /// Four-digit year (default: current year)
    #[arg(long)]
    pub year: Option<i32>,
    /// Sign filter: positiv, negativ or alle
    #[arg(long, default_value = "alle")]
    pub sign: String,
    /// Directory with the statement exports (default: data_dir from settings)
    #[arg(long = "input-dir")]
    pub input_dir: Option<String>,
}

#[derive(Args, Clone, Debug)]
pub struct ReportArgs {
    /// Category identifier (see `giro categories`)
    pub category: String,

    #[command(flatten)]
    pub base: BaseArgs,

    /// Write CSV, table and PDF files instead of only printing the table
    #[arg(short = 'f', long = "files")]
    pub emit_files: bool,
    /// Document header, overrides the category header
    #[arg(long)]
    pub header: Option<String>,
    /// Threshold for `schwelle`; negative values select outgoing amounts
    #[arg(long, allow_hyphen_values = true)]
    pub threshold: Option<i64>,
    /// Search pattern for `suche`
    #[arg(long)]
    pub search: Option<String>,
    /// Report directory (default: output_dir from settings)
    #[arg(long = "output-dir")]
    pub output_dir: Option<String>,
}

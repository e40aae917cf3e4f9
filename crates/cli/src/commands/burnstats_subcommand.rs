use super::AnalyzeCliArgs;
use clap::Subcommand;
use std::path::PathBuf;

#[derive(Debug, Subcommand)]
pub enum BurnstatsSubcommand {
    #[command(
        name = "analyze",
        long_about = "Find full blocks and the longest full-block streak for each threshold."
    )]
    Analyze {
        #[command(flatten)]
        args: AnalyzeCliArgs,
    },

    #[command(name = "db", about = "Database management commands")]
    Db {
        #[command(subcommand)]
        command: DbCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum DbCommand {
    #[command(
        name = "info",
        about = "Show the schema version, block count and latest block"
    )]
    Info,

    #[command(name = "export", about = "Save a snapshot of the database to a new file")]
    Export {
        /// Path where to save the database file
        #[arg(help = "Path where to save the database file")]
        out_path: PathBuf,
    },
}

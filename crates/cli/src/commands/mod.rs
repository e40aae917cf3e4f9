mod analyze;
mod burnstats_subcommand;
pub mod db;

use clap::Parser;

pub use analyze::{analyze, AnalyzeCliArgs};
pub use burnstats_subcommand::{BurnstatsSubcommand, DbCommand};

pub type Result<T> = std::result::Result<T, crate::error::BurnstatsError>;

#[derive(Parser, Debug)]
#[command(name = "burnstats", version, about = "Full-block streak statistics over stored block stats")]
pub struct BurnstatsCli {
    /// Path to the block_stats SQLite database
    #[arg(
        long,
        global = true,
        env = "BURNSTATS_DB",
        default_value = "burnstats.db"
    )]
    pub db: String,

    #[command(subcommand)]
    pub command: BurnstatsSubcommand,
}

impl BurnstatsCli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

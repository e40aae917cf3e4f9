mod commands;
mod error;

use commands::{BurnstatsCli, BurnstatsSubcommand, DbCommand};
use tracing_subscriber::{fmt, EnvFilter};

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // reports may go to stdout, so logs stay on stderr
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> miette::Result<()> {
    init_tracing();
    let args = BurnstatsCli::parse_args();

    match args.command {
        BurnstatsSubcommand::Analyze { args: analyze_args } => {
            commands::analyze(&args.db, &analyze_args)?;
        }

        BurnstatsSubcommand::Db { command } => match command {
            DbCommand::Info => {
                commands::db::info_db(&args.db)?;
            }
            DbCommand::Export { out_path } => commands::db::export_db(&args.db, out_path)?,
        },
    }

    Ok(())
}

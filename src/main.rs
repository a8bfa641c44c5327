//! Main entry point for the fan profile daemon

use anyhow::Context;
use clap::Parser;
use fan_profile_daemon::{
    args::{Args, Commands},
    client::FanProfileClient,
    daemon::{self, DaemonOptions},
    logging,
};
use log::LevelFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.command {
        Commands::Daemon {
            config,
            root,
            interval,
            log_file,
        } => {
            logging::setup(args.verbose, LevelFilter::Info, log_file.as_deref())
                .context("failed to set up logging")?;

            let options = DaemonOptions {
                config_path: config,
                root,
                interval_secs: interval,
                session_bus: args.session,
            };
            daemon::run(options).await.context("daemon failed")?;
        }
        command => {
            logging::setup(args.verbose, LevelFilter::Warn, None)
                .context("failed to set up logging")?;

            let client = FanProfileClient::new(args.session)
                .await
                .context("failed to connect to the fan profile daemon")?;
            client.handle_command(command).await?;
        }
    }

    Ok(())
}

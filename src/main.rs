use crate::commands::{Cli, Commands};
use crate::khn::{batch_convert_to_khn, convert_to_khn, default_output_path, describe_cue};
use anyhow::Result;
use clap::Parser;
use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;
use log::{info, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

mod cd;
mod commands;
mod cue;
mod khn;
mod util;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let logger = env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .build();

    let level = logger.filter();
    let pb = MultiProgress::new();

    LogWrapper::new(pb.clone(), logger).try_init()?;
    log::set_max_level(level);

    let cli = Cli::parse();

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Cancelling after the current chunk, the partial output has to be deleted");
                cancel.store(true, Ordering::Relaxed);
            }
        });
    }

    match cli.command {
        Commands::Convert(cmd) => {
            let output = cmd
                .output
                .unwrap_or_else(|| default_output_path(&cmd.input_cue, cmd.game_id.as_deref()));
            convert_to_khn(pb.clone(), &cmd.input_cue, &output, cmd.force, &cancel).await?;
        }
        Commands::Batch(cmd) => {
            let summary = batch_convert_to_khn(
                pb.clone(),
                &cmd.input_dir,
                cmd.output_dir.as_deref(),
                cmd.force,
                &cancel,
            )
            .await?;

            info!(
                "Batch finished: {} converted, {} failed",
                summary.converted, summary.failed
            );
            if summary.failed > 0 {
                anyhow::bail!("{} image(s) failed to convert", summary.failed);
            }
        }
        Commands::Info(cmd) => describe_cue(&cmd.input_cue).await?,
    }

    Ok(())
}

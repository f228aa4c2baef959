use crate::commands::khn::{BatchCommand, ConvertCommand, InfoCommand};
use clap::{Parser, Subcommand};

pub mod khn;

/// CLI for converting CUE/BIN disc images into kHn images.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Convert(ConvertCommand),
    Batch(BatchCommand),
    Info(InfoCommand),
}

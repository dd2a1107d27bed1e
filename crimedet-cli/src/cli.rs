// crimedet-cli/src/cli.rs
//
// Defines the command-line argument structure using clap.

use clap::Parser;
use crimedet_core::config::{CoreConfig, CoreConfigBuilder, DEFAULT_MODEL_FILE, DEFAULT_WEIGHTS_FILE};
use std::path::PathBuf;

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "Crimedet: crime detection for video files",
    long_about = "Classifies a video as crime / no crime by fusing an R3D-18 clip classifier \
                  with an LSTM autoencoder anomaly score."
)]
pub struct Cli {
    /// Initialize the models and save them instead of analyzing a video
    #[arg(long)]
    pub train: bool,

    /// Model bundle file (classifier + autoencoder)
    #[arg(long = "model", value_name = "PATH", default_value = DEFAULT_MODEL_FILE)]
    pub model: PathBuf,

    /// Do not load pretrained R3D-18 weights; use random initialization
    #[arg(long = "no-pretrained-r3d")]
    pub no_pretrained_r3d: bool,

    /// Pretrained R3D-18 weight archive (.npz with torchvision state-dict names)
    #[arg(
        long,
        value_name = "PATH",
        env = "CRIMEDET_R3D_WEIGHTS",
        default_value = DEFAULT_WEIGHTS_FILE
    )]
    pub weights: PathBuf,

    /// Video to analyze; prompts on standard input when omitted
    #[arg(long, value_name = "PATH")]
    pub video: Option<PathBuf>,

    /// Seed for random weight initialization
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Core configuration described by the arguments.
    pub fn core_config(&self) -> CoreConfig {
        CoreConfigBuilder::new()
            .model_path(self.model.clone())
            .weights_path(self.weights.clone())
            .use_pretrained(!self.no_pretrained_r3d)
            .maybe_seed(self.seed)
            .build()
    }
}

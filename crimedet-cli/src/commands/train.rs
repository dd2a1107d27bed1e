// ============================================================================
// crimedet-cli/src/commands/train.rs
// ============================================================================
//
// TRAIN COMMAND: Model Bundle Initialization
//
// No fitting happens here: the classifier and the autoencoder are freshly
// initialized and written to the bundle file so that the analyze flow has
// something to load.

use crate::error::{CliErrorContext, CliResult};

use crimedet_core::config::CoreConfig;
use crimedet_core::models::ModelBundle;
use crimedet_core::terminal_output::{print_section, print_status, print_success, print_warning};
use crimedet_core::{format_bytes, seeded_rng};

/// Initializes the models described by `config` and saves them to `config.model_path`.
pub fn run_train(config: &CoreConfig) -> CliResult<()> {
    config.validate()?;
    print_section("Training");
    print_warning("[TRAINING PLACEHOLDER] Replace with real training code");

    if let Some(seed) = config.seed {
        print_status("Seed", &seed.to_string(), false);
    }
    let mut rng = seeded_rng(config.seed);
    let bundle = ModelBundle::initialize(config, &mut rng);

    bundle
        .save(&config.model_path)
        .cli_with_context(|| format!("Failed to save models to {}", config.model_path.display()))?;
    print_success(&format!("Models saved to {}", config.model_path.display()));

    if let Ok(meta) = std::fs::metadata(&config.model_path) {
        print_status("Bundle size", &format_bytes(meta.len()), false);
    }
    print_success("Training finished and models saved.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crimedet_core::config::CoreConfigBuilder;
    use tempfile::tempdir;

    #[test]
    fn test_train_writes_loadable_bundle() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.joblib");
        let config = CoreConfigBuilder::new()
            .model_path(path.clone())
            .ae_hidden_dim(8)
            .seed(4)
            .build();

        run_train(&config).unwrap();
        let bundle = ModelBundle::load(&path).unwrap();
        assert_eq!(bundle.lstmae.hidden_dim(), 8);
    }

    #[test]
    fn test_train_reports_unwritable_location() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("no_such_dir").join("model.joblib");
        let config = CoreConfigBuilder::new().model_path(path).ae_hidden_dim(4).build();
        let err = run_train(&config).unwrap_err();
        assert!(err.to_string().contains("Failed to save models"));
    }
}

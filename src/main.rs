use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use lumen_lstm::activation::{ActivationTable, DEFAULT_TANH_SAMPLES, DEFAULT_TANH_X_MAX};
use lumen_lstm::classifier::LSTMClassifier;
use lumen_lstm::parameter::{LayerNames, load_parameters_from_path};
use lumen_lstm::preprocessing::WindowedClassifier;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Export trained LSTM classifiers to C headers and run them on recorded readings"
)]
struct Cli {
    /// path to the JSON parameter store
    #[arg(long, global = true, default_value = "model.json")]
    params: PathBuf,

    /// layer key of the LSTM cell in the parameter store
    #[arg(long, global = true, default_value = lumen_lstm::parameter::DEFAULT_RECURRENT_LAYER)]
    recurrent_layer: String,

    /// layer key of the dense head in the parameter store
    #[arg(long, global = true, default_value = lumen_lstm::parameter::DEFAULT_DENSE_LAYER)]
    dense_layer: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// write the C header consumed by the firmware build
    Export {
        /// output header path
        #[arg(long, default_value = "network.h")]
        output: PathBuf,

        /// upper bound of the tanh lookup domain
        #[arg(long, default_value_t = DEFAULT_TANH_X_MAX)]
        table_max: f32,

        /// number of samples in the tanh lookup table
        #[arg(long, default_value_t = DEFAULT_TANH_SAMPLES)]
        table_samples: usize,
    },
    /// classify raw readings (one per line) with the windowed streaming classifier
    Predict {
        /// file with one raw reading per line; blank lines and `#` comments are skipped
        #[arg(long)]
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();
    let names = LayerNames {
        recurrent_layer: cli.recurrent_layer.clone(),
        dense_layer: cli.dense_layer.clone(),
        ..LayerNames::default()
    };
    let params_path = path_str(&cli.params)?;
    let parameters = load_parameters_from_path(params_path, &names)
        .with_context(|| format!("failed to load parameters from {}", params_path))?;
    info!(
        "model: input_dim={} units={} classes={}",
        parameters.input_dim(),
        parameters.units(),
        parameters.output_dim()
    );

    match cli.command {
        Command::Export {
            output,
            table_max,
            table_samples,
        } => {
            let table = ActivationTable::new(table_max, table_samples)
                .context("invalid activation table configuration")?;
            let classifier = LSTMClassifier::with_activation_table(parameters, Arc::new(table));
            let output = path_str(&output)?;
            classifier
                .export_model(output)
                .with_context(|| format!("failed to write {}", output))?;
        }
        Command::Predict { input } => {
            let readings = load_readings(&input)?;
            let mut windowed = WindowedClassifier::new(LSTMClassifier::new(parameters))?;
            for (index, reading) in readings.iter().enumerate() {
                if let Some(class) = windowed.push(*reading)? {
                    println!("{}\t{}", index, class);
                }
            }
        }
    }
    Ok(())
}

fn path_str(path: &Path) -> Result<&str> {
    path.to_str()
        .with_context(|| format!("path is not valid UTF-8: {}", path.display()))
}

fn load_readings(path: &Path) -> Result<Vec<f32>> {
    let file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut readings = Vec::new();
    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let value: f32 = trimmed
            .parse()
            .with_context(|| format!("{}:{}: invalid reading '{}'", path.display(), line_no + 1, trimmed))?;
        readings.push(value);
    }
    info!("read {} readings from {}", readings.len(), path.display());
    Ok(readings)
}

//! Command-line entry point running the gender-classification pipeline.

use std::path::PathBuf;

use audiogender::config::{self, Config};
use audiogender::logging;
use audiogender::pipeline::{self, Stage};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    if let Err(err) = logging::init(&options.log_level) {
        eprintln!("File logging disabled: {err}");
    }

    let config = match &options.config {
        Some(path) => Config::load_existing(path),
        None => config::default_config_path().and_then(|path| Config::load(&path)),
    }
    .map_err(|err| err.to_string())?;
    pipeline::run(&config, options.stage).map_err(|err| {
        tracing::error!("{err}");
        err.to_string()
    })
}

#[derive(Debug, Clone, PartialEq)]
struct CliOptions {
    config: Option<PathBuf>,
    stage: Stage,
    log_level: String,
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut config = None;
    let mut stage = None;
    let mut log_level = "info".to_string();

    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Err(help_text()),
            "--config" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--config requires a value".to_string())?;
                config = Some(PathBuf::from(value));
            }
            "--log-level" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--log-level requires a value".to_string())?;
                log_level = value.clone();
            }
            value if !value.starts_with('-') && stage.is_none() => {
                stage = Some(value.parse::<Stage>()?);
            }
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }

    Ok(CliOptions {
        config,
        stage: stage.unwrap_or_default(),
        log_level,
    })
}

fn help_text() -> String {
    [
        "audiogender",
        "",
        "Classify speaker gender from spoken-digit recordings.",
        "",
        "Usage:",
        "  audiogender [--config <file>] [--log-level <filter>] [prepare|engineer|train|all]",
        "",
        "Stages:",
        "  prepare   analyze the corpus and write data/features_data.csv",
        "  engineer  build data/final_data.csv for modelling",
        "  train     split, train and evaluate; write results/model*.json",
        "  all       run every stage (default)",
        "",
        "Options:",
        "  --config <file>       TOML config (default: <config dir>/.audiogender/audiogender.toml)",
        "  --log-level <filter>  tracing filter when RUST_LOG is unset (default: info)",
    ]
    .join("\n")
}

//! keystroke-id CLI
//!
//! Builds training datasets from stored capture logs and identifies typists
//! from live samples.

use anyhow::Context;
use clap::{Parser, Subcommand};
use keystroke_id::{
    audit::AuditLog,
    config::Config,
    core::FeatureVector,
    model::ModelHandle,
    pipeline::{self, DatasetBuilder, Extraction},
    storage::RawLogStore,
    VERSION,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "keystroke-id")]
#[command(version = VERSION)]
#[command(about = "Keystroke-dynamics user identification", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the training dataset from stored capture logs
    Extract {
        /// Directory of raw capture logs
        #[arg(long)]
        raw_dir: Option<PathBuf>,

        /// Output CSV path
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Print the feature vector of one sample file
    Features {
        /// Sample file (JSON)
        file: PathBuf,

        /// Use the online entry point (tolerates field-name aliases)
        #[arg(long)]
        online: bool,
    },

    /// Identify the typist of one sample file
    Predict {
        /// Sample file (JSON)
        file: PathBuf,

        /// Directory holding scaler.json and classifier.json
        #[arg(long)]
        model_dir: Option<PathBuf>,
    },

    /// Run the HTTP server (requires server feature)
    Serve {
        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,

        /// Directory holding scaler.json and classifier.json
        #[arg(long)]
        model_dir: Option<PathBuf>,
    },

    /// Show cumulative processing statistics
    Status,

    /// Show configuration, or update and save it
    Config {
        /// Directory of raw capture logs
        #[arg(long)]
        raw_dir: Option<PathBuf>,

        /// Directory holding scaler.json and classifier.json
        #[arg(long)]
        model_dir: Option<PathBuf>,

        /// Default HTTP server port
        #[arg(long)]
        port: Option<u16>,

        /// Default log filter
        #[arg(long)]
        log_level: Option<String>,

        /// Write the configuration file even if nothing changed
        #[arg(long)]
        init: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Warning: could not load config, using defaults: {e}");
        Config::default()
    });
    init_logging(&config.log_level);

    match cli.command {
        Commands::Extract { raw_dir, output } => cmd_extract(&config, raw_dir, output),
        Commands::Features { file, online } => cmd_features(&file, online),
        Commands::Predict { file, model_dir } => cmd_predict(&config, &file, model_dir),
        Commands::Serve { port, model_dir } => cmd_serve(&config, port, model_dir),
        Commands::Status => cmd_status(&config),
        Commands::Config {
            raw_dir,
            model_dir,
            port,
            log_level,
            init,
        } => cmd_config(config, raw_dir, model_dir, port, log_level, init),
    }
}

/// Logs go to stderr so command output on stdout stays machine-readable.
fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_extract(
    config: &Config,
    raw_dir: Option<PathBuf>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    if let Err(e) = config.ensure_directories() {
        tracing::warn!(error = %e, "could not create data directories");
    }

    let raw_dir = raw_dir.unwrap_or_else(|| config.raw_log_dir.clone());
    let output = output.unwrap_or_else(|| config.dataset_path.clone());

    let store = RawLogStore::new(raw_dir);
    let mut builder = DatasetBuilder::new();
    builder.add_store(&store)?;

    let report = builder.report();
    if report.samples == 0 {
        println!("No usable samples found in {:?}", store.dir());
        println!("Capture samples with `keystroke-id serve` and POST /api/save_log.");
    }

    builder
        .write_to_path(&output)
        .with_context(|| format!("writing dataset to {output:?}"))?;

    let audit = AuditLog::with_persistence(config.audit_path());
    audit.record_batch(
        report.samples as u64,
        report.rejected as u64,
        report.malformed_events as u64,
    );
    if let Err(e) = audit.save() {
        tracing::warn!(error = %e, "could not save audit stats");
    }

    println!("Extracted {} samples to {:?}", report.samples, output);
    if report.rejected > 0 {
        println!("Skipped {} unusable samples", report.rejected);
    }
    Ok(())
}

fn cmd_features(file: &Path, online: bool) -> anyhow::Result<()> {
    let sample = RawLogStore::load(file)?;
    let extraction = if online {
        pipeline::extract_online(&sample)?
    } else {
        pipeline::extract_batch(&sample)?
    };

    report_malformed(&extraction);
    println!("{}", serde_json::to_string_pretty(&named(&extraction.features))?);
    Ok(())
}

fn cmd_predict(config: &Config, file: &Path, model_dir: Option<PathBuf>) -> anyhow::Result<()> {
    let model_dir = model_dir.unwrap_or_else(|| config.model_dir.clone());
    let model = ModelHandle::load(&model_dir)?;
    let sample = RawLogStore::load(file)?;

    let prediction = pipeline::predict(&sample, &model)?;
    if prediction.skipped_events > 0 {
        tracing::warn!(skipped = prediction.skipped_events, "malformed events skipped");
    }

    println!("Predicted user: {}", prediction.predicted_user);
    println!("{}", serde_json::to_string_pretty(&named(&prediction.features))?);
    Ok(())
}

#[cfg(feature = "server")]
fn cmd_serve(
    config: &Config,
    port: Option<u16>,
    model_dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    use keystroke_id::server::{run, ServerConfig};

    if let Err(e) = config.ensure_directories() {
        tracing::warn!(error = %e, "could not create data directories");
    }

    let server_config = ServerConfig::new(
        port.unwrap_or(config.server_port),
        config.raw_log_dir.clone(),
        model_dir.unwrap_or_else(|| config.model_dir.clone()),
    )
    .with_audit_path(config.audit_path());

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let (addr, shutdown_tx, server) = run(server_config).await?;
        println!("keystroke-id v{VERSION} listening on http://{addr}");
        println!("Press Ctrl+C to stop");

        tokio::signal::ctrl_c().await?;
        let _ = shutdown_tx.send(());
        server.await?;
        Ok::<(), anyhow::Error>(())
    })
}

#[cfg(not(feature = "server"))]
fn cmd_serve(
    _config: &Config,
    _port: Option<u16>,
    _model_dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    anyhow::bail!("serve is unavailable: rebuild with `--features server`")
}

fn cmd_status(config: &Config) -> anyhow::Result<()> {
    println!("keystroke-id Status");
    println!("===================");
    println!();

    let store = RawLogStore::new(config.raw_log_dir.clone());
    let stored = store.list().map(|files| files.len()).unwrap_or(0);
    println!("Raw capture logs: {stored} in {:?}", store.dir());
    println!(
        "Dataset: {}",
        if config.dataset_path.exists() {
            "present"
        } else {
            "not built"
        }
    );

    let model = ModelHandle::load(&config.model_dir)?;
    println!(
        "Model: {}",
        if model.is_available() {
            "loaded"
        } else {
            "not found"
        }
    );
    println!();

    let audit_path = config.audit_path();
    if audit_path.exists() {
        println!("{}", AuditLog::with_persistence(audit_path).summary());
    } else {
        println!("No previous processing statistics found.");
    }
    Ok(())
}

fn cmd_config(
    mut config: Config,
    raw_dir: Option<PathBuf>,
    model_dir: Option<PathBuf>,
    port: Option<u16>,
    log_level: Option<String>,
    init: bool,
) -> anyhow::Result<()> {
    let changed = raw_dir.is_some() || model_dir.is_some() || port.is_some() || log_level.is_some();

    if let Some(dir) = raw_dir {
        config.raw_log_dir = dir;
    }
    if let Some(dir) = model_dir {
        config.model_dir = dir;
    }
    if let Some(port) = port {
        config.server_port = port;
    }
    if let Some(level) = log_level {
        config.log_level = level;
    }

    if changed || init {
        config.save().context("saving configuration")?;
        config.ensure_directories()?;
        println!("Saved configuration to {:?}", Config::config_path());
        println!();
    }

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn report_malformed(extraction: &Extraction) {
    for skipped in &extraction.malformed {
        tracing::warn!("{skipped}");
    }
}

/// Feature vector as a JSON object keyed by column name.
fn named(features: &FeatureVector) -> serde_json::Map<String, serde_json::Value> {
    features
        .named()
        .map(|(name, value)| (name.to_string(), serde_json::json!(value)))
        .collect()
}

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use fvr_cli::{discover, report, run};
use fvr_config::{Settings, UnusedKeyPolicy};
use fvr_history::GitHubClient;
use fvr_reconcile::Matcher;
use fvr_serving::{Credentials, ServingSystem, ZoltarClient};

#[derive(Parser)]
#[command(name = "fvr")]
#[command(about = "Forecast version reconciler", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Determine which revision of each forecast file is live on the serving system
    Reconcile {
        /// Layered config paths in merge order
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        /// Local checkout of the data root (defaults to github.data_root)
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Output directory for CSV reports
        #[arg(long, default_value = "output")]
        out: PathBuf,

        /// Restrict to these datasets (repeatable)
        #[arg(long = "dataset")]
        datasets: Vec<String>,

        /// Files reconciled concurrently (overrides driver.concurrency)
        #[arg(long)]
        concurrency: Option<usize>,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> overrides...)
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env.local if present; production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = fvr_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::Reconcile {
            config_paths,
            data_dir,
            out,
            datasets,
            concurrency,
        } => {
            let path_refs: Vec<&str> = config_paths.iter().map(|s| s.as_str()).collect();
            let loaded = fvr_config::load_layered_yaml(&path_refs)?;
            fvr_config::report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)?;
            let settings = Settings::from_config_json(&loaded.config_json)?;
            let secrets = fvr_config::resolve_secrets(&loaded.config_json)?;
            info!(config_hash = %loaded.config_hash, "configuration loaded");

            let data_dir = data_dir.unwrap_or_else(|| PathBuf::from(&settings.github.data_root));
            let concurrency = concurrency.unwrap_or(settings.driver.concurrency);

            let files = discover(&data_dir, &datasets, settings.driver.skip_before)?;
            info!(files = files.len(), data_dir = %data_dir.display(), concurrency, "tracked files discovered");

            let github = GitHubClient::from_settings(&settings.github, secrets.github_token.clone());
            let zoltar = ZoltarClient::from_settings(&settings.zoltar);
            zoltar
                .authenticate(&Credentials::new(
                    secrets.zoltar_username.clone(),
                    secrets.zoltar_password.clone(),
                ))
                .await
                .context("zoltar authentication failed")?;

            let matcher = Arc::new(Matcher::new(Arc::new(github), Arc::new(zoltar), &settings));
            let (reports, summary) = run(matcher, files, concurrency).await;

            let written = report::write_outputs(&out, &reports)?;
            for path in &written {
                println!("wrote={}", path.display());
            }
            println!("config_hash={}", loaded.config_hash);
            println!("{summary}");
        }
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

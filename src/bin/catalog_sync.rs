use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use catalog_sync::app::{App, TracingSink};
use catalog_sync::catalog::CatalogHttpClient;
use catalog_sync::config::{ConfigLoader, SyncConfig};
use catalog_sync::content::ContentHttpClient;
use catalog_sync::domain::WatermarkPolicy;
use catalog_sync::output::{JsonOutput, OutputMode};

#[derive(Parser)]
#[command(name = "catalog-sync")]
#[command(about = "Download datasets of one catalog theme that changed since the last run")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    json: bool,

    #[command(flatten)]
    overrides: ConfigArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Fetch changed datasets and update the watermark (default)")]
    Run,
    #[command(about = "List datasets that would be downloaded, without fetching them")]
    Plan,
}

#[derive(Args, Clone, Default)]
struct ConfigArgs {
    #[arg(long, global = true)]
    config: Option<String>,

    #[arg(long, global = true)]
    catalog_url: Option<String>,

    #[arg(long, global = true)]
    data_root: Option<Utf8PathBuf>,

    #[arg(long, global = true)]
    watermark: Option<Utf8PathBuf>,

    #[arg(long, global = true)]
    theme: Option<String>,

    #[arg(long, global = true)]
    max_workers: Option<usize>,

    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    #[arg(long, global = true)]
    watermark_policy: Option<WatermarkPolicy>,
}

impl ConfigArgs {
    fn apply(self, mut config: SyncConfig) -> SyncConfig {
        if let Some(url) = self.catalog_url {
            config.catalog_url = url;
        }
        if let Some(root) = self.data_root {
            config.data_root = root;
        }
        if let Some(path) = self.watermark {
            config.watermark_path = path;
        }
        if let Some(theme) = self.theme {
            config.theme = theme;
        }
        if let Some(workers) = self.max_workers {
            config.max_workers = workers;
        }
        if let Some(timeout) = self.timeout_secs {
            config.timeout_secs = timeout;
        }
        if let Some(policy) = self.watermark_policy {
            config.watermark_policy = policy;
        }
        config
    }
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    let config = ConfigLoader::resolve(cli.overrides.config.as_deref()).into_diagnostic()?;
    let config = cli.overrides.clone().apply(config);
    ConfigLoader::validate(&config).into_diagnostic()?;

    let catalog = CatalogHttpClient::new(&config.catalog_url, &config.theme, config.timeout())
        .into_diagnostic()?;
    let content = ContentHttpClient::new(config.timeout()).into_diagnostic()?;
    let app = App::new(config, catalog, content);

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let summary = app.run(&TracingSink).into_diagnostic()?;
            match output_mode {
                OutputMode::Json => JsonOutput::print_summary(&summary).into_diagnostic()?,
                OutputMode::Human => tracing::info!(
                    "sync job complete: {} ({} unchanged)",
                    summary.summary_line(),
                    summary.unchanged
                ),
            }
        }
        Commands::Plan => {
            let plan = app.plan(&TracingSink).into_diagnostic()?;
            match output_mode {
                OutputMode::Json => JsonOutput::print_plan(&plan).into_diagnostic()?,
                OutputMode::Human => {
                    for descriptor in &plan.work {
                        println!(
                            "{}\t{}\t{}",
                            descriptor.identifier, descriptor.modified, descriptor.title
                        );
                    }
                    tracing::info!(
                        "{} dataset(s) to download, {} unchanged",
                        plan.work.len(),
                        plan.unchanged
                    );
                }
            }
        }
    }
    Ok(())
}

use clap::Parser;
use copycat_recipes::{
    config::AppConfig,
    db,
    services::{
        categorizer,
        checkpoint::CheckpointStore,
        generation::{GenerationWorker, OpenRouterClient},
        input,
        pipeline::Pipeline,
        sink::{JsonFileSink, PgRecipeSink, RecipeSink, SinkKind},
    },
};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Generate copycat recipes for every product in a CSV file.
#[derive(Debug, Parser)]
#[command(name = "copycat-recipes", version, about)]
struct Cli {
    /// CSV file with product, brand and optional category/id/image_url columns
    csv_path: PathBuf,

    /// Items per group (concurrent requests); defaults to CONCURRENCY
    batch_size: Option<usize>,

    /// Only process the first N rows
    #[arg(long)]
    limit: Option<usize>,

    /// Show what would be processed without calling the remote service
    #[arg(long)]
    dry_run: bool,

    /// Checkpoint file; defaults to CHECKPOINT_PATH
    #[arg(long)]
    checkpoint: Option<PathBuf>,

    /// Output directory of the JSON sink; defaults to OUTPUT_DIR
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Recipe generation aborted");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::from_env()?;
    if let Some(path) = cli.checkpoint {
        config.checkpoint_path = path;
    }
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }

    let mut items = input::load_items(&cli.csv_path)?;
    if let Some(limit) = cli.limit.filter(|l| *l > 0) {
        items.truncate(limit);
        tracing::info!(limit, "Processing limited number of rows");
    }

    let checkpoint = Arc::new(CheckpointStore::new(&config.checkpoint_path));

    if cli.dry_run {
        let processed = checkpoint.load().await;
        for item in &items {
            tracing::info!(
                item_id = %item.id,
                product = %item.product_name,
                brand = %item.brand_name,
                category = %categorizer::categorize(
                    &item.product_name,
                    &item.brand_name,
                    item.category_hint.as_deref(),
                ),
                already_processed = processed.contains(&item.id),
                "Would process"
            );
        }
        return Ok(());
    }

    if let Some(addr) = &config.metrics_addr {
        let addr: SocketAddr = addr.parse()?;
        PrometheusBuilder::new().with_http_listener(addr).install()?;
        metrics::describe_counter!("recipes_generated_total", "Recipes generated and saved");
        metrics::describe_counter!("recipes_failed_total", "Items that failed generation or saving");
        metrics::describe_counter!("recipes_skipped_total", "Items skipped because they were already processed");
        metrics::describe_histogram!("recipe_generation_seconds", "Time to generate and save one recipe");
        tracing::info!(%addr, "Prometheus metrics listener started");
    }

    let options = config.pipeline_options(cli.batch_size);

    let sink: Arc<dyn RecipeSink> = match config.sink {
        SinkKind::Json => Arc::new(JsonFileSink::new(&config.output_dir)),
        SinkKind::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .ok_or("DATABASE_URL is required when SINK=postgres")?;
            tracing::info!("Connecting to PostgreSQL");
            let pool = db::init_pool(database_url, options.concurrency as u32).await?;
            tracing::info!("Running database migrations");
            db::run_migrations(&pool).await?;
            Arc::new(PgRecipeSink::new(pool))
        }
    };
    tracing::info!(sink = %config.sink, "Persistence sink ready");

    let settings = config.generator_settings();
    let client = OpenRouterClient::new(&settings)?;
    let (jitter_min, jitter_max) = config.jitter();
    let worker =
        GenerationWorker::new(Arc::new(client), &settings).with_jitter(jitter_min, jitter_max);

    let pipeline = Pipeline::new(worker, checkpoint, sink, options)?;
    let summary = pipeline.run(&items).await?;

    tracing::info!(
        succeeded = summary.succeeded,
        skipped = summary.skipped,
        failed = summary.failed,
        total = items.len(),
        "Completed processing"
    );
    Ok(())
}

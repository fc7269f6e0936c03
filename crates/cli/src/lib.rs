use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use reco_engine::{BundleStrategy, JsonlAuditSink, Recommender, RecommenderProfile};
use reco_protocol::{serialize_json, RecommendationRequest};
use reco_vector_store::{Catalog, Embedder, EmbeddingModel, IndexHandle};
use serde::Serialize;
use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let output = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serialize_json(value)?
    };
    print_stdout(&output)
}

#[derive(Parser)]
#[command(name = "reco")]
#[command(about = "Assessment bundle recommender", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(long, global = true)]
    quiet: bool,

    /// Override embedding backend in this process
    #[arg(long, global = true, value_enum)]
    embed_mode: Option<EmbedMode>,

    /// Model cache directory (overrides RECO_MODEL_DIR)
    #[arg(long, global = true)]
    model_dir: Option<PathBuf>,

    /// Recommender profile: builtin name or JSON file (default: default)
    #[arg(long, global = true)]
    profile: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Recommend an assessment bundle for a hiring request
    Recommend(RecommendArgs),

    /// Show the construct blueprint derived from a request
    Blueprint(BlueprintArgs),

    /// Rank catalog products by semantic similarity to free text
    Search(SearchArgs),

    /// List the products in the catalog
    Catalog(CatalogArgs),
}

#[derive(Args)]
struct RequestInput {
    /// Inline JSON request (mutually exclusive with --file)
    #[arg(long, conflicts_with = "file")]
    json: Option<String>,

    /// Path to file containing the JSON request
    #[arg(long)]
    file: Option<PathBuf>,
}

#[derive(Args)]
struct RecommendArgs {
    #[command(flatten)]
    input: RequestInput,

    /// Catalog JSON file (defaults to the built-in catalog)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Override the profile's bundle strategy
    #[arg(long, value_enum)]
    strategy: Option<StrategyFlag>,

    /// Append an audit record per recommendation to this JSONL file
    #[arg(long)]
    audit_log: Option<PathBuf>,

    /// Omit the request echo from the response
    #[arg(long)]
    no_debug: bool,

    /// Pretty-print JSON response
    #[arg(long)]
    pretty: bool,
}

#[derive(Args)]
struct BlueprintArgs {
    #[command(flatten)]
    input: RequestInput,

    /// Pretty-print JSON response
    #[arg(long)]
    pretty: bool,
}

#[derive(Args)]
struct SearchArgs {
    /// Free-text query
    query: String,

    /// Catalog JSON file (defaults to the built-in catalog)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Maximum number of results
    #[arg(long, short = 'n', default_value_t = 5)]
    limit: usize,

    /// Output JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct CatalogArgs {
    /// Catalog JSON file (defaults to the built-in catalog)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Output JSON format
    #[arg(long)]
    json: bool,

    /// Write the catalog to this file as versioned JSON
    #[arg(long)]
    export: Option<PathBuf>,
}

#[derive(Copy, Clone, ValueEnum)]
enum EmbedMode {
    Fast,
    Hashed,
    Stub,
}

impl EmbedMode {
    const fn as_str(self) -> &'static str {
        match self {
            EmbedMode::Fast => "fast",
            EmbedMode::Hashed => "hashed",
            EmbedMode::Stub => "stub",
        }
    }
}

#[derive(Copy, Clone, ValueEnum)]
enum StrategyFlag {
    Greedy,
    Knapsack,
}

impl StrategyFlag {
    const fn as_domain(self) -> BundleStrategy {
        match self {
            StrategyFlag::Greedy => BundleStrategy::Greedy,
            StrategyFlag::Knapsack => BundleStrategy::Knapsack,
        }
    }
}

#[derive(Serialize)]
struct SearchHitOutput {
    product_id: String,
    name: String,
    score: f32,
}

pub async fn main_entry() -> Result<()> {
    let mut cli = Cli::parse();

    if let Some(mode) = cli.embed_mode {
        env::set_var("RECO_EMBEDDING_MODE", mode.as_str());
    }
    if let Some(dir) = &cli.model_dir {
        env::set_var("RECO_MODEL_DIR", dir);
    }
    if let Some(profile) = &cli.profile {
        env::set_var("RECO_PROFILE", profile);
    }

    // Keep stdout clean for JSON unless the caller asked for debug output.
    let json_output = match &cli.command {
        Commands::Recommend(_) | Commands::Blueprint(_) => true,
        Commands::Search(args) => args.json,
        Commands::Catalog(args) => args.json,
    };
    if json_output && !cli.verbose {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    match cli.command {
        Commands::Recommend(args) => run_recommend(args).await?,
        Commands::Blueprint(args) => run_blueprint(args)?,
        Commands::Search(args) => run_search(args).await?,
        Commands::Catalog(args) => run_catalog(args).await?,
    }

    Ok(())
}

async fn run_recommend(args: RecommendArgs) -> Result<()> {
    let request = read_request(&args.input)?;

    let mut profile =
        RecommenderProfile::from_env().context("Failed to load the recommender profile")?;
    if let Some(strategy) = args.strategy {
        profile = profile.with_strategy(strategy.as_domain());
    }

    let index = build_index(load_catalog(args.catalog.as_deref()).await?)?;
    let mut recommender = Recommender::from_profile(index, &profile).with_debug(!args.no_debug);
    if let Some(path) = &args.audit_log {
        let sink = JsonlAuditSink::open(path)
            .with_context(|| format!("Failed to open audit log {}", path.display()))?;
        recommender = recommender.with_audit_sink(Box::new(sink));
    }

    let response = recommender.recommend(&request)?;
    print_json(&response, args.pretty)
}

fn run_blueprint(args: BlueprintArgs) -> Result<()> {
    let request = read_request(&args.input)?;
    print_json(&reco_engine::build_blueprint(&request), args.pretty)
}

async fn run_search(args: SearchArgs) -> Result<()> {
    let index = build_index(load_catalog(args.catalog.as_deref()).await?)?;
    let snapshot = index.snapshot();
    let hits: Vec<SearchHitOutput> = snapshot
        .search(&args.query, args.limit)?
        .into_iter()
        .map(|hit| SearchHitOutput {
            product_id: hit.product.product_id.clone(),
            name: hit.product.name.clone(),
            score: hit.score,
        })
        .collect();

    if args.json {
        return print_json(&hits, true);
    }
    if hits.is_empty() {
        print_stdout("No matches.")?;
    }
    for (i, hit) in hits.iter().enumerate() {
        print_stdout(&format!(
            "{}. {} (score: {:.3})",
            i + 1,
            hit.product_id,
            hit.score
        ))?;
        print_stdout(&format!("   {}", hit.name))?;
    }
    Ok(())
}

async fn run_catalog(args: CatalogArgs) -> Result<()> {
    let catalog = load_catalog(args.catalog.as_deref()).await?;
    if let Some(path) = &args.export {
        catalog
            .save(path)
            .await
            .with_context(|| format!("Failed to export catalog to {}", path.display()))?;
        log::info!("Exported {} products to {}", catalog.len(), path.display());
    }
    if args.json {
        return print_json(&catalog.products(), true);
    }
    for product in catalog.products() {
        print_stdout(&format!(
            "{:<24} {:>3} min  [{}]  {}",
            product.product_id,
            product.max_duration_min,
            product.constructs.join(", "),
            product.name
        ))?;
    }
    Ok(())
}

async fn load_catalog(path: Option<&Path>) -> Result<Catalog> {
    match path {
        Some(path) => Catalog::load(path)
            .await
            .with_context(|| format!("Failed to load catalog {}", path.display())),
        None => Catalog::builtin().context("Built-in catalog is invalid"),
    }
}

fn build_index(catalog: Catalog) -> Result<Arc<IndexHandle>> {
    let model = EmbeddingModel::from_env().context("Failed to configure embedding backend")?;
    log::info!(
        "Embedding {} products ({} mode, dim {})",
        catalog.len(),
        model.mode().as_str(),
        model.dimension()
    );
    let embedder: Arc<dyn Embedder> = Arc::new(model);
    let handle = IndexHandle::build(Arc::new(catalog), embedder)
        .context("Failed to build the embedding index")?;
    Ok(Arc::new(handle))
}

fn read_request(input: &RequestInput) -> Result<RecommendationRequest> {
    let raw = read_payload(input)?;
    serde_json::from_str(&raw).context("Invalid request JSON passed to --json/--file")
}

fn read_payload(input: &RequestInput) -> Result<String> {
    if let Some(raw) = &input.json {
        return Ok(raw.clone());
    }
    if let Some(path) = &input.file {
        return fs::read_to_string(path)
            .with_context(|| format!("Failed to read JSON from {}", path.display()));
    }

    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read JSON from stdin")?;

    if buffer.trim().is_empty() {
        anyhow::bail!("Request is empty. Provide --json, --file, or pipe JSON via stdin.");
    }

    Ok(buffer)
}

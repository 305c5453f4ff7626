//! controller-attach - bootstrap for the shared controller runtime
//!
//! Registers the linked control loops, attaches them to one manager and
//! runs it until Ctrl-C.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Startup error (config, attachment failure) or a worker failure

use anyhow::{Context, Result};
use controller_attach::cli::{Args, OutputFormat};
use controller_attach::config::{Config, CONFIG_FILE};
use controller_attach::{
    controllers, registry, DiscoveryChannel, Manager, NamespaceScope, RegistryBuilder,
};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(&args, &config);

    info!("controller-attach v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args, config).await {
        error!("controller-attach failed: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .controller-attach.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("{} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    std::fs::write(path, Config::default_toml())
        .with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("Created {} with default settings.", CONFIG_FILE);
    Ok(())
}

/// Initialize logging from the CLI flags, unless the config sets a level.
fn init_logging(args: &Args, config: &Config) {
    let mut level = args.log_level();

    if !args.quiet && !args.verbose {
        if config.general.verbose {
            level = tracing::Level::DEBUG;
        }
        if let Some(ref configured) = config.general.log_level {
            match configured.parse() {
                Ok(parsed) => level = parsed,
                Err(_) => eprintln!("Ignoring invalid log_level '{}'", configured),
            }
        }
    }

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Load configuration from file or use defaults, then apply CLI overrides.
fn load_config(args: &Args) -> Result<Config> {
    let mut config = if let Some(ref config_path) = args.config {
        Config::load(config_path)?
    } else {
        match Config::load_default() {
            Ok(Some(config)) => config,
            Ok(None) => Config::default(),
            Err(e) => {
                eprintln!("Warning: failed to load {}: {:#}", CONFIG_FILE, e);
                Config::default()
            }
        }
    };

    config.merge_with_args(args);
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Build the registry, attach every controller and run the manager.
async fn run(args: Args, config: Config) -> Result<()> {
    let start_time = Instant::now();

    let mut builder = RegistryBuilder::new();
    controllers::register_all(&mut builder);
    let registry = builder.freeze();
    debug!("Registered controllers: {:?}", registry.names());

    let manager = Manager::new();
    let discovery = DiscoveryChannel::new(config.discovery.capacity);
    let scope = config.scope();

    // A partially attached manager is never run.
    registry::attach(&registry, &manager, &discovery, &scope)
        .context("Failed to attach controllers")?;

    info!(
        "Attached {} controllers in {:.1}ms",
        registry.len(),
        start_time.elapsed().as_secs_f64() * 1000.0
    );

    if args.dry_run {
        return print_workers(&manager, &scope, args.format);
    }

    manager
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl-C: {}", e);
                futures::future::pending::<()>().await;
            }
        })
        .await
        .context("Manager stopped with an error")
}

/// Handle --dry-run: list what would run and exit.
fn print_workers(
    manager: &Manager,
    scope: &NamespaceScope,
    format: OutputFormat,
) -> Result<()> {
    let workers = manager.worker_names();

    match format {
        OutputFormat::Json => {
            let listing = serde_json::json!({
                "namespace": scope.as_str(),
                "workers": workers,
            });
            println!("{}", serde_json::to_string_pretty(&listing)?);
        }
        OutputFormat::Text => {
            println!("Namespace scope: {}", scope);
            if workers.is_empty() {
                println!("No workers attached.");
            } else {
                for worker in &workers {
                    println!("  {}", worker);
                }
                println!("Total: {} workers", workers.len());
            }
        }
    }

    Ok(())
}

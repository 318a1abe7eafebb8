use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use repofolio::{Config, DisplayRepository, FolioError, Pipeline};

#[derive(Parser)]
#[command(name = "repofolio")]
#[command(about = "Fetch, filter and cache a GitHub account's public repositories")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (defaults to XDG config location)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// GitHub username (overrides the configured one)
    #[arg(short, long, global = true)]
    username: Option<String>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a configuration file (use --username to set the account)
    Init,

    /// List the portfolio repositories
    List {
        /// Print the listing as JSON
        #[arg(long)]
        json: bool,

        /// Discard the cached listing before fetching
        #[arg(long)]
        refresh: bool,
    },

    /// Inspect or clear the repository cache
    Cache {
        #[command(subcommand)]
        cache_command: CacheCommands,
    },
}

#[derive(Subcommand)]
enum CacheCommands {
    /// Show what is cached and whether it is still valid
    Status,

    /// Remove the cached listing
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(username) = cli.username {
        config.portfolio.username = username;
    }

    init_logging(cli.verbose, &config.logging.level)?;
    info!("Starting Repofolio v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Init => cmd_init(&config),
        Commands::List { json, refresh } => cmd_list(json, refresh, &config).await,
        Commands::Cache { cache_command } => cmd_cache(cache_command, &config),
    }
}

/// Initialize logging: RUST_LOG wins, then --verbose, then the configured level
fn init_logging(verbose: bool, level: &str) -> Result<()> {
    let fallback = if verbose { "debug" } else { level };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    Ok(())
}

/// Load configuration from specified path or default location
fn load_config(config_path: Option<&std::path::Path>) -> Result<Config> {
    match config_path {
        Some(path) => Config::load(path),
        None => Config::load_or_default(),
    }
}

/// Write the effective configuration to the default location
fn cmd_init(config: &Config) -> Result<()> {
    let config_path = Config::default_config_path()?;
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    config.save(&config_path)?;

    println!("✅ Repofolio initialized");
    println!("   Config: {:?}", config_path);
    if config.portfolio.username.is_empty() {
        println!("   Next: set portfolio.username or run 'repofolio init --username <name>'");
    } else {
        println!("   Account: {}", config.portfolio.username);
        println!("   Next: run 'repofolio list'");
    }

    Ok(())
}

/// Fetch (or reuse) the listing and print it
async fn cmd_list(json: bool, refresh: bool, config: &Config) -> Result<()> {
    config.validate()?;
    let pipeline = Pipeline::from_config(config)?;

    if refresh {
        pipeline.cache().clear();
    }

    let repos = match pipeline.get_repositories().await {
        Ok(repos) => repos,
        Err(e) => {
            eprintln!("❌ Unable to load projects from GitHub.");
            if matches!(e, FolioError::RateLimited) {
                eprintln!("   Wait for the rate limit window to reset, then try again.");
            }
            return Err(e.into());
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&repos)?);
        return Ok(());
    }

    if repos.is_empty() {
        println!("No repositories to show for {}.", config.portfolio.username);
        if config.portfolio.show_only_pinned {
            println!(
                "   💡 Only pinned repositories are shown: tag one with '{}' or list it in manual_repo_names",
                config.portfolio.featured_topic
            );
        }
        return Ok(());
    }

    println!("Repositories ({}):", repos.len());
    println!();
    for repo in &repos {
        print_card(repo);
    }

    Ok(())
}

fn print_card(repo: &DisplayRepository) {
    if repo.is_featured {
        println!("📁 {}  ⭐ Featured", repo.title());
    } else {
        println!("📁 {}", repo.title());
    }
    println!("   📝 {}", repo.description);

    let mut tags: Vec<&str> = Vec::new();
    if let Some(language) = &repo.language {
        tags.push(language);
    }
    tags.extend(repo.top_topics(5).iter().map(String::as_str));
    if !tags.is_empty() {
        println!("   🏷️  {}", tags.join(", "));
    }

    println!(
        "   ⭐ {}  🍴 {}  🕒 {}",
        repo.stars,
        repo.forks,
        repo.updated_label()
    );
    println!("   🔗 {}", repo.url);
    if let Some(homepage) = &repo.homepage {
        println!("   🌐 {}", homepage);
    }
    println!();
}

/// Handle cache commands
fn cmd_cache(cache_command: CacheCommands, config: &Config) -> Result<()> {
    let pipeline = Pipeline::from_config(config)?;
    let cache = pipeline.cache();

    match cache_command {
        CacheCommands::Status => {
            let status = cache.status();
            println!("📊 Repository Cache");
            println!("   📄 Database: {}", config.cache.database_path);
            match (status.stored_at, status.age) {
                (Some(stored_at), Some(age)) => {
                    println!("   🕒 Stored: {}", stored_at.format("%Y-%m-%d %H:%M:%S UTC"));
                    println!("   ⏱️  Age: {}m", age.num_minutes());
                    if let Some(account) = &status.account {
                        println!("   👤 Account: {}", account);
                    }
                    match status.entries {
                        Some(count) => println!("   📁 Repositories: {}", count),
                        None => println!("   ⚠️  Cached payload is unreadable"),
                    }
                    if status.valid {
                        println!("   🟢 Valid");
                    } else {
                        println!("   🔴 Expired");
                    }
                }
                _ => println!("   🔴 Empty"),
            }
        }
        CacheCommands::Clear => {
            cache.clear();
            println!("✅ Cache cleared");
        }
    }

    Ok(())
}

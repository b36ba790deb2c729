use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use catalog::{GenreCatalog, GenreId};
use fetcher::RetryingFetcher;
use server::{open_catalog, Engine, EngineConfig, MatchResult};
use similarity::{SeededRandom, SimilarityResolver, StrategyKind};
use upstream::{MusicApi, SpotifyClient, Track};

const DEFAULT_CONFIG: &str = "config/song-match.toml";

/// song-match - recommend a track that bridges two others
#[derive(Parser)]
#[command(name = "song-match")]
#[command(about = "Genre-similarity song recommendations", long_about = None)]
struct Cli {
    /// Path to the TOML configuration (defaults apply when absent)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Similarity strategy: rank or embedding
    #[arg(long, global = true)]
    strategy: Option<StrategyKind>,

    /// Seed for sampling and tie-breaks
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recommend a track from two seed track ids
    Recommend {
        #[arg(long)]
        seed1: String,

        #[arg(long)]
        seed2: String,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve two genres against the catalog only (no API calls)
    Similar {
        #[arg(long)]
        genre_a: String,

        #[arg(long)]
        genre_b: String,
    },

    /// Show what the catalog knows about a genre
    Genre {
        #[arg(long)]
        name: String,
    },

    /// Search the music API for tracks
    Search {
        #[arg(long)]
        query: String,

        #[arg(long, default_value = "5")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Recommend { seed1, seed2, json } => {
            handle_recommend(config, &seed1, &seed2, json).await?
        }
        Commands::Similar { genre_a, genre_b } => {
            handle_similar(&config, &genre_a, &genre_b).await?
        }
        Commands::Genre { name } => handle_genre(&config, &name).await?,
        Commands::Search { query, limit } => handle_search(&config, &query, limit).await?,
    }

    Ok(())
}

/// Load the configuration file (if any) and apply flag overrides
fn load_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None if Path::new(DEFAULT_CONFIG).exists() => EngineConfig::load(Path::new(DEFAULT_CONFIG))?,
        None => {
            debug!("No config file found, using defaults");
            EngineConfig::default()
        }
    };

    if let Some(strategy) = cli.strategy {
        config.strategy = strategy;
    }
    if let Some(seed) = cli.seed {
        config.random_seed = Some(seed);
    }
    config.validate()?;
    Ok(config)
}

/// Handle the 'recommend' command
async fn handle_recommend(config: EngineConfig, seed1: &str, seed2: &str, json: bool) -> Result<()> {
    let engine = Engine::start(config).await?;

    let start = Instant::now();
    let outcome = engine.orchestrator().recommend(seed1, seed2).await;
    let elapsed = start.elapsed();
    engine.shutdown().await;

    let result = outcome.map_err(|err| {
        let hint = if err.is_retryable() {
            "upstream failure, try again later"
        } else {
            "no match for these seeds"
        };
        anyhow!("{} ({})", err, hint)
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_match(&result);
        println!("{}", format!("Matched in {:.2?}", elapsed).dimmed());
    }
    Ok(())
}

/// Handle the 'similar' command
async fn handle_similar(config: &EngineConfig, genre_a: &str, genre_b: &str) -> Result<()> {
    let catalog = open_catalog(&config.catalog).await?;
    let resolver = SimilarityResolver::new(
        config.strategy,
        catalog.clone(),
        RetryingFetcher::new(config.retry.policy()),
        Arc::new(SeededRandom::new(config.random_seed)),
    );

    let (genre_a, genre_b) = (GenreId::new(genre_a), GenreId::new(genre_b));
    let outcome = resolver.resolve(&genre_a, &genre_b).await;
    catalog.close().await;
    let result = outcome?;

    println!(
        "{} + {} {} {}",
        genre_a.as_str().cyan(),
        genre_b.as_str().cyan(),
        "→".bold(),
        result.winner.as_str().green().bold()
    );
    println!("{}Strategy: {}", "• ".green(), resolver.kind());
    println!("{}Score: {:.4}", "• ".green(), result.score);
    if result.tied > 1 {
        println!("{}Picked from {} tied genres", "• ".yellow(), result.tied);
    }
    Ok(())
}

/// Handle the 'genre' command
async fn handle_genre(config: &EngineConfig, name: &str) -> Result<()> {
    let catalog = open_catalog(&config.catalog).await?;
    let genre = GenreId::new(name);

    let outcome = describe_genre(catalog.as_ref(), &genre).await;
    catalog.close().await;
    outcome
}

async fn describe_genre(catalog: &dyn GenreCatalog, genre: &GenreId) -> Result<()> {
    let representation = catalog
        .genre_representation(genre)
        .await?
        .ok_or_else(|| anyhow!("Genre '{}' is not in the catalog", genre))?;
    let artists = catalog.artists_for_genre(genre).await?;

    println!("{}", format!("Genre: {}", genre).bold().blue());

    match &representation.rank_list {
        Some(list) => {
            let head: Vec<&str> = list.iter().take(10).map(GenreId::as_str).collect();
            println!("{}Similar ({} total): {}", "• ".green(), list.len(), head.join(", "));
        }
        None => println!("{}Similar: {}", "• ".green(), "none".dimmed()),
    }

    match &representation.embedding {
        Some(embedding) => println!("{}Embedding: {} dimensions", "• ".green(), embedding.len()),
        None => println!("{}Embedding: {}", "• ".green(), "none".dimmed()),
    }

    println!("{}Artists: {}", "• ".cyan(), artists.len());
    for artist in artists.iter().take(10) {
        println!("  - {}", artist);
    }
    if artists.len() > 10 {
        println!("  {}", format!("... and {} more", artists.len() - 10).dimmed());
    }
    Ok(())
}

/// Handle the 'search' command
async fn handle_search(config: &EngineConfig, query: &str, limit: usize) -> Result<()> {
    let client = SpotifyClient::new(config.upstream.spotify_config()?)?;
    let fetcher = RetryingFetcher::new(config.retry.policy());
    info!("Searching {} for '{}'", client.name(), query);

    let tracks = fetcher
        .run("search_tracks", || client.search_tracks(query, limit))
        .await?;

    println!("{}", format!("Search results for '{}':", query).bold().blue());
    if tracks.is_empty() {
        println!("  {}", "no tracks with genre tags found".dimmed());
    }
    for (rank, track) in tracks.iter().enumerate() {
        let artists: Vec<&str> = track.artist_names().collect();
        println!(
            "{}. {} - {} [{}]",
            (rank + 1).to_string().green(),
            track.name,
            artists.join(", "),
            track.id.dimmed()
        );
        println!("   {}", track.genres.join(", ").dimmed());
    }
    Ok(())
}

/// Helper function to format and print a match
fn print_match(result: &MatchResult) {
    let track = result.track();
    let (genre_a, genre_b) = result.seed_genres();

    print!("{}", "Recommended track:\n".bold().blue());
    println!(
        "{} by {}{}",
        track.name.bold(),
        track.artist_line().green(),
        explicit_marker(track)
    );
    println!(
        "{}Genres: {} + {} {} {} ({} score {:.3})",
        "• ".green(),
        genre_a,
        genre_b,
        "→".bold(),
        result.matched_genre().as_str().green(),
        result.strategy(),
        result.score()
    );
    println!("{}Artist pick: {}", "• ".green(), result.artist());
    println!("{}Album: {}", "• ".cyan(), track.album.name);
    if let Some(url) = &track.url {
        println!("{}Listen: {}", "• ".cyan(), url);
    }
    if let Some(cover) = track.cover_art() {
        println!("{}Cover art: {}", "• ".cyan(), cover);
    }
}

fn explicit_marker(track: &Track) -> String {
    if track.explicit {
        format!(" {}", "[E]".red())
    } else {
        String::new()
    }
}

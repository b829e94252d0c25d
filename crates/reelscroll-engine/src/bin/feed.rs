//! reelscroll-feed: fetch one feed page from the catalog and print it.
//!
//! Reads `STASH_URL`, `STASH_API_KEY` and the `FEED_*` settings from the
//! environment (a `.env` file is honoured).

use std::process::ExitCode;

use anyhow::Context;
use clap::{ArgGroup, Parser};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reelscroll_engine::{FeedClient, FeedQuery};

#[derive(Parser)]
#[command(name = "reelscroll-feed")]
#[command(author, version, about = "Fetch a feed page from the media catalog")]
#[command(group(ArgGroup::new("mode").args(["markers", "scenes", "shuffle"])))]
struct Cli {
    /// Scene marker feed (default)
    #[arg(long)]
    markers: bool,

    /// Scene feed
    #[arg(long)]
    scenes: bool,

    /// Shuffle feed: scenes expanded into markers, sparsely marked first
    #[arg(long)]
    shuffle: bool,

    /// Free-text query
    #[arg(short, long)]
    query: Option<String>,

    /// Tag ID to filter by (repeatable)
    #[arg(short, long)]
    tag: Vec<String>,

    /// Performer ID to filter by (repeatable)
    #[arg(short, long)]
    performer: Vec<String>,

    /// Saved filter ID; replaces the manual filters
    #[arg(long)]
    saved_filter: Option<String>,

    /// Items per page
    #[arg(long)]
    per_page: Option<u32>,

    /// Item offset; pins the page instead of drawing one at random
    #[arg(long)]
    offset: Option<u64>,
}

impl Cli {
    fn mode(&self) -> &'static str {
        match (self.markers, self.scenes, self.shuffle) {
            (false, true, _) => "scenes",
            (false, _, true) => "shuffle",
            _ => "markers",
        }
    }

    fn feed_query(&self) -> FeedQuery {
        FeedQuery {
            query: self.query.clone(),
            tag_ids: self.tag.clone(),
            performer_ids: self.performer.clone(),
            saved_filter_id: self.saved_filter.clone(),
            offset: self.offset,
            per_page: self.per_page,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_logging();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` filter (default `info`); `LOG_FORMAT=json` for JSON lines.
fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(env_filter);

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v == "json");
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let client = FeedClient::from_env(None).context("failed to build feed client")?;
    let cancel = CancellationToken::new();
    let query = cli.feed_query();

    let mode = cli.mode();
    info!(mode, backend = client.backend(), "Fetching feed page");

    let output = match mode {
        "scenes" => serde_json::to_string_pretty(&client.fetch_scene_feed(&query, &cancel).await)?,
        "shuffle" => {
            serde_json::to_string_pretty(&client.fetch_shuffle_feed(&query, &cancel).await)?
        }
        _ => serde_json::to_string_pretty(&client.fetch_marker_feed(&query, &cancel).await)?,
    };
    println!("{}", output);

    let stats = client.cache_stats().await;
    info!(
        cache_hits = stats.hits,
        cache_misses = stats.misses,
        "Done"
    );
    client.dispose().await;
    Ok(())
}

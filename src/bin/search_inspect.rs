use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};
use tube_digest::{channel_matches, is_recent, parse_search_page, Config, VideoSearch, YouTubeSearcher};

#[derive(Parser)]
#[command(name = "search-inspect")]
#[command(about = "Inspect how the monitor sees search results")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search live and list recent candidates
    Search {
        /// Subscription name to search for
        query: String,
        /// Only show videos whose channel matches the query
        #[arg(long)]
        matching: bool,
    },
    /// Parse a saved results page
    Parse {
        /// HTML file saved from a results page
        file: PathBuf,
    },
    /// Check whether a relative time string is inside the window
    Recency {
        /// e.g. "3 days ago" or "2 週前"
        text: String,
    },
    /// Check whether a channel name matches a subscription
    Match {
        subscription: String,
        channel: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("tube_digest=info,search_inspect=info")
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Search { query, matching } => {
            let searcher = YouTubeSearcher::new(&Config::default().discovery);
            let videos = searcher.search(&query).await;

            if videos.is_empty() {
                warn!("📭 No recent videos found for '{}'", query);
                return Ok(());
            }

            info!("📹 {} recent videos for '{}':", videos.len(), query);
            for video in videos {
                let matched = channel_matches(&query, &video.channel);
                if matching && !matched {
                    continue;
                }
                info!(
                    "  {} {} | {} | {} | {}",
                    if matched { "✅" } else { "➖" },
                    video.id,
                    video.channel,
                    video.published_time_text,
                    video.title
                );
            }
        }
        Commands::Parse { file } => {
            let body = tokio::fs::read_to_string(&file).await?;
            let videos = parse_search_page(&body, &file.display().to_string());
            info!("📄 {} recent videos in {}", videos.len(), file.display());
            for video in videos {
                info!("  {} | {} | {}", video.id, video.channel, video.title);
            }
        }
        Commands::Recency { text } => {
            let verdict = if is_recent(&text) { "within window" } else { "too old" };
            info!("⏱️ '{}' is {}", text, verdict);
        }
        Commands::Match {
            subscription,
            channel,
        } => {
            let verdict = if channel_matches(&subscription, &channel) { "matches" } else { "does not match" };
            info!("📺 '{}' {} '{}'", channel, verdict, subscription);
        }
    }

    Ok(())
}

use anyhow::{Context, Result};
use chrono::{TimeDelta, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use changefeed::config::Config;
use changefeed::feed::{
    ExecutionContext, FeedFetcher, FeedService, FetchStrategy, ParserKind, Post,
};
use changefeed::store::FeedStore;
use changefeed::util::{strip_control_chars, truncate_to_width};
use changefeed::widget::{render, WidgetFamily, WidgetProvider};

/// Columns used for widget rendering.
const WIDGET_WIDTH: usize = 40;

/// Get the config directory path (~/.config/changefeed/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("changefeed"))
}

#[derive(Parser, Debug)]
#[command(name = "changefeed", about = "Changelog feed reader and widget snapshot")]
struct Args {
    /// Config file (default: ~/.config/changefeed/config.toml)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Fetch through the CORS relay, as a browser build would
    #[arg(long, global = true)]
    browser: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List posts in feed order
    List {
        /// Only posts whose title or description contains this text
        #[arg(long)]
        search: Option<String>,
        /// Print posts as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one post by id
    Show { id: String },
    /// Render the widget snapshot
    Widget {
        #[arg(long, value_enum, default_value = "medium")]
        family: WidgetFamily,
        /// Use sample posts instead of fetching
        #[arg(long)]
        preview: bool,
    },
}

fn build_service(config: &Config, context: ExecutionContext, parser: ParserKind) -> Result<FeedService> {
    let strategy = FetchStrategy::for_context(context, config.relay_url()?);
    let client = reqwest::Client::builder()
        .user_agent(concat!("changefeed/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;
    let fetcher = FeedFetcher::new(client, config.feed_url()?, strategy);
    Ok(FeedService::new(fetcher, parser.build()))
}

fn print_post_line(post: &Post) {
    println!(
        "{:<18} {}",
        strip_control_chars(&post.formatted_date),
        truncate_to_width(&strip_control_chars(&post.title), 72)
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing for debug logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => get_config_dir()?.join("config.toml"),
    };
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let context = if args.browser {
        ExecutionContext::Browser
    } else {
        config.context
    };
    tracing::debug!(context = ?context, "Execution context selected");

    match args.command {
        Command::List { search, json } => {
            let store = FeedStore::new(build_service(&config, context, ParserKind::Tree)?);
            store.load().await;
            let state = store.snapshot();

            if let Some(error) = &state.error {
                eprintln!("{}", strip_control_chars(error));
            }
            let posts = state.search(search.as_deref().unwrap_or(""));

            if json {
                println!("{}", serde_json::to_string_pretty(&posts)?);
            } else if posts.is_empty() {
                println!("No posts found");
            } else {
                for post in posts {
                    print_post_line(post);
                }
            }
            if state.error.is_some() {
                std::process::exit(1);
            }
        }
        Command::Show { id } => {
            let store = FeedStore::new(build_service(&config, context, ParserKind::Tree)?);
            store.load().await;
            let state = store.snapshot();

            if let Some(error) = &state.error {
                anyhow::bail!("{}", strip_control_chars(error));
            }
            let post = state
                .find(&id)
                .with_context(|| format!("Post not found: {id}"))?;

            // SEC-001: feed text is untrusted
            println!("{}", strip_control_chars(&post.title));
            println!("{}", strip_control_chars(&post.formatted_date));
            println!("{}", strip_control_chars(&post.link));
            if let Some(thumbnail) = &post.thumbnail_url {
                println!("Image: {}", strip_control_chars(thumbnail));
            }
            if let Some(description) = &post.description {
                println!();
                println!("{}", strip_control_chars(description));
            }
        }
        Command::Widget { family, preview } => {
            let interval = TimeDelta::try_minutes(config.widget_refresh_minutes)
                .context("widget_refresh_minutes is out of range")?;
            let provider = WidgetProvider::new(build_service(&config, context, ParserKind::Events)?)
                .with_max_posts(config.widget_max_posts)
                .with_refresh_interval(interval);

            let now = Utc::now();
            let entry = if preview {
                provider.snapshot(now, true).await
            } else {
                let mut timeline = provider.timeline(now).await;
                tracing::info!(next_refresh = %timeline.next_refresh, "Widget timeline built");
                timeline
                    .entries
                    .pop()
                    .unwrap_or_else(|| provider.placeholder(now))
            };
            for line in render(&entry, family, WIDGET_WIDTH) {
                println!("{line}");
            }
        }
    }

    Ok(())
}

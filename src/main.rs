//! # sitebot CLI
//!
//! The `sitebot` binary drives the full lifecycle of website knowledge
//! bases: registry initialization, bot creation, refresh, chat, deletion,
//! and the HTTP API server.
//!
//! ## Usage
//!
//! ```bash
//! sitebot --config ./config/sitebot.toml <command>
//! ```
//!
//! | Command | Description |
//! |---------|-------------|
//! | `sitebot init` | Create the bot registry database |
//! | `sitebot create <url>` | Crawl and index a website into a new bot |
//! | `sitebot refresh <bot-id>` | Re-crawl a bot's website, replacing its index |
//! | `sitebot chat <bot-id> <message>` | Ask a ready bot a question |
//! | `sitebot delete <bot-id>` | Delete a bot and its index storage |
//! | `sitebot serve` | Start the HTTP API server |

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use sitebot::config::load_config;
use sitebot::embedding::create_embedder;
use sitebot::generate::create_generator;
use sitebot::index::VectorIndex;
use sitebot::normalize::Normalizer;
use sitebot::store::BotStore;
use sitebot::{chat, db, ingest, migrate, server};

/// sitebot CLI arguments.
#[derive(Parser)]
#[command(
    name = "sitebot",
    about = "Turn any website into a queryable knowledge base with retrieval-augmented chat",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/sitebot.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the bot registry database.
    ///
    /// Creates the SQLite database file and the bots table. Idempotent;
    /// running it multiple times is safe.
    Init,

    /// Create a bot for a website: crawl, clean, chunk, embed, index.
    ///
    /// Idempotent per URL: if a bot already exists for the website, its
    /// identifier and current state are printed without re-ingesting.
    Create {
        /// Seed URL of the website to ingest.
        url: String,
    },

    /// Re-ingest an existing bot's website, fully replacing its index.
    Refresh {
        /// Identifier of the bot to refresh.
        bot_id: String,
    },

    /// Ask a ready bot a question and print the answer with its sources.
    Chat {
        /// Identifier of the bot to query.
        bot_id: String,
        /// The question to ask.
        message: String,
    },

    /// Delete a bot record and its self-contained index storage.
    Delete {
        /// Identifier of the bot to delete.
        bot_id: String,
    },

    /// Start the HTTP API server.
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let pool = db::connect(&config).await?;
            migrate::run_migrations(&pool).await?;
            pool.close().await;
            println!("initialized {}", config.db.path.display());
        }

        Commands::Create { url } => {
            let pool = db::connect(&config).await?;
            let store = BotStore::new(pool);
            let index = VectorIndex::new(config.index.root.clone());
            let embedder = create_embedder(&config.embedding)?;
            let normalizer = Normalizer::new(&config.cleaning)?;

            let bot = ingest::create_bot(
                &config,
                &store,
                &index,
                embedder.as_ref(),
                &normalizer,
                &url,
            )
            .await?;

            println!("bot: {}", bot.id);
            println!("  url: {}", bot.website_url);
            println!("  status: {}", bot.status);
        }

        Commands::Refresh { bot_id } => {
            let pool = db::connect(&config).await?;
            let store = BotStore::new(pool);
            let index = VectorIndex::new(config.index.root.clone());
            let embedder = create_embedder(&config.embedding)?;
            let normalizer = Normalizer::new(&config.cleaning)?;

            let bot = ingest::refresh_bot(
                &config,
                &store,
                &index,
                embedder.as_ref(),
                &normalizer,
                &bot_id,
            )
            .await?;

            println!("bot: {}", bot.id);
            println!("  status: {}", bot.status);
        }

        Commands::Chat { bot_id, message } => {
            let pool = db::connect(&config).await?;
            let store = BotStore::new(pool);
            let index = VectorIndex::new(config.index.root.clone());
            let embedder = create_embedder(&config.embedding)?;
            let generator = create_generator(&config.generation)?;

            let answer = chat::chat(
                &config,
                &store,
                &index,
                embedder.as_ref(),
                generator.as_ref(),
                &bot_id,
                &message,
            )
            .await?;

            println!("{}", answer.answer);
            println!();
            println!("sources:");
            for source in &answer.sources {
                println!("  - {}", source.page_url);
            }
        }

        Commands::Delete { bot_id } => {
            let pool = db::connect(&config).await?;
            let store = BotStore::new(pool);
            let index = VectorIndex::new(config.index.root.clone());
            ingest::delete_bot(&store, &index, &bot_id).await?;
            println!("deleted {bot_id}");
        }

        Commands::Serve => {
            server::run_server(&config).await?;
        }
    }

    Ok(())
}

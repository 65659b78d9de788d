//! # sitebot
//!
//! Turn any website into a queryable knowledge base.
//!
//! sitebot crawls the pages reachable from a seed URL, cleans and chunks
//! their text, embeds the chunks, and stores them in a per-bot vector
//! index. Questions are answered by retrieving the nearest chunks and
//! prompting a language model with them as the only permitted context.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────┐   ┌──────────────┐   ┌─────────┐   ┌────────────┐
//! │ Crawler │──▶│ Normalize +  │──▶│  Embed  │──▶│  Per-bot   │
//! │  (BFS)  │   │   Chunk      │   │ Gateway │   │ Vec Index  │
//! └─────────┘   └──────────────┘   └─────────┘   └─────┬──────┘
//!                                                      │
//!                             query ───▶ embed ───▶ top-k ───▶ LLM
//! ```
//!
//! A bot moves `processing → ready` when ingestion succeeds and
//! `processing → failed` when any stage errors; a refresh resets its
//! index and runs the pipeline again.
//!
//! ## Quick Start
//!
//! ```bash
//! sitebot init                          # create the bot registry
//! sitebot create https://example.com    # crawl + index a website
//! sitebot chat <bot-id> "What do you sell?"
//! sitebot serve                         # start the HTTP API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`error`] | Typed failure taxonomy |
//! | [`crawler`] | Same-domain breadth-first crawler |
//! | [`normalize`] | Page text cleaning |
//! | [`chunk`] | Sentence-boundary chunking |
//! | [`embedding`] | Embedding gateway abstraction |
//! | [`generate`] | Answer generator gateway |
//! | [`index`] | Per-bot persistent vector index |
//! | [`store`] | Bot record store |
//! | [`ingest`] | Ingestion orchestration + lifecycle |
//! | [`chat`] | Retrieval orchestration |
//! | [`server`] | HTTP API server |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod chat;
pub mod chunk;
pub mod config;
pub mod crawler;
pub mod db;
pub mod embedding;
pub mod error;
pub mod generate;
pub mod index;
pub mod ingest;
pub mod migrate;
pub mod models;
pub mod normalize;
pub mod server;
pub mod store;

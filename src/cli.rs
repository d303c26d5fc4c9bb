// src/cli.rs
// =============================================================================
// Command-line interface, defined with clap's derive API.
//
// Subcommands:
// - site:  crawl a real website concurrently, each page at most once
// - demo:  crawl the built-in canned site (no network needed)
// - trees: walk random binary trees and compare them
// - pool:  spread generated work items over a few workers
//
// Flags marked `env = ...` can also come from the environment; an explicit
// flag wins over the variable.
// =============================================================================

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "link-walker",
    version = "0.1.0",
    about = "Concurrent, depth-limited crawling that visits every page at most once",
    long_about = "link-walker explores a site (or any graph) with one task per discovered link, \
                  deduplicating through a shared visited set and returning only once every \
                  task has finished. Set RUST_LOG (e.g. RUST_LOG=debug) for more detail."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl a website concurrently
    ///
    /// Example: link-walker site https://example.com --max-depth 3
    Site {
        /// Website URL to start from (e.g., https://example.com)
        website_url: String,

        /// Output results in JSON format instead of a table
        #[arg(long)]
        json: bool,

        /// Depth budget: 1 = just the starting page, 2 = plus the pages it
        /// links to, and so on. 0 crawls nothing.
        #[arg(long, env = "LINK_WALKER_MAX_DEPTH", default_value_t = 2)]
        max_depth: usize,

        /// Per-request timeout in seconds
        #[arg(long, env = "LINK_WALKER_TIMEOUT_SECS", default_value_t = 10)]
        timeout_secs: u64,

        /// Politeness delay before each request, in milliseconds
        #[arg(long, env = "LINK_WALKER_DELAY_MS", default_value_t = 100)]
        delay_ms: u64,

        /// Follow links to other domains too
        #[arg(long)]
        any_domain: bool,
    },

    /// Crawl the built-in canned site
    Demo {
        #[arg(long, default_value_t = 4)]
        max_depth: usize,

        #[arg(long)]
        json: bool,
    },

    /// Walk two random binary trees and check whether they are equivalent
    ///
    /// Each tree holds k, 2k, ..., 10k for its k.
    Trees {
        #[arg(long, default_value_t = 1)]
        first: i64,

        #[arg(long, default_value_t = 2)]
        second: i64,
    },

    /// Distribute generated work items across a pool of workers
    Pool {
        #[arg(long, default_value_t = 3)]
        workers: usize,

        #[arg(long, default_value_t = 10)]
        items: u64,

        /// Bound of the queue between producer and workers
        #[arg(long, default_value_t = 10)]
        capacity: usize,
    },
}

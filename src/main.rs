// src/main.rs
// =============================================================================
// Entry point of the link-walker CLI.
//
// What happens here:
// 1. Set up logging (tracing, filtered by RUST_LOG, written to stderr)
// 2. Parse command-line arguments using clap
// 3. Dispatch to the subcommand handler
// 4. Print results and exit with a proper code
//    (0 = success, 1 = some pages failed to expand, 2 = error)
//
// stdout carries only results (table or JSON), so it can be piped.
// =============================================================================

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use link_walker::fetch::{canned_site, HttpConfig, HttpExpander, CANNED_ROOT};
use link_walker::pool::{self, PoolConfig};
use link_walker::traverse::{traverse, TraversalReport};
use link_walker::tree::{self, Tree};

#[tokio::main]
async fn main() {
    init_tracing();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Site {
            website_url,
            json,
            max_depth,
            timeout_secs,
            delay_ms,
            any_domain,
        } => {
            let config = HttpConfig {
                timeout: Duration::from_secs(timeout_secs),
                delay: Duration::from_millis(delay_ms),
                same_domain: !any_domain,
            };
            handle_site(&website_url, max_depth, config, json).await
        }
        Commands::Demo { max_depth, json } => handle_demo(max_depth, json).await,
        Commands::Trees { first, second } => handle_trees(first, second).await,
        Commands::Pool {
            workers,
            items,
            capacity,
        } => handle_pool(PoolConfig {
            workers,
            items,
            capacity,
        })
        .await,
    }
}

async fn handle_site(
    website_url: &str,
    max_depth: usize,
    config: HttpConfig,
    json: bool,
) -> Result<i32> {
    info!(url = website_url, max_depth, "crawling website");

    let expander = HttpExpander::new(website_url, config)
        .with_context(|| format!("Cannot crawl {}", website_url))?;
    let report = traverse(website_url.to_string(), max_depth, expander).await;

    print_report(&report, json, |page| {
        format!("{} ({} bytes)", page.title.as_deref().unwrap_or("-"), page.bytes)
    })?;
    Ok(exit_code(&report))
}

async fn handle_demo(max_depth: usize, json: bool) -> Result<i32> {
    info!(root = CANNED_ROOT, max_depth, "crawling canned site");

    let report = traverse(CANNED_ROOT.to_string(), max_depth, canned_site()).await;

    print_report(&report, json, |body| format!("{:?}", body))?;
    Ok(exit_code(&report))
}

async fn handle_trees(first: i64, second: i64) -> Result<i32> {
    let sample = Arc::new(Tree::random(first)?);

    let mut values = tree::spawn_walk(Arc::clone(&sample));
    while let Some(value) = values.recv().await {
        println!("Value: {}", value);
    }

    let same = tree::equivalent(Arc::clone(&sample), Arc::new(Tree::random(first)?)).await;
    println!("Same trees (k={}, k={})? {}", first, first, same);

    let same = tree::equivalent(sample, Arc::new(Tree::random(second)?)).await;
    println!("Same trees (k={}, k={})? {}", first, second, same);
    Ok(0)
}

async fn handle_pool(config: PoolConfig) -> Result<i32> {
    let mut assignments = pool::distribute(config)
        .await
        .context("Work pool failed")?;
    assignments.sort_by_key(|a| a.item);

    for assignment in &assignments {
        println!("Worker {} received task {}", assignment.worker, assignment.item);
    }
    Ok(0)
}

fn exit_code<N, C>(report: &TraversalReport<N, C>) -> i32 {
    if report.is_clean() {
        0
    } else {
        1
    }
}

// Prints the report either as JSON or as a human-readable table
fn print_report<C: Serialize>(
    report: &TraversalReport<String, C>,
    json: bool,
    describe: impl Fn(&C) -> String,
) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("{:<60} {:<6} {:<40}", "URL", "DEPTH", "CONTENT");
    println!("{}", "=".repeat(106));

    let mut found: Vec<_> = report.found.iter().collect();
    found.sort_by(|a, b| a.depth.cmp(&b.depth).then_with(|| a.node.cmp(&b.node)));
    for page in found {
        println!(
            "{:<60} {:<6} {:<40}",
            truncate(&page.node, 57),
            page.depth,
            describe(&page.content)
        );
    }

    if !report.failures.is_empty() {
        println!();
        println!("{:<60} {:<40}", "FAILED", "ERROR");
        println!("{}", "=".repeat(100));
        for failure in &report.failures {
            println!("{:<60} {:<40}", truncate(&failure.node, 57), failure.error);
        }
    }

    println!();
    println!("📊 Summary:");
    println!("   ✅ Found: {}", report.found.len());
    println!("   ❌ Failed: {}", report.failures.len());
    println!("   📋 Claimed: {}", report.claimed.len());
    Ok(())
}

// Shortens long URLs for the table, on a char boundary
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        format!("{}...", text.chars().take(max).collect::<String>())
    } else {
        text.to_string()
    }
}

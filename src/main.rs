//! Terminal front end and entry point.
//!
//! This binary stands in for the grid UI: it forwards typed commands to the
//! [`SearchController`] as intents and prints the notifications it publishes.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐   intents    ┌──────────────────────┐
//! │  stdin command loop  │ ───────────► │   SearchController   │
//! └──────────────────────┘              └──────────────────────┘
//!                                                  │ notifications
//! ┌──────────────────────┐                         │
//! │   printer task       │ ◄───────────────────────┘
//! └──────────────────────┘
//! ```
//!
//! # Commands
//!
//! - any text: search for it (restarts from page 1)
//! - empty line: clear the query
//! - `:more`: load the next page
//! - `:open N`: select image N and print its dimensions
//! - `:thumb N`: decode image N through the thumbnail cache
//! - `:status`: print a state snapshot
//! - `:quit`: exit

#![allow(clippy::multiple_crate_versions)]

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::io::{AsyncBufReadExt, BufReader};
use unsplash_grid::app::NotificationStream;
use unsplash_grid::{
    decode_selected, initialize, Config, Notification, SearchController, UnsplashClient,
};

/// Search Unsplash from the terminal.
#[derive(Debug, Parser)]
#[command(name = "unsplash-grid", version, about)]
struct Cli {
    /// Path to a TOML config file (default: platform config dir).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Query to search for on startup.
    #[arg(long)]
    query: Option<String>,
}

/// A parsed line of input.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Search(String),
    Clear,
    More,
    Open(usize),
    Thumb(usize),
    Status,
    Quit,
    Unknown(String),
}

impl Command {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Clear;
        }
        let Some(command) = line.strip_prefix(':') else {
            return Self::Search(line.to_string());
        };

        let mut parts = command.split_whitespace();
        match (parts.next(), parts.next().map(str::parse::<usize>)) {
            (Some("more"), None) => Self::More,
            (Some("status"), None) => Self::Status,
            (Some("quit" | "q"), None) => Self::Quit,
            (Some("open"), Some(Ok(index))) => Self::Open(index),
            (Some("thumb"), Some(Ok(index))) => Self::Thumb(index),
            _ => Self::Unknown(line.to_string()),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let (controller, notifications) = match initialize(&config) {
        Ok(pair) => pair,
        Err(e) => {
            tracing::error!(error = %e, "startup failed");
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let printer = tokio::spawn(print_notifications(notifications));

    if let Some(query) = cli.query.as_deref() {
        controller.set_query(Some(query));
    }

    if let Err(e) = run_commands(&controller).await {
        tracing::error!(error = %e, "reading stdin failed");
    }

    drop(controller);
    printer.abort();
    ExitCode::SUCCESS
}

async fn run_commands(controller: &SearchController<UnsplashClient>) -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        match Command::parse(&line) {
            Command::Search(text) => controller.set_query(Some(&text)),
            Command::Clear => controller.set_query(None),
            Command::More => controller.load_next_page(),
            Command::Open(index) => {
                if controller.image(index).is_none() {
                    println!("no image at {index} ({} loaded)", controller.number_of_images());
                }
                controller.image_tapped(index);
            }
            Command::Thumb(index) => match controller.thumbnail(index) {
                Ok(Some(image)) => println!("thumbnail {index}: {}x{}", image.width(), image.height()),
                Ok(None) => println!("no image at {index}"),
                Err(e) => println!("thumbnail {index}: {e}"),
            },
            Command::Status => {
                let snapshot = controller.snapshot();
                println!(
                    "query={} page={} urls={} images={} loading={} no_results={} phase={}",
                    snapshot.query.as_deref().unwrap_or("-"),
                    snapshot.page,
                    snapshot.url_count,
                    snapshot.image_count,
                    snapshot.loading,
                    snapshot.no_results,
                    snapshot.phase,
                );
            }
            Command::Quit => break,
            Command::Unknown(text) => {
                println!("unknown command {text:?}; try :more, :open N, :thumb N, :status, :quit");
            }
        }
    }

    Ok(())
}

async fn print_notifications(mut notifications: NotificationStream) {
    while let Some(notification) = notifications.recv().await {
        match notification {
            Notification::ImagesUpdated { count } => println!("images: {count}"),
            Notification::LoadingChanged(loading) => {
                println!("{}", if loading { "loading..." } else { "done" });
            }
            Notification::NoResultsChanged(true) => println!("no results"),
            Notification::NoResultsChanged(false) | Notification::CacheCleared => {}
            Notification::SearchFailed { message } => println!("search failed: {message}"),
            Notification::ImageSelected(image) => {
                match decode_selected(&image) {
                    Ok(decoded) => println!(
                        "{} ({}x{}, {} bytes)",
                        image.url,
                        decoded.width(),
                        decoded.height(),
                        image.len()
                    ),
                    Err(e) => println!("{}: {e}", image.url),
                }
            }
        }
    }
}

//! # rusty-forum Binary
//!
//! Assembles config, logging, a store plugin (chosen at compile time) and
//! the session handlers, then runs one CLI command.

mod cli;
mod render;

use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::Parser;
use rf_api::handlers;
use rf_api::AppState;
use rf_config::{LogFormat, Settings};
use rf_core::models::PostChanges;
use rf_core::traits::ForumStore;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};

#[cfg(feature = "store-json")]
fn build_store(settings: &Settings) -> Box<dyn ForumStore> {
    tracing::debug!(path = ?settings.data_file, "using JSON store");
    Box::new(rf_store_json::JsonForumStore::new(&settings.data_file))
}

#[cfg(all(feature = "store-memory", not(feature = "store-json")))]
fn build_store(_settings: &Settings) -> Box<dyn ForumStore> {
    tracing::warn!("using in-memory store: nothing will be kept after exit");
    Box::new(rf_store_memory::MemoryForumStore::new())
}

#[cfg(not(any(feature = "store-json", feature = "store-memory")))]
compile_error!("enable one store plugin: `store-json` or `store-memory`");

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match settings.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

fn require_user(cli_user: Option<&str>) -> anyhow::Result<&str> {
    match cli_user.map(str::trim) {
        Some(user) if !user.is_empty() => Ok(user),
        _ => bail!("this command needs an acting user: pass --user or set RUSTY_FORUM_USER"),
    }
}

async fn run(state: &AppState, cli: Cli) -> anyhow::Result<()> {
    handlers::load_posts(state).await?;
    let user = cli.user.as_deref();

    match cli.command {
        Command::Post { title, content, thread } => {
            let post = handlers::create_post(state, require_user(user)?, &title, &content, thread.as_deref()).await?;
            println!("Post created successfully!\nPost ID: {}", post.id());
        }
        Command::List => {
            let posts = handlers::list_active_posts(state).await;
            if posts.is_empty() {
                println!("No posts have been created yet.");
            } else {
                print!("{}", render::post_listing("All Posts", &posts));
            }
        }
        Command::Mine => {
            let posts = handlers::list_posts_by_author(state, require_user(user)?).await;
            if posts.is_empty() {
                println!("You haven't created any posts yet.");
            } else {
                print!("{}", render::post_listing("Your Posts", &posts));
            }
        }
        Command::Search { keyword } => {
            let posts = handlers::search_posts(state, &keyword).await?;
            if posts.is_empty() {
                println!("No posts found matching \"{}\".", keyword.trim());
            } else {
                print!("{}", render::post_listing(&format!("Search Results for \"{}\"", keyword.trim()), &posts));
            }
        }
        Command::Thread { name } => {
            let posts = handlers::list_posts_by_thread(state, &name).await;
            print!("{}", render::post_listing(&format!("Thread \"{}\"", name.trim()), &posts));
        }
        Command::Show { id } => {
            let post = handlers::find_post(state, &id).await?;
            println!("{}", render::post_detail(&post));
        }
        Command::Edit { id, title, content, thread } => {
            let changes = PostChanges { title, content, thread };
            if changes.is_empty() {
                bail!("nothing to edit: pass --title, --content or --thread");
            }
            let post = handlers::edit_post(state, require_user(user)?, &id, changes).await?;
            println!("Post {} updated.", post.id());
        }
        Command::Delete { id } => {
            handlers::delete_post(state, require_user(user)?, &id).await?;
            println!("Post deleted successfully.");
        }
        Command::Restore { id } => {
            let post = handlers::restore_post(state, require_user(user)?, &id).await?;
            println!("Post {} restored.", post.id());
        }
        Command::Reply { post_id, content } => {
            let reply = handlers::create_reply(state, require_user(user)?, &post_id, &content).await?;
            println!("{}", render::reply_created(&reply));
        }
        Command::Replies { post_id } => {
            let lines = handlers::replies_for_post(state, &post_id).await?;
            println!("{}", render::reply_lines(post_id.trim(), &lines));
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // `.env` must be in the environment before clap reads `RUSTY_FORUM_USER`.
    rf_config::load_dotenv();
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_with(path).with_context(|| format!("reading {path:?}")),
        None => Settings::load().context("reading configuration"),
    };
    let settings = match settings {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("error: {err:#}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&settings);

    let state = AppState::new(build_store(&settings));
    match run(&state, cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(error = ?err, "command failed");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

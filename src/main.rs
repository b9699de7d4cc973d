//! Blog ORM - command line entry point.
//!
//! Runs one read-only query against the blog database and prints the result
//! as JSON.

use blog_orm::config::{Command, Config, ModelKind};
use blog_orm::db::pool;
use blog_orm::models::{Blog, Comment, User, register_all};
use blog_orm::{FindOptions, Limit, Model, OrmResult, QueryExecutor};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    // stdout carries the command output
    if config.json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

async fn run(executor: &QueryExecutor, command: &Command) -> OrmResult<serde_json::Value> {
    match command {
        Command::Users { limit } => {
            let mut options = FindOptions::new().order_by("`created_at` desc");
            if let Some(limit) = limit {
                options = options.limit(*limit);
            }
            let mut users = executor.table::<User>()?.find_all(options).await?;
            for user in &mut users {
                user.mask_password();
            }
            let records: Vec<_> = users.iter().map(|u| u.record()).collect();
            Ok(serde_json::json!({ "users": records }))
        }
        Command::Blogs { limit, offset } => {
            let mut options = FindOptions::new().order_by("`created_at` desc");
            match (limit, offset) {
                (Some(count), Some(offset)) => {
                    options = options.limit(Limit::Range {
                        offset: *offset,
                        count: *count,
                    })
                }
                (Some(count), None) => options = options.limit(*count),
                _ => {}
            }
            let blogs = executor.table::<Blog>()?.find_all(options).await?;
            let records: Vec<_> = blogs.iter().map(|b| b.record()).collect();
            Ok(serde_json::json!({ "blogs": records }))
        }
        Command::Count { model } => {
            let n = match model {
                ModelKind::Users => executor.table::<User>()?.count("count(`id`)", None, &[]).await?,
                ModelKind::Blogs => executor.table::<Blog>()?.count("count(`id`)", None, &[]).await?,
                ModelKind::Comments => {
                    executor
                        .table::<Comment>()?
                        .count("count(`id`)", None, &[])
                        .await?
                }
            };
            Ok(serde_json::json!({ "count": n }))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse configuration from command line and environment
    let config = Config::parse();

    // Initialize logging
    init_tracing(&config);

    info!("Starting blog-orm v{}", env!("CARGO_PKG_VERSION"));

    register_all()?;
    pool::init(config.pool_config()?).await?;

    let executor = QueryExecutor::global();
    let result = run(&executor, &config.command).await;

    pool::shutdown().await;

    match result {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Err(e) => {
            if let Some(suggestion) = e.suggestion() {
                error!(error = %e, suggestion, "Command failed");
            } else {
                error!(error = %e, "Command failed");
            }
            Err(e.into())
        }
    }
}

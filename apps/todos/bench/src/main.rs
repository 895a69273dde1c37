//! Todos load client
//!
//! Drives one protocol of the Todos API with `--count` iterations, each of
//! which creates, reads, updates, lists and deletes its own todo.

use clap::{Parser, Subcommand};
use core_config::Environment;
use core_config::tracing::{init_tracing, install_color_eyre};
use eyre::Result;
use std::sync::Arc;
use tracing::info;

mod driver;
mod graphql;
mod grpc;
mod rest;
mod runner;
mod stats;

use driver::Driver;

#[derive(Parser)]
#[command(name = "todos-bench")]
#[command(about = "Load-test the Todos API over REST, GraphQL or gRPC")]
struct Cli {
    /// Total number of iterations
    #[arg(short = 'n', long, default_value_t = 100, global = true)]
    count: usize,

    /// Iterations in flight at once
    #[arg(short, long, default_value_t = 10, global = true)]
    concurrency: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// REST endpoints under /todos
    Rest {
        #[arg(long, default_value = "http://localhost:8080")]
        url: String,
    },

    /// GraphQL endpoint
    Graphql {
        #[arg(long, default_value = "http://localhost:8080/graphql")]
        url: String,
    },

    /// gRPC TodoService
    Grpc {
        #[arg(long, default_value = "http://localhost:9000")]
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    install_color_eyre();
    init_tracing(&Environment::from_env());

    let cli = Cli::parse();
    eyre::ensure!(cli.count > 0, "--count must be at least 1");
    eyre::ensure!(cli.concurrency > 0, "--concurrency must be at least 1");

    let driver: Arc<dyn Driver> = match cli.command {
        Commands::Rest { url } => Arc::new(rest::RestDriver::new(url)?),
        Commands::Graphql { url } => Arc::new(graphql::GraphqlDriver::new(url)?),
        Commands::Grpc { url } => Arc::new(grpc::GrpcDriver::connect(url).await?),
    };

    info!(
        protocol = driver.protocol(),
        count = cli.count,
        concurrency = cli.concurrency,
        "starting load run"
    );

    let report = runner::run(driver, cli.count, cli.concurrency).await;
    report.log();

    eyre::ensure!(
        report.failures < cli.count,
        "every iteration failed, is the server running?"
    );
    Ok(())
}

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod utils;

/// µDCN Command Line Interface
#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Sets the level of verbosity
    #[clap(short, long, global = true)]
    verbose: bool,

    /// Forwarder endpoint: `tcp://host:port`, `unix:///path/to.sock`, or
    /// `ws://host:port`. Defaults to the platform's usual NFD socket.
    #[clap(short, long, global = true)]
    endpoint: Option<String>,

    /// Subcommand to execute
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send an Interest and print the Data response
    Interest {
        /// Name to request (NDN URI format)
        name: String,

        /// Lifetime in milliseconds
        #[clap(short, long, default_value = "4000")]
        lifetime: u32,
    },

    /// Publish Data under a name
    Publish {
        /// Name to publish under (NDN URI format)
        name: String,

        /// Content to publish (string)
        content: String,

        /// Freshness period in milliseconds
        #[clap(short, long, default_value = "60000")]
        freshness: u32,
    },

    /// Fetch every segment of an object whose version is unknown
    Fetch {
        /// Prefix of the object to fetch (NDN URI format, without version)
        prefix: String,
    },

    /// Register a prefix with the forwarder
    Register {
        /// Prefix to register (NDN URI format)
        prefix: String,
    },

    /// Benchmark pipelined segment fetching
    Benchmark {
        /// Base name of the object to fetch, including its version
        /// component (NDN URI format)
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if cli.verbose { "debug" } else { "info" }),
    )
    .init();

    let connection_info = commands::resolve_connection_info(cli.endpoint.as_deref())?;

    match cli.command {
        Commands::Interest { name, lifetime } => {
            commands::interest::send_interest(connection_info, name, lifetime).await?;
        }
        Commands::Publish {
            name,
            content,
            freshness,
        } => {
            commands::publish::publish_data(connection_info, name, content, freshness).await?;
        }
        Commands::Fetch { prefix } => {
            commands::fetch::fetch_object(connection_info, prefix).await?;
        }
        Commands::Register { prefix } => {
            commands::register::register_prefix(connection_info, prefix).await?;
        }
        Commands::Benchmark { name } => {
            commands::benchmark::run_benchmark(connection_info, name).await?;
        }
    }

    Ok(())
}

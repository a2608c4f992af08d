use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use muse_dashboard::api::ApiServerBuilder;
use muse_dashboard::render::search_rows;
use muse_dashboard::{
    Config, Error, MongoStore, QueryGateway, Summarizer, TimeFormatter, TitleQuery, render_conversation,
};

/// Muse Dashboard - inspect stored AI assistant conversations
#[derive(Parser)]
#[command(name = "muse-dashboard", version, about)]
struct Cli {
    /// Port to listen on (overrides the configured port)
    #[arg(long, env = "MUSE_DASHBOARD_PORT")]
    port: Option<u16>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the dashboard (default)
    Serve,
    /// Print one conversation's rendered view as JSON
    Show {
        /// Conversation id
        id: String,
    },
    /// Search conversations by title and print the result rows as JSON
    Search {
        /// Case-insensitive title fragment
        text: String,
        /// Minimum number of embedded messages
        #[arg(long)]
        min_messages: Option<u64>,
        /// Maximum number of embedded messages
        #[arg(long)]
        max_messages: Option<u64>,
        /// Maximum number of results
        #[arg(long)]
        limit: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info,muse_dashboard=info,mongodb=warn",
        1 => "info,muse_dashboard=debug,mongodb=warn",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load()?;
    tracing::debug!(?config, "configuration loaded");

    let store = MongoStore::connect(&config.mongo).await?;
    let formatter = TimeFormatter::new(config.timezone);
    let gateway = QueryGateway::new(Arc::new(store), config.cache, formatter);

    if let Err(e) = gateway.ping().await {
        tracing::warn!(error = %e, "document store not reachable yet; pages will report it until it is");
    }

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let summarizer = config.summary.map(Summarizer::new);
            if summarizer.is_none() {
                tracing::info!("GROQ_API_KEY not set; conversation summaries disabled");
            }

            let port = cli.port.unwrap_or(config.server.port);
            ApiServerBuilder::new(gateway, port)
                .summarizer(summarizer)
                .build()
                .run()
                .await?;
        }
        Command::Show { id } => {
            let loaded = gateway
                .find_conversation_by_id(&id)
                .await?
                .ok_or_else(|| Error::NotFound(format!("no conversation with id {id:?}")))?;
            let view = render_conversation(&loaded, gateway.formatter());
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        Command::Search {
            text,
            min_messages,
            max_messages,
            limit,
        } => {
            let query = TitleQuery {
                min_messages,
                max_messages,
                limit,
                ..TitleQuery::new(text)
            };
            let summaries = gateway.find_conversations_by_title(&query).await?;
            let rows = search_rows(&summaries, gateway.formatter());
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
    }

    Ok(())
}

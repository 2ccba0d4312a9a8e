use clap::{Parser, Subcommand};
use flippy_control::config::Config;
use flippy_control::dispatcher::CommandDispatcher;
use flippy_control::page::TerminalPage;
use flippy_control::server;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "flippy-control", version, about = "Feature flags with a demo control endpoint")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the control server (default)
    Serve,
    /// Send one command to a running server and show the result
    Send {
        /// Control action, e.g. bool-on, add-user, percent-more
        command: String,
        /// Server to talk to; defaults to FLIPPY_SERVER_URL
        #[arg(long)]
        server_url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            tracing::info!("flippy-control starting");
            let config = Config::from_env()?;
            config.log_startup();
            server::serve(config).await
        }
        Command::Send { command, server_url } => {
            let base_url = match server_url {
                Some(url) => url,
                None => Config::server_url_from_env()?,
            };
            let dispatcher = CommandDispatcher::new(base_url);
            let mut page = TerminalPage::new(reqwest::Client::new(), dispatcher.base_url());

            dispatcher.send_command(&command, &mut page).await?;
            Ok(())
        }
    }
}

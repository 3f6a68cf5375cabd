use std::io;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

use chat_widget::connector::api::{Container, ContainerConfig, Router};
use chat_widget::Commands;

#[derive(Parser)]
#[command(name = "chat-widget")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Root URL of a running chat endpoint (e.g. http://localhost:3000)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Answer with canned replies instead of calling a provider
    #[arg(long, global = true, conflicts_with = "endpoint")]
    offline: bool,

    /// Milliseconds between revealed characters
    #[arg(long, global = true, default_value = "30")]
    speed_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    // Logs share the terminal with the typed reply, so keep them on stderr.
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = ContainerConfig {
        endpoint: cli.endpoint,
        offline: cli.offline,
        reveal_period: Duration::from_millis(cli.speed_ms.max(1)),
    };
    let container = Container::new(config)?;
    debug!("Gateway: {}", container.gateway().name());

    let router = Router::new(&container);
    let output = router.route(cli.command).await?;
    if !output.is_empty() {
        println!("{}", output);
    }

    Ok(())
}

#[cfg(test)]
mod cli_tests {
    use super::*;

    #[test]
    fn endpoint_and_offline_conflict() {
        let res = Cli::try_parse_from([
            "chat-widget",
            "--offline",
            "--endpoint",
            "http://localhost:3000",
            "chat",
        ]);
        assert!(res.is_err(), "--offline and --endpoint should be exclusive");
    }

    #[test]
    fn serve_defaults_to_port_3000() {
        let cli = Cli::try_parse_from(["chat-widget", "serve"]).unwrap();
        match cli.command {
            Commands::Serve { port, public } => {
                assert_eq!(port, 3000);
                assert!(!public);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn ask_joins_words() {
        let cli = Cli::try_parse_from(["chat-widget", "--speed-ms", "5", "ask", "hello", "there"])
            .unwrap();
        assert_eq!(cli.speed_ms, 5);
        match cli.command {
            Commands::Ask { prompt } => assert_eq!(prompt.join(" "), "hello there"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn ask_requires_a_prompt() {
        assert!(Cli::try_parse_from(["chat-widget", "ask"]).is_err());
    }
}

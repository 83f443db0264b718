//! fleetcast - game server lifecycle event broadcaster
//!
//! Reads watch notifications for game servers and fleets, turns them into
//! typed events and publishes them with the selected broker.

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufRead, BufReader};
use tokio::task::JoinHandle;

use fleetcast_broadcaster::Broadcaster;
use fleetcast_brokers::http::HttpBroker;
use fleetcast_brokers::pubsub::{PubSubBroker, PubSubConfig};
use fleetcast_brokers::stdout::StdoutBroker;
use fleetcast_brokers::{Broker, BrokerError};
use fleetcast_events::resources::{Fleet, GameServer};
use fleetcast_events::EventFactoryRegistry;

mod cli;
mod error;
mod logging;
mod source;

use cli::{BrokerKind, Cli};
use error::AppError;
use source::RetryPolicy;

#[tokio::main]
async fn main() {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    logging::init_logging(cli.verbose, cli.log_format);

    if let Err(e) = run(cli).await {
        tracing::error!(error = %e, "fleetcast failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let (broker, server) = build_broker(cli.broker)?;

    let broadcaster = Broadcaster::builder(Arc::new(EventFactoryRegistry::with_defaults()))
        .with_shared_broker(broker)
        .watch::<GameServer>()
        .watch::<Fleet>()
        .build()?;

    tracing::info!(
        broker = ?cli.broker,
        kinds = ?broadcaster.watched_kinds(),
        max_retries = cli.max_retries,
        "starting fleetcast"
    );

    let policy = RetryPolicy::default().with_max_retries(cli.max_retries);
    let reader = open_input(cli.input.as_deref()).await?;

    tokio::select! {
        stats = source::run(reader, &broadcaster, &policy) => {
            let stats = stats.map_err(|e| AppError::Input {
                path: input_name(cli.input.as_deref()),
                source: e,
            })?;
            tracing::info!(
                dispatched = stats.dispatched,
                invalid = stats.invalid,
                failed = stats.failed,
                "watch source finished"
            );
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown requested");
        }
    }

    if let Some(server) = server {
        tracing::info!("serving game servers until shutdown");
        server
            .await
            .map_err(|e| AppError::Server(e.to_string()))??;
    }

    Ok(())
}

/// Build the selected broker. The HTTP broker also returns its server task,
/// which stops on ctrl-c.
fn build_broker(
    kind: BrokerKind,
) -> Result<(Arc<dyn Broker>, Option<JoinHandle<Result<(), BrokerError>>>), AppError> {
    let (broker, server): (Arc<dyn Broker>, _) = match kind {
        BrokerKind::Stdout => (Arc::new(StdoutBroker::new()), None),
        BrokerKind::Pubsub => (
            Arc::new(PubSubBroker::new(PubSubConfig::from_env()?)?),
            None,
        ),
        BrokerKind::Kafka => (kafka_broker()?, None),
        BrokerKind::Http => {
            let broker = Arc::new(HttpBroker::from_env()?);
            let server = Arc::clone(&broker);
            let handle = tokio::spawn(async move { server.serve(shutdown_signal()).await });
            (broker, Some(handle))
        }
    };
    Ok((broker, server))
}

#[cfg(feature = "kafka")]
fn kafka_broker() -> Result<Arc<dyn Broker>, AppError> {
    use fleetcast_brokers::kafka::{KafkaBroker, KafkaConfig};

    Ok(Arc::new(KafkaBroker::new(KafkaConfig::from_env()?)?))
}

#[cfg(not(feature = "kafka"))]
fn kafka_broker() -> Result<Arc<dyn Broker>, AppError> {
    Err(AppError::KafkaDisabled)
}

type InputReader = Box<dyn AsyncBufRead + Unpin + Send>;

async fn open_input(path: Option<&Path>) -> Result<InputReader, AppError> {
    match path {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .map_err(|e| AppError::Input {
                    path: path.display().to_string(),
                    source: e,
                })?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(BufReader::new(tokio::io::stdin()))),
    }
}

fn input_name(path: Option<&Path>) -> String {
    path.map_or_else(|| "<stdin>".to_string(), |p| p.display().to_string())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}

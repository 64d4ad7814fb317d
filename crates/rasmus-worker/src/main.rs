use clap::Parser;
use rasmus_core::DeliveryScheme;
use rasmus_worker::{Worker, WorkerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "rasmus")]
#[command(about = "Remote command worker fed from a Redis-compatible queue", long_about = None)]
struct Args {
    /// Store address (host:port)
    host: Option<String>,

    /// Store password
    password: Option<String>,

    /// Key namespace
    namespace: Option<String>,

    /// Path to configuration file
    #[arg(long)]
    config: Option<String>,

    /// Response delivery scheme (namespaced, hash)
    #[arg(long)]
    delivery: Option<DeliveryScheme>,

    /// Connect/IO timeout and reconnect backoff in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Seconds a single blocking pop may wait
    #[arg(long)]
    poll_wait_secs: Option<u64>,

    /// Completed responses buffered ahead of the publisher
    #[arg(long)]
    response_capacity: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let mut config = if let Some(config_path) = &args.config {
        WorkerConfig::from_file(config_path)?
    } else {
        WorkerConfig::default()
    };

    // Override with CLI args
    if let Some(host) = args.host {
        config.store_address = host;
    }
    if let Some(password) = args.password {
        config.password = Some(password);
    }
    if let Some(namespace) = args.namespace {
        config.namespace = Some(namespace);
    }
    if let Some(delivery) = args.delivery {
        config.delivery = delivery;
    }
    if let Some(timeout_secs) = args.timeout_secs {
        config.timeout_secs = timeout_secs;
    }
    if let Some(poll_wait_secs) = args.poll_wait_secs {
        config.poll_wait_secs = poll_wait_secs;
    }
    if let Some(response_capacity) = args.response_capacity {
        config.response_capacity = response_capacity;
    }

    let worker = Worker::from_config(&config);

    tokio::select! {
        _ = worker.run() => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal, abandoning in-flight requests");
        }
    }

    Ok(())
}

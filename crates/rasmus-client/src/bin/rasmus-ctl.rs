use clap::{Parser, Subcommand};
use rasmus_client::RasmusClient;
use rasmus_core::{DeliveryScheme, KeySpace, Request};
use std::io::Read;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "rasmus-ctl")]
#[command(about = "Send a request to a rasmus worker and print the response", long_about = None)]
struct Args {
    /// Store address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:6379")]
    store: String,

    /// Store password
    #[arg(long)]
    password: Option<String>,

    /// Key namespace shared with the worker
    #[arg(short, long)]
    namespace: Option<String>,

    /// Response delivery scheme the worker uses (namespaced, hash)
    #[arg(long, default_value = "namespaced")]
    delivery: DeliveryScheme,

    /// Seconds to wait for the response
    #[arg(short, long, default_value = "30")]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Read a remote file
    Read { path: String },

    /// Write a remote file; contents come from --input or stdin
    Write {
        path: String,

        /// Permission bits, in octal
        #[arg(short, long, default_value = "644", value_parser = parse_octal)]
        mode: u32,

        #[arg(short, long)]
        input: Option<String>,
    },

    /// Stat a remote path
    List { path: String },

    /// Run a remote program
    Exec {
        program: String,

        /// Data fed to the program's stdin
        #[arg(short, long)]
        input: Option<String>,

        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

fn parse_octal(s: &str) -> Result<u32, String> {
    u32::from_str_radix(s.trim_start_matches("0o"), 8).map_err(|e| format!("invalid octal mode {:?}: {}", s, e))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let request = match args.command {
        Commands::Read { path } => Request::new("read", path),
        Commands::Write { path, mode, input } => {
            let input = match input {
                Some(input) => input,
                None => {
                    let mut buffer = String::new();
                    std::io::stdin().read_to_string(&mut buffer)?;
                    buffer
                }
            };
            Request::new("write", path).with_mode(mode).with_input(input)
        }
        Commands::List { path } => Request::new("list", path),
        Commands::Exec { program, input, args } => Request::new("execute", program)
            .with_input(input.unwrap_or_default())
            .with_params(args),
    };

    let timeout = Duration::from_secs(args.timeout);
    let mut client = RasmusClient::connect(
        &args.store,
        args.password.as_deref(),
        KeySpace::new(args.namespace),
        args.delivery,
        // BRPOP adds its own wait on top of this
        Duration::from_secs(10),
    )
    .await?;

    let response = client.call(request, timeout).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);

    if !response.completed {
        std::process::exit(1);
    }
    Ok(())
}

//! Test Client
//!
//! Calls the sample methods exposed by the `testserver` example.
//!
//! Usage:
//! ```bash
//! # First, start the server in another terminal:
//! cargo run -p xsonrpc-http --example testserver
//!
//! RUST_LOG=info cargo run -p xsonrpc-http --example testclient
//! RUST_LOG=info cargo run -p xsonrpc-http --example testclient -- --format json
//! ```

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing::info;
use xsonrpc::Value;
use xsonrpc_http::{Client, ClientConfig, Format};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum WireFormat {
    Xml,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "testclient")]
#[command(about = "Sample XML-RPC / JSON-RPC client")]
struct Args {
    /// Server endpoint
    #[arg(short, long, default_value = "http://127.0.0.1:8080/RPC2")]
    url: String,

    /// Wire format to speak
    #[arg(short, long, value_enum, default_value = "xml")]
    format: WireFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let format = match args.format {
        WireFormat::Xml => Format::Xml,
        WireFormat::Json => Format::Json,
    };
    let client = Client::with_config(&args.url, ClientConfig::default().with_format(format))?;
    info!("Calling {} over {}", client.endpoint(), format.name());

    let result = client.call("add", &[Value::from(3), Value::from(2)]).await?;
    info!("add(3, 2) = {}", result);

    let result = client
        .call("concat", &[Value::from("Hello, "), Value::from("World!")])
        .await?;
    info!("concat = {}", result);

    let numbers = Value::from(vec![Value::from(1000), Value::from(i32::MAX)]);
    let result = client.call("add_array", &[numbers]).await?;
    info!("add_array = {}", result);

    let nested = Value::from(vec![
        Value::from(12),
        Value::from("foobar"),
        Value::from(vec![Value::from(12), Value::from("foobar")]),
    ]);
    let result = client.call("to_struct", &[nested]).await?;
    info!("to_struct = {}", result);

    match client.call("system.listMethods", &[]).await {
        Ok(methods) => info!("methods: {}", methods),
        Err(err) => info!("introspection unavailable: {}", err),
    }

    Ok(())
}

//! Test Server
//!
//! Serves a handful of sample methods over XML-RPC and JSON-RPC.
//!
//! Usage:
//! ```bash
//! RUST_LOG=debug cargo run -p xsonrpc-http --example testserver -- --port 8080
//! ```

use std::net::SocketAddr;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use xsonrpc::{Fault, Struct, Value, ValueType};
use xsonrpc_http::ServerBuilder;

#[derive(Parser, Debug)]
#[command(name = "testserver")]
#[command(about = "Sample XML-RPC / JSON-RPC server")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Endpoint path
    #[arg(long, default_value = "/RPC2")]
    path: String,

    /// Disable the system.* introspection methods
    #[arg(long)]
    no_introspection: bool,
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

    let mut builder = ServerBuilder::new()
        .bind_address(SocketAddr::from(([127, 0, 0, 1], args.port)))
        .path(args.path)
        .introspection(!args.no_introspection);

    let dispatcher = builder.dispatcher_mut();
    dispatcher
        .add_method("add", |a: i32, b: i32| a + b)?
        .set_help_text("Add two integers")
        .add_signature(ValueType::Integer32, &[ValueType::Integer32, ValueType::Integer32]);
    dispatcher
        .add_method("concat", |a: String, b: String| a + &b)?
        .set_help_text("Concatenate two strings")
        .add_signature(ValueType::String, &[ValueType::String, ValueType::String]);
    dispatcher
        .add_method("add_array", |values: Vec<Value>| -> Result<i64, Fault> {
            values
                .iter()
                .map(|value| match value {
                    Value::Integer32(v) => Ok(i64::from(*v)),
                    Value::Integer64(v) => Ok(*v),
                    _ => Err(Fault::invalid_parameters()),
                })
                .sum()
        })?
        .set_help_text("Sum an array of integers")
        .add_signature(ValueType::Integer64, &[ValueType::Array]);
    dispatcher
        .add_raw_method("to_struct", |params: &[Value]| -> Result<Struct, Fault> {
            let array = params
                .first()
                .ok_or_else(Fault::invalid_parameters)?
                .as_array()?;
            Ok(array
                .iter()
                .map(|value| {
                    let key = value
                        .as_str()
                        .map(str::to_string)
                        .unwrap_or_else(|_| value.to_string());
                    (key, value.clone())
                })
                .collect())
        })?
        .set_help_text("Turn an array into a struct keyed by each element's text");

    let server = builder.build()?;
    info!(
        "Test server ready on http://127.0.0.1:{}{}",
        args.port,
        server.config().path
    );
    server.run().await?;
    Ok(())
}

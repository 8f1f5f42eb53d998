//! End-to-end tests over a loopback socket

use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::oneshot;
use xsonrpc::{FaultCode, Struct, Value, ValueType};
use xsonrpc_http::{Client, ClientConfig, ClientError, Format, ServerBuilder, ServerError};

struct TestServer {
    url: String,
    shutdown: Option<oneshot::Sender<()>>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

async fn start(builder: ServerBuilder) -> TestServer {
    let server = builder.build().unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let path = server.config().path.clone();
    let (tx, rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        server
            .serve_with_shutdown(listener, async {
                let _ = rx.await;
            })
            .await
            .unwrap();
    });

    TestServer {
        url: format!("http://{}{}", addr, path),
        shutdown: Some(tx),
    }
}

fn builder() -> ServerBuilder {
    let mut builder = ServerBuilder::new();
    let dispatcher = builder.dispatcher_mut();
    dispatcher
        .add_method("add", |a: i32, b: i32| a + b)
        .unwrap()
        .set_help_text("Add two integers")
        .add_signature(ValueType::Integer32, &[ValueType::Integer32, ValueType::Integer32]);
    dispatcher
        .add_method("concat", |a: String, b: String| a + &b)
        .unwrap();
    dispatcher
        .add_method("add_array", |values: Vec<Value>| -> Result<i64, xsonrpc::Fault> {
            values.iter().map(|value| value.as_f64().map(|v| v as i64)).sum()
        })
        .unwrap();
    dispatcher
        .add_raw_method("to_struct", |params: &[Value]| -> Result<Struct, xsonrpc::Fault> {
            let array = params.first().ok_or_else(xsonrpc::Fault::invalid_parameters)?.as_array()?;
            Ok(array
                .iter()
                .map(|value| {
                    let key = value.as_str().map(str::to_string).unwrap_or_else(|_| value.to_string());
                    (key, value.clone())
                })
                .collect())
        })
        .unwrap();
    builder
}

fn json_client(url: &str) -> Client {
    Client::with_config(url, ClientConfig::default().with_format(Format::Json)).unwrap()
}

#[tokio::test]
async fn test_xml_calls() {
    let server = start(builder()).await;
    let client = Client::new(&server.url).unwrap();

    assert_eq!(
        client.call("add", &[Value::from(3), Value::from(2)]).await.unwrap(),
        Value::from(5)
    );
    assert_eq!(
        client
            .call("concat", &[Value::from("Hello, "), Value::from("World!")])
            .await
            .unwrap(),
        Value::from("Hello, World!")
    );

    let numbers = Value::from(vec![Value::from(1000), Value::from(i32::MAX)]);
    assert_eq!(
        client.call("add_array", &[numbers]).await.unwrap(),
        Value::from(1000 + i32::MAX as i64)
    );

    let result = client
        .call("to_struct", &[Value::from(vec![Value::from(12), Value::from("foobar")])])
        .await
        .unwrap();
    assert_eq!(result.get("12").unwrap(), &Value::from(12));
    assert_eq!(result.get("foobar").unwrap(), &Value::from("foobar"));
}

#[tokio::test]
async fn test_faults() {
    let server = start(builder()).await;

    for client in [Client::new(&server.url).unwrap(), json_client(&server.url)] {
        let err = client.call("missing", &[]).await.unwrap_err();
        assert_eq!(err.fault().and_then(|f| f.kind()), Some(FaultCode::MethodNotFound));

        let err = client.call("add", &[Value::from(1)]).await.unwrap_err();
        assert_eq!(err.fault().and_then(|f| f.kind()), Some(FaultCode::InvalidParameters));
    }
}

#[tokio::test]
async fn test_json_calls_and_introspection() {
    let server = start(builder()).await;
    let client = json_client(&server.url);

    assert_eq!(
        client.call("add", &[Value::from(40), Value::from(2)]).await.unwrap(),
        Value::from(42)
    );
    assert_eq!(
        client.call("system.methodHelp", &[Value::from("add")]).await.unwrap(),
        Value::from("Add two integers")
    );

    let methods = client.call("system.listMethods", &[]).await.unwrap();
    let methods = methods.as_array().unwrap();
    assert!(methods.contains(&Value::from("add")));
    assert!(methods.contains(&Value::from("system.multicall")));

    client.notify("add", &[Value::from(1), Value::from(1)]).await.unwrap();
}

#[tokio::test]
async fn test_capabilities_can_be_extended() {
    let server = builder().build().unwrap();
    server
        .system_methods()
        .add_capability("custom", "http://example.com/custom", 2)
        .unwrap();

    let response = server
        .dispatcher()
        .invoke("system.getCapabilities", &[], Value::Nil)
        .into_result()
        .unwrap();
    assert!(response.get("custom").is_ok());
    assert!(response.get("introspect").is_ok());
}

#[tokio::test]
async fn test_http_status_codes() {
    let server = start(builder().max_body_size(256)).await;
    let http = reqwest::Client::new();

    let response = http.get(&server.url).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 405);

    let response = http
        .post(&server.url)
        .header("Content-Type", "text/plain")
        .body("hello")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    let wrong_path = server.url.replace("/RPC2", "/other");
    let response = http
        .post(&wrong_path)
        .header("Content-Type", "text/xml")
        .body("<methodCall/>")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    let response = http
        .post(&server.url)
        .header("Content-Type", "text/xml")
        .body(vec![b' '; 1024])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 413);

    let response = http
        .post(&server.url)
        .header("Content-Type", "application/json; charset=utf-8")
        .body(r#"{"jsonrpc":"2.0","method":"add","params":[1,2]}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    let response = http
        .post(&server.url)
        .header("Content-Type", "text/xml")
        .body("<methodCall>")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.headers()["content-type"], "text/xml");
    let body = response.text().await.unwrap();
    assert!(body.contains("<fault>"));
    assert!(body.contains(&FaultCode::NotWellFormed.code().to_string()));
}

#[tokio::test]
async fn test_disabled_format_is_not_found() {
    let server = start(builder().json(false)).await;
    let client = json_client(&server.url);
    let err = client.call("add", &[Value::from(1), Value::from(2)]).await.unwrap_err();
    assert!(matches!(err, ClientError::Status(404)));
}

#[tokio::test]
async fn test_no_format_enabled_fails_to_build() {
    let Err(err) = builder().xml(false).json(false).build() else {
        panic!("build succeeded without a wire format");
    };
    assert!(matches!(err, ServerError::Config(_)));

    let mut builder = builder();
    xsonrpc::SystemMethods::install(builder.dispatcher_mut(), false).unwrap();
    let Err(err) = builder.build() else {
        panic!("system methods installed twice");
    };
    assert!(matches!(err, ServerError::Registration(_)));
}

#[tokio::test]
async fn test_connection_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = ClientConfig::default().with_timeout(Duration::from_secs(2));
    let client = Client::with_config(&format!("http://{}/RPC2", addr), config).unwrap();
    let err = client.call("add", &[]).await.unwrap_err();
    assert!(matches!(err, ClientError::Connection(_)));
}

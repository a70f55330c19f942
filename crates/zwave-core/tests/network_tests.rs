//! Device operations against an in-process zwave-js server stand-in

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{accept_async, tungstenite::Message, WebSocketStream};
use zwave_core::{DeviceControl, NetworkError, ReadMode, ZwaveNetwork};
use zwave_protocol::{ProtocolError, ValueId, ZwaveTransport};

type ServerWs = WebSocketStream<TcpStream>;

/// Accept one connection, complete the handshake, then run `script`
async fn serve<F, Fut>(script: F) -> String
where
    F: FnOnce(ServerWs) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        send(&mut ws, json!({"type": "version", "maxSchemaVersion": 35})).await;
        let request = next_request(&mut ws).await;
        assert_eq!(request["command"], "set_api_schema");
        reply(&mut ws, &request, true, json!({})).await;
        script(ws).await;
    });
    format!("ws://{addr}")
}

async fn send(ws: &mut ServerWs, body: Value) {
    ws.send(Message::Text(body.to_string())).await.unwrap();
}

async fn next_request(ws: &mut ServerWs) -> Value {
    loop {
        let message = ws.next().await.expect("client hung up").expect("read failed");
        if let Message::Text(text) = message {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

async fn reply(ws: &mut ServerWs, request: &Value, success: bool, result: Value) {
    send(
        ws,
        json!({
            "type": "result",
            "messageId": request["messageId"],
            "success": success,
            "result": result
        }),
    )
    .await;
}

/// Keep the connection open until the client goes away
async fn drain(mut ws: ServerWs) {
    while let Some(Ok(_)) = ws.next().await {}
}

async fn network(url: &str, read_mode: ReadMode) -> ZwaveNetwork {
    let transport = ZwaveTransport::connect(url, None).await.unwrap();
    ZwaveNetwork::new(Arc::new(transport), read_mode)
}

#[tokio::test]
async fn set_value_reports_unaccepted_write() {
    let url = serve(|mut ws| async move {
        let request = next_request(&mut ws).await;
        assert_eq!(request["command"], "node.set_value");
        assert_eq!(request["nodeId"], 3);
        assert_eq!(request["valueId"], json!({"commandClass": 112, "property": 5}));
        assert_eq!(request["value"], 40);
        // Acknowledged at the protocol level, refused by the node
        reply(&mut ws, &request, true, json!({"success": false})).await;
        drain(ws).await;
    })
    .await;

    let network = network(&url, ReadMode::Poll).await;
    let err = network
        .set_value(3, &ValueId::configuration(5), 40u32)
        .await
        .unwrap_err();
    assert!(
        matches!(err, NetworkError::NotAccepted { node_id: 3, .. }),
        "got {err}"
    );
}

#[tokio::test]
async fn write_parameter_surfaces_rejection() {
    let url = serve(|mut ws| async move {
        let request = next_request(&mut ws).await;
        reply(&mut ws, &request, false, Value::Null).await;
        let request = next_request(&mut ws).await;
        reply(&mut ws, &request, true, json!({"success": true})).await;
        drain(ws).await;
    })
    .await;

    let network = network(&url, ReadMode::Poll).await;
    let err = network.write_parameter(3, 5, 40).await.unwrap_err();
    assert!(
        matches!(err, NetworkError::Protocol(ProtocolError::Rejected { .. })),
        "got {err}"
    );

    network.write_parameter(3, 5, 40).await.unwrap();
}

#[tokio::test]
async fn read_parameter_follows_read_mode() {
    let url = serve(|mut ws| async move {
        let request = next_request(&mut ws).await;
        assert_eq!(request["command"], "node.get_value");
        reply(&mut ws, &request, true, json!({"value": 35})).await;
        let request = next_request(&mut ws).await;
        assert_eq!(request["command"], "node.get_value");
        reply(&mut ws, &request, true, json!({"value": null})).await;
        drain(ws).await;
    })
    .await;

    let network = network(&url, ReadMode::Cached).await;
    assert_eq!(network.read_parameter(3, 5).await.unwrap(), 35);
    assert!(matches!(
        network.read_parameter(3, 5).await,
        Err(NetworkError::MissingValue { node_id: 3, .. })
    ));
}

//! Async WebSocket transport for the zwave-js server protocol

use crate::commands::Command;
use crate::message::{params_object, Inbound, Request, ResultMessage, ZwaveEvent};
use crate::types::{ProtocolError, VersionInfo};

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch, Mutex};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{self, Message};

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Callback receiving unsolicited events, invoked on the reader task
pub type EventHandler = Box<dyn FnMut(ZwaveEvent) + Send + 'static>;

/// Pending request waiting for response
struct PendingRequest {
    command: String,
    response_tx: oneshot::Sender<ResultMessage>,
}

/// Id allocator and pending requests, guarded together
struct CallTable {
    next_id: u64,
    pending: HashMap<u64, PendingRequest>,
    closed: bool,
}

/// State shared between the transport handle and its background tasks
struct Shared {
    calls: Mutex<CallTable>,
    closed_tx: watch::Sender<Option<String>>,
}

/// Command to send to the writer task
enum WriteCommand {
    Send(Request),
    Shutdown,
}

/// Async transport for communicating with a zwave-js server
pub struct ZwaveTransport {
    /// Channel to send requests to the writer task
    write_tx: mpsc::UnboundedSender<WriteCommand>,
    /// Correlation state
    shared: Arc<Shared>,
    /// Termination reason, set once the reader or writer stops
    closed_rx: watch::Receiver<Option<String>>,
    /// Server version banner
    version: VersionInfo,
}

impl ZwaveTransport {
    /// Connect to a zwave-js server and perform the handshake.
    ///
    /// When an event handler is given the session also starts listening
    /// for events; without one, any event frame terminates the session.
    pub async fn connect(
        url: &str,
        event_handler: Option<EventHandler>,
    ) -> Result<Self, ProtocolError> {
        tracing::info!("Connecting to zwave-js server at {}", url);

        let (mut stream, _) = connect_async(url).await?;
        let version = Self::read_version(&mut stream).await?;
        tracing::info!("Connected to zwave-js server: {}", version);

        let listen = event_handler.is_some();
        let transport = Self::start(stream, version, event_handler);
        transport.negotiate(listen).await?;

        Ok(transport)
    }

    /// Wait for the version banner that precedes any request
    async fn read_version<S>(stream: &mut S) -> Result<VersionInfo, ProtocolError>
    where
        S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
    {
        while let Some(message) = stream.next().await {
            match message? {
                Message::Text(text) => {
                    tracing::debug!("Version banner: {}", text);
                    return serde_json::from_str(&text).map_err(|e| {
                        ProtocolError::Handshake(format!("malformed version banner: {e}"))
                    });
                }
                Message::Binary(data) => {
                    return Err(ProtocolError::InvalidFrame(format!(
                        "unexpected binary frame ({} bytes)",
                        data.len()
                    )));
                }
                Message::Close(frame) => {
                    return Err(ProtocolError::Handshake(format!(
                        "server closed the connection: {frame:?}"
                    )));
                }
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
            }
        }
        Err(ProtocolError::Handshake("connection closed before version banner".to_string()))
    }

    /// Spawn the reader and writer tasks over an established stream
    fn start<S>(stream: S, version: VersionInfo, event_handler: Option<EventHandler>) -> Self
    where
        S: Stream<Item = Result<Message, tungstenite::Error>>
            + Sink<Message, Error = tungstenite::Error>
            + Send
            + Unpin
            + 'static,
    {
        let (closed_tx, closed_rx) = watch::channel(None);
        let shared = Arc::new(Shared {
            calls: Mutex::new(CallTable {
                next_id: 1,
                pending: HashMap::new(),
                closed: false,
            }),
            closed_tx,
        });
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (sink, stream) = stream.split();

        tokio::spawn(Self::writer_task(sink, write_rx, shared.clone()));
        tokio::spawn(Self::reader_task(stream, shared.clone(), event_handler));

        Self {
            write_tx,
            shared,
            closed_rx,
            version,
        }
    }

    /// Select the schema version and optionally start listening
    async fn negotiate(&self, listen: bool) -> Result<(), ProtocolError> {
        let schema = self.version.max_schema_version;
        self.call(Command::SetApiSchema.as_str(), json!({ "schemaVersion": schema }))
            .await
            .map_err(|e| {
                ProtocolError::Handshake(format!("failed to set API schema {schema}: {e}"))
            })?;
        tracing::debug!("Selected API schema {}", schema);

        if listen {
            let state = self
                .call(Command::StartListening.as_str(), ())
                .await
                .map_err(|e| {
                    ProtocolError::Handshake(format!("failed to start listening to events: {e}"))
                })?;
            let nodes = state
                .pointer("/state/nodes")
                .and_then(Value::as_array)
                .map_or(0, Vec::len);
            tracing::info!("Listening to zwave-js events ({} nodes known)", nodes);
        }

        Ok(())
    }

    /// Writer task - drains the outbound queue in submission order
    async fn writer_task<W>(
        mut sink: W,
        mut rx: mpsc::UnboundedReceiver<WriteCommand>,
        shared: Arc<Shared>,
    ) where
        W: Sink<Message, Error = tungstenite::Error> + Unpin,
    {
        let mut closed_rx = shared.closed_tx.subscribe();
        loop {
            let cmd = tokio::select! {
                cmd = rx.recv() => cmd,
                _ = closed_rx.changed() => break,
            };
            match cmd {
                Some(WriteCommand::Send(request)) => {
                    let text = request.encode();
                    tracing::debug!("Sending message {}: {}", request.message_id, text);
                    if let Err(e) = sink.send(Message::Text(text)).await {
                        Self::shutdown(&shared, format!("write failed: {e}")).await;
                        break;
                    }
                }
                Some(WriteCommand::Shutdown) | None => {
                    if let Err(e) = sink.close().await {
                        tracing::debug!("Close error: {}", e);
                    }
                    break;
                }
            }
        }
        tracing::debug!("Writer task shutting down");
    }

    /// Reader task - demultiplexes results and events until the stream fails
    async fn reader_task<R>(mut stream: R, shared: Arc<Shared>, mut handler: Option<EventHandler>)
    where
        R: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
    {
        let reason = loop {
            let text = match stream.next().await {
                Some(Ok(Message::Text(text))) => text,
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => continue,
                Some(Ok(Message::Binary(data))) => {
                    break format!("unexpected binary frame ({} bytes)", data.len());
                }
                Some(Ok(Message::Close(frame))) => {
                    break format!("server closed the connection: {frame:?}");
                }
                Some(Err(e)) => break format!("read failed: {e}"),
                None => break "connection closed".to_string(),
            };

            if let Err(e) = Self::handle_message(&text, &shared, &mut handler).await {
                break e.to_string();
            }
        };

        Self::shutdown(&shared, reason).await;
        tracing::debug!("Reader task shutting down");
    }

    /// Handle a received text frame
    async fn handle_message(
        text: &str,
        shared: &Shared,
        handler: &mut Option<EventHandler>,
    ) -> Result<(), ProtocolError> {
        match Inbound::decode(text)? {
            Inbound::Result(result) => {
                let waiting = shared.calls.lock().await.pending.remove(&result.message_id);
                match waiting {
                    Some(req) => {
                        tracing::debug!(
                            "Received result for {} (message {}): success={}",
                            req.command,
                            result.message_id,
                            result.success
                        );
                        let _ = req.response_tx.send(result);
                    }
                    // Request timed out and the slot was removed
                    None => tracing::debug!(
                        "Dropping result for message {}: no caller waiting",
                        result.message_id
                    ),
                }
            }
            Inbound::Event { event } => {
                let Some(handler) = handler.as_mut() else {
                    return Err(ProtocolError::UnhandledEvent);
                };
                tracing::debug!("Event from {}: {}", event.source, event.event);
                handler(event);
            }
        }
        Ok(())
    }

    /// Mark the session terminal and fail every waiting caller
    async fn shutdown(shared: &Shared, reason: String) {
        let pending = {
            let mut calls = shared.calls.lock().await;
            if calls.closed {
                return;
            }
            calls.closed = true;
            std::mem::take(&mut calls.pending)
        };

        tracing::error!(
            "zwave-js session terminated: {} ({} calls in flight)",
            reason,
            pending.len()
        );
        shared.closed_tx.send_replace(Some(reason));

        // Publish the reason first so woken callers can report it
        drop(pending);
    }

    /// Send a request and wait for the result
    pub async fn call(
        &self,
        command: &str,
        params: impl Serialize,
    ) -> Result<Value, ProtocolError> {
        self.call_timeout(command, params, DEFAULT_TIMEOUT).await
    }

    /// Send a request with custom timeout
    pub async fn call_timeout(
        &self,
        command: &str,
        params: impl Serialize,
        timeout: Duration,
    ) -> Result<Value, ProtocolError> {
        let params = params_object(params)?;

        // Set up response channel
        let (response_tx, response_rx) = oneshot::channel();
        let message_id = {
            let mut calls = self.shared.calls.lock().await;
            if calls.closed {
                return Err(ProtocolError::NotConnected);
            }
            let id = calls.next_id;
            calls.next_id += 1;
            calls.pending.insert(
                id,
                PendingRequest {
                    command: command.to_string(),
                    response_tx,
                },
            );
            id
        };

        if self
            .write_tx
            .send(WriteCommand::Send(Request::new(message_id, command, params)))
            .is_err()
        {
            self.shared.calls.lock().await.pending.remove(&message_id);
            return Err(ProtocolError::NotConnected);
        }

        let outcome = tokio::time::timeout(timeout, response_rx).await;
        self.shared.calls.lock().await.pending.remove(&message_id);

        match outcome {
            Ok(Ok(result)) => result.into_result(command),
            Ok(Err(_)) => Err(ProtocolError::ConnectionClosed(self.close_reason())),
            Err(_) => Err(ProtocolError::Timeout {
                command: command.to_string(),
                message_id,
            }),
        }
    }

    /// Server version banner received during the handshake
    pub fn version(&self) -> &VersionInfo {
        &self.version
    }

    /// Whether the session has terminated
    pub fn is_closed(&self) -> bool {
        self.closed_rx.borrow().is_some()
    }

    /// Resolve once the session terminates, with the reason
    pub async fn closed(&self) -> String {
        let mut rx = self.closed_rx.clone();
        loop {
            if let Some(reason) = rx.borrow_and_update().clone() {
                return reason;
            }
            if rx.changed().await.is_err() {
                return "session dropped".to_string();
            }
        }
    }

    fn close_reason(&self) -> String {
        self.closed_rx
            .borrow()
            .clone()
            .unwrap_or_else(|| "connection closed".to_string())
    }
}

impl Drop for ZwaveTransport {
    fn drop(&mut self) {
        // Signal shutdown (best effort)
        let _ = self.write_tx.send(WriteCommand::Shutdown);
    }
}

//! Websocket change feed.
//!
//! Each subscription owns one websocket connection: it joins its topic, waits
//! for the server to accept the join, keeps the connection alive with
//! heartbeats and forwards INSERT rows until the [`Subscription`] handle is
//! dropped, at which point it leaves the topic and closes the socket.

use std::time::Duration;

use async_trait::async_trait;
use chatcore::realtime::Frame;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, trace, warn};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use super::{CHANNEL_CAPACITY, ChangeFeed, ChannelSpec, Subscription};
use crate::config::ClientConfig;

type RawWs = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<RawWs, WsMessage>;
type WsStream = SplitStream<RawWs>;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(25);
const JOIN_REF: u64 = 1;
const JOIN_TIMEOUT: Duration = Duration::from_secs(10);

pub struct WebSocketFeed {
    url: String,
    heartbeat: Duration,
}

impl WebSocketFeed {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            url: config.realtime_url(),
            heartbeat: HEARTBEAT_INTERVAL,
        }
    }

    pub fn with_heartbeat(mut self, heartbeat: Duration) -> Self {
        self.heartbeat = heartbeat;
        self
    }
}

#[async_trait]
impl ChangeFeed for WebSocketFeed {
    async fn subscribe(&self, spec: ChannelSpec) -> anyhow::Result<Subscription> {
        info!("Dialing realtime feed for {}", spec.topic);
        let (socket, _response) = connect_async(self.url.as_str())
            .await
            .map_err(|e| anyhow::anyhow!("WebSocket connect failed: {}", e))?;
        let (mut sink, mut stream) = socket.split();

        send_frame(&mut sink, Frame::join(&spec, JOIN_REF)).await?;
        let joined = tokio::time::timeout(JOIN_TIMEOUT, await_join_reply(&mut stream, &spec.topic))
            .await
            .unwrap_or_else(|_| {
                Err(anyhow::anyhow!(
                    "No join reply for {} within {:?}",
                    spec.topic,
                    JOIN_TIMEOUT
                ))
            });
        if let Err(e) = joined {
            let _ = sink.close().await;
            return Err(e);
        }
        debug!("Joined {}", spec.topic);

        let (row_tx, row_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
        let topic = spec.topic.clone();
        tokio::spawn(pump(sink, stream, spec, row_tx, cancel_rx, self.heartbeat));

        Ok(Subscription::new(topic, row_rx, move || {
            let _ = cancel_tx.send(());
        }))
    }
}

/// Reads frames until the server answers the join on `topic`.
async fn await_join_reply(stream: &mut WsStream, topic: &str) -> anyhow::Result<()> {
    while let Some(incoming) = stream.next().await {
        let text = match incoming {
            Ok(WsMessage::Text(text)) => text,
            Ok(WsMessage::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => return Err(anyhow::anyhow!("WebSocket read error: {}", e)),
        };
        let frame = match Frame::decode(text.as_str()) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Ignoring undecodable realtime frame: {e}");
                continue;
            }
        };
        if frame.topic != topic {
            continue;
        }
        if let Some(reason) = frame.reply_error() {
            return Err(anyhow::anyhow!("Realtime join for {} rejected: {}", topic, reason));
        }
        if frame.is_reply_to(JOIN_REF) {
            return Ok(());
        }
    }
    Err(anyhow::anyhow!("Realtime socket closed before joining {}", topic))
}

async fn send_frame(sink: &mut WsSink, frame: Frame) -> anyhow::Result<()> {
    let text = frame.encode()?;
    sink.send(WsMessage::Text(text.into()))
        .await
        .map_err(|e| anyhow::anyhow!("WebSocket send error: {}", e))
}

async fn pump(
    mut sink: WsSink,
    mut stream: WsStream,
    spec: ChannelSpec,
    rows: mpsc::Sender<Value>,
    mut cancel: oneshot::Receiver<()>,
    heartbeat: Duration,
) {
    let mut next_ref = JOIN_REF;
    let mut ticker = tokio::time::interval(heartbeat);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = &mut cancel => {
                next_ref += 1;
                debug!("Leaving {}", spec.topic);
                if let Err(e) = send_frame(&mut sink, Frame::leave(&spec.topic, next_ref)).await {
                    debug!("Leave for {} not delivered: {e}", spec.topic);
                }
                let _ = sink.close().await;
                break;
            }
            _ = ticker.tick() => {
                next_ref += 1;
                if let Err(e) = send_frame(&mut sink, Frame::heartbeat(next_ref)).await {
                    warn!("Heartbeat on {} failed: {e}", spec.topic);
                    break;
                }
            }
            incoming = stream.next() => match incoming {
                Some(Ok(WsMessage::Text(text))) => {
                    let frame = match Frame::decode(text.as_str()) {
                        Ok(frame) => frame,
                        Err(e) => {
                            warn!("Ignoring undecodable realtime frame: {e}");
                            continue;
                        }
                    };
                    if let Some(reason) = frame.reply_error() {
                        error!("Realtime channel {} rejected: {reason}", spec.topic);
                        break;
                    }
                    if frame.is_close() {
                        debug!("Channel {} closed by server", spec.topic);
                        break;
                    }
                    if let Some(record) = frame.inserted_record(&spec.table) {
                        trace!("<-- insert on {}", spec.table);
                        if rows.send(record.clone()).await.is_err() {
                            debug!("Row receiver dropped, closing {}", spec.topic);
                            break;
                        }
                    }
                }
                Some(Ok(WsMessage::Close(_))) | None => {
                    debug!("Realtime socket for {} ended", spec.topic);
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    error!("Error reading from realtime socket: {e}");
                    break;
                }
            }
        }
    }
}

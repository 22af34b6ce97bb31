//! Orientation telemetry ingest server.
//!
//! Listens on a well-known port for WebSocket peers (the companion phone
//! pushing gyro readings). Each text message is a JSON object with `alpha`,
//! `beta`, `gamma` fields in degrees; missing or non-numeric fields default
//! to 0. Samples are handed to the scheduler over a channel — this crate
//! never touches presentation state. The server is receive-only.

use futures::StreamExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, info, warn};
use ugv_types::{
    config::TelemetryConfig,
    telemetry::{OrientationSample, TimestampedSample},
    ConsoleError, Result,
};

pub struct TelemetryIngestServer {
    listener: TcpListener,
    tx: mpsc::UnboundedSender<TimestampedSample>,
}

impl TelemetryIngestServer {
    /// Bind the listener and return the server together with the receiving
    /// end of the sample channel the scheduler drains.
    pub async fn bind(
        config: &TelemetryConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<TimestampedSample>)> {
        let addr = format!("{}:{}", config.bind_addr, config.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|err| telemetry_error(format!("failed to bind {addr}: {err}")))?;
        info!(%addr, "telemetry ingest server listening");
        let (tx, rx) = mpsc::unbounded_channel();
        Ok((Self { listener, tx }, rx))
    }

    pub fn local_addr(&self) -> Result<std::net::SocketAddr> {
        self.listener
            .local_addr()
            .map_err(|err| telemetry_error(format!("listener address unavailable: {err}")))
    }

    /// Accept loop. Each peer gets its own task; a peer failing never affects
    /// the others or the accept loop itself.
    pub async fn run(self) -> Result<()> {
        loop {
            let (stream, peer) = self
                .listener
                .accept()
                .await
                .map_err(|err| telemetry_error(format!("accept failed: {err}")))?;
            let tx = self.tx.clone();
            tokio::spawn(async move {
                if let Err(err) = serve_peer(stream, tx).await {
                    debug!(%peer, %err, "telemetry peer session ended");
                }
            });
        }
    }
}

async fn serve_peer(
    stream: TcpStream,
    tx: mpsc::UnboundedSender<TimestampedSample>,
) -> anyhow::Result<()> {
    let mut ws = accept_async(stream).await?;

    while let Some(message) = ws.next().await {
        match message {
            Ok(Message::Text(text)) => match parse_orientation(&text) {
                Some(sample) => {
                    if tx.send(TimestampedSample::now(sample)).is_err() {
                        // Scheduler is gone; nothing left to feed.
                        break;
                    }
                }
                None => warn!("dropping malformed telemetry message"),
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {} // binary/ping/pong: ignored, tungstenite answers pings
            Err(err) => {
                debug!(%err, "telemetry receive error");
                break;
            }
        }
    }
    Ok(())
}

/// Parse one inbound telemetry message. Returns `None` for anything that is
/// not a JSON object; inside an object, absent or non-numeric angle fields
/// read as 0 and extra fields are ignored.
pub fn parse_orientation(text: &str) -> Option<OrientationSample> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    let object = value.as_object()?;
    let angle = |key: &str| object.get(key).and_then(|v| v.as_f64()).unwrap_or(0.0);
    Some(OrientationSample::new(
        angle("alpha"),
        angle("beta"),
        angle("gamma"),
    ))
}

pub fn telemetry_error(message: impl Into<String>) -> ConsoleError {
    ConsoleError::Telemetry(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::SinkExt;
    use tokio_tungstenite::connect_async;

    async fn start_server() -> (
        std::net::SocketAddr,
        mpsc::UnboundedReceiver<TimestampedSample>,
    ) {
        let config = TelemetryConfig {
            bind_addr: "127.0.0.1".into(),
            port: 0,
        };
        let (server, rx) = TelemetryIngestServer::bind(&config).await.expect("bind");
        let addr = server.local_addr().expect("addr");
        tokio::spawn(server.run());
        (addr, rx)
    }

    #[test]
    fn parse_defaults_missing_and_non_numeric_fields() {
        let sample = parse_orientation(r#"{"alpha": 10, "beta": -5.5, "gamma": 0}"#).unwrap();
        assert_eq!(sample, OrientationSample::new(10.0, -5.5, 0.0));

        let empty = parse_orientation("{}").unwrap();
        assert_eq!(empty, OrientationSample::default());

        let partial = parse_orientation(r#"{"alpha": "sideways", "beta": 2, "extra": true}"#);
        assert_eq!(partial.unwrap(), OrientationSample::new(0.0, 2.0, 0.0));

        assert!(parse_orientation("not json").is_none());
        assert!(parse_orientation("[1, 2, 3]").is_none());
    }

    #[tokio::test]
    async fn samples_arrive_over_the_channel() {
        let (addr, mut rx) = start_server().await;
        let (mut ws, _) = connect_async(format!("ws://{addr}")).await.expect("connect");

        ws.send(Message::Text(
            r#"{"alpha": 10, "beta": -5.5, "gamma": 0}"#.into(),
        ))
        .await
        .expect("send");

        let received = rx.recv().await.expect("sample");
        assert_eq!(received.sample, OrientationSample::new(10.0, -5.5, 0.0));
    }

    #[tokio::test]
    async fn malformed_message_keeps_the_connection_open() {
        let (addr, mut rx) = start_server().await;
        let (mut ws, _) = connect_async(format!("ws://{addr}")).await.expect("connect");

        ws.send(Message::Text("definitely not json".into()))
            .await
            .expect("send garbage");
        ws.send(Message::Text(r#"{"gamma": 3.5}"#.into()))
            .await
            .expect("send valid");

        // The valid message after the garbage still gets through on the same
        // connection.
        let received = rx.recv().await.expect("sample");
        assert_eq!(received.sample, OrientationSample::new(0.0, 0.0, 3.5));
    }

    #[tokio::test]
    async fn concurrent_peers_are_independent() {
        let (addr, mut rx) = start_server().await;
        let (mut first, _) = connect_async(format!("ws://{addr}")).await.expect("connect");
        let (mut second, _) = connect_async(format!("ws://{addr}")).await.expect("connect");

        first
            .send(Message::Text(r#"{"alpha": 1}"#.into()))
            .await
            .expect("send first");
        let one = rx.recv().await.expect("first sample");
        assert_eq!(one.sample.alpha, 1.0);

        // First peer dropping does not end the second peer's session.
        drop(first);
        second
            .send(Message::Text(r#"{"alpha": 2}"#.into()))
            .await
            .expect("send second");
        let two = rx.recv().await.expect("second sample");
        assert_eq!(two.sample.alpha, 2.0);
    }
}

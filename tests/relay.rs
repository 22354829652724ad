//! End-to-end tests: line source → pipeline → broadcaster → HTTP / WebSocket

use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use serial_relay::registry::{Broadcaster, RegistryConfig};
use serial_relay::serial::{FramedSource, LinkStatus};
use serial_relay::server::{AppState, RelayServer, ServerConfig};
use serial_relay::stats::RelayStats;
use serial_relay::{IngestPipeline, PipelineExit, Record};

fn ids(records: &[Record]) -> Vec<u64> {
    records.iter().map(|r| r.id).collect()
}

fn lines(ids: impl IntoIterator<Item = u64>) -> Vec<u8> {
    ids.into_iter()
        .map(|id| format!("ID: {id} | Time: {}.{:03} seconds\r\n", id / 10, id % 10))
        .collect::<String>()
        .into_bytes()
}

struct Harness {
    broadcaster: Arc<Broadcaster>,
    addr: SocketAddr,
    shutdown: CancellationToken,
}

impl Harness {
    async fn start(config: RegistryConfig) -> Self {
        let broadcaster = Arc::new(Broadcaster::with_config(config));
        let state = AppState::new(
            Arc::clone(&broadcaster),
            Arc::new(RelayStats::new()),
            LinkStatus::new(),
        );
        let server_config = ServerConfig::with_addr("127.0.0.1:0".parse().unwrap());
        let server = RelayServer::bind(&server_config, state).await.unwrap();
        let addr = server.local_addr();

        let shutdown = CancellationToken::new();
        let token = shutdown.clone();
        tokio::spawn(server.run_until(async move { token.cancelled().await }));

        Self {
            broadcaster,
            addr,
            shutdown,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

async fn next_event<S>(socket: &mut S) -> serde_json::Value
where
    S: futures::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("timed out waiting for event")
            .expect("socket closed")
            .expect("socket error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[test]
fn test_sixty_records_into_capacity_fifty() {
    let broadcaster = Arc::new(Broadcaster::with_config(
        RegistryConfig::default().max_records(50),
    ));
    let source = FramedSource::new(Cursor::new(lines(1..=60)), "fixture");

    let exit = IngestPipeline::new(source, Arc::clone(&broadcaster))
        .run(&CancellationToken::new())
        .unwrap();

    assert_eq!(exit, PipelineExit::SourceClosed);
    let snapshot = broadcaster.snapshot();
    assert_eq!(snapshot.len(), 50);
    assert_eq!(snapshot[0].id, 11);
    assert_eq!(snapshot[49].id, 60);
}

#[test]
fn test_observer_join_mid_stream() {
    let broadcaster = Arc::new(Broadcaster::new());
    let mut first = broadcaster.register();

    let pipeline = IngestPipeline::new(
        FramedSource::new(Cursor::new(Vec::new()), "unused"),
        Arc::clone(&broadcaster),
    );
    pipeline.ingest_line("ID: 1 | Time: 0.1 seconds");
    pipeline.ingest_line("ID: 2 | Time: 0.2 seconds");

    let mut second = broadcaster.register();
    pipeline.ingest_line("ID: 3 | Time: 0.3 seconds");

    assert_eq!(ids(&first.drain()), vec![1, 2, 3]);
    assert_eq!(second.replayed(), 2);
    assert_eq!(ids(&second.drain()), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_http_snapshot_and_clear() {
    let harness = Harness::start(RegistryConfig::default()).await;
    let pipeline = IngestPipeline::new(
        FramedSource::new(Cursor::new(Vec::new()), "unused"),
        Arc::clone(&harness.broadcaster),
    );
    pipeline.ingest_line("ID: 42 | Time: 1.234 seconds");
    pipeline.ingest_line("garbage noise");

    let client = reqwest::Client::new();

    let data: serde_json::Value = client
        .get(harness.url("/api/data"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let records = data.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["id"], 42);
    assert_eq!(records[0]["time"], 1.234);
    assert_eq!(records[0]["timestamp"].as_str().unwrap().len(), 19);

    let cleared: serde_json::Value = client
        .get(harness.url("/api/clear"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cleared, serde_json::json!({ "status": "cleared" }));
    assert_eq!(harness.broadcaster.history_len(), 0);

    let health = client.get(harness.url("/health")).send().await.unwrap();
    assert_eq!(health.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);

    let stats: serde_json::Value = client
        .get(harness.url("/api/stats"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["history_len"], 0);
    assert_eq!(stats["history_capacity"], 50);
    assert_eq!(stats["link"], "disconnected");
}

#[tokio::test]
async fn test_websocket_replay_then_live() {
    let harness = Harness::start(RegistryConfig::default()).await;
    let pipeline = IngestPipeline::new(
        FramedSource::new(Cursor::new(Vec::new()), "unused"),
        Arc::clone(&harness.broadcaster),
    );
    pipeline.ingest_line("ID: 1 | Time: 0.1 seconds");
    pipeline.ingest_line("ID: 2 | Time: 0.2 seconds");

    let (mut socket, _) = tokio_tungstenite::connect_async(format!("ws://{}/ws", harness.addr))
        .await
        .unwrap();

    let first = next_event(&mut socket).await;
    assert_eq!(first["event"], "new_data");
    assert_eq!(first["data"]["id"], 1);
    assert_eq!(next_event(&mut socket).await["data"]["id"], 2);

    // The observer is registered before its replay is sent
    assert_eq!(harness.broadcaster.observer_count(), 1);
    pipeline.ingest_line("ID: 3 | Time: 0.3 seconds");

    assert_eq!(next_event(&mut socket).await["data"]["id"], 3);
}

//! serial-relay: serve serial timer telemetry to web browsers
//!
//! Run with: serial-relay --serial /dev/ttyACM0 [--baud 115200] [--bind 0.0.0.0:5000]
//!
//! Then open http://localhost:5000 in a browser.

use std::future::Future;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use serial_relay::registry::{Broadcaster, RegistryConfig};
use serial_relay::serial::{self, LinkStatus, ReadErrorPolicy, SerialConfig};
use serial_relay::server::{self, AppState, RelayServer, ServerConfig};
use serial_relay::stats::RelayStats;
use serial_relay::{Error, IngestPipeline, PipelineExit, RelayConfig};

/// Relay serial timer readings to web clients
#[derive(Debug, Parser)]
#[command(name = "serial-relay", version, about)]
struct Args {
    /// Serial port of the device (e.g. COM3 or /dev/ttyACM0)
    #[arg(long)]
    serial: String,

    /// Baud rate for serial communication
    #[arg(long, default_value_t = serial::DEFAULT_BAUD_RATE)]
    baud: u32,

    /// Number of records kept for new viewers
    #[arg(long, default_value_t = 50)]
    max_records: usize,

    /// Address for the web interface
    #[arg(long, default_value = server::DEFAULT_BIND_ADDR)]
    bind: SocketAddr,

    /// Only allow same-origin requests to the HTTP API
    #[arg(long)]
    no_cors: bool,

    /// Close a viewer whose WebSocket send stalls this long, in milliseconds
    #[arg(long, default_value_t = 10_000)]
    send_timeout_ms: u64,

    /// Live records a viewer may fall behind by before it is disconnected
    #[arg(long, default_value_t = 256)]
    observer_queue: usize,

    /// Serial read timeout in milliseconds
    #[arg(long, default_value_t = 1000)]
    read_timeout_ms: u64,

    /// Longest line accepted from the device, in bytes
    #[arg(long, default_value_t = 4096)]
    max_line_len: usize,

    /// Stop after this many consecutive read errors (default: never)
    #[arg(long)]
    max_read_errors: Option<u32>,

    /// Pause after a failed read, in milliseconds
    #[arg(long, default_value_t = 100)]
    error_backoff_ms: u64,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

impl Args {
    fn into_config(self) -> RelayConfig {
        let mut read_policy =
            ReadErrorPolicy::default().error_backoff(Duration::from_millis(self.error_backoff_ms));
        if let Some(max) = self.max_read_errors {
            read_policy = read_policy.give_up_after(max);
        }

        let server = self.server_config();
        RelayConfig {
            serial: SerialConfig::new(self.serial)
                .baud_rate(self.baud)
                .read_timeout(Duration::from_millis(self.read_timeout_ms))
                .max_line_len(self.max_line_len),
            read_policy,
            registry: RegistryConfig::default()
                .max_records(self.max_records)
                .observer_queue(self.observer_queue),
            server,
        }
    }

    fn server_config(&self) -> ServerConfig {
        let config = ServerConfig::with_addr(self.bind)
            .send_timeout(Duration::from_millis(self.send_timeout_ms));
        if self.no_cors {
            config.disable_cors()
        } else {
            config
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.log_json);

    let config = args.into_config();
    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Relay stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: RelayConfig) -> serial_relay::Result<()> {
    config.validate()?;

    let link = LinkStatus::new();
    let source = match serial::open(&config.serial, &link) {
        Ok(source) => source,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start");
            eprintln!("\nFailed to start. Please check:");
            eprintln!("1. The device is connected");
            eprintln!("2. The correct COM/ttyACM/cu.usbmodem port is specified");
            eprintln!("3. No other program is using the serial port");
            return Err(e);
        }
    };

    let broadcaster = Arc::new(Broadcaster::with_config(config.registry.clone()));
    let stats = Arc::new(RelayStats::new());
    let cancel = CancellationToken::new();

    let state = AppState::new(Arc::clone(&broadcaster), Arc::clone(&stats), link.clone());
    let server = RelayServer::bind(&config.server, state).await?;

    let pipeline = IngestPipeline::new(source, broadcaster)
        .with_stats(stats)
        .with_policy(config.read_policy.clone())
        .with_link(link)
        .spawn(cancel.clone());

    tracing::info!(
        serial = %config.serial.path,
        baud = config.serial.baud_rate,
        max_records = config.registry.max_records,
        web = %format!("http://{}", server.local_addr()),
        "Serial relay running"
    );

    let server_shutdown = cancel.clone();
    let server_task = tokio::spawn(server.run_until(async move {
        server_shutdown.cancelled().await;
    }));

    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_cancel.cancel();
        }
    });

    let exit = supervise(pipeline.join(), server_task, &cancel).await?;
    tracing::info!(exit = ?exit, "Relay shut down");
    Ok(())
}

/// Wait for ingestion and the HTTP server, stopping both when either ends
///
/// Ctrl-c cancels the shared token and both sides wind down together. The
/// ingestion error wins when both sides fail.
async fn supervise<P>(
    pipeline: P,
    mut server_task: JoinHandle<serial_relay::Result<()>>,
    cancel: &CancellationToken,
) -> serial_relay::Result<PipelineExit>
where
    P: Future<Output = serial_relay::Result<PipelineExit>>,
{
    tokio::pin!(pipeline);

    let first = tokio::select! {
        exit = &mut pipeline => First::Pipeline(exit),
        served = &mut server_task => First::Server(flatten(served)),
    };
    cancel.cancel();

    let (exit, served) = match first {
        First::Pipeline(exit) => (exit, join_server(server_task).await),
        First::Server(served) => {
            if let Err(e) = &served {
                tracing::error!(error = %e, "HTTP server stopped, stopping ingestion");
            }
            (pipeline.await, served)
        }
    };

    let exit = exit?;
    served?;
    Ok(exit)
}

/// Whichever task finished first
enum First {
    Pipeline(serial_relay::Result<PipelineExit>),
    Server(serial_relay::Result<()>),
}

async fn join_server(task: JoinHandle<serial_relay::Result<()>>) -> serial_relay::Result<()> {
    flatten(task.await)
}

fn flatten(
    joined: std::result::Result<serial_relay::Result<()>, tokio::task::JoinError>,
) -> serial_relay::Result<()> {
    joined.map_err(|e| Error::Task(e.to_string()))?
}

// exif_info - intake daemon
// Image batch analysis service accessible via Unix Domain Socket

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use exif_info::pipeline::PipelineConfig;
use exif_info::service::{ExifInfoApp, Request, Response, Service};

#[derive(Parser)]
#[command(name = "exif_info", version, about = "EXIF intake daemon - image metadata projection")]
struct Args {
    /// Unix socket path for UDS server
    #[arg(long, default_value = "/tmp/exif_info.sock")]
    socket_path: String,

    /// JPEG quality for transcoded HEIC/HEIF previews (1-100)
    #[arg(long, default_value_t = 80)]
    heic_quality: u8,

    /// Delay between preview rendering and tag extraction, in milliseconds
    #[arg(long, default_value_t = 100)]
    extraction_delay_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    info!("Starting exif_info daemon");
    info!("   Socket: {}", args.socket_path);

    // Track startup time for health checks
    let start_time = std::time::Instant::now();

    let config = PipelineConfig {
        heic_quality: args.heic_quality,
        extraction_delay: Duration::from_millis(args.extraction_delay_ms),
    };
    let app = Arc::new(ExifInfoApp::new(config));

    info!("   Intake pipeline initialized");

    // Remove old socket if exists
    let socket_path = PathBuf::from(&args.socket_path);
    if socket_path.exists() {
        std::fs::remove_file(&socket_path).context("Failed to remove old socket")?;
    }

    // Create UDS listener
    let listener = UnixListener::bind(&socket_path).context("Failed to bind Unix socket")?;

    info!("   Listening on {}", args.socket_path);

    // Serve requests
    loop {
        match listener.accept().await {
            Ok((stream, _addr)) => {
                let app = Arc::clone(&app);
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, app, start_time).await {
                        error!("Connection error: {}", e);
                    }
                });
            }
            Err(e) => {
                error!("Accept error: {}", e);
            }
        }
    }
}

/// Handle a single UDS connection
async fn handle_connection(
    mut stream: UnixStream,
    app: Arc<ExifInfoApp>,
    start_time: std::time::Instant,
) -> Result<()> {
    let mut buffer = vec![0u8; 65536]; // 64KB buffer

    loop {
        // Read request length (4 bytes)
        let mut len_buf = [0u8; 4];
        match stream.read_exact(&mut len_buf).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                debug!("Client disconnected");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }

        let len = u32::from_be_bytes(len_buf) as usize;
        if len > buffer.len() {
            buffer.resize(len, 0);
        }

        // Read request body
        stream.read_exact(&mut buffer[..len]).await?;

        // Parse request
        let request: Request =
            serde_json::from_slice(&buffer[..len]).context("Failed to parse request")?;

        debug!("Received: op={}", request.op);

        // Handle health check specially (no dispatch needed)
        let response = if request.op == "health" || request.op == "health.check" {
            Response {
                ok: true,
                output: serde_json::json!({
                    "status": "healthy",
                    "service": "exif_info",
                    "version": env!("CARGO_PKG_VERSION"),
                    "uptime_ms": start_time.elapsed().as_millis() as u64,
                }),
                latency_ms: 0,
            }
        } else {
            match app.dispatch(request).await {
                Ok(resp) => resp,
                Err(e) => {
                    error!("Dispatch error: {:?}", e);
                    Response {
                        ok: false,
                        output: serde_json::json!({
                            "error": format!("{}", e)
                        }),
                        latency_ms: 0,
                    }
                }
            }
        };

        // Serialize response
        let response_bytes =
            serde_json::to_vec(&response).context("Failed to serialize response")?;

        // Write response length + body
        let len_bytes = (response_bytes.len() as u32).to_be_bytes();
        stream.write_all(&len_bytes).await?;
        stream.write_all(&response_bytes).await?;
        stream.flush().await?;

        debug!("Sent: ok={}, latency={}ms", response.ok, response.latency_ms);
    }
}

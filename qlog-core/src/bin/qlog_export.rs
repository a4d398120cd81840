//! qlog-export - Render a captured packet exchange as a qlog trace
//!
//! Reads a JSON capture of the packets one endpoint sent and received,
//! replays them through a tracer and writes the resulting qlog document.
//!
//! Usage:
//!     qlog-export capture.json
//!     qlog-export --pretty --output conn.qlog capture.json
//!     cat capture.json | qlog-export -
//!
//! Capture format:
//!
//! ```json
//! {
//!   "perspective": "server",
//!   "odcid": "deadbeef",
//!   "packets": [
//!     {
//!       "direction": "sent",
//!       "time": "2024-01-01T00:00:00.000Z",
//!       "header": { "form": { "kind": "short" }, "dest_connection_id": "01", "packet_number": 3 },
//!       "frames": [ { "type": "ping" } ]
//!     }
//!   ]
//! }
//! ```

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use clap::Parser;
use qlog_core::{ConnectionId, Frame, Header, Perspective, Tracer, TracerConfig};
use serde::Deserialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "qlog-export")]
#[command(about = "Render a captured QUIC packet exchange as a qlog trace")]
#[command(version)]
struct Args {
    /// Capture file to read ("-" for stdin)
    input: PathBuf,

    /// Write the qlog here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// Document title
    #[arg(long)]
    title: Option<String>,

    /// Document description
    #[arg(long)]
    description: Option<String>,

    /// Verbose output (debug logging on stderr)
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Direction {
    Sent,
    Received,
}

#[derive(Debug, Deserialize)]
struct CapturedPacket {
    direction: Direction,
    time: DateTime<Utc>,
    header: Header,
    #[serde(default)]
    frames: Vec<Frame>,
}

#[derive(Debug, Deserialize)]
struct Capture {
    perspective: Perspective,
    odcid: ConnectionId,
    #[serde(default)]
    packets: Vec<CapturedPacket>,
}

fn main() {
    let args = Args::parse();

    // Logs go to stderr so they never mix with a qlog written to stdout
    let default_filter = if args.verbose {
        "qlog_core=debug,qlog_export=debug"
    } else {
        "qlog_core=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let capture = match load_capture(&args.input) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading capture: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Replaying {} packets ({} perspective, ODCID {})",
        capture.packets.len(),
        capture.perspective,
        capture.odcid
    );

    let mut config = TracerConfig::new().pretty(args.pretty);
    if let Some(title) = args.title {
        config = config.title(title);
    }
    if let Some(description) = args.description {
        config = config.description(description);
    }

    let mut tracer = Tracer::with_config(capture.perspective, capture.odcid, config);

    for (i, packet) in capture.packets.iter().enumerate() {
        let result = match packet.direction {
            Direction::Sent => tracer.record_sent(packet.time, &packet.header, &packet.frames),
            Direction::Received => {
                tracer.record_received(packet.time, &packet.header, &packet.frames)
            }
        };
        if let Err(e) = result {
            eprintln!("Error recording packet #{}: {} [{}]", i, e, e.error_code());
            std::process::exit(1);
        }
    }

    let result = match &args.output {
        Some(path) => tracer.export_to_file(path),
        None => tracer.export(BufWriter::new(io::stdout().lock())),
    };

    if let Err(e) = result {
        eprintln!("Error writing qlog: {}", e);
        std::process::exit(1);
    }

    if let Some(path) = &args.output {
        tracing::info!("Wrote {} events to {}", tracer.len(), path.display());
    }
}

fn load_capture(path: &Path) -> Result<Capture, String> {
    let mut content = String::new();
    if path.as_os_str() == "-" {
        io::stdin()
            .read_to_string(&mut content)
            .map_err(|e| format!("Failed to read stdin: {}", e))?;
    } else {
        let file = File::open(path)
            .map_err(|e| format!("Failed to open '{}': {}", path.display(), e))?;
        BufReader::new(file)
            .read_to_string(&mut content)
            .map_err(|e| format!("Failed to read '{}': {}", path.display(), e))?;
    }

    serde_json::from_str(&content).map_err(|e| format!("Failed to parse capture JSON: {}", e))
}

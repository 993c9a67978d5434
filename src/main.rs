// ============================================================================
// tcpinfo - Decode a saved TCP_INFO snapshot
// ============================================================================
//
// Reads a raw `struct tcp_info` dump (as returned by
// getsockopt(IPPROTO_TCP, TCP_INFO)) from a file or stdin, decodes it and
// prints the result as text or JSON.
//
// Usage:
//   tcpinfo snapshot.bin
//   tcpinfo --hex --format json snapshot.hex
//   xxd -p snapshot.bin | tcpinfo --hex -
//
// Decoded output goes to stdout. Errors go to stderr. With --log, tracing
// events are written to stderr as well.
//
// ============================================================================

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tracing::{debug, error, info, Level};
use tracing_subscriber::FmtSubscriber;

use tcpinfo::{
    fetch_info, Info, LinuxLayout, RawTcpInfoSource, SockoptKey, TcpInfoError, TcpInfoLayout,
};

// ============================================================================
// COMMAND LINE
// ============================================================================

/// Decode a raw TCP_INFO snapshot into readable diagnostics
#[derive(Parser, Debug)]
#[command(name = "tcpinfo", version)]
struct Args {
    /// Snapshot file, or `-` for stdin
    snapshot: PathBuf,

    /// Input is hex text instead of raw bytes (whitespace is ignored)
    #[arg(long)]
    hex: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Structure layout of the snapshot
    #[arg(long, value_enum, default_value_t = LayoutArg::Linux)]
    layout: LayoutArg,

    /// Turn on logging to stderr
    #[arg(long)]
    log: bool,

    /// Maximum log level when --log is set
    #[arg(long, default_value_t = Level::INFO)]
    log_level: Level,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LayoutArg {
    Linux,
}

// ============================================================================
// SNAPSHOT SOURCE
// ============================================================================

/// Serves a saved snapshot through the same interface a live socket reader uses
struct SnapshotSource {
    path: PathBuf,
    hex: bool,
}

impl SnapshotSource {
    fn load(&self) -> io::Result<Vec<u8>> {
        let raw = if self.path.as_os_str() == "-" {
            let mut buf = Vec::new();
            io::stdin().read_to_end(&mut buf)?;
            buf
        } else {
            fs::read(&self.path)?
        };

        if !self.hex {
            return Ok(raw);
        }

        let text: String = String::from_utf8_lossy(&raw)
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        hex::decode(text).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

impl RawTcpInfoSource for SnapshotSource {
    fn read_raw(&self, key: SockoptKey, buf: &mut [u8]) -> io::Result<usize> {
        debug!(sockopt_level = key.level, sockopt_name = key.name, path = %self.path.display(), "reading snapshot");
        let bytes = self.load()?;
        let n = bytes.len().min(buf.len());
        buf[..n].copy_from_slice(&bytes[..n]);
        // Report the real size so a wrong-sized dump is rejected by the decoder
        Ok(bytes.len())
    }

    fn operation(&self) -> &'static str {
        "read"
    }
}

// ============================================================================
// MAIN
// ============================================================================

fn init_logging(level: Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Cannot install log subscriber: {e}");
    }
}

fn decode(args: &Args) -> Result<Info, TcpInfoError> {
    let source = SnapshotSource {
        path: args.snapshot.clone(),
        hex: args.hex,
    };

    match args.layout {
        LayoutArg::Linux => {
            info!(layout = LinuxLayout::NAME, size = LinuxLayout::SIZE, "decoding snapshot");
            fetch_info::<LinuxLayout, _>(&source)
        }
    }
}

fn render(info: &Info, format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Text => Ok(info.to_string()),
        OutputFormat::Json => serde_json::to_string_pretty(info),
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    if args.log {
        init_logging(args.log_level);
    }

    let info = match decode(&args) {
        Ok(info) => info,
        Err(e) => {
            error!(error = %e, "decode failed");
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match render(&info, args.format) {
        Ok(out) => {
            println!("{out}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: cannot render output: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(name: &str, contents: &[u8]) -> PathBuf {
        let path = std::env::temp_dir().join(format!("tcpinfo-{}-{name}", std::process::id()));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["tcpinfo", "dump.bin"]);
        assert_eq!(args.format, OutputFormat::Text);
        assert_eq!(args.layout, LayoutArg::Linux);
        assert_eq!(args.log_level, Level::INFO);
        assert!(!args.hex && !args.log);
    }

    #[test]
    fn test_decode_hex_snapshot() {
        let mut raw = vec![0u8; LinuxLayout::SIZE];
        raw[0] = 6;
        let text = hex::encode(&raw);
        // Split across lines the way `xxd -p` does
        let wrapped = format!("{}\n{}\n", &text[..60], &text[60..]);
        let path = write_temp("hex", wrapped.as_bytes());

        let args = Args::parse_from(["tcpinfo", "--hex", path.to_str().unwrap()]);
        let info = decode(&args).unwrap();
        assert_eq!(info.state, tcpinfo::ConnectionState::TimeWait);

        let json = render(&info, OutputFormat::Json).unwrap();
        assert!(json.contains("\"TimeWait\""));
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_missing_file_is_acquisition_failure() {
        let args = Args::parse_from(["tcpinfo", "/nonexistent/tcpinfo/snapshot.bin"]);
        match decode(&args).unwrap_err() {
            TcpInfoError::AcquisitionFailure { operation, source } => {
                assert_eq!(operation, "read");
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_truncated_raw_snapshot_is_malformed() {
        let path = write_temp("short", &[1u8; 40]);
        let args = Args::parse_from(["tcpinfo", path.to_str().unwrap()]);
        let err = decode(&args).unwrap_err();
        assert!(err.malformed().is_some());
        fs::remove_file(path).unwrap();
    }
}

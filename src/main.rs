use anyhow::Result;
use clap::{Arg, Command};
use tabledb::server::serve;
use tracing_subscriber::{fmt, EnvFilter};

/// Entry point for the tabledb server.
///
/// 1. Parses the root directory and listen address
/// 2. Initializes structured logging with tracing
/// 3. Serves clients until the process is stopped
///
/// # Arguments
/// - `--root DIR`: directory holding one sub-directory per database (default: databases)
/// - `--listen ADDR`: TCP address to bind to (default: 127.0.0.1:8888)
#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let matches = Command::new("tabledb")
        .about("Miniature query engine over tab-separated table files")
        .arg(Arg::new("root")
            .long("root")
            .value_name("DIR")
            .default_value("databases")
            .help("Root directory holding the database directories"))
        .arg(Arg::new("listen")
            .long("listen")
            .value_name("ADDR")
            .default_value("127.0.0.1:8888")
            .help("Listen address for the TCP server"))
        .get_matches();

    // Read the configured directory and address
    let root = matches.get_one::<String>("root").cloned().unwrap_or_default();
    let listen = matches.get_one::<String>("listen").cloned().unwrap_or_default();

    // Initialize structured logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    // Start the TCP server
    serve(root.into(), &listen).await
}

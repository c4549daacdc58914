use crate::{engine::Engine, sql::handle_command};
use anyhow::Result;
use std::path::PathBuf;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader},
    net::TcpListener,
};
use tracing::{error, info};

/// First line every client receives.
pub const GREETING: &str = "tabledb ready. End statements with ;";

/// Written after every response so clients know where it stops.
pub const END_OF_RESPONSE: char = '\u{4}';

/// Starts the TCP server and handles client connections.
///
/// ## Protocol
/// - **Multi-line statements**: input lines are buffered until one ends with `;`
/// - **One session per client**: each connection opens its own [`Engine`], so
///   `USE` on one connection never changes another
/// - **Disconnect**: `QUIT;` closes the connection
///
/// ## Example
/// ```text
/// Client: CREATE DATABASE school;
/// Server: [OK]
///         \u{4}
/// Client: SELECT * FROM marks;
/// Server: [ERROR] Table marks does not exist
///         \u{4}
/// ```
///
/// Clients share the root directory but not their sessions; statements from
/// different clients touching the same table are not coordinated.
pub async fn serve(root: PathBuf, addr: &str) -> Result<()> {
    // Create the root up front so a bad path fails start-up, not the first client.
    Engine::open(&root)?;
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, root = %root.display(), "listening");

    loop {
        let (socket, peer) = listener.accept().await?;
        let root = root.clone();
        info!(?peer, "client connected");

        tokio::spawn(async move {
            let (r, w) = socket.into_split();
            let result = match Engine::open(root) {
                Ok(engine) => handle_connection(engine, BufReader::new(r), w).await,
                Err(e) => Err(e.into()),
            };
            if let Err(e) = result {
                error!(error = %e, ?peer, "connection error");
            }
            info!(?peer, "client disconnected");
        });
    }
}

/// Runs one client session to completion over any line-oriented stream.
pub async fn handle_connection<R, W>(mut engine: Engine, reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    writer.write_all(format!("{}\n", GREETING).as_bytes()).await?;

    let mut buf = String::new();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if !buf.is_empty() {
            buf.push(' ');
        }
        buf.push_str(line);
        if !buf.ends_with(';') {
            continue;
        }

        let statement = std::mem::take(&mut buf);
        if statement.eq_ignore_ascii_case("QUIT;") {
            break;
        }

        let response = handle_command(&mut engine, &statement);
        writer
            .write_all(format!("{}{}\n", response, END_OF_RESPONSE).as_bytes())
            .await?;
        writer.flush().await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::io::{duplex, AsyncReadExt};

    async fn run_session(root: &std::path::Path, input: &str) -> String {
        let engine = Engine::open(root).unwrap();
        let (client, server) = duplex(64 * 1024);
        let (server_read, server_write) = tokio::io::split(server);
        let (mut client_read, mut client_write) = tokio::io::split(client);

        client_write.write_all(input.as_bytes()).await.unwrap();
        client_write.shutdown().await.unwrap();
        drop(client_write);

        handle_connection(engine, BufReader::new(server_read), server_write)
            .await
            .unwrap();

        let mut output = String::new();
        client_read.read_to_string(&mut output).await.unwrap();
        output
    }

    #[tokio::test]
    async fn test_session_over_stream() {
        let dir = TempDir::new().unwrap();
        let output = run_session(
            dir.path(),
            "CREATE DATABASE school;\nCREATE TABLE marks\n(name, mark);\n\
             INSERT INTO marks VALUES ('Simon', 65);\nSELECT * FROM marks;\nQUIT;\n\
             SELECT * FROM marks;\n",
        )
        .await;

        let expected = format!(
            "{}\n[OK]\n\u{4}\n[OK]\n\u{4}\n[OK]\n\u{4}\n[OK]\nid\tname\tmark\n1\tSimon\t65\n\u{4}\n",
            GREETING
        );
        assert_eq!(output, expected);
    }

    #[tokio::test]
    async fn test_sessions_are_per_connection() {
        let dir = TempDir::new().unwrap();
        run_session(dir.path(), "CREATE DATABASE school;\n").await;
        let output = run_session(dir.path(), "CREATE TABLE marks;\n").await;
        assert!(output.contains("[ERROR] No database selected\n"));
    }
}

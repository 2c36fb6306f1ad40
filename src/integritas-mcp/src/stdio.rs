//! Stdio transport: newline-delimited JSON-RPC frames.
//!
//! One request per line on stdin, one response per line on stdout.
//! Everything else (logs) goes to stderr so the protocol stream stays
//! clean.

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info};

use crate::dispatcher::{dispatch_jsonrpc, parse_jsonrpc_request};
use crate::tools::ToolContext;

/// Serve MCP over stdin/stdout until EOF.
pub async fn serve(ctx: ToolContext) -> anyhow::Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    let mut lines = stdin.lines();

    info!("stdio transport ready");

    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = match parse_jsonrpc_request(line) {
            Ok(request) => dispatch_jsonrpc(&ctx, request).await,
            Err(error_response) => Some(error_response),
        };

        if let Some(response) = response {
            let mut frame =
                serde_json::to_vec(&response).context("serializing response frame")?;
            frame.push(b'\n');
            stdout.write_all(&frame).await.context("writing stdout")?;
            stdout.flush().await.context("flushing stdout")?;
        }
    }

    debug!("stdin closed, shutting down");
    Ok(())
}

//! Stdio server — the read → dispatch → write loop.
//!
//! Strictly sequential: the next frame is not read until the response to the
//! current one has been written and flushed.

use tokio::io::{AsyncBufRead, AsyncWrite, BufReader};
use tokio_util::sync::CancellationToken;

use crate::ipc::codec::{read_frame, write_frame, Frame};
use crate::ipc::dispatch::{Dispatcher, Session};
use crate::ipc::protocol::JsonRpcResponse;
use crate::types::IpcConfig;

/// MCP server bound to one session.
#[derive(Debug)]
pub struct StdioServer {
    dispatcher: Dispatcher,
    session: Session,
    cancel: CancellationToken,
    ipc_config: IpcConfig,
}

impl StdioServer {
    pub fn new(dispatcher: Dispatcher, session: Session, ipc_config: IpcConfig) -> Self {
        Self {
            dispatcher,
            session,
            cancel: CancellationToken::new(),
            ipc_config,
        }
    }

    /// Serve process stdin/stdout until EOF or shutdown.
    pub async fn serve_stdio(&self) -> std::io::Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve(stdin, stdout).await
    }

    /// Serve an arbitrary duplex stream pair.
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        tracing::info!(
            client_id = %self.session.client_id(),
            tools = self.dispatcher.tools().len(),
            "summary manager serving on stdio"
        );

        loop {
            let frame = tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!("stdio server shutting down");
                    break;
                }
                frame = read_frame(&mut reader, self.ipc_config.max_frame_bytes) => frame?,
            };

            let response = match frame {
                None => {
                    tracing::info!("stdin closed");
                    break;
                }
                Some(Frame::Message(bytes)) if bytes.iter().all(u8::is_ascii_whitespace) => {
                    continue;
                }
                Some(Frame::Message(bytes)) => {
                    self.dispatcher.handle_frame(&self.session, &bytes).await
                }
                Some(Frame::Oversized(len)) => {
                    tracing::warn!(
                        len,
                        max = self.ipc_config.max_frame_bytes,
                        "discarded oversized frame"
                    );
                    Some(JsonRpcResponse::invalid_request(
                        serde_json::Value::Null,
                        format!(
                            "frame of {} bytes exceeds limit of {}",
                            len, self.ipc_config.max_frame_bytes
                        ),
                    ))
                }
            };

            if let Some(response) = response {
                let value = serde_json::to_value(&response)?;
                write_frame(&mut writer, &value).await?;
            }
        }

        Ok(())
    }

    /// Request graceful shutdown. An in-flight request still completes.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

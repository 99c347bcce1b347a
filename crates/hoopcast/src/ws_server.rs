// WebSocket transport.
//
// Every accepted connection gets its own `DraftSession`, created after the
// handshake and dropped when the connection closes. Frames on a connection
// are handled one at a time; each inbound text frame produces exactly one
// outbound text frame.

use futures_util::stream::Stream;
use futures_util::{Sink, SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::{info, warn};

use crate::protocol::{ClientRequest, ServerResponse};
use crate::session::{DraftSession, SessionFactory};
use crate::tools::DraftTools;

/// Bind the listener on `127.0.0.1:{port}`.
pub async fn bind(port: u16) -> std::io::Result<TcpListener> {
    TcpListener::bind(format!("127.0.0.1:{port}")).await
}

/// Accept connections forever, serving each on its own task.
pub async fn serve(
    listener: TcpListener,
    sessions: SessionFactory,
    tools: DraftTools,
) -> anyhow::Result<()> {
    let local_addr = listener.local_addr()?;
    info!("WebSocket server listening on {local_addr}");

    loop {
        let (stream, addr) = listener.accept().await?;
        let addr_str = addr.to_string();
        info!("Accepted TCP connection from {addr_str}");

        let session = sessions.create();
        let tools = tools.clone();
        tokio::spawn(async move {
            serve_connection(stream, addr_str, session, tools).await;
        });
    }
}

/// Bind on `port` and serve until the process exits.
pub async fn run(port: u16, sessions: SessionFactory, tools: DraftTools) -> anyhow::Result<()> {
    let listener = bind(port).await?;
    serve(listener, sessions, tools).await
}

async fn serve_connection(
    stream: TcpStream,
    addr: String,
    mut session: DraftSession,
    tools: DraftTools,
) {
    let ws_stream = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("WebSocket handshake failed for {addr}: {e}");
            return;
        }
    };

    let (mut write, read) = ws_stream.split();
    if let Err(e) = process_message_stream(read, &mut write, &mut session, &tools, &addr).await {
        warn!("Failed to write to {addr}: {e}");
    }

    info!(
        "Client {addr} disconnected after {} conversation turns",
        session.history().len()
    );
}

/// Answer every text frame from `stream` on `sink`, in order.
///
/// Generic over both halves so it can be driven by in-memory streams and
/// sinks in tests. Stops at a close frame or a read error; a failed write
/// is returned.
pub async fn process_message_stream<St, Si>(
    mut stream: St,
    sink: &mut Si,
    session: &mut DraftSession,
    tools: &DraftTools,
    addr: &str,
) -> Result<(), Si::Error>
where
    St: Stream<Item = Result<Message, WsError>> + Unpin,
    Si: Sink<Message> + Unpin,
{
    while let Some(msg_result) = stream.next().await {
        match msg_result {
            Ok(Message::Text(text)) => {
                let response = handle_frame(session, tools, text.as_str()).await;
                sink.send(Message::Text(response.to_json().into())).await?;
            }
            Ok(Message::Close(_)) => {
                info!("Client {addr} sent close frame");
                break;
            }
            Err(e) => {
                warn!("WebSocket error from {addr}: {e}");
                break;
            }
            _ => {
                // Ignore Binary, Ping, Pong, Frame variants.
            }
        }
    }
    Ok(())
}

/// Route one inbound frame to the session or the tools.
pub async fn handle_frame(
    session: &mut DraftSession,
    tools: &DraftTools,
    text: &str,
) -> ServerResponse {
    match ClientRequest::parse(text) {
        Ok(ClientRequest::Chat { message }) => {
            ServerResponse::Response(session.process_query(&message).await)
        }
        Ok(ClientRequest::Tool(call)) => match tools.dispatch(&call).await {
            Ok(value) => ServerResponse::Result(value),
            Err(e) => {
                warn!("Tool call failed: {}", e);
                ServerResponse::Error(e.to_string())
            }
        },
        Err(e) => {
            warn!("Rejected malformed request: {}", e);
            ServerResponse::Error(e.to_string())
        }
    }
}

use crate::journal::JournalAgent;
use crate::models::websocket::{ ClientMessage, ServerMessage };

use std::error::Error;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::io::{ AsyncRead, AsyncWrite };

use tokio_tungstenite::{ accept_hdr_async, WebSocketStream };
use tokio_tungstenite::tungstenite::handshake::server::{ ErrorResponse, Request, Response };
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::protocol::Message;

use lazy_static::lazy_static;
use governor::{ RateLimiter, Quota, state::{ InMemoryState, NotKeyed }, clock::DefaultClock };

use futures::stream::SplitSink;
use futures::{ SinkExt, StreamExt };
use log::{ debug, error, info, warn };

const MAX_MESSAGE_SIZE: usize = 1 * 1024 * 1024;

lazy_static! {
    static ref CONNECTION_LIMITER: RateLimiter<NotKeyed, InMemoryState, DefaultClock> =
        RateLimiter::direct(Quota::per_second(NonZeroU32::new(10).unwrap()));
}

type WsSink<S> = SplitSink<WebSocketStream<S>, Message>;

pub async fn start_ws_server(
    addr: &str,
    agent: Arc<JournalAgent>,
    api_key: Option<String>
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let listener = TcpListener::bind(addr).await?;
    info!("WS server listening on: {}", addr);

    loop {
        let (stream, peer) = listener.accept().await?;

        if CONNECTION_LIMITER.check().is_err() {
            warn!("Global connection rate limit exceeded for {}. Dropping connection.", peer);
            continue;
        }

        info!("Incoming connection from: {}", peer);
        let agent_clone = Arc::clone(&agent);
        let required_api_key = api_key.clone();

        tokio::spawn(async move {
            if let Err(e) = process_connection(peer, stream, agent_clone, required_api_key).await {
                error!("Failed to process connection for {}: {}", peer, e);
            }
        });
    }
}

/// Key from the `X-API-Key` header, else from the `api_key` query parameter.
pub fn provided_api_key(req: &Request) -> Option<String> {
    let from_header = req
        .headers()
        .get("X-API-Key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    from_header.or_else(|| {
        req.uri()
            .query()?
            .split('&')
            .find_map(|pair| {
                let mut kv = pair.splitn(2, '=');
                if kv.next() == Some("api_key") { kv.next().map(|v| v.to_string()) } else { None }
            })
    })
}

fn unauthorized() -> ErrorResponse {
    let mut resp = ErrorResponse::new(Some("Unauthorized".to_string()));
    *resp.status_mut() = StatusCode::UNAUTHORIZED;
    resp
}

async fn process_connection<S>(
    peer: SocketAddr,
    stream: S,
    agent: Arc<JournalAgent>,
    required_api_key: Option<String>
) -> Result<(), Box<dyn Error + Send + Sync>>
    where S: AsyncRead + AsyncWrite + Unpin + Send + 'static
{
    let auth_callback = |req: &Request, response: Response| -> Result<Response, ErrorResponse> {
        let Some(required) = required_api_key.as_deref() else {
            debug!("{} no API key required", peer);
            return Ok(response);
        };
        if provided_api_key(req).as_deref() != Some(required) {
            warn!("{}: bad or missing API key", peer);
            return Err(unauthorized());
        }
        info!("{} authenticated", peer);
        Ok(response)
    };

    match accept_hdr_async(stream, auth_callback).await {
        Ok(ws) => {
            handle_connection(peer, ws, agent).await;
            Ok(())
        }
        Err(e) => {
            error!("Handshake failed for {}: {}", peer, e);
            Err(Box::new(e) as _)
        }
    }
}

async fn send_message<S>(tx: &mut WsSink<S>, msg: &ServerMessage) -> bool
    where S: AsyncRead + AsyncWrite + Unpin
{
    let json = match serde_json::to_string(msg) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize server message: {}", e);
            return true;
        }
    };
    tx.send(Message::Text(json)).await.is_ok()
}

/// Answers one client request. `send` requests are expected to have been
/// acknowledged with [`ServerMessage::Processing`] by the caller.
pub async fn respond(agent: &JournalAgent, request: ClientMessage) -> ServerMessage {
    match request {
        ClientMessage::Send { text } =>
            match agent.send(&text).await {
                Ok(exchange) => ServerMessage::Exchange { user: exchange.user, ai: exchange.ai },
                Err(e) => ServerMessage::Error { message: e.to_string() },
            }
        ClientMessage::Conversation => ServerMessage::Conversation {
            messages: agent.conversation().await,
        },
        ClientMessage::History { utc_offset_minutes } => ServerMessage::History {
            entries: agent.history(utc_offset_minutes).await,
        },
        ClientMessage::Delete { id } => {
            let removed = agent.delete(&id).await;
            ServerMessage::Deleted { id, removed }
        }
        ClientMessage::CompleteOnboarding => {
            let session = agent.complete_onboarding().await;
            ServerMessage::Session {
                onboarding_completed: session.onboarding_completed,
                greeting: agent.greeting().to_string(),
            }
        }
        ClientMessage::Clear => {
            let session = agent.clear().await;
            ServerMessage::Session {
                onboarding_completed: session.onboarding_completed,
                greeting: agent.greeting().to_string(),
            }
        }
    }
}

pub async fn handle_connection<S>(
    peer: SocketAddr,
    websocket: WebSocketStream<S>,
    agent: Arc<JournalAgent>
)
    where S: AsyncRead + AsyncWrite + Unpin
{
    info!("New WebSocket connection: {}", peer);
    let (mut tx, mut rx) = websocket.split();

    let session = agent.session().await;
    let hello = ServerMessage::Session {
        onboarding_completed: session.onboarding_completed,
        greeting: agent.greeting().to_string(),
    };
    if !send_message(&mut tx, &hello).await {
        error!("Failed to send session info to {}", peer);
        return;
    }

    while let Some(msg) = rx.next().await {
        let message = match msg {
            Ok(message) => message,
            Err(e) => {
                match e {
                    | tokio_tungstenite::tungstenite::Error::ConnectionClosed
                    | tokio_tungstenite::tungstenite::Error::Protocol(_)
                    | tokio_tungstenite::tungstenite::Error::Utf8 => {
                        info!("WebSocket connection closed or protocol error for {}: {}", peer, e);
                    }
                    tokio_tungstenite::tungstenite::Error::Io(ref io_err) if
                        io_err.kind() == std::io::ErrorKind::ConnectionReset
                    => {
                        info!("WebSocket connection reset by peer {}", peer);
                    }
                    _ => {
                        error!("Error receiving message from {}: {}", peer, e);
                    }
                }
                break;
            }
        };

        if message.len() > MAX_MESSAGE_SIZE {
            warn!(
                "Message from {} exceeds size limit ({} > {})",
                peer,
                message.len(),
                MAX_MESSAGE_SIZE
            );
            let error_msg = ServerMessage::Error {
                message: "Message too large".to_string(),
            };
            if !send_message(&mut tx, &error_msg).await {
                error!("Failed to send size limit error to {}", peer);
            }
            break;
        }

        match message {
            Message::Text(text) => {
                let reply = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(request) => {
                        if matches!(request, ClientMessage::Send { .. }) &&
                            !send_message(&mut tx, &ServerMessage::Processing).await
                        {
                            error!("Error sending processing status to {}", peer);
                            break;
                        }
                        respond(&agent, request).await
                    }
                    Err(e) => {
                        error!("Failed to parse message from {}: {}", peer, e);
                        ServerMessage::Error {
                            message: format!("Failed to parse message: {}", e),
                        }
                    }
                };
                if let ServerMessage::Error { message } = &reply {
                    warn!("Request from {} failed: {}", peer, message);
                }
                if !send_message(&mut tx, &reply).await {
                    error!("Error sending reply to {}", peer);
                    break;
                }
            }
            Message::Close(_) => {
                info!("Received close frame from {}", peer);
                break;
            }
            Message::Ping(ping_data) => {
                if tx.send(Message::Pong(ping_data)).await.is_err() {
                    error!("Failed to send pong to {}", peer);
                    break;
                }
            }
            Message::Pong(_) => {}
            Message::Binary(_) => {
                warn!("Ignoring binary message from {}", peer);
            }
            Message::Frame(_) => {}
        }
    }
    info!("WebSocket connection closed for {}", peer);
}

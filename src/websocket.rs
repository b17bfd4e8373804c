use crate::agent::{ GenerateOptions, SiteAgent, SiteOutcome };
use crate::conversation::AnswerOutcome;
use crate::models::websocket::{ ClientMessage, ServerMessage };
use crate::session::{ GenerationTicket, SessionError };
use chrono::Utc;
use futures::stream::SplitSink;
use futures::{ SinkExt, StreamExt };
use log::{ info, warn, error, debug };
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{ AsyncRead, AsyncWrite };
use tokio::task::{ JoinError, JoinHandle };
use tokio_tungstenite::{ tungstenite::{ self, protocol::Message }, WebSocketStream };
use uuid::Uuid;

const MAX_MESSAGE_SIZE: usize = 1 * 1024 * 1024;

type Sink<S> = SplitSink<WebSocketStream<S>, Message>;
type GenerationTask = JoinHandle<Result<SiteOutcome, SessionError>>;

/// The generation currently running for this connection, if any.
struct Pending {
    ticket: GenerationTicket,
    task: GenerationTask,
}

async fn send_message<S>(tx: &mut Sink<S>, msg: &ServerMessage) -> Result<(), tungstenite::Error>
    where S: AsyncRead + AsyncWrite + Unpin
{
    match serde_json::to_string(msg) {
        Ok(json) => tx.send(Message::Text(json)).await,
        Err(e) => {
            error!("Failed to serialize server message: {}", e);
            Ok(())
        }
    }
}

async fn wait_for(pending: &mut Option<Pending>) -> Result<Result<SiteOutcome, SessionError>, JoinError> {
    match pending {
        Some(p) => (&mut p.task).await,
        None => std::future::pending().await,
    }
}

fn error_message(message: impl Into<String>) -> ServerMessage {
    ServerMessage::Error { message: message.into() }
}

/// Serves one browser conversation: a fresh session per connection, removed
/// when the socket closes.
pub async fn handle_connection<S>(
    peer: SocketAddr,
    websocket: WebSocketStream<S>,
    agent: Arc<SiteAgent>
)
    where S: AsyncRead + AsyncWrite + Unpin
{
    info!("New WebSocket connection: {}", peer);

    if let Err(e) = agent.reload_script_if_changed().await {
        error!("Failed to reload question script: {}", e);
    }

    let (mut tx, mut rx) = websocket.split();
    let snapshot = agent.open_connection_session().await;
    let session_id = snapshot.session_id;
    info!("Assigned session ID {} to {}", session_id, peer);

    if let Some(greeting) = snapshot.question {
        let msg = ServerMessage::Question { content: greeting, index: 0, total: snapshot.total };
        if let Err(e) = send_message(&mut tx, &msg).await {
            error!("Error sending greeting to {}: {}", peer, e);
            let _ = agent.remove_session(session_id).await;
            return;
        }
    }

    let mut pending: Option<Pending> = None;

    loop {
        tokio::select! {
            joined = wait_for(&mut pending), if pending.is_some() => {
                let Some(finished) = pending.take() else { continue };
                let reply = match joined {
                    Ok(Ok(outcome)) => Some(ServerMessage::Site {
                        html: outcome.site.html,
                        recommendation: outcome.recommendation,
                        site_id: outcome.site_id,
                        variant: outcome.site.variant.number(),
                        timestamp: Utc::now().timestamp(),
                    }),
                    Ok(Err(SessionError::Superseded(_))) => None,
                    Ok(Err(e)) => Some(error_message(e.to_string())),
                    Err(e) => {
                        error!("Generation task for session {} failed: {}", session_id, e);
                        agent.cancel_generation(&finished.ticket).await;
                        Some(error_message("Site generation failed"))
                    }
                };
                if let Some(reply) = reply {
                    if let Err(e) = send_message(&mut tx, &reply).await {
                        error!("Error sending site to {}: {}", peer, e);
                        break;
                    }
                }
            }
            msg = rx.next() => {
                let Some(msg) = msg else { break };
                let message = match msg {
                    Ok(message) => message,
                    Err(e) => {
                        match e {
                            | tungstenite::Error::ConnectionClosed
                            | tungstenite::Error::Protocol(_)
                            | tungstenite::Error::Utf8 => {
                                info!("WebSocket connection closed or protocol error for {}: {}", peer, e);
                            }
                            tungstenite::Error::Io(ref io_err) if
                                io_err.kind() == std::io::ErrorKind::ConnectionReset
                            => {
                                info!("WebSocket connection reset by peer {}", peer);
                            }
                            tungstenite::Error::Capacity(ref cap_err) => {
                                error!("WebSocket capacity error for {}: {}", peer, cap_err);
                                let _ = send_message(&mut tx, &error_message("Server capacity error")).await;
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
                    if send_message(&mut tx, &error_message("Message too large")).await.is_err() {
                        error!("Failed to send size limit error to {}", peer);
                    }
                    break;
                }

                match message {
                    Message::Text(text) => {
                        let reply = match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(client_msg) => {
                                handle_client_message(&agent, session_id, client_msg, &mut pending).await
                            }
                            Err(e) => {
                                error!("Failed to parse message from {}: {}", peer, e);
                                vec![error_message(format!("Failed to parse message: {}", e))]
                            }
                        };
                        let mut failed = false;
                        for msg in &reply {
                            if let Err(e) = send_message(&mut tx, msg).await {
                                error!("Error sending message to {}: {}", peer, e);
                                failed = true;
                                break;
                            }
                        }
                        if failed {
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
        }
    }

    if let Some(p) = pending.take() {
        p.task.abort();
    }
    if agent.remove_session(session_id).await.is_err() {
        debug!("Session {} was already gone", session_id);
    }
    info!(
        "WebSocket connection closed for {} (Session ID: {}, {} sessions remain)",
        peer,
        session_id,
        agent.session_count().await
    );
}

async fn handle_client_message(
    agent: &Arc<SiteAgent>,
    session_id: Uuid,
    msg: ClientMessage,
    pending: &mut Option<Pending>
) -> Vec<ServerMessage> {
    match msg {
        ClientMessage::Answer { content } => {
            match agent.answer(session_id, &content).await {
                Ok((AnswerOutcome::Next(question), snapshot)) =>
                    vec![ServerMessage::Question {
                        content: question,
                        index: snapshot.answered,
                        total: snapshot.total,
                    }],
                Ok((AnswerOutcome::Finished, _)) => vec![ServerMessage::Complete],
                Err(e) => vec![error_message(e.to_string())],
            }
        }
        ClientMessage::Image { url } => {
            match agent.add_image(session_id, &url).await {
                Ok(count) => vec![ServerMessage::ImageAdded { count }],
                Err(e) => vec![error_message(e.to_string())],
            }
        }
        ClientMessage::Reset => {
            if let Some(p) = pending.take() {
                debug!("Reset aborts running generation for session {}", session_id);
                p.task.abort();
            }
            match agent.reset(session_id).await {
                Ok(snapshot) =>
                    vec![ServerMessage::Question {
                        content: snapshot.question.unwrap_or_default(),
                        index: 0,
                        total: snapshot.total,
                    }],
                Err(e) => vec![error_message(e.to_string())],
            }
        }
        ClientMessage::Generate { variant, business_type } => {
            let ticket = match agent.start_generation(session_id).await {
                Ok(ticket) => ticket,
                Err(e) => {
                    return vec![error_message(e.to_string())];
                }
            };
            let task_agent = Arc::clone(agent);
            let task_ticket = ticket.clone();
            let options = GenerateOptions { variant, business_type };
            let task = tokio::spawn(async move {
                task_agent.complete_generation(task_ticket, options).await
            });
            *pending = Some(Pending { ticket, task });
            vec![ServerMessage::Processing]
        }
        ClientMessage::Cancel => {
            match pending.take() {
                Some(p) => {
                    p.task.abort();
                    agent.cancel_generation(&p.ticket).await;
                    vec![ServerMessage::Cancelled]
                }
                None => vec![error_message("No generation in progress")],
            }
        }
    }
}

//! The gateway connection driver (§4.E): connect, HELLO, identify/resume,
//! heartbeat, read loop, reconnect. Ported from the teacher's
//! `gateway_driver`/`read_loop` in `gateway.rs`, restructured around the
//! typed [`ConnectionState`] machine and widened backoff cap the distilled
//! spec calls for.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, error, info, warn};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::model::envelope::GatewayPayload;
use crate::multiplex::Broadcaster;

use super::close::{self, CloseAction};
use super::event::{GatewayEvent, ParseFailure};
use super::state::{ConnectionState, HeartbeatState, SessionState};

const DEFAULT_GATEWAY_URL: &str = "wss://gateway.discord.gg/?v=10&encoding=json";
const MAX_RECONNECT_ATTEMPTS: u32 = 8;
/// Library issue tracker referenced by the critical auth-failure log line (§6).
const LIBRARY_ISSUES_URL: &str = "https://github.com/discord-rs/hello-discord/issues";

type WsSink = futures_util::stream::SplitSink<
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>,
    WsMessage,
>;
type WsStream = futures_util::stream::SplitStream<
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>,
>;

/// The handle returned by [`connect`]. Background tasks keep running until
/// it's dropped or the connection reaches `Stopped`.
pub struct GatewayHandle {
    pub sender: mpsc::Sender<serde_json::Value>,
    pub events: crate::multiplex::Subscriber<GatewayEvent>,
    pub parse_failures: crate::multiplex::Subscriber<ParseFailure>,
    /// Fatal and semi-fatal conditions surfaced per §7, rather than only
    /// logged and swallowed (connect failures, timeouts, terminal closes).
    pub errors: crate::multiplex::Subscriber<GatewayError>,
    /// Bumped on every disconnect (including the final, terminal one), so
    /// observers can confirm a reconnect or shutdown happened.
    pub connection_id: Arc<AtomicU64>,
    connection_state: Arc<Mutex<ConnectionState>>,
    pub driver_handle: tokio::task::JoinHandle<()>,
}

impl GatewayHandle {
    /// The connection's current lifecycle state (§3).
    pub async fn connection_state(&self) -> ConnectionState {
        *self.connection_state.lock().await
    }
}

pub async fn connect(config: GatewayConfig) -> GatewayHandle {
    let events = Broadcaster::new(crate::multiplex::DEFAULT_CAPACITY);
    let parse_failures = Broadcaster::new(crate::multiplex::DEFAULT_CAPACITY);
    let errors = Broadcaster::new(crate::multiplex::DEFAULT_CAPACITY);
    let (send_tx, send_rx) = mpsc::channel::<serde_json::Value>(64);
    let connection_id = Arc::new(AtomicU64::new(0));
    let connection_state = Arc::new(Mutex::new(ConnectionState::Disconnected));

    let events_sub = events.subscribe();
    let failures_sub = parse_failures.subscribe();
    let errors_sub = errors.subscribe();

    let driver_handle = tokio::spawn(gateway_driver(
        config,
        events,
        parse_failures,
        errors,
        send_rx,
        Arc::clone(&connection_id),
        Arc::clone(&connection_state),
    ));

    GatewayHandle {
        sender: send_tx,
        events: events_sub,
        parse_failures: failures_sub,
        errors: errors_sub,
        connection_id,
        connection_state,
        driver_handle,
    }
}

#[derive(Debug)]
enum DisconnectReason {
    ShouldResume,
    ShouldReidentify,
    Terminal,
}

#[allow(clippy::too_many_arguments)]
async fn gateway_driver(
    config: GatewayConfig,
    events: Broadcaster<GatewayEvent>,
    parse_failures: Broadcaster<ParseFailure>,
    errors: Broadcaster<GatewayError>,
    mut send_rx: mpsc::Receiver<serde_json::Value>,
    connection_id: Arc<AtomicU64>,
    conn_state: Arc<Mutex<ConnectionState>>,
) {
    let session = Arc::new(Mutex::new(SessionState::default()));
    let mut reconnect_attempts: u32 = 0;

    loop {
        *conn_state.lock().await = ConnectionState::Connecting;

        let url = {
            let s = session.lock().await;
            s.resume_gateway_url
                .clone()
                .unwrap_or_else(|| DEFAULT_GATEWAY_URL.to_string())
        };
        let url = with_query_params(&url);

        info!(url = %url, "connecting to Discord gateway");

        let connect_result = tokio::time::timeout(
            config.handshake_timeout,
            tokio_tungstenite::connect_async(&url),
        )
        .await;

        let (ws_stream, _) = match connect_result {
            Ok(Ok(pair)) => {
                reconnect_attempts = 0;
                pair
            }
            Ok(Err(e)) => {
                error!(error = %e, "failed to connect to gateway");
                errors.publish(GatewayError::Connect(e.to_string()));
                if !back_off_or_give_up(&mut reconnect_attempts).await {
                    *conn_state.lock().await = ConnectionState::Stopped;
                    return;
                }
                continue;
            }
            Err(_) => {
                error!("timed out connecting to gateway");
                errors.publish(GatewayError::Timeout("gateway connection"));
                if !back_off_or_give_up(&mut reconnect_attempts).await {
                    *conn_state.lock().await = ConnectionState::Stopped;
                    return;
                }
                continue;
            }
        };

        info!("WebSocket connected");

        let (ws_write, mut ws_read) = ws_stream.split();
        let ws_write = Arc::new(Mutex::new(ws_write));

        *conn_state.lock().await = ConnectionState::AwaitingHello;
        let heartbeat_interval = match read_hello(&mut ws_read, config.handshake_timeout).await {
            Ok(interval) => interval,
            Err(e) => {
                error!(error = %e, "failed to read HELLO");
                let gateway_error = if e.starts_with("timed out") {
                    GatewayError::Timeout("HELLO")
                } else {
                    GatewayError::Transport(e)
                };
                errors.publish(gateway_error);
                if !back_off_or_give_up(&mut reconnect_attempts).await {
                    *conn_state.lock().await = ConnectionState::Stopped;
                    return;
                }
                continue;
            }
        };
        info!(interval_ms = heartbeat_interval, "received HELLO");

        let should_resume = session.lock().await.can_resume();
        *conn_state.lock().await = if should_resume {
            ConnectionState::Resuming
        } else {
            ConnectionState::Identifying
        };
        let send_result = if should_resume {
            send_resume(&ws_write, &config, &session).await
        } else {
            send_identify(&ws_write, &config).await
        };
        if let Err(e) = send_result {
            error!(error = %e, "failed to send IDENTIFY/RESUME");
            errors.publish(GatewayError::Transport(e));
            if !back_off_or_give_up(&mut reconnect_attempts).await {
                *conn_state.lock().await = ConnectionState::Stopped;
                return;
            }
            continue;
        }

        let heartbeat_state = Arc::new(Mutex::new(HeartbeatState::new()));
        let (hb_cancel_tx, hb_cancel_rx) = mpsc::channel::<()>(1);
        let heartbeat_handle = spawn_heartbeat(
            heartbeat_interval,
            Arc::clone(&ws_write),
            Arc::clone(&session),
            Arc::clone(&heartbeat_state),
            hb_cancel_rx,
        );

        let reason = read_loop(
            &mut ws_read,
            &ws_write,
            &events,
            &parse_failures,
            &errors,
            &session,
            &heartbeat_state,
            &conn_state,
            &mut send_rx,
            config.identify_timeout,
        )
        .await;

        let _ = hb_cancel_tx.send(()).await;
        heartbeat_handle.abort();
        *conn_state.lock().await = ConnectionState::Closing;
        {
            let mut w = ws_write.lock().await;
            let _ = w.send(WsMessage::Close(None)).await;
        }

        connection_id.fetch_add(1, Ordering::SeqCst);

        match reason {
            DisconnectReason::ShouldResume => {
                info!("will attempt RESUME");
                *conn_state.lock().await = ConnectionState::Disconnected;
            }
            DisconnectReason::ShouldReidentify => {
                info!("session invalidated, will re-IDENTIFY");
                session.lock().await.clear_for_reidentify();
                *conn_state.lock().await = ConnectionState::Disconnected;
            }
            DisconnectReason::Terminal => {
                *conn_state.lock().await = ConnectionState::Stopped;
                return;
            }
        }

        if !back_off_or_give_up(&mut reconnect_attempts).await {
            *conn_state.lock().await = ConnectionState::Stopped;
            return;
        }
    }
}

fn with_query_params(url: &str) -> String {
    if url.contains("v=10") {
        url.to_string()
    } else if url.contains('?') {
        format!("{url}&v=10&encoding=json")
    } else {
        format!("{url}?v=10&encoding=json")
    }
}

/// Sleep off the reconnect backoff and bump the attempt counter; returns
/// `false` once the attempt cap is exceeded (caller should give up).
async fn back_off_or_give_up(reconnect_attempts: &mut u32) -> bool {
    *reconnect_attempts += 1;
    if *reconnect_attempts > MAX_RECONNECT_ATTEMPTS {
        error!("exceeded max reconnect attempts, giving up");
        return false;
    }
    let delay = super::backoff::reconnect_delay(*reconnect_attempts);
    warn!(delay_ms = delay.as_millis() as u64, attempt = *reconnect_attempts, "backing off before reconnect");
    tokio::time::sleep(delay).await;
    true
}

async fn read_hello(stream: &mut WsStream, timeout: Duration) -> Result<u64, String> {
    let msg = tokio::time::timeout(timeout, stream.next())
        .await
        .map_err(|_| "timed out waiting for HELLO".to_string())?
        .ok_or_else(|| "stream ended before HELLO".to_string())?
        .map_err(|e| format!("WS error reading HELLO: {e}"))?;

    let text = match msg {
        WsMessage::Text(t) => t,
        other => return Err(format!("expected text message for HELLO, got {other:?}")),
    };

    let payload: GatewayPayload =
        serde_json::from_str(&text).map_err(|e| format!("failed to parse HELLO: {e}"))?;
    if payload.op != 10 {
        return Err(format!("expected op 10 (HELLO), got op {}", payload.op));
    }
    payload
        .d
        .as_ref()
        .and_then(|d| d.get("heartbeat_interval"))
        .and_then(|v| v.as_u64())
        .ok_or_else(|| "HELLO missing heartbeat_interval".to_string())
}

async fn send_identify(ws_write: &Arc<Mutex<WsSink>>, config: &GatewayConfig) -> Result<(), String> {
    let mut identify = json!({
        "op": 2,
        "d": {
            "token": config.token.expose(),
            "properties": {
                "os": "linux",
                "browser": "hello-discord",
                "device": "hello-discord",
            },
            "intents": config.intents.as_i64(),
            "shard": [config.shard_id, config.shard_count],
        }
    });
    if let Some(presence) = &config.presence {
        identify["d"]["presence"] = serde_json::to_value(presence).unwrap_or(serde_json::Value::Null);
    }
    send_raw(ws_write, &identify).await?;
    info!("sent IDENTIFY");
    Ok(())
}

async fn send_resume(
    ws_write: &Arc<Mutex<WsSink>>,
    config: &GatewayConfig,
    session: &Arc<Mutex<SessionState>>,
) -> Result<(), String> {
    let s = session.lock().await;
    let resume = json!({
        "op": 6,
        "d": {
            "token": config.token.expose(),
            "session_id": s.session_id.as_ref().expect("can_resume checked"),
            "seq": s.sequence.expect("can_resume checked"),
        }
    });
    drop(s);
    send_raw(ws_write, &resume).await?;
    info!("sent RESUME");
    Ok(())
}

async fn send_raw(ws_write: &Arc<Mutex<WsSink>>, payload: &serde_json::Value) -> Result<(), String> {
    let text = serde_json::to_string(payload).map_err(|e| e.to_string())?;
    let mut w = ws_write.lock().await;
    w.send(WsMessage::Text(text)).await.map_err(|e| format!("WS send error: {e}"))
}

fn spawn_heartbeat(
    interval_ms: u64,
    ws_write: Arc<Mutex<WsSink>>,
    session: Arc<Mutex<SessionState>>,
    heartbeat_state: Arc<Mutex<HeartbeatState>>,
    mut cancel_rx: mpsc::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let jitter = rand::random::<f64>();
        let first_delay = Duration::from_millis((interval_ms as f64 * jitter) as u64);
        tokio::select! {
            _ = tokio::time::sleep(first_delay) => {}
            _ = cancel_rx.recv() => return,
        }

        let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if heartbeat_state.lock().await.is_zombie() {
                        warn!("heartbeat not acknowledged in time, closing as zombie link");
                        let mut w = ws_write.lock().await;
                        let _ = w.send(WsMessage::Close(Some(tokio_tungstenite::tungstenite::protocol::CloseFrame {
                            code: tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode::from(4000u16),
                            reason: "zombie link".into(),
                        }))).await;
                        return;
                    }
                    let seq = session.lock().await.sequence;
                    let heartbeat = json!({"op": 1, "d": seq});
                    if send_raw(&ws_write, &heartbeat).await.is_err() {
                        warn!("heartbeat send failed, stopping heartbeat task");
                        return;
                    }
                    heartbeat_state.lock().await.record_sent();
                    debug!(?seq, "sent heartbeat");
                }
                _ = cancel_rx.recv() => {
                    debug!("heartbeat task cancelled");
                    return;
                }
            }
        }
    })
}

#[allow(clippy::too_many_arguments)]
async fn read_loop(
    ws_read: &mut WsStream,
    ws_write: &Arc<Mutex<WsSink>>,
    events: &Broadcaster<GatewayEvent>,
    parse_failures: &Broadcaster<ParseFailure>,
    errors: &Broadcaster<GatewayError>,
    session: &Arc<Mutex<SessionState>>,
    heartbeat_state: &Arc<Mutex<HeartbeatState>>,
    conn_state: &Arc<Mutex<ConnectionState>>,
    send_rx: &mut mpsc::Receiver<serde_json::Value>,
    identify_timeout: Duration,
) -> DisconnectReason {
    let identify_deadline = tokio::time::Instant::from_std(Instant::now() + identify_timeout);
    let mut ready_received = false;

    loop {
        let timeout_fut = tokio::time::sleep_until(identify_deadline);
        tokio::select! {
            biased;

            Some(payload) = send_rx.recv() => {
                if let Err(e) = send_raw(ws_write, &payload).await {
                    warn!(error = %e, "failed to send user payload on gateway");
                }
            }

            () = timeout_fut, if !ready_received => {
                warn!("timed out waiting for READY after identify/resume");
                errors.publish(GatewayError::Timeout("READY"));
                return DisconnectReason::ShouldResume;
            }

            msg = ws_read.next() => {
                let msg = match msg {
                    Some(Ok(m)) => m,
                    Some(Err(e)) => {
                        warn!(error = %e, "WebSocket read error");
                        errors.publish(GatewayError::Transport(e.to_string()));
                        return DisconnectReason::ShouldResume;
                    }
                    None => {
                        info!("WebSocket stream ended");
                        errors.publish(GatewayError::Transport("stream ended unexpectedly".to_string()));
                        return DisconnectReason::ShouldResume;
                    }
                };

                match msg {
                    WsMessage::Text(text) => {
                        let payload: GatewayPayload = match serde_json::from_str(&text) {
                            Ok(p) => p,
                            Err(e) => {
                                warn!(error = %e, "failed to parse gateway envelope");
                                parse_failures.publish(ParseFailure { event_name: None, error: e.to_string() });
                                continue;
                            }
                        };

                        if let Some(s) = payload.s {
                            session.lock().await.sequence = Some(s);
                        }

                        let event = match GatewayEvent::from_payload(payload) {
                            Ok(event) => event,
                            Err(failure) => {
                                parse_failures.publish(failure);
                                continue;
                            }
                        };

                        match &event {
                            GatewayEvent::Ready(ready) => {
                                ready_received = true;
                                let mut s = session.lock().await;
                                s.session_id = Some(ready.session_id.clone());
                                s.resume_gateway_url = Some(ready.resume_gateway_url.clone());
                                drop(s);
                                *conn_state.lock().await = ConnectionState::Connected;
                                info!(session_id = %ready.session_id, user = %ready.user.username, "gateway READY");
                            }
                            GatewayEvent::HeartbeatRequest => {
                                let seq = session.lock().await.sequence;
                                let heartbeat = json!({"op": 1, "d": seq});
                                if send_raw(ws_write, &heartbeat).await.is_err() {
                                    warn!("failed to send requested heartbeat");
                                } else {
                                    heartbeat_state.lock().await.record_sent();
                                }
                                continue;
                            }
                            GatewayEvent::HeartbeatAck => {
                                heartbeat_state.lock().await.record_ack();
                                debug!("heartbeat acknowledged");
                            }
                            GatewayEvent::Reconnect => {
                                info!("gateway requested reconnect (op 7)");
                                return DisconnectReason::ShouldResume;
                            }
                            GatewayEvent::InvalidSession(resumable) => {
                                warn!(resumable, "session invalidated (op 9)");
                                let wait = Duration::from_millis(1000 + (rand::random::<f64>() * 4000.0) as u64);
                                tokio::time::sleep(wait).await;
                                return if *resumable {
                                    DisconnectReason::ShouldResume
                                } else {
                                    DisconnectReason::ShouldReidentify
                                };
                            }
                            _ => {}
                        }

                        events.publish(event);
                    }

                    WsMessage::Close(frame) => {
                        let code = frame.as_ref().map(|f| u16::from(f.code)).unwrap_or(1000);
                        warn!(close_code = code, "WebSocket closed by server");

                        match close::classify(code) {
                            CloseAction::Terminal => {
                                let reason = if code == 4004 {
                                    error!(
                                        "Will not reconnect because Discord does not allow it. Something is wrong. Your close code is 'authenticationFailed', check Discord docs at https://discord.com/developers/docs/topics/opcodes-and-status-codes#gateway-gateway-close-event-codes and see what it means. Report at {} if you think this is a library issue",
                                        LIBRARY_ISSUES_URL
                                    );
                                    "authenticationFailed".to_string()
                                } else {
                                    let described = close::describe(code).unwrap_or("unknown");
                                    error!(close_code = code, reason = described, "terminal gateway close");
                                    described.to_string()
                                };
                                errors.publish(GatewayError::Terminal { code, reason });
                                return DisconnectReason::Terminal;
                            }
                            CloseAction::Reidentify => return DisconnectReason::ShouldReidentify,
                            CloseAction::Resume => return DisconnectReason::ShouldResume,
                        }
                    }

                    _ => {}
                }
            }
        }
    }
}

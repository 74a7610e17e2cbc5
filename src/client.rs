//! A single IRC proxy connection.
//!
//! The [`Client`] registers with the proxy, then reads lines in order and
//! reacts to the few commands that matter for away tracking:
//!
//! - `NICK` from our own nick updates the nickname
//! - `PRIVMSG` from our own nick counts as activity
//! - `305`/`306` addressed to us acknowledge an `AWAY` request
//!
//! Everything else is ignored.

use std::sync::Arc;

use awayd_proto::{IrcCodec, Line, Message, PARSE_FAILED, ProtocolError};
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::interrupt::Interrupt;

/// Nickname registered with the proxy when none is configured.
pub const DEFAULT_NICK: &str = "e";

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The proxy acknowledged an `AWAY` with the opposite status.
    #[error("requested away={wanted}, proxy reports away={actual:?}")]
    AwayMismatch { wanted: bool, actual: Option<bool> },

    #[error("connection closed")]
    Disconnected,
}

#[derive(Debug, Default)]
struct ClientState {
    nickname: Option<String>,
    is_away: Option<bool>,
    closed: bool,
}

pub struct Client {
    id: String,
    nick: String,
    state: Mutex<ClientState>,
    /// Shared with every client and the idle controller.
    activity: Arc<Interrupt>,
    /// Fired on every 305/306 and when the connection closes.
    away_changed: Interrupt,
    writer: AsyncMutex<FramedWrite<BoxedWriter, IrcCodec>>,
    shutdown: CancellationToken,
}

impl Client {
    pub fn new<W>(
        id: impl Into<String>,
        nick: impl Into<String>,
        activity: Arc<Interrupt>,
        writer: W,
    ) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let writer: BoxedWriter = Box::new(writer);
        Self {
            id: id.into(),
            nick: nick.into(),
            state: Mutex::new(ClientState::default()),
            activity,
            away_changed: Interrupt::new(),
            writer: AsyncMutex::new(FramedWrite::new(writer, IrcCodec::new())),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current nickname; `None` before registration.
    pub fn nickname(&self) -> Option<String> {
        self.state.lock().nickname.clone()
    }

    /// Last acknowledged away status; `None` before registration.
    pub fn is_away(&self) -> Option<bool> {
        self.state.lock().is_away
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Register, then process incoming lines until the connection ends or
    /// [`Client::shutdown`] is called.
    pub async fn communicate<R>(&self, reader: R) -> Result<(), ClientError>
    where
        R: AsyncRead + Unpin,
    {
        let result = self.run(reader).await;

        self.state.lock().closed = true;
        // Release any set_away still waiting for an acknowledgment
        self.away_changed.trigger();

        result
    }

    async fn run<R>(&self, reader: R) -> Result<(), ClientError>
    where
        R: AsyncRead + Unpin,
    {
        self.handshake().await?;

        let mut lines = FramedRead::new(reader, IrcCodec::new());
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    debug!("shutdown requested");
                    return Ok(());
                }
                next = lines.next() => match next {
                    Some(Ok(line)) => self.handle(line),
                    Some(Err(e)) => {
                        warn!(error = %e, "read error");
                        return Err(e.into());
                    }
                    None => {
                        info!("connection closed by peer");
                        return Ok(());
                    }
                }
            }
        }
    }

    async fn handshake(&self) -> Result<(), ClientError> {
        {
            let mut state = self.state.lock();
            state.nickname = Some(self.nick.clone());
            state.is_away = Some(false);
        }
        self.send(Message::user("a", "b", "c", "d")).await?;
        self.send(Message::nick(&self.nick)).await?;
        info!(nick = %self.nick, "registered");
        Ok(())
    }

    fn handle(&self, line: Line) {
        let (source, message) = line.into_parts();
        let own = self.nickname();
        let own = own.as_deref();
        let from_self = own.is_some() && source.nick() == own;

        match (message.command(), message.args()) {
            ("nick", [new]) if from_self => {
                info!(old = ?own, new = %new, "nickname changed");
                self.state.lock().nickname = Some(new.clone());
            }
            ("privmsg", [_target, _text]) if from_self => {
                debug!("activity");
                self.activity.trigger();
            }
            ("305", [who, _text]) if own == Some(who.as_str()) => self.acknowledge_away(false),
            ("306", [who, _text]) if own == Some(who.as_str()) => self.acknowledge_away(true),
            (PARSE_FAILED, _) => {
                warn!(line = ?message.arg(0).unwrap_or_default(), "failed to parse line");
            }
            _ => {}
        }
    }

    fn acknowledge_away(&self, away: bool) {
        self.state.lock().is_away = Some(away);
        info!(away, "away status acknowledged");
        self.away_changed.trigger();
    }

    /// Ask the proxy to change the away status and wait for its reply.
    ///
    /// Does nothing if the status is already `wanted`.
    pub async fn set_away(&self, wanted: bool) -> Result<(), ClientError> {
        if self.is_away() == Some(wanted) {
            return Ok(());
        }

        let ack = self.away_changed.listen();
        if self.is_closed() {
            return Err(ClientError::Disconnected);
        }
        self.send(Message::away(wanted)).await?;
        ack.wait(None).await;

        let state = self.state.lock();
        match state.is_away {
            Some(actual) if actual == wanted => Ok(()),
            _ if state.closed => Err(ClientError::Disconnected),
            actual => Err(ClientError::AwayMismatch { wanted, actual }),
        }
    }

    /// Stop the receive loop.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Flush and close the write half of the connection.
    pub async fn close(&self) {
        if let Err(e) = self.writer.lock().await.close().await {
            debug!(error = %e, "error closing connection");
        }
    }

    async fn send(&self, message: Message) -> Result<(), ClientError> {
        debug!(line = %message.to_string().trim_end(), "send");
        self.writer.lock().await.send(message).await?;
        Ok(())
    }
}

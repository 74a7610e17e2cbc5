//! Fake IRC proxy.
//!
//! Speaks just enough IRC to stand in for a bouncer: records every line it
//! receives, answers `AWAY` with 305/306, and can inject lines as if the
//! user had typed them.

use std::sync::Arc;
use std::time::Duration;

use awayd::control::Control;
use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// How the proxy answers `AWAY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(dead_code)]
pub enum AckMode {
    /// 306 for `AWAY :text`, 305 for bare `AWAY`.
    Correct,
    /// The opposite reply.
    Inverted,
    /// No reply at all.
    Silent,
}

pub struct FakeProxy {
    nick: String,
    received: Arc<Mutex<Vec<String>>>,
    inject: mpsc::UnboundedSender<String>,
    task: JoinHandle<()>,
}

#[allow(dead_code)]
impl FakeProxy {
    /// Serve the proxy side of `stream`.
    pub fn spawn(stream: DuplexStream, nick: &str, mode: AckMode) -> Self {
        let received = Arc::new(Mutex::new(Vec::new()));
        let (inject, mut outgoing) = mpsc::unbounded_channel::<String>();
        let (reader, mut writer) = tokio::io::split(stream);
        let nick_owned = nick.to_string();

        let task = tokio::spawn({
            let received = received.clone();
            async move {
                let mut lines = BufReader::new(reader).lines();
                loop {
                    tokio::select! {
                        line = lines.next_line() => {
                            let Ok(Some(line)) = line else { break };
                            let reply = ack(&line, &nick_owned, mode);
                            received.lock().push(line);
                            if let Some(reply) = reply {
                                if writer.write_all(reply.as_bytes()).await.is_err() {
                                    break;
                                }
                            }
                        }
                        Some(line) = outgoing.recv() => {
                            if writer.write_all(line.as_bytes()).await.is_err() {
                                break;
                            }
                        }
                    }
                }
            }
        });

        Self {
            nick: nick.to_string(),
            received,
            inject,
            task,
        }
    }

    /// Connect a new client named `id` to `control` through a fake proxy.
    pub fn attach(control: &Arc<Control>, id: &str, mode: AckMode) -> Self {
        let (ours, theirs) = tokio::io::duplex(4096);
        let nick = control.nick().to_string();
        let control = control.clone();
        let id = id.to_string();
        tokio::spawn(async move {
            let _ = control.serve(id, ours).await;
        });
        Self::spawn(theirs, &nick, mode)
    }

    /// Every line received so far, without terminators.
    pub fn received(&self) -> Vec<String> {
        self.received.lock().clone()
    }

    /// Received `AWAY` commands.
    pub fn away_requests(&self) -> Vec<String> {
        self.received()
            .into_iter()
            .filter(|line| line.starts_with("AWAY"))
            .collect()
    }

    /// Send a raw line to the client.
    pub fn send_raw(&self, line: &str) {
        let _ = self.inject.send(format!("{line}\r\n"));
    }

    /// Echo a message as sent by the user.
    pub fn say(&self, text: &str) {
        self.send_raw(&format!(
            ":{nick}!~{nick}@localhost PRIVMSG #test :{text}",
            nick = self.nick
        ));
    }

    /// Wait until the client has registered.
    pub async fn registered(&self) {
        for _ in 0..1000 {
            if self.received().iter().any(|line| line.starts_with("NICK")) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        panic!("client never registered, got {:?}", self.received());
    }

    /// Drop the connection.
    pub async fn hang_up(self) {
        self.task.abort();
        let _ = self.task.await;
    }
}

fn ack(line: &str, nick: &str, mode: AckMode) -> Option<String> {
    let away = match line {
        "AWAY" => false,
        _ if line.starts_with("AWAY ") => true,
        _ => return None,
    };
    let away = match mode {
        AckMode::Correct => away,
        AckMode::Inverted => !away,
        AckMode::Silent => return None,
    };
    Some(if away {
        format!(":irc.proxy 306 {nick} :You have been marked as being away\r\n")
    } else {
        format!(":irc.proxy 305 {nick} :You are no longer marked as being away\r\n")
    })
}

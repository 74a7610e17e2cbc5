//! The set of live clients and away-status fan-out.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::future::join_all;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{Instrument, debug, error, info, warn};

use crate::client::{Client, ClientError};
use crate::idle::AwayStatus;
use crate::interrupt::Interrupt;
use crate::telemetry::spans;

/// Live clients keyed by connection id, plus the activity interrupt they
/// all share.
pub struct Control {
    clients: DashMap<String, Arc<Client>>,
    activity: Arc<Interrupt>,
    nick: String,
}

impl Control {
    /// `nick` is registered on every new connection.
    pub fn new(nick: impl Into<String>) -> Self {
        Self {
            clients: DashMap::new(),
            activity: Arc::new(Interrupt::new()),
            nick: nick.into(),
        }
    }

    /// Nickname registered on new connections.
    pub fn nick(&self) -> &str {
        &self.nick
    }

    /// The interrupt fired whenever any client sees activity.
    pub fn activity(&self) -> Arc<Interrupt> {
        self.activity.clone()
    }

    pub fn register(&self, client: Arc<Client>) {
        let id = client.id().to_string();
        if let Some(previous) = self.clients.insert(id, client) {
            warn!(id = %previous.id(), "replacing client with the same id");
            previous.shutdown();
        }
    }

    pub fn unregister(&self, id: &str) -> Option<Arc<Client>> {
        self.clients.remove(id).map(|(_, client)| client)
    }

    pub fn get(&self, id: &str) -> Option<Arc<Client>> {
        self.clients.get(id).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Run a client over `stream` until it ends.
    ///
    /// The client is registered for the duration and always removed and
    /// closed afterwards.
    pub async fn serve<S>(&self, id: impl Into<String>, stream: S) -> Result<(), ClientError>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let id = id.into();
        let span = spans::client(&id);
        let (reader, writer) = tokio::io::split(stream);
        let client = Arc::new(Client::new(
            id.clone(),
            self.nick.clone(),
            self.activity.clone(),
            writer,
        ));

        self.register(client.clone());
        info!(parent: &span, "connected");

        let result = client.communicate(reader).instrument(span.clone()).await;

        // Only remove our own entry; a replacement may have taken the id
        self.clients.remove_if(&id, |_, current| Arc::ptr_eq(current, &client));
        client.close().await;

        match &result {
            Ok(()) => info!(parent: &span, "disconnected"),
            Err(e) => warn!(parent: &span, error = %e, "disconnected with error"),
        }
        result
    }

    /// Set the away status on every live client concurrently.
    ///
    /// Each client's outcome is reported separately; one failing does not
    /// affect the others. A client whose acknowledgment contradicts the
    /// request is shut down.
    pub async fn set_away(&self, wanted: bool) -> Vec<(String, Result<(), ClientError>)> {
        let clients: Vec<Arc<Client>> = self
            .clients
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        info!(away = wanted, clients = clients.len(), "setting away status");

        let results = join_all(clients.iter().map(|client| {
            let span = spans::client(client.id());
            client.set_away(wanted).instrument(span)
        }))
        .await;

        clients
            .into_iter()
            .zip(results)
            .map(|(client, result)| {
                match &result {
                    Ok(()) => debug!(id = %client.id(), away = wanted, "away status set"),
                    Err(e @ ClientError::AwayMismatch { .. }) => {
                        error!(id = %client.id(), error = %e, "shutting down client");
                        client.shutdown();
                    }
                    Err(e) => warn!(id = %client.id(), error = %e, "failed to set away status"),
                }
                (client.id().to_string(), result)
            })
            .collect()
    }

    /// Stop every client's receive loop.
    pub fn shutdown(&self) {
        for entry in self.clients.iter() {
            entry.value().shutdown();
        }
    }
}

#[async_trait]
impl AwayStatus for Control {
    async fn set_away(&self, away: bool) {
        Control::set_away(self, away).await;
    }
}

use rasmus_protocol::{Connector, StoreConnection};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Sleep;
use tracing::{error, info, warn};

#[derive(Debug, Clone)]
pub struct TransportSettings {
    /// Pause before retrying after any store failure
    pub backoff: Duration,
    pub io_timeout: Duration,
    /// Upper bound on a blocking pop
    pub poll_wait: Duration,
    /// Sent with `AUTH` right after connecting
    pub password: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

/// One store connection with reconnect-on-failure.
///
/// The worker keeps two of these, one for consuming requests and one for
/// publishing responses, each owned by a single task.
pub struct Transport<C: Connector> {
    name: &'static str,
    connector: Arc<C>,
    settings: TransportSettings,
    connection: Option<C::Connection>,
}

impl<C: Connector> Transport<C> {
    pub fn new(name: &'static str, connector: Arc<C>, settings: TransportSettings) -> Self {
        Transport {
            name,
            connector,
            settings,
            connection: None,
        }
    }

    pub fn settings(&self) -> &TransportSettings {
        &self.settings
    }

    pub fn state(&self) -> ConnectionState {
        match self.connection {
            Some(_) => ConnectionState::Connected,
            None => ConnectionState::Disconnected,
        }
    }

    /// Returns the live connection, dialing until one is established.
    ///
    /// Never fails: without the store the worker has nothing to do, so
    /// this keeps retrying every backoff interval.
    pub async fn ensure_connected(&mut self) -> &mut C::Connection {
        let connection = match self.connection.take() {
            Some(connection) => connection,
            None => self.dial().await,
        };
        self.connection.insert(connection)
    }

    /// Drop the current connection so the next use reconnects
    pub fn invalidate(&mut self) {
        if self.connection.take().is_some() {
            warn!(transport = self.name, "Dropped store connection");
        }
    }

    pub fn backoff(&self) -> Sleep {
        tokio::time::sleep(self.settings.backoff)
    }

    /// Invalidate and wait out the backoff interval
    pub async fn fail(&mut self) {
        self.invalidate();
        self.backoff().await;
    }

    async fn dial(&mut self) -> C::Connection {
        loop {
            match self.connector.connect().await {
                Ok(mut connection) => {
                    info!(
                        transport = self.name,
                        addr = self.connector.address(),
                        "Connected to store"
                    );

                    if let Some(password) = &self.settings.password {
                        if let Err(e) = connection.auth(password).await {
                            error!(transport = self.name, "Error during AUTH: {}", e);
                        }
                    }
                    return connection;
                }
                Err(e) => {
                    error!(
                        transport = self.name,
                        addr = self.connector.address(),
                        "Error connecting to store: {}",
                        e
                    );
                    self.backoff().await;
                }
            }
        }
    }
}

//! Controller-side access to a rasmus worker: enqueue requests and collect
//! the correlated responses from the shared store.

use rasmus_core::{CoreError, DeliveryScheme, Destination, KeySpace, Request, Response};
use rasmus_protocol::{ProtocolError, RespConnection, StoreConnection};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

/// Pause between `HGET` polls in hash delivery mode
const HASH_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Connection error: {0}")]
    Connection(#[source] ProtocolError),

    #[error("Store error: {0}")]
    Store(#[from] ProtocolError),

    #[error("Payload error: {0}")]
    Payload(#[from] CoreError),

    #[error("Timed out waiting for response {0}")]
    Timeout(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;

pub struct RasmusClient<S = RespConnection> {
    connection: S,
    keys: KeySpace,
    delivery: DeliveryScheme,
}

impl RasmusClient<RespConnection> {
    pub async fn connect(
        address: &str,
        password: Option<&str>,
        keys: KeySpace,
        delivery: DeliveryScheme,
        io_timeout: Duration,
    ) -> Result<Self> {
        let mut connection = RespConnection::connect(address, io_timeout)
            .await
            .map_err(ClientError::Connection)?;

        if let Some(password) = password {
            connection.auth(password).await.map_err(ClientError::Connection)?;
        }

        Ok(RasmusClient::with_connection(connection, keys, delivery))
    }
}

impl<S: StoreConnection> RasmusClient<S> {
    pub fn with_connection(connection: S, keys: KeySpace, delivery: DeliveryScheme) -> Self {
        RasmusClient {
            connection,
            keys,
            delivery,
        }
    }

    /// Enqueue a request, assigning a fresh id when it has none
    pub async fn submit(&mut self, mut request: Request) -> Result<String> {
        if request.id.is_empty() {
            request.id = Uuid::new_v4().to_string();
        }

        let payload = request.encode()?;
        let key = self.keys.request_key();
        self.connection.lpush(&key, &payload).await?;

        debug!(id = %request.id, key = %key, "Submitted request");
        Ok(request.id)
    }

    /// Wait up to `timeout` for the response to `id`
    pub async fn wait_for_response(&mut self, id: &str, timeout: Duration) -> Result<Option<Response>> {
        let payload = match self.keys.destination(self.delivery, id) {
            Destination::List { key } => self.connection.brpop(&key, timeout).await?,
            Destination::HashField { key, field } => self.poll_hash(&key, &field, timeout).await?,
        };

        match payload {
            Some(payload) => Ok(Some(Response::decode(&payload)?.with_correlation_id(id))),
            None => Ok(None),
        }
    }

    /// Submit and wait in one step
    pub async fn call(&mut self, request: Request, timeout: Duration) -> Result<Response> {
        let id = self.submit(request).await?;
        self.wait_for_response(&id, timeout)
            .await?
            .ok_or(ClientError::Timeout(id))
    }

    async fn poll_hash(&mut self, key: &str, field: &str, timeout: Duration) -> Result<Option<Vec<u8>>> {
        let deadline = Instant::now() + timeout;

        loop {
            if let Some(payload) = self.connection.hget(key, field).await? {
                // Hash fields never expire, so collected responses are removed here
                self.connection.hdel(key, field).await?;
                return Ok(Some(payload));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(HASH_POLL_INTERVAL).await;
        }
    }
}

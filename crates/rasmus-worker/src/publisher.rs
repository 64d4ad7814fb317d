use crate::transport::Transport;
use rasmus_core::{DeliveryScheme, Destination, KeySpace, Response};
use rasmus_protocol::{Connector, StoreConnection};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Producer side of the bounded response channel
#[derive(Clone)]
pub struct ResponseQueue {
    sender: mpsc::Sender<Response>,
}

impl ResponseQueue {
    /// Enqueue a finished response, waiting while the queue is full
    pub async fn push(&self, response: Response) {
        let id = response.correlation_id.clone();
        if self.sender.send(response).await.is_err() {
            error!(id = %id, "Response publisher is gone, dropping response");
        }
    }

    /// Slots currently free
    pub fn available(&self) -> usize {
        self.sender.capacity()
    }
}

/// Drains completed responses one at a time and writes each to the store,
/// retrying the same response until it lands.
pub struct Publisher<C: Connector> {
    transport: Transport<C>,
    responses: mpsc::Receiver<Response>,
    keys: KeySpace,
    delivery: DeliveryScheme,
    ttl: Duration,
}

impl<C: Connector> Publisher<C> {
    pub fn new(
        transport: Transport<C>,
        keys: KeySpace,
        delivery: DeliveryScheme,
        ttl: Duration,
        capacity: usize,
    ) -> (Self, ResponseQueue) {
        let (sender, responses) = mpsc::channel(capacity.max(1));

        let publisher = Publisher {
            transport,
            responses,
            keys,
            delivery,
            ttl,
        };
        (publisher, ResponseQueue { sender })
    }

    /// Runs until every [`ResponseQueue`] handle is dropped
    pub async fn run(mut self) {
        info!(delivery = %self.delivery, "Response publisher listening");

        while let Some(response) = self.responses.recv().await {
            self.deliver(response).await;
        }

        info!("Response queue closed, publisher stopping");
    }

    pub async fn deliver(&mut self, response: Response) {
        let payload = match response.encode() {
            Ok(payload) => payload,
            Err(e) => {
                error!(id = %response.correlation_id, "Error marshalling response: {}", e);
                b"{}".to_vec()
            }
        };
        let destination = self.keys.destination(self.delivery, &response.correlation_id);

        loop {
            let connection = self.transport.ensure_connected().await;
            match push(connection, &destination, &payload).await {
                Ok(()) => break,
                Err(e) => {
                    error!(key = destination.key(), "Error publishing response: {}", e);
                    self.transport.fail().await;
                }
            }
        }

        debug!(id = %response.correlation_id, key = destination.key(), "Response delivered");

        if let Destination::List { key } = &destination {
            let connection = self.transport.ensure_connected().await;
            if let Err(e) = connection.expire(key, self.ttl).await {
                // The response is already stored; only the connection is suspect
                warn!(key = %key, "Error setting response expiry: {}", e);
                self.transport.invalidate();
            }
        }
    }
}

async fn push<S: StoreConnection>(
    connection: &mut S,
    destination: &Destination,
    payload: &[u8],
) -> rasmus_protocol::Result<()> {
    match destination {
        Destination::List { key } => connection.lpush(key, payload).await.map(|_| ()),
        Destination::HashField { key, field } => connection.hset(key, field, payload).await,
    }
}

use crate::config::WorkerConfig;
use crate::dispatcher::Dispatcher;
use crate::publisher::Publisher;
use crate::transport::{Transport, TransportSettings};
use rasmus_core::{DeliveryScheme, KeySpace};
use rasmus_protocol::{Connector, TcpConnector};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Wires a dispatcher and a publisher around two independent connections
pub struct Worker<C: Connector> {
    connector: Arc<C>,
    settings: TransportSettings,
    keys: KeySpace,
    delivery: DeliveryScheme,
    response_ttl: Duration,
    response_capacity: usize,
}

impl Worker<TcpConnector> {
    pub fn from_config(config: &WorkerConfig) -> Self {
        let settings = config.transport_settings();
        let connector = TcpConnector::new(config.store_address.clone(), settings.io_timeout);
        Worker::new(Arc::new(connector), config)
    }
}

impl<C> Worker<C>
where
    C: Connector + 'static,
{
    pub fn new(connector: Arc<C>, config: &WorkerConfig) -> Self {
        Worker {
            connector,
            settings: config.transport_settings(),
            keys: config.key_space(),
            delivery: config.delivery,
            response_ttl: config.response_ttl(),
            response_capacity: config.response_capacity,
        }
    }

    pub fn with_settings(mut self, settings: TransportSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Runs forever; in-flight requests are abandoned when the future is dropped
    pub async fn run(self) {
        info!(
            addr = self.connector.address(),
            namespace = self.keys.namespace().unwrap_or(""),
            delivery = %self.delivery,
            "Starting worker"
        );

        let output = Transport::new("output", self.connector.clone(), self.settings.clone());
        let (publisher, responses) = Publisher::new(
            output,
            self.keys.clone(),
            self.delivery,
            self.response_ttl,
            self.response_capacity,
        );
        tokio::spawn(publisher.run());

        let input = Transport::new("input", self.connector, self.settings);
        let dispatcher = Dispatcher::new(input, self.keys.request_key(), responses);
        dispatcher.run().await;
    }
}

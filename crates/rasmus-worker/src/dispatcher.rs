use crate::executor::CommandExecutor;
use crate::publisher::ResponseQueue;
use crate::transport::Transport;
use rasmus_core::Request;
use rasmus_protocol::{Connector, StoreConnection};
use tracing::{error, warn};

/// What a single pass of the consumer loop did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The pop timed out with nothing queued
    Idle,
    /// A request was decoded and handed to an executor task
    Dispatched,
    /// A payload could not be decoded and was dropped
    Malformed,
    /// The store connection failed and was reset
    TransportError,
}

/// Consumer loop: pops requests and runs each one on its own task.
///
/// Fan-out is unbounded; the only brake is the response queue, which
/// finished executors block on when it is full.
pub struct Dispatcher<C: Connector> {
    transport: Transport<C>,
    request_key: String,
    executor: CommandExecutor,
    responses: ResponseQueue,
}

impl<C: Connector> Dispatcher<C> {
    pub fn new(transport: Transport<C>, request_key: String, responses: ResponseQueue) -> Self {
        Dispatcher {
            transport,
            request_key,
            executor: CommandExecutor::new(),
            responses,
        }
    }

    pub async fn run(mut self) {
        loop {
            self.poll_once().await;
        }
    }

    pub async fn poll_once(&mut self) -> PollOutcome {
        let wait = self.transport.settings().poll_wait;
        let connection = self.transport.ensure_connected().await;

        match connection.brpop(&self.request_key, wait).await {
            Ok(None) => PollOutcome::Idle,
            Ok(Some(payload)) => match Request::decode(&payload) {
                Ok(request) => {
                    self.dispatch(request);
                    PollOutcome::Dispatched
                }
                Err(e) => {
                    // No trustworthy id to reply to, so nothing is sent back
                    warn!(key = %self.request_key, "Error unmarshalling request: {}", e);
                    PollOutcome::Malformed
                }
            },
            Err(e) => {
                error!(key = %self.request_key, "Error in BRPOP: {}", e);
                self.transport.fail().await;
                PollOutcome::TransportError
            }
        }
    }

    fn dispatch(&self, request: Request) {
        let executor = self.executor;
        let responses = self.responses.clone();

        tokio::spawn(async move {
            let response = executor.handle(request).await;
            responses.push(response).await;
        });
    }
}

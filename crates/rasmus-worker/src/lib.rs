pub mod config;
pub mod dispatcher;
pub mod executor;
pub mod mode;
pub mod publisher;
pub mod transport;
pub mod worker;

pub use config::WorkerConfig;
pub use dispatcher::{Dispatcher, PollOutcome};
pub use executor::CommandExecutor;
pub use publisher::{Publisher, ResponseQueue};
pub use transport::{ConnectionState, Transport, TransportSettings};
pub use worker::Worker;

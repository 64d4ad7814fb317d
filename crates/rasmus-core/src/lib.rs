mod error;
mod keys;
mod request;
mod response;

pub use error::{CoreError, Result};
pub use keys::{DeliveryScheme, Destination, KeySpace, APP_PREFIX, RESPONSE_HASH};
pub use request::{Command, Request};
pub use response::Response;

/// Seconds a namespaced response list lives once written
pub const DEFAULT_RESPONSE_TTL_SECS: u64 = 600;

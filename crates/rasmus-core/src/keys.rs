use crate::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const APP_PREFIX: &str = "rasmus";

/// Hash holding every response in [`DeliveryScheme::Hash`] mode
pub const RESPONSE_HASH: &str = "rasmus-resp";

/// How responses are written back to the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryScheme {
    /// `LPUSH <ns:>rasmus:resp:<id>` followed by an expiry
    #[default]
    Namespaced,
    /// `HSET rasmus-resp <id>` with no expiry
    Hash,
}

impl DeliveryScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryScheme::Namespaced => "namespaced",
            DeliveryScheme::Hash => "hash",
        }
    }
}

impl fmt::Display for DeliveryScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryScheme {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "namespaced" => Ok(DeliveryScheme::Namespaced),
            "hash" => Ok(DeliveryScheme::Hash),
            other => Err(CoreError::UnknownDeliveryScheme(other.to_string())),
        }
    }
}

/// Where a response is written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    List { key: String },
    HashField { key: String, field: String },
}

impl Destination {
    pub fn key(&self) -> &str {
        match self {
            Destination::List { key } | Destination::HashField { key, .. } => key,
        }
    }
}

/// Builds store keys, optionally prefixed with a namespace
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySpace {
    namespace: Option<String>,
}

impl KeySpace {
    pub fn new(namespace: Option<String>) -> Self {
        KeySpace {
            namespace: namespace.filter(|ns| !ns.is_empty()),
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn key(&self, suffix: &str) -> String {
        match &self.namespace {
            Some(ns) => format!("{}:{}:{}", ns, APP_PREFIX, suffix),
            None => format!("{}:{}", APP_PREFIX, suffix),
        }
    }

    pub fn request_key(&self) -> String {
        self.key("req")
    }

    pub fn response_key(&self, id: &str) -> String {
        self.key(&format!("resp:{}", id))
    }

    pub fn destination(&self, scheme: DeliveryScheme, id: &str) -> Destination {
        match scheme {
            DeliveryScheme::Namespaced => Destination::List {
                key: self.response_key(id),
            },
            DeliveryScheme::Hash => Destination::HashField {
                key: RESPONSE_HASH.to_string(),
                field: id.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_without_namespace() {
        let keys = KeySpace::new(None);
        assert_eq!(keys.request_key(), "rasmus:req");
        assert_eq!(keys.response_key("a1"), "rasmus:resp:a1");
    }

    #[test]
    fn test_keys_with_namespace() {
        let keys = KeySpace::new(Some("prod".to_string()));
        assert_eq!(keys.request_key(), "prod:rasmus:req");
        assert_eq!(keys.response_key("a1"), "prod:rasmus:resp:a1");
    }

    #[test]
    fn test_empty_namespace_is_ignored() {
        let keys = KeySpace::new(Some(String::new()));
        assert_eq!(keys.namespace(), None);
        assert_eq!(keys.request_key(), "rasmus:req");
    }

    #[test]
    fn test_destination_per_scheme() {
        let keys = KeySpace::new(Some("ns".to_string()));

        assert_eq!(
            keys.destination(DeliveryScheme::Namespaced, "a1"),
            Destination::List { key: "ns:rasmus:resp:a1".to_string() }
        );
        assert_eq!(
            keys.destination(DeliveryScheme::Hash, "a1"),
            Destination::HashField {
                key: "rasmus-resp".to_string(),
                field: "a1".to_string(),
            }
        );
    }

    #[test]
    fn test_scheme_parsing() {
        assert_eq!("hash".parse::<DeliveryScheme>().unwrap(), DeliveryScheme::Hash);
        assert_eq!("namespaced".parse::<DeliveryScheme>().unwrap(), DeliveryScheme::Namespaced);
        assert!("flat".parse::<DeliveryScheme>().is_err());
    }
}

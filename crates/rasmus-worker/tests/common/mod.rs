// In-memory store shared by the worker integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::{Mutex, MutexGuard};
use rasmus_core::Response;
use rasmus_protocol::{Connector, ProtocolError, Result, StoreConnection};
use rasmus_worker::TransportSettings;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
pub struct StoreState {
    pub lists: HashMap<String, VecDeque<Vec<u8>>>,
    pub hashes: HashMap<String, HashMap<String, Vec<u8>>>,
    pub expiries: HashMap<String, Duration>,
    /// Every command that reached the store, in order
    pub log: Vec<String>,
    pub connects: usize,
    pub auths: Vec<String>,
    pub reject_auth: bool,
    refuse_connects: usize,
    fail_commands: usize,
    fail_named: Vec<&'static str>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock()
    }

    pub fn connector(&self) -> Arc<MemoryConnector> {
        Arc::new(MemoryConnector { store: self.clone() })
    }

    /// Queue a raw request payload the way a controller would
    pub fn push_request(&self, key: &str, payload: &[u8]) {
        self.state()
            .lists
            .entry(key.to_string())
            .or_default()
            .push_front(payload.to_vec());
    }

    pub fn refuse_next_connects(&self, count: usize) {
        self.state().refuse_connects = count;
    }

    pub fn fail_next_commands(&self, count: usize) {
        self.state().fail_commands = count;
    }

    /// Fail the next occurrence of a specific command
    pub fn fail_next(&self, command: &'static str) {
        self.state().fail_named.push(command);
    }

    pub fn list(&self, key: &str) -> Vec<Vec<u8>> {
        self.state()
            .lists
            .get(key)
            .map(|list| list.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn responses(&self, key: &str) -> Vec<Response> {
        self.list(key)
            .iter()
            .map(|payload| Response::decode(payload).unwrap())
            .collect()
    }

    pub fn hash_field(&self, key: &str, field: &str) -> Option<Vec<u8>> {
        self.state().hashes.get(key).and_then(|h| h.get(field).cloned())
    }

    pub fn commands(&self, name: &str) -> usize {
        self.state().log.iter().filter(|c| c.starts_with(name)).count()
    }

    fn check(&self, command: &'static str, key: &str) -> Result<()> {
        let mut state = self.state();

        if state.fail_commands > 0 {
            state.fail_commands -= 1;
            return Err(ProtocolError::ConnectionClosed);
        }
        if let Some(pos) = state.fail_named.iter().position(|c| *c == command) {
            state.fail_named.remove(pos);
            return Err(ProtocolError::ConnectionClosed);
        }

        state.log.push(format!("{} {}", command, key));
        Ok(())
    }
}

pub struct MemoryConnector {
    store: MemoryStore,
}

#[async_trait]
impl Connector for MemoryConnector {
    type Connection = MemoryConnection;

    async fn connect(&self) -> Result<MemoryConnection> {
        let mut state = self.store.state();
        if state.refuse_connects > 0 {
            state.refuse_connects -= 1;
            return Err(ProtocolError::IoError(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "connection refused",
            )));
        }
        state.connects += 1;

        Ok(MemoryConnection {
            store: self.store.clone(),
        })
    }

    fn address(&self) -> &str {
        "memory"
    }
}

pub struct MemoryConnection {
    store: MemoryStore,
}

#[async_trait]
impl StoreConnection for MemoryConnection {
    async fn auth(&mut self, password: &str) -> Result<()> {
        let mut state = self.store.state();
        state.auths.push(password.to_string());
        if state.reject_auth {
            return Err(ProtocolError::Server("WRONGPASS invalid password".to_string()));
        }
        Ok(())
    }

    async fn brpop(&mut self, key: &str, wait: Duration) -> Result<Option<Vec<u8>>> {
        self.store.check("BRPOP", key)?;

        let popped = {
            let mut state = self.store.state();
            state.lists.get_mut(key).and_then(|list| list.pop_back())
        };

        if popped.is_none() {
            tokio::time::sleep(wait.min(Duration::from_millis(10))).await;
        }
        Ok(popped)
    }

    async fn lpush(&mut self, key: &str, value: &[u8]) -> Result<i64> {
        self.store.check("LPUSH", key)?;

        let mut state = self.store.state();
        let list = state.lists.entry(key.to_string()).or_default();
        list.push_front(value.to_vec());
        Ok(list.len() as i64)
    }

    async fn expire(&mut self, key: &str, ttl: Duration) -> Result<bool> {
        self.store.check("EXPIRE", key)?;

        let mut state = self.store.state();
        let exists = state.lists.contains_key(key) || state.hashes.contains_key(key);
        if exists {
            state.expiries.insert(key.to_string(), ttl);
        }
        Ok(exists)
    }

    async fn hset(&mut self, key: &str, field: &str, value: &[u8]) -> Result<()> {
        self.store.check("HSET", key)?;

        self.store
            .state()
            .hashes
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value.to_vec());
        Ok(())
    }

    async fn hget(&mut self, key: &str, field: &str) -> Result<Option<Vec<u8>>> {
        self.store.check("HGET", key)?;
        Ok(self.store.hash_field(key, field))
    }

    async fn hdel(&mut self, key: &str, field: &str) -> Result<()> {
        self.store.check("HDEL", key)?;

        if let Some(hash) = self.store.state().hashes.get_mut(key) {
            hash.remove(field);
        }
        Ok(())
    }
}

pub fn fast_settings() -> TransportSettings {
    TransportSettings {
        backoff: Duration::from_millis(5),
        io_timeout: Duration::from_secs(1),
        poll_wait: Duration::from_millis(20),
        password: None,
    }
}

/// Poll `check` until it holds, failing the test after a few seconds
pub async fn eventually<F>(what: &str, mut check: F)
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !check() {
        if tokio::time::Instant::now() > deadline {
            panic!("timed out waiting for {}", what);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

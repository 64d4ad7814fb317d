use crate::{Frame, ProtocolError, RespCodec, Result};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::codec::Framed;
use tracing::debug;

/// The store commands the worker and client rely on.
///
/// Any error leaves the connection in an unknown state; callers are expected
/// to drop it and connect again.
#[async_trait]
pub trait StoreConnection: Send {
    async fn auth(&mut self, password: &str) -> Result<()>;

    /// Blocking right-pop. Returns `Ok(None)` when `wait` elapses with the
    /// list still empty.
    async fn brpop(&mut self, key: &str, wait: Duration) -> Result<Option<Vec<u8>>>;

    /// Left-push, returning the new list length
    async fn lpush(&mut self, key: &str, value: &[u8]) -> Result<i64>;

    /// Returns false when the key does not exist
    async fn expire(&mut self, key: &str, ttl: Duration) -> Result<bool>;

    async fn hset(&mut self, key: &str, field: &str, value: &[u8]) -> Result<()>;

    async fn hget(&mut self, key: &str, field: &str) -> Result<Option<Vec<u8>>>;

    async fn hdel(&mut self, key: &str, field: &str) -> Result<()>;
}

/// Opens fresh store connections
#[async_trait]
pub trait Connector: Send + Sync {
    type Connection: StoreConnection + 'static;

    async fn connect(&self) -> Result<Self::Connection>;

    /// Human-readable target, used in log lines
    fn address(&self) -> &str;
}

/// Connects to a RESP server over TCP
#[derive(Debug, Clone)]
pub struct TcpConnector {
    address: String,
    io_timeout: Duration,
}

impl TcpConnector {
    pub fn new(address: impl Into<String>, io_timeout: Duration) -> Self {
        TcpConnector {
            address: address.into(),
            io_timeout,
        }
    }
}

#[async_trait]
impl Connector for TcpConnector {
    type Connection = RespConnection;

    async fn connect(&self) -> Result<RespConnection> {
        RespConnection::connect(&self.address, self.io_timeout).await
    }

    fn address(&self) -> &str {
        &self.address
    }
}

/// A single RESP connection; one request in flight at a time
pub struct RespConnection {
    framed: Framed<TcpStream, RespCodec>,
    io_timeout: Duration,
}

impl RespConnection {
    pub async fn connect(address: &str, io_timeout: Duration) -> Result<Self> {
        let stream = timeout(io_timeout, TcpStream::connect(address))
            .await
            .map_err(|_| ProtocolError::Timeout(io_timeout))??;
        stream.set_nodelay(true)?;

        debug!(addr = address, "Opened store connection");

        Ok(RespConnection {
            framed: Framed::new(stream, RespCodec),
            io_timeout,
        })
    }

    /// Send one command and wait for its reply
    pub async fn call(&mut self, command: Frame) -> Result<Frame> {
        self.call_within(command, self.io_timeout).await
    }

    async fn call_within(&mut self, command: Frame, limit: Duration) -> Result<Frame> {
        let exchange = async {
            self.framed.send(command).await?;
            match self.framed.next().await {
                Some(Ok(Frame::Error(message))) => Err(ProtocolError::Server(message)),
                Some(Ok(frame)) => Ok(frame),
                Some(Err(e)) => Err(e),
                None => Err(ProtocolError::ConnectionClosed),
            }
        };

        timeout(limit, exchange)
            .await
            .map_err(|_| ProtocolError::Timeout(limit))?
    }
}

fn unexpected(command: &str, frame: Frame) -> ProtocolError {
    ProtocolError::UnexpectedResponse {
        command: command.to_string(),
        frame,
    }
}

#[async_trait]
impl StoreConnection for RespConnection {
    async fn auth(&mut self, password: &str) -> Result<()> {
        match self.call(Frame::command(["AUTH", password])).await? {
            Frame::Simple(_) => Ok(()),
            other => Err(unexpected("AUTH", other)),
        }
    }

    async fn brpop(&mut self, key: &str, wait: Duration) -> Result<Option<Vec<u8>>> {
        // A zero timeout would block forever on the server side
        let wait_secs = wait.as_secs().max(1);
        let wait_arg = wait_secs.to_string();
        let command = Frame::command(["BRPOP", key, wait_arg.as_str()]);
        let limit = self.io_timeout + Duration::from_secs(wait_secs);

        match self.call_within(command, limit).await? {
            frame if frame.is_null() => Ok(None),
            Frame::Array(Some(mut items)) if items.len() == 2 => match items.pop() {
                Some(Frame::Bulk(Some(value))) => Ok(Some(value.to_vec())),
                Some(other) => Err(unexpected("BRPOP", other)),
                None => Ok(None),
            },
            other => Err(unexpected("BRPOP", other)),
        }
    }

    async fn lpush(&mut self, key: &str, value: &[u8]) -> Result<i64> {
        let command = Frame::command([b"LPUSH".as_slice(), key.as_bytes(), value]);
        match self.call(command).await? {
            Frame::Integer(len) => Ok(len),
            other => Err(unexpected("LPUSH", other)),
        }
    }

    async fn expire(&mut self, key: &str, ttl: Duration) -> Result<bool> {
        let ttl_arg = ttl.as_secs().to_string();
        let command = Frame::command(["EXPIRE", key, ttl_arg.as_str()]);
        match self.call(command).await? {
            Frame::Integer(set) => Ok(set == 1),
            other => Err(unexpected("EXPIRE", other)),
        }
    }

    async fn hset(&mut self, key: &str, field: &str, value: &[u8]) -> Result<()> {
        let command = Frame::command([b"HSET".as_slice(), key.as_bytes(), field.as_bytes(), value]);
        match self.call(command).await? {
            Frame::Integer(_) => Ok(()),
            other => Err(unexpected("HSET", other)),
        }
    }

    async fn hget(&mut self, key: &str, field: &str) -> Result<Option<Vec<u8>>> {
        match self.call(Frame::command(["HGET", key, field])).await? {
            Frame::Bulk(value) => Ok(value.map(|v| v.to_vec())),
            other => Err(unexpected("HGET", other)),
        }
    }

    async fn hdel(&mut self, key: &str, field: &str) -> Result<()> {
        match self.call(Frame::command(["HDEL", key, field])).await? {
            Frame::Integer(_) => Ok(()),
            other => Err(unexpected("HDEL", other)),
        }
    }
}

use crate::{CoreError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A job pulled off the request queue.
///
/// Field names follow the wire format (`Uuid`, `Command`, ...). Lower-case
/// spellings are accepted as well, and absent or `null` fields fall back to
/// their empty value. A payload carrying two spellings of the same field is
/// rejected as a duplicate rather than resolved to the last one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Correlation id used to address the response
    #[serde(rename = "Uuid", alias = "uuid", alias = "id", default, deserialize_with = "nullable")]
    pub id: String,

    #[serde(rename = "Command", alias = "command", default, deserialize_with = "nullable")]
    pub command: String,

    /// File path or executable name
    #[serde(rename = "Path", alias = "path", default, deserialize_with = "nullable")]
    pub path: String,

    /// Permission bits, only used by `write`
    #[serde(rename = "Mode", alias = "mode", default, deserialize_with = "nullable")]
    pub mode: u32,

    /// File contents for `write`, stdin for `execute`
    #[serde(rename = "Input", alias = "input", default, deserialize_with = "nullable")]
    pub input: String,

    /// Argument list for `execute`
    #[serde(rename = "Params", alias = "params", default, deserialize_with = "nullable")]
    pub params: Vec<String>,
}

fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Request {
    pub fn new(command: impl Into<String>, path: impl Into<String>) -> Self {
        Request {
            command: command.into(),
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_mode(mut self, mode: u32) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.input = input.into();
        self
    }

    pub fn with_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params = params.into_iter().map(Into::into).collect();
        self
    }

    /// Decode a request payload as popped from the queue
    pub fn decode(payload: &[u8]) -> Result<Self> {
        serde_json::from_slice(payload).map_err(CoreError::MalformedRequest)
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(CoreError::Encode)
    }

    pub fn command(&self) -> Command<'_> {
        Command::parse(&self.command)
    }
}

/// The operations a worker knows how to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    Read,
    Write,
    List,
    Execute,
    /// Anything else; answered with an error response
    Unknown(&'a str),
}

impl<'a> Command<'a> {
    pub fn parse(name: &'a str) -> Self {
        match name {
            "read" => Command::Read,
            "write" => Command::Write,
            "list" => Command::List,
            "execute" => Command::Execute,
            other => Command::Unknown(other),
        }
    }

    pub fn as_str(&self) -> &'a str {
        match self {
            Command::Read => "read",
            Command::Write => "write",
            Command::List => "list",
            Command::Execute => "execute",
            Command::Unknown(name) => name,
        }
    }
}

impl fmt::Display for Command<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

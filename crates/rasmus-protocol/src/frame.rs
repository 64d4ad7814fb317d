use bytes::Bytes;

/// A RESP2 value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Simple(String),
    Error(String),
    Integer(i64),
    /// `None` is the null bulk string (`$-1`)
    Bulk(Option<Bytes>),
    /// `None` is the null array (`*-1`)
    Array(Option<Vec<Frame>>),
}

impl Frame {
    /// Build a command: an array of bulk strings
    pub fn command<I, A>(parts: I) -> Frame
    where
        I: IntoIterator<Item = A>,
        A: AsRef<[u8]>,
    {
        Frame::Array(Some(
            parts
                .into_iter()
                .map(|part| Frame::Bulk(Some(Bytes::copy_from_slice(part.as_ref()))))
                .collect(),
        ))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Frame::Bulk(None) | Frame::Array(None))
    }

    /// Payload of a non-null bulk or simple string
    pub fn into_bytes(self) -> Option<Bytes> {
        match self {
            Frame::Bulk(Some(bytes)) => Some(bytes),
            Frame::Simple(s) => Some(Bytes::from(s)),
            _ => None,
        }
    }
}

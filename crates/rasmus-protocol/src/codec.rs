use crate::{Frame, ProtocolError, Result, MAX_BULK_SIZE};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// Codec for RESP2 frames
///
/// Decoding is all-or-nothing: the buffer is only consumed once a complete
/// frame (including nested array elements) is available.
pub struct RespCodec;

const CRLF: &[u8] = b"\r\n";

impl Decoder for RespCodec {
    type Item = Frame;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        match parse_frame(&src[..], 0)? {
            Some((frame, consumed)) => {
                src.advance(consumed);
                Ok(Some(frame))
            }
            None => Ok(None),
        }
    }
}

impl Encoder<Frame> for RespCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<()> {
        write_frame(&item, dst);
        Ok(())
    }
}

fn write_frame(frame: &Frame, dst: &mut BytesMut) {
    match frame {
        Frame::Simple(s) => write_line(dst, b'+', s.as_bytes()),
        Frame::Error(s) => write_line(dst, b'-', s.as_bytes()),
        Frame::Integer(n) => write_line(dst, b':', n.to_string().as_bytes()),
        Frame::Bulk(None) => write_line(dst, b'$', b"-1"),
        Frame::Bulk(Some(data)) => {
            write_line(dst, b'$', data.len().to_string().as_bytes());
            dst.reserve(data.len() + 2);
            dst.put_slice(data);
            dst.put_slice(CRLF);
        }
        Frame::Array(None) => write_line(dst, b'*', b"-1"),
        Frame::Array(Some(items)) => {
            write_line(dst, b'*', items.len().to_string().as_bytes());
            for item in items {
                write_frame(item, dst);
            }
        }
    }
}

fn write_line(dst: &mut BytesMut, tag: u8, body: &[u8]) {
    dst.reserve(body.len() + 3);
    dst.put_u8(tag);
    dst.put_slice(body);
    dst.put_slice(CRLF);
}

/// Parse one frame starting at `pos`, returning it with the position just past it
fn parse_frame(buf: &[u8], pos: usize) -> Result<Option<(Frame, usize)>> {
    let Some(&tag) = buf.get(pos) else {
        return Ok(None);
    };
    let Some((line, next)) = read_line(buf, pos + 1) else {
        return Ok(None);
    };

    match tag {
        b'+' => Ok(Some((Frame::Simple(utf8(line)?), next))),
        b'-' => Ok(Some((Frame::Error(utf8(line)?), next))),
        b':' => Ok(Some((Frame::Integer(parse_int(line)?), next))),
        b'$' => {
            let len = parse_int(line)?;
            if len < 0 {
                return Ok(Some((Frame::Bulk(None), next)));
            }
            let len = len as usize;
            if len > MAX_BULK_SIZE {
                return Err(ProtocolError::FrameTooLarge(len));
            }

            let end = next + len;
            if buf.len() < end + CRLF.len() {
                return Ok(None);
            }
            if &buf[end..end + CRLF.len()] != CRLF {
                return Err(ProtocolError::InvalidFrame(
                    "bulk string not terminated by CRLF".to_string(),
                ));
            }

            let data = Bytes::copy_from_slice(&buf[next..end]);
            Ok(Some((Frame::Bulk(Some(data)), end + CRLF.len())))
        }
        b'*' => {
            let len = parse_int(line)?;
            if len < 0 {
                return Ok(Some((Frame::Array(None), next)));
            }

            let mut items = Vec::with_capacity((len as usize).min(64));
            let mut cursor = next;
            for _ in 0..len {
                match parse_frame(buf, cursor)? {
                    Some((item, after)) => {
                        items.push(item);
                        cursor = after;
                    }
                    None => return Ok(None),
                }
            }
            Ok(Some((Frame::Array(Some(items)), cursor)))
        }
        other => Err(ProtocolError::InvalidFrameType(other)),
    }
}

fn read_line(buf: &[u8], start: usize) -> Option<(&[u8], usize)> {
    let rest = buf.get(start..)?;
    let offset = rest.windows(CRLF.len()).position(|w| w == CRLF)?;
    Some((&rest[..offset], start + offset + CRLF.len()))
}

fn utf8(line: &[u8]) -> Result<String> {
    String::from_utf8(line.to_vec())
        .map_err(|_| ProtocolError::InvalidFrame("line is not valid UTF-8".to_string()))
}

fn parse_int(line: &[u8]) -> Result<i64> {
    let text = utf8(line)?;
    text.parse()
        .map_err(|_| ProtocolError::InvalidFrame(format!("invalid integer {:?}", text)))
}

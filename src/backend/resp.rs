//! RESP2 Codec
//!
//! Frames requests as arrays of bulk strings and decodes the five RESP2 reply
//! types into [`Value`]. Used through `tokio_util::codec::Framed` so the
//! connection never handles partial reads itself.

use crate::error::Error;
use crate::routing::Value;

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// Upper bound on a single bulk string, same as the server default.
const MAX_BULK_LEN: i64 = 512 * 1024 * 1024;

/// Deepest array nesting accepted in a reply.
const MAX_DEPTH: usize = 512;

/// A request on the wire: command name followed by its arguments.
#[derive(Debug, Clone)]
pub struct Request {
    pub name: String,
    pub args: Vec<Value>,
}

#[derive(Debug, Default)]
pub struct RespCodec;

impl Encoder<Request> for RespCodec {
    type Error = Error;

    fn encode(&mut self, req: Request, dst: &mut BytesMut) -> Result<(), Self::Error> {
        write_header(dst, b'*', req.args.len() + 1);
        write_bulk(dst, req.name.as_bytes());
        for arg in &req.args {
            write_bulk(dst, &arg.to_arg_bytes());
        }
        Ok(())
    }
}

impl Decoder for RespCodec {
    type Item = Value;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match parse(src, 0, 0)? {
            Some((value, consumed)) => {
                src.advance(consumed);
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }
}

fn write_header(dst: &mut BytesMut, prefix: u8, len: usize) {
    dst.put_u8(prefix);
    dst.put_slice(len.to_string().as_bytes());
    dst.put_slice(b"\r\n");
}

fn write_bulk(dst: &mut BytesMut, data: &[u8]) {
    write_header(dst, b'$', data.len());
    dst.put_slice(data);
    dst.put_slice(b"\r\n");
}

/// Parses one value starting at `pos`, `depth` arrays deep. Returns the value
/// and the offset just past it, or `None` if `buf` does not hold a complete
/// value yet.
fn parse(buf: &[u8], pos: usize, depth: usize) -> Result<Option<(Value, usize)>, Error> {
    let Some((line, next)) = read_line(buf, pos) else {
        return Ok(None);
    };
    let Some((&prefix, body)) = line.split_first() else {
        return Err(Error::Protocol("empty reply line".to_string()));
    };

    match prefix {
        b'+' => Ok(Some((Value::Status(utf8(body)?), next))),
        b'-' => Ok(Some((Value::Error(utf8(body)?), next))),
        b':' => Ok(Some((Value::Int(number(body)?), next))),
        b'$' => {
            let len = number(body)?;
            if len < 0 {
                return Ok(Some((Value::Nil, next)));
            }
            if len > MAX_BULK_LEN {
                return Err(Error::Protocol(format!("bulk length {} too large", len)));
            }
            let end = next + len as usize;
            if buf.len() < end + 2 {
                return Ok(None);
            }
            if &buf[end..end + 2] != b"\r\n" {
                return Err(Error::Protocol("bulk string not terminated by CRLF".to_string()));
            }
            Ok(Some((Value::Bulk(buf[next..end].to_vec()), end + 2)))
        }
        b'*' => {
            let len = number(body)?;
            if len < 0 {
                return Ok(Some((Value::Nil, next)));
            }
            if depth >= MAX_DEPTH {
                return Err(Error::Protocol(format!("arrays nested deeper than {}", MAX_DEPTH)));
            }
            let mut items = Vec::with_capacity(len.min(1024) as usize);
            let mut cursor = next;
            for _ in 0..len {
                match parse(buf, cursor, depth + 1)? {
                    Some((item, after)) => {
                        items.push(item);
                        cursor = after;
                    }
                    None => return Ok(None),
                }
            }
            Ok(Some((Value::Array(items), cursor)))
        }
        other => Err(Error::Protocol(format!(
            "unknown reply type byte 0x{:02x}",
            other
        ))),
    }
}

fn read_line(buf: &[u8], pos: usize) -> Option<(&[u8], usize)> {
    let rest = buf.get(pos..)?;
    let end = rest.windows(2).position(|w| w == b"\r\n")?;
    Some((&rest[..end], pos + end + 2))
}

fn utf8(body: &[u8]) -> Result<String, Error> {
    String::from_utf8(body.to_vec()).map_err(|e| Error::Protocol(e.to_string()))
}

fn number(body: &[u8]) -> Result<i64, Error> {
    std::str::from_utf8(body)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| Error::Protocol(format!("invalid integer '{}'", String::from_utf8_lossy(body))))
}

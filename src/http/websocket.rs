//! WebSocket upgrade and frame codec.
//!
//! # Responsibilities
//! - Detect upgrade requests and answer the RFC 6455 handshake
//! - Encode and decode single unfragmented frames
//! - Drive a handler for the lifetime of an upgraded connection
//!
//! # Data Flow
//! ```text
//! Request (Upgrade: websocket)
//!     → handshake (101 Switching Protocols)
//!     → receive loop: text/binary → handler.on_message → send
//!                     ping → pong, close → send_close
//! ```
//!
//! # Design Decisions
//! - Lengths up to 65535 only; 64-bit lengths are rejected both ways
//! - Payload length is checked before reading, opcode after
//! - Server frames are never masked

use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha1::{Digest, Sha1};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};
use crate::http::message::Request;

/// GUID appended to the client key before hashing.
pub const WS_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Largest payload expressible without the 64-bit length form.
pub const MAX_FRAME_PAYLOAD: usize = u16::MAX as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    Text = 0x1,
    Binary = 0x2,
    Close = 0x8,
    Ping = 0x9,
    Pong = 0xA,
}

impl Opcode {
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0x1 => Some(Opcode::Text),
            0x2 => Some(Opcode::Binary),
            0x8 => Some(Opcode::Close),
            0x9 => Some(Opcode::Ping),
            0xA => Some(Opcode::Pong),
            _ => None,
        }
    }
}

/// A decoded frame. The payload is already unmasked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub fin: bool,
    pub opcode: Opcode,
    pub masked: bool,
    pub mask: Option<[u8; 4]>,
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }

    /// Payload as text, lossily decoded.
    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}

/// Result of `receive`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Received {
    Frame(Frame),
    /// The peer sent a close frame.
    Closed,
}

/// Callbacks for an upgraded connection.
///
/// Returned bytes are sent back as a text frame.
pub trait WebSocketHandler: Send + Sync + 'static {
    fn on_open(&self, _request: &Request) -> Option<Vec<u8>> {
        None
    }

    fn on_message(&self, request: &Request, frame: &Frame) -> Option<Vec<u8>>;

    fn on_close(&self, _request: &Request) {}
}

/// True when the request asks for a version 13 WebSocket upgrade.
pub fn is_upgrade_request(request: &Request) -> bool {
    let connection_upgrade = request
        .header("Connection")
        .is_some_and(|v| v.to_ascii_lowercase().contains("upgrade"));
    let upgrade_websocket = request
        .header("Upgrade")
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("websocket"));
    let version_13 = request
        .header("Sec-WebSocket-Version")
        .is_some_and(|v| v.trim() == "13");
    let has_key = request
        .header("Sec-WebSocket-Key")
        .is_some_and(|v| !v.trim().is_empty());

    connection_upgrade && upgrade_websocket && version_13 && has_key
}

/// `Sec-WebSocket-Accept` value for a client key.
pub fn accept_key(key: &str) -> String {
    let mut sha1 = Sha1::new();
    sha1.update(key.as_bytes());
    sha1.update(WS_GUID.as_bytes());
    STANDARD.encode(sha1.finalize())
}

/// Answer an upgrade request with `101 Switching Protocols`.
pub async fn handshake<W>(writer: &mut W, request: &Request) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    if !is_upgrade_request(request) {
        return Err(Error::UpgradeRejected("missing or invalid upgrade headers"));
    }
    let key = request
        .header("Sec-WebSocket-Key")
        .map(str::trim)
        .ok_or(Error::UpgradeRejected("missing Sec-WebSocket-Key"))?;

    let response = format!(
        "HTTP/1.1 101 Switching Protocols\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Accept: {}\r\n\r\n",
        accept_key(key)
    );
    writer.write_all(response.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// Encode a single final, unmasked frame.
pub fn encode_frame(opcode: Opcode, payload: &[u8]) -> Result<Vec<u8>> {
    let len = payload.len();
    if len > MAX_FRAME_PAYLOAD {
        return Err(Error::FrameUnsupported(format!(
            "payload of {len} bytes needs a 64-bit length"
        )));
    }

    let mut frame = Vec::with_capacity(len + 4);
    frame.push(0x80 | opcode as u8);
    if len < 126 {
        frame.push(len as u8);
    } else {
        frame.push(126);
        frame.extend_from_slice(&(len as u16).to_be_bytes());
    }
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Send `payload` as a text frame.
pub async fn send<W>(writer: &mut W, payload: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    send_frame(writer, Opcode::Text, payload).await
}

pub async fn send_frame<W>(writer: &mut W, opcode: Opcode, payload: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let frame = encode_frame(opcode, payload)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

/// Send an empty close frame.
pub async fn send_close<W>(writer: &mut W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    send_frame(writer, Opcode::Close, &[]).await
}

/// Read one frame, rejecting payloads larger than `max_payload`.
pub async fn read_frame<R>(reader: &mut R, max_payload: usize) -> Result<Frame>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; 2];
    read_exact(reader, &mut header).await?;

    let fin = header[0] & 0x80 != 0;
    let opcode_bits = header[0] & 0x0F;
    let masked = header[1] & 0x80 != 0;

    let len = match header[1] & 0x7F {
        126 => {
            let mut ext = [0u8; 2];
            read_exact(reader, &mut ext).await?;
            u16::from_be_bytes(ext) as usize
        }
        127 => return Err(Error::FrameUnsupported("64-bit payload length".to_string())),
        n => n as usize,
    };
    if len > max_payload {
        return Err(Error::FrameUnsupported(format!(
            "payload of {len} bytes exceeds limit of {max_payload}"
        )));
    }

    let mask = if masked {
        let mut key = [0u8; 4];
        read_exact(reader, &mut key).await?;
        Some(key)
    } else {
        None
    };

    let mut payload = vec![0u8; len];
    read_exact(reader, &mut payload).await?;
    if let Some(key) = mask {
        for (i, byte) in payload.iter_mut().enumerate() {
            *byte ^= key[i % 4];
        }
    }

    let opcode = Opcode::from_bits(opcode_bits)
        .ok_or_else(|| Error::FrameUnsupported(format!("opcode {opcode_bits:#x}")))?;

    Ok(Frame {
        fin,
        opcode,
        masked,
        mask,
        payload,
    })
}

/// Read one frame and answer pings.
///
/// A ping is answered with a pong echoing its payload and then returned.
pub async fn receive<S>(stream: &mut S, max_payload: usize) -> Result<Received>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let frame = read_frame(stream, max_payload).await?;
    match frame.opcode {
        Opcode::Close => Ok(Received::Closed),
        Opcode::Ping => {
            send_frame(stream, Opcode::Pong, &frame.payload).await?;
            Ok(Received::Frame(frame))
        }
        _ => Ok(Received::Frame(frame)),
    }
}

/// Run the message loop for an upgraded connection until it ends.
pub async fn run_session<S>(
    stream: &mut S,
    request: &Request,
    handler: &dyn WebSocketHandler,
    max_payload: usize,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let result = message_loop(stream, request, handler, max_payload).await;
    handler.on_close(request);
    match result {
        Err(Error::ConnectionClosed) => Ok(()),
        other => other,
    }
}

async fn message_loop<S>(
    stream: &mut S,
    request: &Request,
    handler: &dyn WebSocketHandler,
    max_payload: usize,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    if let Some(greeting) = handler.on_open(request) {
        send(stream, &greeting).await?;
    }

    loop {
        match receive(stream, max_payload).await? {
            Received::Closed => {
                tracing::debug!(path = %request.path, "WebSocket closed by peer");
                send_close(stream).await?;
                return Ok(());
            }
            Received::Frame(frame) => match frame.opcode {
                Opcode::Text | Opcode::Binary => {
                    if let Some(reply) = handler.on_message(request, &frame) {
                        send(stream, &reply).await?;
                    }
                }
                Opcode::Ping | Opcode::Pong | Opcode::Close => {}
            },
        }
    }
}

async fn read_exact<R>(reader: &mut R, buf: &mut [u8]) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    match reader.read_exact(buf).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Err(Error::ConnectionClosed),
        Err(e) => Err(e.into()),
    }
}

//! Minecraft Server List Ping.
//!
//! Speaks just enough of the modern protocol (handshake + status request,
//! varint framing) to report whether a server is up, how fast it answered
//! and how many players it holds.

use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

const PROTOCOL_VERSION: i32 = 767;
const IO_TIMEOUT: Duration = Duration::from_secs(5);
// Longest status packet we accept; vanilla payloads are a few KiB.
const MAX_PACKET_LEN: i32 = 0x1F_FFFF;

/// Result of one ping. Default is "offline".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerPing {
    pub online: bool,
    pub latency_ms: u64,
    pub players_online: u32,
    pub players_max: u32,
}

/// Ping a server. Unreachable or misbehaving servers come back as the
/// offline default rather than an error.
pub async fn ping(host: &str, port: u16) -> ServerPing {
    match try_ping(host, port).await {
        Ok(status) => status,
        Err(e) => {
            log::debug!("[status] {}:{} unreachable: {}", host, port, e);
            ServerPing::default()
        }
    }
}

async fn try_ping(host: &str, port: u16) -> Result<ServerPing> {
    let mut stream = timeout(IO_TIMEOUT, TcpStream::connect((host, port))).await??;

    // Handshake: packet id 0x00, protocol version, address, port, next state 1 (status)
    let mut handshake = Vec::new();
    handshake.push(0x00);
    write_varint(&mut handshake, PROTOCOL_VERSION);
    write_string(&mut handshake, host);
    handshake.extend_from_slice(&port.to_be_bytes());
    write_varint(&mut handshake, 1);

    let mut packet = Vec::new();
    write_varint(&mut packet, handshake.len() as i32);
    packet.extend(handshake);
    stream.write_all(&packet).await?;

    let started = Instant::now();
    // Status request: length 1, packet id 0x00
    stream.write_all(&[0x01, 0x00]).await?;

    let packet_length = read_varint_stream(&mut stream).await?;
    if packet_length <= 0 || packet_length > MAX_PACKET_LEN {
        bail!("implausible status packet length {}", packet_length);
    }

    let mut response = vec![0u8; packet_length as usize];
    timeout(IO_TIMEOUT, stream.read_exact(&mut response)).await??;
    let latency_ms = started.elapsed().as_millis() as u64;

    let (_packet_id, id_len) = read_varint(&response)?;
    let (json_len, json_len_size) = read_varint(&response[id_len..])?;
    let json_start = id_len + json_len_size;
    let json_end = json_start
        .checked_add(json_len as usize)
        .filter(|end| *end <= response.len())
        .ok_or_else(|| anyhow::anyhow!("status payload truncated"))?;

    let payload: serde_json::Value = serde_json::from_slice(&response[json_start..json_end])?;
    Ok(parse_status_payload(&payload, latency_ms))
}

fn parse_status_payload(payload: &serde_json::Value, latency_ms: u64) -> ServerPing {
    let players = payload.get("players");
    let count = |field: &str| {
        players
            .and_then(|p| p.get(field))
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as u32
    };

    ServerPing {
        online: true,
        latency_ms,
        players_online: count("online"),
        players_max: count("max"),
    }
}

fn write_varint(buf: &mut Vec<u8>, value: i32) {
    let mut value = value as u32;
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if value == 0 {
            break;
        }
    }
}

fn write_string(buf: &mut Vec<u8>, value: &str) {
    write_varint(buf, value.len() as i32);
    buf.extend_from_slice(value.as_bytes());
}

fn read_varint(buf: &[u8]) -> Result<(i32, usize)> {
    let mut value = 0u32;
    for (i, byte) in buf.iter().take(5).enumerate() {
        value |= ((byte & 0x7F) as u32) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((value as i32, i + 1));
        }
    }
    bail!("varint unterminated")
}

async fn read_varint_stream(stream: &mut TcpStream) -> Result<i32> {
    let mut value = 0u32;
    for i in 0..5 {
        let mut byte = [0u8; 1];
        timeout(IO_TIMEOUT, stream.read_exact(&mut byte)).await??;
        value |= ((byte[0] & 0x7F) as u32) << (7 * i);
        if byte[0] & 0x80 == 0 {
            return Ok(value as i32);
        }
    }
    bail!("varint unterminated")
}

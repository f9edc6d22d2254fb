#![allow(dead_code)]

use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::time::Duration;

use etherparse::PacketBuilder;
use showtape_core::{
    CancelToken, Datagram, DatagramSource, SourceError, encode_frame, encode_packet,
};

/// In-memory source fed from a list of `(millis, datagram)` pairs.
pub struct ScriptedSource {
    queue: VecDeque<Datagram>,
}

impl ScriptedSource {
    pub fn new(items: Vec<(u64, Vec<u8>)>) -> Self {
        Self {
            queue: items
                .into_iter()
                .map(|(ms, data)| Datagram {
                    at: Duration::from_millis(ms),
                    data,
                })
                .collect(),
        }
    }
}

impl DatagramSource for ScriptedSource {
    fn next_datagram(&mut self, _cancel: &CancelToken) -> Result<Option<Datagram>, SourceError> {
        Ok(self.queue.pop_front())
    }
}

pub fn dmx(universe: u16, value: u8) -> Vec<u8> {
    encode_packet(universe, &[value; 512]).unwrap()
}

pub fn tape_bytes(frames: &[(f32, u8)]) -> Vec<u8> {
    let mut bytes = Vec::new();
    for (timestamp, value) in frames {
        bytes.extend_from_slice(&encode_frame(*timestamp, &[*value; 512]).unwrap());
    }
    bytes
}

pub fn udp_frame(payload: &[u8]) -> Vec<u8> {
    let builder = PacketBuilder::ethernet2([2, 0, 0, 0, 0, 1], [0xff; 6])
        .ipv4([192, 168, 0, 10], [192, 168, 0, 255], 64)
        .udp(6454, 6454);
    let mut frame = Vec::with_capacity(builder.size(payload.len()));
    builder.write(&mut frame, payload).unwrap();
    frame
}

pub fn tcp_frame() -> Vec<u8> {
    let builder = PacketBuilder::ethernet2([2, 0, 0, 0, 0, 1], [2, 0, 0, 0, 0, 2])
        .ipv4([192, 168, 0, 10], [192, 168, 0, 20], 64)
        .tcp(4000, 80, 1, 1024);
    let mut frame = Vec::with_capacity(builder.size(4));
    builder.write(&mut frame, &[0u8; 4]).unwrap();
    frame
}

/// Write a single-interface Ethernet pcapng file.
pub fn write_pcapng(path: &Path, packets: &[(u64, Vec<u8>)]) {
    let mut output = Vec::new();
    output.extend_from_slice(&pcapng_block(0x0A0D0D0A, &section_header_body()));
    output.extend_from_slice(&pcapng_block(1, &interface_desc_body()));
    for (ts_us, data) in packets {
        output.extend_from_slice(&pcapng_block(6, &enhanced_packet_body(*ts_us, data)));
    }
    fs::write(path, output).unwrap();
}

fn pcapng_block(block_type: u32, body: &[u8]) -> Vec<u8> {
    let total_len = (8 + body.len() + 4) as u32;
    let mut block = Vec::with_capacity(total_len as usize);
    block.extend_from_slice(&block_type.to_be_bytes());
    block.extend_from_slice(&total_len.to_be_bytes());
    block.extend_from_slice(body);
    block.extend_from_slice(&total_len.to_be_bytes());
    block
}

fn section_header_body() -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&0x1A2B3C4Du32.to_be_bytes());
    body.extend_from_slice(&1u16.to_be_bytes());
    body.extend_from_slice(&0u16.to_be_bytes());
    body.extend_from_slice(&(-1i64).to_be_bytes());
    body
}

fn interface_desc_body() -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&1u16.to_be_bytes());
    body.extend_from_slice(&0u16.to_be_bytes());
    body.extend_from_slice(&65535u32.to_be_bytes());
    body
}

fn enhanced_packet_body(ts_us: u64, data: &[u8]) -> Vec<u8> {
    let cap_len = data.len() as u32;
    let mut body = Vec::new();
    body.extend_from_slice(&0u32.to_be_bytes());
    body.extend_from_slice(&((ts_us >> 32) as u32).to_be_bytes());
    body.extend_from_slice(&(ts_us as u32).to_be_bytes());
    body.extend_from_slice(&cap_len.to_be_bytes());
    body.extend_from_slice(&cap_len.to_be_bytes());
    body.extend_from_slice(data);
    body.resize(body.len() + (4 - data.len() % 4) % 4, 0);
    body
}

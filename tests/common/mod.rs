//! In-memory GIF writer for building test streams.
#![allow(dead_code)]

use gif_canvas::DisposalMethod;
use weezl::{encode::Encoder as LzwEncoder, BitOrder};

pub type Rgb = [u8; 3];

pub const RED: Rgb = [255, 0, 0];
pub const GREEN: Rgb = [0, 255, 0];
pub const BLUE: Rgb = [0, 0, 255];
pub const WHITE: Rgb = [255, 255, 255];

pub const PALETTE: [Rgb; 4] = [RED, GREEN, BLUE, WHITE];

#[derive(Clone, Debug, Default)]
pub struct FrameSpec {
    pub left: u16,
    pub top: u16,
    pub width: u16,
    pub height: u16,
    pub interlaced: bool,
    pub palette: Option<Vec<Rgb>>,
    /// `(dispose, delay, transparent)`, `None` writes no graphics control extension.
    pub control: Option<(DisposalMethod, u16, Option<u8>)>,
    /// Indices in storage order.
    pub indices: Vec<u8>,
}

impl FrameSpec {
    pub fn full(width: u16, height: u16, indices: Vec<u8>) -> Self {
        Self {
            width,
            height,
            indices,
            ..Self::default()
        }
    }

    pub fn at(mut self, left: u16, top: u16) -> Self {
        self.left = left;
        self.top = top;
        self
    }

    pub fn control(mut self, dispose: DisposalMethod, delay: u16, transparent: Option<u8>) -> Self {
        self.control = Some((dispose, delay, transparent));
        self
    }
}

pub struct GifBuilder {
    bytes: Vec<u8>,
}

impl GifBuilder {
    pub fn new(width: u16, height: u16, global: Option<&[Rgb]>, background: u8) -> Self {
        let mut bytes = b"GIF89a".to_vec();
        bytes.extend_from_slice(&width.to_le_bytes());
        bytes.extend_from_slice(&height.to_le_bytes());
        let flags = match global {
            Some(table) => 0b1000_0000 | table_size_bits(table.len()),
            None => 0,
        };
        bytes.extend_from_slice(&[flags, background, 0]);
        if let Some(table) = global {
            write_color_table(&mut bytes, table);
        }
        Self { bytes }
    }

    pub fn comment(mut self, text: &[u8]) -> Self {
        self.bytes.extend_from_slice(&[0x21, 0xFE]);
        write_sub_blocks(&mut self.bytes, text);
        self
    }

    pub fn netscape_loop(mut self) -> Self {
        self.bytes.extend_from_slice(&[0x21, 0xFF, 11]);
        self.bytes.extend_from_slice(b"NETSCAPE2.0");
        self.bytes.extend_from_slice(&[3, 1, 0, 0, 0]);
        self
    }

    pub fn frame(mut self, frame: &FrameSpec) -> Self {
        if let Some((dispose, delay, transparent)) = frame.control {
            let mut flags = (dispose as u8) << 2;
            if transparent.is_some() {
                flags |= 1;
            }
            self.bytes.extend_from_slice(&[0x21, 0xF9, 4, flags]);
            self.bytes.extend_from_slice(&delay.to_le_bytes());
            self.bytes.extend_from_slice(&[transparent.unwrap_or(0), 0]);
        }
        self.bytes.push(0x2C);
        for value in [frame.left, frame.top, frame.width, frame.height] {
            self.bytes.extend_from_slice(&value.to_le_bytes());
        }
        let mut flags = 0;
        if frame.interlaced {
            flags |= 0b0100_0000;
        }
        if let Some(table) = &frame.palette {
            flags |= 0b1000_0000 | table_size_bits(table.len());
        }
        self.bytes.push(flags);
        if let Some(table) = &frame.palette {
            write_color_table(&mut self.bytes, table);
        }
        let (min_code_size, data) = lzw_encode(&frame.indices);
        self.bytes.push(min_code_size);
        write_sub_blocks(&mut self.bytes, &data);
        self
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.bytes.push(0x3B);
        self.bytes
    }

    pub fn finish_without_trailer(self) -> Vec<u8> {
        self.bytes
    }
}

fn table_size_bits(len: usize) -> u8 {
    (len.clamp(2, 256).next_power_of_two().trailing_zeros() - 1) as u8
}

fn write_color_table(bytes: &mut Vec<u8>, table: &[Rgb]) {
    let padded = 2usize << table_size_bits(table.len());
    for color in table {
        bytes.extend_from_slice(color);
    }
    for _ in table.len()..padded {
        bytes.extend_from_slice(&[0, 0, 0]);
    }
}

fn write_sub_blocks(bytes: &mut Vec<u8>, data: &[u8]) {
    for chunk in data.chunks(0xFF) {
        bytes.push(chunk.len() as u8);
        bytes.extend_from_slice(chunk);
    }
    bytes.push(0);
}

fn lzw_encode(data: &[u8]) -> (u8, Vec<u8>) {
    let max_byte = data.iter().copied().max().unwrap_or(0);
    let palette_min_len = u32::from(max_byte) + 1;
    let min_code_size = palette_min_len.max(4).next_power_of_two().trailing_zeros() as u8;
    let mut buffer = Vec::new();
    let mut enc = LzwEncoder::new(BitOrder::Lsb, min_code_size);
    let result = enc.into_vec(&mut buffer).encode_all(data);
    result.status.expect("lzw encoding");
    (min_code_size, buffer)
}

/// Expected RGBA for indices mapped through `palette`.
pub fn rgba(palette: &[Rgb], indices: &[u8]) -> Vec<u8> {
    indices
        .iter()
        .flat_map(|&i| {
            let [r, g, b] = palette[usize::from(i)];
            [r, g, b, 255]
        })
        .collect()
}

pub fn pixel(buffer: &[u8], width: usize, x: usize, y: usize) -> [u8; 4] {
    let offset = (y * width + x) * 4;
    buffer[offset..offset + 4].try_into().unwrap()
}

pub fn opaque([r, g, b]: Rgb) -> [u8; 4] {
    [r, g, b, 255]
}

//! DXT1 (BC1) block compression for power-of-two runtime textures.
//!
//! Every 4x4 block is stored as two RGB565 endpoints followed by 16 two-bit
//! palette indices. Only the opaque four-color mode is produced. Partial blocks at
//! the right and bottom edges repeat the last row and column.
//!
//! Related: <https://www.khronos.org/registry/OpenGL/extensions/EXT/EXT_texture_compression_s3tc.txt>

type Rgb = [u8; 3];

/// Encoded size of one 4x4 block.
pub(crate) const BLOCK_BYTES: usize = 8;

/// Bytes needed to hold a `width` x `height` image, `None` on overflow.
pub(crate) fn compressed_size(width: usize, height: usize) -> Option<usize> {
    blocks(width)
        .checked_mul(blocks(height))?
        .checked_mul(BLOCK_BYTES)
}

fn blocks(pixels: usize) -> usize {
    pixels.div_ceil(4).max(1)
}

/// Compresses RGBA pixels into `dest`, which must be `compressed_size(width, height)` long.
pub(crate) fn compress_rgba(rgba: &[u8], width: usize, height: usize, dest: &mut [u8]) {
    debug_assert!(rgba.len() >= width * height * 4);
    if width == 0 || height == 0 {
        return;
    }
    let mut block = [[0u8; 3]; 16];
    let encoded = dest.chunks_exact_mut(BLOCK_BYTES);
    let origins = (0..blocks(height))
        .flat_map(|by| (0..blocks(width)).map(move |bx| (bx * 4, by * 4)));
    for ((x0, y0), out) in origins.zip(encoded) {
        for (i, texel) in block.iter_mut().enumerate() {
            let x = (x0 + i % 4).min(width - 1);
            let y = (y0 + i / 4).min(height - 1);
            let offset = (y * width + x) * 4;
            texel.copy_from_slice(&rgba[offset..offset + 3]);
        }
        out.copy_from_slice(&encode_block(&block));
    }
}

/// Packs 8-bit RGB into 5-6-5 bits, rounding to nearest.
fn enc565_encode(rgb: Rgb) -> u16 {
    let r = (u16::from(rgb[0]) * 0x1F + 0x7F) / 0xFF;
    let g = (u16::from(rgb[1]) * 0x3F + 0x7F) / 0xFF;
    let b = (u16::from(rgb[2]) * 0x1F + 0x7F) / 0xFF;
    (r << 11) | (g << 5) | b
}

/// Decodes a 5-bit R, 6-bit G, 5-bit B packed color back into 8-bit RGB,
/// mapping min/max range values onto 0x00 and 0xFF.
fn enc565_decode(value: u16) -> Rgb {
    let red = (value >> 11) & 0x1F;
    let green = (value >> 5) & 0x3F;
    let blue = value & 0x1F;
    [
        (red * 0xFF / 0x1F) as u8,
        (green * 0xFF / 0x3F) as u8,
        (blue * 0xFF / 0x1F) as u8,
    ]
}

/// The four colors a block with endpoints `color0 > color1` decodes to.
fn block_palette(color0: u16, color1: u16) -> [Rgb; 4] {
    let mut colors = [[0; 3]; 4];
    colors[0] = enc565_decode(color0);
    colors[1] = enc565_decode(color1);
    for i in 0..3 {
        colors[2][i] = ((u16::from(colors[0][i]) * 2 + u16::from(colors[1][i]) + 1) / 3) as u8;
        colors[3][i] = ((u16::from(colors[0][i]) + u16::from(colors[1][i]) * 2 + 1) / 3) as u8;
    }
    colors
}

fn distance(a: Rgb, b: Rgb) -> u32 {
    a.iter()
        .zip(b.iter())
        .map(|(&a, &b)| {
            let d = i32::from(a) - i32::from(b);
            (d * d) as u32
        })
        .sum()
}

/// Encodes 16 texels using the bounding box of their colors as endpoints.
fn encode_block(texels: &[Rgb; 16]) -> [u8; BLOCK_BYTES] {
    let mut min = [u8::MAX; 3];
    let mut max = [u8::MIN; 3];
    for texel in texels {
        for c in 0..3 {
            min[c] = min[c].min(texel[c]);
            max[c] = max[c].max(texel[c]);
        }
    }
    let (mut color0, mut color1) = (enc565_encode(max), enc565_encode(min));
    if color0 < color1 {
        core::mem::swap(&mut color0, &mut color1);
    }

    let mut indices = 0u32;
    if color0 != color1 {
        let palette = block_palette(color0, color1);
        for (i, &texel) in texels.iter().enumerate() {
            let best = (0..4)
                .min_by_key(|&candidate| distance(palette[candidate], texel))
                .unwrap_or(0);
            indices |= (best as u32) << (i * 2);
        }
    }

    let mut out = [0; BLOCK_BYTES];
    out[0..2].copy_from_slice(&color0.to_le_bytes());
    out[2..4].copy_from_slice(&color1.to_le_bytes());
    out[4..8].copy_from_slice(&indices.to_le_bytes());
    out
}

#[cfg(test)]
pub(crate) fn decode_block(source: &[u8]) -> [Rgb; 16] {
    let color0 = u16::from_le_bytes([source[0], source[1]]);
    let color1 = u16::from_le_bytes([source[2], source[3]]);
    let table = u32::from_le_bytes([source[4], source[5], source[6], source[7]]);
    let colors = if color0 > color1 {
        block_palette(color0, color1)
    } else {
        let c0 = enc565_decode(color0);
        let c1 = enc565_decode(color1);
        let mut mid = [0; 3];
        for i in 0..3 {
            mid[i] = ((u16::from(c0[i]) + u16::from(c1[i]) + 1) / 2) as u8;
        }
        [c0, c1, mid, [0, 0, 0]]
    };
    let mut texels = [[0; 3]; 16];
    for (i, texel) in texels.iter_mut().enumerate() {
        *texel = colors[(table >> (i * 2)) as usize & 3];
    }
    texels
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    fn solid(width: usize, height: usize, rgb: Rgb) -> Vec<u8> {
        (0..width * height)
            .flat_map(|_| [rgb[0], rgb[1], rgb[2], 255])
            .collect()
    }

    #[test]
    fn sizes_round_up_to_blocks() {
        assert_eq!(compressed_size(128, 256), Some(32 * 64 * 8));
        assert_eq!(compressed_size(1, 1), Some(8));
        assert_eq!(compressed_size(2, 8), Some(16));
        assert_eq!(compressed_size(usize::MAX, usize::MAX), None);
    }

    #[test]
    fn solid_block_round_trips_exactly() {
        let rgba = solid(4, 4, [255, 0, 0]);
        let mut out = [0; BLOCK_BYTES];
        compress_rgba(&rgba, 4, 4, &mut out);
        assert_eq!(decode_block(&out), [[255, 0, 0]; 16]);
    }

    #[test]
    fn two_color_block_keeps_endpoints() {
        let mut rgba = solid(4, 4, [0, 0, 0]);
        for pixel in rgba.chunks_exact_mut(4).skip(8) {
            pixel[..3].copy_from_slice(&[255, 255, 255]);
        }
        let mut out = [0; BLOCK_BYTES];
        compress_rgba(&rgba, 4, 4, &mut out);
        let texels = decode_block(&out);
        assert!(texels[..8].iter().all(|&t| t == [0, 0, 0]));
        assert!(texels[8..].iter().all(|&t| t == [255, 255, 255]));
    }

    #[test]
    fn edge_blocks_repeat_last_pixel() {
        let rgba = solid(2, 2, [0, 255, 0]);
        let mut out = [0; BLOCK_BYTES];
        compress_rgba(&rgba, 2, 2, &mut out);
        assert_eq!(decode_block(&out), [[0, 255, 0]; 16]);
    }
}

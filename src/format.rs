//! Output pixel formats, output sizing and nearest-neighbor resampling.
use alloc::borrow::Cow;
use alloc::vec::Vec;

use crate::dxt;
use crate::error::GifError;

/// Pixel layouts a composited frame can be requested in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PixelFormat {
    /// `[r, g, b, a]`
    Rgba8888,
    /// `[b, g, r, a]`
    Bgra8888,
    /// `[a, r, g, b]`
    Argb8888,
    /// `[a, b, g, r]`
    Abgr8888,
    /// `[r, g, b]`, alpha dropped.
    Rgb888,
    /// `[b, g, r]`, alpha dropped.
    Bgr888,
    /// DXT1 compressed, padded up to power-of-two dimensions.
    Dxt1Runtime,
    /// Packed 5-6-5 RGB. Not produced by this crate.
    Rgb565,
    /// 8-bit intensity. Not produced by this crate.
    I8,
    /// DXT5 compressed. Not produced by this crate.
    Dxt5,
}

impl PixelFormat {
    /// Human readable name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Rgba8888 => "RGBA8888",
            Self::Bgra8888 => "BGRA8888",
            Self::Argb8888 => "ARGB8888",
            Self::Abgr8888 => "ABGR8888",
            Self::Rgb888 => "RGB888",
            Self::Bgr888 => "BGR888",
            Self::Dxt1Runtime => "DXT1_RUNTIME",
            Self::Rgb565 => "RGB565",
            Self::I8 => "I8",
            Self::Dxt5 => "DXT5",
        }
    }

    /// Bytes per pixel for uncompressed formats, `None` for block-compressed ones.
    #[must_use]
    pub fn bytes_per_pixel(self) -> Option<usize> {
        match self {
            Self::Rgba8888 | Self::Bgra8888 | Self::Argb8888 | Self::Abgr8888 => Some(4),
            Self::Rgb888 | Self::Bgr888 => Some(3),
            Self::Rgb565 => Some(2),
            Self::I8 => Some(1),
            Self::Dxt1Runtime | Self::Dxt5 => None,
        }
    }

    /// Whether frames can be rendered in this format.
    #[must_use]
    pub fn is_supported_output(self) -> bool {
        !matches!(self, Self::Rgb565 | Self::I8 | Self::Dxt5)
    }

    /// Bytes needed for a `width` x `height` image in this format.
    ///
    /// `None` when the size does not fit in `usize`.
    #[must_use]
    pub fn memory_required(self, width: usize, height: usize) -> Option<usize> {
        match self {
            Self::Dxt1Runtime => dxt::compressed_size(width, height),
            Self::Dxt5 => dxt::compressed_size(width, height)?.checked_mul(2),
            other => width
                .checked_mul(height)?
                .checked_mul(other.bytes_per_pixel().unwrap_or(0)),
        }
    }

    /// Swizzle applied to an RGBA pixel, given as source channel per output byte.
    fn channel_order(self) -> Option<&'static [usize]> {
        match self {
            Self::Rgba8888 => Some(&[0, 1, 2, 3]),
            Self::Bgra8888 => Some(&[2, 1, 0, 3]),
            Self::Argb8888 => Some(&[3, 0, 1, 2]),
            Self::Abgr8888 => Some(&[3, 2, 1, 0]),
            Self::Rgb888 => Some(&[0, 1, 2]),
            Self::Bgr888 => Some(&[2, 1, 0]),
            _ => None,
        }
    }
}

/// Byte size and dimensions of a rendered frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputSize {
    /// Required length of the output buffer.
    pub bytes: usize,
    /// Output width in pixels.
    pub width: usize,
    /// Output height in pixels.
    pub height: usize,
}

/// Output size for a screen of `width` x `height` rendered as `format`.
///
/// Direct formats keep the screen resolution. [`PixelFormat::Dxt1Runtime`] rounds each
/// axis up to the next power of two.
pub fn output_size(format: PixelFormat, width: usize, height: usize) -> Result<OutputSize, GifError> {
    let (width, height) = match format {
        PixelFormat::Dxt1Runtime => width
            .checked_next_power_of_two()
            .zip(height.checked_next_power_of_two())
            .ok_or(GifError::OutputTooLarge { width, height })?,
        f if f.is_supported_output() => (width, height),
        f => return Err(GifError::UnsupportedFormat(f)),
    };
    Ok(OutputSize {
        bytes: check_output(format, width, height, usize::MAX)?,
        width,
        height,
    })
}

/// Validates a request for a `width` x `height` image in `format` against a buffer of
/// `available` bytes, returning the bytes the image needs.
pub fn check_output(
    format: PixelFormat,
    width: usize,
    height: usize,
    available: usize,
) -> Result<usize, GifError> {
    if !format.is_supported_output() {
        return Err(GifError::UnsupportedFormat(format));
    }
    let expected = format
        .memory_required(width, height)
        .ok_or(GifError::OutputTooLarge { width, height })?;
    if available < expected {
        return Err(GifError::OutputTooSmall {
            expected,
            actual: available,
        });
    }
    Ok(expected)
}

/// Nearest-neighbor resize of an RGBA image.
///
/// Destination pixel `(x, y)` samples source pixel
/// `(x * src_width / dst_width, y * src_height / dst_height)`.
pub fn scale_nearest(
    src: &[u8],
    src_width: usize,
    src_height: usize,
    dst: &mut [u8],
    dst_width: usize,
    dst_height: usize,
) {
    let Some(row_bytes) = dst_width.checked_mul(4) else {
        return;
    };
    if row_bytes == 0 || src_width == 0 || src_height == 0 {
        return;
    }
    for (y, dst_row) in dst.chunks_exact_mut(row_bytes).take(dst_height).enumerate() {
        let src_y = y * src_height / dst_height;
        let src_row = &src[src_y * src_width * 4..(src_y + 1) * src_width * 4];
        for (x, pixel) in dst_row.chunks_exact_mut(4).enumerate() {
            let src_x = x * src_width / dst_width;
            pixel.copy_from_slice(&src_row[src_x * 4..src_x * 4 + 4]);
        }
    }
}

/// Converts RGBA pixels into an uncompressed layout.
pub fn convert_rgba(src: &[u8], format: PixelFormat, dst: &mut [u8]) -> Result<(), GifError> {
    let order = format
        .channel_order()
        .ok_or(GifError::UnsupportedFormat(format))?;
    for (pixel, out) in src.chunks_exact(4).zip(dst.chunks_exact_mut(order.len())) {
        for (byte, &channel) in out.iter_mut().zip(order) {
            *byte = pixel[channel];
        }
    }
    Ok(())
}

/// Resamples an RGBA image to `dst_width` x `dst_height` and writes it as `format`.
///
/// `dst` must hold at least `format.memory_required(dst_width, dst_height)` bytes.
/// Sizes that overflow or cannot be allocated are reported as
/// [`GifError::OutputTooLarge`].
pub fn convert_and_scale(
    src: &[u8],
    src_width: usize,
    src_height: usize,
    format: PixelFormat,
    dst_width: usize,
    dst_height: usize,
    dst: &mut [u8],
) -> Result<(), GifError> {
    let expected = check_output(format, dst_width, dst_height, dst.len())?;
    let scaled: Cow<'_, [u8]> = if (src_width, src_height) == (dst_width, dst_height) {
        Cow::Borrowed(src)
    } else {
        let too_large = GifError::OutputTooLarge {
            width: dst_width,
            height: dst_height,
        };
        let len = dst_width
            .checked_mul(dst_height)
            .and_then(|pixels| pixels.checked_mul(4))
            .ok_or_else(|| too_large.clone())?;
        let mut buffer: Vec<u8> = Vec::new();
        buffer.try_reserve_exact(len).map_err(|_| too_large)?;
        buffer.resize(len, 0);
        scale_nearest(src, src_width, src_height, &mut buffer, dst_width, dst_height);
        Cow::Owned(buffer)
    };
    match format {
        PixelFormat::Dxt1Runtime => {
            dxt::compress_rgba(&scaled, dst_width, dst_height, &mut dst[..expected]);
            Ok(())
        }
        _ => convert_rgba(&scaled, format, &mut dst[..expected]),
    }
}

//! Container parser: reads a whole GIF stream into memory at once.
use alloc::vec::Vec;
use core::num::NonZeroU64;

use tracing::{debug, trace};
use weezl::{decode::Decoder as LzwDecoder, BitOrder, LzwStatus};

use crate::common::{
    AnyExtension, Block, ColorTable, ControlExtension, Extension, Frame, Rgb, PLTE_CHANNELS,
};
use crate::error::{FormatError, GifError};
use crate::io::ByteSource;
use crate::timer::FrameTiming;
use crate::traits::ReadBytesExt;

/// GIF version
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Version {
    /// GIF 87a
    V87a,
    /// GIF 89a
    V89a,
}

/// Upper bound on the size of any single buffer a decoded animation allocates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemoryLimit {
    /// Enforce no memory limit.
    ///
    /// A crafted stream can ask for `65535 * 65535 * 4` bytes of canvas and
    /// `65535 * 65535` bytes of index data per frame.
    Unlimited,
    /// Limit the canvas and each frame's index data to the given number of bytes.
    ///
    /// The limit applies to each buffer on its own, not to their sum.
    Bytes(NonZeroU64),
}

impl MemoryLimit {
    fn check(self, size: u64) -> bool {
        match self {
            Self::Unlimited => true,
            Self::Bytes(limit) => size <= limit.get(),
        }
    }
}

const DEFAULT_MEMORY_LIMIT: NonZeroU64 = match NonZeroU64::new(50_000_000) {
    Some(limit) => limit, // 50 MB
    None => unreachable!(),
};

/// Options for opening a GIF stream.
#[derive(Clone, Debug)]
pub struct DecodeOptions {
    memory_limit: MemoryLimit,
    frame_limit: Option<usize>,
    prime_canvas: bool,
    timing: FrameTiming,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl DecodeOptions {
    /// Creates a new decoder builder
    #[must_use]
    #[inline]
    pub fn new() -> Self {
        Self {
            memory_limit: MemoryLimit::Bytes(DEFAULT_MEMORY_LIMIT),
            frame_limit: None,
            prime_canvas: false,
            timing: FrameTiming::default(),
        }
    }

    /// Configure a memory limit for the canvas and for each frame's index data.
    pub fn set_memory_limit(&mut self, limit: MemoryLimit) {
        self.memory_limit = limit;
    }

    /// Stop reading after `limit` frames; later frames are ignored.
    pub fn set_frame_limit(&mut self, limit: Option<usize>) {
        self.frame_limit = limit;
    }

    /// Composite frame 0 into the canvas while opening.
    ///
    /// Off by default: the canvas starts fully transparent and the first explicit
    /// render establishes frame 0. When enabled, rendering frame 0 afterwards draws
    /// it over its own primed result.
    pub fn set_prime_canvas(&mut self, prime: bool) {
        self.prime_canvas = prime;
    }

    /// Delay normalization applied by the animation timer.
    pub fn set_timing(&mut self, timing: FrameTiming) {
        self.timing = timing;
    }

    /// Whether frame 0 is composited while opening.
    #[must_use]
    pub fn prime_canvas(&self) -> bool {
        self.prime_canvas
    }

    /// Delay normalization applied by the animation timer.
    #[must_use]
    pub fn timing(&self) -> FrameTiming {
        self.timing
    }

    /// Reads the entire stream into a [`GifContainer`].
    ///
    /// Errors while reading the header, screen descriptor or global color table
    /// are [`GifError::OpenFailed`]; anything after that is [`GifError::ParseFailed`].
    pub fn read_container<S: ByteSource + ?Sized>(
        &self,
        source: &mut S,
    ) -> Result<GifContainer, GifError> {
        let mut parser = Parser {
            source,
            options: self,
        };
        let mut container = parser.read_screen().map_err(GifError::OpenFailed)?;
        parser
            .read_frames(&mut container)
            .map_err(GifError::ParseFailed)?;
        Ok(container)
    }
}

/// A fully parsed GIF: screen description, color tables and every frame.
#[derive(Debug, Clone)]
pub struct GifContainer {
    version: Version,
    width: u16,
    height: u16,
    global_palette: Option<ColorTable>,
    background_index: u8,
    frames: Vec<Frame>,
}

impl GifContainer {
    /// Assembles a container from already decoded parts.
    #[must_use]
    pub fn new(
        width: u16,
        height: u16,
        global_palette: Option<ColorTable>,
        background_index: u8,
        frames: Vec<Frame>,
    ) -> Self {
        Self {
            version: Version::V89a,
            width,
            height,
            global_palette,
            background_index,
            frames,
        }
    }

    /// Version read from the header.
    #[must_use]
    pub fn version(&self) -> Version {
        self.version
    }

    /// Width of the logical screen.
    #[must_use]
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Height of the logical screen.
    #[must_use]
    pub fn height(&self) -> u16 {
        self.height
    }

    /// The global color table, if the stream has one.
    #[must_use]
    pub fn global_palette(&self) -> Option<&ColorTable> {
        self.global_palette.as_ref()
    }

    /// Index of the background color in the global color table.
    #[must_use]
    pub fn background_index(&self) -> u8 {
        self.background_index
    }

    /// The background color, `None` if it cannot be resolved through the global table.
    #[must_use]
    pub fn background_color(&self) -> Option<Rgb> {
        self.global_palette
            .as_ref()
            .and_then(|table| table.get(self.background_index))
    }

    /// Frames in display order.
    #[must_use]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Frame at `index`.
    #[must_use]
    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    /// Number of frames.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Releases all color tables and index data, keeping frame geometry and timing.
    pub fn release_pixel_data(&mut self) {
        self.global_palette = None;
        for frame in &mut self.frames {
            frame.release_pixel_data();
        }
    }
}

struct Parser<'a, S: ?Sized> {
    source: &'a mut S,
    options: &'a DecodeOptions,
}

impl<S: ByteSource + ?Sized> Parser<'_, S> {
    fn byte(&mut self) -> Result<u8, FormatError> {
        Ok(self.source.read_le()?)
    }

    fn u16(&mut self) -> Result<u16, FormatError> {
        Ok(self.source.read_le()?)
    }

    fn read_screen(&mut self) -> Result<GifContainer, FormatError> {
        let mut magic = [0; 6];
        self.source.read_exact(&mut magic)?;
        if &magic[..3] != b"GIF" {
            return Err(FormatError::new("malformed GIF header"));
        }
        let version = match &magic[3..] {
            b"87a" => Version::V87a,
            b"89a" => Version::V89a,
            _ => return Err(FormatError::new("unsupported GIF version")),
        };
        let width = self.u16()?;
        let height = self.u16()?;
        if width == 0 || height == 0 {
            return Err(FormatError::new("logical screen has zero size"));
        }
        let flags = self.byte()?;
        let background_index = self.byte()?;
        let _aspect_ratio = self.byte()?;

        self.check_limit(u64::from(width) * u64::from(height) * 4)?;

        let global_palette = if flags & 0x80 != 0 {
            Some(self.read_color_table(flags & 0b111)?)
        } else {
            None
        };
        debug!(
            "GIF screen {}x{}, global color table: {}",
            width,
            height,
            global_palette.as_ref().map_or(0, ColorTable::len)
        );
        Ok(GifContainer {
            version,
            width,
            height,
            global_palette,
            background_index,
            frames: Vec::new(),
        })
    }

    fn read_color_table(&mut self, size_bits: u8) -> Result<ColorTable, FormatError> {
        let entries = 1usize << (size_bits + 1);
        let mut bytes = vec![0; entries * PLTE_CHANNELS];
        self.source.read_exact(&mut bytes)?;
        Ok(ColorTable::from_rgb_bytes(&bytes))
    }

    fn read_frames(&mut self, container: &mut GifContainer) -> Result<(), FormatError> {
        let mut control = None;
        loop {
            if self.frame_limit_reached(container) {
                debug!(
                    "frame limit reached, ignoring the rest of the stream after {} frames",
                    container.frames.len()
                );
                break;
            }
            let label = match self.byte() {
                Ok(label) => label,
                // A missing trailer is tolerated once the image has content.
                Err(_) if !container.frames.is_empty() => {
                    debug!("GIF stream ended without trailer");
                    break;
                }
                Err(err) => return Err(err),
            };
            match Block::from_u8(label) {
                Some(Block::Image) => {
                    let frame = self.read_frame(control.take())?;
                    trace!(
                        "frame {}: {}x{} at ({}, {})",
                        container.frames.len(),
                        frame.width,
                        frame.height,
                        frame.left,
                        frame.top
                    );
                    container.frames.push(frame);
                }
                Some(Block::Extension) => {
                    let ext = AnyExtension(self.byte()?);
                    if let Some(parsed) = self.read_extension(ext)? {
                        control = Some(parsed);
                    }
                }
                Some(Block::Trailer) => break,
                None => return Err(FormatError::new("unknown block type encountered")),
            }
        }
        if container.frames.is_empty() {
            return Err(FormatError::new("image contains no frames"));
        }
        Ok(())
    }

    fn frame_limit_reached(&self, container: &GifContainer) -> bool {
        self.options
            .frame_limit
            .is_some_and(|limit| container.frames.len() >= limit)
    }

    fn read_extension(
        &mut self,
        ext: AnyExtension,
    ) -> Result<Option<ControlExtension>, FormatError> {
        match ext.into_known() {
            Some(Extension::Control) => {
                if self.byte()? != 4 {
                    return Err(FormatError::new("control extension has wrong length"));
                }
                let flags = self.byte()?;
                let delay = self.u16()?;
                let trns = self.byte()?;
                self.skip_sub_blocks()?;
                Ok(Some(ControlExtension::from_packed(flags, delay, trns)))
            }
            Some(Extension::Text | Extension::Comment | Extension::Application) | None => {
                trace!("skipping extension {:#04x}", ext.0);
                self.skip_sub_blocks()?;
                Ok(None)
            }
        }
    }

    fn skip_sub_blocks(&mut self) -> Result<(), FormatError> {
        let mut block = [0; 0xFF];
        loop {
            let len = usize::from(self.byte()?);
            if len == 0 {
                return Ok(());
            }
            self.source.read_exact(&mut block[..len])?;
        }
    }

    fn read_frame(&mut self, control: Option<ControlExtension>) -> Result<Frame, FormatError> {
        let left = self.u16()?;
        let top = self.u16()?;
        let width = self.u16()?;
        let height = self.u16()?;
        let flags = self.byte()?;
        let palette = if flags & 0b1000_0000 != 0 {
            Some(self.read_color_table(flags & 0b0000_0111)?)
        } else {
            None
        };
        let mut frame = Frame {
            left,
            top,
            width,
            height,
            interlaced: flags & 0b0100_0000 != 0,
            palette,
            control,
            buffer: Vec::new(),
        };
        frame.buffer = self.read_image_data(frame.required_bytes())?;
        Ok(frame)
    }

    fn check_limit(&self, bytes: u64) -> Result<(), FormatError> {
        if !self.options.memory_limit.check(bytes) {
            return Err(FormatError::new("memory limit reached"));
        }
        Ok(())
    }

    /// Decodes the LZW sub-blocks of one image into exactly `len` indices.
    ///
    /// Short data is zero-filled, surplus data is dropped.
    fn read_image_data(&mut self, len: usize) -> Result<Vec<u8>, FormatError> {
        let code_size = self.byte()?;
        // Codes are at most 12 bits wide.
        if code_size > 11 || code_size < 2 {
            return Err(FormatError::new("invalid minimal code size"));
        }
        self.check_limit(len as u64)?;
        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(len)
            .map_err(|_| FormatError::new("out of memory"))?;
        buffer.resize(len, 0);

        let mut lzw = LzwDecoder::new(BitOrder::Lsb, code_size);
        let mut filled = 0;
        let mut block = [0; 0xFF];
        loop {
            let n = usize::from(self.byte()?);
            if n == 0 {
                break;
            }
            self.source.read_exact(&mut block[..n])?;
            let mut input = &block[..n];
            while !input.is_empty() && filled < len && !lzw.has_ended() {
                let decoded = lzw.decode_bytes(input, &mut buffer[filled..]);
                decoded
                    .status
                    .map_err(|_| FormatError::new("invalid LZW code in image data"))?;
                filled += decoded.consumed_out;
                input = &input[decoded.consumed_in..];
                if decoded.consumed_in == 0 && decoded.consumed_out == 0 {
                    break;
                }
            }
        }
        // Flush output still held by the decoder.
        while filled < len && !lzw.has_ended() {
            let decoded = lzw.decode_bytes(&[], &mut buffer[filled..]);
            match decoded.status {
                Ok(LzwStatus::Ok | LzwStatus::Done) if decoded.consumed_out > 0 => {
                    filled += decoded.consumed_out;
                }
                Ok(_) => break,
                Err(_) => return Err(FormatError::new("invalid LZW code in image data")),
            }
        }
        if filled < len {
            debug!("image data ended after {} of {} pixels", filled, len);
        }
        Ok(buffer)
    }
}

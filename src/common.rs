//! Common types describing the parsed GIF model
use alloc::vec::Vec;

/// GIF palettes are RGB
pub const PLTE_CHANNELS: usize = 3;

/// An RGB triple from a color table.
pub type Rgb = [u8; 3];

/// Disposal method
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum DisposalMethod {
    /// No disposal was specified, treated like [`DoNotDispose`](Self::DoNotDispose).
    #[default]
    Unspecified = 0,
    /// Leave the frame in place as the base for the next one.
    DoNotDispose = 1,
    /// Restore the frame's rectangle to the background color.
    RestoreBackground = 2,
    /// Restore the canvas to its state before the frame was drawn.
    RestorePrevious = 3,
}

impl DisposalMethod {
    /// Maps the three disposal bits of a graphics control block.
    ///
    /// The reserved values 4..=7 are treated as unspecified.
    #[must_use]
    pub fn from_u8(n: u8) -> Self {
        match n {
            1 => Self::DoNotDispose,
            2 => Self::RestoreBackground,
            3 => Self::RestorePrevious,
            _ => Self::Unspecified,
        }
    }
}

/// Known block types
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum Block {
    /// Image block.
    Image = 0x2C,
    /// Extension block.
    Extension = 0x21,
    /// Image trailer.
    Trailer = 0x3B,
}

impl Block {
    /// Converts `u8` to `Option<Self>`
    #[must_use]
    pub fn from_u8(n: u8) -> Option<Self> {
        match n {
            0x2C => Some(Self::Image),
            0x21 => Some(Self::Extension),
            0x3B => Some(Self::Trailer),
            _ => None,
        }
    }
}

/// A newtype wrapper around an arbitrary extension ID.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AnyExtension(pub u8);

/// Known GIF extension labels
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum Extension {
    /// Plain Text extension.
    Text = 0x01,
    /// Control extension.
    Control = 0xF9,
    /// Comment extension.
    Comment = 0xFE,
    /// Application extension.
    Application = 0xFF,
}

impl AnyExtension {
    /// Decode the label as a known extension.
    #[must_use]
    pub fn into_known(self) -> Option<Extension> {
        Extension::from_u8(self.0)
    }
}

impl Extension {
    /// Converts `u8` to a `Extension` if it is known.
    #[must_use]
    pub fn from_u8(n: u8) -> Option<Self> {
        match n {
            0x01 => Some(Self::Text),
            0xF9 => Some(Self::Control),
            0xFE => Some(Self::Comment),
            0xFF => Some(Self::Application),
            _ => None,
        }
    }
}

/// An ordered sequence of RGB entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorTable {
    colors: Vec<Rgb>,
}

impl ColorTable {
    /// Creates a table from RGB entries.
    #[must_use]
    pub fn new(colors: Vec<Rgb>) -> Self {
        Self { colors }
    }

    /// Creates a table from packed `[r, g, b, r, g, b, ...]` bytes.
    ///
    /// A trailing partial entry is ignored.
    #[must_use]
    pub fn from_rgb_bytes(bytes: &[u8]) -> Self {
        let colors = bytes
            .chunks_exact(PLTE_CHANNELS)
            .map(|c| [c[0], c[1], c[2]])
            .collect();
        Self { colors }
    }

    /// Looks up an index, `None` when it lies outside the table.
    #[inline]
    #[must_use]
    pub fn get(&self, index: u8) -> Option<Rgb> {
        self.colors.get(usize::from(index)).copied()
    }

    /// Number of entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Whether the table has no entries.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// The entries in table order.
    #[must_use]
    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }
}

/// Contents of a graphics control extension.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct ControlExtension {
    /// Frame delay in units of 10 ms.
    pub delay: u16,
    /// Disposal method.
    pub dispose: DisposalMethod,
    /// Transparent index (if available).
    pub transparent: Option<u8>,
    /// True if the frame needs user input to be displayed.
    pub needs_user_input: bool,
}

impl ControlExtension {
    /// Decodes the packed flags byte, delay and transparent index of the extension.
    #[must_use]
    pub fn from_packed(flags: u8, delay: u16, trns: u8) -> Self {
        Self {
            delay,
            dispose: DisposalMethod::from_u8((flags & 0b1_1100) >> 2),
            transparent: if flags & 1 != 0 { Some(trns) } else { None },
            needs_user_input: flags & 0b10 != 0,
        }
    }
}

/// A GIF frame
#[derive(Debug, Clone, Default)]
pub struct Frame {
    /// Offset from the left of the screen.
    pub left: u16,
    /// Offset from the top of the screen.
    pub top: u16,
    /// Width of the frame.
    pub width: u16,
    /// Height of the frame.
    pub height: u16,
    /// True if the rows are stored in the 4-pass interlaced order.
    pub interlaced: bool,
    /// Local color table, overriding the global one for this frame.
    pub palette: Option<ColorTable>,
    /// Graphics control extension preceding the image, if there was one.
    pub control: Option<ControlExtension>,
    /// Color table indices in storage order, `width * height` long.
    pub buffer: Vec<u8>,
}

impl Frame {
    /// Disposal method, [`DisposalMethod::Unspecified`] without a control extension.
    #[inline]
    #[must_use]
    pub fn dispose(&self) -> DisposalMethod {
        self.control.map_or(DisposalMethod::Unspecified, |c| c.dispose)
    }

    /// Transparent index, `None` without a control extension.
    #[inline]
    #[must_use]
    pub fn transparent(&self) -> Option<u8> {
        self.control.and_then(|c| c.transparent)
    }

    /// Delay in centiseconds, `None` when the frame carries no timing information.
    #[inline]
    #[must_use]
    pub fn delay(&self) -> Option<u16> {
        self.control.map(|c| c.delay)
    }

    /// Number of color indices the frame rectangle holds.
    #[inline]
    #[must_use]
    pub fn required_bytes(&self) -> usize {
        usize::from(self.width) * usize::from(self.height)
    }

    /// Drops the index data and local color table, keeping geometry and timing.
    pub fn release_pixel_data(&mut self) {
        self.buffer = Vec::new();
        self.palette = None;
    }
}

#[test]
fn control_flags() {
    let control = ControlExtension::from_packed(0b0000_1001, 7, 3);
    assert_eq!(control.dispose, DisposalMethod::RestoreBackground);
    assert_eq!(control.transparent, Some(3));
    assert_eq!(control.delay, 7);
    assert!(!control.needs_user_input);

    let control = ControlExtension::from_packed(0b0001_1110, 0, 3);
    assert_eq!(control.dispose, DisposalMethod::Unspecified);
    assert_eq!(control.transparent, None);
    assert!(control.needs_user_input);
}

#[test]
fn color_table_lookup() {
    let table = ColorTable::from_rgb_bytes(&[1, 2, 3, 4, 5, 6, 7]);
    assert_eq!(table.len(), 2);
    assert_eq!(table.get(1), Some([4, 5, 6]));
    assert_eq!(table.get(2), None);
    assert_eq!(table.get(255), None);
}

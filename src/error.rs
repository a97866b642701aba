//! Error taxonomy shared by the parser, compositor and format adapter.
use alloc::fmt;

use crate::format::PixelFormat;
use crate::io::IoError;

/// The stream is not laid out the way the GIF grammar requires.
///
/// Carries a short diagnostic describing which structure was malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatError {
    message: &'static str,
}

impl FormatError {
    #[inline]
    pub(crate) const fn new(message: &'static str) -> Self {
        Self { message }
    }

    /// The diagnostic message.
    #[must_use]
    pub fn message(&self) -> &'static str {
        self.message
    }
}

impl core::error::Error for FormatError {}
impl fmt::Display for FormatError {
    #[cold]
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.write_str(self.message)
    }
}

impl From<IoError> for FormatError {
    #[cold]
    fn from(_: IoError) -> Self {
        Self::new("unexpected end of file")
    }
}

/// Errors reported by an [`AnimatedGif`](crate::AnimatedGif) and the free functions of this crate.
///
/// None of them are fatal to the decoder instance: a failed open leaves it closed,
/// a failed render leaves the persistent canvas untouched.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum GifError {
    /// The header, logical screen descriptor or global color table could not be read.
    OpenFailed(FormatError),
    /// The header was accepted but the remainder of the stream is malformed.
    ParseFailed(FormatError),
    /// A frame with pixel data has neither a local nor a global color table.
    NoColorTable,
    /// The requested output format cannot be produced.
    UnsupportedFormat(PixelFormat),
    /// Teardown was requested but there was no open image to release.
    CloseFailed,
    /// No image is open, or its pixel data has already been released.
    NotOpen,
    /// The caller's output buffer is smaller than the size query reported.
    OutputTooSmall {
        /// Bytes required by the requested format and resolution.
        expected: usize,
        /// Bytes supplied.
        actual: usize,
    },
    /// The requested output resolution is too large to address or allocate.
    OutputTooLarge {
        /// Requested width in pixels.
        width: usize,
        /// Requested height in pixels.
        height: usize,
    },
}

impl GifError {
    #[inline]
    pub(crate) fn open(message: &'static str) -> Self {
        Self::OpenFailed(FormatError::new(message))
    }

    #[inline]
    pub(crate) fn parse(message: &'static str) -> Self {
        Self::ParseFailed(FormatError::new(message))
    }
}

impl fmt::Display for GifError {
    #[cold]
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenFailed(err) => write!(fmt, "failed to open GIF image: {err}"),
            Self::ParseFailed(err) => write!(fmt, "failed to parse GIF image: {err}"),
            Self::NoColorTable => fmt.write_str("frame has no color table"),
            Self::UnsupportedFormat(format) => {
                write!(fmt, "unsupported output format \"{}\"", format.name())
            }
            Self::CloseFailed => fmt.write_str("failed to close GIF image: nothing is open"),
            Self::NotOpen => fmt.write_str("no GIF image is open"),
            Self::OutputTooSmall { expected, actual } => write!(
                fmt,
                "output buffer too small: {actual} bytes given, {expected} required"
            ),
            Self::OutputTooLarge { width, height } => {
                write!(fmt, "requested {width}x{height} output is too large")
            }
        }
    }
}

impl core::error::Error for GifError {
    #[cold]
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::OpenFailed(err) | Self::ParseFailed(err) => Some(err),
            _ => None,
        }
    }
}

#[test]
fn error_cast() {
    use alloc::boxed::Box;
    let _: Box<dyn core::error::Error> = GifError::open("testing").into();
}

#[test]
fn display_includes_diagnostic() {
    use alloc::string::ToString;
    let err = GifError::parse("unknown block type encountered");
    assert_eq!(
        err.to_string(),
        "failed to parse GIF image: unknown block type encountered"
    );
}

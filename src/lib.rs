#![forbid(unsafe_code)]
//! # Animated GIF decoding and compositing
//!
//! This library reads an in-memory GIF stream, composites its frames onto a persistent
//! canvas following each frame's disposal method, and hands out the result in the pixel
//! layout and resolution the caller asks for. It also keeps track of which frame is
//! selected and when the next one is due.
//!
//! ## no_std support
//!
//! This crate supports `no_std` environments with an allocator. Disable the default `std` feature:
//!
//! ```toml
//! [dependencies]
//! gif-canvas = { version = "0.1", default-features = false }
//! ```
//!
//! Without `std` there is no system clock; supply your own [`Clock`] through
//! [`AnimatedGif::with_clock`].
//!
//! ## High level interface
//!
//! The high level interface is [`AnimatedGif`]. It parses the whole stream when it is
//! opened and then renders one frame per call:
//!
#![cfg_attr(feature = "std", doc = "```rust")]
#![cfg_attr(not(feature = "std"), doc = "```rust,ignore")]
//! use gif_canvas::{AnimatedGif, PixelFormat};
//! use gif_canvas::io::MemoryStream;
//!
//! # let bytes: &[u8] = &[
//! #     0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00,
//! #     0xFF, 0x00, 0x00, 0x00, 0x00, 0x00,
//! #     0x2C, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00,
//! #     0x02, 0x02, 0x44, 0x01, 0x00, 0x3B,
//! # ];
//! let mut gif = AnimatedGif::new();
//! gif.open(&mut MemoryStream::new(bytes)).unwrap();
//!
//! let size = gif.frame_size(PixelFormat::Rgba8888).unwrap();
//! let mut pixels = vec![0; size.bytes];
//! gif.frame_data(PixelFormat::Rgba8888, &mut pixels).unwrap();
//! assert_eq!(pixels, [0xFF, 0x00, 0x00, 0xFF]);
//!
//! if gif.should_advance() {
//!     gif.next_frame();
//! }
//! ```
//!
//! Requesting [`PixelFormat::Dxt1Runtime`] pads the screen up to power-of-two
//! dimensions with nearest-neighbor sampling and compresses the result.
//!
//! ## Lower level pieces
//!
//! [`DecodeOptions::read_container`] parses a stream into a [`GifContainer`],
//! [`Canvas`] composites and disposes frames, the [`format`] module converts and
//! resamples RGBA buffers and [`FrameTimer`] drives frame selection.
#![deny(missing_docs)]
#![allow(unknown_lints)] // Certain lints only apply to later versions of Rust
#![allow(clippy::manual_range_contains)]
#![allow(clippy::new_without_default)]
#![deny(clippy::alloc_instead_of_core)]
#![deny(clippy::std_instead_of_alloc)]
#![deny(clippy::std_instead_of_core)]
#![cfg_attr(not(feature = "std"), no_std)]

#[macro_use]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

mod animation;
mod cache;
mod common;
mod compositor;
mod dxt;
mod error;
pub mod format;
pub mod io;
mod reader;
mod timer;
mod traits;

pub use crate::animation::AnimatedGif;
pub use crate::cache::LastUsedCache;
pub use crate::common::{
    AnyExtension, Block, ColorTable, ControlExtension, DisposalMethod, Extension, Frame, Rgb,
};
pub use crate::compositor::{storage_rows, Canvas};
pub use crate::error::{FormatError, GifError};
pub use crate::format::{OutputSize, PixelFormat};
pub use crate::reader::{DecodeOptions, GifContainer, MemoryLimit, Version};
#[cfg(feature = "std")]
pub use crate::timer::MonotonicClock;
pub use crate::timer::{Clock, FrameTiming, FrameTimer, ManualClock};

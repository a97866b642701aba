//! The decoder instance: one open GIF, its canvas and its frame timer.
use tracing::{debug, warn};

use crate::compositor::Canvas;
use crate::error::GifError;
use crate::format::{self, OutputSize, PixelFormat};
use crate::io::ByteSource;
use crate::reader::{DecodeOptions, GifContainer};
use crate::timer::{Clock, FrameTimer};

#[cfg(feature = "std")]
use crate::timer::MonotonicClock;

/// An animated GIF ready to be rendered frame by frame.
///
/// The whole stream is parsed on [`open`](Self::open). Rendering composites the
/// selected frame over the persistent canvas and converts the result into the
/// requested pixel format; [`next_frame`](Self::next_frame) moves the selection
/// and schedules the following advance.
///
/// ```
/// use gif_canvas::{AnimatedGif, PixelFormat};
/// use gif_canvas::io::MemoryStream;
/// # fn run(bytes: &[u8]) -> Result<(), gif_canvas::GifError> {
/// let mut gif = AnimatedGif::new();
/// gif.open(&mut MemoryStream::new(bytes))?;
/// let size = gif.frame_size(PixelFormat::Rgba8888)?;
/// let mut pixels = vec![0; size.bytes];
/// loop {
///     gif.frame_data(PixelFormat::Rgba8888, &mut pixels)?;
///     // upload `pixels` somewhere
///     if gif.next_frame() {
///         break;
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct AnimatedGif<C> {
    clock: C,
    options: DecodeOptions,
    container: Option<GifContainer>,
    canvas: Option<Canvas>,
    timer: FrameTimer,
}

#[cfg(feature = "std")]
impl AnimatedGif<MonotonicClock> {
    /// A closed decoder timed by the system's monotonic clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(MonotonicClock::new())
    }
}

#[cfg(feature = "std")]
impl Default for AnimatedGif<MonotonicClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> AnimatedGif<C> {
    /// A closed decoder with default options.
    pub fn with_clock(clock: C) -> Self {
        Self::with_options(DecodeOptions::new(), clock)
    }

    /// A closed decoder opening streams with `options`.
    pub fn with_options(options: DecodeOptions, clock: C) -> Self {
        let timer = FrameTimer::new(options.timing());
        Self {
            clock,
            options,
            container: None,
            canvas: None,
            timer,
        }
    }

    /// The clock driving the animation.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Options applied by the next [`open`](Self::open).
    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// Replaces the options used by later opens.
    pub fn set_options(&mut self, options: DecodeOptions) {
        self.options = options;
    }

    /// Parses the whole stream, replacing any image that is currently open.
    ///
    /// On failure the decoder is left closed.
    pub fn open<S: ByteSource + ?Sized>(&mut self, source: &mut S) -> Result<(), GifError> {
        if self.release() {
            debug!("released the previous image before opening a new one");
        }
        let container = match self.options.read_container(source) {
            Ok(container) => container,
            Err(err) => {
                warn!("{}", err);
                return Err(err);
            }
        };
        debug!(
            "opened {}x{} GIF with {} frames",
            container.width(),
            container.height(),
            container.frame_count()
        );

        let mut canvas = Canvas::for_container(&container);
        if self.options.prime_canvas() {
            match canvas.compose(&container, 0) {
                Ok(composed) => {
                    canvas.dispose(&container.frames()[0], composed, container.background_color());
                }
                Err(err) => warn!("failed to prime canvas with the first frame: {}", err),
            }
        }
        self.timer = FrameTimer::new(self.options.timing());
        self.container = Some(container);
        self.canvas = Some(canvas);
        Ok(())
    }

    /// Releases the image and resets selection and timing.
    ///
    /// Reports [`GifError::CloseFailed`] when nothing was open; the state is reset
    /// either way. Closing twice is harmless and only logged at debug level.
    pub fn close(&mut self) -> Result<(), GifError> {
        if self.release() {
            Ok(())
        } else {
            debug!("{}", GifError::CloseFailed);
            Err(GifError::CloseFailed)
        }
    }

    /// Drops the image and resets selection and timing, returning whether one was open.
    fn release(&mut self) -> bool {
        self.canvas = None;
        self.timer.reset();
        self.container.take().is_some()
    }

    /// Releases the canvas, color tables and index data but keeps frame geometry and
    /// timing, so the animation can still be stepped through after its frames were
    /// copied elsewhere.
    pub fn close_keep_metadata(&mut self) {
        self.canvas = None;
        if let Some(container) = self.container.as_mut() {
            container.release_pixel_data();
        }
    }

    /// Whether an image is open with its pixel data available.
    pub fn is_open(&self) -> bool {
        self.canvas.is_some()
    }

    /// The parsed image, also available after [`close_keep_metadata`](Self::close_keep_metadata).
    pub fn container(&self) -> Option<&GifContainer> {
        self.container.as_ref()
    }

    /// The persistent canvas.
    pub fn canvas(&self) -> Option<&Canvas> {
        self.canvas.as_ref()
    }

    /// Number of frames, 0 when closed.
    pub fn frame_count(&self) -> usize {
        self.container.as_ref().map_or(0, GifContainer::frame_count)
    }

    /// Index of the frame the next render draws.
    pub fn selected_frame(&self) -> usize {
        self.timer.selected()
    }

    /// Selects a frame directly. Out of range indices are ignored.
    pub fn set_selected_frame(&mut self, index: usize) {
        if index < self.frame_count() {
            self.timer.select(index);
        }
    }

    /// Selects the next frame, returning `true` when it wrapped back to frame 0.
    pub fn next_frame(&mut self) -> bool {
        let now = self.clock.now();
        match self.container.as_ref() {
            Some(container) => self.timer.advance(container.frames(), now),
            None => false,
        }
    }

    /// Whether the selected frame has been shown long enough.
    pub fn should_advance(&self) -> bool {
        self.is_due(self.clock.now())
    }

    /// Whether the next advance is due at `now`.
    pub fn is_due(&self, now: core::time::Duration) -> bool {
        self.timer.is_due(now)
    }

    /// The timer state.
    pub fn timer(&self) -> &FrameTimer {
        &self.timer
    }

    /// Logical screen size.
    pub fn screen_size(&self) -> Option<(u16, u16)> {
        self.container.as_ref().map(|c| (c.width(), c.height()))
    }

    /// Size of the selected frame's rectangle.
    pub fn frame_rect_size(&self) -> Option<(u16, u16)> {
        let container = self.container.as_ref()?;
        let frame = container.frame(self.timer.selected())?;
        Some((frame.width, frame.height))
    }

    /// Buffer size and resolution [`frame_data`](Self::frame_data) produces for `format`.
    pub fn frame_size(&self, format: PixelFormat) -> Result<OutputSize, GifError> {
        let (width, height) = self.screen_size().ok_or(GifError::NotOpen)?;
        format::output_size(format, usize::from(width), usize::from(height))
    }

    /// Renders the selected frame into `out` as `format`.
    ///
    /// `out` must be at least [`frame_size`](Self::frame_size) bytes. The canvas is
    /// then updated according to the frame's disposal method. On error `out` and the
    /// canvas are left untouched.
    pub fn frame_data(&mut self, format: PixelFormat, out: &mut [u8]) -> Result<(), GifError> {
        let size = self.frame_size(format).inspect_err(|err| warn!("{}", err))?;
        self.render(format, size.width, size.height, out)
    }

    /// Renders the selected frame resampled to `width` x `height`.
    ///
    /// `out` must hold `format.memory_required(width, height)` bytes. Resolutions whose
    /// size overflows fail with [`GifError::OutputTooLarge`].
    pub fn frame_data_scaled(
        &mut self,
        format: PixelFormat,
        width: usize,
        height: usize,
        out: &mut [u8],
    ) -> Result<(), GifError> {
        self.render(format, width, height, out)
    }

    fn render(
        &mut self,
        format: PixelFormat,
        width: usize,
        height: usize,
        out: &mut [u8],
    ) -> Result<(), GifError> {
        let result = self.try_render(format, width, height, out);
        if let Err(err) = &result {
            warn!("failed to render frame {}: {}", self.timer.selected(), err);
        }
        result
    }

    fn try_render(
        &mut self,
        format: PixelFormat,
        width: usize,
        height: usize,
        out: &mut [u8],
    ) -> Result<(), GifError> {
        format::check_output(format, width, height, out.len())?;
        let (Some(container), Some(canvas)) = (self.container.as_ref(), self.canvas.as_mut())
        else {
            return Err(GifError::NotOpen);
        };
        let index = self.timer.selected();
        let composed = canvas.compose(container, index)?;
        format::convert_and_scale(
            &composed,
            canvas.width(),
            canvas.height(),
            format,
            width,
            height,
            out,
        )?;
        canvas.dispose(&container.frames()[index], composed, container.background_color());
        Ok(())
    }
}

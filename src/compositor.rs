//! Frame compositing onto a persistent canvas.
//!
//! The canvas holds the screen as the next frame should be drawn onto it. Compositing
//! never writes to it directly: a frame is drawn into a copy, and only the disposal
//! method decides what the canvas becomes afterwards.
use alloc::vec::Vec;

use tracing::debug;

use crate::common::{DisposalMethod, Frame, Rgb};
use crate::error::GifError;
use crate::reader::GifContainer;

/// Row offset and stride of each pass of an interlaced image.
const INTERLACE_PASSES: [(usize, usize); 4] = [(0, 8), (4, 8), (2, 4), (1, 2)];

/// Frame rows in the order their indices are stored.
///
/// Progressive frames store rows top to bottom; interlaced ones store every 8th row
/// from 0, every 8th from 4, every 4th from 2 and finally every 2nd from 1.
pub fn storage_rows(height: usize, interlaced: bool) -> impl Iterator<Item = usize> {
    let passes: &'static [(usize, usize)] = if interlaced {
        &INTERLACE_PASSES
    } else {
        &[(0, 1)]
    };
    passes
        .iter()
        .flat_map(move |&(offset, stride)| (offset..height).step_by(stride))
}

/// Screen-sized RGBA buffer accumulating the animation across frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Canvas {
    /// A fully transparent canvas.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height * 4],
        }
    }

    /// Canvas sized for the logical screen of `container`.
    #[must_use]
    pub fn for_container(container: &GifContainer) -> Self {
        Self::new(
            usize::from(container.width()),
            usize::from(container.height()),
        )
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// RGBA pixels, row-major without padding.
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Draws frame `index` of `container` over a copy of the canvas.
    ///
    /// Pixels outside the screen, transparent pixels and indices outside the color
    /// table leave the copied canvas pixel in place.
    pub fn compose(&self, container: &GifContainer, index: usize) -> Result<Vec<u8>, GifError> {
        let frame = container.frame(index).ok_or(GifError::NotOpen)?;
        let mut composed = self.pixels.clone();
        let palette = match frame.palette.as_ref().or(container.global_palette()) {
            Some(palette) => palette,
            None if frame.buffer.is_empty() => return Ok(composed),
            None => return Err(GifError::NoColorTable),
        };
        let transparent = frame.transparent();
        let (left, top) = (usize::from(frame.left), usize::from(frame.top));
        let width = usize::from(frame.width);
        if width == 0 {
            return Ok(composed);
        }

        let rows = storage_rows(usize::from(frame.height), frame.interlaced);
        for (y, indices) in rows.zip(frame.buffer.chunks_exact(width)) {
            let screen_y = top + y;
            if screen_y >= self.height {
                continue;
            }
            let row = &mut composed[screen_y * self.width * 4..(screen_y + 1) * self.width * 4];
            let visible = self.width.saturating_sub(left).min(width);
            for (x, &index) in indices[..visible].iter().enumerate() {
                if Some(index) == transparent {
                    continue;
                }
                if let Some([r, g, b]) = palette.get(index) {
                    let offset = (left + x) * 4;
                    row[offset..offset + 4].copy_from_slice(&[r, g, b, 0xFF]);
                }
            }
        }
        Ok(composed)
    }

    /// Decides what the canvas becomes after `frame` was composited into `composed`.
    ///
    /// - unspecified / do not dispose: the composited image.
    /// - restore background: the previous canvas with the frame rectangle filled
    ///   with `background` at full opacity. Left untouched when there is no
    ///   background color.
    /// - restore previous: the previous canvas, unchanged.
    pub fn dispose(&mut self, frame: &Frame, composed: Vec<u8>, background: Option<Rgb>) {
        debug_assert_eq!(composed.len(), self.pixels.len());
        match frame.dispose() {
            DisposalMethod::Unspecified | DisposalMethod::DoNotDispose => {
                self.pixels = composed;
            }
            DisposalMethod::RestoreBackground => match background {
                Some(color) => self.fill_rect(frame, color),
                None => debug!("background disposal without a resolvable background color"),
            },
            DisposalMethod::RestorePrevious => {}
        }
    }

    fn fill_rect(&mut self, frame: &Frame, [r, g, b]: Rgb) {
        let (left, top) = (usize::from(frame.left), usize::from(frame.top));
        let fill_width = usize::from(frame.width).min(self.width.saturating_sub(left));
        let fill_height = usize::from(frame.height).min(self.height.saturating_sub(top));
        if fill_width == 0 {
            return;
        }
        let stride = self.width * 4;
        for y in top..top + fill_height {
            let row = &mut self.pixels[y * stride + left * 4..y * stride + (left + fill_width) * 4];
            for pixel in row.chunks_exact_mut(4) {
                pixel.copy_from_slice(&[r, g, b, 0xFF]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{ColorTable, ControlExtension};
    use alloc::vec::Vec;

    const RED: [u8; 4] = [255, 0, 0, 255];
    const GREEN: [u8; 4] = [0, 255, 0, 255];
    const BLUE: [u8; 4] = [0, 0, 255, 255];
    const CLEAR: [u8; 4] = [0, 0, 0, 0];

    fn palette() -> ColorTable {
        ColorTable::new(vec![[255, 0, 0], [0, 255, 0], [0, 0, 255]])
    }

    fn frame(left: u16, top: u16, width: u16, height: u16, buffer: Vec<u8>) -> Frame {
        Frame {
            left,
            top,
            width,
            height,
            buffer,
            ..Frame::default()
        }
    }

    fn with_control(mut frame: Frame, dispose: DisposalMethod, transparent: Option<u8>) -> Frame {
        frame.control = Some(ControlExtension {
            dispose,
            transparent,
            ..ControlExtension::default()
        });
        frame
    }

    fn pixel(buffer: &[u8], width: usize, x: usize, y: usize) -> [u8; 4] {
        let offset = (y * width + x) * 4;
        buffer[offset..offset + 4].try_into().unwrap()
    }

    #[test]
    fn interlaced_row_order() {
        let rows: Vec<usize> = storage_rows(10, true).collect();
        assert_eq!(rows, [0, 8, 4, 2, 6, 1, 3, 5, 7, 9]);
        let rows: Vec<usize> = storage_rows(3, false).collect();
        assert_eq!(rows, [0, 1, 2]);
        assert_eq!(storage_rows(0, true).count(), 0);
    }

    #[test]
    fn maps_indices_through_palette() {
        let container = GifContainer::new(
            2,
            2,
            Some(palette()),
            0,
            vec![frame(0, 0, 2, 2, vec![0, 1, 2, 0])],
        );
        let canvas = Canvas::for_container(&container);
        let composed = canvas.compose(&container, 0).unwrap();
        assert_eq!(composed, [RED, GREEN, BLUE, RED].concat());
    }

    #[test]
    fn interlaced_rows_land_in_display_position() {
        // Stored row order for height 4 is 0, 2, 1, 3.
        let container = GifContainer::new(
            1,
            4,
            Some(palette()),
            0,
            vec![Frame {
                interlaced: true,
                ..frame(0, 0, 1, 4, vec![0, 1, 2, 0])
            }],
        );
        let composed = Canvas::for_container(&container)
            .compose(&container, 0)
            .unwrap();
        assert_eq!(composed, [RED, BLUE, GREEN, RED].concat());
    }

    #[test]
    fn clips_to_screen_and_keeps_consuming_indices() {
        // 3x2 frame at (1, 1) on a 2x2 screen: only the first index of the first row is visible.
        let container = GifContainer::new(
            2,
            2,
            Some(palette()),
            0,
            vec![frame(1, 1, 3, 2, vec![1, 2, 2, 0, 0, 0])],
        );
        let composed = Canvas::for_container(&container)
            .compose(&container, 0)
            .unwrap();
        assert_eq!(composed, [CLEAR, CLEAR, CLEAR, GREEN].concat());
    }

    #[test]
    fn frame_entirely_off_screen() {
        let container = GifContainer::new(
            2,
            2,
            Some(palette()),
            0,
            vec![frame(5, 5, 2, 2, vec![1; 4])],
        );
        let canvas = Canvas::for_container(&container);
        assert_eq!(canvas.compose(&container, 0).unwrap(), canvas.pixels());
    }

    #[test]
    fn transparent_and_out_of_range_indices_keep_canvas() {
        let container = GifContainer::new(
            3,
            1,
            Some(palette()),
            0,
            vec![
                frame(0, 0, 3, 1, vec![0, 0, 0]),
                with_control(frame(0, 0, 3, 1, vec![1, 2, 200]), DisposalMethod::DoNotDispose, Some(1)),
            ],
        );
        let mut canvas = Canvas::for_container(&container);
        let first = canvas.compose(&container, 0).unwrap();
        canvas.dispose(&container.frames()[0], first, None);
        let second = canvas.compose(&container, 1).unwrap();
        assert_eq!(second, [RED, BLUE, RED].concat());
    }

    #[test]
    fn missing_color_table() {
        let container = GifContainer::new(1, 1, None, 0, vec![frame(0, 0, 1, 1, vec![0])]);
        let canvas = Canvas::for_container(&container);
        assert!(matches!(
            canvas.compose(&container, 0),
            Err(GifError::NoColorTable)
        ));

        let empty = GifContainer::new(1, 1, None, 0, vec![frame(0, 0, 0, 0, vec![])]);
        assert_eq!(canvas.compose(&empty, 0).unwrap(), canvas.pixels());
    }

    #[test]
    fn local_table_overrides_global() {
        let container = GifContainer::new(
            1,
            1,
            Some(palette()),
            0,
            vec![Frame {
                palette: Some(ColorTable::new(vec![[9, 9, 9]])),
                ..frame(0, 0, 1, 1, vec![0])
            }],
        );
        let composed = Canvas::for_container(&container)
            .compose(&container, 0)
            .unwrap();
        assert_eq!(composed, [9, 9, 9, 255]);
    }

    #[test]
    fn background_disposal_fills_frame_rect_only() {
        let background = frame(0, 0, 3, 1, vec![2, 2, 2]);
        let top = with_control(
            frame(1, 0, 1, 1, vec![0]),
            DisposalMethod::RestoreBackground,
            None,
        );
        let container = GifContainer::new(3, 1, Some(palette()), 1, vec![background, top]);
        let mut canvas = Canvas::for_container(&container);
        let composed = canvas.compose(&container, 0).unwrap();
        canvas.dispose(&container.frames()[0], composed, None);

        let composed = canvas.compose(&container, 1).unwrap();
        assert_eq!(composed, [BLUE, RED, BLUE].concat());
        canvas.dispose(&container.frames()[1], composed, container.background_color());
        assert_eq!(canvas.pixels(), [BLUE, GREEN, BLUE].concat());
    }

    #[test]
    fn background_fill_is_clipped() {
        let container = GifContainer::new(
            2,
            2,
            Some(palette()),
            2,
            vec![with_control(
                frame(1, 1, 4, 4, vec![0; 16]),
                DisposalMethod::RestoreBackground,
                None,
            )],
        );
        let mut canvas = Canvas::for_container(&container);
        let composed = canvas.compose(&container, 0).unwrap();
        canvas.dispose(&container.frames()[0], composed, container.background_color());
        assert_eq!(pixel(canvas.pixels(), 2, 1, 1), BLUE);
        assert_eq!(pixel(canvas.pixels(), 2, 0, 0), CLEAR);
        assert_eq!(pixel(canvas.pixels(), 2, 1, 0), CLEAR);
    }

    #[test]
    fn restore_previous_keeps_canvas() {
        let container = GifContainer::new(
            1,
            1,
            Some(palette()),
            0,
            vec![with_control(
                frame(0, 0, 1, 1, vec![1]),
                DisposalMethod::RestorePrevious,
                None,
            )],
        );
        let mut canvas = Canvas::for_container(&container);
        let before = canvas.clone();
        let composed = canvas.compose(&container, 0).unwrap();
        assert_eq!(composed, GREEN);
        canvas.dispose(&container.frames()[0], composed, None);
        assert_eq!(canvas, before);
    }
}

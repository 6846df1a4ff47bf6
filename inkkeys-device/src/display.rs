//! Monochrome bitmaps and the panel layout
//!
//! The e-ink panel is mounted upside down relative to its controller's
//! scan order, so every region is sent rotated by 180 degrees. Pixel data
//! is packed 8 pixels per byte, most significant bit first, each row padded
//! to a whole byte. A set bit is a white pixel.

use std::convert::Infallible;

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;

use crate::error::DeviceError;

/// Height of the banner strips separating the button columns
pub const BANNER_HEIGHT: u32 = 20;

/// Width of the title strip
pub const TITLE_WIDTH: u32 = 40;

/// 1-bit image, `true` is white
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    pixels: Vec<bool>,
}

impl Bitmap {
    /// New bitmap filled with white (`true`) or black (`false`)
    pub fn new(width: u32, height: u32, white: bool) -> Self {
        Self {
            width,
            height,
            pixels: vec![white; (width * height) as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| (y * self.width + x) as usize)
    }

    /// Pixel at `(x, y)`; out of bounds reads as white
    pub fn get(&self, x: u32, y: u32) -> bool {
        self.index(x, y).map_or(true, |i| self.pixels[i])
    }

    /// Set a pixel; out of bounds writes are ignored
    pub fn set(&mut self, x: u32, y: u32, white: bool) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = white;
        }
    }

    pub fn invert(&mut self) {
        self.pixels.iter_mut().for_each(|p| *p = !*p);
    }

    /// Rotate 90 degrees clockwise; width and height swap
    pub fn rotate_cw(&self) -> Self {
        let mut out = Self::new(self.height, self.width, true);
        for y in 0..self.height {
            for x in 0..self.width {
                out.set(self.height - 1 - y, x, self.get(x, y));
            }
        }
        out
    }

    /// Copy `src` with its top-left corner at `(x, y)`, clipping at the edges
    pub fn paste(&mut self, src: &Bitmap, x: i32, y: i32) {
        for sy in 0..src.height {
            for sx in 0..src.width {
                let (dx, dy) = (x + sx as i32, y + sy as i32);
                if dx >= 0 && dy >= 0 {
                    self.set(dx as u32, dy as u32, src.get(sx, sy));
                }
            }
        }
    }

    /// Nearest-neighbour resize
    pub fn resized(&self, width: u32, height: u32) -> Self {
        if (width, height) == (self.width, self.height) {
            return self.clone();
        }
        let mut out = Self::new(width, height, true);
        if self.width == 0 || self.height == 0 {
            return out;
        }
        for y in 0..height {
            for x in 0..width {
                let sx = x * self.width / width;
                let sy = y * self.height / height;
                out.set(x, y, self.get(sx, sy));
            }
        }
        out
    }

    /// Packed rows of the image rotated by 180 degrees, as sent after DISPLAY
    pub fn to_wire_bytes(&self) -> Vec<u8> {
        let row_bytes = self.width.div_ceil(8) as usize;
        let mut out = Vec::with_capacity(row_bytes * self.height as usize);
        for y in (0..self.height).rev() {
            let mut row = vec![0u8; row_bytes];
            for (i, x) in (0..self.width).rev().enumerate() {
                if self.get(x, y) {
                    row[i / 8] |= 0x80 >> (i % 8);
                }
            }
            out.extend_from_slice(&row);
        }
        out
    }
}

impl OriginDimensions for Bitmap {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// `BinaryColor::On` draws white
impl DrawTarget for Bitmap {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x >= 0 && point.y >= 0 {
                self.set(point.x as u32, point.y as u32, color.is_on());
            }
        }
        Ok(())
    }
}

/// A named part of the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    /// Center strip with the mode title
    Title,
    /// Label area of switch 1..=9
    Button(u8),
}

/// Placement of a region in panel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Area {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// Computes region placement from the negotiated panel size
///
/// Buttons 2-5 form one column and 6-9 the other, each a quarter of the
/// panel height. Button 1 (the jog dial) spans the middle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayLayout {
    pub width: u32,
    pub height: u32,
}

impl DisplayLayout {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    fn tile_w(&self) -> u32 {
        (self.width / 2).saturating_sub(BANNER_HEIGHT / 2)
    }

    fn tile_h(&self) -> u32 {
        self.height / 4
    }

    pub fn area_for(&self, region: Region) -> Result<Area, DeviceError> {
        let (tile_w, tile_h) = (self.tile_w(), self.tile_h());
        let area = match region {
            Region::Title => Area {
                x: tile_w,
                y: 0,
                w: TITLE_WIDTH,
                h: self.height,
            },
            Region::Button(1) => Area {
                x: 0,
                y: tile_w,
                w: self.height,
                h: self.width / 2 + BANNER_HEIGHT,
            },
            Region::Button(n @ 2..=5) => Area {
                x: tile_w + BANNER_HEIGHT,
                y: u32::from(5 - n) * tile_h,
                w: tile_w + 2,
                h: tile_h,
            },
            Region::Button(n @ 6..=9) => Area {
                x: 0,
                y: u32::from(9 - n) * tile_h,
                w: tile_w + 2,
                h: tile_h,
            },
            Region::Button(n) => {
                return Err(DeviceError::InvalidParameter(format!(
                    "no display region for button {n}"
                )))
            }
        };
        Ok(area)
    }
}

/// One region drawn since the last refresh replay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRegion {
    pub x: u32,
    pub y: u32,
    pub bitmap: Bitmap,
}

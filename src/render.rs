//! Text and icon rasterization for panel regions
//!
//! Regions on the panel are taller than wide, so text is laid out on a
//! canvas with width and height swapped and then rotated into place.

use std::path::{Path, PathBuf};

use embedded_graphics::mono_font::{ascii::FONT_6X10, MonoTextStyle};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};
use inkkeys_device::{Area, Bitmap, DeviceError, DeviceSession, Region};
use tracing::{debug, warn};

use crate::error::RenderError;

/// Luminance at or above which an icon pixel is white
const WHITE_THRESHOLD: u8 = 128;

const FONT_HEIGHT: u32 = 10;

/// Produces bitmaps sized for layout areas
#[derive(Debug, Clone)]
pub struct Renderer {
    icons_dir: PathBuf,
}

impl Renderer {
    pub fn new(icons_dir: impl Into<PathBuf>) -> Self {
        Self {
            icons_dir: icons_dir.into(),
        }
    }

    pub fn icons_dir(&self) -> &Path {
        &self.icons_dir
    }

    /// Centered single-line text
    ///
    /// Black on white, or white on black when `inverted`.
    pub fn text(&self, area: Area, text: &str, inverted: bool) -> Bitmap {
        let mut canvas = Bitmap::new(area.h, area.w, !inverted);
        let color = if inverted {
            BinaryColor::On
        } else {
            BinaryColor::Off
        };
        let character_style = MonoTextStyle::new(&FONT_6X10, color);
        let text_style = TextStyleBuilder::new()
            .alignment(Alignment::Center)
            .baseline(Baseline::Top)
            .build();
        let origin = Point::new(
            (area.h / 2) as i32,
            (area.w.saturating_sub(FONT_HEIGHT) / 2) as i32,
        );
        let _ = Text::with_text_style(text, origin, character_style, text_style).draw(&mut canvas);
        canvas.rotate_cw()
    }

    /// Icon tile for button `slot`
    ///
    /// The icon is rotated into panel orientation and placed against the
    /// outer edge of its column: left for buttons below 6, right otherwise.
    /// A missing or unreadable icon yields a blank tile.
    pub fn icon(&self, area: Area, name: &str, inverted: bool, slot: u8) -> Bitmap {
        let mut tile = Bitmap::new(area.w, area.h, !inverted);
        let mut icon = match self.load_icon(name) {
            Ok(icon) => icon.rotate_cw(),
            Err(e) => {
                warn!("{e}");
                return tile;
            }
        };
        if inverted {
            icon.invert();
        }

        let x = if slot < 6 {
            0
        } else {
            area.w as i32 - icon.width() as i32
        };
        let y = (area.h as i32 - icon.height() as i32) / 2;
        tile.paste(&icon, x, y);
        tile
    }

    fn icon_path(&self, name: &str) -> PathBuf {
        let path = self.icons_dir.join(name);
        if path.extension().is_some() {
            path
        } else {
            path.with_extension("png")
        }
    }

    /// Load an image file and threshold it to 1 bit
    pub fn load_icon(&self, name: &str) -> Result<Bitmap, RenderError> {
        let path = self.icon_path(name);
        debug!("Loading icon {}", path.display());
        let image = image::open(&path)
            .map_err(|source| RenderError::Icon {
                path: path.clone(),
                source,
            })?
            .to_luma8();

        let mut bitmap = Bitmap::new(image.width(), image.height(), true);
        for (x, y, pixel) in image.enumerate_pixels() {
            bitmap.set(x, y, pixel.0[0] >= WHITE_THRESHOLD);
        }
        Ok(bitmap)
    }
}

/// Draws rendered content into a session's layout regions
pub struct PanelWriter<'a> {
    session: &'a mut DeviceSession,
    renderer: &'a Renderer,
}

impl<'a> PanelWriter<'a> {
    pub fn new(session: &'a mut DeviceSession, renderer: &'a Renderer) -> Self {
        Self { session, renderer }
    }

    pub fn send_text_for(
        &mut self,
        region: Region,
        text: &str,
        inverted: bool,
    ) -> Result<(), DeviceError> {
        let area = self.session.layout().area_for(region)?;
        let bitmap = self.renderer.text(area, text, inverted);
        self.session.send_image_for(region, bitmap)
    }

    pub fn send_icon_for(
        &mut self,
        slot: u8,
        icon: &str,
        inverted: bool,
    ) -> Result<(), DeviceError> {
        let region = Region::Button(slot);
        let area = self.session.layout().area_for(region)?;
        let bitmap = self.renderer.icon(area, icon, inverted, slot);
        self.session.send_image_for(region, bitmap)
    }
}

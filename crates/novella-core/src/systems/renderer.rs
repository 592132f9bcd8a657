//! # Renderer System
//!
//! Rasterises a [`Screen`] with Skia into an off-screen surface.
//!
//! ## Responsibilities
//! - **Frames**: Uploads presented frames (cached by serial) and draws them into their placement.
//! - **Overlays**: Swipe trail, prompts and choice labels in red.
//! - **Cards**: White text on black in the banner, centered or vertical layouts.
//! - **Readback**: Converts the surface into the `0RGB` buffer a window expects, or an RGBA image.

use crate::errors::PlayerError;
use crate::presenter::DisplayFrame;
use crate::stage::{Card, CardLayout, ChoiceTarget, Screen};
use crate::systems::assets::FontSet;
use crate::types::{Color, Point, TextSize, Viewport};
use image::RgbaImage;
use skia_safe::canvas::PointMode;
use skia_safe::{
    images, surfaces, AlphaType, Canvas, ColorType, Data, FilterMode, Image, ImageInfo,
    MipmapMode, Paint, PaintStyle, SamplingOptions, Surface,
};
use tracing::{debug, trace};
use unicode_segmentation::UnicodeSegmentation;

/// Width of the swipe trail polyline.
pub const TRAIL_WIDTH: f32 = 3.0;
/// Gap between the bottom edge and a card's hint line.
pub const HINT_MARGIN: f32 = 50.0;

/// Off-screen Skia compositor for the player's screens.
pub struct Compositor {
    viewport: Viewport,
    surface: Surface,
    fonts: FontSet,
    frame_cache: Option<(u64, Image)>,
}

impl std::fmt::Debug for Compositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compositor")
            .field("viewport", &self.viewport)
            .field("cached_serial", &self.frame_cache.as_ref().map(|(s, _)| *s))
            .finish()
    }
}

impl Compositor {
    pub fn new(viewport: Viewport, fonts: FontSet) -> Result<Self, PlayerError> {
        let surface =
            surfaces::raster_n32_premul((viewport.width as i32, viewport.height as i32))
                .ok_or(PlayerError::SurfaceFailure)?;
        debug!(width = viewport.width, height = viewport.height, "Compositor ready");
        Ok(Self {
            viewport,
            surface,
            fonts,
            frame_cache: None,
        })
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn measure_text(&self, text: &str, size: TextSize) -> (f32, f32) {
        self.fonts.measure(text, size)
    }

    /// Draws one full refresh.
    pub fn render(&mut self, screen: &Screen<'_>) -> Result<(), PlayerError> {
        let frame_image = match screen {
            Screen::Playing { frame } => Some(self.frame_image(frame)?),
            Screen::Frozen { frame, .. } | Screen::Choice { frame, .. } => match frame {
                Some(frame) => Some(self.frame_image(frame)?),
                None => None,
            },
            Screen::Card { .. } => None,
        };

        let viewport = self.viewport;
        let fonts = &self.fonts;
        let canvas = self.surface.canvas();
        canvas.clear(Color::BLACK.to_skia());

        if let (Some(image), Some(frame)) = (&frame_image, screen_frame(screen)) {
            canvas.draw_image_rect_with_sampling_options(
                image,
                None,
                frame.placement.to_rect().to_skia(),
                SamplingOptions::new(FilterMode::Linear, MipmapMode::None),
                &Paint::default(),
            );
        }

        match screen {
            Screen::Playing { .. } => {}
            Screen::Frozen { trail, prompt, .. } => {
                draw_trail(canvas, trail);
                let center = viewport.center();
                let (w, h) = fonts.measure(prompt, TextSize::Small);
                draw_text(
                    canvas,
                    fonts,
                    prompt,
                    Point::new(center.x - w / 2.0, center.y - h / 2.0),
                    TextSize::Small,
                    Color::RED,
                );
            }
            Screen::Choice { targets, .. } => draw_choices(canvas, fonts, targets),
            Screen::Card { card } => draw_card(canvas, fonts, viewport, card),
        }
        trace!(screen = screen.name(), "Screen rendered");
        Ok(())
    }

    /// Uploads `frame` unless it is already the cached image.
    fn frame_image(&mut self, frame: &DisplayFrame) -> Result<Image, PlayerError> {
        if let Some((serial, image)) = &self.frame_cache {
            if *serial == frame.serial {
                return Ok(image.clone());
            }
        }
        let info = ImageInfo::new(
            (frame.width as i32, frame.height as i32),
            ColorType::RGBA8888,
            AlphaType::Unpremul,
            None,
        );
        let data = Data::new_copy(&frame.pixels);
        let image = images::raster_from_data(&info, data, frame.width as usize * 4)
            .ok_or(PlayerError::SurfaceFailure)?;
        self.frame_cache = Some((frame.serial, image.clone()));
        Ok(image)
    }

    /// Copies the surface into `out` as `0RGB` words, row-major.
    pub fn read_argb(&mut self, out: &mut Vec<u32>) -> Result<(), PlayerError> {
        let (w, h) = (self.viewport.width as usize, self.viewport.height as usize);
        let info = ImageInfo::new(
            (w as i32, h as i32),
            ColorType::BGRA8888,
            AlphaType::Premul,
            None,
        );
        let mut bytes = vec![0u8; w * h * 4];
        if !self
            .surface
            .read_pixels(&info, &mut bytes, w * 4, (0, 0))
        {
            return Err(PlayerError::SurfaceFailure);
        }
        out.clear();
        out.extend(
            bytes
                .chunks_exact(4)
                .map(|px| u32::from_le_bytes([px[0], px[1], px[2], 0])),
        );
        Ok(())
    }

    /// The last render as an RGBA image.
    pub fn snapshot(&mut self) -> Result<RgbaImage, PlayerError> {
        let (w, h) = (self.viewport.width, self.viewport.height);
        let info = ImageInfo::new(
            (w as i32, h as i32),
            ColorType::RGBA8888,
            AlphaType::Unpremul,
            None,
        );
        let mut bytes = vec![0u8; w as usize * h as usize * 4];
        if !self
            .surface
            .read_pixels(&info, &mut bytes, w as usize * 4, (0, 0))
        {
            return Err(PlayerError::SurfaceFailure);
        }
        RgbaImage::from_raw(w, h, bytes).ok_or(PlayerError::SurfaceFailure)
    }
}

fn screen_frame<'a>(screen: &Screen<'a>) -> Option<&'a DisplayFrame> {
    match *screen {
        Screen::Playing { frame } => Some(frame),
        Screen::Frozen { frame, .. } | Screen::Choice { frame, .. } => frame,
        Screen::Card { .. } => None,
    }
}

fn fill_paint(color: Color) -> Paint {
    let mut paint = Paint::default();
    paint.set_anti_alias(true);
    paint.set_style(PaintStyle::Fill);
    paint.set_color(color.to_skia());
    paint
}

/// Draws `text` with its top-left corner at `top_left`.
fn draw_text(
    canvas: &Canvas,
    fonts: &FontSet,
    text: &str,
    top_left: Point,
    size: TextSize,
    color: Color,
) {
    let font = fonts.font(size);
    let (_, metrics) = font.metrics();
    canvas.draw_str(
        text,
        (top_left.x, top_left.y - metrics.ascent),
        font,
        &fill_paint(color),
    );
}

/// Draws `text` horizontally centred at height `y`.
fn draw_centered_line(
    canvas: &Canvas,
    fonts: &FontSet,
    viewport: Viewport,
    text: &str,
    y: f32,
    size: TextSize,
) {
    let (w, _) = fonts.measure(text, size);
    let x = ((viewport.width as f32 - w) / 2.0).floor();
    draw_text(canvas, fonts, text, Point::new(x, y), size, Color::WHITE);
}

/// One grapheme per line, stacked downwards from `top`.
fn draw_vertical_text(canvas: &Canvas, fonts: &FontSet, text: &str, top: Point, size: TextSize) {
    let step = fonts.line_height(size);
    for (i, grapheme) in text.graphemes(true).enumerate() {
        draw_text(
            canvas,
            fonts,
            grapheme,
            Point::new(top.x, top.y + i as f32 * step),
            size,
            Color::WHITE,
        );
    }
}

fn draw_trail(canvas: &Canvas, trail: &[Point]) {
    if trail.len() < 2 {
        return;
    }
    let mut paint = fill_paint(Color::RED);
    paint.set_style(PaintStyle::Stroke);
    paint.set_stroke_width(TRAIL_WIDTH);
    let points: Vec<skia_safe::Point> = trail
        .iter()
        .map(|p| skia_safe::Point::new(p.x, p.y))
        .collect();
    canvas.draw_points(PointMode::Polygon, &points, &paint);
}

fn draw_choices(canvas: &Canvas, fonts: &FontSet, targets: &[ChoiceTarget]) {
    for target in targets {
        draw_text(
            canvas,
            fonts,
            &target.label,
            Point::new(target.rect.x, target.rect.y),
            TextSize::Large,
            Color::RED,
        );
    }
}

fn draw_card(canvas: &Canvas, fonts: &FontSet, viewport: Viewport, card: &Card) {
    let (w, h) = (viewport.width as f32, viewport.height as f32);
    match card.layout {
        CardLayout::Banner => {
            let title_y = (h / 3.0).floor();
            draw_centered_line(canvas, fonts, viewport, &card.title, title_y, TextSize::Large);
            if let Some(subtitle) = &card.subtitle {
                let subtitle_y = (h / 2.0).floor();
                draw_centered_line(canvas, fonts, viewport, subtitle, subtitle_y, TextSize::Small);
            }
        }
        CardLayout::Centered => {
            let title_y = (h / 2.0).floor();
            draw_centered_line(canvas, fonts, viewport, &card.title, title_y, TextSize::Large);
        }
        CardLayout::Vertical => {
            let top = (h / 4.0).floor();
            let mid = (w / 2.0).floor();
            let title_at = Point::new(mid - 80.0, top);
            draw_vertical_text(canvas, fonts, &card.title, title_at, TextSize::Large);
            if let Some(subtitle) = &card.subtitle {
                let subtitle_at = Point::new(mid + 50.0, top);
                draw_vertical_text(canvas, fonts, subtitle, subtitle_at, TextSize::Large);
            }
        }
    }
    if let Some(hint) = &card.hint {
        draw_centered_line(canvas, fonts, viewport, hint, h - HINT_MARGIN, TextSize::Small);
    }
}

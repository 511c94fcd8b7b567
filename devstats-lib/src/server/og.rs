//! Open-Graph preview rendering
//!
//! The [`Renderer`] is built once at startup and shared by every request. It
//! holds the fixed template (canvas size, palette, layout metrics) and a
//! process-lifetime cache for the optional logo, which is fetched on first use
//! and never refreshed.
//!
//! Layout, from back to front:
//!
//! 1. a diagonal gradient from sky-600 to sky-200
//! 2. a fade toward sky-200 across the bottom band
//! 3. the logo, top-left, scaled to a fixed height
//! 4. the title and the wrapped description, anchored bottom-left
//!
//! Text is drawn with an 8x8 bitmap font scaled by whole pixels.

use core::time::Duration;
use font8x8::{BASIC_FONTS, BLOCK_FONTS, BOX_FONTS, GREEK_FONTS, HIRAGANA_FONTS, LATIN_FONTS, MISC_FONTS, UnicodeFonts};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use ohno::IntoAppError;
use std::io::Cursor;
use std::sync::Arc;
use tokio::sync::OnceCell;

const LOG_TARGET: &str = "        og";

pub const WIDTH: u32 = 1200;
pub const HEIGHT: u32 = 630;

pub const DEFAULT_NAME: &str = "Wizard";
pub const DEFAULT_TITLE: &str = "hosenur.dev";
pub const DEFAULT_DESCRIPTION: &str = "Lorem ipsum dolor sit amet, consectetur adipis do eiusmodcing elit. Sed tempor incididunt ut labore et dolore magna aliqua. Ut enim ad minim veniam, quis nostrud exercitation ullamco laboris.";

const MAX_TITLE_CHARS: usize = 80;
const MAX_DESCRIPTION_CHARS: usize = 320;

const GLYPH_SIZE: u32 = 8;
const TITLE_SCALE: u32 = 4;
const DESCRIPTION_SCALE: u32 = 2;
const LINE_GAP: u32 = 8;

/// Title column width, `max-w-md`.
const TITLE_MAX_WIDTH: u32 = 448;

/// Description column width, `max-w-3xl`.
const DESCRIPTION_MAX_WIDTH: u32 = 768;

/// Spacing between title and description, `mt-2`.
const BLOCK_GAP: u32 = 8;

/// Text block inset from the left and bottom edges.
const TEXT_INSET: u32 = 64;

const OVERLAY_HEIGHT: u32 = 256;
const LOGO_HEIGHT: u32 = 256;
const LOGO_INSET: i64 = 16;

const SKY_600: [u8; 3] = [0x02, 0x84, 0xC7];
const SKY_200: [u8; 3] = [0xBA, 0xE6, 0xFD];
const BLACK: [u8; 3] = [0x00, 0x00, 0x00];
const NEUTRAL_800: [u8; 3] = [0x26, 0x26, 0x26];

/// The text shown on a preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OgCard {
    title: String,
    description: String,
}

impl OgCard {
    /// Build a card, falling back to defaults for absent or blank fields and
    /// truncating overly long text.
    #[must_use]
    pub fn new(title: Option<&str>, description: Option<&str>) -> Self {
        Self {
            title: clip(non_blank(title).unwrap_or(DEFAULT_TITLE), MAX_TITLE_CHARS),
            description: clip(non_blank(description).unwrap_or(DEFAULT_DESCRIPTION), MAX_DESCRIPTION_CHARS),
        }
    }

    /// The `/og` greeting card.
    #[must_use]
    pub fn greeting(name: Option<&str>) -> Self {
        let name = non_blank(name).unwrap_or(DEFAULT_NAME);
        Self {
            title: clip(&format!("Hello, {name}!"), MAX_TITLE_CHARS),
            description: String::new(),
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

fn clip(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

/// Renders OG previews. Construct once and share.
#[derive(Debug)]
pub struct Renderer {
    http: reqwest::Client,
    logo_url: Option<String>,
    logo: OnceCell<Option<Arc<RgbaImage>>>,
}

impl Renderer {
    pub fn new(logo_url: Option<String>, timeout: Duration) -> crate::Result<Self> {
        Ok(Self {
            http: reqwest::Client::builder()
                .user_agent(concat!("devstats/", env!("CARGO_PKG_VERSION")))
                .timeout(timeout)
                .build()?,
            logo_url,
            logo: OnceCell::new(),
        })
    }

    /// Render `card` as a lossless WebP image.
    pub async fn render(&self, card: &OgCard) -> crate::Result<Vec<u8>> {
        let logo = self.logo().await;
        let card = card.clone();

        tokio::task::spawn_blocking(move || encode_webp(&compose(&card, logo.as_deref())))
            .await
            .into_app_err("rendering task failed")?
    }

    /// The logo, fetched on first use.
    ///
    /// A failed fetch is remembered as "no logo" for the life of the process.
    async fn logo(&self) -> Option<Arc<RgbaImage>> {
        self.logo
            .get_or_init(|| async {
                let url = self.logo_url.as_deref()?;
                match fetch_logo(&self.http, url).await {
                    Ok(logo) => {
                        log::info!(target: LOG_TARGET, "loaded logo from '{url}' ({}x{})", logo.width(), logo.height());
                        Some(Arc::new(logo))
                    }
                    Err(e) => {
                        log::warn!(target: LOG_TARGET, "Could not load logo from '{url}', rendering without it: {e:#}");
                        None
                    }
                }
            })
            .await
            .clone()
    }
}

async fn fetch_logo(http: &reqwest::Client, url: &str) -> crate::Result<RgbaImage> {
    let bytes = http
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;

    let logo = image::load_from_memory(&bytes).into_app_err("decoding logo image")?;
    Ok(scale_to_height(&logo.to_rgba8(), LOGO_HEIGHT))
}

fn scale_to_height(image: &RgbaImage, height: u32) -> RgbaImage {
    if image.height() == 0 {
        return image.clone();
    }

    let width = (u64::from(image.width()) * u64::from(height) / u64::from(image.height())).clamp(1, u64::from(WIDTH));
    let width = u32::try_from(width).unwrap_or(WIDTH);
    imageops::resize(image, width, height, FilterType::Triangle)
}

/// Draw the full preview.
fn compose(card: &OgCard, logo: Option<&RgbaImage>) -> RgbaImage {
    let mut canvas = RgbaImage::from_fn(WIDTH, HEIGHT, |x, y| {
        let t = (f64::from(x) / f64::from(WIDTH - 1) + f64::from(y) / f64::from(HEIGHT - 1)) / 2.0;
        opaque(mix(SKY_600, SKY_200, t))
    });

    let band_top = HEIGHT - OVERLAY_HEIGHT;
    for y in band_top..HEIGHT {
        let t = f64::from(y - band_top) / f64::from(OVERLAY_HEIGHT);
        for x in 0..WIDTH {
            let px = canvas.get_pixel_mut(x, y);
            *px = opaque(mix([px[0], px[1], px[2]], SKY_200, t));
        }
    }

    if let Some(logo) = logo {
        imageops::overlay(&mut canvas, logo, LOGO_INSET, LOGO_INSET);
    }

    let title_lines = wrap(card.title(), chars_per_line(TITLE_MAX_WIDTH, TITLE_SCALE));
    let description_lines = wrap(card.description(), chars_per_line(DESCRIPTION_MAX_WIDTH, DESCRIPTION_SCALE));

    let mut y = HEIGHT - TEXT_INSET - block_height(description_lines.len(), DESCRIPTION_SCALE);
    if !description_lines.is_empty() {
        y -= BLOCK_GAP;
    }
    y = y.saturating_sub(block_height(title_lines.len(), TITLE_SCALE));

    for line in &title_lines {
        draw_text(&mut canvas, line, TEXT_INSET, y, TITLE_SCALE, BLACK);
        y += GLYPH_SIZE * TITLE_SCALE + LINE_GAP;
    }

    if !description_lines.is_empty() {
        y += BLOCK_GAP;
    }

    for line in &description_lines {
        draw_text(&mut canvas, line, TEXT_INSET, y, DESCRIPTION_SCALE, NEUTRAL_800);
        y += GLYPH_SIZE * DESCRIPTION_SCALE + LINE_GAP;
    }

    canvas
}

fn encode_webp(canvas: &RgbaImage) -> crate::Result<Vec<u8>> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgba8(canvas.clone())
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::WebP)
        .into_app_err("encoding WebP image")?;
    Ok(buf)
}

const fn opaque([r, g, b]: [u8; 3]) -> Rgba<u8> {
    Rgba([r, g, b, 0xFF])
}

#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss, reason = "the mix of two u8 channels stays within 0..=255")]
fn mix(from: [u8; 3], to: [u8; 3], t: f64) -> [u8; 3] {
    let t = t.clamp(0.0, 1.0);
    let channel = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
    [channel(from[0], to[0]), channel(from[1], to[1]), channel(from[2], to[2])]
}

const fn chars_per_line(max_width: u32, scale: u32) -> usize {
    (max_width / (GLYPH_SIZE * scale)) as usize
}

fn block_height(lines: usize, scale: u32) -> u32 {
    let lines = u32::try_from(lines).unwrap_or(u32::MAX);
    if lines == 0 {
        return 0;
    }
    lines.saturating_mul(GLYPH_SIZE * scale).saturating_add((lines - 1) * LINE_GAP)
}

/// Greedy word wrap. Words longer than a line are split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let mut chars: Vec<char> = word.chars().collect();

        while chars.len() > width {
            if current_len > 0 {
                lines.push(core::mem::take(&mut current));
                current_len = 0;
            }
            let rest = chars.split_off(width);
            lines.push(chars.into_iter().collect());
            chars = rest;
        }

        let needed = if current_len == 0 { chars.len() } else { current_len + 1 + chars.len() };
        if needed > width {
            lines.push(core::mem::take(&mut current));
            current_len = 0;
        }

        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current_len += chars.len();
        current.extend(chars);
    }

    if current_len > 0 {
        lines.push(current);
    }

    lines
}

/// The bitmap for `ch`, searching every font8x8 table before giving up.
fn glyph(ch: char) -> Option<[u8; 8]> {
    BASIC_FONTS
        .get(ch)
        .or_else(|| LATIN_FONTS.get(ch))
        .or_else(|| GREEK_FONTS.get(ch))
        .or_else(|| MISC_FONTS.get(ch))
        .or_else(|| BOX_FONTS.get(ch))
        .or_else(|| BLOCK_FONTS.get(ch))
        .or_else(|| HIRAGANA_FONTS.get(ch))
}

fn draw_text(canvas: &mut RgbaImage, text: &str, x: u32, y: u32, scale: u32, color: [u8; 3]) {
    let fallback = glyph('?').unwrap_or([0; 8]);
    let mut pen_x = x;

    for ch in text.chars() {
        let glyph = glyph(ch).unwrap_or(fallback);

        for (row, bits) in (0..GLYPH_SIZE).zip(glyph) {
            for col in 0..GLYPH_SIZE {
                if bits & (1 << col) == 0 {
                    continue;
                }
                for dy in 0..scale {
                    for dx in 0..scale {
                        let px = pen_x + col * scale + dx;
                        let py = y + row * scale + dy;
                        if px < canvas.width() && py < canvas.height() {
                            canvas.put_pixel(px, py, opaque(color));
                        }
                    }
                }
            }
        }

        pen_x += GLYPH_SIZE * scale;
    }
}

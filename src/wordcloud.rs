//! Word-cloud PNG rendering for review texts.
//!
//! Words are ranked by frequency, sized relative to the most frequent one and
//! placed along a spiral from the canvas centre. A word that does not fit is
//! shrunk; once one fits nowhere even at the minimum size the layout ends. A
//! seeded RNG keeps orientation and colours identical between runs.

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage, imageops};
use imageproc::drawing::{draw_text_mut, text_size};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use rand::{Rng, SeedableRng, rngs::StdRng};
use regex::Regex;
use std::fs;
use std::path::Path;

use crate::error::{AppError, AppResult};

static WORD_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w[\w']+").expect("static word pattern"));

// matplotlib's viridis, sampled at five stops
const VIRIDIS: [[f64; 3]; 5] = [
    [68.0, 1.0, 84.0],
    [59.0, 82.0, 139.0],
    [33.0, 145.0, 140.0],
    [94.0, 201.0, 98.0],
    [253.0, 231.0, 37.0],
];

// Common English function words, compared lowercased
const STOPWORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "am", "an", "and", "any", "are", "as", "at", "be", "because",
    "been", "but", "by", "can", "could", "did", "do", "does", "for", "from", "had", "has", "have", "he",
    "her", "here", "him", "his", "how", "i", "if", "in", "into", "is", "it", "it's", "its", "just", "me",
    "more", "my", "no", "not", "of", "on", "or", "our", "out", "she", "so", "than", "that", "the", "their",
    "them", "then", "there", "these", "they", "this", "those", "to", "too", "up", "very", "was", "we",
    "were", "what", "when", "where", "which", "who", "why", "will", "with", "would", "you", "your",
];

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const SHRINK_STEP: f32 = 0.9;
const WORD_MARGIN: u32 = 2;

#[derive(Debug, Clone)]
pub struct WordCloudOptions {
    pub width: u32,
    pub height: u32,
    pub max_words: usize,
    pub min_font_size: f32,
    pub max_font_size: f32,
    pub relative_scaling: f32,
    pub prefer_horizontal: f64,
    pub seed: u64,
}

impl Default for WordCloudOptions {
    fn default() -> Self {
        WordCloudOptions {
            width: 800,
            height: 800,
            max_words: 200,
            min_font_size: 10.0,
            max_font_size: 100.0,
            relative_scaling: 0.5,
            prefer_horizontal: 0.7,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedWord {
    pub text: String,
    pub font_size: f32,
    pub x: u32,
    pub y: u32,
    // Bounding box as drawn, already swapped for vertical words
    pub width: u32,
    pub height: u32,
    pub vertical: bool,
    pub color: Rgb<u8>,
}

impl PlacedWord {
    fn overlaps(&self, x: u32, y: u32, width: u32, height: u32) -> bool {
        x < self.x + self.width + WORD_MARGIN
            && self.x < x + width + WORD_MARGIN
            && y < self.y + self.height + WORD_MARGIN
            && self.y < y + height + WORD_MARGIN
    }
}

fn is_plottable(token: &str) -> bool {
    !token.chars().all(char::is_numeric) && !STOPWORDS.contains(&token.to_lowercase().as_str())
}

/// Token frequencies over all texts, most frequent first (first-seen on ties).
/// Digit-only tokens and English stopwords are left out.
pub fn word_frequencies<'a, I>(texts: I, max_words: usize) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for text in texts {
        for m in WORD_PATTERN.find_iter(text).filter(|m| is_plottable(m.as_str())) {
            *counts.entry(m.as_str().to_string()).or_insert(0) += 1;
        }
    }
    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(max_words);
    ranked
}

fn viridis<R: Rng>(rng: &mut R) -> Rgb<u8> {
    let t: f64 = rng.r#gen::<f64>() * (VIRIDIS.len() - 1) as f64;
    let i = (t.floor() as usize).min(VIRIDIS.len() - 2);
    let frac = t - i as f64;
    let channel = |c: usize| (VIRIDIS[i][c] + (VIRIDIS[i + 1][c] - VIRIDIS[i][c]) * frac).round() as u8;
    Rgb([channel(0), channel(1), channel(2)])
}

// Spiral walk from the centre; first free slot inside the canvas wins
fn find_slot(placed: &[PlacedWord], width: u32, height: u32, options: &WordCloudOptions) -> Option<(u32, u32)> {
    if width > options.width || height > options.height {
        return None;
    }
    let cx = options.width as f64 / 2.0;
    let cy = options.height as f64 / 2.0;
    let max_radius = (cx * cx + cy * cy).sqrt();

    let mut theta = 0.0f64;
    loop {
        let radius = 2.0 * theta;
        if radius > max_radius {
            return None;
        }
        let left = cx + radius * theta.cos() - width as f64 / 2.0;
        let top = cy + radius * theta.sin() - height as f64 / 2.0;
        if left >= 0.0 && top >= 0.0 {
            let (x, y) = (left as u32, top as u32);
            if x + width <= options.width
                && y + height <= options.height
                && !placed.iter().any(|p| p.overlaps(x, y, width, height))
            {
                return Some((x, y));
            }
        }
        // Roughly constant arc length per step
        theta += (4.0 / radius.max(4.0)).min(0.5);
    }
}

/// Positions words on the canvas in rank order. `measure` returns the
/// horizontal text box for a word at a pixel size. Stops at the first word
/// that does not fit even at the minimum size.
pub fn layout<R, M>(words: &[(String, usize)], options: &WordCloudOptions, rng: &mut R, mut measure: M) -> Vec<PlacedWord>
where
    R: Rng,
    M: FnMut(&str, f32) -> (u32, u32),
{
    let Some(max_freq) = words.iter().map(|(_, f)| *f).max().filter(|f| *f > 0) else {
        return Vec::new();
    };

    let rs = options.relative_scaling;
    let mut placed: Vec<PlacedWord> = Vec::new();
    for (text, freq) in words {
        let ratio = *freq as f32 / max_freq as f32;
        let mut font_size = options.max_font_size * ((1.0 - rs) + rs * ratio);
        let vertical = !rng.gen_bool(options.prefer_horizontal);
        let color = viridis(rng);

        let mut fitted = false;
        while font_size >= options.min_font_size {
            let (w, h) = measure(text, font_size);
            let (width, height) = if vertical { (h, w) } else { (w, h) };
            if width > 0 && height > 0 {
                if let Some((x, y)) = find_slot(&placed, width, height, options) {
                    placed.push(PlacedWord { text: text.clone(), font_size, x, y, width, height, vertical, color });
                    fitted = true;
                    break;
                }
            }
            font_size *= SHRINK_STEP;
        }
        // Even the smallest size found no room: the canvas is full
        if !fitted {
            break;
        }
    }
    placed
}

pub fn load_font(path: &Path) -> AppResult<FontVec> {
    let bytes = fs::read(path).map_err(|e| AppError::Font { path: path.to_path_buf(), reason: e.to_string() })?;
    FontVec::try_from_vec(bytes).map_err(|e| AppError::Font { path: path.to_path_buf(), reason: e.to_string() })
}

/// Draws placed words onto a white canvas.
pub fn render(placed: &[PlacedWord], font: &FontVec, options: &WordCloudOptions) -> RgbImage {
    let mut canvas = RgbImage::from_pixel(options.width, options.height, BACKGROUND);
    for word in placed {
        let scale = PxScale::from(word.font_size);
        if word.vertical {
            // Draw horizontally, then turn 90° counter-clockwise into its slot
            let mut tile = RgbImage::from_pixel(word.height, word.width, BACKGROUND);
            draw_text_mut(&mut tile, word.color, 0, 0, scale, font, &word.text);
            let turned = imageops::rotate270(&tile);
            imageops::overlay(&mut canvas, &turned, word.x as i64, word.y as i64);
        } else {
            draw_text_mut(&mut canvas, word.color, word.x as i32, word.y as i32, scale, font, &word.text);
        }
    }
    canvas
}

/// Builds the word cloud for `texts` and writes it as PNG.
pub fn generate<'a, I>(texts: I, font_path: &Path, output_path: &Path, options: &WordCloudOptions) -> AppResult<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let words = word_frequencies(texts, options.max_words);
    if words.is_empty() {
        return Err(AppError::WordCloud("no words to plot".to_string()));
    }

    let font = load_font(font_path)?;
    let mut rng = StdRng::seed_from_u64(options.seed);
    let placed = layout(&words, options, &mut rng, |text, size| text_size(PxScale::from(size), &font, text));
    if placed.is_empty() {
        return Err(AppError::WordCloud("no word fits on the canvas".to_string()));
    }
    tracing::debug!(candidates = words.len(), placed = placed.len(), "Laid out word cloud");

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    render(&placed, &font, options).save(output_path)?;
    tracing::info!(path = %output_path.display(), "Word cloud saved");
    Ok(())
}

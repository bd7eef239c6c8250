use crate::color::space::Rgb;
use image::imageops;
use std::collections::HashMap;

pub const DEFAULT_MAX_SIDE: u32 = 200;
pub const TOP_COLORS: usize = 5;

/// Representative color of an RGBA buffer: the most frequent exact colors,
/// blended with linearly decreasing weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DominantColorProfiler {
    top_n: usize,
    // Bits kept per channel when building the histogram; 8 keeps exact tuples.
    quantize_bits: u8,
}

impl Default for DominantColorProfiler {
    fn default() -> Self {
        Self { top_n: TOP_COLORS, quantize_bits: 8 }
    }
}

impl DominantColorProfiler {
    pub fn new(quantize_bits: Option<u8>) -> Self {
        Self {
            top_n: TOP_COLORS,
            quantize_bits: quantize_bits.unwrap_or(8).clamp(1, 8),
        }
    }

    /// Returns `None` only when the buffer holds no complete pixel.
    pub fn profile(&self, rgba: &[u8], width: u32, height: u32) -> Option<Rgb> {
        let pixels = (width as usize)
            .saturating_mul(height as usize)
            .min(rgba.len() / 4);
        if pixels == 0 {
            return None;
        }

        // (count, first seen) so ties keep encounter order.
        let mut counts: HashMap<(u8, u8, u8), (u32, usize)> = HashMap::new();
        for (i, px) in rgba.chunks_exact(4).take(pixels).enumerate() {
            let key = (self.quantize(px[0]), self.quantize(px[1]), self.quantize(px[2]));
            counts.entry(key).or_insert((0, i)).0 += 1;
        }

        let mut ranked: Vec<((u8, u8, u8), (u32, usize))> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));
        ranked.truncate(self.top_n);

        // Weights stay (top_n - rank) / top_n even when fewer colors exist.
        let n = self.top_n as f64;
        let mut acc = [0.0f64; 3];
        let mut total = 0.0;
        for (rank, ((r, g, b), _)) in ranked.iter().enumerate() {
            let w = (n - rank as f64) / n;
            acc[0] += *r as f64 * w;
            acc[1] += *g as f64 * w;
            acc[2] += *b as f64 * w;
            total += w;
        }

        Some(Rgb::new(acc[0] / total, acc[1] / total, acc[2] / total))
    }

    fn quantize(&self, v: u8) -> u8 {
        if self.quantize_bits >= 8 {
            return v;
        }
        let shift = 8 - self.quantize_bits;
        // Bucket center.
        ((v >> shift) << shift) | ((1u8 << shift) >> 1)
    }
}

/// Decodes, downsamples so the longer side is at most `max_side`, and profiles.
pub fn dominant_rgb_from_image_bytes(
    image_bytes: &[u8],
    max_side: u32,
    profiler: &DominantColorProfiler,
) -> Option<Rgb> {
    let img = image::load_from_memory(image_bytes).ok()?;
    let mut rgba = img.to_rgba8();

    let (w, h) = rgba.dimensions();
    let max_side = max_side.max(1);
    if w > max_side || h > max_side {
        let scale = (max_side as f32 / w as f32).min(max_side as f32 / h as f32);
        let new_w = ((w as f32) * scale).round().max(1.0) as u32;
        let new_h = ((h as f32) * scale).round().max(1.0) as u32;
        rgba = imageops::resize(&rgba, new_w, new_h, imageops::FilterType::Triangle);
    }

    let (w, h) = rgba.dimensions();
    profiler.profile(rgba.as_raw(), w, h)
}

//! Multi-scale template matching.
//!
//! Every template of a [`TemplateSet`] is rescaled by each configured factor
//! and correlated against the region with zero-mean normalized
//! cross-correlation (scores in `[-1, 1]`, `1` being a perfect match). The
//! single best candidate above the threshold wins. Candidates are visited in
//! template insertion order, then scale order, and only a strictly higher
//! score replaces the current best, so ties resolve to the earliest candidate.
//!
//! Window statistics come from integral images and the cross term from an
//! FFT of the region, computed once per call. The spectral surface only
//! locates the peak: placements near it are re-scored by direct summation,
//! so reported scores and positions do not depend on transform rounding.

use std::sync::{Arc, Mutex};

use fast_image_resize as fir;
use image::{GrayImage, ImageBuffer, Luma};
use imageproc::integral_image::{integral_image, integral_squared_image};
use imageproc::template_matching::find_extremes;
use rustfft::{Fft, FftPlanner, num_complex::Complex};
use serde::{Deserialize, Serialize};

use crate::{BoxRect, Detection, Label, TemplateSet};

/// Resized templates smaller than this (in either dimension) carry too little
/// structure to correlate reliably and are skipped.
pub const MIN_TEMPLATE_PX: u32 = 12;

type Surface = ImageBuffer<Luma<f32>, Vec<f32>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchParams {
    /// Minimum accepted correlation score.
    pub threshold: f32,
    /// Template scale factors, searched in this order.
    pub scales: Vec<f32>,
}

impl Default for MatchParams {
    fn default() -> Self {
        Self {
            threshold: 0.56,
            scales: vec![0.70, 0.80, 0.90, 1.00, 1.12, 1.25, 1.40],
        }
    }
}

/// Score extrema of one template at one scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreProbe {
    pub label: Label,
    pub template: usize,
    pub scale: f32,
    pub min: f32,
    pub max: f32,
    pub threshold: f32,
}

/// Observer for matcher diagnostics. Implementations must not influence results.
pub trait ScoreSink: Send + Sync {
    fn probe(&self, probe: &ScoreProbe);

    #[allow(unused_variables)]
    fn outcome(&self, label: Label, best: Option<&Detection>) {}
}

pub struct NoopSink;

impl ScoreSink for NoopSink {
    fn probe(&self, _probe: &ScoreProbe) {}
}

/// Logs every probe at `trace` and every outcome at `debug`.
pub struct TracingSink;

impl ScoreSink for TracingSink {
    fn probe(&self, p: &ScoreProbe) {
        tracing::trace!(
            label = %p.label,
            template = p.template,
            scale = p.scale,
            min = p.min,
            max = p.max,
            threshold = p.threshold,
            "match probe"
        );
    }

    fn outcome(&self, label: Label, best: Option<&Detection>) {
        match best {
            Some(d) => tracing::debug!(%label, score = d.score, bbox = ?d.bbox, "best match"),
            None => tracing::debug!(%label, "no match"),
        }
    }
}

/// Running min/max of every score seen per label, for threshold tuning.
#[derive(Debug, Default)]
pub struct ScoreExtrema {
    seen: Mutex<[Option<(f32, f32)>; Label::COUNT]>,
}

impl ScoreExtrema {
    pub fn get(&self, label: Label) -> Option<(f32, f32)> {
        let seen = self.seen.lock().unwrap_or_else(|e| e.into_inner());
        seen[label.index()]
    }

    pub fn reset(&self) {
        let mut seen = self.seen.lock().unwrap_or_else(|e| e.into_inner());
        *seen = [None; Label::COUNT];
    }
}

impl ScoreSink for ScoreExtrema {
    fn probe(&self, p: &ScoreProbe) {
        let mut seen = self.seen.lock().unwrap_or_else(|e| e.into_inner());
        let slot = &mut seen[p.label.index()];
        *slot = Some(match *slot {
            Some((lo, hi)) => (lo.min(p.min), hi.max(p.max)),
            None => (p.min, p.max),
        });
    }
}

/// Best match of any template in `set`, at any of `scales`, inside `region`.
///
/// Returns `None` when the set is empty, the region is empty, no resized
/// template fits, or no score reaches `threshold`. The returned box is in
/// region-local coordinates and always lies inside the region.
pub fn best_match(
    set: &TemplateSet,
    region: &GrayImage,
    scales: &[f32],
    threshold: f32,
    sink: &dyn ScoreSink,
) -> Option<Detection> {
    let label = set.label();
    let (rw, rh) = region.dimensions();
    if set.is_empty() || rw == 0 || rh == 0 {
        sink.outcome(label, None);
        return None;
    }

    let mut prepared: Option<Prepared> = None;
    let mut resizer = fir::Resizer::new();
    let mut best: Option<Detection> = None;

    for (index, template) in set.iter().enumerate() {
        for &scale in scales {
            let Some((tw, th)) = scaled_size(template, scale) else {
                continue;
            };
            if tw < MIN_TEMPLATE_PX || th < MIN_TEMPLATE_PX || tw >= rw || th >= rh {
                continue;
            }
            let Some(scaled) = resize(&mut resizer, template, tw, th) else {
                tracing::debug!(%label, template = index, scale, "template resize failed");
                continue;
            };

            let prepared = prepared.get_or_insert_with(|| Prepared::new(region));
            let centered = Centered::new(&scaled);
            let surface = prepared.surface(&centered);
            let extremes = find_extremes(&surface);
            sink.probe(&ScoreProbe {
                label,
                template: index,
                scale,
                min: extremes.min_value,
                max: extremes.max_value,
                threshold,
            });
            if extremes.max_value < threshold - RESCORE_MARGIN {
                continue;
            }

            let Some((x, y, score)) = prepared.refine(&centered, &surface, extremes.max_value) else {
                continue;
            };
            if score >= threshold && best.as_ref().is_none_or(|b| score > b.score) {
                best = Some(Detection {
                    label,
                    score,
                    bbox: BoxRect::new(x, y, x + tw, y + th),
                });
            }
        }
    }

    sink.outcome(label, best.as_ref());
    best
}

fn scaled_size(template: &GrayImage, scale: f32) -> Option<(u32, u32)> {
    if !scale.is_finite() || scale <= 0.0 {
        return None;
    }
    let scale = scale as f64;
    let w = (template.width() as f64 * scale) as u32;
    let h = (template.height() as f64 * scale) as u32;
    Some((w, h))
}

fn resize(resizer: &mut fir::Resizer, template: &GrayImage, width: u32, height: u32) -> Option<GrayImage> {
    if template.dimensions() == (width, height) {
        return Some(template.clone());
    }

    let src = fir::images::Image::from_vec_u8(
        template.width(),
        template.height(),
        template.as_raw().clone(),
        fir::PixelType::U8,
    )
    .ok()?;
    let mut dst = fir::images::Image::new(width, height, fir::PixelType::U8);

    let options = fir::ResizeOptions::new()
        .resize_alg(fir::ResizeAlg::Convolution(fir::FilterType::Bilinear));
    resizer.resize(&src, &mut dst, &Some(options)).ok()?;

    GrayImage::from_raw(width, height, dst.into_vec())
}

/// Integral images of a region, shared by every template and scale.
struct RegionStats {
    stride: usize,
    sum: Vec<u64>,
    sq: Vec<u64>,
}

impl RegionStats {
    fn new(region: &GrayImage) -> Self {
        let sum = integral_image::<_, u64>(region);
        let sq = integral_squared_image::<_, u64>(region);
        Self {
            stride: region.width() as usize + 1,
            sum: sum.into_raw(),
            sq: sq.into_raw(),
        }
    }

    /// Sum and squared sum over `[x, x + w) × [y, y + h)`.
    #[inline]
    fn window(&self, x: usize, y: usize, w: usize, h: usize) -> (u64, u64) {
        let at = |v: &[u64], x: usize, y: usize| v[y * self.stride + x];
        let rect = |v: &[u64]| at(v, x + w, y + h) + at(v, x, y) - at(v, x, y + h) - at(v, x + w, y);
        (rect(&self.sum), rect(&self.sq))
    }

    /// `n * Σ(I - Ī)²` over the window, exact in integers.
    #[inline]
    fn spread(&self, x: usize, y: usize, w: usize, h: usize) -> i128 {
        let (s, s2) = self.window(x, y, w, h);
        (w * h) as i128 * s2 as i128 - (s as i128) * (s as i128)
    }
}

/// Zero-mean template weights.
struct Centered {
    w: usize,
    h: usize,
    weights: Vec<f64>,
    norm2: f64,
}

impl Centered {
    fn new(template: &GrayImage) -> Self {
        let n = template.as_raw().len() as f64;
        let mean = template.as_raw().iter().map(|&v| v as f64).sum::<f64>() / n;
        let weights: Vec<f64> = template.as_raw().iter().map(|&v| v as f64 - mean).collect();
        let norm2 = weights.iter().map(|v| v * v).sum();
        Self {
            w: template.width() as usize,
            h: template.height() as usize,
            weights,
            norm2,
        }
    }

    fn is_flat(&self) -> bool {
        self.norm2 <= f64::EPSILON
    }

    /// Score from the cross term `Σ I·(T - T̄)` and the window spread.
    #[inline]
    fn score(&self, cross: f64, spread: i128) -> f32 {
        if spread <= 0 || self.is_flat() {
            return 0.0;
        }
        let n = (self.w * self.h) as f64;
        let denom = (spread as f64 / n * self.norm2).sqrt();
        (cross / denom).clamp(-1.0, 1.0) as f32
    }
}

/// Spectral scores can differ from exact ones by rounding; every placement
/// within this margin of the spectral maximum is re-scored exactly.
const RESCORE_MARGIN: f32 = 1e-3;

/// A region prepared for correlation: window statistics plus its spectrum.
struct Prepared<'a> {
    region: &'a GrayImage,
    stats: RegionStats,
    plan: Plan,
    spectrum: Vec<Complex<f64>>,
}

impl<'a> Prepared<'a> {
    fn new(region: &'a GrayImage) -> Self {
        let (rw, rh) = (region.width() as usize, region.height() as usize);
        let plan = Plan::new(smooth_len(rw), smooth_len(rh));

        let mut spectrum = vec![Complex::new(0.0, 0.0); plan.w * plan.h];
        for (y, row) in region.as_raw().chunks_exact(rw).enumerate() {
            for (x, &v) in row.iter().enumerate() {
                spectrum[y * plan.w + x].re = v as f64;
            }
        }
        let spectrum = plan.forward(spectrum);

        Self {
            region,
            stats: RegionStats::new(region),
            plan,
            spectrum,
        }
    }

    fn out_dims(&self, t: &Centered) -> (usize, usize) {
        (
            self.region.width() as usize - t.w + 1,
            self.region.height() as usize - t.h + 1,
        )
    }

    /// `Σ I·(T - T̄)` at every placement, through the frequency domain.
    fn cross(&self, t: &Centered) -> Vec<f64> {
        let (ow, oh) = self.out_dims(t);
        let mut buf = vec![Complex::new(0.0, 0.0); self.plan.w * self.plan.h];
        for (j, row) in t.weights.chunks_exact(t.w).enumerate() {
            for (i, &v) in row.iter().enumerate() {
                buf[j * self.plan.w + i].re = v;
            }
        }
        let mut buf = self.plan.forward(buf);
        for (b, r) in buf.iter_mut().zip(&self.spectrum) {
            *b = r * b.conj();
        }
        let buf = self.plan.inverse(buf);

        let norm = 1.0 / (self.plan.w * self.plan.h) as f64;
        let mut out = Vec::with_capacity(ow * oh);
        for y in 0..oh {
            out.extend(buf[y * self.plan.w..y * self.plan.w + ow].iter().map(|c| c.re * norm));
        }
        out
    }

    /// Approximate score surface. Flat windows and flat templates score exactly 0.
    fn surface(&self, t: &Centered) -> Surface {
        let (ow, oh) = self.out_dims(t);
        let mut out = vec![0f32; ow * oh];
        if !t.is_flat() {
            let cross = self.cross(t);
            let row = |y: usize, dst: &mut [f32]| {
                for (x, score) in dst.iter_mut().enumerate() {
                    *score = t.score(cross[y * ow + x], self.stats.spread(x, y, t.w, t.h));
                }
            };

            #[cfg(feature = "parallel")]
            {
                use rayon::prelude::*;
                out.par_chunks_mut(ow).enumerate().for_each(|(y, dst)| row(y, dst));
            }
            #[cfg(not(feature = "parallel"))]
            {
                out.chunks_mut(ow).enumerate().for_each(|(y, dst)| row(y, dst));
            }
        }
        Surface::from_raw(ow as u32, oh as u32, out).unwrap_or_else(|| Surface::new(ow as u32, oh as u32))
    }

    /// Exact score of one placement, summed directly over the template.
    fn exact(&self, t: &Centered, x: usize, y: usize) -> f32 {
        let spread = self.stats.spread(x, y, t.w, t.h);
        if spread <= 0 || t.is_flat() {
            return 0.0;
        }
        let rw = self.region.width() as usize;
        let image = self.region.as_raw();
        let cross: f64 = t
            .weights
            .chunks_exact(t.w)
            .enumerate()
            .map(|(j, weights)| {
                let start = (y + j) * rw + x;
                image[start..start + t.w]
                    .iter()
                    .zip(weights)
                    .map(|(&p, &w)| p as f64 * w)
                    .sum::<f64>()
            })
            .sum();
        t.score(cross, spread)
    }

    /// Exact best placement among those near `approx_max`; row-major first on ties.
    fn refine(&self, t: &Centered, surface: &Surface, approx_max: f32) -> Option<(u32, u32, f32)> {
        let mut best: Option<(u32, u32, f32)> = None;
        for (x, y, p) in surface.enumerate_pixels() {
            if p.0[0] < approx_max - RESCORE_MARGIN {
                continue;
            }
            let score = self.exact(t, x as usize, y as usize);
            if best.is_none_or(|(_, _, b)| score > b) {
                best = Some((x, y, score));
            }
        }
        best
    }
}

/// Smallest length `>= n` whose only prime factors are 2, 3 and 5.
fn smooth_len(n: usize) -> usize {
    (n.max(1)..)
        .find(|&m| {
            let mut m = m;
            for p in [2, 3, 5] {
                while m % p == 0 {
                    m /= p;
                }
            }
            m == 1
        })
        .unwrap_or(n)
}

/// 2-D transforms over a `w × h` grid. Spectra are kept transposed (`w` rows of `h`).
struct Plan {
    w: usize,
    h: usize,
    row_fwd: Arc<dyn Fft<f64>>,
    col_fwd: Arc<dyn Fft<f64>>,
    row_inv: Arc<dyn Fft<f64>>,
    col_inv: Arc<dyn Fft<f64>>,
}

impl Plan {
    fn new(w: usize, h: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            w,
            h,
            row_fwd: planner.plan_fft_forward(w),
            col_fwd: planner.plan_fft_forward(h),
            row_inv: planner.plan_fft_inverse(w),
            col_inv: planner.plan_fft_inverse(h),
        }
    }

    fn forward(&self, mut data: Vec<Complex<f64>>) -> Vec<Complex<f64>> {
        rows(self.row_fwd.as_ref(), &mut data);
        let mut data = transpose(&data, self.w, self.h);
        rows(self.col_fwd.as_ref(), &mut data);
        data
    }

    fn inverse(&self, mut data: Vec<Complex<f64>>) -> Vec<Complex<f64>> {
        rows(self.col_inv.as_ref(), &mut data);
        let mut data = transpose(&data, self.h, self.w);
        rows(self.row_inv.as_ref(), &mut data);
        data
    }
}

fn rows(fft: &dyn Fft<f64>, data: &mut [Complex<f64>]) {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        use rustfft::Length;
        data.par_chunks_mut(fft.len()).for_each(|row| fft.process(row));
    }
    #[cfg(not(feature = "parallel"))]
    {
        fft.process(data);
    }
}

/// `h` rows of `w` into `w` rows of `h`.
fn transpose(src: &[Complex<f64>], w: usize, h: usize) -> Vec<Complex<f64>> {
    let mut out = vec![Complex::new(0.0, 0.0); w * h];
    for (y, row) in src.chunks_exact(w).enumerate() {
        for (x, &v) in row.iter().enumerate() {
            out[x * h + y] = v;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic high-contrast texture so every placement is distinguishable.
    fn texture(w: u32, h: u32, seed: u32) -> GrayImage {
        GrayImage::from_fn(w, h, |x, y| {
            let v = (x.wrapping_mul(73) ^ y.wrapping_mul(151) ^ seed.wrapping_mul(97)).wrapping_mul(2654435761);
            Luma([(v >> 24) as u8])
        })
    }

    fn paste(dst: &mut GrayImage, src: &GrayImage, x: u32, y: u32) {
        image::imageops::replace(dst, src, x as i64, y as i64);
    }

    fn flat(w: u32, h: u32, v: u8) -> GrayImage {
        GrayImage::from_pixel(w, h, Luma([v]))
    }

    #[test]
    fn finds_exact_copy_at_unit_scale() {
        let tpl = texture(20, 16, 1);
        let mut region = flat(120, 80, 90);
        paste(&mut region, &tpl, 37, 41);
        let set = TemplateSet::with_templates(Label::Selector, vec![tpl]);

        let d = best_match(&set, &region, &[1.0], 0.9, &NoopSink).expect("match");
        assert_eq!(d.label, Label::Selector);
        assert_eq!(d.bbox, BoxRect::new(37, 41, 57, 57));
        assert!(d.score > 0.999, "score {}", d.score);
    }

    #[test]
    fn box_matches_scaled_template_size() {
        let tpl = texture(20, 20, 2);
        let scaled = resize(&mut fir::Resizer::new(), &tpl, 25, 25).unwrap();
        let mut region = flat(140, 100, 30);
        paste(&mut region, &scaled, 60, 30);
        let set = TemplateSet::with_templates(Label::GatherIndicator, vec![tpl]);

        let d = best_match(&set, &region, &[0.8, 1.0, 1.25], 0.9, &NoopSink).expect("match");
        assert!((d.bbox.width() as i32 - 25).abs() <= 1);
        assert!((d.bbox.height() as i32 - 25).abs() <= 1);
        assert!((d.bbox.left as i32 - 60).abs() <= 1 && (d.bbox.top as i32 - 30).abs() <= 1);
        assert!(d.bbox.right <= 140 && d.bbox.bottom <= 100);
    }

    #[test]
    fn repeated_calls_are_identical() {
        let tpl = texture(18, 14, 3);
        let mut region = texture(100, 70, 9);
        paste(&mut region, &tpl, 10, 12);
        let set = TemplateSet::with_templates(Label::FocusIndicator, vec![tpl.clone(), tpl]);
        let scales = MatchParams::default().scales;

        let first = best_match(&set, &region, &scales, 0.5, &NoopSink);
        for _ in 0..3 {
            assert_eq!(best_match(&set, &region, &scales, 0.5, &NoopSink), first);
        }
    }

    #[test]
    fn empty_inputs_yield_none() {
        let set = TemplateSet::new(Label::Selector);
        assert!(best_match(&set, &texture(50, 50, 1), &[1.0], 0.0, &NoopSink).is_none());

        let set = TemplateSet::with_templates(Label::Selector, vec![texture(20, 20, 1)]);
        assert!(best_match(&set, &GrayImage::new(0, 0), &[1.0], 0.0, &NoopSink).is_none());
        assert!(best_match(&set, &texture(50, 50, 1), &[], 0.0, &NoopSink).is_none());
    }

    #[test]
    fn undersized_and_oversized_scales_are_skipped() {
        let set = TemplateSet::with_templates(Label::Selector, vec![texture(20, 20, 4)]);
        let region = texture(30, 30, 5);
        // 0.5 → 10 px (too small); 1.5 → 30 px (not strictly smaller than the region).
        assert!(best_match(&set, &region, &[0.5, 1.5], -1.0, &NoopSink).is_none());
        assert!(best_match(&set, &region, &[0.5, 1.0, 1.5], -1.0, &NoopSink).is_some());
    }

    #[test]
    fn below_threshold_is_rejected() {
        let set = TemplateSet::with_templates(Label::Selector, vec![texture(20, 20, 6)]);
        let region = texture(80, 80, 7);
        assert!(best_match(&set, &region, &[1.0], 0.95, &NoopSink).is_none());
    }

    #[test]
    fn ties_keep_first_template() {
        let patch = texture(20, 20, 8);
        let mut region = flat(60, 60, 0);
        paste(&mut region, &patch, 5, 5);
        let small = image::imageops::crop_imm(&patch, 0, 0, 16, 16).to_image();
        let other = texture(16, 16, 11);

        // Both crops score 1.0 at (5, 5); the box size tells which one won.
        let set = TemplateSet::with_templates(Label::Selector, vec![other.clone(), small.clone(), patch.clone()]);
        let sink = ScoreExtrema::default();
        let d = best_match(&set, &region, &[1.0], 0.9, &sink).unwrap();
        assert_eq!(d.bbox, BoxRect::new(5, 5, 21, 21));
        let (lo, hi) = sink.get(Label::Selector).unwrap();
        assert!(lo < hi && hi > 0.999);

        let set = TemplateSet::with_templates(Label::Selector, vec![other, patch, small]);
        let d = best_match(&set, &region, &[1.0], 0.9, &NoopSink).unwrap();
        assert_eq!(d.bbox, BoxRect::new(5, 5, 25, 25));
    }

    #[test]
    fn ties_keep_first_scale() {
        // On a flat region every placement scores 0, whatever the scale.
        let set = TemplateSet::with_templates(Label::Selector, vec![texture(20, 20, 13)]);
        let region = flat(60, 60, 77);

        let d = best_match(&set, &region, &[1.0, 1.5], 0.0, &NoopSink).unwrap();
        assert_eq!(d.bbox, BoxRect::new(0, 0, 20, 20));
        let d = best_match(&set, &region, &[1.5, 1.0], 0.0, &NoopSink).unwrap();
        assert_eq!(d.bbox, BoxRect::new(0, 0, 30, 30));
    }

    /// Best placement by summing over the template at every position.
    fn direct(region: &GrayImage, template: &GrayImage) -> (u32, u32, f32) {
        let prepared = Prepared::new(region);
        let t = Centered::new(template);
        let (ow, oh) = prepared.out_dims(&t);
        let mut best = (0, 0, f32::NEG_INFINITY);
        for y in 0..oh {
            for x in 0..ow {
                let s = prepared.exact(&t, x, y);
                if s > best.2 {
                    best = (x as u32, y as u32, s);
                }
            }
        }
        best
    }

    #[test]
    fn spectral_search_agrees_with_direct_sum() {
        let mut region = texture(97, 71, 21);
        let tpl = texture(17, 13, 22);
        // Faint copy so the peak is well below 1.
        let faint = GrayImage::from_fn(17, 13, |x, y| Luma([tpl.get_pixel(x, y).0[0] / 3 + 60]));
        paste(&mut region, &faint, 40, 33);

        for template in [tpl, texture(23, 19, 23), flat(14, 14, 9)] {
            let (x, y, score) = direct(&region, &template);
            let set = TemplateSet::with_templates(Label::Selector, vec![template.clone()]);
            let d = best_match(&set, &region, &[1.0], -1.0, &NoopSink).unwrap();
            assert_eq!((d.bbox.left, d.bbox.top), (x, y));
            assert_eq!(d.score, score);
        }
    }

    #[test]
    fn full_hd_frame() {
        let tpl = texture(80, 80, 31);
        let mut frame = texture(1920, 1080, 32);
        paste(&mut frame, &tpl, 1400, 700);
        let set = TemplateSet::with_templates(Label::WorldObject, vec![tpl]);

        let start = std::time::Instant::now();
        let d = best_match(&set, &frame, &[0.9, 1.0], 0.9, &NoopSink).expect("match");
        let elapsed = start.elapsed();

        assert_eq!(d.bbox, BoxRect::new(1400, 700, 1480, 780));
        if !cfg!(debug_assertions) {
            assert!(elapsed < std::time::Duration::from_secs(3), "took {elapsed:?}");
        }
    }

    #[test]
    fn flat_template_scores_zero() {
        let set = TemplateSet::with_templates(Label::Selector, vec![flat(16, 16, 200)]);
        let region = texture(60, 60, 3);
        assert!(best_match(&set, &region, &[1.0], 0.01, &NoopSink).is_none());
        let d = best_match(&set, &region, &[1.0], 0.0, &NoopSink).unwrap();
        assert_eq!(d.score, 0.0);
    }

    #[test]
    fn inverted_template_scores_minus_one() {
        let tpl = texture(16, 16, 12);
        let mut inverted = tpl.clone();
        image::imageops::invert(&mut inverted);
        let mut region = flat(50, 50, 128);
        paste(&mut region, &inverted, 10, 10);
        let set = TemplateSet::with_templates(Label::Selector, vec![tpl]);

        let sink = ScoreExtrema::default();
        let _ = best_match(&set, &region, &[1.0], 2.0, &sink);
        let (lo, _) = sink.get(Label::Selector).unwrap();
        assert!(lo < -0.999, "min {lo}");
    }
}

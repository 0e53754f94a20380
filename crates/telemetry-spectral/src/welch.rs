//! Welch averaged-periodogram power spectral density.

use crate::fft::forward;
use crate::window::{hann_periodic, power_sum};

/// Resolved segmentation for one signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segmentation {
    /// Samples per segment.
    pub nperseg: usize,
    /// Samples shared by consecutive segments.
    pub noverlap: usize,
    /// Number of full segments that fit the signal.
    pub segments: usize,
}

impl Segmentation {
    /// Cap `segment_length` at the signal length and pick the overlap.
    ///
    /// An explicit `overlap` that does not fit the capped segment falls back
    /// to half a segment.
    pub fn resolve(n: usize, segment_length: usize, overlap: Option<usize>) -> Self {
        let nperseg = segment_length.min(n).max(1);
        let noverlap = match overlap {
            Some(o) if o < nperseg => o,
            _ => nperseg / 2,
        };
        let step = nperseg - noverlap;
        let segments = if n < nperseg { 0 } else { (n - nperseg) / step + 1 };
        Self {
            nperseg,
            noverlap,
            segments,
        }
    }

    pub fn step(&self) -> usize {
        self.nperseg - self.noverlap
    }

    /// Bins of the one-sided estimate: `nperseg / 2 + 1`.
    pub fn bins(&self) -> usize {
        self.nperseg / 2 + 1
    }
}

/// One-sided PSD of `samples` at sampling rate `fs`, in units²/Hz.
///
/// Each segment is mean-detrended, tapered with a periodic Hann window and
/// scaled by `1 / (fs·Σw²)`. Bins other than 0 Hz and (for even segment
/// lengths) Nyquist are doubled. Segment periodograms are averaged.
pub fn welch_psd(
    samples: &[f64],
    fs: f64,
    segment_length: usize,
    overlap: Option<usize>,
) -> (Vec<f64>, Vec<f64>) {
    let seg = Segmentation::resolve(samples.len(), segment_length, overlap);
    let bins = seg.bins();
    let window = hann_periodic(seg.nperseg);
    let scale = 1.0 / (fs * power_sum(&window));

    let mut psd = vec![0.0; bins];
    let mut buffer = vec![0.0; seg.nperseg];

    for s in 0..seg.segments {
        let start = s * seg.step();
        let segment = &samples[start..start + seg.nperseg];
        let mean = segment.iter().sum::<f64>() / seg.nperseg as f64;
        for ((b, x), w) in buffer.iter_mut().zip(segment).zip(&window) {
            *b = (x - mean) * w;
        }
        let spectrum = forward(&buffer);
        for (acc, x) in psd.iter_mut().zip(&spectrum) {
            *acc += x.norm_sqr() * scale;
        }
    }

    let last_doubled = if seg.nperseg % 2 == 0 { bins - 1 } else { bins };
    for p in psd.iter_mut().take(last_doubled).skip(1) {
        *p *= 2.0;
    }
    if seg.segments > 0 {
        let count = seg.segments as f64;
        for p in psd.iter_mut() {
            *p /= count;
        }
    }

    let resolution = fs / seg.nperseg as f64;
    let frequency = (0..bins).map(|k| k as f64 * resolution).collect();
    (frequency, psd)
}

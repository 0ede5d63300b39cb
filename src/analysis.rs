//! Offline spectrum analysis of rendered audio.
//!
//! The counterpart of the live analyser buffer: render a block, take its
//! magnitude spectrum, hand it to `config::writer::write_analysis` for a
//! file the host can plot.

use rustfft::{num_complex::Complex, FftPlanner};

/// Magnitude spectrum of a mono block, Hann-windowed, one value per bin up to
/// Nyquist. Magnitudes are normalized so a full-scale sine lands near 1.0.
pub fn magnitude_spectrum(block: &[f32]) -> Vec<f32> {
    let n = block.len();
    if n < 2 {
        return Vec::new();
    }

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n);

    let denom = (n - 1) as f32;
    let mut buffer: Vec<Complex<f32>> = block
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let w = 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / denom).cos());
            Complex::new(s * w, 0.0)
        })
        .collect();
    fft.process(&mut buffer);

    // Hann window halves the coherent gain, hence 4/N instead of 2/N
    let scale = 4.0 / n as f32;
    buffer[..n / 2].iter().map(|c| c.norm() * scale).collect()
}

/// Frequency in Hz of bin `i` for a block of `n` samples.
pub fn bin_frequency(i: usize, n: usize, sample_rate: f32) -> f32 {
    i as f32 * sample_rate / n as f32
}

use std::collections::VecDeque;
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::assets::AudioBuffer;

/*
Convolution reverb
==================

Convolves the reverb bus with a recorded impulse response using uniform
partitioned convolution (overlap-save):

- The IR is chopped into partitions of one render block each and each
  partition's spectrum is precomputed at FFT size 2B.
- Each render block, the spectrum of [previous block | current block] is
  pushed onto a frequency-domain delay line. The output block is the inverse
  FFT of sum(ir_part[k] * input_spectrum[k]), keeping the last B samples.

Cost per block is one forward FFT, one inverse FFT and a complex
multiply-accumulate per partition, so long IRs stay affordable at realtime
block sizes.
*/

pub struct Convolver {
    block_size: usize,
    fft: Arc<dyn Fft<f32>>,
    ifft: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex<f32>>,
    ir_parts: Vec<Vec<Complex<f32>>>,
    input_spectra: VecDeque<Vec<Complex<f32>>>,
    prev_block: Vec<f32>,
    acc: Vec<Complex<f32>>,
}

impl Convolver {
    pub fn new(block_size: usize) -> Self {
        let fft_size = block_size * 2;
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);
        let ifft = planner.plan_fft_inverse(fft_size);
        let scratch_len = fft
            .get_inplace_scratch_len()
            .max(ifft.get_inplace_scratch_len());

        Self {
            block_size,
            fft,
            ifft,
            scratch: vec![Complex::default(); scratch_len],
            ir_parts: Vec::new(),
            input_spectra: VecDeque::new(),
            prev_block: vec![0.0; block_size],
            acc: vec![Complex::default(); fft_size],
        }
    }

    pub fn has_impulse_response(&self) -> bool {
        !self.ir_parts.is_empty()
    }

    /// Install (or remove) the impulse response. All convolution state is
    /// reset; the tail of whatever was sounding is dropped.
    ///
    /// With `normalize`, the IR is scaled to unit energy so switching between
    /// quiet and loud recordings keeps a comparable reverb level.
    pub fn set_impulse_response(&mut self, ir: Option<&AudioBuffer>, normalize: bool) {
        self.ir_parts.clear();
        self.input_spectra.clear();
        self.prev_block.fill(0.0);

        let Some(ir) = ir else { return };
        if ir.data.is_empty() {
            return;
        }

        let scale = if normalize {
            let energy: f32 = ir.data.iter().map(|s| s * s).sum();
            if energy > 0.0 {
                1.0 / energy.sqrt()
            } else {
                1.0
            }
        } else {
            1.0
        };

        let fft_size = self.block_size * 2;
        for chunk in ir.data.chunks(self.block_size) {
            let mut part = vec![Complex::default(); fft_size];
            for (bin, sample) in part.iter_mut().zip(chunk) {
                bin.re = sample * scale;
            }
            self.fft.process_with_scratch(&mut part, &mut self.scratch);
            self.ir_parts.push(part);
        }
        self.input_spectra = self
            .ir_parts
            .iter()
            .map(|_| vec![Complex::default(); fft_size])
            .collect();
    }

    /// Convolve one block. `input` and `out` are both `block_size` long.
    /// Without an impulse response this is a passthrough.
    pub fn process_block(&mut self, input: &[f32], out: &mut [f32]) {
        debug_assert_eq!(input.len(), self.block_size);
        debug_assert_eq!(out.len(), self.block_size);

        if self.ir_parts.is_empty() {
            out.copy_from_slice(input);
            return;
        }

        // reuse the oldest spectrum buffer for the new block
        let mut spectrum = match self.input_spectra.pop_back() {
            Some(buf) => buf,
            None => return,
        };
        for (bin, sample) in spectrum.iter_mut().zip(self.prev_block.iter().chain(input)) {
            *bin = Complex::new(*sample, 0.0);
        }
        self.fft
            .process_with_scratch(&mut spectrum, &mut self.scratch);
        self.input_spectra.push_front(spectrum);

        self.acc.fill(Complex::default());
        for (part, spectrum) in self.ir_parts.iter().zip(&self.input_spectra) {
            for ((a, p), s) in self.acc.iter_mut().zip(part).zip(spectrum) {
                *a += p * s;
            }
        }
        self.ifft
            .process_with_scratch(&mut self.acc, &mut self.scratch);

        let fft_size = self.block_size * 2;
        let norm = 1.0 / fft_size as f32;
        for (o, a) in out.iter_mut().zip(&self.acc[self.block_size..]) {
            *o = a.re * norm;
        }
        self.prev_block.copy_from_slice(input);
    }
}

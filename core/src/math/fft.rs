use num_complex::Complex32;
use rustfft::{num_traits::Zero, Fft, FftPlanner};

/// Helper that wraps a `rustfft` forward/inverse plan pair for reuse.
pub struct FftHelper {
    forward_plan: std::sync::Arc<dyn Fft<f32>>,
    inverse_plan: std::sync::Arc<dyn Fft<f32>>,
    scratch: Vec<Complex32>,
}

impl FftHelper {
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let forward_plan = planner.plan_fft_forward(size);
        let inverse_plan = planner.plan_fft_inverse(size);
        let scratch_len = forward_plan
            .get_inplace_scratch_len()
            .max(inverse_plan.get_inplace_scratch_len());
        let scratch = vec![Complex32::zero(); scratch_len];
        Self {
            forward_plan,
            inverse_plan,
            scratch,
        }
    }

    pub fn len(&self) -> usize {
        self.forward_plan.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward_plan.len() == 0
    }

    /// Forward transform of a real sequence, zero-padded to the plan size.
    pub fn forward(&mut self, input: &[f32]) -> Vec<Complex32> {
        let mut buffer: Vec<Complex32> = input
            .iter()
            .map(|&value| Complex32::new(value, 0.0))
            .collect();
        buffer.resize(self.forward_plan.len(), Complex32::zero());

        self.forward_plan
            .process_with_scratch(&mut buffer, &mut self.scratch);
        buffer
    }

    /// Inverse transform, returning the real part scaled by `1/len`.
    pub fn inverse_real(&mut self, spectrum: &mut [Complex32]) -> Vec<f32> {
        self.inverse_plan
            .process_with_scratch(spectrum, &mut self.scratch);
        let scale = 1.0 / self.inverse_plan.len() as f32;
        spectrum.iter().map(|value| value.re * scale).collect()
    }
}

/// Sample frequencies in cycles per sample, standard FFT ordering.
///
/// For an even `len` the axis runs `0, 1/len, .. (len/2 - 1)/len` followed
/// by `-1/2, .. -1/len`.
pub fn frequency_axis(len: usize) -> Vec<f32> {
    let half = len / 2 + len % 2;
    (0..len)
        .map(|bin| {
            if bin < half {
                bin as f32 / len as f32
            } else {
                (bin as isize - len as isize) as f32 / len as f32
            }
        })
        .collect()
}

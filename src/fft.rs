//! 3D FFT on Fortran-order voxel data using rustfft
//!
//! Transforms are separable: 1D passes along x (contiguous rows), then y and
//! z (strided lines gathered into a buffer). The inverse is normalized by 1/N
//! so an inverse after a forward transform returns the input.

use num_complex::Complex64;
use rustfft::{Fft, FftDirection, FftPlanner};
use std::f64::consts::PI;
use std::sync::Arc;

/// Forward/inverse plans for one axis, sharing a scratch buffer
struct AxisPlan {
    len: usize,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
    scratch: Vec<Complex64>,
}

impl AxisPlan {
    fn new(planner: &mut FftPlanner<f64>, len: usize) -> Self {
        let forward = planner.plan_fft_forward(len);
        let inverse = planner.plan_fft_inverse(len);
        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());
        Self {
            len,
            forward,
            inverse,
            scratch: vec![Complex64::default(); scratch_len],
        }
    }

    #[inline]
    fn process(&mut self, line: &mut [Complex64], direction: FftDirection) {
        let plan = match direction {
            FftDirection::Forward => &self.forward,
            FftDirection::Inverse => &self.inverse,
        };
        plan.process_with_scratch(line, &mut self.scratch);
    }
}

/// Plans and buffers for repeated transforms of one grid shape
pub struct Fft3dWorkspace {
    dims: (usize, usize, usize),
    axes: [AxisPlan; 3],
    line: Vec<Complex64>,
}

impl Fft3dWorkspace {
    pub fn new(nx: usize, ny: usize, nz: usize) -> Self {
        let mut planner = FftPlanner::new();
        let axes = [
            AxisPlan::new(&mut planner, nx),
            AxisPlan::new(&mut planner, ny),
            AxisPlan::new(&mut planner, nz),
        ];
        Self {
            dims: (nx, ny, nz),
            axes,
            line: vec![Complex64::default(); ny.max(nz)],
        }
    }

    /// In-place forward 3D FFT
    pub fn fft3d(&mut self, data: &mut [Complex64]) {
        self.transform(data, FftDirection::Forward);
    }

    /// In-place inverse 3D FFT, normalized by 1/N
    pub fn ifft3d(&mut self, data: &mut [Complex64]) {
        self.transform(data, FftDirection::Inverse);

        let scale = 1.0 / data.len().max(1) as f64;
        data.iter_mut().for_each(|v| *v *= scale);
    }

    fn transform(&mut self, data: &mut [Complex64], direction: FftDirection) {
        let (nx, ny, nz) = self.dims;
        debug_assert_eq!(data.len(), nx * ny * nz);
        if data.is_empty() {
            return;
        }

        for row in data.chunks_exact_mut(nx) {
            self.axes[0].process(row, direction);
        }

        let plane = nx * ny;
        for k in 0..nz {
            for i in 0..nx {
                self.strided_pass(data, 1, i + k * plane, nx, direction);
            }
        }
        for start in 0..plane {
            self.strided_pass(data, 2, start, plane, direction);
        }
    }

    /// Gather the line `start + n * stride`, transform it along `axis`, scatter back
    fn strided_pass(&mut self, data: &mut [Complex64], axis: usize, start: usize, stride: usize, direction: FftDirection) {
        let len = self.axes[axis].len;
        let line = &mut self.line[..len];
        for (n, v) in line.iter_mut().enumerate() {
            *v = data[start + n * stride];
        }
        self.axes[axis].process(line, direction);
        for (n, v) in line.iter().enumerate() {
            data[start + n * stride] = *v;
        }
    }

    /// real(ifft(kernel * fft(x))) for a real input and a real k-space kernel
    pub fn convolve_real(&mut self, x: &[f64], kernel: &[f64]) -> Vec<f64> {
        let mut spectrum: Vec<Complex64> = x.iter().map(|&r| Complex64::new(r, 0.0)).collect();
        self.fft3d(&mut spectrum);
        for (c, &d) in spectrum.iter_mut().zip(kernel) {
            *c *= d;
        }
        self.ifft3d(&mut spectrum);
        spectrum.into_iter().map(|c| c.re).collect()
    }
}

/// Position on a centered axis of FFT-ordered sample `i` (numpy ifftshift:
/// `ifftshift(x)[i] == x[(i + n/2) % n]`)
#[inline]
pub fn centered_index(i: usize, n: usize) -> usize {
    (i + n / 2) % n
}

/// Wrap an angle into [-π, π)
#[inline]
pub fn wrap_angle(angle: f64) -> f64 {
    (angle + PI).rem_euclid(2.0 * PI) - PI
}

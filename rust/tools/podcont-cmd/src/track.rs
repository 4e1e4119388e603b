//! Helix track parameters with covariance, stored flat so they can live in a
//! container image.

use bytemuck::{Pod, Zeroable};
use serde::Serialize;

/// Conversion constant from GeV/c and kG to the local curvature.
const B2C: f32 = -0.299_792_46e-3;

/// Largest |sin(phi)| a propagation may reach.
const MAX_SNP: f32 = 0.99;

/// Track parameters in the local frame at `x`, rotated by `alpha`:
/// `par = [y, z, snp, tgl, q/pt]` and the lower triangle of their 5x5 covariance.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable, Serialize)]
pub struct TrackParCov {
    pub x: f32,
    pub alpha: f32,
    pub par: [f32; 5],
    pub cov: [f32; 15],
}

impl TrackParCov {
    pub fn new(x: f32, alpha: f32, par: [f32; 5], cov: [f32; 15]) -> TrackParCov {
        TrackParCov { x, alpha, par, cov }
    }

    /// Moves the track to the plane at `xk` in a field `b` (kG). The covariance is
    /// carried along unchanged. Returns `false` and leaves the track untouched if
    /// the track would curl past the plane.
    pub fn propagate_to(&mut self, xk: f32, b: f32) -> bool {
        let dx = xk - self.x;
        if dx.abs() < f32::EPSILON {
            self.x = xk;
            return true;
        }
        let crv = self.par[4] * b * B2C;
        let f1 = self.par[2];
        let f2 = f1 + crv * dx;
        if f1.abs() > MAX_SNP || f2.abs() > MAX_SNP {
            return false;
        }
        let r1 = ((1.0 - f1) * (1.0 + f1)).sqrt();
        let r2 = ((1.0 - f2) * (1.0 + f2)).sqrt();
        if r1.abs() < f32::EPSILON || r2.abs() < f32::EPSILON {
            return false;
        }
        let dy2dx = (f1 + f2) / (r1 + r2);
        self.x = xk;
        self.par[0] += dx * dy2dx;
        self.par[1] += dx * (r2 + f2 * dy2dx) * self.par[3];
        self.par[2] = f2;
        true
    }
}

/// Starting parameters shared by every generated track.
pub const SEED_PAR: [f32; 5] = [0.0, 0.0, 0.1, 0.1, 1.0];

/// Diagonal starting covariance.
pub const SEED_COV: [f32; 15] = [
    0.01, //
    0.0, 0.01, //
    0.0, 0.0, 0.01, //
    0.0, 0.0, 0.0, 0.01, //
    0.0, 0.0, 0.0, 0.0, 0.01,
];

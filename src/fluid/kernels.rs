//! SPH smoothing kernels.
//!
//! The three classic kernels from Müller et al. (2003):
//! poly6 for density, the spiky gradient for pressure and the viscosity
//! Laplacian for velocity diffusion. All of them vanish outside the support
//! radius `h`.

use std::f32::consts::PI;

use bevy::prelude::*;

/// Distances below this are treated as coincident particles.
pub const MIN_DISTANCE: f32 = 1e-6;

/// SPH kernel functions.
pub struct SphKernels;

impl SphKernels {
    /// Poly6 kernel for density estimation.
    /// W(r, h) = (315 / 64πh⁹) * (h² - r²)³ for r ≤ h
    #[inline]
    pub fn poly6(r: f32, h: f32) -> f32 {
        Self::poly6_with_coeff(r, h, KernelCoefficients::poly6(h))
    }

    /// Poly6 kernel with precomputed coefficient.
    #[inline]
    pub fn poly6_with_coeff(r: f32, h: f32, coeff: f32) -> f32 {
        if r > h {
            return 0.0;
        }
        let diff = h * h - r * r;
        coeff * diff * diff * diff
    }

    /// Gradient of the spiky kernel for pressure forces.
    /// ∇W(r, h) = -(45 / πh⁶) * (h - r)² * (direction / r) for r ≤ h
    ///
    /// `direction` is `pos_i - pos_j` and `r` its length. Coincident
    /// particles have no defined direction and get a zero gradient.
    #[inline]
    pub fn spiky_gradient(direction: Vec3, r: f32, h: f32) -> Vec3 {
        Self::spiky_gradient_with_coeff(direction, r, h, KernelCoefficients::spiky_gradient(h))
    }

    /// Spiky gradient with precomputed coefficient.
    #[inline]
    pub fn spiky_gradient_with_coeff(direction: Vec3, r: f32, h: f32, coeff: f32) -> Vec3 {
        if r > h || r < MIN_DISTANCE {
            return Vec3::ZERO;
        }
        let diff = h - r;
        coeff * diff * diff * (direction / r)
    }

    /// Laplacian of the viscosity kernel.
    /// ∇²W(r, h) = (45 / πh⁶) * (h - r)
    #[inline]
    pub fn viscosity_laplacian(r: f32, h: f32) -> f32 {
        Self::viscosity_laplacian_with_coeff(r, h, KernelCoefficients::viscosity_laplacian(h))
    }

    /// Viscosity Laplacian with precomputed coefficient.
    #[inline]
    pub fn viscosity_laplacian_with_coeff(r: f32, h: f32, coeff: f32) -> f32 {
        if r > h {
            return 0.0;
        }
        coeff * (h - r)
    }
}

/// Kernel normalization constants for one smoothing radius.
///
/// Computed once per stage so the per-pair loops avoid `powi`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KernelCoefficients {
    pub h: f32,
    pub poly6: f32,
    pub spiky_gradient: f32,
    pub viscosity_laplacian: f32,
}

impl KernelCoefficients {
    pub fn new(h: f32) -> Self {
        Self {
            h,
            poly6: Self::poly6(h),
            spiky_gradient: Self::spiky_gradient(h),
            viscosity_laplacian: Self::viscosity_laplacian(h),
        }
    }

    /// 315 / (64πh⁹)
    pub fn poly6(h: f32) -> f32 {
        315.0 / (64.0 * PI * h.powi(9))
    }

    /// -45 / (πh⁶)
    pub fn spiky_gradient(h: f32) -> f32 {
        -45.0 / (PI * h.powi(6))
    }

    /// 45 / (πh⁶)
    pub fn viscosity_laplacian(h: f32) -> f32 {
        45.0 / (PI * h.powi(6))
    }

    #[inline]
    pub fn density(&self, r: f32) -> f32 {
        SphKernels::poly6_with_coeff(r, self.h, self.poly6)
    }

    #[inline]
    pub fn pressure_gradient(&self, direction: Vec3, r: f32) -> Vec3 {
        SphKernels::spiky_gradient_with_coeff(direction, r, self.h, self.spiky_gradient)
    }

    #[inline]
    pub fn viscosity(&self, r: f32) -> f32 {
        SphKernels::viscosity_laplacian_with_coeff(r, self.h, self.viscosity_laplacian)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poly6_kernel() {
        let h = 1.0;

        // At r=0, kernel should be maximum
        let w_0 = SphKernels::poly6(0.0, h);
        assert!(w_0 > 0.0);

        // At r=h, kernel should be 0
        let w_h = SphKernels::poly6(h, h);
        assert!(w_h.abs() < 1e-6);

        // Kernel should decrease with distance
        let w_half = SphKernels::poly6(0.5 * h, h);
        assert!(w_half < w_0);
        assert!(w_half > w_h);
    }

    #[test]
    fn test_poly6_reference_value() {
        let expected = 315.0 / (64.0 * PI) * 0.75_f32.powi(3);
        let w = SphKernels::poly6(0.5, 1.0);
        assert!((w - expected).abs() < 1e-5);
        assert!((w - 1.398).abs() < 1e-3);
    }

    #[test]
    fn test_spiky_gradient() {
        let h = 1.0;

        // Coincident particles have no direction
        let grad_0 = SphKernels::spiky_gradient(Vec3::ZERO, 0.0, h);
        assert_eq!(grad_0, Vec3::ZERO);

        // Gradient points from i towards j
        let r = Vec3::new(0.5, 0.0, 0.0);
        let grad = SphKernels::spiky_gradient(r, r.length(), h);
        assert!(grad.x < 0.0);
        assert!(grad.y.abs() < 1e-9 && grad.z.abs() < 1e-9);
    }

    #[test]
    fn test_viscosity_laplacian_positive_inside() {
        let h = 2.0;
        assert!(SphKernels::viscosity_laplacian(0.5, h) > 0.0);
        assert_eq!(SphKernels::viscosity_laplacian(h, h), 0.0);
    }

    #[test]
    fn test_kernels_vanish_outside_support() {
        for h in [0.1_f32, 1.0, 1.45, 3.0] {
            for scale in [1.0001_f32, 1.5, 10.0] {
                let r = h * scale;
                let direction = Vec3::new(r, 0.0, 0.0);
                assert_eq!(SphKernels::poly6(r, h), 0.0);
                assert_eq!(SphKernels::spiky_gradient(direction, r, h), Vec3::ZERO);
                assert_eq!(SphKernels::viscosity_laplacian(r, h), 0.0);
            }
        }
    }

    #[test]
    fn test_coefficients_match_free_functions() {
        let coeffs = KernelCoefficients::new(1.3);
        let direction = Vec3::new(0.3, -0.2, 0.4);
        let r = direction.length();
        assert_eq!(coeffs.density(r), SphKernels::poly6(r, 1.3));
        assert_eq!(
            coeffs.pressure_gradient(direction, r),
            SphKernels::spiky_gradient(direction, r, 1.3)
        );
        assert_eq!(coeffs.viscosity(r), SphKernels::viscosity_laplacian(r, 1.3));
    }
}

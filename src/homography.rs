//! Homography helpers: point transfer, four-point estimation and the mirror
//! reflection used by the canonical palm frame.

use nalgebra::{DMatrix, Matrix3, SymmetricEigen, Vector3};

const EPS: f32 = 1e-9;

/// Apply `h` to one point; `None` when the homogeneous weight vanishes or
/// the result is not finite.
pub fn apply_homography_point(h: &Matrix3<f32>, p: [f32; 2]) -> Option<[f32; 2]> {
    let v = h * Vector3::new(p[0], p[1], 1.0);
    let w = v[2];
    if !w.is_finite() || w.abs() <= EPS || !v[0].is_finite() || !v[1].is_finite() {
        return None;
    }
    Some([v[0] / w, v[1] / w])
}

/// Reflection `x' = width - x`.
pub fn mirror_x(width: f32) -> Matrix3<f32> {
    Matrix3::new(-1.0, 0.0, width, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0)
}

/// True when `h` is finite and has a finite inverse.
pub fn is_invertible(h: &Matrix3<f32>) -> bool {
    h.iter().all(|v| v.is_finite())
        && h
            .try_inverse()
            .is_some_and(|inv| inv.iter().all(|v| v.is_finite()))
}

/// Relative determinant below which a unit-norm fit in normalized
/// coordinates counts as degenerate.
const MIN_NORMALIZED_DET: f64 = 1e-8;

/// Translate the centroid to the origin and scale the mean distance to √2.
fn normalizing_transform(pts: &[[f64; 2]]) -> Matrix3<f64> {
    let n = pts.len() as f64;
    let cx = pts.iter().map(|p| p[0]).sum::<f64>() / n;
    let cy = pts.iter().map(|p| p[1]).sum::<f64>() / n;
    let mean_dist = pts
        .iter()
        .map(|p| (p[0] - cx).hypot(p[1] - cy))
        .sum::<f64>()
        / n;
    let s = if mean_dist > 1e-12 {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };
    Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0)
}

/// Homography `H` with `dst ≈ H · src` from at least four correspondences
/// (normalized DLT). `None` on degenerate configurations.
pub fn estimate_homography(src: &[[f32; 2]], dst: &[[f32; 2]]) -> Option<Matrix3<f32>> {
    let n = src.len();
    if n < 4 || dst.len() != n {
        return None;
    }
    let src64: Vec<[f64; 2]> = src.iter().map(|p| [p[0] as f64, p[1] as f64]).collect();
    let dst64: Vec<[f64; 2]> = dst.iter().map(|p| [p[0] as f64, p[1] as f64]).collect();
    let t_src = normalizing_transform(&src64);
    let t_dst = normalizing_transform(&dst64);

    let mut a = DMatrix::<f64>::zeros(2 * n, 9);
    for i in 0..n {
        let s = t_src * Vector3::new(src64[i][0], src64[i][1], 1.0);
        let d = t_dst * Vector3::new(dst64[i][0], dst64[i][1], 1.0);
        let (sx, sy) = (s[0], s[1]);
        let (dx, dy) = (d[0], d[1]);

        a[(2 * i, 3)] = -sx;
        a[(2 * i, 4)] = -sy;
        a[(2 * i, 5)] = -1.0;
        a[(2 * i, 6)] = dy * sx;
        a[(2 * i, 7)] = dy * sy;
        a[(2 * i, 8)] = dy;

        a[(2 * i + 1, 0)] = sx;
        a[(2 * i + 1, 1)] = sy;
        a[(2 * i + 1, 2)] = 1.0;
        a[(2 * i + 1, 6)] = -dx * sx;
        a[(2 * i + 1, 7)] = -dx * sy;
        a[(2 * i + 1, 8)] = -dx;
    }

    // Null vector of A = eigenvector of AᵀA with the smallest eigenvalue.
    let eig = SymmetricEigen::new(a.transpose() * &a);
    let min_idx = eig.eigenvalues.iamin();
    let hv = eig.eigenvectors.column(min_idx);
    let h_norm = Matrix3::new(
        hv[0], hv[1], hv[2], hv[3], hv[4], hv[5], hv[6], hv[7], hv[8],
    );
    // Degeneracy is judged on the normalized fit.
    let norm = h_norm.norm();
    if !norm.is_finite()
        || norm <= 1e-12
        || (h_norm.determinant() / norm.powi(3)).abs() <= MIN_NORMALIZED_DET
    {
        return None;
    }
    let h = t_dst.try_inverse()? * h_norm * t_src;
    let scale = h[(2, 2)];
    let h = if scale.abs() > 1e-12 { h / scale } else { h };
    let h32: Matrix3<f32> = h.cast::<f32>();
    is_invertible(&h32).then_some(h32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: [f32; 2], b: [f32; 2], tol: f32) {
        assert!(
            (a[0] - b[0]).abs() < tol && (a[1] - b[1]).abs() < tol,
            "{:?} vs {:?}",
            a,
            b
        );
    }

    #[test]
    fn four_point_fit_reproduces_correspondences() {
        let truth = Matrix3::new(1.2, 0.1, 30.0, -0.05, 0.9, 12.0, 0.0004, -0.0002, 1.0);
        let src = [[0.0, 0.0], [200.0, 0.0], [200.0, 300.0], [0.0, 300.0]];
        let dst: Vec<[f32; 2]> = src
            .iter()
            .map(|&p| apply_homography_point(&truth, p).unwrap())
            .collect();
        let h = estimate_homography(&src, &dst).expect("fit");
        for (s, d) in src.iter().zip(&dst) {
            assert_close(apply_homography_point(&h, *s).unwrap(), *d, 1e-2);
        }
    }

    #[test]
    fn collapsed_quad_is_rejected() {
        let src = [[0.0, 0.0], [10.0, 0.0], [20.0, 0.0], [30.0, 0.0]];
        let dst = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        assert!(estimate_homography(&src, &dst).is_none());
    }

    #[test]
    fn mirror_is_an_involution() {
        let m = mirror_x(256.0);
        let p = apply_homography_point(&m, [64.0, 10.0]).unwrap();
        assert_close(p, [192.0, 10.0], 1e-6);
        let back = apply_homography_point(&m, p).unwrap();
        assert_close(back, [64.0, 10.0], 1e-6);
    }

    #[test]
    fn vanishing_weight_yields_none() {
        let h = Matrix3::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0);
        assert!(apply_homography_point(&h, [0.0, 5.0]).is_none());
        assert_close(apply_homography_point(&h, [2.0, 2.0]).unwrap(), [1.0, 1.0], 1e-6);
    }

    #[test]
    fn translation_heavy_box_fit_is_accepted() {
        // Mirrored 60x120 box at x in [166, 226] onto a 256 square: the pixel
        // matrix has det ~ -9 against a norm near 965.
        let src = [[226.0, 20.0], [166.0, 20.0], [166.0, 140.0], [226.0, 140.0]];
        let dst = [[0.0, 0.0], [256.0, 0.0], [256.0, 256.0], [0.0, 256.0]];
        let h = estimate_homography(&src, &dst).expect("fit");
        assert!(is_invertible(&h));
        assert!((h[(0, 0)] + 256.0 / 60.0).abs() < 1e-2, "{h}");
        assert!((h[(1, 1)] - 256.0 / 120.0).abs() < 1e-2, "{h}");
        for (s, d) in src.iter().zip(&dst) {
            assert_close(apply_homography_point(&h, *s).unwrap(), *d, 1e-2);
        }
    }

    #[test]
    fn scale_translate_matrix_is_invertible() {
        let h = Matrix3::new(-4.267, 0.0, 964.3, 0.0, 2.133, -42.7, 0.0, 0.0, 1.0);
        assert!(is_invertible(&h));
        assert!(!is_invertible(&Matrix3::new(
            1.0, 2.0, 3.0, 2.0, 4.0, 6.0, 0.0, 0.0, 1.0
        )));
    }
}

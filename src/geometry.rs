use crate::pose::Landmark;

/// 縮退時（頂点と端点が一致）に返す角度
pub const DEGENERATE_ANGLE: f32 = 0.0;

/// 頂点 b における a-b-c の角度（度, 0〜180）。z は無視する
///
/// a または c が b と一致する場合はゼロ除算せず `DEGENERATE_ANGLE` を返す。
pub fn angle(a: &Landmark, b: &Landmark, c: &Landmark) -> f32 {
    angle_xy((a.x, a.y), (b.x, b.y), (c.x, c.y))
}

pub fn angle_xy(a: (f32, f32), b: (f32, f32), c: (f32, f32)) -> f32 {
    let ab = (a.0 - b.0, a.1 - b.1);
    let cb = (c.0 - b.0, c.1 - b.1);
    let mag_ab = (ab.0 * ab.0 + ab.1 * ab.1).sqrt();
    let mag_cb = (cb.0 * cb.0 + cb.1 * cb.1).sqrt();
    let denom = mag_ab * mag_cb;

    if !denom.is_finite() || denom <= f32::EPSILON * f32::EPSILON {
        return DEGENERATE_ANGLE;
    }

    let dot = ab.0 * cb.0 + ab.1 * cb.1;
    let cos = (dot / denom).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f32, b: f32, eps: f32) -> bool {
        (a - b).abs() < eps
    }

    #[test]
    fn test_right_angle() {
        let deg = angle_xy((1.0, 0.0), (0.0, 0.0), (0.0, 1.0));
        assert!(approx_eq(deg, 90.0, 1e-4), "deg={}", deg);
    }

    #[test]
    fn test_straight_and_folded() {
        assert!(approx_eq(angle_xy((0.0, 0.0), (0.5, 0.0), (1.0, 0.0)), 180.0, 1e-3));
        assert!(approx_eq(angle_xy((1.0, 0.0), (0.0, 0.0), (2.0, 0.0)), 0.0, 1e-3));
    }

    #[test]
    fn test_symmetry() {
        let a = (0.31, 0.72);
        let b = (0.45, 0.40);
        let c = (0.80, 0.33);
        assert_eq!(angle_xy(a, b, c), angle_xy(c, b, a));
    }

    #[test]
    fn test_range_over_grid() {
        let b = (0.5, 0.5);
        for i in 0..12 {
            for j in 0..12 {
                let a = (i as f32 / 11.0, 0.1 + j as f32 / 20.0);
                let c = (1.0 - j as f32 / 11.0, i as f32 / 13.0);
                let deg = angle_xy(a, b, c);
                assert!((0.0..=180.0).contains(&deg), "deg={} a={:?} c={:?}", deg, a, c);
            }
        }
    }

    #[test]
    fn test_degenerate_returns_sentinel() {
        let p = (0.3, 0.3);
        assert_eq!(angle_xy(p, p, (0.9, 0.1)), DEGENERATE_ANGLE);
        assert_eq!(angle_xy((0.9, 0.1), p, p), DEGENERATE_ANGLE);
        assert_eq!(angle_xy(p, p, p), DEGENERATE_ANGLE);
        assert!(!angle_xy(p, p, p).is_nan());
    }

    #[test]
    fn test_non_finite_returns_sentinel() {
        assert_eq!(angle_xy((f32::NAN, 0.0), (0.0, 0.0), (1.0, 1.0)), DEGENERATE_ANGLE);
        assert_eq!(angle_xy((f32::INFINITY, 0.0), (0.0, 0.0), (1.0, 1.0)), DEGENERATE_ANGLE);
    }

    #[test]
    fn test_ignores_z() {
        let mut a = Landmark::new(1.0, 0.0);
        let b = Landmark::new(0.0, 0.0);
        let c = Landmark::new(0.0, 1.0);
        let flat = angle(&a, &b, &c);
        a.z = 5.0;
        assert_eq!(angle(&a, &b, &c), flat);
    }
}

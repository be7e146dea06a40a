// easing.rs: 插值与缓动函数

/// Linear blend between `a` and `b`. `t` is expected in `[0, 1]`.
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Cubic ease-in-out: slow start, fast middle, slow finish.
pub fn ease_in_out_cubic(t: f32) -> f32 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn lerp_hits_endpoints_and_midpoint() {
        assert_eq!(lerp(2.0, 10.0, 0.0), 2.0);
        assert_eq!(lerp(2.0, 10.0, 1.0), 10.0);
        assert_eq!(lerp(2.0, 10.0, 0.5), 6.0);
        assert_eq!(lerp(-3.0, 3.0, 0.5), 0.0);
    }

    #[test]
    fn ease_fixed_points() {
        assert_eq!(ease_in_out_cubic(0.0), 0.0);
        assert_eq!(ease_in_out_cubic(0.5), 0.5);
        assert_eq!(ease_in_out_cubic(1.0), 1.0);
    }

    #[test]
    fn ease_is_symmetric_around_midpoint() {
        for i in 0..=50 {
            let t = i as f32 / 100.0;
            assert_relative_eq!(
                ease_in_out_cubic(t) + ease_in_out_cubic(1.0 - t),
                1.0,
                epsilon = 1e-6
            );
        }
    }

    #[test]
    fn ease_is_non_decreasing() {
        let mut prev = ease_in_out_cubic(0.0);
        for i in 1..=1000 {
            let v = ease_in_out_cubic(i as f32 / 1000.0);
            assert!(v >= prev, "ease dipped at step {i}: {v} < {prev}");
            prev = v;
        }
    }
}

//! Sum of Absolute Differences (SAD) / Manhattan distance on the RGB channels.
//! Alpha is excluded from scoring: the composite is drawn onto an opaque canvas,
//! so its alpha plane is constant and carries no information about the match.

use rayon::prelude::*;

#[derive(Debug, thiserror::Error)]
pub enum FitnessError {
    #[error("buffer length mismatch: target {expected} bytes, rendered {actual} bytes")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("buffer length {0} is not a whole number of rgba pixels")]
    TruncatedBuffer(usize),
}

fn check_pair(target: &[u8], rendered: &[u8]) -> Result<(), FitnessError> {
    if target.len() != rendered.len() {
        return Err(FitnessError::DimensionMismatch {
            expected: target.len(),
            actual: rendered.len(),
        });
    }
    if target.len() % 4 != 0 {
        return Err(FitnessError::TruncatedBuffer(target.len()));
    }
    Ok(())
}

/// total |ΔR| + |ΔG| + |ΔB| over all pixels of two interleaved-RGBA buffers.
/// raw unnormalized sum, lower is better, 0 = identical on scored channels.
pub fn pixel_difference(target: &[u8], rendered: &[u8]) -> Result<u64, FitnessError> {
    profiling::scope!("pixel_difference");
    check_pair(target, rendered)?;

    let pixels = target.len() / 4;

    // coarse-grain the parallelism to keep per-task overhead negligible
    let min_chunk = 64 * 1024;
    let total: u64 = (0..pixels)
        .into_par_iter()
        .with_min_len(min_chunk)
        .map(|i| {
            let t = &target[i * 4..i * 4 + 3];
            let s = &rendered[i * 4..i * 4 + 3];
            let dr = (t[0] as i32 - s[0] as i32).unsigned_abs() as u64;
            let dg = (t[1] as i32 - s[1] as i32).unsigned_abs() as u64;
            let db = (t[2] as i32 - s[2] as i32).unsigned_abs() as u64;
            dr + dg + db
        })
        .sum();

    Ok(total)
}

/// theoretical worst-case `pixel_difference` for a canvas: every scored channel of
/// every pixel off by the full 255. used purely as a normalization denominator.
#[inline]
pub fn max_difference(width: u32, height: u32) -> u64 {
    width as u64 * height as u64 * 3 * 255
}

/// normalized similarity: 100 * (1 - difference / max_difference).
/// 100 = pixel-identical on scored channels; unbounded below in principle,
/// though `difference` never exceeds `max_difference` for equal-depth buffers.
#[inline]
pub fn match_percent(difference: u64, max_difference: u64) -> f64 {
    let denom = max_difference.max(1) as f64;
    100.0 * (1.0 - difference as f64 / denom)
}

/// diagnostic overlay: RGB zeroed, alpha encodes local similarity per pixel as
/// (765 - ΔR - ΔG - ΔB) / 3, so brighter alpha means a smaller local difference.
/// not used anywhere in the accept/reject decision.
pub fn visualize(target: &[u8], rendered: &[u8]) -> Result<Vec<u8>, FitnessError> {
    profiling::scope!("visualize");
    check_pair(target, rendered)?;

    let mut out = vec![0u8; target.len()];
    for (i, px) in out.chunks_exact_mut(4).enumerate() {
        let t = &target[i * 4..i * 4 + 3];
        let s = &rendered[i * 4..i * 4 + 3];
        let dr = (t[0] as i32 - s[0] as i32).unsigned_abs();
        let dg = (t[1] as i32 - s[1] as i32).unsigned_abs();
        let db = (t[2] as i32 - s[2] as i32).unsigned_abs();
        px[3] = ((765 - dr - dg - db) / 3) as u8;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_buffers_score_zero() {
        let buf = vec![17u8; 40];
        assert_eq!(pixel_difference(&buf, &buf).unwrap(), 0);
        assert_eq!(match_percent(0, max_difference(10, 1)), 100.0);
    }

    #[test]
    fn test_max_difference_bound() {
        // all-0 vs all-255 RGB: the worst case exactly, alpha irrelevant
        let w = 10u32;
        let h = 10u32;
        let black: Vec<u8> = (0..w * h).flat_map(|_| [0, 0, 0, 255]).collect();
        let white: Vec<u8> = (0..w * h).flat_map(|_| [255, 255, 255, 0]).collect();

        let max = max_difference(w, h);
        assert_eq!(pixel_difference(&black, &white).unwrap(), max);
        assert_eq!(match_percent(max, max), 0.0);
    }

    #[test]
    fn test_alpha_excluded_from_score() {
        let a: Vec<u8> = (0..8).flat_map(|_| [1, 2, 3, 0]).collect();
        let b: Vec<u8> = (0..8).flat_map(|_| [1, 2, 3, 255]).collect();
        assert_eq!(pixel_difference(&a, &b).unwrap(), 0);
    }

    #[test]
    fn test_dimension_mismatch_detected() {
        let a = vec![0u8; 40];
        let b = vec![0u8; 44];
        assert!(matches!(
            pixel_difference(&a, &b),
            Err(FitnessError::DimensionMismatch { expected: 40, actual: 44 })
        ));
        assert!(matches!(
            visualize(&a, &b),
            Err(FitnessError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_truncated_buffer_detected() {
        let a = vec![0u8; 42];
        assert!(matches!(
            pixel_difference(&a, &a),
            Err(FitnessError::TruncatedBuffer(42))
        ));
    }

    #[test]
    fn test_visualize_alpha_encoding() {
        // identical pixel: alpha = 765/3 = 255 (fully similar)
        // fully opposite pixel: alpha = 0
        let target = [10, 20, 30, 255, 0, 0, 0, 255];
        let rendered = [10, 20, 30, 0, 255, 255, 255, 0];
        let overlay = visualize(&target, &rendered).unwrap();
        assert_eq!(&overlay[0..4], &[0, 0, 0, 255]);
        assert_eq!(&overlay[4..8], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_single_channel_delta() {
        let a = [100u8, 0, 0, 9];
        let b = [150u8, 0, 0, 9];
        assert_eq!(pixel_difference(&a, &b).unwrap(), 50);
    }
}

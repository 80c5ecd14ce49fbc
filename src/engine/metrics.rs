//─────────────────────────────────────────────────────────────────────────────
// whole-canvas quality metrics (SSE, MSE, PSNR)
//─────────────────────────────────────────────────────────────────────────────

use rayon::prelude::*;

/// only R, G and B take part in the error; alpha is ignored
pub const ERROR_CHANNELS: f64 = 3.0;

/// pixels per rayon task; small canvases stay on one thread
const CHUNK_PIXELS: usize = 16 * 1024;

/// RGB sum of squared differences between two equally sized RGBA slices
#[inline]
pub fn squared_error_rgb(target: &[u8], current: &[u8]) -> u64 {
    debug_assert_eq!(target.len(), current.len());
    target
        .chunks_exact(4)
        .zip(current.chunks_exact(4))
        .map(|(t, c)| {
            let dr = t[0] as i64 - c[0] as i64;
            let dg = t[1] as i64 - c[1] as i64;
            let db = t[2] as i64 - c[2] as i64;
            (dr * dr + dg * dg + db * db) as u64
        })
        .sum()
}

/// total RGB squared error over whole buffers, split across the rayon pool
pub fn total_squared_error(target: &[u8], current: &[u8]) -> u64 {
    profiling::scope!("total_squared_error");
    debug_assert_eq!(target.len(), current.len());
    debug_assert_eq!(target.len() % 4, 0);

    let chunk = CHUNK_PIXELS * 4;
    target
        .par_chunks(chunk)
        .zip(current.par_chunks(chunk))
        .map(|(t, c)| squared_error_rgb(t, c))
        .sum()
}

/// PSNR in decibels. `peak` is 255.0 for 8-bit channels.
/// 30 dB is passable, 35 dB good, 40+ dB very close.
#[inline]
pub fn psnr_from_mse(mse: f64, peak: f64) -> f64 {
    let mse = mse.max(1e-12);
    10.0 * ((peak * peak) / mse).log10()
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MetricsSnapshot {
    /// summed RGB squared error
    pub sse: u64,
    /// mean squared error per pixel per channel
    pub mse: f64,
    pub psnr: f64,
}

impl MetricsSnapshot {
    pub fn from_sse(sse: u64, num_pixels: usize) -> Self {
        let denom = (num_pixels.max(1) as f64) * ERROR_CHANNELS;
        let mse = sse as f64 / denom;
        Self {
            sse,
            mse,
            psnr: psnr_from_mse(mse, 255.0),
        }
    }

    pub fn between(target: &[u8], current: &[u8]) -> Self {
        Self::from_sse(total_squared_error(target, current), target.len() / 4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_buffers_have_zero_error() {
        let a = vec![17u8; 4 * 1000];
        let snap = MetricsSnapshot::between(&a, &a);
        assert_eq!(snap.sse, 0);
        assert_eq!(snap.mse, 0.0);
        // clamped at 1e-12 so PSNR stays finite
        assert!(snap.psnr.is_finite() && snap.psnr > 100.0);
    }

    #[test]
    fn alpha_is_not_part_of_the_error() {
        let t = [10u8, 20, 30, 0];
        let c = [13u8, 16, 30, 255];
        assert_eq!(squared_error_rgb(&t, &c), 9 + 16);
    }

    #[test]
    fn parallel_total_matches_scalar_sum() {
        let n = CHUNK_PIXELS * 3 + 17;
        let t: Vec<u8> = (0..n * 4).map(|i| (i * 7 % 251) as u8).collect();
        let c: Vec<u8> = (0..n * 4).map(|i| (i * 13 % 241) as u8).collect();
        assert_eq!(total_squared_error(&t, &c), squared_error_rgb(&t, &c));
    }

    #[test]
    fn psnr_of_known_mse() {
        // mse = 255^2 / 100 -> 20 dB
        let psnr = psnr_from_mse(650.25, 255.0);
        assert!((psnr - 20.0).abs() < 1e-9);
    }
}

//! AVX2 kernels, 32 pixels per inner-loop step.
//!
//! The 256-bit unpack, pack and alignr instructions operate per 128-bit
//! half, so every carry across the middle of a register needs an extra
//! `permute2x128` to stitch the halves together. Apart from that the
//! structure mirrors the SSE kernels exactly.

use std::arch::x86_64::*;

use super::{OFFSET_MAX, OFFSET_MIN};
use crate::avg5::AVG5_FACTOR;
use crate::image::GrayImage;

/// 5-point average over full rows.
///
/// # Safety
///
/// Requires AVX2. `src` and `dst` must be aligned images of equal,
/// non-empty shape; `zero_row` must point to at least `width` zero bytes
/// at 32-byte alignment.
#[target_feature(enable = "avx2")]
pub(crate) unsafe fn avg5(src: &GrayImage, dst: &mut GrayImage, zero_row: *const u8) {
    let w = src.width();
    let h = src.height();
    let n = w / 32;
    let factor = _mm256_set1_epi16(AVG5_FACTOR);
    let zero = _mm256_setzero_si256();
    let src_base = src.as_ptr();
    let dst_base = dst.as_mut_ptr();

    for y in 0..h {
        let src_row = src_base.add(y * w) as *const __m256i;
        let dst_row = dst_base.add(y * w) as *mut __m256i;
        let prev_ptr = if y > 0 {
            src_base.add((y - 1) * w)
        } else {
            zero_row
        };
        let prev_row = prev_ptr as *const __m256i;
        let next_ptr = if y + 1 < h {
            src_base.add((y + 1) * w)
        } else {
            zero_row
        };
        let next_row = next_ptr as *const __m256i;

        let mut cur = _mm256_load_si256(src_row);
        let mut last = _mm256_setzero_si256();
        for i in 0..n {
            let next = if i + 1 < n {
                _mm256_load_si256(src_row.add(i + 1))
            } else {
                _mm256_setzero_si256()
            };
            let above = _mm256_load_si256(prev_row.add(i));
            let mid = cur;
            let below = _mm256_load_si256(next_row.add(i));
            // Byte shifts with a one-byte carry between registers; alignr
            // shifts per half, so the half crossing the middle is patched
            // in with permute2x128.
            let left =
                _mm256_alignr_epi8::<15>(cur, _mm256_permute2x128_si256::<0x03>(cur, last));
            let right =
                _mm256_alignr_epi8::<1>(_mm256_permute2x128_si256::<0x21>(cur, next), cur);
            last = cur;
            cur = next;

            // Unpack interleaves the 128-bit halves, which pack undoes.
            let above_lo = _mm256_unpacklo_epi8(above, zero);
            let mid_lo = _mm256_unpacklo_epi8(mid, zero);
            let below_lo = _mm256_unpacklo_epi8(below, zero);
            let left_lo = _mm256_unpacklo_epi8(left, zero);
            let right_lo = _mm256_unpacklo_epi8(right, zero);

            let sum_lo = _mm256_add_epi16(
                _mm256_add_epi16(
                    _mm256_add_epi16(above_lo, below_lo),
                    _mm256_add_epi16(left_lo, right_lo),
                ),
                mid_lo,
            );

            let above_hi = _mm256_unpackhi_epi8(above, zero);
            let mid_hi = _mm256_unpackhi_epi8(mid, zero);
            let below_hi = _mm256_unpackhi_epi8(below, zero);
            let left_hi = _mm256_unpackhi_epi8(left, zero);
            let right_hi = _mm256_unpackhi_epi8(right, zero);

            let sum_hi = _mm256_add_epi16(
                _mm256_add_epi16(
                    _mm256_add_epi16(above_hi, below_hi),
                    _mm256_add_epi16(left_hi, right_hi),
                ),
                mid_hi,
            );

            let result = _mm256_packus_epi16(
                _mm256_mulhi_epu16(sum_lo, factor),
                _mm256_mulhi_epu16(sum_hi, factor),
            );
            _mm256_stream_si256(dst_row.add(i), result);
        }
    }
}

/// One Perona-Malik iteration over all rows.
///
/// # Safety
///
/// Requires AVX2. `src` and `dst` must be aligned images of equal,
/// non-empty shape; `cache` must point to `width` zeroed (for the first
/// row) f32 values at 32-byte alignment.
#[target_feature(enable = "avx2")]
pub(crate) unsafe fn diffuse(
    src: &GrayImage,
    dst: &mut GrayImage,
    cache: *mut f32,
    kappa_sqr: f32,
    dt: f32,
    isotropic: bool,
) {
    let w = src.width();
    let h = src.height();
    let n = w / 32;
    let kappa_sqr_v = _mm256_set1_ps(kappa_sqr);
    let dt_v = _mm256_set1_ps(dt);
    let off_min = _mm256_set1_ps(OFFSET_MIN);
    let off_max = _mm256_set1_ps(OFFSET_MAX);
    let zero = _mm256_setzero_si256();
    let src_base = src.as_ptr();
    let dst_base = dst.as_mut_ptr();

    for y in 0..h {
        let src_row = src_base.add(y * w) as *const __m256i;
        let dst_row = dst_base.add(y * w) as *mut __m256i;
        // One past the end on the last row; never loaded there.
        let next_row = src_base.add((y + 1) * w) as *const __m256i;
        let last_row = y + 1 == h;

        let mut cur = _mm256_load_si256(src_row);
        let mut last_sx = _mm256_setzero_ps();
        for i in 0..n {
            let next = if i + 1 < n {
                _mm256_load_si256(src_row.add(i + 1))
            } else {
                _mm256_setzero_si256()
            };
            let row = cur;
            let rowy = if last_row {
                _mm256_setzero_si256()
            } else {
                _mm256_load_si256(next_row.add(i))
            };
            let rowx =
                _mm256_alignr_epi8::<1>(_mm256_permute2x128_si256::<0x21>(row, next), row);
            cur = next;

            let row16a = _mm256_unpacklo_epi8(row, zero);
            let row16b = _mm256_unpackhi_epi8(row, zero);
            let rowx16a = _mm256_unpacklo_epi8(rowx, zero);
            let rowx16b = _mm256_unpackhi_epi8(rowx, zero);
            let dx16a = _mm256_sub_epi16(rowx16a, row16a);
            let dx16b = _mm256_sub_epi16(rowx16b, row16b);
            let rowy16a = _mm256_unpacklo_epi8(rowy, zero);
            let rowy16b = _mm256_unpackhi_epi8(rowy, zero);
            let dy16a = _mm256_sub_epi16(rowy16a, row16a);
            let dy16b = _mm256_sub_epi16(rowy16b, row16b);

            let cache_chunk = cache.add(i * 32);

            // The four groups run in source-pixel order (the low halves of
            // the unpacked registers hold pixels 0-7 and 8-15, the high
            // halves 16-23 and 24-31), so the flux carry and the cache stay
            // sequential.
            let q0 = flux_step(
                _mm256_cvtepi16_epi32(_mm256_extracti128_si256::<0>(dx16a)),
                _mm256_cvtepi16_epi32(_mm256_extracti128_si256::<0>(dy16a)),
                kappa_sqr_v,
                dt_v,
                off_min,
                off_max,
                isotropic,
                &mut last_sx,
                cache_chunk,
            );
            let q1 = flux_step(
                _mm256_cvtepi16_epi32(_mm256_extracti128_si256::<0>(dx16b)),
                _mm256_cvtepi16_epi32(_mm256_extracti128_si256::<0>(dy16b)),
                kappa_sqr_v,
                dt_v,
                off_min,
                off_max,
                isotropic,
                &mut last_sx,
                cache_chunk.add(8),
            );
            let q2 = flux_step(
                _mm256_cvtepi16_epi32(_mm256_extracti128_si256::<1>(dx16a)),
                _mm256_cvtepi16_epi32(_mm256_extracti128_si256::<1>(dy16a)),
                kappa_sqr_v,
                dt_v,
                off_min,
                off_max,
                isotropic,
                &mut last_sx,
                cache_chunk.add(16),
            );
            let lo = _mm256_packs_epi32(
                _mm256_permute2x128_si256::<0x20>(q0, q2),
                _mm256_permute2x128_si256::<0x31>(q0, q2),
            );
            let q3 = flux_step(
                _mm256_cvtepi16_epi32(_mm256_extracti128_si256::<1>(dx16b)),
                _mm256_cvtepi16_epi32(_mm256_extracti128_si256::<1>(dy16b)),
                kappa_sqr_v,
                dt_v,
                off_min,
                off_max,
                isotropic,
                &mut last_sx,
                cache_chunk.add(24),
            );
            let hi = _mm256_packs_epi32(
                _mm256_permute2x128_si256::<0x20>(q1, q3),
                _mm256_permute2x128_si256::<0x31>(q1, q3),
            );

            let lo = _mm256_add_epi16(lo, row16a);
            let hi = _mm256_add_epi16(hi, row16b);
            _mm256_stream_si256(dst_row.add(i), _mm256_packus_epi16(lo, hi));
        }
    }
}

/// Flux and Euler step for eight pixels.
///
/// Reads the vertical flux of the row above from `cache` and overwrites it
/// with this row's, and carries the horizontal flux into the next call via
/// `last_sx`.
#[inline]
#[target_feature(enable = "avx2")]
unsafe fn flux_step(
    dxi: __m256i,
    dyi: __m256i,
    kappa_sqr: __m256,
    dt: __m256,
    off_min: __m256,
    off_max: __m256,
    isotropic: bool,
    last_sx: &mut __m256,
    cache: *mut f32,
) -> __m256i {
    let dx = _mm256_cvtepi32_ps(dxi);
    let dy = _mm256_cvtepi32_ps(dyi);

    let (sx, sy) = if isotropic {
        let sqr_norm = _mm256_add_ps(_mm256_mul_ps(dx, dx), _mm256_mul_ps(dy, dy));
        let g = _mm256_div_ps(kappa_sqr, _mm256_add_ps(kappa_sqr, sqr_norm));
        (_mm256_mul_ps(dx, g), _mm256_mul_ps(dy, g))
    } else {
        let gx = _mm256_div_ps(
            kappa_sqr,
            _mm256_add_ps(kappa_sqr, _mm256_mul_ps(dx, dx)),
        );
        let gy = _mm256_div_ps(
            kappa_sqr,
            _mm256_add_ps(kappa_sqr, _mm256_mul_ps(dy, dy)),
        );
        (_mm256_mul_ps(dx, gx), _mm256_mul_ps(dy, gy))
    };

    // Horizontal flux of the previous pixel: shift one float in from the
    // previous group of eight, patching the half crossing with a permute.
    let carried = _mm256_permute2f128_ps::<0x21>(*last_sx, sx);
    let sx_left = _mm256_castsi256_ps(_mm256_alignr_epi8::<12>(
        _mm256_castps_si256(sx),
        _mm256_castps_si256(carried),
    ));
    let sy_above = _mm256_load_ps(cache);

    let euler = _mm256_mul_ps(
        dt,
        _mm256_add_ps(_mm256_sub_ps(sx, sx_left), _mm256_sub_ps(sy, sy_above)),
    );
    let offset = _mm256_cvttps_epi32(_mm256_max_ps(_mm256_min_ps(euler, off_max), off_min));

    *last_sx = sx;
    _mm256_store_ps(cache, sy);

    offset
}

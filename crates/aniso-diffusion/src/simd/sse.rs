//! SSE4.1 kernels, 16 pixels per inner-loop step.

use std::arch::x86_64::*;

use super::{OFFSET_MAX, OFFSET_MIN};
use crate::avg5::AVG5_FACTOR;
use crate::image::GrayImage;

/// 5-point average over full rows.
///
/// # Safety
///
/// Requires SSE4.1. `src` and `dst` must be aligned images of equal,
/// non-empty shape; `zero_row` must point to at least `width` zero bytes
/// at 16-byte alignment.
#[target_feature(enable = "sse4.1")]
pub(crate) unsafe fn avg5(src: &GrayImage, dst: &mut GrayImage, zero_row: *const u8) {
    let w = src.width();
    let h = src.height();
    let n = w / 16;
    let factor = _mm_set1_epi16(AVG5_FACTOR);
    let zero = _mm_setzero_si128();
    let src_base = src.as_ptr();
    let dst_base = dst.as_mut_ptr();

    for y in 0..h {
        let src_row = src_base.add(y * w) as *const __m128i;
        let dst_row = dst_base.add(y * w) as *mut __m128i;
        let prev_ptr = if y > 0 {
            src_base.add((y - 1) * w)
        } else {
            zero_row
        };
        let prev_row = prev_ptr as *const __m128i;
        let next_ptr = if y + 1 < h {
            src_base.add((y + 1) * w)
        } else {
            zero_row
        };
        let next_row = next_ptr as *const __m128i;

        let mut cur = _mm_load_si128(src_row);
        let mut last = _mm_setzero_si128();
        for i in 0..n {
            let next = if i + 1 < n {
                _mm_load_si128(src_row.add(i + 1))
            } else {
                _mm_setzero_si128()
            };
            let above = _mm_load_si128(prev_row.add(i));
            let mid = cur;
            let below = _mm_load_si128(next_row.add(i));
            let left = _mm_alignr_epi8::<15>(cur, last);
            let right = _mm_alignr_epi8::<1>(next, cur);
            last = cur;
            cur = next;

            let above_lo = _mm_unpacklo_epi8(above, zero);
            let mid_lo = _mm_unpacklo_epi8(mid, zero);
            let below_lo = _mm_unpacklo_epi8(below, zero);
            let left_lo = _mm_unpacklo_epi8(left, zero);
            let right_lo = _mm_unpacklo_epi8(right, zero);

            let sum_lo = _mm_add_epi16(
                _mm_add_epi16(
                    _mm_add_epi16(above_lo, below_lo),
                    _mm_add_epi16(left_lo, right_lo),
                ),
                mid_lo,
            );

            let above_hi = _mm_unpackhi_epi8(above, zero);
            let mid_hi = _mm_unpackhi_epi8(mid, zero);
            let below_hi = _mm_unpackhi_epi8(below, zero);
            let left_hi = _mm_unpackhi_epi8(left, zero);
            let right_hi = _mm_unpackhi_epi8(right, zero);

            let sum_hi = _mm_add_epi16(
                _mm_add_epi16(
                    _mm_add_epi16(above_hi, below_hi),
                    _mm_add_epi16(left_hi, right_hi),
                ),
                mid_hi,
            );

            let result = _mm_packus_epi16(
                _mm_mulhi_epu16(sum_lo, factor),
                _mm_mulhi_epu16(sum_hi, factor),
            );
            _mm_stream_si128(dst_row.add(i), result);
        }
    }
}

/// One Perona-Malik iteration over all rows.
///
/// # Safety
///
/// Requires SSE4.1. `src` and `dst` must be aligned images of equal,
/// non-empty shape; `cache` must point to `width` zeroed (for the first
/// row) f32 values at 16-byte alignment.
#[target_feature(enable = "sse4.1")]
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
    let n = w / 16;
    let kappa_sqr_v = _mm_set1_ps(kappa_sqr);
    let dt_v = _mm_set1_ps(dt);
    let off_min = _mm_set1_ps(OFFSET_MIN);
    let off_max = _mm_set1_ps(OFFSET_MAX);
    let zero = _mm_setzero_si128();
    let src_base = src.as_ptr();
    let dst_base = dst.as_mut_ptr();

    for y in 0..h {
        let src_row = src_base.add(y * w) as *const __m128i;
        let dst_row = dst_base.add(y * w) as *mut __m128i;
        // One past the end on the last row; never loaded there.
        let next_row = src_base.add((y + 1) * w) as *const __m128i;
        let last_row = y + 1 == h;

        let mut cur = _mm_load_si128(src_row);
        let mut last_sx = _mm_setzero_ps();
        for i in 0..n {
            let next = if i + 1 < n {
                _mm_load_si128(src_row.add(i + 1))
            } else {
                _mm_setzero_si128()
            };
            let row = cur;
            let rowy = if last_row {
                _mm_setzero_si128()
            } else {
                _mm_load_si128(next_row.add(i))
            };
            let rowx = _mm_alignr_epi8::<1>(next, row);
            cur = next;

            let row16a = _mm_unpacklo_epi8(row, zero);
            let row16b = _mm_unpackhi_epi8(row, zero);
            let rowx16a = _mm_unpacklo_epi8(rowx, zero);
            let rowx16b = _mm_unpackhi_epi8(rowx, zero);
            let dx16a = _mm_sub_epi16(rowx16a, row16a);
            let dx16b = _mm_sub_epi16(rowx16b, row16b);
            let rowy16a = _mm_unpacklo_epi8(rowy, zero);
            let rowy16b = _mm_unpackhi_epi8(rowy, zero);
            let dy16a = _mm_sub_epi16(rowy16a, row16a);
            let dy16b = _mm_sub_epi16(rowy16b, row16b);

            let cache_chunk = cache.add(i * 16);

            let q0 = flux_step(
                _mm_cvtepi16_epi32(dx16a),
                _mm_cvtepi16_epi32(dy16a),
                kappa_sqr_v,
                dt_v,
                off_min,
                off_max,
                isotropic,
                &mut last_sx,
                cache_chunk,
            );
            let q1 = flux_step(
                _mm_cvtepi16_epi32(_mm_srli_si128::<8>(dx16a)),
                _mm_cvtepi16_epi32(_mm_srli_si128::<8>(dy16a)),
                kappa_sqr_v,
                dt_v,
                off_min,
                off_max,
                isotropic,
                &mut last_sx,
                cache_chunk.add(4),
            );
            let lo = _mm_packs_epi32(q0, q1);

            let q2 = flux_step(
                _mm_cvtepi16_epi32(dx16b),
                _mm_cvtepi16_epi32(dy16b),
                kappa_sqr_v,
                dt_v,
                off_min,
                off_max,
                isotropic,
                &mut last_sx,
                cache_chunk.add(8),
            );
            let q3 = flux_step(
                _mm_cvtepi16_epi32(_mm_srli_si128::<8>(dx16b)),
                _mm_cvtepi16_epi32(_mm_srli_si128::<8>(dy16b)),
                kappa_sqr_v,
                dt_v,
                off_min,
                off_max,
                isotropic,
                &mut last_sx,
                cache_chunk.add(12),
            );
            let hi = _mm_packs_epi32(q2, q3);

            let lo = _mm_add_epi16(lo, row16a);
            let hi = _mm_add_epi16(hi, row16b);
            _mm_stream_si128(dst_row.add(i), _mm_packus_epi16(lo, hi));
        }
    }
}

/// Flux and Euler step for four pixels.
///
/// Reads the vertical flux of the row above from `cache` and overwrites it
/// with this row's, and carries the horizontal flux into the next call via
/// `last_sx`.
#[inline]
#[target_feature(enable = "sse4.1")]
unsafe fn flux_step(
    dxi: __m128i,
    dyi: __m128i,
    kappa_sqr: __m128,
    dt: __m128,
    off_min: __m128,
    off_max: __m128,
    isotropic: bool,
    last_sx: &mut __m128,
    cache: *mut f32,
) -> __m128i {
    let dx = _mm_cvtepi32_ps(dxi);
    let dy = _mm_cvtepi32_ps(dyi);

    let (sx, sy) = if isotropic {
        let sqr_norm = _mm_add_ps(_mm_mul_ps(dx, dx), _mm_mul_ps(dy, dy));
        let g = _mm_div_ps(kappa_sqr, _mm_add_ps(kappa_sqr, sqr_norm));
        (_mm_mul_ps(dx, g), _mm_mul_ps(dy, g))
    } else {
        let gx = _mm_div_ps(kappa_sqr, _mm_add_ps(kappa_sqr, _mm_mul_ps(dx, dx)));
        let gy = _mm_div_ps(kappa_sqr, _mm_add_ps(kappa_sqr, _mm_mul_ps(dy, dy)));
        (_mm_mul_ps(dx, gx), _mm_mul_ps(dy, gy))
    };

    // Horizontal flux of the previous pixel: shift one float in from the
    // previous group of four.
    let sx_left = _mm_castsi128_ps(_mm_alignr_epi8::<12>(
        _mm_castps_si128(sx),
        _mm_castps_si128(*last_sx),
    ));
    let sy_above = _mm_load_ps(cache);

    let euler = _mm_mul_ps(
        dt,
        _mm_add_ps(_mm_sub_ps(sx, sx_left), _mm_sub_ps(sy, sy_above)),
    );
    let offset = _mm_cvttps_epi32(_mm_max_ps(_mm_min_ps(euler, off_max), off_min));

    *last_sx = sx;
    _mm_store_ps(cache, sy);

    offset
}

//! Selection of the vectorization level for the filter kernels.

/// Which implementation variant a filter runs.
///
/// All variants compute the same result bit for bit on aligned images; the
/// level only selects how many pixels are processed per inner-loop step.
/// On targets other than `x86_64`, or when the CPU lacks the requested
/// feature, the dispatcher falls back to the scalar path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizationLevel {
    /// Plain scalar code, one pixel at a time.
    None,
    /// SSE4.1 intrinsics, 16 pixels per inner-loop step.
    Sse4,
    /// AVX2 intrinsics, 32 pixels per inner-loop step.
    Avx2,
}

impl OptimizationLevel {
    /// Picks the best level the current CPU supports.
    pub fn detect() -> Self {
        #[cfg(target_arch = "x86_64")]
        {
            if is_x86_feature_detected!("avx2") {
                return OptimizationLevel::Avx2;
            }
            if is_x86_feature_detected!("sse4.1") {
                return OptimizationLevel::Sse4;
            }
        }
        OptimizationLevel::None
    }

    /// The level the dispatcher will actually run: `self` when the CPU
    /// supports it, the scalar path otherwise.
    pub(crate) fn effective(self) -> Self {
        if self.is_supported() {
            self
        } else {
            OptimizationLevel::None
        }
    }

    /// Whether the current CPU can run this level.
    pub fn is_supported(self) -> bool {
        match self {
            OptimizationLevel::None => true,
            #[cfg(target_arch = "x86_64")]
            OptimizationLevel::Sse4 => is_x86_feature_detected!("sse4.1"),
            #[cfg(target_arch = "x86_64")]
            OptimizationLevel::Avx2 => is_x86_feature_detected!("avx2"),
            #[cfg(not(target_arch = "x86_64"))]
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_is_supported() {
        assert!(OptimizationLevel::detect().is_supported());
    }

    #[test]
    fn test_scalar_always_supported() {
        assert!(OptimizationLevel::None.is_supported());
    }
}

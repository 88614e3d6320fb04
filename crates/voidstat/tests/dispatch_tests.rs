//! Exercises the resolution policy with the detected tier forced to
//! each value in turn (the kernels returned under a forced tier are
//! never invoked here, only inspected).

use voidstat::{
    InstructionSet, IsaRequest, Kernel, KernelCache, KernelVariant, resolve, resolve_for_detected,
};

const ALL_TIERS: [InstructionSet; 5] = [
    InstructionSet::Fallback,
    InstructionSet::Sse42,
    InstructionSet::Avx,
    InstructionSet::Avx2,
    InstructionSet::Avx512,
];

fn forced<T: voidstat::Coordinate>(
    request: IsaRequest,
    detected: InstructionSet,
) -> KernelVariant {
    let mut cache = KernelCache::new();
    // SAFETY: the handle is only inspected, never invoked
    let kernel = unsafe { resolve_for_detected::<T>(&mut cache, request, detected).unwrap() };
    kernel.variant()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_never_resolves_above_the_detected_tier() {
        #[cfg(target_arch = "x86_64")]
        {
            assert_eq!(
                forced::<f64>(IsaRequest::Auto, InstructionSet::Fallback),
                KernelVariant::Fallback
            );
            assert_eq!(
                forced::<f64>(IsaRequest::Auto, InstructionSet::Sse42),
                KernelVariant::Sse42
            );
            assert_eq!(
                forced::<f64>(IsaRequest::Auto, InstructionSet::Avx),
                KernelVariant::Avx
            );
            assert_eq!(
                forced::<f64>(IsaRequest::Auto, InstructionSet::Avx2),
                KernelVariant::Avx2
            );
            // with the avx512 kernels compiled out, an avx512-capable
            // machine still gets the widest compiled variant
            #[cfg(not(feature = "avx512"))]
            assert_eq!(
                forced::<f64>(IsaRequest::Auto, InstructionSet::Avx512),
                KernelVariant::Avx2
            );
            #[cfg(feature = "avx512")]
            assert_eq!(
                forced::<f64>(IsaRequest::Auto, InstructionSet::Avx512),
                KernelVariant::Avx512
            );
        }
        #[cfg(not(target_arch = "x86_64"))]
        {
            for detected in ALL_TIERS {
                assert_eq!(
                    forced::<f64>(IsaRequest::Auto, detected),
                    KernelVariant::Fallback
                );
            }
        }
    }

    #[test]
    fn ceiling_above_the_detected_tier_clamps_down() {
        #[cfg(target_arch = "x86_64")]
        {
            assert_eq!(
                forced::<f64>(
                    IsaRequest::Ceiling(InstructionSet::Avx512),
                    InstructionSet::Sse42
                ),
                KernelVariant::Sse42
            );
            assert_eq!(
                forced::<f32>(
                    IsaRequest::Ceiling(InstructionSet::Avx2),
                    InstructionSet::Fallback
                ),
                KernelVariant::Fallback
            );
        }
    }

    #[test]
    fn ceiling_below_the_detected_tier_wins() {
        #[cfg(target_arch = "x86_64")]
        {
            assert_eq!(
                forced::<f64>(
                    IsaRequest::Ceiling(InstructionSet::Sse42),
                    InstructionSet::Avx512
                ),
                KernelVariant::Sse42
            );
            assert_eq!(
                forced::<f32>(
                    IsaRequest::Ceiling(InstructionSet::Fallback),
                    InstructionSet::Avx512
                ),
                KernelVariant::Fallback
            );
        }
    }

    #[test]
    fn repeated_requests_are_served_from_the_cache() {
        let mut cache = KernelCache::new();
        // SAFETY: handles are only inspected
        let first = unsafe {
            resolve_for_detected::<f64>(&mut cache, IsaRequest::Auto, InstructionSet::Fallback)
                .unwrap()
        };
        // same request, different forced tier: the memoized entry wins,
        // proving no re-resolution happened
        let second = unsafe {
            resolve_for_detected::<f64>(&mut cache, IsaRequest::Auto, InstructionSet::Avx2)
                .unwrap()
        };
        assert_eq!(first.variant(), second.variant());

        // a different request does re-resolve
        let third = unsafe {
            resolve_for_detected::<f64>(
                &mut cache,
                IsaRequest::Ceiling(InstructionSet::Avx2),
                InstructionSet::Avx2,
            )
            .unwrap()
        };
        #[cfg(target_arch = "x86_64")]
        assert_eq!(third.variant(), KernelVariant::Avx2);
        #[cfg(not(target_arch = "x86_64"))]
        assert_eq!(third.variant(), KernelVariant::Fallback);
    }

    #[test]
    fn real_resolution_is_always_invocable_and_exact() {
        // resolve() against the real hardware: the variant it picks must
        // be compiled in and at or below every tier the table knows
        let mut cache = KernelCache::new();
        let kernel = resolve::<f64>(&mut cache, IsaRequest::Auto).unwrap();
        assert!(Kernel::<f64>::compiled_variants().contains(&kernel.variant()));

        for ceiling in ALL_TIERS {
            let mut cache = KernelCache::new();
            let kernel = resolve::<f64>(&mut cache, IsaRequest::Ceiling(ceiling)).unwrap();
            assert!(Kernel::<f64>::compiled_variants().contains(&kernel.variant()));
        }
    }
}

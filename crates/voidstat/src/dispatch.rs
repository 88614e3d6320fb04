//! Resolves a kernel handle from the caller's ceiling and the detected
//! CPU capability.
//!
//! The policy: take the compiled-in variants (best first, fallback
//! last), and pick the first one whose tier is at or below
//! `min(requested ceiling, detected capability)`. An [`IsaRequest::Auto`]
//! request means "whatever the hardware can do".
//!
//! Resolution is memoized in a [`KernelCache`] the *caller* owns — one
//! entry per precision, keyed by the last request. Sharing a cache
//! between threads that ask for different ceilings would make them fight
//! over that entry; give each configuration its own cache (it is two
//! words) or serialize access.

use crate::error::Error;
use crate::isa::{self, InstructionSet, IsaRequest};
use voidstat_nostd_internal::{Coordinate, Kernel, KernelVariant};

#[derive(Clone, Copy, Debug)]
struct CacheEntry {
    request: IsaRequest,
    variant: KernelVariant,
}

/// Memoized kernel resolutions, one slot per precision.
///
/// A repeated request with the same ceiling is answered from the slot
/// without consulting the variant table again.
#[derive(Clone, Copy, Debug, Default)]
pub struct KernelCache {
    entries: [Option<CacheEntry>; 2],
}

impl KernelCache {
    pub fn new() -> KernelCache {
        KernelCache::default()
    }
}

/// the capability tier a compiled variant requires
fn variant_tier(variant: KernelVariant) -> InstructionSet {
    match variant {
        KernelVariant::Fallback => InstructionSet::Fallback,
        #[cfg(target_arch = "x86_64")]
        KernelVariant::Sse42 => InstructionSet::Sse42,
        #[cfg(target_arch = "x86_64")]
        KernelVariant::Avx => InstructionSet::Avx,
        #[cfg(target_arch = "x86_64")]
        KernelVariant::Avx2 => InstructionSet::Avx2,
        #[cfg(all(target_arch = "x86_64", feature = "avx512"))]
        KernelVariant::Avx512 => InstructionSet::Avx512,
    }
}

/// Resolve the counting kernel for element type `T`.
///
/// Detection runs (cached) against the actual hardware, so the returned
/// handle is always safe to invoke.
pub fn resolve<T: Coordinate>(
    cache: &mut KernelCache,
    request: IsaRequest,
) -> Result<Kernel<T>, Error> {
    // SAFETY: the detected tier is the running CPU's real capability,
    // so every variant resolved under it is invocable here
    unsafe { resolve_for_detected(cache, request, isa::detect()) }
}

/// Resolution with the detected tier supplied explicitly.
///
/// This is only public so the resolution policy can be exercised with
/// each tier forced in turn; ordinary callers want [`resolve`].
///
/// # Safety
/// If `detected` overstates what the running CPU supports, invoking the
/// returned kernel is undefined behavior. Inspecting it is always fine.
pub unsafe fn resolve_for_detected<T: Coordinate>(
    cache: &mut KernelCache,
    request: IsaRequest,
    detected: InstructionSet,
) -> Result<Kernel<T>, Error> {
    let slot = T::PRECISION.index();
    if let Some(entry) = cache.entries[slot] {
        if entry.request == request {
            return Ok(unsafe { Kernel::with_variant_unchecked(entry.variant) });
        }
    }

    let ceiling = match request {
        IsaRequest::Auto => detected,
        IsaRequest::Ceiling(c) => {
            if c > detected {
                log::warn!(
                    "requested instruction set {c} exceeds what this CPU \
                     supports; falling back to {detected}"
                );
            }
            c.min(detected)
        }
    };

    for &variant in Kernel::<T>::compiled_variants() {
        if variant_tier(variant) <= ceiling {
            cache.entries[slot] = Some(CacheEntry { request, variant });
            return Ok(unsafe { Kernel::with_variant_unchecked(variant) });
        }
    }

    // the fallback variant sits at the bottom tier, so the loop above
    // cannot run dry; reaching this line means the variant table itself
    // is miswired
    Err(Error::kernel_dispatch(
        "no compiled kernel variant is at or below the resolved ceiling",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_resolves_to_something_invocable() {
        let mut cache = KernelCache::new();
        let kernel = resolve::<f64>(&mut cache, IsaRequest::Auto).unwrap();
        assert!(variant_tier(kernel.variant()) <= isa::detect());
    }

    #[test]
    fn fallback_ceiling_always_yields_the_fallback() {
        let mut cache = KernelCache::new();
        let kernel = resolve::<f32>(
            &mut cache,
            IsaRequest::Ceiling(InstructionSet::Fallback),
        )
        .unwrap();
        assert_eq!(kernel.variant(), KernelVariant::Fallback);
    }

    #[test]
    fn precisions_use_separate_slots() {
        let mut cache = KernelCache::new();
        let k64 = resolve::<f64>(&mut cache, IsaRequest::Auto).unwrap();
        // a different request for f32 must not evict the f64 entry
        let _k32 = resolve::<f32>(
            &mut cache,
            IsaRequest::Ceiling(InstructionSet::Fallback),
        )
        .unwrap();
        let again = resolve::<f64>(&mut cache, IsaRequest::Auto).unwrap();
        assert_eq!(k64.variant(), again.variant());
    }
}

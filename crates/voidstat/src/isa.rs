//! Runtime detection of the CPU's SIMD capability.
//!
//! Detection is a pure function of the running hardware, so the result
//! is probed once and cached process-wide. What a *call* is allowed to
//! use is a separate question, answered by the dispatcher from the
//! detected tier plus the caller's requested ceiling.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// The SIMD tiers the counting kernels are written against, ordered
/// from the scalar fallback up.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum InstructionSet {
    Fallback,
    Sse42,
    Avx,
    Avx2,
    Avx512,
}

impl fmt::Display for InstructionSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            InstructionSet::Fallback => "fallback",
            InstructionSet::Sse42 => "sse42",
            InstructionSet::Avx => "avx",
            InstructionSet::Avx2 => "avx2",
            InstructionSet::Avx512 => "avx512",
        };
        write!(f, "{name}")
    }
}

/// What the caller asks of the dispatcher: the fastest thing available,
/// or everything up to an explicit tier.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum IsaRequest {
    /// use the best compiled-in kernel the hardware supports
    Auto,
    /// use the best compiled-in kernel at or below this tier (still
    /// clamped by what the hardware supports)
    Ceiling(InstructionSet),
}

impl FromStr for IsaRequest {
    type Err = &'static str;

    /// accepts the conventional external spellings; "fastest" is the
    /// historical name for [`IsaRequest::Auto`]
    fn from_str(s: &str) -> Result<IsaRequest, &'static str> {
        match s.to_ascii_lowercase().as_str() {
            "auto" | "fastest" => Ok(IsaRequest::Auto),
            "fallback" => Ok(IsaRequest::Ceiling(InstructionSet::Fallback)),
            "sse42" => Ok(IsaRequest::Ceiling(InstructionSet::Sse42)),
            "avx" => Ok(IsaRequest::Ceiling(InstructionSet::Avx)),
            "avx2" => Ok(IsaRequest::Ceiling(InstructionSet::Avx2)),
            "avx512" => Ok(IsaRequest::Ceiling(InstructionSet::Avx512)),
            _ => Err("unrecognized instruction-set name"),
        }
    }
}

static DETECTED: OnceLock<InstructionSet> = OnceLock::new();

/// the highest tier the executing CPU supports (probed once, cached)
pub fn detect() -> InstructionSet {
    *DETECTED.get_or_init(probe)
}

#[cfg(target_arch = "x86_64")]
fn probe() -> InstructionSet {
    if std::arch::is_x86_feature_detected!("avx512f") {
        return InstructionSet::Avx512;
    }
    if std::arch::is_x86_feature_detected!("avx2") {
        return InstructionSet::Avx2;
    }
    if std::arch::is_x86_feature_detected!("avx") {
        return InstructionSet::Avx;
    }
    if std::arch::is_x86_feature_detected!("sse4.2") {
        return InstructionSet::Sse42;
    }
    InstructionSet::Fallback
}

#[cfg(not(target_arch = "x86_64"))]
fn probe() -> InstructionSet {
    InstructionSet::Fallback
}

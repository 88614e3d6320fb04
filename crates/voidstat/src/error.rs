// Error handling follows a two-layer approach: the internal crate
// returns `&'static str` messages everywhere (keeping it free of any
// error-type dependency), and this crate wraps those plus its own
// failure modes into an opaque `Error` with a private `ErrorKind`.
//
// Keeping the kind private lets us restructure the payloads without a
// breaking change; callers that need to branch on the failure mode get
// the coarse `ErrorClass` instead, which deliberately matches the set
// of outcomes a driver can report.

use std::fmt;

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
}

/// The coarse classification of a failure, one entry per reportable
/// outcome of a driver call.
#[non_exhaustive]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ErrorClass {
    /// an input failed validation before any work was done
    Validation,
    /// the domain geometry cannot support a mesh
    Grid,
    /// memory for the mesh or a histogram could not be reserved
    Allocation,
    /// no compiled kernel variant satisfied the request (unreachable
    /// while a fallback kernel is compiled in unconditionally)
    KernelDispatch,
    /// the bounded rejection-sampling budget ran out before a probe
    /// could be placed
    ProbePlacement,
    /// the call observed a cancellation request and stopped
    Interrupted,
    /// an internal counting invariant failed; indicates a bug, not a
    /// usage problem
    InvariantViolation,
    /// an unclassified error from the core algorithm crate
    Internal,
}

/// The underlying internal error type
#[non_exhaustive]
#[derive(Clone, Debug)]
enum ErrorKind {
    /// An error raised when an input fails validation (checked before
    /// any allocation happens)
    Validation(ValidationError),
    /// An error raised when the bounding box is degenerate or otherwise
    /// unusable for building a mesh
    Grid(GridError),
    /// An error raised when reserving memory for the mesh or a
    /// histogram fails
    Allocation(AllocationError),
    /// An error raised when kernel resolution finds no usable variant
    ///
    /// A fallback kernel is always compiled in, so seeing this means
    /// the dispatch table itself is miswired.
    KernelDispatch(KernelDispatchError),
    /// An error raised when a probe could not be placed within the
    /// retry budget
    ProbePlacement(ProbePlacementError),
    /// The cooperative-cancellation outcome
    Interrupted(InterruptedError),
    /// An error raised when a histogram bucket exceeds the number of
    /// accepted probes
    InvariantViolation(InvariantViolationError),
    /// Wraps the plain string errors coming out of the internal crate
    Internal(InternalError),
}

// define constructor methods for Error
impl Error {
    /// produce an error indicating that an input failed validation
    pub(crate) fn validation(what: impl Into<String>) -> Self {
        Error {
            kind: ErrorKind::Validation(ValidationError { what: what.into() }),
        }
    }

    /// produce an error indicating that a quantity which must be
    /// positive wasn't
    pub(crate) fn non_positive(quantity: &'static str) -> Self {
        Error {
            kind: ErrorKind::Validation(ValidationError {
                what: format!("{quantity} must be greater than zero"),
            }),
        }
    }

    /// produce an error indicating the domain cannot support a mesh
    pub(crate) fn grid(what: &'static str) -> Self {
        Error {
            kind: ErrorKind::Grid(GridError { what }),
        }
    }

    /// produce an error indicating a failed reservation
    pub(crate) fn allocation(what: &'static str) -> Self {
        Error {
            kind: ErrorKind::Allocation(AllocationError { what }),
        }
    }

    /// produce an error indicating that kernel resolution failed
    pub(crate) fn kernel_dispatch(what: &'static str) -> Self {
        Error {
            kind: ErrorKind::KernelDispatch(KernelDispatchError { what }),
        }
    }

    /// produce an error indicating the probe-placement budget ran out
    pub(crate) fn probe_placement(attempts: usize) -> Self {
        Error {
            kind: ErrorKind::ProbePlacement(ProbePlacementError { attempts }),
        }
    }

    /// produce the interrupted outcome
    pub(crate) fn interrupted() -> Self {
        Error {
            kind: ErrorKind::Interrupted(InterruptedError),
        }
    }

    /// produce an error indicating a histogram bucket overran the
    /// number of accepted probes
    pub(crate) fn invariant_violation(bin: usize, order: usize, count: u64, total: usize) -> Self {
        Error {
            kind: ErrorKind::InvariantViolation(InvariantViolationError {
                bin,
                order,
                count,
                total,
            }),
        }
    }

    /// wraps an internal error string
    pub(crate) fn internal(message: &'static str) -> Self {
        Error {
            kind: ErrorKind::Internal(InternalError(message)),
        }
    }

    /// the coarse classification of this error
    pub fn class(&self) -> ErrorClass {
        match self.kind {
            ErrorKind::Validation(_) => ErrorClass::Validation,
            ErrorKind::Grid(_) => ErrorClass::Grid,
            ErrorKind::Allocation(_) => ErrorClass::Allocation,
            ErrorKind::KernelDispatch(_) => ErrorClass::KernelDispatch,
            ErrorKind::ProbePlacement(_) => ErrorClass::ProbePlacement,
            ErrorKind::Interrupted(_) => ErrorClass::Interrupted,
            ErrorKind::InvariantViolation(_) => ErrorClass::InvariantViolation,
            ErrorKind::Internal(_) => ErrorClass::Internal,
        }
    }

    /// true when the call stopped because cancellation was requested
    pub fn is_interrupted(&self) -> bool {
        self.class() == ErrorClass::Interrupted
    }
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.kind.fmt(f)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ErrorKind::Validation(ref err) => err.fmt(f),
            ErrorKind::Grid(ref err) => err.fmt(f),
            ErrorKind::Allocation(ref err) => err.fmt(f),
            ErrorKind::KernelDispatch(ref err) => err.fmt(f),
            ErrorKind::ProbePlacement(ref err) => err.fmt(f),
            ErrorKind::Interrupted(ref err) => err.fmt(f),
            ErrorKind::InvariantViolation(ref err) => err.fmt(f),
            ErrorKind::Internal(ref err) => err.fmt(f),
        }
    }
}

/// An error raised when an input fails validation
#[derive(Clone, Debug)]
struct ValidationError {
    what: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid input: {}", self.what)
    }
}

/// An error raised when the domain geometry cannot support a mesh
#[derive(Clone, Debug)]
struct GridError {
    what: &'static str,
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "cannot build the cell mesh: {}", self.what)
    }
}

/// An error raised when reserving memory fails
#[derive(Clone, Debug)]
struct AllocationError {
    what: &'static str,
}

impl fmt::Display for AllocationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "out of memory: {}", self.what)
    }
}

/// An error raised when kernel resolution finds no usable variant
#[derive(Clone, Debug)]
struct KernelDispatchError {
    what: &'static str,
}

impl fmt::Display for KernelDispatchError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "kernel dispatch failed: {}", self.what)
    }
}

/// An error raised when a probe could not be placed within the retry
/// budget
#[derive(Clone, Debug)]
struct ProbePlacementError {
    attempts: usize,
}

impl fmt::Display for ProbePlacementError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "no probe sphere fit inside the domain after {} draws; the \
             search radius is too large for the non-periodic domain",
            self.attempts
        )
    }
}

/// The cooperative-cancellation outcome
#[derive(Clone, Debug)]
struct InterruptedError;

impl fmt::Display for InterruptedError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "the call was interrupted; partial results were discarded")
    }
}

/// An error raised when a histogram bucket exceeds the number of
/// accepted probes
#[derive(Clone, Debug)]
struct InvariantViolationError {
    bin: usize,
    order: usize,
    count: u64,
    total: usize,
}

impl fmt::Display for InvariantViolationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "histogram bucket [{}][{}] holds {} entries but only {} probes \
             were accepted; this is a counting bug",
            self.bin, self.order, self.count, self.total
        )
    }
}

/// Wraps the plain string errors coming out of the internal crate
#[derive(Clone)]
struct InternalError(&'static str);

impl fmt::Display for InternalError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for InternalError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

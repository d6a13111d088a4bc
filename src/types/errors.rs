use std::fmt;

// === SurfaceError ===

/// Errors related to content-surface operations.
///
/// The lifecycle core is deliberately error-light: duplicate teardown
/// and actions against a vanished surface are benign races and are
/// ignored rather than surfaced. This enum covers the few cases a
/// caller may genuinely want to observe.
#[derive(Debug)]
pub enum SurfaceError {
    /// No surface exists for the given identifier.
    NotFound(u64),
    /// The manager has been torn down; no further operations accepted.
    Terminated,
}

impl fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceError::NotFound(id) => write!(f, "Surface not found: {}", id),
            SurfaceError::Terminated => write!(f, "Window manager already terminated"),
        }
    }
}

impl std::error::Error for SurfaceError {}

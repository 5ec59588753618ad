use std::fmt;

use crate::BoxError;

/// A last-resort concrete error type for call sites that have only a
/// message, a `Box<dyn Error>`, or an existing `std::error::Error` and
/// nothing more specific to report.
pub struct OpaqueError(BoxError);

impl OpaqueError {
    /// Build an [`OpaqueError`] from anything implementing [`std::fmt::Display`],
    /// without requiring it to implement [`std::error::Error`].
    pub fn from_display(msg: impl fmt::Display) -> Self {
        Self(msg.to_string().into())
    }

    /// Build an [`OpaqueError`] from an existing [`std::error::Error`].
    pub fn from_std(err: impl StdError + Send + Sync + 'static) -> Self {
        Self(Box::new(err))
    }
}

use std::error::Error as StdError;

impl fmt::Debug for OpaqueError {
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for OpaqueError {
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for OpaqueError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.0.as_ref())
    }
}

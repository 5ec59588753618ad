/// Create a new [`OpaqueError`](crate::OpaqueError) from a string literal,
/// a formatted string, or an existing error.
///
/// ## Examples
///
/// ```
/// use router_error::error;
///
/// let err = error!("an error occurred");
/// let err = error!("an error occurred: {}", 42);
/// let err = error!(std::io::Error::other("oh no!"));
/// ```
#[doc(hidden)]
#[macro_export]
macro_rules! __error {
    ($msg:literal $(,)?) => ({
        $crate::OpaqueError::from_display($msg)
    });
    ($fmt:literal, $($arg:tt),+ $(,)?) => ({
        $crate::OpaqueError::from_display(format!($fmt, $($arg)*))
    });
    ($err:expr $(,)?) => ({
        $crate::OpaqueError::from_std($err)
    });
}
pub use crate::__error as error;

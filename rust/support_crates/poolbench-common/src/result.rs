pub type Result<T> = std::result::Result<T, crate::error::Error>;

/// Returns early with an `InvalidArgument` error for `name` unless `cond` holds.
///
/// Without a message, the failed condition itself becomes the message:
///
/// ```
/// use poolbench_common::{Result, verify_arg};
///
/// fn workers(n: usize) -> Result<usize> {
///     verify_arg!(n, n > 0);
///     verify_arg!(n, n <= 1024, "{n} workers is more than the pool supports");
///     Ok(n)
/// }
///
/// assert_eq!(workers(0).unwrap_err().to_string(), "invalid argument n: n > 0");
/// ```
#[macro_export]
macro_rules! verify_arg {
    ($name:ident, $cond:expr) => {
        if !($cond) {
            return Err($crate::error::Error::invalid_arg(
                stringify!($name),
                stringify!($cond),
            ));
        }
    };
    ($name:ident, $cond:expr, $($msg:tt)+) => {
        if !($cond) {
            return Err($crate::error::Error::invalid_arg(
                stringify!($name),
                format!($($msg)+),
            ));
        }
    };
}

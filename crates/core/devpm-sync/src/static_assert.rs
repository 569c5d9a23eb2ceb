//! Compile-time static assertion macro.

/// Asserts a condition at compile time.
///
/// # Examples
///
/// ```ignore
/// use devpm_sync::static_assert;
/// static_assert!(core::mem::size_of::<PmState>() == 1);
/// static_assert!(GENERATION_SHIFT < 32, "generation field out of range");
/// ```
#[macro_export]
macro_rules! static_assert {
    ($cond:expr $(,)?) => {
        const _: () = assert!($cond);
    };
    ($cond:expr, $msg:expr $(,)?) => {
        const _: () = assert!($cond, $msg);
    };
}

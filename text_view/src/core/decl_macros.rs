// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

/// Syntactic sugar for `Ok(())` and `Ok($value)`.
///
/// ```
/// use r3bl_text_view::ok;
///
/// fn unit() -> miette::Result<()> { ok!() }
/// fn value() -> miette::Result<u8> { ok!(42) }
///
/// assert!(unit().is_ok());
/// assert_eq!(value().unwrap(), 42);
/// ```
#[macro_export]
macro_rules! ok {
    () => {
        Ok(())
    };
    ($value:expr) => {
        Ok($value)
    };
}

/// Runs the block only if the given `DEBUG_*` flag is `true`.
///
/// ```
/// use r3bl_text_view::call_if_true;
///
/// const DEBUG_SOMETHING: bool = true;
/// let mut count = 0;
/// call_if_true!(DEBUG_SOMETHING, { count += 1; });
/// assert_eq!(count, 1);
/// ```
#[macro_export]
macro_rules! call_if_true {
    ($cond:ident, $block:expr) => {{
        if $cond {
            $block
        }
    }};
}

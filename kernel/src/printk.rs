//! Console output for the simulated host, dmesg style: every line carries
//! the uptime of the host clock.

use core::fmt;

#[doc(hidden)]
pub fn printk(args: fmt::Arguments<'_>) {
    let uptime = crate::time::uptime();
    println!(
        "[{:>5}.{:06}] {}",
        uptime.as_secs(),
        uptime.subsec_micros(),
        args
    );
}

#[macro_export]
macro_rules! pr_info {
    ($($arg:tt)*) => {
        $crate::printk::printk(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! pr_warn {
    ($($arg:tt)*) => {
        $crate::printk::printk(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! pr_err {
    ($($arg:tt)*) => {
        $crate::printk::printk(format_args!($($arg)*))
    };
}

/// Compiled out of release builds, like `pr_debug` under `DEBUG`.
#[macro_export]
macro_rules! pr_debug {
    ($($arg:tt)*) => {
        if cfg!(debug_assertions) {
            $crate::printk::printk(format_args!($($arg)*))
        }
    };
}

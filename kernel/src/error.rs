use core::{fmt, fmt::Debug, num::TryFromIntError, str::Utf8Error};

pub type KernelResult<T = ()> = Result<T, Error>;

/// Largest errno magnitude the host contract recognizes.
pub const MAX_ERRNO: i32 = 4095;

/// A kernel error code.
///
/// The wrapped value is always a negative errno, mirroring the return
/// convention of the C file-operation callbacks.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Error(i32);

impl Error {
    pub fn from_errno(errno: i32) -> Error {
        if errno < -MAX_ERRNO || errno >= 0 {
            crate::pr_warn!(
                "attempted to create `Error` with out of range `errno`: {}",
                errno
            );
            return linux_err::EINVAL;
        }
        // INVARIANT: The check above ensures the type invariant
        // will hold.
        Error(errno)
    }

    pub fn to_errno(&self) -> i32 {
        self.0
    }

    /// Returns the symbolic name of the error, if one is declared.
    pub fn name(&self) -> Option<&'static str> {
        linux_err::name(self.0)
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            // Print out number if no name can be found.
            None => f.debug_tuple("Error").field(&-self.0).finish(),
            Some(name) => f.debug_tuple(name).finish(),
        }
    }
}

/// Contains the C-compatible error codes.
#[rustfmt::skip]
pub mod linux_err {
    macro_rules! declare_err {
        ($(($err:tt, $num:literal, $doc:expr),)+) => {
            $(
            #[doc = $doc]
            pub const $err: super::Error = super::Error(-$num);
            )+

            pub(super) fn name(errno: i32) -> Option<&'static str> {
                match errno {
                    $( -$num => Some(stringify!($err)), )+
                    _ => None,
                }
            }
        };
    }

    declare_err! {
        (EPERM, 1, "Operation not permitted."),
        (ENOENT, 2, "No such file or directory."),
        (EIO, 5, "I/O error."),
        (ENXIO, 6, "No such device or address."),
        (EBADF, 9, "Bad file number."),
        (EAGAIN, 11, "Try again."),
        (ENOMEM, 12, "Out of memory."),
        (EACCES, 13, "Permission denied."),
        (EFAULT, 14, "Bad address."),
        (EBUSY, 16, "Device or resource busy."),
        (EEXIST, 17, "File exists."),
        (ENODEV, 19, "No such device."),
        (EINVAL, 22, "Invalid argument."),
        (ENOSPC, 28, "No space left on device."),
        (ERANGE, 34, "Math result not representable."),
    }
}

impl From<TryFromIntError> for Error {
    fn from(_: TryFromIntError) -> Error {
        linux_err::EINVAL
    }
}

impl From<Utf8Error> for Error {
    fn from(_: Utf8Error) -> Error {
        linux_err::EINVAL
    }
}

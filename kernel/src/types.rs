//! Identifier types shared by the host and drivers.

use core::fmt;

const MINOR_BITS: u32 = 20;
const MINOR_MASK: u32 = (1 << MINOR_BITS) - 1;

/// Packed major/minor device identifier, `dev_t` style.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DevT(u32);

impl DevT {
    pub const fn new(major: u32, minor: u32) -> DevT {
        DevT((major << MINOR_BITS) | (minor & MINOR_MASK))
    }

    pub const fn major(self) -> u32 {
        self.0 >> MINOR_BITS
    }

    pub const fn minor(self) -> u32 {
        self.0 & MINOR_MASK
    }
}

impl fmt::Debug for DevT {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.major(), self.minor())
    }
}

//! Page and frame number types.
//!
//! Frames are addressed by index everywhere in the simulator: the frame table is a flat
//! arena and a [`FrameNumber`] is the only handle to one of its slots. [`PageNumber`] plays
//! the same role for the virtual side, indexing into a process's page table.

use core::{
    fmt,
    ops::{Add, Sub},
};

/// Macro to define common page/frame number functionality.
macro_rules! impl_page_number_common {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(transparent)]
        pub struct $name(usize);

        impl $name {
            /// Creates a new page/frame number.
            #[inline]
            pub const fn new(number: usize) -> Self {
                Self(number)
            }

            /// Returns the raw page/frame number.
            #[inline]
            pub const fn as_usize(self) -> usize {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<usize> for $name {
            #[inline]
            fn from(number: usize) -> Self {
                Self(number)
            }
        }

        impl Add<usize> for $name {
            type Output = Self;

            #[inline]
            fn add(self, rhs: usize) -> Self::Output {
                Self(self.0 + rhs)
            }
        }

        impl Sub<$name> for $name {
            type Output = usize;

            #[inline]
            fn sub(self, rhs: $name) -> Self::Output {
                self.0 - rhs.0
            }
        }
    };
}

impl_page_number_common!(
    FrameNumber,
    "A physical frame number.\n\n\
     Identifies one slot of the frame table and one page-sized region of physical memory."
);

impl_page_number_common!(
    PageNumber,
    "A virtual page number.\n\n\
     Identifies one entry of a process's page table."
);

impl FrameNumber {
    /// Returns an iterator over the first `count` frame numbers, in index order.
    pub fn range(count: usize) -> impl Iterator<Item = FrameNumber> {
        (0..count).map(FrameNumber)
    }
}

impl PageNumber {
    /// Returns an iterator over the first `count` page numbers, in index order.
    pub fn range(count: usize) -> impl Iterator<Item = PageNumber> {
        (0..count).map(PageNumber)
    }
}

// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A tiny bitflags generator used by the GPU API descriptors.

/// Declares a `Copy` flag set backed by an integer, with named constants and
/// the usual set operators.
///
/// ```
/// tessera_core::tessera_bitflags! {
///     /// Example flags.
///     pub struct Access: u8 {
///         /// Read access.
///         const READ = 1 << 0;
///         /// Write access.
///         const WRITE = 1 << 1;
///     }
/// }
/// let rw = Access::READ | Access::WRITE;
/// assert!(rw.contains(Access::READ));
/// assert!(!Access::READ.contains(Access::WRITE));
/// ```
#[macro_export]
macro_rules! tessera_bitflags {
    (
        $(#[$outer:meta])*
        $vis:vis struct $name:ident: $ty:ty {
            $(
                $(#[$inner:meta])*
                const $flag:ident = $value:expr;
            )*
        }
    ) => {
        $(#[$outer])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
        $vis struct $name {
            bits: $ty,
        }

        impl $name {
            $(
                $(#[$inner])*
                pub const $flag: Self = Self { bits: $value };
            )*

            /// Returns a set with no flags.
            #[inline]
            pub const fn empty() -> Self {
                Self { bits: 0 }
            }

            /// Returns the raw bit representation.
            #[inline]
            pub const fn bits(&self) -> $ty {
                self.bits
            }

            /// Returns `true` if every flag of `other` is also set in `self`.
            #[inline]
            pub const fn contains(&self, other: Self) -> bool {
                (self.bits & other.bits) == other.bits
            }

            /// Returns `true` if no flag is set.
            #[inline]
            pub const fn is_empty(&self) -> bool {
                self.bits == 0
            }

            /// Returns the union of two sets.
            #[inline]
            pub const fn union(self, other: Self) -> Self {
                Self {
                    bits: self.bits | other.bits,
                }
            }
        }

        impl ::std::ops::BitOr for $name {
            type Output = Self;
            #[inline]
            fn bitor(self, rhs: Self) -> Self {
                self.union(rhs)
            }
        }

        impl ::std::ops::BitOrAssign for $name {
            #[inline]
            fn bitor_assign(&mut self, rhs: Self) {
                *self = self.union(rhs);
            }
        }

        impl ::std::ops::BitAnd for $name {
            type Output = Self;
            #[inline]
            fn bitand(self, rhs: Self) -> Self {
                Self {
                    bits: self.bits & rhs.bits,
                }
            }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                let mut first = true;
                write!(f, "{}(", stringify!($name))?;
                $(
                    if Self::$flag.bits != 0 && self.contains(Self::$flag) {
                        if !first {
                            write!(f, " | ")?;
                        }
                        write!(f, "{}", stringify!($flag))?;
                        first = false;
                    }
                )*
                if first {
                    write!(f, "empty")?;
                }
                write!(f, ")")
            }
        }
    };
}

#[cfg(test)]
mod tests {
    tessera_bitflags! {
        /// Flags used by the tests below.
        pub struct TestFlags: u32 {
            /// A.
            const A = 1 << 0;
            /// B.
            const B = 1 << 1;
            /// Both.
            const AB = Self::A.bits() | Self::B.bits();
        }
    }

    #[test]
    fn test_union_and_contains() {
        let f = TestFlags::A | TestFlags::B;
        assert_eq!(f, TestFlags::AB);
        assert!(f.contains(TestFlags::A));
        assert!(!TestFlags::A.contains(TestFlags::B));
        assert!(TestFlags::empty().is_empty());
        assert_eq!((f & TestFlags::B), TestFlags::B);
    }

    #[test]
    fn test_debug_lists_set_flags() {
        assert_eq!(format!("{:?}", TestFlags::A), "TestFlags(A)");
        assert_eq!(format!("{:?}", TestFlags::empty()), "TestFlags(empty)");
    }
}

//! The `|` merge operator.
//!
//! `left | right` keeps both operands untouched and returns a new provider:
//!
//! - factories: right-biased union, shared keys keep their slot from `left`
//! - seed values: right-biased union, minus every key a factory claims
//! - observers: `left`'s followed by `right`'s
//! - configuration: `left`'s
//!
//! So a factory for a key wins over a seed value for it whichever side each
//! came from. Merging with an [`AsyncProvider`] on either side lifts the
//! synchronous operand and yields an `AsyncProvider`.
//!
//! ```
//! use ferrous_scope::{AsyncProvider, Provider};
//!
//! let values = Provider::new().with_value(1u8);
//! let factories = Provider::from_factory(|| 2u8).unwrap();
//!
//! for merged in [&values | &factories, &factories | &values] {
//!     assert_eq!(merged.build(|c| *c.require::<u8>().unwrap()).unwrap(), 2);
//! }
//!
//! let lifted: AsyncProvider = values | AsyncProvider::new();
//! # let _ = lifted;
//! ```

use std::ops::BitOr;

use super::{AsyncProvider, Provider};

fn merge_sync(left: &Provider, right: &Provider) -> Provider {
    left.merge(right)
}

fn merge_lifted(left: &Provider, right: &AsyncProvider) -> AsyncProvider {
    left.clone().into_async().merge(right)
}

fn merge_into_lifted(left: &AsyncProvider, right: &Provider) -> AsyncProvider {
    left.merge(&right.clone().into_async())
}

fn merge_async(left: &AsyncProvider, right: &AsyncProvider) -> AsyncProvider {
    left.merge(right)
}

macro_rules! impl_bitor {
    ($lhs:ty, $rhs:ty => $out:ty, $merge:ident) => {
        impl BitOr<$rhs> for $lhs {
            type Output = $out;

            fn bitor(self, rhs: $rhs) -> $out {
                $merge(&self, &rhs)
            }
        }

        impl BitOr<&$rhs> for $lhs {
            type Output = $out;

            fn bitor(self, rhs: &$rhs) -> $out {
                $merge(&self, rhs)
            }
        }

        impl BitOr<$rhs> for &$lhs {
            type Output = $out;

            fn bitor(self, rhs: $rhs) -> $out {
                $merge(self, &rhs)
            }
        }

        impl BitOr<&$rhs> for &$lhs {
            type Output = $out;

            fn bitor(self, rhs: &$rhs) -> $out {
                $merge(self, rhs)
            }
        }
    };
}

impl_bitor!(Provider, Provider => Provider, merge_sync);
impl_bitor!(Provider, AsyncProvider => AsyncProvider, merge_lifted);
impl_bitor!(AsyncProvider, Provider => AsyncProvider, merge_into_lifted);
impl_bitor!(AsyncProvider, AsyncProvider => AsyncProvider, merge_async);

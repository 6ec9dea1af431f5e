#![doc = include_str!("../README.md")]
#![deny(unsafe_op_in_unsafe_fn)]

mod raw;
mod set;

#[cfg(feature = "serde")]
mod serde_impls;

pub use set::{HashSet, HashSetBuilder, HashSetRef, Iter};

pub use seize::{Guard, LocalGuard, OwnedGuard};

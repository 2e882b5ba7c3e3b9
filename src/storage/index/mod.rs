#![forbid(unsafe_code)]

mod sorted;

pub use sorted::{IndexRoot, SortedIndex};

//! The hash map family and bitset used by Calir's interning caches and
//! (eventually) dataflow analyses.

pub mod bitset;
pub mod hashtable;

pub use bitset::Bitset;
pub use hashtable::{Entry, FloatKey, FnOps, HashTable, KeyOps, StdOps};

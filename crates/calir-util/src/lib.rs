//! Foundation types shared by every Calir crate: typed indices, source
//! spans, and a small diagnostic type. Nothing here is Calir-IR specific —
//! it is the same kind of grab-bag a compiler's "util" crate always ends up
//! being.

pub mod diagnostic;
pub mod error;
pub mod idx;
pub mod span;

pub use diagnostic::{Diagnostic, Level};
pub use error::{Result, UtilError};
pub use idx::{Idx, IndexVec};
pub use span::{LineTracker, Span};

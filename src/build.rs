//! Construction algorithms.
//!
//! McCreight and Ukkonen drive the interchangeable [`Store`](crate::store::Store)
//! layouts; PWOTD owns the write-only linear array. Each online family comes
//! in a "simple" rendition (no suffix links, walks start at the root) and a
//! "linked" rendition (suffix links plus pending-link carry).

pub mod mccreight;
pub mod pwotd;
pub mod ukkonen;

//! Domain logic
//!
//! - `filter` - filter normalization, predicate compilation and paged listings

pub mod filter;

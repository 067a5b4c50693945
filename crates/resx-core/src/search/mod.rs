//! Conditional-match criteria and the index they are evaluated against

pub mod criteria;
pub mod index;

pub use criteria::{Comparator, Modifier, SearchParameter, SearchParameterMap};
pub use index::{extract_index, IndexEntry};

//! Representation and I/O of the input datasets.

pub mod mappings;
pub mod record;
pub mod scores;
pub mod xref;

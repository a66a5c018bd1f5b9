//! Result persistence.

pub mod export;

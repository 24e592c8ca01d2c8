//! Stores that wrap other stores to augment them.

pub mod traced;

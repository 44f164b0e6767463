//! Application services layer.

pub mod error;
pub mod listing;
pub mod repos;

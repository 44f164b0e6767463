//! Edicola: a small article-publishing backend.
//!
//! The interesting surface is the paginated listing cache: a cache-aside
//! layer over a soft-deleted, recency-ordered article collection, holding a
//! max-page scalar and per-page projections in a shared key-value store with
//! independent TTLs and no write-side invalidation. See
//! [`application::listing`] for the protocol.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;

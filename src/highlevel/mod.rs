//! High-level convenience API.
//!
//! This layer provides [`Substrate`], which owns the sensory block, the
//! sight/hearing relations, the two-level reading block and a
//! [`DomainRouter`] over the id-driven sequence engines,
//! restoring all of them from a [`BlobStore`](crate::memory::BlobStore) and
//! saving after each learning step.
//!
//! For production or library code, prefer importing from [`kernel`](crate::kernel)
//! and [`memory`](crate::memory) directly.

pub mod client;
pub mod router;

pub use client::{OperatorRole, Perception, Substrate};
pub use router::{Domain, DomainRouter, Response, Signal};

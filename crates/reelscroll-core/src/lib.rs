//! # reelscroll-core
//!
//! Core types, traits, and abstractions for the reelscroll media-feed
//! data-access layer.
//!
//! This crate provides the entity shapes, filter normalization, request
//! signatures and the [`Transport`] trait that the transport and engine
//! crates build on.

pub mod defaults;
pub mod error;
pub mod filter;
pub mod logging;
pub mod models;
pub mod rating;
pub mod signature;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use filter::{
    normalize_criterion, normalize_object_filter, CriterionModifier, FilterCriteria,
    MultiCriterion,
};
pub use models::*;
pub use rating::{from_rating100, to_rating100};
pub use signature::{RequestSignature, SignatureBuilder};
pub use traits::*;

// Cancellation token type used throughout the public API.
pub use tokio_util::sync::CancellationToken;

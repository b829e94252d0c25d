//! # reelscroll-engine
//!
//! Query engine of the reelscroll feed: result caching, in-flight request
//! deduplication, batched existence probing, random pagination and the
//! shuffle-mode density filter, all behind [`FeedClient`].
//!
//! # Example
//!
//! ```rust,no_run
//! use reelscroll_engine::{FeedClient, FeedQuery};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo() -> reelscroll_core::Result<()> {
//! let client = FeedClient::from_env(None)?;
//! let cancel = CancellationToken::new();
//! let markers = client
//!     .fetch_marker_feed(&FeedQuery::default().with_tags(["12"]), &cancel)
//!     .await;
//! println!("{} markers", markers.len());
//! client.dispose().await;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod dedup;
pub mod existence;
pub mod feed;
pub mod membership;
pub mod pager;
pub mod queries;
pub mod shuffle;
pub mod sources;

pub use cache::{spawn_sweeper, CacheStats, ResultCache};
pub use client::{FeedClient, NewMarker};
pub use config::EngineConfig;
pub use dedup::Deduplicator;
pub use existence::{ExistenceChecker, ExistenceProbe};
pub use feed::{FeedQuery, SavedFilter};
pub use membership::MembershipCache;
pub use pager::{fetch_random_page, Page, PageChoice, PageRequest, PageSource};
pub use shuffle::{expand_scenes, filter_by_marker_density};

//! Asset graph core — data model, errors, and config.
//!
//! Pure data structures and the error/config types that sit on top of
//! them. No storage behavior lives here; see `assetgraph-store` for the
//! `Repository` contract and the `CacheRepo` that implements it twice over.

mod bookkeeping;
mod config;
mod entities;
mod error;
mod health;
mod identity;
mod model;

pub use bookkeeping::*;
pub use config::*;
pub use entities::*;
pub use error::*;
pub use health::*;
pub use identity::*;
pub use model::*;

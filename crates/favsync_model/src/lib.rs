//! # favsync model
//!
//! Favorite records and sync wire messages.
//!
//! This crate provides:
//! - [`FavoriteRecord`], the local form of a favorite
//! - [`WireFavorite`], the wire form carrying the `isFavorite` flag
//! - [`PointOfInterest`], the entity a user favorites
//! - Protocol messages ([`PushRequest`], [`PullResponse`]) with JSON codecs
//!
//! This is a pure data crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod messages;
mod record;
mod timestamp;

pub use error::{ModelError, ModelResult};
pub use messages::{PullResponse, PushRequest};
pub use record::{FavoriteRecord, PointOfInterest, WireFavorite, UNNAMED_PLACE};
pub use timestamp::{format_timestamp, parse_timestamp};

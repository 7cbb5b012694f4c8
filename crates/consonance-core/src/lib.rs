//! Core domain model for consonance.
//!
//! This crate defines the song model (identifiers, track metadata and the
//! fixed-order audio descriptor vector), lyric token counts, and the text
//! processing shared by the offline corpus build and online query
//! resolution: lyric cleaning and tokenizing, stopwords, and the name
//! normalization used for fuzzy artist/title matching.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod error;
pub mod model;
pub mod text;

pub use error::{Error, Result};
pub use model::{AudioFeatures, Query, Song, SongId, TokenCounts, FEATURE_COLUMNS, FEATURE_COUNT};

//! The two phases around the consonance ranking engine.
//!
//! The offline phase loads a track table and a lyrics table, builds every
//! corpus structure and writes the bundle ([`build`]). The online phase
//! resolves a free-text or id query through a metadata provider and a
//! lyrics provider, then hands the resolved song to the engine
//! ([`recommend`]). Configuration and provider errors live here too.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod build;
pub mod config;
pub mod dataset;
pub mod error;
pub mod providers;
pub mod recommend;

pub use build::{build_corpus, BuildReport};
pub use config::{Config, IndexSettings, LoggingConfig};
pub use error::{ProviderError, ProviderResult, RecommendError};
pub use providers::{
    GeniusClient, LyricsProvider, MetadataProvider, NoLyrics, SpotifyClient, TrackInfo,
};
pub use recommend::{QueryInput, Recommendations, Recommender};

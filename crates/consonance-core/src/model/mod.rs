pub mod ids;
pub mod query;
pub mod song;
pub mod tokens;

pub use ids::SongId;
pub use query::Query;
pub use song::{AudioFeatures, Song, FEATURE_COLUMNS, FEATURE_COUNT};
pub use tokens::TokenCounts;

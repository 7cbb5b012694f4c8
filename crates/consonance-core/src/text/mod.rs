//! Text processing shared by corpus building and query resolution.

pub mod lyrics;
pub mod names;
pub mod stopwords;

pub use lyrics::{clean_lyrics, lyric_token_counts, tokenize};
pub use names::{fuzzy_match, normalize_name, parse_artist_title, strip_name};
pub use stopwords::Stopwords;

use crate::model::ids::SongId;
use crate::model::song::AudioFeatures;
use crate::model::tokens::TokenCounts;

/// A resolved query song, built per request and never persisted.
///
/// `artist` and `title` are the lowercased, version-stripped names used to
/// keep the query's own alternate recordings out of its results.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub id: SongId,
    pub artist: String,
    pub title: String,
    pub features: AudioFeatures,
    /// Token counts of the query's lyrics, when they were fetched.
    pub lyrics: Option<TokenCounts>,
}

impl Query {
    #[must_use]
    pub fn new(
        id: impl Into<SongId>,
        artist: impl Into<String>,
        title: impl Into<String>,
        features: AudioFeatures,
    ) -> Self {
        Self {
            id: id.into(),
            artist: artist.into(),
            title: title.into(),
            features,
            lyrics: None,
        }
    }

    #[must_use]
    pub fn with_lyrics(mut self, lyrics: TokenCounts) -> Self {
        self.lyrics = Some(lyrics);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_builder() {
        let query = Query::new("q", "artist", "title", AudioFeatures::default());
        assert!(query.lyrics.is_none());

        let query = query.with_lyrics(TokenCounts::from_tokens(["la", "la"]));
        assert_eq!(query.lyrics.unwrap().get("la"), 2);
    }
}

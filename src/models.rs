//! Data models for Epikodi

use serde::{Deserialize, Serialize};

/// UI Tab selection
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tab {
    Movies,
    Series,
    Music,
    Favorites,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Movies, Tab::Series, Tab::Music, Tab::Favorites];

    pub fn label(&self) -> &'static str {
        match self {
            Tab::Movies => "🎬 Movies",
            Tab::Series => "📺 Series",
            Tab::Music => "🎵 Music",
            Tab::Favorites => "❤ Favorites",
        }
    }
}

/// Kind of media a favorite points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Series,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Series => "series",
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Favorite item (persisted to JSON)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FavoriteEntry {
    pub id: i64,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    /// ISO-8601 UTC, set once when the entry is added
    #[serde(rename = "addedAt")]
    pub added_at: String,
}

/// What a view hands to the favorites store; `added_at` is stamped by the store
#[derive(Debug, Clone, PartialEq)]
pub struct NewFavorite {
    pub id: i64,
    pub media_type: MediaType,
    pub title: String,
    pub poster_path: Option<String>,
}

/// A 30-second preview clip ready for the preview controller
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewTrack {
    pub track_id: i64,
    pub preview_url: String,
    /// Full-track length, display only
    pub duration_seconds: u32,
    pub title: String,
    pub artist: String,
    pub album: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub overview: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: String,
    pub vote_average: f64,
    pub vote_count: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub id: i64,
    pub name: String,
    pub overview: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub first_air_date: String,
    pub vote_average: f64,
    pub vote_count: i64,
}

/// Movie or series as shown in the shared list and detail views
#[derive(Debug, Clone, PartialEq)]
pub struct MediaSummary {
    pub id: i64,
    pub media_type: MediaType,
    pub title: String,
    pub overview: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub date: String,
    pub vote_average: f64,
}

impl MediaSummary {
    /// First four characters of the release/air date, when they look like a year
    pub fn year(&self) -> Option<&str> {
        let year = self.date.get(..4)?;
        year.chars().all(|c| c.is_ascii_digit()).then_some(year)
    }

    /// Enough to reopen the detail view from the Favorites tab
    pub fn from_favorite(entry: &FavoriteEntry) -> Self {
        Self {
            id: entry.id,
            media_type: entry.media_type,
            title: entry.title.clone(),
            overview: String::new(),
            poster_path: entry.poster_path.clone(),
            backdrop_path: None,
            date: String::new(),
            vote_average: 0.0,
        }
    }

    pub fn as_new_favorite(&self) -> NewFavorite {
        NewFavorite {
            id: self.id,
            media_type: self.media_type,
            title: self.title.clone(),
            poster_path: self.poster_path.clone(),
        }
    }
}

impl From<Movie> for MediaSummary {
    fn from(m: Movie) -> Self {
        Self {
            id: m.id,
            media_type: MediaType::Movie,
            title: m.title,
            overview: m.overview,
            poster_path: m.poster_path,
            backdrop_path: m.backdrop_path,
            date: m.release_date,
            vote_average: m.vote_average,
        }
    }
}

impl From<Series> for MediaSummary {
    fn from(s: Series) -> Self {
        Self {
            id: s.id,
            media_type: MediaType::Series,
            title: s.name,
            overview: s.overview,
            poster_path: s.poster_path,
            backdrop_path: s.backdrop_path,
            date: s.first_air_date,
            vote_average: s.vote_average,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Video {
    pub id: String,
    pub key: String,
    pub name: String,
    pub site: String,
    pub kind: String,
    pub official: bool,
}

impl Video {
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.key)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CastMember {
    pub id: i64,
    pub name: String,
    pub character: String,
    pub profile_path: Option<String>,
    pub order: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Artist {
    pub id: i64,
    pub name: String,
    pub picture_medium: String,
    pub nb_album: i64,
    pub nb_fan: i64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArtistRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AlbumRef {
    pub id: i64,
    pub title: String,
    pub cover_medium: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Album {
    pub id: i64,
    pub title: String,
    pub cover_medium: String,
    pub cover_big: String,
    pub release_date: String,
    pub record_type: String,
    pub nb_tracks: i64,
    pub artist: ArtistRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub id: i64,
    pub title: String,
    pub title_short: String,
    /// Full-track length in seconds
    pub duration: u32,
    /// URL of the 30-second clip; empty when the catalog has none
    pub preview: String,
    pub artist: ArtistRef,
    pub album: AlbumRef,
}

impl Track {
    pub fn has_preview(&self) -> bool {
        !self.preview.is_empty()
    }

    pub fn to_preview(&self) -> PreviewTrack {
        PreviewTrack {
            track_id: self.id,
            preview_url: self.preview.clone(),
            duration_seconds: self.duration,
            title: self.title.clone(),
            artist: self.artist.name.clone(),
            album: self.album.title.clone(),
        }
    }
}

/// Format seconds as M:SS
pub fn format_duration(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

//! Music catalog client
//!
//! Requests can be routed through a CORS relay that takes the whole target URL,
//! percent-encoded, appended to its own prefix.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{build_url, null_default, HttpClient};
use crate::error::{Error, Result};
use crate::models::{Album, AlbumRef, Artist, ArtistRef, Track};

pub const BASE_URL: &str = "https://api.deezer.com";

#[derive(Deserialize)]
struct Envelope<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
    #[serde(default)]
    error: Option<ErrorDto>,
}

#[derive(Deserialize, Default)]
struct ErrorDto {
    #[serde(rename = "type", default, deserialize_with = "null_default")]
    kind: String,
    #[serde(default, deserialize_with = "null_default")]
    message: String,
}

impl ErrorDto {
    fn into_error(self) -> Error {
        Error::Upstream(format!("{}: {}", self.kind, self.message))
    }
}

#[derive(Deserialize, Default)]
struct ArtistRefDto {
    #[serde(default, deserialize_with = "null_default")]
    id: i64,
    #[serde(default, deserialize_with = "null_default")]
    name: String,
}

#[derive(Deserialize, Default)]
struct AlbumRefDto {
    #[serde(default, deserialize_with = "null_default")]
    id: i64,
    #[serde(default, deserialize_with = "null_default")]
    title: String,
    #[serde(default, deserialize_with = "null_default")]
    cover_medium: String,
}

#[derive(Deserialize)]
struct ArtistDto {
    id: i64,
    #[serde(default, deserialize_with = "null_default")]
    name: String,
    #[serde(default, deserialize_with = "null_default")]
    picture_medium: String,
    #[serde(default, deserialize_with = "null_default")]
    nb_album: i64,
    #[serde(default, deserialize_with = "null_default")]
    nb_fan: i64,
}

#[derive(Deserialize)]
struct AlbumDto {
    id: i64,
    #[serde(default, deserialize_with = "null_default")]
    title: String,
    #[serde(default, deserialize_with = "null_default")]
    cover_medium: String,
    #[serde(default, deserialize_with = "null_default")]
    cover_big: String,
    #[serde(default, deserialize_with = "null_default")]
    release_date: String,
    #[serde(default, deserialize_with = "null_default")]
    record_type: String,
    #[serde(default, deserialize_with = "null_default")]
    nb_tracks: i64,
    #[serde(default, deserialize_with = "null_default")]
    artist: ArtistRefDto,
}

#[derive(Deserialize)]
struct TrackDto {
    id: i64,
    #[serde(default, deserialize_with = "null_default")]
    title: String,
    #[serde(default, deserialize_with = "null_default")]
    title_short: String,
    #[serde(default, deserialize_with = "null_default")]
    duration: u32,
    #[serde(default, deserialize_with = "null_default")]
    preview: String,
    #[serde(default, deserialize_with = "null_default")]
    artist: ArtistRefDto,
    #[serde(default, deserialize_with = "null_default")]
    album: AlbumRefDto,
}

impl From<ArtistRefDto> for ArtistRef {
    fn from(a: ArtistRefDto) -> Self {
        ArtistRef { id: a.id, name: a.name }
    }
}

impl From<AlbumRefDto> for AlbumRef {
    fn from(a: AlbumRefDto) -> Self {
        AlbumRef { id: a.id, title: a.title, cover_medium: a.cover_medium }
    }
}

impl From<ArtistDto> for Artist {
    fn from(a: ArtistDto) -> Self {
        Artist {
            id: a.id,
            name: a.name,
            picture_medium: a.picture_medium,
            nb_album: a.nb_album,
            nb_fan: a.nb_fan,
        }
    }
}

impl From<AlbumDto> for Album {
    fn from(a: AlbumDto) -> Self {
        Album {
            id: a.id,
            title: a.title,
            cover_medium: a.cover_medium,
            cover_big: a.cover_big,
            release_date: a.release_date,
            record_type: a.record_type,
            nb_tracks: a.nb_tracks,
            artist: a.artist.into(),
        }
    }
}

impl From<TrackDto> for Track {
    fn from(t: TrackDto) -> Self {
        let title_short = if t.title_short.is_empty() { t.title.clone() } else { t.title_short };
        Track {
            id: t.id,
            title: t.title,
            title_short,
            duration: t.duration,
            preview: t.preview,
            artist: t.artist.into(),
            album: t.album.into(),
        }
    }
}

/// `{ "data": [...] }` list; an `{ "error": ... }` body is an upstream error
fn parse_list<T, D>(body: &str) -> Result<Vec<T>>
where
    D: DeserializeOwned + Into<T>,
{
    let envelope: Envelope<D> = serde_json::from_str(body)?;
    if let Some(error) = envelope.error {
        return Err(error.into_error());
    }
    Ok(envelope.data.into_iter().map(Into::into).collect())
}

fn parse_object<T, D>(body: &str) -> Result<T>
where
    D: DeserializeOwned + Into<T>,
{
    let value: serde_json::Value = serde_json::from_str(body)?;
    if let Some(error) = value.get("error") {
        let error: ErrorDto = serde_json::from_value(error.clone()).unwrap_or_default();
        return Err(error.into_error());
    }
    let dto: D = serde_json::from_value(value)?;
    Ok(dto.into())
}

pub fn parse_artists(body: &str) -> Result<Vec<Artist>> {
    parse_list::<Artist, ArtistDto>(body)
}

pub fn parse_albums(body: &str) -> Result<Vec<Album>> {
    parse_list::<Album, AlbumDto>(body)
}

pub fn parse_tracks(body: &str) -> Result<Vec<Track>> {
    parse_list::<Track, TrackDto>(body)
}

/// Wrap `target` in the relay prefix; an empty relay leaves it untouched
pub fn relay_url(relay: &str, target: &str) -> String {
    if relay.is_empty() {
        target.to_string()
    } else {
        format!("{}{}", relay, urlencoding::encode(target))
    }
}

#[derive(Clone)]
pub struct DeezerClient {
    http: HttpClient,
    relay: String,
}

impl DeezerClient {
    pub fn new(http: HttpClient, relay: &str) -> Self {
        Self {
            http,
            relay: relay.trim().to_string(),
        }
    }

    pub fn url(&self, path: &str, params: &[(&str, &str)]) -> String {
        relay_url(&self.relay, &build_url(BASE_URL, path, params))
    }

    fn get(&self, path: &str, params: &[(&str, &str)]) -> Result<String> {
        self.http.get_text(&self.url(path, params))
    }

    pub fn search_artists(&self, query: &str) -> Result<Vec<Artist>> {
        parse_artists(&self.get("/search/artist", &[("q", query)])?)
    }

    pub fn search_albums(&self, query: &str) -> Result<Vec<Album>> {
        parse_albums(&self.get("/search/album", &[("q", query)])?)
    }

    pub fn search_tracks(&self, query: &str) -> Result<Vec<Track>> {
        parse_tracks(&self.get("/search/track", &[("q", query)])?)
    }

    pub fn artist(&self, artist_id: i64) -> Result<Artist> {
        parse_object::<Artist, ArtistDto>(&self.get(&format!("/artist/{}", artist_id), &[])?)
    }

    pub fn artist_albums(&self, artist_id: i64) -> Result<Vec<Album>> {
        parse_albums(&self.get(&format!("/artist/{}/albums", artist_id), &[])?)
    }

    pub fn album(&self, album_id: i64) -> Result<Album> {
        parse_object::<Album, AlbumDto>(&self.get(&format!("/album/{}", album_id), &[])?)
    }

    pub fn album_tracks(&self, album_id: i64) -> Result<Vec<Track>> {
        parse_tracks(&self.get(&format!("/album/{}/tracks", album_id), &[])?)
    }

    pub fn top_artists(&self) -> Result<Vec<Artist>> {
        parse_artists(&self.get("/chart/0/artists", &[])?)
    }

    pub fn top_albums(&self) -> Result<Vec<Album>> {
        parse_albums(&self.get("/chart/0/albums", &[])?)
    }
}

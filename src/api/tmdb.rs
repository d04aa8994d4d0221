//! Film and series metadata client

use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{build_url, null_default, HttpClient};
use crate::error::Result;
use crate::models::{CastMember, MediaType, Movie, Series, Video};

pub const BASE_URL: &str = "https://api.themoviedb.org/3";
pub const IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";
pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/342x513?text=No+Image";

/// Credits are cut to the leading cast
pub const MAX_CAST: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PosterSize {
    W185,
    W342,
    W500,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackdropSize {
    W780,
    W1280,
    Original,
}

impl PosterSize {
    fn as_str(&self) -> &'static str {
        match self {
            PosterSize::W185 => "w185",
            PosterSize::W342 => "w342",
            PosterSize::W500 => "w500",
        }
    }
}

impl BackdropSize {
    fn as_str(&self) -> &'static str {
        match self {
            BackdropSize::W780 => "w780",
            BackdropSize::W1280 => "w1280",
            BackdropSize::Original => "original",
        }
    }
}

#[derive(Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

#[derive(Deserialize)]
struct Credits {
    #[serde(default = "Vec::new")]
    cast: Vec<CastDto>,
}

#[derive(Deserialize)]
struct MovieDto {
    id: i64,
    #[serde(default, deserialize_with = "null_default")]
    title: String,
    #[serde(default, deserialize_with = "null_default")]
    overview: String,
    #[serde(default)]
    poster_path: Option<String>,
    #[serde(default)]
    backdrop_path: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    release_date: String,
    #[serde(default, deserialize_with = "null_default")]
    vote_average: f64,
    #[serde(default, deserialize_with = "null_default")]
    vote_count: i64,
}

#[derive(Deserialize)]
struct SeriesDto {
    id: i64,
    #[serde(default, deserialize_with = "null_default")]
    name: String,
    #[serde(default, deserialize_with = "null_default")]
    overview: String,
    #[serde(default)]
    poster_path: Option<String>,
    #[serde(default)]
    backdrop_path: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    first_air_date: String,
    #[serde(default, deserialize_with = "null_default")]
    vote_average: f64,
    #[serde(default, deserialize_with = "null_default")]
    vote_count: i64,
}

#[derive(Deserialize)]
struct VideoDto {
    #[serde(default, deserialize_with = "null_default")]
    id: String,
    #[serde(default, deserialize_with = "null_default")]
    key: String,
    #[serde(default, deserialize_with = "null_default")]
    name: String,
    #[serde(default, deserialize_with = "null_default")]
    site: String,
    #[serde(rename = "type", default, deserialize_with = "null_default")]
    kind: String,
    #[serde(default, deserialize_with = "null_default")]
    official: bool,
}

#[derive(Deserialize)]
struct CastDto {
    id: i64,
    #[serde(default, deserialize_with = "null_default")]
    name: String,
    #[serde(default, deserialize_with = "null_default")]
    character: String,
    #[serde(default)]
    profile_path: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    order: i64,
}

impl From<MovieDto> for Movie {
    fn from(m: MovieDto) -> Self {
        Movie {
            id: m.id,
            title: m.title,
            overview: m.overview,
            poster_path: m.poster_path,
            backdrop_path: m.backdrop_path,
            release_date: m.release_date,
            vote_average: m.vote_average,
            vote_count: m.vote_count,
        }
    }
}

impl From<SeriesDto> for Series {
    fn from(s: SeriesDto) -> Self {
        Series {
            id: s.id,
            name: s.name,
            overview: s.overview,
            poster_path: s.poster_path,
            backdrop_path: s.backdrop_path,
            first_air_date: s.first_air_date,
            vote_average: s.vote_average,
            vote_count: s.vote_count,
        }
    }
}

impl From<VideoDto> for Video {
    fn from(v: VideoDto) -> Self {
        Video {
            id: v.id,
            key: v.key,
            name: v.name,
            site: v.site,
            kind: v.kind,
            official: v.official,
        }
    }
}

impl From<CastDto> for CastMember {
    fn from(c: CastDto) -> Self {
        CastMember {
            id: c.id,
            name: c.name,
            character: c.character,
            profile_path: c.profile_path,
            order: c.order,
        }
    }
}

pub fn parse_results<T, D>(body: &str) -> Result<Vec<T>>
where
    D: DeserializeOwned + Into<T>,
{
    let page: Page<D> = serde_json::from_str(body)?;
    Ok(page.results.into_iter().map(Into::into).collect())
}

pub fn parse_movies(body: &str) -> Result<Vec<Movie>> {
    parse_results::<Movie, MovieDto>(body)
}

pub fn parse_series(body: &str) -> Result<Vec<Series>> {
    parse_results::<Series, SeriesDto>(body)
}

pub fn parse_videos(body: &str) -> Result<Vec<Video>> {
    parse_results::<Video, VideoDto>(body)
}

/// Leading cast, at most [`MAX_CAST`] entries
pub fn parse_credits(body: &str) -> Result<Vec<CastMember>> {
    let credits: Credits = serde_json::from_str(body)?;
    Ok(credits.cast.into_iter().take(MAX_CAST).map(Into::into).collect())
}

/// First YouTube trailer, else whatever video comes first
pub fn pick_trailer(videos: &[Video]) -> Option<&Video> {
    videos
        .iter()
        .find(|v| v.kind == "Trailer" && v.site == "YouTube")
        .or_else(|| videos.first())
}

pub fn poster_url(path: Option<&str>, size: PosterSize) -> String {
    image_url(path, size.as_str())
}

pub fn backdrop_url(path: Option<&str>, size: BackdropSize) -> String {
    image_url(path, size.as_str())
}

pub fn profile_url(path: Option<&str>) -> String {
    image_url(path, "w185")
}

fn image_url(path: Option<&str>, size: &str) -> String {
    match path {
        Some(p) if !p.is_empty() => format!("{}/{}{}", IMAGE_BASE_URL, size, p),
        _ => PLACEHOLDER_IMAGE.to_string(),
    }
}

fn media_segment(media_type: MediaType) -> &'static str {
    match media_type {
        MediaType::Movie => "movie",
        MediaType::Series => "tv",
    }
}

#[derive(Clone)]
pub struct TmdbClient {
    http: HttpClient,
    api_key: String,
    language: String,
}

impl TmdbClient {
    pub fn new(http: HttpClient, api_key: &str, language: &str) -> Self {
        Self {
            http,
            api_key: api_key.to_string(),
            language: language.to_string(),
        }
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Every call carries the api key and language
    pub fn url(&self, path: &str, extra: &[(&str, &str)]) -> String {
        let mut params: Vec<(&str, &str)> = vec![("api_key", self.api_key.as_str())];
        params.extend_from_slice(extra);
        params.push(("language", self.language.as_str()));
        build_url(BASE_URL, path, &params)
    }

    fn get(&self, path: &str, extra: &[(&str, &str)]) -> Result<String> {
        self.http.get_text(&self.url(path, extra))
    }

    pub fn search_movies(&self, query: &str) -> Result<Vec<Movie>> {
        parse_movies(&self.get("/search/movie", &[("query", query)])?)
    }

    pub fn popular_movies(&self) -> Result<Vec<Movie>> {
        parse_movies(&self.get("/movie/popular", &[])?)
    }

    pub fn movie_videos(&self, movie_id: i64) -> Result<Vec<Video>> {
        self.videos(MediaType::Movie, movie_id)
    }

    pub fn movie_credits(&self, movie_id: i64) -> Result<Vec<CastMember>> {
        self.credits(MediaType::Movie, movie_id)
    }

    pub fn search_series(&self, query: &str) -> Result<Vec<Series>> {
        parse_series(&self.get("/search/tv", &[("query", query)])?)
    }

    pub fn popular_series(&self) -> Result<Vec<Series>> {
        parse_series(&self.get("/tv/popular", &[])?)
    }

    pub fn series_videos(&self, series_id: i64) -> Result<Vec<Video>> {
        self.videos(MediaType::Series, series_id)
    }

    pub fn series_credits(&self, series_id: i64) -> Result<Vec<CastMember>> {
        self.credits(MediaType::Series, series_id)
    }

    pub fn videos(&self, media_type: MediaType, id: i64) -> Result<Vec<Video>> {
        let path = format!("/{}/{}/videos", media_segment(media_type), id);
        parse_videos(&self.get(&path, &[])?)
    }

    pub fn credits(&self, media_type: MediaType, id: i64) -> Result<Vec<CastMember>> {
        let path = format!("/{}/{}/credits", media_segment(media_type), id);
        parse_credits(&self.get(&path, &[])?)
    }
}

//! Epikodi
//! Browse movies and series, keep favorites, and listen to 30-second music previews

// Hide console window on Windows release builds
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

// Use mimalloc for faster memory allocation (Linux, macOS)
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use eframe::egui;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;
use std::time::Duration;

mod api;
mod config;
mod error;
mod favorites;
mod favorites_tests;
mod models;
mod player;
mod preview;
mod preview_tests;
mod sequence;
mod storage;

use api::tmdb::{self, BackdropSize, PosterSize};
use api::{DeezerClient, HttpClient, TmdbClient};
use config::AppConfig;
use favorites::{FavoritesEvent, FavoritesStore};
use models::*;
use player::ProcessBackend;
use preview::{PlaybackEvent, PlaybackState, PreviewController};
use sequence::RequestSequence;
use storage::FileStore;

const MISSING_KEY_MESSAGE: &str = "Set a TMDB API key in Settings to browse movies and series";
const WARNING_COLOR: egui::Color32 = egui::Color32::from_rgb(200, 80, 80);

/// Application icon: white play triangle on a round crimson-to-amber badge
fn load_icon() -> egui::IconData {
    let size: usize = 64;
    let mut rgba = vec![0u8; size * size * 4];

    for y in 0..size {
        for x in 0..size {
            let idx = (y * size + x) * 4;
            let nx = x as f32 / size as f32;
            let ny = y as f32 / size as f32;

            let dx = nx - 0.5;
            let dy = ny - 0.5;
            if dx * dx + dy * dy > 0.48 * 0.48 {
                continue; // transparent corner
            }

            let px = nx - 0.38;
            let in_play = (0.0..=0.32).contains(&px) && dy.abs() <= (0.32 - px) * 0.6;

            let pixel = if in_play {
                [255, 255, 255, 255]
            } else {
                // #e50914 -> #f5a623
                let t = (nx + ny) * 0.5;
                [
                    (229.0 + (245.0 - 229.0) * t) as u8,
                    (9.0 + (166.0 - 9.0) * t) as u8,
                    (20.0 + (35.0 - 20.0) * t) as u8,
                    255,
                ]
            };
            rgba[idx..idx + 4].copy_from_slice(&pixel);
        }
    }

    egui::IconData {
        rgba,
        width: size as u32,
        height: size as u32,
    }
}

/// Add the first system emoji font found so tab and button glyphs render
fn install_emoji_font(ctx: &egui::Context) {
    #[cfg(target_os = "windows")]
    let candidates: &[&str] = &["C:\\Windows\\Fonts\\seguiemj.ttf"];
    #[cfg(target_os = "macos")]
    let candidates: &[&str] = &["/System/Library/Fonts/Apple Color Emoji.ttc"];
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    let candidates: &[&str] = &[
        "/usr/share/fonts/truetype/noto/NotoColorEmoji.ttf",
        "/usr/share/fonts/noto-emoji/NotoColorEmoji.ttf",
        "/usr/share/fonts/google-noto-emoji/NotoColorEmoji.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    ];

    let mut fonts = egui::FontDefinitions::default();
    if let Some(font_data) = candidates.iter().find_map(|path| std::fs::read(path).ok()) {
        fonts
            .font_data
            .insert("emoji".to_owned(), egui::FontData::from_owned(font_data).into());
        fonts
            .families
            .entry(egui::FontFamily::Proportional)
            .or_default()
            .push("emoji".to_owned());
    } else {
        tracing::debug!("No emoji font found, using defaults");
    }
    ctx.set_fonts(fonts);
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("epikodi=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Background task messages, tagged with the ticket of the view that asked
enum TaskResult {
    MediaLoaded {
        ticket: u64,
        media_type: MediaType,
        items: Vec<MediaSummary>,
    },
    DetailsLoaded {
        ticket: u64,
        trailer: Option<Video>,
        cast: Vec<CastMember>,
    },
    MusicLoaded {
        ticket: u64,
        heading: String,
        listing: MusicListing,
    },
    /// Full album record (when the lookup worked) and its track list
    AlbumLoaded {
        ticket: u64,
        album: Option<Album>,
        tracks: Vec<Track>,
    },
    /// First playable clip of an album, for the play button of the album list
    AlbumPreviewLoaded {
        ticket: u64,
        track: Option<Track>,
    },
}

/// Clients and the reply channel handed to a background fetch
struct FetchContext {
    tmdb: TmdbClient,
    deezer: DeezerClient,
    sender: Sender<TaskResult>,
}

/// Upstream failures degrade to an empty list
fn or_empty<T>(result: error::Result<Vec<T>>, what: &str) -> Vec<T> {
    result.unwrap_or_else(|e| {
        tracing::warn!("Failed to load {}: {}", what, e);
        Vec::new()
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum MusicSearch {
    #[default]
    Albums,
    Artists,
    Tracks,
}

impl MusicSearch {
    const ALL: [MusicSearch; 3] = [MusicSearch::Albums, MusicSearch::Artists, MusicSearch::Tracks];

    fn label(&self) -> &'static str {
        match self {
            MusicSearch::Albums => "💿 Albums",
            MusicSearch::Artists => "🎤 Artists",
            MusicSearch::Tracks => "🎵 Tracks",
        }
    }
}

enum MusicListing {
    Artists(Vec<Artist>),
    Albums(Vec<Album>),
    Tracks(Vec<Track>),
}

/// Results of the Music tab; one sequence covers searches, charts and artist albums
#[derive(Default)]
struct MusicResults {
    search: MusicSearch,
    heading: String,
    artists: Vec<Artist>,
    albums: Vec<Album>,
    tracks: Vec<Track>,
    requests: RequestSequence,
    loading: bool,
}

impl MusicResults {
    /// Show `listing` if `ticket` is still the latest request; returns a status line, None when stale
    fn apply(&mut self, ticket: u64, heading: String, listing: MusicListing) -> Option<String> {
        if !self.requests.is_current(ticket) {
            return None;
        }
        self.loading = false;
        self.heading = heading;
        let status = match listing {
            MusicListing::Artists(artists) => {
                self.search = MusicSearch::Artists;
                self.artists = artists;
                format!("Loaded {} artists", self.artists.len())
            }
            MusicListing::Albums(albums) => {
                self.search = MusicSearch::Albums;
                self.albums = albums;
                format!("Loaded {} albums", self.albums.len())
            }
            MusicListing::Tracks(tracks) => {
                self.search = MusicSearch::Tracks;
                self.tracks = tracks;
                format!("Loaded {} tracks", self.tracks.len())
            }
        };
        Some(status)
    }
}

/// Search box and results of the Movies or Series tab
#[derive(Default)]
struct MediaList {
    query: String,
    items: Vec<MediaSummary>,
    requests: RequestSequence,
    loading: bool,
}

impl MediaList {
    /// Replace the results if `ticket` is still the latest search
    fn apply(&mut self, ticket: u64, items: Vec<MediaSummary>) -> bool {
        if !self.requests.is_current(ticket) {
            return false;
        }
        self.loading = false;
        self.items = items;
        true
    }
}

struct DetailView {
    item: MediaSummary,
    trailer: Option<Video>,
    cast: Vec<CastMember>,
    loading: bool,
}

struct AlbumView {
    album: Album,
    tracks: Vec<Track>,
    loading: bool,
}

struct EpikodiApp {
    config: AppConfig,
    current_tab: Tab,
    status_message: String,
    /// Last favorites write failure, cleared by the next successful one
    storage_warning: Option<String>,

    favorites: FavoritesStore<FileStore>,
    favorite_events: Receiver<FavoritesEvent>,
    preview: PreviewController<ProcessBackend>,
    playback_events: Receiver<PlaybackEvent>,
    seek_drag: Option<f32>,
    volume_drag: Option<i32>,

    task_sender: Sender<TaskResult>,
    task_receiver: Receiver<TaskResult>,

    movies: MediaList,
    series: MediaList,
    details: Option<DetailView>,
    details_requests: RequestSequence,

    music_query: String,
    music: MusicResults,
    album: Option<AlbumView>,
    album_requests: RequestSequence,
    quick_preview_requests: RequestSequence,

    show_settings: bool,
    settings_draft: AppConfig,
    show_clear_confirm: bool,
}

impl EpikodiApp {
    fn new() -> Self {
        let config = AppConfig::load();
        let (task_sender, task_receiver) = channel();

        let mut favorites = FavoritesStore::initialize(FileStore::in_config_dir());
        let favorite_events = favorites.subscribe();

        let mut preview = PreviewController::new(ProcessBackend::new(&config.preview_player))
            .with_volume(config.preview_volume);
        let playback_events = preview.subscribe();
        tracing::info!("Preview player: {}", preview.backend().program());

        let status_message = if config.tmdb_api_key.is_empty() {
            MISSING_KEY_MESSAGE.to_string()
        } else {
            "Ready".to_string()
        };

        let mut app = Self {
            settings_draft: config.clone(),
            config,
            current_tab: Tab::Movies,
            status_message,
            storage_warning: None,
            favorites,
            favorite_events,
            preview,
            playback_events,
            seek_drag: None,
            volume_drag: None,
            task_sender,
            task_receiver,
            movies: MediaList::default(),
            series: MediaList::default(),
            details: None,
            details_requests: RequestSequence::new(),
            music_query: String::new(),
            music: MusicResults::default(),
            album: None,
            album_requests: RequestSequence::new(),
            quick_preview_requests: RequestSequence::new(),
            show_settings: false,
            show_clear_confirm: false,
        };

        app.search_media(MediaType::Movie);
        app.search_media(MediaType::Series);
        app.search_music();
        app
    }

    fn fetch_context(&self) -> FetchContext {
        let http = HttpClient::new(&self.config.user_agent);
        FetchContext {
            tmdb: TmdbClient::new(http.clone(), &self.config.tmdb_api_key, &self.config.language),
            deezer: DeezerClient::new(http, &self.config.cors_relay),
            sender: self.task_sender.clone(),
        }
    }

    fn media_list(&mut self, media_type: MediaType) -> &mut MediaList {
        match media_type {
            MediaType::Movie => &mut self.movies,
            MediaType::Series => &mut self.series,
        }
    }

    fn is_busy(&self) -> bool {
        self.movies.loading
            || self.series.loading
            || self.music.loading
            || self.details.as_ref().is_some_and(|d| d.loading)
            || self.album.as_ref().is_some_and(|a| a.loading)
    }

    // ---- Movies / Series ----

    /// Search with the tab's query; an empty query loads the popular listing
    fn search_media(&mut self, media_type: MediaType) {
        let ctx = self.fetch_context();
        if !ctx.tmdb.has_api_key() {
            self.status_message = MISSING_KEY_MESSAGE.to_string();
            return;
        }

        let list = self.media_list(media_type);
        let ticket = list.requests.begin();
        let query = list.query.trim().to_string();
        list.loading = true;

        thread::spawn(move || {
            let items: Vec<MediaSummary> = match media_type {
                MediaType::Movie => {
                    let movies = if query.is_empty() {
                        ctx.tmdb.popular_movies()
                    } else {
                        ctx.tmdb.search_movies(&query)
                    };
                    or_empty(movies, "movies").into_iter().map(MediaSummary::from).collect()
                }
                MediaType::Series => {
                    let series = if query.is_empty() {
                        ctx.tmdb.popular_series()
                    } else {
                        ctx.tmdb.search_series(&query)
                    };
                    or_empty(series, "series").into_iter().map(MediaSummary::from).collect()
                }
            };
            let _ = ctx.sender.send(TaskResult::MediaLoaded { ticket, media_type, items });
        });
    }

    fn open_details(&mut self, item: MediaSummary) {
        let ticket = self.details_requests.begin();
        let ctx = self.fetch_context();
        let (media_type, id) = (item.media_type, item.id);
        let loading = ctx.tmdb.has_api_key();
        self.details = Some(DetailView {
            item,
            trailer: None,
            cast: Vec::new(),
            loading,
        });
        if !loading {
            return;
        }

        thread::spawn(move || {
            let (videos, cast) = match media_type {
                MediaType::Movie => (ctx.tmdb.movie_videos(id), ctx.tmdb.movie_credits(id)),
                MediaType::Series => (ctx.tmdb.series_videos(id), ctx.tmdb.series_credits(id)),
            };
            let videos = or_empty(videos, "videos");
            let trailer = tmdb::pick_trailer(&videos).cloned();
            let cast = or_empty(cast, "credits");
            let _ = ctx.sender.send(TaskResult::DetailsLoaded { ticket, trailer, cast });
        });
    }

    fn close_details(&mut self) {
        self.details_requests.invalidate();
        self.details = None;
    }

    // ---- Music ----

    /// Run the selected kind of search; an empty query shows the charts
    fn search_music(&mut self) {
        let ticket = self.music.requests.begin();
        let query = self.music_query.trim().to_string();
        let search = self.music.search;

        if search == MusicSearch::Tracks && query.is_empty() {
            self.music.tracks.clear();
            self.music.loading = false;
            self.music.heading = "Type a title to search tracks".to_string();
            return;
        }

        let ctx = self.fetch_context();
        self.music.loading = true;

        thread::spawn(move || {
            let (heading, listing) = match search {
                MusicSearch::Albums => {
                    let (albums, heading) = if query.is_empty() {
                        (ctx.deezer.top_albums(), "Top albums".to_string())
                    } else {
                        (ctx.deezer.search_albums(&query), format!("Albums matching \"{}\"", query))
                    };
                    (heading, MusicListing::Albums(or_empty(albums, "albums")))
                }
                MusicSearch::Artists => {
                    let (artists, heading) = if query.is_empty() {
                        (ctx.deezer.top_artists(), "Top artists".to_string())
                    } else {
                        (ctx.deezer.search_artists(&query), format!("Artists matching \"{}\"", query))
                    };
                    (heading, MusicListing::Artists(or_empty(artists, "artists")))
                }
                MusicSearch::Tracks => (
                    format!("Tracks matching \"{}\"", query),
                    MusicListing::Tracks(or_empty(ctx.deezer.search_tracks(&query), "tracks")),
                ),
            };
            let _ = ctx.sender.send(TaskResult::MusicLoaded { ticket, heading, listing });
        });
    }

    fn load_artist_albums(&mut self, artist_id: i64, artist_name: String) {
        let ticket = self.music.requests.begin();
        let ctx = self.fetch_context();
        self.music.loading = true;

        thread::spawn(move || {
            let heading = match ctx.deezer.artist(artist_id) {
                Ok(artist) => format!(
                    "Albums by {} ({} albums · {} fans)",
                    artist.name, artist.nb_album, artist.nb_fan
                ),
                Err(e) => {
                    tracing::warn!("Failed to load artist {}: {}", artist_id, e);
                    format!("Albums by {}", artist_name)
                }
            };
            let albums = or_empty(ctx.deezer.artist_albums(artist_id), "artist albums");
            let listing = MusicListing::Albums(albums);
            let _ = ctx.sender.send(TaskResult::MusicLoaded { ticket, heading, listing });
        });
    }

    fn open_album(&mut self, album: Album) {
        let ticket = self.album_requests.begin();
        let ctx = self.fetch_context();
        let album_id = album.id;
        self.album = Some(AlbumView {
            album,
            tracks: Vec::new(),
            loading: true,
        });

        // Search and chart rows lack some fields (release date, cover_big), so refetch the album
        thread::spawn(move || {
            let album = ctx
                .deezer
                .album(album_id)
                .map_err(|e| tracing::warn!("Failed to load album {}: {}", album_id, e))
                .ok();
            let tracks = or_empty(ctx.deezer.album_tracks(album_id), "album tracks");
            let _ = ctx.sender.send(TaskResult::AlbumLoaded { ticket, album, tracks });
        });
    }

    /// Fetch the album's tracks and start the first one that has a clip
    fn preview_album(&mut self, album_id: i64) {
        let ticket = self.quick_preview_requests.begin();
        let ctx = self.fetch_context();

        thread::spawn(move || {
            let tracks = or_empty(ctx.deezer.album_tracks(album_id), "album tracks");
            let track = tracks.into_iter().find(Track::has_preview);
            let _ = ctx.sender.send(TaskResult::AlbumPreviewLoaded { ticket, track });
        });
    }

    /// The album window hosts previews, so closing it stops them
    fn close_album(&mut self) {
        self.album_requests.invalidate();
        self.album = None;
        self.preview.stop();
    }

    /// Toggle the active track, otherwise switch the preview to `track`
    fn play_track(&mut self, track: &Track) {
        let result = if self.preview.is_active(track.id) {
            self.preview.toggle_play_pause()
        } else {
            self.preview.play(track.to_preview())
        };
        if let Err(e) = result {
            self.status_message = format!("⚠ Preview failed: {}", e);
        }
    }

    fn remember_volume(&mut self) {
        self.config.preview_volume = self.preview.session().volume_percent;
        self.settings_draft.preview_volume = self.config.preview_volume;
        if let Err(e) = self.config.save() {
            tracing::warn!("Failed to save preview volume: {}", e);
        }
    }

    // ---- Favorites ----

    fn toggle_favorite(&mut self, item: NewFavorite) {
        let result = self.favorites.toggle(item).map(|_| ());
        self.report_storage(result);
    }

    fn remove_favorite(&mut self, id: i64, media_type: MediaType) {
        let result = self.favorites.remove(id, media_type).map(|_| ());
        self.report_storage(result);
    }

    fn clear_favorites(&mut self) {
        let result = self.favorites.clear().map(|count| {
            tracing::info!("Cleared {} favorites from the Favorites tab", count);
        });
        self.report_storage(result);
    }

    fn report_storage(&mut self, result: error::Result<()>) {
        match result {
            Ok(()) => self.storage_warning = None,
            Err(e) => self.storage_warning = Some(format!("⚠ Favorites could not be saved: {}", e)),
        }
    }

    // ---- Settings ----

    fn apply_settings(&mut self) {
        let draft = self.settings_draft.clone();
        let tmdb_changed = draft.tmdb_api_key != self.config.tmdb_api_key || draft.language != self.config.language;
        let relay_changed = draft.cors_relay != self.config.cors_relay;

        if draft.preview_player != self.config.preview_player {
            self.preview.stop();
            self.preview.backend_mut().set_program(&draft.preview_player);
            tracing::info!("Preview player: {}", self.preview.backend().program());
        }

        self.config = draft;
        match self.config.save() {
            Ok(()) => {
                tracing::info!("Settings saved");
                self.status_message = "Settings saved".to_string();
            }
            Err(e) => {
                tracing::warn!("Failed to save settings: {}", e);
                self.status_message = format!("⚠ Settings could not be saved: {}", e);
            }
        }

        if tmdb_changed {
            self.search_media(MediaType::Movie);
            self.search_media(MediaType::Series);
        }
        if relay_changed {
            self.search_music();
        }
    }

    // ---- Background results and events ----

    fn process_task_results(&mut self) {
        while let Ok(result) = self.task_receiver.try_recv() {
            match result {
                TaskResult::MediaLoaded { ticket, media_type, items } => {
                    let list = self.media_list(media_type);
                    if !list.apply(ticket, items) {
                        tracing::debug!("Dropping stale {} results", media_type);
                        continue;
                    }
                    let count = list.items.len();
                    tracing::info!("Loaded {} {} results", count, media_type);
                    self.status_message = match media_type {
                        MediaType::Movie => format!("Loaded {} movies", count),
                        MediaType::Series => format!("Loaded {} series", count),
                    };
                }
                TaskResult::DetailsLoaded { ticket, trailer, cast } => {
                    if !self.details_requests.is_current(ticket) {
                        continue;
                    }
                    if let Some(view) = self.details.as_mut() {
                        view.trailer = trailer;
                        view.cast = cast;
                        view.loading = false;
                    }
                }
                TaskResult::MusicLoaded { ticket, heading, listing } => {
                    match self.music.apply(ticket, heading, listing) {
                        Some(status) => self.status_message = status,
                        None => tracing::debug!("Dropping stale music results"),
                    }
                }
                TaskResult::AlbumLoaded { ticket, album, tracks } => {
                    if !self.album_requests.is_current(ticket) {
                        continue;
                    }
                    if let Some(view) = self.album.as_mut() {
                        if let Some(album) = album {
                            view.album = album;
                        }
                        view.tracks = tracks;
                        view.loading = false;
                    }
                }
                TaskResult::AlbumPreviewLoaded { ticket, track } => {
                    if !self.quick_preview_requests.is_current(ticket) {
                        continue;
                    }
                    match track {
                        Some(track) => self.play_track(&track),
                        None => self.status_message = "No preview available for this album".to_string(),
                    }
                }
            }
        }
    }

    fn process_events(&mut self) {
        for event in self.favorite_events.try_iter() {
            self.status_message = match event {
                FavoritesEvent::Added { media_type, .. } => format!("★ Added {} to favorites", media_type),
                FavoritesEvent::Removed { media_type, .. } => format!("☆ Removed {} from favorites", media_type),
            };
        }

        for event in self.playback_events.try_iter() {
            match event {
                PlaybackEvent::Started(_) => {
                    if let Some(track) = &self.preview.session().active_track {
                        self.status_message = format!("♪ {} - {}", track.artist, track.title);
                    }
                }
                PlaybackEvent::Ended(_) => self.status_message = "Preview finished".to_string(),
                PlaybackEvent::Failed(_) => {
                    let reason = self.preview.last_error().unwrap_or("player stopped");
                    self.status_message = format!("⚠ Preview failed: {}", reason);
                }
                PlaybackEvent::Paused(_) | PlaybackEvent::Resumed(_) | PlaybackEvent::Stopped(_) => {}
            }
        }
    }
}

fn favorite_star(is_fav: bool) -> egui::RichText {
    if is_fav {
        egui::RichText::new("★").size(18.0).color(egui::Color32::GOLD)
    } else {
        egui::RichText::new("☆").size(18.0).color(egui::Color32::GRAY)
    }
}

/// Text box that reports Enter or a click on its search button
fn search_row(ui: &mut egui::Ui, query: &mut String, hint: &str) -> bool {
    let mut submit = false;
    ui.label("🔍");
    let response = ui.add(egui::TextEdit::singleline(query).hint_text(hint).desired_width(320.0));
    if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
        submit = true;
    }
    if ui.button("Search").clicked() {
        submit = true;
    }
    if !query.is_empty() && ui.button("✖").on_hover_text("Clear search").clicked() {
        query.clear();
        submit = true;
    }
    submit
}

impl eframe::App for EpikodiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Process background task results (non-blocking)
        self.process_task_results();
        self.preview.tick();
        self.process_events();

        if self.is_busy() {
            ctx.request_repaint_after(Duration::from_millis(100));
        } else if self.preview.session().is_playing() {
            ctx.request_repaint_after(Duration::from_millis(250));
        }

        // Apply theme
        if self.config.dark_mode {
            ctx.set_visuals(egui::Visuals::dark());
        } else {
            ctx.set_visuals(egui::Visuals::light());
        }

        let previous_tab = self.current_tab;

        // Top panel - Tabs
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.add_space(5.0);
            ui.horizontal(|ui| {
                for tab in Tab::ALL {
                    let label = match tab {
                        Tab::Favorites => format!("{} ({})", tab.label(), self.favorites.len()),
                        _ => tab.label().to_string(),
                    };
                    ui.selectable_value(&mut self.current_tab, tab, label);
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("⚙ Settings").clicked() {
                        self.settings_draft = self.config.clone();
                        self.show_settings = true;
                    }
                });
            });
            ui.add_space(5.0);
        });

        // Previews belong to the Music tab
        if previous_tab == Tab::Music && self.current_tab != Tab::Music {
            self.quick_preview_requests.invalidate();
            if self.album.is_some() {
                self.close_album();
            } else {
                self.preview.stop();
            }
        }

        // Bottom panel - Status
        egui::TopBottomPanel::bottom("bottom_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if self.is_busy() {
                    ui.spinner();
                }
                ui.label(&self.status_message);
                if let Some(warning) = &self.storage_warning {
                    ui.separator();
                    ui.label(egui::RichText::new(warning).color(WARNING_COLOR));
                }
            });
        });

        self.show_preview_bar(ctx);

        // Main content
        egui::CentralPanel::default().show(ctx, |ui| match self.current_tab {
            Tab::Movies => self.show_media_tab(ui, MediaType::Movie),
            Tab::Series => self.show_media_tab(ui, MediaType::Series),
            Tab::Music => self.show_music_tab(ui),
            Tab::Favorites => self.show_favorites_tab(ui),
        });

        self.show_details_window(ctx);
        self.show_album_window(ctx);
        self.show_settings_window(ctx);
        self.show_clear_confirm_window(ctx);
    }
}

impl EpikodiApp {
    fn show_media_tab(&mut self, ui: &mut egui::Ui, media_type: MediaType) {
        let hint = match media_type {
            MediaType::Movie => "Search movies...",
            MediaType::Series => "Search series...",
        };

        let mut search = false;
        let list = self.media_list(media_type);
        ui.horizontal(|ui| {
            search = search_row(ui, &mut list.query, hint);
            if list.loading {
                ui.spinner();
            }
        });
        let heading = if list.query.trim().is_empty() { "Popular" } else { "Results" };
        let loading = list.loading;
        let items = list.items.clone();
        if search {
            self.search_media(media_type);
        }

        ui.label(egui::RichText::new(heading).strong());
        ui.separator();

        let mut clicked: Option<MediaSummary> = None;
        let mut toggle_fav: Option<NewFavorite> = None;

        egui::ScrollArea::vertical()
            .id_salt(("media_scroll", media_type))
            .auto_shrink([false, false])
            .show(ui, |ui| {
                if items.is_empty() && !loading {
                    ui.label(egui::RichText::new("No results").weak());
                }
                for item in &items {
                    let is_fav = self.favorites.is_favorite(item.id, item.media_type);
                    ui.horizontal(|ui| {
                        if ui
                            .button(favorite_star(is_fav))
                            .on_hover_text(if is_fav { "Remove from favorites" } else { "Add to favorites" })
                            .clicked()
                        {
                            toggle_fav = Some(item.as_new_favorite());
                        }
                        if ui.button(&item.title).clicked() {
                            clicked = Some(item.clone());
                        }
                        if let Some(year) = item.year() {
                            ui.label(egui::RichText::new(year).weak());
                        }
                        if item.vote_average > 0.0 {
                            ui.label(format!("⭐ {:.1}", item.vote_average));
                        }
                    });
                }
            });

        if let Some(item) = toggle_fav {
            self.toggle_favorite(item);
        }
        if let Some(item) = clicked {
            self.open_details(item);
        }
    }

    fn show_music_tab(&mut self, ui: &mut egui::Ui) {
        let mut search = false;
        ui.horizontal(|ui| {
            let previous = self.music.search;
            egui::ComboBox::from_id_salt("music_search_kind")
                .selected_text(self.music.search.label())
                .show_ui(ui, |ui| {
                    for kind in MusicSearch::ALL {
                        ui.selectable_value(&mut self.music.search, kind, kind.label());
                    }
                });
            if self.music.search != previous {
                search = true;
            }
            if search_row(ui, &mut self.music_query, "Search the music catalog...") {
                search = true;
            }
            if self.music.loading {
                ui.spinner();
            }
        });
        if search {
            self.search_music();
        }

        ui.label(egui::RichText::new(&self.music.heading).strong());
        ui.separator();

        egui::ScrollArea::vertical()
            .id_salt("music_scroll")
            .auto_shrink([false, false])
            .show(ui, |ui| match self.music.search {
                MusicSearch::Albums => self.show_album_list(ui),
                MusicSearch::Artists => self.show_artist_list(ui),
                MusicSearch::Tracks => self.show_track_list(ui),
            });
    }

    fn show_album_list(&mut self, ui: &mut egui::Ui) {
        if self.music.albums.is_empty() && !self.music.loading {
            ui.label(egui::RichText::new("No albums").weak());
        }
        let mut clicked: Option<Album> = None;
        let mut quick_preview: Option<i64> = None;
        for album in &self.music.albums {
            ui.horizontal(|ui| {
                if ui.button("▶").on_hover_text("Preview the first track").clicked() {
                    quick_preview = Some(album.id);
                }
                if ui.button(format!("💿 {}", album.title)).clicked() {
                    clicked = Some(album.clone());
                }
                if !album.artist.name.is_empty() {
                    ui.label(&album.artist.name);
                }
                if let Some(year) = album.release_date.get(..4) {
                    ui.label(egui::RichText::new(year).weak());
                }
                if album.nb_tracks > 0 {
                    ui.label(egui::RichText::new(format!("{} tracks", album.nb_tracks)).weak());
                }
            });
        }
        if let Some(album_id) = quick_preview {
            self.preview_album(album_id);
        }
        if let Some(album) = clicked {
            self.open_album(album);
        }
    }

    fn show_artist_list(&mut self, ui: &mut egui::Ui) {
        if self.music.artists.is_empty() && !self.music.loading {
            ui.label(egui::RichText::new("No artists").weak());
        }
        let mut clicked: Option<(i64, String)> = None;
        for artist in &self.music.artists {
            ui.horizontal(|ui| {
                if ui.button(format!("🎤 {}", artist.name)).on_hover_text("Show albums").clicked() {
                    clicked = Some((artist.id, artist.name.clone()));
                }
                ui.label(
                    egui::RichText::new(format!("{} albums · {} fans", artist.nb_album, artist.nb_fan)).weak(),
                );
            });
        }
        if let Some((id, name)) = clicked {
            self.load_artist_albums(id, name);
        }
    }

    fn show_track_list(&mut self, ui: &mut egui::Ui) {
        if self.music.tracks.is_empty() && !self.music.loading {
            ui.label(egui::RichText::new("No tracks").weak());
        }
        let mut clicked: Option<Track> = None;
        for track in &self.music.tracks {
            ui.horizontal(|ui| {
                if self.track_button(ui, track) {
                    clicked = Some(track.clone());
                }
                ui.label(&track.title_short);
                ui.label(egui::RichText::new(format!("{} · {}", track.artist.name, track.album.title)).weak());
                ui.label(format_duration(track.duration));
            });
        }
        if let Some(track) = clicked {
            self.play_track(&track);
        }
    }

    /// Play/pause button of a track row; disabled when the catalog has no clip
    fn track_button(&self, ui: &mut egui::Ui, track: &Track) -> bool {
        let playing = self.preview.is_active(track.id) && self.preview.session().is_playing();
        ui.add_enabled(track.has_preview(), egui::Button::new(if playing { "⏸" } else { "▶" }))
            .on_hover_text("30-second preview")
            .on_disabled_hover_text("No preview available")
            .clicked()
    }

    fn show_favorites_tab(&mut self, ui: &mut egui::Ui) {
        if self.favorites.is_empty() {
            ui.vertical_centered(|ui| {
                ui.add_space(60.0);
                ui.heading("No favorites yet");
                ui.label(egui::RichText::new("Use ☆ on a movie or series to keep it here").weak());
            });
            return;
        }

        ui.horizontal(|ui| {
            ui.label(format!("{} favorites", self.favorites.len()));
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("🗑 Clear all").clicked() {
                    self.show_clear_confirm = true;
                }
            });
        });
        ui.separator();

        let mut to_remove: Option<(i64, MediaType)> = None;
        let mut to_open: Option<MediaSummary> = None;

        egui::ScrollArea::vertical()
            .id_salt("favorites_scroll")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for (media_type, heading) in [(MediaType::Movie, "🎬 Movies"), (MediaType::Series, "📺 Series")] {
                    let entries: Vec<&FavoriteEntry> = self.favorites.by_type(media_type).collect();
                    if entries.is_empty() {
                        continue;
                    }
                    ui.heading(format!("{} ({})", heading, entries.len()));
                    for entry in entries {
                        ui.horizontal(|ui| {
                            if ui.button(favorite_star(true)).on_hover_text("Remove from favorites").clicked() {
                                to_remove = Some((entry.id, entry.media_type));
                            }
                            if ui.button(&entry.title).clicked() {
                                to_open = Some(MediaSummary::from_favorite(entry));
                            }
                            let added = entry.added_at.get(..10).unwrap_or(&entry.added_at);
                            ui.label(egui::RichText::new(format!("added {}", added)).weak());
                        });
                    }
                    ui.add_space(8.0);
                }
            });

        if let Some((id, media_type)) = to_remove {
            self.remove_favorite(id, media_type);
        }
        if let Some(item) = to_open {
            self.open_details(item);
        }
    }

    fn show_preview_bar(&mut self, ctx: &egui::Context) {
        let session = self.preview.session().clone();
        let Some(track) = session.active_track.clone() else {
            self.seek_drag = None;
            self.volume_drag = None;
            return;
        };

        let mut outcome: error::Result<()> = Ok(());
        let mut volume_changed = false;
        let mut close = false;

        egui::TopBottomPanel::bottom("preview_bar").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                let icon = match session.state {
                    PlaybackState::Playing => "⏸",
                    PlaybackState::Loading => "⏳",
                    PlaybackState::Paused | PlaybackState::Idle => "▶",
                };
                if ui.button(icon).clicked() {
                    outcome = self.preview.toggle_play_pause();
                }

                ui.vertical(|ui| {
                    ui.label(egui::RichText::new(&track.title).strong());
                    ui.label(egui::RichText::new(format!("{} · {}", track.artist, track.album)).weak());
                });

                // Seek
                let bound = session.bound();
                let mut position = self.seek_drag.unwrap_or(session.position_seconds);
                let response = ui.add(egui::Slider::new(&mut position, 0.0..=bound).show_value(false));
                if response.dragged() {
                    self.seek_drag = Some(position);
                } else if response.drag_stopped() || response.changed() {
                    self.seek_drag = None;
                    outcome = self.preview.seek(position);
                }
                ui.label(format!(
                    "{} / {}",
                    format_duration(position as u32),
                    format_duration(bound as u32)
                ));

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("✖").on_hover_text("Close preview").clicked() {
                        close = true;
                    }

                    let mut volume = self.volume_drag.unwrap_or(session.volume_percent as i32);
                    let response = ui.add(egui::Slider::new(&mut volume, 0..=100).suffix("%"));
                    if response.dragged() {
                        self.volume_drag = Some(volume);
                    } else if response.drag_stopped() || response.changed() {
                        self.volume_drag = None;
                        outcome = self.preview.set_volume(volume);
                        volume_changed = true;
                    }

                    let mute_icon = if session.muted { "🔇" } else { "🔊" };
                    if ui.button(mute_icon).on_hover_text("Mute").clicked() {
                        outcome = self.preview.toggle_mute();
                    }
                });
            });
            ui.add_space(4.0);
        });

        if close {
            self.preview.close();
        }
        if volume_changed {
            self.remember_volume();
        }
        if let Err(e) = outcome {
            tracing::warn!("Preview control failed: {}", e);
            self.status_message = format!("⚠ Preview failed: {}", e);
        }
    }

    fn show_details_window(&mut self, ctx: &egui::Context) {
        let Some(view) = self.details.as_ref() else {
            return;
        };

        let item = &view.item;
        let is_fav = self.favorites.is_favorite(item.id, item.media_type);
        let glyph = match item.media_type {
            MediaType::Movie => "🎬",
            MediaType::Series => "📺",
        };
        let mut open = true;
        let mut toggle = false;

        egui::Window::new(format!("{} {}", glyph, item.title))
            .id(egui::Id::new("details_window"))
            .open(&mut open)
            .collapsible(false)
            .resizable(true)
            .default_width(520.0)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    if let Some(year) = item.year() {
                        ui.label(year);
                    }
                    if item.vote_average > 0.0 {
                        ui.label(format!("⭐ {:.1}", item.vote_average));
                    }
                    let fav_text = if is_fav {
                        egui::RichText::new("★ In favorites").color(egui::Color32::GOLD)
                    } else {
                        egui::RichText::new("☆ Add to favorites")
                    };
                    if ui.button(fav_text).clicked() {
                        toggle = true;
                    }
                });

                ui.horizontal(|ui| {
                    ui.hyperlink_to("🖼 Poster", tmdb::poster_url(item.poster_path.as_deref(), PosterSize::W500));
                    if item.backdrop_path.is_some() {
                        ui.hyperlink_to(
                            "🖼 Backdrop",
                            tmdb::backdrop_url(item.backdrop_path.as_deref(), BackdropSize::W1280),
                        );
                    }
                });
                ui.separator();

                if item.overview.is_empty() {
                    ui.label(egui::RichText::new("No overview available").weak());
                } else {
                    ui.label(&item.overview);
                }
                ui.add_space(8.0);

                if view.loading {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label("Loading trailer and cast...");
                    });
                    return;
                }

                match &view.trailer {
                    Some(trailer) => {
                        ui.hyperlink_to(format!("▶ {}", trailer.name), trailer.watch_url());
                    }
                    None => {
                        ui.label(egui::RichText::new("No trailer available").weak());
                    }
                }

                if !view.cast.is_empty() {
                    ui.add_space(8.0);
                    ui.label(egui::RichText::new("Cast").strong());
                    for member in &view.cast {
                        ui.horizontal(|ui| {
                            ui.hyperlink_to(&member.name, tmdb::profile_url(member.profile_path.as_deref()));
                            if !member.character.is_empty() {
                                ui.label(egui::RichText::new(format!("as {}", member.character)).weak());
                            }
                        });
                    }
                }
            });

        let favorite = item.as_new_favorite();
        if toggle {
            self.toggle_favorite(favorite);
        }
        if !open {
            self.close_details();
        }
    }

    fn show_album_window(&mut self, ctx: &egui::Context) {
        let Some(view) = self.album.as_ref() else {
            return;
        };

        let album = &view.album;
        let total: u32 = view.tracks.iter().map(|t| t.duration).sum();
        let mut open = true;
        let mut clicked: Option<Track> = None;

        egui::Window::new(format!("💿 {}", album.title))
            .id(egui::Id::new("album_window"))
            .open(&mut open)
            .collapsible(false)
            .resizable(true)
            .default_width(480.0)
            .show(ctx, |ui| {
                if !album.artist.name.is_empty() {
                    ui.label(egui::RichText::new(&album.artist.name).strong());
                }
                ui.horizontal(|ui| {
                    if !album.release_date.is_empty() {
                        ui.label(&album.release_date);
                    }
                    if !view.tracks.is_empty() {
                        ui.label(format!("{} tracks · {}", view.tracks.len(), format_duration(total)));
                    }
                    if !album.cover_big.is_empty() {
                        ui.hyperlink_to("🖼 Cover", &album.cover_big);
                    }
                });
                ui.separator();

                if view.loading {
                    ui.spinner();
                    return;
                }
                if view.tracks.is_empty() {
                    ui.label(egui::RichText::new("No tracks").weak());
                    return;
                }

                egui::ScrollArea::vertical()
                    .id_salt("album_tracks_scroll")
                    .max_height(380.0)
                    .show(ui, |ui| {
                        for (i, track) in view.tracks.iter().enumerate() {
                            ui.horizontal(|ui| {
                                if self.track_button(ui, track) {
                                    clicked = Some(track.clone());
                                }
                                ui.label(format!("{}. {}", i + 1, track.title_short));
                                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                                    ui.label(format_duration(track.duration));
                                });
                            });
                        }
                    });
            });

        if let Some(track) = clicked {
            self.play_track(&track);
        }
        if !open {
            self.close_album();
        }
    }

    fn show_settings_window(&mut self, ctx: &egui::Context) {
        if !self.show_settings {
            return;
        }

        let mut open = true;
        let mut save = false;
        let mut cancel = false;

        egui::Window::new("⚙ Settings")
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .default_width(460.0)
            .show(ctx, |ui| {
                egui::Grid::new("settings_grid")
                    .num_columns(2)
                    .spacing([10.0, 8.0])
                    .show(ui, |ui| {
                        ui.label("TMDB API key:");
                        ui.add(
                            egui::TextEdit::singleline(&mut self.settings_draft.tmdb_api_key)
                                .password(true)
                                .desired_width(280.0),
                        );
                        ui.end_row();

                        ui.label("Language:");
                        ui.add(
                            egui::TextEdit::singleline(&mut self.settings_draft.language)
                                .hint_text(config::DEFAULT_LANGUAGE)
                                .desired_width(120.0),
                        );
                        ui.end_row();

                        ui.label("CORS relay:");
                        ui.add(
                            egui::TextEdit::singleline(&mut self.settings_draft.cors_relay)
                                .hint_text("empty = direct")
                                .desired_width(280.0),
                        );
                        ui.end_row();

                        ui.label("Preview player:");
                        ui.horizontal(|ui| {
                            ui.add(
                                egui::TextEdit::singleline(&mut self.settings_draft.preview_player)
                                    .hint_text(config::DEFAULT_PREVIEW_PLAYER)
                                    .desired_width(200.0),
                            );
                            if ui.button("📂 Browse").clicked() {
                                if let Some(path) = rfd::FileDialog::new()
                                    .set_title("Select preview player")
                                    .pick_file()
                                {
                                    self.settings_draft.preview_player = path.display().to_string();
                                }
                            }
                        });
                        ui.end_row();

                        ui.label("Theme:");
                        ui.checkbox(&mut self.settings_draft.dark_mode, "Dark mode");
                        ui.end_row();
                    });

                ui.add_space(4.0);
                ui.label(
                    egui::RichText::new("ffplay and mpv get seek and volume control; other players only receive the URL.")
                        .weak()
                        .small(),
                );
                ui.separator();

                ui.horizontal(|ui| {
                    if ui.button("Cancel").clicked() {
                        cancel = true;
                    }
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("💾 Save").clicked() {
                            save = true;
                        }
                    });
                });
            });

        if save {
            self.apply_settings();
        }
        if save || cancel || !open {
            self.show_settings = false;
        }
    }

    fn show_clear_confirm_window(&mut self, ctx: &egui::Context) {
        if !self.show_clear_confirm {
            return;
        }

        egui::Window::new("⚠ Clear Favorites")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.add_space(10.0);
                ui.label(
                    egui::RichText::new(format!("Remove all {} favorites?", self.favorites.len())).strong(),
                );
                ui.label(egui::RichText::new("This action cannot be undone!").color(WARNING_COLOR));
                ui.add_space(10.0);

                ui.horizontal(|ui| {
                    if ui.button("Cancel").clicked() {
                        self.show_clear_confirm = false;
                    }
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button(egui::RichText::new("Clear all").color(WARNING_COLOR)).clicked() {
                            self.clear_favorites();
                            self.show_clear_confirm = false;
                        }
                    });
                });
            });
    }
}

fn main() -> Result<(), eframe::Error> {
    init_logging();
    tracing::info!("Starting Epikodi {}", env!("CARGO_PKG_VERSION"));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 720.0])
            .with_min_inner_size([760.0, 480.0])
            .with_icon(load_icon()),
        vsync: true,
        hardware_acceleration: eframe::HardwareAcceleration::Preferred,
        ..Default::default()
    };

    eframe::run_native(
        "Epikodi",
        options,
        Box::new(|cc| {
            install_emoji_font(&cc.egui_ctx);
            Ok(Box::new(EpikodiApp::new()))
        }),
    )
}

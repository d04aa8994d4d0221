//! Single-slot audio preview controller
//!
//! Every view that can start a preview (track results, the album window)
//! goes through one [`PreviewController`]. It holds at most one open
//! [`AudioHandle`] and releases it before another one is opened.

use std::sync::mpsc::{channel, Receiver, Sender};

use crate::error::Result;
use crate::models::PreviewTrack;

/// Length of the clips served by the music catalog
pub const PREVIEW_LENGTH_SECS: f32 = 30.0;

/// Opens playable resources for preview URLs
pub trait AudioBackend {
    type Handle: AudioHandle;

    fn open(&mut self, url: &str) -> Result<Self::Handle>;
}

/// One open audio resource. `release` must leave nothing playing.
pub trait AudioHandle {
    fn play(&mut self) -> Result<()>;
    fn pause(&mut self);
    fn seek(&mut self, seconds: f32) -> Result<()>;
    /// 0.0 ..= 1.0
    fn set_volume(&mut self, volume: f32) -> Result<()>;
    fn position(&self) -> f32;
    /// `None` while the clip is still going, `Some(Err(_))` when playback broke off
    fn finished(&mut self) -> Option<Result<()>>;
    fn release(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Loading,
    Playing,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    Started(i64),
    Paused(i64),
    Resumed(i64),
    Stopped(i64),
    Ended(i64),
    /// The player gave up; see [`PreviewController::last_error`]
    Failed(i64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSession {
    pub active_track: Option<PreviewTrack>,
    pub state: PlaybackState,
    pub position_seconds: f32,
    pub volume_percent: u8,
    pub muted: bool,
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self {
            active_track: None,
            state: PlaybackState::Idle,
            position_seconds: 0.0,
            volume_percent: 100,
            muted: false,
        }
    }
}

impl PlaybackSession {
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Upper seek bound: the preview length, or the track itself when shorter
    pub fn bound(&self) -> f32 {
        match &self.active_track {
            Some(track) if track.duration_seconds > 0 => {
                PREVIEW_LENGTH_SECS.min(track.duration_seconds as f32)
            }
            _ => PREVIEW_LENGTH_SECS,
        }
    }

    fn active_id(&self) -> Option<i64> {
        self.active_track.as_ref().map(|t| t.track_id)
    }
}

pub struct PreviewController<B: AudioBackend> {
    backend: B,
    handle: Option<B::Handle>,
    session: PlaybackSession,
    last_error: Option<String>,
    subscribers: Vec<Sender<PlaybackEvent>>,
}

impl<B: AudioBackend> PreviewController<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            handle: None,
            session: PlaybackSession::default(),
            last_error: None,
            subscribers: Vec::new(),
        }
    }

    pub fn with_volume(mut self, percent: u8) -> Self {
        self.session.volume_percent = percent.min(100);
        self
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_active(&self, track_id: i64) -> bool {
        self.session.active_id() == Some(track_id)
    }

    /// Output volume in percent, 0 while muted
    pub fn effective_volume(&self) -> u8 {
        if self.session.muted { 0 } else { self.session.volume_percent }
    }

    pub fn subscribe(&mut self) -> Receiver<PlaybackEvent> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    /// Resume in place when `track` is the paused one; otherwise start it from zero
    pub fn play(&mut self, track: PreviewTrack) -> Result<()> {
        if self.is_active(track.track_id) && self.session.state == PlaybackState::Paused {
            return self.resume();
        }

        self.release_active(PlaybackEvent::Stopped);
        self.last_error = None;

        tracing::info!("Preview: {} - {}", track.artist, track.title);
        let track_id = track.track_id;
        self.session.active_track = Some(track);
        self.session.position_seconds = 0.0;
        self.session.state = PlaybackState::Loading;

        match self.load(track_id) {
            Ok(handle) => {
                self.handle = Some(handle);
                self.session.state = PlaybackState::Playing;
                self.notify(PlaybackEvent::Started(track_id));
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Preview {} failed to start: {}", track_id, e);
                self.session = PlaybackSession {
                    volume_percent: self.session.volume_percent,
                    muted: self.session.muted,
                    ..PlaybackSession::default()
                };
                Err(e)
            }
        }
    }

    pub fn toggle_play_pause(&mut self) -> Result<()> {
        match self.session.state {
            PlaybackState::Playing => {
                if let Some(handle) = self.handle.as_mut() {
                    self.session.position_seconds = handle.position().clamp(0.0, self.session.bound());
                    handle.pause();
                }
                self.session.state = PlaybackState::Paused;
                if let Some(id) = self.session.active_id() {
                    self.notify(PlaybackEvent::Paused(id));
                }
                Ok(())
            }
            PlaybackState::Paused => self.resume(),
            PlaybackState::Idle | PlaybackState::Loading => Ok(()),
        }
    }

    pub fn seek(&mut self, offset_seconds: f32) -> Result<()> {
        if self.session.active_track.is_none() {
            return Ok(());
        }
        let offset = if offset_seconds.is_nan() { 0.0 } else { offset_seconds };
        let position = offset.clamp(0.0, self.session.bound());
        self.session.position_seconds = position;
        match self.handle.as_mut() {
            Some(handle) => handle.seek(position),
            None => Ok(()),
        }
    }

    /// Clamps to 0..=100 and un-mutes
    pub fn set_volume(&mut self, percent: i32) -> Result<()> {
        self.session.volume_percent = percent.clamp(0, 100) as u8;
        self.session.muted = false;
        self.push_volume()
    }

    pub fn toggle_mute(&mut self) -> Result<()> {
        self.session.muted = !self.session.muted;
        self.push_volume()
    }

    pub fn stop(&mut self) {
        self.release_active(PlaybackEvent::Stopped);
    }

    /// Dismissal from the hosting view
    pub fn close(&mut self) {
        self.stop();
    }

    /// Refresh the position and detect the end of the clip; call once per frame
    pub fn tick(&mut self) {
        if self.session.state != PlaybackState::Playing {
            return;
        }
        let bound = self.session.bound();
        let outcome = match self.handle.as_mut() {
            Some(handle) => {
                let position = handle.position();
                self.session.position_seconds = position.clamp(0.0, bound);
                match handle.finished() {
                    Some(result) => Some(result),
                    None if position >= bound => Some(Ok(())),
                    None => None,
                }
            }
            None => Some(Ok(())),
        };
        match outcome {
            Some(Ok(())) => self.release_active(PlaybackEvent::Ended),
            Some(Err(e)) => {
                if let Some(id) = self.session.active_id() {
                    tracing::warn!("Preview {} stopped with an error: {}", id, e);
                }
                self.last_error = Some(e.to_string());
                self.release_active(PlaybackEvent::Failed);
            }
            None => {}
        }
    }

    fn load(&mut self, track_id: i64) -> Result<B::Handle> {
        let url = self
            .session
            .active_track
            .as_ref()
            .map(|t| t.preview_url.clone())
            .unwrap_or_default();
        let mut handle = self.backend.open(&url)?;
        let volume = self.effective_volume() as f32 / 100.0;
        let started = handle.set_volume(volume).and_then(|_| handle.play());
        if let Err(e) = started {
            handle.release();
            return Err(e);
        }
        tracing::debug!("Preview {} loaded", track_id);
        Ok(handle)
    }

    fn resume(&mut self) -> Result<()> {
        let Some(id) = self.session.active_id() else {
            return Ok(());
        };
        let Some(handle) = self.handle.as_mut() else {
            return Ok(());
        };
        handle.seek(self.session.position_seconds)?;
        handle.play()?;
        self.session.state = PlaybackState::Playing;
        self.notify(PlaybackEvent::Resumed(id));
        Ok(())
    }

    fn push_volume(&mut self) -> Result<()> {
        let volume = self.effective_volume() as f32 / 100.0;
        match self.handle.as_mut() {
            Some(handle) => handle.set_volume(volume),
            None => Ok(()),
        }
    }

    /// Release whatever is open and go back to Idle, announcing `event` if a track was active
    fn release_active(&mut self, event: fn(i64) -> PlaybackEvent) {
        if let Some(mut handle) = self.handle.take() {
            handle.release();
        }
        let previous = self.session.active_id();
        self.session.active_track = None;
        self.session.state = PlaybackState::Idle;
        self.session.position_seconds = 0.0;
        if let Some(id) = previous {
            tracing::debug!("Preview {} released", id);
            self.notify(event(id));
        }
    }

    fn notify(&mut self, event: PlaybackEvent) {
        self.subscribers.retain(|tx| tx.send(event).is_ok());
    }
}

impl<B: AudioBackend> Drop for PreviewController<B> {
    fn drop(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            handle.release();
        }
    }
}

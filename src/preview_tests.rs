//! Tests for the preview controller

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::error::{Error, Result};
    use crate::models::PreviewTrack;
    use crate::preview::*;

    #[derive(Debug, Default)]
    struct Resource {
        url: String,
        playing: bool,
        position: f32,
        volume: f32,
        released: bool,
        ended: bool,
        failure: Option<String>,
    }

    #[derive(Default)]
    struct MockBackend {
        resources: Rc<RefCell<Vec<Resource>>>,
        fail_open: bool,
    }

    struct MockHandle {
        index: usize,
        resources: Rc<RefCell<Vec<Resource>>>,
    }

    impl MockBackend {
        fn live(&self) -> Vec<String> {
            self.resources
                .borrow()
                .iter()
                .filter(|r| !r.released)
                .map(|r| r.url.clone())
                .collect()
        }

        fn playing(&self) -> usize {
            self.resources.borrow().iter().filter(|r| r.playing).count()
        }

        fn set_position(&self, position: f32) {
            if let Some(r) = self.resources.borrow_mut().iter_mut().rev().find(|r| !r.released) {
                r.position = position;
            }
        }

        fn finish_current(&self) {
            if let Some(r) = self.resources.borrow_mut().iter_mut().rev().find(|r| !r.released) {
                r.ended = true;
                r.playing = false;
            }
        }

        fn fail_current(&self, message: &str) {
            if let Some(r) = self.resources.borrow_mut().iter_mut().rev().find(|r| !r.released) {
                r.failure = Some(message.to_string());
                r.playing = false;
            }
        }

        fn last(&self) -> (bool, f32, f32) {
            let resources = self.resources.borrow();
            let r = resources.last().unwrap();
            (r.playing, r.position, r.volume)
        }
    }

    impl AudioBackend for MockBackend {
        type Handle = MockHandle;

        fn open(&mut self, url: &str) -> Result<MockHandle> {
            if self.fail_open {
                return Err(Error::Player("no such player".to_string()));
            }
            let mut resources = self.resources.borrow_mut();
            resources.push(Resource { url: url.to_string(), volume: 1.0, ..Resource::default() });
            Ok(MockHandle { index: resources.len() - 1, resources: Rc::clone(&self.resources) })
        }
    }

    impl MockHandle {
        fn with<R>(&self, f: impl FnOnce(&mut Resource) -> R) -> R {
            f(&mut self.resources.borrow_mut()[self.index])
        }
    }

    impl AudioHandle for MockHandle {
        fn play(&mut self) -> Result<()> {
            self.with(|r| r.playing = true);
            Ok(())
        }

        fn pause(&mut self) {
            self.with(|r| r.playing = false);
        }

        fn seek(&mut self, seconds: f32) -> Result<()> {
            self.with(|r| r.position = seconds);
            Ok(())
        }

        fn set_volume(&mut self, volume: f32) -> Result<()> {
            self.with(|r| r.volume = volume);
            Ok(())
        }

        fn position(&self) -> f32 {
            self.with(|r| r.position)
        }

        fn finished(&mut self) -> Option<Result<()>> {
            self.with(|r| match (&r.failure, r.ended) {
                (Some(message), _) => Some(Err(Error::Player(message.clone()))),
                (None, true) => Some(Ok(())),
                (None, false) => None,
            })
        }

        fn release(&mut self) {
            self.with(|r| {
                r.playing = false;
                r.released = true;
            });
        }
    }

    fn track(id: i64, duration: u32) -> PreviewTrack {
        PreviewTrack {
            track_id: id,
            preview_url: format!("https://cdn.example/preview/{}.mp3", id),
            duration_seconds: duration,
            title: format!("Track {}", id),
            artist: "Artist".to_string(),
            album: "Album".to_string(),
        }
    }

    fn controller() -> PreviewController<MockBackend> {
        PreviewController::new(MockBackend::default())
    }

    #[test]
    fn test_switching_tracks_keeps_one_resource() {
        let mut ctl = controller();
        ctl.play(track(1, 200)).unwrap();
        ctl.play(track(2, 200)).unwrap();

        assert_eq!(ctl.backend().live(), vec!["https://cdn.example/preview/2.mp3".to_string()]);
        assert_eq!(ctl.backend().playing(), 1);
        assert!(ctl.backend().resources.borrow()[0].released);
        assert!(ctl.is_active(2));
        assert!(!ctl.is_active(1));
        assert_eq!(ctl.session().state, PlaybackState::Playing);
    }

    #[test]
    fn test_many_switches_never_overlap() {
        let mut ctl = controller();
        for id in 0..20 {
            ctl.play(track(id % 3, 200)).unwrap();
            assert_eq!(ctl.backend().live().len(), 1);
            assert_eq!(ctl.backend().playing(), 1);
        }
    }

    #[test]
    fn test_pause_then_play_same_track_resumes() {
        let mut ctl = controller();
        ctl.play(track(1, 200)).unwrap();
        ctl.backend().set_position(12.5);
        ctl.tick();
        ctl.toggle_play_pause().unwrap();
        assert_eq!(ctl.session().state, PlaybackState::Paused);
        assert_eq!(ctl.session().position_seconds, 12.5);

        ctl.play(track(1, 200)).unwrap();
        assert_eq!(ctl.session().state, PlaybackState::Playing);
        assert_eq!(ctl.session().position_seconds, 12.5);
        assert_eq!(ctl.backend().resources.borrow().len(), 1);
        assert_eq!(ctl.backend().last().1, 12.5);
    }

    #[test]
    fn test_play_same_track_while_playing_restarts() {
        let mut ctl = controller();
        ctl.play(track(1, 200)).unwrap();
        ctl.backend().set_position(8.0);
        ctl.tick();
        ctl.play(track(1, 200)).unwrap();
        assert_eq!(ctl.session().position_seconds, 0.0);
        assert_eq!(ctl.backend().resources.borrow().len(), 2);
        assert_eq!(ctl.backend().live().len(), 1);
    }

    #[test]
    fn test_toggle_without_track_is_noop() {
        let mut ctl = controller();
        ctl.toggle_play_pause().unwrap();
        assert_eq!(ctl.session().state, PlaybackState::Idle);
        assert!(ctl.backend().resources.borrow().is_empty());
    }

    #[test]
    fn test_toggle_keeps_position() {
        let mut ctl = controller();
        ctl.play(track(1, 200)).unwrap();
        ctl.seek(20.0).unwrap();
        ctl.toggle_play_pause().unwrap();
        ctl.toggle_play_pause().unwrap();
        assert_eq!(ctl.session().state, PlaybackState::Playing);
        assert_eq!(ctl.session().position_seconds, 20.0);
        assert!(ctl.backend().last().0);
    }

    #[test]
    fn test_seek_clamps_to_preview_length() {
        let mut ctl = controller();
        ctl.play(track(1, 240)).unwrap();
        ctl.seek(45.0).unwrap();
        assert_eq!(ctl.session().position_seconds, 30.0);
        ctl.seek(-3.0).unwrap();
        assert_eq!(ctl.session().position_seconds, 0.0);
    }

    #[test]
    fn test_seek_clamps_to_short_track() {
        let mut ctl = controller();
        ctl.play(track(1, 18)).unwrap();
        ctl.seek(25.0).unwrap();
        assert_eq!(ctl.session().position_seconds, 18.0);
    }

    #[test]
    fn test_seek_unknown_duration_uses_preview_length() {
        let mut ctl = controller();
        ctl.play(track(1, 0)).unwrap();
        ctl.seek(100.0).unwrap();
        assert_eq!(ctl.session().position_seconds, 30.0);
    }

    #[test]
    fn test_seek_without_track_is_noop() {
        let mut ctl = controller();
        ctl.seek(10.0).unwrap();
        assert_eq!(ctl.session().position_seconds, 0.0);
    }

    #[test]
    fn test_set_volume_unmutes() {
        let mut ctl = controller();
        ctl.play(track(1, 200)).unwrap();
        ctl.set_volume(0).unwrap();
        ctl.toggle_mute().unwrap();
        assert!(ctl.session().muted);
        ctl.set_volume(50).unwrap();
        assert!(!ctl.session().muted);
        assert_eq!(ctl.effective_volume(), 50);
        assert_eq!(ctl.backend().last().2, 0.5);
    }

    #[test]
    fn test_volume_is_clamped() {
        let mut ctl = controller();
        ctl.set_volume(150).unwrap();
        assert_eq!(ctl.session().volume_percent, 100);
        ctl.set_volume(-20).unwrap();
        assert_eq!(ctl.session().volume_percent, 0);
    }

    #[test]
    fn test_mute_preserves_volume() {
        let mut ctl = controller().with_volume(70);
        ctl.play(track(1, 200)).unwrap();
        assert_eq!(ctl.backend().last().2, 0.7);

        ctl.toggle_mute().unwrap();
        assert_eq!(ctl.effective_volume(), 0);
        assert_eq!(ctl.session().volume_percent, 70);
        assert_eq!(ctl.backend().last().2, 0.0);

        ctl.toggle_mute().unwrap();
        assert_eq!(ctl.effective_volume(), 70);
    }

    #[test]
    fn test_muted_state_applies_to_next_track() {
        let mut ctl = controller();
        ctl.toggle_mute().unwrap();
        ctl.play(track(3, 200)).unwrap();
        assert_eq!(ctl.backend().last().2, 0.0);
    }

    #[test]
    fn test_stop_and_close_release() {
        let mut ctl = controller();
        ctl.play(track(1, 200)).unwrap();
        ctl.stop();
        assert!(ctl.backend().live().is_empty());
        assert_eq!(ctl.session().state, PlaybackState::Idle);
        assert!(ctl.session().active_track.is_none());

        ctl.play(track(2, 200)).unwrap();
        ctl.close();
        assert!(ctl.backend().live().is_empty());
        assert!(!ctl.is_active(2));
    }

    #[test]
    fn test_natural_end_returns_to_idle() {
        let mut ctl = controller();
        let rx = ctl.subscribe();
        ctl.play(track(5, 200)).unwrap();
        ctl.backend().finish_current();
        ctl.tick();

        assert_eq!(ctl.session().state, PlaybackState::Idle);
        assert!(ctl.backend().live().is_empty());
        let events: Vec<PlaybackEvent> = rx.try_iter().collect();
        assert_eq!(events, vec![PlaybackEvent::Started(5), PlaybackEvent::Ended(5)]);
    }

    #[test]
    fn test_player_failure_is_not_a_natural_end() {
        let mut ctl = controller();
        let rx = ctl.subscribe();
        ctl.play(track(9, 200)).unwrap();
        ctl.backend().fail_current("404 Not Found");
        ctl.tick();

        assert_eq!(ctl.session().state, PlaybackState::Idle);
        assert!(ctl.backend().live().is_empty());
        assert!(ctl.last_error().is_some_and(|e| e.contains("404")));
        let events: Vec<PlaybackEvent> = rx.try_iter().collect();
        assert_eq!(events, vec![PlaybackEvent::Started(9), PlaybackEvent::Failed(9)]);

        ctl.play(track(10, 200)).unwrap();
        assert!(ctl.last_error().is_none());
    }

    #[test]
    fn test_position_below_bound_keeps_playing() {
        let mut ctl = controller();
        ctl.play(track(5, 200)).unwrap();
        ctl.backend().set_position(29.5);
        ctl.tick();
        assert_eq!(ctl.session().state, PlaybackState::Playing);
        assert_eq!(ctl.session().position_seconds, 29.5);
    }

    #[test]
    fn test_reaching_bound_ends_preview() {
        let mut ctl = controller();
        ctl.play(track(5, 200)).unwrap();
        ctl.backend().set_position(31.0);
        ctl.tick();
        assert_eq!(ctl.session().state, PlaybackState::Idle);
        assert!(ctl.backend().live().is_empty());
    }

    #[test]
    fn test_tick_while_paused_does_nothing() {
        let mut ctl = controller();
        ctl.play(track(5, 200)).unwrap();
        ctl.toggle_play_pause().unwrap();
        ctl.backend().finish_current();
        ctl.tick();
        assert_eq!(ctl.session().state, PlaybackState::Paused);
    }

    #[test]
    fn test_events_for_transitions() {
        let mut ctl = controller();
        let rx = ctl.subscribe();
        ctl.play(track(1, 200)).unwrap();
        ctl.toggle_play_pause().unwrap();
        ctl.play(track(1, 200)).unwrap();
        ctl.play(track(2, 200)).unwrap();
        ctl.set_volume(30).unwrap();
        ctl.stop();
        ctl.stop();

        let events: Vec<PlaybackEvent> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                PlaybackEvent::Started(1),
                PlaybackEvent::Paused(1),
                PlaybackEvent::Resumed(1),
                PlaybackEvent::Stopped(1),
                PlaybackEvent::Started(2),
                PlaybackEvent::Stopped(2),
            ]
        );
    }

    #[test]
    fn test_failed_open_leaves_idle() {
        let mut ctl = controller();
        ctl.play(track(1, 200)).unwrap();
        ctl.backend_mut().fail_open = true;

        assert!(ctl.play(track(2, 200)).is_err());
        assert_eq!(ctl.session().state, PlaybackState::Idle);
        assert!(ctl.session().active_track.is_none());
        assert!(ctl.backend().live().is_empty());
    }

    #[test]
    fn test_drop_releases_resource() {
        let resources;
        {
            let mut ctl = controller();
            ctl.play(track(1, 200)).unwrap();
            resources = Rc::clone(&ctl.backend().resources);
        }
        assert!(resources.borrow().iter().all(|r| r.released));
    }
}

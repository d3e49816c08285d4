use crate::core::media::MediaCatalog;

/// What the playback engine should do with the shared music track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MusicEffect {
    /// Start (or restart from the beginning) the named track.
    Start(String),
    Stop,
}

/// The single background-audio track, decoupled from grid items.
///
/// Owned by the transport layer alone; grid items never touch it. Changing
/// the selection stops whatever is playing, and a global play-all restarts
/// the selected track from the beginning.
#[derive(Debug, Default)]
pub struct BackgroundMusic {
    selected: Option<String>,
    playing: bool,
}

impl BackgroundMusic {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Change the selected track. A genuine change always stops the previous
    /// stream, even a paused one, so a later toggle cannot resume the wrong
    /// track. Selecting the current track again does nothing.
    pub fn select(&mut self, name: Option<String>) -> Option<MusicEffect> {
        if self.selected == name {
            return None;
        }
        self.selected = name;
        self.playing = false;
        Some(MusicEffect::Stop)
    }

    /// Play/pause button. With no selection this is a no-op.
    pub fn toggle(&mut self) -> Option<MusicEffect> {
        let name = self.selected.clone()?;
        if self.playing {
            self.playing = false;
            Some(MusicEffect::Stop)
        } else {
            self.playing = true;
            Some(MusicEffect::Start(name))
        }
    }

    /// Global play-all restarts the selection from the beginning.
    pub fn on_play_all(&mut self) -> Option<MusicEffect> {
        let name = self.selected.clone()?;
        self.playing = true;
        Some(MusicEffect::Start(name))
    }

    /// The engine could not start the track; reflect that in the control.
    pub fn mark_rejected(&mut self) {
        self.playing = false;
    }

    /// Drop a selection whose file vanished from the catalog.
    pub fn reconcile(&mut self, catalog: &MediaCatalog) -> Option<MusicEffect> {
        match &self.selected {
            Some(name) if !catalog.contains(name) => {
                log::info!("Background track {} vanished from the catalog", name);
                self.select(None)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::media::{FileDescriptor, MediaKind};

    #[test]
    fn test_toggle_without_selection_is_a_no_op() {
        let mut music = BackgroundMusic::new();
        assert_eq!(music.toggle(), None);
        assert!(!music.is_playing());
    }

    #[test]
    fn test_toggle_starts_and_stops_the_selected_track() {
        let mut music = BackgroundMusic::new();
        music.select(Some("song.mp3".to_string()));

        assert_eq!(
            music.toggle(),
            Some(MusicEffect::Start("song.mp3".to_string()))
        );
        assert!(music.is_playing());
        assert_eq!(music.toggle(), Some(MusicEffect::Stop));
        assert!(!music.is_playing());
    }

    #[test]
    fn test_changing_the_selection_stops_playback() {
        let mut music = BackgroundMusic::new();
        music.select(Some("a.mp3".to_string()));
        music.toggle();

        assert_eq!(music.select(Some("b.mp3".to_string())), Some(MusicEffect::Stop));
        assert!(!music.is_playing());
        assert_eq!(music.selected(), Some("b.mp3"));

        // Re-selecting the same track changes nothing.
        assert_eq!(music.select(Some("b.mp3".to_string())), None);

        // Changing away from a paused track still drops its stream.
        assert_eq!(music.select(Some("c.mp3".to_string())), Some(MusicEffect::Stop));
    }

    #[test]
    fn test_play_all_restarts_the_selection() {
        let mut music = BackgroundMusic::new();
        assert_eq!(music.on_play_all(), None);

        music.select(Some("a.mp3".to_string()));
        assert_eq!(
            music.on_play_all(),
            Some(MusicEffect::Start("a.mp3".to_string()))
        );
        assert!(music.is_playing());

        // Already playing: play-all still restarts from the beginning.
        assert_eq!(
            music.on_play_all(),
            Some(MusicEffect::Start("a.mp3".to_string()))
        );
    }

    #[test]
    fn test_reconcile_clears_a_vanished_selection() {
        let mut catalog = MediaCatalog::new();
        catalog.replace(
            "/media".to_string(),
            vec![FileDescriptor::new("keep.mp3", MediaKind::Audio)],
        );

        let mut music = BackgroundMusic::new();
        music.select(Some("gone.mp3".to_string()));
        music.toggle();

        assert_eq!(music.reconcile(&catalog), Some(MusicEffect::Stop));
        assert_eq!(music.selected(), None);

        music.select(Some("keep.mp3".to_string()));
        assert_eq!(music.reconcile(&catalog), None);
        assert_eq!(music.selected(), Some("keep.mp3"));
    }
}

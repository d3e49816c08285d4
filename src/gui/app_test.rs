#[cfg(test)]
mod tests {

    use std::collections::{HashMap, HashSet};

    use crate::core::media::{FileDescriptor, MediaCatalog, MediaKind};
    use crate::core::{
        AppConfig, BackgroundMusic, Command, DocumentPhase, GridState, SessionStore,
    };
    use crate::gui::app::{DocumentInfo, MediaWallApp, OverlayView};
    use crate::playback::{ArtWorker, PlaybackEngine, PlaybackEvent, SlotKey};
    use crate::remote::{LibraryClient, RemoteEvent, RemoteWorker};

    // Test helper to create a minimal app instance without a window or a
    // reachable library service.
    fn create_test_app() -> MediaWallApp {
        create_test_app_with_session(SessionStore::load(
            std::env::temp_dir().join("media-wall-test-session.json"),
            false,
        ))
    }

    fn create_test_app_with_session(session: SessionStore) -> MediaWallApp {
        let client = LibraryClient::new("http://127.0.0.1:59999");
        let (worker, remote_receiver) = RemoteWorker::new(client.clone());
        let (engine, playback_receiver) = PlaybackEngine::new(client.clone());

        MediaWallApp {
            config: AppConfig::default(),
            catalog: MediaCatalog::new(),
            grid: GridState::default(),
            session,
            music: BackgroundMusic::new(),
            worker,
            remote_receiver,
            engine,
            playback_receiver,
            art: ArtWorker::new(client),
            sidebar_open: false,
            overlay: None,
            documents: HashMap::new(),
            tile_textures: HashMap::new(),
            zoom: 1.0,
            status_message: String::new(),
            hydrated: false,
            hovered_last_frame: HashSet::new(),
        }
    }

    fn catalog_event(files: Vec<(&str, MediaKind)>) -> RemoteEvent {
        RemoteEvent::Catalog {
            folder: "/media".to_string(),
            files: files
                .into_iter()
                .map(|(n, k)| FileDescriptor::new(n, k))
                .collect(),
        }
    }

    #[test]
    fn test_escape_closes_the_overlay_before_the_sidebar() {
        let mut app = create_test_app();
        app.sidebar_open = true;
        app.overlay = Some(OverlayView {
            name: "v.mp4".to_string(),
            kind: MediaKind::Video,
        });

        app.handle_escape();
        assert!(app.overlay.is_none());
        assert!(app.sidebar_open);

        app.handle_escape();
        assert!(!app.sidebar_open);

        // With nothing open, escape is a no-op.
        app.handle_escape();
        assert!(app.overlay.is_none());
        assert!(!app.sidebar_open);
    }

    #[test]
    fn test_first_catalog_hydrates_the_session_and_drops_ghosts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, r#"{"items": ["a.mp4", "ghost.mp4"]}"#).unwrap();

        let mut app = create_test_app_with_session(SessionStore::load(path.clone(), true));
        app.handle_remote_event(catalog_event(vec![("a.mp4", MediaKind::Video)]));

        assert!(app.hydrated);
        assert_eq!(app.grid.member_names(), vec!["a.mp4"]);

        // Hydration counted as a membership change, so the ghost is already
        // gone from disk.
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("a.mp4"));
        assert!(!content.contains("ghost.mp4"));
    }

    #[test]
    fn test_later_catalogs_do_not_rehydrate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, r#"{"items": ["a.mp4"]}"#).unwrap();

        let mut app = create_test_app_with_session(SessionStore::load(path, true));
        app.handle_remote_event(catalog_event(vec![("a.mp4", MediaKind::Video)]));
        app.dispatch(Command::Remove("a.mp4".to_string()));
        assert!(app.grid.is_empty());

        app.handle_remote_event(catalog_event(vec![("a.mp4", MediaKind::Video)]));
        assert!(app.grid.is_empty());
    }

    #[test]
    fn test_catalog_failure_keeps_the_previous_listing() {
        let mut app = create_test_app();
        app.handle_remote_event(catalog_event(vec![("a.mp4", MediaKind::Video)]));
        assert_eq!(app.catalog.files().len(), 1);

        app.handle_remote_event(RemoteEvent::CatalogFailed {
            reason: "connection refused".to_string(),
        });
        assert_eq!(app.catalog.files().len(), 1);
        assert!(app.status_message.contains("connection refused"));
    }

    #[test]
    fn test_playback_rejection_pauses_the_item() {
        let mut app = create_test_app();
        app.dispatch(Command::Add(FileDescriptor::new("a.mp3", MediaKind::Audio)));
        assert!(app.grid.item("a.mp3").unwrap().playback().unwrap().playing);

        app.handle_playback_event(PlaybackEvent::Rejected {
            slot: SlotKey::Item("a.mp3".to_string()),
            reason: "no audio output device".to_string(),
        });
        assert!(!app.grid.item("a.mp3").unwrap().playback().unwrap().playing);
    }

    #[test]
    fn test_stale_document_deliveries_are_ignored() {
        let mut app = create_test_app();
        app.dispatch(Command::Add(FileDescriptor::new("d.html", MediaKind::Html)));

        app.handle_remote_event(RemoteEvent::DocumentFetched {
            name: "d.html".to_string(),
            byte_len: 100,
            title: Some("Intro".to_string()),
        });
        assert!(app.documents.contains_key("d.html"));

        // Blanked documents discard their info; a late delivery must not
        // bring it back.
        app.dispatch(Command::TogglePlayback("d.html".to_string()));
        assert_eq!(
            app.grid.item("d.html").unwrap().document_phase(),
            Some(&DocumentPhase::Blanked)
        );
        assert!(!app.documents.contains_key("d.html"));

        app.handle_remote_event(RemoteEvent::DocumentFetched {
            name: "d.html".to_string(),
            byte_len: 100,
            title: None,
        });
        assert!(!app.documents.contains_key("d.html"));

        // Same for a document that left the grid entirely.
        app.handle_remote_event(RemoteEvent::DocumentFetched {
            name: "gone.html".to_string(),
            byte_len: 5,
            title: None,
        });
        assert!(!app.documents.contains_key("gone.html"));
    }

    #[test]
    fn test_upload_outcome_reaches_the_status_bar() {
        let mut app = create_test_app();

        app.handle_remote_event(RemoteEvent::UploadFailed {
            reason: "Format not allowed".to_string(),
        });
        assert!(app.status_message.contains("Format not allowed"));

        app.handle_remote_event(RemoteEvent::Uploaded {
            file_name: "new.mp4".to_string(),
        });
        assert!(app.status_message.contains("new.mp4"));
    }

    #[test]
    fn test_music_selection_follows_the_catalog() {
        let mut app = create_test_app();
        app.handle_remote_event(catalog_event(vec![
            ("song.mp3", MediaKind::Audio),
            ("v.mp4", MediaKind::Video),
        ]));

        app.select_music(Some("song.mp3".to_string()));
        app.toggle_music();
        assert!(app.music.is_playing());

        // The selected track vanishing from the listing stops and clears it.
        app.handle_remote_event(catalog_event(vec![("v.mp4", MediaKind::Video)]));
        assert!(!app.music.is_playing());
        assert_eq!(app.music.selected(), None);
    }

    #[test]
    fn test_removing_an_item_drops_its_cached_resources() {
        let mut app = create_test_app();
        app.dispatch(Command::Add(FileDescriptor::new("d.html", MediaKind::Html)));
        app.documents.insert(
            "d.html".to_string(),
            DocumentInfo {
                byte_len: 10,
                title: None,
            },
        );

        app.dispatch(Command::Remove("d.html".to_string()));
        assert!(app.documents.is_empty());
        assert!(app.tile_textures.is_empty());
    }
}

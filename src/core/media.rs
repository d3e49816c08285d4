use chrono::{DateTime, Local};

/// What kind of playback surface a file gets on the grid.
///
/// The server classifies files; anything it reports outside the known set
/// maps to `Unknown` and is rendered as a plain tile without transport state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Html,
    Video,
    Audio,
    Image,
    Unknown,
}

impl MediaKind {
    pub fn from_wire(value: &str) -> Self {
        match value {
            "html" => MediaKind::Html,
            "video" => MediaKind::Video,
            "audio" => MediaKind::Audio,
            "image" => MediaKind::Image,
            other => {
                log::debug!("Unrecognized media type from server: {}", other);
                MediaKind::Unknown
            }
        }
    }

    /// Native media has intrinsic play/pause/rate/mute primitives.
    pub fn is_native(self) -> bool {
        matches!(self, MediaKind::Video | MediaKind::Audio)
    }

    /// Short badge shown next to file names in the sidebar.
    pub fn label(self) -> &'static str {
        match self {
            MediaKind::Html => "HTML",
            MediaKind::Video => "VIDEO",
            MediaKind::Audio => "AUDIO",
            MediaKind::Image => "IMAGE",
            MediaKind::Unknown => "FILE",
        }
    }
}

/// One file as reported by the remote library service.
///
/// `name` is the server-assigned identifier, unique within the listing and
/// treated as opaque. Descriptors are immutable; a catalog refresh replaces
/// them wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    pub name: String,
    pub kind: MediaKind,
}

impl FileDescriptor {
    pub fn new(name: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// The last successfully fetched file listing, plus the server's folder path.
///
/// Pure data cache: replaced atomically by `replace`, never partially
/// updated. On a failed refresh the previous contents stay as they are so the
/// UI keeps working on stale data.
#[derive(Debug, Default)]
pub struct MediaCatalog {
    files: Vec<FileDescriptor>,
    folder: Option<String>,
    refreshed_at: Option<DateTime<Local>>,
}

impl MediaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in a complete new listing. Callers never observe a partial state.
    pub fn replace(&mut self, folder: String, files: Vec<FileDescriptor>) {
        log::info!("Catalog refreshed: {} files in {}", files.len(), folder);
        self.files = files;
        self.folder = Some(folder);
        self.refreshed_at = Some(Local::now());
    }

    pub fn files(&self) -> &[FileDescriptor] {
        &self.files
    }

    /// Absence is a normal case (e.g. a stale session entry), not an error.
    pub fn find(&self, name: &str) -> Option<&FileDescriptor> {
        self.files.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub fn folder(&self) -> Option<&str> {
        self.folder.as_deref()
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Local>> {
        self.refreshed_at
    }

    /// Whether at least one refresh has succeeded since startup.
    pub fn is_fetched(&self) -> bool {
        self.refreshed_at.is_some()
    }

    /// Audio entries, for the background-music dropdown.
    pub fn audio_files(&self) -> impl Iterator<Item = &FileDescriptor> {
        self.files.iter().filter(|f| f.kind == MediaKind::Audio)
    }
}

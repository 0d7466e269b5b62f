//! Persistence of the enhancement service API key.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use frameclean_enhance::Credential;
use parking_lot::Mutex;
use tracing::{debug, warn};

/// Durable storage for a single credential.
pub trait CredentialStore: Send + Sync {
    /// Read the stored credential, `None` if nothing is stored.
    fn load(&self) -> io::Result<Option<Credential>>;

    fn save(&self, credential: &Credential) -> io::Result<()>;

    /// Remove the stored credential. Clearing an empty store is not an error.
    fn clear(&self) -> io::Result<()>;
}

/// Stores the key as a single line in a user-private file.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store under the per-user config directory.
    pub fn in_config_dir() -> Option<Self> {
        crate::config::config_dir().map(|dir| Self::new(dir.join("credential")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> io::Result<Option<Credential>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Credential::new(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn save(&self, credential: &Credential) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = open_private(&self.path)?;
        file.write_all(credential.expose().as_bytes())?;

        debug!(path = %self.path.display(), "Credential saved");
        Ok(())
    }

    fn clear(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

/// Open `path` for writing, creating it readable by the owner only.
#[cfg(unix)]
fn open_private(path: &Path) -> io::Result<File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // `mode` only applies when the file is created.
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    Ok(file)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

/// Process-local store, for tests and for sessions that should not persist.
#[derive(Default)]
pub struct MemoryCredentialStore {
    slot: Mutex<Option<Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(credential: Credential) -> Self {
        Self {
            slot: Mutex::new(Some(credential)),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> io::Result<Option<Credential>> {
        Ok(self.slot.lock().clone())
    }

    fn save(&self, credential: &Credential) -> io::Result<()> {
        *self.slot.lock() = Some(credential.clone());
        Ok(())
    }

    fn clear(&self) -> io::Result<()> {
        *self.slot.lock() = None;
        Ok(())
    }
}

enum Slot {
    Unloaded,
    Loaded(Option<Credential>),
}

/// The in-memory credential, loaded from its store on first use.
///
/// Store failures are logged and never block the session: a key that
/// cannot be persisted is still usable until the process exits.
pub struct CredentialHolder {
    store: Box<dyn CredentialStore>,
    slot: Mutex<Slot>,
}

impl CredentialHolder {
    pub fn new(store: Box<dyn CredentialStore>) -> Self {
        Self {
            store,
            slot: Mutex::new(Slot::Unloaded),
        }
    }

    /// The current credential, if any.
    pub fn current(&self) -> Option<Credential> {
        let mut slot = self.slot.lock();
        if let Slot::Loaded(credential) = &*slot {
            return credential.clone();
        }

        let loaded = match self.store.load() {
            Ok(credential) => credential,
            Err(e) => {
                warn!("Failed to read stored credential: {}", e);
                None
            }
        };
        *slot = Slot::Loaded(loaded.clone());
        loaded
    }

    pub fn is_present(&self) -> bool {
        self.current().is_some()
    }

    /// Replace the credential in memory and in the store.
    pub fn set(&self, credential: Credential) {
        if let Err(e) = self.store.save(&credential) {
            warn!("Failed to persist credential: {}", e);
        }
        *self.slot.lock() = Slot::Loaded(Some(credential));
    }

    /// Forget the credential in memory and in the store.
    pub fn clear(&self) {
        if let Err(e) = self.store.clear() {
            warn!("Failed to clear stored credential: {}", e);
        }
        *self.slot.lock() = Slot::Loaded(None);
    }
}

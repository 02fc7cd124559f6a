//! Terminal stand-ins for the platform services the core expects.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use eco_core::{
    model::LocationFix,
    ports::{LocationPort, PortError, SessionStore},
    session::SessionState,
};

use crate::config::LocationConfig;

/// Location port answering from configuration.
pub(crate) struct ConfiguredLocation {
    config: LocationConfig,
}

impl ConfiguredLocation {
    pub(crate) fn new(config: LocationConfig) -> Self {
        Self { config }
    }
}

impl LocationPort for ConfiguredLocation {
    fn has_permission(&self) -> bool {
        self.config.permission
    }

    fn is_location_enabled(&self) -> bool {
        self.config.gps_enabled
    }

    fn last_known_fixes(&self) -> Vec<LocationFix> {
        self.config.fixes.clone()
    }
}

/// Session persisted as JSON in the state directory.
pub(crate) struct FileSessionStore {
    path: PathBuf,
    state: Mutex<SessionState>,
}

impl FileSessionStore {
    pub(crate) const FILE_NAME: &'static str = "session.json";

    /// Load the session from `dir`, starting logged out when the file is
    /// missing or unreadable.
    pub(crate) fn open(dir: &Path) -> Self {
        let path = dir.join(Self::FILE_NAME);
        let state = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|err| {
                tracing::warn!(path = %path.display(), error = %err, "ignoring corrupt session file");
                SessionState::default()
            }),
            Err(err) if err.kind() == io::ErrorKind::NotFound => SessionState::default(),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "cannot read session file");
                SessionState::default()
            }
        };
        Self {
            path,
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn store(&self, state: SessionState) -> Result<(), PortError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&state)?)?;
        *self.lock() = state;
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn is_logged_in(&self) -> bool {
        self.lock().is_logged_in
    }

    fn username(&self) -> Option<String> {
        self.lock().username.clone()
    }

    fn save(&self, username: &str) -> Result<(), PortError> {
        self.store(SessionState::logged_in(username))
    }

    fn clear(&self) -> Result<(), PortError> {
        self.store(SessionState::default())
    }
}

#[cfg(test)]
mod tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use eco_core::model::Coordinate;

    use super::*;

    fn scratch_dir(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos())
            .unwrap_or_default();
        std::env::temp_dir().join(format!("eco-tui-{tag}-{}-{nanos}", std::process::id()))
    }

    #[test]
    fn session_survives_reopen() {
        let dir = scratch_dir("session");
        {
            let store = FileSessionStore::open(&dir);
            assert!(!store.is_logged_in());
            store.save("mateo").expect("save");
        }

        let reopened = FileSessionStore::open(&dir);
        assert!(reopened.is_logged_in());
        assert_eq!(reopened.username().as_deref(), Some("mateo"));

        reopened.clear().expect("clear");
        assert!(!FileSessionStore::open(&dir).is_logged_in());

        fs::remove_dir_all(&dir).expect("cleanup");
    }

    #[test]
    fn corrupt_session_file_starts_logged_out() {
        let dir = scratch_dir("corrupt");
        fs::create_dir_all(&dir).expect("mkdir");
        fs::write(dir.join(FileSessionStore::FILE_NAME), "{not json").expect("write");

        assert!(!FileSessionStore::open(&dir).is_logged_in());

        fs::remove_dir_all(&dir).expect("cleanup");
    }

    #[test]
    fn unreadable_session_file_starts_logged_out() {
        let dir = scratch_dir("unreadable");
        // a directory where the file should be cannot be read as text
        fs::create_dir_all(dir.join(FileSessionStore::FILE_NAME)).expect("mkdir");

        let store = FileSessionStore::open(&dir);
        assert!(!store.is_logged_in());
        assert_eq!(store.username(), None);

        fs::remove_dir_all(&dir).expect("cleanup");
    }

    #[test]
    fn configured_location_reports_config() {
        let fix = LocationFix {
            source: "gps".to_owned(),
            coordinate: Coordinate::new(-34.76, -58.21),
            accuracy: 5.0,
        };
        let location = ConfiguredLocation::new(LocationConfig {
            permission: false,
            gps_enabled: true,
            fixes: vec![fix.clone()],
        });
        assert!(!location.has_permission());
        assert!(location.is_location_enabled());
        assert_eq!(location.last_known_fixes(), vec![fix]);
    }
}

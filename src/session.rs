use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Session {
    #[default]
    LoggedOut,
    LoggedIn { user_id: i64, username: String },
}

impl Session {
    pub fn user_id(&self) -> Option<i64> {
        match self {
            Session::LoggedIn { user_id, .. } => Some(*user_id),
            Session::LoggedOut => None,
        }
    }

    pub fn username(&self) -> Option<&str> {
        match self {
            Session::LoggedIn { username, .. } => Some(username),
            Session::LoggedOut => None,
        }
    }

    pub fn is_logged_in(&self) -> bool {
        matches!(self, Session::LoggedIn { .. })
    }
}

/// Read-only view of who is currently signed in.
pub trait AuthGate {
    fn current_user(&self) -> Session;
}

impl AuthGate for Session {
    fn current_user(&self) -> Session {
        self.clone()
    }
}

impl<G: AuthGate + ?Sized> AuthGate for &G {
    fn current_user(&self) -> Session {
        (**self).current_user()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to access session file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("session file {path} is corrupt: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Session persisted between CLI invocations.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
    session: Session,
}

impl SessionStore {
    /// Load the stored session; a missing file means nobody is logged in.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SessionError> {
        let path = path.as_ref().to_path_buf();

        let session = match std::fs::read_to_string(&path) {
            Ok(content) => serde_yaml::from_str(&content).map_err(|source| SessionError::Corrupt {
                path: path.display().to_string(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No session file at {}", path.display());
                Session::LoggedOut
            }
            Err(source) => {
                return Err(SessionError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
        };

        Ok(Self { path, session })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn login(&mut self, user_id: i64, username: &str) -> Result<(), SessionError> {
        let session = Session::LoggedIn {
            user_id,
            username: username.to_string(),
        };
        self.persist(&session)?;
        info!("Logged in as {username} (user id {user_id})");
        self.session = session;
        Ok(())
    }

    pub fn logout(&mut self) -> Result<(), SessionError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(SessionError::Io {
                    path: self.path.display().to_string(),
                    source,
                })
            }
        }
        self.session = Session::LoggedOut;
        Ok(())
    }

    fn persist(&self, session: &Session) -> Result<(), SessionError> {
        let io_err = |source| SessionError::Io {
            path: self.path.display().to_string(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(io_err)?;
            }
        }

        let content = serde_yaml::to_string(session).map_err(|source| SessionError::Corrupt {
            path: self.path.display().to_string(),
            source,
        })?;
        std::fs::write(&self.path, content).map_err(io_err)
    }
}

impl AuthGate for SessionStore {
    fn current_user(&self) -> Session {
        self.session.clone()
    }
}

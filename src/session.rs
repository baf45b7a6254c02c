use crate::db::Database;
use crate::error::{ClientError, Operation};
use crate::gateway::Gateway;
use crate::models::{Role, Session};
use log::{info, warn};
use std::sync::Arc;
use tokio::sync::watch;

const TOKEN_KEY: &str = "token";
const ROLE_KEY: &str = "userRole";

/// Owns the authenticated session and its persisted copy.
///
/// Cloning is cheap; every clone shares the same state. Components that need
/// the token hold a receiver from [`SessionManager::subscribe`] instead of
/// reading storage themselves.
#[derive(Clone)]
pub struct SessionManager {
    db: Arc<Database>,
    state: Arc<watch::Sender<Option<Session>>>,
}

impl SessionManager {
    pub fn new(db: Arc<Database>) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            db,
            state: Arc::new(state),
        }
    }

    /// Loads the persisted session without asking the backend whether the
    /// token is still good. A half-written pair is treated as logged out and
    /// removed.
    pub fn restore(&self) -> Result<Option<Session>, ClientError> {
        let token = self.db.get_setting(TOKEN_KEY)?.filter(|t| !t.is_empty());
        let role = self.db.get_setting(ROLE_KEY)?.filter(|r| !r.is_empty());

        let session = match (token, role) {
            (Some(token), Some(role)) => Some(Session {
                token,
                role: Role::from_wire(&role),
            }),
            (None, None) => None,
            _ => {
                warn!("Discarding partially persisted session");
                self.db.delete_settings(&[TOKEN_KEY, ROLE_KEY])?;
                None
            }
        };

        if let Some(session) = &session {
            info!("Restored {} session", session.role);
        }
        self.state.send_replace(session.clone());
        Ok(session)
    }

    pub async fn login(
        &self,
        gateway: &Gateway,
        username: &str,
        password: &str,
    ) -> Result<Session, ClientError> {
        let resp = gateway.login(username, password).await.map_err(|e| {
            log::error!("Login failed: {}", e);
            if e.is_rejection() {
                ClientError::Auth(e)
            } else {
                ClientError::Fetch {
                    operation: Operation::Login,
                    source: e,
                }
            }
        })?;

        let session = Session {
            token: resp.access_token,
            role: Role::from_wire(&resp.role),
        };
        self.db.set_settings(&[
            (TOKEN_KEY, session.token.as_str()),
            (ROLE_KEY, session.role.as_str()),
        ])?;
        self.state.send_replace(Some(session.clone()));
        info!("Logged in as {} ({})", username, session.role);
        Ok(session)
    }

    /// Forgets the session locally. The backend is not told.
    pub fn logout(&self) -> Result<(), ClientError> {
        self.db.delete_settings(&[TOKEN_KEY, ROLE_KEY])?;
        self.state.send_replace(None);
        info!("Logged out");
        Ok(())
    }

    pub fn current(&self) -> Option<Session> {
        self.state.borrow().clone()
    }

    pub fn is_admin(&self) -> bool {
        self.state
            .borrow()
            .as_ref()
            .is_some_and(Session::is_admin)
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.state.subscribe()
    }
}

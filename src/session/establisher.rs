use std::sync::Arc;

use tower_cookies::Cookies;

use super::{Session, SessionFields, SessionResult, SessionStore, issue_cookie, remove_cookie};
use crate::{config::SessionConfig, models::IdentitySource, services::IdentityMapService};

/// Populates a session on login-type operations.
///
/// The order is fixed: regenerate the id, replace the state, persist, and
/// only then shadow-write identity map entries. A store failure fails the
/// whole operation; a shadow-write failure never does.
#[derive(Clone)]
pub struct SessionEstablisher {
    store: Arc<dyn SessionStore>,
    identity_map: Option<IdentityMapService>,
}

impl SessionEstablisher {
    pub fn new(store: Arc<dyn SessionStore>, identity_map: Option<IdentityMapService>) -> Self {
        Self {
            store,
            identity_map,
        }
    }

    /// Establish `fields` as the caller's session under a fresh id.
    ///
    /// If regenerating fails the handle is untouched. If saving fails the
    /// old id is already gone, so the handle is left anonymous.
    pub async fn establish(&self, session: &mut Session, fields: SessionFields) -> SessionResult<()> {
        let new_id = match self.store.regenerate(session.id.as_ref()).await {
            Ok(id) => id,
            Err(e) => {
                tracing::error!(error = %e, "Failed to regenerate session");
                return Err(e);
            }
        };

        *session = Session::anonymous();
        let state = fields.into_state();

        if let Err(e) = self.store.save(&new_id, &state).await {
            tracing::error!(error = %e, "Failed to save established session");
            return Err(e);
        }

        session.id = Some(new_id);
        session.state = state;
        tracing::debug!(
            user_id = ?session.state.user_id,
            vlt_affiliate_id = ?session.state.vlt_affiliate_id,
            "Session established"
        );

        if let Some(identity_map) = &self.identity_map {
            if let Some(user_id) = session.state.user_id {
                identity_map.spawn_pair(IdentitySource::User, user_id.to_string());
            }
            if let Some(affiliate_id) = session.state.vlt_affiliate_id {
                identity_map.spawn_pair(IdentitySource::VltAffiliate, affiliate_id.to_string());
            }
        }

        Ok(())
    }

    /// [`establish`](Self::establish), then hand the new id to the client.
    ///
    /// When saving fails after the old id was destroyed, the stale cookie is
    /// expired as well.
    pub async fn establish_with_cookie(
        &self,
        cookies: &Cookies,
        config: &SessionConfig,
        session: &mut Session,
        fields: SessionFields,
    ) -> SessionResult<()> {
        let had_session = session.id.is_some();

        if let Err(e) = self.establish(session, fields).await {
            if had_session && session.id.is_none() {
                remove_cookie(cookies, config);
            }
            return Err(e);
        }

        if let Some(id) = session.id {
            issue_cookie(cookies, config, id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicBool, Ordering},
        time::Duration,
    };

    use async_trait::async_trait;
    use tokio_util::task::TaskTracker;

    use super::*;
    use crate::{
        db::{IdentityMapRepo, memory::MemoryIdentityMapRepo},
        session::{MemorySessionStore, SessionError, SessionId, SessionState},
    };

    /// Memory store whose regenerate or save can be made to fail.
    struct FlakyStore {
        inner: MemorySessionStore,
        fail_regenerate: AtomicBool,
        fail_save: AtomicBool,
    }

    impl FlakyStore {
        fn new() -> Self {
            Self {
                inner: MemorySessionStore::new(Duration::from_secs(60)),
                fail_regenerate: AtomicBool::new(false),
                fail_save: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl SessionStore for FlakyStore {
        async fn load(&self, id: &SessionId) -> SessionResult<Option<SessionState>> {
            self.inner.load(id).await
        }

        async fn regenerate(&self, old: Option<&SessionId>) -> SessionResult<SessionId> {
            if self.fail_regenerate.load(Ordering::SeqCst) {
                return Err(SessionError::Store("redis unavailable".into()));
            }
            self.inner.regenerate(old).await
        }

        async fn save(&self, id: &SessionId, state: &SessionState) -> SessionResult<()> {
            if self.fail_save.load(Ordering::SeqCst) {
                return Err(SessionError::Store("write timed out".into()));
            }
            self.inner.save(id, state).await
        }

        async fn destroy(&self, id: &SessionId) -> SessionResult<()> {
            self.inner.destroy(id).await
        }
    }

    fn establisher_with_map() -> (
        SessionEstablisher,
        Arc<MemorySessionStore>,
        Arc<MemoryIdentityMapRepo>,
        TaskTracker,
    ) {
        let store = Arc::new(MemorySessionStore::new(Duration::from_secs(60)));
        let repo = Arc::new(MemoryIdentityMapRepo::new());
        let tracker = TaskTracker::new();
        let map = IdentityMapService::new(repo.clone(), tracker.clone());
        let establisher = SessionEstablisher::new(store.clone(), Some(map));
        (establisher, store, repo, tracker)
    }

    #[tokio::test]
    async fn test_establish_regenerates_and_persists() {
        let (establisher, store, _, _) = establisher_with_map();
        let old_id = store.regenerate(None).await.unwrap();
        let mut session = Session::new(Some(old_id), SessionState::default());

        establisher
            .establish(&mut session, SessionFields::user(5))
            .await
            .unwrap();

        let new_id = session.id.expect("session id");
        assert_ne!(new_id, old_id);
        assert_eq!(session.state.user_id, Some(5));

        let persisted = store.load(&new_id).await.unwrap().unwrap();
        assert_eq!(persisted.user_id, Some(5));
        assert!(store.load(&old_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_establish_without_prior_session() {
        let (establisher, _, _, _) = establisher_with_map();
        let mut session = Session::anonymous();

        establisher
            .establish(&mut session, SessionFields::user(8).with_role("admin"))
            .await
            .unwrap();

        assert!(session.id.is_some());
        assert_eq!(session.state.user_role.as_deref(), Some("admin"));
    }

    #[tokio::test]
    async fn test_establish_replaces_previous_state() {
        let (establisher, _, _, _) = establisher_with_map();
        let mut session = Session::anonymous();
        establisher
            .establish(
                &mut session,
                SessionFields::user(1).with_role("admin").with_mfa(true, false),
            )
            .await
            .unwrap();

        establisher
            .establish(&mut session, SessionFields::user(2))
            .await
            .unwrap();

        assert_eq!(session.state.user_id, Some(2));
        assert_eq!(session.state.user_role, None);
        assert_eq!(session.state.mfa_pending, None);
    }

    #[tokio::test]
    async fn test_shadow_writes_after_save() {
        let (establisher, _, repo, tracker) = establisher_with_map();
        let mut session = Session::anonymous();

        establisher
            .establish(
                &mut session,
                SessionFields::user(5).with_role("affiliate").with_affiliate(900),
            )
            .await
            .unwrap();

        tracker.close();
        tracker.wait().await;

        assert!(
            repo.get_identity_id(IdentitySource::User, "5")
                .await
                .unwrap()
                .is_some()
        );
        assert!(
            repo.get_identity_id(IdentitySource::VltAffiliate, "900")
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_regenerate_failure_propagates_and_keeps_handle() {
        let store = Arc::new(FlakyStore::new());
        let old_id = store.inner.regenerate(None).await.unwrap();
        store.fail_regenerate.store(true, Ordering::SeqCst);

        let establisher = SessionEstablisher::new(store.clone(), None);
        let mut session = Session::new(Some(old_id), SessionState::default());
        let before = session.clone();

        let result = establisher
            .establish(&mut session, SessionFields::user(5))
            .await;

        assert!(matches!(result, Err(SessionError::Store(_))));
        assert_eq!(session, before);
    }

    #[tokio::test]
    async fn test_save_failure_propagates_without_shadow_writes() {
        let store = Arc::new(FlakyStore::new());
        store.fail_save.store(true, Ordering::SeqCst);
        let repo = Arc::new(MemoryIdentityMapRepo::new());
        let tracker = TaskTracker::new();
        let map = IdentityMapService::new(repo.clone(), tracker.clone());
        let establisher = SessionEstablisher::new(store, Some(map));
        let mut session = Session::anonymous();

        let result = establisher
            .establish(&mut session, SessionFields::user(5))
            .await;

        assert!(matches!(result, Err(SessionError::Store(_))));
        assert!(session.id.is_none());
        assert!(session.state.is_empty());

        tracker.close();
        tracker.wait().await;
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn test_bookkeeping_disabled() {
        let store = Arc::new(MemorySessionStore::new(Duration::from_secs(60)));
        let establisher = SessionEstablisher::new(store, None);
        let mut session = Session::anonymous();

        establisher
            .establish(&mut session, SessionFields::user(5).with_affiliate(3))
            .await
            .unwrap();
        assert_eq!(session.state.vlt_affiliate_id, Some(3));
    }
}

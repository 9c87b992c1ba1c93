//! Broker session with a freshness window.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use screener_core::error::ProviderError;
use screener_core::traits::{Clock, SessionProvider};

/// Default session freshness window.
pub const DEFAULT_SESSION_TTL_SECS: i64 = 600;

/// Performs a login and returns a bearer token.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self) -> Result<String, ProviderError>;
}

/// An issued session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub issued_at: DateTime<Utc>,
}

/// Caches one session and renews it once it is older than the TTL.
///
/// Renewal holds the state lock across the login call, so concurrent
/// callers queue behind a single renewal and then reuse its token.
pub struct SessionManager<A> {
    authenticator: A,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    state: Mutex<Option<Session>>,
}

impl<A: Authenticator> SessionManager<A> {
    /// Create a manager with no session yet.
    pub fn new(authenticator: A, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            authenticator,
            clock,
            ttl,
            state: Mutex::new(None),
        }
    }

    fn is_fresh(&self, session: &Session) -> bool {
        self.clock.now() - session.issued_at < self.ttl
    }

    /// Return a fresh token, logging in first if needed.
    pub async fn ensure_fresh(&self) -> Result<String, ProviderError> {
        let mut state = self.state.lock().await;

        if let Some(session) = state.as_ref().filter(|s| self.is_fresh(s)) {
            debug!(issued_at = %session.issued_at, "Reusing session");
            return Ok(session.token.clone());
        }

        info!("Establishing broker session");
        let token = self.authenticator.authenticate().await?;
        let session = Session {
            token: token.clone(),
            issued_at: self.clock.now(),
        };
        *state = Some(session);
        info!("Broker session established");

        Ok(token)
    }

    /// Drop the cached session so the next call logs in again.
    pub async fn invalidate(&self) {
        *self.state.lock().await = None;
    }

    /// Currently cached session, fresh or not.
    pub async fn current(&self) -> Option<Session> {
        self.state.lock().await.clone()
    }
}

#[async_trait]
impl<A: Authenticator> SessionProvider for SessionManager<A> {
    async fn ensure_session(&self) -> Result<(), ProviderError> {
        self.ensure_fresh().await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use screener_core::traits::ManualClock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingAuth {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl Authenticator for CountingAuth {
        async fn authenticate(&self) -> Result<String, ProviderError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            if self.fail {
                return Err(ProviderError::Config("ANGEL_MPIN must be exactly 4 digits".into()));
            }
            Ok(format!("token-{}", n))
        }
    }

    fn manager(fail: bool) -> (SessionManager<CountingAuth>, Arc<ManualClock>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 5, 4, 0, 0).unwrap()));
        let auth = CountingAuth {
            calls: Arc::clone(&calls),
            fail,
        };
        let mgr = SessionManager::new(auth, clock.clone(), Duration::seconds(DEFAULT_SESSION_TTL_SECS));
        (mgr, clock, calls)
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_reused_within_ttl() {
        let (mgr, clock, calls) = manager(false);

        assert_eq!(mgr.ensure_fresh().await.unwrap(), "token-1");
        clock.advance(Duration::minutes(9));
        assert_eq!(mgr.ensure_fresh().await.unwrap(), "token-1");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_renewed_after_ttl() {
        let (mgr, clock, calls) = manager(false);

        mgr.ensure_session().await.unwrap();
        clock.advance(Duration::minutes(10));
        assert_eq!(mgr.ensure_fresh().await.unwrap(), "token-2");
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let session = mgr.current().await.unwrap();
        assert_eq!(session.issued_at, clock.now());
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_one_renewal() {
        let (mgr, _clock, calls) = manager(false);
        let mgr = Arc::new(mgr);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let mgr = Arc::clone(&mgr);
                tokio::spawn(async move { mgr.ensure_fresh().await })
            })
            .collect();

        for h in handles {
            assert_eq!(h.await.unwrap().unwrap(), "token-1");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_forces_login() {
        let (mgr, _clock, calls) = manager(false);

        mgr.ensure_fresh().await.unwrap();
        mgr.invalidate().await;
        assert_eq!(mgr.ensure_fresh().await.unwrap(), "token-2");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_login_leaves_no_session() {
        let (mgr, _clock, _calls) = manager(true);

        let err = mgr.ensure_session().await.unwrap_err();
        assert!(matches!(err, ProviderError::Config(_)));
        assert!(mgr.current().await.is_none());
    }
}

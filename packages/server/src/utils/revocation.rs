use chrono::Utc;
use dashmap::DashMap;

/// Process-wide set of revoked token IDs (`jti`).
///
/// One instance is created at startup, shared through `AppState` behind an
/// `Arc`, and consulted by the auth extractors on every authenticated request.
/// Entries remember the token's own expiry: once a token would have expired
/// anyway its entry is dead weight and is dropped on the next insert.
#[derive(Debug, Default)]
pub struct RevocationList {
    entries: DashMap<String, i64>,
}

impl RevocationList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Revoke `jti` until `expires_at` (unix seconds).
    pub fn revoke(&self, jti: &str, expires_at: i64) {
        self.purge_expired(Utc::now().timestamp());
        self.entries.insert(jti.to_owned(), expires_at);
    }

    pub fn is_revoked(&self, jti: &str) -> bool {
        self.entries.contains_key(jti)
    }

    /// Drop entries whose tokens expired before `now`.
    pub fn purge_expired(&self, now: i64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, expires_at| *expires_at >= now);
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget every revocation. Called on shutdown.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

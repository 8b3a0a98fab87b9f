// Caption session store - per (client, video) caption history
// Author: kelexine (https://github.com/kelexine)

use super::merge::merge;
use crate::config::SessionConfig;
use crate::utils::clock::SharedClock;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::time::Instant;
use tracing::debug;

/// Identifies one viewer watching one video
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub identity: String,
    pub video_url: String,
}

impl SessionKey {
    pub fn new(identity: impl Into<String>, video_url: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            video_url: video_url.into(),
        }
    }
}

#[derive(Debug, Clone)]
struct CaptionSession {
    text: String,
    last_update: Instant,
}

/// One applied `record` call, kept so a failed request can undo it
#[derive(Debug)]
pub struct CaptionWrite {
    /// Full, trimmed history after the write
    pub history: String,
    key: SessionKey,
    prior: Option<CaptionSession>,
    written: CaptionSession,
}

/// Accumulates de-duplicated caption history per viewer and video.
///
/// History idle for longer than the session TTL is discarded on the next
/// access. The number of sessions is bounded by `max_sessions`; at capacity
/// the stalest session is evicted before a new one is created. The bound is
/// soft under concurrent creation of new sessions.
#[derive(Debug)]
pub struct CaptionSessionStore {
    config: SessionConfig,
    sessions: DashMap<SessionKey, CaptionSession>,
    clock: SharedClock,
}

impl CaptionSessionStore {
    pub fn new(config: SessionConfig, clock: SharedClock) -> Self {
        Self {
            config,
            sessions: DashMap::new(),
            clock,
        }
    }

    /// Merge `fragment` into the history for `(identity, video_url)` and
    /// return the full, trimmed history.
    pub fn update(&self, identity: &str, video_url: &str, fragment: &str) -> String {
        self.record(identity, video_url, fragment).history
    }

    /// Like `update`, but also returns what the session held before so the
    /// write can be undone with `rollback`.
    ///
    /// The merge happens under the entry lock, so concurrent fragments for
    /// one session are applied in arrival order.
    pub fn record(&self, identity: &str, video_url: &str, fragment: &str) -> CaptionWrite {
        let key = SessionKey::new(identity, video_url);
        let now = self.clock.now();
        let ttl = self.config.ttl();

        if !self.sessions.contains_key(&key) && self.sessions.len() >= self.config.max_sessions {
            self.evict_stalest();
        }

        let (mut session, prior) = match self.sessions.entry(key.clone()) {
            Entry::Occupied(entry) => {
                let prior = entry.get().clone();
                (entry.into_ref(), Some(prior))
            }
            Entry::Vacant(entry) => (
                entry.insert(CaptionSession {
                    text: String::new(),
                    last_update: now,
                }),
                None,
            ),
        };

        if now.saturating_duration_since(session.last_update) > ttl {
            debug!("Caption session for {} expired, discarding history", identity);
            session.text.clear();
        }

        let fragment = fragment.trim();
        if !fragment.is_empty() {
            session.text = merge(&session.text, fragment);
            session.last_update = now;
        }

        CaptionWrite {
            history: session.text.trim().to_string(),
            key,
            prior,
            written: session.clone(),
        }
    }

    /// Undo `write` if the session still holds exactly what it wrote.
    ///
    /// A session that moved on since (a later fragment, a reset, an eviction)
    /// is left alone. Returns whether anything was restored.
    pub fn rollback(&self, write: CaptionWrite) -> bool {
        let CaptionWrite {
            key, prior, written, ..
        } = write;
        let unchanged = |session: &CaptionSession| {
            session.text == written.text && session.last_update == written.last_update
        };

        match prior {
            None => self.sessions.remove_if(&key, |_, session| unchanged(session)).is_some(),
            Some(prior) => match self.sessions.get_mut(&key) {
                Some(mut session) if unchanged(session.value()) => {
                    *session = prior;
                    true
                }
                _ => false,
            },
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drop sessions idle past the TTL. Returns the number removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let ttl = self.config.ttl();
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| now.saturating_duration_since(session.last_update) <= ttl);
        before.saturating_sub(self.sessions.len())
    }

    fn evict_stalest(&self) {
        let stalest = self
            .sessions
            .iter()
            .min_by_key(|entry| entry.value().last_update)
            .map(|entry| entry.key().clone());

        if let Some(key) = stalest {
            debug!("Session store at capacity, evicting {}:{}", key.identity, key.video_url);
            self.sessions.remove(&key);
        }
    }
}

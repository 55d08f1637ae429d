//! Search session orchestrator.
//!
//! One actor task per session owns the debounce timer, the in-flight guard,
//! and the per-session result cache. The presentation layer feeds raw input
//! through a [`SessionHandle`] and subscribes to [`SessionUpdate`]s; nothing
//! here is global, so tests instantiate isolated sessions freely.
//!
//! State machine: `Idle → Debouncing → InFlight → {Resolved | Failed} → Idle`.
//! At most one remote call is in flight at any time; a trigger that lands
//! while one is outstanding is deferred and replayed on completion, never
//! issued concurrently. A resolution whose query no longer matches the
//! current input is discarded silently.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::model::{GrantRecord, SearchResult};
use crate::remote::{RemoteResponse, RemoteSearch, SearchError};
use crate::search::cache::{CacheEntry, DEFAULT_CACHE_CAPACITY, ResultCache};
use crate::search::normalize::NormalizedQuery;
use crate::search::{local, merge};

/// Default quiet interval before a query is committed.
const DEFAULT_DEBOUNCE_MS: u64 = 800;

/// Tunables for one session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Debounce interval (deployments use 600–1200 ms).
    pub debounce: Duration,
    /// Bound on the per-session result cache.
    pub cache_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl SessionConfig {
    /// Load config from environment variables.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(val) = dotenvy::var("NOFOS_DEBOUNCE_MS")
            && let Ok(ms) = val.parse::<u64>()
        {
            cfg.debounce = Duration::from_millis(ms);
        }

        if let Ok(val) = dotenvy::var("NOFOS_CACHE_CAPACITY")
            && let Ok(cap) = val.parse::<usize>()
        {
            cfg.cache_capacity = cap;
        }

        cfg
    }
}

/// Updates produced for the presentation layer.
#[derive(Debug, Clone)]
pub enum SessionUpdate {
    /// The merged, ordered list to display.
    Results(Vec<GrantRecord>),
    /// Loading indicator for the debounce/in-flight window.
    Searching(bool),
    /// User-facing failure text; displayed results were cleared.
    Error(String),
}

enum SessionEvent {
    Input(String),
    Clear,
    Shutdown,
}

/// Input side of a session. Dropping the handle disposes the session task;
/// a dispatched network call is not aborted, but its resolution has nowhere
/// to land.
pub struct SessionHandle {
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl SessionHandle {
    /// Feed a raw input change (keystroke-level, un-normalized).
    pub fn input(&self, raw: &str) {
        let _ = self.events.send(SessionEvent::Input(raw.to_string()));
    }

    /// Clear the query field: cancels pending debounce work in O(1) and
    /// falls back to the default local listing.
    pub fn clear(&self) {
        let _ = self.events.send(SessionEvent::Clear);
    }

    pub fn shutdown(&self) {
        let _ = self.events.send(SessionEvent::Shutdown);
    }
}

/// Spawn a session over a read-only catalog snapshot and a remote client.
/// Returns the input handle and the update stream.
pub fn spawn(
    catalog: Arc<Vec<GrantRecord>>,
    remote: Arc<dyn RemoteSearch>,
    config: SessionConfig,
) -> (SessionHandle, mpsc::UnboundedReceiver<SessionUpdate>) {
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (update_tx, update_rx) = mpsc::unbounded_channel();
    let session = Session {
        catalog,
        remote,
        cache: ResultCache::new(config.cache_capacity),
        debounce: config.debounce,
        updates: update_tx,
        current: NormalizedQuery::new(""),
        committed: None,
        remote_results: None,
        deadline: None,
        in_flight: false,
        deferred: false,
        searching: false,
    };
    tokio::spawn(session.run(event_rx));
    (SessionHandle { events: event_tx }, update_rx)
}

type Completion = (NormalizedQuery, Result<RemoteResponse, SearchError>);

struct Session {
    catalog: Arc<Vec<GrantRecord>>,
    remote: Arc<dyn RemoteSearch>,
    cache: ResultCache,
    debounce: Duration,
    updates: mpsc::UnboundedSender<SessionUpdate>,

    /// Normalized form of the latest input.
    current: NormalizedQuery,
    /// Last query actually submitted to the remote service.
    committed: Option<NormalizedQuery>,
    /// Remote ranking currently applied to the display, if any.
    remote_results: Option<Vec<SearchResult>>,
    deadline: Option<Instant>,
    in_flight: bool,
    deferred: bool,
    /// Last loading-indicator state pushed to subscribers.
    searching: bool,
}

impl Session {
    async fn run(mut self, mut events: mpsc::UnboundedReceiver<SessionEvent>) {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Completion>();
        loop {
            // Instant is Copy; the sleeper must not borrow `self` so the
            // branch handlers below can take it mutably.
            let deadline = self.deadline;
            let sleeper = async move {
                match deadline {
                    Some(deadline) => tokio::time::sleep_until(deadline).await,
                    None => std::future::pending().await,
                }
            };
            tokio::select! {
                event = events.recv() => match event {
                    None | Some(SessionEvent::Shutdown) => break,
                    Some(SessionEvent::Clear) => self.handle_clear(),
                    Some(SessionEvent::Input(raw)) => self.handle_input(&raw),
                },
                _ = sleeper => self.handle_timer_fired(&done_tx),
                Some((query, result)) = done_rx.recv() => {
                    self.handle_completion(query, result, &done_tx);
                }
            }
        }
        debug!("search session shut down");
    }

    fn emit(&self, update: SessionUpdate) {
        let _ = self.updates.send(update);
    }

    /// The loading indicator covers the whole Debouncing → InFlight window;
    /// only changes are pushed.
    fn set_searching(&mut self, on: bool) {
        if self.searching != on {
            self.searching = on;
            self.emit(SessionUpdate::Searching(on));
        }
    }

    fn emit_local(&self, query: &NormalizedQuery) {
        let locals = local::filter(&self.catalog, query);
        self.emit(SessionUpdate::Results(merge::merge(&locals, None)));
    }

    fn handle_input(&mut self, raw: &str) {
        let query = NormalizedQuery::new(raw);
        if query == self.current {
            return;
        }
        if query.is_empty() {
            self.handle_clear();
            return;
        }

        // Backspacing out of a committed query abandons its remote ranking
        // immediately; stale results must not linger while the user shrinks
        // the query.
        let shrink = self.remote_results.is_some()
            && self
                .committed
                .as_ref()
                .is_some_and(|prev| query.is_prefix_shrink_of(prev));
        self.current = query.clone();
        if shrink {
            debug!(query = %query, "prefix shrink, dropping remote ranking");
            self.remote_results = None;
            self.committed = None;
            self.emit_local(&query);
            self.deadline = Some(Instant::now() + self.debounce);
            self.set_searching(true);
            return;
        }

        // Instant local feedback; an active remote ranking stays on screen
        // until a fresher resolution replaces it.
        if self.remote_results.is_none() {
            self.emit_local(&query);
        }

        if !query.meets_min_len() || self.committed.as_ref() == Some(&query) {
            self.deadline = None;
            if !self.in_flight {
                self.set_searching(false);
            }
            return;
        }
        self.deadline = Some(Instant::now() + self.debounce);
        self.set_searching(true);
    }

    fn handle_clear(&mut self) {
        self.current = NormalizedQuery::new("");
        self.committed = None;
        self.remote_results = None;
        self.deadline = None;
        self.deferred = false;
        self.set_searching(false);
        self.emit_local(&self.current);
    }

    fn handle_timer_fired(&mut self, done_tx: &mpsc::UnboundedSender<Completion>) {
        self.deadline = None;
        let query = self.current.clone();
        if !query.meets_min_len() || self.committed.as_ref() == Some(&query) {
            if !self.in_flight {
                self.set_searching(false);
            }
            return;
        }
        if self.in_flight {
            // Never issue a second call; replay this trigger on completion.
            self.deferred = true;
            return;
        }

        let locals = local::filter(&self.catalog, &query);
        if !locals.is_empty() && !query.looks_like_natural_language() {
            // Local matches are good enough for a name-style lookup; any
            // ranking left over from an earlier query comes down with it.
            if self.remote_results.take().is_some() {
                self.emit_local(&query);
            }
            self.set_searching(false);
            return;
        }

        if let Some(entry) = self.cache.get(&query) {
            debug!(query = %query, search_time_ms = entry.search_time_ms, "cache hit");
            let results = entry.results.clone();
            self.committed = Some(query);
            self.apply_remote(results);
            self.set_searching(false);
            return;
        }

        debug!(query = %query, "dispatching remote search");
        self.set_searching(true);
        self.committed = Some(query.clone());
        self.in_flight = true;
        let future = self.remote.search(&query);
        let done = done_tx.clone();
        tokio::spawn(async move {
            let result = future.await;
            let _ = done.send((query, result));
        });
    }

    fn handle_completion(
        &mut self,
        query: NormalizedQuery,
        result: Result<RemoteResponse, SearchError>,
        done_tx: &mpsc::UnboundedSender<Completion>,
    ) {
        self.in_flight = false;
        self.set_searching(false);

        if query != self.current {
            // Superseded while in flight. Not an error; just drop it.
            debug!(resolved = %query, current = %self.current, "discarding stale resolution");
        } else {
            match result {
                Ok(response) => {
                    if !response.suggested_questions.is_empty() {
                        debug!(
                            count = response.suggested_questions.len(),
                            "backend suggested follow-up questions"
                        );
                    }
                    self.cache.put(
                        query.clone(),
                        CacheEntry::new(response.results.clone(), response.search_time_ms),
                    );
                    self.apply_remote(response.results);
                }
                Err(err) => {
                    warn!(query = %query, error = %err, "remote search failed");
                    self.remote_results = None;
                    self.emit(SessionUpdate::Results(Vec::new()));
                    self.emit(SessionUpdate::Error(err.to_string()));
                }
            }
        }

        if self.deferred {
            self.deferred = false;
            self.handle_timer_fired(done_tx);
        }
    }

    /// Apply a fresh (or cached) remote ranking to the display. An empty
    /// result set is not an error; it falls back to the local ordering for
    /// the current query.
    fn apply_remote(&mut self, results: Vec<SearchResult>) {
        if results.is_empty() {
            self.remote_results = None;
            self.emit_local(&self.current);
            return;
        }
        // Remote relevance defines the candidate set over the whole catalog,
        // not just the substring matches.
        let merged = merge::merge(&self.catalog, Some(&results));
        self.remote_results = Some(results);
        self.emit(SessionUpdate::Results(merged));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_within_deployment_range() {
        let cfg = SessionConfig::default();
        assert!(cfg.debounce >= Duration::from_millis(600));
        assert!(cfg.debounce <= Duration::from_millis(1200));
        assert_eq!(cfg.cache_capacity, 5);
    }
}

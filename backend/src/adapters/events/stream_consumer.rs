//! StreamConsumer - background reader for inbound Redis streams.
//!
//! Reads entries through a consumer group and hands each one, wrapped in an
//! [`EventEnvelope`], to an [`EventHandler`]. One consumer serves one
//! stream: drift triggers and the observation feed each get their own.
//!
//! ## Entries
//!
//! The `payload` field holds the JSON message, which must name a
//! `user_id`. The envelope's event ID is taken from the configured ID field
//! of the payload (`drift_event_id` for drift triggers) and falls back to
//! the stream entry ID, so a redelivered entry keeps its identity.
//!
//! ## Delivery
//!
//! - An entry is acknowledged only after the handler returns `Ok`.
//! - Every pass first pages through this consumer's own pending entries
//!   (cursor `0`), then reads new ones (cursor `>`). A failed entry is
//!   therefore retried on the next pass, whether it failed before a crash
//!   or a moment ago.
//! - While any entry waits for a retry the new-entry read does not block,
//!   and the pass ends with a `retry_backoff` pause.
//! - An entry that fails `max_deliveries` times, or whose payload cannot be
//!   parsed, is copied to the dead-letter stream and acknowledged.
//!   Failure counts are kept in memory, so a restart grants fresh attempts.
//!
//! ## Ordering and concurrency
//!
//! Entries of one read are grouped by user. Each user's entries run in
//! stream order; different users run concurrently up to
//! `max_concurrent_users`. Once one of a user's entries is left pending,
//! the user is blocked for the rest of the pass: their later entries are
//! not handled and stay pending behind it, so the next pending read returns
//! them in stream order.
//!
//! ## Shutdown
//!
//! The loop watches a shutdown channel and exits after the in-flight batch
//! finishes.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use redis::aio::MultiplexedConnection;
use redis::streams::{StreamId, StreamReadOptions, StreamReadReply};
use redis::AsyncCommands;
use tokio::sync::watch;

use crate::domain::foundation::{DomainError, ErrorCode, EventEnvelope, EventId};
use crate::ports::EventHandler;

/// Event type given to envelopes built from drift trigger entries.
pub const DRIFT_DETECTED: &str = "drift.detected";

const PENDING_CURSOR: &str = "0";
const NEW_ENTRIES_CURSOR: &str = ">";

#[derive(Debug, Clone)]
pub struct StreamConsumerConfig {
    pub stream: String,
    /// Event type stamped on every envelope.
    pub event_type: String,
    /// Payload field holding the message's own identifier.
    pub id_field: String,
    pub group: String,
    pub consumer: String,

    /// Maximum entries fetched per read.
    pub batch_size: usize,

    /// How long a read blocks waiting for new entries.
    pub block: Duration,

    /// Pause after a failed read, or after a pass that left entries pending.
    pub retry_backoff: Duration,

    pub max_concurrent_users: usize,

    /// Handler attempts before an entry is dead-lettered.
    pub max_deliveries: u32,

    /// Stream receiving abandoned entries; `<stream>.dead` when unset.
    pub dead_letter_stream: Option<String>,
}

impl Default for StreamConsumerConfig {
    fn default() -> Self {
        Self {
            stream: "drift.events".to_string(),
            event_type: DRIFT_DETECTED.to_string(),
            id_field: "drift_event_id".to_string(),
            group: "profile-assignment".to_string(),
            consumer: "profile-assignment-1".to_string(),
            batch_size: 10,
            block: Duration::from_secs(5),
            retry_backoff: Duration::from_secs(2),
            max_concurrent_users: 16,
            max_deliveries: 5,
            dead_letter_stream: None,
        }
    }
}

impl StreamConsumerConfig {
    /// Drift trigger stream defaults.
    pub fn drift_triggers() -> Self {
        Self::default()
    }

    /// Observation feed defaults.
    pub fn observations(event_type: impl Into<String>) -> Self {
        Self {
            stream: "observation.events".to_string(),
            event_type: event_type.into(),
            id_field: "trigger_id".to_string(),
            ..Self::default()
        }
    }

    pub fn with_stream(mut self, stream: impl Into<String>) -> Self {
        self.stream = stream.into();
        self
    }

    pub fn with_group(mut self, group: impl Into<String>, consumer: impl Into<String>) -> Self {
        self.group = group.into();
        self.consumer = consumer.into();
        self
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    pub fn with_block(mut self, block: Duration) -> Self {
        self.block = block;
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    pub fn with_max_concurrent_users(mut self, limit: usize) -> Self {
        self.max_concurrent_users = limit.max(1);
        self
    }

    pub fn with_max_deliveries(mut self, attempts: u32) -> Self {
        self.max_deliveries = attempts.max(1);
        self
    }

    pub fn with_dead_letter_stream(mut self, stream: impl Into<String>) -> Self {
        self.dead_letter_stream = Some(stream.into());
        self
    }

    pub fn dead_letter_stream(&self) -> String {
        self.dead_letter_stream
            .clone()
            .unwrap_or_else(|| format!("{}.dead", self.stream))
    }
}

/// What one pass did with an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryAction {
    /// Handled; acknowledged.
    Ack,
    /// Failed; left pending for the next pass.
    Retry,
    /// Given up on; copied to the dead-letter stream and acknowledged.
    DeadLetter,
    /// Not handled because an earlier entry of the same user is pending.
    Defer,
}

/// Failure counts and per-pass user blocking.
#[derive(Debug)]
struct DeliveryTracker {
    max_deliveries: u32,
    failures: HashMap<String, u32>,
    /// Users with an entry left pending during the current pass.
    blocked: HashSet<String>,
}

impl DeliveryTracker {
    fn new(max_deliveries: u32) -> Self {
        Self {
            max_deliveries: max_deliveries.max(1),
            failures: HashMap::new(),
            blocked: HashSet::new(),
        }
    }

    fn begin_pass(&mut self) {
        self.blocked.clear();
    }

    fn is_blocked(&self, user_id: &str) -> bool {
        self.blocked.contains(user_id)
    }

    fn has_blocked(&self) -> bool {
        !self.blocked.is_empty()
    }

    /// Action for an entry whose handler just failed.
    fn on_failure(&self, entry_id: &str) -> EntryAction {
        let attempts = self.failures.get(entry_id).copied().unwrap_or(0) + 1;
        if attempts >= self.max_deliveries {
            EntryAction::DeadLetter
        } else {
            EntryAction::Retry
        }
    }

    fn record(&mut self, entry_id: &str, user_id: &str, action: EntryAction) {
        match action {
            EntryAction::Ack | EntryAction::DeadLetter => {
                self.failures.remove(entry_id);
            }
            EntryAction::Retry => {
                *self.failures.entry(entry_id.to_string()).or_default() += 1;
                self.blocked.insert(user_id.to_string());
            }
            EntryAction::Defer => {
                self.blocked.insert(user_id.to_string());
            }
        }
    }

    /// Blocking time for the next new-entry read.
    fn new_entries_block(&self, block: Duration) -> Option<Duration> {
        if self.has_blocked() {
            None
        } else {
            Some(block)
        }
    }
}

/// Cursor of the next page of pending entries, or `None` once a short page
/// shows the pending list is exhausted.
fn next_pending_cursor(page: &[StreamId], batch_size: usize) -> Option<String> {
    if page.len() < batch_size {
        return None;
    }
    page.last().map(|entry| entry.id.clone())
}

/// Builds the envelope for one stream entry. `None` means the entry is
/// malformed and should be discarded.
fn envelope_from_entry(entry: &StreamId, config: &StreamConsumerConfig) -> Option<EventEnvelope> {
    let raw: String = entry.get("payload")?;
    let payload: serde_json::Value = serde_json::from_str(&raw).ok()?;
    let user_id = payload
        .get("user_id")
        .and_then(|v| v.as_str())
        .filter(|id| !id.trim().is_empty())?
        .to_string();
    let message_id = match payload.get(&config.id_field) {
        None | Some(serde_json::Value::Null) => entry.id.clone(),
        Some(value) => value
            .as_str()
            .filter(|id| !id.trim().is_empty())?
            .to_string(),
    };

    Some(
        EventEnvelope::new(config.event_type.clone(), user_id.clone(), "User", payload)
            .with_event_id(EventId::from_string(message_id.clone()))
            .with_correlation_id(message_id)
            .with_user_id(user_id),
    )
}

/// Groups entries per user, keeping stream order within each group.
fn group_by_user(entries: Vec<(String, EventEnvelope)>) -> Vec<Vec<(String, EventEnvelope)>> {
    let mut groups: BTreeMap<String, Vec<(String, EventEnvelope)>> = BTreeMap::new();
    for (entry_id, envelope) in entries {
        groups
            .entry(envelope.aggregate_id.clone())
            .or_default()
            .push((entry_id, envelope));
    }
    groups.into_values().collect()
}

pub struct StreamConsumer {
    conn: MultiplexedConnection,
    handler: Arc<dyn EventHandler>,
    config: StreamConsumerConfig,
}

impl StreamConsumer {
    pub fn new(
        conn: MultiplexedConnection,
        handler: Arc<dyn EventHandler>,
        config: StreamConsumerConfig,
    ) -> Self {
        Self {
            conn,
            handler,
            config,
        }
    }

    /// Run until the shutdown channel flips to `true` or its sender is
    /// dropped.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), DomainError> {
        self.ensure_group().await?;
        tracing::info!(
            stream = %self.config.stream,
            group = %self.config.group,
            consumer = %self.config.consumer,
            event_type = %self.config.event_type,
            max_deliveries = self.config.max_deliveries,
            dead_letter_stream = %self.config.dead_letter_stream(),
            "stream consumer started"
        );

        let mut tracker = DeliveryTracker::new(self.config.max_deliveries);
        loop {
            if *shutdown.borrow() {
                break;
            }
            tracker.begin_pass();

            if let Err(e) = self.drain_pending(&mut tracker).await {
                tracing::error!(stream = %self.config.stream, error = %e, "pending read failed");
                if self.back_off(&mut shutdown).await {
                    break;
                }
                continue;
            }

            let block = tracker.new_entries_block(self.config.block);
            let read = tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
                read = self.read_batch(NEW_ENTRIES_CURSOR, block) => read,
            };
            match read {
                Ok(entries) if entries.is_empty() => {}
                Ok(entries) => self.process(entries, &mut tracker).await,
                Err(e) => {
                    tracing::error!(stream = %self.config.stream, error = %e, "stream read failed");
                    if self.back_off(&mut shutdown).await {
                        break;
                    }
                    continue;
                }
            }

            if tracker.has_blocked() && self.back_off(&mut shutdown).await {
                break;
            }
        }

        tracing::info!(stream = %self.config.stream, "stream consumer stopping");
        Ok(())
    }

    /// Sleeps for the retry backoff. Returns `true` if shutdown was
    /// requested meanwhile.
    async fn back_off(&self, shutdown: &mut watch::Receiver<bool>) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(self.config.retry_backoff) => false,
            changed = shutdown.changed() => changed.is_err() || *shutdown.borrow(),
        }
    }

    async fn ensure_group(&self) -> Result<(), DomainError> {
        let mut conn = self.conn.clone();
        let created: redis::RedisResult<()> = conn
            .xgroup_create_mkstream(&self.config.stream, &self.config.group, "0")
            .await;
        match created {
            Ok(()) => {
                tracing::info!(group = %self.config.group, "created consumer group");
                Ok(())
            }
            Err(e) if e.code() == Some("BUSYGROUP") => Ok(()),
            Err(e) => Err(DomainError::new(
                ErrorCode::CacheError,
                format!("Failed to create consumer group: {}", e),
            )),
        }
    }

    /// Pages through every entry delivered to this consumer but not yet
    /// acknowledged, oldest first.
    async fn drain_pending(&self, tracker: &mut DeliveryTracker) -> Result<(), DomainError> {
        let mut cursor = PENDING_CURSOR.to_string();
        loop {
            let page = self.read_batch(&cursor, None).await?;
            let next = next_pending_cursor(&page, self.config.batch_size);
            if !page.is_empty() {
                self.process(page, tracker).await;
            }
            match next {
                Some(id) => cursor = id,
                None => return Ok(()),
            }
        }
    }

    async fn read_batch(
        &self,
        cursor: &str,
        block: Option<Duration>,
    ) -> Result<Vec<StreamId>, DomainError> {
        let mut options = StreamReadOptions::default()
            .group(&self.config.group, &self.config.consumer)
            .count(self.config.batch_size);
        if let Some(block) = block {
            options = options.block(block.as_millis() as usize);
        }

        let mut conn = self.conn.clone();
        let reply: StreamReadReply = conn
            .xread_options(&[&self.config.stream], &[cursor], &options)
            .await
            .map_err(|e: redis::RedisError| {
                DomainError::new(ErrorCode::CacheError, format!("Failed to read stream: {}", e))
            })?;

        Ok(reply.keys.into_iter().flat_map(|key| key.ids).collect())
    }

    /// Handles one read worth of entries and records the outcome of each.
    async fn process(&self, entries: Vec<StreamId>, tracker: &mut DeliveryTracker) {
        let mut valid = Vec::with_capacity(entries.len());
        for entry in entries {
            match envelope_from_entry(&entry, &self.config) {
                Some(envelope) => valid.push((entry.id, envelope)),
                None => {
                    tracing::error!(
                        stream = %self.config.stream,
                        entry_id = %entry.id,
                        "discarding malformed entry"
                    );
                    let raw: String = entry.get("payload").unwrap_or_default();
                    self.dead_letter(&entry.id, &raw, "malformed entry").await;
                }
            }
        }

        let limit = self.config.max_concurrent_users;
        let view: &DeliveryTracker = tracker;
        let outcomes = stream::iter(group_by_user(valid))
            .map(|entries| self.process_user(entries, view))
            .buffer_unordered(limit)
            .collect::<Vec<_>>()
            .await;

        let (mut acked, mut retried, mut dead, mut deferred) = (0, 0, 0, 0);
        for (entry_id, user_id, action) in outcomes.into_iter().flatten() {
            match action {
                EntryAction::Ack => acked += 1,
                EntryAction::Retry => retried += 1,
                EntryAction::DeadLetter => dead += 1,
                EntryAction::Defer => deferred += 1,
            }
            tracker.record(&entry_id, &user_id, action);
        }
        tracing::debug!(
            stream = %self.config.stream,
            acked,
            retried,
            dead_lettered = dead,
            deferred,
            "stream batch processed"
        );
    }

    async fn process_user(
        &self,
        entries: Vec<(String, EventEnvelope)>,
        tracker: &DeliveryTracker,
    ) -> Vec<(String, String, EntryAction)> {
        let mut outcomes = Vec::with_capacity(entries.len());
        let mut halted = false;
        for (entry_id, envelope) in entries {
            let user_id = envelope.aggregate_id.clone();
            if halted || tracker.is_blocked(&user_id) {
                outcomes.push((entry_id, user_id, EntryAction::Defer));
                continue;
            }

            let payload = envelope.payload.to_string();
            let action = match self.handler.handle(envelope).await {
                Ok(()) => {
                    self.ack(&entry_id).await;
                    EntryAction::Ack
                }
                Err(e) => {
                    let given_up = tracker.on_failure(&entry_id) == EntryAction::DeadLetter
                        && self.dead_letter(&entry_id, &payload, &e.to_string()).await;
                    if given_up {
                        EntryAction::DeadLetter
                    } else {
                        tracing::warn!(
                            entry_id = %entry_id,
                            user_id = %user_id,
                            error = %e,
                            "entry failed; left pending"
                        );
                        EntryAction::Retry
                    }
                }
            };
            halted = action == EntryAction::Retry;
            outcomes.push((entry_id, user_id, action));
        }
        outcomes
    }

    /// Copies an entry to the dead-letter stream, then acknowledges it.
    /// Returns `false` if the entry is still pending.
    async fn dead_letter(&self, entry_id: &str, payload: &str, reason: &str) -> bool {
        let stream = self.config.dead_letter_stream();
        let fields = [
            ("payload", payload.to_string()),
            ("source_stream", self.config.stream.clone()),
            ("entry_id", entry_id.to_string()),
            ("reason", reason.to_string()),
        ];
        let mut conn = self.conn.clone();
        let added: redis::RedisResult<String> = conn.xadd(&stream, "*", &fields).await;
        match added {
            Ok(_) => {
                tracing::warn!(entry_id, dead_letter_stream = %stream, reason, "entry dead-lettered");
                self.ack(entry_id).await
            }
            Err(e) => {
                tracing::error!(entry_id, error = %e, "failed to dead-letter entry");
                false
            }
        }
    }

    async fn ack(&self, entry_id: &str) -> bool {
        let mut conn = self.conn.clone();
        let result: redis::RedisResult<i64> = conn
            .xack(&self.config.stream, &self.config.group, &[entry_id])
            .await;
        match result {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(entry_id, error = %e, "failed to acknowledge entry");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn entry(id: &str, payload: &str) -> StreamId {
        let mut map = HashMap::new();
        map.insert(
            "payload".to_string(),
            redis::Value::Data(payload.as_bytes().to_vec()),
        );
        StreamId {
            id: id.to_string(),
            map,
        }
    }

    #[test]
    fn trigger_entry_becomes_envelope_keyed_by_drift_id() {
        let e = entry(
            "1-0",
            r#"{"drift_event_id":"drift-7","user_id":"u1","severity":"STRONG"}"#,
        );
        let envelope = envelope_from_entry(&e, &StreamConsumerConfig::drift_triggers()).unwrap();

        assert_eq!(envelope.event_type, DRIFT_DETECTED);
        assert_eq!(envelope.event_id.as_str(), "drift-7");
        assert_eq!(envelope.aggregate_id, "u1");
        assert_eq!(envelope.payload["severity"], "STRONG");
    }

    #[test]
    fn malformed_entries_are_rejected() {
        let config = StreamConsumerConfig::drift_triggers();
        assert!(envelope_from_entry(&entry("1-0", "not json"), &config).is_none());
        assert!(envelope_from_entry(&entry("1-1", r#"{"severity":"STRONG"}"#), &config).is_none());
        assert!(envelope_from_entry(
            &entry(
                "1-2",
                r#"{"drift_event_id":"d","user_id":"  ","severity":"STRONG"}"#
            ),
            &config
        )
        .is_none());
        assert!(envelope_from_entry(
            &entry("1-4", r#"{"drift_event_id":42,"user_id":"u1","severity":"STRONG"}"#),
            &config
        )
        .is_none());

        let missing = StreamId {
            id: "1-3".to_string(),
            map: HashMap::new(),
        };
        assert!(envelope_from_entry(&missing, &config).is_none());
    }

    #[test]
    fn observation_without_trigger_id_is_keyed_by_entry_id() {
        let config = StreamConsumerConfig::observations("observation.received");
        let e = entry(
            "1700000000000-3",
            r#"{"user_id":"u9","observation":{"behavior_level":"BASIC"}}"#,
        );

        let envelope = envelope_from_entry(&e, &config).unwrap();

        assert_eq!(envelope.event_type, "observation.received");
        assert_eq!(envelope.event_id.as_str(), "1700000000000-3");
        assert_eq!(envelope.metadata.user_id.as_deref(), Some("u9"));
    }

    #[test]
    fn grouping_keeps_per_user_order() {
        let make = |entry_id: &str, drift: &str, user: &str| {
            let e = entry(
                entry_id,
                &format!(
                    r#"{{"drift_event_id":"{}","user_id":"{}","severity":"MODERATE"}}"#,
                    drift, user
                ),
            );
            (
                entry_id.to_string(),
                envelope_from_entry(&e, &StreamConsumerConfig::drift_triggers()).unwrap(),
            )
        };

        let groups = group_by_user(vec![
            make("1-0", "a", "u2"),
            make("1-1", "b", "u1"),
            make("1-2", "c", "u2"),
        ]);

        assert_eq!(groups.len(), 2);
        let u2: Vec<_> = groups[1].iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(u2, vec!["1-0", "1-2"]);
    }

    fn ids(n: usize) -> Vec<StreamId> {
        (0..n)
            .map(|i| StreamId {
                id: format!("1-{}", i),
                map: HashMap::new(),
            })
            .collect()
    }

    #[test]
    fn failing_entry_is_retried_then_dead_lettered() {
        let mut tracker = DeliveryTracker::new(3);

        for _ in 0..2 {
            assert_eq!(tracker.on_failure("1-0"), EntryAction::Retry);
            tracker.record("1-0", "u1", EntryAction::Retry);
        }
        assert_eq!(tracker.on_failure("1-0"), EntryAction::DeadLetter);

        tracker.record("1-0", "u1", EntryAction::DeadLetter);
        assert_eq!(tracker.on_failure("1-0"), EntryAction::Retry);
    }

    #[test]
    fn single_delivery_dead_letters_on_first_failure() {
        let tracker = DeliveryTracker::new(0);
        assert_eq!(tracker.on_failure("1-0"), EntryAction::DeadLetter);
    }

    #[test]
    fn retried_entry_blocks_its_user_for_the_pass() {
        let mut tracker = DeliveryTracker::new(5);
        tracker.record("1-0", "u1", EntryAction::Retry);
        tracker.record("1-1", "u2", EntryAction::Ack);

        assert!(tracker.is_blocked("u1"));
        assert!(!tracker.is_blocked("u2"));
        assert_eq!(tracker.new_entries_block(Duration::from_secs(5)), None);

        tracker.begin_pass();
        assert!(!tracker.is_blocked("u1"));
        assert_eq!(
            tracker.new_entries_block(Duration::from_secs(5)),
            Some(Duration::from_secs(5))
        );
        // The failure count survives the new pass.
        tracker.record("1-0", "u1", EntryAction::Retry);
        assert_eq!(tracker.failures.get("1-0"), Some(&2));
    }

    #[test]
    fn deferred_entries_keep_user_blocked() {
        let mut tracker = DeliveryTracker::new(5);
        tracker.record("1-3", "u1", EntryAction::Defer);
        assert!(tracker.is_blocked("u1"));
        assert!(tracker.failures.is_empty());
    }

    #[test]
    fn dead_letter_and_ack_leave_user_unblocked() {
        let mut tracker = DeliveryTracker::new(1);
        tracker.record("1-0", "u1", EntryAction::DeadLetter);
        tracker.record("1-1", "u2", EntryAction::Ack);
        assert!(!tracker.has_blocked());
    }

    #[test]
    fn pending_pages_continue_until_short_page() {
        assert_eq!(next_pending_cursor(&ids(3), 3).as_deref(), Some("1-2"));
        assert_eq!(next_pending_cursor(&ids(2), 3), None);
        assert_eq!(next_pending_cursor(&[], 3), None);
    }

    #[test]
    fn dead_letter_stream_defaults_to_source_stream() {
        let config = StreamConsumerConfig::drift_triggers().with_stream("drift.v2");
        assert_eq!(config.dead_letter_stream(), "drift.v2.dead");

        let config = config.with_dead_letter_stream("poison").with_max_deliveries(0);
        assert_eq!(config.dead_letter_stream(), "poison");
        assert_eq!(config.max_deliveries, 1);
    }
}

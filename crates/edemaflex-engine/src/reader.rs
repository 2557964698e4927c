//! Characteristic I/O serializer.
//!
//! The glove board tolerates only one GATT read at a time and needs a gap
//! between reads. This module owns the pending-read queue: the polling
//! timer enqueues the six segment channels, a single drain task pops them
//! in order with a fixed delay, and a busy flag guarantees no second
//! drain ever starts while one is active.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use edemaflex_core::types::CharacteristicKey;

use crate::engine::{publish_telemetry, read_value, report_error, session_active, EngineInner};

/// Gap between consecutive characteristic reads, to respect the board's
/// rate limit.
pub(crate) const READ_GAP: Duration = Duration::from_millis(50);

/// Pending-read queue plus the single-drain busy flag.
pub(crate) struct TelemetryReader {
    queue: Mutex<VecDeque<CharacteristicKey>>,
    busy: AtomicBool,
}

impl TelemetryReader {
    pub(crate) fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            busy: AtomicBool::new(false),
        }
    }

    /// Drop every pending read. Called whenever the session leaves the
    /// running state.
    pub(crate) fn clear(&self) {
        self.lock_queue().clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.lock_queue().len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.lock_queue().is_empty()
    }

    fn pop(&self) -> Option<CharacteristicKey> {
        self.lock_queue().pop_front()
    }

    fn push_segments(&self) {
        let mut queue = self.lock_queue();
        queue.extend(CharacteristicKey::SEGMENTS);
    }

    /// Claim the drain. Returns false when one is already active.
    fn try_begin(&self) -> bool {
        self.busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    fn end(&self) {
        self.busy.store(false, Ordering::SeqCst);
    }

    fn lock_queue(&self) -> std::sync::MutexGuard<'_, VecDeque<CharacteristicKey>> {
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Append the six segment channels to the queue and start a drain unless
/// one is already running. Suppressed (and the queue cleared) when the
/// session is no longer the live running one.
pub(crate) fn enqueue_segments(inner: &Arc<EngineInner>, gen: u64) {
    if !session_active(inner, gen) {
        inner.reader.clear();
        return;
    }
    inner.reader.push_segments();
    if inner.reader.try_begin() {
        tokio::spawn(drain(Arc::clone(inner), gen));
    }
}

/// Pop-and-read until the queue is empty or the session stops. A failed
/// read is reported and the drain moves on to the next key; only losing
/// the running state aborts the rest of the queue.
async fn drain(inner: Arc<EngineInner>, gen: u64) {
    loop {
        loop {
            if !session_active(&inner, gen) {
                inner.reader.clear();
                break;
            }
            let Some(key) = inner.reader.pop() else {
                break;
            };
            match read_value(&inner, key).await {
                Ok(value) => publish_telemetry(&inner, key, value),
                Err(e) => report_error(&inner, format!("Error reading {key}: {e}")),
            }
            tokio::time::sleep(READ_GAP).await;
        }
        inner.reader.end();

        // An enqueue may have appended between the last pop and the busy
        // reset; reclaim the drain rather than dropping those keys.
        if !session_active(&inner, gen) || inner.reader.is_empty() || !inner.reader.try_begin() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_preserves_enqueue_order() {
        let reader = TelemetryReader::new();
        reader.push_segments();
        assert_eq!(reader.len(), 6);

        let order: Vec<CharacteristicKey> = std::iter::from_fn(|| reader.pop()).collect();
        assert_eq!(order, CharacteristicKey::SEGMENTS.to_vec());
    }

    #[test]
    fn test_clear_empties_queue() {
        let reader = TelemetryReader::new();
        reader.push_segments();
        reader.push_segments();
        assert_eq!(reader.len(), 12);
        reader.clear();
        assert_eq!(reader.len(), 0);
        assert_eq!(reader.pop(), None);
    }

    #[test]
    fn test_busy_flag_single_claim() {
        let reader = TelemetryReader::new();
        assert!(reader.try_begin());
        assert!(!reader.try_begin());
        reader.end();
        assert!(reader.try_begin());
    }
}

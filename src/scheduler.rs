use std::cell::RefCell;

pub type SubscriptionId = u64;

/// A callback fired once with the timestamp of the refresh, in milliseconds.
pub type FrameCallback = Box<dyn FnOnce(f64)>;

/// Delivers tick callbacks at display-refresh cadence.
///
/// Subscriptions are one-shot: a callback fires on the next refresh and is
/// gone; whoever wants the refresh after that subscribes again. Callbacks
/// run in subscribe order. Timestamps are monotonically increasing but the
/// cadence is whatever the host provides — consumers must be correct under
/// irregular deltas.
pub trait RefreshScheduler {
    fn subscribe(&self, callback: FrameCallback) -> SubscriptionId;

    /// Cancel a pending subscription. Unknown or already-fired ids are
    /// ignored.
    fn unsubscribe(&self, id: SubscriptionId);
}

/// Manually pumped scheduler.
///
/// The terminal player calls [`StepScheduler::fire`] once per paced frame
/// with an `Instant`-derived timestamp; tests call it with hand-picked ones.
/// Callbacks subscribed while a refresh is running are deferred to the next
/// refresh, requestAnimationFrame-style.
pub struct StepScheduler {
    inner: RefCell<StepInner>,
}

struct StepInner {
    next_id: SubscriptionId,
    pending: Vec<(SubscriptionId, FrameCallback)>,
}

impl StepScheduler {
    pub fn new() -> Self {
        StepScheduler {
            inner: RefCell::new(StepInner {
                next_id: 0,
                pending: Vec::new(),
            }),
        }
    }

    /// Run every pending callback with `timestamp_ms`, in subscribe order.
    /// Returns how many ran. The batch is taken out first, so callbacks may
    /// freely subscribe (for the next refresh) or unsubscribe while firing.
    pub fn fire(&self, timestamp_ms: f64) -> usize {
        let batch = std::mem::take(&mut self.inner.borrow_mut().pending);
        let count = batch.len();
        for (_, callback) in batch {
            callback(timestamp_ms);
        }
        count
    }
}

impl Default for StepScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshScheduler for StepScheduler {
    fn subscribe(&self, callback: FrameCallback) -> SubscriptionId {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.pending.push((id, callback));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.inner
            .borrow_mut()
            .pending
            .retain(|(pending_id, _)| *pending_id != id);
    }
}

use std::cell::RefCell;
use std::rc::Rc;

use crate::animations::AnimatedObject;
use crate::scheduler::{RefreshScheduler, SubscriptionId};

/// Drives an [`AnimatedObject`] once per display refresh.
///
/// The loop starts on construction: it subscribes to the scheduler, and on
/// every tick computes the elapsed milliseconds since the previous tick
/// (zero on the first, there is nothing to measure against), updates the
/// animated object, then re-subscribes for the next refresh. It keeps going
/// until [`FrameLoop::stop`] — or drop, which stops it too.
pub struct FrameLoop {
    scheduler: Rc<dyn RefreshScheduler>,
    inner: Rc<RefCell<LoopInner>>,
}

struct LoopInner {
    animated: Box<dyn AnimatedObject>,
    previous_ms: Option<f64>,
    pending: Option<SubscriptionId>,
    stopped: bool,
}

impl FrameLoop {
    pub fn new(scheduler: Rc<dyn RefreshScheduler>, animated: Box<dyn AnimatedObject>) -> Self {
        let inner = Rc::new(RefCell::new(LoopInner {
            animated,
            previous_ms: None,
            pending: None,
            stopped: false,
        }));
        let frame_loop = FrameLoop { scheduler, inner };
        Self::schedule(&frame_loop.scheduler, &frame_loop.inner);
        frame_loop
    }

    fn schedule(scheduler: &Rc<dyn RefreshScheduler>, inner: &Rc<RefCell<LoopInner>>) {
        let cb_scheduler = Rc::clone(scheduler);
        let cb_inner = Rc::clone(inner);
        let id = scheduler.subscribe(Box::new(move |now_ms| {
            Self::tick(&cb_scheduler, &cb_inner, now_ms);
        }));
        inner.borrow_mut().pending = Some(id);
    }

    fn tick(scheduler: &Rc<dyn RefreshScheduler>, inner: &Rc<RefCell<LoopInner>>, now_ms: f64) {
        {
            let mut state = inner.borrow_mut();
            // The scheduler may have handed this callback out in the same
            // batch a stop() happened in; the flag makes it a no-op.
            if state.stopped {
                return;
            }
            state.pending = None;
            let delta_ms = state.previous_ms.map_or(0.0, |prev| now_ms - prev);
            state.previous_ms = Some(now_ms);
            state.animated.update(delta_ms);
        }
        Self::schedule(scheduler, inner);
    }

    /// Unsubscribe from the scheduler. Idempotent; after this no further
    /// `update` call happens even if the scheduler fires again.
    pub fn stop(&self) {
        let pending = {
            let mut state = self.inner.borrow_mut();
            state.stopped = true;
            state.pending.take()
        };
        if let Some(id) = pending {
            self.scheduler.unsubscribe(id);
        }
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::StepScheduler;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records every delta handed to `update`.
    struct Recorder {
        deltas: Rc<RefCell<Vec<f64>>>,
    }

    impl AnimatedObject for Recorder {
        fn update(&mut self, delta_ms: f64) {
            self.deltas.borrow_mut().push(delta_ms);
        }
    }

    fn recorder() -> (Recorder, Rc<RefCell<Vec<f64>>>) {
        let deltas = Rc::new(RefCell::new(Vec::new()));
        (
            Recorder {
                deltas: Rc::clone(&deltas),
            },
            deltas,
        )
    }

    #[test]
    fn test_first_tick_reports_zero_delta() {
        let scheduler = Rc::new(StepScheduler::new());
        let (rec, deltas) = recorder();
        let frame_loop = FrameLoop::new(scheduler.clone(), Box::new(rec));

        scheduler.fire(1000.0);
        assert_eq!(*deltas.borrow(), vec![0.0]);
        frame_loop.stop();
    }

    #[test]
    fn test_second_tick_reports_elapsed_time() {
        let scheduler = Rc::new(StepScheduler::new());
        let (rec, deltas) = recorder();
        let frame_loop = FrameLoop::new(scheduler.clone(), Box::new(rec));

        scheduler.fire(1000.0);
        scheduler.fire(1016.7);
        scheduler.fire(1050.0);
        let seen = deltas.borrow();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0], 0.0);
        assert!((seen[1] - 16.7).abs() < 1e-9);
        assert!((seen[2] - 33.3).abs() < 1e-9);
        drop(seen);
        frame_loop.stop();
    }

    #[test]
    fn test_loop_resubscribes_every_tick() {
        let scheduler = Rc::new(StepScheduler::new());
        let (rec, deltas) = recorder();
        let frame_loop = FrameLoop::new(scheduler.clone(), Box::new(rec));

        for t in [10.0, 20.0, 30.0, 40.0] {
            assert_eq!(scheduler.fire(t), 1);
        }
        assert_eq!(deltas.borrow().len(), 4);
        frame_loop.stop();
    }

    #[test]
    fn test_stop_halts_updates_even_if_scheduler_fires() {
        let scheduler = Rc::new(StepScheduler::new());
        let (rec, deltas) = recorder();
        let frame_loop = FrameLoop::new(scheduler.clone(), Box::new(rec));

        scheduler.fire(10.0);
        assert_eq!(deltas.borrow().len(), 1);

        frame_loop.stop();
        scheduler.fire(20.0);
        scheduler.fire(30.0);
        assert_eq!(deltas.borrow().len(), 1);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let scheduler = Rc::new(StepScheduler::new());
        let (rec, _deltas) = recorder();
        let frame_loop = FrameLoop::new(scheduler.clone(), Box::new(rec));

        frame_loop.stop();
        frame_loop.stop();
        frame_loop.stop();
        assert_eq!(scheduler.fire(0.0), 0);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let scheduler = Rc::new(StepScheduler::new());
        let (rec, deltas) = recorder();
        let frame_loop = FrameLoop::new(scheduler.clone(), Box::new(rec));

        drop(frame_loop);
        scheduler.fire(10.0);
        assert!(deltas.borrow().is_empty());
    }

    #[test]
    fn test_two_loops_share_one_scheduler() {
        let scheduler = Rc::new(StepScheduler::new());
        let (rec_a, deltas_a) = recorder();
        let (rec_b, deltas_b) = recorder();
        let loop_a = FrameLoop::new(scheduler.clone(), Box::new(rec_a));
        let loop_b = FrameLoop::new(scheduler.clone(), Box::new(rec_b));

        scheduler.fire(5.0);
        assert_eq!(deltas_a.borrow().len(), 1);
        assert_eq!(deltas_b.borrow().len(), 1);

        loop_a.stop();
        scheduler.fire(10.0);
        assert_eq!(deltas_a.borrow().len(), 1);
        assert_eq!(deltas_b.borrow().len(), 2);
        loop_b.stop();
    }
}

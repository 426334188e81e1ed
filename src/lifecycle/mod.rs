//! Scene lifecycle management
//!
//! Every visual component repeats the same pattern: debounce resize events
//! into one callback per frame, run an update loop, and release GPU
//! resources exactly once on teardown. [`SceneLifecycle`] factors that
//! pattern out. Each component constructs and owns its own instance; the
//! manager is deliberately not shared, so one component's teardown can never
//! destroy another's resources.

mod resources;
mod scene;

pub use resources::{GpuRelease, ReleaseGuard};
pub use scene::{release_gpu, RendererHandle, SceneGraph, SceneNode};

/// Lifecycle states. `TornDown` is terminal: no state may be revisited
/// after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LifecycleState {
    Idle,
    Looping,
    TornDown,
}

/// Frame-tick driven lifecycle manager.
///
/// The host calls [`frame`](Self::frame) once per render tick; the manager
/// decides what runs in that tick. Resize scheduling coalesces repeated
/// signals into a single callback invocation on the next tick.
pub struct SceneLifecycle {
    state: LifecycleState,
    pending_resize: Option<Box<dyn FnOnce()>>,
    frame_fn: Option<Box<dyn FnMut()>>,
}

impl SceneLifecycle {
    pub fn new() -> Self {
        Self {
            state: LifecycleState::Idle,
            pending_resize: None,
            frame_fn: None,
        }
    }

    /// Schedule `callback` to run on the next frame tick.
    ///
    /// A second call before the tick replaces the callback; at most one
    /// scheduled callback is outstanding at a time. No-op after teardown.
    pub fn schedule_resize(&mut self, callback: impl FnOnce() + 'static) {
        if self.state == LifecycleState::TornDown {
            return;
        }
        self.pending_resize = Some(Box::new(callback));
    }

    /// Start the recurring per-frame invocation of `frame_fn`.
    ///
    /// Idempotent: calling while already looping keeps the existing loop.
    pub fn run_loop(&mut self, frame_fn: impl FnMut() + 'static) {
        if self.state != LifecycleState::Idle {
            return;
        }
        self.frame_fn = Some(Box::new(frame_fn));
        self.state = LifecycleState::Looping;
    }

    /// Stop the recurring invocation. Safe to call when not running.
    pub fn stop_loop(&mut self) {
        if self.state == LifecycleState::Looping {
            self.state = LifecycleState::Idle;
            self.frame_fn = None;
        }
    }

    /// Advance one frame tick: run a due resize callback, then the loop
    /// body. Does nothing after teardown.
    pub fn frame(&mut self) {
        if self.state == LifecycleState::TornDown {
            return;
        }
        if let Some(resize) = self.pending_resize.take() {
            resize();
        }
        if self.state != LifecycleState::Looping {
            return;
        }
        if let Some(frame_fn) = self.frame_fn.as_mut() {
            frame_fn();
        }
    }

    /// Mark the manager permanently inert: stops the loop, clears pending
    /// callbacks, and refuses all further scheduling. Idempotent.
    pub fn teardown(&mut self) {
        self.state = LifecycleState::TornDown;
        self.pending_resize = None;
        self.frame_fn = None;
    }

    pub fn is_torn_down(&self) -> bool {
        self.state == LifecycleState::TornDown
    }

    pub fn is_looping(&self) -> bool {
        self.state == LifecycleState::Looping
    }
}

impl Default for SceneLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn resize_coalesces_to_one_invocation() {
        let mut lifecycle = SceneLifecycle::new();
        let count = Rc::new(Cell::new(0));

        for _ in 0..5 {
            let count = Rc::clone(&count);
            lifecycle.schedule_resize(move || count.set(count.get() + 1));
        }
        lifecycle.frame();
        assert_eq!(count.get(), 1);

        // Nothing left scheduled
        lifecycle.frame();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn later_schedule_replaces_earlier_callback() {
        let mut lifecycle = SceneLifecycle::new();
        let seen = Rc::new(Cell::new(0));

        let first = Rc::clone(&seen);
        lifecycle.schedule_resize(move || first.set(1));
        let second = Rc::clone(&seen);
        lifecycle.schedule_resize(move || second.set(2));

        lifecycle.frame();
        assert_eq!(seen.get(), 2);
    }

    #[test]
    fn loop_runs_each_frame_and_start_is_idempotent() {
        let mut lifecycle = SceneLifecycle::new();
        let ticks = Rc::new(Cell::new(0));

        let body = Rc::clone(&ticks);
        lifecycle.run_loop(move || body.set(body.get() + 1));
        // Second start must not replace the running loop
        lifecycle.run_loop(|| panic!("replacement loop must not run"));

        lifecycle.frame();
        lifecycle.frame();
        assert_eq!(ticks.get(), 2);
        assert!(lifecycle.is_looping());
    }

    #[test]
    fn stop_loop_is_safe_when_not_running() {
        let mut lifecycle = SceneLifecycle::new();
        lifecycle.stop_loop();
        lifecycle.run_loop(|| {});
        lifecycle.stop_loop();
        lifecycle.stop_loop();
        assert!(!lifecycle.is_looping());
    }

    #[test]
    fn teardown_is_terminal_and_idempotent() {
        let mut lifecycle = SceneLifecycle::new();
        lifecycle.run_loop(|| panic!("loop must not run after teardown"));
        lifecycle.teardown();
        lifecycle.teardown();

        lifecycle.schedule_resize(|| panic!("resize must not run after teardown"));
        lifecycle.run_loop(|| panic!("loop must not start after teardown"));
        lifecycle.frame();

        assert!(lifecycle.is_torn_down());
        assert!(!lifecycle.is_looping());
    }

    #[test]
    fn resize_scheduled_while_idle_still_fires_without_a_loop() {
        let mut lifecycle = SceneLifecycle::new();
        let fired = Rc::new(Cell::new(false));
        let flag = Rc::clone(&fired);
        lifecycle.schedule_resize(move || flag.set(true));
        lifecycle.frame();
        assert!(fired.get());
    }
}

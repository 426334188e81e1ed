//! Best-effort idempotent GPU resource release
//!
//! Disposal must be total even under partial prior failure: releasing an
//! already-released handle is defined as a no-op in the ownership type
//! itself, and a release that fails is swallowed so sibling resources still
//! get released.

use std::panic::{catch_unwind, AssertUnwindSafe};

/// A releasable GPU-side resource. `release` must be safe to call on a
/// resource whose underlying object is already gone.
pub trait GpuRelease {
    fn release(&mut self);
}

impl GpuRelease for wgpu::Buffer {
    fn release(&mut self) {
        self.destroy();
    }
}

impl GpuRelease for wgpu::Texture {
    fn release(&mut self) {
        self.destroy();
    }
}

impl<T: GpuRelease + ?Sized> GpuRelease for Box<T> {
    fn release(&mut self) {
        (**self).release();
    }
}

/// Owning handle that tracks its own released state.
///
/// Double release is a no-op, and a panicking inner release is caught and
/// logged rather than aborting cleanup of the remaining resources. The guard
/// also releases on drop, so a forgotten explicit release still cleans up.
pub struct ReleaseGuard<T: GpuRelease> {
    inner: T,
    released: bool,
}

impl<T: GpuRelease> ReleaseGuard<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            released: false,
        }
    }

    /// Release the underlying resource if it has not been released yet.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if catch_unwind(AssertUnwindSafe(|| self.inner.release())).is_err() {
            log::warn!("gpu release failed; resource was likely already gone");
        }
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Access the resource. None once released.
    pub fn get(&self) -> Option<&T> {
        (!self.released).then_some(&self.inner)
    }
}

impl<T: GpuRelease> Drop for ReleaseGuard<T> {
    fn drop(&mut self) {
        self.release();
    }
}

//! Deferred release of GPU objects.
//!
//! Materials may be dropped on any thread, but GPU objects can only be deleted
//! on the thread that owns the graphics context. A dropped material pushes its
//! program handles into a [`DeferredReleases`] queue; the command buffer drains
//! the queue at frame boundaries (`begin_frame` and `finish`).
//!
//! ```text
//! Drop(Material)            (any thread)
//!   └─ push program handles → DeferredReleases
//!
//! CommandBuffer::begin_frame (context thread)
//!   └─ drain → GraphicsApi::delete_program
//! ```

use std::sync::Arc;

use parking_lot::Mutex;

use super::{GraphicsApi, ProgramHandle};

/// A shared queue of program handles waiting to be deleted.
///
/// Cloning is cheap and shares the queue.
#[derive(Debug, Clone, Default)]
pub struct DeferredReleases {
    programs: Arc<Mutex<Vec<ProgramHandle>>>,
}

impl DeferredReleases {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule programs for deletion.
    pub fn push_programs(&self, programs: impl IntoIterator<Item = ProgramHandle>) {
        self.programs.lock().extend(programs);
    }

    /// Number of programs waiting for deletion.
    pub fn pending(&self) -> usize {
        self.programs.lock().len()
    }

    /// Delete every queued program. Returns the number deleted.
    ///
    /// Must be called on the thread that owns `api`'s context.
    pub fn process(&self, api: &dyn GraphicsApi) -> usize {
        let programs = std::mem::take(&mut *self.programs.lock());
        for program in &programs {
            api.delete_program(*program);
        }
        if !programs.is_empty() {
            log::trace!("Released {} deferred programs", programs.len());
        }
        programs.len()
    }
}

static_assertions::assert_impl_all!(DeferredReleases: Send, Sync);

//! Work scheduling for game-logic and loading tasks.
//!
//! - [`ThreadPool`] - fixed set of worker threads fed from a FIFO queue
//!
//! Rendering never runs here. Tasks that touch rendering resources (for example
//! reloading a material) only publish new data and flip the resource's state
//! flag; the render thread picks the change up at its next sync point.

mod thread_pool;

pub use thread_pool::ThreadPool;

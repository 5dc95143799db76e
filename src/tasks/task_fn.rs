//! # Function-backed task body.
//!
//! [`TaskFn`] wraps a closure `F: Fn(CancellationToken) -> Fut`,
//! producing a fresh future per execution. State shared with the caller
//! must be captured explicitly (`Arc<...>` inside the closure); there is
//! no hidden mutation between runs.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use taskloom::{TaskError, TaskFn, TaskRef};
//!
//! let body: TaskRef = TaskFn::arc(|ctx: CancellationToken| async move {
//!     if ctx.is_cancelled() {
//!         return Err(TaskError::Canceled);
//!     }
//!     Ok(())
//! });
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::tasks::task::Task;

/// Shared handle to a task body, suitable for cloning across the runtime.
pub type TaskRef = Arc<dyn Task>;

/// Function-backed [`Task`] implementation.
pub struct TaskFn<F> {
    f: F,
}

impl<F, Fut> TaskFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    /// Creates a new function-backed body.
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the body and returns it as a [`TaskRef`].
    pub fn arc(f: F) -> TaskRef {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut> Task for TaskFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError> {
        (self.f)(ctx).await
    }
}

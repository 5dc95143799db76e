//! # Task body abstraction.
//!
//! [`Task`] is the opaque executor a caller supplies at submission time.
//! The scheduler never interprets it; it only runs it, bounds it, and
//! reports on it.
//!
//! A body receives a [`CancellationToken`] and should check it at its
//! suspension points to stop cooperatively during timeout or shutdown.
//! Cancellation is never forced: a body that does not yield cannot be
//! preempted, only abandoned.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;

/// Asynchronous, cancelable unit of work.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use taskloom::{Task, TaskError};
///
/// struct Demo;
///
/// #[async_trait]
/// impl Task for Demo {
///     async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError> {
///         if ctx.is_cancelled() {
///             return Err(TaskError::Canceled);
///         }
///         // do work...
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Task: Send + Sync + 'static {
    /// Executes the body until completion or cancellation.
    ///
    /// Implementations should observe `ctx` at await points and return
    /// promptly (with `Err(TaskError::Canceled)` or `Ok`) once cancelled.
    async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError>;
}

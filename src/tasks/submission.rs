//! # Submission: what a caller hands to `submit`.
//!
//! Bundles the optional identity, the opaque payload, an optional
//! per-task deadline, and the executor itself. Built either directly
//! from a [`TaskRef`] or through [`SubmissionBuilder`]'s fluent API.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use taskloom::{Submission, TaskError};
//!
//! let submission = Submission::builder()
//!     .id("import-7")
//!     .payload(serde_json::json!({ "rows": 1200 }))
//!     .timeout(Duration::from_secs(30))
//!     .build(|_ctx: CancellationToken| async move { Ok::<_, TaskError>(()) });
//! ```

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::tasks::task_fn::{TaskFn, TaskRef};

/// A unit of work handed to [`Scheduler::submit`](crate::Scheduler::submit).
#[derive(Clone)]
pub struct Submission {
    pub(crate) id: Option<String>,
    pub(crate) payload: Option<serde_json::Value>,
    pub(crate) timeout: Option<Duration>,
    pub(crate) task: TaskRef,
}

impl Submission {
    /// Wraps an existing body with no id (generated), payload, or
    /// deadline override.
    pub fn of(task: TaskRef) -> Self {
        Self {
            id: None,
            payload: None,
            timeout: None,
            task,
        }
    }

    /// Starts a fluent builder.
    pub fn builder() -> SubmissionBuilder {
        SubmissionBuilder::default()
    }
}

/// Fluent builder for [`Submission`].
#[derive(Default)]
pub struct SubmissionBuilder {
    id: Option<String>,
    payload: Option<serde_json::Value>,
    timeout: Option<Duration>,
}

impl SubmissionBuilder {
    /// Sets the caller-supplied id (otherwise one is generated).
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Attaches opaque caller data, carried on the record for correlation.
    pub fn payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Sets a per-task deadline, overriding the configured default.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the submission from a closure.
    pub fn build<F, Fut>(self, f: F) -> Submission
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        self.build_from_task(TaskFn::arc(f))
    }

    /// Builds the submission from an existing body.
    pub fn build_from_task(self, task: TaskRef) -> Submission {
        Submission {
            id: self.id,
            payload: self.payload,
            timeout: self.timeout,
            task,
        }
    }
}

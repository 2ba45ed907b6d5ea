//! Bounded task pool
//!
//! This module provides the execution engine used by every stage of the
//! analysis pipeline:
//! - A fixed number of workers pull labelled work items from a bounded queue
//! - Every executed item produces exactly one [`TaskResult`] on a single results channel
//! - A cancellation token scopes the pool's lifetime; cancelling a parent token
//!   cancels the pool, and the pool can cancel itself on the first error (fail-fast)
//!
//! # Shutdown
//!
//! Only the pool's coordinator closes the submission queue, and only after the
//! lifetime token is cancelled. It then joins every worker before dropping the
//! last results sender, so the results channel closes exactly once and no worker
//! can send after it is closed. Items still buffered in the queue when the pool
//! is cancelled are discarded without producing a result.

mod task_pool;

pub use task_pool::{PoolConfig, PoolHandle, TaskPool};

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Boxed future returned by a pool task
pub type TaskFuture<T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'static>>;

/// Executable body of a work item; receives the pool's lifetime token
pub type Task<T, E> = Box<dyn FnOnce(CancellationToken) -> TaskFuture<T, E> + Send + 'static>;

/// Errors returned when submitting work to a pool
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// The pool's lifetime was cancelled before the task could be queued
    #[error("worker pool is closed; task {label} was not accepted")]
    Closed { label: String },

    /// A work item was submitted without an executable body
    #[error("task {label} has no executable body")]
    NilTask { label: String },
}

/// A labelled unit of work submitted to a [`TaskPool`]
pub struct WorkItem<L, T, E> {
    /// Caller-supplied label, returned unchanged with the result
    pub label: L,

    /// The work to execute; `None` is rejected at submission
    pub task: Option<Task<T, E>>,
}

impl<L, T, E> WorkItem<L, T, E> {
    /// Creates a work item from an async closure
    pub fn new<F, Fut>(label: L, work: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self {
            label,
            task: Some(Box::new(move |token| Box::pin(work(token)))),
        }
    }

    /// Creates a work item with no executable body
    pub fn empty(label: L) -> Self {
        Self { label, task: None }
    }
}

impl<L: fmt::Debug, T, E> fmt::Debug for WorkItem<L, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkItem")
            .field("label", &self.label)
            .field("has_task", &self.task.is_some())
            .finish()
    }
}

/// Outcome of one executed work item
#[derive(Debug)]
pub struct TaskResult<L, T, E> {
    /// Label of the work item that produced this result
    pub label: L,

    /// The value or error returned by the task
    pub outcome: Result<T, E>,
}

impl<L, T, E> TaskResult<L, T, E> {
    /// Returns true if the task succeeded
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Returns true if the task failed
    pub fn is_err(&self) -> bool {
        self.outcome.is_err()
    }
}

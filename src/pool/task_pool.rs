//! Task pool implementation
//!
//! Workers share one bounded submission queue and one bounded results channel.
//! A coordinator task owns shutdown: it waits for the pool's token to be
//! cancelled, closes the queue, joins every worker, then drops the last results
//! sender.

use super::{PoolError, Task, TaskResult, WorkItem};
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Sizing and failure policy for a [`TaskPool`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of workers started with the pool
    pub workers: usize,

    /// Cancel the pool as soon as any task returns an error
    pub fail_fast: bool,

    /// Number of submitted items that may wait in the queue
    pub queue_capacity: usize,
}

impl PoolConfig {
    /// Creates a configuration with a queue as deep as the worker count
    pub fn new(workers: usize, fail_fast: bool) -> Self {
        let workers = workers.max(1);
        Self {
            workers,
            fail_fast,
            queue_capacity: workers,
        }
    }

    /// Sets the number of items that may wait in the submission queue
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }
}

/// A queued work item whose body has already been checked
struct Job<L, T, E> {
    label: L,
    task: Task<T, E>,
}

type SharedQueue<L, T, E> = Arc<Mutex<mpsc::Receiver<Job<L, T, E>>>>;

/// Cloneable submission side of a [`TaskPool`]
///
/// Handles let one future keep submitting while another drains results from
/// the pool itself. They never close the queue.
pub struct PoolHandle<L, T, E> {
    queue: mpsc::Sender<Job<L, T, E>>,
    token: CancellationToken,
}

impl<L, T, E> Clone for PoolHandle<L, T, E> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            token: self.token.clone(),
        }
    }
}

impl<L, T, E> PoolHandle<L, T, E>
where
    L: Display + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    /// Submits an async closure under the given label
    pub async fn submit<F, Fut>(&self, label: L, work: F) -> Result<(), PoolError>
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        self.submit_item(WorkItem::new(label, work)).await
    }

    /// Submits a prepared work item
    ///
    /// Waits for queue space while racing the pool's cancellation, so it never
    /// blocks past the pool's lifetime.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The item was queued
    /// * `Err(PoolError::NilTask)` - The item has no executable body
    /// * `Err(PoolError::Closed)` - The pool was cancelled before the item was queued
    pub async fn submit_item(&self, item: WorkItem<L, T, E>) -> Result<(), PoolError> {
        let WorkItem { label, task } = item;
        let name = label.to_string();

        let Some(task) = task else {
            tracing::warn!("Submit rejected for task {}: no executable body", name);
            return Err(PoolError::NilTask { label: name });
        };

        if self.token.is_cancelled() {
            tracing::warn!("Submit rejected for task {}: pool is shutting down", name);
            return Err(PoolError::Closed { label: name });
        }

        let job = Job { label, task };
        tokio::select! {
            biased;
            _ = self.token.cancelled() => {
                tracing::warn!("Submit failed for task {}: pool was cancelled", name);
                Err(PoolError::Closed { label: name })
            }
            sent = self.queue.send(job) => match sent {
                Ok(()) => {
                    tracing::trace!("Task {} queued", name);
                    Ok(())
                }
                Err(_) => Err(PoolError::Closed { label: name }),
            },
        }
    }

    /// Cancels the pool's lifetime
    pub fn stop(&self) {
        self.token.cancel();
    }

    /// Returns true once the pool's lifetime has been cancelled
    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Bounded-concurrency executor for labelled async tasks
///
/// The pool starts its workers immediately. Results come back in completion
/// order through [`TaskPool::next_result`], which returns `None` once the pool
/// has shut down and every worker has exited.
///
/// Dropping the pool cancels it.
///
/// # Example
///
/// ```no_run
/// use page_analyzer::pool::{PoolConfig, TaskPool};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() {
/// let parent = CancellationToken::new();
/// let mut pool: TaskPool<&str, u32, String> = TaskPool::new(&parent, PoolConfig::new(2, true));
///
/// pool.submit("answer", |_token| async { Ok(42) }).await.unwrap();
/// let result = pool.next_result().await.unwrap();
/// assert_eq!(result.outcome, Ok(42));
///
/// pool.shutdown().await;
/// # }
/// ```
pub struct TaskPool<L, T, E> {
    handle: PoolHandle<L, T, E>,
    results: mpsc::Receiver<TaskResult<L, T, E>>,
    coordinator: Option<JoinHandle<()>>,
    workers: usize,
}

impl<L, T, E> TaskPool<L, T, E>
where
    L: Display + Send + 'static,
    T: Send + 'static,
    E: Display + Send + 'static,
{
    /// Creates a pool whose lifetime is a child of `parent` and starts its workers
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(parent: &CancellationToken, config: PoolConfig) -> Self {
        let token = parent.child_token();
        let workers = config.workers.max(1);

        let (queue_tx, queue_rx) = mpsc::channel(config.queue_capacity.max(1));
        let (results_tx, results_rx) = mpsc::channel(workers);
        let queue = Arc::new(Mutex::new(queue_rx));

        let mut worker_handles = Vec::with_capacity(workers);
        for id in 1..=workers {
            worker_handles.push(tokio::spawn(run_worker(
                id,
                queue.clone(),
                results_tx.clone(),
                token.clone(),
                config.fail_fast,
            )));
            tracing::trace!("Worker {} started", id);
        }

        let coordinator = tokio::spawn(coordinate(
            token.clone(),
            queue,
            worker_handles,
            results_tx,
        ));

        tracing::debug!(
            "Started task pool with {} workers (fail_fast: {})",
            workers,
            config.fail_fast
        );

        Self {
            handle: PoolHandle {
                queue: queue_tx,
                token,
            },
            results: results_rx,
            coordinator: Some(coordinator),
            workers,
        }
    }

    /// Returns a cloneable submission handle
    pub fn handle(&self) -> PoolHandle<L, T, E> {
        self.handle.clone()
    }

    /// Submits an async closure under the given label
    pub async fn submit<F, Fut>(&self, label: L, work: F) -> Result<(), PoolError>
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        self.handle.submit(label, work).await
    }

    /// Submits a prepared work item
    pub async fn submit_item(&self, item: WorkItem<L, T, E>) -> Result<(), PoolError> {
        self.handle.submit_item(item).await
    }

    /// Waits for the next result
    ///
    /// Returns `None` once the pool has been cancelled and all workers have
    /// exited. After cancellation fewer results may arrive than were submitted.
    pub async fn next_result(&mut self) -> Option<TaskResult<L, T, E>> {
        self.results.recv().await
    }

    /// Cancels the pool; calling it again has no effect
    pub fn stop(&self) {
        if !self.handle.is_stopped() {
            tracing::debug!("Stop requested for task pool");
        }
        self.handle.stop();
    }

    /// Returns true once the pool's lifetime has been cancelled
    pub fn is_stopped(&self) -> bool {
        self.handle.is_stopped()
    }

    /// Returns the pool's lifetime token
    pub fn token(&self) -> &CancellationToken {
        &self.handle.token
    }

    /// Returns the number of workers
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Stops the pool, drains undelivered results and waits for the coordinator
    ///
    /// # Returns
    ///
    /// Results that were delivered but not yet consumed
    pub async fn shutdown(mut self) -> Vec<TaskResult<L, T, E>> {
        self.stop();

        let mut drained = Vec::new();
        while let Some(result) = self.results.recv().await {
            drained.push(result);
        }

        if let Some(coordinator) = self.coordinator.take() {
            if let Err(e) = coordinator.await {
                tracing::error!("Task pool coordinator terminated abnormally: {}", e);
            }
        }

        drained
    }
}

impl<L, T, E> Drop for TaskPool<L, T, E> {
    fn drop(&mut self) {
        self.handle.token.cancel();
    }
}

/// Waits for cancellation, then closes the queue, joins workers and closes results
async fn coordinate<L, T, E>(
    token: CancellationToken,
    queue: SharedQueue<L, T, E>,
    workers: Vec<JoinHandle<()>>,
    results: mpsc::Sender<TaskResult<L, T, E>>,
) {
    token.cancelled().await;
    tracing::debug!("Pool cancellation triggered, closing task queue");

    queue.lock().await.close();

    for worker in workers {
        if let Err(e) = worker.await {
            tracing::error!("Worker terminated abnormally: {}", e);
        }
    }

    drop(results);
    tracing::debug!("All workers exited, results channel closed");
}

/// Worker loop: take a job, run it, deliver its result
async fn run_worker<L, T, E>(
    id: usize,
    queue: SharedQueue<L, T, E>,
    results: mpsc::Sender<TaskResult<L, T, E>>,
    token: CancellationToken,
    fail_fast: bool,
) where
    L: Display + Send + 'static,
    T: Send + 'static,
    E: Display + Send + 'static,
{
    // Exiting for any reason, including a panicking task, cancels the pool
    let _guard = token.clone().drop_guard();

    loop {
        let next = tokio::select! {
            biased;
            _ = token.cancelled() => None,
            job = next_job(&queue) => job,
        };

        let Some(Job { label, task }) = next else {
            tracing::trace!("Worker {} exiting", id);
            return;
        };

        let name = label.to_string();
        tracing::debug!("Worker {} starting task {}", id, name);

        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => {
                tracing::debug!("Worker {} abandoned task {} after cancellation", id, name);
                return;
            }
            outcome = task(token.clone()) => outcome,
        };

        match &outcome {
            Ok(_) => tracing::debug!("Task {} completed", name),
            Err(e) => tracing::warn!("Task {} failed: {}", name, e),
        }

        let failed = outcome.is_err();
        let result = TaskResult { label, outcome };

        if failed {
            // Error results are delivered even when another worker cancels the
            // pool concurrently.
            if results.send(result).await.is_err() {
                tracing::debug!("Worker {}: results receiver dropped", id);
                return;
            }
            if fail_fast {
                tracing::warn!(
                    "Fail-fast active, cancelling pool after error in task {}",
                    name
                );
                token.cancel();
            }
        } else {
            let delivered = tokio::select! {
                biased;
                _ = token.cancelled() => false,
                sent = results.send(result) => sent.is_ok(),
            };
            if !delivered {
                tracing::debug!("Worker {} dropped result of task {}", id, name);
                return;
            }
        }
    }
}

async fn next_job<L, T, E>(queue: &SharedQueue<L, T, E>) -> Option<Job<L, T, E>> {
    let mut receiver = queue.lock().await;
    receiver.recv().await
}

//! # Async Task Poller
//!
//! Master-side driver for in-flight async tasks. Each submitted
//! [`AsyncTaskExecuteFunction`] is started once and then probed on its own
//! tokio task at the function's check interval, so a slow probe of one task
//! never delays another.
//!
//! Terminal results are reported through a [`TaskCompletionHandler`]:
//!
//! - `Success`: outputs are collected, then `on_success`
//! - `Failed`: `on_failed`
//! - Query or launch failures: retried until `max_consecutive_probe_errors` in a row,
//!   then `on_error`
//!
//! Lifecycle events are published on the poller's [`EventPublisher`].

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::AsyncTaskConfig;
use crate::constants::events;
use crate::error::{ExecutionError, Result};
use crate::events::EventPublisher;
use crate::logging::log_async_task_operation;
use crate::models::Property;
use crate::orchestration::async_task::{AsyncTaskExecuteFunction, AsyncTaskKey};
use crate::state_machine::AsyncTaskExecutionStatus;

/// Receives the final result of each submitted task, exactly once per task
#[async_trait]
pub trait TaskCompletionHandler: Send + Sync {
    async fn on_success(&self, key: AsyncTaskKey, outputs: Vec<Property>);

    async fn on_failed(&self, key: AsyncTaskKey);

    /// The task could not be started, or its status could not be determined
    async fn on_error(&self, key: AsyncTaskKey, error: ExecutionError);
}

/// Final result of one async task, as delivered by [`ChannelCompletionHandler`]
#[derive(Debug)]
pub enum AsyncTaskOutcome {
    Succeeded {
        key: AsyncTaskKey,
        outputs: Vec<Property>,
    },
    Failed {
        key: AsyncTaskKey,
    },
    Errored {
        key: AsyncTaskKey,
        error: ExecutionError,
    },
}

impl AsyncTaskOutcome {
    pub fn key(&self) -> AsyncTaskKey {
        match self {
            Self::Succeeded { key, .. } | Self::Failed { key } | Self::Errored { key, .. } => *key,
        }
    }
}

/// Forwards outcomes to an mpsc channel
#[derive(Debug, Clone)]
pub struct ChannelCompletionHandler {
    sender: mpsc::UnboundedSender<AsyncTaskOutcome>,
}

impl ChannelCompletionHandler {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<AsyncTaskOutcome>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    fn forward(&self, outcome: AsyncTaskOutcome) {
        if let Err(mpsc::error::SendError(outcome)) = self.sender.send(outcome) {
            warn!(
                task = %outcome.key(),
                "Outcome receiver dropped, discarding async task outcome"
            );
        }
    }
}

#[async_trait]
impl TaskCompletionHandler for ChannelCompletionHandler {
    async fn on_success(&self, key: AsyncTaskKey, outputs: Vec<Property>) {
        self.forward(AsyncTaskOutcome::Succeeded { key, outputs });
    }

    async fn on_failed(&self, key: AsyncTaskKey) {
        self.forward(AsyncTaskOutcome::Failed { key });
    }

    async fn on_error(&self, key: AsyncTaskKey, error: ExecutionError) {
        self.forward(AsyncTaskOutcome::Errored { key, error });
    }
}

/// Shared between the poller and its per-task loops
#[derive(Debug)]
struct PollerState {
    poller_id: Uuid,
    running: AtomicBool,
    shutdown_notify: Notify,
    max_consecutive_probe_errors: u32,
}

/// Everything one per-task loop needs, cloned out of the poller
struct PollLoop {
    function: Arc<dyn AsyncTaskExecuteFunction>,
    state: Arc<PollerState>,
    handler: Arc<dyn TaskCompletionHandler>,
    event_publisher: EventPublisher,
    registry: Arc<DashMap<AsyncTaskKey, Arc<dyn AsyncTaskExecuteFunction>>>,
}

pub struct AsyncTaskPoller {
    state: Arc<PollerState>,
    handler: Arc<dyn TaskCompletionHandler>,
    event_publisher: EventPublisher,
    registry: Arc<DashMap<AsyncTaskKey, Arc<dyn AsyncTaskExecuteFunction>>>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl AsyncTaskPoller {
    pub fn new(config: &AsyncTaskConfig, handler: Arc<dyn TaskCompletionHandler>) -> Self {
        Self::with_event_publisher(
            config,
            handler,
            EventPublisher::new(config.event_channel_capacity),
        )
    }

    pub fn with_event_publisher(
        config: &AsyncTaskConfig,
        handler: Arc<dyn TaskCompletionHandler>,
        event_publisher: EventPublisher,
    ) -> Self {
        let state = Arc::new(PollerState {
            poller_id: Uuid::new_v4(),
            running: AtomicBool::new(true),
            shutdown_notify: Notify::new(),
            max_consecutive_probe_errors: config.max_consecutive_probe_errors.max(1),
        });

        Self {
            state,
            handler,
            event_publisher,
            registry: Arc::new(DashMap::new()),
            handles: Mutex::new(Vec::new()),
        }
    }

    pub fn event_publisher(&self) -> &EventPublisher {
        &self.event_publisher
    }

    /// Number of tasks currently being polled
    pub fn in_flight(&self) -> usize {
        self.registry.len()
    }

    pub fn is_in_flight(&self, key: &AsyncTaskKey) -> bool {
        self.registry.contains_key(key)
    }

    /// Start a task and begin polling it.
    ///
    /// A start failure is reported to the handler and returned; nothing is
    /// polled in that case.
    pub async fn submit(&self, function: Arc<dyn AsyncTaskExecuteFunction>) -> Result<()> {
        if !self.state.running.load(Ordering::Acquire) {
            return Err(ExecutionError::PollerStopped);
        }

        let key = function.task_key();
        match self.registry.entry(key) {
            Entry::Occupied(_) => return Err(ExecutionError::AlreadyInFlight(key)),
            Entry::Vacant(slot) => {
                slot.insert(Arc::clone(&function));
            }
        }

        if let Err(start_error) = function.start().await {
            self.registry.remove(&key);
            error!(task = %key, error = %start_error, "Async task failed to start");
            log_async_task_operation("start", &key, "errored", Some(&start_error.to_string()));
            self.publish(
                events::ASYNC_TASK_START_FAILED,
                &key,
                json!({ "error": start_error.to_string() }),
            )
            .await;
            self.handler
                .on_error(key, ExecutionError::TaskStart(start_error.clone()))
                .await;
            return Err(start_error.into());
        }

        let interval_ms = function.check_interval().as_millis() as u64;
        log_async_task_operation(
            "start",
            &key,
            "started",
            Some(&format!("check_interval_ms={interval_ms}")),
        );
        self.publish(
            events::ASYNC_TASK_STARTED,
            &key,
            json!({ "check_interval_ms": interval_ms }),
        )
        .await;

        let poll_loop = PollLoop {
            function,
            state: Arc::clone(&self.state),
            handler: Arc::clone(&self.handler),
            event_publisher: self.event_publisher.clone(),
            registry: Arc::clone(&self.registry),
        };
        let handle = tokio::spawn(poll_loop.run());

        let mut handles = self.handles.lock();
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
        Ok(())
    }

    /// Request cancellation of an in-flight task.
    ///
    /// Returns false when the key is not being polled. The task still reports
    /// its outcome through the handler on its next probe.
    pub async fn cancel(&self, key: &AsyncTaskKey) -> bool {
        let function = match self.registry.get(key) {
            Some(entry) => Arc::clone(entry.value()),
            None => return false,
        };

        function.cancel();
        log_async_task_operation("cancel", key, "cancel_requested", None);
        self.publish(events::ASYNC_TASK_CANCEL_REQUESTED, key, json!({}))
            .await;
        true
    }

    /// Stop every poll loop and wait for them to exit.
    ///
    /// Tasks still in flight get no outcome; they are left for recovery.
    pub async fn shutdown(&self) {
        if !self.state.running.swap(false, Ordering::AcqRel) {
            return;
        }
        self.state.shutdown_notify.notify_waiters();

        let handles = std::mem::take(&mut *self.handles.lock());
        info!(
            poller_id = %self.state.poller_id,
            loops = handles.len(),
            in_flight = self.registry.len(),
            "Shutting down async task poller"
        );

        for handle in handles {
            if let Err(e) = handle.await {
                warn!(poller_id = %self.state.poller_id, error = %e, "Poll loop ended abnormally");
            }
        }
        self.registry.clear();
    }

    async fn publish(&self, event_name: &str, key: &AsyncTaskKey, details: serde_json::Value) {
        publish_event(&self.event_publisher, event_name, key, details).await;
    }
}

impl Drop for AsyncTaskPoller {
    fn drop(&mut self) {
        self.state.running.store(false, Ordering::Release);
        self.state.shutdown_notify.notify_waiters();
    }
}

impl PollLoop {
    fn should_continue(&self) -> bool {
        self.state.running.load(Ordering::Acquire)
    }

    async fn run(self) {
        let key = self.function.task_key();
        let interval = self.function.check_interval();
        let mut consecutive_errors: u32 = 0;

        debug!(
            poller_id = %self.state.poller_id,
            task = %key,
            interval_ms = interval.as_millis() as u64,
            "Poll loop started"
        );

        while self.should_continue() {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {},
                _ = self.state.shutdown_notify.notified() => {
                    debug!(task = %key, "Shutdown notification received");
                    break;
                }
            }
            if !self.should_continue() {
                break;
            }

            match self.function.probe_status().await {
                Ok(AsyncTaskExecutionStatus::Running) => match self.function.replenish().await {
                    Ok(()) => consecutive_errors = 0,
                    Err(launch_error) => {
                        consecutive_errors += 1;
                        if self
                            .record_error(key, "replenish", consecutive_errors, launch_error)
                            .await
                        {
                            break;
                        }
                    }
                },
                Ok(AsyncTaskExecutionStatus::Success) => {
                    self.complete_success(key).await;
                    break;
                }
                Ok(AsyncTaskExecutionStatus::Failed) => {
                    log_async_task_operation("probe", &key, "failed", None);
                    self.publish(events::ASYNC_TASK_FAILED, &key, json!({})).await;
                    self.handler.on_failed(key).await;
                    break;
                }
                Err(query_error) => {
                    consecutive_errors += 1;
                    if self
                        .record_error(key, "probe", consecutive_errors, query_error.into())
                        .await
                    {
                        break;
                    }
                }
            }
        }

        self.registry.remove(&key);
        debug!(poller_id = %self.state.poller_id, task = %key, "Poll loop stopped");
    }

    /// Report a probe or launch failure; returns true once the error budget is spent
    /// and the handler has been told.
    async fn record_error(
        &self,
        key: AsyncTaskKey,
        stage: &str,
        consecutive_errors: u32,
        error: ExecutionError,
    ) -> bool {
        warn!(
            task = %key,
            stage = stage,
            error = %error,
            consecutive_errors = consecutive_errors,
            max_consecutive_errors = self.state.max_consecutive_probe_errors,
            "Async task poll step failed"
        );
        self.publish(
            events::ASYNC_TASK_PROBE_ERROR,
            &key,
            json!({
                "stage": stage,
                "error": error.to_string(),
                "consecutive_errors": consecutive_errors,
            }),
        )
        .await;

        if consecutive_errors < self.state.max_consecutive_probe_errors {
            return false;
        }
        error!(task = %key, stage = stage, error = %error, "Giving up on async task");
        log_async_task_operation(stage, &key, "errored", Some(&error.to_string()));
        self.handler.on_error(key, error).await;
        true
    }

    async fn complete_success(&self, key: AsyncTaskKey) {
        match self.function.output_parameters().await {
            Ok(outputs) => {
                let details = format!("outputs={}", outputs.len());
                log_async_task_operation("probe", &key, "succeeded", Some(&details));
                self.publish(
                    events::ASYNC_TASK_SUCCEEDED,
                    &key,
                    json!({ "outputs": outputs.len() }),
                )
                .await;
                self.handler.on_success(key, outputs).await;
            }
            Err(e) => {
                error!(
                    task = %key,
                    error = %e,
                    "Failed to collect outputs of successful async task"
                );
                self.handler.on_error(key, e).await;
            }
        }
    }

    async fn publish(&self, event_name: &str, key: &AsyncTaskKey, details: serde_json::Value) {
        publish_event(&self.event_publisher, event_name, key, details).await;
    }
}

async fn publish_event(
    publisher: &EventPublisher,
    event_name: &str,
    key: &AsyncTaskKey,
    details: serde_json::Value,
) {
    if let Err(e) = publisher.publish_task_event(event_name, key, details).await {
        warn!(task = %key, event = event_name, error = %e, "Failed to publish async task event");
    }
}

//! Minimal recurring-task runner.
//!
//! Each registered task gets its own tokio task driving a
//! [`tokio::time::Interval`]. The action is awaited inline on every tick, so
//! one task never overlaps itself, while separate tasks run independently.
//!
//! Run metadata is owned per task: the driving loop is the only writer of its
//! [`TaskStatus`] and publishes it through a `watch` channel.

use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use ipwarden_core::{Result, WardenError};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{info, warn};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Longest interval [`Scheduler::register`] accepts
pub const MAX_INTERVAL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

type Action = Arc<dyn Fn() -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// A unit of work repeated on a fixed interval
#[derive(Clone)]
pub struct ScheduledTask {
    name: String,
    interval: Duration,
    action: Action,
}

impl ScheduledTask {
    /// Create a task from an async closure
    pub fn new<F, Fut>(name: impl Into<String>, interval: Duration, action: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self {
            name: name.into(),
            interval,
            action: Arc::new(move || action().boxed()),
        }
    }

    /// Name used in log lines
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Time between firings
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }
}

impl std::fmt::Debug for ScheduledTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduledTask")
            .field("name", &self.name)
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

/// Last-run metadata of one task
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskStatus {
    /// Wall-clock time the most recent firing finished
    pub last_update: Option<DateTime<Utc>>,

    /// Time from scheduler start to the most recent firing
    pub last_update_duration: Option<Duration>,

    /// Number of firings so far
    pub runs: u64,

    /// Number of firings whose action failed or panicked
    pub failures: u64,

    /// Message of the most recent failure
    pub last_error: Option<String>,
}

/// Idle scheduler: collects tasks until [`Scheduler::run`] starts them
#[derive(Debug)]
pub struct Scheduler {
    start_time: DateTime<Utc>,
    tasks: Vec<ScheduledTask>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    /// Empty scheduler stamped with the current time
    #[must_use]
    pub fn new() -> Self {
        Self {
            start_time: Utc::now(),
            tasks: Vec::new(),
        }
    }

    /// Creation time; reset when [`Scheduler::run`] is called
    #[must_use]
    pub const fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    /// Registered tasks, in registration order
    #[must_use]
    pub fn tasks(&self) -> &[ScheduledTask] {
        &self.tasks
    }

    /// Append a task.
    ///
    /// A zero interval is rejected so a task can never spin, and intervals
    /// longer than [`MAX_INTERVAL`] are rejected so the first deadline is
    /// always representable.
    pub fn register(&mut self, task: ScheduledTask) -> Result<()> {
        if task.interval.is_zero() {
            return Err(WardenError::Schedule(format!(
                "task {:?} has a zero interval",
                task.name
            )));
        }
        if task.interval > MAX_INTERVAL {
            return Err(WardenError::Schedule(format!(
                "task {:?} has an interval of {:?}, longer than {:?}",
                task.name, task.interval, MAX_INTERVAL
            )));
        }
        self.tasks.push(task);
        Ok(())
    }

    /// Start one repeating timer per task and return immediately.
    ///
    /// Consumes the scheduler, so timers can only be started once. The first
    /// firing of each task happens one full interval after this call.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn run(self) -> RunningScheduler {
        let start = Instant::now();
        let started_at = Utc::now();
        info!(
            started_at = %started_at.format(TIMESTAMP_FORMAT),
            tasks = self.tasks.len(),
            "scheduler started"
        );

        let tasks = self
            .tasks
            .into_iter()
            .map(|task| {
                let (tx, status) = watch::channel(TaskStatus::default());
                let name = task.name.clone();
                tokio::spawn(drive(task, start, tx));
                TaskSlot { name, status }
            })
            .collect();

        RunningScheduler { started_at, tasks }
    }
}

/// Fire `task` on every tick, forever
async fn drive(task: ScheduledTask, start: Instant, status: watch::Sender<TaskStatus>) {
    let first = start.checked_add(task.interval).unwrap_or(start);
    let mut ticker = interval_at(first, task.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let action = Arc::clone(&task.action);
        let result = match AssertUnwindSafe(async move { action().await })
            .catch_unwind()
            .await
        {
            Ok(result) => result.map_err(|e| e.to_string()),
            Err(panic) => Err(panic_message(panic.as_ref())),
        };

        let elapsed = start.elapsed();
        let at = Utc::now();
        status.send_modify(|s| {
            s.runs += 1;
            s.last_update = Some(at);
            s.last_update_duration = Some(elapsed);
            if let Err(message) = &result {
                s.failures += 1;
                s.last_error = Some(message.clone());
            }
        });

        match result {
            Ok(()) => info!(
                task = %task.name,
                at = %at.format(TIMESTAMP_FORMAT),
                since_start = ?elapsed,
                "task executed"
            ),
            Err(error) => warn!(
                task = %task.name,
                at = %at.format(TIMESTAMP_FORMAT),
                error = %error,
                "task failed, will run again next interval"
            ),
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .map_or_else(|| "task panicked".to_string(), |m| format!("task panicked: {m}"))
}

struct TaskSlot {
    name: String,
    status: watch::Receiver<TaskStatus>,
}

/// Scheduler whose timers are running.
///
/// Timers live for the rest of the process; dropping this value only drops
/// the observability handles.
pub struct RunningScheduler {
    started_at: DateTime<Utc>,
    tasks: Vec<TaskSlot>,
}

impl std::fmt::Debug for RunningScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunningScheduler")
            .field("started_at", &self.started_at)
            .field("tasks", &self.task_names())
            .finish_non_exhaustive()
    }
}

impl RunningScheduler {
    /// Wall-clock time the timers were started
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Number of running tasks
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns true if no tasks were registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Task names, in registration order
    #[must_use]
    pub fn task_names(&self) -> Vec<&str> {
        self.tasks.iter().map(|t| t.name.as_str()).collect()
    }

    /// Current status of the task at `index`
    #[must_use]
    pub fn status(&self, index: usize) -> Option<TaskStatus> {
        self.tasks.get(index).map(|t| t.status.borrow().clone())
    }

    /// Current status of every task, in registration order
    #[must_use]
    pub fn statuses(&self) -> Vec<TaskStatus> {
        self.tasks.iter().map(|t| t.status.borrow().clone()).collect()
    }

    /// Receiver notified each time the task at `index` fires
    #[must_use]
    pub fn subscribe(&self, index: usize) -> Option<watch::Receiver<TaskStatus>> {
        self.tasks.get(index).map(|t| t.status.clone())
    }

    /// Time the most recent firing of any task finished
    #[must_use]
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.statuses().into_iter().filter_map(|s| s.last_update).max()
    }

    /// Time from start to the most recent firing of any task
    #[must_use]
    pub fn last_update_duration(&self) -> Option<Duration> {
        self.statuses()
            .into_iter()
            .filter_map(|s| s.last_update_duration)
            .max()
    }
}

use anyhow::Result;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

pub const COMMAND_POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const FOLLOW_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    NotDue,
    Ran,
    Failed,
}

/// Fixed-period timer. The body runs when due and the next run is always
/// scheduled one period later, whether the body succeeded, failed or panicked.
#[derive(Debug, Clone)]
pub struct PeriodicTask {
    name: &'static str,
    period: Duration,
    next_due: Instant,
}

impl PeriodicTask {
    /// First run is one period after `now`.
    pub fn new(name: &'static str, period: Duration, now: Instant) -> Self {
        Self {
            name,
            period,
            next_due: now + period,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn next_due(&self) -> Instant {
        self.next_due
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.next_due
    }

    pub fn run_if_due<F>(&mut self, now: Instant, body: F) -> TaskOutcome
    where
        F: FnOnce() -> Result<()>,
    {
        if !self.is_due(now) {
            return TaskOutcome::NotDue;
        }
        let guard = Reschedule {
            task: self,
            now,
        };
        let outcome = match panic::catch_unwind(AssertUnwindSafe(body)) {
            Ok(Ok(())) => TaskOutcome::Ran,
            Ok(Err(err)) => {
                tracing::warn!(task = guard.task.name, ?err, "periodic task failed");
                TaskOutcome::Failed
            }
            Err(panic) => {
                let panic_message = if let Some(message) = panic.downcast_ref::<&str>() {
                    (*message).to_string()
                } else if let Some(message) = panic.downcast_ref::<String>() {
                    message.clone()
                } else {
                    "unknown panic payload".to_string()
                };
                tracing::error!(task = guard.task.name, panic_message, "periodic task panicked");
                TaskOutcome::Failed
            }
        };
        drop(guard);
        outcome
    }
}

struct Reschedule<'a> {
    task: &'a mut PeriodicTask,
    now: Instant,
}

impl Drop for Reschedule<'_> {
    fn drop(&mut self) {
        self.task.next_due = self.now + self.task.period;
    }
}

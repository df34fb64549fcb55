use crate::errors::{ErrorKind, StoreError, StoreResult};
use parking_lot::Mutex;
use std::time::Duration;
use timer::{Guard, Timer};

/// Periodic background work of one store instance, such as interval
/// compaction.
///
/// A task repeats until [Scheduler::stop] drops its guard. Each instance owns
/// its timer thread, so two stores in one process never share a schedule.
pub(crate) struct Scheduler {
    timer: Timer,
    tasks: Mutex<Vec<(String, Guard)>>,
}

impl Scheduler {
    pub fn new() -> Scheduler {
        Scheduler {
            timer: Timer::new(),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Runs `task` every `interval` until the scheduler stops.
    pub fn schedule<F>(&self, name: &str, interval: Duration, task: F) -> StoreResult<()>
    where
        F: 'static + FnMut() + Send,
    {
        let every = chrono::Duration::from_std(interval).map_err(|e| {
            log::error!("Cannot schedule {} every {:?}: {}", name, interval, e);
            StoreError::new(
                &format!("Cannot schedule {} every {:?}", name, interval),
                ErrorKind::InvalidConfiguration,
            )
        })?;

        let guard = self.timer.schedule_repeating(every, task);
        self.tasks.lock().push((name.to_string(), guard));
        log::debug!("Scheduled {} every {:?}", name, interval);
        Ok(())
    }

    /// Cancels every task. A task already running finishes its current run.
    pub fn stop(&self) {
        let cancelled: Vec<(String, Guard)> = self.tasks.lock().drain(..).collect();
        for (name, _) in &cancelled {
            log::trace!("Cancelled {}", name);
        }
    }

    pub fn task_count(&self) -> usize {
        self.tasks.lock().len()
    }
}

//! Call duration timer
//!
//! A start/stop tick source. While running, a background task sends one
//! [`TimerTick`] per period carrying the running count. Each `start()` opens
//! a new generation; `stop()` aborts the task and closes the generation, so
//! any tick already sitting in the channel is rejected by [`CallTimer::accept`].
//! That makes stopping synchronous from the receiver's point of view: once
//! `stop()` returns, no tick of that run is ever accepted.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, trace};

/// One period elapsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerTick {
    pub generation: u64,
    /// Number of periods since `start()`, starting at 1
    pub elapsed_seconds: u64,
}

pub struct CallTimer {
    period: Duration,
    tick_tx: mpsc::UnboundedSender<TimerTick>,
    generation: u64,
    task: Option<JoinHandle<()>>,
}

impl CallTimer {
    pub fn new(period: Duration, tick_tx: mpsc::UnboundedSender<TimerTick>) -> Self {
        Self {
            period,
            tick_tx,
            generation: 0,
            task: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// Begin counting from zero; restarts if already running
    pub fn start(&mut self) {
        if self.is_running() {
            self.stop();
        }
        self.generation += 1;

        let generation = self.generation;
        let period = self.period;
        let tick_tx = self.tick_tx.clone();

        self.task = Some(tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut elapsed_seconds = 0u64;
            loop {
                interval.tick().await;
                elapsed_seconds += 1;
                trace!("Call timer tick {} (generation {})", elapsed_seconds, generation);
                if tick_tx.send(TimerTick { generation, elapsed_seconds }).is_err() {
                    break;
                }
            }
        }));
        debug!("Call timer started (generation {})", generation);
    }

    /// Halt the count; later ticks of this run are never accepted
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            self.generation += 1;
            debug!("Call timer stopped");
        }
    }

    /// Validate a received tick, returning its count if it belongs to the
    /// current run
    pub fn accept(&self, tick: TimerTick) -> Option<u64> {
        if self.is_running() && tick.generation == self.generation {
            Some(tick.elapsed_seconds)
        } else {
            trace!("Dropping stale timer tick {:?}", tick);
            None
        }
    }
}

impl Drop for CallTimer {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_ticks_count_up_from_one() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = CallTimer::new(Duration::from_secs(1), tx);
        timer.start();

        for expected in 1..=3 {
            let tick = rx.recv().await.unwrap();
            assert_eq!(timer.accept(tick), Some(expected));
        }
        timer.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_tick_accepted_after_stop() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = CallTimer::new(Duration::from_secs(1), tx);
        timer.start();

        tokio::time::sleep(Duration::from_millis(2500)).await;
        timer.stop();
        assert!(!timer.is_running());

        tokio::time::sleep(Duration::from_secs(5)).await;
        let mut accepted = 0;
        while let Ok(tick) = rx.try_recv() {
            if timer.accept(tick).is_some() {
                accepted += 1;
            }
        }
        assert_eq!(accepted, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_discards_previous_count() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = CallTimer::new(Duration::from_secs(1), tx);

        timer.start();
        tokio::time::sleep(Duration::from_millis(2500)).await;
        timer.stop();
        timer.start();

        // Skip whatever the first run left behind
        let first_fresh = loop {
            let tick = rx.recv().await.unwrap();
            if let Some(count) = timer.accept(tick) {
                break count;
            }
        };
        assert_eq!(first_fresh, 1);
    }
}

// ticker.rs - Fixed-cadence async driver for the scheduler

use std::time::Duration;

use tokio::sync::oneshot;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::task::{self, JoinHandle};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::backend::Backend;
use crate::error::Result;
use crate::scheduler::Scheduler;

/// Owned control of a running ticker. Dropping it also stops the loop.
pub struct TickerHandle<B: Backend> {
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<Scheduler<B>>>,
}

/// Moves `scheduler` into a task that ticks it every `period`.
///
/// The first tick fires one period after the call. Ticks that fall behind
/// are skipped rather than replayed. With `limit` set the loop ends on its
/// own after that many ticks.
///
/// # Panics
///
/// Panics if `period` is zero.
pub fn spawn<B>(mut scheduler: Scheduler<B>, period: Duration, limit: Option<u64>) -> TickerHandle<B>
where
    B: Backend + Send + 'static,
{
    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        debug!(period_ms = period.as_millis() as u64, ?limit, "ticker started");

        let mut ticks = 0u64;
        while limit.is_none_or(|limit| ticks < limit) {
            tokio::select! {
                _ = &mut stop_rx => break,
                _ = interval.tick() => {
                    if let Err(err) = run_tick(&mut scheduler) {
                        warn!(step = scheduler.step(), %err, "tick failed, stopping");
                        return Err(err);
                    }
                    ticks += 1;
                }
            }
        }

        debug!(ticks, step = scheduler.step(), "ticker stopped");
        Ok(scheduler)
    });

    TickerHandle {
        stop: Some(stop_tx),
        task,
    }
}

/// A tick blocks while the dispatch runs. On a multi-thread runtime the
/// worker is handed off first so other tasks keep running.
fn run_tick<B: Backend>(scheduler: &mut Scheduler<B>) -> Result<()> {
    match Handle::current().runtime_flavor() {
        RuntimeFlavor::MultiThread => task::block_in_place(|| scheduler.tick()),
        _ => scheduler.tick(),
    }
}

impl<B: Backend> TickerHandle<B> {
    /// Stops the loop and hands the scheduler back.
    pub async fn stop(mut self) -> Result<Scheduler<B>> {
        self.cancel();
        self.task.await?
    }

    /// Waits for the tick limit (or a failing tick) to end the loop.
    pub async fn join(self) -> Result<Scheduler<B>> {
        let TickerHandle { stop, task } = self;
        let result = task.await;
        drop(stop);
        result?
    }

    /// Signals the loop to stop without waiting for it.
    pub fn cancel(&mut self) {
        if let Some(stop) = self.stop.take() {
            // The task may already be gone.
            let _ = stop.send(());
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Frame;
    use crate::cpu::CpuBackend;
    use crate::grid::{DEAD, GridSize};
    use crate::rule::Rule;
    use tokio::sync::watch;

    const PERIOD: Duration = Duration::from_millis(100);

    fn scheduler() -> Scheduler<CpuBackend<Vec<Frame>>> {
        let size = GridSize::new(8, 8).unwrap();
        let backend = CpuBackend::new(size, Some(1), Vec::new()).unwrap();
        Scheduler::new(backend, size, Rule::CONWAY, &[DEAD; 64]).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn runs_until_limit() {
        let start = Instant::now();
        let scheduler = spawn(scheduler(), PERIOD, Some(5)).join().await.unwrap();
        assert_eq!(scheduler.step(), 5);
        assert_eq!(scheduler.backend().frames_presented(), 5);
        assert!(start.elapsed() >= PERIOD * 5);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_returns_scheduler() {
        let handle = spawn(scheduler(), PERIOD, None);
        time::sleep(PERIOD * 3 + PERIOD / 2).await;
        assert!(!handle.is_finished());
        let scheduler = handle.stop().await.unwrap();
        assert_eq!(scheduler.step(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn late_ticks_are_skipped() {
        let handle = spawn(scheduler(), PERIOD, None);
        task::yield_now().await;
        time::advance(PERIOD * 5 + PERIOD / 2).await;
        task::yield_now().await;
        task::yield_now().await;
        assert_eq!(handle.stop().await.unwrap().step(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_handle_ends_task() {
        let size = GridSize::new(8, 8).unwrap();
        let (tx, mut frames) = watch::channel(None);
        let backend = CpuBackend::new(size, Some(1), tx).unwrap();
        let scheduler = Scheduler::new(backend, size, Rule::CONWAY, &[DEAD; 64]).unwrap();

        let handle = spawn(scheduler, PERIOD, None);
        time::sleep(PERIOD * 2 + PERIOD / 2).await;
        drop(handle);

        // The sender lives in the scheduler, so `changed` fails once the task is gone.
        let ended = time::timeout(PERIOD * 10, async {
            while frames.changed().await.is_ok() {}
        })
        .await;
        assert!(ended.is_ok(), "ticker kept running after its handle was dropped");
        assert_eq!(frames.borrow().as_ref().map(|f| f.sequence), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_then_stop() {
        let mut handle = spawn(scheduler(), PERIOD, None);
        time::sleep(PERIOD * 2 + PERIOD / 2).await;
        handle.cancel();
        time::sleep(PERIOD * 3).await;
        assert!(handle.is_finished());
        assert_eq!(handle.stop().await.unwrap().step(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn ticks_on_multi_thread_runtime() {
        let scheduler = spawn(scheduler(), Duration::from_millis(5), Some(3))
            .join()
            .await
            .unwrap();
        assert_eq!(scheduler.step(), 3);
        assert_eq!(scheduler.backend().frames_presented(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn no_tick_before_first_period() {
        let handle = spawn(scheduler(), PERIOD, None);
        time::sleep(PERIOD / 2).await;
        assert_eq!(handle.stop().await.unwrap().step(), 0);
    }
}

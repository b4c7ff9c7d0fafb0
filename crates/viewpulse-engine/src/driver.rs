//! Real-time loop wiring the [`Scheduler`] to a [`Monitor`].
//!
//! All monitor state stays in the task that calls [`Driver::run`]. Fetches
//! run concurrently as boxed futures; each carries the [`PollTicket`] it was
//! issued so a slow response can never overwrite a newer one. Dropping the
//! loop on shutdown cancels any fetch still in flight.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use tokio::sync::watch;

use crate::monitor::{fetch_batch, ApplyOutcome, Monitor, MonitorView, PollBatch, PollTicket};
use crate::scheduler::{Clock, ScheduleHandler, Scheduler};
use crate::source::{MilestoneSource, SnapshotSource};

/// Receives fresh views from the driver.
pub trait MonitorObserver {
    /// Called on every tick and after every applied poll.
    fn on_view(&mut self, view: &MonitorView);

    /// Called after each poll response is handled.
    fn on_poll(&mut self, outcome: ApplyOutcome) {
        let _ = outcome;
    }
}

type InFlight = FuturesUnordered<BoxFuture<'static, (PollTicket, PollBatch)>>;

/// Polls due while this many fetches are outstanding are skipped.
pub const MAX_IN_FLIGHT_POLLS: usize = 2;

pub struct Driver<S, M, C> {
    monitor: Monitor,
    snapshots: Arc<S>,
    milestones: Arc<M>,
    clock: C,
    scheduler: Scheduler,
}

struct Dispatch<'a, S, M, O: ?Sized> {
    monitor: &'a mut Monitor,
    snapshots: &'a Arc<S>,
    milestones: &'a Arc<M>,
    in_flight: &'a mut InFlight,
    observer: &'a mut O,
}

impl<S, M, O> ScheduleHandler for Dispatch<'_, S, M, O>
where
    S: SnapshotSource + Send + Sync + 'static,
    M: MilestoneSource + Send + Sync + 'static,
    O: MonitorObserver + ?Sized,
{
    fn on_poll(&mut self, _now: DateTime<Utc>) {
        if self.in_flight.len() >= MAX_IN_FLIGHT_POLLS {
            tracing::debug!(pending = self.in_flight.len(), "store is slow, skipping poll");
            return;
        }
        let ticket = self.monitor.begin_poll();
        let limit = self.monitor.settings().snapshot_limit;
        let snapshots = Arc::clone(self.snapshots);
        let milestones = Arc::clone(self.milestones);
        tracing::trace!(ticket = ticket.value(), "starting poll");
        self.in_flight.push(
            async move {
                let batch = fetch_batch(snapshots.as_ref(), milestones.as_ref(), limit).await;
                (ticket, batch)
            }
            .boxed(),
        );
    }

    fn on_tick(&mut self, now: DateTime<Utc>) {
        self.observer.on_view(&self.monitor.view(now));
    }
}

impl<S, M, C> Driver<S, M, C>
where
    S: SnapshotSource + Send + Sync + 'static,
    M: MilestoneSource + Send + Sync + 'static,
    C: Clock,
{
    pub fn new(
        monitor: Monitor,
        snapshots: Arc<S>,
        milestones: Arc<M>,
        clock: C,
        scheduler: Scheduler,
    ) -> Self {
        Self {
            monitor,
            snapshots,
            milestones,
            clock,
            scheduler,
        }
    }

    /// Run until `shutdown` flips to `true` or its sender is dropped.
    ///
    /// Returns the monitor so callers can inspect or reuse its final state.
    pub async fn run<O>(mut self, observer: &mut O, mut shutdown: watch::Receiver<bool>) -> Monitor
    where
        O: MonitorObserver + ?Sized,
    {
        let mut in_flight: InFlight = FuturesUnordered::new();
        self.scheduler.start(self.clock.now());
        tracing::info!(
            poll_ms = self.scheduler.poll_interval().num_milliseconds(),
            tick_ms = self.scheduler.tick_interval().num_milliseconds(),
            "monitor driver started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            let wait = self
                .scheduler
                .next_deadline()
                .map(|deadline| (deadline - self.clock.now()).to_std().unwrap_or_default())
                .unwrap_or_default();

            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }

                Some((ticket, batch)) = in_flight.next(), if !in_flight.is_empty() => {
                    let now = self.clock.now();
                    let outcome = self.monitor.apply_poll(ticket, batch, now);
                    observer.on_poll(outcome);
                    if outcome != ApplyOutcome::Stale {
                        observer.on_view(&self.monitor.view(now));
                    }
                }

                () = tokio::time::sleep(wait) => {
                    let now = self.clock.now();
                    let mut dispatch = Dispatch {
                        monitor: &mut self.monitor,
                        snapshots: &self.snapshots,
                        milestones: &self.milestones,
                        in_flight: &mut in_flight,
                        observer: &mut *observer,
                    };
                    self.scheduler.dispatch(now, &mut dispatch);
                }
            }
        }

        if !in_flight.is_empty() {
            tracing::debug!(pending = in_flight.len(), "cancelling in-flight polls");
        }
        drop(in_flight);
        tracing::info!("monitor driver stopped");
        self.monitor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration as StdDuration;

    use chrono::Duration;
    use uuid::Uuid;
    use viewpulse_core::{Milestone, MilestoneUpdate, NewMilestone, Snapshot};

    use crate::dismissal::MemoryKeyValueStore;
    use crate::error::SourceError;
    use crate::monitor::MonitorSettings;
    use crate::scheduler::SystemClock;

    #[derive(Default)]
    struct CountingSource {
        calls: AtomicU32,
        hang: bool,
    }

    impl SnapshotSource for CountingSource {
        async fn list_recent(&self, _limit: i64) -> Result<Vec<Snapshot>, SourceError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.hang {
                futures::future::pending::<()>().await;
            }
            Ok(vec![Snapshot::new(Utc::now(), i64::from(n) * 10)])
        }

        async fn list_since(&self, _cutoff: DateTime<Utc>) -> Result<Vec<Snapshot>, SourceError> {
            Ok(Vec::new())
        }
    }

    struct NoMilestones;

    impl MilestoneSource for NoMilestones {
        async fn list_active(&self) -> Result<Vec<Milestone>, SourceError> {
            Ok(Vec::new())
        }

        async fn insert(&self, _milestone: &NewMilestone) -> Result<Milestone, SourceError> {
            Err(SourceError::Invalid("read only".to_string()))
        }

        async fn update(&self, _id: Uuid, _update: &MilestoneUpdate) -> Result<(), SourceError> {
            Ok(())
        }

        async fn delete(&self, _id: Uuid) -> Result<(), SourceError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct Collect {
        views: u32,
        applied: u32,
    }

    impl MonitorObserver for Collect {
        fn on_view(&mut self, _view: &MonitorView) {
            self.views += 1;
        }

        fn on_poll(&mut self, outcome: ApplyOutcome) {
            if outcome == ApplyOutcome::Applied {
                self.applied += 1;
            }
        }
    }

    fn driver(source: Arc<CountingSource>) -> Driver<CountingSource, NoMilestones, SystemClock> {
        let monitor = Monitor::new(
            MonitorSettings::default(),
            Arc::new(MemoryKeyValueStore::new()),
        );
        Driver::new(
            monitor,
            source,
            Arc::new(NoMilestones),
            SystemClock,
            Scheduler::new(Duration::milliseconds(40), Duration::milliseconds(10)),
        )
    }

    #[tokio::test]
    async fn polls_and_ticks_until_shutdown() {
        let source = Arc::new(CountingSource::default());
        let (tx, rx) = watch::channel(false);
        let mut observer = Collect::default();

        let stopper = tokio::spawn(async move {
            tokio::time::sleep(StdDuration::from_millis(150)).await;
            let _ = tx.send(true);
        });

        let monitor = tokio::time::timeout(
            StdDuration::from_secs(5),
            driver(Arc::clone(&source)).run(&mut observer, rx),
        )
        .await
        .expect("driver stops on shutdown");
        stopper.await.expect("stopper");

        assert!(source.calls.load(Ordering::SeqCst) >= 2);
        assert!(observer.applied >= 2);
        assert!(observer.views > observer.applied, "ticks also emit views");
        assert_eq!(monitor.snapshots().len(), 1);
    }

    #[tokio::test]
    async fn shutdown_cancels_hanging_fetch() {
        let source = Arc::new(CountingSource {
            hang: true,
            ..CountingSource::default()
        });
        let (tx, rx) = watch::channel(false);
        let mut observer = Collect::default();

        let monitor = {
            let run = driver(Arc::clone(&source)).run(&mut observer, rx);
            tokio::pin!(run);

            tokio::select! {
                _ = &mut run => panic!("driver must not exit before shutdown"),
                () = tokio::time::sleep(StdDuration::from_millis(60)) => {}
            }
            tx.send(true).expect("send shutdown");

            tokio::time::timeout(StdDuration::from_secs(5), run)
                .await
                .expect("driver stops even with a fetch in flight")
        };
        assert_eq!(observer.applied, 0);
        assert!(monitor.snapshots().is_empty());
    }

    #[tokio::test]
    async fn hanging_store_caps_outstanding_fetches() {
        let source = Arc::new(CountingSource {
            hang: true,
            ..CountingSource::default()
        });
        let (tx, rx) = watch::channel(false);
        let mut observer = Collect::default();

        let stopper = tokio::spawn(async move {
            tokio::time::sleep(StdDuration::from_millis(300)).await;
            let _ = tx.send(true);
        });

        tokio::time::timeout(
            StdDuration::from_secs(5),
            driver(Arc::clone(&source)).run(&mut observer, rx),
        )
        .await
        .expect("driver stops on shutdown");
        stopper.await.expect("stopper");

        let started = source.calls.load(Ordering::SeqCst) as usize;
        assert!(started >= 1, "at least one fetch starts");
        assert!(
            started <= MAX_IN_FLIGHT_POLLS,
            "{started} fetches started while the store hung"
        );
        assert!(observer.views > 0, "ticks keep rendering while polls are skipped");
    }

    #[tokio::test]
    async fn dropped_sender_stops_the_loop() {
        let source = Arc::new(CountingSource::default());
        let (tx, rx) = watch::channel(false);
        drop(tx);
        let mut observer = Collect::default();
        tokio::time::timeout(StdDuration::from_secs(5), driver(source).run(&mut observer, rx))
            .await
            .expect("driver stops when sender is gone");
    }
}

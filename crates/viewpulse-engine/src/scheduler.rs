//! Poll and tick timers behind an injectable clock.
//!
//! [`Scheduler`] owns both intervals and only answers "what is due at this
//! instant". Real time is supplied by [`SystemClock`]; tests drive a
//! [`ManualClock`] through [`run_until`] and never sleep.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use viewpulse_core::AppConfig;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = at;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fire {
    Poll,
    Tick,
}

/// Receives scheduler events.
pub trait ScheduleHandler {
    fn on_poll(&mut self, now: DateTime<Utc>);
    fn on_tick(&mut self, now: DateTime<Utc>);
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    poll_interval: Duration,
    tick_interval: Duration,
    next_poll: Option<DateTime<Utc>>,
    next_tick: Option<DateTime<Utc>>,
}

impl Scheduler {
    /// Intervals shorter than one millisecond are raised to one millisecond.
    #[must_use]
    pub fn new(poll_interval: Duration, tick_interval: Duration) -> Self {
        let floor = Duration::milliseconds(1);
        Self {
            poll_interval: poll_interval.max(floor),
            tick_interval: tick_interval.max(floor),
            next_poll: None,
            next_tick: None,
        }
    }

    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        let ms = |v: u64| Duration::milliseconds(i64::try_from(v).unwrap_or(i64::MAX));
        Self::new(ms(config.poll_interval_ms), ms(config.tick_interval_ms))
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Arm both timers. The first poll is due immediately; the first tick one
    /// interval later.
    pub fn start(&mut self, now: DateTime<Utc>) {
        self.next_poll = Some(now);
        self.next_tick = Some(now + self.tick_interval);
    }

    #[must_use]
    pub fn is_started(&self) -> bool {
        self.next_poll.is_some()
    }

    /// Earliest pending deadline, or `None` before [`Scheduler::start`].
    #[must_use]
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        match (self.next_poll, self.next_tick) {
            (Some(p), Some(t)) => Some(p.min(t)),
            (p, t) => p.or(t),
        }
    }

    /// Everything due at `now`, poll before tick.
    ///
    /// Each timer fires at most once per call; deadlines missed while the
    /// caller was busy are coalesced rather than replayed.
    pub fn fire_due(&mut self, now: DateTime<Utc>) -> Vec<Fire> {
        let mut fired = Vec::with_capacity(2);
        if advance_if_due(&mut self.next_poll, self.poll_interval, now) {
            fired.push(Fire::Poll);
        }
        if advance_if_due(&mut self.next_tick, self.tick_interval, now) {
            fired.push(Fire::Tick);
        }
        fired
    }

    /// Dispatch everything due at `now` to `handler`.
    pub fn dispatch<H: ScheduleHandler + ?Sized>(&mut self, now: DateTime<Utc>, handler: &mut H) -> usize {
        let fired = self.fire_due(now);
        for fire in &fired {
            match fire {
                Fire::Poll => handler.on_poll(now),
                Fire::Tick => handler.on_tick(now),
            }
        }
        fired.len()
    }
}

fn advance_if_due(next: &mut Option<DateTime<Utc>>, interval: Duration, now: DateTime<Utc>) -> bool {
    let Some(deadline) = *next else {
        return false;
    };
    if deadline > now {
        return false;
    }
    let mut following = deadline + interval;
    while following <= now {
        following += interval;
    }
    *next = Some(following);
    true
}

/// Drive `scheduler` on `clock` up to and including `until`, jumping from
/// deadline to deadline. Returns the number of events dispatched.
pub fn run_until<H: ScheduleHandler + ?Sized>(
    scheduler: &mut Scheduler,
    clock: &ManualClock,
    until: DateTime<Utc>,
    handler: &mut H,
) -> usize {
    if !scheduler.is_started() {
        scheduler.start(clock.now());
    }

    let mut dispatched = 0;
    while let Some(deadline) = scheduler.next_deadline() {
        if deadline > until {
            break;
        }
        if deadline > clock.now() {
            clock.set(deadline);
        }
        dispatched += scheduler.dispatch(clock.now(), handler);
    }
    clock.set(until.max(clock.now()));
    dispatched
}

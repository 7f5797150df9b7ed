//! Time-windowed metrics poller.
//!
//! Two triggers ask for readings: a periodic tick that always targets the
//! current minute, and an operator-selected timestamp. Each request opens a
//! watch on one time bucket key and takes the first snapshot in which the
//! document exists, giving up after `fetch_timeout`.
//!
//! Only one request is live at a time. Starting a request aborts the previous
//! one and bumps a generation counter; a delivery carrying an old generation is
//! dropped, so a slow answer can never overwrite a newer selection.

use chrono::{DateTime, Utc};
use futures::{
    future::{self, AbortHandle, AbortRegistration, Abortable, Either, LocalBoxFuture},
    stream::{self, LocalBoxStream},
    Future, FutureExt, StreamExt,
};
use log::{debug, error, warn};
use std::{cell::RefCell, rc::Rc, time::Duration};

use crate::{
    bucket::{derive_time_bucket_key, TimeBucketKey},
    req::Reading,
    request::StoreError,
    series::TimeSeries,
    status,
};

pub const POLL_INTERVAL: Duration = Duration::from_secs(60);
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(120);
pub const STALE_AFTER_SECS: i64 = 60;

/// A datastore that can watch a single reading document.
pub trait ReadingSource {
    /// Snapshots of the document stored under `key`: `Ok(None)` while it does
    /// not exist. Dropping the stream releases the subscription.
    fn watch(&self, key: &TimeBucketKey) -> LocalBoxStream<'static, Result<Option<Reading>, StoreError>>;
}

/// Clock, timers and task spawning of the hosting event loop.
pub trait Platform {
    fn now(&self) -> DateTime<Utc>;
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()>;
    fn spawn(&self, task: LocalBoxFuture<'static, ()>);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollerConfig {
    pub poll_interval: Duration,
    pub fetch_timeout: Duration,
    pub stale_after: chrono::Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval: POLL_INTERVAL,
            fetch_timeout: FETCH_TIMEOUT,
            stale_after: chrono::Duration::seconds(STALE_AFTER_SECS),
        }
    }
}

#[derive(Debug)]
pub enum FetchOutcome {
    Delivered(Reading),
    /// Nothing existed under the key within the timeout.
    NotFound,
    Unavailable(StoreError),
    /// A newer request (or teardown) took over before this one finished.
    Superseded,
}

impl FetchOutcome {
    pub fn reading(&self) -> Option<&Reading> {
        match self {
            FetchOutcome::Delivered(reading) => Some(reading),
            _ => None,
        }
    }
}

/// Waits for the first snapshot in which `key` exists.
pub async fn fetch_reading<S, P>(
    source: &S,
    platform: &P,
    key: &TimeBucketKey,
    timeout: Duration,
) -> FetchOutcome
where
    S: ReadingSource + ?Sized,
    P: Platform + ?Sized,
{
    let watch = first_existing(source.watch(key), key);
    let deadline = platform.sleep(timeout);
    futures::pin_mut!(watch);

    match future::select(watch, deadline).await {
        Either::Left((outcome, _)) => {
            match &outcome {
                FetchOutcome::Delivered(_) => debug!("reading {key} delivered"),
                FetchOutcome::NotFound => warn!("watch on {key} closed before the reading appeared"),
                FetchOutcome::Unavailable(err) => error!("fetching reading {key} failed: {err}"),
                FetchOutcome::Superseded => {}
            }
            outcome
        }
        Either::Right(((), _)) => {
            warn!("no reading for {key} within {}s", timeout.as_secs());
            FetchOutcome::NotFound
        }
    }
}

async fn first_existing(
    mut snapshots: LocalBoxStream<'static, Result<Option<Reading>, StoreError>>,
    key: &TimeBucketKey,
) -> FetchOutcome {
    while let Some(snapshot) = snapshots.next().await {
        match snapshot {
            Ok(Some(reading)) => return FetchOutcome::Delivered(reading),
            Ok(None) => debug!("no document for {key} yet"),
            Err(err) => return FetchOutcome::Unavailable(err),
        }
    }
    FetchOutcome::NotFound
}

/// What the dashboard renders from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollerState {
    pub current: Option<Reading>,
    pub current_key: Option<TimeBucketKey>,
    pub last_updated: Option<DateTime<Utc>>,
    pub series: TimeSeries,
    pub loading: bool,
    pub pending_key: Option<TimeBucketKey>,
    generation: u64,
}

impl PollerState {
    pub fn record_sample(&mut self, key: TimeBucketKey, reading: Reading, at: DateTime<Utc>) {
        self.series.record(key.clone(), &reading);
        self.current = Some(reading);
        self.current_key = Some(key);
        self.last_updated = Some(at);
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

struct Inner<S, P> {
    source: S,
    platform: P,
    config: PollerConfig,
    state: RefCell<PollerState>,
    in_flight: RefCell<Option<AbortHandle>>,
    ticker: RefCell<Option<AbortHandle>>,
    listeners: RefCell<Vec<Rc<dyn Fn()>>>,
}

impl<S, P> Inner<S, P>
where
    S: ReadingSource,
    P: Platform,
{
    fn begin(&self, key: &TimeBucketKey) -> (u64, AbortRegistration) {
        let (handle, registration) = AbortHandle::new_pair();
        if let Some(previous) = self.in_flight.replace(Some(handle)) {
            previous.abort();
        }

        let generation = {
            let mut state = self.state.borrow_mut();
            state.generation += 1;
            state.loading = true;
            state.pending_key = Some(key.clone());
            state.generation
        };
        debug!("fetching reading {key} (request {generation})");
        self.notify();
        (generation, registration)
    }

    fn settle(&self, generation: u64, key: TimeBucketKey, outcome: FetchOutcome) -> FetchOutcome {
        {
            let mut state = self.state.borrow_mut();
            if state.generation != generation {
                debug!("discarding result for {key} from superseded request {generation}");
                return FetchOutcome::Superseded;
            }
            state.loading = false;
            state.pending_key = None;
            if let FetchOutcome::Delivered(reading) = &outcome {
                state.record_sample(key, reading.clone(), self.platform.now());
            }
        }
        self.in_flight.take();
        self.notify();
        outcome
    }

    fn notify(&self) {
        let listeners = self.listeners.borrow().clone();
        for listener in listeners {
            listener();
        }
    }
}

/// Cheap to clone; clones share the same state.
pub struct Poller<S, P> {
    inner: Rc<Inner<S, P>>,
}

impl<S, P> Clone for Poller<S, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S, P> Poller<S, P>
where
    S: ReadingSource + 'static,
    P: Platform + 'static,
{
    pub fn new(source: S, platform: P, config: PollerConfig) -> Self {
        Self {
            inner: Rc::new(Inner {
                source,
                platform,
                config,
                state: RefCell::new(PollerState::default()),
                in_flight: RefCell::new(None),
                ticker: RefCell::new(None),
                listeners: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &PollerConfig {
        &self.inner.config
    }

    /// Calls `listener` after every state change.
    pub fn subscribe(&self, listener: impl Fn() + 'static) {
        self.inner.listeners.borrow_mut().push(Rc::new(listener));
    }

    pub fn state(&self) -> PollerState {
        self.inner.state.borrow().clone()
    }

    pub fn current(&self) -> Option<Reading> {
        self.inner.state.borrow().current.clone()
    }

    pub fn series(&self) -> TimeSeries {
        self.inner.state.borrow().series.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().loading
    }

    pub fn is_stale(&self) -> bool {
        let last_updated = self.inner.state.borrow().last_updated;
        status::is_stale(last_updated, self.inner.platform.now(), self.inner.config.stale_after)
    }

    /// Appends a reading as if it had just been delivered for `key`.
    pub fn record_sample(&self, key: TimeBucketKey, reading: Reading) {
        let now = self.inner.platform.now();
        self.inner.state.borrow_mut().record_sample(key, reading, now);
        self.inner.notify();
    }

    /// Requests the reading stored under `key`, superseding any pending request.
    ///
    /// The request is registered immediately; the returned future performs the
    /// watch and must be driven for the result to land.
    pub fn fetch(&self, key: TimeBucketKey) -> impl Future<Output = FetchOutcome> + 'static {
        let (generation, registration) = self.inner.begin(&key);
        let inner = Rc::clone(&self.inner);

        async move {
            let watch = fetch_reading(&inner.source, &inner.platform, &key, inner.config.fetch_timeout);
            let outcome = Abortable::new(watch, registration)
                .await
                .unwrap_or(FetchOutcome::Superseded);
            inner.settle(generation, key, outcome)
        }
    }

    /// Operator picked a timestamp: fetch its minute in the background.
    pub fn select(&self, selected: DateTime<Utc>) -> TimeBucketKey {
        let key = derive_time_bucket_key(selected);
        self.spawn_fetch(key.clone());
        key
    }

    fn spawn_fetch(&self, key: TimeBucketKey) {
        let fetch = self.fetch(key);
        self.inner.platform.spawn(
            async move {
                fetch.await;
            }
            .boxed_local(),
        );
    }

    /// Keys of the periodic trigger: every `poll_interval`, the minute current
    /// at that moment (not the one that just ended).
    pub fn ticks(&self) -> LocalBoxStream<'static, TimeBucketKey> {
        let inner = Rc::clone(&self.inner);
        stream::unfold(inner, |inner| async move {
            inner.platform.sleep(inner.config.poll_interval).await;
            let key = derive_time_bucket_key(inner.platform.now());
            Some((key, inner))
        })
        .boxed_local()
    }

    /// Starts the periodic trigger. Calling it again restarts the schedule.
    pub fn start(&self) {
        let (handle, registration) = AbortHandle::new_pair();
        if let Some(previous) = self.inner.ticker.replace(Some(handle)) {
            previous.abort();
        }

        let poller = self.clone();
        let ticks = self.ticks();
        let periodic = async move {
            ticks
                .for_each(|key| {
                    poller.spawn_fetch(key);
                    future::ready(())
                })
                .await;
        };
        self.inner
            .platform
            .spawn(Abortable::new(periodic, registration).map(|_| ()).boxed_local());
    }

    /// Stops the periodic trigger, releases the pending watch and ignores
    /// anything still in flight. Listeners are dropped.
    pub fn shutdown(&self) {
        if let Some(ticker) = self.inner.ticker.take() {
            ticker.abort();
        }
        if let Some(fetch) = self.inner.in_flight.take() {
            fetch.abort();
        }
        {
            let mut state = self.inner.state.borrow_mut();
            state.generation += 1;
            state.loading = false;
            state.pending_key = None;
        }
        self.inner.listeners.borrow_mut().clear();
        debug!("poller shut down");
    }
}

use chrono::{DateTime, Utc};
use common::poller::Platform;
use futures::future::{FutureExt, LocalBoxFuture};
use std::time::Duration;

/// Browser clock and timers for the poller.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BrowserPlatform;

impl Platform for BrowserPlatform {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        yew::platform::time::sleep(duration).boxed_local()
    }

    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(task);
    }
}

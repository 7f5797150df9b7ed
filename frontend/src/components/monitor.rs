use chrono::Utc;
use common::{
    bucket::{derive_time_bucket_key, is_live},
    poller::{Poller, PollerConfig},
    req::MetricMask,
    request::StoreClient,
};
use web_sys::HtmlInputElement;
use yew::prelude::*;

use crate::{
    components::{chart_plotly::ChartPlotly, summary::Summary},
    platform::BrowserPlatform,
    request::Store,
    utils,
};

pub type ConsolePoller = Poller<StoreClient, BrowserPlatform>;

#[derive(Properties, PartialEq)]
pub struct Props {
    pub readings: Store,
    pub metric_mask: MetricMask,
}

#[function_component(Monitor)]
pub fn monitor(props: &Props) -> Html {
    let poller = use_memo(props.readings.clone(), |readings| {
        ConsolePoller::new(StoreClient::clone(readings), BrowserPlatform, PollerConfig::default())
    });
    let update = use_force_update();
    let selected = use_state_eq(Utc::now);

    // redraw on every poller change; tear everything down on unmount
    {
        let poller = poller.clone();
        let update = update.clone();
        use_effect_with(props.readings.clone(), move |_| {
            poller.subscribe(move || update.force_update());
            poller.start();
            move || poller.shutdown()
        });
    }
    {
        let poller = poller.clone();
        use_effect_with(*selected, move |selected| {
            poller.select(*selected);
            || ()
        });
    }
    // staleness and the "updated ... ago" line move with the clock
    yew_hooks::use_interval(move || update.force_update(), 1000);

    let on_date_changed = {
        let selected = selected.clone();
        Callback::from(move |e: Event| {
            let input: HtmlInputElement = e.target_unchecked_into();
            match utils::parse_datetime_local(&input.value()) {
                Some(ts) => selected.set(ts),
                None => log::warn!("ignoring picker value '{}'", input.value()),
            }
        })
    };

    let state = poller.state();
    let stale = poller.is_stale();
    let now = Utc::now();
    let live = is_live(*selected, now);
    let camera_feed = state
        .current
        .as_ref()
        .map(|r| r.camera_feed.clone())
        .filter(|feed| !feed.is_empty());

    html! {
        <div class="monitor">
            <div class="monitor-toolbar">
                <input type="datetime-local" class="form-control"
                    value={utils::to_datetime_local(*selected)} onchange={on_date_changed}/>
                <span class="bucket-key">{derive_time_bucket_key(*selected).to_string()}</span>
                if live {
                    <span class="badge badge-live">{"LIVE"}</span>
                }
                if state.loading {
                    <span class="loading">{"Loading..."}</span>
                }
                if stale {
                    <span class="badge badge-stale">{"Stale data"}</span>
                }
                if let Some(at) = state.last_updated {
                    <span class="last-updated">
                        {format!("Last updated {} ({} ago)", utils::format_local(at), utils::age(at, now))}
                    </span>
                }
            </div>

            <Summary current={state.current.clone()} series={state.series.clone()} {stale}/>

            if live {
                if let Some(feed) = camera_feed {
                    <div class="camera">
                        <iframe src={feed} title="Incubator camera" allowfullscreen=true></iframe>
                    </div>
                }
            }

            <div class="box-center">
                <ChartPlotly id="metrics-chart" series={state.series.clone()} metric_mask={props.metric_mask}/>
            </div>
        </div>
    }
}

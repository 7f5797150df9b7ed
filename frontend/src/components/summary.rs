use common::{
    req::{Metric, Reading},
    series::{Stats, TimeSeries},
    status::{self, Status},
};
use yew::{function_component, html, Html, Properties};

const NOT_AVAILABLE: &str = "--";

#[derive(Properties, PartialEq)]
pub struct Props {
    pub current: Option<Reading>,
    pub series: TimeSeries,
    pub stale: bool,
}

fn status_class(status: Status) -> &'static str {
    match status {
        Status::Critical => "status status-critical",
        Status::Warning => "status status-warning",
        Status::Stale => "status status-stale",
        Status::Good => "status status-good",
    }
}

fn metric_value(metric: Metric, value: f32) -> String {
    let precision = match metric {
        Metric::Temperature | Metric::UvRadiation => 1,
        _ => 0,
    };
    match metric.unit() {
        "" => format!("{value:.precision$}"),
        unit => format!("{value:.precision$} {unit}"),
    }
}

fn card(title: &str, value: Option<String>, status: Option<Status>, range: Option<String>) -> Html {
    let alert = status == Some(Status::Critical);
    html! {
        <div class="col-lg-4 col-md-6 col-sm-8 col-xs-12">
            <div class={if alert { "panel panel-danger" } else { "panel panel-default" }}>
                <div class="panel-heading">
                    <h4>{title}</h4>
                </div>
                <div class="panel-body">
                    <div class="metric-value">{value.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string())}</div>
                    if let (Some(_), Some(status)) = (value, status) {
                        <div class={status_class(status)}>{status.as_str()}</div>
                    }
                    if let Some(range) = range {
                        <div class="metric-range">{range}</div>
                    }
                </div>
            </div>
        </div>
    }
}

#[function_component(Summary)]
pub fn summary(props: &Props) -> Html {
    let cards: Html = Metric::ALL
        .iter()
        .map(|&metric| {
            let value = props.current.as_ref().map(|r| r.value(metric));
            let status = value.map(|v| status::metric(metric, v).displayed(props.stale));
            let range = props.series.stats(metric).map(|stats| {
                format!(
                    "session {} .. {}",
                    metric_value(metric, stats.y_min),
                    metric_value(metric, stats.y_max)
                )
            });
            card(metric.name(), value.map(|v| metric_value(metric, v)), status, range)
        })
        .collect();

    let flame = props.current.as_ref().map(|r| r.flame_detected);
    let flame_status = flame.map(|detected| status::flame(detected).displayed(props.stale));
    let flame_text = flame.map(|detected| if detected { "Detected" } else { "None" }.to_string());

    let overall = props
        .current
        .as_ref()
        .map(|r| status::classify(r).displayed(props.stale));

    html! {
        <>
            if let Some(overall) = overall {
                <div class={status_class(overall)}>{format!("Overall: {overall}")}</div>
            }
            <div class="row">
                {cards}
                {card("Flame", flame_text, flame_status, None)}
            </div>
        </>
    }
}

use common::{req::MetricMask, series::TimeSeries};
use plotly::{
    common::Mode,
    layout::{Axis, Margin},
    Configuration, Layout, Plot, Scatter,
};
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct Props {
    pub id: String,
    pub series: TimeSeries,
    pub metric_mask: MetricMask,
}

fn build_plot(series: &TimeSeries, mask: MetricMask) -> Plot {
    let mut plot = Plot::new();
    let x: Vec<String> = series
        .keys()
        .iter()
        .map(|key| key.naive().format("%Y-%m-%d %H:%M:%S").to_string())
        .collect();

    for metric in mask.metrics() {
        let trace = Scatter::new(x.clone(), series.values(metric).to_vec())
            .name(&metric.label())
            .mode(Mode::LinesMarkers);
        plot.add_trace(trace);
    }

    plot.set_configuration(
        Configuration::default()
            .display_logo(false)
            .editable(false)
            .display_mode_bar(plotly::configuration::DisplayModeBar::Hover),
    );
    plot.set_layout(
        Layout::default()
            .hover_mode(plotly::layout::HoverMode::XUnified)
            .auto_size(true)
            .margin(Margin::default().top(20).bottom(40).left(40).right(20))
            .x_axis(Axis::new().title("Time bucket".into())),
    );
    plot
}

#[function_component(ChartPlotly)]
pub fn chart_plotly(props: &Props) -> Html {
    let id = props.id.clone();
    let plot = build_plot(&props.series, props.metric_mask);
    let p = yew_hooks::use_async::<_, _, ()>(async move {
        plotly::bindings::new_plot(&id, &plot).await;
        Ok(())
    });

    use_effect_with(
        // the series only grows, so its length identifies it
        (props.series.len(), props.metric_mask),
        move |_| {
            p.run();
            || ()
        },
    );

    html! {
        <div class="chart" id={props.id.clone()}></div>
    }
}

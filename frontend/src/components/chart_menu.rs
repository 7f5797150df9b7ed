use common::req::{Metric, MetricMask};
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct Props {
    #[prop_or_default]
    pub visible: bool,

    // metric mask
    pub on_metric_mask_changed: Callback<(Metric, bool)>,
    pub metric_mask: MetricMask,
}

pub struct Model;

impl Component for Model {
    type Message = ();

    type Properties = Props;

    fn create(_ctx: &Context<Self>) -> Self {
        Self
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let metric_mask = ctx.props().metric_mask;

        // one checkbox per plotted metric
        let checkbox_list: Html = Metric::ALL
            .iter()
            .map(|&metric| {
                let cb = ctx.props().on_metric_mask_changed.clone();
                let onchange = Callback::from(move |e: Event| {
                    let input: web_sys::HtmlInputElement = e.target_unchecked_into();
                    cb.emit((metric, input.checked()));
                });
                let id = format!("metric-{}", metric.name().replace(' ', "-").to_lowercase());

                html! {
                    <li>
                        <div class="submenuitem">
                            <input type="checkbox" {onchange} id={id.clone()} checked={metric_mask.is_set(metric)}/>
                            <span><label for={id} class="submenulabel"><a>{format!(" {}", metric.label())}</a></label></span>
                        </div>
                    </li>
                }
            })
            .collect();

        html! {
            if ctx.props().visible {
                <ul class="nav nav-sidebar">
                    {checkbox_list}
                </ul>
            }
        }
    }
}

mod components;
mod platform;
mod request;
mod utils;

use common::req::{Metric, MetricMask, Role};
use log::error;
use yew::prelude::*;
use yew_router::prelude::*;

use crate::request::Stores;

#[derive(Debug, Clone, Routable, PartialEq)]
pub enum Route {
    #[at("/")]
    Login,
    #[at("/doctor/dashboard")]
    DoctorDashboard,
    #[at("/doctor/monitor/:id")]
    DoctorMonitor { id: String },
    #[at("/parent/monitor")]
    ParentMonitor,
    #[not_found]
    #[at("/404")]
    NotFound,
}

#[derive(Properties, PartialEq)]
pub struct Props {
    pub current_route: Route,

    // metric mask
    #[prop_or_default]
    pub on_metric_mask_changed: Callback<(Metric, bool)>,

    #[prop_or_default]
    pub metric_mask: MetricMask,
}

#[function_component(App)]
fn app() -> Html {
    let stores = use_memo((), |_| Stores::from_env());

    match &*stores {
        Ok(stores) => html! {
            <ContextProvider<Stores> context={stores.clone()}>
                <BrowserRouter>
                    <Switch<Route> render={switch} />
                </BrowserRouter>
            </ContextProvider<Stores>>
        },
        Err(err) => {
            error!("console startup failed: {err:#}");
            html! { <div class="alert alert-danger">{format!("Cannot reach the incubator stores: {err}")}</div> }
        }
    }
}

#[function_component(PageLogin)]
pub fn page_login() -> Html {
    let Some(stores) = use_context::<Stores>() else {
        return html! {};
    };

    html! {
        <div class="container-fluid">
            <h1 class="page-header text-center">{"Baby Incubator Monitoring System"}</h1>
            <div class="row">
                <components::login::LoginForm role={Role::Doctor} records={stores.records.clone()}/>
                <components::login::LoginForm role={Role::Parent} records={stores.records}/>
            </div>
        </div>
    }
}

#[function_component(PageDoctorDashboard)]
pub fn page_doctor_dashboard() -> Html {
    let Some(stores) = use_context::<Stores>() else {
        return html! {};
    };

    html! {
        <div class="container-fluid">
            <div class="row">
                <Sidebar current_route={Route::DoctorDashboard}/>
                <div class="col-sm-9 col-sm-offset-3 col-md-10 col-md-offset-2 main">
                    <h1 class="page-header">{"Doctor Dashboard"}</h1>
                    <components::incubators::IncubatorList records={stores.records}/>
                </div>
            </div>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct MonitorPageProps {
    pub current_route: Route,
    #[prop_or_default]
    pub incubator_id: Option<String>,
}

#[function_component(PageMonitor)]
pub fn page_monitor(props: &MonitorPageProps) -> Html {
    // metric mask
    let metric_mask_handle = use_state_eq(MetricMask::default);
    let on_metric_mask_changed: Callback<(Metric, bool)> = {
        let handle = metric_mask_handle.clone();
        Callback::from(move |(metric, active)| {
            let mut ret = *handle;
            ret.set(metric, active);
            handle.set(ret);
        })
    };

    let Some(stores) = use_context::<Stores>() else {
        return html! {};
    };

    html! {
        <div class="container-fluid">
            <div class="row">
                <Sidebar current_route={props.current_route.clone()}
                    {on_metric_mask_changed} metric_mask={*metric_mask_handle}
                />
                <div class="col-sm-9 col-sm-offset-3 col-md-10 col-md-offset-2 main">
                    <h1 class="page-header">{"Incubator Monitoring"}</h1>
                    if let Some(id) = props.incubator_id.clone() {
                        <components::incubators::IncubatorHeader records={stores.records.clone()} {id}/>
                    }
                    <components::monitor::Monitor readings={stores.readings} metric_mask={*metric_mask_handle}/>
                </div>
            </div>
        </div>
    }
}

#[function_component(Sidebar)]
pub fn sidebar(props: &Props) -> Html {
    let cr = &props.current_route;
    let monitoring = matches!(cr, Route::DoctorMonitor { .. } | Route::ParentMonitor);
    let class_active = move |r: Route| {
        if *cr == r {
            "active"
        } else {
            ""
        }
    };

    html! {
        <div class="col-sm-3 col-md-2 sidebar">
            <ul class="nav nav-sidebar">
                if *cr != Route::ParentMonitor {
                    <li class={class_active(Route::DoctorDashboard)}>
                        <Link<Route> to={Route::DoctorDashboard}>{"Incubators"}</Link<Route>>
                    </li>
                }
                <li>
                    <Link<Route> to={Route::Login}>{"Logout"}</Link<Route>>
                </li>
                <components::chart_menu::Model visible={monitoring}
                    on_metric_mask_changed={props.on_metric_mask_changed.clone()}
                    metric_mask={props.metric_mask}
                />
                <li/>
            </ul>

            <ul class="nav nav-sidebar fix-bottom">
            {format!("v{}", env!("CARGO_PKG_VERSION"))}
            </ul>

        </div>
    }
}

fn switch(routes: Route) -> Html {
    match routes {
        Route::Login => html! { <PageLogin/> },
        Route::DoctorDashboard => html! { <PageDoctorDashboard/> },
        Route::DoctorMonitor { id } => html! {
            <PageMonitor current_route={Route::DoctorMonitor { id: id.clone() }} incubator_id={Some(id)}/>
        },
        Route::ParentMonitor => html! { <PageMonitor current_route={Route::ParentMonitor}/> },
        Route::NotFound => html! { <h1>{ "404" }</h1> },
    }
}

fn main() {
    wasm_logger::init(wasm_logger::Config::default());
    yew::Renderer::<App>::new().render();
}

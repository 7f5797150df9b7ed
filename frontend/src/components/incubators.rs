use common::req::Incubator;
use yew::prelude::*;
use yew_hooks::{use_async_with_options, UseAsyncHandle, UseAsyncOptions};
use yew_router::prelude::*;

use crate::{request::Store, Route};

#[derive(Properties, PartialEq)]
pub struct Props {
    pub records: Store,
}

#[hook]
fn use_incubators(records: Store) -> UseAsyncHandle<Vec<Incubator>, String> {
    use_async_with_options(
        async move {
            records.incubators().await.map_err(|err| {
                log::error!("fetching incubators failed: {err}");
                err.to_string()
            })
        },
        UseAsyncOptions::enable_auto(),
    )
}

fn date_of_birth(incubator: &Incubator) -> String {
    chrono::NaiveDate::parse_from_str(&incubator.baby_dob, "%Y-%m-%d")
        .map(|date| date.format("%d.%m.%Y").to_string())
        .unwrap_or_else(|_| incubator.baby_dob.clone())
}

#[function_component(IncubatorList)]
pub fn incubator_list(props: &Props) -> Html {
    let incubators = use_incubators(props.records.clone());
    let navigator = use_navigator();

    if incubators.loading {
        return html! { <div class="loading">{"Loading incubators..."}</div> };
    }
    if let Some(err) = &incubators.error {
        return html! { <div class="alert alert-danger">{format!("Cannot get incubator list: {err}")}</div> };
    }

    let list = incubators.data.clone().unwrap_or_default();
    let count = list.len();
    let cards: Html = list
        .into_iter()
        .map(|incubator| {
            let onclick = {
                let navigator = navigator.clone();
                let id = incubator.id.clone();
                Callback::from(move |_: MouseEvent| {
                    if let Some(navigator) = &navigator {
                        navigator.push(&Route::DoctorMonitor { id: id.clone() });
                    }
                })
            };
            html! {
                <div class="border-rounded card" key={incubator.id.clone()} {onclick}>
                    <div class="card-header">
                        <div class="card-item">{incubator.parent_name.clone()}</div>
                        <hr/>
                    </div>
                    <div class="card-content">
                        <div class="card-item">{"Parent ID"}</div><div>{incubator.parent_id.clone()}</div>
                        <div class="card-item">{"Gender"}</div><div>{incubator.baby_gender.clone()}</div>
                        <div class="card-item">{"DOB"}</div><div>{date_of_birth(&incubator)}</div>
                    </div>
                </div>
            }
        })
        .collect();

    html! {
        <>
            <div class="incubator-count">{format!("{count} Incubators")}</div>
            {cards}
        </>
    }
}

#[derive(Properties, PartialEq)]
pub struct HeaderProps {
    pub records: Store,
    pub id: String,
}

/// Parent and baby details above a monitored incubator.
#[function_component(IncubatorHeader)]
pub fn incubator_header(props: &HeaderProps) -> Html {
    let incubators = use_incubators(props.records.clone());
    let incubator = incubators
        .data
        .as_ref()
        .and_then(|list| list.iter().find(|i| i.id == props.id));

    match incubator {
        Some(incubator) => html! {
            <div class="incubator-header">
                <h3>{incubator.parent_name.clone()}</h3>
                <span>{format!("Parent ID {} | {} | born {}", incubator.parent_id, incubator.baby_gender, date_of_birth(incubator))}</span>
            </div>
        },
        None if incubators.loading => html! {},
        None => html! { <div class="incubator-header">{"No incubator found"}</div> },
    }
}

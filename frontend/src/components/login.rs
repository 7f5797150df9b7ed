use common::req::{Credentials, Role};
use log::error;
use web_sys::HtmlInputElement;
use yew::prelude::*;
use yew_router::prelude::*;

use crate::{request::Store, Route};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Attempt {
    Idle,
    Checking,
    Rejected,
    Failed,
}

#[derive(Properties, PartialEq)]
pub struct Props {
    pub role: Role,
    pub records: Store,
}

/// Where a successful login lands.
pub fn landing(role: Role) -> Route {
    match role {
        Role::Doctor => Route::DoctorDashboard,
        Role::Parent => Route::ParentMonitor,
    }
}

fn title(role: Role) -> &'static str {
    match role {
        Role::Doctor => "Doctor Login",
        Role::Parent => "Parent Login",
    }
}

fn bind(field: UseStateHandle<String>) -> Callback<InputEvent> {
    Callback::from(move |e: InputEvent| {
        let input: HtmlInputElement = e.target_unchecked_into();
        field.set(input.value());
    })
}

#[function_component(LoginForm)]
pub fn login_form(props: &Props) -> Html {
    let username = use_state(String::new);
    let password = use_state(String::new);
    let attempt = use_state(|| Attempt::Idle);
    let navigator = use_navigator();

    let onsubmit = {
        let role = props.role;
        let records = props.records.clone();
        let username = username.clone();
        let password = password.clone();
        let attempt = attempt.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            attempt.set(Attempt::Checking);

            let credentials = Credentials {
                username: (*username).clone(),
                password: (*password).clone(),
            };
            let records = records.clone();
            let attempt = attempt.clone();
            let navigator = navigator.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match records.check_credentials(role, &credentials).await {
                    Ok(true) => {
                        attempt.set(Attempt::Idle);
                        if let Some(navigator) = navigator {
                            navigator.push(&landing(role));
                        }
                    }
                    Ok(false) => attempt.set(Attempt::Rejected),
                    Err(err) => {
                        error!("{role} login failed: {err}");
                        attempt.set(Attempt::Failed);
                    }
                }
            });
        })
    };

    let message = match *attempt {
        Attempt::Rejected => Some(format!("Invalid {} credentials", props.role)),
        Attempt::Failed => Some("An error occurred. Please try again later.".to_string()),
        Attempt::Idle | Attempt::Checking => None,
    };
    let checking = *attempt == Attempt::Checking;

    html! {
        <div class="col-md-6">
            <div class="panel panel-default">
                <div class="panel-heading"><h3>{title(props.role)}</h3></div>
                <div class="panel-body">
                    <form {onsubmit}>
                        <input type="text" class="form-control" placeholder="Username"
                            value={(*username).clone()} oninput={bind(username.clone())} required=true/>
                        <input type="password" class="form-control" placeholder="Password"
                            value={(*password).clone()} oninput={bind(password.clone())} required=true/>
                        if let Some(message) = message {
                            <div class="alert alert-danger">{message}</div>
                        }
                        <button type="submit" class="btn btn-primary" disabled={checking}>
                            {if checking { "Checking..." } else { "Login" }}
                        </button>
                    </form>
                </div>
            </div>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_land_on_their_pages() {
        assert!(landing(Role::Doctor) == Route::DoctorDashboard);
        assert!(landing(Role::Parent) == Route::ParentMonitor);
    }
}

use actix_web::{
    delete, get,
    http::StatusCode,
    post, put,
    web::{self, ServiceConfig},
    HttpResponse, ResponseError,
};
use common::{
    bucket::TimeBucketKey,
    req::{CredentialCheck, Credentials, Doctor, DoctorFields, Incubator, IncubatorFields, Reading, Role},
};
use log::{debug, error, info};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;

use crate::web::AppState;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("database lock poisoned")]
    Poisoned,
    #[error("storage failure")]
    Storage(#[from] anyhow::Error),
}

#[derive(serde::Serialize)]
struct ErrorBody {
    error: String,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Poisoned | ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ApiError::Storage(err) = self {
            error!("storage failure: {err:#}");
        }
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }
}

fn parse_key(raw: &str) -> Result<TimeBucketKey, ApiError> {
    TimeBucketKey::parse(raw).map_err(|e| ApiError::BadRequest(e.to_string()))
}

fn require(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::BadRequest(format!("{field} must not be empty")));
    }
    Ok(())
}

#[get("/api/values/{key}")]
async fn api_reading(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<web::Json<Reading>, ApiError> {
    let key = parse_key(&path)?;
    state
        .with_db(|db| db.reading(&key))?
        .map(web::Json)
        .ok_or(ApiError::NotFound("reading"))
}

#[derive(serde::Deserialize, Debug)]
struct WatchParams {
    wait_ms: Option<u64>,
}

/// Long-poll snapshot of one reading document: answers as soon as it exists,
/// or with 204 once the wait is over.
#[get("/api/values/{key}/watch")]
async fn api_watch_reading(
    path: web::Path<String>,
    query: web::Query<WatchParams>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let key = parse_key(&path)?;
    let wait = query
        .wait_ms
        .map(Duration::from_millis)
        .unwrap_or(state.max_watch)
        .min(state.max_watch);

    // subscribe before the first read so a write in between is not missed
    let mut updates = state.updates.subscribe();
    if let Some(reading) = state.with_db(|db| db.reading(&key))? {
        return Ok(HttpResponse::Ok().json(reading));
    }

    let deadline = tokio::time::sleep(wait);
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            _ = &mut deadline => return Ok(HttpResponse::NoContent().finish()),
            update = updates.recv() => match update {
                Ok(written) if written != key => {}
                Ok(_) | Err(RecvError::Lagged(_)) => {
                    if let Some(reading) = state.with_db(|db| db.reading(&key))? {
                        return Ok(HttpResponse::Ok().json(reading));
                    }
                }
                Err(RecvError::Closed) => return Ok(HttpResponse::NoContent().finish()),
            },
        }
    }
}

#[put("/api/values/{key}")]
async fn api_put_reading(
    path: web::Path<String>,
    body: web::Json<Reading>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let key = parse_key(&path)?;
    state.store_reading(key, &body)?;
    Ok(HttpResponse::NoContent().finish())
}

#[post("/api/auth/{role}")]
async fn api_check_credentials(
    path: web::Path<String>,
    body: web::Json<Credentials>,
    state: web::Data<AppState>,
) -> Result<web::Json<CredentialCheck>, ApiError> {
    let role: Role = path.parse().map_err(ApiError::BadRequest)?;
    let valid = state.with_db(|db| db.credentials_match(role, &body))?;
    if !valid {
        info!("rejected {role} login for '{}'", body.username);
    }
    Ok(web::Json(CredentialCheck { valid }))
}

#[get("/api/doctors")]
async fn api_doctors(state: web::Data<AppState>) -> Result<web::Json<Vec<Doctor>>, ApiError> {
    Ok(web::Json(state.with_db(|db| db.doctors())?))
}

#[post("/api/doctors")]
async fn api_create_doctor(
    body: web::Json<DoctorFields>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    require("doctorID", &body.doctor_id)?;
    let doctor = state.with_db(|db| db.insert_doctor(&body))?;
    debug!("registered doctor {}", doctor.id);
    Ok(HttpResponse::Created().json(doctor))
}

#[put("/api/doctors/{id}")]
async fn api_update_doctor(
    path: web::Path<String>,
    body: web::Json<DoctorFields>,
    state: web::Data<AppState>,
) -> Result<web::Json<Doctor>, ApiError> {
    require("doctorID", &body.doctor_id)?;
    state
        .with_db(|db| db.update_doctor(&path, &body))?
        .map(web::Json)
        .ok_or(ApiError::NotFound("doctor"))
}

#[delete("/api/doctors/{id}")]
async fn api_delete_doctor(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    if state.with_db(|db| db.delete_doctor(&path))? {
        Ok(HttpResponse::NoContent().finish())
    } else {
        Err(ApiError::NotFound("doctor"))
    }
}

#[get("/api/incubators")]
async fn api_incubators(state: web::Data<AppState>) -> Result<web::Json<Vec<Incubator>>, ApiError> {
    Ok(web::Json(state.with_db(|db| db.incubators())?))
}

#[post("/api/incubators")]
async fn api_create_incubator(
    body: web::Json<IncubatorFields>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    require("parentID", &body.parent_id)?;
    let incubator = state.with_db(|db| {
        if db.parent_id_taken(&body.parent_id, None)? {
            return Ok(None);
        }
        db.insert_incubator(&body).map(Some)
    })?;

    match incubator {
        Some(incubator) => {
            debug!("added incubator {}", incubator.id);
            Ok(HttpResponse::Created().json(incubator))
        }
        None => Err(ApiError::Conflict("parent ID already exists".to_string())),
    }
}

#[put("/api/incubators/{id}")]
async fn api_update_incubator(
    path: web::Path<String>,
    body: web::Json<IncubatorFields>,
    state: web::Data<AppState>,
) -> Result<web::Json<Incubator>, ApiError> {
    require("parentID", &body.parent_id)?;
    let id = path.into_inner();
    let updated = state.with_db(|db| {
        if db.parent_id_taken(&body.parent_id, Some(&id))? {
            return Ok(Err(ApiError::Conflict("parent ID already exists".to_string())));
        }
        Ok(db.update_incubator(&id, &body)?.ok_or(ApiError::NotFound("incubator")))
    })?;

    updated.map(web::Json)
}

#[delete("/api/incubators/{id}")]
async fn api_delete_incubator(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    if state.with_db(|db| db.delete_incubator(&path))? {
        Ok(HttpResponse::NoContent().finish())
    } else {
        Err(ApiError::NotFound("incubator"))
    }
}

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(api_reading)
        .service(api_watch_reading)
        .service(api_put_reading)
        .service(api_check_credentials)
        .service(api_doctors)
        .service(api_create_doctor)
        .service(api_update_doctor)
        .service(api_delete_doctor)
        .service(api_incubators)
        .service(api_create_incubator)
        .service(api_update_incubator)
        .service(api_delete_incubator);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Db;
    use actix_web::{test, web::Data, App};

    const KEY: &str = "2024-03-05_09-07";

    fn state() -> AppState {
        AppState::new(Db::connect(":memory:").unwrap(), Duration::from_secs(5))
    }

    fn reading() -> Reading {
        Reading {
            temperature: 36.5,
            humidity: 55.0,
            air_quality_index: 40.0,
            uv_radiation: 0.5,
            flame_detected: false,
            light_intensity: 250.0,
            camera_feed: String::new(),
        }
    }

    fn incubator(parent_id: &str) -> IncubatorFields {
        IncubatorFields {
            parent_name: "Grace".into(),
            parent_id: parent_id.into(),
            parent_password: "secret".into(),
            baby_gender: "M".into(),
            baby_dob: "2024-03-01".into(),
        }
    }

    #[actix_web::test]
    async fn missing_reading_is_404_and_bad_key_is_400() {
        let app = test::init_service(App::new().app_data(Data::new(state())).configure(configure)).await;

        let req = test::TestRequest::get().uri(&format!("/api/values/{KEY}")).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get().uri("/api/values/yesterday").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn stored_reading_is_served() {
        let app = test::init_service(App::new().app_data(Data::new(state())).configure(configure)).await;

        let req = test::TestRequest::put()
            .uri(&format!("/api/values/{KEY}"))
            .set_json(reading())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

        let req = test::TestRequest::get().uri(&format!("/api/values/{KEY}")).to_request();
        let served: Reading = test::call_and_read_body_json(&app, req).await;
        assert_eq!(served, reading());
    }

    #[actix_web::test]
    async fn watch_times_out_with_no_content() {
        let app = test::init_service(App::new().app_data(Data::new(state())).configure(configure)).await;

        let req = test::TestRequest::get()
            .uri(&format!("/api/values/{KEY}/watch?wait_ms=50"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);
    }

    #[actix_web::test]
    async fn watch_answers_when_the_reading_is_written() {
        let state = state();
        let app = test::init_service(App::new().app_data(Data::new(state.clone())).configure(configure)).await;

        let writer = state.clone();
        actix_web::rt::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            let other = TimeBucketKey::parse("2024-03-05_09-06").unwrap();
            writer.store_reading(other, &reading()).unwrap();
            tokio::time::sleep(Duration::from_millis(50)).await;
            writer.store_reading(KEY.parse().unwrap(), &reading()).unwrap();
        });

        let req = test::TestRequest::get()
            .uri(&format!("/api/values/{KEY}/watch?wait_ms=2000"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let served: Reading = test::read_body_json(resp).await;
        assert_eq!(served, reading());
    }

    #[actix_web::test]
    async fn credential_check_matches_both_fields() {
        let state = state();
        state
            .with_db(|db| db.insert_incubator(&incubator("p-1")))
            .unwrap();
        let app = test::init_service(App::new().app_data(Data::new(state)).configure(configure)).await;

        let check = |password: &str| {
            test::TestRequest::post()
                .uri("/api/auth/parent")
                .set_json(Credentials {
                    username: "p-1".into(),
                    password: password.into(),
                })
                .to_request()
        };
        let ok: CredentialCheck = test::call_and_read_body_json(&app, check("secret")).await;
        assert!(ok.valid);
        let wrong: CredentialCheck = test::call_and_read_body_json(&app, check("guess")).await;
        assert!(!wrong.valid);

        let req = test::TestRequest::post()
            .uri("/api/auth/admin")
            .set_json(Credentials::default())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn duplicate_parent_id_is_a_conflict() {
        let app = test::init_service(App::new().app_data(Data::new(state())).configure(configure)).await;

        let create = || {
            test::TestRequest::post()
                .uri("/api/incubators")
                .set_json(incubator("p-1"))
                .to_request()
        };
        assert_eq!(test::call_service(&app, create()).await.status(), StatusCode::CREATED);
        assert_eq!(test::call_service(&app, create()).await.status(), StatusCode::CONFLICT);

        let req = test::TestRequest::get().uri("/api/incubators").to_request();
        let listed: Vec<Incubator> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(listed.len(), 1);
    }

    #[actix_web::test]
    async fn unknown_doctor_updates_are_404() {
        let app = test::init_service(App::new().app_data(Data::new(state())).configure(configure)).await;

        let req = test::TestRequest::put()
            .uri("/api/doctors/nope")
            .set_json(DoctorFields {
                doctor_name: "Ada".into(),
                doctor_id: "ada".into(),
                doctor_password: "pw".into(),
            })
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::delete().uri("/api/doctors/nope").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::post()
            .uri("/api/doctors")
            .set_json(DoctorFields::default())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }
}

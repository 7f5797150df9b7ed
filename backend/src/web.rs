use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use actix_cors::Cors;
use actix_web::{
    get,
    http::header,
    middleware::Logger,
    web::{self, Data},
    App, HttpResponse, HttpServer, Responder,
};
use common::{bucket::TimeBucketKey, req::Reading};
use log::debug;
use tokio::sync::broadcast;

use crate::{
    api::{self, ApiError},
    config::Config,
    db::Db,
};

/// Written keys are fanned out to every open watch request.
const UPDATE_CAPACITY: usize = 64;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Db>>,
    pub updates: broadcast::Sender<TimeBucketKey>,
    pub max_watch: Duration,
}

impl AppState {
    pub fn new(db: Db, max_watch: Duration) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CAPACITY);
        Self {
            db: Arc::new(Mutex::new(db)),
            updates,
            max_watch,
        }
    }

    pub fn with_db<T>(&self, f: impl FnOnce(&mut Db) -> anyhow::Result<T>) -> Result<T, ApiError> {
        let mut db = self.db.lock().map_err(|_| ApiError::Poisoned)?;
        Ok(f(&mut *db)?)
    }

    /// Upserts the reading and wakes everyone watching `key`.
    pub fn store_reading(&self, key: TimeBucketKey, reading: &Reading) -> Result<(), ApiError> {
        self.with_db(|db| db.upsert_reading(&key, reading))?;
        debug!("stored reading {key}");
        // no open watch is not an error
        let _ = self.updates.send(key);
        Ok(())
    }
}

#[get("/")]
async fn hello(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "service": "incubator store",
        "maxWatchMs": state.max_watch.as_millis() as u64,
    }))
}

pub async fn new_http_server(state: AppState, config: &Config) -> std::io::Result<()> {
    let allowed_origin = config.allowed_origin.clone();
    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&allowed_origin)
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
            .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
            .max_age(3600);

        App::new()
            .app_data(Data::new(state.clone()))
            .service(hello)
            .configure(api::configure)
            .wrap(cors)
            .wrap(Logger::default())
    })
    .bind((config.bind_host.as_str(), config.port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use common::{
        poller::{fetch_reading, FetchOutcome, Platform},
        req::{Credentials, DoctorFields, IncubatorFields, Role},
        request::StoreClient,
    };
    use futures::future::{FutureExt, LocalBoxFuture};

    struct RuntimePlatform;

    impl Platform for RuntimePlatform {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }

        fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
            tokio::time::sleep(duration).boxed_local()
        }

        fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
            actix_web::rt::spawn(task);
        }
    }

    fn reading(temperature: f32) -> Reading {
        Reading {
            temperature,
            humidity: 50.0,
            air_quality_index: 30.0,
            uv_radiation: 0.2,
            flame_detected: false,
            light_intensity: 200.0,
            camera_feed: "http://cam.local/1".into(),
        }
    }

    #[actix_web::test]
    async fn store_client_round_trip() {
        let state = AppState::new(Db::connect(":memory:").unwrap(), Duration::from_secs(2));
        let server = HttpServer::new({
            let state = state.clone();
            move || {
                App::new()
                    .app_data(Data::new(state.clone()))
                    .service(hello)
                    .configure(api::configure)
            }
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();
        let addr = server.addrs()[0];
        let server = server.run();
        let handle = server.handle();
        actix_web::rt::spawn(server);

        let client = StoreClient::new(format!("http://{addr}/")).with_long_poll(Duration::from_millis(300));

        // readings
        let key = TimeBucketKey::parse("2024-03-05_09-07").unwrap();
        assert_eq!(client.reading(&key).await.unwrap(), None);
        client.put_reading(&key, &reading(36.8)).await.unwrap();
        assert_eq!(client.reading(&key).await.unwrap(), Some(reading(36.8)));

        // a fetch that starts before the write still delivers it
        let later = TimeBucketKey::parse("2024-03-05_09-08").unwrap();
        let writer = client.clone();
        let written = later.clone();
        actix_web::rt::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            writer.put_reading(&written, &reading(37.9)).await.unwrap();
        });
        let outcome = fetch_reading(&client, &RuntimePlatform, &later, Duration::from_secs(5)).await;
        assert!(matches!(outcome, FetchOutcome::Delivered(r) if r == reading(37.9)));

        // records and credentials
        let parent = Credentials {
            username: "p-7".into(),
            password: "pw".into(),
        };
        assert!(!client.check_credentials(Role::Parent, &parent).await.unwrap());
        let fields = IncubatorFields {
            parent_name: "Lin".into(),
            parent_id: "p-7".into(),
            parent_password: "pw".into(),
            baby_gender: "F".into(),
            baby_dob: "2024-02-28".into(),
        };
        let incubator = client.create_incubator(&fields).await.unwrap();
        assert!(client.check_credentials(Role::Parent, &parent).await.unwrap());
        let duplicate = client.create_incubator(&fields).await.unwrap_err();
        assert_eq!(duplicate.status(), Some(409));
        client.delete_incubator(&incubator.id).await.unwrap();
        assert!(client.incubators().await.unwrap().is_empty());

        let doctor = client
            .create_doctor(&DoctorFields {
                doctor_name: "Ada".into(),
                doctor_id: "ada".into(),
                doctor_password: "pw".into(),
            })
            .await
            .unwrap();
        let renamed = client
            .update_doctor(
                &doctor.id,
                &DoctorFields {
                    doctor_name: "Ada L.".into(),
                    doctor_id: "ada".into(),
                    doctor_password: "pw".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.doctor_name, "Ada L.");
        assert_eq!(client.doctors().await.unwrap(), vec![renamed]);
        client.delete_doctor(&doctor.id).await.unwrap();
        let gone = client.delete_doctor(&doctor.id).await.unwrap_err();
        assert_eq!(gone.status(), Some(404));

        handle.stop(true).await;
    }
}

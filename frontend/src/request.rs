use anyhow::{anyhow, Context, Result};
use common::request::StoreClient;
use std::{ops::Deref, rc::Rc};

/// Port the store listens on when no explicit URL was baked in at build time.
const STORE_PORT: u16 = 8081;

/// Shared handle on one store, compared by identity so it can travel in props.
#[derive(Debug, Clone)]
pub struct Store(Rc<StoreClient>);

impl Store {
    pub fn new(client: StoreClient) -> Self {
        Self(Rc::new(client))
    }
}

impl PartialEq for Store {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for Store {
    type Target = StoreClient;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// The two stores the console talks to: sensor readings and the
/// doctor/incubator records.
#[derive(Debug, Clone, PartialEq)]
pub struct Stores {
    pub readings: Store,
    pub records: Store,
}

impl Stores {
    pub fn from_env() -> Result<Self> {
        let readings = match option_env!("INCUBATOR_READINGS_URL") {
            Some(url) => url.to_string(),
            None => host_url()?,
        };
        let records = match option_env!("INCUBATOR_RECORDS_URL") {
            Some(url) => url.to_string(),
            None => host_url()?,
        };
        log::info!("readings store {readings}, records store {records}");

        Ok(Self {
            readings: Store::new(StoreClient::new(readings)),
            records: Store::new(StoreClient::new(records)),
        })
    }
}

fn host_url() -> Result<String> {
    let location = web_sys::window().context("no browser window")?.location();
    let protocol = location
        .protocol()
        .map_err(|_| anyhow!("page protocol unavailable"))?;
    let hostname = location
        .hostname()
        .map_err(|_| anyhow!("page hostname unavailable"))?;
    Ok(format!("{protocol}//{hostname}:{STORE_PORT}"))
}

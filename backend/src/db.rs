use crate::schema::*;
use anyhow::Result;
use common::{
    bucket::TimeBucketKey,
    req::{Credentials, Doctor, DoctorFields, Incubator, IncubatorFields, Reading, Role},
};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use uuid::Uuid;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS readings (
    bucket_key TEXT PRIMARY KEY NOT NULL,
    temperature REAL NOT NULL,
    humidity REAL NOT NULL,
    air_quality_index REAL NOT NULL,
    uv_radiation REAL NOT NULL,
    flame_detected BOOLEAN NOT NULL,
    light_intensity REAL NOT NULL,
    camera_feed TEXT NOT NULL DEFAULT ''
);
CREATE TABLE IF NOT EXISTS doctors (
    id TEXT PRIMARY KEY NOT NULL,
    doctor_name TEXT NOT NULL,
    doctor_id TEXT NOT NULL,
    doctor_password TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS incubators (
    id TEXT PRIMARY KEY NOT NULL,
    parent_name TEXT NOT NULL,
    parent_id TEXT NOT NULL,
    parent_password TEXT NOT NULL,
    baby_gender TEXT NOT NULL,
    baby_dob TEXT NOT NULL
);
"#;

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name=readings)]
pub struct ReadingRow {
    pub bucket_key: String,
    pub temperature: f32,       // °C
    pub humidity: f32,          // percent
    pub air_quality_index: f32, // unitless
    pub uv_radiation: f32,      // mW/cm²
    pub flame_detected: bool,
    pub light_intensity: f32, // lux
    pub camera_feed: String,
}

impl ReadingRow {
    fn new(key: &TimeBucketKey, reading: &Reading) -> Self {
        Self {
            bucket_key: key.to_string(),
            temperature: reading.temperature,
            humidity: reading.humidity,
            air_quality_index: reading.air_quality_index,
            uv_radiation: reading.uv_radiation,
            flame_detected: reading.flame_detected,
            light_intensity: reading.light_intensity,
            camera_feed: reading.camera_feed.clone(),
        }
    }
}

impl From<ReadingRow> for Reading {
    fn from(row: ReadingRow) -> Self {
        Reading {
            temperature: row.temperature,
            humidity: row.humidity,
            air_quality_index: row.air_quality_index,
            uv_radiation: row.uv_radiation,
            flame_detected: row.flame_detected,
            light_intensity: row.light_intensity,
            camera_feed: row.camera_feed,
        }
    }
}

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name=doctors)]
pub struct DoctorRow {
    pub id: String,
    pub doctor_name: String,
    pub doctor_id: String,
    pub doctor_password: String,
}

impl From<DoctorRow> for Doctor {
    fn from(row: DoctorRow) -> Self {
        Doctor {
            id: row.id,
            doctor_name: row.doctor_name,
            doctor_id: row.doctor_id,
            doctor_password: row.doctor_password,
        }
    }
}

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name=incubators)]
pub struct IncubatorRow {
    pub id: String,
    pub parent_name: String,
    pub parent_id: String,
    pub parent_password: String,
    pub baby_gender: String,
    pub baby_dob: String,
}

impl From<IncubatorRow> for Incubator {
    fn from(row: IncubatorRow) -> Self {
        Incubator {
            id: row.id,
            parent_name: row.parent_name,
            parent_id: row.parent_id,
            parent_password: row.parent_password,
            baby_gender: row.baby_gender,
            baby_dob: row.baby_dob,
        }
    }
}

pub struct Db {
    conn: SqliteConnection,
}

impl Db {
    pub fn connect(database_url: &str) -> Result<Self> {
        let mut conn = SqliteConnection::establish(database_url)?;
        conn.batch_execute(SCHEMA)?;

        Ok(Self { conn })
    }

    pub fn reading(&mut self, key: &TimeBucketKey) -> Result<Option<Reading>> {
        let row = readings::table
            .find(key.as_str())
            .first::<ReadingRow>(&mut self.conn)
            .optional()?;

        Ok(row.map(Reading::from))
    }

    /// Writes the reading for `key`, replacing whatever was stored there.
    pub fn upsert_reading(&mut self, key: &TimeBucketKey, reading: &Reading) -> Result<()> {
        diesel::replace_into(readings::table)
            .values(&ReadingRow::new(key, reading))
            .execute(&mut self.conn)?;

        Ok(())
    }

    pub fn doctors(&mut self) -> Result<Vec<Doctor>> {
        let res = doctors::table
            .order(doctors::doctor_name.asc())
            .load::<DoctorRow>(&mut self.conn)?;

        Ok(res.into_iter().map(Doctor::from).collect())
    }

    pub fn insert_doctor(&mut self, fields: &DoctorFields) -> Result<Doctor> {
        let row = DoctorRow {
            id: Uuid::new_v4().to_string(),
            doctor_name: fields.doctor_name.clone(),
            doctor_id: fields.doctor_id.clone(),
            doctor_password: fields.doctor_password.clone(),
        };
        diesel::insert_into(doctors::table)
            .values(&row)
            .execute(&mut self.conn)?;

        Ok(row.into())
    }

    /// `None` when no doctor has this id.
    pub fn update_doctor(&mut self, id: &str, fields: &DoctorFields) -> Result<Option<Doctor>> {
        let updated = diesel::update(doctors::table.find(id))
            .set((
                doctors::doctor_name.eq(&fields.doctor_name),
                doctors::doctor_id.eq(&fields.doctor_id),
                doctors::doctor_password.eq(&fields.doctor_password),
            ))
            .execute(&mut self.conn)?;

        Ok((updated > 0).then(|| Doctor {
            id: id.to_string(),
            doctor_name: fields.doctor_name.clone(),
            doctor_id: fields.doctor_id.clone(),
            doctor_password: fields.doctor_password.clone(),
        }))
    }

    pub fn delete_doctor(&mut self, id: &str) -> Result<bool> {
        let deleted = diesel::delete(doctors::table.find(id)).execute(&mut self.conn)?;
        Ok(deleted > 0)
    }

    pub fn incubators(&mut self) -> Result<Vec<Incubator>> {
        let res = incubators::table
            .order(incubators::parent_name.asc())
            .load::<IncubatorRow>(&mut self.conn)?;

        Ok(res.into_iter().map(Incubator::from).collect())
    }

    /// Whether another incubator already uses `parent_id`.
    pub fn parent_id_taken(&mut self, parent_id: &str, except: Option<&str>) -> Result<bool> {
        let ids: Vec<String> = incubators::table
            .filter(incubators::parent_id.eq(parent_id))
            .select(incubators::id)
            .load(&mut self.conn)?;

        Ok(ids.iter().any(|id| Some(id.as_str()) != except))
    }

    pub fn insert_incubator(&mut self, fields: &IncubatorFields) -> Result<Incubator> {
        let row = IncubatorRow {
            id: Uuid::new_v4().to_string(),
            parent_name: fields.parent_name.clone(),
            parent_id: fields.parent_id.clone(),
            parent_password: fields.parent_password.clone(),
            baby_gender: fields.baby_gender.clone(),
            baby_dob: fields.baby_dob.clone(),
        };
        diesel::insert_into(incubators::table)
            .values(&row)
            .execute(&mut self.conn)?;

        Ok(row.into())
    }

    pub fn update_incubator(&mut self, id: &str, fields: &IncubatorFields) -> Result<Option<Incubator>> {
        let updated = diesel::update(incubators::table.find(id))
            .set((
                incubators::parent_name.eq(&fields.parent_name),
                incubators::parent_id.eq(&fields.parent_id),
                incubators::parent_password.eq(&fields.parent_password),
                incubators::baby_gender.eq(&fields.baby_gender),
                incubators::baby_dob.eq(&fields.baby_dob),
            ))
            .execute(&mut self.conn)?;

        Ok((updated > 0).then(|| Incubator {
            id: id.to_string(),
            parent_name: fields.parent_name.clone(),
            parent_id: fields.parent_id.clone(),
            parent_password: fields.parent_password.clone(),
            baby_gender: fields.baby_gender.clone(),
            baby_dob: fields.baby_dob.clone(),
        }))
    }

    pub fn delete_incubator(&mut self, id: &str) -> Result<bool> {
        let deleted = diesel::delete(incubators::table.find(id)).execute(&mut self.conn)?;
        Ok(deleted > 0)
    }

    /// Plain equality match of username and password against the role's collection.
    pub fn credentials_match(&mut self, role: Role, credentials: &Credentials) -> Result<bool> {
        let count: i64 = match role {
            Role::Doctor => doctors::table
                .filter(doctors::doctor_id.eq(&credentials.username))
                .filter(doctors::doctor_password.eq(&credentials.password))
                .count()
                .get_result(&mut self.conn)?,
            Role::Parent => incubators::table
                .filter(incubators::parent_id.eq(&credentials.username))
                .filter(incubators::parent_password.eq(&credentials.password))
                .count()
                .get_result(&mut self.conn)?,
        };

        Ok(count > 0)
    }
}

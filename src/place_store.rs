use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Transaction};
use std::cmp::Ordering;
use std::path::Path;

use crate::coordinate::Coordinate;
use crate::utils;

/* Named places the user chose to keep, e.g. "home". This is the only thing
we persist; everything else lives for the app session.
*/

pub const DB_FILE_NAME: &str = "places.db";

#[derive(Clone, Debug, PartialEq)]
pub struct SavedPlace {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl SavedPlace {
    pub fn new(name: impl Into<String>, position: Coordinate) -> Self {
        SavedPlace {
            name: name.into(),
            latitude: position.latitude,
            longitude: position.longitude,
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

fn create_place_table(tx: &Transaction) -> Result<()> {
    tx.execute(
        "CREATE TABLE `place` (
        `name`	TEXT NOT NULL,
        `lat`	REAL NOT NULL,
        `lng`	REAL NOT NULL,
        PRIMARY KEY(`name`)
        )",
        (),
    )?;
    Ok(())
}

fn add_updated_at(tx: &Transaction) -> Result<()> {
    tx.execute(
        "ALTER TABLE `place` ADD COLUMN `updated_at_sec` INTEGER NOT NULL DEFAULT 0",
        (),
    )?;
    Ok(())
}

#[allow(clippy::type_complexity)]
fn open_db_and_run_migration(
    support_dir: &str,
    file_name: &str,
    migrations: &[&dyn Fn(&Transaction) -> Result<()>],
) -> Result<Connection> {
    debug!("open and run migration for {}", file_name);
    let mut conn = Connection::open(Path::new(support_dir).join(file_name))?;
    let tx = conn.transaction()?;

    let version = utils::db::init_metadata_and_get_version(&tx)? as usize;
    let target_version = migrations.len();
    debug!(
        "current version = {}, target_version = {}",
        version, target_version
    );
    match version.cmp(&target_version) {
        Ordering::Equal => (),
        Ordering::Less => {
            for (i, f) in migrations.iter().enumerate().skip(version) {
                info!("running migration for version: {}", i + 1);
                f(&tx)?;
            }
            utils::db::set_version_in_metadata(&tx, target_version as i32)?;
        }
        Ordering::Greater => {
            bail!(
                "version too high: current version = {}, target_version = {}",
                version,
                target_version
            );
        }
    }
    tx.commit()?;
    Ok(conn)
}

pub struct PlaceStore {
    conn: Connection,
}

impl PlaceStore {
    pub fn open(support_dir: &str) -> Result<Self> {
        let conn = open_db_and_run_migration(
            support_dir,
            DB_FILE_NAME,
            &[&create_place_table, &add_updated_at],
        )?;
        Ok(PlaceStore { conn })
    }

    /// Inserts or overwrites the place with the same name.
    pub fn save(&self, place: &SavedPlace) -> Result<()> {
        if place.name.trim().is_empty() {
            bail!("place name must not be empty");
        }
        self.conn.execute(
            "INSERT OR REPLACE INTO `place` (name, lat, lng, updated_at_sec) VALUES (?1, ?2, ?3, ?4)",
            (
                &place.name,
                place.latitude,
                place.longitude,
                chrono::Utc::now().timestamp(),
            ),
        )?;
        info!("[place_store] saved {:?}", place.name);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Option<SavedPlace>> {
        let place = self
            .conn
            .query_row(
                "SELECT name, lat, lng FROM `place` WHERE name = ?1",
                [name],
                |row| {
                    Ok(SavedPlace {
                        name: row.get(0)?,
                        latitude: row.get(1)?,
                        longitude: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(place)
    }

    /// Most recently saved first.
    pub fn list(&self) -> Result<Vec<SavedPlace>> {
        let mut query = self
            .conn
            .prepare("SELECT name, lat, lng FROM `place` ORDER BY updated_at_sec DESC, name ASC")?;
        let results = query.query_map((), |row| {
            Ok(SavedPlace {
                name: row.get(0)?,
                latitude: row.get(1)?,
                longitude: row.get(2)?,
            })
        })?;
        let mut places = Vec::new();
        for place in results {
            places.push(place?);
        }
        Ok(places)
    }

    pub fn delete(&self, name: &str) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM `place` WHERE name = ?1", [name])?;
        Ok(changed > 0)
    }
}

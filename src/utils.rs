use std::f64::consts::PI;

const EARTH_RADIUS_M: f64 = 6_371_008.8;

fn to_rad(deg: f64) -> f64 {
    deg / 180.0 * PI
}

// https://en.wikipedia.org/wiki/Haversine_formula
pub fn haversine_distance_m(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = to_rad(lat2 - lat1);
    let d_lng = to_rad(lng2 - lng1);
    let a = (d_lat / 2.0).sin().powi(2)
        + to_rad(lat1).cos() * to_rad(lat2).cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().asin()
}

pub mod db {
    use anyhow::Result;
    use rusqlite::{OptionalExtension, Transaction};

    pub fn init_metadata_and_get_version(tx: &Transaction) -> Result<i32> {
        tx.execute(
            "CREATE TABLE IF NOT EXISTS `db_metadata` (
            `key`	TEXT NOT NULL,
            `value`	TEXT,
            PRIMARY KEY(`key`)
            )",
            (),
        )?;
        let version_str: Option<String> = tx
            .query_row(
                "SELECT `value` FROM `db_metadata` WHERE key='version'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(match version_str {
            None => 0,
            Some(s) => s.parse()?,
        })
    }

    pub fn set_version_in_metadata(tx: &Transaction, version: i32) -> Result<()> {
        tx.execute(
            "INSERT OR REPLACE INTO `db_metadata` (key, value) VALUES (?1, ?2)",
            ("version", version.to_string()),
        )?;
        Ok(())
    }
}

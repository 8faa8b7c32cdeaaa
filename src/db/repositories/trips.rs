use anyhow::{bail, Context, Result};
use chrono::SecondsFormat;
use rusqlite::{params, Row};

use crate::db::{
    helpers::{parse_datetime, parse_kind, required},
    models::{TripKind, TripRecord},
    Database,
};

fn row_to_record(row: &Row) -> Result<TripRecord> {
    let id: String = row.get("id")?;
    let recorded_at: String = row.get("recorded_at")?;
    let kind: String = row.get("kind")?;
    let total_fare: f64 = row.get("total_fare")?;
    let recorded_at = parse_datetime(&recorded_at, "recorded_at")?;

    let record = match parse_kind(&kind)? {
        TripKind::Time => TripRecord::Time {
            id,
            recorded_at,
            stopped_seconds: required(row.get("stopped_seconds")?, "stopped_seconds")?,
            moving_seconds: required(row.get("moving_seconds")?, "moving_seconds")?,
            total_seconds: required(row.get("total_seconds")?, "total_seconds")?,
            total_fare,
        },
        TripKind::Distance => TripRecord::Distance {
            id,
            recorded_at,
            distance_km: required(row.get("distance_km")?, "distance_km")?,
            total_fare,
        },
    };
    Ok(record)
}

impl Database {
    pub async fn insert_trip_record(&self, record: &TripRecord) -> Result<()> {
        let record = record.clone();
        self.execute(move |conn| {
            let (stopped, moving, total, distance) = match &record {
                TripRecord::Time {
                    stopped_seconds,
                    moving_seconds,
                    total_seconds,
                    ..
                } => (
                    Some(*stopped_seconds),
                    Some(*moving_seconds),
                    Some(*total_seconds),
                    None,
                ),
                TripRecord::Distance { distance_km, .. } => (None, None, None, Some(*distance_km)),
            };

            let inserted = conn
                .execute(
                    "INSERT INTO trips (id, recorded_at, kind, stopped_seconds, moving_seconds, total_seconds, distance_km, total_fare)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        record.id(),
                        record
                            .recorded_at()
                            .to_rfc3339_opts(SecondsFormat::Micros, true),
                        record.kind().as_str(),
                        stopped,
                        moving,
                        total,
                        distance,
                        record.total_fare(),
                    ],
                )
                .context("failed to insert trip record")?;

            if inserted != 1 {
                bail!("expected to insert one trip record, inserted {inserted}");
            }
            Ok(())
        })
        .await
    }

    /// Every recorded trip, newest first.
    pub async fn list_trip_records(&self) -> Result<Vec<TripRecord>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, recorded_at, kind, stopped_seconds, moving_seconds, total_seconds, distance_km, total_fare
                 FROM trips
                 ORDER BY recorded_at DESC, rowid DESC",
            )?;

            let mut rows = stmt.query([])?;
            let mut records = Vec::new();
            while let Some(row) = rows.next()? {
                records.push(row_to_record(row)?);
            }

            Ok(records)
        })
        .await
    }

    pub async fn count_trip_records(&self) -> Result<u64> {
        self.execute(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM trips", [], |row| row.get(0))?;
            Ok(u64::try_from(count).unwrap_or(0))
        })
        .await
    }
}

use anyhow::Result;
use async_trait::async_trait;

use crate::db::{Database, TripRecord};

/// Where completed trips go. The controller writes exactly one record per
/// finished time trip or recorded distance trip.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn save(&self, record: &TripRecord) -> Result<()>;
    async fn read_all(&self) -> Result<Vec<TripRecord>>;
}

#[async_trait]
impl HistoryStore for Database {
    async fn save(&self, record: &TripRecord) -> Result<()> {
        self.insert_trip_record(record).await
    }

    async fn read_all(&self) -> Result<Vec<TripRecord>> {
        self.list_trip_records().await
    }
}

//! synthetic raw trip frames shared by the feature tests.
use std::sync::Arc;

use arrow::{
    array::{ArrayRef, Float64Array, Int64Array, RecordBatch, StringArray},
    datatypes::{DataType, Field, Schema, SchemaRef},
};

use super::columns;
use crate::session::{DataFrame, Session, SessionConfig};

#[derive(Debug, Clone)]
pub struct RawTrip {
    pub key: String,
    pub fare_amount: Option<f64>,
    pub pickup_datetime: Option<String>,
    pub pickup_longitude: Option<f64>,
    pub pickup_latitude: Option<f64>,
    pub dropoff_longitude: Option<f64>,
    pub dropoff_latitude: Option<f64>,
    pub passenger_count: Option<i64>,
}

/// a deterministic trip inside Manhattan with a valid fare and passenger count.
pub fn valid_trip(i: usize) -> RawTrip {
    RawTrip {
        key: format!("trip-{i}"),
        fare_amount: Some(5.0 + (i % 40) as f64 * 1.5),
        pickup_datetime: Some(format!(
            "2015-{:02}-{:02} {:02}:{:02}:00 UTC",
            1 + i % 12,
            1 + i % 28,
            i % 24,
            i % 60
        )),
        pickup_longitude: Some(-73.99 + (i % 10) as f64 * 0.005),
        pickup_latitude: Some(40.73 + (i % 7) as f64 * 0.004),
        dropoff_longitude: Some(-73.95 - (i % 5) as f64 * 0.006),
        dropoff_latitude: Some(40.76 + (i % 3) as f64 * 0.01),
        passenger_count: Some(1 + (i % 6) as i64),
    }
}

pub fn session() -> Session {
    Session::start(SessionConfig {
        num_executors: 2,
        executor_cores: 1,
        ..Default::default()
    })
    .expect("test invariant failed: session did not start")
}

pub fn raw_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(columns::KEY, DataType::Utf8, true),
        Field::new(columns::FARE_AMOUNT, DataType::Float64, true),
        Field::new(columns::PICKUP_DATETIME, DataType::Utf8, true),
        Field::new(columns::PICKUP_LONGITUDE, DataType::Float64, true),
        Field::new(columns::PICKUP_LATITUDE, DataType::Float64, true),
        Field::new(columns::DROPOFF_LONGITUDE, DataType::Float64, true),
        Field::new(columns::DROPOFF_LATITUDE, DataType::Float64, true),
        Field::new(columns::PASSENGER_COUNT, DataType::Int64, true),
    ]))
}

/// builds a raw frame, splitting the trips into partitions of `partition_rows`.
pub fn raw_frame(session: &Session, trips: &[RawTrip], partition_rows: usize) -> DataFrame {
    let schema = raw_schema();
    let partitions = trips
        .chunks(partition_rows.max(1))
        .map(|chunk| {
            let columns: Vec<ArrayRef> = vec![
                Arc::new(StringArray::from(
                    chunk.iter().map(|t| Some(t.key.clone())).collect::<Vec<_>>(),
                )),
                Arc::new(Float64Array::from(
                    chunk.iter().map(|t| t.fare_amount).collect::<Vec<_>>(),
                )),
                Arc::new(StringArray::from(
                    chunk
                        .iter()
                        .map(|t| t.pickup_datetime.clone())
                        .collect::<Vec<_>>(),
                )),
                Arc::new(Float64Array::from(
                    chunk.iter().map(|t| t.pickup_longitude).collect::<Vec<_>>(),
                )),
                Arc::new(Float64Array::from(
                    chunk.iter().map(|t| t.pickup_latitude).collect::<Vec<_>>(),
                )),
                Arc::new(Float64Array::from(
                    chunk.iter().map(|t| t.dropoff_longitude).collect::<Vec<_>>(),
                )),
                Arc::new(Float64Array::from(
                    chunk.iter().map(|t| t.dropoff_latitude).collect::<Vec<_>>(),
                )),
                Arc::new(Int64Array::from(
                    chunk.iter().map(|t| t.passenger_count).collect::<Vec<_>>(),
                )),
            ];
            RecordBatch::try_new(schema.clone(), columns)
                .expect("test invariant failed: raw batch is malformed")
        })
        .collect::<Vec<_>>();
    session
        .create_dataframe(schema, partitions)
        .expect("test invariant failed: raw frame is malformed")
}

/// renders trips as delimited text in the column order of the raw records.
/// missing values are written as empty fields.
pub fn trips_csv(trips: &[RawTrip]) -> String {
    fn field<T: ToString>(value: &Option<T>) -> String {
        value.as_ref().map(|v| v.to_string()).unwrap_or_default()
    }
    let mut text = columns::RAW_COLUMNS.join(",");
    text.push('\n');
    for t in trips {
        let row = [
            t.key.clone(),
            field(&t.fare_amount),
            field(&t.pickup_datetime),
            field(&t.pickup_longitude),
            field(&t.pickup_latitude),
            field(&t.dropoff_longitude),
            field(&t.dropoff_latitude),
            field(&t.passenger_count),
        ];
        text.push_str(&row.join(","));
        text.push('\n');
    }
    text
}

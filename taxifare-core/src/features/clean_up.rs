use arrow::array::{Array, BooleanArray, Float64Array, RecordBatch};

use super::{columns, FeatureError, TripBounds, TripEndpoints};
use crate::session::{batch_ops, DataFrame, SessionError};

/// drops trips outside the default New York bounds, with invalid passenger
/// counts or fares, or whose pickup and dropoff coordinates are identical.
pub fn clean_up(df: &DataFrame) -> Result<DataFrame, FeatureError> {
    clean_up_with(df, &TripBounds::default())
}

/// [`clean_up`] with user-provided bounds. rows with a null in any tested
/// column are dropped.
pub fn clean_up_with(df: &DataFrame, bounds: &TripBounds) -> Result<DataFrame, FeatureError> {
    bounds.validate()?;
    let result = df.filter(|batch| clean_up_mask(batch, bounds))?;
    Ok(result)
}

/// evaluates the conjunction of the clean-up predicates for each row.
pub fn clean_up_mask(batch: &RecordBatch, bounds: &TripBounds) -> Result<BooleanArray, SessionError> {
    let pickup_lon = batch_ops::float_column(batch, columns::PICKUP_LONGITUDE)?;
    let pickup_lat = batch_ops::float_column(batch, columns::PICKUP_LATITUDE)?;
    let dropoff_lon = batch_ops::float_column(batch, columns::DROPOFF_LONGITUDE)?;
    let dropoff_lat = batch_ops::float_column(batch, columns::DROPOFF_LATITUDE)?;
    let passengers = batch_ops::float_column(batch, columns::PASSENGER_COUNT)?;
    let fare = batch_ops::float_column(batch, columns::FARE_AMOUNT)?;

    let mask = (0..batch.num_rows())
        .map(|row| {
            let endpoints = (
                value(&pickup_lon, row),
                value(&pickup_lat, row),
                value(&dropoff_lon, row),
                value(&dropoff_lat, row),
            );
            let keep = match (endpoints, value(&passengers, row), value(&fare, row)) {
                ((Some(plon), Some(plat), Some(dlon), Some(dlat)), Some(p), Some(f)) => {
                    let trip = TripEndpoints {
                        pickup_longitude: plon,
                        pickup_latitude: plat,
                        dropoff_longitude: dlon,
                        dropoff_latitude: dlat,
                    };
                    bounds.accepts(&trip, p, f)
                }
                _ => false,
            };
            Some(keep)
        })
        .collect::<BooleanArray>();
    Ok(mask)
}

fn value(array: &Float64Array, row: usize) -> Option<f64> {
    array.is_valid(row).then(|| array.value(row))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::features::test_frames::{raw_frame, session, valid_trip, RawTrip};

    fn crafted_invalid() -> Vec<RawTrip> {
        let base = valid_trip(3);
        vec![
            RawTrip {
                pickup_longitude: Some(-80.0),
                ..base.clone()
            },
            RawTrip {
                dropoff_latitude: Some(42.5),
                ..base.clone()
            },
            RawTrip {
                passenger_count: Some(0),
                ..base.clone()
            },
            RawTrip {
                passenger_count: Some(7),
                ..base.clone()
            },
            RawTrip {
                fare_amount: Some(0.0),
                ..base.clone()
            },
            RawTrip {
                fare_amount: Some(250.0),
                ..base.clone()
            },
            RawTrip {
                fare_amount: None,
                ..base.clone()
            },
            RawTrip {
                dropoff_longitude: base.pickup_longitude,
                dropoff_latitude: base.pickup_latitude,
                ..base.clone()
            },
        ]
    }

    #[test]
    fn test_clean_up_drops_each_invalid_row() {
        let session = session();
        let mut trips = (0..100).map(valid_trip).collect::<Vec<_>>();
        trips.extend(crafted_invalid());
        let df = raw_frame(&session, &trips, 16);
        let cleaned = clean_up(&df).unwrap();
        assert_eq!(cleaned.num_rows(), 100);
        assert_eq!(cleaned.columns(), df.columns());
    }

    #[test]
    fn test_surviving_rows_satisfy_every_predicate() {
        let session = session();
        let mut trips = (0..50).map(valid_trip).collect::<Vec<_>>();
        trips.extend(crafted_invalid());
        trips.extend((50..80).map(valid_trip));
        let df = raw_frame(&session, &trips, 7);
        let cleaned = clean_up(&df).unwrap().collect().unwrap();
        let bounds = TripBounds::default();
        let col = |name: &str| batch_ops::float_column(&cleaned, name).unwrap();
        let (plon, plat) = (col(columns::PICKUP_LONGITUDE), col(columns::PICKUP_LATITUDE));
        let (dlon, dlat) = (col(columns::DROPOFF_LONGITUDE), col(columns::DROPOFF_LATITUDE));
        let (passengers, fare) = (col(columns::PASSENGER_COUNT), col(columns::FARE_AMOUNT));
        for row in 0..cleaned.num_rows() {
            assert!((-76.0..=-72.0).contains(&plon.value(row)));
            assert!((-76.0..=-72.0).contains(&dlon.value(row)));
            assert!((38.0..=42.0).contains(&plat.value(row)));
            assert!((38.0..=42.0).contains(&dlat.value(row)));
            assert!((1.0..=6.0).contains(&passengers.value(row)));
            assert!(fare.value(row) > 0.0 && fare.value(row) < 250.0);
            let trip = TripEndpoints {
                pickup_longitude: plon.value(row),
                pickup_latitude: plat.value(row),
                dropoff_longitude: dlon.value(row),
                dropoff_latitude: dlat.value(row),
            };
            assert!(bounds.accepts(&trip, passengers.value(row), fare.value(row)));
        }
    }

    #[test]
    fn test_single_out_of_bounds_row_leaves_empty_frame() {
        let session = session();
        let trip = RawTrip {
            dropoff_longitude: Some(-71.5),
            ..valid_trip(0)
        };
        let df = raw_frame(&session, &[trip], 4);
        let cleaned = clean_up(&df).unwrap();
        assert_eq!(cleaned.num_rows(), 0);
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let session = session();
        let df = raw_frame(&session, &[valid_trip(0)], 4)
            .drop(&[columns::FARE_AMOUNT])
            .unwrap();
        assert!(clean_up(&df).is_err());
    }
}

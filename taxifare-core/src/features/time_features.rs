use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Int32Array, RecordBatch};
use serde::{Deserialize, Serialize};

use super::{
    columns,
    datetime_ops::{self, CalendarFields, LateNightRule},
    FeatureError,
};
use crate::session::{batch_ops, DataFrame, SessionError};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct TimeFeatureConfig {
    pub late_night_rule: LateNightRule,
}

/// appends calendar fields and the evening/overnight indicators derived from
/// the pickup timestamp. the overnight flag keeps its recorded, never-true rule.
pub fn add_time_features(df: &DataFrame) -> Result<DataFrame, FeatureError> {
    add_time_features_with(df, &TimeFeatureConfig::default())
}

pub fn add_time_features_with(
    df: &DataFrame,
    config: &TimeFeatureConfig,
) -> Result<DataFrame, FeatureError> {
    let rule = config.late_night_rule;
    let result = df.with_columns(|batch| time_feature_columns(batch, rule))?;
    Ok(result)
}

/// computes the time feature columns of one partition in the order of
/// [`columns::TIME_FEATURE_COLUMNS`]. rows with a missing or unparseable
/// timestamp get nulls in every time feature.
pub fn time_feature_columns(
    batch: &RecordBatch,
    late_night_rule: LateNightRule,
) -> Result<Vec<(String, ArrayRef)>, SessionError> {
    let stamps = batch_ops::string_column(batch, columns::PICKUP_DATETIME)?;
    let fields = (0..stamps.len())
        .map(|row| {
            if stamps.is_null(row) {
                None
            } else {
                datetime_ops::parse_pickup_datetime(stamps.value(row))
                    .map(|dt| CalendarFields::from(&dt))
            }
        })
        .collect::<Vec<_>>();

    let extractors: [fn(&CalendarFields, LateNightRule) -> i32; 9] = [
        |f, _| f.day,
        |f, _| f.hour,
        |f, _| f.day_of_week,
        |f, _| f.week_of_year,
        |f, _| f.month,
        |f, _| f.quarter,
        |f, _| f.year,
        |f, _| datetime_ops::night_flag(f.hour, f.day_of_week),
        |f, rule| rule.flag(f.hour),
    ];
    let result = columns::TIME_FEATURE_COLUMNS
        .iter()
        .zip(extractors)
        .map(|(name, extract)| {
            let values = fields
                .iter()
                .map(|f| f.as_ref().map(|f| extract(f, late_night_rule)))
                .collect::<Int32Array>();
            (name.to_string(), Arc::new(values) as ArrayRef)
        })
        .collect();
    Ok(result)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::features::test_frames::{raw_frame, session, valid_trip, RawTrip};
    use arrow::{array::AsArray, datatypes::Int32Type};

    fn int_values(batch: &RecordBatch, name: &str) -> Vec<Option<i32>> {
        batch
            .column_by_name(name)
            .unwrap()
            .as_primitive::<Int32Type>()
            .iter()
            .collect()
    }

    #[test]
    fn test_time_features_for_known_timestamps() {
        let session = session();
        let trips = vec![
            RawTrip {
                // Monday evening commute
                pickup_datetime: Some(String::from("2009-06-15 17:26:21 UTC")),
                ..valid_trip(0)
            },
            RawTrip {
                // Saturday evening, not a weekday
                pickup_datetime: Some(String::from("2011-08-20 18:00:00 UTC")),
                ..valid_trip(1)
            },
            RawTrip {
                pickup_datetime: Some(String::from("2012-11-30 03:15:00 UTC")),
                ..valid_trip(2)
            },
        ];
        let df = raw_frame(&session, &trips, 2);
        let with_time = add_time_features(&df).unwrap();
        let mut expected_columns = df.columns();
        expected_columns.extend(columns::TIME_FEATURE_COLUMNS.iter().map(|c| c.to_string()));
        assert_eq!(with_time.columns(), expected_columns);

        let batch = with_time.collect().unwrap();
        assert_eq!(int_values(&batch, columns::DAY), vec![Some(15), Some(20), Some(30)]);
        assert_eq!(int_values(&batch, columns::HOUR_OF_DAY), vec![Some(17), Some(18), Some(3)]);
        assert_eq!(int_values(&batch, columns::DAY_OF_WEEK), vec![Some(0), Some(5), Some(4)]);
        assert_eq!(int_values(&batch, columns::WEEK_OF_YEAR), vec![Some(25), Some(33), Some(48)]);
        assert_eq!(int_values(&batch, columns::MONTH_OF_YEAR), vec![Some(6), Some(8), Some(11)]);
        assert_eq!(int_values(&batch, columns::QUARTER_OF_YEAR), vec![Some(2), Some(3), Some(4)]);
        assert_eq!(int_values(&batch, columns::YEAR), vec![Some(2009), Some(2011), Some(2012)]);
        assert_eq!(int_values(&batch, columns::NIGHT), vec![Some(1), Some(0), Some(0)]);
        assert_eq!(int_values(&batch, columns::LATE_NIGHT), vec![Some(0), Some(0), Some(0)]);
    }

    #[test]
    fn test_late_night_zero_for_every_hour() {
        let session = session();
        let trips = (0..24)
            .map(|hour| RawTrip {
                pickup_datetime: Some(format!("2014-03-0{} {hour:02}:30:00 UTC", 3 + hour % 5)),
                ..valid_trip(hour)
            })
            .collect::<Vec<_>>();
        let df = raw_frame(&session, &trips, 5);
        let batch = add_time_features(&df).unwrap().collect().unwrap();
        assert!(int_values(&batch, columns::LATE_NIGHT)
            .into_iter()
            .all(|v| v == Some(0)));

        let wrapped = TimeFeatureConfig {
            late_night_rule: LateNightRule::Wrapped,
        };
        let batch = add_time_features_with(&df, &wrapped)
            .unwrap()
            .collect()
            .unwrap();
        let fired = int_values(&batch, columns::LATE_NIGHT)
            .into_iter()
            .filter(|v| *v == Some(1))
            .count();
        assert_eq!(fired, 11);
    }

    #[test]
    fn test_unparseable_timestamp_gives_nulls() {
        let session = session();
        let trips = vec![
            RawTrip {
                pickup_datetime: Some(String::from("not a time")),
                ..valid_trip(0)
            },
            RawTrip {
                pickup_datetime: None,
                ..valid_trip(1)
            },
        ];
        let df = raw_frame(&session, &trips, 4);
        let batch = add_time_features(&df).unwrap().collect().unwrap();
        for name in columns::TIME_FEATURE_COLUMNS {
            assert_eq!(int_values(&batch, name), vec![None, None], "{name}");
        }
    }

    #[test]
    fn test_timestamp_typed_column() {
        use arrow::array::TimestampSecondArray;
        use chrono::NaiveDate;

        let session = session();
        let df = raw_frame(&session, &[valid_trip(0), valid_trip(1)], 4);
        let seconds = |y, m, d, h| {
            NaiveDate::from_ymd_opt(y, m, d)
                .and_then(|date| date.and_hms_opt(h, 26, 21))
                .expect("test invariant failed: valid date")
                .and_utc()
                .timestamp()
        };
        let stamps = TimestampSecondArray::from(vec![
            Some(seconds(2009, 6, 15, 17)),
            Some(seconds(2012, 11, 30, 3)),
        ]);
        let typed = df
            .with_column(columns::PICKUP_DATETIME, |_| {
                Ok(Arc::new(stamps.clone()) as ArrayRef)
            })
            .unwrap();
        assert!(matches!(
            typed
                .schema()
                .field_with_name(columns::PICKUP_DATETIME)
                .unwrap()
                .data_type(),
            arrow::datatypes::DataType::Timestamp(_, _)
        ));

        let batch = add_time_features(&typed).unwrap().collect().unwrap();
        assert_eq!(int_values(&batch, columns::HOUR_OF_DAY), vec![Some(17), Some(3)]);
        assert_eq!(int_values(&batch, columns::DAY_OF_WEEK), vec![Some(0), Some(4)]);
        assert_eq!(int_values(&batch, columns::WEEK_OF_YEAR), vec![Some(25), Some(48)]);
        assert_eq!(int_values(&batch, columns::YEAR), vec![Some(2009), Some(2012)]);
    }
}

//! column names of the raw trip records and of the engineered features.

pub const KEY: &str = "key";
pub const FARE_AMOUNT: &str = "fare_amount";
pub const PICKUP_DATETIME: &str = "pickup_datetime";
pub const PICKUP_LONGITUDE: &str = "pickup_longitude";
pub const PICKUP_LATITUDE: &str = "pickup_latitude";
pub const DROPOFF_LONGITUDE: &str = "dropoff_longitude";
pub const DROPOFF_LATITUDE: &str = "dropoff_latitude";
pub const PASSENGER_COUNT: &str = "passenger_count";

pub const DAY: &str = "day";
pub const HOUR_OF_DAY: &str = "hour_of_day";
pub const DAY_OF_WEEK: &str = "day_of_week";
pub const WEEK_OF_YEAR: &str = "week_of_year";
pub const MONTH_OF_YEAR: &str = "month_of_year";
pub const QUARTER_OF_YEAR: &str = "quarter_of_year";
pub const YEAR: &str = "year";
pub const NIGHT: &str = "night";
pub const LATE_NIGHT: &str = "late_night";

pub const ABS_DIFF_LONGITUDE: &str = "abs_diff_longitude";
pub const ABS_DIFF_LATITUDE: &str = "abs_diff_latitude";
pub const MANHATTAN: &str = "manhattan";

/// columns of a raw trip record in file order
pub const RAW_COLUMNS: [&str; 8] = [
    KEY,
    FARE_AMOUNT,
    PICKUP_DATETIME,
    PICKUP_LONGITUDE,
    PICKUP_LATITUDE,
    DROPOFF_LONGITUDE,
    DROPOFF_LATITUDE,
    PASSENGER_COUNT,
];

/// calendar fields and indicator flags added by the time features stage, in
/// the order they are appended
pub const TIME_FEATURE_COLUMNS: [&str; 9] = [
    DAY,
    HOUR_OF_DAY,
    DAY_OF_WEEK,
    WEEK_OF_YEAR,
    MONTH_OF_YEAR,
    QUARTER_OF_YEAR,
    YEAR,
    NIGHT,
    LATE_NIGHT,
];

/// columns pruned by default once the features are built: the raw inputs plus
/// the pickup-to-dropoff deltas that only serve as intermediates.
pub const DEFAULT_DROPPED_COLUMNS: [&str; 10] = [
    PICKUP_DATETIME,
    PICKUP_LONGITUDE,
    PICKUP_LATITUDE,
    DROPOFF_LONGITUDE,
    DROPOFF_LATITUDE,
    PASSENGER_COUNT,
    KEY,
    ABS_DIFF_LONGITUDE,
    ABS_DIFF_LATITUDE,
    MANHATTAN,
];

/// name of the distance from a trip endpoint to a landmark, such as
/// `pickup_distance_jfk`.
pub fn landmark_distance_column(endpoint: &str, landmark: &str) -> String {
    format!("{endpoint}_distance_{landmark}")
}

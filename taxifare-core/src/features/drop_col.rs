use super::{columns, FeatureError};
use crate::session::DataFrame;

/// prunes the raw trip columns and the intermediate deltas, leaving the
/// engineered features and the fare label.
pub fn drop_col(df: &DataFrame) -> Result<DataFrame, FeatureError> {
    let result = df.drop(&columns::DEFAULT_DROPPED_COLUMNS)?;
    Ok(result)
}

/// prunes an explicit list of columns. unknown names are ignored.
pub fn drop_col_with(df: &DataFrame, names: &[String]) -> Result<DataFrame, FeatureError> {
    let names = names.iter().map(String::as_str).collect::<Vec<_>>();
    let result = df.drop(&names)?;
    Ok(result)
}

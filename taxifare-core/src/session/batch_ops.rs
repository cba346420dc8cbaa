//! column access and reshaping helpers over a single partition.
use std::sync::Arc;

use arrow::{
    array::{Array, ArrayRef, AsArray, Float64Array, Int64Array, RecordBatch, StringArray},
    compute::cast,
    datatypes::{DataType, Field, FieldRef, Float64Type, Int64Type, Schema},
};

use super::SessionError;

/// looks up a column by name.
pub fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef, SessionError> {
    batch
        .column_by_name(name)
        .ok_or_else(|| SessionError::ColumnNotFound(name.to_string()))
}

/// reads a column as 64-bit floats. integer and text columns are cast, where
/// values that cannot be represented become nulls.
pub fn float_column(batch: &RecordBatch, name: &str) -> Result<Float64Array, SessionError> {
    let array = cast_column(batch, name, &DataType::Float64)?;
    array
        .as_primitive_opt::<Float64Type>()
        .cloned()
        .ok_or_else(|| type_error(name, &DataType::Float64))
}

/// reads a column as 64-bit integers, casting as in [`float_column`].
pub fn int_column(batch: &RecordBatch, name: &str) -> Result<Int64Array, SessionError> {
    let array = cast_column(batch, name, &DataType::Int64)?;
    array
        .as_primitive_opt::<Int64Type>()
        .cloned()
        .ok_or_else(|| type_error(name, &DataType::Int64))
}

/// reads a column as text. timestamp columns are rendered in ISO 8601.
pub fn string_column(batch: &RecordBatch, name: &str) -> Result<StringArray, SessionError> {
    let array = cast_column(batch, name, &DataType::Utf8)?;
    array
        .as_string_opt::<i32>()
        .cloned()
        .ok_or_else(|| type_error(name, &DataType::Utf8))
}

/// casts a column to the target type, returning the column untouched when it
/// already has that type.
pub fn cast_column(
    batch: &RecordBatch,
    name: &str,
    to_type: &DataType,
) -> Result<ArrayRef, SessionError> {
    let array = column(batch, name)?;
    if array.data_type() == to_type {
        return Ok(array.clone());
    }
    cast(array.as_ref(), to_type).map_err(|e| SessionError::ColumnType {
        column: name.to_string(),
        message: format!("cannot cast {} to {to_type}: {e}", array.data_type()),
    })
}

/// adds a column to the batch, replacing any column with the same name in place.
pub fn with_column(
    batch: &RecordBatch,
    name: &str,
    array: ArrayRef,
) -> Result<RecordBatch, SessionError> {
    if array.len() != batch.num_rows() {
        return Err(SessionError::Internal(format!(
            "column '{name}' has {} rows but the partition has {}",
            array.len(),
            batch.num_rows()
        )));
    }
    let schema = batch.schema();
    let field: FieldRef = Arc::new(Field::new(name, array.data_type().clone(), true));
    let mut fields: Vec<FieldRef> = schema.fields().iter().cloned().collect();
    let mut columns: Vec<ArrayRef> = batch.columns().to_vec();
    match schema.index_of(name) {
        Ok(idx) => {
            fields[idx] = field;
            columns[idx] = array;
        }
        Err(_) => {
            fields.push(field);
            columns.push(array);
        }
    }
    let result = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?;
    Ok(result)
}

/// removes the named columns. names that are not present are ignored.
pub fn drop_columns(batch: &RecordBatch, names: &[&str]) -> Result<RecordBatch, SessionError> {
    let indices = batch
        .schema()
        .fields()
        .iter()
        .enumerate()
        .filter(|(_, f)| !names.contains(&f.name().as_str()))
        .map(|(idx, _)| idx)
        .collect::<Vec<_>>();
    let result = batch.project(&indices)?;
    Ok(result)
}

/// keeps only the named columns, in the order given.
pub fn select_columns(batch: &RecordBatch, names: &[&str]) -> Result<RecordBatch, SessionError> {
    let schema = batch.schema();
    let indices = names
        .iter()
        .map(|name| {
            schema
                .index_of(name)
                .map_err(|_| SessionError::ColumnNotFound(name.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let result = batch.project(&indices)?;
    Ok(result)
}

fn type_error(name: &str, expected: &DataType) -> SessionError {
    SessionError::ColumnType {
        column: name.to_string(),
        message: format!("expected {expected} after cast"),
    }
}

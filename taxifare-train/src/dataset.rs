//! dense in-memory copies of dataframe columns consumed by the estimator.
use arrow::array::Array;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use taxifare_core::session::{batch_ops, DataFrame};

use crate::TrainError;

/// a feature matrix and its label vector, row-aligned.
#[derive(Debug, Clone)]
pub struct TensorDataset {
    features: Array2<f32>,
    labels: Array1<f32>,
}

impl TensorDataset {
    pub fn new(features: Array2<f32>, labels: Array1<f32>) -> Result<Self, TrainError> {
        if features.nrows() != labels.len() {
            return Err(TrainError::ShapeMismatch {
                expected: vec![features.nrows()],
                found: vec![labels.len()],
            });
        }
        Ok(Self { features, labels })
    }

    /// copies the feature and label columns of a frame, in the given column
    /// order. any null is an error.
    pub fn from_frame(
        df: &DataFrame,
        feature_columns: &[String],
        label_column: &str,
    ) -> Result<Self, TrainError> {
        let features = feature_matrix(df, feature_columns)?;
        let labels = label_vector(df, label_column)?;
        TensorDataset::new(features, labels)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    pub fn features(&self) -> ArrayView2<'_, f32> {
        self.features.view()
    }

    pub fn labels(&self) -> ArrayView1<'_, f32> {
        self.labels.view()
    }

    /// gathers the given rows into a new feature matrix and label vector.
    pub fn rows(&self, indices: &[usize]) -> (Array2<f32>, Array1<f32>) {
        (
            self.features.select(Axis(0), indices),
            self.labels.select(Axis(0), indices),
        )
    }
}

/// copies the named columns of a frame into a row-major f32 matrix.
pub fn feature_matrix(df: &DataFrame, columns: &[String]) -> Result<Array2<f32>, TrainError> {
    if columns.is_empty() {
        return Err(TrainError::InvalidConfig(String::from(
            "at least one feature column is required",
        )));
    }
    let mut matrix = Array2::<f32>::zeros((df.num_rows(), columns.len()));
    let mut offset = 0;
    for partition in df.partitions() {
        for (j, name) in columns.iter().enumerate() {
            let values = batch_ops::float_column(partition, name)?;
            if values.null_count() > 0 {
                return Err(TrainError::NullValue {
                    column: name.clone(),
                    count: values.null_count(),
                });
            }
            for (i, v) in values.values().iter().enumerate() {
                matrix[[offset + i, j]] = *v as f32;
            }
        }
        offset += partition.num_rows();
    }
    Ok(matrix)
}

/// copies one column of a frame into an f32 vector.
pub fn label_vector(df: &DataFrame, column: &str) -> Result<Array1<f32>, TrainError> {
    let mut labels = Vec::with_capacity(df.num_rows());
    for partition in df.partitions() {
        let values = batch_ops::float_column(partition, column)?;
        if values.null_count() > 0 {
            return Err(TrainError::NullValue {
                column: column.to_string(),
                count: values.null_count(),
            });
        }
        labels.extend(values.values().iter().map(|v| *v as f32));
    }
    Ok(Array1::from(labels))
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use arrow::{
        array::{Float64Array, Int64Array, RecordBatch},
        datatypes::{DataType, Field, Schema},
    };
    use taxifare_core::session::{Session, SessionConfig};

    use super::*;

    fn frame(session: &Session, label: Vec<Option<f64>>) -> DataFrame {
        let schema = Arc::new(Schema::new(vec![
            Field::new("a", DataType::Float64, true),
            Field::new("b", DataType::Int64, true),
            Field::new("y", DataType::Float64, true),
        ]));
        let n = label.len();
        let (first, second) = label.split_at(n / 2);
        let batches = [first.to_vec(), second.to_vec()]
            .into_iter()
            .enumerate()
            .map(|(k, ys)| {
                let start = (k * (n / 2)) as i64;
                let len = ys.len() as i64;
                RecordBatch::try_new(
                    schema.clone(),
                    vec![
                        Arc::new(Float64Array::from(
                            (start..start + len).map(|i| i as f64 * 0.5).collect::<Vec<_>>(),
                        )),
                        Arc::new(Int64Array::from((start..start + len).collect::<Vec<_>>())),
                        Arc::new(Float64Array::from(ys)),
                    ],
                )
                .expect("test invariant failed: batch is malformed")
            })
            .collect::<Vec<_>>();
        session
            .create_dataframe(schema, batches)
            .expect("test invariant failed: frame is malformed")
    }

    #[test]
    fn test_from_frame_keeps_row_order_across_partitions() {
        let session = Session::start(SessionConfig::default()).unwrap();
        let df = frame(&session, (0..6).map(|i| Some(i as f64 * 10.0)).collect());
        let cols = vec![String::from("b"), String::from("a")];
        let ds = TensorDataset::from_frame(&df, &cols, "y").unwrap();
        assert_eq!(ds.len(), 6);
        assert_eq!(ds.n_features(), 2);
        for i in 0..6 {
            assert_eq!(ds.features()[[i, 0]], i as f32);
            assert_eq!(ds.features()[[i, 1]], i as f32 * 0.5);
            assert_eq!(ds.labels()[i], i as f32 * 10.0);
        }
        let (x, y) = ds.rows(&[4, 1]);
        assert_eq!(x.row(0).to_vec(), vec![4.0, 2.0]);
        assert_eq!(y.to_vec(), vec![40.0, 10.0]);
    }

    #[test]
    fn test_null_label_is_an_error() {
        let session = Session::start(SessionConfig::default()).unwrap();
        let df = frame(&session, vec![Some(1.0), None, Some(3.0), Some(4.0)]);
        let result = TensorDataset::from_frame(&df, &[String::from("a")], "y");
        assert!(matches!(result, Err(TrainError::NullValue { count: 1, .. })));
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let session = Session::start(SessionConfig::default()).unwrap();
        let df = frame(&session, vec![Some(1.0), Some(2.0)]);
        let result = TensorDataset::from_frame(&df, &[String::from("nope")], "y");
        assert!(matches!(result, Err(TrainError::Frame { .. })));
    }
}

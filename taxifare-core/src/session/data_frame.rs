use std::{fs::File, path::Path, sync::Arc};

use arrow::{
    array::{ArrayRef, BooleanArray, RecordBatch},
    compute::{concat_batches, filter_record_batch},
    csv::WriterBuilder,
    datatypes::SchemaRef,
};
use rayon::{prelude::*, ThreadPool};

use super::{batch_ops, SessionError};

/// an immutable, partitioned table. every transformation returns a new frame
/// and runs one task per partition on the executor pool of the session that
/// created it.
///
/// a frame always holds at least one partition so that the schema of an
/// empty result is still known after transformation.
#[derive(Clone)]
pub struct DataFrame {
    schema: SchemaRef,
    partitions: Vec<RecordBatch>,
    pool: Arc<ThreadPool>,
}

impl DataFrame {
    pub(crate) fn new(
        schema: SchemaRef,
        partitions: Vec<RecordBatch>,
        pool: Arc<ThreadPool>,
    ) -> Result<DataFrame, SessionError> {
        for (idx, partition) in partitions.iter().enumerate() {
            if partition.schema().fields() != schema.fields() {
                return Err(SessionError::SchemaMismatch(format!(
                    "partition {idx} has fields [{}], expected [{}]",
                    field_names(&partition.schema()).join(", "),
                    field_names(&schema).join(", ")
                )));
            }
        }
        let partitions = if partitions.is_empty() {
            vec![RecordBatch::new_empty(schema.clone())]
        } else {
            partitions
        };
        Ok(DataFrame {
            schema,
            partitions,
            pool,
        })
    }

    pub fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    /// column names in schema order
    pub fn columns(&self) -> Vec<String> {
        field_names(&self.schema)
    }

    pub fn partitions(&self) -> &[RecordBatch] {
        &self.partitions
    }

    pub fn num_partitions(&self) -> usize {
        self.partitions.len()
    }

    pub fn num_rows(&self) -> usize {
        self.partitions.iter().map(|p| p.num_rows()).sum()
    }

    /// applies `op` to every partition on the executor pool. all resulting
    /// partitions must agree on their schema.
    pub fn map_partitions<F>(&self, op: F) -> Result<DataFrame, SessionError>
    where
        F: Fn(&RecordBatch) -> Result<RecordBatch, SessionError> + Send + Sync,
    {
        let mapped = self.pool.install(|| {
            self.partitions
                .par_iter()
                .map(&op)
                .collect::<Result<Vec<_>, _>>()
        })?;
        let schema = mapped
            .first()
            .map(|p| p.schema())
            .ok_or_else(|| SessionError::Internal(String::from("frame has no partitions")))?;
        DataFrame::new(schema, mapped, self.pool.clone())
    }

    /// applies `op` to every partition where each call produces `n_outputs`
    /// batches, returning one frame per output position. used to partition
    /// a frame into disjoint subsets in a single pass.
    pub fn fan_out_partitions<F>(
        &self,
        n_outputs: usize,
        op: F,
    ) -> Result<Vec<DataFrame>, SessionError>
    where
        F: Fn(usize, &RecordBatch) -> Result<Vec<RecordBatch>, SessionError> + Send + Sync,
    {
        let mapped = self.pool.install(|| {
            self.partitions
                .par_iter()
                .enumerate()
                .map(|(idx, partition)| op(idx, partition))
                .collect::<Result<Vec<_>, _>>()
        })?;
        let mut outputs: Vec<Vec<RecordBatch>> = vec![vec![]; n_outputs];
        for batches in mapped {
            if batches.len() != n_outputs {
                return Err(SessionError::Internal(format!(
                    "partition task produced {} outputs, expected {n_outputs}",
                    batches.len()
                )));
            }
            for (slot, batch) in outputs.iter_mut().zip(batches) {
                slot.push(batch);
            }
        }
        outputs
            .into_iter()
            .map(|batches| {
                let schema = batches
                    .first()
                    .map(|b| b.schema())
                    .unwrap_or_else(|| self.schema.clone());
                DataFrame::new(schema, batches, self.pool.clone())
            })
            .collect()
    }

    /// keeps the rows where `predicate` is true. rows where the predicate is
    /// false or null are dropped.
    pub fn filter<P>(&self, predicate: P) -> Result<DataFrame, SessionError>
    where
        P: Fn(&RecordBatch) -> Result<BooleanArray, SessionError> + Send + Sync,
    {
        self.map_partitions(|batch| {
            let mask = predicate(batch)?;
            let filtered = filter_record_batch(batch, &mask)?;
            Ok(filtered)
        })
    }

    /// adds or replaces a single column computed per partition.
    pub fn with_column<F>(&self, name: &str, op: F) -> Result<DataFrame, SessionError>
    where
        F: Fn(&RecordBatch) -> Result<ArrayRef, SessionError> + Send + Sync,
    {
        self.map_partitions(|batch| {
            let array = op(batch)?;
            batch_ops::with_column(batch, name, array)
        })
    }

    /// adds or replaces several columns computed together per partition,
    /// appended in the order returned by `op`.
    pub fn with_columns<F>(&self, op: F) -> Result<DataFrame, SessionError>
    where
        F: Fn(&RecordBatch) -> Result<Vec<(String, ArrayRef)>, SessionError> + Send + Sync,
    {
        self.map_partitions(|batch| {
            op(batch)?
                .into_iter()
                .try_fold(batch.clone(), |acc, (name, array)| {
                    batch_ops::with_column(&acc, &name, array)
                })
        })
    }

    /// removes columns by name. unknown names are ignored.
    pub fn drop(&self, names: &[&str]) -> Result<DataFrame, SessionError> {
        self.map_partitions(|batch| batch_ops::drop_columns(batch, names))
    }

    /// projects the frame onto the named columns in the given order.
    pub fn select(&self, names: &[&str]) -> Result<DataFrame, SessionError> {
        self.map_partitions(|batch| batch_ops::select_columns(batch, names))
    }

    /// concatenates every partition into one batch on the driver.
    pub fn collect(&self) -> Result<RecordBatch, SessionError> {
        let batch = concat_batches(&self.schema, &self.partitions)?;
        Ok(batch)
    }

    /// writes the frame as a delimited file with a header row.
    pub fn write_csv(&self, path: &Path) -> Result<(), SessionError> {
        let file = File::create(path).map_err(|e| SessionError::WriteError {
            path: path.to_owned(),
            message: e.to_string(),
        })?;
        let mut writer = WriterBuilder::new().with_header(true).build(file);
        for partition in self.partitions.iter() {
            writer
                .write(partition)
                .map_err(|e| SessionError::WriteError {
                    path: path.to_owned(),
                    message: e.to_string(),
                })?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for DataFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataFrame")
            .field("columns", &self.columns())
            .field("partitions", &self.partitions.len())
            .field("rows", &self.num_rows())
            .finish()
    }
}

fn field_names(schema: &SchemaRef) -> Vec<String> {
    schema.fields().iter().map(|f| f.name().clone()).collect()
}

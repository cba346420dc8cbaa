use std::{
    fs::File,
    io::Seek,
    path::Path,
    sync::Arc,
    time::Instant,
};

use arrow::{
    array::RecordBatch,
    csv::{reader::Format, ReaderBuilder},
    datatypes::{DataType, FieldRef, Schema, SchemaRef},
};
use rayon::{ThreadPool, ThreadPoolBuilder};

use super::{ClusterMode, DataFrame, ExecutorMemory, SessionConfig, SessionError};

/// an attached dataframe runtime. owns the executor pool that every
/// [`DataFrame`] created through it runs on.
pub struct Session {
    config: SessionConfig,
    cluster_mode: ClusterMode,
    executor_memory: ExecutorMemory,
    pool: Arc<ThreadPool>,
}

impl Session {
    /// validates the configuration and starts the executor pool.
    pub fn start(config: SessionConfig) -> Result<Session, SessionError> {
        let (cluster_mode, executor_memory) = config.validate()?;
        let threads = cluster_mode.threads(config.num_executors, config.executor_cores);
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|idx| format!("executor-{idx}"))
            .build()
            .map_err(|e| SessionError::ExecutorPool(e.to_string()))?;
        log::info!(
            "started session on {cluster_mode} with {threads} executor threads \
            ({} executors x {} cores, {executor_memory} per executor)",
            config.num_executors,
            config.executor_cores
        );
        Ok(Session {
            config,
            cluster_mode,
            executor_memory,
            pool: Arc::new(pool),
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn cluster_mode(&self) -> ClusterMode {
        self.cluster_mode
    }

    pub fn executor_memory(&self) -> ExecutorMemory {
        self.executor_memory
    }

    /// number of executor threads available to partition tasks
    pub fn parallelism(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// reads a delimited file with a header row. column types are inferred
    /// from the rows sampled per [`SessionConfig::schema_inference_rows`] and
    /// the file is split into partitions of [`SessionConfig::partition_rows`].
    /// columns inferred as timestamps are kept as text.
    pub fn read_csv(&self, path: &Path) -> Result<DataFrame, SessionError> {
        let start = Instant::now();
        let read_error = |message: String| SessionError::ReadError {
            path: path.to_owned(),
            message,
        };
        let mut file = File::open(path).map_err(|e| read_error(e.to_string()))?;
        let format = Format::default().with_header(true);
        let (schema, sampled) = format
            .infer_schema(&mut file, self.config.schema_inference_rows)
            .map_err(|e| read_error(format!("failed to infer schema: {e}")))?;
        file.rewind().map_err(|e| read_error(e.to_string()))?;
        log::debug!("inferred schema from {sampled} rows: {schema:?}");

        let schema: SchemaRef = Arc::new(timestamps_as_text(schema));
        let reader = ReaderBuilder::new(schema.clone())
            .with_format(format)
            .with_batch_size(self.config.partition_rows)
            .build(file)
            .map_err(|e| read_error(e.to_string()))?;
        let partitions = reader
            .collect::<Result<Vec<RecordBatch>, _>>()
            .map_err(|e| read_error(format!("failed to parse rows: {e}")))?;

        let frame = DataFrame::new(schema, partitions, self.pool.clone())?;
        log::info!(
            "read {} rows in {} partitions from '{}' in {:?}",
            frame.num_rows(),
            frame.num_partitions(),
            path.display(),
            start.elapsed()
        );
        Ok(frame)
    }

    /// builds a frame from in-memory partitions that share `schema`.
    pub fn create_dataframe(
        &self,
        schema: SchemaRef,
        partitions: Vec<RecordBatch>,
    ) -> Result<DataFrame, SessionError> {
        DataFrame::new(schema, partitions, self.pool.clone())
    }

    /// releases the executor pool. frames that are still alive keep their
    /// handle to the pool until they are dropped.
    pub fn stop(self) {
        log::info!(
            "stopping session on {} ({} executor threads)",
            self.cluster_mode,
            self.pool.current_num_threads()
        );
    }
}

/// replaces inferred timestamp columns with text columns. zone suffixes such
/// as ` UTC` cannot be parsed by the csv reader, and the feature stage
/// interprets the text itself.
fn timestamps_as_text(schema: Schema) -> Schema {
    let fields = schema
        .fields()
        .iter()
        .map(|field| match field.data_type() {
            DataType::Timestamp(_, _) => {
                Arc::new(field.as_ref().clone().with_data_type(DataType::Utf8)) as FieldRef
            }
            _ => field.clone(),
        })
        .collect::<Vec<_>>();
    Schema::new_with_metadata(fields, schema.metadata().clone())
}

use std::{path::Path, time::Instant};

use itertools::Itertools;
use kdam::{Bar, BarExt};
use ndarray::{s, Array1, ArrayView2};
use rand::prelude::*;
use rayon::{prelude::*, ThreadPool, ThreadPoolBuilder};
use taxifare_core::session::DataFrame;

use super::{
    shard_ranges, Checkpoint, EpochRecord, EstimatorConfig, Evaluation, TrainingHistory,
};
use crate::{
    dataset::{feature_matrix, TensorDataset},
    loss::{Loss, SmoothL1Loss},
    model::{BatchStats, FareRegressor, RegressorGrads},
    optim::{Adam, Optimizer},
    TrainError,
};

/// result of the forward and backward pass of one worker over its shard.
struct ShardOutcome {
    loss_sum: f32,
    grads: RegressorGrads,
    norm_stats: Vec<BatchStats>,
}

/// trains a [`FareRegressor`] with synchronous data parallelism.
///
/// each mini-batch is split into shards processed concurrently on a
/// dedicated worker pool. every worker normalizes with the statistics of its
/// own shard and produces gradients of its share of the mini-batch mean loss;
/// those are summed into one update applied by the optimizer, so all workers
/// always see the same parameters.
pub struct Estimator<O: Optimizer = Adam, L: Loss = SmoothL1Loss> {
    model: FareRegressor,
    optimizer: O,
    loss: L,
    config: EstimatorConfig,
    pool: ThreadPool,
    rng: StdRng,
    epochs_trained: usize,
}

impl<O: Optimizer, L: Loss> Estimator<O, L> {
    pub fn new(
        model: FareRegressor,
        optimizer: O,
        loss: L,
        config: EstimatorConfig,
    ) -> Result<Self, TrainError> {
        config.validate()?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.num_workers)
            .thread_name(|idx| format!("worker-{idx}"))
            .build()
            .map_err(|e| TrainError::WorkerPool(e.to_string()))?;
        let seed = config.seed.unwrap_or_else(|| rand::rng().random::<u64>());
        log::info!(
            "estimator ready with {} workers, batch size {}, {} epochs, {} parameters",
            config.num_workers,
            config.batch_size,
            config.epochs,
            model.num_parameters()
        );
        Ok(Self {
            model,
            optimizer,
            loss,
            config,
            pool,
            rng: StdRng::seed_from_u64(seed),
            epochs_trained: 0,
        })
    }

    pub fn model(&self) -> &FareRegressor {
        &self.model
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    pub fn epochs_trained(&self) -> usize {
        self.epochs_trained
    }

    /// trains for the configured number of epochs, evaluating on `test`
    /// after each epoch when it holds any rows.
    pub fn fit(
        &mut self,
        train: &DataFrame,
        test: Option<&DataFrame>,
        feature_columns: &[String],
        label_column: &str,
    ) -> Result<TrainingHistory, TrainError> {
        let train_set = TensorDataset::from_frame(train, feature_columns, label_column)?;
        let test_set = test
            .map(|df| TensorDataset::from_frame(df, feature_columns, label_column))
            .transpose()?;
        self.fit_dataset(&train_set, test_set.as_ref())
    }

    /// [`Estimator::fit`] over data already copied out of a frame.
    pub fn fit_dataset(
        &mut self,
        train: &TensorDataset,
        test: Option<&TensorDataset>,
    ) -> Result<TrainingHistory, TrainError> {
        if train.n_features() != self.model.n_features() {
            return Err(TrainError::ShapeMismatch {
                expected: vec![self.model.n_features()],
                found: vec![train.n_features()],
            });
        }
        if train.len() < 2 {
            return Err(TrainError::EmptyDataset(format!(
                "training needs at least two rows, found {}",
                train.len()
            )));
        }
        let test = test.filter(|t| !t.is_empty());
        if test.is_none() {
            log::warn!("no held-out rows, validation metrics will be skipped");
        }
        log::info!(
            "training on {} rows ({} held out) with {} features",
            train.len(),
            test.map(|t| t.len()).unwrap_or_default(),
            train.n_features()
        );

        let mut history = TrainingHistory::default();
        for epoch in 1..=self.config.epochs {
            let start = Instant::now();
            let (train_loss, train_rows) = self.run_epoch(train, epoch)?;
            let val = test.map(|t| self.evaluate_dataset(t)).transpose()?.flatten();
            self.epochs_trained += 1;
            match &val {
                Some(v) => log::info!(
                    "epoch {epoch}/{}: train loss {train_loss:.4}, val loss {:.4}, val mae {:.4}, val rmse {:.4} ({:?})",
                    self.config.epochs,
                    v.loss,
                    v.mae,
                    v.rmse,
                    start.elapsed()
                ),
                None => log::info!(
                    "epoch {epoch}/{}: train loss {train_loss:.4} ({:?})",
                    self.config.epochs,
                    start.elapsed()
                ),
            }
            history.push(EpochRecord::new(epoch, train_loss, train_rows, val));
        }
        Ok(history)
    }

    /// one pass over the shuffled training rows. returns the mean training
    /// loss and the number of rows that contributed to it.
    fn run_epoch(&mut self, data: &TensorDataset, epoch: usize) -> Result<(f32, usize), TrainError> {
        let mut order = (0..data.len()).collect_vec();
        order.shuffle(&mut self.rng);
        let batches = order.chunks(self.config.batch_size).collect_vec();

        let mut bar = Bar::builder()
            .total(batches.len())
            .desc(format!("epoch {epoch}/{}", self.config.epochs))
            .disable(!self.config.progress)
            .build()
            .map_err(|e| TrainError::Internal(format!("error building progress bar: {e}")))?;

        let mut loss_total = 0.0_f64;
        let mut rows = 0;
        for batch in batches {
            if batch.len() < 2 {
                log::debug!("skipping a mini-batch of {} row", batch.len());
                let _ = bar.update(1);
                continue;
            }
            loss_total += self.train_step(data, batch)? as f64;
            rows += batch.len();
            let _ = bar.update(1);
        }
        if self.config.progress {
            eprintln!();
        }
        if rows == 0 {
            return Err(TrainError::EmptyDataset(String::from(
                "no mini-batch held at least two rows",
            )));
        }
        Ok(((loss_total / rows as f64) as f32, rows))
    }

    /// forward and backward on every shard of the mini-batch in parallel,
    /// followed by the all-reduce of gradients and batch statistics and one
    /// optimizer step. returns the summed loss of the mini-batch.
    fn train_step(&mut self, data: &TensorDataset, rows: &[usize]) -> Result<f32, TrainError> {
        let (x, y) = data.rows(rows);
        let n = rows.len() as f32;
        let shards = shard_ranges(rows.len(), self.config.num_workers);
        let model = &self.model;
        let loss = &self.loss;
        let outcomes = self.pool.install(|| {
            shards
                .par_iter()
                .map(|range| -> Result<ShardOutcome, TrainError> {
                    let xs = x.slice(s![range.clone(), ..]);
                    let ys = y.slice(s![range.clone()]);
                    let trace = model.forward_train(&xs)?;
                    let loss_sum = loss.sum(&trace.output.view(), &ys);
                    let grad_output = loss.gradient(&trace.output.view(), &ys) / n;
                    let grads = model.backward(&trace, &grad_output.view())?;
                    Ok(ShardOutcome {
                        loss_sum,
                        grads,
                        norm_stats: trace.norm_stats,
                    })
                })
                .collect::<Result<Vec<_>, _>>()
        })?;

        let mut reduced = RegressorGrads::zeros_like(&self.model);
        let mut loss_sum = 0.0;
        for outcome in outcomes.iter() {
            reduced.accumulate(&outcome.grads)?;
            loss_sum += outcome.loss_sum;
        }
        let merged_stats = (0..self.model.blocks().len())
            .map(|layer| BatchStats::merge(outcomes.iter().map(|o| &o.norm_stats[layer])))
            .collect::<Result<Vec<_>, _>>()?;

        self.optimizer
            .step(self.model.parameters_mut(), reduced.views())?;
        self.model.update_norm_stats(&merged_stats)?;
        Ok(loss_sum)
    }

    /// held-out metrics of the model in evaluation mode.
    pub fn evaluate(
        &self,
        df: &DataFrame,
        feature_columns: &[String],
        label_column: &str,
    ) -> Result<Option<Evaluation>, TrainError> {
        let data = TensorDataset::from_frame(df, feature_columns, label_column)?;
        self.evaluate_dataset(&data)
    }

    /// None when the dataset is empty.
    pub fn evaluate_dataset(&self, data: &TensorDataset) -> Result<Option<Evaluation>, TrainError> {
        let predictions = self.predict_matrix(&data.features())?;
        Ok(Evaluation::from_predictions(
            &self.loss,
            &predictions.view(),
            &data.labels(),
        ))
    }

    /// one fare prediction per row of the frame.
    pub fn predict(
        &self,
        df: &DataFrame,
        feature_columns: &[String],
    ) -> Result<Array1<f32>, TrainError> {
        let features = feature_matrix(df, feature_columns)?;
        self.predict_matrix(&features.view())
    }

    /// evaluation-mode forward pass in chunks of `batch_size` rows spread
    /// over the worker pool.
    pub fn predict_matrix(&self, x: &ArrayView2<f32>) -> Result<Array1<f32>, TrainError> {
        if x.ncols() != self.model.n_features() {
            return Err(TrainError::ShapeMismatch {
                expected: vec![x.nrows(), self.model.n_features()],
                found: vec![x.nrows(), x.ncols()],
            });
        }
        let n = x.nrows();
        let chunk = self.config.batch_size;
        let starts = (0..n).step_by(chunk).collect_vec();
        let model = &self.model;
        let parts = self.pool.install(|| {
            starts
                .par_iter()
                .map(|start| model.predict(&x.slice(s![*start..(start + chunk).min(n), ..])))
                .collect::<Result<Vec<_>, _>>()
        })?;
        Ok(parts.iter().flat_map(|p| p.iter().copied()).collect())
    }

    pub fn save_checkpoint(
        &self,
        path: &Path,
        feature_columns: &[String],
        label_column: &str,
    ) -> Result<(), TrainError> {
        let checkpoint = Checkpoint {
            feature_columns: feature_columns.to_vec(),
            label_column: label_column.to_string(),
            epochs_trained: self.epochs_trained,
            model: self.model.clone(),
        };
        checkpoint.write(path)
    }

    /// replaces the model with the one stored at `path`. the optimizer state
    /// is not part of a checkpoint and restarts from zero moments.
    pub fn load_checkpoint(&mut self, path: &Path) -> Result<Checkpoint, TrainError> {
        let checkpoint = Checkpoint::read(path)?;
        self.model = checkpoint.model.clone();
        self.optimizer.reset();
        self.epochs_trained = checkpoint.epochs_trained;
        log::info!(
            "loaded checkpoint from {} ({} epochs trained)",
            path.display(),
            checkpoint.epochs_trained
        );
        Ok(checkpoint)
    }

    /// stops the worker pool and hands back the trained model.
    pub fn shutdown(self) -> FareRegressor {
        log::info!(
            "shutting down estimator worker pool ({} threads) after {} epochs",
            self.pool.current_num_threads(),
            self.epochs_trained
        );
        self.model
    }
}

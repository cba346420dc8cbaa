use ndarray::{ArrayView1, Zip};
use serde::{Deserialize, Serialize};

use crate::loss::Loss;

/// held-out metrics of a set of predictions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Evaluation {
    /// mean loss under the training objective
    pub loss: f32,
    pub mae: f32,
    pub rmse: f32,
    pub count: usize,
}

impl Evaluation {
    /// None when there are no predictions.
    pub fn from_predictions<L: Loss>(
        loss: &L,
        predictions: &ArrayView1<f32>,
        targets: &ArrayView1<f32>,
    ) -> Option<Evaluation> {
        if predictions.is_empty() {
            return None;
        }
        let n = predictions.len() as f64;
        let (abs_sum, sq_sum) = Zip::from(predictions)
            .and(targets)
            .fold((0.0_f64, 0.0_f64), |(abs, sq), p, t| {
                let d = (*p - *t) as f64;
                (abs + d.abs(), sq + d * d)
            });
        Some(Evaluation {
            loss: loss.mean(predictions, targets),
            mae: (abs_sum / n) as f32,
            rmse: (sq_sum / n).sqrt() as f32,
            count: predictions.len(),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::loss::SmoothL1Loss;
    use ndarray::{array, Array1};

    #[test]
    fn test_metrics() {
        let p = array![1.0_f32, 2.0, 5.0, 4.0];
        let t = array![1.0_f32, 3.0, 2.0, 4.0];
        let eval = Evaluation::from_predictions(&SmoothL1Loss::default(), &p.view(), &t.view())
            .expect("test invariant failed: non-empty predictions");
        assert_eq!(eval.count, 4);
        assert!((eval.mae - 1.0).abs() < 1e-6);
        assert!((eval.rmse - (10.0_f32 / 4.0).sqrt()).abs() < 1e-6);
        // 0 + 0.5 + 2.5 + 0
        assert!((eval.loss - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_empty_predictions() {
        let empty = Array1::<f32>::zeros(0);
        assert!(
            Evaluation::from_predictions(&SmoothL1Loss::default(), &empty.view(), &empty.view())
                .is_none()
        );
    }
}

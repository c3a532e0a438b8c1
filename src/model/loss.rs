//! Weighted reconstruction loss used by the fitting loop.

use crate::foundation::error::{InrError, InrResult};

const HUBER_DELTA: f32 = 1.0;

/// Weights of the `l1`, `l2`, and `huber` terms. Zero disables a term.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LossWeights {
    pub l1: f32,
    pub l2: f32,
    pub huber: f32,
}

impl LossWeights {
    /// Build from `(name, weight)` pairs; unknown names are rejected.
    pub fn from_terms<'a>(terms: impl IntoIterator<Item = (&'a str, f32)>) -> InrResult<Self> {
        let mut w = Self::default();
        for (name, weight) in terms {
            let slot = match name {
                "l1" => &mut w.l1,
                "l2" => &mut w.l2,
                "huber" => &mut w.huber,
                other => {
                    return Err(InrError::validation(format!(
                        "unknown loss term '{other}' (expected l1, l2, huber)"
                    )));
                }
            };
            *slot = weight;
        }
        w.validate()?;
        Ok(w)
    }

    /// Parse `l1=0.5,l2=1` style term lists.
    pub fn parse(s: &str) -> InrResult<Self> {
        let mut terms = Vec::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (name, weight) = part.split_once('=').unwrap_or((part, "1"));
            let weight = weight.trim().parse::<f32>().map_err(|_| {
                InrError::validation(format!("invalid weight for loss term '{name}'"))
            })?;
            terms.push((name.trim(), weight));
        }
        Self::from_terms(terms)
    }

    pub fn validate(&self) -> InrResult<()> {
        let ws = [self.l1, self.l2, self.huber];
        if ws.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(InrError::validation(
                "loss weights must be finite and non-negative",
            ));
        }
        if ws.iter().all(|w| *w == 0.0) {
            return Err(InrError::validation("at least one loss weight must be non-zero"));
        }
        Ok(())
    }
}

/// Mean-reduced weighted sum of the configured terms.
#[derive(Clone, Copy, Debug)]
pub struct WeightedLoss {
    weights: LossWeights,
}

impl WeightedLoss {
    pub fn new(weights: LossWeights) -> InrResult<Self> {
        weights.validate()?;
        Ok(Self { weights })
    }

    pub fn weights(&self) -> LossWeights {
        self.weights
    }

    /// Loss of `pred` against `target`; `grad` receives dLoss/dpred.
    pub fn eval(&self, pred: &[f32], target: &[f32], grad: &mut [f32]) -> f32 {
        debug_assert_eq!(pred.len(), target.len());
        debug_assert_eq!(pred.len(), grad.len());
        let n = pred.len().max(1) as f32;
        let LossWeights { l1, l2, huber } = self.weights;
        let mut total = 0.0f32;
        for ((p, t), g) in pred.iter().zip(target).zip(grad.iter_mut()) {
            let d = p - t;
            let a = d.abs();
            let mut v = 0.0;
            let mut dv = 0.0;
            if l1 != 0.0 {
                v += l1 * a;
                dv += l1 * d.signum() * f32::from(u8::from(d != 0.0));
            }
            if l2 != 0.0 {
                v += l2 * d * d;
                dv += l2 * 2.0 * d;
            }
            if huber != 0.0 {
                if a <= HUBER_DELTA {
                    v += huber * 0.5 * d * d;
                    dv += huber * d;
                } else {
                    v += huber * HUBER_DELTA * (a - 0.5 * HUBER_DELTA);
                    dv += huber * HUBER_DELTA * d.signum();
                }
            }
            total += v;
            *g = dv / n;
        }
        total / n
    }
}

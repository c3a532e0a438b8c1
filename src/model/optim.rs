//! Decoupled-weight-decay Adam and cosine annealing with warm restarts.

use crate::foundation::error::{InrError, InrResult};

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AdamWConfig {
    pub lr: f32,
    pub weight_decay: f32,
    pub betas: (f32, f32),
    pub eps: f32,
}

impl Default for AdamWConfig {
    fn default() -> Self {
        Self {
            lr: 1e-3,
            weight_decay: 1e-5,
            betas: (0.9, 0.999),
            eps: 1e-7,
        }
    }
}

impl AdamWConfig {
    pub fn validate(&self) -> InrResult<()> {
        if !(self.lr.is_finite() && self.lr > 0.0) {
            return Err(InrError::validation("learning rate must be > 0"));
        }
        if !(self.weight_decay.is_finite() && self.weight_decay >= 0.0) {
            return Err(InrError::validation("weight decay must be >= 0"));
        }
        let (b1, b2) = self.betas;
        if !((0.0..1.0).contains(&b1) && (0.0..1.0).contains(&b2)) {
            return Err(InrError::validation("betas must lie in [0, 1)"));
        }
        if !(self.eps.is_finite() && self.eps > 0.0) {
            return Err(InrError::validation("eps must be > 0"));
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct AdamW {
    cfg: AdamWConfig,
    t: u32,
    m: Vec<f32>,
    v: Vec<f32>,
}

impl AdamW {
    /// Optimizer state for `n` parameters.
    pub fn new(cfg: AdamWConfig, n: usize) -> InrResult<Self> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            t: 0,
            m: vec![0.0; n],
            v: vec![0.0; n],
        })
    }

    pub fn config(&self) -> &AdamWConfig {
        &self.cfg
    }

    pub fn steps(&self) -> u32 {
        self.t
    }

    /// One update at learning rate `lr`.
    pub fn step(&mut self, params: &mut [f32], grads: &[f32], lr: f32) -> InrResult<()> {
        if params.len() != self.m.len() || grads.len() != self.m.len() {
            return Err(InrError::precondition(format!(
                "optimizer tracks {} parameters, got {} params / {} grads",
                self.m.len(),
                params.len(),
                grads.len()
            )));
        }
        self.t = self.t.saturating_add(1);
        let (b1, b2) = self.cfg.betas;
        let bc1 = 1.0 - b1.powi(self.t as i32);
        let bc2 = 1.0 - b2.powi(self.t as i32);
        let decay = 1.0 - lr * self.cfg.weight_decay;

        for i in 0..params.len() {
            let g = grads[i];
            self.m[i] = b1 * self.m[i] + (1.0 - b1) * g;
            self.v[i] = b2 * self.v[i] + (1.0 - b2) * g * g;
            let m_hat = self.m[i] / bc1;
            let v_hat = self.v[i] / bc2;
            params[i] = params[i] * decay - lr * m_hat / (v_hat.sqrt() + self.cfg.eps);
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct WarmRestartConfig {
    /// Steps in the first cycle.
    pub t_0: u32,
    /// Cycle length multiplier after each restart.
    pub t_mult: u32,
    pub eta_min: f32,
}

impl Default for WarmRestartConfig {
    fn default() -> Self {
        Self {
            t_0: 100,
            t_mult: 2,
            eta_min: 0.0,
        }
    }
}

/// Cosine annealing from the base rate to `eta_min`, restarting with growing cycles.
#[derive(Clone, Debug)]
pub struct CosineWarmRestarts {
    base_lr: f32,
    cfg: WarmRestartConfig,
    t_cur: u32,
    t_i: u32,
}

impl CosineWarmRestarts {
    pub fn new(base_lr: f32, cfg: WarmRestartConfig) -> InrResult<Self> {
        if cfg.t_0 == 0 || cfg.t_mult == 0 {
            return Err(InrError::validation("T_0 and T_mult must be >= 1"));
        }
        Ok(Self {
            base_lr,
            cfg,
            t_cur: 0,
            t_i: cfg.t_0,
        })
    }

    /// Learning rate for the current step.
    pub fn lr(&self) -> f32 {
        let phase = std::f32::consts::PI * self.t_cur as f32 / self.t_i as f32;
        self.cfg.eta_min + (self.base_lr - self.cfg.eta_min) * (1.0 + phase.cos()) / 2.0
    }

    pub fn step(&mut self) {
        self.t_cur += 1;
        if self.t_cur >= self.t_i {
            self.t_cur -= self.t_i;
            self.t_i = self.t_i.saturating_mul(self.cfg.t_mult);
        }
    }
}

//! Adam optimizer

use super::Optimizer;
use crate::Tensor;
use ndarray::Array2;

/// Adam optimizer
///
/// θ_t = θ_{t-1} - lr_t * m_t / (√v_t + ε), with the bias correction folded
/// into `lr_t = lr * √(1 - β2^t) / (1 - β1^t)`.
pub struct Adam {
    params: Vec<Tensor>,
    lr: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    t: u64,
    m: Vec<Option<Array2<f64>>>, // First moment
    v: Vec<Option<Array2<f64>>>, // Second moment
}

impl Adam {
    /// Create a new Adam optimizer over `params`
    pub fn new(params: Vec<Tensor>, lr: f64, beta1: f64, beta2: f64, epsilon: f64) -> Self {
        let n = params.len();
        Self { params, lr, beta1, beta2, epsilon, t: 0, m: vec![None; n], v: vec![None; n] }
    }

    /// Create Adam with default parameters (β1 = 0.9, β2 = 0.999, ε = 1e-8)
    pub fn default_params(params: Vec<Tensor>, lr: f64) -> Self {
        Self::new(params, lr, 0.9, 0.999, 1e-8)
    }

    /// Number of steps taken
    #[must_use]
    pub fn step_count(&self) -> u64 {
        self.t
    }
}

impl Optimizer for Adam {
    fn step(&mut self) {
        self.t += 1;

        // Bias correction factors
        let lr_t = self.lr
            * ((1.0 - self.beta2.powi(self.t as i32)).sqrt()
                / (1.0 - self.beta1.powi(self.t as i32)));

        for (i, param) in self.params.iter().enumerate() {
            let Some(grad) = param.grad() else {
                continue;
            };

            // m_t = β1 * m_{t-1} + (1 - β1) * g
            let m = match self.m[i].take() {
                Some(prev) => prev * self.beta1 + &grad * (1.0 - self.beta1),
                None => &grad * (1.0 - self.beta1),
            };
            // v_t = β2 * v_{t-1} + (1 - β2) * g²
            let grad_sq = grad.mapv(|g| g * g);
            let v = match self.v[i].take() {
                Some(prev) => prev * self.beta2 + &grad_sq * (1.0 - self.beta2),
                None => grad_sq * (1.0 - self.beta2),
            };

            let update = ndarray::Zip::from(&m)
                .and(&v)
                .map_collect(|&m_i, &v_i| lr_t * m_i / (v_i.sqrt() + self.epsilon));
            *param.data_mut() -= &update;

            self.m[i] = Some(m);
            self.v[i] = Some(v);
        }
    }

    fn params(&self) -> &[Tensor] {
        &self.params
    }

    fn lr(&self) -> f64 {
        self.lr
    }

    fn set_lr(&mut self, lr: f64) {
        self.lr = lr;
    }
}

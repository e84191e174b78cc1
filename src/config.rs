//! Per-algorithm configuration and the statistical parameter derivations.
//!
//! Each estimator takes its own closed config type. The derived quantities
//! (walk budgets ω, residue thresholds rmax) encode the Chernoff-style guarantee
//! the estimators rely on, so the closed forms here must not be "simplified".

use crate::{Error, Result};

pub const DEFAULT_ALPHA: f64 = 0.15;
pub const DEFAULT_EPSILON: f64 = 0.5;
pub const DEFAULT_K: usize = 10;
pub const DEFAULT_SEED: u64 = 42;

fn check_alpha(alpha: f64) -> Result<()> {
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(Error::InvalidParameter(format!("alpha must be in (0, 1), got {alpha}")));
    }
    Ok(())
}

fn check_positive(name: &str, x: f64) -> Result<()> {
    if !(x.is_finite() && x > 0.0) {
        return Err(Error::InvalidParameter(format!("{name} must be finite and > 0, got {x}")));
    }
    Ok(())
}

/// The statistical bundle shared by the sampling estimators.
///
/// - `delta`: smallest PPR value of interest, in `(0, 1]`
/// - `pfail`: allowed failure probability of the bound, in `(0, 1]`
/// - `epsilon`: relative error
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatParams {
    pub alpha: f64,
    pub epsilon: f64,
    pub delta: f64,
    pub pfail: f64,
}

impl StatParams {
    pub fn new(alpha: f64, epsilon: f64, delta: f64, pfail: f64) -> Result<Self> {
        check_alpha(alpha)?;
        check_positive("epsilon", epsilon)?;
        if !(delta > 0.0 && delta <= 1.0) {
            return Err(Error::InvalidParameter(format!("delta must be in (0, 1], got {delta}")));
        }
        if !(pfail > 0.0 && pfail <= 1.0) {
            return Err(Error::InvalidParameter(format!("pfail must be in (0, 1], got {pfail}")));
        }
        Ok(Self { alpha, epsilon, delta, pfail })
    }

    /// `delta = pfail = 1/n`, the whole-graph setting.
    pub fn for_graph(alpha: f64, epsilon: f64, node_count: usize) -> Result<Self> {
        if node_count == 0 {
            return Err(Error::InvalidParameter("graph has no nodes".to_string()));
        }
        let inv_n = 1.0 / node_count as f64;
        Self::new(alpha, epsilon, inv_n, inv_n)
    }

    /// `ln(2 / pfail)`
    pub fn log_term(&self) -> f64 {
        (2.0 / self.pfail).ln()
    }

    /// ω = 3·ln(2/pfail) / ε² / δ
    pub fn monte_carlo_walks(&self) -> f64 {
        3.0 * self.log_term() / self.epsilon / self.epsilon / self.delta
    }

    /// ω' = (ε + 2)·ln(2/pfail) / ε² / δ
    pub fn fora_walks(&self) -> f64 {
        (self.epsilon + 2.0) * self.log_term() / self.epsilon / self.epsilon / self.delta
    }

    /// rmax = ε·√(δ / (3·m·ln(2/pfail))) / (1 − α)
    pub fn fora_rmax(&self, edge_count: usize) -> f64 {
        self.base_rmax(edge_count) / (1.0 - self.alpha)
    }

    /// ε·√(δ / (3·m·ln(2/pfail)))
    pub fn base_rmax(&self, edge_count: usize) -> f64 {
        // m = 0 only happens on edgeless graphs, where every source short-circuits.
        let m = edge_count.max(1) as f64;
        self.epsilon * (self.delta / 3.0 / m / self.log_term()).sqrt()
    }

    /// The top-k threshold: the base rmax scaled by `3·√(m·rmax)`.
    pub fn topk_rmax(&self, edge_count: usize) -> f64 {
        let rmax = self.base_rmax(edge_count);
        rmax * (edge_count.max(1) as f64 * rmax).sqrt() * 3.0
    }
}

#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MonteCarloConfig {
    pub alpha: f64,
    pub epsilon: f64,
    pub seed: u64,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self { alpha: DEFAULT_ALPHA, epsilon: DEFAULT_EPSILON, seed: DEFAULT_SEED }
    }
}

impl MonteCarloConfig {
    pub fn validate(&self) -> Result<()> {
        check_alpha(self.alpha)?;
        check_positive("epsilon", self.epsilon)
    }
}

#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ForwardPushConfig {
    pub alpha: f64,
    /// Residue-per-degree threshold below which a node leaves the frontier.
    pub rmax: f64,
    /// Seeds quickselect pivots for top-k queries.
    pub seed: u64,
}

impl Default for ForwardPushConfig {
    fn default() -> Self {
        Self { alpha: DEFAULT_ALPHA, rmax: 1e-4, seed: DEFAULT_SEED }
    }
}

impl ForwardPushConfig {
    pub fn validate(&self) -> Result<()> {
        check_alpha(self.alpha)?;
        check_positive("rmax", self.rmax)
    }
}

#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ForaConfig {
    pub alpha: f64,
    pub epsilon: f64,
    pub seed: u64,
}

impl Default for ForaConfig {
    fn default() -> Self {
        Self { alpha: DEFAULT_ALPHA, epsilon: DEFAULT_EPSILON, seed: DEFAULT_SEED }
    }
}

impl ForaConfig {
    pub fn validate(&self) -> Result<()> {
        check_alpha(self.alpha)?;
        check_positive("epsilon", self.epsilon)
    }
}

#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ForaTopKConfig {
    pub alpha: f64,
    /// User-facing relative error; the refinement loop runs with `epsilon / 2`.
    pub epsilon: f64,
    pub seed: u64,
}

impl Default for ForaTopKConfig {
    fn default() -> Self {
        Self { alpha: DEFAULT_ALPHA, epsilon: DEFAULT_EPSILON, seed: DEFAULT_SEED }
    }
}

/// Parameters of one top-k query, derived from `(n, m, k)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TopKParams {
    /// ε' = ε / 2
    pub epsilon: f64,
    /// pfail = 1 / (n² · max(ln(n/k), 1))
    pub pfail: f64,
    /// δ₀ = 1 / k
    pub initial_delta: f64,
    /// δ floor = 1 / n
    pub min_delta: f64,
    /// Secondary frontier threshold, the rmax of the floor δ.
    pub min_rmax: f64,
}

impl ForaTopKConfig {
    pub fn validate(&self) -> Result<()> {
        check_alpha(self.alpha)?;
        check_positive("epsilon", self.epsilon)
    }

    pub fn derive(&self, node_count: usize, edge_count: usize, k: usize) -> Result<TopKParams> {
        self.validate()?;
        if node_count == 0 {
            return Err(Error::InvalidParameter("graph has no nodes".to_string()));
        }
        if k == 0 {
            return Err(Error::InvalidParameter("k must be >= 1".to_string()));
        }
        let n = node_count as f64;
        let epsilon = self.epsilon * 0.5;
        let pfail = 1.0 / n / n / (n / k as f64).ln().max(1.0);
        // δ₀ can never start below the floor.
        let min_delta = 1.0 / n;
        let initial_delta = (1.0 / k as f64).max(min_delta);
        let floor = StatParams::new(self.alpha, epsilon, min_delta, pfail)?;
        Ok(TopKParams {
            epsilon,
            pfail,
            initial_delta,
            min_delta,
            min_rmax: floor.base_rmax(edge_count),
        })
    }
}

#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PowerMethodConfig {
    pub alpha: f64,
    pub iterations: usize,
    pub seed: u64,
}

impl Default for PowerMethodConfig {
    fn default() -> Self {
        Self { alpha: DEFAULT_ALPHA, iterations: 100, seed: DEFAULT_SEED }
    }
}

impl PowerMethodConfig {
    pub fn validate(&self) -> Result<()> {
        check_alpha(self.alpha)?;
        if self.iterations == 0 {
            return Err(Error::InvalidParameter("iterations must be >= 1".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BackwardConfig {
    pub alpha: f64,
    /// Absolute residue threshold of each backward push; also the minimum stored score.
    pub threshold: f64,
    /// Keep only each source's top-k (ties included). `None` stores every entry.
    pub keep_top_k: Option<usize>,
    /// Seeds quickselect pivots when truncating to top-k.
    pub seed: u64,
}

impl Default for BackwardConfig {
    fn default() -> Self {
        Self { alpha: DEFAULT_ALPHA, threshold: 1e-4, keep_top_k: None, seed: DEFAULT_SEED }
    }
}

impl BackwardConfig {
    pub fn validate(&self) -> Result<()> {
        check_alpha(self.alpha)?;
        check_positive("threshold", self.threshold)?;
        if self.keep_top_k == Some(0) {
            return Err(Error::InvalidParameter("keep_top_k must be >= 1".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monte_carlo_budget_closed_form() {
        let p = StatParams::new(0.15, 0.5, 0.01, 0.01).unwrap();
        let expected = 3.0 * (200.0f64).ln() / 0.25 / 0.01;
        assert!((p.monte_carlo_walks() - expected).abs() < 1e-9);
    }

    #[test]
    fn fora_rmax_closed_form() {
        let p = StatParams::for_graph(0.15, 0.5, 100).unwrap();
        let m = 400usize;
        let expected = 0.5 * (0.01 / (3.0 * 400.0 * (200.0f64).ln())).sqrt() / 0.85;
        assert!((p.fora_rmax(m) - expected).abs() < 1e-15);
        let walks = 2.5 * (200.0f64).ln() / 0.25 / 0.01;
        assert!((p.fora_walks() - walks).abs() < 1e-9);
    }

    #[test]
    fn rejects_out_of_domain_parameters() {
        assert!(StatParams::new(0.0, 0.5, 0.1, 0.1).is_err());
        assert!(StatParams::new(0.15, -1.0, 0.1, 0.1).is_err());
        assert!(StatParams::new(0.15, 0.5, 0.0, 0.1).is_err());
        assert!(StatParams::new(0.15, 0.5, 0.1, 1.5).is_err());
        assert!(StatParams::for_graph(0.15, 0.5, 0).is_err());
        assert!(PowerMethodConfig { iterations: 0, ..Default::default() }.validate().is_err());
        let bad = BackwardConfig { keep_top_k: Some(0), ..Default::default() };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn single_node_graph_uses_pfail_one() {
        let p = StatParams::for_graph(0.15, 0.5, 1).unwrap();
        assert_eq!((p.delta, p.pfail), (1.0, 1.0));
        assert!((p.log_term() - std::f64::consts::LN_2).abs() < 1e-15);
        let walks = p.monte_carlo_walks();
        assert!(walks.is_finite() && walks > 0.0);
    }

    #[test]
    fn topk_params_start_at_one_over_k() {
        let p = ForaTopKConfig::default().derive(1000, 5000, 10).unwrap();
        assert_eq!(p.epsilon, 0.25);
        assert!((p.initial_delta - 0.1).abs() < 1e-15);
        assert!((p.min_delta - 1e-3).abs() < 1e-15);
        let pfail = 1.0 / 1e6 / (100.0f64).ln();
        assert!((p.pfail - pfail).abs() < 1e-18);
        assert!(p.min_rmax > 0.0);
    }
}

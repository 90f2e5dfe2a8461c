//! # Multi-Head Latent Attention Lab
//!
//! Keys and values are not projected from the hidden state directly. The
//! hidden state is first compressed to a small latent `c_KV` (the only
//! thing a KV cache has to keep), then expanded back:
//!
//! ```text
//! q    = hₜ·W_Q
//! c_KV = hₜ·W_DKV          k = c_KV·W_UK        v = c_KV·W_UV
//! out  = softmax(q·Kᵀ / √d)·V
//! ```
//!
//! The sequence is two identical tokens, so `K` and `V` repeat the
//! reconstructed rows.
//!
//! The input state and the KV projections here are shared with the query
//! compression and RoPE variants.

use matrixlab_core::{StepGraph, WorkflowSpec};
use matrixlab_engine::ops::repeat_rows;
use matrixlab_engine::{matrix, scaled_dot_product, EngineResult, Matrix};

use crate::error::ModuleResult;
use crate::module::{check_expectations, Dataset, ExpectedTable, LearningModule};

pub const SLUG: &str = "multi-head-latent-attention";

/// Tokens in the attended sequence.
pub const SEQUENCE_LENGTH: usize = 2;

/// Head dimension of the content path.
pub const HEAD_DIM: usize = 4;

pub(crate) fn hidden_state() -> EngineResult<Matrix> {
    matrix![[0.5, 0.8, -0.2, 0.1, 0.9, -0.5, 0.3, 0.4]]
}

pub(crate) fn kv_down_projection() -> EngineResult<Matrix> {
    matrix![[1, 0], [0, 1], [1, 0], [0, 1], [0, 0], [0, 0], [1, 1], [-1, -1]]
}

pub(crate) fn key_up_projection() -> EngineResult<Matrix> {
    matrix![[1, 0, 1, 0], [0, 1, 0, 1]]
}

pub(crate) fn value_up_projection() -> EngineResult<Matrix> {
    matrix![[0, 2, 0, 1], [1, 0, 2, 0]]
}

pub(crate) fn query_down_projection() -> EngineResult<Matrix> {
    matrix![
        [1, 0, 1],
        [0, 1, 0],
        [-1, 0, 0],
        [0, -1, 1],
        [1, 1, 0],
        [0, 0, 1],
        [0, 1, 0],
        [-1, 0, -1]
    ]
}

pub(crate) fn query_up_projection() -> EngineResult<Matrix> {
    matrix![[1, 0, 0, 1], [0, 1, 1, 0], [0, 0, 1, 1]]
}

/// Attend from `query` over a sequence of identical `key`/`value` tokens.
pub(crate) fn attend_repeated(
    query: &Matrix,
    key: &Matrix,
    value: &Matrix,
    head_dim: usize,
) -> EngineResult<Matrix> {
    let keys = repeat_rows(key, SEQUENCE_LENGTH)?;
    let values = repeat_rows(value, SEQUENCE_LENGTH)?;
    let scale = (head_dim as f64).sqrt();
    Ok(scaled_dot_product(query, &keys, &values, scale)?.output)
}

pub struct MultiHeadLatentAttention {
    graph: StepGraph,
    dataset: Dataset,
    expected: ExpectedTable,
}

impl MultiHeadLatentAttention {
    pub fn new() -> ModuleResult<Self> {
        let h = hidden_state()?;
        let w_q = matrix![
            [1, 0, 0, 0],
            [0, 1, 0, 0],
            [0, 0, 1, 0],
            [0, 0, 0, 1],
            [1, 0, 1, 0],
            [0, 1, 0, 1],
            [-1, 0, 1, 0],
            [0, -1, 0, 1]
        ]?;
        let w_dkv = kv_down_projection()?;
        let w_uk = key_up_projection()?;
        let w_uv = value_up_projection()?;

        let q = h.matmul(&w_q)?;
        let c_kv = h.matmul(&w_dkv)?;
        let k = c_kv.matmul(&w_uk)?;
        let v = c_kv.matmul(&w_uv)?;
        let output = attend_repeated(&q, &k, &v, HEAD_DIM)?;

        let mut expected = ExpectedTable::new();
        expected.insert("q", q);
        expected.insert("c_kv", c_kv);
        expected.insert("k_recon", k);
        expected.insert("v_recon", v);
        expected.insert("attention_calc", output);

        let graph = WorkflowSpec::new()
            .calculation("calc_q", "q", &[])
            .calculation("calc_c_kv", "c_kv", &[])
            .calculation("calc_k", "k_recon", &["calc_c_kv"])
            .calculation("calc_v", "v_recon", &["calc_c_kv"])
            .calculation("attention-summary", "attention_calc", &["calc_q", "calc_k", "calc_v"])
            .build()?;
        check_expectations(SLUG, &graph, &expected)?;

        let dataset = Dataset::new()
            .with("input", h)
            .with("w_q", w_q)
            .with("w_dkv", w_dkv)
            .with("w_uk", w_uk)
            .with("w_uv", w_uv);

        Ok(Self {
            graph,
            dataset,
            expected,
        })
    }
}

impl LearningModule for MultiHeadLatentAttention {
    fn slug(&self) -> &'static str {
        SLUG
    }

    fn title(&self) -> &'static str {
        "Multi-Head Latent Attention"
    }

    fn workflow(&self) -> &StepGraph {
        &self.graph
    }

    fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    fn expected(&self) -> &ExpectedTable {
        &self.expected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projections() {
        let lab = MultiHeadLatentAttention::new().unwrap();
        let close = |step: &str, m: Matrix| {
            assert!(
                lab.calculate_expected(step).unwrap().approx_eq(&m, 1e-12),
                "{} differs",
                step
            );
        };
        close("q", matrix![[1.1, -0.1, 1.0, 0.0]].unwrap());
        close("c_kv", matrix![[0.2, 0.8]].unwrap());
        close("k_recon", matrix![[0.2, 0.8, 0.2, 0.8]].unwrap());
        close("v_recon", matrix![[0.8, 0.4, 1.6, 0.2]].unwrap());
    }

    #[test]
    fn test_identical_tokens_return_the_value() {
        let lab = MultiHeadLatentAttention::new().unwrap();
        let v = lab.calculate_expected("v_recon").unwrap();
        assert!(lab
            .calculate_expected("attention_calc")
            .unwrap()
            .approx_eq(v, 1e-12));
    }

    #[test]
    fn test_two_entry_points() {
        let lab = MultiHeadLatentAttention::new().unwrap();
        assert_eq!(lab.workflow().roots(), vec!["calc_q", "calc_c_kv"]);
        assert_eq!(lab.workflow().entry(), "calc_q");
        assert_eq!(
            lab.workflow().dependents("calc_c_kv").unwrap(),
            vec!["calc_k", "calc_v"]
        );
    }
}

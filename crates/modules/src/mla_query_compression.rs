//! # MLA with Query Compression
//!
//! The latent attention lab with the query path compressed as well:
//!
//! ```text
//! c_Q  = hₜ·W_DQ     q = c_Q·W_UQ
//! c_KV = hₜ·W_DKV    k = c_KV·W_UK    v = c_KV·W_UV
//! ```

use matrixlab_core::{StepGraph, WorkflowSpec};

use crate::error::ModuleResult;
use crate::mla::{self, HEAD_DIM};
use crate::module::{check_expectations, Dataset, ExpectedTable, LearningModule};

pub const SLUG: &str = "mla-query-compression";

pub struct MlaQueryCompression {
    graph: StepGraph,
    dataset: Dataset,
    expected: ExpectedTable,
}

impl MlaQueryCompression {
    pub fn new() -> ModuleResult<Self> {
        let h = mla::hidden_state()?;
        let w_dq = mla::query_down_projection()?;
        let w_uq = mla::query_up_projection()?;
        let w_dkv = mla::kv_down_projection()?;
        let w_uk = mla::key_up_projection()?;
        let w_uv = mla::value_up_projection()?;

        let c_q = h.matmul(&w_dq)?;
        let q = c_q.matmul(&w_uq)?;
        let c_kv = h.matmul(&w_dkv)?;
        let k = c_kv.matmul(&w_uk)?;
        let v = c_kv.matmul(&w_uv)?;
        let output = mla::attend_repeated(&q, &k, &v, HEAD_DIM)?;

        let mut expected = ExpectedTable::new();
        expected.insert("c_q", c_q);
        expected.insert("q_recon", q);
        expected.insert("c_kv", c_kv);
        expected.insert("k_recon", k);
        expected.insert("v_recon", v);
        expected.insert("attention_calc", output);

        let graph = WorkflowSpec::new()
            .calculation("calc_c_q", "c_q", &[])
            .calculation("calc_c_kv", "c_kv", &[])
            .calculation("calc_q_recon", "q_recon", &["calc_c_q"])
            .calculation("calc_k_recon", "k_recon", &["calc_c_kv"])
            .calculation("calc_v_recon", "v_recon", &["calc_c_kv"])
            .calculation(
                "attention-summary",
                "attention_calc",
                &["calc_q_recon", "calc_k_recon", "calc_v_recon"],
            )
            .build()?;
        check_expectations(SLUG, &graph, &expected)?;

        let dataset = Dataset::new()
            .with("input", h)
            .with("w_dq", w_dq)
            .with("w_uq", w_uq)
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

impl LearningModule for MlaQueryCompression {
    fn slug(&self) -> &'static str {
        SLUG
    }

    fn title(&self) -> &'static str {
        "MLA with Query Compression"
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

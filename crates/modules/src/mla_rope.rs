//! # MLA with Decoupled RoPE
//!
//! Positional information cannot pass through the shared latent, so each of
//! query and key gets a small extra slice that is rotated and appended to
//! its content part:
//!
//! ```text
//! q_C = c_Q·W_UQ      q_R = rope(c_Q·W_QR)     q = [q_C | q_R]
//! k_C = c_KV·W_UK     k_R = rope(hₜ·W_KR)      k = [k_C | k_R]
//! v   = c_KV·W_UV
//! out = softmax(q·Kᵀ / √(d + d_R))·V
//! ```
//!
//! The key's RoPE slice reads the hidden state directly, so its projection
//! step is a root of the workflow.

use matrixlab_core::{StepGraph, WorkflowSpec};
use matrixlab_engine::matrix;
use matrixlab_engine::ops::{concat_columns, rope_pair_rotation};

use crate::error::ModuleResult;
use crate::mla::{self, HEAD_DIM};
use crate::module::{check_expectations, Dataset, ExpectedTable, LearningModule};

pub const SLUG: &str = "mla-rope";

/// Width of the rotated slice.
pub const ROPE_DIM: usize = 2;

pub struct MlaRope {
    graph: StepGraph,
    dataset: Dataset,
    expected: ExpectedTable,
}

impl MlaRope {
    pub fn new() -> ModuleResult<Self> {
        let h = mla::hidden_state()?;
        let w_dq = mla::query_down_projection()?;
        let w_uq = mla::query_up_projection()?;
        let w_dkv = mla::kv_down_projection()?;
        let w_uk = mla::key_up_projection()?;
        let w_uv = mla::value_up_projection()?;
        let w_qr = matrix![[0.8, -0.3], [0.2, 0.9], [-0.5, 0.1]]?;
        let w_kr = matrix![
            [0.6, -0.1],
            [0.1, 0.7],
            [0.4, -0.2],
            [-0.3, 0.8],
            [0.2, -0.5],
            [-0.6, 0.3],
            [0.9, 0.1],
            [-0.2, -0.7]
        ]?;

        let c_q = h.matmul(&w_dq)?;
        let c_kv = h.matmul(&w_dkv)?;
        let q_content = c_q.matmul(&w_uq)?;
        let k_content = c_kv.matmul(&w_uk)?;
        let v_final = c_kv.matmul(&w_uv)?;
        let q_rope_pre = c_q.matmul(&w_qr)?;
        let k_rope_pre = h.matmul(&w_kr)?;
        let q_rope_post = rope_pair_rotation(&q_rope_pre);
        let k_rope_post = rope_pair_rotation(&k_rope_pre);
        let q_final = concat_columns(&q_content, &q_rope_post)?;
        let k_final = concat_columns(&k_content, &k_rope_post)?;
        let output = mla::attend_repeated(&q_final, &k_final, &v_final, HEAD_DIM + ROPE_DIM)?;

        let mut expected = ExpectedTable::new();
        expected.insert("c_q", c_q);
        expected.insert("c_kv", c_kv);
        expected.insert("q_content", q_content);
        expected.insert("k_content", k_content);
        expected.insert("v_final", v_final);
        expected.insert("q_rope_pre", q_rope_pre);
        expected.insert("k_rope_pre", k_rope_pre);
        expected.insert("q_rope_post", q_rope_post);
        expected.insert("k_rope_post", k_rope_post);
        expected.insert("q_final", q_final);
        expected.insert("k_final", k_final);
        expected.insert("attention_calc", output);

        let graph = WorkflowSpec::new()
            .calculation("calc_c_q", "c_q", &[])
            .calculation("calc_c_kv", "c_kv", &[])
            .calculation("calc_k_rope_pre", "k_rope_pre", &[])
            .calculation("calc_q_content", "q_content", &["calc_c_q"])
            .calculation("calc_q_rope_pre", "q_rope_pre", &["calc_c_q"])
            .calculation("calc_k_content", "k_content", &["calc_c_kv"])
            .calculation("calc_v_final", "v_final", &["calc_c_kv"])
            .calculation("apply_rope_q", "q_rope_post", &["calc_q_rope_pre"])
            .calculation("apply_rope_k", "k_rope_post", &["calc_k_rope_pre"])
            .calculation("concat_q", "q_final", &["calc_q_content", "apply_rope_q"])
            .calculation("concat_k", "k_final", &["calc_k_content", "apply_rope_k"])
            .calculation(
                "attention-calc",
                "attention_calc",
                &["concat_q", "concat_k", "calc_v_final"],
            )
            .build()?;
        check_expectations(SLUG, &graph, &expected)?;

        let dataset = Dataset::new()
            .with("input_h_t", h)
            .with("w_dq", w_dq)
            .with("w_uq", w_uq)
            .with("w_qr", w_qr)
            .with("w_kr", w_kr)
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

impl LearningModule for MlaRope {
    fn slug(&self) -> &'static str {
        SLUG
    }

    fn title(&self) -> &'static str {
        "MLA with Decoupled RoPE"
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

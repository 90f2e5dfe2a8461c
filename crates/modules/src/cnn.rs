//! # Convolutional Network Lab
//!
//! A 5×5 "corner" image through one vertical-edge kernel:
//!
//! ```text
//! convolution ─▶ relu ─▶ pooling ─▶ flatten ─▶ dense
//! ```
//!
//! The steps form a chain. Convolution and pooling cells highlight the
//! input window they read.

use matrixlab_core::validation::Window;
use matrixlab_core::{StepGraph, WorkflowSpec};
use matrixlab_engine::{conv, matrix, ops};

use crate::error::ModuleResult;
use crate::module::{check_expectations, Dataset, ExpectedTable, LearningModule};

pub const SLUG: &str = "cnn";

pub const KERNEL_BIAS: f64 = 0.0;
pub const DENSE_BIAS: f64 = 0.1;
pub const POOL_SIZE: usize = 2;
pub const POOL_STRIDE: usize = 1;

/// Step ids in the order they unlock.
const SEQUENCE: [(&str, &str); 5] = [
    ("convolution", "convolution"),
    ("relu", "relu"),
    ("pooling", "pooling"),
    ("flatten", "flatten"),
    ("dense", "dense"),
];

pub struct Cnn {
    graph: StepGraph,
    dataset: Dataset,
    expected: ExpectedTable,
    kernel_window: Window,
}

impl Cnn {
    pub fn new() -> ModuleResult<Self> {
        let image = matrix![
            [10, 10, 10, 0, 0],
            [10, 10, 10, 0, 0],
            [10, 10, 10, 0, 0],
            [0, 0, 0, 0, 0],
            [0, 0, 0, 0, 0]
        ]?;
        let kernel = matrix![[1, 0, -1], [1, 0, -1], [1, 0, -1]]?;
        let dense_weights = matrix![[0.5], [-0.5], [0.2], [-0.2]]?;

        let convolved = conv::convolution(&image, &kernel, KERNEL_BIAS)?;
        let activated = ops::relu(&convolved);
        let pooled = conv::max_pooling(&activated, POOL_SIZE, POOL_STRIDE)?;
        let flat = conv::flatten(&pooled);
        let output = conv::dense(&flat, &dense_weights, DENSE_BIAS)?;

        let mut expected = ExpectedTable::new();
        expected.insert("convolution", convolved);
        expected.insert("relu", activated);
        expected.insert("pooling", pooled);
        expected.insert("flatten", flat);
        expected.insert("dense", output);

        let mut spec = WorkflowSpec::new();
        let mut previous: Option<&str> = None;
        for (id, key) in SEQUENCE {
            let prerequisites: Vec<&str> = previous.into_iter().collect();
            spec = spec.calculation(id, key, &prerequisites);
            if let Some(prev) = previous {
                spec = spec.focus(prev, &[id]);
            }
            previous = Some(id);
        }
        let graph = spec.build()?;
        check_expectations(SLUG, &graph, &expected)?;

        let kernel_window = Window {
            height: kernel.rows(),
            width: kernel.cols(),
            stride: 1,
        };
        let dataset = Dataset::new()
            .with("input-image", image)
            .with("kernel", kernel)
            .with_scalar("kernel_bias", KERNEL_BIAS)
            .with("dense-weights", dense_weights)
            .with_scalar("dense_bias", DENSE_BIAS);

        Ok(Self {
            graph,
            dataset,
            expected,
            kernel_window,
        })
    }
}

impl LearningModule for Cnn {
    fn slug(&self) -> &'static str {
        SLUG
    }

    fn title(&self) -> &'static str {
        "Convolutional Neural Networks"
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

    fn window(&self, step: &str) -> Option<Window> {
        match step {
            "convolution" => Some(self.kernel_window),
            "pooling" => Some(Window {
                height: POOL_SIZE,
                width: POOL_SIZE,
                stride: POOL_STRIDE,
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_feature_maps() {
        let lab = Cnn::new().unwrap();
        assert_eq!(
            lab.calculate_expected("convolution").unwrap(),
            &matrix![[0, 30, 30], [0, 20, 20], [0, 10, 10]].unwrap()
        );
        assert_eq!(
            lab.calculate_expected("relu").unwrap(),
            lab.calculate_expected("convolution").unwrap()
        );
        assert_eq!(
            lab.calculate_expected("pooling").unwrap(),
            &matrix![[30, 30], [20, 20]].unwrap()
        );
        assert_eq!(
            lab.calculate_expected("flatten").unwrap(),
            &matrix![[30, 30, 20, 20]].unwrap()
        );
    }

    #[test]
    fn test_dense_output() {
        let lab = Cnn::new().unwrap();
        let out = lab.calculate_expected("dense").unwrap();
        assert_relative_eq!(out.as_scalar().unwrap(), 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_chain_and_focus() {
        let lab = Cnn::new().unwrap();
        let graph = lab.workflow();
        assert_eq!(graph.roots(), vec!["convolution"]);
        assert_eq!(graph.prerequisites("flatten").unwrap(), &["pooling".to_string()]);
        assert_eq!(graph.focus_targets("relu"), &["pooling".to_string()]);
        assert!(graph.focus_targets("dense").is_empty());
    }

    #[test]
    fn test_windows() {
        let lab = Cnn::new().unwrap();
        assert_eq!(
            lab.window("convolution"),
            Some(Window {
                height: 3,
                width: 3,
                stride: 1
            })
        );
        assert_eq!(lab.window("pooling").map(|w| w.height), Some(2));
        assert_eq!(lab.window("flatten"), None);
    }

    #[test]
    fn test_unknown_step_names_module() {
        let err = Cnn::new().unwrap().calculate_expected("softmax").unwrap_err();
        assert_eq!(err.to_string(), "Unknown cnn step: softmax");
    }
}

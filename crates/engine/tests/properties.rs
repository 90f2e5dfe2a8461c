//! # Algebraic Properties
//!
//! Property tests over random small matrices:
//! - Multiplication is associative (within tolerance)
//! - Transpose is an involution and reverses products
//! - Softmax rows are distributions
//! - ReLU is non-negative and fixes non-negative entries
//! - Convolution and pooling output shapes

use matrixlab_core::Shape;
use matrixlab_engine::{conv, ops, Engine, Matrix, Rounding};
use proptest::prelude::*;

fn matrix_of(rows: usize, cols: usize) -> impl Strategy<Value = Matrix> {
    prop::collection::vec(-10.0f64..10.0, rows * cols)
        .prop_map(move |data| Matrix::from_vec(rows, cols, data).unwrap())
}

fn any_matrix() -> impl Strategy<Value = Matrix> {
    (1usize..6, 1usize..6).prop_flat_map(|(r, c)| matrix_of(r, c))
}

/// Three matrices whose chained product is defined.
fn chain() -> impl Strategy<Value = (Matrix, Matrix, Matrix)> {
    (1usize..5, 1usize..5, 1usize..5, 1usize..5)
        .prop_flat_map(|(m, k, n, p)| (matrix_of(m, k), matrix_of(k, n), matrix_of(n, p)))
}

// ============================================================================
// Multiplication and Transpose
// ============================================================================

proptest! {
    #[test]
    fn prop_multiply_associative((a, b, c) in chain()) {
        let left = a.matmul(&b).unwrap().matmul(&c).unwrap();
        let right = a.matmul(&b.matmul(&c).unwrap()).unwrap();
        prop_assert!(left.approx_eq(&right, 1e-9));
    }

    #[test]
    fn prop_transpose_involution(a in any_matrix()) {
        prop_assert_eq!(a.transpose().transpose(), a);
    }

    #[test]
    fn prop_transpose_reverses_product((a, b, _c) in chain()) {
        let ab_t = a.matmul(&b).unwrap().transpose();
        let bt_at = b.transpose().matmul(&a.transpose()).unwrap();
        prop_assert!(ab_t.approx_eq(&bt_at, 1e-9));
    }

    #[test]
    fn prop_exact_engine_matches_matrix(a in matrix_of(3, 3), b in matrix_of(3, 3)) {
        let engine = Engine::new(Rounding::Exact);
        prop_assert_eq!(engine.multiply(&a, &b).unwrap(), a.matmul(&b).unwrap());
        prop_assert_eq!(engine.add(&a, &b).unwrap(), a.add(&b).unwrap());
    }

    #[test]
    fn prop_rounded_engine_has_four_decimals(a in matrix_of(2, 3), b in matrix_of(3, 2)) {
        let engine = Engine::rounded(4);
        let product = engine.multiply(&a, &b).unwrap();
        for &x in product.data() {
            prop_assert!(((x * 1e4).round() / 1e4 - x).abs() < 1e-12);
        }
    }
}

// ============================================================================
// Activations
// ============================================================================

proptest! {
    #[test]
    fn prop_softmax_rows_are_distributions(a in any_matrix()) {
        let s = ops::softmax(&a);
        for r in 0..s.rows() {
            let row = s.row_slice(r).unwrap();
            let sum: f64 = row.iter().sum();
            prop_assert!((sum - 1.0).abs() <= 1e-9);
            prop_assert!(row.iter().all(|&p| (0.0..=1.0).contains(&p)));
        }
    }

    #[test]
    fn prop_relu_non_negative(a in any_matrix()) {
        let r = ops::relu(&a);
        for (&x, &y) in a.data().iter().zip(r.data()) {
            prop_assert!(y >= 0.0);
            if x >= 0.0 {
                prop_assert_eq!(x, y);
            }
        }
    }

    #[test]
    fn prop_rope_twice_negates_pairs(a in matrix_of(1, 6)) {
        let twice = ops::rope_pair_rotation(&ops::rope_pair_rotation(&a));
        prop_assert_eq!(twice, a.scale(-1.0));
    }
}

// ============================================================================
// Convolution Shapes
// ============================================================================

proptest! {
    #[test]
    fn prop_convolution_shape(
        (input, kernel) in (2usize..7, 2usize..7)
            .prop_flat_map(|(h, w)| (matrix_of(h, w), (1..=h, 1..=w)))
            .prop_flat_map(|(input, (kh, kw))| (Just(input), matrix_of(kh, kw)))
    ) {
        let out = conv::convolution(&input, &kernel, 0.0).unwrap();
        prop_assert_eq!(
            out.shape(),
            Shape::new(input.rows() - kernel.rows() + 1, input.cols() - kernel.cols() + 1)
        );
    }

    #[test]
    fn prop_pooling_shape(a in matrix_of(5, 5), pool in 1usize..=5, stride in 1usize..4) {
        let out = conv::max_pooling(&a, pool, stride).unwrap();
        let side = (5 - pool) / stride + 1;
        prop_assert_eq!(out.shape(), Shape::new(side, side));
        prop_assert!(out.max() <= a.max());
    }
}

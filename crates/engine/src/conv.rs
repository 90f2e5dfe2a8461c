//! # Convolution Pipeline
//!
//! The CNN lab's forward pass: valid 2-D correlation, ReLU, max-pooling,
//! flattening and a single dense unit.
//!
//! ## Example
//!
//! ```rust
//! use matrixlab_engine::{conv, matrix};
//!
//! let input = matrix![[1, 2, 3], [4, 5, 6], [7, 8, 9]].unwrap();
//! let kernel = matrix![[1, 0], [0, 1]].unwrap();
//! let out = conv::convolution(&input, &kernel, 0.0).unwrap();
//! assert_eq!(out.to_rows(), vec![vec![6.0, 8.0], vec![12.0, 14.0]]);
//! ```

use crate::error::{EngineError, EngineResult};
use crate::matrix::Matrix;

/// Valid correlation of `kernel` over `input`, plus a scalar bias.
///
/// Output is `(H - kh + 1) × (W - kw + 1)`; each cell is the sum of the
/// kernel times the input patch at that offset.
pub fn convolution(input: &Matrix, kernel: &Matrix, bias: f64) -> EngineResult<Matrix> {
    let (h, w) = (input.rows(), input.cols());
    let (kh, kw) = (kernel.rows(), kernel.cols());
    if kh > h || kw > w {
        return Err(EngineError::mismatch("convolution", input.shape(), kernel.shape()));
    }

    let (out_h, out_w) = (h - kh + 1, w - kw + 1);
    let mut data = Vec::with_capacity(out_h * out_w);
    for i in 0..out_h {
        for j in 0..out_w {
            let mut sum = 0.0;
            for ki in 0..kh {
                for kj in 0..kw {
                    sum += input.data()[(i + ki) * w + j + kj] * kernel.data()[ki * kw + kj];
                }
            }
            data.push(sum + bias);
        }
    }
    Matrix::from_vec(out_h, out_w, data)
}

/// Max over `pool × pool` windows moved by `stride`.
///
/// Output is `floor((H - pool) / stride) + 1` in each dimension.
///
/// # Errors
///
/// `InvalidWindow` if `pool` or `stride` is zero or the window does not fit.
pub fn max_pooling(input: &Matrix, pool: usize, stride: usize) -> EngineResult<Matrix> {
    let (h, w) = (input.rows(), input.cols());
    if pool == 0 || stride == 0 || pool > h || pool > w {
        return Err(EngineError::InvalidWindow {
            pool,
            stride,
            input: input.shape(),
        });
    }

    let out_h = (h - pool) / stride + 1;
    let out_w = (w - pool) / stride + 1;
    let mut data = Vec::with_capacity(out_h * out_w);
    for i in 0..out_h {
        for j in 0..out_w {
            let mut max = f64::NEG_INFINITY;
            for pi in 0..pool {
                for pj in 0..pool {
                    max = max.max(input.data()[(i * stride + pi) * w + j * stride + pj]);
                }
            }
            data.push(max);
        }
    }
    Matrix::from_vec(out_h, out_w, data)
}

/// All entries as one row, in row-major order.
pub fn flatten(input: &Matrix) -> Matrix {
    input.flattened()
}

/// `input · weights + bias` with a scalar bias.
pub fn dense(input: &Matrix, weights: &Matrix, bias: f64) -> EngineResult<Matrix> {
    Ok(input.matmul(weights)?.map(|x| x + bias))
}

//! Module catalog keyed by URL slug.

use tracing::info;

use crate::cnn::{self, Cnn};
use crate::error::{ModuleError, ModuleResult};
use crate::linear_regression::{self, LinearRegression};
use crate::logistic_regression::{self, LogisticRegression};
use crate::mla::{self, MultiHeadLatentAttention};
use crate::mla_query_compression::{self, MlaQueryCompression};
use crate::mla_rope::{self, MlaRope};
use crate::module::LearningModule;
use crate::rnn::{self, Rnn};

/// Every available slug, in menu order.
pub fn catalog() -> &'static [&'static str] {
    &[
        rnn::SLUG,
        linear_regression::SLUG,
        logistic_regression::SLUG,
        cnn::SLUG,
        mla::SLUG,
        mla_query_compression::SLUG,
        mla_rope::SLUG,
    ]
}

/// Construct the module registered under `slug`.
///
/// Construction runs the module's whole numeric pipeline once.
pub fn load(slug: &str) -> ModuleResult<Box<dyn LearningModule>> {
    let module: Box<dyn LearningModule> = match slug {
        rnn::SLUG => Box::new(Rnn::new()?),
        linear_regression::SLUG => Box::new(LinearRegression::new()?),
        logistic_regression::SLUG => Box::new(LogisticRegression::new()?),
        cnn::SLUG => Box::new(Cnn::new()?),
        mla::SLUG => Box::new(MultiHeadLatentAttention::new()?),
        mla_query_compression::SLUG => Box::new(MlaQueryCompression::new()?),
        mla_rope::SLUG => Box::new(MlaRope::new()?),
        _ => {
            return Err(ModuleError::UnknownModule {
                slug: slug.to_string(),
            })
        }
    };
    info!(
        target: "matrixlab-modules",
        "loaded {} ({} steps, {} expected entries)",
        slug,
        module.workflow().len(),
        module.expected().len()
    );
    Ok(module)
}

//! Walkthrough: one user session through the CNN and linear regression labs
//!
//! Run with: cargo run -p matrixlab-modules --example walkthrough
//!
//! This example demonstrates:
//! - Loading configuration and installing logging
//! - Listing and loading modules from the catalog
//! - Answering cells, including wrong and malformed answers
//! - Focus, highlighting, progress and reset

use matrixlab_core::{load_config, logging::init_logging, Verdict};
use matrixlab_modules::{catalog, load, LabSession};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(None)?;
    init_logging(&config.logging);

    println!("=== MatrixLab Walkthrough ===\n");

    // -------------------------------------------------------------------------
    // Catalog
    // -------------------------------------------------------------------------
    println!("1. Available labs");
    println!("-----------------");
    for slug in catalog() {
        let module = load(slug)?;
        println!(
            "{:<30} {} ({} steps)",
            slug,
            module.title(),
            module.workflow().len()
        );
    }
    println!();

    // -------------------------------------------------------------------------
    // CNN: convolution cell by cell
    // -------------------------------------------------------------------------
    println!("2. CNN convolution");
    println!("------------------");
    let mut cnn = LabSession::new(load("cnn")?, &config)?;
    println!("focus: {:?}", cnn.focus());
    println!("first cell reads input cells {:?}", cnn.highlight("convolution")?);

    match cnn.submit("convolution", "ten") {
        Ok(v) => println!("'ten' -> {:?}", v),
        Err(e) => println!("'ten' -> error: {}", e),
    }
    println!("'5'   -> {:?}", cnn.submit("convolution", "5")?);

    let expected = cnn.module().calculate_expected("convolution")?.clone();
    println!("expected:\n{}", expected);
    for value in expected.data() {
        let verdict = cnn.submit("convolution", &value.to_string())?;
        if verdict == Verdict::Completed {
            println!("convolution complete, focus now {:?}", cnn.focus());
        }
    }
    println!("progress: {:.0}%", cnn.progress() * 100.0);
    println!();

    // -------------------------------------------------------------------------
    // Linear regression: intro, locked steps, reset
    // -------------------------------------------------------------------------
    println!("3. Linear regression");
    println!("--------------------");
    let mut linear = LabSession::new(load("linear-regression")?, &config)?;
    if let Err(e) = linear.submit("loss-calc", "6.65") {
        println!("too early: {}", e);
    }
    println!("after intro, focus: {:?}", linear.begin()?);
    for value in ["14", "21", "26", "33", "40"] {
        println!("prediction {} -> {:?}", value, linear.submit("prediction-calc", value)?);
    }
    println!("loss 6.65 -> {:?}", linear.submit("loss-calc", "6.65")?);
    println!("focus: {:?}", linear.focus());

    linear.reset();
    println!("after reset, focus: {:?}", linear.focus());
    println!();

    println!("snapshot: {}", linear.snapshot().to_json()?);
    Ok(())
}

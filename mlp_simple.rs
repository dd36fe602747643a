use neural_chain::architecture::{build_model, load_architecture};
use neural_chain::config::load_config;
use neural_chain::prelude::*;
use std::env;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

// Small MLP to learn XOR (educational example).
const DEFAULT_CONFIG: &str = "config/xor_adam.json";
const DEFAULT_ARCHITECTURE: &str = "config/architectures/xor_mlp.json";
// Log the epoch loss every this many epochs.
const REPORT_EVERY: usize = 500;

// XOR dataset (binary inputs and expected outputs).
fn xor_dataset() -> (Vec<Tensor>, Vec<Tensor>) {
    let inputs = [[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]]
        .iter()
        .map(|x| vector(x))
        .collect();
    let targets = [0.0, 1.0, 1.0, 0.0].iter().map(|&y| vector(&[y])).collect();
    (inputs, targets)
}

// Training loop; returns the loss of the last epoch.
fn train(
    model: &mut Model,
    trainer: &mut GradientDescent<OptimizerKind>,
    epochs: usize,
    inputs: &[Tensor],
    targets: &[Tensor],
) -> Result<f64> {
    let mut loss = 0.0;
    for epoch in 1..=epochs {
        loss = trainer.run(model, inputs, targets)?;
        if epoch % REPORT_EVERY == 0 || epoch == epochs {
            info!(epoch, loss, "training");
        }
    }
    Ok(loss)
}

// Print predictions against the expected outputs.
fn test(model: &mut Model, inputs: &[Tensor], targets: &[Tensor]) -> Result<()> {
    println!("\nTest results:");
    for (input, target) in inputs.iter().zip(targets) {
        let output = model.predict(input)?;
        println!(
            "Input: {:.1}, {:.1}, Expected: {:.1}, Predicted: {:.3}",
            input[[0]],
            input[[1]],
            target[[0]],
            output[[0]]
        );
    }
    let loss = model.evaluate(inputs, targets, &MeanSquare)?;
    println!("Mean squared error: {:.6}", loss);
    Ok(())
}

fn run(config_path: &str, architecture_path: &str) -> Result<()> {
    let config = load_config(config_path)?;
    let architecture = load_architecture(architecture_path)?;

    let mut model = build_model(&architecture)?;
    let mut trainer = config.build_trainer()?;
    info!(
        optimizer = trainer.optimizer().name(),
        batch_size = trainer.batch_size(),
        learning_rate = trainer.learning_rate(),
        parameters = model.parameter_count()?,
        "starting XOR training"
    );

    let (inputs, targets) = xor_dataset();
    train(&mut model, &mut trainer, config.epochs, &inputs, &targets)?;
    test(&mut model, &inputs, &targets)
}

fn main() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("failed to install tracing subscriber");
    }

    let args: Vec<String> = env::args().collect();
    let config_path = args.get(1).map(String::as_str).unwrap_or(DEFAULT_CONFIG);
    let architecture_path = args.get(2).map(String::as_str).unwrap_or(DEFAULT_ARCHITECTURE);

    if let Err(e) = run(config_path, architecture_path) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

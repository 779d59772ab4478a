//! Trains an autoencoder on a CSV file, or on synthetic data when no file is given, and prints
//! a few reconstructions.
//!
//! ```text
//! cargo run --bin reconstruct -- data/birds.csv
//! ```

use autoencoder::{dataset, Autoencoder, AutoencoderConfig, Dataset, FitOptions, LayerConfig};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::StandardNormal;
use tracing_subscriber::EnvFilter;

fn main() -> autoencoder::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let x = match std::env::args().nth(1) {
        Some(path) => dataset::read_csv(path, true)?,
        None => dataset_latent(500, 9),
    };
    let n_inputs = x.first().map_or(0, Vec::len);
    println!("{} rows, {} features", x.len(), n_inputs);

    {
        let config = AutoencoderConfig::auto(n_inputs, 2).with_activation("tanh");
        let mut ae = Autoencoder::new(&config)?;
        let options = FitOptions::default()
            .with_batch_size(100)
            .with_iterations(2000)
            .with_step_size(0.05);
        report(&mut ae, &x, &options)?;
    }
    {
        let config = AutoencoderConfig::explicit(
            vec![LayerConfig::new(6, "tanh"), LayerConfig::new(2, "sigmoid")],
            vec![LayerConfig::new(6, "tanh"), LayerConfig::linear(n_inputs)],
        );
        let mut ae = Autoencoder::new(&config)?;
        let options = FitOptions::default()
            .with_batch_size(100)
            .with_iterations(5000)
            .with_step_size(0.01);
        report(&mut ae, &x, &options)?;
    }
    Ok(())
}

fn report(ae: &mut Autoencoder, x: &Dataset, options: &FitOptions) -> autoencoder::Result<()> {
    let summary = ae.fit(x, options)?;
    println!(
        "trained {} iterations in {}ms, last batch loss {:.6}",
        summary.iterations,
        summary.elapsed.as_millis(),
        summary.loss
    );
    let head = &x[..x.len().min(3)];
    let codes = ae.encode(head)?;
    let decoded = ae.decode(&codes)?;
    let predicted = ae.predict(head)?;
    for (((input, code), dec), pred) in head.iter().zip(&codes).zip(&decoded).zip(&predicted) {
        println!("Input: {:?}", input);
        println!("Code: {:?}", code);
        println!("Decoded: {:?}", dec);
        println!("Pred: {:?}", pred);
        println!("====================");
    }
    let errors = ae.reconstruction_error(x)?;
    let mean = errors.iter().sum::<f64>() / errors.len() as f64;
    println!("mean reconstruction error: {:.6}", mean);
    Ok(())
}

/// Rows of `features` noisy linear mixtures of two latent factors.
fn dataset_latent(count: usize, features: usize) -> Dataset {
    let mut rng = StdRng::seed_from_u64(12345);
    let mixing: Vec<[f64; 2]> = (0..features)
        .map(|_| [rng.sample(StandardNormal), rng.sample(StandardNormal)])
        .collect();
    (0..count)
        .map(|_| {
            let a: f64 = rng.sample(StandardNormal);
            let b: f64 = rng.sample(StandardNormal);
            mixing
                .iter()
                .map(|[wa, wb]| {
                    let noise: f64 = rng.sample(StandardNormal);
                    wa * a + wb * b + 0.05 * noise
                })
                .collect()
        })
        .collect()
}

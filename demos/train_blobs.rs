use ferrite_softmax::{train_loop, LinearClassifier, Matrix, TrainConfig};
use rand::prelude::*;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Four Gaussian blobs in the plane, one per class, plus a bias column.
    let centers = [(2.0, 2.0), (-2.0, 2.0), (-2.0, -2.0), (2.0, -2.0)];
    let mut rng = StdRng::seed_from_u64(2024);
    let noise = Matrix::gaussian_with(400, 2, 0.6, &mut rng);

    let mut rows = Vec::with_capacity(400);
    let mut labels = Vec::with_capacity(400);
    for i in 0..400 {
        let class = i % centers.len();
        let (cx, cy) = centers[class];
        rows.push(vec![cx + noise.get(i, 0), cy + noise.get(i, 1), 1.0]);
        labels.push(class);
    }
    let x = Matrix::try_from_data(rows)?;

    let mut classifier = LinearClassifier::with_rng(3, centers.len(), 1e-3, &mut rng);
    let mut config = TrainConfig::new(0.05, 1e-3, 500, 64);
    config.seed = Some(7);

    let history = train_loop(&mut classifier, &x, &labels, &config)?;

    println!("first loss: {:.4}", history.first().copied().unwrap_or(f64::NAN));
    println!("last loss:  {:.4}", history.last().copied().unwrap_or(f64::NAN));
    println!("accuracy:   {:.3}", classifier.accuracy(&x, &labels)?);

    classifier.save_json("blobs_classifier.json")?;
    println!("weights saved to blobs_classifier.json");
    Ok(())
}

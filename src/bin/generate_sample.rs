use std::path::PathBuf;

use anyhow::{Context, Result};

const CLUSTERS: [&str; 6] = [
    "c_loop",
    "c_null_check",
    "c_off_by_one",
    "c_overflow",
    "c_recursion",
    "c_types",
];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }
}

/// Label of an entity; roughly one in ten is still unlabeled.
fn entity_cluster(rng: &mut SimpleRng) -> &'static str {
    if rng.next_f64() < 0.1 {
        "unknown"
    } else {
        rng.pick(&CLUSTERS)
    }
}

/// Writes `train.csv` (ten ranked neighbors per entity, ids `10*e + rank`)
/// and `holdout.csv` (one row per entity) into the given directory.
///
/// Usage: `generate_sample [OUT_DIR] [ENTITIES]`
fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let out_dir = PathBuf::from(args.next().unwrap_or_else(|| ".".to_string()));
    let entities: i64 = match args.next() {
        Some(n) => n.parse().with_context(|| format!("ENTITIES '{n}' is not a number"))?,
        None => 50,
    };
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut rng = SimpleRng::new(42);

    let train_path = out_dir.join("train.csv");
    let mut train = csv::Writer::from_path(&train_path)
        .with_context(|| format!("creating {}", train_path.display()))?;
    train.write_record(["id", "cluster", "distance", "submission"])?;

    for entity in 0..entities {
        let own = entity_cluster(&mut rng);
        for rank in 0..10 {
            // Closer neighbors are more likely to share the entity's label.
            let cluster = if rng.next_f64() < 0.9 - rank as f64 * 0.07 {
                own
            } else {
                entity_cluster(&mut rng)
            };
            let distance = rank as f64 * 0.1 + rng.next_f64() * 0.05;
            let submission = rng.next_u64() % 100_000;
            train.write_record([
                (entity * 10 + rank).to_string(),
                cluster.to_string(),
                format!("{distance:.4}"),
                submission.to_string(),
            ])?;
        }
    }
    train.flush()?;

    let holdout_path = out_dir.join("holdout.csv");
    let mut holdout = csv::Writer::from_path(&holdout_path)
        .with_context(|| format!("creating {}", holdout_path.display()))?;
    holdout.write_record(["id", "cluster", "submission"])?;
    for entity in 0..entities {
        let cluster = entity_cluster(&mut rng);
        let submission = rng.next_u64() % 100_000;
        holdout.write_record([entity.to_string(), cluster.to_string(), submission.to_string()])?;
    }
    holdout.flush()?;

    log::info!(
        "wrote {} training rows to {} and {entities} holdout rows to {}",
        entities * 10,
        train_path.display(),
        holdout_path.display()
    );
    Ok(())
}

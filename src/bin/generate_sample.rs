use std::path::Path;

use anyhow::{Context, Result};
use slicemerge::data::writer::{write_trace, OutputSchema};
use slicemerge::{Sample, Trace};

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// One channel along the slice: a few peaks plus noise, never negative.
fn generate_channel(
    distances: &[f64],
    peaks: &[(f64, f64, f64)],
    noise_level: f64,
    rng: &mut SimpleRng,
) -> Vec<f64> {
    distances
        .iter()
        .map(|&d| {
            let signal: f64 = peaks
                .iter()
                .map(|&(mu, sigma, amp)| gaussian(d, mu, sigma, amp))
                .sum();
            (signal + rng.gauss(0.0, noise_level)).max(0.0)
        })
        .collect()
}

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

    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Irregularly spaced, increasing distances from 0 to roughly `length`.
fn generate_distances(length: f64, rows: usize, rng: &mut SimpleRng) -> Vec<f64> {
    let step = length / rows as f64;
    let mut d = 0.0;
    (0..rows)
        .map(|_| {
            let here = d;
            d += step * rng.uniform(0.5, 1.5);
            here
        })
        .collect()
}

fn generate_slice(length: f64, rows: usize, gain: f64, rng: &mut SimpleRng) -> Trace {
    let distances = generate_distances(length, rows, rng);
    let max = distances.last().copied().unwrap_or(0.0);

    // Marker positions as fractions of the slice length; shared across brains.
    let channel_peaks: [&[(f64, f64, f64)]; 3] = [
        &[(0.2, 0.05, 80.0), (0.7, 0.08, 50.0)],
        &[(0.45, 0.1, 120.0)],
        &[(0.1, 0.03, 30.0), (0.55, 0.04, 40.0), (0.9, 0.05, 25.0)],
    ];
    let channels: Vec<Vec<f64>> = channel_peaks
        .iter()
        .map(|peaks| {
            let scaled: Vec<(f64, f64, f64)> = peaks
                .iter()
                .map(|&(mu, sigma, amp)| (mu * max, sigma * max, amp * gain))
                .collect();
            generate_channel(&distances, &scaled, 2.0 * gain, rng)
        })
        .collect();

    let samples = distances
        .iter()
        .enumerate()
        .map(|(i, &d)| Sample::new(d, channels.iter().map(|c| c[i]).collect()))
        .collect();

    Trace::from_samples(rng.uniform(0.0, 500.0), samples)
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let schema = OutputSchema::default();
    let root = Path::new("brains");

    // Brains from different experiments differ in gain and slice length.
    let brains = [("brainA", 1.0, 1800.0), ("brainB", 2.5, 2100.0)];
    let slices = 4;

    for (name, gain, length) in brains {
        let dir = root.join(name);
        std::fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;

        for s in 0..slices {
            let rows = 300 + 40 * s;
            let slice_length = length * (1.0 + 0.05 * s as f64);
            let trace = generate_slice(slice_length, rows, gain, &mut rng);
            let path = dir.join(format!("S{s:02}.csv"));
            write_trace(&path, &trace, &schema)?;
        }
    }

    println!(
        "Wrote {} slices for each of {} brains under {}",
        slices,
        brains.len(),
        root.display()
    );
    Ok(())
}

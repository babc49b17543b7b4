use std::fmt::Write as _;

use anyhow::{Context, Result};
use rusty_spe::config::AnalysisOptions;
use rusty_spe::data::{analysis, parser};

const CHANNELS: usize = 1024;
const LIVE_TIME: f64 = 600.0;
const REAL_TIME: f64 = 612.4;
/// keV per channel of the synthetic energy calibration.
const GAIN: f64 = 1.5;
const OFFSET: f64 = -0.8;

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// Expected counts per channel: falling linear continuum plus peaks `(centre, sigma, height)`.
fn generate_spectrum(peaks: &[(f64, f64, f64)], rng: &mut SimpleRng) -> Vec<u64> {
    (0..CHANNELS)
        .map(|ch| {
            let x = ch as f64;
            let continuum = 400.0 - 0.3 * x;
            let signal: f64 = peaks
                .iter()
                .map(|&(mu, sigma, amp)| gaussian(x, mu, sigma, amp))
                .sum();
            let mean = (continuum + signal).max(0.0);
            // Gaussian approximation of Poisson noise.
            rng.gauss(mean, mean.sqrt()).round().max(0.0) as u64
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

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Render the spectrum in SPE layout, ROIs at ±3 sigma around each peak.
fn render_spe(counts: &[u64], peaks: &[(f64, f64, f64)]) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "$SPEC_ID:")?;
    writeln!(out, "Synthetic Cs-137 / Co-60 mixed source")?;
    writeln!(out, "$SPEC_REM:")?;
    writeln!(out, "DET# 1")?;
    writeln!(out, "DETDESC# generate_sample")?;
    writeln!(out, "AP# rusty-spe {}", env!("CARGO_PKG_VERSION"))?;
    writeln!(out, "$DATE_MEA:")?;
    writeln!(out, "10/16/2026 09:30:00")?;
    writeln!(out, "$MEAS_TIM:")?;
    writeln!(out, "{LIVE_TIME} {REAL_TIME}")?;

    writeln!(out, "$DATA:")?;
    writeln!(out, "0 {}", counts.len())?;
    for c in counts {
        writeln!(out, "{c:>8}")?;
    }
    // Section terminator line.
    writeln!(out)?;

    writeln!(out, "$ROI:")?;
    writeln!(out, "{}", peaks.len())?;
    for &(mu, sigma, _) in peaks {
        let low = (mu - 3.0 * sigma).floor().max(0.0) as usize;
        let high = ((mu + 3.0 * sigma).ceil() as usize).min(counts.len() - 1);
        writeln!(out, "{low} {high}")?;
    }

    writeln!(out, "$PRESETS:")?;
    writeln!(out, "Live Time")?;
    writeln!(out, "{LIVE_TIME}")?;
    writeln!(out, "0")?;
    writeln!(out, "$ENER_FIT:")?;
    writeln!(out, "{OFFSET} {GAIN}")?;
    writeln!(out, "$MCA_CAL:")?;
    writeln!(out, "3")?;
    writeln!(out, "{OFFSET} {GAIN} 0.0")?;
    writeln!(out, "$SHAPE_CAL:")?;
    writeln!(out, "3")?;
    writeln!(out, "1.2 0.002 0.0")?;
    Ok(out)
}

fn main() -> Result<()> {
    env_logger::init();

    let output_path = std::env::args().nth(1).unwrap_or_else(|| "sample.spe".to_string());
    let mut rng = SimpleRng::new(42);

    // (centre channel, sigma, height): 662 keV, 1173 keV, 1332 keV
    let peaks: Vec<(f64, f64, f64)> = [661.7, 1173.2, 1332.5]
        .iter()
        .zip([900.0, 260.0, 230.0])
        .map(|(&kev, height)| {
            let centre = (kev - OFFSET) / GAIN;
            (centre, 2.5 + 0.002 * centre, height)
        })
        .collect();

    let counts = generate_spectrum(&peaks, &mut rng);
    let text = render_spe(&counts, &peaks)?;

    // Parse our own output before writing it.
    let parsed = parser::parse(&text, &output_path).context("generated text does not parse")?;
    std::fs::write(&output_path, &text).with_context(|| format!("writing {output_path}"))?;

    let total = analysis::count_rate(&parsed.spectrum, None)?;
    println!(
        "Wrote {} channels to {output_path} ({:.1} ± {:.1} cps)",
        counts.len(),
        total.rate,
        total.uncertainty
    );
    for result in analysis::roi_analysis(&parsed.spectrum, None, &AnalysisOptions::default()) {
        let r = result?;
        println!("  ROI {}: net {:.0} ± {:.0}", r.roi, r.net, r.net_uncertainty);
    }
    Ok(())
}

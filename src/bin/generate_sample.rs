use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use inkscope::colorimetry::astm::Illuminant;
use inkscope::colorimetry::synthetic::{standard_wavelengths, weighting_rows};
use inkscope::data::model::{SpectralCurve, Tint, WeightingRow};

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
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

/// Paper: high, flat reflectance with a slight blue dip below 420 nm.
fn paper(wavelengths: &[u32]) -> SpectralCurve {
    wavelengths
        .iter()
        .map(|&wl| {
            let lambda = wl as f64;
            let dip = if lambda < 420.0 { (420.0 - lambda) * 0.004 } else { 0.0 };
            (wl, 0.90 - dip)
        })
        .collect()
}

/// Cyan ink film transmittance: absorbs in the red, passes blue-green.
fn cyan_transmittance(lambda: f64, coverage: f64) -> f64 {
    let absorption = gaussian(lambda, 640.0, 60.0, 0.95) + gaussian(lambda, 420.0, 30.0, 0.15);
    1.0 - coverage * absorption.min(0.98)
}

fn weighting_batch(rows: &[WeightingRow]) -> Result<(Arc<Schema>, RecordBatch)> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("illuminant", DataType::Utf8, false),
        Field::new("observer_angle", DataType::Int64, false),
        Field::new("table_number", DataType::Int64, false),
        Field::new("wavelength", DataType::Int64, false),
        Field::new("x_factor", DataType::Float64, false),
        Field::new("y_factor", DataType::Float64, false),
        Field::new("z_factor", DataType::Float64, false),
        Field::new("white_point_x", DataType::Float64, true),
        Field::new("white_point_y", DataType::Float64, true),
        Field::new("white_point_z", DataType::Float64, true),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(
                rows.iter().map(|r| r.illuminant.as_str()).collect::<Vec<_>>(),
            )),
            Arc::new(Int64Array::from(
                rows.iter().map(|r| r.observer_angle as i64).collect::<Vec<_>>(),
            )),
            Arc::new(Int64Array::from(
                rows.iter().map(|r| r.table_number as i64).collect::<Vec<_>>(),
            )),
            Arc::new(Int64Array::from(
                rows.iter().map(|r| r.wavelength as i64).collect::<Vec<_>>(),
            )),
            Arc::new(Float64Array::from(rows.iter().map(|r| r.x_factor).collect::<Vec<_>>())),
            Arc::new(Float64Array::from(rows.iter().map(|r| r.y_factor).collect::<Vec<_>>())),
            Arc::new(Float64Array::from(rows.iter().map(|r| r.z_factor).collect::<Vec<_>>())),
            Arc::new(Float64Array::from(rows.iter().map(|r| r.white_point_x).collect::<Vec<_>>())),
            Arc::new(Float64Array::from(rows.iter().map(|r| r.white_point_y).collect::<Vec<_>>())),
            Arc::new(Float64Array::from(rows.iter().map(|r| r.white_point_z).collect::<Vec<_>>())),
        ],
    )
    .context("Failed to create RecordBatch")?;

    Ok((schema, batch))
}

fn main() -> Result<()> {
    env_logger::init();
    let mut rng = SimpleRng::new(42);
    let wavelengths = standard_wavelengths();

    // Weighting tables: D50 and D65, 2°, table 5
    let rows: Vec<WeightingRow> = [Illuminant::D50, Illuminant::D65]
        .into_iter()
        .flat_map(|ill| weighting_rows(ill, 5, &wavelengths))
        .collect();

    let (schema, batch) = weighting_batch(&rows)?;
    let table_path = "sample_weighting.parquet";
    let file = std::fs::File::create(table_path).context("Failed to create output file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("Failed to create writer")?;
    writer.write(&batch).context("Failed to write batch")?;
    writer.close().context("Failed to close writer")?;

    // Cyan tint ramp on paper, with instrument noise
    let substrate = paper(&wavelengths);
    let tints: Vec<Tint> = [0.0, 10.0, 25.0, 50.0, 75.0, 100.0]
        .into_iter()
        .map(|pct| {
            let coverage = pct / 100.0;
            let curve: SpectralCurve = substrate
                .iter()
                .map(|(wl, r)| {
                    let t = cyan_transmittance(wl as f64, coverage);
                    (wl, (r * t * t + rng.gauss(0.0, 0.002)).max(0.0))
                })
                .collect();
            Tint::new(pct, curve)
        })
        .collect();

    let tints_path = "sample_tints.json";
    std::fs::write(tints_path, serde_json::to_string_pretty(&tints)?)
        .context("Failed to write tints")?;

    println!(
        "Wrote {} weighting rows to {table_path} and {} tints ({} wavelengths each) to {tints_path}",
        rows.len(),
        tints.len(),
        wavelengths.len()
    );
    Ok(())
}

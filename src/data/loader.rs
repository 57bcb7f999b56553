use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use arrow::array::{
    Array, AsArray, Float32Array, Float64Array, Int32Array, Int64Array, UInt32Array, UInt64Array,
};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use log::info;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::cgats::{parse_cgats, CgatsDocument, ColorReference};
use crate::colorimetry::astm::ReferenceData;

use super::model::{SpectralCurve, Tint, WeightingRow};

// ---------------------------------------------------------------------------
// Weighting tables
// ---------------------------------------------------------------------------

/// Load raw weighting-table rows.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – one row per wavelength, columns named after [`WeightingRow`]
/// * `.json`    – `[{ "illuminant": "D50", "observer_angle": 2, ... }, ...]`
/// * `.csv`     – header row with the same column names
pub fn load_weighting_rows(path: &Path) -> Result<Vec<WeightingRow>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let rows = match ext.as_str() {
        "parquet" | "pq" => load_rows_parquet(path),
        "json" => load_json(path),
        "csv" => load_rows_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }?;
    info!("loaded {} weighting rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Load and validate all weighting tables in a file.
pub fn load_reference_data(path: &Path) -> Result<ReferenceData> {
    let rows = load_weighting_rows(path)?;
    let reference = ReferenceData::from_rows(rows)
        .with_context(|| format!("invalid weighting tables in {}", path.display()))?;
    info!("{} weighting tables available", reference.len());
    Ok(reference)
}

fn load_rows_csv(path: &Path) -> Result<Vec<WeightingRow>> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    reader
        .deserialize::<WeightingRow>()
        .enumerate()
        .map(|(row_no, result)| result.with_context(|| format!("CSV row {row_no}")))
        .collect()
}

// ---------------------------------------------------------------------------
// JSON documents
// ---------------------------------------------------------------------------

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    serde_json::from_str(&text).context("parsing JSON")
}

/// Load named spectral curves.
///
/// Accepts either a single curve (`{"400": 0.2, ...}`), named after the file
/// stem, or an object of named curves (`{"Paper": {"400": 0.9, ...}, ...}`).
pub fn load_spectral_curves(path: &Path) -> Result<BTreeMap<String, SpectralCurve>> {
    let root: JsonValue = load_json(path)?;
    let obj = root
        .as_object()
        .context("Expected top-level JSON object")?;

    let is_single_curve = obj.keys().all(|k| k.trim().parse::<u32>().is_ok());
    if is_single_curve {
        let curve: SpectralCurve =
            serde_json::from_value(root.clone()).context("parsing spectral curve")?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("curve")
            .to_string();
        return Ok(BTreeMap::from([(name, curve)]));
    }

    obj.iter()
        .map(|(name, value)| {
            let curve: SpectralCurve = serde_json::from_value(value.clone())
                .with_context(|| format!("'{name}' is not a spectral curve"))?;
            Ok((name.clone(), curve))
        })
        .collect()
}

/// Load a tint ramp: `[{ "percentage": 0, "spectral": {...} }, ...]`.
pub fn load_tints(path: &Path) -> Result<Vec<Tint>> {
    load_json(path)
}

/// Load colours for export: `[{ "name": ..., "measurements": { "M1": {...} } }]`.
pub fn load_color_references(path: &Path) -> Result<Vec<ColorReference>> {
    load_json(path)
}

/// Read and parse a CGATS file.
pub fn load_cgats(path: &Path) -> Result<CgatsDocument> {
    let text = std::fs::read_to_string(path).context("reading CGATS file")?;
    let doc = parse_cgats(&text).with_context(|| format!("parsing {}", path.display()))?;
    info!("read {} samples from {}", doc.samples.len(), path.display());
    Ok(doc)
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load weighting rows from a Parquet file.
///
/// Integer columns may be Int32/Int64/UInt32/UInt64, factor columns Float32 or
/// Float64.  The `white_point_*` columns may be absent or null.
fn load_rows_parquet(path: &Path) -> Result<Vec<WeightingRow>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;

        let illuminant = column(&batch, "illuminant")?;
        let observer = column(&batch, "observer_angle")?;
        let table = column(&batch, "table_number")?;
        let wavelength = column(&batch, "wavelength")?;
        let x = column(&batch, "x_factor")?;
        let y = column(&batch, "y_factor")?;
        let z = column(&batch, "z_factor")?;
        let wp_x = optional_column(&batch, "white_point_x");
        let wp_y = optional_column(&batch, "white_point_y");
        let wp_z = optional_column(&batch, "white_point_z");

        for row in 0..batch.num_rows() {
            let required = |col: &Arc<dyn Array>, name: &str| -> Result<f64> {
                extract_f64(col, row)?.with_context(|| format!("Row {row}: null '{name}'"))
            };
            let optional = |col: Option<&Arc<dyn Array>>| -> Result<Option<f64>> {
                match col {
                    Some(col) => extract_f64(col, row),
                    None => Ok(None),
                }
            };

            rows.push(WeightingRow {
                illuminant: extract_string(illuminant, row)
                    .with_context(|| format!("Row {row}: failed to read 'illuminant'"))?,
                observer_angle: extract_u32(observer, row)
                    .with_context(|| format!("Row {row}: failed to read 'observer_angle'"))?,
                table_number: extract_u32(table, row)
                    .with_context(|| format!("Row {row}: failed to read 'table_number'"))?,
                wavelength: extract_u32(wavelength, row)
                    .with_context(|| format!("Row {row}: failed to read 'wavelength'"))?,
                x_factor: required(x, "x_factor")?,
                y_factor: required(y, "y_factor")?,
                z_factor: required(z, "z_factor")?,
                white_point_x: optional(wp_x)?,
                white_point_y: optional(wp_y)?,
                white_point_z: optional(wp_z)?,
            });
        }
    }

    Ok(rows)
}

// -- Parquet / Arrow helpers --

fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Arc<dyn Array>> {
    let idx = batch
        .schema()
        .index_of(name)
        .map_err(|_| anyhow!("Parquet file missing '{name}' column"))?;
    Ok(batch.column(idx))
}

fn optional_column<'a>(batch: &'a RecordBatch, name: &str) -> Option<&'a Arc<dyn Array>> {
    let idx = batch.schema().index_of(name).ok()?;
    Some(batch.column(idx))
}

fn extract_string(col: &Arc<dyn Array>, row: usize) -> Result<String> {
    if col.is_null(row) {
        bail!("null value in string column");
    }
    match col.data_type() {
        DataType::Utf8 => Ok(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => Ok(col.as_string::<i64>().value(row).to_string()),
        other => bail!("Expected Utf8 column, got {other:?}"),
    }
}

fn extract_u32(col: &Arc<dyn Array>, row: usize) -> Result<u32> {
    if col.is_null(row) {
        bail!("null value in integer column");
    }
    let value: i128 = match col.data_type() {
        DataType::Int32 => col
            .as_any()
            .downcast_ref::<Int32Array>()
            .context("expected Int32Array")?
            .value(row)
            .into(),
        DataType::Int64 => col
            .as_any()
            .downcast_ref::<Int64Array>()
            .context("expected Int64Array")?
            .value(row)
            .into(),
        DataType::UInt32 => col
            .as_any()
            .downcast_ref::<UInt32Array>()
            .context("expected UInt32Array")?
            .value(row)
            .into(),
        DataType::UInt64 => col
            .as_any()
            .downcast_ref::<UInt64Array>()
            .context("expected UInt64Array")?
            .value(row)
            .into(),
        other => bail!("Expected integer column, got {other:?}"),
    };
    u32::try_from(value).map_err(|_| anyhow!("value {value} out of range"))
}

/// `None` for a null cell.
fn extract_f64(col: &Arc<dyn Array>, row: usize) -> Result<Option<f64>> {
    if col.is_null(row) {
        return Ok(None);
    }
    if let Some(arr) = col.as_any().downcast_ref::<Float64Array>() {
        Ok(Some(arr.value(row)))
    } else if let Some(arr) = col.as_any().downcast_ref::<Float32Array>() {
        Ok(Some(arr.value(row) as f64))
    } else {
        bail!("Expected Float64 or Float32 column, got {:?}", col.data_type())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use arrow::array::{Float64Builder, StringArray};
    use arrow::datatypes::{Field, Schema};
    use parquet::arrow::ArrowWriter;
    use pretty_assertions::assert_eq;

    use crate::colorimetry::astm::WeightingKey;

    const CSV_ROWS: &str = "\
illuminant,observer_angle,table_number,wavelength,x_factor,y_factor,z_factor,white_point_x,white_point_y,white_point_z
D50,2,5,400,0.5,0.1,2.0,96.42,100.0,82.52
D50,2,5,410,1.0,0.2,4.0,96.42,100.0,82.52
D65,10,6,400,0.4,0.1,2.1,,,
";

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_csv_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "tables.csv", CSV_ROWS);
        let rows = load_weighting_rows(&path).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].wavelength, 410);
        assert_eq!(rows[0].white_point_y, Some(100.0));
        assert_eq!(rows[2].white_point_x, None);
        assert_eq!(rows[2].observer_angle, 10);

        let reference = load_reference_data(&path).unwrap();
        assert_eq!(reference.len(), 2);
        assert_eq!(reference.table(&WeightingKey::default()).unwrap().len(), 2);
    }

    #[test]
    fn test_load_json_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "tables.json",
            r#"[{"illuminant":"D50","observer_angle":2,"table_number":5,"wavelength":400,
                 "x_factor":0.5,"y_factor":0.1,"z_factor":2.0}]"#,
        );
        let rows = load_weighting_rows(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].white_point(), None);
    }

    #[test]
    fn test_load_parquet_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tables.parquet");

        let schema = Arc::new(Schema::new(vec![
            Field::new("illuminant", DataType::Utf8, false),
            Field::new("observer_angle", DataType::Int32, false),
            Field::new("table_number", DataType::Int64, false),
            Field::new("wavelength", DataType::Int64, false),
            Field::new("x_factor", DataType::Float64, false),
            Field::new("y_factor", DataType::Float64, false),
            Field::new("z_factor", DataType::Float64, false),
            Field::new("white_point_y", DataType::Float64, true),
        ]));
        let mut wp_y = Float64Builder::new();
        wp_y.append_value(100.0);
        wp_y.append_null();
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["D50", "D65"])),
                Arc::new(Int32Array::from(vec![2, 2])),
                Arc::new(Int64Array::from(vec![5, 5])),
                Arc::new(Int64Array::from(vec![400, 400])),
                Arc::new(Float64Array::from(vec![0.5, 0.6])),
                Arc::new(Float64Array::from(vec![0.1, 0.2])),
                Arc::new(Float64Array::from(vec![2.0, 2.1])),
                Arc::new(wp_y.finish()),
            ],
        )
        .unwrap();
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let rows = load_weighting_rows(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].illuminant, "D50");
        assert_eq!(rows[0].table_number, 5);
        assert_eq!(rows[0].white_point_y, Some(100.0));
        assert_eq!(rows[0].white_point_x, None);
        assert_eq!(rows[1].white_point_y, None);
        assert_eq!(rows[1].x_factor, 0.6);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = load_weighting_rows(Path::new("tables.xlsx")).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported file extension: .xlsx");
    }

    #[test]
    fn test_load_single_and_named_curves() {
        let dir = tempfile::tempdir().unwrap();
        let single = write_file(&dir, "paper.json", r#"{"400": 0.8, "410": 0.85}"#);
        let curves = load_spectral_curves(&single).unwrap();
        assert_eq!(curves.len(), 1);
        assert_eq!(curves["paper"].get(410), Some(0.85));

        let named = write_file(
            &dir,
            "set.json",
            r#"{"Paper": {"400": 0.8}, "Kraft": {"400": 0.4}}"#,
        );
        let curves = load_spectral_curves(&named).unwrap();
        assert_eq!(curves.keys().collect::<Vec<_>>(), vec!["Kraft", "Paper"]);
    }

    #[test]
    fn test_load_tints_and_colors() {
        let dir = tempfile::tempdir().unwrap();
        let tints = write_file(
            &dir,
            "tints.json",
            r#"[{"percentage": 0, "spectral": {"400": 0.8}}, {"percentage": 100, "lab": {"L": 55, "a": -37, "b": -50}}]"#,
        );
        let tints = load_tints(&tints).unwrap();
        assert_eq!(tints.len(), 2);
        assert!(tints[0].is_substrate());

        let colors = write_file(
            &dir,
            "colors.json",
            r#"[{"name": "Cyan", "measurements": {"M1": {"lab": {"L": 55, "a": -37, "b": -50}}}}]"#,
        );
        let colors = load_color_references(&colors).unwrap();
        assert_eq!(colors[0].name, "Cyan");
        assert_eq!(colors[0].measurements.len(), 1);
    }
}

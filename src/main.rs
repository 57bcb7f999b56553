use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::warn;

use inkscope::adapt::{adapt_tints, AdaptationMethod};
use inkscope::cgats::build_cgats;
use inkscope::colorimetry::astm::{Illuminant, Observer, ReferenceData, WeightingKey};
use inkscope::config::Settings;
use inkscope::data::loader;
use inkscope::data::model::MeasurementMode;

#[derive(Parser)]
#[command(name = "inkscope")]
#[command(about = "Spectral colorimetry and CGATS exchange for print colour management")]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Weighting-table dataset (.csv, .json or .parquet); overrides the config
    #[arg(short, long, global = true)]
    tables: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert spectral curves (JSON) to Lab, LCh and an sRGB preview
    Lab {
        /// A single curve or an object of named curves
        #[arg(long)]
        curves: PathBuf,

        #[arg(long)]
        illuminant: Option<Illuminant>,

        #[arg(long)]
        observer: Option<Observer>,

        /// ASTM table number (5 or 6)
        #[arg(long)]
        table: Option<u32>,
    },
    /// List the available weighting tables
    Tables,
    /// Parse a CGATS file
    Import {
        file: PathBuf,

        /// Print the parsed samples as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write colours (JSON) as a CGATS file
    Export {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        /// Only export measurements taken in this mode
        #[arg(short, long)]
        mode: Option<MeasurementMode>,

        /// Compute Lab from spectral data where Lab is missing
        #[arg(long)]
        compute_lab: bool,
    },
    /// Adapt a tint ramp (JSON) to another substrate
    Adapt {
        #[arg(long)]
        tints: PathBuf,

        /// Spectral curve of the target substrate
        #[arg(long)]
        target: PathBuf,

        #[arg(long)]
        method: Option<AdaptationMethod>,

        /// Background name for the adapted tints
        #[arg(long, default_value = "Substrate")]
        background: String,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;
    let tables = cli.tables.or_else(|| settings.reference_tables.clone());

    match cli.command {
        Commands::Lab {
            curves,
            illuminant,
            observer,
            table,
        } => {
            let defaults = settings.weighting_key();
            let key = WeightingKey::new(
                illuminant.unwrap_or(defaults.illuminant),
                observer.unwrap_or(defaults.observer),
                table.unwrap_or(defaults.table),
            );
            run_lab(&curves, &key, tables.as_deref())
        }
        Commands::Tables => run_tables(tables.as_deref()),
        Commands::Import { file, json } => run_import(&file, json),
        Commands::Export {
            input,
            output,
            mode,
            compute_lab,
        } => run_export(&settings, &input, &output, mode, compute_lab, tables.as_deref()),
        Commands::Adapt {
            tints,
            target,
            method,
            background,
        } => {
            let mut adaptation = settings.adaptation_settings();
            if let Some(method) = method {
                adaptation.method = method;
            }
            adaptation.target_background = background;
            let reference = reference_data(tables.as_deref())?;

            let tints = loader::load_tints(&tints)?;
            let curves = loader::load_spectral_curves(&target)?;
            if curves.len() > 1 {
                warn!("{} holds {} curves, using the first", target.display(), curves.len());
            }
            let target_curve = curves.values().next();

            let outcome = adapt_tints(&tints, target_curve, &adaptation, &reference);
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(())
        }
    }
}

fn reference_data(tables: Option<&Path>) -> Result<ReferenceData> {
    match tables {
        Some(path) => loader::load_reference_data(path),
        None => {
            warn!("no weighting tables configured, using synthetic Planckian tables");
            Ok(ReferenceData::synthetic())
        }
    }
}

fn run_lab(curves: &Path, key: &WeightingKey, tables: Option<&Path>) -> Result<()> {
    let reference = reference_data(tables)?;
    if reference.table(key).is_none() {
        bail!("no weighting table for {key}");
    }
    let curves = loader::load_spectral_curves(curves)?;

    for (name, curve) in &curves {
        let lab = reference.lab_for(curve, key);
        let lch = lab.to_lch();
        let preview = lab
            .to_srgb_hex(key.illuminant)
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{name}\t{lab}\tC {:.2}  h {:.1}\t{preview}",
            lch.c, lch.h
        );
    }
    Ok(())
}

fn run_tables(tables: Option<&Path>) -> Result<()> {
    let reference = reference_data(tables)?;
    for key in reference.keys() {
        let table = reference.table_or_empty(key);
        let range = match (table.wavelengths().next(), table.wavelengths().last()) {
            (Some(first), Some(last)) => format!("{first}-{last} nm"),
            _ => "empty".to_string(),
        };
        let white = table
            .white_point()
            .map(|w| format!("white {:.3} {:.3} {:.3}", w.x, w.y, w.z))
            .unwrap_or_else(|| "no white point".to_string());
        println!("{key}\t{} rows\t{range}\t{white}", table.len());
    }
    Ok(())
}

fn run_import(file: &Path, json: bool) -> Result<()> {
    let doc = loader::load_cgats(file)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&doc.samples)?);
        return Ok(());
    }

    println!(
        "{}: {} samples, {} fields{}",
        file.display(),
        doc.samples.len(),
        doc.fields.len(),
        doc.mode.map(|m| format!(", {m}")).unwrap_or_default()
    );
    for sample in &doc.samples {
        let lab = sample
            .lab
            .map(|l| l.to_string())
            .unwrap_or_else(|| "no Lab".to_string());
        let spectral = sample
            .spectral
            .as_ref()
            .map(|c| format!("{} wavelengths", c.len()))
            .unwrap_or_else(|| "no spectral".to_string());
        println!("  {}\t{lab}\t{spectral}", sample.name);
    }
    for warning in &doc.warnings {
        eprintln!("warning: {warning}");
    }
    Ok(())
}

fn run_export(
    settings: &Settings,
    input: &Path,
    output: &Path,
    mode: Option<MeasurementMode>,
    compute_lab: bool,
    tables: Option<&Path>,
) -> Result<()> {
    let colors = loader::load_color_references(input)?;
    let options = inkscope::cgats::ExportOptions {
        mode,
        created: Some(chrono::Utc::now()),
        ..settings.export_options()
    };

    let reference = if compute_lab {
        Some(reference_data(tables)?)
    } else {
        None
    };
    let key = settings.weighting_key();
    let table = reference.as_ref().and_then(|r| r.table(&key));
    if compute_lab && table.is_none() {
        bail!("no weighting table for {key}");
    }

    let export = build_cgats(&colors, &options, table);
    if export.exported == 0 {
        for warning in &export.warnings {
            eprintln!("warning: {warning}");
        }
        bail!("nothing to export from {}", input.display());
    }
    std::fs::write(output, &export.content)
        .with_context(|| format!("writing {}", output.display()))?;

    println!(
        "Exported {} colors to {} ({} skipped)",
        export.exported,
        output.display(),
        export.skipped
    );
    for warning in &export.warnings {
        eprintln!("warning: {warning}");
    }
    Ok(())
}

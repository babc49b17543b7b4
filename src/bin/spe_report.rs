use std::fs::File;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use rusty_spe::config::{AnalysisOptions, RoiIndexing};
use rusty_spe::data::analysis::{count_rate, roi_analysis, ChannelRegion};
use rusty_spe::data::model::Roi;
use rusty_spe::data::{export, parser};

/// Print the summary, count rate and ROI net areas of an ORTEC SPE file.
#[derive(Parser, Debug)]
#[command(name = "spe-report", version, about)]
struct Cli {
    /// SPE file to read.
    file: PathBuf,

    /// JSON analysis options, e.g. {"roi_indexing": "absolute"}.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Treat ROI bounds as absolute channel numbers (overrides --config).
    #[arg(long)]
    absolute_roi: bool,

    /// Analyse these regions instead of the file's $ROI list, as LOW:HIGH.
    #[arg(long = "roi", value_parser = parse_roi)]
    rois: Vec<Roi>,

    /// Count rate over LOW:HIGH positions instead of the whole spectrum.
    #[arg(long, value_parser = parse_roi)]
    region: Option<Roi>,

    /// Write channel,counts,rate rows to this CSV file.
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Write ROI results to this CSV file.
    #[arg(long)]
    roi_csv: Option<PathBuf>,

    /// Write the parsed spectrum as JSON to this file.
    #[arg(long)]
    json: Option<PathBuf>,
}

fn parse_roi(s: &str) -> Result<Roi> {
    let Some((low, high)) = s.split_once(':') else {
        bail!("expected LOW:HIGH, got '{s}'");
    };
    let low: usize = low.trim().parse().with_context(|| format!("bad low bound in '{s}'"))?;
    let high: usize = high.trim().parse().with_context(|| format!("bad high bound in '{s}'"))?;
    Ok(Roi::new(low, high))
}

fn main() -> Result<()> {
    // Parser warnings reach the user through `log::warn!` in `load_file`.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let mut options = match &cli.config {
        Some(path) => AnalysisOptions::from_json_file(path)?,
        None => AnalysisOptions::default(),
    };
    if cli.absolute_roi {
        options.roi_indexing = RoiIndexing::Absolute;
    }
    log::debug!("analysis options: {options:?}");

    let parsed = parser::load_file(&cli.file)?;
    let spectrum = &parsed.spectrum;

    print!("{spectrum}");
    println!();

    let region = cli.region.map(|r| ChannelRegion::new(r.low, r.high));
    match count_rate(spectrum, region) {
        Ok(cr) => println!(
            "Count rate: {:.4} ± {:.4} cps ({} counts)",
            cr.rate, cr.uncertainty, cr.gross
        ),
        Err(e) => println!("Count rate: unavailable ({e})"),
    }

    let regions: &[Roi] = if cli.rois.is_empty() {
        spectrum.rois()
    } else {
        &cli.rois
    };
    let results = roi_analysis(spectrum, Some(regions), &options);

    println!("ROI Analysis ({} indexing):", options.roi_indexing);
    if results.is_empty() {
        println!("\tno regions of interest");
    }
    for (roi, result) in regions.iter().zip(&results) {
        println!("\tROI: {} to {}", roi.low, roi.high);
        match result {
            Ok(r) => {
                println!("\tBackground: {:12.2}", r.background);
                println!("\tGross:{:17.2}", r.gross);
                println!("\tAdjusted Gross:{:8.2}", r.adjusted_gross);
                println!("\tNet: {:20.2}", r.net);
                println!("\tNet Error: {:13.2}", r.net_uncertainty);
            }
            Err(e) => println!("\terror: {e}"),
        }
    }

    if let Some(path) = &cli.csv {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        export::write_channels_csv(spectrum, file)?;
        log::info!("wrote channels to {}", path.display());
    }
    if let Some(path) = &cli.roi_csv {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        export::write_roi_csv(regions, &results, file)?;
        log::info!("wrote ROI results to {}", path.display());
    }
    if let Some(path) = &cli.json {
        let json = export::spectrum_to_json(spectrum)?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        log::info!("wrote JSON to {}", path.display());
    }

    Ok(())
}

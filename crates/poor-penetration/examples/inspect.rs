//! Example: poor-penetration inspection of one weld-seam image.
//!
//! Loads a grey image, runs the detector with the selected strategy and
//! prints the reported candidate. Optionally checks the candidate against
//! feature ranges (the defaults, or up to three sets from a JSON file) and a
//! JSON list of line-pair candidates against the line checker thresholds.
//!
//! Results, including overlay primitives, are written to a JSON file next to
//! the input image.
//!
//! Run from the workspace root:
//!   cargo run -p poor-penetration --example inspect -- --help
//!   cargo run -p poor-penetration --example inspect -- --input data/seam.png

use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use image::ImageReader;
use poor_penetration::{
    AnalysisResult, CandidateRangeChecker, CheckOutcome, Detection, DetectorConfig,
    DetectorStrategy, HistogramConfig, Image, LineCandidateChecker, LinePairCandidate,
    OverlayLayer, PixelBox, PoorPenetrationDetector, Primitive, RangeOutcome, TripleOutcome,
    TripleRangeChecker, TripleRangeConfig,
};
use serde::Serialize;

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Strategy {
    Chain,
    Histogram,
}

#[derive(Parser, Debug)]
#[command(about = "Detect poor penetration in a grey weld-seam image")]
struct Args {
    /// Path to the grey image (default: data/seam.png)
    #[arg(long, default_value = "data/seam.png")]
    input: String,

    /// Region of interest as inclusive corners; reported boxes stay in image
    /// coordinates, overlay primitives are relative to the region
    #[arg(long, num_args = 4, value_names = ["X1", "Y1", "X2", "Y2"], allow_negative_numbers = true)]
    roi: Option<Vec<i32>>,

    /// Detection strategy, used when no config file is given
    #[arg(long, value_enum, default_value_t = Strategy::Chain)]
    strategy: Strategy,

    /// JSON file with a tagged detector strategy and its settings
    #[arg(long)]
    config: Option<String>,

    /// Override the lower grey threshold
    #[arg(long)]
    lower: Option<u32>,

    /// Override the upper grey threshold
    #[arg(long)]
    upper: Option<u32>,

    /// Record chain points, edges and boxes as overlay primitives
    #[arg(long)]
    display: bool,

    /// Check the detected candidate against the default feature ranges
    #[arg(long)]
    ranges: bool,

    /// JSON file with up to three range parameter sets to check against
    #[arg(long)]
    range_sets: Option<String>,

    /// JSON file with a list of line-pair candidates to check
    #[arg(long)]
    lines: Option<String>,

    /// Output JSON path (default: <input stem>_pp.json next to input)
    #[arg(long)]
    out: Option<String>,
}

// ── JSON DTOs ─────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct InspectResult {
    /// Wall-clock time of the detection, in milliseconds.
    elapsed_ms: f64,
    strategy: DetectorStrategy,
    detection: Detection,
    #[serde(skip_serializing_if = "Option::is_none")]
    ranges: Option<RangeOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    range_sets: Option<TripleOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    line_check: Option<CheckOutcome>,
    overlay: Vec<Primitive>,
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn load_strategy(args: &Args) -> Result<DetectorStrategy> {
    let mut strategy = match &args.config {
        Some(path) => {
            let file = std::fs::File::open(path).with_context(|| format!("opening {path}"))?;
            serde_json::from_reader(file).with_context(|| format!("parsing {path}"))?
        }
        None => match args.strategy {
            Strategy::Chain => DetectorStrategy::Chain(DetectorConfig::default()),
            Strategy::Histogram => DetectorStrategy::Histogram(HistogramConfig::default()),
        },
    };

    match &mut strategy {
        DetectorStrategy::Chain(cfg) => {
            cfg.scan.lower_threshold = args.lower.unwrap_or(cfg.scan.lower_threshold);
            cfg.scan.upper_threshold = args.upper.unwrap_or(cfg.scan.upper_threshold);
            cfg.display |= args.display;
        }
        DetectorStrategy::Histogram(cfg) => {
            cfg.dips.lower_threshold = args.lower.unwrap_or(cfg.dips.lower_threshold);
            cfg.dips.upper_threshold = args.upper.unwrap_or(cfg.dips.upper_threshold);
            cfg.display |= args.display;
        }
    }
    Ok(strategy)
}

fn load_range_sets(path: &str) -> Result<TripleRangeConfig> {
    let file = std::fs::File::open(path).with_context(|| format!("opening {path}"))?;
    serde_json::from_reader(file).with_context(|| format!("parsing {path}"))
}

fn load_lines(path: &str) -> Result<Vec<LinePairCandidate>> {
    let file = std::fs::File::open(path).with_context(|| format!("opening {path}"))?;
    serde_json::from_reader(file).with_context(|| format!("parsing {path}"))
}

// ── Main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let img_path = &args.input;
    let out_path = args.out.clone().unwrap_or_else(|| {
        let p = std::path::Path::new(img_path);
        let stem = p.file_stem().unwrap_or_default().to_string_lossy();
        let dir = p.parent().unwrap_or(std::path::Path::new("."));
        dir.join(format!("{stem}_pp.json"))
            .to_string_lossy()
            .into_owned()
    });

    // Load as 8-bit grayscale.
    let gray = ImageReader::open(img_path)
        .with_context(|| format!("opening {img_path}"))?
        .decode()
        .with_context(|| format!("decoding {img_path}"))?
        .into_luma8();
    let (width, height) = (gray.width() as usize, gray.height() as usize);
    let img = Image::from_vec(width, height, gray.into_raw()).context("building Image")?;
    println!("loaded {img_path}: {width}x{height}");

    let strategy = load_strategy(&args)?;
    log::debug!("strategy: {strategy:?}");
    let mut detector = PoorPenetrationDetector::new(strategy.clone());
    let mut overlay = OverlayLayer::new();

    let full = img.as_view();
    let (view, (ox, oy)) = match args.roi.as_deref() {
        Some(&[x1, y1, x2, y2]) => full
            .roi(PixelBox::new(x1, y1, x2, y2))
            .context("cutting region of interest")?,
        _ => (full, (0, 0)),
    };
    if (ox, oy) != (0, 0) || view.width() != width || view.height() != height {
        println!("region of interest: {}x{} at ({ox}, {oy})", view.width(), view.height());
    }

    let t0 = Instant::now();
    let mut detection = detector.detect_with_overlay(&view, AnalysisResult::Ok, &mut overlay);
    let elapsed_ms = t0.elapsed().as_secs_f64() * 1e3;

    for c in detection.candidates.iter_mut().filter(|c| c.is_present()) {
        c.candidate.bbox = c.candidate.bbox.translated(ox as i32, oy as i32);
    }

    match detection.best() {
        Some(best) if best.is_present() => {
            let c = &best.candidate;
            println!(
                "candidate: box ({}, {})-({}, {}), width {}, length {}, gradient {}, grey gap {} ({elapsed_ms:.2} ms)",
                c.bbox.x1, c.bbox.y1, c.bbox.x2, c.bbox.y2, c.width, c.length, c.gradient, c.grey_gap
            );
        }
        _ => println!(
            "no candidate, analysis {:?} ({elapsed_ms:.2} ms)",
            detection.analysis
        ),
    }

    let ranges = args.ranges.then(|| {
        let out = CandidateRangeChecker::default().check(&detection.candidates, &mut overlay);
        println!("range check: {} accepted", out.accepted);
        out
    });

    let range_sets = match &args.range_sets {
        Some(path) => {
            let cfg = load_range_sets(path)?;
            let out = TripleRangeChecker::new(cfg).check(&detection.candidates, &mut overlay);
            println!(
                "range sets: code {}, accepting sets {:?}",
                out.code,
                out.accepting_sets()
            );
            Some(out)
        }
        None => None,
    };

    let line_check = match &args.lines {
        Some(path) => {
            let lines = load_lines(path)?;
            let out = LineCandidateChecker::default().check_first(&lines, &mut overlay);
            println!(
                "line check: passed {}, first failure {:?}",
                out.passed, out.failed
            );
            Some(out)
        }
        None => None,
    };

    let result = InspectResult {
        elapsed_ms,
        strategy,
        detection,
        ranges,
        range_sets,
        line_check,
        overlay: overlay.primitives().to_vec(),
    };

    let out_file =
        std::fs::File::create(&out_path).with_context(|| format!("creating {out_path}"))?;
    serde_json::to_writer_pretty(out_file, &result)
        .with_context(|| format!("writing JSON to {out_path}"))?;

    println!("results written to {out_path}");
    Ok(())
}

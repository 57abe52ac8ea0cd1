use pp_core::{Image, PixelBox};
use pp_scan::ScanMode;
use pp_detect::{
    AnalysisResult, DetectorConfig, DetectorStrategy, HistogramConfig, PoorPenetrationDetector,
    RANK_ABSENT, RANK_PRESENT,
};

const STRIPE_WIDTH: i32 = 10;
const STRIPE_LENGTH: i32 = 114;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn stripe_image() -> Image<u8> {
    let mut img = Image::new_fill(240, 200, 200u8);
    img.fill_box(PixelBox::new(100, 45, 100 + STRIPE_WIDTH - 1, 158), 40);
    img
}

/// Bright background with a few noisy dark specks and a short smudge.
fn cluttered_image(seed: u32) -> Image<u8> {
    let mut img = Image::new_fill(200, 160, 190u8);
    let mut s = seed;
    for _ in 0..40 {
        s = s.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        let x = (s >> 8) % 190;
        let y = (s >> 16) % 150;
        let v = (s >> 4) % 120;
        img.fill_box(PixelBox::new(x as i32, y as i32, x as i32 + 2, y as i32 + 3), v as u8);
    }
    img.fill_box(PixelBox::new(60, 30, 66, 70), 30);
    img
}

#[test]
fn flat_image_yields_one_absent_candidate() {
    init_logging();
    let img = Image::new_fill(240, 200, 200u8);
    let mut det = PoorPenetrationDetector::default();
    let d = det.detect(&img.as_view(), AnalysisResult::Ok);

    assert_eq!(d.candidates.len(), 1);
    let c = &d.candidates[0];
    assert_eq!(c.rank, RANK_ABSENT);
    assert_eq!(c.candidate.width, 0);
    assert_eq!(c.candidate.length, 0);
}

#[test]
fn bright_rows_form_no_chain() {
    init_logging();
    let wide_margin = DetectorConfig {
        roi_margin: 25,
        ..DetectorConfig::default()
    };
    let flat = Image::new_fill(240, 200, 200u8);
    let d = PoorPenetrationDetector::new(DetectorStrategy::Chain(wide_margin))
        .detect(&flat.as_view(), AnalysisResult::Ok);
    assert_eq!(d.candidates[0].rank, RANK_ABSENT);

    // A faint line is far too shallow to pass the flat-row test.
    let mut faint = Image::new_fill(240, 200, 200u8);
    faint.fill_box(PixelBox::new(120, 0, 120, 199), 195);
    let d = PoorPenetrationDetector::default().detect(&faint.as_view(), AnalysisResult::Ok);
    assert_eq!(d.candidates.len(), 1);
    assert_eq!(d.candidates[0].rank, RANK_ABSENT);
    assert_eq!(d.candidates[0].candidate.length, 0);
}

#[test]
fn simple_mode_still_follows_dark_stripe() {
    init_logging();
    let mut cfg = DetectorConfig::default();
    cfg.scan.mode = ScanMode::Simple;
    let d = PoorPenetrationDetector::new(DetectorStrategy::Chain(cfg))
        .detect(&stripe_image().as_view(), AnalysisResult::Ok);
    let c = d.best().expect("one candidate");
    assert_eq!(c.rank, RANK_PRESENT);
    assert!(c.candidate.bbox.contains_x(105));
}

#[test]
fn wide_interruption_splits_the_seam() {
    init_logging();
    // Scan rows 105, 115 and 125 see only background.
    let mut img = Image::new_fill(240, 200, 200u8);
    img.fill_box(PixelBox::new(100, 45, 109, 98), 40);
    img.fill_box(PixelBox::new(100, 135, 109, 188), 40);

    let d = PoorPenetrationDetector::default().detect(&img.as_view(), AnalysisResult::Ok);
    let c = d.best().expect("one candidate");
    assert_eq!(c.rank, RANK_PRESENT);
    let b = c.candidate.bbox;
    assert!(c.candidate.length < 70, "length {}", c.candidate.length);
    assert!(b.y2 < 115 || b.y1 > 115, "box {b:?} spans the interruption");
}

#[test]
fn dark_stripe_is_found() {
    init_logging();
    let img = stripe_image();
    let mut det = PoorPenetrationDetector::default();
    let d = det.detect(&img.as_view(), AnalysisResult::Ok);

    assert_eq!(d.analysis, AnalysisResult::Ok);
    assert_eq!(d.candidates.len(), 1);
    let best = d.best().expect("one candidate");
    assert_eq!(best.rank, RANK_PRESENT);

    let c = &best.candidate;
    let stride = DetectorConfig::default().chain.row_stride;
    assert!((c.width - STRIPE_WIDTH).abs() <= 2, "width {}", c.width);
    assert!(
        (c.length - STRIPE_LENGTH).abs() <= stride,
        "length {}",
        c.length
    );
    assert!(c.bbox.contains_x(105));
    assert!(c.grey_gap < 100, "gap grey {}", c.grey_gap);
    assert!(c.grey_outside > c.grey_inside);
    assert!(c.gradient > 0);
}

#[test]
fn repeated_detection_is_identical() {
    init_logging();
    let stripe = stripe_image();
    let flat = Image::new_fill(240, 200, 200u8);
    let mut det = PoorPenetrationDetector::default();

    let first = det.detect(&stripe.as_view(), AnalysisResult::Ok);
    let _ = det.detect(&flat.as_view(), AnalysisResult::Ok);
    let again = det.detect(&stripe.as_view(), AnalysisResult::Ok);
    assert_eq!(first, again);

    let fresh = PoorPenetrationDetector::default().detect(&stripe.as_view(), AnalysisResult::Ok);
    assert_eq!(first, fresh);
}

#[test]
fn rank_is_always_binary() {
    init_logging();
    let strategies = [
        DetectorStrategy::Chain(DetectorConfig::default()),
        DetectorStrategy::Histogram(HistogramConfig::default()),
    ];
    for strategy in strategies {
        let mut det = PoorPenetrationDetector::new(strategy);
        for seed in 0..12 {
            let img = cluttered_image(seed);
            let d = det.detect(&img.as_view(), AnalysisResult::Ok);
            assert_eq!(d.candidates.len(), 1);
            let rank = d.candidates[0].rank;
            assert!(rank == RANK_ABSENT || rank == RANK_PRESENT, "rank {rank}");
        }
    }
}

#[test]
fn tiny_image_does_not_escape() {
    init_logging();
    let img = Image::new_fill(8, 6, 30u8);
    for strategy in [
        DetectorStrategy::Chain(DetectorConfig::default()),
        DetectorStrategy::Histogram(HistogramConfig::default()),
    ] {
        let d = PoorPenetrationDetector::new(strategy).detect(&img.as_view(), AnalysisResult::Ok);
        assert_eq!(d.candidates.len(), 1);
        assert_eq!(d.candidates[0].rank, RANK_ABSENT);
    }
}

#[test]
fn histogram_strategy_measures_stripe() {
    init_logging();
    let img = stripe_image();
    let mut det =
        PoorPenetrationDetector::new(DetectorStrategy::Histogram(HistogramConfig::default()));
    let d = det.detect(&img.as_view(), AnalysisResult::Ok);

    assert_eq!(d.edge_jitter, None);
    let c = d.best().expect("one candidate");
    assert_eq!(c.rank, RANK_PRESENT);
    assert!((c.candidate.width - STRIPE_WIDTH).abs() <= 2);
    assert!(c.candidate.bbox.contains_x(105));
}

#[test]
fn histogram_strategy_ignores_flat_image() {
    init_logging();
    let img = Image::new_fill(240, 200, 200u8);
    let mut det =
        PoorPenetrationDetector::new(DetectorStrategy::Histogram(HistogramConfig::default()));
    let d = det.detect(&img.as_view(), AnalysisResult::Ok);

    assert_eq!(d.candidates.len(), 1);
    assert_eq!(d.candidates[0].rank, RANK_ABSENT);
    assert_eq!(d.analysis, AnalysisResult::NotPresent);
}

#[test]
fn detection_serializes_to_json() {
    let img = stripe_image();
    let d = PoorPenetrationDetector::default().detect(&img.as_view(), AnalysisResult::Ok);
    let json = serde_json::to_value(&d).expect("serializable");
    assert_eq!(json["analysis"], "ok");
    assert_eq!(json["candidates"][0]["rank"], 255);
}

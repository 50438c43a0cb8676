//! End-to-end fits against a synthetic reference rendered from known parameters.

use catheter_recon::config::{FitConfig, ModelConfig};
use catheter_recon::core::bezier::CurveParameters;
use catheter_recon::io::save_binary_mask;
use catheter_recon::optim::trainer::{fit, fit_from_files, Outcome};
use catheter_recon::render::render_silhouette;

const GROUND_TRUTH: [f64; 6] = [0.02003904, 0.0016096, 0.13205799, 0.00489567, -0.03695673, 0.196168896];

fn canonical_config() -> FitConfig {
    FitConfig {
        ground_truth: Some(CurveParameters(GROUND_TRUTH)),
        ..Default::default()
    }
}

#[test]
fn test_short_fit_reduces_loss_and_end_error() {
    let mut config = canonical_config();
    config.model.num_samples = 41;
    config.model.angular_resolution = 12;
    config.optimizer.max_iterations = 30;
    config.threads = 2;

    let gt = CurveParameters(GROUND_TRUTH);
    let mask = render_silhouette(&config.start, &gt, &ModelConfig::default(), &config.camera);
    let report = fit(&mask, &config).unwrap();

    assert_eq!(report.history.len(), 30);
    let first = report.history.first().unwrap();
    assert!(
        report.final_loss.total < first.total,
        "loss did not decrease: {} -> {}",
        first.total,
        report.final_loss.total
    );

    let initial_distance = first.end_effector_distance.unwrap();
    let final_distance = (report.control_points.end - gt.end()).norm();
    assert!(
        final_distance < initial_distance,
        "end point moved away: {initial_distance} -> {final_distance}"
    );
    assert!(report.history.records.iter().all(|r| r.mid_control_distance.is_some()));
}

#[test]
fn test_fit_from_files_reads_mask_and_config() {
    let dir = tempfile::tempdir().unwrap();
    let mask_path = dir.path().join("reference.png");
    let config_path = dir.path().join("fit.json");

    let mut config = canonical_config();
    config.model.num_samples = 21;
    config.model.angular_resolution = 6;
    config.optimizer.max_iterations = 3;

    let mask = render_silhouette(&config.start, &CurveParameters(GROUND_TRUTH), &ModelConfig::default(), &config.camera);
    save_binary_mask(&mask, &mask_path).unwrap();
    std::fs::write(&config_path, config.to_json().unwrap()).unwrap();

    let report = fit_from_files(&mask_path, Some(&config_path)).unwrap();
    assert_eq!(report.history.len(), 3);
    assert_eq!(report.outcome, Outcome::MaxIterationsReached);
    assert!(report.final_loss.total.is_finite());

    let json = report.to_json().unwrap();
    assert!(json.contains("\"history\""));
}

#[test]
fn test_missing_mask_file_reports_path() {
    let err = fit_from_files(std::path::Path::new("/nonexistent/reference.png"), None).unwrap_err();
    assert!(format!("{err:#}").contains("reference.png"));
}

// E2E test (takes a while in debug builds) - use cargo test -- --ignored
#[test]
#[ignore]
fn test_full_canonical_fit_improves_end_effector() {
    let config = canonical_config();
    let gt = CurveParameters(GROUND_TRUTH);
    let mask = render_silhouette(&config.start, &gt, &config.model, &config.camera);
    let report = fit(&mask, &config).unwrap();

    let initial_distance = report.history.first().unwrap().end_effector_distance.unwrap();
    let final_distance = (report.control_points.end - gt.end()).norm();
    println!(
        "outcome {:?}, {} iterations, end distance {initial_distance:.5} -> {final_distance:.5}",
        report.outcome,
        report.history.len()
    );
    assert!(final_distance < initial_distance);
}

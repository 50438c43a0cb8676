//! catheter-fit: Fit the Bezier catheter model to a binary reference mask
//!
//! Usage:
//!   catheter-fit --mask reference.png [--config fit.json] [--out-dir runs/x] [--overlay]
//!   catheter-fit --synthesize reference.png [--config fit.json]

use anyhow::{bail, Context};
use catheter_recon::core::ExecutionContext;
use catheter_recon::diff::GraphInputs;
use catheter_recon::io::{load_binary_mask, save_binary_mask};
use catheter_recon::reference::extract_features;
use catheter_recon::render::{render_overlay, render_silhouette};
use catheter_recon::{optim, FitConfig};
use std::path::PathBuf;

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  catheter-fit --mask <png> [--config <json>] [--out-dir <dir>] [--iters N] [--lr LR] [--threads N] [--overlay]");
    eprintln!("  catheter-fit --synthesize <png> [--config <json>]   (renders the config's ground_truth curve)");
    eprintln!();
    eprintln!("  Log level is taken from RUST_LOG (default: info).");
}

fn next_value(args: &mut impl Iterator<Item = String>, flag: &str) -> anyhow::Result<String> {
    args.next().with_context(|| format!("Missing value for {flag}"))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let mut mask_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;
    let mut synthesize: Option<PathBuf> = None;
    let mut out_dir = PathBuf::from("fit_output");
    let mut iters: Option<usize> = None;
    let mut lr: Option<f64> = None;
    let mut threads: Option<usize> = None;
    let mut overlay = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--mask" => mask_path = Some(next_value(&mut args, "--mask")?.into()),
            "--config" => config_path = Some(next_value(&mut args, "--config")?.into()),
            "--synthesize" => synthesize = Some(next_value(&mut args, "--synthesize")?.into()),
            "--out-dir" => out_dir = next_value(&mut args, "--out-dir")?.into(),
            "--iters" => iters = Some(next_value(&mut args, "--iters")?.parse().context("Invalid --iters")?),
            "--lr" => lr = Some(next_value(&mut args, "--lr")?.parse().context("Invalid --lr")?),
            "--threads" => threads = Some(next_value(&mut args, "--threads")?.parse().context("Invalid --threads")?),
            "--overlay" => overlay = true,
            "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            other => {
                print_usage();
                bail!("Unknown arg: {other}");
            }
        }
    }

    let mut config = match &config_path {
        Some(path) => FitConfig::from_json_file(path)
            .with_context(|| format!("Failed to load fit config {}", path.display()))?,
        None => FitConfig::default(),
    };
    if let Some(iters) = iters {
        config.optimizer.max_iterations = iters;
    }
    if let Some(lr) = lr {
        config.optimizer.learning_rate = lr;
    }
    if let Some(threads) = threads {
        config.threads = threads;
    }
    config.validate()?;

    if let Some(path) = synthesize {
        let gt = config
            .ground_truth
            .context("--synthesize needs ground_truth in the config")?;
        let mask = render_silhouette(&config.start, &gt, &config.model, &config.camera);
        save_binary_mask(&mask, &path)?;
        eprintln!("Saved `{}`", path.display());
        return Ok(());
    }

    let Some(mask_path) = mask_path else {
        print_usage();
        bail!("Missing --mask <png>");
    };

    let mask = load_binary_mask(&mask_path)
        .with_context(|| format!("Failed to load reference mask {}", mask_path.display()))?;
    let ctx = ExecutionContext::new(config.threads)?;
    let reference = extract_features(&mask, &config.extractor)?;
    let report = optim::fit_with_reference(&ctx, &reference, &config)?;

    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;

    let report_path = out_dir.join("report.json");
    std::fs::write(&report_path, report.to_json()?)
        .with_context(|| format!("Failed to write {}", report_path.display()))?;
    eprintln!("Saved `{}`", report_path.display());

    if overlay {
        let inputs = GraphInputs {
            start: &config.start,
            model: &config.model,
            camera: &config.camera,
            reference: &reference,
            weights: config.weights,
        };
        let initial_path = out_dir.join("overlay_initial.png");
        let final_path = out_dir.join("overlay_final.png");
        render_overlay(&ctx, &mask, &inputs, &config.initial).save(&initial_path)?;
        render_overlay(&ctx, &mask, &inputs, &report.params).save(&final_path)?;
        eprintln!("Saved `{}`", initial_path.display());
        eprintln!("Saved `{}`", final_path.display());
    }

    let p = report.params.0;
    eprintln!(
        "{:?} after {} iterations: loss {:.3} (contour {:.3}, tip {:.3})",
        report.outcome,
        report.history.len(),
        report.final_loss.total,
        report.final_loss.contour,
        report.final_loss.tip
    );
    eprintln!(
        "params: [{:.6}, {:.6}, {:.6}, {:.6}, {:.6}, {:.6}]",
        p[0], p[1], p[2], p[3], p[4], p[5]
    );
    Ok(())
}

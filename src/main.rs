use palm_trace::config::{load_config, RuntimeConfig};
use palm_trace::diagnostics::PalmReport;
use palm_trace::image::io::{load_probability_map, load_rgb_image, save_rgb_image, write_json_file};
use palm_trace::render::render_overlay;
use palm_trace::{InferenceService, PalmPipeline, StaticProbabilityMap};
use std::env;
use std::path::Path;
use std::sync::Arc;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn usage(program: &str) -> String {
    format!("Usage: {program} <config.json>")
}

fn run() -> Result<(), String> {
    let mut args = env::args();
    let program = args.next().unwrap_or_else(|| "palm-trace".to_string());
    let config_path = args.next().ok_or_else(|| usage(&program))?;
    let config = load_config(Path::new(&config_path)).map_err(|e| e.to_string())?;

    let image = load_rgb_image(&config.input_path).map_err(|e| e.to_string())?;
    let map = load_probability_map(&config.probability_map_path).map_err(|e| e.to_string())?;

    let mut service = InferenceService::new(Arc::new(StaticProbabilityMap::new(map)));
    if let Some(timeout) = config.inference_timeout() {
        service = service.with_timeout(timeout);
    }
    let pipeline = PalmPipeline::new(config.pipeline.clone(), Arc::new(service));
    let report = pipeline
        .process_with_diagnostics(&image, config.pad_ratio)
        .map_err(|e| e.to_string())?;

    print_text_summary(&report);
    write_outputs(&config, &image, &report).map_err(|e| e.to_string())
}

fn print_text_summary(report: &PalmReport) {
    let res = &report.result;
    println!("Palm line summary");
    println!("  status: {}", res.status.as_str());
    println!("  pad_ratio: {:.2}", res.pad_ratio);
    println!("  latency_ms: {:.3}", res.latency_ms);
    if let (Some(lines), Some(conf)) = (&res.lines, &res.confidences) {
        for ((name, rec), (_, c)) in lines.iter().zip(conf.iter()) {
            let length = rec.summary.summary().map_or(0.0, |s| s.length);
            println!(
                "  {name}: points={} length={:.4} confidence={:.2}",
                rec.points.len(),
                length,
                c
            );
        }
    }
    println!("  attempts:");
    for attempt in &report.trace.attempts {
        println!(
            "    pad={:.2} ({} px) status={} adopted={}",
            attempt.pad_ratio,
            attempt.pad_px,
            attempt.status.as_str(),
            attempt.adopted
        );
    }
    println!("  timings:");
    for stage in &report.trace.timings.stages {
        println!("    {:<22} {:>8.3} ms", stage.label, stage.elapsed_ms);
    }
}

fn write_outputs(
    config: &RuntimeConfig,
    image: &image::RgbImage,
    report: &PalmReport,
) -> palm_trace::Result<()> {
    if let Some(path) = &config.output.json_out {
        write_json_file(path, report)?;
        println!("JSON report written to {}", path.display());
    }
    if let Some(path) = &config.output.digest_out {
        write_json_file(path, &report.result.digest())?;
        println!("Digest written to {}", path.display());
    }
    if let Some(path) = &config.output.overlay_out {
        save_rgb_image(&render_overlay(image, &report.result), path)?;
        println!("Overlay written to {}", path.display());
    }
    Ok(())
}

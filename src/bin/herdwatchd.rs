//! herdwatchd - live cattle spotting daemon
//!
//! This daemon:
//! 1. Loads the object detector and the breed classifier (primary, else fallback)
//! 2. Pulls frames from the configured source
//! 3. Runs the detection loop until Ctrl-C, `--ticks`, or the source runs dry
//! 4. Prints the breed leaderboard on exit

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use herdwatch::ui::{render_capture, render_leaderboard, ConsoleObserver, Ui};
use herdwatch::{
    open_source, ClassificationPipeline, Classifier, CropResizeRasterizer, DetectionLoop,
    FanoutObserver, HerdwatchConfig, LabelMapper, LogObserver, LogSink, ObjectDetector,
    SessionObserver, SessionState, StubClassifier, StubDetector, SystemClock,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Config file (JSON, or TOML with a .toml extension).
    #[arg(long, env = "HERDWATCH_CONFIG")]
    config: Option<PathBuf>,
    /// Stop after this many ticks.
    #[arg(long)]
    ticks: Option<u64>,
    /// Seed for the stub detector.
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Probability that a stub frame contains objects.
    #[arg(long, default_value_t = 0.4)]
    presence: f64,
    /// Print each capture to stderr as it completes.
    #[arg(long)]
    history: bool,
    /// Write the most recent capture still to this JPEG file on exit.
    #[arg(long)]
    save_latest: Option<PathBuf>,
    /// Output style: auto, plain or pretty.
    #[arg(long)]
    ui: Option<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let cfg = HerdwatchConfig::load_from(args.config.as_deref())?;
    let ui = Ui::from_args(args.ui.as_deref(), std::io::stderr().is_terminal());

    let mut observer = FanoutObserver::new().with(Box::new(LogObserver));
    if args.history {
        observer = observer.with(Box::new(ConsoleObserver));
    }

    let detector = {
        let _stage = ui.stage("load object detection");
        let mut detector = StubDetector::new(args.seed).with_presence(args.presence);
        detector.warm_up()?;
        observer.on_status("object detection loaded");
        detector
    };

    let mut pipeline = ClassificationPipeline::new(
        LabelMapper::new(cfg.catalog.clone()),
        Box::new(CropResizeRasterizer::new()),
    )
    .with_still_size(cfg.capture.target_size);
    {
        let mut stage = ui.stage("load breed classifier");
        let size = cfg.capture.target_size;
        match load_primary(&cfg).and_then(|c| warmed(c, size)) {
            Ok(classifier) => {
                observer.on_status(&format!("classifier ready ({})", classifier.name()));
                pipeline.set_primary(classifier);
            }
            Err(e) => {
                log::warn!("primary classifier load failed: {:#}; trying fallback", e);
                match load_fallback(&cfg).and_then(|c| warmed(c, size)) {
                    Ok(classifier) => {
                        observer.on_status(&format!("fallback ready ({})", classifier.name()));
                        pipeline.set_fallback(classifier);
                    }
                    Err(e) => {
                        stage.fail("no classifier available");
                        log::warn!("fallback classifier load failed: {:#}", e);
                        observer.on_status("no classifier available; captures stay unclassified");
                    }
                }
            }
        }
    }

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || stop.store(true, Ordering::SeqCst))
            .context("failed to install Ctrl-C handler")?;
    }

    let mut source = open_source(&cfg.source.url, cfg.source.width, cfg.source.height)?;
    let session = SessionState::new(cfg.capture.cooldown, cfg.capture.buffer_capacity);
    let mut detection_loop = DetectionLoop::new(
        Box::new(detector),
        pipeline,
        Box::new(SystemClock),
        session,
    )
    .with_settings(cfg.detection.loop_settings())
    .with_annotations(Box::new(LogSink))
    .with_observer(Box::new(observer));

    log::info!(
        "herdwatchd running: source={} target={} min_score={} cooldown={}ms",
        cfg.source.url,
        cfg.detection.target_class,
        cfg.detection.min_score,
        cfg.capture.cooldown.as_millis()
    );

    let summary = detection_loop.run(
        source.as_mut(),
        &stop,
        cfg.source.frame_interval(),
        args.ticks,
    )?;

    let session = detection_loop.session();
    log::info!(
        "stopped after {} ticks: {} captures, {} faults",
        summary.ticks,
        summary.captures,
        summary.faults
    );
    println!("Cows detected: {}", session.captures_attempted);
    println!("{}", render_leaderboard(&session.leaderboard.ranked_view()));

    if let Some(path) = &args.save_latest {
        match session.captures.latest() {
            Some(record) => {
                let jpeg = record.image.to_jpeg(85)?;
                std::fs::write(path, jpeg)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                log::info!("saved {} to {}", render_capture(record), path.display());
            }
            None => log::warn!("no capture to save"),
        }
    }
    Ok(())
}

fn warmed(mut classifier: Box<dyn Classifier>, size: u32) -> Result<Box<dyn Classifier>> {
    classifier
        .warm_up(size)
        .with_context(|| format!("{} warm-up failed", classifier.name()))?;
    Ok(classifier)
}

#[cfg(feature = "backend-tract")]
fn load_primary(cfg: &HerdwatchConfig) -> Result<Box<dyn Classifier>> {
    match cfg.classifier.primary() {
        Some((model, labels)) => Ok(Box::new(herdwatch::TractClassifier::new(
            "primary",
            model,
            labels,
            cfg.capture.target_size,
        )?)),
        None => Ok(Box::new(StubClassifier::new("stub"))),
    }
}

#[cfg(not(feature = "backend-tract"))]
fn load_primary(cfg: &HerdwatchConfig) -> Result<Box<dyn Classifier>> {
    match cfg.classifier.primary() {
        Some((model, _)) => Err(anyhow!(
            "model {} configured but herdwatchd was built without the backend-tract feature",
            model.display()
        )),
        None => Ok(Box::new(StubClassifier::new("stub"))),
    }
}

#[cfg(feature = "backend-tract")]
fn load_fallback(cfg: &HerdwatchConfig) -> Result<Box<dyn Classifier>> {
    let (model, labels) = cfg
        .classifier
        .fallback()
        .ok_or_else(|| anyhow!("no fallback classifier configured"))?;
    Ok(Box::new(herdwatch::TractClassifier::new(
        "fallback",
        model,
        labels,
        cfg.capture.target_size,
    )?))
}

#[cfg(not(feature = "backend-tract"))]
fn load_fallback(cfg: &HerdwatchConfig) -> Result<Box<dyn Classifier>> {
    match cfg.classifier.fallback() {
        Some((model, _)) => Err(anyhow!(
            "model {} configured but herdwatchd was built without the backend-tract feature",
            model.display()
        )),
        None => Err(anyhow!("no fallback classifier configured")),
    }
}

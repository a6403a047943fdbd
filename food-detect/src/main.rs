use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use food_detect::{
    load_class_mapping, router, Args, ClassMapping, Command, Detector, DetectorConfig,
    FoodPipeline, YoloDetector,
};
use food_detect::helpers::save_annotated;
use food_detect::pipeline::decode_image;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,ort=warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let pipeline = Arc::new(load_pipeline(&args));

    match args.command.clone().unwrap_or(Command::Serve) {
        Command::Serve => serve(&args, pipeline).await,
        Command::Detect { source, conf, output } => {
            detect_file(&pipeline, &source, conf, output.as_deref())
        }
    }
}

/// Load model and class mapping. Either may fail; the service then runs
/// degraded instead of exiting.
fn load_pipeline(args: &Args) -> FoodPipeline {
    let config = DetectorConfig {
        imgsz: args.imgsz,
        iou: args.iou,
        cuda: args.cuda,
        ..DetectorConfig::default()
    };
    let detector: Option<Box<dyn Detector>> = match YoloDetector::load(&args.model, &config) {
        Ok(model) => {
            info!("✓ Model loaded: {}", args.model);
            Some(Box::new(model))
        }
        Err(e) => {
            error!("Failed to load model: {}", e);
            None
        }
    };

    let mapping = match load_class_mapping(&args.class_mapping) {
        Ok(mapping) => {
            info!("✓ Class mapping loaded: {} classes", mapping.len());
            mapping
        }
        Err(e) => {
            error!("Failed to load class mapping: {}", e);
            ClassMapping::default()
        }
    };

    let pipeline = FoodPipeline::new(detector, mapping, args.model.clone());
    let problems = pipeline.check_consistency();
    if problems > 0 {
        warn!("{} class mapping / nutrition table mismatches", problems);
    }
    pipeline
}

async fn serve(args: &Args, pipeline: Arc<FoodPipeline>) -> Result<()> {
    let app = router(pipeline);

    let addr = format!("{}:{}", args.host, args.port);
    info!("{}", "=".repeat(60));
    info!("Food Detection API listening on http://{}", addr);
    info!("  GET  /            - Service metadata");
    info!("  GET  /health      - Health check");
    info!("  GET  /model_info  - Loaded classes");
    info!("  POST /predict     - Detect food (multipart field `file`)");
    info!("{}", "=".repeat(60));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn detect_file(pipeline: &FoodPipeline, source: &str, conf: f32, output: Option<&str>) -> Result<()> {
    let bytes = std::fs::read(source).with_context(|| format!("failed to read {}", source))?;
    let filename = std::path::Path::new(source)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());
    let response = pipeline.predict(&bytes, filename, conf)?;
    println!("{}", serde_json::to_string_pretty(&response)?);

    if let Some(output) = output {
        let image = decode_image(&bytes)?;
        save_annotated(&image, &response.detections, output)?;
        info!("Annotated image written to {}", output);
    }
    Ok(())
}

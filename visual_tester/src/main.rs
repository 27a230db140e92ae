use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use blob_tracker::{
    BlobRenderer, BlobTracker, ColorCategory, DisplayOptions, FrameReport, ImageRenderer,
    ParallelTracker, TrackerConfig,
};
use clap::Parser;
use flexi_logger::Logger;
use image::RgbImage;
use log::{info, warn};

const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "tif"];

/// Runs the blob tracker over still images and writes annotated copies.
#[derive(Parser, Debug)]
#[command(name = "visual_tester", version, about)]
struct Args {
    /// Tracker configuration (JSON). Without one only the background is known.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// An image, or a directory of images processed on the worker pool.
    #[arg(short, long)]
    input: PathBuf,

    /// Directory for annotated images and reports.
    #[arg(short, long, default_value = "output")]
    output: PathBuf,

    /// Prune blobs smaller than this many pixels. Overrides the config.
    #[arg(long)]
    min_area: Option<f64>,

    /// Draw only the largest blob of each category.
    #[arg(long)]
    largest: bool,

    #[arg(long)]
    bounding_box: bool,

    #[arg(long)]
    cross_hairs: bool,

    /// Paint every pixel in its category color instead of drawing on the image.
    #[arg(long)]
    categories: bool,

    /// Also write a JSON report per image.
    #[arg(long)]
    json: bool,

    /// Worker count for directory input. 0 means one per CPU.
    #[arg(long, default_value_t = 0)]
    workers: usize,

    /// Used when RUST_LOG is not set.
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn display_options(&self) -> DisplayOptions {
        DisplayOptions {
            show_bounding_box: self.bounding_box,
            show_cross_hairs: self.cross_hairs,
            ..DisplayOptions::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _logger = Logger::try_with_env_or_str(&args.log_level)
        .context("invalid log specification")?
        .start()
        .context("failed to start logger")?;

    // --- 1. Configuration ---
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => {
            warn!("no --config given, only the background category is defined");
            TrackerConfig::default()
        }
    };
    if args.min_area.is_some() {
        config.min_blob_area = args.min_area;
    }
    info!(
        "tracking {} categories in {:?} space",
        config.categories.len().saturating_sub(1),
        config.color_space
    );

    let output = &args.output;
    fs::create_dir_all(output)
        .with_context(|| format!("failed to create output directory {}", output.display()))?;

    // --- 2. Single image or directory ---
    if args.input.is_dir() {
        process_directory(&args, config).await
    } else {
        process_image(&args, config)
    }
}

/// Full rendering of one image on the calling thread.
fn process_image(args: &Args, config: TrackerConfig) -> Result<()> {
    let image = load_image(&args.input)?;
    let mut tracker = BlobTracker::new(config).context("invalid tracker configuration")?;
    let report = tracker
        .process_frame(&image)
        .with_context(|| format!("blob search failed on {}", args.input.display()))?;
    log_report(&args.input, &report);

    let engine = tracker.engine();
    let options = args.display_options();
    let mut canvas = image.clone();
    let mut renderer = ImageRenderer::new(&mut canvas);
    if args.categories {
        engine.display_categories(&mut renderer);
    }
    if args.largest {
        engine.display_largest_blobs(&mut renderer, &options);
    } else {
        engine.display_blobs(&mut renderer, &options);
    }

    write_outputs(args, &args.input, &canvas, &report)
}

/// Every image of a directory through the worker pool, annotated with the
/// largest blob of each category.
async fn process_directory(args: &Args, config: TrackerConfig) -> Result<()> {
    let paths = image_paths(&args.input)?;
    if paths.is_empty() {
        bail!("no images found in {}", args.input.display());
    }

    let categories = config.categories.clone();
    let tracker = ParallelTracker::new(config, args.workers);
    let tracker = tracker.context("invalid tracker configuration")?;
    let workers = tracker.worker_count();
    info!("processing {} images on {workers} workers", paths.len());

    let mut images = Vec::with_capacity(paths.len());
    for path in &paths {
        images.push(load_image(path)?);
    }
    let reports = tracker.process_batch(images).await;

    let options = DisplayOptions {
        show_bounding_box: true,
        show_cross_hairs: true,
        ..args.display_options()
    };
    // The batch owns the decoded frames; reload each one to draw on.
    for (path, report) in paths.iter().zip(reports) {
        let report = match report {
            Ok(report) => report,
            Err(err) => {
                warn!("{}: {err}", path.display());
                continue;
            }
        };
        log_report(path, &report);
        let canvas = annotated_copy(path, &report, &categories, &options)?;
        write_outputs(args, path, &canvas, &report)?;
    }

    tracker.join().await;
    Ok(())
}

/// Reloads `path` and draws the report's largest blobs on it.
fn annotated_copy(
    path: &Path,
    report: &FrameReport,
    categories: &[ColorCategory],
    options: &DisplayOptions,
) -> Result<RgbImage> {
    let mut canvas = load_image(path)?;
    let mut renderer = ImageRenderer::new(&mut canvas);
    annotate_largest(&mut renderer, report, categories, options);
    Ok(canvas)
}

/// Draws the bounding box and cross hairs of each reported largest blob.
fn annotate_largest(
    renderer: &mut impl BlobRenderer,
    report: &FrameReport,
    categories: &[ColorCategory],
    options: &DisplayOptions,
) {
    for summary in report.largest.iter().flatten() {
        let Some(category) = categories.get(summary.category as usize) else {
            continue;
        };
        let color = category.display_color.to_rgb();
        let bounds = summary.bounding_box;
        if options.show_bounding_box {
            renderer.rectangle(
                bounds.x as i32,
                bounds.y as i32,
                bounds.width as i32,
                bounds.height as i32,
                color,
                options.thickness,
            );
        }
        if options.show_cross_hairs {
            renderer.cross_hairs(
                summary.centroid.0.round() as i32,
                summary.centroid.1.round() as i32,
                bounds.width.min(bounds.height) as i32,
                options.cross_hair_color,
                true,
                options.thickness,
            );
        }
    }
}

fn log_report(path: &Path, report: &FrameReport) {
    info!(
        "{}: {} blobs, {} pruned, {:.2} ms",
        path.display(),
        report.blob_count,
        report.removed_small,
        report.elapsed.as_secs_f64() * 1000.0
    );
    for summary in report.largest.iter().flatten() {
        info!(
            "  largest {}: blob {} area {} at ({:.1}, {:.1})",
            summary.category_name, summary.id, summary.area, summary.centroid.0, summary.centroid.1
        );
    }
}

fn load_config(path: &Path) -> Result<TrackerConfig> {
    TrackerConfig::from_path(path)
        .with_context(|| format!("failed to load tracker config {}", path.display()))
}

fn load_image(path: &Path) -> Result<RgbImage> {
    Ok(image::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?
        .to_rgb8())
}

fn image_paths(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    let entries = fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());
        if extension.is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str())) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn write_outputs(
    args: &Args,
    input: &Path,
    canvas: &RgbImage,
    report: &FrameReport,
) -> Result<()> {
    let stem = input
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("frame");

    let image_path = args.output.join(format!("{stem}_blobs.png"));
    canvas
        .save(&image_path)
        .with_context(|| format!("failed to write {}", image_path.display()))?;

    if args.json {
        let json_path = args.output.join(format!("{stem}.json"));
        let json = serde_json::to_string_pretty(report).context("failed to serialize report")?;
        fs::write(&json_path, json)
            .with_context(|| format!("failed to write {}", json_path.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use blob_tracker::{ColorRange, ColorSpace, DisplayColor};
    use image::Rgb;

    const RED: Rgb<u8> = Rgb([255, 0, 0]);
    const CYAN: Rgb<u8> = Rgb([0, 255, 255]);

    #[test]
    fn annotation_redraws_on_a_reloaded_frame() {
        let dir = std::env::temp_dir().join(format!("visual_tester_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("square.png");
        let mut image = RgbImage::new(8, 8);
        for y in 2..6 {
            for x in 2..6 {
                image.put_pixel(x, y, RED);
            }
        }
        image.save(&path).unwrap();

        let red = ColorCategory::new(
            "red",
            ColorRange::from_bounds((200, 255), (0, 50), (0, 50)),
            DisplayColor::new(0, 255, 255),
        );
        let config = TrackerConfig {
            color_space: ColorSpace::Rgb,
            categories: vec![TrackerConfig::default().categories[0].clone(), red],
            ..TrackerConfig::default()
        };
        let categories = config.categories.clone();
        let mut tracker = BlobTracker::new(config).unwrap();
        let report = tracker.process_frame(&image).unwrap();

        let options = DisplayOptions {
            show_bounding_box: true,
            ..DisplayOptions::default()
        };
        let canvas = annotated_copy(&path, &report, &categories, &options).unwrap();
        assert_eq!(*canvas.get_pixel(2, 2), CYAN);
        assert_eq!(*canvas.get_pixel(5, 5), CYAN);
        assert_eq!(*canvas.get_pixel(3, 3), RED);
        assert_eq!(*canvas.get_pixel(0, 0), Rgb([0, 0, 0]));

        let missing = dir.join("missing.png");
        assert!(annotated_copy(&missing, &report, &categories, &options).is_err());
        fs::remove_dir_all(&dir).unwrap();
    }
}

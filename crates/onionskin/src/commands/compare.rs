use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use onionskin::compositor::raster;
use onionskin::decode::RawImage;
use onionskin::pipeline::{DiffJob, DiffPipeline};
use onionskin::{ComparisonSession, Compositor, Pan, ViewMode, Viewport};
use tracing::{debug, warn};

use crate::config::ResolvedCompareConfig;
use crate::report::{Summary, json, terminal};

/// Per-invocation inputs that are not part of the layered config.
pub struct CompareArgs {
    pub previous: Option<String>,
    pub current: Option<String>,
    pub pan: Pan,
    pub output: Option<PathBuf>,
    pub json: bool,
}

/// Read one side. Unreadable sources become absent with a notice.
fn read_source(side: &str, source: Option<&str>, notices: &mut Vec<String>) -> Option<RawImage> {
    let source = source?;
    match RawImage::from_source(source) {
        Ok(raw) => Some(raw),
        Err(e) => {
            let e = anyhow::Error::from(e);
            warn!(side, error = %format!("{e:#}"), "treating unreadable source as absent");
            notices.push(format!("{side}: {e:#}"));
            None
        }
    }
}

/// Smallest viewport that shows both images at 100%.
fn natural_viewport(session: &ComparisonSession) -> Viewport {
    let (w, h) = [session.previous(), session.current()]
        .into_iter()
        .flatten()
        .fold((1, 1), |(w, h), img| (w.max(img.width()), h.max(img.height())));
    Viewport::new(w, h)
}

/// `onionskin compare` — decode, compose, report, optionally render.
/// Returns exit code: 0 = done, 1 = diff mode found changed pixels.
pub async fn compare(config: ResolvedCompareConfig, args: CompareArgs) -> Result<i32> {
    let start = Instant::now();
    let mut notices = Vec::new();

    let previous_raw = read_source("previous", args.previous.as_deref(), &mut notices);
    let current_raw = read_source("current", args.current.as_deref(), &mut notices);

    let mut session = ComparisonSession::new();
    session.set_sensitivity(config.sensitivity);

    let mut pipeline = DiffPipeline::new();
    let id = pipeline.submit(DiffJob {
        previous: previous_raw.clone(),
        current: current_raw.clone(),
        sensitivity: session.sensitivity(),
        compute_diff: config.mode == ViewMode::Diff,
    });
    debug!(?id, "waiting for decode");
    let completion = pipeline
        .recv_latest()
        .await
        .context("Comparison request was superseded before it completed")?;

    for (side, raw, decoded) in [
        ("previous", &previous_raw, completion.previous.is_some()),
        ("current", &current_raw, completion.current.is_some()),
    ] {
        if let Some(raw) = raw
            && !decoded
        {
            notices.push(format!("{side}: could not decode {}", raw.label));
        }
    }

    session.set_images(completion.previous.clone(), completion.current.clone());
    session
        .set_view_mode(config.mode)
        .set_opacity(config.opacity)
        .set_zoom(config.zoom)
        .set_pan(args.pan.x, args.pan.y);

    let mut compositor = Compositor::new();
    if let (Some(result), Some(p), Some(c)) =
        (&completion.diff, &completion.previous, &completion.current)
    {
        compositor.install_diff(p, c, completion.sensitivity, result.clone());
    }

    let viewport = config
        .viewport
        .unwrap_or_else(|| natural_viewport(&session));
    let composition = compositor.compose(&session, viewport);
    debug!(
        state = session.state().label(),
        mode = session.view_mode().label(),
        diff_runs = compositor.diff_runs(),
        "composed"
    );

    let labels = (
        previous_raw.as_ref().map_or("-", |r| r.label.as_str()),
        current_raw.as_ref().map_or("-", |r| r.label.as_str()),
    );
    let mut summary = Summary::new(&session, &composition, labels, notices);

    if let Some(path) = &args.output {
        let canvas = raster::render(&composition, viewport);
        canvas
            .save_with_format(path, image::ImageFormat::Png)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        summary.output = Some(path.display().to_string());
    }

    summary.elapsed = start.elapsed();
    if args.json {
        json::print_summary(&summary)?;
    } else {
        terminal::print_summary(&summary);
    }

    let changed = summary.diff.as_ref().is_some_and(|d| d.changed_pixels > 0);
    Ok(i32::from(changed))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use onionskin::DecodedImage;

    use super::*;

    #[test]
    fn natural_viewport_covers_both_images() {
        let mut s = ComparisonSession::new();
        assert_eq!(natural_viewport(&s), Viewport::new(1, 1));
        s.set_images(
            Some(Arc::new(DecodedImage::filled(10, 3, [0; 4]).unwrap())),
            Some(Arc::new(DecodedImage::filled(4, 8, [0; 4]).unwrap())),
        );
        assert_eq!(natural_viewport(&s), Viewport::new(10, 8));
    }

    #[test]
    fn unreadable_source_becomes_notice() {
        let mut notices = Vec::new();
        assert!(read_source("previous", Some("/no/such/file.png"), &mut notices).is_none());
        assert!(read_source("current", None, &mut notices).is_none());
        assert_eq!(notices.len(), 1);
        assert!(notices[0].starts_with("previous: failed to read"));
    }

    #[tokio::test]
    async fn diff_run_writes_output_and_flags_changes() {
        let dir = tempfile::tempdir().unwrap();
        let prev = dir.path().join("prev.png");
        let cur = dir.path().join("cur.png");
        let out = dir.path().join("out.png");
        image::RgbaImage::from_pixel(4, 4, image::Rgba([0, 0, 0, 255]))
            .save(&prev)
            .unwrap();
        image::RgbaImage::from_pixel(4, 4, image::Rgba([255, 255, 255, 255]))
            .save(&cur)
            .unwrap();

        let config = ResolvedCompareConfig {
            mode: ViewMode::Diff,
            sensitivity: 10,
            opacity: 100,
            zoom: 100,
            viewport: None,
        };
        let args = CompareArgs {
            previous: Some(prev.display().to_string()),
            current: Some(cur.display().to_string()),
            pan: Pan::ZERO,
            output: Some(out.clone()),
            json: true,
        };
        assert_eq!(compare(config, args).await.unwrap(), 1);

        let rendered = image::open(&out).unwrap().to_rgba8();
        assert_eq!(rendered.dimensions(), (4, 4));
        assert_eq!(rendered.get_pixel(0, 0).0, onionskin::diff::HIGHLIGHT);
    }

    #[tokio::test]
    async fn missing_previous_is_new_file() {
        let dir = tempfile::tempdir().unwrap();
        let cur = dir.path().join("cur.png");
        image::RgbaImage::from_pixel(2, 2, image::Rgba([9, 9, 9, 255]))
            .save(&cur)
            .unwrap();
        let config = ResolvedCompareConfig {
            mode: ViewMode::Diff,
            sensitivity: 10,
            opacity: 100,
            zoom: 100,
            viewport: None,
        };
        let args = CompareArgs {
            previous: None,
            current: Some(cur.display().to_string()),
            pan: Pan::ZERO,
            output: None,
            json: false,
        };
        assert_eq!(compare(config, args).await.unwrap(), 0);
    }
}

//! Image preprocessing
//!
//! The recognizer only accepts raster input. SVG documents are rendered
//! to PNG before the model is engaged; everything else passes through
//! untouched. The rendered artifact is written beside the source with
//! the extension swapped and belongs to the current job — it is never
//! cached or reused across jobs.

use std::path::{Path, PathBuf};

use crate::error::{OcrError, Result};

/// Normalize an input reference into something the recognizer accepts.
pub async fn normalize(input: &Path) -> Result<PathBuf> {
    let is_vector = input
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("svg"))
        .unwrap_or(false);
    if !is_vector {
        return Ok(input.to_path_buf());
    }

    let source = input.to_path_buf();
    // Rasterization is CPU-bound; keep it off the async workers.
    tokio::task::spawn_blocking(move || rasterize_svg(&source))
        .await
        .map_err(|e| OcrError::Internal(format!("preprocessing task failed: {e}")))?
}

fn rasterize_svg(source: &Path) -> Result<PathBuf> {
    let data = std::fs::read(source).map_err(|e| OcrError::Preprocess(e.to_string()))?;

    let tree = resvg::usvg::Tree::from_data(&data, &resvg::usvg::Options::default())
        .map_err(|e| OcrError::Preprocess(e.to_string()))?;

    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| OcrError::Preprocess("document has zero size".to_string()))?;
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::identity(),
        &mut pixmap.as_mut(),
    );

    let rendered = source.with_extension("png");
    pixmap
        .save_png(&rendered)
        .map_err(|e| OcrError::Preprocess(e.to_string()))?;

    tracing::debug!(
        source = %source.display(),
        rendered = %rendered.display(),
        "rasterized vector input"
    );
    Ok(rendered)
}

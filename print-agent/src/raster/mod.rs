//! Receipt rasterizer
//!
//! Markup is typeset on a character grid, drawn as SVG and rendered to a PNG
//! whose width matches the printer's raster width (`cpl × 12` dots).

mod layout;
mod svg;

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use resvg::{tiny_skia, usvg};
use tracing::{debug, info, instrument, warn};

use crate::core::{RenderError, RenderResult};
use crate::receipt::ReceiptDocument;

pub use layout::{CHAR_WIDTH, LINE_HEIGHT};

/// Files written for one printer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterArtifact {
    pub svg_path: PathBuf,
    pub png_path: PathBuf,
    /// Image width in printer dots
    pub width_dots: u32,
}

/// Renders receipt documents to PNG files
///
/// Fonts are loaded once on construction and shared by every render.
#[derive(Clone)]
pub struct Rasterizer {
    fontdb: Arc<usvg::fontdb::Database>,
}

impl Rasterizer {
    /// Load system fonts, plus every font under `font_dir` if given
    pub fn new(font_dir: Option<&Path>) -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        if let Some(dir) = font_dir {
            db.load_fonts_dir(dir);
        }

        let monospace = db
            .faces()
            .find(|face| face.monospaced)
            .and_then(|face| face.families.first().map(|(name, _)| name.clone()));
        match monospace {
            Some(family) => {
                info!(family = %family, faces = db.len(), "Rasterizer fonts loaded");
                db.set_monospace_family(family);
            }
            None => warn!(faces = db.len(), "No monospace font found, receipt text may be missing"),
        }

        Self {
            fontdb: Arc::new(db),
        }
    }

    /// Rasterize a document into `<stamp>.svg` and `<stamp>.png` inside `job_folder`
    #[instrument(skip(self, document), fields(cpl = document.cpl))]
    pub fn rasterize(
        &self,
        document: &ReceiptDocument,
        job_folder: &Path,
    ) -> RenderResult<RasterArtifact> {
        let page = layout::typeset(&document.markup, document.cpl)?;
        let svg = svg::to_svg(&page);

        let stem = artifact_stem(job_folder);
        let svg_path = job_folder.join(format!("{}.svg", stem));
        let png_path = job_folder.join(format!("{}.png", stem));

        write_synced(&svg_path, svg.as_bytes())?;
        let png = self.render_png(&svg)?;
        write_synced(&png_path, &png)?;

        debug!(
            png = %png_path.display(),
            width = page.width_dots(),
            height = page.height_dots(),
            bytes = png.len(),
            "Receipt rasterized"
        );

        Ok(RasterArtifact {
            svg_path,
            png_path,
            width_dots: page.width_dots(),
        })
    }

    fn render_png(&self, svg: &str) -> RenderResult<Vec<u8>> {
        let options = usvg::Options {
            fontdb: Arc::clone(&self.fontdb),
            ..usvg::Options::default()
        };
        let tree =
            usvg::Tree::from_str(svg, &options).map_err(|e| RenderError::Svg(e.to_string()))?;

        let size = tree.size().to_int_size();
        let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height()).ok_or_else(|| {
            RenderError::Raster(format!(
                "cannot allocate {}x{} pixmap",
                size.width(),
                size.height()
            ))
        })?;
        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

        pixmap
            .encode_png()
            .map_err(|e| RenderError::Raster(e.to_string()))
    }
}

/// Millisecond timestamp, suffixed `-N` if already taken in `folder`
fn artifact_stem(folder: &Path) -> String {
    let base = Utc::now().timestamp_millis().to_string();
    let taken = |stem: &str| {
        folder.join(format!("{}.svg", stem)).exists()
            || folder.join(format!("{}.png", stem)).exists()
    };

    let mut stem = base.clone();
    let mut n = 0;
    while taken(&stem) {
        n += 1;
        stem = format!("{}-{}", base, n);
    }
    stem
}

/// Write and fsync, so the file is complete once this returns
fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.flush()?;
    file.sync_all()
}

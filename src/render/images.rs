//! Figure crops.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::{imageops, RgbImage};

use super::ExportOptions;
use crate::error::{Error, Result};
use crate::model::{Bbox, Document};
use crate::source::PageSource;

/// Pixel rectangle `(x, y, width, height)` of `bbox` on a raster.
///
/// `scale` converts page units to pixels. The box grows by `padding` times
/// its own width/height on each side and is clamped to the raster. Returns
/// `None` when nothing is left after clamping.
pub fn crop_rect(
    bbox: &Bbox,
    scale: f32,
    padding: f32,
    raster_width: u32,
    raster_height: u32,
) -> Option<(u32, u32, u32, u32)> {
    let x0 = bbox.x() as f32 * scale;
    let y0 = bbox.y() as f32 * scale;
    let x1 = bbox.x1() as f32 * scale;
    let y1 = bbox.y1() as f32 * scale;
    let dw = (x1 - x0) * padding;
    let dh = (y1 - y0) * padding;

    let left = (x0 - dw).floor().clamp(0.0, raster_width as f32) as u32;
    let top = (y0 - dh).floor().clamp(0.0, raster_height as f32) as u32;
    let right = (x1 + dw).ceil().clamp(0.0, raster_width as f32) as u32;
    let bottom = (y1 + dh).ceil().clamp(0.0, raster_height as f32) as u32;

    (right > left && bottom > top).then(|| (left, top, right - left, bottom - top))
}

/// Crop every figure of `doc` from `rasters` (one per page, page 1 first)
/// into `out_dir`. Returns the written files.
pub fn crop_figures(
    doc: &Document,
    rasters: &[PathBuf],
    out_dir: &Path,
    options: &ExportOptions,
) -> Result<Vec<PathBuf>> {
    if rasters.len() != doc.pages.len() {
        log::warn!(
            "{}: {} raster(s) for {} page(s)",
            doc.name,
            rasters.len(),
            doc.pages.len()
        );
    }
    fs::create_dir_all(out_dir).map_err(|e| Error::Export(format!("{}: {}", out_dir.display(), e)))?;

    let mut written = Vec::new();
    for page in doc.pages.iter().filter(|p| !p.figures.is_empty()) {
        let raster_path = (page.number as usize)
            .checked_sub(1)
            .and_then(|i| rasters.get(i))
            .ok_or_else(|| Error::Export(format!("no raster for page {}", page.number)))?;
        let raster = image::open(raster_path)?.to_rgb8();
        let scale = raster.width() as f32 / doc.layout.width as f32;

        for (idx, figure) in page.figures.iter().enumerate() {
            let Some((x, y, w, h)) =
                crop_rect(&figure.bbox, scale, options.crop_padding, raster.width(), raster.height())
            else {
                log::warn!("pg.{}: figure {} lies outside the raster", page.number, idx + 1);
                continue;
            };

            let crop = imageops::crop_imm(&raster, x, y, w, h).to_image();
            let path = out_dir.join(options.figure_name(page.number, idx));
            save_jpeg(&crop, &path, options.jpeg_quality)?;
            written.push(path);
        }
    }

    log::debug!("{}: {} figure image(s) written", doc.name, written.len());
    Ok(written)
}

/// Rasterize the source PDF at `options.dpi` and crop every figure into
/// `data_dir`. Intermediate rasters are removed afterwards.
pub fn save_images(
    doc: &Document,
    source: &dyn PageSource,
    data_dir: &Path,
    options: &ExportOptions,
) -> Result<Vec<PathBuf>> {
    if doc.figure_count() == 0 {
        return Ok(Vec::new());
    }

    let raster_dir = data_dir.join(format!("{}_images", doc.name));
    let rasters = source.rasterize(&doc.pdf_path, options.dpi, &raster_dir)?;
    let result = crop_figures(doc, &rasters, data_dir, options);

    if raster_dir.exists() {
        if let Err(e) = fs::remove_dir_all(&raster_dir) {
            log::warn!("cannot remove {}: {}", raster_dir.display(), e);
        }
    }
    result
}

fn save_jpeg(image: &RgbImage, path: &Path, quality: u8) -> Result<()> {
    let file = File::create(path).map_err(|e| Error::Export(format!("{}: {}", path.display(), e)))?;
    let encoder = JpegEncoder::new_with_quality(BufWriter::new(file), quality);
    image.write_with_encoder(encoder)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::two_column;
    use crate::model::{Figure, Page};
    use image::Rgb;

    #[test]
    fn test_crop_rect_scales_and_pads() {
        // 100x50 box at scale 2 with 10% padding: 200x100 px grown by 20/10 px per side
        let rect = crop_rect(&Bbox::new(100, 100, 100, 50), 2.0, 0.1, 2000, 2000);
        assert_eq!(rect, Some((180, 190, 240, 120)));
    }

    #[test]
    fn test_crop_rect_clamps_to_raster() {
        let rect = crop_rect(&Bbox::new(0, 0, 100, 100), 1.0, 0.035, 50, 80);
        assert_eq!(rect, Some((0, 0, 50, 80)));
        assert_eq!(crop_rect(&Bbox::new(500, 500, 10, 10), 1.0, 0.0, 100, 100), None);
    }

    #[test]
    fn test_crop_figures_names_files_per_page() {
        let tmp = tempfile::tempdir().unwrap();
        let raster_path = tmp.path().join("r-1.png");
        let mut raster = RgbImage::from_pixel(612, 792, Rgb([255, 255, 255]));
        for x in 100..200 {
            for y in 100..150 {
                raster.put_pixel(x, y, Rgb([0, 0, 0]));
            }
        }
        raster.save(&raster_path).unwrap();

        let mut page = Page::new(1, 612, 792);
        page.add_figure(Figure::orphan(Bbox::new(100, 100, 100, 50), None, String::new()));
        let doc = Document {
            name: "doc".to_string(),
            pdf_path: PathBuf::from("doc.pdf"),
            artifacts_path: PathBuf::new(),
            pages: vec![page],
            layout: two_column(),
        };

        let out = tmp.path().join("data");
        let options = ExportOptions::new().with_prefix("doc").with_crop_percentage(0.0);
        let written = crop_figures(&doc, &[raster_path], &out, &options).unwrap();

        assert_eq!(written, vec![out.join("doc_1_1.jpg")]);
        let crop = image::open(&written[0]).unwrap();
        assert_eq!((crop.width(), crop.height()), (100, 50));
    }

    #[test]
    fn test_crop_figures_rejects_page_without_raster() {
        let tmp = tempfile::tempdir().unwrap();
        let raster_path = tmp.path().join("r-1.png");
        RgbImage::from_pixel(612, 792, Rgb([255, 255, 255]))
            .save(&raster_path)
            .unwrap();

        let mut page = Page::new(0, 612, 792);
        page.add_figure(Figure::orphan(Bbox::new(100, 100, 100, 50), None, String::new()));
        let doc = Document {
            name: "zero".to_string(),
            pdf_path: PathBuf::from("zero.pdf"),
            artifacts_path: PathBuf::new(),
            pages: vec![page],
            layout: two_column(),
        };

        let result = crop_figures(&doc, &[raster_path], &tmp.path().join("data"), &ExportOptions::new());
        assert!(matches!(result, Err(Error::Export(_))));
    }
}

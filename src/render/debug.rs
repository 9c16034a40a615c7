//! Debug overlays: page rasters with the layout and extraction results drawn on top.

use std::fs;
use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

use super::ExportOptions;
use crate::error::{Error, Result};
use crate::model::{Bbox, Document, Page};

const CONTENT_REGION: Rgb<u8> = Rgb([0, 0, 0]);
const COLUMN: Rgb<u8> = Rgb([220, 20, 60]);
const TEXT_BOX: Rgb<u8> = Rgb([66, 135, 245]);
const CAPTION: Rgb<u8> = Rgb([76, 175, 80]);
const FIGURE: Rgb<u8> = Rgb([255, 152, 0]);
const ORPHAN: Rgb<u8> = Rgb([156, 39, 176]);

/// Draw one overlay per page into `out_dir` as `<name>_debug_<page>.png`.
pub fn draw_document(doc: &Document, out_dir: &Path, options: &ExportOptions) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)?;

    let mut written = Vec::with_capacity(doc.pages.len());
    for page in &doc.pages {
        let overlay = draw_page(doc, page, options)?;
        let path = out_dir.join(format!("{}_debug_{}.png", doc.name, page.number));
        overlay.save(&path)?;
        written.push(path);
    }
    Ok(written)
}

/// Overlay of a single page, in page units.
pub fn draw_page(doc: &Document, page: &Page, options: &ExportOptions) -> Result<RgbImage> {
    if page.width <= 0 || page.height <= 0 {
        return Err(Error::Render(format!("pg.{} has no size", page.number)));
    }
    let (width, height) = (page.width as u32, page.height as u32);

    let mut img = image::open(&page.image_path)
        .map_err(|e| Error::Render(format!("{}: {}", page.image_path.display(), e)))?
        .resize_exact(width, height, FilterType::Triangle)
        .to_rgb8();

    draw_box(&mut img, &doc.layout.content_region, CONTENT_REGION, 1);

    if options.debug_columns {
        for &x in &doc.layout.column_coordinates {
            draw_line_segment_mut(
                &mut img,
                (x as f32, 0.0),
                (x as f32, height as f32 - 1.0),
                COLUMN,
            );
        }
    }

    if options.debug_text_boxes {
        for tb in &page.text_boxes {
            draw_box(&mut img, &tb.bbox, TEXT_BOX, 1);
        }
    }
    for caption in &page.captions {
        draw_box(&mut img, &caption.bbox, CAPTION, 1);
    }
    for figure in &page.figures {
        if let Some(caption) = &figure.caption {
            draw_box(&mut img, &caption.bbox, CAPTION, 1);
        }
        draw_box(&mut img, &figure.bbox, FIGURE, 2);
    }
    if let Some(orphan) = &page.dangling_orphan_candidate {
        draw_box(&mut img, orphan, ORPHAN, 1);
    }

    Ok(img)
}

fn draw_box(img: &mut RgbImage, bbox: &Bbox, color: Rgb<u8>, thickness: i32) {
    let (img_w, img_h) = (img.width() as i32, img.height() as i32);
    let x = bbox.x().clamp(0, img_w);
    let y = bbox.y().clamp(0, img_h);
    let w = bbox.x1().min(img_w) - x;
    let h = bbox.y1().min(img_h) - y;

    for t in 0..thickness {
        let (inner_w, inner_h) = (w - 2 * t, h - 2 * t);
        if inner_w > 0 && inner_h > 0 {
            let rect = Rect::at(x + t, y + t).of_size(inner_w as u32, inner_h as u32);
            draw_hollow_rect_mut(img, rect, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::two_column;
    use crate::model::Figure;

    #[test]
    fn test_draw_document_writes_one_png_per_page() {
        let tmp = tempfile::tempdir().unwrap();
        // Half-size raster, scaled up to page units when drawn
        let raster = tmp.path().join("page1.png");
        RgbImage::from_pixel(306, 396, Rgb([255, 255, 255])).save(&raster).unwrap();

        let mut page = Page::new(1, 612, 792).with_paths(&raster, tmp.path().join("page1.html"));
        page.add_figure(Figure::orphan(Bbox::new(100, 100, 200, 100), None, String::new()));
        let doc = Document {
            name: "doc".to_string(),
            pdf_path: PathBuf::from("doc.pdf"),
            artifacts_path: tmp.path().to_path_buf(),
            pages: vec![page],
            layout: two_column(),
        };

        let written = draw_document(&doc, &tmp.path().join("debug"), &ExportOptions::default()).unwrap();
        assert_eq!(written, vec![tmp.path().join("debug").join("doc_debug_1.png")]);

        let overlay = image::open(&written[0]).unwrap().to_rgb8();
        assert_eq!(overlay.dimensions(), (612, 792));
        assert_eq!(*overlay.get_pixel(150, 100), FIGURE);
        assert_eq!(*overlay.get_pixel(150, 150), Rgb([255, 255, 255]));
    }

    #[test]
    fn test_missing_raster_is_render_error() {
        let page = Page::new(1, 612, 792).with_paths("/nonexistent/page1.png", "/nonexistent/page1.html");
        let doc = Document {
            name: "doc".to_string(),
            pdf_path: PathBuf::from("doc.pdf"),
            artifacts_path: PathBuf::new(),
            pages: vec![page.clone()],
            layout: two_column(),
        };
        assert!(matches!(
            draw_page(&doc, &page, &ExportOptions::default()),
            Err(Error::Render(_))
        ));
    }
}

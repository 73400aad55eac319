use super::document::{Document, DrawOp, Rgb, Weight};
use super::report::aligned_left;
use crate::error::{AppError, AppResult};
use printpdf::path::{PaintMode, WindingOrder};
use printpdf::{BuiltinFont, Color, Line, Mm, PdfDocument, Point, Polygon};

fn color(c: Rgb) -> Color {
    Color::Rgb(printpdf::Rgb::new(
        c.0 as f32 / 255.0,
        c.1 as f32 / 255.0,
        c.2 as f32 / 255.0,
        None,
    ))
}

/// 文档模型写出为 PDF (内置 Helvetica)
pub fn write_pdf(document: &Document) -> AppResult<Vec<u8>> {
    let width = Mm(document.width);
    let height = document.height;
    let (doc, first_page, first_layer) =
        PdfDocument::new(document.title.as_str(), width, Mm(height), "Layer 1");

    let render_err = |e: printpdf::Error| AppError::Render(e.to_string());
    let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(render_err)?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(render_err)?;

    // PDF 坐标原点在左下角
    let flip = |y: f32| Mm(height - y);

    for (index, page) in document.pages.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_ref, layer_ref) = doc.add_page(width, Mm(height), "Layer 1");
            doc.get_page(page_ref).get_layer(layer_ref)
        };

        for op in &page.ops {
            match op {
                DrawOp::Text { x, y, size, weight, align, color: c, text } => {
                    let font = match weight {
                        Weight::Normal => &regular,
                        Weight::Bold => &bold,
                    };
                    let left = aligned_left(*x, text, *size, *weight, *align);
                    layer.set_fill_color(color(*c));
                    layer.use_text(text.as_str(), *size, Mm(left), flip(*y), font);
                }
                DrawOp::Line { x1, y1, x2, y2, width, color: c } => {
                    layer.set_outline_color(color(*c));
                    // mm -> pt
                    layer.set_outline_thickness(*width * 72.0 / 25.4);
                    layer.add_line(Line {
                        points: vec![
                            (Point::new(Mm(*x1), flip(*y1)), false),
                            (Point::new(Mm(*x2), flip(*y2)), false),
                        ],
                        is_closed: false,
                    });
                }
                DrawOp::FillRect { x, y, w, h, color: c } => {
                    layer.set_fill_color(color(*c));
                    layer.add_polygon(Polygon {
                        rings: vec![vec![
                            (Point::new(Mm(*x), flip(*y)), false),
                            (Point::new(Mm(*x + *w), flip(*y)), false),
                            (Point::new(Mm(*x + *w), flip(*y + *h)), false),
                            (Point::new(Mm(*x), flip(*y + *h)), false),
                        ]],
                        mode: PaintMode::Fill,
                        winding_order: WindingOrder::NonZero,
                    });
                }
            }
        }
    }

    doc.save_to_bytes().map_err(render_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::document::TextStyle;

    #[test]
    fn writes_multi_page_document() {
        let mut document = Document::new("Audit Report");
        document.text("Audit Results", 105.0, 40.0, TextStyle::bold(32.0).centered());
        document.fill_rect(10.0, 40.0, 190.0, 10.0, Rgb::LAVENDER);
        document.add_page();
        document.line(10.0, 70.0, 200.0, 70.0, 0.4, Rgb::NAVY);

        let bytes = write_pdf(&document).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 200);
    }
}

use std::io::BufWriter;

use printpdf::*;

use crate::error::{GiroError, Result};
use crate::reports::TABLE_WIDTH;

// A4 landscape (mm)
const PAGE_W: f32 = 297.0;
const PAGE_H: f32 = 210.0;
const MARGIN_TOP: f32 = 12.0;
const MARGIN_BOTTOM: f32 = 12.0;
const MARGIN_LEFT: f32 = 10.0;
const MARGIN_RIGHT: f32 = 10.0;
const HEADER_SIZE: f32 = 11.0;
const PT_PER_MM: f32 = 2.834_646;
// Courier glyphs are 0.6 em wide.
const COURIER_ADVANCE: f32 = 0.6;

/// Font size that fits a full table line between the margins.
fn table_font_size() -> f32 {
    let usable_pt = (PAGE_W - MARGIN_LEFT - MARGIN_RIGHT) * PT_PER_MM;
    usable_pt / (TABLE_WIDTH as f32 * COURIER_ADVANCE)
}

struct PdfWriter {
    doc: PdfDocumentReference,
    font: IndirectFontRef,
    font_bold: IndirectFontRef,
    current_page: PdfPageIndex,
    current_layer: PdfLayerIndex,
    y: f32,
}

impl PdfWriter {
    fn new(title: &str) -> Result<Self> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
        let font = doc
            .add_builtin_font(BuiltinFont::Courier)
            .map_err(|e| GiroError::Pdf(format!("{e:?}")))?;
        let font_bold = doc
            .add_builtin_font(BuiltinFont::CourierBold)
            .map_err(|e| GiroError::Pdf(format!("{e:?}")))?;
        Ok(Self {
            doc,
            font,
            font_bold,
            current_page: page,
            current_layer: layer,
            y: MARGIN_TOP,
        })
    }

    fn pdf_y(&self) -> f32 {
        PAGE_H - self.y
    }

    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer");
        self.current_page = page;
        self.current_layer = layer;
        self.y = MARGIN_TOP;
    }

    fn ensure_space(&mut self, needed: f32) {
        if self.y + needed > PAGE_H - MARGIN_BOTTOM {
            self.new_page();
        }
    }

    fn text(&self, s: &str, size: f32, bold: bool) {
        let font = if bold {
            self.font_bold.clone()
        } else {
            self.font.clone()
        };
        let layer = self
            .doc
            .get_page(self.current_page)
            .get_layer(self.current_layer);
        layer.use_text(s, size, Mm(MARGIN_LEFT), Mm(self.pdf_y()), &font);
    }

    fn header(&mut self, header: &str) {
        self.text(header, HEADER_SIZE, true);
        self.y += 8.0;
    }

    fn line(&mut self, s: &str, size: f32) {
        let row_h = size / PT_PER_MM * 1.25;
        self.ensure_space(row_h);
        if !s.is_empty() {
            self.text(s, size, false);
        }
        self.y += row_h;
    }

    fn to_bytes(self) -> Result<Vec<u8>> {
        let mut buf = BufWriter::new(Vec::new());
        self.doc
            .save(&mut buf)
            .map_err(|e| GiroError::Pdf(format!("{e:?}")))?;
        buf.into_inner().map_err(|e| GiroError::Pdf(e.to_string()))
    }
}

/// Landscape document: the header on the first page, then the table projection line by line.
pub fn render_table_document(header: &str, table: &str) -> Result<Vec<u8>> {
    let mut pdf = PdfWriter::new(header)?;
    pdf.header(header);
    let size = table_font_size();
    for line in table.lines() {
        pdf.line(line.trim_end(), size);
    }
    pdf.to_bytes()
}

//! A self-contained weekly planner PDF writer.
//!
//! The output is a structurally valid PDF 1.4 document built by hand: a cover page carrying the
//! buyer watermark, then one A5 page per week with a line per day. Text is emitted into content
//! streams with octal escapes for non-ASCII bytes, so glyph fidelity for Japanese labels depends
//! on the viewer's font substitution. That trade-off keeps the renderer dependency-free and the
//! page structure, which is what the pipeline relies on, exact.
use chrono::Datelike;

use crate::{
    db_types::PlannerDay,
    traits::{ArtifactRenderer, RenderError, RenderedArtifact},
    worker::weekday_label_ja,
};

// A5 portrait in PostScript points.
const PAGE_WIDTH: f32 = 419.53;
const PAGE_HEIGHT: f32 = 595.28;

#[derive(Debug, Clone, Default)]
pub struct WeeklyPdfRenderer;

impl WeeklyPdfRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl ArtifactRenderer for WeeklyPdfRenderer {
    fn render(&self, watermark: Option<&str>, weeks: &[Vec<PlannerDay>]) -> Result<RenderedArtifact, RenderError> {
        if weeks.is_empty() {
            return Err(RenderError::EmptyInput("no weeks to render".to_string()));
        }
        for week in weeks {
            if week.len() != 7 {
                return Err(RenderError::RaggedWeek(week.len()));
            }
        }
        let mut doc = PdfWriter::new();
        doc.add_page(&cover_page_stream(watermark, weeks));
        for (index, week) in weeks.iter().enumerate() {
            doc.add_page(&week_page_stream(index + 1, week));
        }
        let page_count = doc.page_count();
        let bytes = doc.finish();
        Ok(RenderedArtifact { bytes, page_count, content_type: "application/pdf" })
    }
}

fn cover_page_stream(watermark: Option<&str>, weeks: &[Vec<PlannerDay>]) -> String {
    let first = weeks.first().and_then(|w| w.first()).map(|d| d.date.to_string()).unwrap_or_default();
    let last = weeks.last().and_then(|w| w.last()).map(|d| d.date.to_string()).unwrap_or_default();
    let mut ops = String::from("BT /F1 24 Tf 60 480 Td (Weekly Planner) Tj ET\n");
    ops.push_str(&text_op(12, 60.0, 450.0, &format!("{first} - {last}")));
    if let Some(mark) = watermark {
        ops.push_str("0.6 0.6 0.6 rg\n");
        ops.push_str(&text_op(10, 60.0, 40.0, mark));
        ops.push_str("0 0 0 rg\n");
    }
    ops
}

fn week_page_stream(week_number: usize, week: &[PlannerDay]) -> String {
    let mut ops = text_op(14, 40.0, PAGE_HEIGHT - 50.0, &format!("Week {week_number}"));
    let mut y = PAGE_HEIGHT - 90.0;
    for day in week {
        let weekday = i64::from(day.date.weekday().number_from_monday());
        let mut line = format!("{} {}", day.date, weekday_label_ja(weekday));
        if day.is_holiday {
            line.push_str(" *");
        }
        ops.push_str(&text_op(11, 40.0, y, &line));
        if !day.description_a.is_empty() {
            ops.push_str(&text_op(9, 60.0, y - 14.0, &day.description_a));
        }
        if !day.description_b.is_empty() {
            ops.push_str(&text_op(9, 60.0, y - 28.0, &day.description_b));
        }
        y -= 70.0;
    }
    ops
}

fn text_op(size: u32, x: f32, y: f32, text: &str) -> String {
    format!("BT /F1 {size} Tf {x:.1} {y:.1} Td ({}) Tj ET\n", escape_pdf_text(text))
}

fn escape_pdf_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for byte in text.bytes() {
        match byte {
            b'(' => out.push_str("\\("),
            b')' => out.push_str("\\)"),
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            0x20..=0x7e => out.push(byte as char),
            other => out.push_str(&format!("\\{other:03o}")),
        }
    }
    out
}

/// Accumulates objects and writes the cross-reference table at the end. Object 1 is the catalog,
/// object 2 the page tree, object 3 the font; pages and their content streams follow in pairs.
struct PdfWriter {
    pages: Vec<String>,
}

impl PdfWriter {
    fn new() -> Self {
        Self { pages: Vec::new() }
    }

    fn add_page(&mut self, content: &str) {
        self.pages.push(content.to_string());
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn finish(self) -> Vec<u8> {
        let page_object_ids: Vec<usize> = (0..self.pages.len()).map(|i| 4 + i * 2).collect();
        let kids = page_object_ids.iter().map(|id| format!("{id} 0 R")).collect::<Vec<_>>().join(" ");

        let mut objects: Vec<String> = vec![
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            format!("<< /Type /Pages /Kids [{kids}] /Count {} >>", self.pages.len()),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
        ];
        for (i, content) in self.pages.iter().enumerate() {
            let content_id = 4 + i * 2 + 1;
            objects.push(format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
                 /Resources << /Font << /F1 3 0 R >> >> /Contents {content_id} 0 R >>"
            ));
            objects.push(format!("<< /Length {} >>\nstream\n{content}endstream", content.len()));
        }

        let mut out = Vec::new();
        out.extend_from_slice(b"%PDF-1.4\n");
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, body) in objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
        }
        let xref_offset = out.len();
        out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
        out.extend_from_slice(b"0000000000 65535 f \n");
        for offset in offsets {
            out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
        }
        out.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
                objects.len() + 1
            )
            .as_bytes(),
        );
        out
    }
}

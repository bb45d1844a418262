use printpdf::{BuiltinFont, Mm, PdfDocument};
use std::io::BufWriter;
use thiserror::Error;

use crate::models::RoadmapDocument;

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const TOP_MARGIN_MM: f32 = 20.0;
const BOTTOM_MARGIN_MM: f32 = 15.0;
/// A phase never starts below this line; it moves to a fresh page instead.
const PHASE_BREAK_MM: f32 = PAGE_HEIGHT_MM - 60.0;
const LEFT_MM: f32 = 20.0;
const INDENT_MM: f32 = 25.0;
const BODY_WIDTH_MM: f32 = 170.0;
const LIST_WIDTH_MM: f32 = 160.0;
const PT_TO_MM: f32 = 0.3528;
// Average Helvetica glyph width relative to the font size.
const AVG_GLYPH_EM: f32 = 0.5;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("pdf rendering failed: {0}")]
    Render(String),
}

/// One positioned line of text, measured from the top-left of its page.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub font_size: f32,
    pub x_mm: f32,
    pub y_mm: f32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageLayout {
    pub lines: Vec<TextLine>,
}

/// Greedy word wrap using an average glyph width estimate. Words longer than
/// a line are split.
pub fn wrap_text(text: &str, width_mm: f32, font_size: f32) -> Vec<String> {
    let max_chars = ((width_mm / (font_size * AVG_GLYPH_EM * PT_TO_MM)).floor() as usize).max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        let word: String = word.into_iter().collect();
        let needed = if current.is_empty() { word.chars().count() } else { current.chars().count() + 1 + word.chars().count() };
        if needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

struct Cursor {
    pages: Vec<PageLayout>,
    y: f32,
}

impl Cursor {
    fn new() -> Self { Self { pages: vec![PageLayout::default()], y: TOP_MARGIN_MM } }

    fn new_page(&mut self) {
        self.pages.push(PageLayout::default());
        self.y = TOP_MARGIN_MM;
    }

    fn line(&mut self, text: impl Into<String>, font_size: f32, x_mm: f32) {
        if self.y > PAGE_HEIGHT_MM - BOTTOM_MARGIN_MM {
            self.new_page();
        }
        let y_mm = self.y;
        if let Some(page) = self.pages.last_mut() {
            page.lines.push(TextLine { text: text.into(), font_size, x_mm, y_mm });
        }
    }

    /// Writes wrapped text, advancing `step` per line.
    fn block(&mut self, text: &str, font_size: f32, x_mm: f32, width_mm: f32, step: f32) {
        for line in wrap_text(text, width_mm, font_size) {
            self.line(line, font_size, x_mm);
            self.y += step;
        }
    }

    fn bullets(&mut self, heading: &str, items: &[String]) {
        self.line(heading, 10.0, LEFT_MM);
        self.y += 6.0;
        for item in items {
            self.block(&format!("- {item}"), 10.0, INDENT_MM, LIST_WIDTH_MM, 4.0);
        }
    }
}

pub fn layout_roadmap(roadmap: &RoadmapDocument) -> Vec<PageLayout> {
    let mut c = Cursor::new();

    c.line(roadmap.title.as_str(), 20.0, LEFT_MM);
    c.y += 15.0;

    c.block(&roadmap.description, 12.0, LEFT_MM, BODY_WIDTH_MM, 5.0);
    c.y += 10.0;

    c.line(format!("Level: {}", roadmap.level), 11.0, LEFT_MM);
    c.y += 8.0;
    c.line(format!("Duration: {}", roadmap.total_duration), 11.0, LEFT_MM);
    c.y += 8.0;
    c.line(format!("Phases: {}", roadmap.phases.len()), 11.0, LEFT_MM);
    c.y += 15.0;

    for (index, phase) in roadmap.phases.iter().enumerate() {
        if c.y > PHASE_BREAK_MM {
            c.new_page();
        }

        c.line(format!("Phase {}: {}", index + 1, phase.title), 14.0, LEFT_MM);
        c.y += 10.0;

        c.block(&phase.description, 10.0, LEFT_MM, BODY_WIDTH_MM, 4.0);
        c.y += 5.0;

        c.line(format!("Duration: {}", phase.duration), 10.0, LEFT_MM);
        c.y += 8.0;

        if let Some(prerequisites) = phase.prerequisites.as_deref().filter(|p| !p.is_empty()) {
            c.bullets("Prerequisites:", prerequisites);
            c.y += 5.0;
        }

        if !phase.resources.is_empty() {
            let items: Vec<String> = phase
                .resources
                .iter()
                .map(|r| format!("{} ({})", r.title, r.kind.as_str()))
                .collect();
            c.bullets("Resources:", &items);
            c.y += 5.0;
        }

        if let Some(projects) = phase.projects.as_deref().filter(|p| !p.is_empty()) {
            c.bullets("Projects:", projects);
        }

        c.y += 15.0;
    }

    c.pages
}

/// Text-only PDF of the roadmap, one printpdf page per layout page.
pub fn generate_pdf(roadmap: &RoadmapDocument) -> Result<Vec<u8>, ExportError> {
    let pages = layout_roadmap(roadmap);
    let doc_title = if roadmap.title.is_empty() { "Learning Roadmap" } else { roadmap.title.as_str() };
    let (doc, first_page, first_layer) = PdfDocument::new(doc_title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ExportError::Render(e.to_string()))?;

    for (index, page) in pages.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_idx, layer_idx) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), format!("Page {}", index + 1));
            doc.get_page(page_idx).get_layer(layer_idx)
        };
        for line in &page.lines {
            layer.use_text(line.text.as_str(), line.font_size, Mm(line.x_mm), Mm(PAGE_HEIGHT_MM - line.y_mm), &font);
        }
    }

    let mut buf: Vec<u8> = Vec::new();
    {
        let mut writer = BufWriter::new(&mut buf);
        doc.save(&mut writer).map_err(|e| ExportError::Render(e.to_string()))?;
    }
    Ok(buf)
}

/// Filename stem for an exported roadmap: `"C++ & Rust!"` becomes `c_rust_roadmap`.
pub fn export_file_stem(title: &str) -> String {
    let mut stem = String::with_capacity(title.len());
    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            stem.push(ch.to_ascii_lowercase());
        } else if !stem.is_empty() && !stem.ends_with('_') {
            stem.push('_');
        }
    }
    let stem = stem.trim_end_matches('_');
    if stem.is_empty() {
        "roadmap".to_string()
    } else {
        format!("{stem}_roadmap")
    }
}

pub fn export_file_name(title: &str) -> String { format!("{}.pdf", export_file_stem(title)) }

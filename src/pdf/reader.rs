//! PDF text extraction using PDFium

use crate::error::{Error, Result};
use pdfium_render::prelude::*;
use std::cmp::Ordering;
use std::path::Path;

/// Positioned glyph collected from a page
#[derive(Debug, Clone, Copy)]
pub struct CharInfo {
    pub char: char,
    /// X coordinate (left)
    pub x: f32,
    /// Y coordinate (top)
    pub y: f32,
    pub width: f32,
    /// Glyph height, used as a font size proxy
    pub height: f32,
}

/// Get PDFium instance (creates new instance each time - PDFium is not thread-safe)
fn create_pdfium() -> Result<Pdfium> {
    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                "/opt/pdfium/lib",
            ))
        })
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| Error::Pdfium {
            reason: format!("Failed to initialize PDFium: {}", e),
        })?;

    Ok(Pdfium::new(bindings))
}

/// Text of every page of a PDF, extracted upfront
#[derive(Debug, Clone)]
pub struct PdfReader {
    page_texts: Vec<String>,
}

impl PdfReader {
    /// Open a PDF from a file path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.is_file() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let data = std::fs::read(path)?;
        Self::open_bytes(&data)
    }

    /// Open a PDF from bytes
    pub fn open_bytes(data: &[u8]) -> Result<Self> {
        if !is_pdf(data) {
            return Err(Error::InvalidPdf {
                reason: "Not a valid PDF file".to_string(),
            });
        }

        let pdfium = create_pdfium()?;
        let document = pdfium
            .load_pdf_from_byte_slice(data, None)
            .map_err(map_pdfium_error)?;

        let pages = document.pages();
        let mut page_texts = Vec::with_capacity(pages.len() as usize);
        for index in 0..pages.len() {
            let page = pages.get(index).map_err(|e| Error::Pdfium {
                reason: format!("Failed to get page {}: {}", index + 1, e),
            })?;
            page_texts.push(layout_text(collect_chars(&page)));
        }

        Ok(Self { page_texts })
    }

    /// Get the number of pages
    pub fn page_count(&self) -> u32 {
        self.page_texts.len() as u32
    }

    /// `(page number, text)` pairs, 1-indexed
    pub fn pages(&self) -> impl Iterator<Item = (u32, &str)> {
        self.page_texts
            .iter()
            .enumerate()
            .map(|(i, text)| (i as u32 + 1, text.as_str()))
    }

    /// Markdown rendering: a title, then one section per page with text
    pub fn to_markdown(&self, name: &str) -> String {
        render_markdown(name, self.pages())
    }
}

/// Check the `%PDF` magic bytes
pub fn is_pdf(data: &[u8]) -> bool {
    data.len() >= 4 && &data[0..4] == b"%PDF"
}

fn map_pdfium_error(err: PdfiumError) -> Error {
    match err {
        PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError) => {
            Error::PasswordRequired
        }
        _ => Error::Pdfium {
            reason: format!("{}", err),
        },
    }
}

fn collect_chars(page: &PdfPage) -> Vec<CharInfo> {
    let text_obj = match page.text() {
        Ok(t) => t,
        Err(_) => return Vec::new(),
    };

    let mut chars = Vec::new();
    for segment in text_obj.segments().iter() {
        if let Ok(char_iter) = segment.chars() {
            for char_result in char_iter.iter() {
                if let Some(c) = char_result.unicode_char() {
                    if let Ok(bounds) = char_result.loose_bounds() {
                        chars.push(CharInfo {
                            char: c,
                            x: bounds.left().value,
                            y: bounds.top().value,
                            width: bounds.width().value,
                            height: bounds.height().value,
                        });
                    }
                }
            }
        }
    }
    chars
}

/// `(line tolerance, word gap)` derived from the median glyph height
fn thresholds(chars: &[CharInfo]) -> (f32, f32) {
    let mut heights: Vec<f32> = chars
        .iter()
        .filter(|c| c.height > 0.0)
        .map(|c| c.height)
        .collect();

    if heights.is_empty() {
        return (5.0, 10.0);
    }

    heights.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let median = heights[heights.len() / 2];

    ((median * 0.4).max(2.0), (median * 0.3).max(3.0))
}

/// Group glyphs into lines top to bottom and join them into text.
///
/// PDF Y grows upwards, so lines are ordered by descending Y. Within a line
/// glyphs are ordered left to right and a space is inserted where the gap
/// to the previous glyph's right edge exceeds the word gap.
pub fn layout_text(mut chars: Vec<CharInfo>) -> String {
    if chars.is_empty() {
        return String::new();
    }

    let (y_tolerance, word_gap) = thresholds(&chars);

    chars.sort_by(|a, b| {
        b.y.partial_cmp(&a.y)
            .unwrap_or(Ordering::Equal)
            .then(a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal))
    });

    let mut lines: Vec<Vec<CharInfo>> = Vec::new();
    let mut line_y: Option<f32> = None;
    for c in chars {
        let same_line = line_y.is_some_and(|y| (y - c.y).abs() <= y_tolerance);
        if same_line {
            if let Some(line) = lines.last_mut() {
                line.push(c);
                continue;
            }
        }
        line_y = Some(c.y);
        lines.push(vec![c]);
    }

    let mut out = String::new();
    for mut line in lines {
        line.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal));

        let mut prev_right: Option<f32> = None;
        for c in line {
            if let Some(right) = prev_right {
                if c.x - right > word_gap && !c.char.is_whitespace() && !out.ends_with(' ') {
                    out.push(' ');
                }
            }
            out.push(c.char);
            prev_right = Some(c.x + c.width);
        }
        out.push('\n');
    }

    out.trim_end().to_string()
}

/// `# Content of {name}` followed by `## Page {n}` for every page with text
pub fn render_markdown<'a>(name: &str, pages: impl IntoIterator<Item = (u32, &'a str)>) -> String {
    let mut text = format!("# Content of {}\n\n", name);
    for (page, content) in pages {
        if content.trim().is_empty() {
            continue;
        }
        text.push_str(&format!("## Page {}\n{}\n\n", page, content));
    }
    text
}

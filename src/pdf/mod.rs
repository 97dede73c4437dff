//! PDF processing layer
//!
//! Text extraction uses PDFium; rendering uses a headless browser.

mod reader;
mod render;

pub use reader::{is_pdf, layout_text, render_markdown, CharInfo, PdfReader};
pub use render::HtmlRenderer;

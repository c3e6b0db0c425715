//! Page-tagged document splitting.
//!
//! `PdfSplitter` extracts text page by page with `lopdf`; `chunk_pages` packs
//! each page's paragraphs into chunks of at most `max_chars` characters.
//! A chunk never spans two pages, so its page number is exact.

use anyhow::{Context, Result};
use std::path::Path;

use crate::traits::DocumentSplitter;
use crate::types::{PageChunk, PageNumber};

#[derive(Debug, Clone)]
pub struct PdfSplitter {
    max_chars: usize,
}

impl PdfSplitter {
    pub fn new(max_chars: usize) -> Self { Self { max_chars: max_chars.max(1) } }
}

impl DocumentSplitter for PdfSplitter {
    fn split(&self, path: &Path) -> Result<Vec<PageChunk>> {
        let doc = lopdf::Document::load(path).with_context(|| format!("failed to load PDF {}", path.display()))?;
        let mut pages = Vec::new();
        for page_number in doc.get_pages().keys().copied() {
            match doc.extract_text(&[page_number]) {
                Ok(text) => pages.push((page_number, text)),
                Err(e) => tracing::warn!(page = page_number, error = %e, "skipping page without extractable text"),
            }
        }
        let chunks = chunk_pages(pages, self.max_chars);
        tracing::debug!(path = %path.display(), chunks = chunks.len(), "split PDF");
        Ok(chunks)
    }
}

/// Chunk extracted page texts in page order.
pub fn chunk_pages<I, S>(pages: I, max_chars: usize) -> Vec<PageChunk>
where
    I: IntoIterator<Item = (PageNumber, S)>,
    S: AsRef<str>,
{
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    for (page_number, text) in pages {
        chunk_page(page_number, text.as_ref(), max_chars, &mut chunks);
    }
    chunks
}

fn chunk_page(page_number: PageNumber, text: &str, max_chars: usize, out: &mut Vec<PageChunk>) {
    let mut current = String::new();
    let mut current_len = 0usize;
    for paragraph in text.split("\n\n") {
        let paragraph = paragraph.split_whitespace().collect::<Vec<_>>().join(" ");
        if paragraph.is_empty() { continue; }
        let len = paragraph.chars().count();
        if len > max_chars {
            flush(page_number, &mut current, &mut current_len, out);
            for piece in split_long_paragraph(&paragraph, max_chars) { out.push(PageChunk::new(page_number, piece)); }
            continue;
        }
        if current_len > 0 && current_len + 2 + len > max_chars { flush(page_number, &mut current, &mut current_len, out); }
        if current_len > 0 { current.push_str("\n\n"); current_len += 2; }
        current.push_str(&paragraph);
        current_len += len;
    }
    flush(page_number, &mut current, &mut current_len, out);
}

fn flush(page_number: PageNumber, current: &mut String, current_len: &mut usize, out: &mut Vec<PageChunk>) {
    if *current_len == 0 { return; }
    out.push(PageChunk::new(page_number, std::mem::take(current)));
    *current_len = 0;
}

/// Split at word boundaries; a single word longer than `max_chars` is cut.
fn split_long_paragraph(paragraph: &str, max_chars: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;
    for word in paragraph.split_whitespace() {
        let word_len = word.chars().count();
        if current_len > 0 && current_len + 1 + word_len > max_chars {
            pieces.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if word_len > max_chars {
            let chars: Vec<char> = word.chars().collect();
            for part in chars.chunks(max_chars) { pieces.push(part.iter().collect()); }
            continue;
        }
        if current_len > 0 { current.push(' '); current_len += 1; }
        current.push_str(word);
        current_len += word_len;
    }
    if current_len > 0 { pieces.push(current); }
    pieces
}

use std::fs;

use review_core::splitter::{chunk_pages, PdfSplitter};
use review_core::traits::DocumentSplitter;
use tempfile::TempDir;

#[test]
fn one_short_page_becomes_one_chunk() {
    let chunks = chunk_pages([(1u32, "Short text")], 100);
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].page_number, 1);
    assert_eq!(chunks[0].text, "Short text");
}

#[test]
fn chunks_never_span_pages_and_keep_page_order() {
    let pages = vec![(1u32, "alpha bravo"), (2, ""), (3, "charlie\n\ndelta")];
    let chunks = chunk_pages(pages, 1000);
    let pages: Vec<u32> = chunks.iter().map(|c| c.page_number).collect();
    assert_eq!(pages, vec![1, 3], "empty page produces no chunk");
    assert_eq!(chunks[1].text, "charlie\n\ndelta");
}

#[test]
fn paragraphs_are_packed_up_to_the_limit() {
    let text = "aaaa bbbb\n\ncccc dddd\n\neeee ffff";
    let chunks = chunk_pages([(4u32, text)], 20);
    let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec!["aaaa bbbb\n\ncccc dddd", "eeee ffff"]);
    assert!(chunks.iter().all(|c| c.text.chars().count() <= 20));
}

#[test]
fn long_paragraphs_split_at_word_boundaries() {
    let words: Vec<String> = (0..50).map(|i| format!("word{i:02}")).collect();
    let chunks = chunk_pages([(2u32, words.join(" "))], 30);
    assert!(chunks.len() > 1);
    for c in &chunks {
        assert_eq!(c.page_number, 2);
        assert!(c.text.chars().count() <= 30, "chunk too long: {}", c.text);
    }
    let rejoined: Vec<&str> = chunks.iter().flat_map(|c| c.text.split(' ')).collect();
    assert_eq!(rejoined, words.iter().map(String::as_str).collect::<Vec<_>>());
}

#[test]
fn pdf_splitter_rejects_non_pdf_input() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("notes.pdf");
    fs::write(&path, "this is not a pdf").unwrap();
    assert!(PdfSplitter::new(500).split(&path).is_err());
}

fn write_pdf(path: &std::path::Path, pages: &[&str]) {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! { "Type" => "Font", "Subtype" => "Type1", "BaseFont" => "Courier" });
    let resources_id = doc.add_object(dictionary! { "Font" => dictionary! { "F1" => font_id } });
    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }
    let count = kids.len() as i64;
    doc.objects.insert(pages_id, Object::Dictionary(dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    }));
    let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

#[test]
fn pdf_splitter_tags_chunks_with_their_page() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("rubric.pdf");
    write_pdf(&path, &["Projects must state clear goals", "Budgets must be justified"]);

    let chunks = PdfSplitter::new(1500).split(&path).unwrap();
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].page_number, 1);
    assert!(chunks[0].text.contains("goals"), "{:?}", chunks[0].text);
    assert_eq!(chunks[1].page_number, 2);
    assert!(chunks[1].text.contains("Budgets"), "{:?}", chunks[1].text);
}

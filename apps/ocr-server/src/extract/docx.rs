//! Word document extraction
//!
//! Reads `word/document.xml` out of the DOCX container and flattens the
//! visible text of body paragraphs and, optionally, body tables.
//!
//! Paragraph text is the concatenation of its runs (`w:t`, with `w:tab` as a
//! tab and `w:br`/`w:cr` as a newline), including runs inside hyperlinks.
//! Text boxes, drawings, nested tables and deleted text are not visible at
//! this level and are skipped.
//!
//! A horizontally merged cell (`w:gridSpan`) is repeated once per grid
//! column it covers, so every row has one entry per column.

use std::io::{Cursor, Read};

use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;
use tracing::info;
use zip::ZipArchive;

use super::error::ExtractionError;
use super::types::ExtractionResult;

/// Main document part inside the container
const DOCUMENT_PART: &str = "word/document.xml";

#[derive(Debug, Error)]
enum DocxError {
    #[error("not a valid .docx container: {0}")]
    Container(#[from] zip::result::ZipError),

    #[error("failed to read word/document.xml: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed document XML: {0}")]
    Xml(#[from] quick_xml::Error),
}

/// Extractor for `.docx` documents
#[derive(Debug, Clone, Copy)]
pub struct DocxExtractor {
    include_tables: bool,
}

impl Default for DocxExtractor {
    fn default() -> Self {
        Self::new(true)
    }
}

impl DocxExtractor {
    pub fn new(include_tables: bool) -> Self {
        Self { include_tables }
    }

    pub fn include_tables(&self) -> bool {
        self.include_tables
    }

    /// Extract paragraphs, then table rows when enabled
    pub fn extract(&self, data: &[u8]) -> Result<ExtractionResult, ExtractionError> {
        info!(
            bytes = data.len(),
            include_tables = self.include_tables,
            "Extracting text from Word document"
        );

        let body = read_document_xml(data)
            .and_then(|xml| DocxBody::parse(&xml))
            .map_err(|e| {
                ExtractionError::ExtractionFailure(format!(
                    "Failed to extract text from Word document: {}",
                    e
                ))
            })?;

        let result = ExtractionResult::from_aggregate(&body.to_text(self.include_tables));
        info!(
            paragraphs = body.paragraphs.len(),
            tables = body.tables.len(),
            "Extracted {} characters from Word document",
            result.length
        );
        Ok(result)
    }
}

fn read_document_xml(data: &[u8]) -> Result<String, DocxError> {
    let mut archive = ZipArchive::new(Cursor::new(data))?;
    let mut part = archive.by_name(DOCUMENT_PART)?;
    let mut xml = String::new();
    part.read_to_string(&mut xml)?;
    Ok(xml)
}

/// Body content in document order
#[derive(Debug, Default, PartialEq)]
struct DocxBody {
    paragraphs: Vec<String>,
    /// table → row → cell text
    tables: Vec<Vec<Vec<String>>>,
}

impl DocxBody {
    fn parse(xml: &str) -> Result<Self, DocxError> {
        BodyWalker::default().walk(xml)
    }

    fn to_text(&self, include_tables: bool) -> String {
        let mut text = String::new();

        for paragraph in &self.paragraphs {
            text.push_str(paragraph);
            text.push('\n');
        }

        if include_tables {
            for row in self.tables.iter().flatten() {
                for cell in row {
                    text.push_str(cell);
                    text.push(' ');
                }
                text.push('\n');
            }
        }

        text
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Target {
    Body,
    Cell,
}

#[derive(Debug)]
struct OpenParagraph {
    /// Index of the `p` element in the element stack
    depth: usize,
    target: Target,
    text: String,
}

/// Streaming walker over `w:document`, tracking open elements by local name
#[derive(Debug, Default)]
struct BodyWalker {
    stack: Vec<String>,
    body: DocxBody,
    /// Stack index of the open body-level table
    table: Option<usize>,
    /// Paragraph texts of the open cell of that table
    cell: Option<Vec<String>>,
    /// Grid columns covered by the open cell
    cell_span: usize,
    paragraph: Option<OpenParagraph>,
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn end_name(e: &BytesEnd<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

impl BodyWalker {
    fn walk(mut self, xml: &str) -> Result<DocxBody, DocxError> {
        let mut reader = Reader::from_str(xml);

        loop {
            match reader.read_event()? {
                Event::Start(e) => self.open(local_name(&e)),
                Event::End(e) => self.close(&end_name(&e)),
                Event::Empty(e) => self.empty(&e),
                Event::Text(t) => {
                    let text = t.unescape()?;
                    self.text(&text);
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(self.body)
    }

    fn parent(&self) -> Option<&str> {
        self.stack.last().map(String::as_str)
    }

    /// Stack depth `offset` levels below the open body-level table
    fn table_level(&self, offset: usize) -> Option<usize> {
        self.table.map(|t| t + offset)
    }

    fn open(&mut self, name: String) {
        let depth = self.stack.len();

        let parent = self.stack.last().cloned();

        match (name.as_str(), parent.as_deref()) {
            ("p", Some("body")) => {
                self.paragraph = Some(OpenParagraph {
                    depth,
                    target: Target::Body,
                    text: String::new(),
                });
            }
            ("tbl", Some("body")) => {
                self.table = Some(depth);
                self.body.tables.push(Vec::new());
            }
            ("tr", Some("tbl")) if self.table_level(1) == Some(depth) => {
                if let Some(table) = self.body.tables.last_mut() {
                    table.push(Vec::new());
                }
            }
            ("tc", Some("tr")) if self.table_level(2) == Some(depth) => {
                self.cell = Some(Vec::new());
                self.cell_span = 1;
            }
            ("p", Some("tc")) if self.cell.is_some() && self.table_level(3) == Some(depth) => {
                self.paragraph = Some(OpenParagraph {
                    depth,
                    target: Target::Cell,
                    text: String::new(),
                });
            }
            _ => {}
        }

        self.stack.push(name);
    }

    fn close(&mut self, name: &str) {
        if self.stack.pop().is_none() {
            return;
        }
        let depth = self.stack.len();

        match name {
            "p" => {
                if let Some(paragraph) = self.paragraph.take() {
                    if paragraph.depth == depth {
                        self.finish_paragraph(paragraph.target, paragraph.text);
                    } else {
                        self.paragraph = Some(paragraph);
                    }
                }
            }
            "tc" if self.table_level(2) == Some(depth) => {
                if let Some(paragraphs) = self.cell.take() {
                    self.finish_cell(paragraphs.join("\n"));
                }
            }
            "tbl" if self.table == Some(depth) => {
                self.table = None;
            }
            _ => {}
        }
    }

    fn empty(&mut self, e: &BytesStart<'_>) {
        match local_name(e).as_str() {
            // <w:p/> is a paragraph with no runs
            "p" => match self.stack.last().cloned().as_deref() {
                Some("body") => self.finish_paragraph(Target::Body, String::new()),
                Some("tc") if self.table_level(3) == Some(self.stack.len()) => {
                    self.finish_paragraph(Target::Cell, String::new())
                }
                _ => {}
            },
            "tc" if self.table_level(2) == Some(self.stack.len()) => {
                self.cell_span = 1;
                self.finish_cell(String::new());
            }
            "gridSpan" if self.parent() == Some("tcPr") && self.table_level(4) == Some(self.stack.len()) => {
                self.cell_span = grid_span(e);
            }
            "tab" if self.in_run() => self.push_text("\t"),
            "br" | "cr" if self.in_run() => self.push_text("\n"),
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if self.parent() == Some("t") && self.in_run_text() {
            self.push_text(text);
        }
    }

    /// Elements opened below the open paragraph, innermost last
    fn below_paragraph(&self) -> &[String] {
        match &self.paragraph {
            Some(p) if p.depth < self.stack.len() => &self.stack[p.depth + 1..],
            _ => &[],
        }
    }

    /// Innermost open element is a run of the open paragraph
    fn in_run(&self) -> bool {
        match self.below_paragraph() {
            [r] => r == "r",
            [h, r] => h == "hyperlink" && r == "r",
            _ => false,
        }
    }

    /// Innermost open element is a direct child of a run of the open paragraph
    fn in_run_text(&self) -> bool {
        match self.below_paragraph() {
            [r, _] => r == "r",
            [h, r, _] => h == "hyperlink" && r == "r",
            _ => false,
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some(paragraph) = &mut self.paragraph {
            paragraph.text.push_str(text);
        }
    }

    fn finish_paragraph(&mut self, target: Target, text: String) {
        match target {
            Target::Body => self.body.paragraphs.push(text),
            Target::Cell => {
                if let Some(cell) = &mut self.cell {
                    cell.push(text);
                }
            }
        }
    }

    fn finish_cell(&mut self, text: String) {
        let span = std::mem::replace(&mut self.cell_span, 1).max(1);
        if let Some(row) = self.body.tables.last_mut().and_then(|t| t.last_mut()) {
            row.extend(std::iter::repeat(text).take(span));
        }
    }
}

/// `w:val` of a `w:gridSpan`, at least 1
fn grid_span(e: &BytesStart<'_>) -> usize {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == b"val")
        .and_then(|a| std::str::from_utf8(&a.value).ok()?.trim().parse::<usize>().ok())
        .unwrap_or(1)
        .max(1)
}

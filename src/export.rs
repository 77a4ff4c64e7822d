/// PDF export
///
/// Flattens a `QueryResponse` into a text-only PDF 1.4 document: A4 pages, 20 mm
/// margins, base-14 Helvetica fonts with WinAnsi encoding, word-wrapped body text,
/// automatic page breaks, and a page footer. Glyph widths are approximated with an
/// average Helvetica advance, so wrapping is conservative rather than exact.

use chrono::NaiveDate;

use crate::service::QueryResponse;

const MM: f32 = 72.0 / 25.4;
const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 20.0;
const LINE_HEIGHT_MM: f32 = 6.0;
/// Lowest baseline body text may use before a page break.
const PAGE_BOTTOM_MM: f32 = 275.0;
const FOOTER_BASELINE_MM: f32 = 290.0;

const TITLE_SIZE: f32 = 16.0;
const HEADING_SIZE: f32 = 12.0;
const SUBHEADING_SIZE: f32 = 11.0;
const BODY_SIZE: f32 = 10.0;
const FOOTER_SIZE: f32 = 8.0;

/// Average Helvetica advance width as a fraction of the font size.
const AVG_GLYPH_WIDTH: f32 = 0.5;
const BULLET_INDENT_MM: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }
}

#[derive(Debug, Clone)]
struct TextRun {
    font: Font,
    size: f32,
    x_mm: f32,
    y_mm: f32,
    text: String,
}

/// Cursor-based page layout. `y` is the next baseline, measured from the page top.
struct Layout {
    pages: Vec<Vec<TextRun>>,
    y: f32,
}

impl Layout {
    fn new() -> Self {
        Layout {
            pages: vec![Vec::new()],
            y: MARGIN_MM,
        }
    }

    fn new_page(&mut self) {
        self.pages.push(Vec::new());
        self.y = MARGIN_MM;
    }

    fn line(&mut self, font: Font, size: f32, indent_mm: f32, text: String) {
        if self.y > PAGE_BOTTOM_MM {
            self.new_page();
        }
        let run = TextRun {
            font,
            size,
            x_mm: MARGIN_MM + indent_mm,
            y_mm: self.y,
            text,
        };
        if let Some(page) = self.pages.last_mut() {
            page.push(run);
        }
        self.y += LINE_HEIGHT_MM;
    }

    fn block(&mut self, font: Font, size: f32, indent_mm: f32, text: &str) {
        for line in wrap_text(text, max_chars(size, indent_mm)) {
            self.line(font, size, indent_mm, line);
        }
    }

    /// Bulleted item; continuation lines align with the text after the bullet.
    fn bullet(&mut self, text: &str) {
        for (i, line) in wrap_text(text, max_chars(BODY_SIZE, BULLET_INDENT_MM)).into_iter().enumerate() {
            if i == 0 {
                self.line(Font::Regular, BODY_SIZE, 0.0, format!("- {}", line));
            } else {
                self.line(Font::Regular, BODY_SIZE, BULLET_INDENT_MM, line);
            }
        }
    }

    /// Section heading, moved to a fresh page when it would be orphaned at the bottom.
    fn heading(&mut self, text: &str) {
        if self.y > PAGE_BOTTOM_MM - 2.0 * LINE_HEIGHT_MM {
            self.new_page();
        }
        self.block(Font::Bold, HEADING_SIZE, 0.0, text);
        self.space(1.0);
    }

    fn space(&mut self, mm: f32) {
        self.y += mm;
    }
}

/// Characters per line for a font size and indent.
fn max_chars(size: f32, indent_mm: f32) -> usize {
    let width_pt = (PAGE_WIDTH_MM - 2.0 * MARGIN_MM - indent_mm) * MM;
    ((width_pt / (size * AVG_GLYPH_WIDTH)).floor() as usize).max(1)
}

/// Greedy word wrap. Explicit newlines start a new line; words longer than a line
/// are split. Blank input produces no lines.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        let mut current_len = 0;

        for word in paragraph.split_whitespace() {
            let mut chars: Vec<char> = word.chars().collect();

            while chars.len() > max_chars {
                if current_len > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let rest = chars.split_off(max_chars);
                lines.push(chars.into_iter().collect());
                chars = rest;
            }

            let word_len = chars.len();
            if word_len == 0 {
                continue;
            }
            let needed = if current_len == 0 { word_len } else { current_len + 1 + word_len };
            if needed > max_chars {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.extend(chars);
            current_len += word_len;
        }

        if current_len > 0 {
            lines.push(current);
        }
    }

    lines
}

/// WinAnsi byte for a character, if the encoding has one.
///
/// 0xA0..=0xFF match Latin-1; 0x80..=0x9F hold the typographic punctuation
/// (curly quotes, dashes, ellipsis, bullet) and a few extra letters.
fn winansi_byte(ch: char) -> Option<u8> {
    let byte = match ch {
        '\u{A0}'..='\u{FF}' => ch as u32 as u8,
        '\u{20AC}' => 0x80,
        '\u{201A}' => 0x82,
        '\u{0192}' => 0x83,
        '\u{201E}' => 0x84,
        '\u{2026}' => 0x85,
        '\u{2020}' => 0x86,
        '\u{2021}' => 0x87,
        '\u{02C6}' => 0x88,
        '\u{2030}' => 0x89,
        '\u{0160}' => 0x8A,
        '\u{2039}' => 0x8B,
        '\u{0152}' => 0x8C,
        '\u{017D}' => 0x8E,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{02DC}' => 0x98,
        '\u{2122}' => 0x99,
        '\u{0161}' => 0x9A,
        '\u{203A}' => 0x9B,
        '\u{0153}' => 0x9C,
        '\u{017E}' => 0x9E,
        '\u{0178}' => 0x9F,
        _ => return None,
    };
    Some(byte)
}

/// Encode text as the body of a PDF literal string in WinAnsi.
///
/// Delimiters are escaped, non-ASCII characters WinAnsi covers are written as
/// octal escapes, control characters become spaces, and anything else becomes `?`.
fn pdf_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            '\\' => out.push_str("\\\\"),
            c if c.is_ascii_control() => out.push(' '),
            c if c.is_ascii() => out.push(c),
            c => match winansi_byte(c) {
                Some(byte) => out.push_str(&format!("\\{:03o}", byte)),
                None => out.push('?'),
            },
        }
    }
    out
}

fn lay_out(response: &QueryResponse) -> Layout {
    let content = &response.content;
    let mut layout = Layout::new();

    layout.block(Font::Bold, TITLE_SIZE, 0.0, &format!("Info Quest: {}", response.query));
    layout.space(6.0);

    layout.heading("Brief Answer");
    layout.block(Font::Regular, BODY_SIZE, 0.0, &content.brief_answer);
    layout.space(6.0);

    layout.heading("Key Points");
    for point in &content.key_points {
        layout.bullet(point);
    }
    layout.space(6.0);

    layout.heading("Overview");
    for section in &content.overview {
        layout.block(Font::Bold, SUBHEADING_SIZE, 0.0, &section.subtopic);
        layout.block(Font::Regular, BODY_SIZE, 0.0, &section.content);
        layout.space(4.0);
    }
    layout.space(2.0);

    layout.heading("Flashcards");
    for (i, card) in content.flashcards.iter().enumerate() {
        layout.block(Font::Bold, BODY_SIZE, 0.0, &format!("Q{}: {}", i + 1, card.front));
        layout.block(Font::Regular, BODY_SIZE, 0.0, &format!("A: {}", card.back));
        layout.space(2.0);
    }
    layout.space(4.0);

    if let Some(timeline) = content.timeline.as_ref().filter(|t| !t.is_empty()) {
        layout.heading("Timeline");
        for entry in timeline {
            layout.block(Font::Bold, SUBHEADING_SIZE, 0.0, &format!("{} - {}", entry.date, entry.title));
            layout.block(Font::Regular, BODY_SIZE, 0.0, &entry.description);
            layout.space(2.0);
        }
        layout.space(4.0);
    }

    if let Some(facts) = content.did_you_know.as_ref().filter(|f| !f.is_empty()) {
        layout.heading("Did You Know?");
        for fact in facts {
            layout.bullet(fact);
        }
        layout.space(6.0);
    }

    if let Some(map) = content.mind_map.as_ref().filter(|m| !m.nodes.is_empty()) {
        layout.heading("Mind Map");
        for node in &map.nodes {
            layout.bullet(&node.label);
        }
        let connections = map.resolved_connections();
        if !connections.is_empty() {
            layout.space(2.0);
            for (from, to) in connections {
                layout.block(Font::Regular, BODY_SIZE, 0.0, &format!("{} -> {}", from, to));
            }
        }
        layout.space(6.0);
    }

    layout.heading("Sources & Resources");
    for resource in &response.resources {
        layout.bullet(&resource.title);
        layout.block(Font::Regular, FOOTER_SIZE, BULLET_INDENT_MM, &resource.url);
    }

    layout
}

fn text_op(run: &TextRun) -> String {
    format!(
        "BT /{} {} Tf {:.2} {:.2} Td ({}) Tj ET\n",
        run.font.resource(),
        run.size,
        run.x_mm * MM,
        (PAGE_HEIGHT_MM - run.y_mm) * MM,
        pdf_string(&run.text)
    )
}

fn page_stream(runs: &[TextRun], footer: &str) -> String {
    let mut stream: String = runs.iter().map(text_op).collect();

    let footer_width_mm = footer.chars().count() as f32 * FOOTER_SIZE * AVG_GLYPH_WIDTH / MM;
    let footer_run = TextRun {
        font: Font::Regular,
        size: FOOTER_SIZE,
        x_mm: ((PAGE_WIDTH_MM - footer_width_mm) / 2.0).max(MARGIN_MM),
        y_mm: FOOTER_BASELINE_MM,
        text: footer.to_string(),
    };
    stream.push_str("0.5 g\n");
    stream.push_str(&text_op(&footer_run));
    stream.push_str("0 g\n");
    stream
}

/// Serialize numbered objects with a correct cross-reference table.
struct PdfWriter {
    out: Vec<u8>,
    offsets: Vec<usize>,
}

impl PdfWriter {
    fn new() -> Self {
        let mut out = b"%PDF-1.4\n".to_vec();
        out.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");
        PdfWriter { out, offsets: Vec::new() }
    }

    /// Append the next object; objects must be added in number order starting at 1.
    fn object(&mut self, body: &str) {
        self.offsets.push(self.out.len());
        let number = self.offsets.len();
        self.out
            .extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", number, body).as_bytes());
    }

    fn stream(&mut self, content: &str) {
        self.object(&format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            content.len(),
            content
        ));
    }

    fn finish(mut self) -> Vec<u8> {
        let xref_offset = self.out.len();
        let count = self.offsets.len() + 1;

        let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", count);
        for offset in &self.offsets {
            xref.push_str(&format!("{:010} 00000 n \n", offset));
        }
        xref.push_str(&format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            count, xref_offset
        ));

        self.out.extend_from_slice(xref.as_bytes());
        self.out
    }
}

/// Render a query response as PDF bytes.
pub fn render_pdf(response: &QueryResponse, generated_on: NaiveDate) -> Vec<u8> {
    let layout = lay_out(response);
    let page_count = layout.pages.len();
    let date = generated_on.format("%Y-%m-%d");

    // 1 catalog, 2 page tree, 3-4 fonts, then a (page, contents) pair per page.
    let page_object = |i: usize| 5 + 2 * i;
    let kids = (0..page_count)
        .map(|i| format!("{} 0 R", page_object(i)))
        .collect::<Vec<_>>()
        .join(" ");

    let mut writer = PdfWriter::new();
    writer.object("<< /Type /Catalog /Pages 2 0 R >>");
    writer.object(&format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids, page_count));
    writer.object("<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>");
    writer.object("<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>");

    for (i, runs) in layout.pages.iter().enumerate() {
        writer.object(&format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
             /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {} 0 R >>",
            PAGE_WIDTH_MM * MM,
            PAGE_HEIGHT_MM * MM,
            page_object(i) + 1
        ));
        let footer = format!("Info Quest - Generated {} | Page {}/{}", date, i + 1, page_count);
        writer.stream(&page_stream(runs, &footer));
    }

    tracing::debug!(query = %response.query, pages = page_count, "Rendered PDF export");
    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{MindMap, MindMapConnection, MindMapNode, TimelineEntry};
    use crate::generation::Difficulty;
    use crate::normalize::from_search_context;
    use crate::search::SearchResult;

    fn response(query: &str) -> QueryResponse {
        QueryResponse {
            query: query.to_string(),
            difficulty: Difficulty::Medium,
            content: from_search_context(query, ""),
            images: vec![],
            resources: vec![SearchResult {
                title: "Tides (Wikipedia)".to_string(),
                url: "https://en.wikipedia.org/wiki/Tide".to_string(),
                snippet: String::new(),
            }],
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }

    fn contains(pdf: &[u8], needle: &str) -> bool {
        find(pdf, needle.as_bytes()).is_some()
    }

    #[test]
    fn test_document_frame() {
        let pdf = render_pdf(&response("Tides"), date());
        assert!(pdf.starts_with(b"%PDF-1.4\n"));
        assert!(pdf.ends_with(b"%%EOF\n"));
        assert!(contains(&pdf, "/BaseFont /Helvetica "));
        assert!(contains(&pdf, "/BaseFont /Helvetica-Bold"));
        assert!(contains(&pdf, "(Info Quest: Tides) Tj"));
        assert!(contains(&pdf, "(Info Quest - Generated 2024-03-09 | Page 1/1) Tj"));
    }

    #[test]
    fn test_xref_offsets_point_at_objects() {
        let pdf = render_pdf(&response("Tides"), date());

        let marker = find(&pdf, b"startxref\n").unwrap();
        let tail = std::str::from_utf8(&pdf[marker + "startxref\n".len()..]).unwrap();
        let xref_offset: usize = tail.lines().next().unwrap().parse().unwrap();
        assert!(pdf[xref_offset..].starts_with(b"xref\n"));

        let table = std::str::from_utf8(&pdf[xref_offset..]).unwrap();
        let entries: Vec<&str> = table
            .lines()
            .skip(3)
            .take_while(|l| l.ends_with(" n "))
            .collect();
        assert!(entries.len() >= 6);

        for (i, entry) in entries.iter().enumerate() {
            let offset: usize = entry[..10].parse().unwrap();
            let expected = format!("{} 0 obj\n", i + 1);
            assert!(pdf[offset..].starts_with(expected.as_bytes()), "object {}", i + 1);
        }
    }

    #[test]
    fn test_sections_are_rendered() {
        let mut r = response("Tides");
        r.content.key_points = vec!["The Moon pulls the oceans".to_string()];
        r.content.timeline = Some(vec![TimelineEntry {
            date: "1687".to_string(),
            title: "Principia".to_string(),
            description: "Newton explains tides.".to_string(),
        }]);
        r.content.did_you_know = Some(vec!["The Bay of Fundy has huge tides".to_string()]);
        r.content.mind_map = Some(MindMap {
            nodes: vec![
                MindMapNode { id: "1".into(), label: "Moon".into() },
                MindMapNode { id: "2".into(), label: "Ocean".into() },
            ],
            connections: vec![
                MindMapConnection { from: "1".into(), to: "2".into() },
                MindMapConnection { from: "1".into(), to: "7".into() },
            ],
        });

        let pdf = render_pdf(&r, date());
        for needle in [
            "(Brief Answer) Tj",
            "(- The Moon pulls the oceans) Tj",
            "(Search Results) Tj",
            "(Flashcards) Tj",
            "(1687 - Principia) Tj",
            "(Did You Know?) Tj",
            "(Moon -> Ocean) Tj",
            "(Sources & Resources) Tj",
            "(- Tides \\(Wikipedia\\)) Tj",
        ] {
            assert!(contains(&pdf, needle), "missing {needle}");
        }
        assert!(!contains(&pdf, "-> 7"));
    }

    #[test]
    fn test_absent_optional_sections_are_skipped() {
        let pdf = render_pdf(&response("Tides"), date());
        assert!(!contains(&pdf, "(Timeline) Tj"));
        assert!(!contains(&pdf, "(Did You Know?) Tj"));
        assert!(!contains(&pdf, "(Mind Map) Tj"));
    }

    #[test]
    fn test_long_content_paginates() {
        let mut r = response("Tides");
        r.content.key_points = (0..120).map(|i| format!("Point number {i} about tides")).collect();

        let pdf = render_pdf(&r, date());
        assert!(!contains(&pdf, "/Count 1 "));
        assert!(contains(&pdf, "| Page 1/"));
        assert!(contains(&pdf, "| Page 3/"));
        assert!(contains(&pdf, "(- Point number 119 about tides) Tj"));
    }

    #[test]
    fn test_pdf_string_encoding() {
        assert_eq!(pdf_string("a(b)c\\"), "a\\(b\\)c\\\\");
        assert_eq!(pdf_string("caf\u{e9}"), "caf\\351");
        assert_eq!(pdf_string("\u{4e2d}\u{2603}x"), "??x");
        assert_eq!(pdf_string("\u{00A0}\u{00FF}"), "\\240\\377");
        assert_eq!(pdf_string("tab\there"), "tab here");
    }

    #[test]
    fn test_typographic_punctuation_uses_winansi() {
        assert_eq!(
            pdf_string("The Moon\u{2019}s pull \u{2014} \u{201C}tides\u{201D} \u{2026} \u{2022}"),
            "The Moon\\222s pull \\227 \\223tides\\224 \\205 \\225"
        );
        assert_eq!(pdf_string("\u{20AC}5 \u{2013} \u{2122}"), "\\2005 \\226 \\231");
        assert_eq!(pdf_string("\u{0178}"), "\\237");

        let mut r = response("Tides");
        r.content.brief_answer = "The Moon\u{2019}s pull".to_string();
        assert!(contains(&render_pdf(&r, date()), "(The Moon\\222s pull) Tj"));
    }

    #[test]
    fn test_wrap_text() {
        assert_eq!(wrap_text("one two three four", 9), vec!["one two", "three", "four"]);
        assert_eq!(wrap_text("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap_text("first\nsecond", 80), vec!["first", "second"]);
        assert!(wrap_text("   ", 10).is_empty());
    }
}

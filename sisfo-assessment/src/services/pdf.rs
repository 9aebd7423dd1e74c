//! Minimal PDF 1.4 rendering of a report card
//!
//! Text-only layout with the standard Helvetica fonts, so no font files are
//! embedded. Long cards continue on further A4 pages.

use sisfo_common::models::ReportCard;

const PAGE_WIDTH: u32 = 595;
const PAGE_HEIGHT: u32 = 842;
const TOP: f64 = 790.0;
const LINE_HEIGHT: f64 = 16.0;
const ROWS_PER_PAGE: usize = 44;

/// Everything printed on the card besides the card itself
///
/// `header_text` and `footer_text` come from the tenant's default template
/// and are skipped when empty.
#[derive(Debug, Clone, Copy)]
pub struct CardHeader<'a> {
    pub student_name: &'a str,
    pub class_name: &'a str,
    pub semester_name: &'a str,
    pub header_text: &'a str,
    pub footer_text: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq)]
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
struct Row {
    font: Font,
    size: u32,
    cells: Vec<(f64, String)>,
}

impl Row {
    fn text(font: Font, size: u32, text: impl Into<String>) -> Self {
        Self {
            font,
            size,
            cells: vec![(50.0, text.into())],
        }
    }

    fn columns(font: Font, cells: [String; 5]) -> Self {
        let xs = [50.0, 300.0, 360.0, 430.0, 490.0];
        Self {
            font,
            size: 10,
            cells: xs.into_iter().zip(cells).collect(),
        }
    }

    fn blank() -> Self {
        Self::text(Font::Regular, 10, "")
    }
}

/// Render `card` to PDF bytes starting with `%PDF`
pub fn render_report_card(card: &ReportCard, header: CardHeader<'_>) -> Vec<u8> {
    render_rows(&layout(card, header))
}

fn layout(card: &ReportCard, header: CardHeader<'_>) -> Vec<Row> {
    let mut rows = Vec::new();
    if !header.header_text.is_empty() {
        rows.push(Row::text(Font::Bold, 12, header.header_text));
    }
    rows.extend([
        Row::text(Font::Bold, 16, "Report Card"),
        Row::blank(),
        Row::text(Font::Regular, 11, format!("Student: {}", header.student_name)),
        Row::text(Font::Regular, 11, format!("Class: {}", header.class_name)),
        Row::text(Font::Regular, 11, format!("Semester: {}", header.semester_name)),
        Row::text(Font::Regular, 11, format!("Status: {}", card.status)),
        Row::blank(),
        Row::columns(
            Font::Bold,
            [
                "Subject".into(),
                "Credit".into(),
                "Score".into(),
                "Grade".into(),
                "Points".into(),
            ],
        ),
    ]);

    for d in &card.details {
        rows.push(Row::columns(
            Font::Regular,
            [
                d.subject_name.clone(),
                d.credit.to_string(),
                format!("{:.2}", d.final_score),
                d.grade_letter.clone(),
                format!("{:.2}", d.points),
            ],
        ));
    }

    rows.push(Row::blank());
    rows.push(Row::text(Font::Bold, 11, format!("Total credits: {}", card.total_credits)));
    rows.push(Row::text(Font::Bold, 11, format!("GPA: {:.2}", card.gpa)));
    rows.push(Row::text(
        Font::Regular,
        10,
        format!(
            "Attendance: {} present, {} absent",
            card.attendance_summary.present, card.attendance_summary.absent
        ),
    ));
    if !card.comments.is_empty() {
        rows.push(Row::text(Font::Regular, 10, format!("Comments: {}", card.comments)));
    }
    if let Some(at) = card.generated_at {
        rows.push(Row::text(
            Font::Regular,
            9,
            format!("Generated {}", at.format("%Y-%m-%d %H:%M UTC")),
        ));
    }
    if !header.footer_text.is_empty() {
        rows.push(Row::blank());
        rows.push(Row::text(Font::Regular, 9, header.footer_text));
    }
    rows
}

/// Escape a string for a PDF literal; non-ASCII becomes `?`
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            ' '..='~' => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

fn content_stream(rows: &[Row]) -> String {
    let mut content = String::new();
    for (i, row) in rows.iter().enumerate() {
        let y = TOP - LINE_HEIGHT * i as f64;
        for (x, text) in &row.cells {
            if text.is_empty() {
                continue;
            }
            content.push_str(&format!(
                "BT /{} {} Tf {:.0} {:.0} Td ({}) Tj ET\n",
                row.font.resource(),
                row.size,
                x,
                y,
                escape(text)
            ));
        }
    }
    content
}

/// Object writer tracking byte offsets for the xref table
struct PdfWriter {
    out: String,
    offsets: Vec<usize>,
}

impl PdfWriter {
    fn new() -> Self {
        Self {
            out: String::from("%PDF-1.4\n"),
            offsets: Vec::new(),
        }
    }

    /// Objects must be written in id order starting at 1
    fn object(&mut self, body: &str) {
        self.offsets.push(self.out.len());
        let id = self.offsets.len();
        self.out.push_str(&format!("{} 0 obj\n{}\nendobj\n", id, body));
    }

    fn finish(mut self) -> Vec<u8> {
        let xref_offset = self.out.len();
        let count = self.offsets.len() + 1;
        self.out.push_str(&format!("xref\n0 {}\n0000000000 65535 f \n", count));
        for offset in &self.offsets {
            self.out.push_str(&format!("{:010} 00000 n \n", offset));
        }
        self.out.push_str(&format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            count, xref_offset
        ));
        self.out.into_bytes()
    }
}

fn render_rows(rows: &[Row]) -> Vec<u8> {
    let pages: Vec<&[Row]> = if rows.is_empty() {
        vec![rows]
    } else {
        rows.chunks(ROWS_PER_PAGE).collect()
    };

    // 1 catalog, 2 page tree, 3-4 fonts, then a page and its content per page
    let page_id = |i: usize| 5 + 2 * i;
    let kids: Vec<String> = (0..pages.len()).map(|i| format!("{} 0 R", page_id(i))).collect();

    let mut pdf = PdfWriter::new();
    pdf.object("<< /Type /Catalog /Pages 2 0 R >>");
    pdf.object(&format!(
        "<< /Type /Pages /Kids [{}] /Count {} >>",
        kids.join(" "),
        pages.len()
    ));
    pdf.object("<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>");
    pdf.object("<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold >>");

    for (i, page_rows) in pages.iter().enumerate() {
        pdf.object(&format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
             /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {} 0 R >>",
            PAGE_WIDTH,
            PAGE_HEIGHT,
            page_id(i) + 1
        ));
        let content = content_stream(page_rows);
        pdf.object(&format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            content.len(),
            content
        ));
    }

    pdf.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sisfo_common::models::{ReportCardDetail, ReportCardStatus};
    use uuid::Uuid;

    fn card_with_subjects(n: usize) -> ReportCard {
        let mut card = ReportCard::new("t1", Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        card.status = ReportCardStatus::Generated;
        card.gpa = 3.5;
        card.total_credits = 3 * n as i64;
        card.details = (0..n)
            .map(|i| ReportCardDetail {
                id: Uuid::new_v4(),
                report_card_id: card.id,
                subject_id: Uuid::new_v4(),
                subject_name: format!("Subject {}", i),
                credit: 3,
                final_score: 85.0,
                grade_letter: "B".into(),
                points: 3.0,
                comments: String::new(),
            })
            .collect();
        card
    }

    fn header() -> CardHeader<'static> {
        CardHeader {
            student_name: "Siti (Rahma)",
            class_name: "X IPA 1",
            semester_name: "Ganjil",
            header_text: "",
            footer_text: "",
        }
    }

    fn text(bytes: &[u8]) -> String {
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_framing() {
        let bytes = render_report_card(&card_with_subjects(2), header());
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.ends_with(b"%%EOF\n"));

        let pdf = text(&bytes);
        assert!(pdf.contains("(Subject 1) Tj"));
        assert!(pdf.contains("(GPA: 3.50) Tj"));
        assert!(pdf.contains("/Count 1"));
    }

    #[test]
    fn test_escaping() {
        assert_eq!(escape("a(b)c\\"), "a\\(b\\)c\\\\");
        assert_eq!(escape("Ümit"), "?mit");

        let pdf = text(&render_report_card(&card_with_subjects(1), header()));
        assert!(pdf.contains("(Student: Siti \\(Rahma\\)) Tj"));
    }

    #[test]
    fn test_xref_offsets_point_at_objects() {
        let pdf = text(&render_report_card(&card_with_subjects(3), header()));

        let startxref = pdf.rfind("startxref\n").unwrap() + "startxref\n".len();
        let xref_offset: usize = pdf[startxref..].lines().next().unwrap().parse().unwrap();
        assert!(pdf[xref_offset..].starts_with("xref\n"));

        let entries: Vec<&str> = pdf[xref_offset..].lines().skip(3).take(6).collect();
        for (i, entry) in entries.iter().enumerate() {
            let offset: usize = entry[..10].parse().unwrap();
            assert!(pdf[offset..].starts_with(&format!("{} 0 obj", i + 1)));
        }
    }

    #[test]
    fn test_template_header_and_footer() {
        let plain = text(&render_report_card(&card_with_subjects(1), header()));
        assert!(!plain.contains("SMA Negeri 1"));

        let branded = CardHeader {
            header_text: "SMA Negeri 1 Bandung",
            footer_text: "Kepala Sekolah",
            ..header()
        };
        let pdf = text(&render_report_card(&card_with_subjects(1), branded));
        let head = pdf.find("(SMA Negeri 1 Bandung) Tj").unwrap();
        let title = pdf.find("(Report Card) Tj").unwrap();
        let foot = pdf.find("(Kepala Sekolah) Tj").unwrap();
        assert!(head < title);
        assert!(pdf.find("(GPA: 3.50) Tj").unwrap() < foot);
    }

    #[test]
    fn test_long_card_spans_pages() {
        let pdf = text(&render_report_card(&card_with_subjects(60), header()));
        assert!(pdf.contains("/Count 2"));
        assert!(pdf.contains("(Subject 59) Tj"));
    }

    #[test]
    fn test_stream_length_matches_content() {
        let pdf = text(&render_report_card(&card_with_subjects(1), header()));
        let start = pdf.find("/Length ").unwrap() + "/Length ".len();
        let len: usize = pdf[start..].split_whitespace().next().unwrap().parse().unwrap();
        let body_start = pdf.find("stream\n").unwrap() + "stream\n".len();
        assert_eq!(&pdf[body_start + len..body_start + len + "\nendstream".len()], "\nendstream");
    }
}

//! WordprocessingML document renderer.
//!
//! Produces a single-file Word 2003 XML document (no container archive)
//! using `quick-xml`'s writer API. Pictures are embedded as base64
//! `w:binData` elements referenced by VML shapes, so the output stays one
//! self-contained byte stream.

use std::io::Cursor;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use muster_core::record::SessionRecord;
use quick_xml::{
  Writer,
  events::{BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event},
};

use crate::{
  ArtifactSource, Rendered, RenderWarning, ReportMeta,
  media::{ArtifactKind, ImageInfo, classify, sniff},
};

const NS_WORDML: &str = "http://schemas.microsoft.com/office/word/2003/wordml";
const NS_VML: &str = "urn:schemas-microsoft-com:vml";

/// Display width of an embedded photo, in points (3 inches).
const PHOTO_WIDTH_PT: f64 = 216.0;
/// Display width of an embedded attendance-sheet image, in points (4 inches).
const SHEET_WIDTH_PT: f64 = 288.0;
/// Inlined sheet sub-tables are cut off after this many data rows.
const MAX_SHEET_ROWS: usize = 50;

// ─── Document builder ────────────────────────────────────────────────────────

/// Incremental WordprocessingML writer.
///
/// Writing to an in-memory cursor cannot fail, so the event calls unwrap.
struct DocBuilder {
  writer:    Writer<Cursor<Vec<u8>>>,
  art_count: usize,
}

impl DocBuilder {
  fn new() -> Self {
    let cursor = Cursor::new(Vec::new());
    let mut writer = Writer::new(cursor);

    writer
      .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
      .unwrap();
    writer
      .write_event(Event::PI(BytesPI::new(
        "mso-application progid=\"Word.Document\"",
      )))
      .unwrap();

    let mut root = BytesStart::new("w:wordDocument");
    root.push_attribute(("xmlns:w", NS_WORDML));
    root.push_attribute(("xmlns:v", NS_VML));
    writer.write_event(Event::Start(root)).unwrap();
    writer
      .write_event(Event::Start(BytesStart::new("w:body")))
      .unwrap();

    Self { writer, art_count: 0 }
  }

  fn start(&mut self, tag: &str) {
    self.writer.write_event(Event::Start(BytesStart::new(tag))).unwrap();
  }

  fn end(&mut self, tag: &str) {
    self.writer.write_event(Event::End(BytesEnd::new(tag))).unwrap();
  }

  fn empty_with_attr(&mut self, tag: &str, attrs: &[(&str, &str)]) {
    let mut e = BytesStart::new(tag);
    for (k, v) in attrs {
      e.push_attribute((*k, *v));
    }
    self.writer.write_event(Event::Empty(e)).unwrap();
  }

  fn text(&mut self, text: &str) {
    self.writer.write_event(Event::Text(BytesText::new(text))).unwrap();
  }

  /// `<w:p><w:r><w:t>text</w:t></w:r></w:p>`
  fn paragraph(&mut self, text: &str) {
    self.start("w:p");
    self.run(text);
    self.end("w:p");
  }

  fn run(&mut self, text: &str) {
    self.start("w:r");
    self.start("w:t");
    self.text(text);
    self.end("w:t");
    self.end("w:r");
  }

  /// A paragraph styled `Heading1`..`Heading3`.
  fn heading(&mut self, level: u8, text: &str) {
    self.start("w:p");
    self.start("w:pPr");
    self.empty_with_attr("w:pStyle", &[("w:val", &format!("Heading{level}"))]);
    self.end("w:pPr");
    self.run(text);
    self.end("w:p");
  }

  fn labeled(&mut self, label: &str, value: &str) {
    self.paragraph(&format!("{label}: {value}"));
  }

  /// A plain table; the first row is rendered the same as the rest.
  fn table(&mut self, rows: &[Vec<String>]) {
    self.start("w:tbl");
    for row in rows {
      self.start("w:tr");
      for cell in row {
        self.start("w:tc");
        self.paragraph(cell);
        self.end("w:tc");
      }
      self.end("w:tr");
    }
    self.end("w:tbl");
  }

  /// Embed one picture at a fixed display width, preserving aspect ratio.
  fn picture(&mut self, info: ImageInfo, bytes: &[u8], display_width_pt: f64) {
    self.art_count += 1;
    let name = format!("wordml://art{:04}.{}", self.art_count, info.format.extension());
    let height_pt =
      display_width_pt * f64::from(info.height) / f64::from(info.width);
    let style = format!("width:{display_width_pt:.0}pt;height:{height_pt:.0}pt");

    self.start("w:p");
    self.start("w:r");
    self.start("w:pict");

    let mut bin = BytesStart::new("w:binData");
    bin.push_attribute(("w:name", name.as_str()));
    self.writer.write_event(Event::Start(bin)).unwrap();
    self.text(&B64.encode(bytes));
    self.end("w:binData");

    let mut shape = BytesStart::new("v:shape");
    shape.push_attribute(("style", style.as_str()));
    self.writer.write_event(Event::Start(shape)).unwrap();
    self.empty_with_attr("v:imagedata", &[("src", name.as_str())]);
    self.end("v:shape");

    self.end("w:pict");
    self.end("w:r");
    self.end("w:p");
  }

  fn finish(mut self) -> Vec<u8> {
    self.end("w:body");
    self.end("w:wordDocument");
    self.writer.into_inner().into_inner()
  }
}

// ─── Rendering ───────────────────────────────────────────────────────────────

/// Render `records` into a WordprocessingML document.
///
/// Stateless and deterministic: the generation timestamp comes from `meta`.
/// Artifact failures never abort the render; each produces an inline warning
/// line and an entry in [`Rendered::warnings`].
pub fn render_document(
  records: &[SessionRecord],
  meta: &ReportMeta,
  artifacts: &dyn ArtifactSource,
) -> Rendered {
  let mut doc = DocBuilder::new();
  let mut warnings: Vec<RenderWarning> = Vec::new();

  doc.heading(1, &meta.title);
  doc.heading(2, "Intervention session report");
  doc.labeled("Filters", &meta.filter);
  doc.labeled(
    "Generated",
    &meta.generated_at.format("%Y-%m-%d %H:%M").to_string(),
  );

  if records.is_empty() {
    doc.paragraph("no data for the selected filters");
    return Rendered { bytes: doc.finish(), warnings };
  }

  // ── Summary ─────────────────────────────────────────────────────────────
  let invited: u64 = records.iter().map(|r| u64::from(r.invited_count)).sum();
  let attended: u64 = records.iter().map(|r| u64::from(r.attended_count)).sum();
  // Mean of the per-record computed ratios, not the ratio of the sums.
  let mean_ratio: f64 = records
    .iter()
    .map(SessionRecord::attendance_ratio)
    .sum::<f64>()
    / records.len() as f64;

  doc.heading(2, "Summary");
  doc.table(&[
    vec!["Sessions".into(), records.len().to_string()],
    vec!["Total invited".into(), invited.to_string()],
    vec!["Total attended".into(), attended.to_string()],
    vec!["Mean attendance".into(), format!("{mean_ratio:.2}%")],
    vec!["Filters".into(), meta.filter.clone()],
  ]);

  // ── Detail ──────────────────────────────────────────────────────────────
  doc.heading(2, "Sessions");
  for (ordinal, record) in records.iter().enumerate() {
    doc.heading(3, &format!("Session {}: {}", ordinal + 1, record.subject));
    render_scalars(&mut doc, record);
    render_photo(&mut doc, record, ordinal, artifacts, &mut warnings);
    render_sheets(&mut doc, record, ordinal, artifacts, &mut warnings);
  }

  // ── Conclusion ──────────────────────────────────────────────────────────
  doc.heading(2, "Conclusion");
  doc.paragraph(&format!(
    "Mean attendance for this selection: {mean_ratio:.2}%."
  ));

  Rendered { bytes: doc.finish(), warnings }
}

fn render_scalars(doc: &mut DocBuilder, record: &SessionRecord) {
  let date = record
    .date
    .map(|d| d.format("%Y-%m-%d").to_string())
    .unwrap_or_else(|| "unknown".to_string());
  doc.labeled("Date", &date);
  if let Some(grade) = record.grade {
    doc.labeled("Grade", &grade.to_string());
  }
  doc.labeled("Subject", &record.subject);
  doc.labeled("Theme", &record.theme);
  if let Some(start) = record.start_time {
    doc.labeled("Start time", &start.format("%H:%M").to_string());
  }
  if let Some(end) = record.end_time {
    doc.labeled("End time", &end.format("%H:%M").to_string());
  }
  doc.labeled("Invited", &record.invited_count.to_string());
  doc.labeled("Attended", &record.attended_count.to_string());
  doc.labeled("Facilitator", &record.facilitator);
  doc.labeled("Attendance", &format!("{:.2}%", record.attendance_ratio()));
}

fn render_photo(
  doc: &mut DocBuilder,
  record: &SessionRecord,
  ordinal: usize,
  artifacts: &dyn ArtifactSource,
  warnings: &mut Vec<RenderWarning>,
) {
  let Some(photo_ref) = &record.photo_ref else {
    doc.paragraph("no photo attached");
    return;
  };
  match artifacts.read(photo_ref) {
    Ok(bytes) => match sniff(&bytes) {
      Some(info) => {
        doc.paragraph("Photo:");
        doc.picture(info, &bytes, PHOTO_WIDTH_PT);
      }
      None => {
        warn(doc, warnings, ordinal, photo_ref, "not a readable image");
        doc.paragraph("no photo attached");
      }
    },
    Err(e) => {
      warn(doc, warnings, ordinal, photo_ref, &e.to_string());
      doc.paragraph("no photo attached");
    }
  }
}

fn render_sheets(
  doc: &mut DocBuilder,
  record: &SessionRecord,
  ordinal: usize,
  artifacts: &dyn ArtifactSource,
  warnings: &mut Vec<RenderWarning>,
) {
  if record.sheet_refs.is_empty() {
    doc.paragraph("no attendance sheet attached");
    return;
  }

  for sheet_ref in &record.sheet_refs {
    let file_name = sheet_ref.rsplit('/').next().unwrap_or(sheet_ref);
    match classify(sheet_ref) {
      ArtifactKind::Image => match artifacts.read(sheet_ref) {
        Ok(bytes) => match sniff(&bytes) {
          Some(info) => {
            doc.paragraph("Attendance sheet (image):");
            doc.picture(info, &bytes, SHEET_WIDTH_PT);
          }
          None => warn(doc, warnings, ordinal, sheet_ref, "not a readable image"),
        },
        Err(e) => warn(doc, warnings, ordinal, sheet_ref, &e.to_string()),
      },

      ArtifactKind::Delimited => match artifacts.read(sheet_ref) {
        Ok(bytes) => {
          let text = String::from_utf8_lossy(&bytes);
          match muster_table::parse(&text) {
            Ok(table) => render_sheet_table(doc, file_name, &table),
            Err(e) => warn(doc, warnings, ordinal, sheet_ref, &e.to_string()),
          }
        }
        Err(e) => warn(doc, warnings, ordinal, sheet_ref, &e.to_string()),
      },

      // Content of unrecognised kinds is never inlined.
      ArtifactKind::Other => {
        doc.labeled("Attendance sheet file", file_name);
      }
    }
  }
}

fn render_sheet_table(doc: &mut DocBuilder, file_name: &str, table: &muster_table::Table) {
  doc.labeled("Attendance sheet", file_name);
  let total = table.rows.len();
  let shown = total.min(MAX_SHEET_ROWS);

  let mut rows: Vec<Vec<String>> = Vec::with_capacity(shown + 1);
  rows.push(table.header.clone());
  rows.extend(table.rows.iter().take(shown).cloned());
  doc.table(&rows);

  if total > shown {
    doc.paragraph(&format!(
      "truncated: showing first {shown} of {total} rows"
    ));
  }
}

fn warn(
  doc: &mut DocBuilder,
  warnings: &mut Vec<RenderWarning>,
  ordinal: usize,
  artifact: &str,
  reason: &str,
) {
  let warning = RenderWarning {
    ordinal,
    artifact: artifact.to_string(),
    reason: reason.to_string(),
  };
  tracing::warn!(%warning, "artifact embedding failed");
  doc.paragraph(&format!("warning: {warning}"));
  warnings.push(warning);
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::collections::HashMap;

  use chrono::{TimeZone as _, Utc};
  use muster_core::record::Grade;

  use super::*;

  /// In-memory artifact source for renderer tests.
  struct MapSource(HashMap<String, Vec<u8>>);

  impl ArtifactSource for MapSource {
    fn read(&self, artifact_ref: &str) -> std::io::Result<Vec<u8>> {
      self
        .0
        .get(artifact_ref)
        .cloned()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "missing"))
    }
  }

  fn meta() -> ReportMeta {
    ReportMeta {
      title:        "Saul Damon High School".into(),
      filter:       "window: weekly".into(),
      generated_at: Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap(),
    }
  }

  fn record() -> SessionRecord {
    SessionRecord {
      date:           Some("2024-03-15".parse().unwrap()),
      grade:          Some(Grade::Grade10),
      subject:        "Mathematics".into(),
      theme:          "Fractions".into(),
      start_time:     None,
      end_time:       None,
      invited_count:  20,
      attended_count: 15,
      facilitator:    "A. Botha".into(),
      photo_ref:      None,
      sheet_refs:     vec![],
    }
  }

  fn empty_source() -> MapSource {
    MapSource(HashMap::new())
  }

  /// A PNG header that `media::sniff` accepts.
  fn png() -> Vec<u8> {
    crate::media::tests::png_bytes(40, 30)
  }

  fn body(rendered: &Rendered) -> String {
    String::from_utf8(rendered.bytes.clone()).unwrap()
  }

  // ── Empty input ─────────────────────────────────────────────────────────

  #[test]
  fn empty_input_renders_no_data_document() {
    let out = render_document(&[], &meta(), &empty_source());
    let xml = body(&out);
    assert!(xml.contains("no data for the selected filters"));
    assert!(!xml.contains("Summary"));
    assert!(!xml.contains("Session 1"));
    assert!(out.warnings.is_empty());
  }

  #[test]
  fn empty_render_is_deterministic() {
    let a = render_document(&[], &meta(), &empty_source());
    let b = render_document(&[], &meta(), &empty_source());
    assert_eq!(a.bytes, b.bytes);
  }

  // ── Summary ─────────────────────────────────────────────────────────────

  #[test]
  fn summary_uses_mean_of_ratios_not_ratio_of_sums() {
    let mut a = record();
    a.invited_count = 10;
    a.attended_count = 10; // 100.00
    let mut b = record();
    b.invited_count = 100;
    b.attended_count = 0; // 0.00
    let out = render_document(&[a, b], &meta(), &empty_source());
    let xml = body(&out);
    // Mean of ratios is 50.00; ratio of sums would be 10/110 = 9.09.
    assert!(xml.contains("50.00%"), "xml: {xml}");
    assert!(!xml.contains("9.09%"));
  }

  #[test]
  fn header_carries_filter_and_timestamp() {
    let out = render_document(&[record()], &meta(), &empty_source());
    let xml = body(&out);
    assert!(xml.contains("Filters: window: weekly"));
    assert!(xml.contains("Generated: 2024-03-15 12:00"));
  }

  // ── Photos ──────────────────────────────────────────────────────────────

  #[test]
  fn missing_photo_ref_gets_placeholder() {
    let out = render_document(&[record()], &meta(), &empty_source());
    assert!(body(&out).contains("no photo attached"));
    assert!(out.warnings.is_empty());
  }

  #[test]
  fn readable_photo_is_embedded() {
    let mut r = record();
    r.photo_ref = Some("photos/x.png".into());
    let source = MapSource(HashMap::from([("photos/x.png".to_string(), png())]));
    let out = render_document(&[r], &meta(), &source);
    let xml = body(&out);
    assert!(xml.contains("w:binData"), "xml: {xml}");
    assert!(xml.contains(&B64.encode(png())));
    assert!(out.warnings.is_empty());
  }

  #[test]
  fn unreadable_photo_warns_and_continues() {
    let mut r = record();
    r.photo_ref = Some("photos/x.png".into());
    // Ref present but the bytes are not an image.
    let source =
      MapSource(HashMap::from([("photos/x.png".to_string(), b"junk".to_vec())]));
    let out = render_document(&[r], &meta(), &source);
    assert_eq!(out.warnings.len(), 1);
    assert_eq!(out.warnings[0].artifact, "photos/x.png");
    let xml = body(&out);
    assert!(xml.contains("no photo attached"));
    assert!(xml.contains("Conclusion"), "render did not run to completion");
  }

  // ── Sheets ──────────────────────────────────────────────────────────────

  fn sheet_csv(rows: usize) -> Vec<u8> {
    let mut text = String::from("name,grade\n");
    for i in 0..rows {
      text.push_str(&format!("Learner {i},10\n"));
    }
    text.into_bytes()
  }

  #[test]
  fn long_sheet_truncates_at_fifty_rows() {
    let mut r = record();
    r.sheet_refs = vec!["sheets/big.csv".into()];
    let source =
      MapSource(HashMap::from([("sheets/big.csv".to_string(), sheet_csv(120))]));
    let out = render_document(&[r], &meta(), &source);
    let xml = body(&out);
    assert!(xml.contains("truncated: showing first 50 of 120 rows"));
    assert!(xml.contains("Learner 49"));
    assert!(!xml.contains("Learner 50"), "row past the cutoff leaked");
  }

  #[test]
  fn short_sheet_embeds_fully_without_notice() {
    let mut r = record();
    r.sheet_refs = vec!["sheets/small.csv".into()];
    let source =
      MapSource(HashMap::from([("sheets/small.csv".to_string(), sheet_csv(10))]));
    let out = render_document(&[r], &meta(), &source);
    let xml = body(&out);
    assert!(xml.contains("Learner 9"));
    assert!(!xml.contains("truncated"));
  }

  #[test]
  fn image_sheet_is_embedded() {
    let mut r = record();
    r.sheet_refs = vec!["sheets/scan.png".into()];
    let source =
      MapSource(HashMap::from([("sheets/scan.png".to_string(), png())]));
    let out = render_document(&[r], &meta(), &source);
    assert!(body(&out).contains("Attendance sheet (image):"));
    assert!(out.warnings.is_empty());
  }

  #[test]
  fn unrecognised_sheet_kind_referenced_by_name_only() {
    let mut r = record();
    r.sheet_refs = vec!["sheets/scan.pdf".into()];
    let source = MapSource(HashMap::from([(
      "sheets/scan.pdf".to_string(),
      b"%PDF-1.4 secret content".to_vec(),
    )]));
    let out = render_document(&[r], &meta(), &source);
    let xml = body(&out);
    assert!(xml.contains("Attendance sheet file: scan.pdf"));
    assert!(!xml.contains("secret content"), "pdf content must not inline");
    assert!(out.warnings.is_empty());
  }

  #[test]
  fn missing_sheet_file_warns_and_continues() {
    let mut r = record();
    r.sheet_refs = vec!["sheets/gone.csv".into()];
    let out = render_document(&[r], &meta(), &empty_source());
    assert_eq!(out.warnings.len(), 1);
    assert!(body(&out).contains("Conclusion"));
  }

  // ── Escaping ────────────────────────────────────────────────────────────

  #[test]
  fn xml_special_characters_are_escaped() {
    let mut r = record();
    r.theme = "Fractions < decimals & \"percentages\"".into();
    let out = render_document(&[r], &meta(), &empty_source());
    let xml = body(&out);
    assert!(xml.contains("Fractions &lt; decimals &amp;"));
  }
}

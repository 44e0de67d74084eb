//! Shared OOXML plumbing: units, escaping, embedded pictures and zip packaging.
//!
//! Packages are written with fixed entry timestamps so that saving unchanged
//! content twice yields identical bytes.

use chrono::{Local, NaiveDateTime, Utc};
use image::ImageFormat;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::ArtifactError;

pub const EMU_PER_INCH: i64 = 914_400;

pub const RELS_CONTENT_TYPE: &str = "application/vnd.openxmlformats-package.relationships+xml";

pub const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
pub const REL_CORE_PROPERTIES: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
pub const REL_IMAGE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

pub fn inches(value: f64) -> i64 {
    (value * EMU_PER_INCH as f64).round() as i64
}

pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

/// Scale `width`×`height` pixels to fill the `max_w`×`max_h` EMU box,
/// keeping the aspect ratio.
pub fn fit_within(width: u32, height: u32, max_w: i64, max_h: i64) -> (i64, i64) {
    let aspect = f64::from(width) / f64::from(height);
    let (max_w, max_h) = (max_w as f64, max_h as f64);
    if max_w / aspect <= max_h {
        (max_w.round() as i64, (max_w / aspect).round() as i64)
    } else {
        ((max_h * aspect).round() as i64, max_h.round() as i64)
    }
}

/// A picture ready to embed: PNG bytes plus pixel dimensions.
#[derive(Debug, Clone)]
pub struct EmbeddedImage {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl EmbeddedImage {
    /// Read and decode once; non-PNG sources are re-encoded.
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let bytes = std::fs::read(path)
            .map_err(|e| ArtifactError::Image(format!("{}: {}", path.display(), e)))?;
        let decoded = image::load_from_memory(&bytes)
            .map_err(|e| ArtifactError::Image(format!("{}: {}", path.display(), e)))?;

        let (width, height) = (decoded.width(), decoded.height());
        if width == 0 || height == 0 {
            return Err(ArtifactError::Image(format!(
                "{}: empty picture",
                path.display()
            )));
        }

        let png = if image::guess_format(&bytes).ok() == Some(ImageFormat::Png) {
            bytes
        } else {
            let mut buf = Cursor::new(Vec::new());
            decoded
                .write_to(&mut buf, ImageFormat::Png)
                .map_err(|e| ArtifactError::Image(format!("{}: {}", path.display(), e)))?;
            buf.into_inner()
        };

        Ok(Self { png, width, height })
    }
}

/// Fail early if `path` can never hold a file.
pub fn check_output_path(path: &Path) -> Result<(), ArtifactError> {
    if path.is_dir() {
        return Err(ArtifactError::Init(format!(
            "{} is a directory",
            path.display()
        )));
    }
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.is_dir() => Err(
            ArtifactError::Init(format!("{} does not exist", parent.display())),
        ),
        _ => Ok(()),
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    path.with_file_name(name)
}

/// Write every part into a zip at `path`, replacing any previous file.
pub fn write_package(path: &Path, parts: &[(String, Vec<u8>)]) -> Result<(), ArtifactError> {
    let staging = partial_path(path);
    let result = write_zip(&staging, parts).and_then(|()| {
        std::fs::rename(&staging, path)
            .map_err(|e| ArtifactError::Persist(format!("{}: {}", path.display(), e)))
    });
    if result.is_err() {
        let _ = std::fs::remove_file(&staging);
    }
    result
}

fn write_zip(path: &Path, parts: &[(String, Vec<u8>)]) -> Result<(), ArtifactError> {
    let file = File::create(path)
        .map_err(|e| ArtifactError::Persist(format!("{}: {}", path.display(), e)))?;
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());

    let mut zip = ZipWriter::new(file);
    for (name, data) in parts {
        zip.start_file(name.as_str(), options)?;
        zip.write_all(data)?;
    }
    zip.finish()?;
    Ok(())
}

/// Every entry of an existing package, keyed by part name.
pub fn read_package(path: &Path) -> Result<BTreeMap<String, Vec<u8>>, ArtifactError> {
    let file = File::open(path)?;
    let mut archive = ZipArchive::new(file)?;
    let mut parts = BTreeMap::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }
        let mut data = Vec::new();
        entry.read_to_end(&mut data)?;
        parts.insert(entry.name().to_string(), data);
    }
    Ok(parts)
}

/// Attribute text of every `<tag ...>` element, by plain text scan.
///
/// The element name must match exactly, so `p:sldId` skips `<p:sldIdLst>`.
pub fn elements<'a>(xml: &'a str, tag: &str) -> Vec<&'a str> {
    let open = format!("<{}", tag);
    let mut found = Vec::new();
    let mut rest = xml;
    while let Some(pos) = rest.find(&open) {
        let after = &rest[pos + open.len()..];
        let Some(end) = after.find('>') else {
            break;
        };
        if after.starts_with(|c: char| c.is_whitespace() || c == '/' || c == '>') {
            found.push(&after[..end]);
        }
        rest = &after[end..];
    }
    found
}

/// Value of `attr` inside one element's attribute text.
pub fn attribute(element: &str, attr: &str) -> Option<String> {
    let key = format!("{}=\"", attr);
    let mut from = 0;
    while let Some(pos) = element[from..].find(&key) {
        let start = from + pos;
        let value_start = start + key.len();
        let standalone = element[..start]
            .chars()
            .next_back()
            .is_some_and(char::is_whitespace);
        if standalone {
            let len = element[value_start..].find('"')?;
            return Some(element[value_start..value_start + len].to_string());
        }
        from = value_start;
    }
    None
}

/// Value of `attr` on the first `<tag ...>` element.
pub fn attribute_of(xml: &str, tag: &str, attr: &str) -> Option<String> {
    attribute(elements(xml, tag).first()?, attr)
}

/// Target of relationship `id` in a `.rels` part.
pub fn relationship_target(rels: &str, id: &str) -> Option<String> {
    elements(rels, "Relationship")
        .into_iter()
        .find(|e| attribute(e, "Id").as_deref() == Some(id))
        .and_then(|e| attribute(e, "Target"))
}

/// Part name a relationship target points at, seen from a part in `dir`.
pub fn resolve_target(dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            ".." => {
                segments.pop();
            }
            "." | "" => {}
            s => segments.push(s),
        }
    }
    segments.join("/")
}

/// One past the largest number following `prefix` among `names`, at least 1.
pub fn next_number<'a>(names: impl IntoIterator<Item = &'a str>, prefix: &str) -> usize {
    names
        .into_iter()
        .filter_map(|name| {
            let digits: String = name
                .strip_prefix(prefix)?
                .chars()
                .take_while(char::is_ascii_digit)
                .collect();
            digits.parse::<usize>().ok()
        })
        .max()
        .map_or(1, |n| n + 1)
}

/// Insert `text` before the last `marker`, or leave `xml` alone without one.
pub fn splice_before(xml: &str, marker: &str, text: &str) -> Vec<u8> {
    match xml.rfind(marker) {
        Some(pos) => format!("{}{}{}", &xml[..pos], text, &xml[pos..]).into_bytes(),
        None => xml.as_bytes().to_vec(),
    }
}

pub fn relationship(id: &str, kind: &str, target: &str) -> String {
    format!(
        r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
        id, kind, target
    )
}

pub fn relationships(entries: &[String]) -> Vec<u8> {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "\n",
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
            "{}</Relationships>"
        ),
        entries.concat()
    )
    .into_bytes()
}

/// `[Content_Types].xml` with png/rels/xml defaults and the given overrides.
pub fn content_types(overrides: &[(String, &str)]) -> Vec<u8> {
    let overrides: String = overrides
        .iter()
        .map(|(part, kind)| format!(r#"<Override PartName="{}" ContentType="{}"/>"#, part, kind))
        .collect();
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "\n",
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
            r#"<Default Extension="rels" ContentType="{}"/>"#,
            r#"<Default Extension="xml" ContentType="application/xml"/>"#,
            r#"<Default Extension="png" ContentType="image/png"/>"#,
            "{}</Types>"
        ),
        RELS_CONTENT_TYPE, overrides
    )
    .into_bytes()
}

/// W3CDTF stamp in UTC for a local wall-clock time.
pub fn w3c_timestamp(local: NaiveDateTime) -> String {
    local
        .and_local_timezone(Local)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|| local.and_utc())
        .format("%Y-%m-%dT%H:%M:%SZ")
        .to_string()
}

/// `docProps/core.xml` with a title and a creation stamp.
pub fn core_properties(title: &str, created: NaiveDateTime) -> Vec<u8> {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "\n",
            r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" "#,
            r#"xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" "#,
            r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
            "<dc:title>{}</dc:title><dc:creator>ClickShot</dc:creator>",
            r#"<dcterms:created xsi:type="dcterms:W3CDTF">{}</dcterms:created>"#,
            "</cp:coreProperties>"
        ),
        escape_xml(title),
        w3c_timestamp(created)
    )
    .into_bytes()
}

pub const CORE_PROPERTIES_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-package.core-properties+xml";

/// Package-level `_rels/.rels` pointing at the main part and core properties.
pub fn package_relationships(main_part: &str) -> Vec<u8> {
    relationships(&[
        relationship("rId1", REL_OFFICE_DOCUMENT, main_part),
        relationship("rId2", REL_CORE_PROPERTIES, "docProps/core.xml"),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_fit_within_keeps_aspect() {
        // Wide picture is bound by width.
        assert_eq!(fit_within(200, 100, 1000, 1000), (1000, 500));
        // Tall picture is bound by height.
        assert_eq!(fit_within(100, 400, 1000, 1000), (250, 1000));
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml(r#"a<b> & "c" 'd'"#), "a&lt;b&gt; &amp; &quot;c&quot; &apos;d&apos;");
    }

    #[test]
    fn test_attribute_of() {
        let xml = r#"<p:presentation><p:sldSz cx="12192000" cy="6858000"/></p:presentation>"#;
        assert_eq!(attribute_of(xml, "p:sldSz", "cx").as_deref(), Some("12192000"));
        assert_eq!(attribute_of(xml, "p:sldSz", "cy").as_deref(), Some("6858000"));
        assert_eq!(attribute_of(xml, "p:notesSz", "cx"), None);
    }

    #[test]
    fn test_elements_match_whole_names() {
        let xml = concat!(
            r#"<p:sldIdLst><p:sldId id="256" r:id="rId7"/>"#,
            "<p:sldId\n id=\"300\" r:id=\"rId2\"/></p:sldIdLst>"
        );
        let ids: Vec<_> = elements(xml, "p:sldId")
            .into_iter()
            .filter_map(|e| attribute(e, "id"))
            .collect();
        assert_eq!(ids, ["256", "300"]);
        assert_eq!(attribute_of(xml, "p:sldId", "r:id").as_deref(), Some("rId7"));
        assert_eq!(attribute_of(xml, "p:sldIdLst", "id"), None);
    }

    #[test]
    fn test_relationship_targets_resolve() {
        let rels = String::from_utf8(relationships(&[
            relationship("rId1", REL_IMAGE, "../media/image1.png"),
            relationship("rId2", REL_IMAGE, "/ppt/media/logo.png"),
        ]))
        .unwrap();
        let target = relationship_target(&rels, "rId1").unwrap();
        assert_eq!(resolve_target("ppt/slides", &target), "ppt/media/image1.png");
        let absolute = relationship_target(&rels, "rId2").unwrap();
        assert_eq!(resolve_target("ppt/slides", &absolute), "ppt/media/logo.png");
        assert_eq!(relationship_target(&rels, "rId3"), None);
    }

    #[test]
    fn test_next_number_skips_taken_names() {
        let names = ["ppt/slides/slide2.xml", "ppt/slides/slide10.xml", "ppt/slides/_rels/slide40.xml.rels"];
        assert_eq!(next_number(names, "ppt/slides/slide"), 11);
        assert_eq!(next_number(Vec::<&str>::new(), "ppt/media/image"), 1);
    }

    #[test]
    fn test_core_timestamp_is_utc() {
        let local = chrono::NaiveDate::from_ymd_opt(2024, 5, 17)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .unwrap();
        let stamp = w3c_timestamp(local);
        assert!(stamp.ends_with('Z'));

        let back = chrono::DateTime::parse_from_rfc3339(&stamp)
            .unwrap()
            .with_timezone(&Local)
            .naive_local();
        assert_eq!(back, local);

        let core = String::from_utf8(core_properties("t", local)).unwrap();
        assert!(core.contains(&stamp));
    }

    #[test]
    fn test_write_package_is_deterministic_and_atomic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.zip");
        let parts = vec![
            ("a.xml".to_string(), b"<a/>".to_vec()),
            ("b/c.xml".to_string(), b"<c/>".to_vec()),
        ];

        write_package(&path, &parts).unwrap();
        let first = std::fs::read(&path).unwrap();
        write_package(&path, &parts).unwrap();
        assert_eq!(first, std::fs::read(&path).unwrap());
        assert!(!partial_path(&path).exists());

        let read = read_package(&path).unwrap();
        assert_eq!(read.get("b/c.xml").map(Vec::as_slice), Some(&b"<c/>"[..]));
    }

    #[test]
    fn test_embedded_image_reencodes_to_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot.bmp");
        RgbImage::from_pixel(3, 2, Rgb([9, 9, 9])).save(&path).unwrap();

        let image = EmbeddedImage::load(&path).unwrap();
        assert_eq!((image.width, image.height), (3, 2));
        assert_eq!(image::guess_format(&image.png).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn test_embedded_image_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not a picture").unwrap();
        assert!(matches!(
            EmbeddedImage::load(&path),
            Err(ArtifactError::Image(_))
        ));
    }

    #[test]
    fn test_check_output_path() {
        let dir = tempfile::tempdir().unwrap();
        assert!(check_output_path(&dir.path().join("deck.pptx")).is_ok());
        assert!(check_output_path(dir.path()).is_err());
        assert!(check_output_path(&dir.path().join("missing/deck.pptx")).is_err());
    }
}

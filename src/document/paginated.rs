//! Paginated document (.docx)
//!
//! Front matter (title, generation time, page break), then per shot a
//! centred heading with the caption, the centred picture and a page break.

use chrono::NaiveDateTime;
use std::path::Path;

use super::ooxml::{
    self, content_types, core_properties, escape_xml, inches, package_relationships,
    relationship, relationships, EmbeddedImage, CORE_PROPERTIES_CONTENT_TYPE, REL_IMAGE,
};
use super::ArtifactError;
use crate::app::AssemblyConfig;

/// Letter page, one-inch margins, less room for the caption heading.
const MAX_PICTURE_HEIGHT_IN: f64 = 8.0;

const XML_DECL: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n";

const CT_DOCUMENT: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
const CT_STYLES: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml";
const REL_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";

const PAGE_BREAK: &str = r#"<w:p><w:r><w:br w:type="page"/></w:r></w:p>"#;

const STYLES: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n",
    r#"<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
    r#"<w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii="Calibri" w:hAnsi="Calibri" w:cs="Calibri"/>"#,
    r#"<w:sz w:val="22"/></w:rPr></w:rPrDefault><w:pPrDefault><w:pPr><w:spacing w:after="160"/></w:pPr></w:pPrDefault></w:docDefaults>"#,
    r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style>"#,
    r#"<w:style w:type="paragraph" w:styleId="Title"><w:name w:val="Title"/><w:basedOn w:val="Normal"/>"#,
    r#"<w:next w:val="Normal"/><w:qFormat/><w:rPr><w:sz w:val="56"/></w:rPr></w:style>"#,
    r#"<w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/>"#,
    r#"<w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:spacing w:before="240" w:after="120"/><w:outlineLvl w:val="0"/></w:pPr>"#,
    r#"<w:rPr><w:b/><w:color w:val="2F5496"/><w:sz w:val="32"/></w:rPr></w:style>"#,
    "</w:styles>"
);

pub struct PaginatedDocument {
    title: String,
    created: NaiveDateTime,
    config: AssemblyConfig,
    body: Vec<String>,
    media: Vec<Vec<u8>>,
}

impl PaginatedDocument {
    pub fn new(title: &str, created: NaiveDateTime, config: &AssemblyConfig) -> Self {
        let body = vec![
            paragraph(Some("Title"), title),
            paragraph(
                None,
                &format!("Generated on {}", created.format("%Y-%m-%d %H:%M:%S")),
            ),
            PAGE_BREAK.to_string(),
        ];
        Self {
            title: title.to_string(),
            created,
            config: config.clone(),
            body,
            media: Vec::new(),
        }
    }

    pub fn picture_count(&self) -> usize {
        self.media.len()
    }

    /// Picture extent in EMU. The configured width is used unless the picture
    /// would then run off the page, in which case the fallback width is tried
    /// and, failing that, the height is capped.
    pub fn picture_extent(&self, width: u32, height: u32) -> (i64, i64) {
        let max_height = inches(MAX_PICTURE_HEIGHT_IN);
        let ratio = f64::from(height) / f64::from(width);

        for width_in in [
            self.config.document_image_width_in,
            self.config.document_fallback_width_in,
        ] {
            let cx = inches(width_in);
            let cy = (cx as f64 * ratio).round() as i64;
            if cy <= max_height {
                return (cx, cy);
            }
        }
        ((max_height as f64 / ratio).round() as i64, max_height)
    }

    pub fn append(&mut self, image: &EmbeddedImage, caption: &str) -> Result<(), ArtifactError> {
        let (cx, cy) = self.picture_extent(image.width, image.height);
        if cx <= 0 || cy <= 0 {
            return Err(ArtifactError::Append(format!(
                "{}x{} picture has no printable size",
                image.width, image.height
            )));
        }

        let n = self.media.len() + 1;
        self.body.push(paragraph(Some("Heading1"), caption));
        self.body.push(inline_picture(n, cx, cy));
        self.body.push(PAGE_BREAK.to_string());
        self.media.push(image.png.clone());
        Ok(())
    }

    pub fn write_to(&self, path: &Path) -> Result<(), ArtifactError> {
        ooxml::write_package(path, &self.parts())
    }

    fn parts(&self) -> Vec<(String, Vec<u8>)> {
        let overrides = [
            ("/word/document.xml".to_string(), CT_DOCUMENT),
            ("/word/styles.xml".to_string(), CT_STYLES),
            ("/docProps/core.xml".to_string(), CORE_PROPERTIES_CONTENT_TYPE),
        ];

        let mut rels = vec![relationship("rId1", REL_STYLES, "styles.xml")];
        rels.extend((1..=self.media.len()).map(|n| {
            relationship(&image_rel_id(n), REL_IMAGE, &format!("media/image{}.png", n))
        }));

        let mut parts = vec![
            ("[Content_Types].xml".to_string(), content_types(&overrides)),
            ("_rels/.rels".to_string(), package_relationships("word/document.xml")),
            (
                "docProps/core.xml".to_string(),
                core_properties(&self.title, self.created),
            ),
            ("word/document.xml".to_string(), self.document_xml()),
            ("word/_rels/document.xml.rels".to_string(), relationships(&rels)),
            ("word/styles.xml".to_string(), STYLES.as_bytes().to_vec()),
        ];
        parts.extend(
            self.media
                .iter()
                .enumerate()
                .map(|(i, png)| (format!("word/media/image{}.png", i + 1), png.clone())),
        );
        parts
    }

    fn document_xml(&self) -> Vec<u8> {
        format!(
            concat!(
                "{}",
                r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
                r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
                r#"xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" "#,
                r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
                r#"xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
                "<w:body>{}",
                r#"<w:sectPr><w:pgSz w:w="12240" w:h="15840"/>"#,
                r#"<w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="720" w:footer="720" w:gutter="0"/>"#,
                "</w:sectPr></w:body></w:document>"
            ),
            XML_DECL,
            self.body.concat()
        )
        .into_bytes()
    }
}

fn image_rel_id(n: usize) -> String {
    format!("rIdImage{}", n)
}

fn paragraph(style: Option<&str>, text: &str) -> String {
    let style = style
        .map(|s| format!(r#"<w:pStyle w:val="{}"/>"#, s))
        .unwrap_or_default();
    format!(
        r#"<w:p><w:pPr>{}<w:jc w:val="center"/></w:pPr><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
        style,
        escape_xml(text)
    )
}

fn inline_picture(n: usize, cx: i64, cy: i64) -> String {
    format!(
        concat!(
            r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:drawing>"#,
            r#"<wp:inline distT="0" distB="0" distL="0" distR="0"><wp:extent cx="{cx}" cy="{cy}"/>"#,
            r#"<wp:docPr id="{n}" name="Picture {n}"/>"#,
            r#"<wp:cNvGraphicFramePr><a:graphicFrameLocks noChangeAspect="1"/></wp:cNvGraphicFramePr>"#,
            r#"<a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
            r#"<pic:pic><pic:nvPicPr><pic:cNvPr id="{n}" name="image{n}.png"/><pic:cNvPicPr/></pic:nvPicPr>"#,
            r#"<pic:blipFill><a:blip r:embed="{rel}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
            r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
            r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr></pic:pic>"#,
            "</a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>"
        ),
        cx = cx,
        cy = cy,
        n = n,
        rel = image_rel_id(n)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn created() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 17)
            .and_then(|d| d.and_hms_opt(9, 30, 5))
            .unwrap()
    }

    fn image(width: u32, height: u32) -> EmbeddedImage {
        EmbeddedImage {
            png: vec![1, 2, 3],
            width,
            height,
        }
    }

    fn body(doc: &PaginatedDocument) -> String {
        String::from_utf8(doc.document_xml()).unwrap()
    }

    #[test]
    fn test_front_matter() {
        let doc = PaginatedDocument::new("Sprint & review", created(), &AssemblyConfig::default());
        let xml = body(&doc);
        assert!(xml.contains(r#"<w:pStyle w:val="Title"/>"#));
        assert!(xml.contains("Sprint &amp; review"));
        assert!(xml.contains("Generated on 2024-05-17 09:30:05"));
        assert_eq!(xml.matches(r#"w:type="page""#).count(), 1);
    }

    #[test]
    fn test_each_shot_gets_heading_picture_and_break() {
        let mut doc = PaginatedDocument::new("p", created(), &AssemblyConfig::default());
        doc.append(&image(1600, 900), "first (monitor)").unwrap();
        doc.append(&image(800, 600), "second (region)").unwrap();

        let xml = body(&doc);
        assert_eq!(xml.matches(r#"w:type="page""#).count(), 3);
        assert_eq!(xml.matches(r#"<w:pStyle w:val="Heading1"/>"#).count(), 2);
        let first = xml.find("first (monitor)").unwrap();
        let second = xml.find("second (region)").unwrap();
        assert!(first < second);
        assert!(xml.contains(r#"r:embed="rIdImage2""#));
        assert_eq!(doc.picture_count(), 2);
    }

    #[test]
    fn test_picture_width_prefers_configured_width() {
        let doc = PaginatedDocument::new("p", created(), &AssemblyConfig::default());
        assert_eq!(doc.picture_extent(1300, 650), (inches(6.5), inches(3.25)));
    }

    #[test]
    fn test_tall_picture_uses_fallback_then_caps_height() {
        let doc = PaginatedDocument::new("p", created(), &AssemblyConfig::default());
        // 6.5in wide would be 8.125in tall; 6.0in gives 7.5in.
        assert_eq!(doc.picture_extent(520, 650), (inches(6.0), inches(7.5)));
        // Even 6.0in overflows, so the height is capped.
        let (cx, cy) = doc.picture_extent(100, 400);
        assert_eq!(cy, inches(MAX_PICTURE_HEIGHT_IN));
        assert_eq!(cx, inches(2.0));
    }
}

//! Slide deck (.pptx)
//!
//! A title slide (or a template's own slides), then one slide per shot: the
//! picture centred and fitted into a fixed share of the slide, with the
//! caption underneath. The package is rebuilt in full from memory on every
//! write.

use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use std::path::Path;

use super::ooxml::{
    self, attribute, attribute_of, content_types, core_properties, elements, escape_xml,
    fit_within, inches, next_number, package_relationships, relationship, relationship_target,
    relationships, resolve_target, splice_before, EmbeddedImage, CORE_PROPERTIES_CONTENT_TYPE,
    REL_IMAGE,
};
use super::ArtifactError;
use crate::app::AssemblyConfig;

/// 10in × 7.5in
const BLANK_SLIDE_SIZE: (i64, i64) = (9_144_000, 6_858_000);

const FIRST_SLIDE_ID: usize = 256;

const NS: &str = concat!(
    r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
    r#"xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#
);

const XML_DECL: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n";

const CT_PRESENTATION: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";
const CT_SLIDE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
const CT_MASTER: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml";
const CT_LAYOUT: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml";
const CT_THEME: &str = "application/vnd.openxmlformats-officedocument.theme+xml";

const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/";

const EMPTY_GROUP: &str = concat!(
    r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#,
    r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/>"#,
    r#"<a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#
);

const CLR_MAP: &str = concat!(
    r#"<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" "#,
    r#"accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" "#,
    r#"hlink="hlink" folHlink="folHlink"/>"#
);

const BLANK_THEME: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n",
    r#"<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="ClickShot">"#,
    "<a:themeElements>",
    r#"<a:clrScheme name="ClickShot">"#,
    r#"<a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1>"#,
    r#"<a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1>"#,
    r#"<a:dk2><a:srgbClr val="1F2937"/></a:dk2><a:lt2><a:srgbClr val="E5E7EB"/></a:lt2>"#,
    r#"<a:accent1><a:srgbClr val="006ED2"/></a:accent1><a:accent2><a:srgbClr val="16A34A"/></a:accent2>"#,
    r#"<a:accent3><a:srgbClr val="DC2626"/></a:accent3><a:accent4><a:srgbClr val="F59E0B"/></a:accent4>"#,
    r#"<a:accent5><a:srgbClr val="7C3AED"/></a:accent5><a:accent6><a:srgbClr val="0891B2"/></a:accent6>"#,
    r#"<a:hlink><a:srgbClr val="0563C1"/></a:hlink><a:folHlink><a:srgbClr val="954F72"/></a:folHlink>"#,
    "</a:clrScheme>",
    r#"<a:fontScheme name="ClickShot">"#,
    r#"<a:majorFont><a:latin typeface="Calibri Light"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont>"#,
    r#"<a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont>"#,
    "</a:fontScheme>",
    r#"<a:fmtScheme name="ClickShot"><a:fillStyleLst>"#,
    r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
    r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
    r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
    "</a:fillStyleLst><a:lnStyleLst>",
    r#"<a:ln w="6350"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#,
    r#"<a:ln w="12700"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#,
    r#"<a:ln w="19050"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#,
    "</a:lnStyleLst><a:effectStyleLst>",
    "<a:effectStyle><a:effectLst/></a:effectStyle>",
    "<a:effectStyle><a:effectLst/></a:effectStyle>",
    "<a:effectStyle><a:effectLst/></a:effectStyle>",
    "</a:effectStyleLst><a:bgFillStyleLst>",
    r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
    r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
    r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
    "</a:bgFillStyleLst></a:fmtScheme>",
    "</a:themeElements></a:theme>"
);

struct Slide {
    xml: String,
    picture: Option<Vec<u8>>,
}

const PRESENTATION: &str = "ppt/presentation.xml";
const PRESENTATION_RELS: &str = "ppt/_rels/presentation.xml.rels";
const CONTENT_TYPES: &str = "[Content_Types].xml";

const BLANK_LAYOUT: &str = "../slideLayouts/slideLayout1.xml";

pub struct SlideDeck {
    width: i64,
    height: i64,
    title: String,
    created: NaiveDateTime,
    config: AssemblyConfig,
    /// Parts written back untouched: masters, layouts, themes, media and
    /// any slides the deck started with.
    base: BTreeMap<String, Vec<u8>>,
    presentation: String,
    presentation_rels: String,
    content_types: String,
    /// Layout every added slide uses, relative to `ppt/slides/`.
    layout_target: String,
    existing_slides: usize,
    first_slide_number: usize,
    first_slide_id: usize,
    first_rel_id: usize,
    first_media_number: usize,
    slides: Vec<Slide>,
}

impl SlideDeck {
    /// 10in × 7.5in deck with the built-in theme and a title slide.
    pub fn blank(title: &str, created: NaiveDateTime, config: &AssemblyConfig) -> Self {
        Self::blank_with_size(BLANK_SLIDE_SIZE, title, created, config)
    }

    fn blank_with_size(
        (width, height): (i64, i64),
        title: &str,
        created: NaiveDateTime,
        config: &AssemblyConfig,
    ) -> Self {
        let mut base = BTreeMap::new();
        base.insert("_rels/.rels".to_string(), package_relationships(PRESENTATION));
        base.insert("docProps/core.xml".to_string(), core_properties(title, created));
        base.insert("ppt/slideMasters/slideMaster1.xml".to_string(), master_xml());
        base.insert(
            "ppt/slideMasters/_rels/slideMaster1.xml.rels".to_string(),
            relationships(&[
                relationship("rId1", &rel("slideLayout"), BLANK_LAYOUT),
                relationship("rId2", &rel("theme"), "../theme/theme1.xml"),
            ]),
        );
        base.insert("ppt/slideLayouts/slideLayout1.xml".to_string(), layout_xml());
        base.insert(
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels".to_string(),
            relationships(&[relationship(
                "rId1",
                &rel("slideMaster"),
                "../slideMasters/slideMaster1.xml",
            )]),
        );
        base.insert("ppt/theme/theme1.xml".to_string(), BLANK_THEME.as_bytes().to_vec());

        let content_types = content_types(&[
            (format!("/{}", PRESENTATION), CT_PRESENTATION),
            ("/ppt/slideMasters/slideMaster1.xml".to_string(), CT_MASTER),
            ("/ppt/slideLayouts/slideLayout1.xml".to_string(), CT_LAYOUT),
            ("/ppt/theme/theme1.xml".to_string(), CT_THEME),
            ("/docProps/core.xml".to_string(), CORE_PROPERTIES_CONTENT_TYPE),
        ]);
        let presentation_rels = relationships(&[
            relationship("rId1", &rel("slideMaster"), "slideMasters/slideMaster1.xml"),
            relationship("rId2", &rel("theme"), "theme/theme1.xml"),
        ]);

        Self::assemble(
            Package {
                base,
                presentation: blank_presentation_xml(width, height),
                presentation_rels: String::from_utf8_lossy(&presentation_rels).into_owned(),
                content_types: String::from_utf8_lossy(&content_types).into_owned(),
                layout_target: BLANK_LAYOUT.to_string(),
                size: (width, height),
            },
            title,
            created,
            config,
        )
    }

    /// Continue an existing presentation. Its slides, masters, layouts,
    /// themes and media are kept; shots are added after its last slide. A
    /// title slide is added only when the template has no slides.
    pub fn from_template(
        template: &Path,
        title: &str,
        created: NaiveDateTime,
        config: &AssemblyConfig,
    ) -> Result<Self, ArtifactError> {
        let parts = ooxml::read_package(template)
            .map_err(|e| ArtifactError::Template(format!("{}: {}", template.display(), e)))?;
        let package = Package::from_parts(parts)
            .map_err(|reason| ArtifactError::Template(format!("{}: {}", template.display(), reason)))?;
        Ok(Self::assemble(package, title, created, config))
    }

    fn assemble(
        package: Package,
        title: &str,
        created: NaiveDateTime,
        config: &AssemblyConfig,
    ) -> Self {
        let slide_ids = elements(&package.presentation, "p:sldId");
        let existing_slides = slide_ids.len();
        let first_slide_id = slide_ids
            .iter()
            .filter_map(|e| attribute(e, "id")?.parse::<usize>().ok())
            .max()
            .map_or(FIRST_SLIDE_ID, |id| id + 1)
            .max(FIRST_SLIDE_ID);
        let rel_ids: Vec<String> = elements(&package.presentation_rels, "Relationship")
            .into_iter()
            .filter_map(|e| attribute(e, "Id"))
            .collect();
        let first_rel_id = next_number(rel_ids.iter().map(String::as_str), "rId");
        let names = || package.base.keys().map(String::as_str);
        let first_slide_number = next_number(names(), "ppt/slides/slide");
        let first_media_number = next_number(names(), "ppt/media/image");

        let (width, height) = package.size;
        let mut deck = Self {
            width,
            height,
            title: title.to_string(),
            created,
            config: config.clone(),
            base: package.base,
            presentation: package.presentation,
            presentation_rels: package.presentation_rels,
            content_types: package.content_types,
            layout_target: package.layout_target,
            existing_slides,
            first_slide_number,
            first_slide_id,
            first_rel_id,
            first_media_number,
            slides: Vec::new(),
        };
        if existing_slides == 0 {
            let title_slide = deck.title_slide();
            deck.slides.push(title_slide);
        }
        deck
    }

    pub fn slide_size(&self) -> (i64, i64) {
        (self.width, self.height)
    }

    /// Every slide, including the template's own and the title slide.
    pub fn slide_count(&self) -> usize {
        self.existing_slides + self.slides.len()
    }

    fn title_slide(&self) -> Slide {
        let margin = inches(0.5);
        let box_width = self.width - 2 * margin;
        let title_top = self.height / 2 - inches(1.2);
        let shapes = [
            text_box(
                2,
                "Title",
                (margin, title_top, box_width, inches(1.2)),
                &self.title,
                4000,
                None,
            ),
            text_box(
                3,
                "Subtitle",
                (margin, title_top + inches(1.3), box_width, inches(0.6)),
                &format!("Generated {}", self.created.format("%Y-%m-%d")),
                1800,
                None,
            ),
        ]
        .concat();
        Slide {
            xml: slide_xml(&shapes),
            picture: None,
        }
    }

    /// Add a content slide for one shot.
    pub fn append(&mut self, image: &EmbeddedImage, caption: &str) -> Result<(), ArtifactError> {
        let max_w = (self.width as f64 * self.config.slide_max_width_fraction) as i64;
        let max_h = (self.height as f64 * self.config.slide_max_height_fraction) as i64;
        let (pic_w, pic_h) = fit_within(image.width, image.height, max_w, max_h);
        if pic_w <= 0 || pic_h <= 0 {
            return Err(ArtifactError::Append(format!(
                "{}x{} picture does not fit a {}x{} slide",
                image.width, image.height, self.width, self.height
            )));
        }

        let left = (self.width - pic_w) / 2;
        let top = (self.height - pic_h) / 2 - inches(self.config.slide_vertical_offset_in);

        let shapes = [
            picture(2, (left, top, pic_w, pic_h)),
            text_box(
                3,
                "Caption",
                (left, top + pic_h + inches(0.25), pic_w, inches(0.8)),
                caption,
                self.config.caption_font_pt * 100,
                Some(&caption_color(&self.config.caption_color)),
            ),
        ]
        .concat();

        self.slides.push(Slide {
            xml: slide_xml(&shapes),
            picture: Some(image.png.clone()),
        });
        Ok(())
    }

    pub fn write_to(&self, path: &Path) -> Result<(), ArtifactError> {
        ooxml::write_package(path, &self.parts())
    }

    fn parts(&self) -> Vec<(String, Vec<u8>)> {
        let mut slide_ids = String::new();
        let mut slide_rels = Vec::new();
        let mut overrides = String::new();
        let mut added = Vec::new();

        for (index, slide) in self.slides.iter().enumerate() {
            let number = self.first_slide_number + index;
            let rel_id = format!("rId{}", self.first_rel_id + index);
            slide_ids.push_str(&format!(
                r#"<p:sldId id="{}" r:id="{}"/>"#,
                self.first_slide_id + index,
                rel_id
            ));
            slide_rels.push(relationship(
                &rel_id,
                &rel("slide"),
                &format!("slides/slide{}.xml", number),
            ));
            overrides.push_str(&format!(
                r#"<Override PartName="/ppt/slides/slide{}.xml" ContentType="{}"/>"#,
                number, CT_SLIDE
            ));

            let mut rels = vec![relationship("rId1", &rel("slideLayout"), &self.layout_target)];
            if let Some(png) = &slide.picture {
                let media = format!("image{}.png", self.first_media_number + index);
                rels.push(relationship("rId2", REL_IMAGE, &format!("../media/{}", media)));
                added.push((format!("ppt/media/{}", media), png.clone()));
            }
            added.push((format!("ppt/slides/slide{}.xml", number), slide.xml.clone().into_bytes()));
            added.push((format!("ppt/slides/_rels/slide{}.xml.rels", number), relationships(&rels)));
        }

        let mut parts = vec![(
            CONTENT_TYPES.to_string(),
            splice_before(&self.content_types, "</Types>", &overrides),
        )];
        parts.extend(self.base.iter().map(|(name, data)| (name.clone(), data.clone())));
        parts.push((
            PRESENTATION.to_string(),
            splice_before(&self.presentation, "</p:sldIdLst>", &slide_ids),
        ));
        parts.push((
            PRESENTATION_RELS.to_string(),
            splice_before(&self.presentation_rels, "</Relationships>", &slide_rels.concat()),
        ));
        parts.extend(added);
        parts
    }
}

/// The package a deck grows from, with the three parts new slides touch
/// held apart as text.
struct Package {
    base: BTreeMap<String, Vec<u8>>,
    presentation: String,
    presentation_rels: String,
    content_types: String,
    layout_target: String,
    size: (i64, i64),
}

impl Package {
    fn from_parts(mut base: BTreeMap<String, Vec<u8>>) -> Result<Self, String> {
        let mut take_text = |name: &str| -> Result<String, String> {
            let data = base.remove(name).ok_or_else(|| format!("no {}", name))?;
            String::from_utf8(data).map_err(|_| format!("{} is not UTF-8", name))
        };
        let presentation = take_text(PRESENTATION)?;
        let presentation_rels = take_text(PRESENTATION_RELS)?;
        let mut content_types = take_text(CONTENT_TYPES)?;

        let dimension = |attr: &str| {
            attribute_of(&presentation, "p:sldSz", attr)
                .and_then(|v| v.parse::<i64>().ok())
                .filter(|v| *v > 0)
        };
        let (Some(width), Some(height)) = (dimension("cx"), dimension("cy")) else {
            return Err("missing slide size".to_string());
        };

        let presentation = with_slide_list(presentation)?;
        if !presentation_rels.contains("</Relationships>") {
            return Err("unreadable presentation relationships".to_string());
        }
        if !content_types.contains("</Types>") {
            return Err("unreadable content types".to_string());
        }
        if !content_types.to_ascii_lowercase().contains(r#"extension="png""#) {
            content_types = String::from_utf8_lossy(&splice_before(
                &content_types,
                "</Types>",
                r#"<Default Extension="png" ContentType="image/png"/>"#,
            ))
            .into_owned();
        }

        let layouts = master_layouts(&base, &presentation, &presentation_rels);
        let layout = preferred_layout(&layouts)
            .cloned()
            .or_else(|| {
                let mut names: Vec<&String> = base
                    .keys()
                    .filter(|n| n.starts_with("ppt/slideLayouts/slideLayout") && n.ends_with(".xml"))
                    .collect();
                names.sort_by_key(|n| next_number([n.as_str()], "ppt/slideLayouts/slideLayout"));
                preferred_layout(&names).map(|n| n.to_string())
            })
            .ok_or_else(|| "no slide layouts".to_string())?;

        let layout_target = match layout.strip_prefix("ppt/") {
            Some(inside) => format!("../{}", inside),
            None => format!("/{}", layout),
        };

        Ok(Self {
            base,
            presentation,
            presentation_rels,
            content_types,
            layout_target,
            size: (width, height),
        })
    }
}

/// Make sure `</p:sldIdLst>` exists so new slide ids have a home.
fn with_slide_list(presentation: String) -> Result<String, String> {
    if presentation.contains("</p:sldIdLst>") {
        return Ok(presentation);
    }
    if presentation.contains("<p:sldIdLst/>") {
        return Ok(presentation.replacen("<p:sldIdLst/>", "<p:sldIdLst></p:sldIdLst>", 1));
    }
    // The slide list follows the master, notes-master and handout-master lists.
    let anchor = ["</p:sldMasterIdLst>", "</p:notesMasterIdLst>", "</p:handoutMasterIdLst>"]
        .iter()
        .filter_map(|tag| presentation.rfind(tag).map(|pos| pos + tag.len()))
        .max()
        .ok_or_else(|| "no slide master list".to_string())?;
    Ok(format!(
        "{}<p:sldIdLst></p:sldIdLst>{}",
        &presentation[..anchor],
        &presentation[anchor..]
    ))
}

/// Layout part names of the first slide master, in the master's order.
fn master_layouts(
    parts: &BTreeMap<String, Vec<u8>>,
    presentation: &str,
    presentation_rels: &str,
) -> Vec<String> {
    let Some(master) = attribute_of(presentation, "p:sldMasterId", "r:id")
        .and_then(|id| relationship_target(presentation_rels, &id))
        .map(|target| resolve_target("ppt", &target))
    else {
        return Vec::new();
    };
    let Some((dir, file)) = master.rsplit_once('/') else {
        return Vec::new();
    };
    let text = |name: &str| parts.get(name).map(|data| String::from_utf8_lossy(data).into_owned());
    let (Some(master_xml), Some(master_rels)) =
        (text(&master), text(&format!("{}/_rels/{}.rels", dir, file)))
    else {
        return Vec::new();
    };

    elements(&master_xml, "p:sldLayoutId")
        .into_iter()
        .filter_map(|e| attribute(e, "r:id"))
        .filter_map(|id| relationship_target(&master_rels, &id))
        .map(|target| resolve_target(dir, &target))
        .filter(|name| parts.contains_key(name))
        .collect()
}

/// The seventh layout (blank in the stock layout set), else the last one.
fn preferred_layout<T>(layouts: &[T]) -> Option<&T> {
    layouts.get(6).or(layouts.last())
}

fn blank_presentation_xml(width: i64, height: i64) -> String {
    format!(
        concat!(
            "{}<p:presentation {} saveSubsetFonts=\"1\">",
            r#"<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>"#,
            "<p:sldIdLst></p:sldIdLst>",
            r#"<p:sldSz cx="{}" cy="{}"/><p:notesSz cx="6858000" cy="9144000"/>"#,
            "</p:presentation>"
        ),
        XML_DECL, NS, width, height
    )
}

fn rel(kind: &str) -> String {
    format!("{}{}", REL_BASE, kind)
}

/// Six hex digits, upper-cased; anything else falls back to the default blue.
fn caption_color(value: &str) -> String {
    let value = value.trim_start_matches('#');
    if value.len() == 6 && value.chars().all(|c| c.is_ascii_hexdigit()) {
        value.to_ascii_uppercase()
    } else {
        "006ED2".to_string()
    }
}

fn master_xml() -> Vec<u8> {
    format!(
        concat!(
            "{}<p:sldMaster {}><p:cSld><p:spTree>{}</p:spTree></p:cSld>{}",
            r#"<p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst>"#,
            "</p:sldMaster>"
        ),
        XML_DECL, NS, EMPTY_GROUP, CLR_MAP
    )
    .into_bytes()
}

fn layout_xml() -> Vec<u8> {
    format!(
        concat!(
            r#"{}<p:sldLayout {} type="blank" preserve="1">"#,
            r#"<p:cSld name="Blank"><p:spTree>{}</p:spTree></p:cSld>"#,
            "<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"
        ),
        XML_DECL, NS, EMPTY_GROUP
    )
    .into_bytes()
}

fn slide_xml(shapes: &str) -> String {
    format!(
        concat!(
            "{}<p:sld {}><p:cSld><p:spTree>{}{}</p:spTree></p:cSld>",
            "<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"
        ),
        XML_DECL, NS, EMPTY_GROUP, shapes
    )
}

fn xfrm((x, y, cx, cy): (i64, i64, i64, i64)) -> String {
    format!(
        r#"<a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm>"#,
        x, y, cx, cy
    )
}

fn picture(id: u32, frame: (i64, i64, i64, i64)) -> String {
    format!(
        concat!(
            "<p:pic><p:nvPicPr>",
            r#"<p:cNvPr id="{}" name="Picture {}"/>"#,
            r#"<p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr>"#,
            r#"<p:blipFill><a:blip r:embed="rId2"/><a:stretch><a:fillRect/></a:stretch></p:blipFill>"#,
            r#"<p:spPr>{}<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:pic>"#
        ),
        id,
        id,
        xfrm(frame)
    )
}

fn text_box(
    id: u32,
    name: &str,
    frame: (i64, i64, i64, i64),
    text: &str,
    size_hundredths: u32,
    color: Option<&str>,
) -> String {
    let fill = color
        .map(|c| format!(r#"<a:solidFill><a:srgbClr val="{}"/></a:solidFill>"#, c))
        .unwrap_or_default();
    format!(
        concat!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="{}" name="{}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr>"#,
            r#"<p:spPr>{}<a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/></p:spPr>"#,
            r#"<p:txBody><a:bodyPr wrap="square" rtlCol="0"><a:spAutoFit/></a:bodyPr><a:lstStyle/>"#,
            r#"<a:p><a:pPr algn="ctr"/><a:r><a:rPr lang="en-US" sz="{}" b="1" dirty="0">{}</a:rPr>"#,
            "<a:t>{}</a:t></a:r></a:p></p:txBody></p:sp>"
        ),
        id,
        name,
        xfrm(frame),
        size_hundredths,
        fill,
        escape_xml(text)
    )
}

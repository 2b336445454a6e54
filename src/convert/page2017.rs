//! PAGE 2017-07-15 handler and region mapper.

use super::{ConvertOptions, MapContext, PageVersion, RegionMapper, VersionHandler};
use crate::binding::page2017::{
    self, AlternativeImage, Coords, PcGts, Region, RegionBase, RegionKind, TextEquiv, TextLine,
    TextRegion, TextStyle,
};
use crate::binding::presence::Presence;
use crate::binding::BindingMode;
use crate::collect_if_present;
use crate::error::{Error, Result};
use crate::geometry::{parse_optional_points, Polygon};
use crate::model::{Document, ElementId, GroupRef, MetadataMap};
use crate::schema::{SchemaCache, ValidationResult};
use std::path::Path;

/// Handler for PAGE 2017-07-15 documents.
#[derive(Debug)]
pub struct Page2017Handler {
    schema: SchemaCache,
}

impl Page2017Handler {
    /// Create a handler reading its XSD from `schema_dir`.
    pub fn new(schema_dir: impl AsRef<Path>) -> Self {
        Self::with_schema_path(
            schema_dir
                .as_ref()
                .join(PageVersion::Page2017.schema_file()),
        )
    }

    /// Create a handler validating against a specific XSD.
    pub fn with_schema_path(path: impl AsRef<Path>) -> Self {
        Self {
            schema: SchemaCache::new(path.as_ref()),
        }
    }
}

impl VersionHandler for Page2017Handler {
    fn version(&self) -> PageVersion {
        PageVersion::Page2017
    }

    fn namespace(&self) -> &str {
        page2017::NAMESPACE
    }

    fn schema_path(&self) -> &Path {
        self.schema.path()
    }

    fn validate(&self, bytes: &[u8]) -> Result<ValidationResult> {
        self.schema.get()?.validate(bytes)
    }

    fn convert(
        &self,
        bytes: &[u8],
        mode: BindingMode,
        options: &ConvertOptions,
        ctx: &mut MapContext,
    ) -> Result<Document> {
        let tree = page2017::parse_with_warnings(bytes, mode, ctx.warnings_mut())?;
        Page2017Mapper::new(options).map(&tree, ctx)
    }
}

/// Maps a bound PAGE 2017 tree into the shared document.
///
/// The mapper is stateless between calls; the group a region subtree
/// belongs to is passed down the recursion explicitly.
#[derive(Debug, Clone)]
pub struct Page2017Mapper {
    tool_name: String,
    conversion_date: String,
}

impl Page2017Mapper {
    /// Create a mapper recording the creator from `options`.
    pub fn new(options: &ConvertOptions) -> Self {
        Self {
            tool_name: options.tool_name.clone(),
            conversion_date: options.conversion_date_string(),
        }
    }

    /// Map a border or print space frame.
    fn frame(&self, doc: &mut Document, coords: Option<&Coords>, region_type: &str, ctx: &mut MapContext) {
        let polygon = coords_polygon(coords);
        if polygon.is_empty() {
            ctx.warn(region_type, "no usable coordinates; frame skipped");
            return;
        }
        doc.add_region(polygon, region_type, None);
    }

    fn region(&self, doc: &mut Document, region: &Region, group: Option<GroupRef>, ctx: &mut MapContext) {
        match region {
            Region::Text(text) => self.text_region(doc, text, group, ctx),
            other => self.generic_region(doc, other, group, ctx),
        }
    }

    fn generic_region(
        &self,
        doc: &mut Document,
        region: &Region,
        inherited: Option<GroupRef>,
        ctx: &mut MapContext,
    ) {
        let base = region.base();
        let kind = region.kind();

        let subtype = match region {
            Region::Graphic(r) => r.graphic_type.clone(),
            Region::Chart(r) => r.chart_type.clone(),
            _ => None,
        };
        let element = region_element(doc, base, kind, subtype, ctx);
        if let (Some(el), Some(g)) = (element, inherited) {
            doc.join_group(el, g);
        }

        let group = subtree_group(doc, element, inherited, !base.children.is_empty());
        attach(
            doc,
            region_attributes(region),
            Target::pick(element, group, inherited.is_some(), false),
            kind.element_name(),
            &base.id,
            ctx,
        );

        warn_uninterpreted(base, kind, ctx);
        if let Region::Table(table) = region {
            if let Some(grid) = &table.grid {
                ctx.warn(
                    "Grid",
                    format!("table [{}] grid with {} rows is not mapped", base.id, grid.rows.len()),
                );
            }
        }

        self.children(doc, base, group, ctx);
    }

    fn text_region(
        &self,
        doc: &mut Document,
        text: &TextRegion,
        inherited: Option<GroupRef>,
        ctx: &mut MapContext,
    ) {
        let base = &text.base;
        let element = region_element(doc, base, RegionKind::Text, text.text_type.clone(), ctx);
        if let (Some(el), Some(g)) = (element, inherited) {
            doc.join_group(el, g);
        }

        let complex = text.is_complex();
        let group = subtree_group(
            doc,
            element,
            inherited,
            complex || !base.children.is_empty(),
        );

        if complex {
            for line in &text.text_lines {
                self.text_line(doc, line, group, ctx);
            }
        }

        let shared = inherited.is_some();
        if let Some(style) = &text.text_style {
            attach(
                doc,
                text_style_metadata(style),
                Target::pick(element, group, shared, false),
                "TextStyle",
                &base.id,
                ctx,
            );
        }

        for equiv in &text.text_equivs {
            text_equiv(doc, equiv, group);
        }

        attach(
            doc,
            text_region_attributes(text),
            Target::pick(element, group, shared, true),
            "TextRegion",
            &base.id,
            ctx,
        );

        warn_uninterpreted(base, RegionKind::Text, ctx);
        self.children(doc, base, group, ctx);
    }

    fn text_line(&self, doc: &mut Document, line: &TextLine, group: Option<GroupRef>, ctx: &mut MapContext) {
        let polygon = coords_polygon(line.coords.as_ref());
        let line_element = if polygon.is_empty() {
            ctx.warn("TextLine/Coords", format!("line [{}] has no usable coordinates", line.id));
            None
        } else {
            Some(doc.add_line_polygon(polygon, group))
        };

        let baseline = coords_polygon(line.baseline.as_ref());
        let baseline_element = if baseline.is_empty() {
            if line.baseline.is_some() {
                ctx.warn("TextLine/Baseline", format!("line [{}] has an unusable baseline", line.id));
            }
            None
        } else {
            Some(doc.add_baseline(baseline, group))
        };

        // The group belongs to the region, so line metadata there is keyed by line id
        let owner = line_element
            .or(baseline_element)
            .map(Target::Element)
            .or(group.map(Target::SharedGroup));

        let attributes = collect_if_present! {
            "primaryLanguage" => line.primary_language,
            "primaryScript" => line.primary_script,
            "secondaryScript" => line.secondary_script,
            "readingDirection" => line.reading_direction,
            "production" => line.production,
            "custom" => line.custom,
            "comments" => line.comments,
            "index" => line.index,
        };
        attach(doc, attributes, owner, "TextLine", &line.id, ctx);

        for equiv in &line.text_equivs {
            text_equiv(doc, equiv, group);
        }

        if let Some(style) = &line.text_style {
            attach(doc, text_style_metadata(style), owner, "TextLine/TextStyle", &line.id, ctx);
        }

        if !line.words.is_empty() {
            ctx.warn(
                "Word",
                format!("{} words in line [{}] are not mapped", line.words.len(), line.id),
            );
        }
        if line.user_defined.is_some() {
            ctx.warn(
                "TextLine/UserDefined",
                format!("user-defined attributes of line [{}] are not mapped", line.id),
            );
        }
        if !line.alternative_images.is_empty() {
            ctx.warn(
                "TextLine/AlternativeImage",
                format!("alternative images of line [{}] are not mapped", line.id),
            );
        }
    }

    fn children(&self, doc: &mut Document, base: &RegionBase, group: Option<GroupRef>, ctx: &mut MapContext) {
        for child in base.children.iter() {
            self.region(doc, child, group, ctx);
        }
    }
}

impl RegionMapper for Page2017Mapper {
    type Tree = PcGts;

    fn initialize(&self, tree: &PcGts, _ctx: &mut MapContext) -> Result<Document> {
        let page = &tree.page;
        let (Some(width), Some(height)) = (page.image_width, page.image_height) else {
            return Err(Error::MissingPageDimensions);
        };

        let mut doc = Document::empty(page.image_filename.as_str(), (height, width));

        match &tree.metadata.creator {
            Some(creator) if creator.is_present() => {
                let date = tree
                    .metadata
                    .created
                    .clone()
                    .unwrap_or_else(|| PageVersion::Page2017.to_string());
                doc.add_creator(creator.as_str(), date);
            }
            _ => log::debug!("No Metadata/Creator in {}", page.image_filename),
        }
        doc.add_creator(self.tool_name.as_str(), self.conversion_date.as_str());

        Ok(doc)
    }

    fn add_metadata(&self, tree: &PcGts, mut doc: Document, ctx: &mut MapContext) -> Result<Document> {
        let metadata = &tree.metadata;
        match &metadata.last_change {
            Some(last_change) => {
                let mut entry = MetadataMap::new();
                entry.insert("LastChange".to_string(), last_change.as_str().into());
                doc.add_metadata(entry);
            }
            None => ctx.warn("Metadata/LastChange", "missing; not recorded"),
        }
        doc.add_metadata(collect_if_present! {
            "Comments" => metadata.comments,
            "externalRef" => metadata.external_ref,
        });
        if let Some(user_defined) = &metadata.user_defined {
            doc.add_metadata(user_defined.flatten());
        }

        let page = &tree.page;
        let page_attributes = collect_if_present! {
            "type" => page.page_type,
            "orientation" => page.orientation,
            "primaryLanguage" => page.primary_language,
            "secondaryLanguage" => page.secondary_language,
            "primaryScript" => page.primary_script,
            "secondaryScript" => page.secondary_script,
            "readingDirection" => page.reading_direction,
            "textLineOrder" => page.text_line_order,
            "imageXResolution" => page.image_x_resolution,
            "imageYResolution" => page.image_y_resolution,
            "imageResolutionUnit" => page.image_resolution_unit,
            "custom" => page.custom,
            "conf" => page.conf,
        };
        let alternative_images: Vec<MetadataMap> =
            page.alternative_images.iter().map(alternative_image_metadata).collect();
        let text_style = page.text_style.as_ref().map(text_style_metadata);
        let page_user_defined = page.user_defined.as_ref().map(|ud| ud.flatten());

        doc.add_metadata(collect_if_present! {
            "Page" => page_attributes,
            "AlternativeImage" => alternative_images,
            "TextStyle" => text_style,
            "PageUserDefined" => page_user_defined,
        });

        if let Some(order) = &page.reading_order {
            ctx.warn(
                "ReadingOrder",
                format!(
                    "reading order with {} region references is not mapped",
                    order.region_ref_count()
                ),
            );
        }
        if let Some(layers) = &page.layers {
            ctx.warn(
                "Layers",
                format!("{} layers are not mapped", layers.layers.len()),
            );
        }
        if let Some(relations) = &page.relations {
            ctx.warn(
                "Relations",
                format!("{} relations are not mapped", relations.relations.len()),
            );
        }

        Ok(doc)
    }

    fn add_regions(&self, tree: &PcGts, mut doc: Document, ctx: &mut MapContext) -> Result<Document> {
        let page = &tree.page;
        if let Some(border) = &page.border {
            self.frame(&mut doc, border.coords.as_ref(), "border", ctx);
        }
        if let Some(print_space) = &page.print_space {
            self.frame(&mut doc, print_space.coords.as_ref(), "print-space", ctx);
        }

        for region in page.regions.iter() {
            self.region(&mut doc, region, None, ctx);
        }

        log::debug!(
            "Mapped {} regions into {} elements and {} groups",
            page.regions.len(),
            doc.content.len(),
            doc.groups.len()
        );
        Ok(doc)
    }
}

fn coords_polygon(coords: Option<&Coords>) -> Polygon {
    parse_optional_points(coords.map(|c| c.points.as_str()))
}

/// Add the region element, or warn and return `None` without geometry.
fn region_element(
    doc: &mut Document,
    base: &RegionBase,
    kind: RegionKind,
    subtype: Option<String>,
    ctx: &mut MapContext,
) -> Option<ElementId> {
    let polygon = coords_polygon(base.coords.as_ref());
    if polygon.is_empty() {
        ctx.warn(
            format!("{}/Coords", kind.element_name()),
            format!("region [{}] has no usable coordinates; no region element", base.id),
        );
        return None;
    }
    Some(doc.add_region(polygon, kind.region_type(), subtype))
}

/// The group for a region subtree: inherited, or opened when needed.
fn subtree_group(
    doc: &mut Document,
    element: Option<ElementId>,
    inherited: Option<GroupRef>,
    needed: bool,
) -> Option<GroupRef> {
    if inherited.is_some() || !needed {
        return inherited;
    }
    Some(match element {
        Some(el) => doc.add_group(el),
        None => doc.new_group(),
    })
}

/// Where passthrough metadata of one region or line goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Element(ElementId),
    /// A group opened by the region itself
    OwnGroup(GroupRef),
    /// A group shared with other regions; entries are keyed by owner id
    SharedGroup(GroupRef),
}

impl Target {
    /// Choose between the region element and its group.
    ///
    /// `shared` marks an inherited group. Such a group is only used when the
    /// region has no element, whatever `group_first` asks for.
    fn pick(
        element: Option<ElementId>,
        group: Option<GroupRef>,
        shared: bool,
        group_first: bool,
    ) -> Option<Target> {
        let element = element.map(Target::Element);
        let group = group.map(|g| {
            if shared {
                Target::SharedGroup(g)
            } else {
                Target::OwnGroup(g)
            }
        });
        if group_first && !shared {
            group.or(element)
        } else {
            element.or(group)
        }
    }
}

/// Attach metadata to `target`, warning when there is nowhere to put it.
fn attach(
    doc: &mut Document,
    metadata: MetadataMap,
    target: Option<Target>,
    field: &str,
    owner: &str,
    ctx: &mut MapContext,
) {
    if !metadata.is_present() {
        return;
    }
    match target {
        Some(Target::Element(id)) => doc.add_content_metadata(metadata, id),
        Some(Target::OwnGroup(g)) => doc.add_content_metadata(metadata, g),
        Some(Target::SharedGroup(g)) => doc.add_group_entry(g, owner, metadata),
        None => ctx.warn(
            field,
            format!(
                "[{}] has neither geometry nor group; dropped {} attributes",
                owner,
                metadata.len()
            ),
        ),
    }
}

fn text_equiv(doc: &mut Document, equiv: &TextEquiv, group: Option<GroupRef>) {
    let element = doc.add_text(equiv.unicode.as_str(), group);
    let metadata = collect_if_present! {
        "index" => equiv.index,
        "conf" => equiv.conf,
        "dataType" => equiv.data_type,
        "dataTypeDetails" => equiv.data_type_details,
        "comments" => equiv.comments,
        "PlainText" => equiv.plain_text,
    };
    if metadata.is_present() {
        doc.add_content_metadata(metadata, element);
    }
}

fn warn_uninterpreted(base: &RegionBase, kind: RegionKind, ctx: &mut MapContext) {
    let name = kind.element_name();
    if base.user_defined.is_some() {
        ctx.warn(
            format!("{}/UserDefined", name),
            format!("user-defined attributes of [{}] are not mapped", base.id),
        );
    }
    if base.roles.is_some() {
        ctx.warn(
            format!("{}/Roles", name),
            format!("roles of [{}] are not mapped", base.id),
        );
    }
    if !base.alternative_images.is_empty() {
        ctx.warn(
            format!("{}/AlternativeImage", name),
            format!(
                "{} alternative images of [{}] are not mapped",
                base.alternative_images.len(),
                base.id
            ),
        );
    }
}

fn region_attributes(region: &Region) -> MetadataMap {
    let base = region.base();
    let mut attributes = collect_if_present! {
        "custom" => base.custom,
        "comments" => base.comments,
        "continuation" => base.continuation,
    };

    let specific = match region {
        Region::Image(r) => collect_if_present! {
            "orientation" => r.orientation,
            "colourDepth" => r.colour_depth,
            "bgColour" => r.bg_colour,
            "embText" => r.emb_text,
        },
        Region::LineDrawing(r) => collect_if_present! {
            "orientation" => r.orientation,
            "penColour" => r.pen_colour,
            "bgColour" => r.bg_colour,
            "embText" => r.emb_text,
        },
        Region::Graphic(r) => collect_if_present! {
            "orientation" => r.orientation,
            "numColours" => r.num_colours,
            "embText" => r.emb_text,
        },
        Region::Table(r) => collect_if_present! {
            "orientation" => r.orientation,
            "rows" => r.rows,
            "columns" => r.columns,
            "lineColour" => r.line_colour,
            "bgColour" => r.bg_colour,
            "lineSeparators" => r.line_separators,
            "embText" => r.emb_text,
        },
        Region::Chart(r) => collect_if_present! {
            "orientation" => r.orientation,
            "numColours" => r.num_colours,
            "bgColour" => r.bg_colour,
            "embText" => r.emb_text,
        },
        Region::Separator(r) => collect_if_present! {
            "orientation" => r.orientation,
            "colour" => r.colour,
        },
        Region::Maths(r) | Region::Chem(r) | Region::Music(r) | Region::Advert(r) => {
            collect_if_present! {
                "orientation" => r.orientation,
                "bgColour" => r.bg_colour,
            }
        }
        Region::Text(_) | Region::Noise(_) | Region::Unknown(_) => MetadataMap::new(),
    };
    attributes.extend(specific);
    attributes
}

fn text_region_attributes(text: &TextRegion) -> MetadataMap {
    collect_if_present! {
        "align" => text.align,
        "comments" => text.base.comments,
        "continuation" => text.base.continuation,
        "custom" => text.base.custom,
        "indented" => text.indented,
        "leading" => text.leading,
        "orientation" => text.orientation,
        "primaryLanguage" => text.primary_language,
        "primaryScript" => text.primary_script,
        "production" => text.production,
        "readingDirection" => text.reading_direction,
        "readingOrientation" => text.reading_orientation,
        "secondaryLanguage" => text.secondary_language,
        "secondaryScript" => text.secondary_script,
        "textLineOrder" => text.text_line_order,
    }
}

fn text_style_metadata(style: &TextStyle) -> MetadataMap {
    collect_if_present! {
        "fontFamily" => style.font_family,
        "serif" => style.serif,
        "monospace" => style.monospace,
        "fontSize" => style.font_size,
        "xHeight" => style.x_height,
        "kerning" => style.kerning,
        "textColour" => style.text_colour,
        "textColourRgb" => style.text_colour_rgb,
        "bgColour" => style.bg_colour,
        "bgColourRgb" => style.bg_colour_rgb,
        "reverseVideo" => style.reverse_video,
        "bold" => style.bold,
        "italic" => style.italic,
        "underlined" => style.underlined,
        "subscript" => style.subscript,
        "superscript" => style.superscript,
        "strikethrough" => style.strikethrough,
        "smallCaps" => style.small_caps,
        "letterSpaced" => style.letter_spaced,
    }
}

fn alternative_image_metadata(image: &AlternativeImage) -> MetadataMap {
    collect_if_present! {
        "filename" => image.filename,
        "comments" => image.comments,
        "conf" => image.conf,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::page2017::{
        ChartRegion, GraphicRegion, ImageRegion, LineDrawingRegion, SeparatorRegion, ShadedRegion,
        TableRegion,
    };
    use crate::convert::Warning;
    use crate::model::ElementKind;
    use chrono::NaiveDate;
    use serde_json::json;

    const NS: &str = page2017::NAMESPACE;

    fn options() -> ConvertOptions {
        ConvertOptions::new().with_conversion_date(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap())
    }

    fn page(body: &str) -> String {
        format!(
            r#"<PcGts xmlns="{NS}">
  <Metadata><Creator>Scanner</Creator><Created>2017-08-01T10:00:00</Created><LastChange>2017-08-02T10:00:00</LastChange></Metadata>
  <Page imageFilename="page.png" imageWidth="800" imageHeight="1200">{body}</Page>
</PcGts>"#
        )
    }

    fn convert(xml: &str) -> (Document, Vec<Warning>) {
        let tree = page2017::parse(xml.as_bytes(), BindingMode::Strict).unwrap();
        let mut ctx = MapContext::new();
        let doc = Page2017Mapper::new(&options()).map(&tree, &mut ctx).unwrap();
        (doc, ctx.into_warnings())
    }

    fn base(id: &str, points: Option<&str>) -> RegionBase {
        RegionBase {
            id: id.to_string(),
            coords: points.map(|p| Coords {
                points: p.to_string(),
                conf: None,
            }),
            ..RegionBase::default()
        }
    }

    #[test]
    fn test_initialize_creators() {
        let (doc, _) = convert(&page(""));
        assert_eq!(doc.filename, "page.png");
        assert_eq!(doc.original_image_size, (1200, 800));
        assert_eq!(doc.creators.len(), 2);
        assert_eq!(doc.creators[0].name, "Scanner");
        assert_eq!(doc.creators[0].date, "2017-08-01T10:00:00");
        assert_eq!(doc.creators[1].name, "shared-file-converter");
        assert_eq!(doc.creators[1].date, "2024-01-02");
        assert_eq!(doc.metadata.get("LastChange"), Some(&json!("2017-08-02T10:00:00")));
    }

    #[test]
    fn test_missing_dimensions() {
        let xml = page("").replace(r#" imageWidth="800""#, "");
        let tree = page2017::parse(xml.as_bytes(), BindingMode::Strict).unwrap();
        let mut ctx = MapContext::new();
        let err = Page2017Mapper::new(&options()).map(&tree, &mut ctx).unwrap_err();
        assert!(matches!(err, Error::MissingPageDimensions));
    }

    #[test]
    fn test_image_region_without_attributes() {
        let (doc, warnings) = convert(&page(
            r#"<ImageRegion id="r1"><Coords points="0,0 100,0 100,50 0,50"/></ImageRegion>"#,
        ));
        assert!(warnings.is_empty());
        assert_eq!(doc.content.len(), 1);
        let el = &doc.content[0];
        assert_eq!(el.polygon().unwrap().to_points_string(), "0,0 100,0 100,50 0,50");
        assert!(matches!(&el.kind, ElementKind::Region { region_type, .. } if region_type == "image"));
        assert!(el.content_metadata.is_empty());
        assert!(el.group.is_none());
    }

    #[test]
    fn test_complex_text_region_shares_group() {
        let (doc, _) = convert(&page(
            r#"<TextRegion id="t1" align="left">
                 <Coords points="0,0 10,0 10,10 0,10"/>
                 <TextLine id="l1" index="3">
                   <Coords points="1,1 9,1 9,4 1,4"/>
                   <Baseline points="1,4 9,4"/>
                   <TextEquiv conf="0.9"><Unicode>hello</Unicode></TextEquiv>
                 </TextLine>
               </TextRegion>"#,
        ));
        assert_eq!(doc.content.len(), 4);
        let group = doc.content[0].group.expect("region is grouped");
        assert!(doc.content.iter().all(|el| el.group == Some(group)));
        assert!(matches!(doc.content[1].kind, ElementKind::Line { .. }));
        assert!(matches!(doc.content[2].kind, ElementKind::Baseline { .. }));
        assert_eq!(doc.content[3].text(), Some("hello"));
        assert_eq!(doc.content[3].content_metadata.get("conf"), Some(&json!(0.9)));
        assert_eq!(doc.content[1].content_metadata.get("index"), Some(&json!(3)));

        let group_meta = &doc.group(group).unwrap().content_metadata;
        assert_eq!(group_meta.get("align"), Some(&json!("left")));
    }

    #[test]
    fn test_simple_text_region() {
        let (doc, _) = convert(&page(
            r#"<TextRegion id="t1" type="paragraph" align="justify">
                 <Coords points="0,0 10,0 10,10"/>
                 <TextStyle bold="true" fontSize="12"/>
               </TextRegion>"#,
        ));
        assert_eq!(doc.content.len(), 1);
        let el = &doc.content[0];
        assert!(el.group.is_none());
        assert!(doc.groups.is_empty());
        assert!(matches!(
            &el.kind,
            ElementKind::Region { region_type, region_subtype: Some(sub), .. }
                if region_type == "text" && sub == "paragraph"
        ));
        assert_eq!(el.content_metadata.get("bold"), Some(&json!(true)));
        assert_eq!(el.content_metadata.get("fontSize"), Some(&json!(12.0)));
        assert_eq!(el.content_metadata.get("align"), Some(&json!("justify")));
    }

    #[test]
    fn test_nested_groups_per_subtree() {
        let (doc, _) = convert(&page(
            r#"<TableRegion id="a" rows="2">
                 <Coords points="0,0 50,0 50,50"/>
                 <ImageRegion id="a1"><Coords points="1,1 2,1 2,2"/>
                   <SeparatorRegion id="a11"><Coords points="1,1 2,2"/></SeparatorRegion>
                 </ImageRegion>
               </TableRegion>
               <ChartRegion id="b" type="pie">
                 <Coords points="60,0 90,0 90,50"/>
                 <NoiseRegion id="b1"><Coords points="61,1 62,2"/></NoiseRegion>
               </ChartRegion>
               <SeparatorRegion id="c"><Coords points="0,60 9,60"/></SeparatorRegion>"#,
        ));

        let ids: Vec<_> = doc.content.iter().map(|el| el.group).collect();
        assert_eq!(doc.groups.len(), 2);
        let ga = ids[0].unwrap();
        assert_eq!(&ids[..3], &[Some(ga), Some(ga), Some(ga)]);
        let gb = ids[3].unwrap();
        assert_ne!(ga, gb);
        assert_eq!(ids[4], Some(gb));
        assert_eq!(ids[5], None);

        assert_eq!(doc.content[0].content_metadata.get("rows"), Some(&json!(2)));
        assert!(matches!(
            &doc.content[3].kind,
            ElementKind::Region { region_subtype: Some(sub), .. } if sub == "pie"
        ));
    }

    #[test]
    fn test_sibling_cells_keep_their_attributes() {
        let (doc, warnings) = convert(&page(
            r#"<TableRegion id="tab" comments="the table">
                 <Coords points="0,0 100,0 100,100 0,100"/>
                 <TextRegion id="c1" primaryLanguage="German" comments="cell one">
                   <Coords points="0,0 50,0 50,50"/>
                   <TextLine id="l1"><Coords points="1,1 49,1 49,9"/><TextEquiv><Unicode>eins</Unicode></TextEquiv></TextLine>
                 </TextRegion>
                 <TextRegion id="c2" primaryLanguage="English" comments="cell two">
                   <Coords points="50,0 100,0 100,50"/>
                   <TextLine id="l2"><Coords points="51,1 99,1 99,9"/><TextEquiv><Unicode>two</Unicode></TextEquiv></TextLine>
                 </TextRegion>
                 <NoiseRegion id="n" custom="smudge"><Coords points=""/></NoiseRegion>
               </TableRegion>"#,
        ));

        assert_eq!(doc.groups.len(), 1);
        let table = &doc.content[0];
        assert_eq!(table.content_metadata.get("comments"), Some(&json!("the table")));

        let cells: Vec<_> = doc.regions_of_type("text").collect();
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].content_metadata.get("primaryLanguage"), Some(&json!("German")));
        assert_eq!(cells[0].content_metadata.get("comments"), Some(&json!("cell one")));
        assert_eq!(cells[1].content_metadata.get("primaryLanguage"), Some(&json!("English")));
        assert_eq!(cells[1].content_metadata.get("comments"), Some(&json!("cell two")));
        assert!(doc.content.iter().all(|el| el.group == table.group));

        // A region without geometry keeps its attributes under its id
        let group = doc.group(table.group.unwrap()).unwrap();
        assert_eq!(
            group.content_metadata.get("n"),
            Some(&json!({"custom": "smudge"}))
        );
        assert!(group.content_metadata.get("comments").is_none());
        assert!(!warnings.iter().any(|w| w.field == "NoiseRegion"));
    }

    #[test]
    fn test_line_without_geometry_keyed_by_id() {
        let (doc, _) = convert(&page(
            r#"<TextRegion id="t" align="left"><Coords points="0,0 5,0 5,5"/>
                 <TextLine id="l" production="printed"><Coords points=""/><TextEquiv><Unicode>x</Unicode></TextEquiv></TextLine>
               </TextRegion>"#,
        ));
        let group = doc.group(doc.content[0].group.unwrap()).unwrap();
        assert_eq!(group.content_metadata.get("align"), Some(&json!("left")));
        assert_eq!(group.content_metadata.get("l"), Some(&json!({"production": "printed"})));
    }

    #[test]
    fn test_region_without_coords() {
        let (doc, warnings) = convert(&page(
            r#"<GraphicRegion id="g" comments="stamp">
                 <Coords points=""/>
                 <ImageRegion id="g1"><Coords points="0,0 1,0 1,1"/></ImageRegion>
               </GraphicRegion>
               <SeparatorRegion id="s" colour="black"><Coords points="bad"/></SeparatorRegion>"#,
        ));
        assert_eq!(doc.content.len(), 1);
        let group = doc.content[0].group.unwrap();
        let g = doc.group(group).unwrap();
        assert_eq!(g.region, None);
        assert_eq!(g.content_metadata.get("comments"), Some(&json!("stamp")));

        assert!(warnings.iter().any(|w| w.field == "GraphicRegion/Coords"));
        assert!(warnings.iter().any(|w| w.field == "SeparatorRegion/Coords"));
        assert!(warnings.iter().any(|w| w.field == "SeparatorRegion" && w.message.contains("[s]")));
    }

    #[test]
    fn test_page_level_metadata_and_warnings() {
        let (doc, warnings) = convert(&page(
            r#"<AlternativeImage filename="bin.png" comments="binarized"/>
               <Border><Coords points="0,0 800,0 800,1200 0,1200"/></Border>
               <PrintSpace><Coords points="10,10 790,10 790,1190 10,1190"/></PrintSpace>
               <ReadingOrder><OrderedGroup id="ro" caption="main">
                 <RegionRefIndexed index="0" regionRef="r1"/>
                 <RegionRefIndexed index="1" regionRef="r2"/>
               </OrderedGroup></ReadingOrder>
               <Layers><Layer id="l0" zIndex="0"><RegionRef regionRef="r1"/></Layer></Layers>
               <UserDefined><UserAttribute name="scanner" value="X1"/></UserDefined>"#,
        ));

        assert_eq!(doc.content.len(), 2);
        assert_eq!(doc.regions_of_type("border").count(), 1);
        assert_eq!(doc.regions_of_type("print-space").count(), 1);
        assert_eq!(
            doc.metadata.get("AlternativeImage"),
            Some(&json!([{"filename": "bin.png", "comments": "binarized"}]))
        );
        assert_eq!(doc.metadata.get("PageUserDefined"), Some(&json!({"scanner": "X1"})));

        let order = warnings.iter().find(|w| w.field == "ReadingOrder").unwrap();
        assert!(order.message.contains("2 region references"));
        assert!(warnings.iter().any(|w| w.field == "Layers" && w.message.contains("1 layers")));
    }

    #[test]
    fn test_words_warn() {
        let (doc, warnings) = convert(&page(
            r#"<TextRegion id="t"><Coords points="0,0 5,0 5,5"/>
                 <TextLine id="l"><Coords points="0,0 5,0 5,2"/>
                   <Word id="w"><Coords points="0,0 2,0 2,2"/><TextEquiv><Unicode>hi</Unicode></TextEquiv></Word>
                 </TextLine>
               </TextRegion>"#,
        ));
        assert_eq!(doc.content.len(), 2);
        assert!(warnings.iter().any(|w| w.field == "Word" && w.message.contains("1 words")));
    }

    #[test]
    fn test_attribute_presence_per_kind() {
        let polygon = Some("0,0 1,0 1,1");
        let full = vec![
            (
                Region::Image(ImageRegion {
                    base: base("i", polygon),
                    orientation: Some(0.0),
                    colour_depth: Some("bilevel".into()),
                    bg_colour: Some("white".into()),
                    emb_text: Some(false),
                }),
                vec!["orientation", "colourDepth", "bgColour", "embText"],
            ),
            (
                Region::LineDrawing(LineDrawingRegion {
                    base: base("d", polygon),
                    orientation: Some(1.5),
                    pen_colour: Some("black".into()),
                    bg_colour: Some("white".into()),
                    emb_text: Some(true),
                }),
                vec!["orientation", "penColour", "bgColour", "embText"],
            ),
            (
                Region::Graphic(GraphicRegion {
                    base: base("g", polygon),
                    orientation: Some(0.0),
                    graphic_type: Some("logo".into()),
                    num_colours: Some(3),
                    emb_text: Some(false),
                }),
                vec!["orientation", "numColours", "embText"],
            ),
            (
                Region::Table(TableRegion {
                    base: base("t", polygon),
                    grid: None,
                    orientation: Some(0.0),
                    rows: Some(2),
                    columns: Some(3),
                    line_colour: Some("black".into()),
                    bg_colour: Some("white".into()),
                    line_separators: Some(true),
                    emb_text: Some(false),
                }),
                vec!["orientation", "rows", "columns", "lineColour", "bgColour", "lineSeparators", "embText"],
            ),
            (
                Region::Chart(ChartRegion {
                    base: base("c", polygon),
                    orientation: Some(0.0),
                    chart_type: Some("bar".into()),
                    num_colours: Some(4),
                    bg_colour: Some("white".into()),
                    emb_text: Some(true),
                }),
                vec!["orientation", "numColours", "bgColour", "embText"],
            ),
            (
                Region::Separator(SeparatorRegion {
                    base: base("s", polygon),
                    orientation: Some(90.0),
                    colour: Some("black".into()),
                }),
                vec!["orientation", "colour"],
            ),
            (
                Region::Music(ShadedRegion {
                    base: base("m", polygon),
                    orientation: Some(0.0),
                    bg_colour: Some("white".into()),
                }),
                vec!["orientation", "bgColour"],
            ),
        ];

        for (region, expected) in full {
            let attributes = region_attributes(&region);
            let mut keys: Vec<_> = attributes.keys().map(String::as_str).collect();
            keys.sort_unstable();
            let mut expected = expected;
            expected.sort_unstable();
            assert_eq!(keys, expected, "attributes of {}", region.id());
        }

        let empty = Region::Table(TableRegion {
            base: base("t", polygon),
            ..TableRegion::default()
        });
        assert!(region_attributes(&empty).is_empty());

        let mut common = base("n", polygon);
        common.custom = Some("structure {type:noise;}".into());
        common.continuation = Some(false);
        let keys: Vec<_> = region_attributes(&Region::Noise(common)).keys().cloned().collect();
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn test_text_style_presence() {
        let full = TextStyle {
            font_family: Some("Times".into()),
            serif: Some(true),
            monospace: Some(false),
            font_size: Some(10.5),
            x_height: Some(7),
            kerning: Some(0),
            text_colour: Some("black".into()),
            text_colour_rgb: Some(0),
            bg_colour: Some("white".into()),
            bg_colour_rgb: Some(16777215),
            reverse_video: Some(false),
            bold: Some(false),
            italic: Some(true),
            underlined: Some(false),
            subscript: Some(false),
            superscript: Some(false),
            strikethrough: Some(false),
            small_caps: Some(false),
            letter_spaced: Some(false),
        };
        assert_eq!(text_style_metadata(&full).len(), 19);
        assert!(text_style_metadata(&TextStyle::default()).is_empty());
    }
}

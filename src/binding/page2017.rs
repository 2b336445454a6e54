//! Typed tree for PAGE content documents, version 2017-07-15.
//!
//! The tree is owned and immutable once built. Enumerated attributes are
//! kept as the strings found in the document since they are only ever passed
//! through as metadata.

use super::{parse_xml, Binder, BindingMode};
use crate::convert::Warning;
use crate::error::Result;
use roxmltree::Node;
use std::collections::BTreeMap;

/// Namespace of the 2017-07-15 schema.
pub const NAMESPACE: &str = "http://schema.primaresearch.org/PAGE/gts/pagecontent/2017-07-15";

/// Document root.
#[derive(Debug, Clone, PartialEq)]
pub struct PcGts {
    /// Optional document identifier
    pub pc_gts_id: Option<String>,
    /// Creation metadata
    pub metadata: Metadata,
    /// The page content
    pub page: Page,
}

/// Document metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    /// Producing software or person
    pub creator: Option<String>,
    /// Creation timestamp as written
    pub created: Option<String>,
    /// Last modification timestamp as written
    pub last_change: Option<String>,
    /// Free-form comments
    pub comments: Option<String>,
    /// User-defined attributes
    pub user_defined: Option<UserDefined>,
    /// Reference to an external record
    pub external_ref: Option<String>,
}

/// A list of user-defined name/value attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserDefined {
    /// Attributes in document order
    pub attributes: Vec<UserAttribute>,
}

impl UserDefined {
    /// Flatten into a `name -> value` map; attributes without a name are dropped.
    pub fn flatten(&self) -> crate::model::MetadataMap {
        self.attributes
            .iter()
            .filter_map(|a| {
                let name = a.name.as_ref()?;
                let value = a.value.clone().unwrap_or_default();
                Some((name.clone(), serde_json::Value::String(value)))
            })
            .collect()
    }
}

/// A single user-defined attribute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserAttribute {
    /// Attribute name
    pub name: Option<String>,
    /// Human-readable description
    pub description: Option<String>,
    /// Declared value type (xsd:string, xsd:integer and so on)
    pub value_type: Option<String>,
    /// Attribute value
    pub value: Option<String>,
}

/// The page and everything on it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// Filename of the scanned image
    pub image_filename: String,
    /// Image width in pixels
    pub image_width: Option<u32>,
    /// Image height in pixels
    pub image_height: Option<u32>,
    /// Horizontal resolution
    pub image_x_resolution: Option<f64>,
    /// Vertical resolution
    pub image_y_resolution: Option<f64>,
    /// Resolution unit (PPI, PPCM or other)
    pub image_resolution_unit: Option<String>,
    /// Free-form custom attribute string
    pub custom: Option<String>,
    /// Rotation in degrees, counter-clockwise
    pub orientation: Option<f64>,
    /// Page type (front-cover, content and so on)
    pub page_type: Option<String>,
    /// Primary language
    pub primary_language: Option<String>,
    /// Secondary language
    pub secondary_language: Option<String>,
    /// Primary script
    pub primary_script: Option<String>,
    /// Secondary script
    pub secondary_script: Option<String>,
    /// Direction text is read in
    pub reading_direction: Option<String>,
    /// Order lines are read in
    pub text_line_order: Option<String>,
    /// Confidence in [0, 1]
    pub conf: Option<f64>,

    /// Alternative renditions of the image area
    pub alternative_images: Vec<AlternativeImage>,
    /// Outer page border
    pub border: Option<Border>,
    /// Area containing the printed content
    pub print_space: Option<PrintSpace>,
    /// Reading order of the regions
    pub reading_order: Option<ReadingOrder>,
    /// Region layering
    pub layers: Option<Layers>,
    /// Links between regions
    pub relations: Option<Relations>,
    /// Typographic attributes
    pub text_style: Option<TextStyle>,
    /// User-defined attributes
    pub user_defined: Option<UserDefined>,
    /// Top-level regions
    pub regions: RegionCollections,
}

/// A `points` attribute with its confidence. Used for Coords and Baseline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Coords {
    /// Point list as `x,y` pairs separated by spaces
    pub points: String,
    /// Confidence in [0, 1]
    pub conf: Option<f64>,
}

/// Another rendition of an image area, such as a binarized copy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlternativeImage {
    /// Filename of the alternative image
    pub filename: String,
    /// Free-form comments
    pub comments: Option<String>,
    /// Confidence in [0, 1]
    pub conf: Option<f64>,
}

/// The page border.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Border {
    /// Border polygon
    pub coords: Option<Coords>,
}

/// The area of the page that holds printed content.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrintSpace {
    /// Print space polygon
    pub coords: Option<Coords>,
}

/// Reading order: a single ordered or unordered root group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadingOrder {
    /// Confidence in [0, 1]
    pub conf: Option<f64>,
    /// Root group of the order
    pub root: Option<OrderGroup>,
}

impl ReadingOrder {
    /// Number of region references anywhere in the order.
    pub fn region_ref_count(&self) -> usize {
        self.root.as_ref().map_or(0, OrderGroup::region_ref_count)
    }
}

/// An ordered or unordered reading-order group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderGroup {
    /// Document-unique identifier
    pub id: String,
    /// Whether members are in reading order
    pub ordered: bool,
    /// Position among its siblings
    pub index: Option<i64>,
    /// Region the group stands for
    pub region_ref: Option<String>,
    /// Caption text
    pub caption: Option<String>,
    /// Group type
    pub group_type: Option<String>,
    /// Member references and nested groups
    pub members: Vec<OrderMember>,
}

impl OrderGroup {
    fn region_ref_count(&self) -> usize {
        self.members
            .iter()
            .map(|m| match m {
                OrderMember::RegionRef { .. } => 1,
                OrderMember::Group(g) => g.region_ref_count(),
            })
            .sum()
    }
}

/// An entry of a reading-order group.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderMember {
    /// A reference to a region
    RegionRef {
        index: Option<i64>,
        region_ref: String,
    },
    /// A nested group
    Group(OrderGroup),
}

/// Region layers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layers {
    /// Layers in document order
    pub layers: Vec<Layer>,
}

/// A set of regions drawn at one stacking level.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layer {
    /// Document-unique identifier
    pub id: String,
    /// Stacking position
    pub z_index: Option<i64>,
    /// Caption text
    pub caption: Option<String>,
    /// Ids of the regions on this layer
    pub region_refs: Vec<String>,
}

/// Relations between regions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Relations {
    /// Relations in document order
    pub relations: Vec<Relation>,
}

/// A link or join between two regions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Relation {
    /// Document-unique identifier
    pub id: Option<String>,
    /// Relation type (link or join)
    pub relation_type: Option<String>,
    /// Source region id
    pub source: Option<String>,
    /// Target region id
    pub target: Option<String>,
    /// Free-form custom attribute string
    pub custom: Option<String>,
    /// Free-form comments
    pub comments: Option<String>,
}

/// Typographic attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextStyle {
    /// Font family name
    pub font_family: Option<String>,
    /// Serif font
    pub serif: Option<bool>,
    /// Fixed-width font
    pub monospace: Option<bool>,
    /// Font size in points
    pub font_size: Option<f64>,
    /// Height of a lowercase x in pixels
    pub x_height: Option<i64>,
    /// Kerning adjustment
    pub kerning: Option<i64>,
    /// Named text colour
    pub text_colour: Option<String>,
    /// Text colour as an RGB integer
    pub text_colour_rgb: Option<i64>,
    /// Named background colour
    pub bg_colour: Option<String>,
    /// Background colour as an RGB integer
    pub bg_colour_rgb: Option<i64>,
    /// Light text on a dark background
    pub reverse_video: Option<bool>,
    /// Bold
    pub bold: Option<bool>,
    /// Italic
    pub italic: Option<bool>,
    /// Underlined
    pub underlined: Option<bool>,
    /// Subscript
    pub subscript: Option<bool>,
    /// Superscript
    pub superscript: Option<bool>,
    /// Struck through
    pub strikethrough: Option<bool>,
    /// Small capitals
    pub small_caps: Option<bool>,
    /// Letter-spaced
    pub letter_spaced: Option<bool>,
}

/// A transcription.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextEquiv {
    /// Text without special characters
    pub plain_text: Option<String>,
    /// Full Unicode text
    pub unicode: String,
    /// Rank among alternative transcriptions
    pub index: Option<i64>,
    /// Confidence in [0, 1]
    pub conf: Option<f64>,
    /// Data type of the text (xsd:string and so on)
    pub data_type: Option<String>,
    /// Details on the data type
    pub data_type_details: Option<String>,
    /// Free-form comments
    pub comments: Option<String>,
}

/// Position of a region inside a table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableCellRole {
    /// Row of the cell
    pub row_index: Option<i64>,
    /// Column of the cell
    pub column_index: Option<i64>,
    /// Rows the cell spans
    pub row_span: Option<i64>,
    /// Columns the cell spans
    pub col_span: Option<i64>,
    /// Whether the cell is a header
    pub header: Option<bool>,
}

/// Roles a region plays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Roles {
    /// Role as a table cell
    pub table_cell_role: Option<TableCellRole>,
}

/// A table grid: rows of points.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    /// Grid rows, top to bottom
    pub rows: Vec<GridPoints>,
}

/// One row of grid points.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridPoints {
    /// Row number
    pub index: Option<i64>,
    /// Point list as `x,y` pairs separated by spaces
    pub points: String,
}

/// A text line and its transcriptions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextLine {
    /// Document-unique identifier
    pub id: String,
    /// Alternative renditions of the image area
    pub alternative_images: Vec<AlternativeImage>,
    /// Line polygon
    pub coords: Option<Coords>,
    /// Baseline polyline
    pub baseline: Option<Coords>,
    /// Words on the line
    pub words: Vec<Word>,
    /// Transcriptions, in document order
    pub text_equivs: Vec<TextEquiv>,
    /// Typographic attributes
    pub text_style: Option<TextStyle>,
    /// User-defined attributes
    pub user_defined: Option<UserDefined>,

    /// Primary language
    pub primary_language: Option<String>,
    /// Primary script
    pub primary_script: Option<String>,
    /// Secondary script
    pub secondary_script: Option<String>,
    /// Direction text is read in
    pub reading_direction: Option<String>,
    /// How the text was produced (printed, handwritten and so on)
    pub production: Option<String>,
    /// Free-form custom attribute string
    pub custom: Option<String>,
    /// Free-form comments
    pub comments: Option<String>,
    /// Position among its siblings
    pub index: Option<i64>,
}

/// A word on a text line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Word {
    /// Document-unique identifier
    pub id: String,
    /// Word polygon
    pub coords: Option<Coords>,
    /// Glyphs of the word
    pub glyphs: Vec<Glyph>,
    /// Transcriptions, in document order
    pub text_equivs: Vec<TextEquiv>,
}

/// A single glyph of a word.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Glyph {
    /// Document-unique identifier
    pub id: String,
    /// Glyph polygon
    pub coords: Option<Coords>,
    /// Transcriptions, in document order
    pub text_equivs: Vec<TextEquiv>,
}

/// The thirteen region kinds, in mapping order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RegionKind {
    Text,
    Image,
    LineDrawing,
    Graphic,
    Table,
    Chart,
    Separator,
    Maths,
    Chem,
    Music,
    Advert,
    Noise,
    Unknown,
}

impl RegionKind {
    /// All kinds, in mapping order.
    pub const ALL: [RegionKind; 13] = [
        RegionKind::Text,
        RegionKind::Image,
        RegionKind::LineDrawing,
        RegionKind::Graphic,
        RegionKind::Table,
        RegionKind::Chart,
        RegionKind::Separator,
        RegionKind::Maths,
        RegionKind::Chem,
        RegionKind::Music,
        RegionKind::Advert,
        RegionKind::Noise,
        RegionKind::Unknown,
    ];

    /// XML element name.
    pub fn element_name(&self) -> &'static str {
        match self {
            RegionKind::Text => "TextRegion",
            RegionKind::Image => "ImageRegion",
            RegionKind::LineDrawing => "LineDrawingRegion",
            RegionKind::Graphic => "GraphicRegion",
            RegionKind::Table => "TableRegion",
            RegionKind::Chart => "ChartRegion",
            RegionKind::Separator => "SeparatorRegion",
            RegionKind::Maths => "MathsRegion",
            RegionKind::Chem => "ChemRegion",
            RegionKind::Music => "MusicRegion",
            RegionKind::Advert => "AdvertRegion",
            RegionKind::Noise => "NoiseRegion",
            RegionKind::Unknown => "UnknownRegion",
        }
    }

    /// Region type in the shared document.
    pub fn region_type(&self) -> &'static str {
        match self {
            RegionKind::Text => "text",
            RegionKind::Image => "image",
            RegionKind::LineDrawing => "line-drawing",
            RegionKind::Graphic => "graphic",
            RegionKind::Table => "table",
            RegionKind::Chart => "chart",
            RegionKind::Separator => "separator",
            RegionKind::Maths => "maths",
            RegionKind::Chem => "chem",
            RegionKind::Music => "music",
            RegionKind::Advert => "advert",
            RegionKind::Noise => "noise",
            RegionKind::Unknown => "unknown",
        }
    }

    /// Look up a kind by XML element name.
    pub fn from_element_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.element_name() == name)
    }
}

/// Nested regions grouped by kind.
///
/// Iteration visits kinds in [`RegionKind::ALL`] order and regions of one
/// kind in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionCollections {
    by_kind: BTreeMap<RegionKind, Vec<Region>>,
}

impl RegionCollections {
    /// Empty collections.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a region under its kind.
    pub fn push(&mut self, region: Region) {
        self.by_kind.entry(region.kind()).or_default().push(region);
    }

    /// Regions of one kind.
    pub fn get(&self, kind: RegionKind) -> &[Region] {
        self.by_kind.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All regions, in kind order then document order.
    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.by_kind.values().flatten()
    }

    /// Number of regions.
    pub fn len(&self) -> usize {
        self.by_kind.values().map(Vec::len).sum()
    }

    /// Whether there are no regions.
    pub fn is_empty(&self) -> bool {
        self.by_kind.values().all(Vec::is_empty)
    }
}

/// Fields every region kind shares.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionBase {
    /// Document-unique identifier
    pub id: String,
    /// Outline polygon
    pub coords: Option<Coords>,
    /// Free-form custom attribute string
    pub custom: Option<String>,
    /// Free-form comments
    pub comments: Option<String>,
    /// Whether the region continues another one
    pub continuation: Option<bool>,
    /// Alternative renditions of the image area
    pub alternative_images: Vec<AlternativeImage>,
    /// User-defined attributes
    pub user_defined: Option<UserDefined>,
    /// Roles such as table cell
    pub roles: Option<Roles>,
    /// Nested regions
    pub children: RegionCollections,
}

/// A region of text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextRegion {
    /// Fields shared by all region kinds
    pub base: RegionBase,
    /// Lines in document order
    pub text_lines: Vec<TextLine>,
    /// Transcriptions, in document order
    pub text_equivs: Vec<TextEquiv>,
    /// Typographic attributes
    pub text_style: Option<TextStyle>,

    /// Rotation in degrees, counter-clockwise
    pub orientation: Option<f64>,
    /// Text type (paragraph, heading and so on)
    pub text_type: Option<String>,
    /// Space between lines in pixels
    pub leading: Option<i64>,
    /// Direction text is read in
    pub reading_direction: Option<String>,
    /// Reading orientation in degrees
    pub reading_orientation: Option<f64>,
    /// Whether the first line is indented
    pub indented: Option<bool>,
    /// Text alignment
    pub align: Option<String>,
    /// Primary language
    pub primary_language: Option<String>,
    /// Secondary language
    pub secondary_language: Option<String>,
    /// Primary script
    pub primary_script: Option<String>,
    /// Secondary script
    pub secondary_script: Option<String>,
    /// How the text was produced (printed, handwritten and so on)
    pub production: Option<String>,
    /// Order lines are read in
    pub text_line_order: Option<String>,
}

impl TextRegion {
    /// A text region is complex when it carries lines or transcriptions.
    pub fn is_complex(&self) -> bool {
        !self.text_lines.is_empty() || !self.text_equivs.is_empty()
    }
}

/// A photograph or other raster image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageRegion {
    /// Fields shared by all region kinds
    pub base: RegionBase,
    /// Rotation in degrees, counter-clockwise
    pub orientation: Option<f64>,
    /// Colour depth (bilevel, greyscale, colour)
    pub colour_depth: Option<String>,
    /// Background colour
    pub bg_colour: Option<String>,
    /// Whether the region contains embedded text
    pub emb_text: Option<bool>,
}

/// A line drawing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineDrawingRegion {
    /// Fields shared by all region kinds
    pub base: RegionBase,
    /// Rotation in degrees, counter-clockwise
    pub orientation: Option<f64>,
    /// Pen colour
    pub pen_colour: Option<String>,
    /// Background colour
    pub bg_colour: Option<String>,
    /// Whether the region contains embedded text
    pub emb_text: Option<bool>,
}

/// A graphic such as a logo or stamp.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphicRegion {
    /// Fields shared by all region kinds
    pub base: RegionBase,
    /// Rotation in degrees, counter-clockwise
    pub orientation: Option<f64>,
    /// Graphic type (logo, stamp and so on)
    pub graphic_type: Option<String>,
    /// Number of colours
    pub num_colours: Option<i64>,
    /// Whether the region contains embedded text
    pub emb_text: Option<bool>,
}

/// A table; cells are nested regions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableRegion {
    /// Fields shared by all region kinds
    pub base: RegionBase,
    /// Cell grid
    pub grid: Option<Grid>,
    /// Rotation in degrees, counter-clockwise
    pub orientation: Option<f64>,
    /// Number of rows
    pub rows: Option<i64>,
    /// Number of columns
    pub columns: Option<i64>,
    /// Colour of the ruling lines
    pub line_colour: Option<String>,
    /// Background colour
    pub bg_colour: Option<String>,
    /// Whether the table has ruling lines
    pub line_separators: Option<bool>,
    /// Whether the region contains embedded text
    pub emb_text: Option<bool>,
}

/// A chart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartRegion {
    /// Fields shared by all region kinds
    pub base: RegionBase,
    /// Rotation in degrees, counter-clockwise
    pub orientation: Option<f64>,
    /// Chart type (bar, pie and so on)
    pub chart_type: Option<String>,
    /// Number of colours
    pub num_colours: Option<i64>,
    /// Background colour
    pub bg_colour: Option<String>,
    /// Whether the region contains embedded text
    pub emb_text: Option<bool>,
}

/// A separator line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeparatorRegion {
    /// Fields shared by all region kinds
    pub base: RegionBase,
    /// Rotation in degrees, counter-clockwise
    pub orientation: Option<f64>,
    /// Separator colour
    pub colour: Option<String>,
}

/// Maths, chemistry, music and advert regions: orientation and background only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShadedRegion {
    /// Fields shared by all region kinds
    pub base: RegionBase,
    /// Rotation in degrees, counter-clockwise
    pub orientation: Option<f64>,
    /// Background colour
    pub bg_colour: Option<String>,
}

/// A region of any kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Region {
    Text(TextRegion),
    Image(ImageRegion),
    LineDrawing(LineDrawingRegion),
    Graphic(GraphicRegion),
    Table(TableRegion),
    Chart(ChartRegion),
    Separator(SeparatorRegion),
    Maths(ShadedRegion),
    Chem(ShadedRegion),
    Music(ShadedRegion),
    Advert(ShadedRegion),
    Noise(RegionBase),
    Unknown(RegionBase),
}

impl Region {
    /// Kind of the region.
    pub fn kind(&self) -> RegionKind {
        match self {
            Region::Text(_) => RegionKind::Text,
            Region::Image(_) => RegionKind::Image,
            Region::LineDrawing(_) => RegionKind::LineDrawing,
            Region::Graphic(_) => RegionKind::Graphic,
            Region::Table(_) => RegionKind::Table,
            Region::Chart(_) => RegionKind::Chart,
            Region::Separator(_) => RegionKind::Separator,
            Region::Maths(_) => RegionKind::Maths,
            Region::Chem(_) => RegionKind::Chem,
            Region::Music(_) => RegionKind::Music,
            Region::Advert(_) => RegionKind::Advert,
            Region::Noise(_) => RegionKind::Noise,
            Region::Unknown(_) => RegionKind::Unknown,
        }
    }

    /// Fields shared by every kind.
    pub fn base(&self) -> &RegionBase {
        match self {
            Region::Text(r) => &r.base,
            Region::Image(r) => &r.base,
            Region::LineDrawing(r) => &r.base,
            Region::Graphic(r) => &r.base,
            Region::Table(r) => &r.base,
            Region::Chart(r) => &r.base,
            Region::Separator(r) => &r.base,
            Region::Maths(r) | Region::Chem(r) | Region::Music(r) | Region::Advert(r) => &r.base,
            Region::Noise(base) | Region::Unknown(base) => base,
        }
    }

    /// Region id.
    pub fn id(&self) -> &str {
        &self.base().id
    }
}

/// Parse a PAGE 2017 document, discarding binding warnings after logging them.
pub fn parse(bytes: &[u8], mode: BindingMode) -> Result<PcGts> {
    let mut warnings = Vec::new();
    parse_with_warnings(bytes, mode, &mut warnings)
}

/// Parse a PAGE 2017 document, collecting relaxed-mode warnings.
pub fn parse_with_warnings(
    bytes: &[u8],
    mode: BindingMode,
    warnings: &mut Vec<Warning>,
) -> Result<PcGts> {
    let doc = parse_xml(bytes)?;
    let mut b = Binder::new(mode, NAMESPACE, warnings);
    let root = b.root(&doc, "PcGts")?;

    let metadata = match b.required_child(root, "Metadata")? {
        Some(node) => metadata(&mut b, node)?,
        None => Metadata::default(),
    };
    let page = match b.child(root, "Page") {
        Some(node) => page(&mut b, node)?,
        None => {
            return Err(crate::Error::Binding(
                "<PcGts> is missing required child <Page>".to_string(),
            ))
        }
    };

    Ok(PcGts {
        pc_gts_id: b.attr(root, "pcGtsId"),
        metadata,
        page,
    })
}

fn metadata(b: &mut Binder<'_>, node: Node<'_, '_>) -> Result<Metadata> {
    Ok(Metadata {
        creator: b.child_text(node, "Creator"),
        created: b.child_text(node, "Created"),
        last_change: b.child_text(node, "LastChange"),
        comments: b.child_text(node, "Comments"),
        user_defined: user_defined(b, node)?,
        external_ref: b.attr(node, "externalRef"),
    })
}

fn user_defined(b: &mut Binder<'_>, parent: Node<'_, '_>) -> Result<Option<UserDefined>> {
    let Some(node) = b.child(parent, "UserDefined") else {
        return Ok(None);
    };
    let attributes = b
        .children(node, "UserAttribute")
        .map(|n| UserAttribute {
            name: b.attr(n, "name"),
            description: b.attr(n, "description"),
            value_type: b.attr(n, "type"),
            value: b.attr(n, "value"),
        })
        .collect();
    Ok(Some(UserDefined { attributes }))
}

fn page(b: &mut Binder<'_>, node: Node<'_, '_>) -> Result<Page> {
    Ok(Page {
        image_filename: b.required_attr(node, "imageFilename")?.unwrap_or_default(),
        image_width: b.attr_parse(node, "imageWidth")?,
        image_height: b.attr_parse(node, "imageHeight")?,
        image_x_resolution: b.attr_parse(node, "imageXResolution")?,
        image_y_resolution: b.attr_parse(node, "imageYResolution")?,
        image_resolution_unit: b.attr(node, "imageResolutionUnit"),
        custom: b.attr(node, "custom"),
        orientation: b.attr_parse(node, "orientation")?,
        page_type: b.attr(node, "type"),
        primary_language: b.attr(node, "primaryLanguage"),
        secondary_language: b.attr(node, "secondaryLanguage"),
        primary_script: b.attr(node, "primaryScript"),
        secondary_script: b.attr(node, "secondaryScript"),
        reading_direction: b.attr(node, "readingDirection"),
        text_line_order: b.attr(node, "textLineOrder"),
        conf: b.attr_parse(node, "conf")?,

        alternative_images: alternative_images(b, node)?,
        border: match b.child(node, "Border") {
            Some(n) => Some(Border {
                coords: coords(b, n, "Coords")?,
            }),
            None => None,
        },
        print_space: match b.child(node, "PrintSpace") {
            Some(n) => Some(PrintSpace {
                coords: coords(b, n, "Coords")?,
            }),
            None => None,
        },
        reading_order: match b.child(node, "ReadingOrder") {
            Some(n) => Some(reading_order(b, n)?),
            None => None,
        },
        layers: match b.child(node, "Layers") {
            Some(n) => Some(layers(b, n)?),
            None => None,
        },
        relations: match b.child(node, "Relations") {
            Some(n) => Some(relations(b, n)),
            None => None,
        },
        text_style: text_style(b, node)?,
        user_defined: user_defined(b, node)?,
        regions: region_collections(b, node)?,
    })
}

fn coords(b: &mut Binder<'_>, parent: Node<'_, '_>, name: &str) -> Result<Option<Coords>> {
    let Some(node) = b.child(parent, name) else {
        return Ok(None);
    };
    Ok(Some(Coords {
        points: b.attr(node, "points").unwrap_or_default(),
        conf: b.attr_parse(node, "conf")?,
    }))
}

fn alternative_images(b: &mut Binder<'_>, parent: Node<'_, '_>) -> Result<Vec<AlternativeImage>> {
    let nodes: Vec<_> = b.children(parent, "AlternativeImage").collect();
    let mut images = Vec::with_capacity(nodes.len());
    for n in nodes {
        images.push(AlternativeImage {
            filename: b.attr(n, "filename").unwrap_or_default(),
            comments: b.attr(n, "comments"),
            conf: b.attr_parse(n, "conf")?,
        });
    }
    Ok(images)
}

fn reading_order(b: &mut Binder<'_>, node: Node<'_, '_>) -> Result<ReadingOrder> {
    let root = match b.child(node, "OrderedGroup") {
        Some(n) => Some(order_group(b, n, true)?),
        None => match b.child(node, "UnorderedGroup") {
            Some(n) => Some(order_group(b, n, false)?),
            None => None,
        },
    };
    Ok(ReadingOrder {
        conf: b.attr_parse(node, "conf")?,
        root,
    })
}

fn order_group(b: &mut Binder<'_>, node: Node<'_, '_>, ordered: bool) -> Result<OrderGroup> {
    let mut members = Vec::new();
    for child in node.children().filter(Node::is_element) {
        match child.tag_name().name() {
            "RegionRefIndexed" | "RegionRef" => members.push(OrderMember::RegionRef {
                index: b.attr_parse(child, "index")?,
                region_ref: b.attr(child, "regionRef").unwrap_or_default(),
            }),
            "OrderedGroupIndexed" | "OrderedGroup" => {
                members.push(OrderMember::Group(order_group(b, child, true)?))
            }
            "UnorderedGroupIndexed" | "UnorderedGroup" => {
                members.push(OrderMember::Group(order_group(b, child, false)?))
            }
            _ => {}
        }
    }

    Ok(OrderGroup {
        id: b.attr(node, "id").unwrap_or_default(),
        ordered,
        index: b.attr_parse(node, "index")?,
        region_ref: b.attr(node, "regionRef"),
        caption: b.attr(node, "caption"),
        group_type: b.attr(node, "type"),
        members,
    })
}

fn layers(b: &mut Binder<'_>, node: Node<'_, '_>) -> Result<Layers> {
    let nodes: Vec<_> = b.children(node, "Layer").collect();
    let mut layers = Vec::with_capacity(nodes.len());
    for n in nodes {
        let region_refs = b
            .children(n, "RegionRef")
            .filter_map(|r| b.attr(r, "regionRef"))
            .collect();
        layers.push(Layer {
            id: b.attr(n, "id").unwrap_or_default(),
            z_index: b.attr_parse(n, "zIndex")?,
            caption: b.attr(n, "caption"),
            region_refs,
        });
    }
    Ok(Layers { layers })
}

fn relations(b: &mut Binder<'_>, node: Node<'_, '_>) -> Relations {
    let relations = b
        .children(node, "Relation")
        .map(|n| Relation {
            id: b.attr(n, "id"),
            relation_type: b.attr(n, "type"),
            source: b
                .child(n, "SourceRegionRef")
                .and_then(|r| b.attr(r, "regionRef")),
            target: b
                .child(n, "TargetRegionRef")
                .and_then(|r| b.attr(r, "regionRef")),
            custom: b.attr(n, "custom"),
            comments: b.attr(n, "comments"),
        })
        .collect();
    Relations { relations }
}

fn text_style(b: &mut Binder<'_>, parent: Node<'_, '_>) -> Result<Option<TextStyle>> {
    let Some(n) = b.child(parent, "TextStyle") else {
        return Ok(None);
    };
    Ok(Some(TextStyle {
        font_family: b.attr(n, "fontFamily"),
        serif: b.attr_bool(n, "serif")?,
        monospace: b.attr_bool(n, "monospace")?,
        font_size: b.attr_parse(n, "fontSize")?,
        x_height: b.attr_parse(n, "xHeight")?,
        kerning: b.attr_parse(n, "kerning")?,
        text_colour: b.attr(n, "textColour"),
        text_colour_rgb: b.attr_parse(n, "textColourRgb")?,
        bg_colour: b.attr(n, "bgColour"),
        bg_colour_rgb: b.attr_parse(n, "bgColourRgb")?,
        reverse_video: b.attr_bool(n, "reverseVideo")?,
        bold: b.attr_bool(n, "bold")?,
        italic: b.attr_bool(n, "italic")?,
        underlined: b.attr_bool(n, "underlined")?,
        subscript: b.attr_bool(n, "subscript")?,
        superscript: b.attr_bool(n, "superscript")?,
        strikethrough: b.attr_bool(n, "strikethrough")?,
        small_caps: b.attr_bool(n, "smallCaps")?,
        letter_spaced: b.attr_bool(n, "letterSpaced")?,
    }))
}

fn text_equivs(b: &mut Binder<'_>, parent: Node<'_, '_>) -> Result<Vec<TextEquiv>> {
    let nodes: Vec<_> = b.children(parent, "TextEquiv").collect();
    let mut equivs = Vec::with_capacity(nodes.len());
    for n in nodes {
        let unicode = match b.required_child(n, "Unicode")? {
            Some(u) => b.text(u),
            None => String::new(),
        };
        equivs.push(TextEquiv {
            plain_text: b.child_text(n, "PlainText"),
            unicode,
            index: b.attr_parse(n, "index")?,
            conf: b.attr_parse(n, "conf")?,
            data_type: b.attr(n, "dataType"),
            data_type_details: b.attr(n, "dataTypeDetails"),
            comments: b.attr(n, "comments"),
        });
    }
    Ok(equivs)
}

fn text_lines(b: &mut Binder<'_>, parent: Node<'_, '_>) -> Result<Vec<TextLine>> {
    let nodes: Vec<_> = b.children(parent, "TextLine").collect();
    let mut lines = Vec::with_capacity(nodes.len());
    for n in nodes {
        let word_nodes: Vec<_> = b.children(n, "Word").collect();
        let mut words = Vec::with_capacity(word_nodes.len());
        for w in word_nodes {
            words.push(word(b, w)?);
        }

        lines.push(TextLine {
            id: b.attr(n, "id").unwrap_or_default(),
            alternative_images: alternative_images(b, n)?,
            coords: coords(b, n, "Coords")?,
            baseline: coords(b, n, "Baseline")?,
            words,
            text_equivs: text_equivs(b, n)?,
            text_style: text_style(b, n)?,
            user_defined: user_defined(b, n)?,
            primary_language: b.attr(n, "primaryLanguage"),
            primary_script: b.attr(n, "primaryScript"),
            secondary_script: b.attr(n, "secondaryScript"),
            reading_direction: b.attr(n, "readingDirection"),
            production: b.attr(n, "production"),
            custom: b.attr(n, "custom"),
            comments: b.attr(n, "comments"),
            index: b.attr_parse(n, "index")?,
        });
    }
    Ok(lines)
}

fn word(b: &mut Binder<'_>, node: Node<'_, '_>) -> Result<Word> {
    let glyph_nodes: Vec<_> = b.children(node, "Glyph").collect();
    let mut glyphs = Vec::with_capacity(glyph_nodes.len());
    for g in glyph_nodes {
        glyphs.push(Glyph {
            id: b.attr(g, "id").unwrap_or_default(),
            coords: coords(b, g, "Coords")?,
            text_equivs: text_equivs(b, g)?,
        });
    }
    Ok(Word {
        id: b.attr(node, "id").unwrap_or_default(),
        coords: coords(b, node, "Coords")?,
        glyphs,
        text_equivs: text_equivs(b, node)?,
    })
}

fn region_collections(b: &mut Binder<'_>, parent: Node<'_, '_>) -> Result<RegionCollections> {
    let mut collections = RegionCollections::new();
    for node in parent.children().filter(Node::is_element) {
        let Some(kind) = RegionKind::from_element_name(node.tag_name().name()) else {
            continue;
        };
        if !b.in_namespace(&node) {
            continue;
        }
        collections.push(region(b, node, kind)?);
    }
    Ok(collections)
}

fn region_base(b: &mut Binder<'_>, node: Node<'_, '_>) -> Result<RegionBase> {
    let roles = match b.child(node, "Roles") {
        Some(r) => Some(Roles {
            table_cell_role: match b.child(r, "TableCellRole") {
                Some(c) => Some(TableCellRole {
                    row_index: b.attr_parse(c, "rowIndex")?,
                    column_index: b.attr_parse(c, "columnIndex")?,
                    row_span: b.attr_parse(c, "rowSpan")?,
                    col_span: b.attr_parse(c, "colSpan")?,
                    header: b.attr_bool(c, "header")?,
                }),
                None => None,
            },
        }),
        None => None,
    };

    Ok(RegionBase {
        id: b.attr(node, "id").unwrap_or_default(),
        coords: coords(b, node, "Coords")?,
        custom: b.attr(node, "custom"),
        comments: b.attr(node, "comments"),
        continuation: b.attr_bool(node, "continuation")?,
        alternative_images: alternative_images(b, node)?,
        user_defined: user_defined(b, node)?,
        roles,
        children: region_collections(b, node)?,
    })
}

fn region(b: &mut Binder<'_>, n: Node<'_, '_>, kind: RegionKind) -> Result<Region> {
    let base = region_base(b, n)?;
    let region = match kind {
        RegionKind::Text => Region::Text(TextRegion {
            base,
            text_lines: text_lines(b, n)?,
            text_equivs: text_equivs(b, n)?,
            text_style: text_style(b, n)?,
            orientation: b.attr_parse(n, "orientation")?,
            text_type: b.attr(n, "type"),
            leading: b.attr_parse(n, "leading")?,
            reading_direction: b.attr(n, "readingDirection"),
            reading_orientation: b.attr_parse(n, "readingOrientation")?,
            indented: b.attr_bool(n, "indented")?,
            align: b.attr(n, "align"),
            primary_language: b.attr(n, "primaryLanguage"),
            secondary_language: b.attr(n, "secondaryLanguage"),
            primary_script: b.attr(n, "primaryScript"),
            secondary_script: b.attr(n, "secondaryScript"),
            production: b.attr(n, "production"),
            text_line_order: b.attr(n, "textLineOrder"),
        }),
        RegionKind::Image => Region::Image(ImageRegion {
            base,
            orientation: b.attr_parse(n, "orientation")?,
            colour_depth: b.attr(n, "colourDepth"),
            bg_colour: b.attr(n, "bgColour"),
            emb_text: b.attr_bool(n, "embText")?,
        }),
        RegionKind::LineDrawing => Region::LineDrawing(LineDrawingRegion {
            base,
            orientation: b.attr_parse(n, "orientation")?,
            pen_colour: b.attr(n, "penColour"),
            bg_colour: b.attr(n, "bgColour"),
            emb_text: b.attr_bool(n, "embText")?,
        }),
        RegionKind::Graphic => Region::Graphic(GraphicRegion {
            base,
            orientation: b.attr_parse(n, "orientation")?,
            graphic_type: b.attr(n, "type"),
            num_colours: b.attr_parse(n, "numColours")?,
            emb_text: b.attr_bool(n, "embText")?,
        }),
        RegionKind::Table => Region::Table(TableRegion {
            base,
            grid: match b.child(n, "Grid") {
                Some(g) => Some(grid(b, g)?),
                None => None,
            },
            orientation: b.attr_parse(n, "orientation")?,
            rows: b.attr_parse(n, "rows")?,
            columns: b.attr_parse(n, "columns")?,
            line_colour: b.attr(n, "lineColour"),
            bg_colour: b.attr(n, "bgColour"),
            line_separators: b.attr_bool(n, "lineSeparators")?,
            emb_text: b.attr_bool(n, "embText")?,
        }),
        RegionKind::Chart => Region::Chart(ChartRegion {
            base,
            orientation: b.attr_parse(n, "orientation")?,
            chart_type: b.attr(n, "type"),
            num_colours: b.attr_parse(n, "numColours")?,
            bg_colour: b.attr(n, "bgColour"),
            emb_text: b.attr_bool(n, "embText")?,
        }),
        RegionKind::Separator => Region::Separator(SeparatorRegion {
            base,
            orientation: b.attr_parse(n, "orientation")?,
            colour: b.attr(n, "colour"),
        }),
        RegionKind::Maths => Region::Maths(shaded(b, n, base)?),
        RegionKind::Chem => Region::Chem(shaded(b, n, base)?),
        RegionKind::Music => Region::Music(shaded(b, n, base)?),
        RegionKind::Advert => Region::Advert(shaded(b, n, base)?),
        RegionKind::Noise => Region::Noise(base),
        RegionKind::Unknown => Region::Unknown(base),
    };
    Ok(region)
}

fn shaded(b: &mut Binder<'_>, n: Node<'_, '_>, base: RegionBase) -> Result<ShadedRegion> {
    Ok(ShadedRegion {
        base,
        orientation: b.attr_parse(n, "orientation")?,
        bg_colour: b.attr(n, "bgColour"),
    })
}

fn grid(b: &mut Binder<'_>, node: Node<'_, '_>) -> Result<Grid> {
    let nodes: Vec<_> = b.children(node, "GridPoints").collect();
    let mut rows = Vec::with_capacity(nodes.len());
    for n in nodes {
        rows.push(GridPoints {
            index: b.attr_parse(n, "index")?,
            points: b.attr(n, "points").unwrap_or_default(),
        });
    }
    Ok(Grid { rows })
}

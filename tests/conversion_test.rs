//! Integration tests for PAGE-XML conversion.

use chrono::NaiveDate;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use unpage::binding::BindingMode;
use unpage::convert::{
    default_schema_dir, ConvertOptions, MapContext, Page2017Handler, PageVersion, VersionChain,
    VersionHandler, DEFAULT_TOOL_NAME,
};
use unpage::error::{Error, Result};
use unpage::schema::ValidationResult;
use unpage::{Document, ElementKind, GroupRef, JsonFormat, Unpage};

const NS_2017: &str = "http://schema.primaresearch.org/PAGE/gts/pagecontent/2017-07-15";
const NS_2019: &str = "http://schema.primaresearch.org/PAGE/gts/pagecontent/2019-07-15";

fn page_xml(namespace: &str, page_attrs: &str, body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<PcGts xmlns="{namespace}">
  <Metadata>
    <Creator>ScanTool 4.2</Creator>
    <Created>2017-09-01T08:30:00</Created>
    <LastChange>2017-09-02T12:00:00</LastChange>
  </Metadata>
  <Page imageFilename="page_001.png" {page_attrs}>{body}</Page>
</PcGts>"#
    )
}

fn page_2017(body: &str) -> String {
    page_xml(NS_2017, r#"imageWidth="800" imageHeight="1200""#, body)
}

fn converter() -> Unpage {
    Unpage::new().with_conversion_date(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
}

fn convert(xml: &str) -> Result<unpage::ConvertResult> {
    converter().convert_bytes(xml.as_bytes(), "test.xml")
}

fn region_type(doc: &Document, index: usize) -> (&str, Option<&str>) {
    match &doc.content[index].kind {
        ElementKind::Region {
            region_type,
            region_subtype,
            ..
        } => (region_type.as_str(), region_subtype.as_deref()),
        other => panic!("element {} is not a region: {:?}", index, other),
    }
}

#[test]
fn test_minimal_image_region() {
    let xml = page_2017(
        r#"<ImageRegion id="r1"><Coords points="0,0 100,0 100,50 0,50"/></ImageRegion>"#,
    );
    let result = convert(&xml).unwrap();
    let doc = &result.document;

    assert_eq!(result.version, PageVersion::Page2017);
    assert!(!result.forced);
    assert_eq!(doc.content.len(), 1);
    assert_eq!(region_type(doc, 0), ("image", None));
    assert_eq!(
        doc.content[0].polygon().unwrap().to_points_string(),
        "0,0 100,0 100,50 0,50"
    );
    assert!(doc.content[0].content_metadata.is_empty());
    assert_eq!(
        doc.creators
            .iter()
            .filter(|c| c.name == DEFAULT_TOOL_NAME)
            .count(),
        1
    );
    assert_eq!(doc.original_image_size, (1200, 800));
}

#[test]
fn test_text_line_shares_group() {
    let xml = page_2017(
        r#"<TextRegion id="t1">
             <Coords points="10,10 300,10 300,60 10,60"/>
             <TextLine id="l1">
               <Coords points="12,12 290,12 290,40 12,40"/>
               <Baseline points="12,38 290,38"/>
               <TextEquiv><Unicode>hello</Unicode></TextEquiv>
             </TextLine>
           </TextRegion>"#,
    );
    let doc = convert(&xml).unwrap().document;

    assert_eq!(doc.content.len(), 4);
    assert_eq!(region_type(&doc, 0), ("text", None));
    assert!(matches!(doc.content[1].kind, ElementKind::Line { .. }));
    assert!(matches!(doc.content[2].kind, ElementKind::Baseline { .. }));
    assert_eq!(doc.content[3].text(), Some("hello"));

    let group = doc.content[0].group.expect("text region has a group");
    assert!(doc.content.iter().all(|el| el.group == Some(group)));
    assert_eq!(doc.groups.len(), 1);
}

#[test]
fn test_simple_text_region_has_no_group() {
    let xml = page_2017(
        r#"<TextRegion id="t1" type="paragraph"><Coords points="0,0 10,0 10,10 0,10"/></TextRegion>"#,
    );
    let doc = convert(&xml).unwrap().document;

    assert_eq!(doc.content.len(), 1);
    assert_eq!(region_type(&doc, 0), ("text", Some("paragraph")));
    assert!(doc.content[0].group.is_none());
    assert!(doc.groups.is_empty());
}

#[test]
fn test_unrecognized_schema() {
    let xml = page_xml(
        "http://schema.primaresearch.org/PAGE/gts/pagecontent/2013-07-15",
        r#"imageWidth="800" imageHeight="1200""#,
        "",
    );
    let err = convert(&xml).unwrap_err();
    match err {
        Error::UnrecognizedSchema { path, attempted } => {
            assert_eq!(path, "test.xml");
            assert_eq!(attempted, vec!["2019-07-15", "2017-07-15"]);
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_invalid_2017_document_is_unrecognized() {
    // Regions need Coords
    let xml = page_2017(r#"<ImageRegion id="r1"/>"#);
    assert!(matches!(
        convert(&xml),
        Err(Error::UnrecognizedSchema { .. })
    ));
}

#[test]
fn test_group_invariant_for_nested_subtrees() {
    let xml = page_2017(
        r#"<TextRegion id="a">
             <Coords points="0,0 100,0 100,100 0,100"/>
             <ImageRegion id="a1"><Coords points="5,5 20,5 20,20 5,20"/></ImageRegion>
             <TextLine id="al"><Coords points="1,1 99,1 99,9 1,9"/><TextEquiv><Unicode>x</Unicode></TextEquiv></TextLine>
           </TextRegion>
           <TextRegion id="b">
             <Coords points="0,200 100,200 100,300 0,300"/>
             <TextEquiv><Unicode>y</Unicode></TextEquiv>
           </TextRegion>
           <TableRegion id="c">
             <Coords points="0,400 100,400 100,500 0,500"/>
             <TextRegion id="c1">
               <Coords points="1,401 50,401 50,450 1,450"/>
               <SeparatorRegion id="c11"><Coords points="1,420 50,420"/></SeparatorRegion>
             </TextRegion>
           </TableRegion>
           <ImageRegion id="d"><Coords points="200,0 300,0 300,100"/></ImageRegion>"#,
    );
    let doc = convert(&xml).unwrap().document;

    let group_of = |region: &str| -> Option<GroupRef> {
        let index = match region {
            "a" => 0,
            "b" => 4,
            "d" => 6,
            "c" => 7,
            _ => unreachable!(),
        };
        doc.content[index].group
    };

    // a: region, line, text, then nested image (lines come first in a text region)
    let ga = group_of("a").unwrap();
    assert_eq!(doc.group_members(ga).count(), 4);
    // b: region and its transcription
    let gb = group_of("b").unwrap();
    assert_eq!(doc.group_members(gb).count(), 2);
    // c: table, nested text region and its separator share one group
    let gc = group_of("c").unwrap();
    assert_eq!(doc.group_members(gc).count(), 3);
    // d has no subtree
    assert_eq!(group_of("d"), None);

    assert_ne!(ga, gb);
    assert_ne!(ga, gc);
    assert_ne!(gb, gc);
    assert_eq!(doc.groups.len(), 3);
}

/// Validates against the 2017 schema and tags the document with a label.
struct TaggedHandler {
    inner: Page2017Handler,
    tag: &'static str,
}

impl TaggedHandler {
    fn new(tag: &'static str) -> Self {
        Self {
            inner: Page2017Handler::new(default_schema_dir()),
            tag,
        }
    }
}

impl VersionHandler for TaggedHandler {
    fn version(&self) -> PageVersion {
        self.inner.version()
    }

    fn namespace(&self) -> &str {
        self.inner.namespace()
    }

    fn schema_path(&self) -> &Path {
        self.inner.schema_path()
    }

    fn validate(&self, bytes: &[u8]) -> Result<ValidationResult> {
        self.inner.validate(bytes)
    }

    fn convert(
        &self,
        bytes: &[u8],
        mode: BindingMode,
        options: &ConvertOptions,
        ctx: &mut MapContext,
    ) -> Result<Document> {
        let mut doc = self.inner.convert(bytes, mode, options, ctx)?;
        let mut tag = unpage::MetadataMap::new();
        tag.insert("handler".to_string(), self.tag.into());
        doc.add_metadata(tag);
        Ok(doc)
    }
}

#[test]
fn test_dispatch_prefers_earlier_handler() {
    let xml = page_2017(r#"<NoiseRegion id="n"><Coords points="0,0 5,5"/></NoiseRegion>"#);

    let mut chain = VersionChain::new();
    chain.register(Arc::new(TaggedHandler::new("first")));
    chain.register(Arc::new(TaggedHandler::new("second")));
    let unpage = Unpage::new().with_chain(chain);

    for _ in 0..5 {
        let doc = unpage.convert_bytes(xml.as_bytes(), "both.xml").unwrap().document;
        assert_eq!(doc.metadata.get("handler"), Some(&json!("first")));
    }

    let mut chain = VersionChain::new();
    chain.register(Arc::new(TaggedHandler::new("second")));
    chain.register(Arc::new(TaggedHandler::new("first")));
    let doc = Unpage::new()
        .with_chain(chain)
        .convert_bytes(xml.as_bytes(), "both.xml")
        .unwrap()
        .document;
    assert_eq!(doc.metadata.get("handler"), Some(&json!("second")));
}

#[test]
fn test_missing_dimensions_is_fatal() {
    let xml = page_xml(NS_2017, r#"imageHeight="1200""#, "");

    // Without the width the schema rejects the page outright
    assert!(matches!(
        convert(&xml),
        Err(Error::UnrecognizedSchema { .. })
    ));

    let forced = converter().force_version(PageVersion::Page2017);
    let err = forced.convert_bytes(xml.as_bytes(), "nodims.xml").unwrap_err();
    assert!(matches!(err, Error::MissingPageDimensions));
}

#[test]
fn test_forced_version_retries_relaxed() {
    let xml = page_2017(
        r#"<TextRegion id="t" orientation="sideways"><Coords points="0,0 10,0 10,10"/></TextRegion>"#,
    );
    let forced = converter().force_version(PageVersion::Page2017);
    let result = forced.convert_bytes(xml.as_bytes(), "forced.xml").unwrap();

    assert!(result.forced);
    assert_eq!(result.version, PageVersion::Page2017);
    assert_eq!(result.document.content.len(), 1);
    assert_eq!(result.warnings[0].field, "binding");
    assert!(result.warnings.iter().any(|w| w.field.contains("orientation")));
}

#[test]
fn test_forced_binding_failure_propagates() {
    // Binding needs a Page element even in relaxed mode
    let xml = format!(
        r#"<PcGts xmlns="{}"><Metadata><Creator>c</Creator></Metadata></PcGts>"#,
        NS_2017
    );
    let forced = converter().force_version(PageVersion::Page2017);
    assert!(matches!(
        forced.convert_bytes(xml.as_bytes(), "nopage.xml"),
        Err(Error::Binding(_))
    ));
}

#[test]
fn test_2019_recognized_but_not_implemented() {
    let xml = page_xml(
        NS_2019,
        r#"imageWidth="800" imageHeight="1200""#,
        r#"<TextRegion id="t"><Coords points="0,0 1,1"/></TextRegion>"#,
    );
    let err = convert(&xml).unwrap_err();
    assert!(matches!(err, Error::VersionNotImplemented(ref v) if v == "2019-07-15"));
    assert!(err.is_document_error());
}

#[test]
fn test_malformed_xml() {
    let err = convert("<PcGts><Metadata></PcGts>").unwrap_err();
    assert!(matches!(err, Error::MalformedXml(_)));
}

#[test]
fn test_missing_schema_dir() {
    let xml = page_2017("");
    let err = Unpage::new()
        .with_schema_dir("/nonexistent/schemas")
        .convert_bytes(xml.as_bytes(), "test.xml")
        .unwrap_err();
    assert!(matches!(err, Error::SchemaLoad { .. }));
    assert!(!err.is_document_error());
}

#[test]
fn test_metadata_and_warnings() {
    let xml = page_2017(
        r#"<ReadingOrder>
             <OrderedGroup id="ro1" caption="Regions reading order">
               <RegionRefIndexed index="0" regionRef="t1"/>
             </OrderedGroup>
           </ReadingOrder>
           <Relations>
             <Relation type="link"><SourceRegionRef regionRef="t1"/><TargetRegionRef regionRef="g1"/></Relation>
           </Relations>
           <TextRegion id="t1">
             <Coords points="0,0 10,0 10,10"/>
             <TextLine id="l1">
               <Coords points="0,0 10,0 10,5"/>
               <Word id="w1"><Coords points="0,0 5,0 5,5"/></Word>
             </TextLine>
           </TextRegion>
           <GraphicRegion id="g1" type="stamp">
             <Coords points="20,20 40,20 40,40"/>
             <UserDefined><UserAttribute name="ink" value="red"/></UserDefined>
           </GraphicRegion>"#,
    );
    let result = convert(&xml).unwrap();
    let doc = &result.document;

    assert_eq!(
        doc.metadata.get("LastChange"),
        Some(&json!("2017-09-02T12:00:00"))
    );
    assert_eq!(doc.creators[0].name, "ScanTool 4.2");
    assert_eq!(doc.creators[1].date, "2024-06-01");

    let fields: Vec<&str> = result.warnings.iter().map(|w| w.field.as_str()).collect();
    assert!(fields.contains(&"ReadingOrder"));
    assert!(fields.contains(&"Relations"));
    assert!(fields.contains(&"Word"));
    assert!(fields.contains(&"GraphicRegion/UserDefined"));

    let graphic = doc.regions_of_type("graphic").next().unwrap();
    assert!(matches!(
        &graphic.kind,
        ElementKind::Region { region_subtype: Some(s), .. } if s == "stamp"
    ));
}

#[test]
fn test_json_output_shape() {
    let xml = page_2017(
        r#"<TextRegion id="t1" type="heading" align="centre">
             <Coords points="0,0 10,0 10,10"/>
             <TextEquiv index="1" conf="0.75"><PlainText>Title</PlainText><Unicode>Title</Unicode></TextEquiv>
           </TextRegion>"#,
    );
    let doc = convert(&xml).unwrap().document;
    let json = unpage::render::to_json(&doc, JsonFormat::Compact).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["version"], "1.0");
    assert_eq!(value["filename"], "page_001.png");
    assert_eq!(value["content"][0]["type"], "region");
    assert_eq!(value["content"][0]["region_subtype"], "heading");
    assert_eq!(value["content"][1]["type"], "text");
    assert_eq!(value["content"][1]["content"], "Title");
    assert_eq!(value["content"][1]["content_metadata"]["index"], 1);
    assert_eq!(value["content"][1]["content_metadata"]["PlainText"], "Title");
    assert_eq!(value["groups"][0]["region"], 0);
    assert_eq!(value["groups"][0]["content_metadata"]["align"], "centre");
}

#[test]
fn test_convert_many_in_parallel() {
    let dir = tempfile::tempdir().unwrap();
    let mut paths = Vec::new();
    for i in 0..6 {
        let path = dir.path().join(format!("page_{}.xml", i));
        let body = format!(
            r#"<ImageRegion id="r{i}"><Coords points="0,0 {w},0 {w},10"/></ImageRegion>"#,
            w = 10 + i
        );
        std::fs::write(&path, page_2017(&body)).unwrap();
        paths.push(path);
    }
    paths.push(dir.path().join("missing.xml"));

    let results = converter().convert_many(&paths);
    assert_eq!(results.len(), 7);
    for (i, result) in results.iter().take(6).enumerate() {
        let doc = &result.as_ref().unwrap().document;
        let polygon = doc.content[0].polygon().unwrap();
        assert_eq!(polygon.points()[1].x(), 10 + i as i64);
    }
    assert!(matches!(results[6], Err(Error::Io(_))));
}

#[test]
fn test_options_tool_name() {
    let options = ConvertOptions::new().with_tool_name("archive-import");
    let chain = VersionChain::default();
    let xml = page_2017("");
    let result = chain.dispatch(xml.as_bytes(), "x.xml", &options).unwrap();
    assert_eq!(result.document.creators.last().unwrap().name, "archive-import");
    assert!(result.document.is_empty());
}

#[test]
fn test_table_cells_keep_their_attributes() {
    let xml = page_2017(
        r#"<TableRegion id="tab" comments="the table">
             <Coords points="0,0 100,0 100,100 0,100"/>
             <TextRegion id="c1" primaryLanguage="German" comments="cell one" align="left">
               <Coords points="0,0 50,0 50,50"/>
               <TextLine id="l1"><Coords points="1,1 49,1 49,9"/><TextEquiv><Unicode>eins</Unicode></TextEquiv></TextLine>
             </TextRegion>
             <TextRegion id="c2" primaryLanguage="English" comments="cell two" align="right">
               <Coords points="50,0 100,0 100,50"/>
               <TextLine id="l2"><Coords points="51,1 99,1 99,9"/><TextEquiv><Unicode>two</Unicode></TextEquiv></TextLine>
             </TextRegion>
           </TableRegion>"#,
    );
    let result = convert(&xml).unwrap();
    let json = unpage::render::to_json(&result.document, JsonFormat::Compact).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["content"][0]["region_type"], "table");
    assert_eq!(value["content"][0]["content_metadata"]["comments"], "the table");

    let cells: Vec<&serde_json::Value> = value["content"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|el| el["region_type"] == "text")
        .collect();
    assert_eq!(cells.len(), 2);
    assert_eq!(
        cells[0]["content_metadata"],
        json!({"primaryLanguage": "German", "comments": "cell one", "align": "left"})
    );
    assert_eq!(
        cells[1]["content_metadata"],
        json!({"primaryLanguage": "English", "comments": "cell two", "align": "right"})
    );

    assert_eq!(value["groups"].as_array().unwrap().len(), 1);
    assert!(value["groups"][0].get("content_metadata").is_none());
}

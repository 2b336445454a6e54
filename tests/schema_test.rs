//! Validation against the bundled PAGE schemas.

use std::path::PathBuf;
use unpage::convert::{default_schema_dir, PageVersion};
use unpage::schema::{validate_against_schema, Schema};
use unpage::Error;

fn schema_path(version: PageVersion) -> PathBuf {
    default_schema_dir().join(version.schema_file())
}

fn load(version: PageVersion) -> Schema {
    Schema::load(schema_path(version)).unwrap()
}

fn page(namespace: &str, page_attrs: &str, body: &str) -> String {
    format!(
        r#"<PcGts xmlns="{namespace}">
  <Metadata>
    <Creator>tester</Creator>
    <Created>2018-01-01T00:00:00</Created>
    <LastChange>2018-01-02T00:00:00</LastChange>
  </Metadata>
  <Page {page_attrs}>{body}</Page>
</PcGts>"#
    )
}

fn page_2017(body: &str) -> String {
    page(
        PageVersion::Page2017.namespace(),
        r#"imageFilename="a.png" imageWidth="10" imageHeight="20""#,
        body,
    )
}

fn diagnostic(schema: &Schema, xml: &str) -> String {
    let result = schema.validate(xml.as_bytes()).unwrap();
    assert!(!result.ok, "expected invalid document:\n{}", xml);
    result.diagnostic.unwrap()
}

#[test]
fn test_bundled_schemas_compile() {
    for version in PageVersion::ALL {
        let schema = load(version);
        assert_eq!(schema.target_namespace(), Some(version.namespace()));
    }
}

#[test]
fn test_valid_2017_document() {
    let schema = load(PageVersion::Page2017);
    let xml = page_2017(
        r#"<Border><Coords points="0,0 10,0 10,20 0,20"/></Border>
           <TextRegion id="t1" type="paragraph" readingDirection="left-to-right">
             <Coords points="0,0 5,0 5,5"/>
             <TextLine id="l1" index="0">
               <Coords points="0,0 5,0 5,2"/>
               <Baseline points="0,2 5,2"/>
               <TextEquiv conf="0.5"><Unicode>abc</Unicode></TextEquiv>
             </TextLine>
             <TextEquiv><Unicode>abc</Unicode></TextEquiv>
             <TextStyle bold="true" fontSize="11.5"/>
           </TextRegion>
           <TableRegion id="tab" rows="2" columns="3" lineSeparators="true">
             <Coords points="0,10 10,10 10,20"/>
             <ImageRegion id="nested"><Coords points="1,11 2,11 2,12"/></ImageRegion>
           </TableRegion>"#,
    );
    let result = schema.validate(xml.as_bytes()).unwrap();
    assert!(result.ok, "{:?}", result.diagnostic);
}

#[test]
fn test_missing_required_attribute() {
    let schema = load(PageVersion::Page2017);
    let xml = page(
        PageVersion::Page2017.namespace(),
        r#"imageFilename="a.png" imageHeight="20""#,
        "",
    );
    let message = diagnostic(&schema, &xml);
    assert!(message.contains("'imageWidth'"), "{}", message);
    assert!(message.contains("required"), "{}", message);
}

#[test]
fn test_unexpected_child() {
    let schema = load(PageVersion::Page2017);
    let xml = page_2017(r#"<Paragraph/>"#);
    let message = diagnostic(&schema, &xml);
    assert!(message.contains("not expected"), "{}", message);
}

#[test]
fn test_region_requires_coords() {
    let schema = load(PageVersion::Page2017);
    let message = diagnostic(&schema, &page_2017(r#"<ChartRegion id="c"/>"#));
    assert!(message.contains("ChartRegion"), "{}", message);
}

#[test]
fn test_enumeration_facet() {
    let schema = load(PageVersion::Page2017);
    let xml = page_2017(r#"<TextRegion id="t" type="banana"><Coords points="0,0 1,1"/></TextRegion>"#);
    let message = diagnostic(&schema, &xml);
    assert!(message.contains("attribute 'type'"), "{}", message);
}

#[test]
fn test_points_pattern() {
    let schema = load(PageVersion::Page2017);
    let xml = page_2017(r#"<NoiseRegion id="n"><Coords points="5"/></NoiseRegion>"#);
    let message = diagnostic(&schema, &xml);
    assert!(message.contains("attribute 'points'"), "{}", message);
}

#[test]
fn test_undeclared_attribute() {
    let schema = load(PageVersion::Page2017);
    let xml = page_2017(r#"<NoiseRegion id="n" colour="red"><Coords points="0,0 1,1"/></NoiseRegion>"#);
    let message = diagnostic(&schema, &xml);
    assert!(message.contains("is not allowed"), "{}", message);
}

#[test]
fn test_versions_reject_each_other() {
    let schema_2017 = load(PageVersion::Page2017);
    let schema_2019 = load(PageVersion::Page2019);

    let doc_2019 = page(
        PageVersion::Page2019.namespace(),
        r#"imageFilename="a.png" imageWidth="10" imageHeight="20""#,
        "",
    );
    let doc_2017 = page_2017("");

    assert!(schema_2019.validate(doc_2019.as_bytes()).unwrap().ok);
    assert!(schema_2017.validate(doc_2017.as_bytes()).unwrap().ok);

    let message = diagnostic(&schema_2017, &doc_2019);
    assert!(message.contains("No matching global declaration"), "{}", message);
    assert!(!schema_2019.validate(doc_2017.as_bytes()).unwrap().ok);
}

#[test]
fn test_validate_against_schema() {
    let path = schema_path(PageVersion::Page2017);
    assert!(validate_against_schema(page_2017("").as_bytes(), &path).unwrap().ok);

    assert!(matches!(
        validate_against_schema(b"<PcGts", &path),
        Err(Error::MalformedXml(_))
    ));
    assert!(matches!(
        validate_against_schema(page_2017("").as_bytes(), "/nonexistent/page.xsd"),
        Err(Error::SchemaLoad { .. })
    ));
}

#[test]
fn test_region_ids_must_be_unique() {
    let schema = load(PageVersion::Page2017);
    let xml = page_2017(
        r#"<NoiseRegion id="n"><Coords points="0,0 1,1"/></NoiseRegion>
           <NoiseRegion id="n"><Coords points="2,2 3,3"/></NoiseRegion>"#,
    );
    let message = diagnostic(&schema, &xml);
    assert!(message.contains("attribute 'id': 'n'"), "{}", message);
    assert!(message.contains("xs:ID"), "{}", message);

    // Lines and regions share one ID space
    let xml = page_2017(
        r#"<TextRegion id="t1"><Coords points="0,0 5,0 5,5"/>
             <TextLine id="t1"><Coords points="0,0 5,0 5,2"/></TextLine>
           </TextRegion>"#,
    );
    assert!(!schema.validate(xml.as_bytes()).unwrap().ok);
}

//! Benchmarks for PAGE-XML conversion.
//!
//! Run with: cargo bench
//!
//! These benchmarks use synthetic PAGE 2017 documents.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use unpage::convert::PageVersion;
use unpage::schema::Schema;

/// Creates a PAGE 2017 document with `region_count` text regions of three lines each.
fn create_test_page(region_count: usize) -> Vec<u8> {
    let mut regions = String::new();

    for r in 0..region_count {
        let top = r * 100;
        regions.push_str(&format!(
            r#"<TextRegion id="r{r}" type="paragraph"><Coords points="0,{top} 600,{top} 600,{bottom} 0,{bottom}"/>"#,
            bottom = top + 90
        ));
        for l in 0..3 {
            let y = top + l * 30;
            regions.push_str(&format!(
                r#"<TextLine id="r{r}l{l}"><Coords points="5,{y} 595,{y} 595,{b} 5,{b}"/><Baseline points="5,{base} 595,{base}"/><TextEquiv conf="0.93"><Unicode>Region {r} line {l} of the benchmark page</Unicode></TextEquiv></TextLine>"#,
                b = y + 25,
                base = y + 20
            ));
        }
        regions.push_str("</TextRegion>");
        regions.push_str(&format!(
            r#"<ImageRegion id="i{r}"><Coords points="610,{top} 700,{top} 700,{bottom}"/></ImageRegion>"#,
            bottom = top + 50
        ));
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<PcGts xmlns="{ns}">
  <Metadata>
    <Creator>bench</Creator>
    <Created>2017-01-01T00:00:00</Created>
    <LastChange>2017-01-01T00:00:00</LastChange>
  </Metadata>
  <Page imageFilename="bench.png" imageWidth="800" imageHeight="{height}">{regions}</Page>
</PcGts>"#,
        ns = PageVersion::Page2017.namespace(),
        height = region_count * 100 + 100
    )
    .into_bytes()
}

/// Benchmark format detection.
fn bench_format_detection(c: &mut Criterion) {
    let data = create_test_page(1);

    c.bench_function("detect_page_xml", |b| {
        b.iter(|| unpage::detect_format_from_bytes(black_box(&data)).unwrap());
    });
}

/// Benchmark schema compilation and validation.
fn bench_validation(c: &mut Criterion) {
    let path = unpage::convert::default_schema_dir().join(PageVersion::Page2017.schema_file());

    c.bench_function("compile_schema_2017", |b| {
        b.iter(|| Schema::load(black_box(&path)).unwrap());
    });

    let schema = Schema::load(&path).unwrap();
    let data = create_test_page(20);
    c.bench_function("validate_20_regions", |b| {
        b.iter(|| schema.validate(black_box(&data)).unwrap());
    });
}

/// Benchmark full conversion at various sizes.
fn bench_conversion(c: &mut Criterion) {
    let mut group = c.benchmark_group("conversion");
    let converter = unpage::Unpage::new();

    for region_count in [1, 10, 50].iter() {
        let data = create_test_page(*region_count);

        group.bench_function(format!("{}_regions", region_count), |b| {
            b.iter(|| converter.convert_bytes(black_box(&data), "bench.xml").unwrap());
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_format_detection,
    bench_validation,
    bench_conversion,
);
criterion_main!(benches);

use aidmap::data::{CountryFeature, ProjectRecord};
use aidmap::map::{MapRenderer, Viewport};
use aidmap::{aggregate, FlowCategory};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::time::Instant;

/// 36 x 18 grid of 10° "countries" keyed C000..C647
fn grid_features() -> Vec<CountryFeature> {
    let mut features = Vec::new();
    for j in 0..18 {
        for i in 0..36 {
            let lon = -180.0 + i as f64 * 10.0;
            let lat = -90.0 + j as f64 * 10.0;
            features.push(CountryFeature {
                name: format!("Cell {}/{}", i, j),
                iso_key: Some(format!("c{:03}", j * 36 + i)),
                polygons: vec![vec![vec![
                    (lon, lat),
                    (lon + 10.0, lat),
                    (lon + 10.0, lat + 10.0),
                    (lon, lat + 10.0),
                    (lon, lat),
                ]]],
            });
        }
    }
    features
}

fn records(n: usize) -> Vec<ProjectRecord> {
    (0..n)
        .map(|i| ProjectRecord {
            flow_type: Some(if i % 3 == 0 { "OOF" } else { "ODA" }.to_string()),
            recipient_key: if i % 97 == 0 {
                None
            } else {
                Some(format!(" c{:03} ", (i * 7919) % 648))
            },
        })
        .collect()
}

fn bench_aggregate(c: &mut Criterion) {
    let records = records(100_000);
    c.bench_function("aggregate_100k", |b| {
        b.iter(|| aggregate(black_box(&records), FlowCategory::Oda))
    });
}

fn bench_rasterize(c: &mut Criterion) {
    let renderer = MapRenderer::new(grid_features(), Instant::now());
    let (cols, rows) = (200, 60);
    let viewport = Viewport::world(cols * 2, rows * 4);
    c.bench_function("rasterize_200x60", |b| {
        b.iter(|| renderer.rasterize(black_box(&viewport), cols, rows))
    });
}

criterion_group!(benches, bench_aggregate, bench_rasterize);
criterion_main!(benches);

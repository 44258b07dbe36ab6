// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use serde_json::json;
use understory_map_style::{
    FeatureSnapshot, Filter, GeometryType, StyleDocument, StyleEvaluator, StyleEvaluatorBuilder,
    Value,
};

type Measure = fn(&str, &str) -> f64;

fn measure(_font: &str, text: &str) -> f64 {
    text.len() as f64 * 7.5
}

/// A road style with `n` line layers, each filtered on a different class.
fn road_document(n: usize) -> StyleDocument {
    let mut layers = vec![json!({
        "id": "water", "type": "fill", "source-layer": "water",
        "paint": {"fill-color": "#a0c8f0", "fill-opacity": {"stops": [[0, 0.5], [10, 1]]}}
    })];
    for i in 0..n {
        layers.push(json!({
            "id": format!("road-{i}"), "type": "line", "source-layer": "roads",
            "filter": ["all", ["==", "$type", "LineString"], ["==", "class", format!("c{i}")]],
            "paint": {
                "line-color": "#ffffff",
                "line-width": {"base": 1.4, "stops": [[6, 0.5], [20, 30]]}
            }
        }));
    }
    layers.push(json!({
        "id": "road-labels", "type": "symbol", "source-layer": "roads",
        "layout": {"text-field": "{name}", "text-size": 12, "text-max-width": 8}
    }));
    StyleDocument::from_value(&json!({"version": 8, "layers": layers}))
        .expect("benchmark document is valid")
}

fn road(class: usize, name: &str) -> FeatureSnapshot {
    FeatureSnapshot::new(GeometryType::MultiLineString)
        .with_source_layer("roads")
        .with_attribute("class", format!("c{class}"))
        .with_attribute("name", name)
        .with_attribute("osm_id", 42)
}

fn evaluator(layers: usize) -> StyleEvaluator<Measure> {
    StyleEvaluatorBuilder::new()
        .build(&road_document(layers), measure as Measure)
        .expect("benchmark document compiles")
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("map_style/resolve");

    for layers in [8usize, 64, 256] {
        group.bench_function(BenchmarkId::new("cache_hit", layers), |b| {
            let mut evaluator = evaluator(layers);
            let feature = road(layers / 2, "Main Street");
            evaluator.resolve_at_zoom(&feature, 12.5);
            b.iter(|| black_box(evaluator.resolve_at_zoom(black_box(&feature), 12.5).len()));
        });

        group.bench_function(BenchmarkId::new("cache_miss", layers), |b| {
            let mut evaluator = evaluator(layers);
            let features = [road(1, "Main Street"), road(layers - 1, "High Street")];
            let mut i = 0;
            b.iter(|| {
                i ^= 1;
                black_box(evaluator.resolve_at_zoom(&features[i], 12.5).len())
            });
        });
    }

    group.finish();
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("map_style/compile");
    for layers in [8usize, 256] {
        let document = road_document(layers);
        group.bench_function(BenchmarkId::new("build", layers), |b| {
            b.iter_batched(
                || document.clone(),
                |document| {
                    black_box(
                        StyleEvaluatorBuilder::new()
                            .build(&document, measure as Measure)
                            .expect("benchmark document compiles"),
                    )
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("map_style/filter");
    let filter = Filter::parse(&json!([
        "all",
        ["==", "$type", "LineString"],
        ["in", "class", "motorway", "trunk", "primary", "secondary"],
        ["!has", "tunnel"],
        ["any", [">=", "rank", 3], ["none", ["==", "oneway", true]]]
    ]));
    let attrs: [(&str, Value); 3] = [
        ("$type", Value::from("LineString")),
        ("class", Value::from("secondary")),
        ("rank", Value::from(4)),
    ];
    group.bench_function("evaluate", |b| {
        b.iter(|| black_box(filter.evaluate(black_box(&attrs[..]))));
    });
    group.finish();
}

criterion_group!(benches, bench_resolve, bench_compile, bench_filter);
criterion_main!(benches);

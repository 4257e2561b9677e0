use criterion::{Criterion, criterion_group, criterion_main};
use serde_json::json;
use shape_probe::{
    cluster_key::parse_clustering_key,
    infer::{InferenceOptions, infer_schema_with_options},
    schema::{ColumnEntry, DeclaredType, Row},
};

fn generate_rows(count: usize) -> Vec<Row> {
    (0..count)
        .map(|i| {
            let payload = match i % 4 {
                0 => json!(i),
                1 => json!(format!("event-{i}")),
                2 => json!([i, "tag", {"nested": i}]),
                _ => json!({"kind": "click", "meta": {"depth": {"value": i}}}),
            };
            let score = i as f64 / 3.0;
            let row = json!({
                "id": i,
                "payload": payload,
                "tags": [i % 7, format!("t{}", i % 3), null],
                "attrs": {
                    "region": format!("r{}", i % 5),
                    "score": score,
                    "flags": [true, false],
                    "geo": {"lat": 1.0, "lon": 2.0}
                }
            });
            row.as_object().cloned().unwrap_or_default()
        })
        .collect()
}

fn catalog() -> Vec<ColumnEntry> {
    vec![
        ColumnEntry::new("id", DeclaredType::Other),
        ColumnEntry::new("payload", DeclaredType::Variant),
        ColumnEntry::new("tags", DeclaredType::Array),
        ColumnEntry::new("attrs", DeclaredType::Object),
    ]
}

fn bench_inference(c: &mut Criterion) {
    let rows = generate_rows(1_000);
    let columns = catalog();
    let shallow = InferenceOptions::default();
    let expanded = InferenceOptions {
        expand_variant_objects: true,
        ..InferenceOptions::default()
    };

    let mut group = c.benchmark_group("infer_schema");
    group.bench_function("shallow_1000_rows", |b| {
        b.iter(|| infer_schema_with_options(&columns, &rows, &shallow))
    });
    group.bench_function("expanded_1000_rows", |b| {
        b.iter(|| infer_schema_with_options(&columns, &rows, &expanded))
    });
    group.finish();
}

fn bench_clustering_key(c: &mut Criterion) {
    let columns = ["ID", "REGION", "CREATED_AT", "PAYLOAD"];
    c.bench_function("parse_clustering_key", |b| {
        b.iter(|| {
            parse_clustering_key(
                &columns,
                Some("LINEAR(ID, SUBSTRING(REGION, 1, 3), TO_DATE(CREATED_AT))"),
            )
        })
    });
}

criterion_group!(benches, bench_inference, bench_clustering_key);
criterion_main!(benches);

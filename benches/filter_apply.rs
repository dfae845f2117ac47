use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;
use squiggly_filter::{Engine, JsonValueNode};

fn sample_document() -> serde_json::Value {
    json!({
        "id": 42,
        "title": "Reactor maintenance window",
        "reporter": {
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": "ada@example.com",
        },
        "tags": ["ops", "urgent", "maintenance"],
        "comments": (0..20).map(|i| json!({
            "author": format!("user{i}"),
            "body": format!("comment body {i}"),
        })).collect::<Vec<_>>(),
    })
}

fn bench_parse(c: &mut Criterion) {
    let engine: Engine<JsonValueNode> = Engine::new();
    let mut group = c.benchmark_group("parse");
    for (name, text) in [
        ("flat", "id,title,tags"),
        ("nested", "id,reporter[firstName,lastName]"),
        ("any_deep", "**,reporter[-email]"),
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(name), text, |b, text| {
            b.iter(|| engine.parse(text).expect("parses"));
        });
    }
    group.finish();
}

fn bench_apply(c: &mut Criterion) {
    let engine: Engine<JsonValueNode> = Engine::new();
    let root = JsonValueNode::from(sample_document());
    let mut group = c.benchmark_group("apply");
    for (name, text) in [
        ("flat", "id,title,tags"),
        ("nested", "id,reporter[firstName,lastName]"),
        ("any_deep_with_exclusion", "**,reporter[-email]"),
        ("array_of_objects", "id,comments{author}"),
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(name), text, |b, text| {
            b.iter(|| engine.apply_one(&root, text).expect("applies"));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_parse, bench_apply);
criterion_main!(benches);

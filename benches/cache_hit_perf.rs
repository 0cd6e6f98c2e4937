//! Benchmark: Memoized resolution and per-frame work

use std::io::Write;
use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use flate2::write::GzEncoder;
use flate2::Compression;
use futures::executor::block_on;
use mission_viewer::config::SceneConfig;
use mission_viewer::{
    animation, AssetCache, FactProvider, FactStore, HeadlessSurface, MemoryOriginCache,
    MemoryStore, MockEncyclopedia, MockFetcher, ModelId, PageSummary, SceneHost,
};

const HELI_ID: &str = "static/models/ingenuity-bench.glb.gz";

fn heli_payload() -> Vec<u8> {
    let document = serde_json::json!({
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [
            { "name": "heli", "children": [1, 2] },
            { "name": "rotors_01" },
            { "name": "rotors_02" },
        ],
    });
    let mut chunk = serde_json::to_vec(&document).unwrap();
    while chunk.len() % 4 != 0 {
        chunk.push(b' ');
    }
    let total = 20 + chunk.len();
    let mut glb = Vec::with_capacity(total);
    glb.extend_from_slice(b"glTF");
    glb.extend_from_slice(&2u32.to_le_bytes());
    glb.extend_from_slice(&(total as u32).to_le_bytes());
    glb.extend_from_slice(&(chunk.len() as u32).to_le_bytes());
    glb.extend_from_slice(b"JSON");
    glb.extend_from_slice(&chunk);

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&glb).unwrap();
    encoder.finish().unwrap()
}

fn cache_hit_perf_benchmark(c: &mut Criterion) {
    let fetcher = MockFetcher::new();
    fetcher.serve(HELI_ID, heli_payload());
    let source = MockEncyclopedia::new();
    source.serve(
        "Ingenuity_(helicopter)",
        "<table class=\"infobox\"></table>",
        PageSummary {
            title: "Ingenuity".into(),
            extract: String::new(),
        },
    );
    let facts = FactProvider::new(
        Arc::new(source),
        FactStore::new(Arc::new(MemoryStore::new()), "wikis"),
    )
    .unwrap();
    let cache = AssetCache::new(
        Arc::new(fetcher),
        Arc::new(MemoryOriginCache::default()),
        facts,
    );
    let id = ModelId::new(HELI_ID).unwrap();
    let model = block_on(cache.resolve(&id)).unwrap();

    c.bench_function("memoized_resolve", |b| {
        b.iter(|| black_box(block_on(cache.resolve(&id)).unwrap()))
    });

    c.bench_function("cache_hit_rate", |b| {
        b.iter(|| black_box(cache.metrics().cache_hit_rate()))
    });

    let host = SceneHost::new(HeadlessSurface::new(1280, 720), &SceneConfig::default()).unwrap();
    host.set_model(model.scene.clone());
    host.set_animation_func(Some(animation::build(&id, &model.scene).unwrap()));

    c.bench_function("animated_frame", |b| {
        b.iter(|| black_box(host.advance(1.0 / 60.0).unwrap()))
    });
}

criterion_group!(benches, cache_hit_perf_benchmark);
criterion_main!(benches);

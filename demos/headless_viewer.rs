//! Headless viewer walkthrough
//!
//! Loads the rover, lets the frame cycle run for a moment, switches to the
//! helicopter and prints the overlay each time. Without `net-http` the origin
//! and the encyclopedia are served from memory.
//!
//! ```text
//! RUST_LOG=info cargo run --example headless_viewer
//! RUST_LOG=info cargo run --example headless_viewer --features net-http -- viewer.json
//! ```

#[cfg(not(feature = "net-http"))]
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
#[cfg(not(feature = "net-http"))]
use flate2::{write::GzEncoder, Compression};
use mission_viewer::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config {path}"))?;
            ViewerConfig::from_json_str(&json)?
        }
        None => ViewerConfig::default(),
    };

    let (fetcher, source) = back_ends(&config)?;
    let store: Arc<dyn KeyValueStore> = match &config.facts.store_dir {
        Some(dir) => Arc::new(FileStore::open(dir)?),
        None => Arc::new(MemoryStore::new()),
    };
    let origin: Arc<dyn OriginCache> = match &config.cache.dir {
        Some(dir) => Arc::new(DiskOriginCache::open(dir, config.cache.name.clone()).await?),
        None => Arc::new(MemoryOriginCache::new(config.cache.name.clone())),
    };

    let facts = FactProvider::new(source, FactStore::new(store, config.facts.store_key.clone()))?;
    let cache = Arc::new(AssetCache::new(fetcher, origin, facts));
    let surface = HeadlessSurface::new(1280, 720);
    let host = SceneHost::new(surface.clone(), &config.scene)?;

    let spawner = TokioSpawner::new();
    let pulses = Arc::new(IntervalPulseSource::new());
    let _frames = host.spawn_frame_cycle(&spawner, pulses.as_ref(), config.timing.frame_period());

    let session = RecordingSession::new();
    let controller = ViewController::new(
        cache.clone(),
        host.clone(),
        Arc::new(session.clone()),
        spawner,
        pulses,
        config,
    );

    for route in ["/", "/ingenuity"] {
        if let Err(e) = controller.navigate(route).await {
            for notice in session.notices() {
                eprintln!("{}: {} ({})", notice.title, notice.body, notice.cause);
            }
            return Err(e.into());
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
        print_overlay(&controller.overlay());
        println!("frames rendered: {}", surface.frame_count());
    }

    controller.toggle_animation();
    println!("animation: {:?}", controller.anim_state());

    let metrics = cache.metrics();
    println!(
        "origin fetches: {}, cache hit rate: {:.0}%, fact fallbacks: {}",
        metrics.origin_fetches(),
        metrics.cache_hit_rate() * 100.0,
        metrics.fact_fallbacks()
    );

    controller.teardown();
    Ok(())
}

fn print_overlay(overlay: &Overlay) {
    println!("== {} ==", overlay.title);
    if let Some(duration) = overlay.duration_text() {
        println!("{duration}");
    }
    for (label, value) in &overlay.info {
        println!("  {label}: {value}");
    }
    println!("{}", overlay.about);
    if let Some(url) = &overlay.more_info {
        println!("more: {url}");
    }
}

#[cfg(feature = "net-http")]
fn back_ends(
    config: &ViewerConfig,
) -> anyhow::Result<(Arc<dyn OriginFetcher>, Arc<dyn EncyclopediaSource>)> {
    Ok((
        Arc::new(HttpFetcher::new(config.origin_base_url.clone())),
        Arc::new(WikipediaSource::new(config.facts.encyclopedia_url.clone())),
    ))
}

#[cfg(not(feature = "net-http"))]
fn back_ends(
    config: &ViewerConfig,
) -> anyhow::Result<(Arc<dyn OriginFetcher>, Arc<dyn EncyclopediaSource>)> {
    let fetcher = MockFetcher::new();
    let source = MockEncyclopedia::new();
    for vehicle in [Vehicle::Perseverance, Vehicle::Ingenuity] {
        let id = config.model_id(vehicle)?;
        let nodes: Vec<&str> = AnimationRule::for_vehicle(vehicle)
            .spins()
            .iter()
            .map(|spin| spin.node)
            .collect();
        fetcher.serve(id.as_str(), gzip(&glb(vehicle.logical_name(), &nodes)?)?);
        source.serve(
            vehicle.wiki_topic(),
            demo_page(vehicle),
            PageSummary {
                title: vehicle.display_name().to_string(),
                extract: format!("{} is part of the Mars 2020 mission.", vehicle.display_name()),
            },
        );
    }
    Ok((Arc::new(fetcher), Arc::new(source)))
}

#[cfg(not(feature = "net-http"))]
fn demo_page(vehicle: Vehicle) -> String {
    let deployed = match vehicle {
        Vehicle::Perseverance => "18 February 2021, 20:55&#160;UTC",
        Vehicle::Ingenuity => "3 April 2021",
    };
    format!(
        "<table class=\"infobox\">\
         <tr><th class=\"infobox-label\">Operator</th><td>NASA</td></tr>\
         <tr><th class=\"infobox-label\">Deployed</th><td>{deployed}<sup>[1]</sup></td></tr>\
         </table>"
    )
}

/// JSON-only GLB with one root and the given children
#[cfg(not(feature = "net-http"))]
fn glb(root: &str, children: &[&str]) -> anyhow::Result<Vec<u8>> {
    let mut nodes = vec![serde_json::json!({
        "name": root,
        "children": (1..=children.len()).collect::<Vec<_>>(),
    })];
    nodes.extend(children.iter().map(|name| serde_json::json!({ "name": name })));
    let document = serde_json::json!({
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": nodes,
    });

    let mut chunk = serde_json::to_vec(&document)?;
    while chunk.len() % 4 != 0 {
        chunk.push(b' ');
    }
    let total = u32::try_from(20 + chunk.len())?;
    let mut out = Vec::with_capacity(total as usize);
    out.extend_from_slice(b"glTF");
    out.extend_from_slice(&2u32.to_le_bytes());
    out.extend_from_slice(&total.to_le_bytes());
    out.extend_from_slice(&u32::try_from(chunk.len())?.to_le_bytes());
    out.extend_from_slice(b"JSON");
    out.extend_from_slice(&chunk);
    Ok(out)
}

#[cfg(not(feature = "net-http"))]
fn gzip(data: &[u8]) -> anyhow::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

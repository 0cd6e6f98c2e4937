//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::io::Write;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;
use parking_lot::Mutex;

use mission_viewer::controller::NowFn;
use mission_viewer::{
    AssetCache, AsyncSpawner, FactProvider, FactStore, HeadlessSurface, ManualPulseSource,
    MemoryOriginCache, MemoryStore, MockEncyclopedia, MockFetcher, PageSummary,
    RecordingSession, SceneHost, ViewController, ViewerConfig,
};

pub const ROVER_ID: &str = "static/models/perseverance-dev.glb.gz";
pub const HELI_ID: &str = "static/models/ingenuity-dev.glb.gz";

pub const ROVER_WHEELS: [&str; 6] = [
    "Wheels-F_R",
    "Wheels-M_R",
    "Wheels-F_L",
    "Wheels-M_L",
    "Wheels-R_R",
    "Wheels-R_L",
];
pub const HELI_ROTORS: [&str; 2] = ["rotors_01", "rotors_02"];

/// Minimal GLB: one root node with the given named children
pub fn glb_with_nodes(root: &str, children: &[&str]) -> Vec<u8> {
    let mut root_node = serde_json::json!({ "name": root });
    if !children.is_empty() {
        root_node["children"] = serde_json::json!((1..=children.len()).collect::<Vec<_>>());
    }
    let mut nodes = vec![root_node];
    nodes.extend(children.iter().map(|name| serde_json::json!({ "name": name })));
    glb_from_nodes(serde_json::Value::Array(nodes))
}

/// GLB whose single scene is rooted at node 0, with `nodes` taken verbatim
pub fn glb_from_nodes(nodes: serde_json::Value) -> Vec<u8> {
    let document = serde_json::json!({
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": nodes,
    });
    let mut chunk = serde_json::to_vec(&document).unwrap();
    while chunk.len() % 4 != 0 {
        chunk.push(b' ');
    }

    let total = 12 + 8 + chunk.len();
    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(b"glTF");
    out.extend_from_slice(&2u32.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(chunk.len() as u32).to_le_bytes());
    out.extend_from_slice(b"JSON");
    out.extend_from_slice(&chunk);
    out
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

pub fn rover_payload() -> Vec<u8> {
    gzip(&glb_with_nodes("rover", &ROVER_WHEELS))
}

pub fn heli_payload() -> Vec<u8> {
    gzip(&glb_with_nodes("heli", &HELI_ROTORS))
}

fn infobox_page(rows: &[(&str, &str)]) -> String {
    let rows: String = rows
        .iter()
        .map(|(label, value)| {
            format!(
                "<tr><th scope=\"row\" class=\"infobox-label\">{label}</th><td class=\"infobox-data\">{value}</td></tr>\n"
            )
        })
        .collect();
    format!("<html><body><table class=\"infobox\"><tbody>\n{rows}</tbody></table></body></html>")
}

pub fn rover_page() -> String {
    infobox_page(&[
        ("Dimensions", "3&nbsp;m long<sup class=\"reference\">[1]</sup>"),
        ("Dry mass", "1,025 kg"),
        ("Operator", "<a href=\"/wiki/NASA\">NASA</a>"),
        ("Deployed", "18 February 2021, 20:55&#160;UTC<sup>[2]</sup>"),
    ])
}

pub fn heli_page() -> String {
    infobox_page(&[
        ("Dry mass", "1.8 kg"),
        ("Deployed", "3 April 2021"),
        ("Power", "Solar panel"),
    ])
}

pub fn encyclopedia() -> MockEncyclopedia {
    let source = MockEncyclopedia::new();
    source.serve(
        "Perseverance_(rover)",
        rover_page(),
        PageSummary {
            title: "Perseverance (rover)".into(),
            extract: "Perseverance is a car-sized Mars rover.".into(),
        },
    );
    source.serve(
        "Ingenuity_(helicopter)",
        heli_page(),
        PageSummary {
            title: "Ingenuity (helicopter)".into(),
            extract: "Ingenuity is a small robotic helicopter.".into(),
        },
    );
    source
}

/// Rover deployment plus 400,000 seconds
pub fn four_days_later() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 2, 23, 12, 1, 40).unwrap()
}

/// Adjustable time source
#[derive(Clone)]
pub struct TestClock(Arc<Mutex<DateTime<Utc>>>);

impl TestClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self(Arc::new(Mutex::new(at)))
    }

    pub fn advance(&self, seconds: i64) {
        *self.0.lock() += chrono::Duration::seconds(seconds);
    }

    pub fn now_fn(&self) -> NowFn {
        let inner = Arc::clone(&self.0);
        Arc::new(move || *inner.lock())
    }
}

/// Cache wired to mock back-ends, with handles kept for assertions
pub struct CacheRig {
    pub cache: AssetCache,
    pub fetcher: MockFetcher,
    pub origin: MemoryOriginCache,
    pub source: MockEncyclopedia,
    pub store: MemoryStore,
}

pub fn cache_rig() -> CacheRig {
    let fetcher = MockFetcher::new();
    fetcher.serve(ROVER_ID, rover_payload());
    fetcher.serve(HELI_ID, heli_payload());
    let origin = MemoryOriginCache::default();
    let source = encyclopedia();
    let store = MemoryStore::new();

    let facts = FactProvider::new(
        Arc::new(source.clone()),
        FactStore::new(Arc::new(store.clone()), "wikis"),
    )
    .unwrap();
    let cache = AssetCache::new(Arc::new(fetcher.clone()), Arc::new(origin.clone()), facts);
    CacheRig {
        cache,
        fetcher,
        origin,
        source,
        store,
    }
}

/// Full viewer on a headless surface
pub struct Viewer<A: AsyncSpawner> {
    pub controller: ViewController<HeadlessSurface, A>,
    pub fetcher: MockFetcher,
    pub origin: MemoryOriginCache,
    pub source: MockEncyclopedia,
    pub surface: HeadlessSurface,
    pub session: RecordingSession,
    pub pulses: Arc<ManualPulseSource>,
    pub clock: TestClock,
}

pub fn viewer<A: AsyncSpawner + 'static>(spawner: A) -> Viewer<A> {
    let rig = cache_rig();
    let surface = HeadlessSurface::new(1280, 720);
    let config = ViewerConfig::default();
    let host = SceneHost::new(surface.clone(), &config.scene).unwrap();
    let session = RecordingSession::new();
    let pulses = Arc::new(ManualPulseSource::new());
    let clock = TestClock::new(four_days_later());

    let controller = ViewController::with_clock(
        Arc::new(rig.cache),
        host,
        Arc::new(session.clone()),
        spawner,
        pulses.clone(),
        config,
        clock.now_fn(),
    );
    Viewer {
        controller,
        fetcher: rig.fetcher,
        origin: rig.origin,
        source: rig.source,
        surface,
        session,
        pulses,
        clock,
    }
}

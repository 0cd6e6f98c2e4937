//! Shared payload builders for unit tests

use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;

/// Minimal GLB: one root node with the given named children, no buffers
pub(crate) fn glb_with_nodes(root: &str, children: &[&str]) -> Vec<u8> {
    let mut root_node = serde_json::json!({ "name": root });
    if !children.is_empty() {
        root_node["children"] = serde_json::json!((1..=children.len()).collect::<Vec<_>>());
    }
    let mut nodes = vec![root_node];
    nodes.extend(children.iter().map(|name| serde_json::json!({ "name": name })));

    let document = serde_json::json!({
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": nodes,
    });
    encode_glb(&serde_json::to_vec(&document).unwrap())
}

pub(crate) fn encode_glb(json: &[u8]) -> Vec<u8> {
    let mut chunk = json.to_vec();
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

pub(crate) fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Encyclopedia page with an infobox in the shape the provider expects
pub(crate) const ROVER_PAGE: &str = r##"<html><body>
<table class="infobox vcard">
<tbody>
<tr><th colspan="2" class="infobox-above">Perseverance</th></tr>
<tr><th scope="row" class="infobox-label">Dimensions</th><td class="infobox-data">3&nbsp;m long<sup class="reference"><a href="#cite_note-1">[1]</a></sup></td></tr>
<tr><th scope="row" class="infobox-label">Dry mass</th><td class="infobox-data">1,025 kg</td></tr>
<tr><th scope="row" class="infobox-label">Operator</th><td class="infobox-data"><a href="/wiki/NASA">NASA</a></td></tr>
<tr><th scope="row" class="infobox-label">Deployed</th><td class="infobox-data">18 February 2021, 20:55&#160;UTC<sup class="reference">[2]</sup></td></tr>
</tbody>
</table>
<p>Body text.</p>
</body></html>"##;

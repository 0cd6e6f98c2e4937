//! Payload decoding stages
//!
//! A fetched model goes through two awaitable stages: gzip decompression and
//! binary glTF parsing. Each stage reports failure through its own error
//! class (`Decode`, `Parse`).

pub mod gltf;
pub mod gzip;

pub use self::gltf::{load_glb_bytes, parse_scene};
pub use self::gzip::{decompress, gunzip};

//! Scene data: what gets drawn and with what.
//!
//! - `mesh` holds interleaved vertex data and its GPU buffers
//! - `material` pairs a program with the textures it samples
//! - `transform` is a position/rotation/scale value type
//! - `model_instance` and `particles` are the two drawables
//! - `scene` groups drawables with an optional light
//! - `texture` wraps wgpu textures for the wgpu backend

pub mod material;
pub mod mesh;
pub mod model_instance;
pub mod particles;
pub mod scene;
pub mod texture;
pub mod transform;

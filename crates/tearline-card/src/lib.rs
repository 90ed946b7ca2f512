//! Tearline Card - the 3D card model controller
//!
//! A mounted [`CardModel`] owns a private scene instance cloned from an
//! imported model, binds the card image through a [`CardFaceRenderer`] and
//! runs the appear, tear and slide choreography from explicit clock input.

pub mod camera;
pub mod config;
pub mod face;
pub mod model;
pub mod scene;
pub mod uv;

pub use camera::CardCamera;
pub use config::CardConfig;
pub use face::{CardFaceRenderer, CrossfadeFace, DecalFace, FaceMode, FaceVariant, UvSplitFace};
pub use model::{CardEvent, CardModel, CardState, MeshDraw, TextureInfo, TextureRequest};
pub use scene::{CardMesh, CardScene};
pub use uv::{back_face_uv, planar_uvs, BACK_FACE_NORMAL_Z};

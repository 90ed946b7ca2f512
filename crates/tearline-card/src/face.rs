//! Card face renderers
//!
//! One capability interface decides how the card image is laid onto the
//! model's meshes: which UVs each mesh uses, which window of the texture it
//! samples and whether a texture change cross-fades.

use serde::{Deserialize, Serialize};
use tearline_core::TextureRegion;
use tearline_import::MeshBounds;

use crate::uv::planar_uvs;

/// Shader path selected by a face renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum FaceMode {
    /// Sample the bound texture through the mesh's region
    Region = 0,
    /// Noise-masked wipe from the previous texture to the next
    Crossfade = 1,
}

/// Mesh data a face renderer looks at, in the card's rest pose
pub struct FaceMesh<'a> {
    pub positions: &'a [[f32; 3]],
    pub uvs: &'a [[f32; 2]],
    pub bounds: MeshBounds,
}

pub trait CardFaceRenderer: Send {
    fn name(&self) -> &'static str;

    /// Replacement UVs for a mesh, or `None` to keep the authored ones.
    /// `card_bounds` is the union of every mesh's bounds.
    fn project_uvs(&self, mesh: &FaceMesh<'_>, card_bounds: &MeshBounds) -> Option<Vec<[f32; 2]>>;

    /// The texture window each mesh samples, in mesh order
    fn regions(&self, bounds: &[MeshBounds]) -> Vec<TextureRegion>;

    fn mode(&self) -> FaceMode {
        FaceMode::Region
    }

    /// A new texture was bound at `now_ms`; `had_previous` is false for the first one
    fn begin_transition(&mut self, _now_ms: f64, _had_previous: bool) {}

    /// Cross-fade progress in [0, 1]; 1 means only the current texture shows
    fn blend(&self, _now_ms: f64) -> f32 {
        1.0
    }
}

/// Fallback UVs only for meshes that have none
fn fill_missing_uvs(mesh: &FaceMesh<'_>) -> Option<Vec<[f32; 2]>> {
    if !mesh.uvs.is_empty() && mesh.uvs.len() == mesh.positions.len() {
        return None;
    }
    Some(planar_uvs(mesh.positions, &mesh.bounds))
}

/// Splits the image between a thin top strip and the card body
#[derive(Debug, Clone)]
pub struct UvSplitFace {
    pub top_ratio: f32,
}

impl UvSplitFace {
    pub fn new(top_ratio: f32) -> Self {
        Self {
            top_ratio: top_ratio.clamp(0.0, 1.0),
        }
    }

    pub fn top_region(&self) -> TextureRegion {
        TextureRegion::new([0.0, 1.0 - self.top_ratio], [1.0, self.top_ratio])
    }

    pub fn body_region(&self) -> TextureRegion {
        TextureRegion::new([0.0, 0.0], [1.0, 1.0 - self.top_ratio])
    }
}

impl CardFaceRenderer for UvSplitFace {
    fn name(&self) -> &'static str {
        "uv_split"
    }

    fn project_uvs(&self, mesh: &FaceMesh<'_>, _card_bounds: &MeshBounds) -> Option<Vec<[f32; 2]>> {
        fill_missing_uvs(mesh)
    }

    fn regions(&self, bounds: &[MeshBounds]) -> Vec<TextureRegion> {
        if bounds.len() <= 1 {
            return vec![TextureRegion::FULL; bounds.len()];
        }

        // Highest bounding-box centre gets the strip
        let top = bounds
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.center()[1].total_cmp(&b.center()[1]))
            .map(|(i, _)| i)
            .unwrap_or(0);

        (0..bounds.len())
            .map(|i| if i == top { self.top_region() } else { self.body_region() })
            .collect()
    }
}

/// Projects the whole image across the card as one decal
#[derive(Debug, Clone, Default)]
pub struct DecalFace;

impl CardFaceRenderer for DecalFace {
    fn name(&self) -> &'static str {
        "decal"
    }

    fn project_uvs(&self, mesh: &FaceMesh<'_>, card_bounds: &MeshBounds) -> Option<Vec<[f32; 2]>> {
        Some(planar_uvs(mesh.positions, card_bounds))
    }

    fn regions(&self, bounds: &[MeshBounds]) -> Vec<TextureRegion> {
        vec![TextureRegion::FULL; bounds.len()]
    }
}

/// Full-image face that wipes between textures when the image changes
#[derive(Debug, Clone)]
pub struct CrossfadeFace {
    pub duration_ms: f64,
    started_at: Option<f64>,
}

impl CrossfadeFace {
    pub fn new(duration_ms: f64) -> Self {
        Self {
            duration_ms,
            started_at: None,
        }
    }
}

impl CardFaceRenderer for CrossfadeFace {
    fn name(&self) -> &'static str {
        "crossfade"
    }

    fn project_uvs(&self, mesh: &FaceMesh<'_>, _card_bounds: &MeshBounds) -> Option<Vec<[f32; 2]>> {
        fill_missing_uvs(mesh)
    }

    fn regions(&self, bounds: &[MeshBounds]) -> Vec<TextureRegion> {
        vec![TextureRegion::FULL; bounds.len()]
    }

    fn mode(&self) -> FaceMode {
        FaceMode::Crossfade
    }

    fn begin_transition(&mut self, now_ms: f64, had_previous: bool) {
        self.started_at = had_previous.then_some(now_ms);
    }

    fn blend(&self, now_ms: f64) -> f32 {
        match self.started_at {
            Some(start) if self.duration_ms > 0.0 => {
                ((now_ms - start) / self.duration_ms).clamp(0.0, 1.0) as f32
            }
            _ => 1.0,
        }
    }
}

/// Face renderer selection, as written in configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FaceVariant {
    UvSplit {
        #[serde(default = "default_top_ratio")]
        top_ratio: f32,
    },
    Decal,
    Crossfade {
        #[serde(default = "default_crossfade_ms")]
        duration_ms: f64,
    },
}

fn default_top_ratio() -> f32 {
    0.05
}

fn default_crossfade_ms() -> f64 {
    1000.0
}

impl Default for FaceVariant {
    fn default() -> Self {
        FaceVariant::UvSplit {
            top_ratio: default_top_ratio(),
        }
    }
}

impl FaceVariant {
    pub fn build(&self) -> Box<dyn CardFaceRenderer> {
        match self {
            FaceVariant::UvSplit { top_ratio } => Box::new(UvSplitFace::new(*top_ratio)),
            FaceVariant::Decal => Box::new(DecalFace),
            FaceVariant::Crossfade { duration_ms } => Box::new(CrossfadeFace::new(*duration_ms)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds_at(y: f32) -> MeshBounds {
        MeshBounds {
            min: [-1.0, y - 0.1, 0.0],
            max: [1.0, y + 0.1, 0.0],
        }
    }

    fn close(a: TextureRegion, offset: [f32; 2], repeat: [f32; 2]) -> bool {
        (a.offset[0] - offset[0]).abs() < 1e-6
            && (a.offset[1] - offset[1]).abs() < 1e-6
            && (a.repeat[0] - repeat[0]).abs() < 1e-6
            && (a.repeat[1] - repeat[1]).abs() < 1e-6
    }

    #[test]
    fn split_gives_top_mesh_the_strip() {
        let face = UvSplitFace::new(0.06);
        // Bottom mesh listed first: order follows height, not mesh order
        let regions = face.regions(&[bounds_at(0.0), bounds_at(1.5)]);
        assert!(close(regions[1], [0.0, 0.94], [1.0, 0.06]));
        assert!(close(regions[0], [0.0, 0.0], [1.0, 0.94]));
    }

    #[test]
    fn split_extra_meshes_get_body_region() {
        let face = UvSplitFace::new(0.05);
        let regions = face.regions(&[bounds_at(2.0), bounds_at(0.0), bounds_at(-1.0)]);
        assert!(close(regions[0], [0.0, 0.95], [1.0, 0.05]));
        assert!(close(regions[1], [0.0, 0.0], [1.0, 0.95]));
        assert!(close(regions[2], [0.0, 0.0], [1.0, 0.95]));
    }

    #[test]
    fn split_single_mesh_takes_whole_image() {
        let face = UvSplitFace::new(0.05);
        assert_eq!(face.regions(&[bounds_at(0.0)]), vec![TextureRegion::FULL]);
    }

    #[test]
    fn authored_uvs_are_kept() {
        let positions = [[0.0, 0.0, 0.0], [1.0, 1.0, 0.0]];
        let uvs = [[0.3, 0.3], [0.6, 0.6]];
        let mesh = FaceMesh {
            positions: &positions,
            uvs: &uvs,
            bounds: MeshBounds::from_positions(&positions).unwrap(),
        };
        let card = mesh.bounds;
        assert!(UvSplitFace::new(0.05).project_uvs(&mesh, &card).is_none());
        // Decal always projects across the whole card
        assert_eq!(
            DecalFace.project_uvs(&mesh, &card),
            Some(vec![[0.0, 0.0], [1.0, 1.0]])
        );
    }

    #[test]
    fn missing_uvs_are_projected_per_mesh() {
        let positions = [[2.0, 2.0, 0.0], [4.0, 3.0, 0.0]];
        let mesh = FaceMesh {
            positions: &positions,
            uvs: &[],
            bounds: MeshBounds::from_positions(&positions).unwrap(),
        };
        let card = MeshBounds { min: [0.0; 3], max: [4.0, 4.0, 0.0] };
        assert_eq!(
            UvSplitFace::new(0.05).project_uvs(&mesh, &card),
            Some(vec![[0.0, 0.0], [1.0, 1.0]])
        );
    }

    #[test]
    fn crossfade_first_texture_shows_immediately() {
        let mut face = CrossfadeFace::new(1000.0);
        face.begin_transition(0.0, false);
        assert_eq!(face.blend(0.0), 1.0);

        face.begin_transition(5000.0, true);
        assert_eq!(face.blend(5000.0), 0.0);
        assert!((face.blend(5500.0) - 0.5).abs() < 1e-6);
        assert_eq!(face.blend(7000.0), 1.0);
        assert_eq!(face.mode(), FaceMode::Crossfade);
    }

    #[test]
    fn variant_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            face: FaceVariant,
        }
        let w: Wrapper = toml::from_str("face = { kind = \"uv_split\", top_ratio = 0.06 }").unwrap();
        assert_eq!(w.face, FaceVariant::UvSplit { top_ratio: 0.06 });
        let w: Wrapper = toml::from_str("face = { kind = \"crossfade\" }").unwrap();
        assert_eq!(w.face.build().name(), "crossfade");
        let w: Wrapper = toml::from_str("face = { kind = \"decal\" }").unwrap();
        assert_eq!(w.face.build().mode(), FaceMode::Region);
    }
}

//! UV fallback projection
//!
//! Models exported without texture coordinates get a planar projection:
//! X/Y normalized against a bounding box, bottom-left origin, so the card
//! image lands upright on the front face.

use tearline_import::MeshBounds;

/// Project positions onto the XY plane of `bounds`, mapping the box to [0,1]²
pub fn planar_uvs(positions: &[[f32; 3]], bounds: &MeshBounds) -> Vec<[f32; 2]> {
    let size = bounds.size();
    let inv_w = if size[0] > f32::EPSILON { 1.0 / size[0] } else { 0.0 };
    let inv_h = if size[1] > f32::EPSILON { 1.0 / size[1] } else { 0.0 };
    positions
        .iter()
        .map(|p| {
            [
                ((p[0] - bounds.min[0]) * inv_w).clamp(0.0, 1.0),
                ((p[1] - bounds.min[1]) * inv_h).clamp(0.0, 1.0),
            ]
        })
        .collect()
}

/// Local-space normal Z below which a fragment counts as back-facing.
/// `card_shader.wgsl` in the render crate carries the same threshold.
pub const BACK_FACE_NORMAL_Z: f32 = -0.35;

/// Mirror U for back-facing geometry so text reads correctly from behind
pub fn back_face_uv(uv: [f32; 2], local_normal_z: f32) -> [f32; 2] {
    if local_normal_z < BACK_FACE_NORMAL_Z {
        [1.0 - uv[0], uv[1]]
    } else {
        uv
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_map_to_unit_square() {
        let bounds = MeshBounds { min: [-1.0, -2.0, 0.0], max: [1.0, 2.0, 0.1] };
        let uvs = planar_uvs(&[[-1.0, -2.0, 0.0], [1.0, 2.0, 0.0], [0.0, 0.0, 0.05]], &bounds);
        assert_eq!(uvs, vec![[0.0, 0.0], [1.0, 1.0], [0.5, 0.5]]);
    }

    #[test]
    fn flat_axis_does_not_divide_by_zero() {
        let bounds = MeshBounds { min: [0.0, 0.0, 0.0], max: [1.0, 0.0, 0.0] };
        let uvs = planar_uvs(&[[0.5, 0.0, 0.0]], &bounds);
        assert_eq!(uvs, vec![[0.5, 0.0]]);
    }

    #[test]
    fn back_faces_mirror_horizontally() {
        assert_eq!(back_face_uv([0.2, 0.7], 1.0), [0.2, 0.7]);
        assert_eq!(back_face_uv([0.2, 0.7], -0.3), [0.2, 0.7]);
        let mirrored = back_face_uv([0.2, 0.7], -1.0);
        assert!((mirrored[0] - 0.8).abs() < 1e-6);
        assert_eq!(mirrored[1], 0.7);
    }
}

//! Node-level animation clips
//!
//! Per-node keyframe tracks targeting named scene-graph nodes: transform
//! channels plus morph target weights, as authored in the card model.

use tearline_import::{ChannelProperty, ImportedNodeClip};

/// Which node property a track animates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeProperty {
    Translation,
    /// Quaternion xyzw
    Rotation,
    Scale,
    /// One weight per morph target
    MorphWeights,
}

/// How to interpolate between keyframes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    /// Jump to next value (no blending)
    Step,
    #[default]
    Linear,
    /// Imported cubic spline keys keep only their values and are sampled linearly
    CubicSpline,
}

#[derive(Debug, Clone)]
pub struct NodeKeyframe {
    pub time: f64,
    pub value: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct NodeTrack {
    pub node_index: usize,
    pub node_name: String,
    pub property: NodeProperty,
    pub interpolation: Interpolation,
    pub keyframes: Vec<NodeKeyframe>,
}

#[derive(Debug, Clone)]
pub struct NodeClip {
    pub name: String,
    /// Seconds
    pub duration: f64,
    pub tracks: Vec<NodeTrack>,
}

impl NodeClip {
    /// Convert from imported glTF node animation data
    pub fn from_imported(imported: &ImportedNodeClip) -> Self {
        let tracks = imported
            .channels
            .iter()
            .map(|ch| {
                let property = match ch.property {
                    ChannelProperty::Translation => NodeProperty::Translation,
                    ChannelProperty::Rotation => NodeProperty::Rotation,
                    ChannelProperty::Scale => NodeProperty::Scale,
                    ChannelProperty::MorphWeights => NodeProperty::MorphWeights,
                };

                let interpolation = match ch.interpolation.as_str() {
                    "STEP" => Interpolation::Step,
                    "CUBICSPLINE" => Interpolation::CubicSpline,
                    _ => Interpolation::Linear,
                };

                let keyframes = ch
                    .keyframes
                    .iter()
                    .map(|kf| NodeKeyframe {
                        time: kf.time as f64,
                        value: kf.value.clone(),
                    })
                    .collect();

                NodeTrack {
                    node_index: ch.node_index,
                    node_name: ch.node_name.clone(),
                    property,
                    interpolation,
                    keyframes,
                }
            })
            .collect();

        Self {
            name: imported.name.clone(),
            duration: imported.duration as f64,
            tracks,
        }
    }

    /// The first clip whose name contains `needle` (case-insensitive),
    /// falling back to the first clip
    pub fn select<'a>(clips: &'a [NodeClip], needle: &str) -> Option<&'a NodeClip> {
        let needle = needle.to_lowercase();
        clips
            .iter()
            .find(|c| c.name.to_lowercase().contains(&needle))
            .or_else(|| clips.first())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tearline_import::{ImportedKeyframe, ImportedNodeChannel};

    fn clip(name: &str) -> NodeClip {
        NodeClip {
            name: name.into(),
            duration: 1.0,
            tracks: vec![],
        }
    }

    #[test]
    fn select_prefers_named_clip() {
        let clips = vec![clip("Idle"), clip("CardTearAction"), clip("Spin")];
        assert_eq!(NodeClip::select(&clips, "tear").unwrap().name, "CardTearAction");
    }

    #[test]
    fn select_falls_back_to_first() {
        let clips = vec![clip("Idle"), clip("Spin")];
        assert_eq!(NodeClip::select(&clips, "tear").unwrap().name, "Idle");
        assert!(NodeClip::select(&[], "tear").is_none());
    }

    #[test]
    fn converts_imported_channels() {
        let imported = ImportedNodeClip {
            name: "Tear".into(),
            duration: 2.0,
            channels: vec![ImportedNodeChannel {
                node_index: 3,
                node_name: "strip".into(),
                property: ChannelProperty::MorphWeights,
                interpolation: "STEP".into(),
                keyframes: vec![ImportedKeyframe {
                    time: 0.5,
                    value: vec![0.25, 0.75],
                }],
            }],
        };
        let clip = NodeClip::from_imported(&imported);
        assert_eq!(clip.duration, 2.0);
        let track = &clip.tracks[0];
        assert_eq!(track.node_index, 3);
        assert_eq!(track.property, NodeProperty::MorphWeights);
        assert_eq!(track.interpolation, Interpolation::Step);
        assert_eq!(track.keyframes[0].time, 0.5);
    }
}

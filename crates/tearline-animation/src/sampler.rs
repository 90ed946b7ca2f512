//! Keyframe sampling: binary search plus interpolation, with quaternion
//! slerp for rotation tracks

use crate::clip::{Interpolation, NodeProperty, NodeTrack};

/// Sample a node track at a given time.
///
/// Returns 3 floats for translation/scale, 4 for rotation and one per
/// morph target for weight tracks. Times outside the keyed range clamp to
/// the first/last keyframe.
pub fn sample_node_track(track: &NodeTrack, time: f64) -> Vec<f32> {
    let keyframes = &track.keyframes;
    let is_rotation = track.property == NodeProperty::Rotation;

    let (Some(first), Some(last)) = (keyframes.first(), keyframes.last()) else {
        return match track.property {
            NodeProperty::Rotation => vec![0.0, 0.0, 0.0, 1.0],
            NodeProperty::Scale => vec![1.0; 3],
            NodeProperty::Translation => vec![0.0; 3],
            NodeProperty::MorphWeights => Vec::new(),
        };
    };

    if time <= first.time {
        return first.value.clone();
    }
    if time >= last.time {
        return last.value.clone();
    }

    let idx = match keyframes.binary_search_by(|kf| kf.time.total_cmp(&time)) {
        Ok(i) => return keyframes[i].value.clone(),
        Err(i) => i,
    };

    let prev = &keyframes[idx - 1];
    let next = &keyframes[idx];

    let span = next.time - prev.time;
    if span <= 0.0 {
        return prev.value.clone();
    }
    let t = ((time - prev.time) / span) as f32;

    match track.interpolation {
        Interpolation::Step => prev.value.clone(),
        Interpolation::Linear | Interpolation::CubicSpline => {
            if is_rotation {
                quat_slerp(&prev.value, &next.value, t)
            } else {
                lerp_vec(&prev.value, &next.value, t)
            }
        }
    }
}

/// Component-wise linear interpolation; missing components read as zero
pub fn lerp_vec(a: &[f32], b: &[f32], t: f32) -> Vec<f32> {
    (0..a.len().max(b.len()))
        .map(|i| {
            let av = a.get(i).copied().unwrap_or(0.0);
            let bv = b.get(i).copied().unwrap_or(0.0);
            av + (bv - av) * t
        })
        .collect()
}

/// Quaternion spherical linear interpolation (slerp) with shortest-path correction.
///
/// Input quaternions are xyzw format. The result is normalized.
pub fn quat_slerp(a: &[f32], b: &[f32], t: f32) -> Vec<f32> {
    if a.len() < 4 || b.len() < 4 {
        return vec![0.0, 0.0, 0.0, 1.0];
    }

    let (ax, ay, az, aw) = (a[0], a[1], a[2], a[3]);
    let (mut bx, mut by, mut bz, mut bw) = (b[0], b[1], b[2], b[3]);

    let mut dot = ax * bx + ay * by + az * bz + aw * bw;

    // Shortest path
    if dot < 0.0 {
        bx = -bx;
        by = -by;
        bz = -bz;
        bw = -bw;
        dot = -dot;
    }

    // Nearly parallel: lerp avoids dividing by sin(0)
    let (scale_a, scale_b) = if dot > 0.9995 {
        (1.0 - t, t)
    } else {
        let theta = dot.acos();
        let sin_theta = theta.sin();
        (
            ((1.0 - t) * theta).sin() / sin_theta,
            (t * theta).sin() / sin_theta,
        )
    };

    let rx = scale_a * ax + scale_b * bx;
    let ry = scale_a * ay + scale_b * by;
    let rz = scale_a * az + scale_b * bz;
    let rw = scale_a * aw + scale_b * bw;

    let len = (rx * rx + ry * ry + rz * rz + rw * rw).sqrt();
    if len < 1e-10 {
        return vec![0.0, 0.0, 0.0, 1.0];
    }
    vec![rx / len, ry / len, rz / len, rw / len]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::NodeKeyframe;

    fn track(property: NodeProperty, interpolation: Interpolation, keys: &[(f64, &[f32])]) -> NodeTrack {
        NodeTrack {
            node_index: 0,
            node_name: "strip".into(),
            property,
            interpolation,
            keyframes: keys
                .iter()
                .map(|(time, value)| NodeKeyframe {
                    time: *time,
                    value: value.to_vec(),
                })
                .collect(),
        }
    }

    #[test]
    fn empty_tracks_return_rest_values() {
        let t = track(NodeProperty::Rotation, Interpolation::Linear, &[]);
        assert_eq!(sample_node_track(&t, 0.5), vec![0.0, 0.0, 0.0, 1.0]);
        let s = track(NodeProperty::Scale, Interpolation::Linear, &[]);
        assert_eq!(sample_node_track(&s, 0.5), vec![1.0; 3]);
    }

    #[test]
    fn clamps_outside_keyed_range() {
        let t = track(
            NodeProperty::Translation,
            Interpolation::Linear,
            &[(1.0, &[1.0, 2.0, 3.0]), (2.0, &[4.0, 5.0, 6.0])],
        );
        assert_eq!(sample_node_track(&t, 0.0), vec![1.0, 2.0, 3.0]);
        assert_eq!(sample_node_track(&t, 9.0), vec![4.0, 5.0, 6.0]);
    }

    #[test]
    fn linear_midpoint() {
        let t = track(
            NodeProperty::Translation,
            Interpolation::Linear,
            &[(0.0, &[0.0, 0.0, 0.0]), (2.0, &[10.0, 20.0, 30.0])],
        );
        let v = sample_node_track(&t, 1.0);
        assert!((v[0] - 5.0).abs() < 1e-5);
        assert!((v[1] - 10.0).abs() < 1e-5);
        assert!((v[2] - 15.0).abs() < 1e-5);
    }

    #[test]
    fn step_holds_previous() {
        let t = track(
            NodeProperty::MorphWeights,
            Interpolation::Step,
            &[(0.0, &[0.0, 1.0]), (1.0, &[1.0, 0.0])],
        );
        assert_eq!(sample_node_track(&t, 0.5), vec![0.0, 1.0]);
    }

    #[test]
    fn morph_weights_interpolate_per_target() {
        let t = track(
            NodeProperty::MorphWeights,
            Interpolation::Linear,
            &[(0.0, &[0.0, 1.0]), (1.0, &[1.0, 0.0])],
        );
        let v = sample_node_track(&t, 0.25);
        assert!((v[0] - 0.25).abs() < 1e-6);
        assert!((v[1] - 0.75).abs() < 1e-6);
    }

    #[test]
    fn slerp_identity_at_endpoints() {
        let a = [0.0, 0.0, 0.0, 1.0];
        let b = [0.0, 0.7071, 0.0, 0.7071];

        let r0 = quat_slerp(&a, &b, 0.0);
        let r1 = quat_slerp(&a, &b, 1.0);
        for i in 0..4 {
            assert!((r0[i] - a[i]).abs() < 1e-4);
            assert!((r1[i] - b[i]).abs() < 1e-3);
        }
    }

    #[test]
    fn slerp_midpoint_is_unit_length() {
        let r = quat_slerp(&[0.0, 0.0, 0.0, 1.0], &[0.0, 1.0, 0.0, 0.0], 0.5);
        let len: f32 = r.iter().map(|c| c * c).sum::<f32>().sqrt();
        assert!((len - 1.0).abs() < 1e-5);
        assert!((r[1] - r[3]).abs() < 1e-5);
    }
}

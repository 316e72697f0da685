use {
    crate::{
        clip::{AnimationClip, NodeAnimationTrack, Sample},
        skeleton::Skeleton,
    },
    nalgebra as na,
};

/// Below this sine of half-angle between rotations slerp falls back
/// to normalized lerp.
const SLERP_EPSILON: f32 = 1.0e-6;

/// Final skinning matrices, one per bone.
#[derive(Clone, Debug)]
pub struct Pose {
    pub matrices: Box<[na::Matrix4<f32>]>,
}

impl Pose {
    pub fn identity(size: usize) -> Pose {
        Pose {
            matrices: (0..size).map(|_| na::Matrix4::identity()).collect(),
        }
    }

    pub fn for_skeleton(skeleton: &Skeleton<'_>) -> Pose {
        Pose::identity(skeleton.bone_count())
    }

    pub fn matrices(&self) -> &[na::Matrix4<f32>] {
        &self.matrices
    }
}

impl NodeAnimationTrack<'_> {
    /// Translation at tick `t`.
    ///
    /// Between two keys the earlier key is weighted by the factor and the
    /// later one by its complement.
    pub fn translation_at(&self, t: f64, wrap: bool) -> na::Vector3<f32> {
        match self.position.sample(t, wrap) {
            Sample::Empty => na::Vector3::zeros(),
            Sample::Key(key) => *key,
            Sample::Between { from, to, factor } => {
                from * factor + to * (1.0 - factor)
            }
        }
    }

    pub fn rotation_at(&self, t: f64, wrap: bool) -> na::UnitQuaternion<f32> {
        match self.rotation.sample(t, wrap) {
            Sample::Empty => na::UnitQuaternion::identity(),
            Sample::Key(key) => *key,
            Sample::Between { from, to, factor } => slerp(from, to, factor),
        }
    }

    /// Scale at tick `t`.
    /// Steps to the later key as soon as the earlier one is passed.
    pub fn scale_at(&self, t: f64, wrap: bool) -> na::Vector3<f32> {
        match self.scale.sample(t, wrap) {
            Sample::Empty => na::Vector3::repeat(1.0),
            Sample::Key(key) => *key,
            Sample::Between { to, .. } => *to,
        }
    }

    /// Local transform of the node at tick `t`.
    pub fn transform_at(&self, t: f64, wrap: bool) -> na::Matrix4<f32> {
        compose_transform(
            &self.translation_at(t, wrap),
            &self.rotation_at(t, wrap),
            &self.scale_at(t, wrap),
        )
    }
}

/// Builds `T * R * S` matrix.
pub fn compose_transform(
    translation: &na::Vector3<f32>,
    rotation: &na::UnitQuaternion<f32>,
    scale: &na::Vector3<f32>,
) -> na::Matrix4<f32> {
    let rs = rotation.to_rotation_matrix().into_inner()
        * na::Matrix3::from_diagonal(scale);

    let mut m = rs.to_homogeneous();
    m[(0, 3)] = translation.x;
    m[(1, 3)] = translation.y;
    m[(2, 3)] = translation.z;
    m
}

/// Shortest-arc spherical interpolation, normalized.
pub fn slerp(
    from: &na::UnitQuaternion<f32>,
    to: &na::UnitQuaternion<f32>,
    factor: f32,
) -> na::UnitQuaternion<f32> {
    let a = *from.quaternion();
    let mut b = *to.quaternion();
    if a.dot(&b) < 0.0 {
        b = -b;
    }

    let blended = from
        .try_slerp(&na::UnitQuaternion::new_unchecked(b), factor, SLERP_EPSILON)
        .map(|q| q.into_inner())
        .unwrap_or_else(|| a.lerp(&b, factor));

    na::UnitQuaternion::new_normalize(blended)
}

/// Evaluates `clip` at `time` seconds and writes skinning matrices
/// of every bone into `out`.
///
/// `scratch` receives world transforms of every node.
/// Nothing is allocated; the only state touched besides the buffers is
/// the clip's track cursors.
///
/// # Panics
///
/// Panics if `scratch` is shorter than node count or `out` is shorter
/// than bone count.
pub fn evaluate_pose(
    skeleton: &Skeleton<'_>,
    clip: &AnimationClip<'_>,
    time: f64,
    repeat: bool,
    scratch: &mut [na::Matrix4<f32>],
    out: &mut [na::Matrix4<f32>],
) {
    load_bind_locals(skeleton, scratch);

    let t = clip.tick_at(time, repeat);
    for track in clip.tracks() {
        scratch[track.node()] = track.transform_at(t, repeat);
    }

    compose_hierarchy(skeleton, scratch, out);
}

/// Writes skinning matrices of the bind pose into `out`.
///
/// # Panics
///
/// Same as [`evaluate_pose`].
pub fn evaluate_bind_pose(
    skeleton: &Skeleton<'_>,
    scratch: &mut [na::Matrix4<f32>],
    out: &mut [na::Matrix4<f32>],
) {
    load_bind_locals(skeleton, scratch);
    compose_hierarchy(skeleton, scratch, out);
}

fn load_bind_locals(skeleton: &Skeleton<'_>, scratch: &mut [na::Matrix4<f32>]) {
    assert!(
        scratch.len() >= skeleton.node_count(),
        "Scratch holds {} matrices, skeleton has {} nodes",
        scratch.len(),
        skeleton.node_count()
    );

    for (m, node) in scratch.iter_mut().zip(skeleton.nodes()) {
        *m = *node.local();
    }
}

/// Turns local transforms into world transforms in a single forward pass.
/// Parents always precede children in the node array.
fn compose_hierarchy(
    skeleton: &Skeleton<'_>,
    scratch: &mut [na::Matrix4<f32>],
    out: &mut [na::Matrix4<f32>],
) {
    assert!(
        out.len() >= skeleton.bone_count(),
        "Output holds {} matrices, skeleton has {} bones",
        out.len(),
        skeleton.bone_count()
    );

    let nodes = skeleton.nodes();
    let offsets = skeleton.bone_offsets();

    for (index, node) in nodes.iter().enumerate() {
        if let Some(parent) = node.parent() {
            debug_assert!(parent < index);
            if !nodes[parent].is_mesh_node() {
                scratch[index] = scratch[parent] * scratch[index];
            }
        }

        if let Some(bone) = node.bone() {
            out[bone] = scratch[index] * offsets[bone];
        }
    }
}

/// Reusable evaluation context owning node scratch matrices.
#[derive(Debug)]
pub struct PoseEvaluator {
    scratch: Vec<na::Matrix4<f32>>,
}

impl PoseEvaluator {
    pub fn new(skeleton: &Skeleton<'_>) -> Self {
        PoseEvaluator {
            scratch: vec![na::Matrix4::identity(); skeleton.node_count()],
        }
    }

    pub fn evaluate(
        &mut self,
        skeleton: &Skeleton<'_>,
        clip: &AnimationClip<'_>,
        time: f64,
        repeat: bool,
        out: &mut [na::Matrix4<f32>],
    ) {
        self.fit(skeleton);
        evaluate_pose(skeleton, clip, time, repeat, &mut self.scratch, out)
    }

    pub fn evaluate_into(
        &mut self,
        skeleton: &Skeleton<'_>,
        clip: &AnimationClip<'_>,
        time: f64,
        repeat: bool,
        pose: &mut Pose,
    ) {
        self.evaluate(skeleton, clip, time, repeat, &mut pose.matrices)
    }

    pub fn bind_pose(
        &mut self,
        skeleton: &Skeleton<'_>,
        out: &mut [na::Matrix4<f32>],
    ) {
        self.fit(skeleton);
        evaluate_bind_pose(skeleton, &mut self.scratch, out)
    }

    /// World transforms of nodes computed by the last evaluation.
    pub fn world_matrices(&self) -> &[na::Matrix4<f32>] {
        &self.scratch
    }

    fn fit(&mut self, skeleton: &Skeleton<'_>) {
        if self.scratch.len() < skeleton.node_count() {
            self.scratch
                .resize(skeleton.node_count(), na::Matrix4::identity());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: &na::Matrix4<f32>, b: &na::Matrix4<f32>) -> bool {
        (a - b).iter().all(|d| d.abs() < 1.0e-5)
    }

    #[test]
    fn composition_is_trs() {
        let t = na::Vector3::new(1.0, 2.0, 3.0);
        let r = na::UnitQuaternion::from_axis_angle(
            &na::Vector3::z_axis(),
            std::f32::consts::FRAC_PI_2,
        );
        let s = na::Vector3::new(2.0, 3.0, 4.0);

        let expected = na::Matrix4::new_translation(&t)
            * r.to_homogeneous()
            * na::Matrix4::new_nonuniform_scaling(&s);
        assert!(approx(&compose_transform(&t, &r, &s), &expected));
    }

    #[test]
    fn slerp_takes_short_arc() {
        let a = na::UnitQuaternion::identity();
        let b = na::UnitQuaternion::from_axis_angle(
            &na::Vector3::y_axis(),
            std::f32::consts::FRAC_PI_2,
        );
        let flipped = na::UnitQuaternion::new_unchecked(-b.into_inner());

        let half = slerp(&a, &flipped, 0.5);
        assert!((half.angle() - std::f32::consts::FRAC_PI_4).abs() < 1.0e-5);
        assert!((half.norm() - 1.0).abs() < 1.0e-6);
    }

    #[test]
    fn slerp_of_equal_rotations() {
        let a = na::UnitQuaternion::from_euler_angles(0.1, 0.2, 0.3);
        let q = slerp(&a, &a, 0.3);
        assert!(q.angle_to(&a) < 1.0e-4);
    }
}

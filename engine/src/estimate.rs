use {
    nalgebra as na,
    rig_animate::{
        import::{ImportNode, ImportScene},
        AnimationClip, NodeAnimationTrack, SkeletonNode, SkinnedMesh,
        VertexInfluence,
    },
    rig_arena::RIGHT_HEADER_SIZE,
    std::{
        collections::BTreeSet,
        mem::{align_of, size_of},
    },
};

/// Arena bytes needed to load a scene.
///
/// This is an upper bound meant for sizing arenas. Loading never relies
/// on it being exact.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemoryRequirements {
    pub meshes: usize,
    pub skeleton: usize,
    pub animations: usize,
    pub total: usize,
}

pub fn memory_requirements(scene: &ImportScene) -> MemoryRequirements {
    let meshes = left::<SkinnedMesh<'_>>(scene.meshes.len())
        + scene
            .meshes
            .iter()
            .filter(|mesh| mesh.has_bones())
            .map(|mesh| left::<VertexInfluence>(mesh.vertex_count()))
            .sum::<usize>();

    let nodes = scene.root.count();
    let bone_refs = scene.meshes.iter().map(|mesh| mesh.bones.len()).sum();
    let bones = scene
        .meshes
        .iter()
        .flat_map(|mesh| &mesh.bones)
        .map(|bone| bone.name.as_str())
        .collect::<BTreeSet<_>>()
        .len();
    // Temporary tables are alive at the same time as the node array.
    let skeleton = left::<SkeletonNode>(nodes)
        + left::<na::Matrix4<f32>>(bones)
        + right::<Option<&ImportNode>>(nodes)
        + right::<(&ImportNode, usize)>(nodes)
        + right::<usize>(bone_refs)
        + right::<bool>(nodes)
        + right::<bool>(bones);

    let animations = left::<AnimationClip<'_>>(scene.animations.len())
        + scene
            .animations
            .iter()
            .map(|animation| {
                left::<NodeAnimationTrack<'_>>(animation.channels.len())
                    + animation
                        .channels
                        .iter()
                        .map(|channel| {
                            keys::<na::Vector3<f32>>(channel.position_keys.len())
                                + keys::<na::UnitQuaternion<f32>>(
                                    channel.rotation_keys.len(),
                                )
                                + keys::<na::Vector3<f32>>(
                                    channel.scale_keys.len(),
                                )
                        })
                        .sum::<usize>()
            })
            .sum::<usize>();

    MemoryRequirements {
        meshes,
        skeleton,
        animations,
        total: meshes + skeleton + animations,
    }
}

/// Left side reservation for an array of `len` values.
fn left<T>(len: usize) -> usize {
    match size_of::<T>() * len {
        0 => 0,
        size => size + align_of::<T>(),
    }
}

fn right<T>(len: usize) -> usize {
    match left::<T>(len) {
        0 => 0,
        size => size + RIGHT_HEADER_SIZE,
    }
}

/// Key times and values of one channel.
fn keys<T>(len: usize) -> usize {
    left::<f64>(len) + left::<T>(len)
}

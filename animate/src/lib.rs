//! Skeletal animation on top of arena allocations.
//!
//! Importer data is turned into a flat [`Skeleton`], packed skin
//! influences and keyframed [`AnimationClip`]s, all living in a single
//! arena. [`evaluate_pose`] samples a clip and produces one skinning
//! matrix per bone.

mod clip;
mod error;
mod mesh;
mod name;
mod pose;
mod skeleton;

pub mod import;

pub use self::{
    clip::{
        build_clips, AnimationClip, Channel, NodeAnimationTrack, Sample,
        DEFAULT_TICKS_PER_SECOND,
    },
    error::{AnimationError, MalformedAsset},
    mesh::{Aabb, SkinnedMesh, VertexInfluence, WEIGHT_EPSILON},
    name::{Name, MAX_NAME_LEN},
    pose::{
        compose_transform, evaluate_bind_pose, evaluate_pose, slerp, Pose,
        PoseEvaluator,
    },
    skeleton::{Children, Skeleton, SkeletonBuilder, SkeletonNode, MAX_BONES},
};

use {crate::skeleton::MAX_BONES, rig_arena::OutOfMemory};

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum AnimationError {
    #[error("{source}")]
    OutOfMemory {
        #[from]
        source: OutOfMemory,
    },

    #[error("Malformed asset: {source}")]
    MalformedAsset {
        #[from]
        source: MalformedAsset,
    },

    #[error("Skeleton has {bones} bones but at most {} are supported", MAX_BONES)]
    CapacityExceeded { bones: usize },
}

/// Asset data that cannot be turned into skeleton or animation.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum MalformedAsset {
    #[error("Bone `{name}` does not match any node")]
    UnknownBone { name: String },

    #[error("Animation channel targets unknown node `{name}`")]
    UnknownNode { name: String },

    #[error("Bone `{name}` has different offset matrices in different meshes")]
    MismatchedOffset { name: String },

    #[error("Keys of `{node}` channel are not strictly increasing in time")]
    UnorderedKeys { node: String },

    #[error("Bone `{bone}` weights vertex {vertex} but mesh has {count} vertices")]
    VertexOutOfRange {
        bone: String,
        vertex: u32,
        count: usize,
    },
}

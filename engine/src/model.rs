use {
    rig_animate::{
        build_clips,
        import::{ImportMesh, ImportScene},
        AnimationClip, AnimationError, Skeleton, SkeletonBuilder, SkinnedMesh,
    },
    rig_arena::ArenaAlloc,
};

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum LoadError {
    #[error("Scene has no meshes")]
    NoMeshes,

    #[error("Failed to build model: {source}")]
    Animation {
        #[from]
        source: AnimationError,
    },
}

/// Everything loaded from one scene, living in a single arena.
#[derive(Debug)]
pub struct Model<'a> {
    pub meshes: &'a [SkinnedMesh<'a>],

    /// Present if any mesh is skinned or the scene is animated.
    pub skeleton: Option<Skeleton<'a>>,

    pub clips: &'a [AnimationClip<'a>],
}

impl<'a> Model<'a> {
    pub fn find_clip(&self, name: &str) -> Option<usize> {
        self.clips.iter().position(|clip| clip.name() == name)
    }

    pub fn is_animated(&self) -> bool {
        self.skeleton.is_some() && !self.clips.is_empty()
    }
}

/// Packs meshes, builds skeleton and animation clips.
///
/// Meshes are packed first so that skeleton construction can remap
/// their bone indices.
#[tracing::instrument(skip(arena, scene), fields(arena = arena.name()))]
pub fn load_model<'a, A>(
    arena: &'a A,
    scene: &ImportScene,
) -> Result<Model<'a>, LoadError>
where
    A: ArenaAlloc,
{
    if scene.meshes.is_empty() {
        return Err(LoadError::NoMeshes);
    }

    let meshes = arena.try_alloc_slice_left_with(scene.meshes.len(), |index| {
        SkinnedMesh::build(arena, &scene.meshes[index])
    })?;

    let skinned = scene.meshes.iter().any(ImportMesh::has_bones);
    let (skeleton, clips) = if skinned || !scene.animations.is_empty() {
        let skeleton = SkeletonBuilder::new(arena).build(
            &scene.root,
            &scene.meshes,
            meshes,
        )?;
        let clips = build_clips(arena, &skeleton, &scene.animations)?;
        (Some(skeleton), clips)
    } else {
        (None, &[][..])
    };

    tracing::info!(
        "Model loaded: {} meshes, {} bones, {} clips, {} bytes left",
        meshes.len(),
        skeleton.map_or(0, |skeleton| skeleton.bone_count()),
        clips.len(),
        arena.available()
    );

    Ok(Model {
        meshes,
        skeleton,
        clips,
    })
}

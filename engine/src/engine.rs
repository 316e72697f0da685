use {
    crate::{
        animator::Animator,
        config::Config,
        estimate::memory_requirements,
        model::Model,
    },
    color_eyre::Report,
    nalgebra as na,
    rig_animate::import::ImportScene,
    rig_arena::{Arena, ArenaAlloc, OutOfMemory, Scratch, SyncArena},
};

/// Root data structure of the engine.
///
/// Owns the engine-wide arena that is shared by all threads.
/// Every loaded scene gets its own arena.
#[derive(Debug)]
pub struct Engine {
    pub config: Config,
    pub arena: SyncArena,
}

impl Engine {
    #[tracing::instrument]
    pub fn new(config: Config) -> Result<Self, Report> {
        let arena = SyncArena::new("engine", config.arena.engine_size)?;
        Ok(Engine { config, arena })
    }

    pub fn from_default_config() -> Result<Self, Report> {
        Self::new(Config::load_default()?)
    }

    /// Creates arena large enough to load `scene`.
    pub fn load_arena(&self, scene: &ImportScene) -> Result<Arena, OutOfMemory> {
        let requirements = memory_requirements(scene);
        let size = requirements.total.max(self.config.arena.load_size);
        tracing::debug!(?requirements, size, "Load arena requested");
        Arena::new("load", size)
    }

    /// Animator for `model` or `None` if the model has no skeleton.
    pub fn animator<'m>(&self, model: &Model<'m>) -> Option<Animator<'m>> {
        let skeleton = model.skeleton?;
        Some(Animator::new(skeleton, model.clips, &self.config.animation))
    }

    /// Temporary skinning matrices from the engine arena.
    pub fn skinning_scratch(
        &self,
        bones: usize,
    ) -> Result<Scratch<'_, na::Matrix4<f32>, SyncArena>, OutOfMemory> {
        self.arena.scratch(bones, |_| na::Matrix4::identity())
    }
}

//! Loading and playback of skinned, animated models.

pub mod animator;
pub mod config;
pub mod engine;
pub mod estimate;
pub mod model;
pub mod scene;

pub use self::{
    animator::{Animator, Player},
    config::{AnimationConfig, ArenaConfig, Config},
    engine::Engine,
    estimate::{memory_requirements, MemoryRequirements},
    model::{load_model, LoadError, Model},
    scene::SceneAsset,
};

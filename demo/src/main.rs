mod config;

use {
    crate::config::Config,
    bumpalo::Bump,
    color_eyre::Report,
    eyre::eyre,
    rig::{load_model, Engine, SceneAsset},
    tracing_subscriber::{layer::SubscriberExt as _, EnvFilter},
};

fn main() -> Result<(), Report> {
    color_eyre::install()?;
    install_tracing()?;

    let config = Config::load_default()?;
    let engine = Engine::new(config.engine)?;

    let asset = SceneAsset::load(&config.demo.scene)?;
    let arena = engine.load_arena(&asset.scene)?;

    let model = match load_model(&arena, &asset.scene) {
        Ok(model) => model,
        Err(err) => {
            tracing::error!(
                "Failed to load `{}`: {}",
                asset.path.display(),
                err
            );
            return Ok(());
        }
    };

    let mut animator = match engine.animator(&model) {
        Some(animator) if !model.clips.is_empty() => animator,
        _ => {
            tracing::info!("Scene has nothing to animate");
            return Ok(());
        }
    };

    let clip = match &config.demo.clip {
        Some(name) => model
            .find_clip(name)
            .ok_or_else(|| eyre!("Clip `{}` not found", name))?,
        None => 0,
    };

    let key = animator.play(clip, engine.config.animation.repeat)?;
    let bones = animator.skeleton().bone_count();
    tracing::info!(
        "Playing `{}` on {} bones",
        model.clips[clip].name(),
        bones
    );

    let mut bump = Bump::new();

    for frame in 0..config.demo.frames {
        let mut matrices = engine.skinning_scratch(bones)?;
        if !animator.pose(key, &mut matrices) {
            tracing::info!("Clip finished at frame {}", frame);
            break;
        }

        // Column-major layout expected by shaders.
        let upload = bump.alloc_slice_fill_iter(
            matrices.iter().map(|m| -> [[f32; 4]; 4] { (*m).into() }),
        );
        let bytes: &[u8] = bytemuck::cast_slice(upload);

        for (bone, m) in matrices.iter().enumerate() {
            tracing::trace!(
                frame,
                bone,
                "Bone origin at ({:.3}, {:.3}, {:.3})",
                m[(0, 3)],
                m[(1, 3)],
                m[(2, 3)]
            );
        }
        tracing::debug!(frame, bytes = bytes.len(), "Skinning matrices ready");

        animator.advance(config.demo.frame_time);
        bump.reset();
    }

    Ok(())
}

fn install_tracing() -> Result<(), Report> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))?;

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_error::ErrorLayer::default());

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

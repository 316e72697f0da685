use {
    color_eyre::Report,
    eyre::WrapErr,
    rig_animate::import::ImportScene,
    std::path::{Path, PathBuf},
};

/// Scene description loaded from RON file.
#[derive(Clone, Debug)]
pub struct SceneAsset {
    pub path: PathBuf,
    pub scene: ImportScene,
}

impl SceneAsset {
    #[tracing::instrument]
    pub fn load(path: &Path) -> Result<Self, Report> {
        let source = std::fs::read_to_string(path).wrap_err_with(|| {
            format!("Failed to read scene `{}`", path.display())
        })?;

        let scene = Self::parse(&source).wrap_err_with(|| {
            format!("Failed to parse scene `{}`", path.display())
        })?;

        tracing::info!(
            "Scene loaded: {} nodes, {} meshes, {} animations",
            scene.root.count(),
            scene.meshes.len(),
            scene.animations.len()
        );

        Ok(SceneAsset {
            path: path.to_owned(),
            scene,
        })
    }

    pub fn parse(source: &str) -> Result<ImportScene, ron::Error> {
        ron::de::from_str(source)
    }
}

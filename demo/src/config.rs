use {
    color_eyre::Report,
    eyre::WrapErr,
    std::path::{Path, PathBuf},
};

#[derive(Clone, Debug, serde::Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: rig::Config,

    pub demo: DemoConfig,
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct DemoConfig {
    pub scene: PathBuf,

    /// Clip to play. First clip of the scene if not set.
    #[serde(default)]
    pub clip: Option<String>,

    #[serde(default = "default_frames")]
    pub frames: usize,

    /// Seconds between frames.
    #[serde(default = "default_frame_time")]
    pub frame_time: f64,
}

impl Config {
    pub fn load_default() -> Result<Self, Report> {
        let path = std::env::var("RIG_CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./cfg.ron"));

        Self::load(&path)
    }

    #[tracing::instrument]
    pub fn load(path: &Path) -> Result<Self, Report> {
        let file = std::fs::File::open(path).wrap_err_with(|| {
            format!("Failed to open config `{}`", path.display())
        })?;
        Ok(ron::de::from_reader(file)?)
    }
}

fn default_frames() -> usize {
    60
}

fn default_frame_time() -> f64 {
    1.0 / 30.0
}

use {
    color_eyre::Report,
    eyre::WrapErr,
    std::path::{Path, PathBuf},
};

#[derive(Clone, Debug, Default, serde::Deserialize)]
pub struct Config {
    #[serde(default)]
    pub arena: ArenaConfig,

    #[serde(default)]
    pub animation: AnimationConfig,
}

#[derive(Clone, Copy, Debug, serde::Deserialize)]
pub struct ArenaConfig {
    /// Capacity of the engine-wide arena in bytes.
    #[serde(default = "default_engine_size")]
    pub engine_size: usize,

    /// Smallest capacity of per-load arenas.
    #[serde(default = "default_load_size")]
    pub load_size: usize,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        ArenaConfig {
            engine_size: default_engine_size(),
            load_size: default_load_size(),
        }
    }
}

#[derive(Clone, Copy, Debug, serde::Deserialize)]
pub struct AnimationConfig {
    /// Number of clips that may play at once.
    #[serde(default = "default_max_players")]
    pub max_players: usize,

    #[serde(default = "default_repeat")]
    pub repeat: bool,

    /// Playback speed multiplier.
    #[serde(default = "default_speed")]
    pub speed: f64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        AnimationConfig {
            max_players: default_max_players(),
            repeat: default_repeat(),
            speed: default_speed(),
        }
    }
}

impl Config {
    pub fn load_default() -> Result<Self, Report> {
        let path = std::env::var("RIG_ENGINE_CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./engine.ron"));

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

fn default_engine_size() -> usize {
    1 << 20
}

fn default_load_size() -> usize {
    64 << 10
}

fn default_max_players() -> usize {
    16
}

fn default_repeat() -> bool {
    true
}

fn default_speed() -> f64 {
    1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let config: Config =
            ron::de::from_str("(animation: (speed: 0.5))").unwrap();
        assert_eq!(config.arena.engine_size, default_engine_size());
        assert_eq!(config.animation.max_players, 16);
        assert!(config.animation.repeat);
        assert_eq!(config.animation.speed, 0.5);
    }
}

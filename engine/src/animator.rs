use {
    crate::config::AnimationConfig,
    nalgebra as na,
    rig_animate::{AnimationClip, PoseEvaluator, Skeleton},
    rig_arena::{OutOfMemory, Pool, PoolKey},
};

/// Playback state of one clip.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Player {
    clip: usize,
    time: f64,
    repeat: bool,
}

impl Player {
    /// Index of the clip in the model.
    pub fn clip(&self) -> usize {
        self.clip
    }

    /// Seconds since the clip started.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn repeat(&self) -> bool {
        self.repeat
    }
}

/// Plays clips of one model.
pub struct Animator<'m> {
    skeleton: Skeleton<'m>,
    clips: &'m [AnimationClip<'m>],
    players: Pool<Player>,
    evaluator: PoseEvaluator,
    speed: f64,
}

impl<'m> Animator<'m> {
    pub fn new(
        skeleton: Skeleton<'m>,
        clips: &'m [AnimationClip<'m>],
        config: &AnimationConfig,
    ) -> Self {
        Animator {
            skeleton,
            clips,
            players: Pool::new("players", config.max_players),
            evaluator: PoseEvaluator::new(&skeleton),
            speed: config.speed,
        }
    }

    pub fn skeleton(&self) -> &Skeleton<'m> {
        &self.skeleton
    }

    pub fn clips(&self) -> &'m [AnimationClip<'m>] {
        self.clips
    }

    pub fn player(&self, key: PoolKey) -> Option<Player> {
        self.players.with(key, |player| *player)
    }

    pub fn playing(&self) -> usize {
        self.players.len()
    }

    /// Starts clip from the beginning.
    ///
    /// # Panics
    ///
    /// Panics if `clip` is not a clip index of the model.
    pub fn play(&self, clip: usize, repeat: bool) -> Result<PoolKey, OutOfMemory> {
        assert!(
            clip < self.clips.len(),
            "Clip {} out of {}",
            clip,
            self.clips.len()
        );

        let key = self.players.insert(Player {
            clip,
            time: 0.0,
            repeat,
        })?;

        tracing::debug!(
            clip = %self.clips[clip].name(),
            key = key.index(),
            "Player started"
        );
        Ok(key)
    }

    pub fn stop(&self, key: PoolKey) -> bool {
        self.players.remove(key).is_some()
    }

    /// Moves every player forward by `seconds` scaled by the speed.
    /// Non-repeating players past their clip's end are removed.
    pub fn advance(&self, seconds: f64) {
        let step = seconds * self.speed;
        let clips = self.clips;

        self.players.retain(|key, player| {
            player.time += step;

            let clip = &clips[player.clip];
            let finished =
                !player.repeat && player.time > clip.duration_seconds();
            if finished {
                tracing::debug!(
                    clip = %clip.name(),
                    key = key.index(),
                    "Player finished"
                );
            }
            !finished
        });
    }

    /// Evaluates player under `key` into `out`.
    /// Returns `false` if there is no such player.
    pub fn pose(&mut self, key: PoolKey, out: &mut [na::Matrix4<f32>]) -> bool {
        let player = match self.player(key) {
            Some(player) => player,
            None => return false,
        };

        self.evaluator.evaluate(
            &self.skeleton,
            &self.clips[player.clip],
            player.time,
            player.repeat,
            out,
        );
        true
    }

    pub fn bind_pose(&mut self, out: &mut [na::Matrix4<f32>]) {
        self.evaluator.bind_pose(&self.skeleton, out)
    }
}

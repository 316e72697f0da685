use {
    crate::{
        error::{AnimationError, MalformedAsset},
        import::{ImportAnimation, ImportChannel},
        name::Name,
        skeleton::Skeleton,
    },
    nalgebra as na,
    rig_arena::ArenaAlloc,
    std::{cell::Cell, cmp::Ordering},
};

/// Used when the importer does not know clip's tick rate.
pub const DEFAULT_TICKS_PER_SECOND: f64 = 25.0;

/// Keys of one animated property with strictly increasing times.
///
/// The cursor caches the last found key so that monotonic playback
/// finds the next key in constant time.
#[derive(Debug)]
pub struct Channel<'a, T> {
    times: &'a [f64],
    keys: &'a [T],
    cursor: Cell<usize>,
}

/// Result of a channel lookup.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Sample<'a, T> {
    /// Channel has no keys.
    Empty,

    /// Time falls on a single key.
    Key(&'a T),

    /// Time falls between two consecutive keys.
    /// `factor` is the fraction of the way from `from` to `to`.
    Between { from: &'a T, to: &'a T, factor: f32 },
}

impl<'a, T> Channel<'a, T> {
    pub fn times(&self) -> &'a [f64] {
        self.times
    }

    pub fn keys(&self) -> &'a [T] {
        self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor.get()
    }

    pub fn reset_cursor(&self) {
        self.cursor.set(0)
    }

    /// Finds keys around tick `t`.
    ///
    /// Scanning starts right after the cursor if its key is before `t`,
    /// otherwise from the first key. Once past the last key the lookup
    /// wraps to the first key when `wrap` is set and holds the last key
    /// otherwise.
    ///
    /// At or before the first key the first key is returned as is.
    /// A time equal to any later key `k` yields keys `k` and `k + 1`
    /// with zero factor.
    pub fn sample(&self, t: f64, wrap: bool) -> Sample<'a, T> {
        let len = self.keys.len();
        if len == 0 {
            return Sample::Empty;
        }

        if t <= self.times[0] {
            self.cursor.set(0);
            return Sample::Key(&self.keys[0]);
        }

        let last = self.cursor.get().min(len - 1);
        let mut frame = if self.times[last] < t { last + 1 } else { 0 };
        while frame < len && self.times[frame] <= t {
            frame += 1;
        }

        if frame == len {
            if !wrap {
                self.cursor.set(len - 1);
                return Sample::Key(&self.keys[len - 1]);
            }
            frame = 0;
        }

        if frame == 0 {
            self.cursor.set(0);
            return Sample::Key(&self.keys[0]);
        }

        let (from, to) = (self.times[frame - 1], self.times[frame]);
        let factor = ((t - from) / (to - from)) as f32;
        debug_assert!((0.0..=1.0).contains(&factor));

        self.cursor.set(frame - 1);
        Sample::Between {
            from: &self.keys[frame - 1],
            to: &self.keys[frame],
            factor,
        }
    }
}

/// Position, rotation and scale keys of one skeleton node.
#[derive(Debug)]
pub struct NodeAnimationTrack<'a> {
    node: u32,
    pub position: Channel<'a, na::Vector3<f32>>,
    pub rotation: Channel<'a, na::UnitQuaternion<f32>>,
    pub scale: Channel<'a, na::Vector3<f32>>,
}

impl NodeAnimationTrack<'_> {
    /// Index of the animated node in the skeleton.
    pub fn node(&self) -> usize {
        self.node as usize
    }

    pub fn reset_cursors(&self) {
        self.position.reset_cursor();
        self.rotation.reset_cursor();
        self.scale.reset_cursor();
    }
}

/// Keyframed animation of skeleton nodes.
///
/// Track cursors are updated during evaluation, so a clip must not be
/// evaluated from several threads at once. `Cell` keeps it `!Sync`.
#[derive(Debug)]
pub struct AnimationClip<'a> {
    name: Name,
    ticks_per_second: f64,
    duration: f64,
    tracks: &'a [NodeAnimationTrack<'a>],
}

impl<'a> AnimationClip<'a> {
    /// Copies keys of every channel into the arena and resolves
    /// channel targets against `skeleton`.
    #[tracing::instrument(
        skip(arena, skeleton, animation),
        fields(clip = %animation.name)
    )]
    pub fn build<A>(
        arena: &'a A,
        skeleton: &Skeleton<'_>,
        animation: &ImportAnimation,
    ) -> Result<Self, AnimationError>
    where
        A: ArenaAlloc,
    {
        let tracks = arena.try_alloc_slice_left_with(
            animation.channels.len(),
            |index| build_track(arena, skeleton, &animation.channels[index]),
        )?;

        let ticks_per_second = if animation.ticks_per_second == 0.0 {
            DEFAULT_TICKS_PER_SECOND
        } else {
            animation.ticks_per_second
        };

        Ok(AnimationClip {
            name: Name::new(&animation.name),
            ticks_per_second,
            duration: animation.duration,
            tracks,
        })
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn ticks_per_second(&self) -> f64 {
        self.ticks_per_second
    }

    /// Duration in ticks.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration / self.ticks_per_second
    }

    pub fn tracks(&self) -> &'a [NodeAnimationTrack<'a>] {
        self.tracks
    }

    pub fn track_for(&self, node: usize) -> Option<&'a NodeAnimationTrack<'a>> {
        self.tracks.iter().find(|track| track.node() == node)
    }

    /// Converts seconds into clip ticks.
    ///
    /// Looped playback wraps around the duration, otherwise time is
    /// clamped to it. Clips without positive duration are a static pose
    /// at tick zero.
    pub fn tick_at(&self, seconds: f64, repeat: bool) -> f64 {
        let t = seconds * self.ticks_per_second;
        if self.duration > 0.0 {
            if repeat {
                t % self.duration
            } else {
                t.min(self.duration)
            }
        } else {
            0.0
        }
    }

    pub fn reset_cursors(&self) {
        for track in self.tracks {
            track.reset_cursors();
        }
    }
}

/// Builds every animation of the scene.
#[tracing::instrument(skip(arena, skeleton, animations))]
pub fn build_clips<'a, A>(
    arena: &'a A,
    skeleton: &Skeleton<'_>,
    animations: &[ImportAnimation],
) -> Result<&'a [AnimationClip<'a>], AnimationError>
where
    A: ArenaAlloc,
{
    let clips = arena.try_alloc_slice_left_with(animations.len(), |index| {
        AnimationClip::build(arena, skeleton, &animations[index])
    })?;
    tracing::debug!("{} clips built", clips.len());
    Ok(clips)
}

fn build_track<'a, A>(
    arena: &'a A,
    skeleton: &Skeleton<'_>,
    channel: &ImportChannel,
) -> Result<NodeAnimationTrack<'a>, AnimationError>
where
    A: ArenaAlloc,
{
    let node = skeleton.find_node(&channel.node).ok_or_else(|| {
        MalformedAsset::UnknownNode {
            name: channel.node.clone(),
        }
    })?;

    Ok(NodeAnimationTrack {
        node: node as u32,
        position: build_channel(
            arena,
            &channel.node,
            &channel.position_keys,
            |&[x, y, z]| na::Vector3::new(x, y, z),
        )?,
        rotation: build_channel(
            arena,
            &channel.node,
            &channel.rotation_keys,
            |&[w, x, y, z]| {
                na::UnitQuaternion::new_normalize(na::Quaternion::new(
                    w, x, y, z,
                ))
            },
        )?,
        scale: build_channel(
            arena,
            &channel.node,
            &channel.scale_keys,
            |&[x, y, z]| na::Vector3::new(x, y, z),
        )?,
    })
}

fn build_channel<'a, A, S, T>(
    arena: &'a A,
    node: &str,
    keys: &[(f64, S)],
    convert: impl Fn(&S) -> T,
) -> Result<Channel<'a, T>, AnimationError>
where
    A: ArenaAlloc,
{
    let ordered = keys.windows(2).all(|pair| {
        pair[0].0.partial_cmp(&pair[1].0) == Some(Ordering::Less)
    });
    if !ordered {
        return Err(MalformedAsset::UnorderedKeys {
            node: node.to_owned(),
        }
        .into());
    }

    let times =
        arena.alloc_slice_left_with(keys.len(), |index| keys[index].0)?;
    let values = arena
        .alloc_slice_left_with(keys.len(), |index| convert(&keys[index].1))?;

    Ok(Channel {
        times,
        keys: values,
        cursor: Cell::new(0),
    })
}

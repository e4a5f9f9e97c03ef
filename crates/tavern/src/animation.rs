//! # Animation Capability
//!
//! The behavior states only ever ask a character to play a clip by name, to
//! stop, and to be told when a clip reaches its last frame. [`Animator`] is
//! that contract; the host engine provides the real implementation.
//!
//! [`ClipPlayer`] is a headless stand-in that advances clips by time using
//! the lengths from [`ClipTable`]. It drives the simulation in tests and in
//! the headless binary.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tavern_core::EventChannel;

/// Event fired when a clip reaches its last frame.
pub const LAST_FRAME: &str = "last-frame";

/// Clip played while entering the scene.
pub const CLIP_SPAWN: &str = "spawn";
/// Looping rest clip.
pub const CLIP_IDLE: &str = "idle";
/// Looping walk clip.
pub const CLIP_WALK: &str = "walk";
/// Customer placing an order.
pub const CLIP_ORDER: &str = "order";
/// Staff preparing an order.
pub const CLIP_PREPARE: &str = "prepare";
/// Reaction to being struck.
pub const CLIP_HIT: &str = "hit";
/// Striking another character.
pub const CLIP_ATTACK: &str = "attack";

/// Notification payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClipEvent {
    /// Clip that produced the notification.
    pub clip: String,
}

/// What behavior states need from an animation system.
pub trait Animator {
    /// Starts a clip from its first frame, replacing whatever was playing.
    /// Returns false if the clip is unknown.
    fn play(&mut self, clip: &str) -> bool;

    /// Stops playback without a last-frame notification.
    fn stop(&mut self);

    /// Clip currently playing.
    fn playing(&self) -> Option<&str>;

    /// Channel carrying [`LAST_FRAME`] notifications.
    fn notifications(&self) -> Rc<EventChannel<ClipEvent>>;

    /// Advances playback.
    fn tick(&mut self, dt: f32);
}

/// Length and looping of one clip.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClipSpec {
    /// Seconds from first to last frame.
    pub length: f32,
    /// Restart after the last frame.
    #[serde(default)]
    pub looping: bool,
}

impl ClipSpec {
    const fn once(length: f32) -> Self {
        Self { length, looping: false }
    }

    const fn looping(length: f32) -> Self {
        Self { length, looping: true }
    }
}

/// Clip specs by name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClipTable(BTreeMap<String, ClipSpec>);

impl ClipTable {
    /// Creates an empty table.
    #[must_use]
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Adds or replaces a clip.
    pub fn insert(&mut self, name: &str, spec: ClipSpec) {
        self.0.insert(name.to_owned(), spec);
    }

    /// Looks up a clip.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<ClipSpec> {
        self.0.get(name).copied()
    }
}

impl Default for ClipTable {
    fn default() -> Self {
        let mut table = Self::empty();
        table.insert(CLIP_SPAWN, ClipSpec::once(0.5));
        table.insert(CLIP_IDLE, ClipSpec::looping(1.0));
        table.insert(CLIP_WALK, ClipSpec::looping(0.8));
        table.insert(CLIP_ORDER, ClipSpec::once(0.6));
        table.insert(CLIP_PREPARE, ClipSpec::looping(1.0));
        table.insert(CLIP_HIT, ClipSpec::once(0.4));
        table.insert(CLIP_ATTACK, ClipSpec::once(0.6));
        table
    }
}

struct Playing {
    clip: String,
    spec: ClipSpec,
    elapsed: f32,
}

/// Time-driven [`Animator`] without any visuals.
///
/// Unknown clips are played as zero-length one-shots so that a state waiting
/// on the last frame still completes.
pub struct ClipPlayer {
    clips: Rc<ClipTable>,
    current: Option<Playing>,
    notifications: Rc<EventChannel<ClipEvent>>,
}

impl ClipPlayer {
    /// Creates a stopped player.
    #[must_use]
    pub fn new(clips: Rc<ClipTable>) -> Self {
        Self {
            clips,
            current: None,
            notifications: Rc::new(EventChannel::new("clips")),
        }
    }

    /// Seconds into the current clip.
    #[must_use]
    pub fn elapsed(&self) -> Option<f32> {
        self.current.as_ref().map(|playing| playing.elapsed)
    }
}

impl Animator for ClipPlayer {
    fn play(&mut self, clip: &str) -> bool {
        let (spec, known) = match self.clips.get(clip) {
            Some(spec) => (spec, true),
            None => {
                tracing::warn!("unknown clip `{}`; finishing it immediately", clip);
                (ClipSpec::once(0.0), false)
            }
        };
        self.current = Some(Playing { clip: clip.to_owned(), spec, elapsed: 0.0 });
        known
    }

    fn stop(&mut self) {
        self.current = None;
    }

    fn playing(&self) -> Option<&str> {
        self.current.as_ref().map(|playing| playing.clip.as_str())
    }

    fn notifications(&self) -> Rc<EventChannel<ClipEvent>> {
        Rc::clone(&self.notifications)
    }

    fn tick(&mut self, dt: f32) {
        let Some(playing) = self.current.as_mut() else {
            return;
        };
        playing.elapsed += dt;
        if playing.elapsed < playing.spec.length {
            return;
        }
        let event = ClipEvent { clip: playing.clip.clone() };
        if playing.spec.looping && playing.spec.length > 0.0 {
            playing.elapsed %= playing.spec.length;
        } else {
            self.current = None;
        }
        self.notifications.emit(LAST_FRAME, &event);
    }
}

impl fmt::Debug for ClipPlayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClipPlayer")
            .field("playing", &self.playing())
            .field("elapsed", &self.elapsed())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use tavern_core::{Listener, Priority};

    fn recorded(player: &ClipPlayer) -> Rc<RefCell<Vec<String>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        player.notifications().on(
            LAST_FRAME,
            Listener::new(move |event: &ClipEvent| sink.borrow_mut().push(event.clip.clone())),
            None,
            Priority::Normal,
        );
        seen
    }

    #[test]
    fn test_one_shot_fires_once_and_stops() {
        let mut player = ClipPlayer::new(Rc::new(ClipTable::default()));
        let seen = recorded(&player);
        assert!(player.play(CLIP_HIT));
        player.tick(0.2);
        assert!(seen.borrow().is_empty());
        player.tick(0.2);
        assert_eq!(*seen.borrow(), [CLIP_HIT]);
        assert_eq!(player.playing(), None);
        player.tick(1.0);
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn test_looping_fires_every_cycle() {
        let mut player = ClipPlayer::new(Rc::new(ClipTable::default()));
        let seen = recorded(&player);
        player.play(CLIP_IDLE);
        for _ in 0..4 {
            player.tick(0.5);
        }
        assert_eq!(seen.borrow().len(), 2);
        assert_eq!(player.playing(), Some(CLIP_IDLE));
    }

    #[test]
    fn test_unknown_clip_finishes_on_next_tick() {
        let mut player = ClipPlayer::new(Rc::new(ClipTable::empty()));
        let seen = recorded(&player);
        assert!(!player.play("dance"));
        player.tick(0.0);
        assert_eq!(*seen.borrow(), ["dance"]);
    }

    #[test]
    fn test_stop_is_silent() {
        let mut player = ClipPlayer::new(Rc::new(ClipTable::default()));
        let seen = recorded(&player);
        player.play(CLIP_ATTACK);
        player.stop();
        player.tick(5.0);
        assert!(seen.borrow().is_empty());
    }
}

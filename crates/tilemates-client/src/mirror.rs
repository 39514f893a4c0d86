//! One remote player's mirror: the last known session record plus the
//! game-supplied visual that renders it.

use tilemates_protocol::{Facing, PlayerSession};

/// How one remote player is drawn and animated.
///
/// The game implements this for whatever its engine uses for a sprite
/// or entity. The roster drives it: `walk` whenever the player reports
/// a new position, `idle` when movement ends. A visual is created by a
/// [`VisualFactory`](crate::VisualFactory) and dropped when its player
/// leaves or moves to another map.
pub trait MirrorVisual {
    /// Plays the walk animation facing `facing` and moves the visual
    /// to `(x, y)`.
    fn walk(&mut self, facing: Facing, x: f32, y: f32);

    /// Stops the walk animation, leaving the visual facing `facing`.
    fn idle(&mut self, facing: Facing);
}

/// A remote player as this client last saw it.
#[derive(Debug)]
pub struct RemotePlayerMirror<V> {
    session: PlayerSession,
    visual: V,
}

impl<V: MirrorVisual> RemotePlayerMirror<V> {
    pub fn new(session: PlayerSession, visual: V) -> Self {
        Self { session, visual }
    }

    /// The last session record received for this player.
    pub fn session(&self) -> &PlayerSession {
        &self.session
    }

    pub fn visual(&self) -> &V {
        &self.visual
    }

    /// Applies a position update: the record and the visual move
    /// together.
    pub fn apply_move(&mut self, x: f32, y: f32, facing: Facing) {
        self.session.x = x;
        self.session.y = y;
        self.visual.walk(facing, x, y);
    }

    /// Stops the walk animation. Position is left where the last move
    /// put it.
    pub fn apply_stop(&mut self, facing: Facing) {
        self.visual.idle(facing);
    }
}

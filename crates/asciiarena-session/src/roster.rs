//! The set of players registered for the next match.

use asciiarena_protocol::PlayerId;

/// What applying a connection event did to the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterChange {
    Joined,
    Left,
    /// A join for a player that is already registered. Nothing changed.
    AlreadyPresent,
    /// A leave for a player that is not registered. Nothing changed.
    NotPresent,
    /// A join while the roster is already complete. Nothing changed.
    Full,
}

/// Registered players, in the order they joined.
///
/// The roster never holds duplicates and never grows past `required`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    players: Vec<PlayerId>,
    required: usize,
}

impl Roster {
    /// Builds the roster from a login result.
    ///
    /// Duplicate entries are dropped, and anything past `required` is
    /// ignored.
    pub fn new(required: usize, registered: &[PlayerId]) -> Self {
        let mut roster = Self {
            players: Vec::with_capacity(registered.len().min(required)),
            required,
        };
        for &player in registered {
            roster.join(player);
        }
        roster
    }

    pub fn join(&mut self, player: PlayerId) -> RosterChange {
        if self.contains(player) {
            RosterChange::AlreadyPresent
        } else if self.is_complete() {
            RosterChange::Full
        } else {
            self.players.push(player);
            RosterChange::Joined
        }
    }

    pub fn leave(&mut self, player: PlayerId) -> RosterChange {
        match self.players.iter().position(|&p| p == player) {
            Some(index) => {
                self.players.remove(index);
                RosterChange::Left
            }
            None => RosterChange::NotPresent,
        }
    }

    /// Applies a `PlayerConnectionEvent`.
    pub fn apply(&mut self, joined: bool, player: PlayerId) -> RosterChange {
        if joined {
            self.join(player)
        } else {
            self.leave(player)
        }
    }

    /// `true` once as many players as the match needs are registered.
    pub fn is_complete(&self) -> bool {
        self.players.len() >= self.required
    }

    pub fn contains(&self, player: PlayerId) -> bool {
        self.players.contains(&player)
    }

    pub fn players(&self) -> &[PlayerId] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn required(&self) -> usize {
        self.required
    }
}

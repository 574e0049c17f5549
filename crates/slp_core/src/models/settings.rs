//! Match metadata: player slots, characters, and ordered pair derivation.

use serde::{Deserialize, Serialize};

/// Internal character id of the Sheik transformation state.
pub const INTERNAL_SHEIK: u8 = 0x07;
/// Internal character id of the Zelda transformation state.
pub const INTERNAL_ZELDA: u8 = 0x13;
/// External character id for Sheik.
pub const EXTERNAL_SHEIK: u8 = 0x13;
/// External character id for Zelda.
pub const EXTERNAL_ZELDA: u8 = 0x12;

/// How a player slot is occupied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerType {
    Human,
    Cpu,
    Demo,
    /// Empty port; filtered out when settings are received.
    None,
}

/// Per-slot metadata from the match-start record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerMeta {
    /// Controller port slot (0-3).
    pub slot: u8,
    /// External character id as selected on the character screen.
    pub character_id: u8,
    pub player_type: PlayerType,
}

/// Directional attacker → opponent relationship, tracked independently of
/// its reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerIndexedPair {
    pub player: u8,
    pub opponent: u8,
}

/// Match metadata supplied once at match start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage_id: Option<u16>,
    /// Effective players only; empty ports are dropped on construction.
    pub players: Vec<PlayerMeta>,
}

impl MatchSettings {
    pub fn new(stage_id: Option<u16>, players: Vec<PlayerMeta>) -> Self {
        let players =
            players.into_iter().filter(|p| p.player_type != PlayerType::None).collect();
        Self { stage_id, players }
    }

    /// Ordered attacker/opponent pairs for a singles match. Empty unless
    /// exactly two effective players are present.
    pub fn singles_pairs(&self) -> Vec<PlayerIndexedPair> {
        if self.players.len() != 2 {
            return Vec::new();
        }
        let a = self.players[0].slot;
        let b = self.players[1].slot;
        vec![
            PlayerIndexedPair { player: a, opponent: b },
            PlayerIndexedPair { player: b, opponent: a },
        ]
    }

    /// Early-game disguise correction: a transformation internal id observed
    /// at or before the first recorded frame rewrites the slot's character
    /// to the one it represents.
    pub fn apply_disguise_remap(&mut self, slot: u8, internal_character_id: u8) {
        match internal_character_id {
            INTERNAL_SHEIK => self.set_character(slot, EXTERNAL_SHEIK),
            INTERNAL_ZELDA => self.set_character(slot, EXTERNAL_ZELDA),
            _ => {}
        }
    }

    fn set_character(&mut self, slot: u8, character_id: u8) {
        if let Some(player) = self.players.iter_mut().find(|p| p.slot == slot) {
            player.character_id = character_id;
        }
    }
}

/// End-of-game record. Informational; has no effect on classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEnd {
    /// How the game concluded (timeout, game, no contest).
    pub end_method: u8,
    /// Slot of the player who quit out, when the game ended that way.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lras_initiator: Option<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(slot: u8, character_id: u8, player_type: PlayerType) -> PlayerMeta {
        PlayerMeta { slot, character_id, player_type }
    }

    #[test]
    fn empty_ports_are_filtered() {
        let settings = MatchSettings::new(
            Some(31),
            vec![
                meta(0, 2, PlayerType::Human),
                meta(1, 9, PlayerType::None),
                meta(2, 20, PlayerType::Cpu),
            ],
        );
        assert_eq!(settings.players.len(), 2);
        assert_eq!(settings.players[1].slot, 2);
    }

    #[test]
    fn singles_pairs_cover_both_directions() {
        let settings = MatchSettings::new(
            None,
            vec![meta(0, 2, PlayerType::Human), meta(3, 9, PlayerType::Human)],
        );
        assert_eq!(
            settings.singles_pairs(),
            vec![
                PlayerIndexedPair { player: 0, opponent: 3 },
                PlayerIndexedPair { player: 3, opponent: 0 },
            ]
        );
    }

    #[test]
    fn non_singles_yields_no_pairs() {
        let one = MatchSettings::new(None, vec![meta(0, 2, PlayerType::Human)]);
        assert!(one.singles_pairs().is_empty());

        let three = MatchSettings::new(
            None,
            vec![
                meta(0, 2, PlayerType::Human),
                meta(1, 9, PlayerType::Human),
                meta(2, 1, PlayerType::Human),
            ],
        );
        assert!(three.singles_pairs().is_empty());
    }

    #[test]
    fn disguise_remap_rewrites_character() {
        let mut settings = MatchSettings::new(
            None,
            vec![meta(0, EXTERNAL_ZELDA, PlayerType::Human), meta(1, 2, PlayerType::Human)],
        );
        settings.apply_disguise_remap(0, INTERNAL_SHEIK);
        assert_eq!(settings.players[0].character_id, EXTERNAL_SHEIK);

        settings.apply_disguise_remap(0, INTERNAL_ZELDA);
        assert_eq!(settings.players[0].character_id, EXTERNAL_ZELDA);

        // Unrelated internal ids leave the character untouched.
        settings.apply_disguise_remap(1, 0x00);
        assert_eq!(settings.players[1].character_id, 2);
    }
}

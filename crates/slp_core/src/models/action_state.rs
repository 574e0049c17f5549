//! Fixed action-state id tables and frame-index constants.
//!
//! Action-state ids are engine animation/behavior codes. The stats engines
//! only care about three coarse classifications — taking damage, being held
//! in a grab, and being actionable again — each a fixed id range.

use crate::models::frame::PostFrame;

/// Earliest frame index emitted by the recorder (pre-match countdown).
pub const FIRST_FRAME: i32 = -123;
/// First frame on which characters are controllable.
pub const FIRST_PLAYABLE_FRAME: i32 = -39;

/// Hitstun and tumble states (inclusive range).
pub const DAMAGE_START: u16 = 0x004b;
pub const DAMAGE_END: u16 = 0x005b;

/// Grab capture states (inclusive range).
pub const CAPTURE_START: u16 = 0x00df;
pub const CAPTURE_END: u16 = 0x00e8;

/// Grounded neutral states: wait, walk, turn, dash, jump squat.
pub const GROUNDED_CONTROL_START: u16 = 0x000e;
pub const GROUNDED_CONTROL_END: u16 = 0x0018;

/// Crouch states.
pub const SQUAT_START: u16 = 0x0027;
pub const SQUAT_END: u16 = 0x0029;

/// Grounded normal attacks. The lower bound itself is a landing state and
/// does not count as actionable.
pub const GROUND_ATTACK_START: u16 = 0x002c;
pub const GROUND_ATTACK_END: u16 = 0x0040;

/// The attacker-side grab state.
pub const GRAB: u16 = 0x00d4;

/// Whether the state is hitstun/tumble.
pub fn is_damaged(action_state_id: u16) -> bool {
    (DAMAGE_START..=DAMAGE_END).contains(&action_state_id)
}

/// Whether the state is a grab capture.
pub fn is_grabbed(action_state_id: u16) -> bool {
    (CAPTURE_START..=CAPTURE_END).contains(&action_state_id)
}

/// Whether the character is back in control of their movement: grounded
/// neutral, crouching, initiating a grounded attack, or grabbing.
pub fn is_in_control(action_state_id: u16) -> bool {
    let ground =
        (GROUNDED_CONTROL_START..=GROUNDED_CONTROL_END).contains(&action_state_id);
    let squat = (SQUAT_START..=SQUAT_END).contains(&action_state_id);
    let ground_attack =
        action_state_id > GROUND_ATTACK_START && action_state_id <= GROUND_ATTACK_END;
    let grab = action_state_id == GRAB;
    ground || squat || ground_attack || grab
}

/// Percent gained between two consecutive frames, clamped at zero so healing
/// never reads as a hit.
pub fn damage_taken(post: &PostFrame, prev: &PostFrame) -> f32 {
    (post.percent_or_zero() - prev.percent_or_zero()).max(0.0)
}

/// Whether a stock was lost between two consecutive frames. Absent stock
/// counts read as zero and the comparison is signed, so a missing previous
/// frame can never register as a loss.
pub fn did_lose_stock(post: &PostFrame, prev: &PostFrame) -> bool {
    i32::from(prev.stocks.unwrap_or(0)) - i32::from(post.stocks.unwrap_or(0)) > 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_percent_and_stocks(percent: f32, stocks: u8) -> PostFrame {
        PostFrame { percent: Some(percent), stocks: Some(stocks), ..PostFrame::default() }
    }

    #[test]
    fn damage_range_boundaries() {
        assert!(!is_damaged(DAMAGE_START - 1));
        assert!(is_damaged(DAMAGE_START));
        assert!(is_damaged(DAMAGE_END));
        assert!(!is_damaged(DAMAGE_END + 1));
    }

    #[test]
    fn capture_range_boundaries() {
        assert!(!is_grabbed(CAPTURE_START - 1));
        assert!(is_grabbed(CAPTURE_START));
        assert!(is_grabbed(CAPTURE_END));
        assert!(!is_grabbed(CAPTURE_END + 1));
    }

    #[test]
    fn control_covers_ground_squat_attack_and_grab() {
        assert!(is_in_control(GROUNDED_CONTROL_START));
        assert!(is_in_control(SQUAT_END));
        assert!(is_in_control(GRAB));
        // The ground-attack lower bound is exclusive.
        assert!(!is_in_control(GROUND_ATTACK_START));
        assert!(is_in_control(GROUND_ATTACK_START + 1));
        assert!(is_in_control(GROUND_ATTACK_END));
        assert!(!is_in_control(GROUND_ATTACK_END + 1));
        // Hitstun is never in control.
        assert!(!is_in_control(DAMAGE_START));
    }

    #[test]
    fn damage_taken_clamps_healing_to_zero() {
        let prev = with_percent_and_stocks(40.0, 4);
        let healed = with_percent_and_stocks(25.0, 4);
        let hit = with_percent_and_stocks(52.5, 4);
        assert_eq!(damage_taken(&healed, &prev), 0.0);
        assert!((damage_taken(&hit, &prev) - 12.5).abs() < f32::EPSILON);
    }

    #[test]
    fn stock_loss_needs_a_real_previous_frame() {
        let placeholder = PostFrame::default();
        let current = with_percent_and_stocks(0.0, 4);
        assert!(!did_lose_stock(&current, &placeholder));

        let prev = with_percent_and_stocks(120.0, 4);
        let after_death = with_percent_and_stocks(0.0, 3);
        assert!(did_lose_stock(&after_death, &prev));
        assert!(!did_lose_stock(&prev, &prev));
    }
}

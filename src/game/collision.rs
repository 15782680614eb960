//! Hit Detection
//!
//! Resolves a tap against the live bats. Positions come from the same
//! trajectory function the renderer uses, so a tap is judged against what
//! was on screen at that instant.

use crate::core::vec2::Vec2;
use crate::game::state::Bat;
use crate::game::trajectory;

/// Hit radius of a bat at scale 1.0 and hitbox scale 1.0.
pub const BASE_HIT_RADIUS: f32 = 30.0;

/// Hit radius for a bat under the given profile hitbox scale.
#[inline]
pub fn hit_radius(bat: &Bat, hitbox_scale: f32) -> f32 {
    BASE_HIT_RADIUS * bat.scale * hitbox_scale
}

/// Is `tap` strictly inside the bat's hit circle at `now_ms`?
#[inline]
pub fn tap_hits(bat: &Bat, tap: Vec2, now_ms: u64, hitbox_scale: f32) -> bool {
    let position = trajectory::position(bat, bat.elapsed_ms(now_ms));
    let radius = hit_radius(bat, hitbox_scale);
    tap.distance_squared(position) < radius * radius
}

/// Find the bat hit by a tap.
///
/// Returns the first candidate in iteration order, not the nearest one.
/// Overlapping bats are resolved by insertion order.
pub fn resolve_hit<'a, I>(live: I, tap: Vec2, now_ms: u64, hitbox_scale: f32) -> Option<&'a Bat>
where
    I: IntoIterator<Item = &'a Bat>,
{
    live.into_iter().find(|bat| tap_hits(bat, tap, now_ms, hitbox_scale))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::Side;

    fn bat(id: u32, y: f32, scale: f32) -> Bat {
        Bat {
            id,
            spawn_time_ms: 1_000,
            side: Side::Left,
            origin: Vec2::new(-80.0, y),
            destination: Vec2::new(470.0, y),
            depth: 5.0,
            scale,
            speed: 1.0,
            flight_duration_ms: 11_000,
            lifespan_ms: 13_750,
            point_value: 100,
        }
    }

    #[test]
    fn test_tap_at_exact_position_hits() {
        let b = bat(0, 400.0, 1.0);
        for now in [1_000, 2_345, 7_000, 11_999] {
            let at = trajectory::position(&b, b.elapsed_ms(now));
            let hit = resolve_hit([&b], at, now, 1.0);
            assert_eq!(hit.map(|b| b.id), Some(0), "now={now}");
        }
    }

    #[test]
    fn test_tap_just_outside_radius_misses() {
        let b = bat(0, 400.0, 1.2);
        let now = 4_000;
        let at = trajectory::position(&b, b.elapsed_ms(now));
        let radius = hit_radius(&b, 0.6);
        assert!((radius - 21.6).abs() < 1e-4);

        let inside = at + Vec2::new(radius - 0.01, 0.0);
        let outside = at + Vec2::new(radius + 0.01, 0.0);
        assert!(resolve_hit([&b], inside, now, 0.6).is_some());
        assert!(resolve_hit([&b], outside, now, 0.6).is_none());
    }

    #[test]
    fn test_radius_boundary_is_exclusive() {
        let b = bat(0, 400.0, 1.0);
        let now = 1_000;
        let at = trajectory::position(&b, 0);
        let on_edge = at + Vec2::new(0.0, 30.0);
        assert!(!tap_hits(&b, on_edge, now, 1.0));
    }

    #[test]
    fn test_first_candidate_wins_over_nearest() {
        // Two bats on nearly the same row; the tap is closer to the second
        let first = bat(0, 400.0, 1.0);
        let second = bat(1, 410.0, 1.0);
        let now = 1_000;
        let tap = Vec2::new(-80.0, 409.0);

        let hit = resolve_hit([&first, &second], tap, now, 1.0);
        assert_eq!(hit.map(|b| b.id), Some(0));

        let hit = resolve_hit([&second, &first], tap, now, 1.0);
        assert_eq!(hit.map(|b| b.id), Some(1));
    }

    #[test]
    fn test_empty_live_set() {
        assert!(resolve_hit(std::iter::empty(), Vec2::ZERO, 0, 1.0).is_none());
    }

    #[test]
    fn test_hitbox_scale_widens_radius() {
        let b = bat(0, 400.0, 1.0);
        let tap = trajectory::position(&b, 0) + Vec2::new(33.0, 0.0);
        assert!(!tap_hits(&b, tap, 1_000, 1.0));
        assert!(tap_hits(&b, tap, 1_000, 1.2));
    }
}

//! Roulette selection for movie nights.
//!
//! One random integer decides the winner, and the wheel rotation used to reveal it is
//! computed from that same integer in the same call. Callers never derive the angle on
//! their own, so the landing sector always agrees with the recorded winner.

use rand::Rng;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Fewest full turns a spin makes before landing
pub const MIN_BASE_ROTATIONS: u32 = 3;

const FULL_TURN: f64 = 360.0;

/// Reasons a draw is declined. Neither leaves any state behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("At least 2 candidates are needed to spin, found {count}")]
    InsufficientCandidates { count: usize },
    #[error("A spin is already in progress for this night")]
    DrawInProgress,
}

/// A movie eligible for a night's draw
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub id: Uuid,
    pub title: String,
}

impl Candidate {
    pub fn new(id: Uuid, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
        }
    }
}

/// Result of one draw
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionOutcome {
    pub winner_index: usize,
    pub winner_id: Uuid,
    /// Raw integer the winner was derived from
    pub drawn_value: usize,
    /// Total clockwise rotation that brings the middle of the winning sector under the pointer
    pub rotation_degrees: f64,
    pub sector_width_degrees: f64,
}

/// Picks one candidate uniformly at random
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selector {
    base_rotations: u32,
}

impl Default for Selector {
    fn default() -> Self {
        Self::new(4)
    }
}

impl Selector {
    /// Values below [`MIN_BASE_ROTATIONS`] are raised to it.
    pub fn new(base_rotations: u32) -> Self {
        Self {
            base_rotations: base_rotations.max(MIN_BASE_ROTATIONS),
        }
    }

    pub fn base_rotations(&self) -> u32 {
        self.base_rotations
    }

    /// Draws a winner using `rng`
    pub fn draw<R: Rng + ?Sized>(
        &self,
        candidates: &[Candidate],
        rng: &mut R,
    ) -> Result<SelectionOutcome, SelectionError> {
        ensure_enough(candidates)?;
        let drawn = rng.random_range(0..candidates.len());
        self.draw_at(candidates, drawn)
    }

    /// Maps an already drawn integer to an outcome.
    ///
    /// `drawn` is reduced modulo the candidate count, so any value in `[0, N)` wins as-is.
    pub fn draw_at(
        &self,
        candidates: &[Candidate],
        drawn: usize,
    ) -> Result<SelectionOutcome, SelectionError> {
        ensure_enough(candidates)?;

        let count = candidates.len();
        let winner_index = drawn % count;
        let sector_width = FULL_TURN / count as f64;

        // Landing on the sector midpoint keeps the pointer off the boundary edges
        let landing = (winner_index as f64 + 0.5) / count as f64;
        let offset = FULL_TURN * (1.0 - landing);

        Ok(SelectionOutcome {
            winner_index,
            winner_id: candidates[winner_index].id,
            drawn_value: drawn,
            rotation_degrees: self.base_rotations as f64 * FULL_TURN + offset,
            sector_width_degrees: sector_width,
        })
    }
}

fn ensure_enough(candidates: &[Candidate]) -> Result<(), SelectionError> {
    if candidates.len() < 2 {
        return Err(SelectionError::InsufficientCandidates {
            count: candidates.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const EPSILON: f64 = 1e-9;

    fn candidates(titles: &[&str]) -> Vec<Candidate> {
        titles
            .iter()
            .map(|t| Candidate::new(Uuid::new_v4(), *t))
            .collect()
    }

    fn numbered(count: usize) -> Vec<Candidate> {
        (0..count)
            .map(|i| Candidate::new(Uuid::new_v4(), format!("Movie {}", i)))
            .collect()
    }

    /// Fraction of a turn, measured from the pointer, where the wheel comes to rest
    fn landing_fraction(selector: &Selector, rotation: f64) -> f64 {
        let base = selector.base_rotations() as f64 * FULL_TURN;
        (FULL_TURN - (rotation - base)) / FULL_TURN
    }

    #[test]
    fn test_empty_candidates_rejected() {
        let selector = Selector::default();
        assert_eq!(
            selector.draw_at(&[], 0),
            Err(SelectionError::InsufficientCandidates { count: 0 })
        );
    }

    #[test]
    fn test_single_candidate_rejected() {
        let selector = Selector::default();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        assert_eq!(
            selector.draw(&candidates(&["A"]), &mut rng),
            Err(SelectionError::InsufficientCandidates { count: 1 })
        );
    }

    #[test]
    fn test_four_candidates_draw_two() {
        let selector = Selector::default();
        let list = candidates(&["A", "B", "C", "D"]);

        let outcome = selector.draw_at(&list, 2).unwrap();

        assert_eq!(outcome.winner_index, 2);
        assert_eq!(outcome.winner_id, list[2].id);
        assert_eq!(list[outcome.winner_index].title, "C");
        assert!((outcome.rotation_degrees - (4.0 * 360.0 + 135.0)).abs() < EPSILON);
        assert!((outcome.sector_width_degrees - 90.0).abs() < EPSILON);
        assert!((landing_fraction(&selector, outcome.rotation_degrees) - 0.625).abs() < EPSILON);
    }

    #[test]
    fn test_two_candidates_split_in_halves() {
        let selector = Selector::new(3);
        let list = candidates(&["A", "B"]);

        let first = selector.draw_at(&list, 0).unwrap();
        let second = selector.draw_at(&list, 1).unwrap();

        assert!((first.sector_width_degrees - 180.0).abs() < EPSILON);
        assert!((first.rotation_degrees - (3.0 * 360.0 + 270.0)).abs() < EPSILON);
        assert!((second.rotation_degrees - (3.0 * 360.0 + 90.0)).abs() < EPSILON);
    }

    #[test]
    fn test_injected_draw_is_winner_index() {
        let selector = Selector::default();
        for count in 2..=12 {
            let list = numbered(count);
            for drawn in 0..count {
                let outcome = selector.draw_at(&list, drawn).unwrap();
                assert_eq!(outcome.winner_index, drawn);
                assert_eq!(outcome.winner_id, list[drawn].id);
            }
        }
    }

    #[test]
    fn test_rotation_stays_within_one_turn_past_base() {
        let selector = Selector::new(5);
        let floor = 5.0 * FULL_TURN;
        let ceiling = 6.0 * FULL_TURN;
        for count in [2, 3, 7, 50] {
            let list = numbered(count);
            for drawn in 0..count {
                let rotation = selector.draw_at(&list, drawn).unwrap().rotation_degrees;
                assert!(rotation >= floor, "{} below {}", rotation, floor);
                assert!(rotation < ceiling, "{} not below {}", rotation, ceiling);
            }
        }
    }

    #[test]
    fn test_lands_in_sector_middle_never_on_boundary() {
        let selector = Selector::default();
        for count in [2, 3, 6, 50] {
            let list = numbered(count);
            for drawn in 0..count {
                let outcome = selector.draw_at(&list, drawn).unwrap();
                let landing = landing_fraction(&selector, outcome.rotation_degrees);
                let expected = (drawn as f64 + 0.5) / count as f64;
                assert!((landing - expected).abs() < EPSILON);

                let boundary_distance = (landing * count as f64).fract();
                assert!((boundary_distance - 0.5).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_fifty_candidates_keep_nonzero_sectors() {
        let selector = Selector::default();
        let list = numbered(50);
        let outcome = selector.draw_at(&list, 49).unwrap();
        assert!((outcome.sector_width_degrees - 7.2).abs() < EPSILON);
        assert!(outcome.rotation_degrees.is_finite());
        // last sector midpoint sits half a sector past the reference point
        assert!((outcome.rotation_degrees - (4.0 * 360.0 + 3.6)).abs() < 1e-6);
    }

    #[test]
    fn test_same_draw_same_outcome() {
        let selector = Selector::default();
        let list = candidates(&["A", "B", "C"]);
        assert_eq!(selector.draw_at(&list, 1), selector.draw_at(&list, 1));
    }

    #[test]
    fn test_draw_reduces_out_of_range_values() {
        let selector = Selector::default();
        let list = candidates(&["A", "B", "C"]);
        let outcome = selector.draw_at(&list, 7).unwrap();
        assert_eq!(outcome.winner_index, 1);
        assert_eq!(outcome.drawn_value, 7);
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let selector = Selector::default();
        let list = numbered(9);
        let mut first = ChaCha8Rng::seed_from_u64(42);
        let mut second = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..20 {
            assert_eq!(
                selector.draw(&list, &mut first),
                selector.draw(&list, &mut second)
            );
        }
    }

    #[test]
    fn test_every_candidate_can_win() {
        let selector = Selector::default();
        let list = numbered(5);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut wins = [0usize; 5];
        for _ in 0..5000 {
            wins[selector.draw(&list, &mut rng).unwrap().winner_index] += 1;
        }
        // 1000 expected per candidate
        for count in wins {
            assert!((800..1200).contains(&count), "skewed distribution: {:?}", wins);
        }
    }

    #[test]
    fn test_base_rotations_clamped_to_minimum() {
        assert_eq!(Selector::new(0).base_rotations(), MIN_BASE_ROTATIONS);
        assert_eq!(Selector::new(8).base_rotations(), 8);
    }
}

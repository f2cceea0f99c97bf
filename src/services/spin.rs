//! Spin-in-progress tracking.
//!
//! A draw is instant, but the reveal that follows is not. While a night's reveal plays,
//! its wheel holds the pending outcome and refuses further draws until the outcome is
//! committed or cancelled.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use rand::Rng;
use uuid::Uuid;

use super::selector::{Candidate, SelectionError, SelectionOutcome, Selector};

#[derive(Debug, Clone)]
enum WheelState {
    Idle,
    Spinning {
        outcome: SelectionOutcome,
        started_at: Instant,
    },
}

/// One night's wheel
#[derive(Debug, Clone)]
pub struct Wheel {
    selector: Selector,
    reveal_timeout: Duration,
    state: WheelState,
}

impl Wheel {
    pub fn new(selector: Selector, reveal_timeout: Duration) -> Self {
        Self {
            selector,
            reveal_timeout,
            state: WheelState::Idle,
        }
    }

    /// True while an uncommitted outcome is still within its reveal window
    pub fn is_spinning(&self) -> bool {
        match &self.state {
            WheelState::Idle => false,
            WheelState::Spinning { started_at, .. } => started_at.elapsed() < self.reveal_timeout,
        }
    }

    pub fn pending(&self) -> Option<&SelectionOutcome> {
        match &self.state {
            WheelState::Spinning { outcome, .. } if self.is_spinning() => Some(outcome),
            _ => None,
        }
    }

    pub fn spin<R: Rng + ?Sized>(
        &mut self,
        candidates: &[Candidate],
        rng: &mut R,
    ) -> Result<SelectionOutcome, SelectionError> {
        self.ensure_idle()?;
        let outcome = self.selector.draw(candidates, rng)?;
        Ok(self.hold(outcome))
    }

    /// Spins with a predetermined draw
    pub fn spin_at(
        &mut self,
        candidates: &[Candidate],
        drawn: usize,
    ) -> Result<SelectionOutcome, SelectionError> {
        self.ensure_idle()?;
        let outcome = self.selector.draw_at(candidates, drawn)?;
        Ok(self.hold(outcome))
    }

    /// Ends the reveal and hands back the outcome to persist.
    ///
    /// Returns `None` when nothing is pending or the reveal window already lapsed.
    pub fn finish(&mut self) -> Option<SelectionOutcome> {
        let spinning = self.is_spinning();
        match std::mem::replace(&mut self.state, WheelState::Idle) {
            WheelState::Spinning { outcome, .. } if spinning => Some(outcome),
            _ => None,
        }
    }

    /// Drops the pending outcome without persisting it
    pub fn cancel(&mut self) -> bool {
        let was_spinning = self.is_spinning();
        self.state = WheelState::Idle;
        was_spinning
    }

    fn ensure_idle(&mut self) -> Result<(), SelectionError> {
        if self.is_spinning() {
            return Err(SelectionError::DrawInProgress);
        }
        if matches!(self.state, WheelState::Spinning { .. }) {
            tracing::debug!("Discarding abandoned spin");
            self.state = WheelState::Idle;
        }
        Ok(())
    }

    fn hold(&mut self, outcome: SelectionOutcome) -> SelectionOutcome {
        self.state = WheelState::Spinning {
            outcome: outcome.clone(),
            started_at: Instant::now(),
        };
        outcome
    }
}

/// Wheels for every night that has been spun in this process
#[derive(Debug)]
pub struct SpinRegistry {
    selector: Selector,
    reveal_timeout: Duration,
    wheels: Mutex<HashMap<Uuid, Wheel>>,
}

impl SpinRegistry {
    pub fn new(selector: Selector, reveal_timeout: Duration) -> Self {
        Self {
            selector,
            reveal_timeout,
            wheels: Mutex::new(HashMap::new()),
        }
    }

    pub fn selector(&self) -> Selector {
        self.selector
    }

    pub fn spin(
        &self,
        night_id: Uuid,
        candidates: &[Candidate],
    ) -> Result<SelectionOutcome, SelectionError> {
        let mut rng = rand::rng();
        self.with_wheel(night_id, |wheel| wheel.spin(candidates, &mut rng))
    }

    pub fn spin_at(
        &self,
        night_id: Uuid,
        candidates: &[Candidate],
        drawn: usize,
    ) -> Result<SelectionOutcome, SelectionError> {
        self.with_wheel(night_id, |wheel| wheel.spin_at(candidates, drawn))
    }

    pub fn finish(&self, night_id: Uuid) -> Option<SelectionOutcome> {
        self.lock()
            .remove(&night_id)
            .and_then(|mut wheel| wheel.finish())
    }

    pub fn cancel(&self, night_id: Uuid) -> bool {
        self.lock()
            .remove(&night_id)
            .map(|mut wheel| wheel.cancel())
            .unwrap_or(false)
    }

    /// Nights with a wheel still held in memory
    pub fn tracked(&self) -> usize {
        self.lock().len()
    }

    pub fn is_spinning(&self, night_id: Uuid) -> bool {
        self.lock()
            .get(&night_id)
            .map(Wheel::is_spinning)
            .unwrap_or(false)
    }

    pub fn pending(&self, night_id: Uuid) -> Option<SelectionOutcome> {
        self.lock()
            .get(&night_id)
            .and_then(|wheel| wheel.pending().cloned())
    }

    /// Runs `f` on the night's wheel. Only wheels left spinning stay in the map.
    fn with_wheel<T>(&self, night_id: Uuid, f: impl FnOnce(&mut Wheel) -> T) -> T {
        let mut wheels = self.lock();
        wheels.retain(|_, wheel| wheel.is_spinning());

        let wheel = wheels
            .entry(night_id)
            .or_insert_with(|| Wheel::new(self.selector, self.reveal_timeout));
        let result = f(wheel);

        if !wheels.get(&night_id).is_some_and(Wheel::is_spinning) {
            wheels.remove(&night_id);
        }
        result
    }

    // Wheels hold no invariants a panicking holder could break
    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, Wheel>> {
        self.wheels.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abcd() -> Vec<Candidate> {
        ["A", "B", "C", "D"]
            .iter()
            .map(|t| Candidate::new(Uuid::new_v4(), *t))
            .collect()
    }

    fn wheel() -> Wheel {
        Wheel::new(Selector::default(), Duration::from_secs(60))
    }

    #[test]
    fn test_second_spin_rejected_while_pending() {
        let mut wheel = wheel();
        let list = abcd();

        let first = wheel.spin_at(&list, 2).unwrap();
        assert!(wheel.is_spinning());
        assert_eq!(wheel.spin_at(&list, 0), Err(SelectionError::DrawInProgress));

        // in-flight outcome untouched
        assert_eq!(wheel.pending(), Some(&first));
        assert_eq!(wheel.finish(), Some(first));
    }

    #[test]
    fn test_finish_releases_wheel() {
        let mut wheel = wheel();
        let list = abcd();
        wheel.spin_at(&list, 1).unwrap();
        assert!(wheel.finish().is_some());
        assert!(!wheel.is_spinning());
        assert!(wheel.finish().is_none());
        assert_eq!(wheel.spin_at(&list, 3).unwrap().winner_index, 3);
    }

    #[test]
    fn test_cancel_discards_outcome() {
        let mut wheel = wheel();
        let list = abcd();
        wheel.spin_at(&list, 1).unwrap();
        assert!(wheel.cancel());
        assert!(wheel.finish().is_none());
        assert!(!wheel.cancel());
    }

    #[test]
    fn test_rejected_draw_leaves_wheel_idle() {
        let mut wheel = wheel();
        let one = vec![Candidate::new(Uuid::new_v4(), "A")];
        assert_eq!(
            wheel.spin_at(&one, 0),
            Err(SelectionError::InsufficientCandidates { count: 1 })
        );
        assert!(!wheel.is_spinning());
    }

    #[test]
    fn test_lapsed_reveal_no_longer_blocks() {
        let mut wheel = Wheel::new(Selector::default(), Duration::ZERO);
        let list = abcd();
        wheel.spin_at(&list, 0).unwrap();
        assert!(!wheel.is_spinning());
        assert_eq!(wheel.spin_at(&list, 1).unwrap().winner_index, 1);
    }

    #[test]
    fn test_lapsed_reveal_is_never_committed() {
        let mut wheel = Wheel::new(Selector::default(), Duration::ZERO);
        wheel.spin_at(&abcd(), 0).unwrap();
        assert!(wheel.finish().is_none());
    }

    #[test]
    fn test_registry_isolates_nights() {
        let registry = SpinRegistry::new(Selector::default(), Duration::from_secs(60));
        let list = abcd();
        let first_night = Uuid::new_v4();
        let second_night = Uuid::new_v4();

        registry.spin_at(first_night, &list, 0).unwrap();
        assert!(registry.is_spinning(first_night));
        assert!(!registry.is_spinning(second_night));
        assert!(registry.spin(second_night, &list).is_ok());
        assert_eq!(
            registry.spin(first_night, &list),
            Err(SelectionError::DrawInProgress)
        );

        assert_eq!(registry.finish(first_night).unwrap().winner_id, list[0].id);
        assert!(registry.cancel(second_night));
        assert!(!registry.is_spinning(second_night));
    }

    #[test]
    fn test_registry_forgets_settled_wheels() {
        let registry = SpinRegistry::new(Selector::default(), Duration::from_secs(60));
        let list = abcd();
        let nights: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();

        for night in &nights {
            registry.spin_at(*night, &list, 0).unwrap();
        }
        assert_eq!(registry.tracked(), 3);

        registry.finish(nights[0]);
        registry.cancel(nights[1]);
        assert_eq!(registry.tracked(), 1);

        // a refused draw leaves nothing behind
        let one = vec![Candidate::new(Uuid::new_v4(), "A")];
        assert!(registry.spin_at(Uuid::new_v4(), &one, 0).is_err());
        assert_eq!(registry.tracked(), 1);
    }

    #[test]
    fn test_registry_prunes_lapsed_wheels() {
        let registry = SpinRegistry::new(Selector::default(), Duration::ZERO);
        let list = abcd();
        for _ in 0..5 {
            registry.spin_at(Uuid::new_v4(), &list, 0).unwrap();
        }
        assert_eq!(registry.tracked(), 0);
    }
}

//! Given-When-Then harness for reducers.
//!
//! Runs one action against one state and checks either the accepted outcome
//! (new state and effects) or the rejection.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use hotel_ops_core::{effect::Effect, reducer::Reducer};
use std::fmt::Debug;

type StateAssertion<S> = Box<dyn FnOnce(&S)>;

type EffectAssertion = Box<dyn FnOnce(&[Effect])>;

type ErrorAssertion<E> = Box<dyn FnOnce(&E)>;

/// Fluent API for testing reducers with Given-When-Then syntax
///
/// A test either expects the action to be accepted (`then_state`,
/// `then_effects`) or rejected (`then_error`). A rejected action must leave
/// the state unchanged, which `run` checks for every rejection.
///
/// # Example
///
/// ```ignore
/// use hotel_ops_testing::ReducerTest;
///
/// ReducerTest::new(ReservationReducer)
///     .with_env(env)
///     .given_state(confirmed_with_room())
///     .when_action(ReservationAction::CheckIn)
///     .then_state(|state| {
///         assert_eq!(state.reservation.status, ReservationStatus::CheckedIn);
///     })
///     .then_effects(|effects| {
///         assert_eq!(effects.len(), 1);
///     })
///     .run();
/// ```
pub struct ReducerTest<R, S, A, Env, Err>
where
    R: Reducer<State = S, Action = A, Environment = Env, Error = Err>,
{
    reducer: R,
    environment: Option<Env>,
    initial_state: Option<S>,
    action: Option<A>,
    state_assertions: Vec<StateAssertion<S>>,
    effect_assertions: Vec<EffectAssertion>,
    error_assertions: Vec<ErrorAssertion<Err>>,
}

impl<R, S, A, Env, Err> ReducerTest<R, S, A, Env, Err>
where
    R: Reducer<State = S, Action = A, Environment = Env, Error = Err>,
    S: Clone + PartialEq + Debug,
    Err: Debug,
{
    /// Harness around `reducer`
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            initial_state: None,
            action: None,
            state_assertions: Vec::new(),
            effect_assertions: Vec::new(),
            error_assertions: Vec::new(),
        }
    }

    /// Environment passed to `reduce`
    #[must_use]
    pub fn with_env(mut self, env: Env) -> Self {
        self.environment = Some(env);
        self
    }

    /// Given
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// When
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.action = Some(action);
        self
    }

    /// Then, on the state after an accepted action
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Then, on the effects of an accepted action
    #[must_use]
    pub fn then_effects<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[Effect]) + 'static,
    {
        self.effect_assertions.push(Box::new(assertion));
        self
    }

    /// Then, on the error of a rejected action
    #[must_use]
    pub fn then_error<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&Err) + 'static,
    {
        self.error_assertions.push(Box::new(assertion));
        self
    }

    /// Reduces once and runs every assertion
    ///
    /// # Panics
    ///
    /// Panics if initial state, action, or environment is not set, if the
    /// outcome (accepted or rejected) is not the one the assertions expect,
    /// or if any assertion fails.
    #[allow(clippy::panic)] // Test code can panic
    #[allow(clippy::expect_used)] // Test code can use expect
    pub fn run(self) {
        let mut state = self
            .initial_state
            .expect("Initial state must be set with given_state()");
        let before = state.clone();

        let action = self.action.expect("Action must be set with when_action()");

        let env = self
            .environment
            .expect("Environment must be set with with_env()");

        let outcome = self.reducer.reduce(&mut state, action, &env);

        match outcome {
            Ok(effects) => {
                assert!(
                    self.error_assertions.is_empty(),
                    "Expected the action to be rejected, but it produced {} effects",
                    effects.len()
                );
                for assertion in self.state_assertions {
                    assertion(&state);
                }
                for assertion in self.effect_assertions {
                    assertion(&effects);
                }
            }
            Err(error) => {
                assert!(
                    self.state_assertions.is_empty() && self.effect_assertions.is_empty(),
                    "Expected the action to be accepted, but it was rejected: {error:?}"
                );
                assert_eq!(state, before, "A rejected action must not change the state");
                for assertion in self.error_assertions {
                    assertion(&error);
                }
            }
        }
    }
}

/// Effect assertions shared by reducer tests
pub mod assertions {
    use hotel_ops_core::effect::{AuditAction, Effect};

    /// Assert the number of effects
    ///
    /// # Panics
    ///
    /// Panics if the number of effects doesn't match expected.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_effects_count(effects: &[Effect], expected: usize) {
        assert_eq!(
            effects.len(),
            expected,
            "Expected {} effects, but found {}",
            expected,
            effects.len()
        );
    }

    /// Assert that effects contain an audit entry with the given action
    ///
    /// # Panics
    ///
    /// Panics if no such audit entry is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_audit(effects: &[Effect], action: AuditAction) {
        assert!(
            effects
                .iter()
                .any(|e| matches!(e, Effect::RecordAudit(entry) if entry.action == action)),
            "Expected an audit entry for {action}, but none found in {effects:?}"
        );
    }

    /// Assert that effects contain at least one cancellation notification
    ///
    /// # Panics
    ///
    /// Panics if no cancellation notification is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_cancellation_notice(effects: &[Effect]) {
        assert!(
            effects
                .iter()
                .any(|e| matches!(e, Effect::NotifyCancellation { .. })),
            "Expected a cancellation notification, but none found"
        );
    }

    /// Assert that effects contain at least one modification notification
    ///
    /// # Panics
    ///
    /// Panics if no modification notification is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_modification_notice(effects: &[Effect]) {
        assert!(
            effects
                .iter()
                .any(|e| matches!(e, Effect::NotifyModification { .. })),
            "Expected a modification notification, but none found"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hotel_ops_core::effect::{AuditAction, AuditEntry, Effect};
    use hotel_ops_core::reducer::{Effects, Reducer};
    use hotel_ops_core::smallvec;
    use hotel_ops_core::types::ReservationId;

    #[derive(Clone, Debug, PartialEq)]
    struct TestState {
        nights: u32,
    }

    #[derive(Clone, Debug)]
    enum TestAction {
        Extend,
        Shorten,
    }

    struct TestReducer;

    struct TestEnv;

    impl Reducer for TestReducer {
        type State = TestState;
        type Action = TestAction;
        type Environment = TestEnv;
        type Error = String;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> Result<Effects, String> {
            match action {
                TestAction::Extend => {
                    state.nights += 1;
                    Ok(smallvec![Effect::RecordAudit(AuditEntry::new(
                        ReservationId::new(1),
                        AuditAction::Modified,
                        "system",
                        "extended",
                    ))])
                }
                TestAction::Shorten if state.nights > 1 => {
                    state.nights -= 1;
                    Ok(smallvec![Effect::None])
                }
                TestAction::Shorten => Err("a stay needs at least one night".to_string()),
            }
        }
    }

    #[test]
    fn test_reducer_test_extend() {
        ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(TestState { nights: 1 })
            .when_action(TestAction::Extend)
            .then_state(|state| {
                assert_eq!(state.nights, 2);
            })
            .then_effects(|effects| {
                assertions::assert_has_audit(effects, AuditAction::Modified);
            })
            .run();
    }

    #[test]
    fn test_reducer_test_rejection() {
        ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(TestState { nights: 1 })
            .when_action(TestAction::Shorten)
            .then_error(|error| {
                assert!(error.contains("one night"));
            })
            .run();
    }

    #[test]
    fn test_assertions_effects_count() {
        assertions::assert_effects_count(&[Effect::None], 1);
        assertions::assert_effects_count(&[], 0);
    }
}

//! The reducer trait: business logic as a function of state, action and environment.

use crate::effect::Effect;
use smallvec::SmallVec;

/// Effects returned by a single reduction (rarely more than a handful)
pub type Effects = SmallVec<[Effect; 4]>;

/// Core abstraction for lifecycle logic
///
/// A reducer validates an action against the current state, mutates the state
/// in place on success, and returns the side effects the runtime must execute.
/// It performs no I/O.
///
/// A rejected action must leave the state untouched: validate first, mutate
/// after.
///
/// # Example
///
/// ```ignore
/// impl Reducer for ReservationReducer {
///     type State = ReservationState;
///     type Action = ReservationAction;
///     type Environment = ReservationEnvironment;
///     type Error = TransitionError;
///
///     fn reduce(
///         &self,
///         state: &mut ReservationState,
///         action: ReservationAction,
///         env: &ReservationEnvironment,
///     ) -> Result<Effects, TransitionError> {
///         // Business logic here
///         Ok(smallvec![Effect::None])
///     }
/// }
/// ```
pub trait Reducer {
    /// The state type this reducer operates on
    type State;

    /// The action type this reducer processes
    type Action;

    /// The environment type with injected dependencies
    type Environment;

    /// Why an action was rejected
    type Error;

    /// Reduce an action into state changes and effects
    ///
    /// # Errors
    ///
    /// Returns `Self::Error` when the action is not allowed in the current
    /// state. The state is left unchanged in that case.
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> Result<Effects, Self::Error>;
}

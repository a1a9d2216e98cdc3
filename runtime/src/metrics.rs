//! Metric names and descriptions.
//!
//! The engine only talks to the `metrics` facade. Installing a recorder
//! (Prometheus or anything else) is left to the binary embedding it.

use metrics::describe_counter;

/// Bookings stored (any outcome)
pub const BOOKINGS_CREATED: &str = "hotel.bookings.created";
/// Bookings confirmed by a successful payment
pub const BOOKINGS_CONFIRMED: &str = "hotel.bookings.confirmed";
/// Bookings left pending because payment failed
pub const BOOKINGS_PAYMENT_FAILED: &str = "hotel.bookings.payment_failed";
/// Bookings charged whose confirmation could not be stored
pub const BOOKINGS_CHARGED_UNCONFIRMED: &str = "hotel.bookings.charged_unconfirmed";
/// Accepted transitions, labelled with the target status
pub const TRANSITIONS: &str = "hotel.transitions";
/// Rejected transitions, labelled with the target status
pub const TRANSITIONS_REJECTED: &str = "hotel.transitions.rejected";
/// Cancellations, labelled with the channel
pub const CANCELLATIONS: &str = "hotel.cancellations";
/// Effects executed, labelled with the effect kind
pub const EFFECTS_EXECUTED: &str = "hotel.effects.executed";
/// Effects that failed, labelled with the effect kind
pub const EFFECTS_FAILED: &str = "hotel.effects.failed";

/// Conflicting writes that succeeded on a later attempt
pub const RETRY_RECOVERED: &str = "hotel.retry.recovered";
/// Conflicting writes that ran out of retries
pub const RETRY_EXHAUSTED: &str = "hotel.retry.exhausted";
/// Storage or payment calls cut off by their deadline
pub const DEADLINE_EXCEEDED: &str = "hotel.deadline.exceeded";

/// Register all metric descriptions with the installed recorder.
pub fn describe_metrics() {
    describe_counter!(BOOKINGS_CREATED, "Total number of reservations created");
    describe_counter!(
        BOOKINGS_CONFIRMED,
        "Total number of reservations confirmed at booking time"
    );
    describe_counter!(
        BOOKINGS_PAYMENT_FAILED,
        "Total number of bookings left pending after a failed payment"
    );
    describe_counter!(
        BOOKINGS_CHARGED_UNCONFIRMED,
        "Total number of charged bookings left pending because confirmation failed"
    );
    describe_counter!(TRANSITIONS, "Total number of accepted status transitions");
    describe_counter!(
        TRANSITIONS_REJECTED,
        "Total number of rejected status transitions"
    );
    describe_counter!(CANCELLATIONS, "Total number of cancellations");
    describe_counter!(EFFECTS_EXECUTED, "Total number of effects executed");
    describe_counter!(
        EFFECTS_FAILED,
        "Total number of audit or notification effects that failed"
    );
    describe_counter!(
        RETRY_RECOVERED,
        "Total number of operations that succeeded after a retry"
    );
    describe_counter!(
        RETRY_EXHAUSTED,
        "Total number of operations that exhausted their retries"
    );
    describe_counter!(
        DEADLINE_EXCEEDED,
        "Total number of outbound calls that timed out"
    );
}

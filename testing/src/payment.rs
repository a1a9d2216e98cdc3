//! Scripted payment gateway.

use async_trait::async_trait;
use hotel_ops_core::PaymentError;
use hotel_ops_core::environment::PaymentGateway;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Outcome of the next charge
#[derive(Clone, Debug)]
pub enum PaymentScript {
    /// Succeed with this reference
    Approve(String),
    /// Fail with this error
    Decline(PaymentError),
    /// Sleep, then approve (for timeout tests)
    Stall(Duration),
}

/// A charge the gateway received
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Charge {
    /// Amount in minor units
    pub amount_minor: i64,
    /// Currency code
    pub currency: String,
    /// Payment method token
    pub token: String,
}

#[derive(Default)]
struct Inner {
    script: VecDeque<PaymentScript>,
    charges: Vec<Charge>,
}

/// Payment gateway that plays back queued outcomes.
///
/// With an empty script every charge is approved with reference `pay_<n>`.
#[derive(Default)]
pub struct ScriptedPaymentGateway {
    inner: Mutex<Inner>,
}

impl ScriptedPaymentGateway {
    /// Gateway approving every charge
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gateway that declines the first charge
    #[must_use]
    pub fn declining(error: PaymentError) -> Self {
        let gateway = Self::new();
        gateway.push(PaymentScript::Decline(error));
        gateway
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues the outcome of a future charge
    pub fn push(&self, script: PaymentScript) {
        self.inner().script.push_back(script);
    }

    /// Charges received so far, including failed ones
    #[must_use]
    pub fn charges(&self) -> Vec<Charge> {
        self.inner().charges.clone()
    }
}

#[async_trait]
impl PaymentGateway for ScriptedPaymentGateway {
    async fn charge(
        &self,
        amount_minor: i64,
        currency: &str,
        payment_method_token: &str,
    ) -> Result<String, PaymentError> {
        let (script, attempt) = {
            let mut inner = self.inner();
            inner.charges.push(Charge {
                amount_minor,
                currency: currency.to_string(),
                token: payment_method_token.to_string(),
            });
            (inner.script.pop_front(), inner.charges.len())
        };

        match script {
            None => Ok(format!("pay_{attempt}")),
            Some(PaymentScript::Approve(reference)) => Ok(reference),
            Some(PaymentScript::Decline(error)) => Err(error),
            Some(PaymentScript::Stall(delay)) => {
                tokio::time::sleep(delay).await;
                Ok(format!("pay_{attempt}"))
            }
        }
    }
}

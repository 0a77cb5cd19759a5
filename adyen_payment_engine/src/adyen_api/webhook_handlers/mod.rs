//! Webhook handlers reconcile order transactions with Adyen notifications.
//!
//! [`WebhookHandlerFactory::create`] picks the handler for a notification's event code. Handlers are not idempotent.
//! They rely on notifications being deduplicated on receipt, and on the state machine refusing repeated
//! transitions.
mod authorisation;
mod cancellation;
mod capture;
mod refund;

pub use authorisation::AuthorisationHandler;
pub use cancellation::CancellationHandler;
pub use capture::CaptureHandler;
pub use refund::{RefundFailedHandler, RefundHandler};

use std::fmt::Debug;

use log::*;

use crate::{
    adyen_api::{
        capture_api::CaptureApi,
        errors::WebhookError,
        refund_api::RefundApi,
        transaction_state_api::TransactionStateApi,
    },
    db_types::{EventCode, Notification, OrderTransaction, TransactionState},
    traits::{AdyenDatabase, PaymentGateway},
};

/// Holds the services the webhook handlers need. Built once at startup.
pub struct WebhookHandlerFactory<B, G> {
    db: B,
    states: TransactionStateApi<B>,
    captures: CaptureApi<B, G>,
    refunds: RefundApi<B, G>,
}

impl<B, G> Debug for WebhookHandlerFactory<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WebhookHandlerFactory")
    }
}

impl<B, G> WebhookHandlerFactory<B, G> {
    pub fn new(
        db: B,
        states: TransactionStateApi<B>,
        captures: CaptureApi<B, G>,
        refunds: RefundApi<B, G>,
    ) -> Self {
        Self { db, states, captures, refunds }
    }
}

impl<B, G> WebhookHandlerFactory<B, G>
where
    B: AdyenDatabase,
    G: PaymentGateway,
{
    pub fn create(&self, event: &EventCode) -> WebhookHandler<'_, B, G> {
        match event {
            EventCode::Authorisation => WebhookHandler::Authorisation(AuthorisationHandler::new(
                &self.db,
                &self.states,
                &self.captures,
            )),
            EventCode::Capture => WebhookHandler::Capture(CaptureHandler::new(&self.db, &self.states)),
            EventCode::CancelOrRefund => WebhookHandler::CancelOrRefund(RefundHandler::new(&self.states, &self.refunds)),
            EventCode::Refund => WebhookHandler::Refund(RefundHandler::new(&self.states, &self.refunds)),
            EventCode::RefundFailed => WebhookHandler::RefundFailed(RefundFailedHandler::new(&self.refunds)),
            EventCode::Cancellation => WebhookHandler::Cancellation(CancellationHandler::new(&self.states)),
            EventCode::OfferClosed => WebhookHandler::OfferClosed(CancellationHandler::new(&self.states)),
            _ => WebhookHandler::Default,
        }
    }
}

pub enum WebhookHandler<'a, B, G> {
    Authorisation(AuthorisationHandler<'a, B, G>),
    Capture(CaptureHandler<'a, B>),
    CancelOrRefund(RefundHandler<'a, B, G>),
    Refund(RefundHandler<'a, B, G>),
    RefundFailed(RefundFailedHandler<'a, B, G>),
    Cancellation(CancellationHandler<'a, B>),
    OfferClosed(CancellationHandler<'a, B>),
    Default,
}

impl<'a, B, G> WebhookHandler<'a, B, G>
where
    B: AdyenDatabase,
    G: PaymentGateway,
{
    pub fn name(&self) -> &'static str {
        match self {
            Self::Authorisation(_) => "authorisation",
            Self::Capture(_) => "capture",
            Self::CancelOrRefund(_) => "cancel_or_refund",
            Self::Refund(_) => "refund",
            Self::RefundFailed(_) => "refund_failed",
            Self::Cancellation(_) => "cancellation",
            Self::OfferClosed(_) => "offer_closed",
            Self::Default => "default",
        }
    }

    pub async fn handle_webhook(
        &self,
        transaction: &OrderTransaction,
        notification: &Notification,
        target_state: TransactionState,
        current_state: TransactionState,
    ) -> Result<(), WebhookError> {
        trace!(
            "🪝️ {} handler: notification #{} for transaction [{}] ({current_state} -> {target_state})",
            self.name(),
            notification.id,
            transaction.transaction_id
        );
        match self {
            Self::Authorisation(h) => h.handle(transaction, notification, target_state, current_state).await,
            Self::Capture(h) => h.handle(transaction, notification).await,
            Self::CancelOrRefund(h) => h.handle(transaction, notification, target_state, true).await,
            Self::Refund(h) => h.handle(transaction, notification, target_state, false).await,
            Self::RefundFailed(h) => h.handle(transaction, notification).await,
            Self::Cancellation(h) | Self::OfferClosed(h) => h.handle(transaction, target_state).await,
            Self::Default => {
                debug!("🪝️ No handler for {} notifications. Ignoring #{}", notification.event_code, notification.id);
                Ok(())
            },
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::{fixtures::test_config, TestSystem};

    #[tokio::test]
    async fn handlers_are_picked_by_event_code() {
        let sys = TestSystem::new(test_config()).await;
        let factory =
            WebhookHandlerFactory::new(sys.db.clone(), sys.states.clone(), sys.captures.clone(), sys.refunds.clone());
        let name = |code: &str| factory.create(&EventCode::from(code)).name();
        assert_eq!(name("AUTHORISATION"), "authorisation");
        assert_eq!(name("CAPTURE"), "capture");
        assert_eq!(name("CANCEL_OR_REFUND"), "cancel_or_refund");
        assert_eq!(name("REFUND"), "refund");
        assert_eq!(name("REFUND_FAILED"), "refund_failed");
        assert_eq!(name("CANCELLATION"), "cancellation");
        assert_eq!(name("OFFER_CLOSED"), "offer_closed");
        assert_eq!(name("CAPTURE_FAILED"), "default");
        assert_eq!(name("REPORT_AVAILABLE"), "default");
    }
}

use std::fmt::Debug;

use log::*;

use crate::{
    adyen_api::errors::StateMachineError,
    db_types::{OrderTransaction, TransactionState},
    events::{EventProducers, TransactionStateChangedEvent},
    state_machine::{next_state, TransitionAction},
    traits::OrderManagement,
};

/// `TransactionStateApi` is the only place where order transactions change state.
///
/// Every transition is checked against the state machine before it is written, and every successful transition is
/// published to the `transaction_state_changed` subscribers.
pub struct TransactionStateApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for TransactionStateApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TransactionStateApi")
    }
}

impl<B: Clone> Clone for TransactionStateApi<B> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone(), producers: self.producers.clone() }
    }
}

impl<B> TransactionStateApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> TransactionStateApi<B>
where B: OrderManagement
{
    /// Applies `action` to the transaction, failing with [`StateMachineError::IllegalTransition`] if the state machine
    /// does not allow it from the transaction's current state.
    pub async fn transition(
        &self,
        transaction_id: &str,
        action: TransitionAction,
    ) -> Result<OrderTransaction, StateMachineError> {
        let tx = self
            .db
            .fetch_transaction(transaction_id)
            .await?
            .ok_or_else(|| StateMachineError::TransactionNotFound(transaction_id.to_string()))?;
        let old_state = tx.state;
        let new_state = next_state(old_state, action)
            .ok_or(StateMachineError::IllegalTransition { from: old_state, action })?;
        let updated = self.db.update_transaction_state(transaction_id, new_state).await?;
        info!("🔀️ Transaction [{transaction_id}] {old_state} -> {new_state} ({action})");
        self.producers.publish_transaction_state_changed(TransactionStateChangedEvent::new(updated.clone(), old_state)).await;
        Ok(updated)
    }

    pub async fn process(&self, transaction_id: &str) -> Result<OrderTransaction, StateMachineError> {
        self.transition(transaction_id, TransitionAction::Process).await
    }

    pub async fn authorize(&self, transaction_id: &str) -> Result<OrderTransaction, StateMachineError> {
        self.transition(transaction_id, TransitionAction::Authorize).await
    }

    pub async fn pay(&self, transaction_id: &str) -> Result<OrderTransaction, StateMachineError> {
        self.transition(transaction_id, TransitionAction::Pay).await
    }

    pub async fn fail(&self, transaction_id: &str) -> Result<OrderTransaction, StateMachineError> {
        self.transition(transaction_id, TransitionAction::Fail).await
    }

    pub async fn cancel(&self, transaction_id: &str) -> Result<OrderTransaction, StateMachineError> {
        self.transition(transaction_id, TransitionAction::Cancel).await
    }

    /// Drives the transaction into `state` with whichever action leads there.
    pub async fn transition_to(
        &self,
        transaction_id: &str,
        state: TransactionState,
    ) -> Result<OrderTransaction, StateMachineError> {
        self.transition(transaction_id, TransitionAction::for_target(state)).await
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

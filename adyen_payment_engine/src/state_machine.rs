//! Order transaction state machine.
//!
//! Every change to a transaction's [`TransactionState`] is expressed as a [`TransitionAction`]. An action is only
//! legal from a fixed set of source states; [`next_state`] returns `None` for anything else, and callers surface that
//! as an illegal-transition error. Moving a transaction into the state it is already in is never legal.
use std::fmt::Display;

use crate::db_types::{EventCode, TransactionState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionAction {
    Process,
    ProcessUnconfirmed,
    Remind,
    Authorize,
    Pay,
    PayPartially,
    Refund,
    RefundPartially,
    Cancel,
    Fail,
    Reopen,
    Chargeback,
}

impl TransitionAction {
    pub fn target(&self) -> TransactionState {
        use TransactionState::*;
        match self {
            Self::Process => InProgress,
            Self::ProcessUnconfirmed => Unconfirmed,
            Self::Remind => Reminded,
            Self::Authorize => Authorized,
            Self::Pay => Paid,
            Self::PayPartially => PaidPartially,
            Self::Refund => Refunded,
            Self::RefundPartially => RefundedPartially,
            Self::Cancel => Cancelled,
            Self::Fail => Failed,
            Self::Reopen => Open,
            Self::Chargeback => Chargeback,
        }
    }

    fn allowed_from(&self) -> &'static [TransactionState] {
        use TransactionState::*;
        match self {
            Self::Process => &[Open, Reminded, Unconfirmed],
            Self::ProcessUnconfirmed => &[Open, InProgress, Reminded],
            Self::Remind => &[Open, PaidPartially],
            Self::Authorize => &[Open, InProgress, Reminded, Unconfirmed],
            Self::Pay => &[
                Open,
                InProgress,
                Reminded,
                Unconfirmed,
                Authorized,
                PaidPartially,
                RefundedPartially,
                Failed,
                Cancelled,
            ],
            Self::PayPartially => &[Open, InProgress, Reminded, Unconfirmed, Authorized],
            Self::Refund | Self::RefundPartially => &[Paid, PaidPartially],
            Self::Cancel => &[Open, InProgress, Reminded, Unconfirmed, Authorized, PaidPartially, Paid, RefundedPartially],
            Self::Fail => &[Open, InProgress, Reminded, Unconfirmed, Authorized, PaidPartially],
            Self::Reopen => &[Cancelled, Failed, Reminded, Paid, PaidPartially, RefundedPartially],
            Self::Chargeback => &[Paid, PaidPartially, RefundedPartially],
        }
    }

    /// The action that moves a transaction into `state`, if there is one.
    pub fn for_target(state: TransactionState) -> TransitionAction {
        use TransactionState::*;
        match state {
            Open => Self::Reopen,
            InProgress => Self::Process,
            Unconfirmed => Self::ProcessUnconfirmed,
            Reminded => Self::Remind,
            Authorized => Self::Authorize,
            Paid => Self::Pay,
            PaidPartially => Self::PayPartially,
            Refunded => Self::Refund,
            RefundedPartially => Self::RefundPartially,
            Cancelled => Self::Cancel,
            Failed => Self::Fail,
            Chargeback => Self::Chargeback,
        }
    }
}

impl Display for TransitionAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Process => "process",
            Self::ProcessUnconfirmed => "process_unconfirmed",
            Self::Remind => "remind",
            Self::Authorize => "authorize",
            Self::Pay => "paid",
            Self::PayPartially => "pay_partially",
            Self::Refund => "refund",
            Self::RefundPartially => "refund_partially",
            Self::Cancel => "cancel",
            Self::Fail => "fail",
            Self::Reopen => "reopen",
            Self::Chargeback => "chargeback",
        };
        f.write_str(s)
    }
}

/// Returns the state that `action` leads to from `current`, or `None` if the transition is illegal.
pub fn next_state(current: TransactionState, action: TransitionAction) -> Option<TransactionState> {
    action.allowed_from().contains(&current).then(|| action.target())
}

/// Works out which state a notification should drive the transaction towards.
///
/// Returns `current` when the notification does not imply a state change.
pub fn resolve_target_state(event: &EventCode, success: bool, current: TransactionState) -> TransactionState {
    use TransactionState::*;
    match event {
        EventCode::Authorisation if current.is_awaiting_payment() => {
            if success {
                Paid
            } else {
                Failed
            }
        },
        EventCode::Capture if success && current.is_awaiting_payment() => Paid,
        EventCode::Refund if success && current.is_refundable() => Refunded,
        EventCode::CancelOrRefund if success && current.is_awaiting_payment() => Cancelled,
        EventCode::CancelOrRefund if success && current.is_refundable() => Refunded,
        EventCode::Cancellation | EventCode::OfferClosed if success && current.is_awaiting_payment() => Cancelled,
        _ => current,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::db_types::TransactionState::*;

    #[test]
    fn legal_transitions() {
        assert_eq!(next_state(Open, TransitionAction::Authorize), Some(Authorized));
        assert_eq!(next_state(Authorized, TransitionAction::Pay), Some(Paid));
        assert_eq!(next_state(Paid, TransitionAction::RefundPartially), Some(RefundedPartially));
        assert_eq!(next_state(RefundedPartially, TransitionAction::Pay), Some(Paid));
        assert_eq!(next_state(Authorized, TransitionAction::Fail), Some(Failed));
    }

    #[test]
    fn illegal_transitions() {
        assert_eq!(next_state(Paid, TransitionAction::Pay), None);
        assert_eq!(next_state(Authorized, TransitionAction::Refund), None);
        assert_eq!(next_state(RefundedPartially, TransitionAction::Refund), None);
        assert_eq!(next_state(Refunded, TransitionAction::Pay), None);
        assert_eq!(next_state(Paid, TransitionAction::Fail), None);
        assert_eq!(next_state(Authorized, TransitionAction::Authorize), None);
    }

    #[test]
    fn actions_for_targets() {
        for state in [Open, InProgress, Authorized, Paid, Refunded, RefundedPartially, Cancelled, Failed] {
            assert_eq!(TransitionAction::for_target(state).target(), state);
        }
    }

    #[test]
    fn target_states() {
        assert_eq!(resolve_target_state(&EventCode::Authorisation, true, Open), Paid);
        assert_eq!(resolve_target_state(&EventCode::Authorisation, false, InProgress), Failed);
        assert_eq!(resolve_target_state(&EventCode::Authorisation, true, Paid), Paid);
        assert_eq!(resolve_target_state(&EventCode::Refund, true, Paid), Refunded);
        assert_eq!(resolve_target_state(&EventCode::Refund, false, Paid), Paid);
        assert_eq!(resolve_target_state(&EventCode::CancelOrRefund, true, Authorized), Cancelled);
        assert_eq!(resolve_target_state(&EventCode::CancelOrRefund, true, RefundedPartially), Refunded);
        assert_eq!(resolve_target_state(&EventCode::Cancellation, true, Open), Cancelled);
        assert_eq!(resolve_target_state(&EventCode::OfferClosed, true, Paid), Paid);
        assert_eq!(resolve_target_state(&EventCode::Other("REPORT_AVAILABLE".into()), true, Open), Open);
    }
}

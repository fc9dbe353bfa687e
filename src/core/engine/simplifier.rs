use super::splitter::round_cents;
use crate::constants::SETTLEMENT_EPSILON;
use crate::core::models::{ParticipantId, Transfer};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug)]
struct Residual<'a> {
    participant: &'a ParticipantId,
    amount: f64,
}

/// Greedy netting of a balance map into payment instructions.
///
/// Creditors and debtors are matched head-to-head in identifier order, so
/// the same balances always produce the same instructions. The result has at
/// most `n - 1` entries for `n` unsettled participants; it is not a global
/// minimum.
pub struct DebtSimplifier;

impl DebtSimplifier {
    pub fn simplify(balances: &HashMap<ParticipantId, f64>) -> Vec<Transfer> {
        let mut creditors: Vec<Residual> = Vec::new();
        let mut debtors: Vec<Residual> = Vec::new();

        for (participant, balance) in balances {
            let balance = round_cents(*balance);
            if balance > SETTLEMENT_EPSILON {
                creditors.push(Residual {
                    participant,
                    amount: balance,
                });
            } else if balance < -SETTLEMENT_EPSILON {
                debtors.push(Residual {
                    participant,
                    amount: -balance,
                });
            }
        }

        creditors.sort_by(|a, b| a.participant.cmp(b.participant));
        debtors.sort_by(|a, b| a.participant.cmp(b.participant));

        let mut transfers = Vec::with_capacity((creditors.len() + debtors.len()).saturating_sub(1));
        let (mut ci, mut di) = (0, 0);

        while ci < creditors.len() && di < debtors.len() {
            let creditor = &mut creditors[ci];
            let debtor = &mut debtors[di];

            let amount = round_cents(creditor.amount.min(debtor.amount));
            creditor.amount = round_cents(creditor.amount - amount);
            debtor.amount = round_cents(debtor.amount - amount);

            if amount > SETTLEMENT_EPSILON {
                transfers.push(Transfer {
                    from: debtor.participant.clone(),
                    to: creditor.participant.clone(),
                    amount,
                });
            }

            if creditor.amount <= SETTLEMENT_EPSILON {
                ci += 1;
            }
            if debtor.amount <= SETTLEMENT_EPSILON {
                di += 1;
            }
        }

        debug!(transfers = transfers.len(), "Simplified debts");
        transfers
    }
}

//! Account collaborators and history bookkeeping

use crate::config::KERNEL_EXCESS_PLACEHOLDER;
use crate::error::{WalletError, WalletResult};
use crate::hardware::SignedOperation;
use crate::types::{Account, Operation, OperationExtra};
use async_trait::async_trait;
use mwc_core::Nullable;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Function transforming an account snapshot; an error leaves the stored account untouched
pub type AccountUpdater = Box<dyn FnOnce(Account) -> WalletResult<Account> + Send>;

/// Source of account snapshots and sink of account updates
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Current immutable snapshot of an account
    async fn current_account(&self, account_id: &str) -> WalletResult<Account>;

    /// Replace the account with the updater's result
    async fn apply_updater(&self, account_id: &str, updater: AccountUpdater) -> WalletResult<()>;
}

/// Submits signed transactions to the network
#[async_trait]
pub trait Broadcaster: Send + Sync {
    /// Broadcast `signed` and return the operation as recorded by the network
    async fn broadcast(&self, account: &Account, signed: &SignedOperation) -> WalletResult<Operation>;
}

/// Account repository held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryAccountRepository {
    accounts: Arc<RwLock<HashMap<String, Account>>>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, account: Account) {
        self.accounts.write().await.insert(account.id.clone(), account);
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn current_account(&self, account_id: &str) -> WalletResult<Account> {
        self.accounts
            .read()
            .await
            .get(account_id)
            .cloned()
            .ok_or_else(|| WalletError::AccountNotFound(account_id.to_string()))
    }

    async fn apply_updater(&self, account_id: &str, updater: AccountUpdater) -> WalletResult<()> {
        let mut accounts = self.accounts.write().await;
        let current = accounts
            .get(account_id)
            .cloned()
            .ok_or_else(|| WalletError::AccountNotFound(account_id.to_string()))?;
        let updated = updater(current)?;
        accounts.insert(account_id.to_string(), updated);
        Ok(())
    }
}

/// Records a broadcast transaction in the account's history.
///
/// Consumed outputs are marked spent, the outgoing operation is put first,
/// the transaction sequence number advances and the next output identifier
/// moves past the change output.
pub fn add_sent_transaction_to_account(
    mut account: Account,
    signed: &SignedOperation,
) -> WalletResult<Account> {
    if account.operation(&signed.operation.id).is_some() {
        debug!(operation = %signed.operation.id, "sent transaction already recorded");
        return Ok(account);
    }

    let mut consumed: u64 = 0;
    for id in &signed.spent_operation_ids {
        let operation = account
            .operations
            .iter_mut()
            .find(|operation| &operation.id == id)
            .ok_or_else(|| {
                WalletError::InvalidTransaction(format!("spent output {} is not in the account", id))
            })?;
        if operation.extra.mark_spent() {
            consumed = consumed.saturating_add(operation.value);
        } else {
            debug!(operation = %id, "output already marked spent");
        }
    }

    account.operations.insert(0, signed.operation.clone());

    account.spendable_balance = account.spendable_balance.saturating_sub(consumed);
    account.balance = account
        .balance
        .saturating_sub(signed.operation.value.saturating_add(signed.operation.fee));

    let resources = &mut account.resources;
    resources.next_transaction_sequence_number = resources
        .next_transaction_sequence_number
        .checked_add(1)
        .ok_or_else(|| WalletError::InvalidTransaction("transaction sequence number overflow".into()))?;
    if let Some(change) = &signed.change_identifier {
        resources.advance_identifier_past(change)?;
    }

    info!(
        account = %account.id,
        operation = %signed.operation.id,
        inputs = signed.spent_operation_ids.len(),
        "recorded sent transaction"
    );
    Ok(account)
}

/// Explorer link for a confirmed transaction, when its kernel excess is known
pub fn transaction_explorer_url(template: &str, extra: &OperationExtra) -> Option<String> {
    match &extra.kernel_excess {
        Nullable::Value(excess) => {
            Some(template.replace(KERNEL_EXCESS_PLACEHOLDER, &hex::encode(excess)))
        }
        Nullable::Absent | Nullable::Null => None,
    }
}

/// Family-specific lines appended to an operation's textual description
pub fn format_operation_specifics(operation: &Operation) -> String {
    operation
        .extra
        .output_commitment
        .as_ref()
        .map(|commitment| format!("\n  Output Commitment: {}", hex::encode(commitment)))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AccountResources, OperationKind};
    use chrono::{DateTime, Utc};
    use mwc_core::{Currency, Identifier};

    fn operation(id: &str, kind: OperationKind, value: u64) -> Operation {
        Operation {
            id: id.to_string(),
            hash: String::new(),
            kind,
            value,
            fee: 0,
            block_height: Some(1),
            date: DateTime::<Utc>::default(),
            senders: Vec::new(),
            recipients: Vec::new(),
            extra: OperationExtra::default(),
        }
    }

    fn account() -> Account {
        let mut account = Account::new("acc", Currency::MimbleWimbleCoin, AccountResources::new(vec![2; 33]));
        account.operations = vec![operation("b", OperationKind::In, 30), operation("a", OperationKind::In, 70)];
        account.balance = 100;
        account.spendable_balance = 100;
        account
    }

    fn signed() -> SignedOperation {
        let mut outgoing = operation("out", OperationKind::Out, 60);
        outgoing.fee = 6;
        outgoing.block_height = None;
        outgoing.extra.kernel_excess = Nullable::Value(vec![9; 33]);
        SignedOperation {
            operation: outgoing,
            signature: "{}".to_string(),
            spent_operation_ids: vec!["a".to_string()],
            change_identifier: Some(Identifier::new(3, [0, 0, 5, 0]).unwrap()),
        }
    }

    #[test]
    fn test_add_sent_transaction() {
        let updated = add_sent_transaction_to_account(account(), &signed()).unwrap();
        assert_eq!(updated.operations[0].id, "out");
        assert!(updated.operation("a").unwrap().extra.is_spent());
        assert!(!updated.operation("b").unwrap().extra.is_spent());
        assert_eq!(updated.spendable_balance, 30);
        assert_eq!(updated.balance, 34);
        assert_eq!(updated.resources.next_transaction_sequence_number, 1);
        assert_eq!(updated.resources.next_identifier.paths(), &[0, 0, 6]);
    }

    #[test]
    fn test_add_sent_transaction_is_idempotent_for_history() {
        let once = add_sent_transaction_to_account(account(), &signed()).unwrap();
        let twice = add_sent_transaction_to_account(once.clone(), &signed()).unwrap();
        assert_eq!(twice, once);
    }

    #[test]
    fn test_unknown_spent_output_is_rejected() {
        let mut bad = signed();
        bad.spent_operation_ids = vec!["missing".to_string()];
        assert!(add_sent_transaction_to_account(account(), &bad).is_err());
    }

    #[tokio::test]
    async fn test_failed_updater_leaves_account_untouched() {
        let repository = InMemoryAccountRepository::new();
        repository.insert(account()).await;

        let mut bad = signed();
        bad.spent_operation_ids = vec!["missing".to_string()];
        let result = repository
            .apply_updater("acc", Box::new(move |account| add_sent_transaction_to_account(account, &bad)))
            .await;
        assert!(result.is_err());
        assert_eq!(repository.current_account("acc").await.unwrap(), account());

        assert!(matches!(
            repository.current_account("other").await,
            Err(WalletError::AccountNotFound(_))
        ));
    }

    #[test]
    fn test_explorer_url() {
        let mut extra = OperationExtra::default();
        let template = "https://explorer.example/kernel/$kernelExcess";
        assert_eq!(transaction_explorer_url(template, &extra), None);
        extra.kernel_excess = Nullable::Null;
        assert_eq!(transaction_explorer_url(template, &extra), None);
        extra.kernel_excess = Nullable::Value(vec![0xab, 0x01]);
        assert_eq!(
            transaction_explorer_url(template, &extra).as_deref(),
            Some("https://explorer.example/kernel/ab01")
        );
    }

    #[test]
    fn test_operation_specifics() {
        let mut op = operation("a", OperationKind::In, 1);
        assert_eq!(format_operation_specifics(&op), "");
        op.extra.output_commitment = Some(vec![0x08, 0xff]);
        assert_eq!(format_operation_specifics(&op), "\n  Output Commitment: 08ff");
    }
}

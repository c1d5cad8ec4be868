use alloy_primitives::Address;
use serde::Serialize;

use crate::core::format::format_ether;
use crate::detail::contracts::IMultiSig;
use crate::detail::reader::ContractReader;
use crate::error::RpcError;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultisigTransaction {
    pub index: u64,
    pub initiator: String,
    pub confirmations: u64,
    pub to: String,
    pub data: String,
    /// Ether attached to the transaction
    pub value: String,
    pub executed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultisigWallet {
    pub address: String,
    pub balance: String,
    pub transactions: Vec<MultisigTransaction>,
}

impl MultisigWallet {
    pub fn executed_count(&self) -> usize {
        self.transactions.iter().filter(|tx| tx.executed).count()
    }
}

pub async fn multisig_wallet(reader: &ContractReader, wallet: Address) -> Result<MultisigWallet, RpcError> {
    let balance = reader.native_balance(wallet).await?;
    let transactions = reader
        .call(wallet, &IMultiSig::allTransactionsCall {})
        .await?
        .into_iter()
        .map(|tx| MultisigTransaction {
            index: tx.index.saturating_to(),
            initiator: format!("{:#x}", tx.initiator),
            confirmations: tx.confirmations.saturating_to(),
            to: format!("{:#x}", tx.to),
            data: tx.data.to_string(),
            value: format_ether(tx.value),
            executed: tx.executed,
        })
        .collect();
    Ok(MultisigWallet {
        address: format!("{:#x}", wallet),
        balance: format_ether(balance),
        transactions,
    })
}

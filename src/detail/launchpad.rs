use alloy_primitives::{Address, B256, U256};
use serde::Serialize;

use crate::core::format::{format_ether, format_units};
use crate::detail::contracts::ITokenSaleCreator;
use crate::detail::reader::ContractReader;
use crate::error::RpcError;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleRaised {
    /// Wei, as a decimal string
    pub total_ether_raised: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleContribution {
    /// Native coin put in by the account, in ether
    pub amount_contributed: String,
    /// Sale tokens the account can withdraw, in token units
    pub expected_balance: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleCreatorFees {
    pub sale_creation_fee: String,
    pub fee_percentage: u64,
}

pub async fn sale_raised(
    reader: &ContractReader,
    sale_creator: Address,
    sale_id: B256,
) -> Result<SaleRaised, RpcError> {
    let raised: U256 = reader
        .call(sale_creator, &ITokenSaleCreator::getTotalEtherRaisedForSaleCall { saleId: sale_id })
        .await?;
    Ok(SaleRaised {
        total_ether_raised: raised.to_string(),
    })
}

pub async fn sale_contribution(
    reader: &ContractReader,
    sale_creator: Address,
    sale_id: B256,
    account: Address,
    token_decimals: u8,
) -> Result<SaleContribution, RpcError> {
    let contributed = reader
        .call(
            sale_creator,
            &ITokenSaleCreator::amountContributedCall {
                saleId: sale_id,
                account,
            },
        )
        .await?;
    let balance = reader
        .call(
            sale_creator,
            &ITokenSaleCreator::balanceCall {
                saleId: sale_id,
                account,
            },
        )
        .await?;
    Ok(SaleContribution {
        amount_contributed: format_ether(contributed),
        expected_balance: format_units(balance, token_decimals),
    })
}

pub async fn sale_creator_fees(reader: &ContractReader, sale_creator: Address) -> Result<SaleCreatorFees, RpcError> {
    let (fee, percentage) = futures::try_join!(
        reader.call(sale_creator, &ITokenSaleCreator::saleCreationFeeCall {}),
        reader.call(sale_creator, &ITokenSaleCreator::feePercentageCall {}),
    )?;
    Ok(SaleCreatorFees {
        sale_creation_fee: format_ether(fee),
        fee_percentage: percentage.saturating_to(),
    })
}

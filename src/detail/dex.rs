use alloy_primitives::Address;
use serde::Serialize;

use crate::core::format::{format_ether, format_units};
use crate::detail::contracts::{IPair, IERC20};
use crate::detail::reader::ContractReader;
use crate::error::RpcError;

/// Tokens, reserves and the account's LP position of one DEX pair
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairDetails {
    pub pair: String,
    pub token0: String,
    pub token1: String,
    pub token0_symbol: String,
    pub token1_symbol: String,
    pub token0_decimals: u8,
    pub token1_decimals: u8,
    pub reserve0: String,
    pub reserve1: String,
    pub total_supply: String,
    /// LP tokens held by the account; "0" without an account
    pub account_balance: String,
}

pub async fn pair_details(
    reader: &ContractReader,
    pair: Address,
    account: Option<Address>,
) -> Result<PairDetails, RpcError> {
    let (token0, token1, reserves, total_supply) = futures::try_join!(
        reader.call(pair, &IPair::token0Call {}),
        reader.call(pair, &IPair::token1Call {}),
        reader.call(pair, &IPair::getReservesCall {}),
        reader.call(pair, &IPair::totalSupplyCall {}),
    )?;

    let (token0_symbol, token0_decimals, token1_symbol, token1_decimals) = futures::try_join!(
        reader.call(token0, &IERC20::symbolCall {}),
        reader.call(token0, &IERC20::decimalsCall {}),
        reader.call(token1, &IERC20::symbolCall {}),
        reader.call(token1, &IERC20::decimalsCall {}),
    )?;

    let account_balance = match account {
        Some(account) => format_ether(reader.call(pair, &IPair::balanceOfCall { account }).await?),
        None => "0".to_string(),
    };

    Ok(PairDetails {
        pair: format!("{:#x}", pair),
        token0: format!("{:#x}", token0),
        token1: format!("{:#x}", token1),
        token0_symbol,
        token1_symbol,
        token0_decimals,
        token1_decimals,
        reserve0: format_units(reserves.reserve0, token0_decimals),
        reserve1: format_units(reserves.reserve1, token1_decimals),
        total_supply: format_ether(total_supply),
        account_balance,
    })
}

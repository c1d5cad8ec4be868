use alloy_primitives::Address;
use serde::Serialize;

use crate::core::format::format_units;
use crate::detail::contracts::IERC20;
use crate::detail::reader::ContractReader;
use crate::error::RpcError;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenData {
    pub address: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: String,
}

pub async fn token_data(reader: &ContractReader, token: Address) -> Result<TokenData, RpcError> {
    let (name, symbol, decimals, total_supply) = futures::try_join!(
        reader.call(token, &IERC20::nameCall {}),
        reader.call(token, &IERC20::symbolCall {}),
        reader.call(token, &IERC20::decimalsCall {}),
        reader.call(token, &IERC20::totalSupplyCall {}),
    )?;
    Ok(TokenData {
        address: format!("{:#x}", token),
        name,
        symbol,
        decimals,
        total_supply: format_units(total_supply, decimals),
    })
}

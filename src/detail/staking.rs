use alloy_primitives::{Address, B256, U256};
use serde::Serialize;

use crate::core::format::{format_ether, to_precision, units_to_f64};
use crate::detail::contracts::{IOwnable, IStakingPool, IStakingPoolActions, IERC20};
use crate::detail::reader::ContractReader;
use crate::error::RpcError;

/// Configuration and holdings of one staking pool
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StakingPoolInfo {
    pub id: String,
    pub tax: u64,
    pub token_a: String,
    pub token_b: String,
    #[serde(rename = "tokenAAPY")]
    pub token_a_apy: u64,
    #[serde(rename = "tokenBAPY")]
    pub token_b_apy: u64,
    pub owner: String,
    pub token_a_balance: f64,
    pub token_b_balance: f64,
    pub token_a_symbol: String,
    pub token_b_symbol: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StakeReward {
    /// Pool the stake transaction was sent to
    pub pool: String,
    pub reward: U256,
}

pub async fn staking_pool_info(reader: &ContractReader, pool: Address) -> Result<StakingPoolInfo, RpcError> {
    let (tax, token_a, token_b, token_a_apy, token_b_apy, owner) = futures::try_join!(
        reader.call(pool, &IStakingPool::stakingPoolTaxCall {}),
        reader.call(pool, &IStakingPool::tokenACall {}),
        reader.call(pool, &IStakingPool::tokenBCall {}),
        reader.call(pool, &IStakingPool::tokenAAPYCall {}),
        reader.call(pool, &IStakingPool::tokenBAPYCall {}),
        reader.call(pool, &IOwnable::ownerCall {}),
    )?;

    // Zero address as token A stands for the native coin
    let (token_a_symbol, token_a_balance) = if token_a == Address::ZERO {
        let wei = reader.native_balance(pool).await?;
        (reader.chain().symbol.clone(), units_to_f64(wei, 18))
    } else {
        token_symbol_and_balance(reader, token_a, pool).await?
    };
    let (token_b_symbol, token_b_balance) = token_symbol_and_balance(reader, token_b, pool).await?;

    Ok(StakingPoolInfo {
        id: format!("{:#x}", pool),
        tax: tax.saturating_to(),
        token_a: format!("{:#x}", token_a),
        token_b: format!("{:#x}", token_b),
        token_a_apy: token_a_apy.saturating_to(),
        token_b_apy: token_b_apy.saturating_to(),
        owner: format!("{:#x}", owner),
        token_a_balance: to_precision(token_a_balance, 4),
        token_b_balance: to_precision(token_b_balance, 4),
        token_a_symbol,
        token_b_symbol,
    })
}

async fn token_symbol_and_balance(
    reader: &ContractReader,
    token: Address,
    holder: Address,
) -> Result<(String, f64), RpcError> {
    let balance_of = IERC20::balanceOfCall { account: holder };
    let (symbol, decimals, balance) = futures::try_join!(
        reader.call(token, &IERC20::symbolCall {}),
        reader.call(token, &IERC20::decimalsCall {}),
        reader.call(token, &balance_of),
    )?;
    Ok((symbol, units_to_f64(balance, decimals)))
}

/// Resolve the pool a stake was made in from its transaction, then read the
/// pending reward of the stake
pub async fn stake_event_pool_and_reward(
    reader: &ContractReader,
    tx_hash: B256,
    stake_id: B256,
) -> Result<StakeReward, RpcError> {
    let tx = reader
        .transaction_by_hash(tx_hash)
        .await?
        .ok_or_else(|| RpcError::Malformed(format!("unknown transaction {}", tx_hash)))?;
    let pool = tx
        .to
        .ok_or_else(|| RpcError::Malformed(format!("transaction {} created a contract", tx_hash)))?;
    let reward = reader
        .call(pool, &IStakingPool::calculateRewardCall { stakeId: stake_id })
        .await?;
    Ok(StakeReward {
        pool: format!("{:#x}", pool),
        reward,
    })
}

/// Native-coin fee charged for deploying a new staking pool, in ether
pub async fn staking_deployment_fee(reader: &ContractReader, actions: Address) -> Result<String, RpcError> {
    let fee = reader.call(actions, &IStakingPoolActions::deploymentFeeCall {}).await?;
    Ok(format_ether(fee))
}

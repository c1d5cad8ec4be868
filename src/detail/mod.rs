//! On-chain detail hooks
//!
//! Composite contract reads that enrich a single aggregator item (a pool, a
//! sale, a wallet). Each read is redone in full when its key changes; a
//! [`DetailHook`] holds the last-known result for one consumer.

pub mod contracts;
mod dex;
mod hook;
mod launchpad;
mod multisig;
mod reader;
mod staking;
mod token;

pub use dex::{pair_details, PairDetails};
pub use hook::{DetailHook, HookKey};
pub use launchpad::{sale_contribution, sale_creator_fees, sale_raised, SaleContribution, SaleCreatorFees, SaleRaised};
pub use multisig::{multisig_wallet, MultisigTransaction, MultisigWallet};
pub use reader::{ChainReaders, ContractReader, InflightCalls};
pub use staking::{
    stake_event_pool_and_reward, staking_deployment_fee, staking_pool_info, StakeReward, StakingPoolInfo,
};
pub use token::{token_data, TokenData};

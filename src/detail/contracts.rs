//! Contract surfaces read by the detail hooks
//!
//! Narrow integer returns (`uint8` tax, `uint112` reserves, ...) are declared
//! as `uint256`: the selector only depends on the inputs and a padded word
//! decodes the same either way.

use alloy_sol_types::sol;

sol! {
    interface IERC20 {
        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function totalSupply() external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
    }
}

sol! {
    interface IOwnable {
        function owner() external view returns (address);
    }
}

sol! {
    interface IStakingPool {
        function stakingPoolTax() external view returns (uint256);
        function tokenA() external view returns (address);
        function tokenB() external view returns (address);
        function tokenAAPY() external view returns (uint256);
        function tokenBAPY() external view returns (uint256);
        function calculateReward(bytes32 stakeId) external view returns (uint256);
    }
}

sol! {
    interface IStakingPoolActions {
        function deploymentFee() external view returns (uint256);
    }
}

sol! {
    interface IPair {
        function token0() external view returns (address);
        function token1() external view returns (address);
        function getReserves() external view returns (uint256 reserve0, uint256 reserve1, uint32 blockTimestampLast);
        function totalSupply() external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
    }
}

sol! {
    interface ITokenSaleCreator {
        function getTotalEtherRaisedForSale(bytes32 saleId) external view returns (uint256);
        function amountContributed(bytes32 saleId, address account) external view returns (uint256);
        function balance(bytes32 saleId, address account) external view returns (uint256);
        function saleCreationFee() external view returns (uint256);
        function feePercentage() external view returns (uint256);
    }
}

sol! {
    interface IMultiSig {
        struct Transaction {
            address to;
            uint256 index;
            address initiator;
            uint256 confirmations;
            bool executed;
            bytes data;
            uint256 value;
        }

        function allTransactions() external view returns (Transaction[] memory);
    }
}

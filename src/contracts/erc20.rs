//! ERC20 token contract ABI definition
//!
//! Uses alloy's sol! macro to generate type-safe bindings for the USDC
//! contracts the bridge reads and moves balances on.

use alloy::sol;

sol! {
    /// Minimal ERC20 interface: the reads the orchestrator validates against
    /// and the two transfer shapes it submits.
    #[sol(rpc)]
    contract ERC20 {
        function decimals() external view returns (uint8);

        function balanceOf(address account) external view returns (uint256);

        function allowance(address owner, address spender) external view returns (uint256);

        /// Pool-to-user credit on the destination chain
        function transfer(address to, uint256 amount) external returns (bool);

        /// User-to-pool debit on the source chain (spends the user's
        /// pre-approved allowance to the pool) and the compensating reversal
        function transferFrom(address from, address to, uint256 amount) external returns (bool);
    }
}

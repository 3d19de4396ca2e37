//! ERC-20 transaction builders.

use alloy_primitives::{Address, TxKind, U256};
use alloy_rpc_types_eth::{TransactionInput, TransactionRequest};
use alloy_sol_types::{SolCall, sol};

sol! {
    interface IERC20 {
        function transfer(address to, uint256 amount) external returns (bool);
        function approve(address spender, uint256 amount) external returns (bool);
    }
}

/// `approve(spender, amount)` on `token`.
pub fn approve(token: Address, spender: Address, amount: U256) -> TransactionRequest {
    call(token, IERC20::approveCall { spender, amount }.abi_encode())
}

/// `transfer(to, amount)` on `token`.
pub fn transfer(token: Address, to: Address, amount: U256) -> TransactionRequest {
    call(token, IERC20::transferCall { to, amount }.abi_encode())
}

fn call(token: Address, calldata: Vec<u8>) -> TransactionRequest {
    TransactionRequest {
        to: Some(TxKind::Call(token)),
        input: TransactionInput::both(calldata.into()),
        ..Default::default()
    }
}

#![no_main]

use arbitrary::Arbitrary;
use creator_coin_core::Address;
use creator_coin_ledger::{Ledger, Role};
use libfuzzer_sys::fuzz_target;

const CURVE: &str = "fuzz-curve";

#[derive(Debug, Arbitrary)]
enum Op {
    BridgeIn { caller: u8, to: u8, amount: u128, sidechain: u128 },
    Transfer { from: u8, to: u8, amount: u128 },
    Approve { owner: u8, spender: u8, amount: u128 },
    TransferFrom { spender: u8, from: u8, to: u8, amount: u128 },
    Burn { holder: u8, amount: u128 },
    Grant { caller: u8, account: u8, minter: bool },
    Revoke { caller: u8, account: u8, minter: bool },
    SetBridge { caller: u8, bridge: u8 },
}

fn account(i: u8) -> Address {
    // Index 0 is the deployer; keep the set small so calls collide
    Address::new([i % 4; 20])
}

fn role(minter: bool) -> Role {
    if minter {
        Role::Minter
    } else {
        Role::Admin
    }
}

fuzz_target!(|ops: Vec<Op>| {
    let mut ledger = Ledger::default();
    let deployer = account(0);
    ledger.deploy_factory(deployer).unwrap();
    let bridge = ledger.deploy_bridge(deployer).unwrap();
    ledger.set_bridge(deployer, bridge).unwrap();
    let token = ledger
        .deploy_creator_coin(deployer, CURVE, "fuzz", "fzz")
        .unwrap();

    for op in ops {
        let logs_before = ledger.logs().len();
        let result = match op {
            Op::BridgeIn { caller, to, amount, sidechain } => {
                ledger.bridge_to_mainnet(account(caller), CURVE, account(to), amount, sidechain)
            }
            Op::Transfer { from, to, amount } => {
                ledger.transfer(account(from), &token, account(to), amount)
            }
            Op::Approve { owner, spender, amount } => {
                ledger.approve(account(owner), &token, account(spender), amount)
            }
            Op::TransferFrom { spender, from, to, amount } => {
                ledger.transfer_from(account(spender), &token, account(from), account(to), amount)
            }
            Op::Burn { holder, amount } => ledger.burn(account(holder), &token, amount),
            Op::Grant { caller, account: a, minter } => {
                ledger.grant_role(account(caller), role(minter), account(a))
            }
            Op::Revoke { caller, account: a, minter } => {
                ledger.revoke_role(account(caller), role(minter), account(a))
            }
            Op::SetBridge { caller, bridge: b } => {
                let target = if b % 2 == 0 { bridge } else { account(b) };
                ledger.set_bridge(account(caller), target)
            }
        };
        if result.is_err() {
            assert_eq!(ledger.logs().len(), logs_before);
        }

        let coin = ledger.coin(&token).unwrap();
        let sum: u128 = coin.holders().map(|(_, balance)| *balance).sum();
        assert_eq!(sum, coin.total_supply());
    }
});

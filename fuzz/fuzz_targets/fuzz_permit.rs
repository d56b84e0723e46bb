#![no_main]

use arbitrary::Arbitrary;
use creator_coin_core::{
    verify_permit, Address, ChainId, Eip712Domain, Permit, RecoverableSignature,
};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    name: String,
    chain_id: u64,
    contract: [u8; 20],
    owner: [u8; 20],
    spender: [u8; 20],
    value: u128,
    nonce: u64,
    deadline: u64,
    v: u8,
    r: [u8; 32],
    s: [u8; 32],
}

fuzz_target!(|input: Input| {
    let domain = Eip712Domain::new(
        input.name,
        "1",
        ChainId::new(input.chain_id),
        Address::new(input.contract),
    );
    let permit = Permit {
        owner: Address::new(input.owner),
        spender: Address::new(input.spender),
        value: input.value,
        nonce: input.nonce,
        deadline: input.deadline,
    };
    let sig = RecoverableSignature::new(input.v, input.r, input.s);

    // Arbitrary signatures either fail or recover some signer, never panic
    let signer = verify_permit(&domain, &permit, &sig);
    assert_eq!(signer, verify_permit(&domain, &permit, &sig));

    // A different nonce is a different message
    if let (Some(signer), Some(next)) = (signer, input.nonce.checked_add(1)) {
        let bumped = Permit { nonce: next, ..permit };
        assert_ne!(verify_permit(&domain, &bumped, &sig), Some(signer));
    }
});

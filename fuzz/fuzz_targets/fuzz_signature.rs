#![no_main]

use creator_coin_core::{keccak256, recover_signer, RecoverableSignature};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 65 {
        return;
    }

    // Malformed v, r or s must be rejected without panicking
    if let Ok(sig) = RecoverableSignature::from_bytes(&data[..65]) {
        assert_eq!(sig.to_bytes().as_slice(), &data[..65]);

        let digest = keccak256(&data[65..]);
        let first = recover_signer(&digest, &sig);
        // Recovery is deterministic
        assert_eq!(first, recover_signer(&digest, &sig));
    }
});

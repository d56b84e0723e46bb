#![no_main]

use creator_coin_core::{Address, Hash256, RecoverableSignature};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(address) = s.parse::<Address>() {
        assert_eq!(address.to_checksum().parse::<Address>().unwrap(), address);
        assert_eq!(address.to_hex().parse::<Address>().unwrap(), address);
    }

    if let Ok(hash) = s.parse::<Hash256>() {
        assert_eq!(hash.to_hex().parse::<Hash256>().unwrap(), hash);
    }

    if let Ok(sig) = RecoverableSignature::from_hex(s) {
        assert_eq!(RecoverableSignature::from_hex(&sig.to_hex()).unwrap(), sig);
    }
});

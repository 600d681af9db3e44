#![no_main]

use libfuzzer_sys::fuzz_target;
use sessionstore::config::StoreConfig;

fuzz_target!(|data: &[u8]| {
    if let Ok(config) = serde_json::from_slice::<StoreConfig>(data) {
        let _ = config.validate();
    }
});

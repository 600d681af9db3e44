#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sessionstore_codec::{CodecPipeline, KeyPair};

#[derive(Arbitrary, Debug)]
struct Input {
    name: String,
    token: String,
    encrypted: bool,
}

fuzz_target!(|input: Input| {
    let mut pair = KeyPair::new(b"fuzz-hash-key".to_vec());
    if input.encrypted {
        pair = pair.with_block_key(b"fuzz-block-key".to_vec());
    }
    let Ok(pipeline) = CodecPipeline::from_pairs(&[pair]) else {
        return;
    };
    // Anything not produced by encode must be rejected without panicking.
    assert!(pipeline.decode::<String>(&input.name, &input.token).is_err());
});

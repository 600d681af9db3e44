use super::*;
use proptest::prelude::*;
use std::collections::HashMap;

fn pair(key: &str) -> KeyPair {
    KeyPair::new(key.as_bytes().to_vec())
}

/// Codec without limits support, to check the pipeline skips it.
struct PlainCodec;

impl Codec for PlainCodec {
    fn encode(&self, name: &str, value: &[u8]) -> Result<String, CodecError> {
        Ok(format!("{}:{}", name, String::from_utf8_lossy(value)))
    }

    fn decode(&self, name: &str, token: &str) -> Result<Vec<u8>, CodecError> {
        token
            .strip_prefix(&format!("{}:", name))
            .map(|rest| rest.as_bytes().to_vec())
            .ok_or(CodecError::MacInvalid)
    }
}

#[test]
fn test_from_pairs_requires_a_key() {
    assert!(matches!(
        CodecPipeline::from_pairs(&[]),
        Err(CodecError::InvalidKey(_))
    ));
}

#[test]
fn test_roundtrip_map() {
    let pipeline = CodecPipeline::from_pairs(&[pair("k1")]).unwrap();
    let mut values = HashMap::new();
    values.insert("counter".to_string(), serde_json::json!(1));
    let token = pipeline.encode("s", &values).unwrap();
    let decoded: HashMap<String, serde_json::Value> = pipeline.decode("s", &token).unwrap();
    assert_eq!(decoded, values);
}

#[test]
fn test_key_rotation_accepts_old_tokens() {
    let old = CodecPipeline::from_pairs(&[pair("old-key")]).unwrap();
    let token = old.encode("s", "session-id").unwrap();

    let rotated = CodecPipeline::from_pairs(&[pair("new-key"), pair("old-key")]).unwrap();
    let id: String = rotated.decode("s", &token).unwrap();
    assert_eq!(id, "session-id");
}

#[test]
fn test_encode_uses_first_key() {
    let rotated = CodecPipeline::from_pairs(&[pair("new-key"), pair("old-key")]).unwrap();
    let token = rotated.encode("s", "session-id").unwrap();

    let new_only = CodecPipeline::from_pairs(&[pair("new-key")]).unwrap();
    let old_only = CodecPipeline::from_pairs(&[pair("old-key")]).unwrap();
    assert!(new_only.decode::<String>("s", &token).is_ok());
    assert!(old_only.decode::<String>("s", &token).is_err());
}

#[test]
fn test_single_codec_error_is_returned_directly() {
    let pipeline = CodecPipeline::from_pairs(&[pair("k1")]).unwrap();
    let token = CodecPipeline::from_pairs(&[pair("k2")])
        .unwrap()
        .encode("s", "x")
        .unwrap();
    assert!(matches!(
        pipeline.decode::<String>("s", &token),
        Err(CodecError::MacInvalid)
    ));
}

#[test]
fn test_all_codecs_failing_reports_each() {
    let pipeline = CodecPipeline::from_pairs(&[pair("k1"), pair("k2")]).unwrap();
    let token = CodecPipeline::from_pairs(&[pair("k3")])
        .unwrap()
        .encode("s", "x")
        .unwrap();
    match pipeline.decode::<String>("s", &token) {
        Err(CodecError::Multi(errors)) => assert_eq!(errors.len(), 2),
        other => panic!("expected Multi error, got {:?}", other),
    }
}

#[test]
fn test_wrong_type_is_decode_error() {
    let pipeline = CodecPipeline::from_pairs(&[pair("k1")]).unwrap();
    let token = pipeline.encode("s", "not a number").unwrap();
    assert!(matches!(
        pipeline.decode::<i64>("s", &token),
        Err(CodecError::Decode(_))
    ));
}

#[test]
fn test_empty_pipeline_fails_both_ways() {
    let pipeline = CodecPipeline::new(Vec::new());
    assert!(pipeline.is_empty());
    assert!(matches!(
        pipeline.encode("s", "x"),
        Err(CodecError::Encode(_))
    ));
    assert!(matches!(
        pipeline.decode::<String>("s", "anything"),
        Err(CodecError::Decode(_))
    ));
}

#[test]
fn test_max_length_raise_allows_large_value() {
    let pipeline = CodecPipeline::from_pairs(&[pair("k1")]).unwrap();
    let big = vec![0u8; 4096 * 2];
    assert!(matches!(
        pipeline.encode("s", &big),
        Err(CodecError::TooLong { .. })
    ));

    pipeline.set_max_length(4096 * 8);
    let token = pipeline.encode("s", &big).unwrap();
    let decoded: Vec<u8> = pipeline.decode("s", &token).unwrap();
    assert_eq!(decoded.len(), big.len());
}

#[test]
fn test_limits_skip_codecs_without_support() {
    let secure = SecureCodec::new(&pair("k1")).unwrap();
    let pipeline = CodecPipeline::new(vec![
        Box::new(PlainCodec) as Box<dyn Codec>,
        Box::new(secure),
    ]);
    assert_eq!(pipeline.len(), 2);

    pipeline.set_max_length(10);

    // Plain codec encodes regardless of the limit.
    let token = pipeline.encode("s", "a value well over ten bytes").unwrap();
    assert!(token.starts_with("s:"));

    // The secure codec picked up the limit.
    let signed = CodecPipeline::from_pairs(&[pair("k1")])
        .unwrap()
        .encode("s", "x")
        .unwrap();
    match pipeline.decode::<String>("s", &signed) {
        Err(CodecError::Multi(errors)) => {
            assert!(matches!(errors[0], CodecError::MacInvalid));
            assert!(matches!(errors[1], CodecError::TooLong { max: 10, .. }));
        }
        other => panic!("expected Multi error, got {:?}", other),
    }
}

#[test]
fn test_debug_does_not_leak_keys() {
    let pipeline = CodecPipeline::from_pairs(&[pair("very-secret-key")]).unwrap();
    let debug = format!("{:?}", pipeline);
    assert!(!debug.contains("very-secret-key"));
}

proptest! {
    #[test]
    fn prop_roundtrip_strings(name in "[a-z]{1,12}", value in ".{0,200}") {
        let pipeline = CodecPipeline::from_pairs(&[pair("prop-key")]).unwrap();
        let token = pipeline.encode(&name, &value).unwrap();
        let decoded: String = pipeline.decode(&name, &token).unwrap();
        prop_assert_eq!(decoded, value);
    }

    #[test]
    fn prop_foreign_tokens_rejected(token in "[A-Za-z0-9_-]{0,300}") {
        let pipeline = CodecPipeline::from_pairs(&[pair("prop-key")]).unwrap();
        prop_assert!(pipeline.decode::<String>("s", &token).is_err());
    }
}

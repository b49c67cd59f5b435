//! Safe-set request body decoding.
//!
//! Accepts exactly `{"kv": {"key": "<base64>", "value": "<base64>"}}`. The
//! schema is closed: any field other than `kv` at the top level, or other
//! than `key`/`value` inside it, is a shape error rather than being ignored.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::{DecodeError, Engine};
use serde::Deserialize;

use crate::error::{CodecError, CodecResult};
use crate::types::KeyValue;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SafeSetBody {
    #[serde(default)]
    kv: Option<KvBody>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct KvBody {
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    value: Option<String>,
}

/// Decode a raw request body into a [`KeyValue`].
///
/// `key` is decoded before `value`, so a body where both are malformed
/// reports the offset within `key`. A missing `value` is an empty value.
pub fn decode(raw: &[u8]) -> CodecResult<KeyValue> {
    let body: SafeSetBody =
        serde_json::from_slice(raw).map_err(|_| CodecError::IncorrectPayload)?;
    let kv = body.kv.unwrap_or_default();

    let key = kv.key.as_deref().map(decode_base64).transpose()?;
    let value = kv.value.as_deref().map(decode_base64).transpose()?;

    let key = match key {
        Some(key) if !key.is_empty() => key,
        _ => return Err(CodecError::InvalidKey),
    };

    Ok(KeyValue {
        key,
        value: value.unwrap_or_default(),
    })
}

/// Strict standard-alphabet base64 with required padding.
pub fn decode_base64(input: &str) -> CodecResult<Vec<u8>> {
    BASE64.decode(input).map_err(|err| CodecError::InvalidBase64 {
        offset: corrupt_offset(input, &err),
    })
}

/// Byte offset reported for a decode failure.
///
/// Illegal symbols report their own position. Length and padding failures
/// report the start of the incomplete trailing quantum, or the first `=` when
/// the input length is a whole number of quanta.
fn corrupt_offset(input: &str, err: &DecodeError) -> usize {
    match *err {
        DecodeError::InvalidByte(offset, _) | DecodeError::InvalidLastSymbol(offset, _) => offset,
        DecodeError::InvalidLength(_) | DecodeError::InvalidPadding => {
            let len = input.len();
            if len % 4 != 0 {
                len - len % 4
            } else {
                input.find('=').unwrap_or(len)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn b64(s: &str) -> String {
        BASE64.encode(s)
    }

    #[test]
    fn decodes_key_and_value() {
        let body = format!(
            r#"{{"kv": {{"key": "{}", "value": "{}"}}}}"#,
            b64("safeSetKey1"),
            b64("safeSetValue1")
        );
        let kv = decode(body.as_bytes()).unwrap();
        assert_eq!(kv, KeyValue::new("safeSetKey1", "safeSetValue1"));
    }

    #[test]
    fn missing_value_is_empty() {
        let body = format!(r#"{{"kv": {{"key": "{}"}}}}"#, b64("safeSetKey1"));
        let kv = decode(body.as_bytes()).unwrap();
        assert_eq!(kv.key, b"safeSetKey1".to_vec());
        assert!(kv.value.is_empty());
    }

    #[test]
    fn null_value_is_empty() {
        let body = format!(r#"{{"kv": {{"key": "{}", "value": null}}}}"#, b64("k"));
        assert!(decode(body.as_bytes()).unwrap().value.is_empty());
    }

    #[test]
    fn unknown_top_level_field() {
        let body = format!(
            r#"{{"data": {{"key": "{}", "value": "{}"}}}}"#,
            b64("safeSetKey1"),
            b64("safeSetValue1")
        );
        assert_eq!(decode(body.as_bytes()), Err(CodecError::IncorrectPayload));
    }

    #[test]
    fn extra_top_level_field_next_to_kv() {
        let body = format!(r#"{{"kv": {{"key": "{}"}}, "extra": 1}}"#, b64("k"));
        assert_eq!(decode(body.as_bytes()), Err(CodecError::IncorrectPayload));
    }

    #[test]
    fn unknown_field_inside_kv() {
        let body = format!(r#"{{"kv": {{"key": "{}", "ttl": 3}}}}"#, b64("k"));
        assert_eq!(decode(body.as_bytes()), Err(CodecError::IncorrectPayload));
    }

    #[test]
    fn wrong_types_and_garbage() {
        for body in [
            r#"{"kv": {"key": 12}}"#,
            r#"{"kv": "a2V5"}"#,
            r#"["kv"]"#,
            "not json",
            "",
        ] {
            assert_eq!(
                decode(body.as_bytes()),
                Err(CodecError::IncorrectPayload),
                "body: {body}"
            );
        }
    }

    #[test]
    fn plain_text_key_reports_offset() {
        let err = decode(br#"{"kv": {"key": "safeSetKey1", "value": "safeSetValue1"}}"#)
            .unwrap_err();
        assert_eq!(err, CodecError::InvalidBase64 { offset: 8 });
        assert_eq!(err.to_string(), "illegal base64 data at input byte 8");
    }

    #[test]
    fn plain_text_value_reports_offset() {
        let body = format!(r#"{{"kv": {{"key": "{}", "value": "safeSetValue1"}}}}"#, b64("k"));
        assert_eq!(
            decode(body.as_bytes()),
            Err(CodecError::InvalidBase64 { offset: 12 })
        );
    }

    #[test]
    fn illegal_symbol_reports_its_position() {
        assert_eq!(
            decode_base64("ab$d"),
            Err(CodecError::InvalidBase64 { offset: 2 })
        );
    }

    #[test]
    fn offsets_are_deterministic() {
        let a = decode_base64("safeSetKey1").unwrap_err();
        let b = decode_base64("safeSetKey1").unwrap_err();
        assert_eq!(a, b);
    }

    #[test]
    fn missing_key() {
        assert_eq!(decode(br#"{"kv": {} }"#), Err(CodecError::InvalidKey));
        assert_eq!(decode(br#"{}"#), Err(CodecError::InvalidKey));
        assert_eq!(decode(br#"{"kv": null}"#), Err(CodecError::InvalidKey));
    }

    #[test]
    fn missing_key_with_value() {
        let body = format!(r#"{{"kv": {{"value": "{}"}}}}"#, b64("v"));
        assert_eq!(decode(body.as_bytes()), Err(CodecError::InvalidKey));
    }

    #[test]
    fn empty_key() {
        assert_eq!(
            decode(br#"{"kv": {"key": "", "value": "dg=="}}"#),
            Err(CodecError::InvalidKey)
        );
    }
}

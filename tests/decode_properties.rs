//! Property tests for the resilient decoder.

use proptest::prelude::*;
use reply_cabin_lib::llm::decode::{decode, DECODE_ERROR_MESSAGE};
use serde_json::{json, Map, Value};

/// Small JSON objects with string, number, bool and nested-object fields.
fn object_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        any::<bool>().prop_map(Value::from),
        any::<i32>().prop_map(Value::from),
        "[a-z0-9 \u{4e00}-\u{4e2f}]{0,12}".prop_map(Value::from),
    ];
    let field = leaf.prop_recursive(2, 8, 4, |inner| {
        prop::collection::btree_map("[a-z_]{1,8}", inner, 0..4)
            .prop_map(|m| Value::Object(m.into_iter().collect::<Map<String, Value>>()))
    });
    prop::collection::btree_map("[a-z_]{1,8}", field, 0..5)
        .prop_map(|m| Value::Object(m.into_iter().collect()))
}

proptest! {
    #[test]
    fn valid_json_decodes_like_serde(value in object_strategy()) {
        let text = serde_json::to_string(&value).unwrap();
        prop_assert_eq!(decode(&text).unwrap(), value);
    }

    #[test]
    fn fenced_object_decodes(value in object_strategy()) {
        let text = format!("```json\n{}\n```", serde_json::to_string_pretty(&value).unwrap());
        prop_assert_eq!(decode(&text).unwrap(), value);
    }

    #[test]
    fn object_in_brace_free_prose_decodes(
        value in object_strategy(),
        prefix in "[a-zA-Z .:\n]{0,30}",
        suffix in "[a-zA-Z .!\n]{0,30}",
    ) {
        let text = format!("{}{}{}", prefix, serde_json::to_string(&value).unwrap(), suffix);
        prop_assert_eq!(decode(&text).unwrap(), value);
    }

    #[test]
    fn brace_free_text_is_a_decode_error(text in "[a-zA-Z .,!?]{0,60}") {
        // Strings like "true" or "1" are valid JSON on their own.
        prop_assume!(serde_json::from_str::<Value>(&text).is_err());
        let err = decode(&text).unwrap_err();
        prop_assert_eq!(
            err.to_sentinel(),
            json!({"error": DECODE_ERROR_MESSAGE, "raw_content": text})
        );
    }
}

#[test]
fn empty_and_plain_text_keep_raw_content() {
    for raw in ["", "not json at all"] {
        let err = decode(raw).unwrap_err();
        assert_eq!(err.raw_content, raw);
    }
}

//! 共有リンク(URLフラグメント)へのプリセット埋め込みと復元。
//! 形式: `<ページURL>#<URLエンコードしたID>/<URLセーフbase64ペイロード>`

use base64::Engine;
use url::Url;

use crate::utils::error::{PresetError, PresetResult};
use crate::utils::preset_data::PresetData;
use crate::utils::serializer;

const B64: base64::engine::GeneralPurpose = base64::engine::general_purpose::STANDARD;

fn to_base64(raw: &str) -> String {
    B64.encode(raw).replace('/', "_").replace('+', "-")
}

fn from_base64(encoded: &str) -> PresetResult<String> {
    let standard = encoded.replace('_', "/").replace('-', "+");
    let bytes = B64
        .decode(standard)
        .map_err(|e| PresetError::MalformedLink(format!("invalid base64 payload: {e}")))?;
    String::from_utf8(bytes)
        .map_err(|e| PresetError::MalformedLink(format!("payload is not UTF-8: {e}")))
}

// ブラウザの encodeURIComponent と同じく !'()* はそのまま残す。
const UNESCAPED_MARKS: [(&str, &str); 5] = [
    ("%21", "!"),
    ("%27", "'"),
    ("%28", "("),
    ("%29", ")"),
    ("%2A", "*"),
];

fn encode_id_segment(preset_id: &str) -> String {
    UNESCAPED_MARKS
        .iter()
        .fold(urlencoding::encode(preset_id).into_owned(), |encoded, (escaped, mark)| {
            encoded.replace(escaped, mark)
        })
}

/// 共有リンクを組み立てる。ページURLの既存フラグメントは捨てる。
pub fn to_url(page_url: &Url, preset: &PresetData) -> PresetResult<String> {
    let payload = to_base64(&serializer::serialize_single(preset)?);

    let mut base = page_url.clone();
    base.set_fragment(None);

    let id_segment = encode_id_segment(preset.preset_id());
    Ok(format!("{base}#{id_segment}/{payload}"))
}

/// フラグメントのペイロード部分を取り出す。IDセグメントは表示用なので読まない。
fn payload_segment(href: &str) -> Option<&str> {
    let (_, fragment) = href.split_once('#')?;
    let fragment = fragment.split('#').next().unwrap_or_default();
    fragment.split('/').nth(1).filter(|payload| !payload.is_empty())
}

/// リンクを復元する。埋め込みがなければ `Ok(None)`。
pub fn decode_url(href: &str) -> PresetResult<Option<PresetData>> {
    let Some(payload) = payload_segment(href) else {
        return Ok(None);
    };

    let preset_string = from_base64(payload)?;
    let preset = serializer::deserialize_single(&preset_string).map_err(|e| {
        log::debug!("undecodable share payload: {preset_string}");
        PresetError::MalformedLink(e.to_string())
    })?;
    Ok(Some(preset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::preset_data::{PresetValue, PresetValues};

    fn page_url() -> Url {
        Url::parse("https://example.com/clock/#old-fragment").expect("valid url")
    }

    fn ocean_blue() -> PresetData {
        let mut values = PresetValues::new();
        values.insert("bg", "blue");
        PresetData::new("clock", "ocean-blue", values).expect("valid preset")
    }

    #[test]
    fn url_safe_base64_swaps_slash_and_plus() {
        assert_eq!(B64.encode("ab?"), "YWI/");
        assert_eq!(to_base64("ab?"), "YWI_");
        assert_eq!(B64.encode("ab>"), "YWI+");
        assert_eq!(to_base64("ab>"), "YWI-");
        assert_eq!(from_base64("YWI_").expect("decode"), "ab?");
    }

    #[test]
    fn link_round_trip_restores_record() {
        let preset = ocean_blue();
        let link = to_url(&page_url(), &preset).expect("link");
        assert!(link.starts_with("https://example.com/clock/#ocean-blue/"));
        assert!(!link.contains("old-fragment"));

        let restored = decode_url(&link).expect("decode").expect("payload present");
        assert_eq!(restored.subapp_id(), "clock");
        assert_eq!(restored.preset_id(), "ocean-blue");
        assert_eq!(
            restored.preset_values().get("bg"),
            Some(&PresetValue::from("blue"))
        );
    }

    #[test]
    fn id_segment_is_percent_encoded() {
        let preset = PresetData::new("clock", "café au lait", PresetValues::new()).expect("valid");
        let link = to_url(&page_url(), &preset).expect("link");
        assert!(link.contains("#caf%C3%A9%20au%20lait/"));
        let restored = decode_url(&link).expect("decode").expect("payload present");
        assert_eq!(restored.preset_id(), "café au lait");
    }

    #[test]
    fn id_segment_keeps_uri_component_marks() {
        assert_eq!(encode_id_segment("wow!(it's)*"), "wow!(it's)*");
        assert_eq!(encode_id_segment("a/b?c"), "a%2Fb%3Fc");

        let preset = PresetData::new("clock", "wow!(it's)*", PresetValues::new()).expect("valid");
        let link = to_url(&page_url(), &preset).expect("link");
        assert!(link.contains("#wow!(it's)*/"));
        let restored = decode_url(&link).expect("decode").expect("payload present");
        assert_eq!(restored.preset_id(), "wow!(it's)*");
    }

    #[test]
    fn missing_fragment_or_payload_means_nothing_to_import() {
        assert!(decode_url("https://example.com/clock/").expect("ok").is_none());
        assert!(decode_url("https://example.com/clock/#").expect("ok").is_none());
        assert!(decode_url("https://example.com/clock/#ocean-blue").expect("ok").is_none());
        assert!(decode_url("https://example.com/clock/#ocean-blue/").expect("ok").is_none());
    }

    #[test]
    fn corrupted_payload_is_a_malformed_link() {
        let error = decode_url("https://example.com/#ocean-blue/%%%not-base64")
            .expect_err("corrupt payload");
        assert!(matches!(error, PresetError::MalformedLink(_)));

        let not_a_preset = to_base64(r#"{"hello":"world"}"#);
        let error = decode_url(&format!("https://example.com/#x/{not_a_preset}"))
            .expect_err("wrong shape");
        assert!(matches!(error, PresetError::MalformedLink(_)));
    }
}

//! 永続化・共有リンクで受け渡すプリセットの素のレコード。
//! `PresetData` は検証付きのコンストラクタかデシリアライズ経由でしか作れない。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::utils::error::{PresetError, PresetResult};

/// オプション値。`null` は表現できず、未設定はキーの不在で表す。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PresetValue {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl PresetValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// 空文字・false・0 を偽として扱う。
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Bool(value) => *value,
            Self::Text(text) => !text.is_empty(),
            Self::Number(number) => number.as_f64().is_some_and(|value| value != 0.0),
        }
    }
}

impl fmt::Display for PresetValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Number(number) => write!(f, "{number}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<&str> for PresetValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PresetValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for PresetValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for PresetValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

/// オプションID → 値 のマップ。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PresetValues(BTreeMap<String, PresetValue>);

impl PresetValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, option_id: &str) -> Option<&PresetValue> {
        self.0.get(option_id)
    }

    pub fn insert(&mut self, option_id: impl Into<String>, value: impl Into<PresetValue>) {
        self.0.insert(option_id.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PresetValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn validate(&self) -> PresetResult<()> {
        if self.0.keys().any(|option_id| option_id.is_empty()) {
            return Err(PresetError::MalformedRecord(
                "preset_values contains an empty option id".to_string(),
            ));
        }
        Ok(())
    }
}

impl<K, V> FromIterator<(K, V)> for PresetValues
where
    K: Into<String>,
    V: Into<PresetValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPresetData {
    subapp_id: Option<String>,
    preset_id: Option<String>,
    preset_values: Option<PresetValues>,
}

/// 1件分のプリセットレコード。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPresetData")]
pub struct PresetData {
    subapp_id: String,
    preset_id: String,
    preset_values: PresetValues,
}

impl PresetData {
    pub fn new(
        subapp_id: impl Into<String>,
        preset_id: impl Into<String>,
        preset_values: PresetValues,
    ) -> PresetResult<Self> {
        let subapp_id = subapp_id.into();
        let preset_id = preset_id.into();

        if subapp_id.trim().is_empty() {
            return Err(PresetError::MalformedRecord(
                "subapp_id must not be empty".to_string(),
            ));
        }
        if preset_id.trim().is_empty() {
            return Err(PresetError::MalformedRecord(
                "preset_id must not be empty".to_string(),
            ));
        }
        preset_values.validate()?;

        Ok(Self {
            subapp_id,
            preset_id,
            preset_values,
        })
    }

    pub fn subapp_id(&self) -> &str {
        &self.subapp_id
    }

    pub fn preset_id(&self) -> &str {
        &self.preset_id
    }

    pub fn preset_values(&self) -> &PresetValues {
        &self.preset_values
    }
}

impl TryFrom<RawPresetData> for PresetData {
    type Error = PresetError;

    fn try_from(raw: RawPresetData) -> Result<Self, Self::Error> {
        let subapp_id = raw
            .subapp_id
            .ok_or_else(|| PresetError::MalformedRecord("missing subapp_id".to_string()))?;
        let preset_id = raw
            .preset_id
            .ok_or_else(|| PresetError::MalformedRecord("missing preset_id".to_string()))?;
        let preset_values = raw
            .preset_values
            .ok_or_else(|| PresetError::MalformedRecord("missing preset_values".to_string()))?;
        Self::new(subapp_id, preset_id, preset_values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_empty_identity_fields() {
        assert!(PresetData::new("", "ocean-blue", PresetValues::new()).is_err());
        assert!(PresetData::new("clock", " ", PresetValues::new()).is_err());
        assert!(PresetData::new("clock", "ocean-blue", PresetValues::new()).is_ok());
    }

    #[test]
    fn deserialize_rejects_missing_and_unknown_fields() {
        let missing = r#"{"subapp_id":"clock","preset_values":{}}"#;
        assert!(serde_json::from_str::<PresetData>(missing).is_err());

        let unknown = r#"{"subapp_id":"clock","preset_id":"a","preset_values":{},"app_name":"x"}"#;
        assert!(serde_json::from_str::<PresetData>(unknown).is_err());
    }

    #[test]
    fn deserialize_rejects_null_values() {
        let with_null = r#"{"subapp_id":"clock","preset_id":"a","preset_values":{"bg":null}}"#;
        assert!(serde_json::from_str::<PresetData>(with_null).is_err());
    }

    #[test]
    fn scalar_values_keep_their_type() {
        let json = r#"{"subapp_id":"clock","preset_id":"a","preset_values":{"bg":"blue","seconds":true,"size":12}}"#;
        let data: PresetData = serde_json::from_str(json).expect("valid record");
        let values = data.preset_values();
        assert_eq!(values.get("bg"), Some(&PresetValue::from("blue")));
        assert_eq!(values.get("seconds"), Some(&PresetValue::Bool(true)));
        assert_eq!(values.get("size"), Some(&PresetValue::from(12)));
    }

    #[test]
    fn truthiness_matches_empty_and_false() {
        assert!(!PresetValue::from("").is_truthy());
        assert!(!PresetValue::Bool(false).is_truthy());
        assert!(!PresetValue::from(0).is_truthy());
        assert!(PresetValue::from("url(bg.png)").is_truthy());
    }
}

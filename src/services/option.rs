//! オプションの定義と、選択中プリセットに応じた実効値(active value)の解決。

use std::collections::BTreeMap;

use crate::services::preset::Preset;
use crate::utils::error::{PresetError, PresetResult};
use crate::utils::preset_data::PresetValue;
use crate::utils::settings::{OptionSpec, OptionType};
use crate::utils::storage::StoragePort;

const INPUT_KEY_INFIX: &str = "_input_";

/// 入力欄の現在値を提供する。
pub trait LiveInputs {
    fn input_value(&self, option_id: &str) -> PresetResult<Option<PresetValue>>;
    fn set_input_value(&mut self, option_id: &str, value: PresetValue) -> PresetResult<()>;
    /// 既定値へ戻す。
    fn reset_input(&mut self, option_id: &str) -> PresetResult<()>;
}

/// 入力値を `<subapp_id>_input_<option_id>` へ保存する実装。未設定時は既定値を返す。
#[derive(Debug, Clone)]
pub struct PersistentInputs<S> {
    storage: S,
    key_prefix: String,
    defaults: BTreeMap<String, PresetValue>,
}

impl<S: StoragePort> PersistentInputs<S> {
    pub fn new(storage: S, subapp_id: &str, options: &[TabOption]) -> Self {
        let defaults = options
            .iter()
            .filter_map(|option| {
                option
                    .spec
                    .option_default
                    .clone()
                    .map(|default| (option.option_id().to_string(), default))
            })
            .collect();
        Self {
            storage,
            key_prefix: format!("{subapp_id}{INPUT_KEY_INFIX}"),
            defaults,
        }
    }

    pub fn with_default(mut self, option_id: &str, value: PresetValue) -> Self {
        self.defaults.insert(option_id.to_string(), value);
        self
    }

    pub fn storage_key(&self, option_id: &str) -> String {
        format!("{}{option_id}", self.key_prefix)
    }
}

impl<S: StoragePort> LiveInputs for PersistentInputs<S> {
    fn input_value(&self, option_id: &str) -> PresetResult<Option<PresetValue>> {
        match self.storage.get(&self.storage_key(option_id))? {
            Some(raw) => {
                let value = serde_json::from_str::<PresetValue>(&raw).map_err(|e| {
                    PresetError::MalformedRecord(format!("stored input '{option_id}': {e}"))
                })?;
                Ok(Some(value))
            }
            None => Ok(self.defaults.get(option_id).cloned()),
        }
    }

    fn set_input_value(&mut self, option_id: &str, value: PresetValue) -> PresetResult<()> {
        self.storage
            .set(&self.storage_key(option_id), &serde_json::to_string(&value)?)
    }

    fn reset_input(&mut self, option_id: &str) -> PresetResult<()> {
        self.storage.remove(&self.storage_key(option_id))
    }
}

/// 設定から作られるオプション1件。
#[derive(Debug, Clone, PartialEq)]
pub struct TabOption {
    spec: OptionSpec,
}

impl TabOption {
    pub fn new(spec: OptionSpec) -> Self {
        Self { spec }
    }

    pub fn option_id(&self) -> &str {
        &self.spec.option_id
    }

    pub fn option_type(&self) -> OptionType {
        self.spec.option_type
    }

    pub fn option_description(&self) -> &str {
        &self.spec.option_description
    }

    pub fn is_creator_option(&self) -> bool {
        self.spec.is_creator_option
    }

    pub fn option_dependency(&self) -> Option<&str> {
        self.spec.option_dependency.as_deref()
    }

    pub fn is_preset_selector(&self) -> bool {
        self.spec.option_type == OptionType::PresetInput
    }

    pub fn is_font_option(&self) -> bool {
        self.spec.option_type == OptionType::TextFontInput
    }

    pub fn is_background_image_option(&self) -> bool {
        self.spec.option_type == OptionType::BackgroundImageInput
    }

    pub fn is_background_color_option(&self) -> bool {
        self.spec.option_type == OptionType::BackgroundColorInput
    }
}

/// 実効値を求める。
///
/// `selected` はメニューで選ばれているプリセット、`active` はランダムを解決した後のプリセット。
/// 1. creator 選択中は入力欄の値をそのまま使う。
/// 2. creator 専用オプションはプリセットの保存値のみ(欠けていれば契約違反)。
/// 3. それ以外は保存値を優先し、なければ入力欄の値へフォールバックする。
pub fn resolve_active_value(
    option: &TabOption,
    selected: &Preset,
    active: &Preset,
    inputs: &dyn LiveInputs,
) -> PresetResult<Option<PresetValue>> {
    if selected.is_creator_preset() {
        return inputs.input_value(option.option_id());
    }

    if !active.is_real_preset() {
        return Err(PresetError::invariant(format!(
            "active preset '{}' must be a real preset",
            active.preset_id()
        )));
    }

    let preset_value = active.get_preset_value(option.option_id()).cloned();
    if option.is_creator_option() {
        return match preset_value {
            Some(value) => Ok(Some(value)),
            None => Err(PresetError::invariant(format!(
                "preset '{}' has no value for creator option '{}'",
                active.preset_id(),
                option.option_id()
            ))),
        };
    }

    match preset_value {
        Some(value) => Ok(Some(value)),
        None => inputs.input_value(option.option_id()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::preset::NativePreset;
    use crate::utils::preset_data::PresetValues;
    use crate::utils::storage::MemoryStorage;

    fn option(option_id: &str, option_type: OptionType, is_creator_option: bool) -> TabOption {
        TabOption::new(OptionSpec {
            option_id: option_id.to_string(),
            option_type,
            option_description: String::new(),
            option_default: Some(PresetValue::from("default")),
            is_creator_option,
            option_dependency: None,
        })
    }

    fn sunset() -> Preset {
        let mut values = PresetValues::new();
        values.insert("clock_font", "Lobster");
        values.insert("seconds_color", "#ff0000");
        Preset::Native(NativePreset::new("sunset", values).expect("valid"))
    }

    fn inputs(options: &[TabOption]) -> PersistentInputs<MemoryStorage> {
        PersistentInputs::new(MemoryStorage::new(), "clock", options)
    }

    #[test]
    fn creator_selection_uses_live_value() {
        let font = option("clock_font", OptionType::TextFontInput, true);
        let mut live = inputs(std::slice::from_ref(&font));
        live.set_input_value("clock_font", PresetValue::from("Inter"))
            .expect("set");

        let value = resolve_active_value(&font, &Preset::Creator, &sunset(), &live)
            .expect("resolve");
        assert_eq!(value, Some(PresetValue::from("Inter")));
    }

    #[test]
    fn creator_option_reads_stored_value() {
        let font = option("clock_font", OptionType::TextFontInput, true);
        let live = inputs(std::slice::from_ref(&font));
        let preset = sunset();
        let value = resolve_active_value(&font, &preset, &preset, &live).expect("resolve");
        assert_eq!(value, Some(PresetValue::from("Lobster")));
    }

    #[test]
    fn creator_option_missing_from_preset_is_fatal() {
        let image = option("clock_bg_image", OptionType::BackgroundImageInput, true);
        let live = inputs(std::slice::from_ref(&image));
        let preset = sunset();
        let error = resolve_active_value(&image, &preset, &preset, &live).expect_err("missing");
        assert!(matches!(error, PresetError::InvariantViolation(_)));
    }

    #[test]
    fn shared_option_falls_back_to_live_value() {
        let shadow = option("text_shadow", OptionType::TextShadowInput, false);
        let color = option("seconds_color", OptionType::ColorInput, false);
        let live = inputs(&[shadow.clone(), color.clone()]);
        let preset = sunset();

        let fallback = resolve_active_value(&shadow, &preset, &preset, &live).expect("resolve");
        assert_eq!(fallback, Some(PresetValue::from("default")));

        let stored = resolve_active_value(&color, &preset, &preset, &live).expect("resolve");
        assert_eq!(stored, Some(PresetValue::from("#ff0000")));
    }

    #[test]
    fn randomizer_selection_resolves_through_pick() {
        let font = option("clock_font", OptionType::TextFontInput, true);
        let live = inputs(std::slice::from_ref(&font));
        let value = resolve_active_value(&font, &Preset::Randomizer, &sunset(), &live)
            .expect("resolve");
        assert_eq!(value, Some(PresetValue::from("Lobster")));

        assert!(resolve_active_value(&font, &Preset::Randomizer, &Preset::Randomizer, &live).is_err());
    }

    #[test]
    fn inputs_live_under_their_own_keys() {
        let toggle = option("hide_presets", OptionType::BooleanInput, false);
        let storage = MemoryStorage::new();
        let mut clock = PersistentInputs::new(storage.clone(), "clock", std::slice::from_ref(&toggle));
        let countdown = PersistentInputs::new(storage.clone(), "countdown", std::slice::from_ref(&toggle));

        clock
            .set_input_value("hide_presets", PresetValue::Bool(true))
            .expect("set");
        assert_eq!(
            storage.keys().expect("keys"),
            vec!["clock_input_hide_presets".to_string()]
        );
        assert_eq!(
            countdown.input_value("hide_presets").expect("get"),
            Some(PresetValue::from("default"))
        );
    }

    #[test]
    fn reset_restores_default() {
        let font = option("clock_font", OptionType::TextFontInput, true);
        let mut live = inputs(std::slice::from_ref(&font));
        live.set_input_value("clock_font", PresetValue::from("Inter"))
            .expect("set");
        live.reset_input("clock_font").expect("reset");
        assert_eq!(
            live.input_value("clock_font").expect("get"),
            Some(PresetValue::from("default"))
        );
    }
}

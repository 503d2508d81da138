// オプション値の取得・更新と、表示に使う実効値をまとめるコマンド群。
use crate::services::host::Host;
use crate::services::option::LiveInputs;
use crate::services::tab_settings::TabSettings;
use crate::utils::preset_data::PresetValue;
use crate::utils::settings::OptionType;
use crate::utils::storage::StoragePort;

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionValueResult {
    pub option_id: String,
    pub option_type: OptionType,
    pub is_creator_option: bool,
    pub visible: bool,
    pub value: Option<PresetValue>,
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppearanceResult {
    pub selected_preset_id: String,
    pub font_name: String,
    pub background: Option<PresetValue>,
}

/// コマンドライン引数の値を解釈する。JSONのスカラーとして読めなければ文字列として扱う。
pub fn parse_value_argument(raw: &str) -> PresetValue {
    serde_json::from_str::<PresetValue>(raw).unwrap_or_else(|_| PresetValue::from(raw))
}

fn option_result<S, H>(tab: &TabSettings<S, H>, option_id: &str) -> Result<OptionValueResult, String>
where
    S: StoragePort + Clone,
    H: Host,
{
    let option = tab.find_option(option_id).map_err(|e| e.to_string())?;
    Ok(OptionValueResult {
        option_id: option.option_id().to_string(),
        option_type: option.option_type(),
        is_creator_option: option.is_creator_option(),
        visible: tab.is_option_visible(option_id).map_err(|e| e.to_string())?,
        value: tab.get_option_value(option_id).map_err(|e| e.to_string())?,
    })
}

/// 選択中のプリセットに基づく全オプションの実効値を返す。
pub fn settings_get<S, H>(tab: &TabSettings<S, H>) -> Result<Vec<OptionValueResult>, String>
where
    S: StoragePort + Clone,
    H: Host,
{
    tab.options()
        .iter()
        .filter(|option| !option.is_preset_selector())
        .map(|option| option_result(tab, option.option_id()))
        .collect()
}

pub fn settings_get_option<S, H>(
    tab: &TabSettings<S, H>,
    option_id: String,
) -> Result<OptionValueResult, String>
where
    S: StoragePort + Clone,
    H: Host,
{
    option_result(tab, option_id.trim())
}

/// 入力欄の値を更新する。プリセットの選択は `presets_select` を使う。
pub fn settings_update_option<S, H>(
    tab: &mut TabSettings<S, H>,
    option_id: String,
    value: PresetValue,
) -> Result<OptionValueResult, String>
where
    S: StoragePort + Clone,
    H: Host,
{
    let option_id = option_id.trim();
    let option = tab.find_option(option_id).map_err(|e| e.to_string())?;
    if option.is_preset_selector() {
        return Err(format!("Use preset selection to change '{option_id}'"));
    }
    tab.inputs_mut()
        .set_input_value(option_id, value)
        .map_err(|e| e.to_string())?;
    option_result(tab, option_id)
}

pub fn settings_reset_option<S, H>(
    tab: &mut TabSettings<S, H>,
    option_id: String,
) -> Result<OptionValueResult, String>
where
    S: StoragePort + Clone,
    H: Host,
{
    let option_id = option_id.trim();
    tab.find_option(option_id).map_err(|e| e.to_string())?;
    tab.inputs_mut()
        .reset_input(option_id)
        .map_err(|e| e.to_string())?;
    option_result(tab, option_id)
}

/// 現在のフォントと背景を返す。
pub fn settings_appearance<S, H>(tab: &TabSettings<S, H>) -> Result<AppearanceResult, String>
where
    S: StoragePort + Clone,
    H: Host,
{
    Ok(AppearanceResult {
        selected_preset_id: tab
            .preset_selected()
            .map_err(|e| e.to_string())?
            .preset_id()
            .to_string(),
        font_name: tab.current_font_name().map_err(|e| e.to_string())?,
        background: tab.current_background().map_err(|e| e.to_string())?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::host::tests::RecordingHost;
    use crate::utils::settings::{parse_config, tests::CLOCK_CONFIG};
    use crate::utils::storage::MemoryStorage;

    fn clock_tab() -> TabSettings<MemoryStorage, RecordingHost> {
        let config = parse_config(CLOCK_CONFIG).expect("config");
        TabSettings::new(config, MemoryStorage::new(), RecordingHost::default()).expect("tab")
    }

    #[test]
    fn value_arguments_prefer_json_scalars() {
        assert_eq!(parse_value_argument("true"), PresetValue::Bool(true));
        assert_eq!(parse_value_argument("\"#fff\""), PresetValue::from("#fff"));
        assert_eq!(parse_value_argument("#fff"), PresetValue::from("#fff"));
        assert!(matches!(parse_value_argument("12"), PresetValue::Number(_)));
    }

    #[test]
    fn update_on_creator_is_visible_and_resettable() {
        let mut tab = clock_tab();
        tab.select_preset_creator().expect("creator");

        let updated = settings_update_option(
            &mut tab,
            "clock_font".to_string(),
            PresetValue::from("Inter"),
        )
        .expect("update");
        assert_eq!(updated.value, Some(PresetValue::from("Inter")));
        assert_eq!(settings_appearance(&tab).expect("look").font_name, "Inter");

        let reset = settings_reset_option(&mut tab, "clock_font".to_string()).expect("reset");
        assert_eq!(reset.value, Some(PresetValue::from("Roboto")));
    }

    #[test]
    fn native_selection_overrides_inputs() {
        let mut tab = clock_tab();
        tab.select_preset("sunset_glow").expect("select");
        settings_update_option(&mut tab, "clock_font".to_string(), PresetValue::from("Inter"))
            .expect("update");

        let values = settings_get(&tab).expect("values");
        assert_eq!(values.len(), 5);
        let font = values
            .iter()
            .find(|value| value.option_id == "clock_font")
            .expect("font");
        assert_eq!(font.value, Some(PresetValue::from("Lobster")));

        let look = settings_appearance(&tab).expect("look");
        assert_eq!(look.background, Some(PresetValue::from("sunset.jpg")));
    }

    #[test]
    fn selector_cannot_be_updated_directly() {
        let mut tab = clock_tab();
        assert!(settings_update_option(&mut tab, "theme".to_string(), PresetValue::from("classic")).is_err());
        assert!(settings_get_option(&tab, "missing".to_string()).is_err());
    }
}

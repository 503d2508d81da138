// プリセット一覧・保存・共有リンクの入出力DTOとコマンドを提供する。
use std::collections::BTreeMap;

use crate::services::host::{Host, PresetMenuEntry};
use crate::services::option::LiveInputs;
use crate::services::preset::Preset;
use crate::services::tab_settings::{ImportOutcome, TabSettings};
use crate::utils::preset_data::PresetValue;
use crate::utils::storage::StoragePort;

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetSummary {
    pub id: String,
    pub name: String,
    pub group: &'static str,
    pub selected: bool,
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetShareResult {
    pub preset_id: String,
    pub link: String,
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetSaveInput {
    pub name: String,
    #[serde(default)]
    pub values: BTreeMap<String, PresetValue>,
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetCopyResult {
    pub source_id: String,
    pub suggested_id: String,
    pub suggested_name: String,
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetDeleteResult {
    pub preset_id: String,
    pub removed: usize,
}

fn ensure_import_export_enabled<S, H>(tab: &TabSettings<S, H>) -> Result<(), String>
where
    S: StoragePort + Clone,
    H: Host,
{
    if tab.config().enable_import_export {
        Ok(())
    } else {
        Err("Preset import/export is disabled for this app".to_string())
    }
}

fn summarize(preset: &Preset, group: &'static str, selected_id: &str) -> Result<PresetSummary, String> {
    Ok(PresetSummary {
        id: preset.preset_id().to_string(),
        name: preset.preset_name().map_err(|e| e.to_string())?,
        group,
        selected: preset.preset_id() == selected_id,
    })
}

/// special → saved → native の順にプリセットを列挙する。
pub fn presets_list<S, H>(tab: &TabSettings<S, H>) -> Result<Vec<PresetSummary>, String>
where
    S: StoragePort + Clone,
    H: Host,
{
    let selected = tab.preset_selected().map_err(|e| e.to_string())?;
    let ordered = tab
        .preset_list()
        .presets_ordered()
        .map_err(|e| e.to_string())?;

    let groups = [
        ("special", &ordered.special_ones),
        ("saved", &ordered.saved_ones),
        ("native", &ordered.native_ones),
    ];
    let mut summaries = Vec::new();
    for (group, presets) in groups {
        for preset in presets {
            summaries.push(summarize(preset, group, selected.preset_id())?);
        }
    }
    Ok(summaries)
}

/// 選択メニューの表示行を返す。
pub fn presets_menu<S, H>(tab: &TabSettings<S, H>) -> Result<Vec<PresetMenuEntry>, String>
where
    S: StoragePort + Clone,
    H: Host,
{
    tab.preset_list().menu_entries().map_err(|e| e.to_string())
}

pub fn presets_select<S, H>(tab: &mut TabSettings<S, H>, preset_id: String) -> Result<(), String>
where
    S: StoragePort + Clone,
    H: Host,
{
    let preset_id = preset_id.trim();
    if preset_id.is_empty() {
        return Err("Preset id is empty".to_string());
    }
    tab.select_preset(preset_id).map_err(|e| e.to_string())?;
    tab.track_user_presets().map_err(|e| e.to_string())
}

/// 保存済みプリセットの共有リンクを作る。未指定なら選択中のプリセットを使う。
pub fn presets_share<S, H>(
    tab: &TabSettings<S, H>,
    preset_id: Option<String>,
) -> Result<PresetShareResult, String>
where
    S: StoragePort + Clone,
    H: Host,
{
    ensure_import_export_enabled(tab)?;
    let preset = match preset_id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
        Some(preset_id) => tab
            .preset_list()
            .get_preset_by_name(preset_id)
            .map_err(|e| e.to_string())?,
        None => tab.preset_selected().map_err(|e| e.to_string())?,
    };

    let Some(saved) = preset.as_saved() else {
        return Err(format!(
            "Only saved presets can be shared: {}",
            preset.preset_id()
        ));
    };
    Ok(PresetShareResult {
        preset_id: saved.preset_id().to_string(),
        link: saved.share_link().map_err(|e| e.to_string())?.to_string(),
    })
}

pub fn presets_import<S, H>(tab: &mut TabSettings<S, H>, url: String) -> Result<ImportOutcome, String>
where
    S: StoragePort + Clone,
    H: Host,
{
    ensure_import_export_enabled(tab)?;
    tab.load_preset_from_url(url.trim())
        .map_err(|e| e.to_string())
}

/// 値を creator の入力欄へ流し込んでから名前付きで保存する。
pub fn presets_save<S, H>(
    tab: &mut TabSettings<S, H>,
    input: PresetSaveInput,
) -> Result<PresetSummary, String>
where
    S: StoragePort + Clone,
    H: Host,
{
    tab.select_preset_creator().map_err(|e| e.to_string())?;
    for option_id in input.values.keys() {
        tab.find_option(option_id).map_err(|e| e.to_string())?;
    }

    let name_option_id = tab.name_option_id();
    let inputs = tab.inputs_mut();
    for (option_id, value) in input.values {
        inputs
            .set_input_value(&option_id, value)
            .map_err(|e| e.to_string())?;
    }
    inputs
        .set_input_value(&name_option_id, PresetValue::from(input.name))
        .map_err(|e| e.to_string())?;

    let saved = tab.save_created_preset().map_err(|e| e.to_string())?;
    summarize(&Preset::Saved(saved), "saved", "")
        .map(|summary| PresetSummary {
            selected: true,
            ..summary
        })
}

/// 編集用コピーの準備をする。保存は `presets_save` で行う。
pub fn presets_copy<S, H>(
    tab: &mut TabSettings<S, H>,
    preset_id: String,
) -> Result<PresetCopyResult, String>
where
    S: StoragePort + Clone,
    H: Host,
{
    tab.select_preset(preset_id.trim())
        .map_err(|e| e.to_string())?;
    let suggested_id = tab.modify_preset().map_err(|e| e.to_string())?;
    let suggested_name =
        crate::utils::name_id::id_to_name(&suggested_id).map_err(|e| e.to_string())?;
    Ok(PresetCopyResult {
        source_id: preset_id.trim().to_string(),
        suggested_id,
        suggested_name,
    })
}

pub fn presets_delete<S, H>(
    tab: &mut TabSettings<S, H>,
    preset_id: String,
) -> Result<PresetDeleteResult, String>
where
    S: StoragePort + Clone,
    H: Host,
{
    let preset_id = preset_id.trim().to_string();
    tab.select_preset(&preset_id).map_err(|e| e.to_string())?;
    let outcome = tab.delete_preset().map_err(|e| e.to_string())?;
    Ok(PresetDeleteResult {
        preset_id,
        removed: outcome.removed,
    })
}

/// 全プリセットで使われているフォント名を返す。
pub fn presets_fonts<S, H>(tab: &TabSettings<S, H>) -> Result<Vec<String>, String>
where
    S: StoragePort + Clone,
    H: Host,
{
    tab.preset_list()
        .get_all_preset_fonts()
        .map_err(|e| e.to_string())
}

use crate::utils::error::PresetResult;
use crate::utils::preset_data::PresetData;

pub fn serialize_single(preset: &PresetData) -> PresetResult<String> {
    Ok(serde_json::to_string(preset)?)
}

pub fn deserialize_single(preset_string: &str) -> PresetResult<PresetData> {
    Ok(serde_json::from_str(preset_string)?)
}

pub fn serialize_list(presets: &[PresetData]) -> PresetResult<String> {
    Ok(serde_json::to_string(presets)?)
}

pub fn deserialize_list(presets_string: Option<&str>) -> PresetResult<Vec<PresetData>> {
    match presets_string.map(str::trim) {
        None | Some("") => Ok(Vec::new()),
        Some(raw) => Ok(serde_json::from_str(raw)?),
    }
}

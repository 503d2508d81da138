use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use url::Url;

use crate::utils::error::{PresetError, PresetResult};
use crate::utils::migration::PRESETS_KEY_SUFFIX;
use crate::utils::preset_data::{PresetValue, PresetValues};

const NAME_OPTION_SUFFIX: &str = "_name";

/// 保存時の名前入力欄のID。オプションIDとしては使えない。
pub fn preset_name_option_id(subapp_id: &str) -> String {
    format!("{subapp_id}{NAME_OPTION_SUFFIX}")
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum OptionType {
    PresetInput,
    TextFontInput,
    TextColorInput,
    ColorInput,
    TextShadowInput,
    TextInput,
    BackgroundImageInput,
    BackgroundColorInput,
    BooleanInput,
    DateInput,
    ChoiceInput,
}

impl OptionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PresetInput => "preset-input",
            Self::TextFontInput => "text-font-input",
            Self::TextColorInput => "text-color-input",
            Self::ColorInput => "color-input",
            Self::TextShadowInput => "text-shadow-input",
            Self::TextInput => "text-input",
            Self::BackgroundImageInput => "background-image-input",
            Self::BackgroundColorInput => "background-color-input",
            Self::BooleanInput => "boolean-input",
            Self::DateInput => "date-input",
            Self::ChoiceInput => "choice-input",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OptionSpec {
    pub option_id: String,
    pub option_type: OptionType,
    #[serde(default)]
    pub option_description: String,
    #[serde(default)]
    pub option_default: Option<PresetValue>,
    #[serde(default)]
    pub is_creator_option: bool,
    #[serde(default)]
    pub option_dependency: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TabSettingsConfig {
    pub subapp_id: String,
    pub preset_concept_name: String,
    pub page_url: Url,
    pub no_random_preset: bool,
    pub enable_import_export: bool,
    pub options: Vec<OptionSpec>,
    pub presets: BTreeMap<String, PresetValues>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct TabSettingsConfigOnDisk {
    subapp_id: Option<String>,
    preset_concept_name: Option<String>,
    page_url: Option<String>,
    no_random_preset: Option<bool>,
    enable_import_export: Option<bool>,
    options: Option<Vec<OptionSpec>>,
    presets: Option<BTreeMap<String, PresetValues>>,
}

fn non_empty(name: &str, value: Option<String>) -> PresetResult<String> {
    let value = value.unwrap_or_default().trim().to_string();
    if value.is_empty() {
        return Err(PresetError::Config(format!("'{name}' must not be empty.")));
    }
    Ok(value)
}

fn normalize_option(mut spec: OptionSpec) -> OptionSpec {
    spec.option_id = spec.option_id.trim().to_string();
    spec.option_description = spec.option_description.trim().to_string();
    spec.option_dependency = spec
        .option_dependency
        .map(|dependency| dependency.trim().to_string())
        .filter(|dependency| !dependency.is_empty());
    spec
}

fn count_type(options: &[OptionSpec], option_type: OptionType) -> usize {
    options
        .iter()
        .filter(|spec| spec.option_type == option_type)
        .count()
}

fn validate_options(subapp_id: &str, options: &[OptionSpec]) -> PresetResult<()> {
    let name_option_id = preset_name_option_id(subapp_id);
    let mut seen = HashSet::new();
    for spec in options {
        let valid_id = !spec.option_id.is_empty()
            && spec
                .option_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid_id {
            return Err(PresetError::Config(format!(
                "option id '{}' must match [A-Za-z0-9_-]+.",
                spec.option_id
            )));
        }
        if spec.option_id.ends_with(PRESETS_KEY_SUFFIX) || spec.option_id == name_option_id {
            return Err(PresetError::Config(format!(
                "option id '{}' is reserved.",
                spec.option_id
            )));
        }
        if !seen.insert(spec.option_id.as_str()) {
            return Err(PresetError::Config(format!(
                "duplicate option id '{}'.",
                spec.option_id
            )));
        }
    }

    for spec in options {
        if let Some(dependency) = &spec.option_dependency {
            if !seen.contains(dependency.as_str()) {
                return Err(PresetError::Config(format!(
                    "option '{}' depends on unknown option '{dependency}'.",
                    spec.option_id
                )));
            }
        }
    }

    if count_type(options, OptionType::PresetInput) != 1 {
        return Err(PresetError::Config(
            "exactly one preset-input option is required.".to_string(),
        ));
    }
    for option_type in [
        OptionType::TextFontInput,
        OptionType::BackgroundImageInput,
        OptionType::BackgroundColorInput,
    ] {
        if count_type(options, option_type) > 1 {
            return Err(PresetError::Config(format!(
                "at most one {} option is allowed.",
                option_type.as_str()
            )));
        }
    }
    Ok(())
}

/// JSON文字列から設定を組み立てて検証する。
pub fn parse_config(content: &str) -> PresetResult<TabSettingsConfig> {
    let on_disk: TabSettingsConfigOnDisk = serde_json::from_str(content)
        .map_err(|e| PresetError::Config(format!("failed to parse config: {e}")))?;

    let subapp_id = non_empty("subappId", on_disk.subapp_id)?;
    let preset_concept_name = non_empty("presetConceptName", on_disk.preset_concept_name)?;
    let page_url_raw = non_empty("pageUrl", on_disk.page_url)?;
    let page_url = Url::parse(&page_url_raw)
        .map_err(|e| PresetError::Config(format!("invalid pageUrl '{page_url_raw}': {e}")))?;

    let options: Vec<OptionSpec> = on_disk
        .options
        .unwrap_or_default()
        .into_iter()
        .map(normalize_option)
        .collect();
    validate_options(&subapp_id, &options)?;

    Ok(TabSettingsConfig {
        subapp_id,
        preset_concept_name,
        page_url,
        no_random_preset: on_disk.no_random_preset.unwrap_or(false),
        enable_import_export: on_disk.enable_import_export.unwrap_or(true),
        options,
        presets: on_disk.presets.unwrap_or_default(),
    })
}

pub fn load_config(path: &Path) -> PresetResult<TabSettingsConfig> {
    let content = fs::read_to_string(path).map_err(|e| {
        PresetError::Config(format!("failed to read config '{}': {e}", path.display()))
    })?;
    parse_config(&content)
}

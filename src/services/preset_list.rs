//! 特殊・保存・同梱の3グループをまとめるプリセット一覧。

use rand::Rng;
use regex::Regex;
use std::collections::BTreeSet;
use url::Url;

use crate::services::host::{Host, PresetMenuEntry};
use crate::services::preset::{
    NativePreset, Preset, RandomizerPreset, SavedPreset, CREATOR_PRESET_ID, RANDOMIZER_PRESET_ID,
};
use crate::services::preset_savior::{PresetSavior, RemoveOutcome, SaveOutcome};
use crate::utils::error::{PresetError, PresetResult};
use crate::utils::name_id::ID_SEPARATOR;
use crate::utils::preset_data::{PresetData, PresetValues};
use crate::utils::settings::{OptionType, TabSettingsConfig};
use crate::utils::storage::StoragePort;

/// コピーID生成で試す候補数の上限。
pub const MAX_COPY_ATTEMPTS: usize = 99;

const EDIT_SUFFIX_PATTERN: &str = r"-edit(-|$)";
const SAVED_DIVIDER_LABEL: &str = "Saved";
const NATIVE_DIVIDER_LABEL: &str = "Native";

#[derive(Debug, Clone)]
pub struct PresetsOrdered {
    pub special_ones: Vec<Preset>,
    pub saved_ones: Vec<Preset>,
    pub native_ones: Vec<Preset>,
}

impl PresetsOrdered {
    /// special → saved → native の順に並べる。
    pub fn iter(&self) -> impl Iterator<Item = &Preset> {
        self.special_ones
            .iter()
            .chain(&self.saved_ones)
            .chain(&self.native_ones)
    }
}

#[derive(Debug)]
pub struct PresetList<S> {
    savior: PresetSavior<S>,
    native_presets: Vec<NativePreset>,
    randomizer: Option<RandomizerPreset>,
    link_base: Url,
    font_option_id: Option<String>,
}

impl<S: StoragePort> PresetList<S> {
    pub fn new(config: &TabSettingsConfig, storage: S) -> PresetResult<Self> {
        let savior = PresetSavior::new(config.subapp_id.clone(), storage)?;

        let mut native_presets = Vec::with_capacity(config.presets.len());
        for (preset_id, preset_values) in &config.presets {
            if preset_id == CREATOR_PRESET_ID || preset_id == RANDOMIZER_PRESET_ID {
                return Err(PresetError::invariant(format!(
                    "native preset id '{preset_id}' is reserved"
                )));
            }
            native_presets.push(NativePreset::new(preset_id.clone(), preset_values.clone())?);
        }

        let font_option_id = config
            .options
            .iter()
            .find(|spec| spec.option_type == OptionType::TextFontInput)
            .map(|spec| spec.option_id.clone());

        Ok(Self {
            savior,
            native_presets,
            randomizer: (!config.no_random_preset).then(RandomizerPreset::new),
            link_base: config.page_url.clone(),
            font_option_id,
        })
    }

    pub fn savior(&self) -> &PresetSavior<S> {
        &self.savior
    }

    pub fn has_randomizer(&self) -> bool {
        self.randomizer.is_some()
    }

    /// 現在のサブアプリ・ページURLに紐づく保存プリセットを作る。
    pub fn new_saved_preset(
        &self,
        preset_id: &str,
        preset_values: PresetValues,
    ) -> PresetResult<SavedPreset> {
        let data = PresetData::new(self.savior.subapp_id(), preset_id, preset_values)?;
        Ok(SavedPreset::new(data, self.link_base.clone()))
    }

    fn saved_presets(&self) -> PresetResult<Vec<Preset>> {
        Ok(self
            .savior
            .list()?
            .into_iter()
            .map(|data| Preset::Saved(SavedPreset::new(data, self.link_base.clone())))
            .collect())
    }

    pub fn presets_ordered(&self) -> PresetResult<PresetsOrdered> {
        let mut special_ones = vec![Preset::Creator];
        if self.randomizer.is_some() {
            special_ones.push(Preset::Randomizer);
        }

        Ok(PresetsOrdered {
            special_ones,
            saved_ones: self.saved_presets()?,
            native_ones: self
                .native_presets
                .iter()
                .cloned()
                .map(Preset::Native)
                .collect(),
        })
    }

    /// 見つからなければ `Ok(None)`。
    pub fn find_preset(&self, preset_id: &str) -> PresetResult<Option<Preset>> {
        if preset_id.is_empty() {
            return Err(PresetError::invariant("preset id must not be empty"));
        }
        let ordered = self.presets_ordered()?;
        let found = ordered
            .iter()
            .find(|preset| preset.preset_id() == preset_id)
            .cloned();
        Ok(found)
    }

    pub fn get_preset_by_name(&self, preset_id: &str) -> PresetResult<Preset> {
        self.find_preset(preset_id)?
            .ok_or_else(|| PresetError::PresetNotFound {
                preset_id: preset_id.to_string(),
            })
    }

    /// 保存済みが2件以上あればそこから、なければ同梱から選ぶ。
    pub fn random_candidates(&self) -> PresetResult<Vec<Preset>> {
        let PresetsOrdered {
            saved_ones,
            native_ones,
            ..
        } = self.presets_ordered()?;
        if saved_ones.len() > 1 {
            return Ok(saved_ones);
        }
        Ok(native_ones)
    }

    pub fn random_preset<R: Rng + ?Sized>(&self, rng: &mut R) -> PresetResult<&Preset> {
        let randomizer = self
            .randomizer
            .as_ref()
            .ok_or_else(|| PresetError::invariant("the random preset is disabled"))?;
        randomizer.random_preset(|| self.random_candidates(), rng)
    }

    pub fn menu_entries(&self) -> PresetResult<Vec<PresetMenuEntry>> {
        let ordered = self.presets_ordered()?;
        let to_entry = |preset: &Preset| -> PresetResult<PresetMenuEntry> {
            Ok(PresetMenuEntry {
                value: preset.preset_id().to_string(),
                label: preset.preset_name()?,
            })
        };

        let mut entries = Vec::new();
        for preset in &ordered.special_ones {
            entries.push(to_entry(preset)?);
        }
        if ordered.saved_ones.is_empty() {
            entries.push(PresetMenuEntry::divider(""));
        } else {
            entries.push(PresetMenuEntry::divider(SAVED_DIVIDER_LABEL));
            for preset in &ordered.saved_ones {
                entries.push(to_entry(preset)?);
            }
            entries.push(PresetMenuEntry::divider(NATIVE_DIVIDER_LABEL));
        }
        for preset in &ordered.native_ones {
            entries.push(to_entry(preset)?);
        }
        Ok(entries)
    }

    fn refresh_menu(&self, host: &mut dyn Host) -> PresetResult<()> {
        let entries = self.menu_entries()?;
        host.refresh_preset_menu(&entries);
        Ok(())
    }

    pub fn save_preset(&self, preset: &SavedPreset, host: &mut dyn Host) -> PresetResult<SaveOutcome> {
        let outcome = self.savior.save(preset)?;
        self.refresh_menu(host)?;
        Ok(outcome)
    }

    pub fn remove_preset(
        &self,
        preset: &SavedPreset,
        host: &mut dyn Host,
    ) -> PresetResult<RemoveOutcome> {
        let outcome = self.savior.remove(preset)?;
        self.refresh_menu(host)?;
        Ok(outcome)
    }

    /// 編集用コピーのIDを作る。`-edit`, `-edit-2`, … `-edit-99` の順に空きを探す。
    pub fn generate_unique_preset_id_copy(&self, preset: &Preset) -> PresetResult<String> {
        let preset_id = preset.preset_id();
        if preset_id.is_empty() {
            return Err(PresetError::invariant("preset id must not be empty"));
        }

        let taken: BTreeSet<String> = self
            .presets_ordered()?
            .iter()
            .map(|preset| preset.preset_id().to_string())
            .collect();

        let suffix_pattern = Regex::new(EDIT_SUFFIX_PATTERN)
            .map_err(|e| PresetError::invariant(format!("invalid edit suffix pattern: {e}")))?;
        let normalized = preset_id.replace('_', ID_SEPARATOR);
        let stem = match suffix_pattern.find(&normalized) {
            Some(found) => &normalized[..found.start()],
            None => normalized.as_str(),
        };
        let base = format!("{stem}{ID_SEPARATOR}edit");

        for attempt in 1..=MAX_COPY_ATTEMPTS {
            let candidate = if attempt == 1 {
                base.clone()
            } else {
                format!("{base}{ID_SEPARATOR}{attempt}")
            };
            if !taken.contains(&candidate) {
                return Ok(candidate);
            }
        }

        Err(PresetError::CopyIdExhausted {
            preset_id: preset_id.to_string(),
        })
    }

    /// 保存・同梱プリセットのフォント名を重複なしの昇順で返す。
    pub fn get_all_preset_fonts(&self) -> PresetResult<Vec<String>> {
        let font_option_id = self
            .font_option_id
            .as_deref()
            .ok_or_else(|| PresetError::invariant("no text-font-input option is configured"))?;

        let ordered = self.presets_ordered()?;
        let mut fonts = BTreeSet::new();
        for preset in ordered.saved_ones.iter().chain(&ordered.native_ones) {
            let font_name = preset
                .get_preset_value(font_option_id)
                .and_then(|value| value.as_str())
                .filter(|font_name| !font_name.is_empty())
                .ok_or_else(|| {
                    PresetError::invariant(format!(
                        "preset '{}' has no font value",
                        preset.preset_id()
                    ))
                })?;
            fonts.insert(font_name.to_string());
        }
        Ok(fonts.into_iter().collect())
    }
}

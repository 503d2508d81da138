//! プリセット一覧・オプション・入力値・ホストを束ねる窓口。

use serde::Serialize;

use crate::services::host::{Host, TrackedEvent};
use crate::services::option::{resolve_active_value, LiveInputs, PersistentInputs, TabOption};
use crate::services::preset::{Preset, SavedPreset, CREATOR_PRESET_ID};
use crate::services::preset_list::PresetList;
use crate::services::preset_savior::RemoveOutcome;
use crate::utils::error::{PresetError, PresetResult};
use crate::utils::link;
use crate::utils::migration;
use crate::utils::name_id;
use crate::utils::preset_data::{PresetData, PresetValue, PresetValues};
use crate::utils::settings::{self, TabSettingsConfig};
use crate::utils::storage::StoragePort;

const MALFORMED_LINK_MESSAGE: &str = "Wrong URL. The URL could not be processed.";
const WRONG_APP_MESSAGE: &str = "Wrong app: the URL hash should be loaded in a different app.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase", tag = "status")]
pub enum ImportOutcome {
    NothingToImport,
    Malformed,
    AlreadySaved { preset_id: String },
    WrongSubapp { subapp_id: String },
    Imported { preset_id: String },
}

enum LinkRead {
    Nothing,
    Malformed,
    Preset(PresetData),
}

fn read_link(href: &str, host: &mut dyn Host) -> LinkRead {
    match link::decode_url(href) {
        Ok(Some(preset)) => LinkRead::Preset(preset),
        Ok(None) => LinkRead::Nothing,
        Err(error) => {
            log::error!("failed to import preset from {href}: {error}");
            host.show_toast(MALFORMED_LINK_MESSAGE, true);
            host.track_error(&error);
            LinkRead::Malformed
        }
    }
}

/// 現在のURLから共有プリセットを読む。壊れていればユーザーへ通知して `None` を返す。
pub fn from_url(href: &str, host: &mut dyn Host) -> Option<PresetData> {
    match read_link(href, host) {
        LinkRead::Preset(preset) => Some(preset),
        LinkRead::Nothing | LinkRead::Malformed => None,
    }
}

pub struct TabSettings<S, H> {
    config: TabSettingsConfig,
    options: Vec<TabOption>,
    preset_list: PresetList<S>,
    inputs: PersistentInputs<S>,
    host: H,
}

impl<S, H> TabSettings<S, H>
where
    S: StoragePort + Clone,
    H: Host,
{
    /// 起動処理。保存済みデータのマイグレーションを先に済ませる。
    pub fn new(config: TabSettingsConfig, storage: S, host: H) -> PresetResult<Self> {
        let report = migration::run_migrations(&storage)?;
        if !report.rewritten_keys.is_empty() {
            log::info!("migrated stored presets: {:?}", report.rewritten_keys);
        }

        let options: Vec<TabOption> = config.options.iter().cloned().map(TabOption::new).collect();
        let preset_list = PresetList::new(&config, storage.clone())?;

        let mut inputs = PersistentInputs::new(storage, &config.subapp_id, &options).with_default(
            &settings::preset_name_option_id(&config.subapp_id),
            PresetValue::from(""),
        );
        if let Some(selector) = options.iter().find(|option| option.is_preset_selector()) {
            if inputs.input_value(selector.option_id())?.is_none() {
                inputs = inputs.with_default(selector.option_id(), PresetValue::from(CREATOR_PRESET_ID));
            }
        }

        Ok(Self {
            config,
            options,
            preset_list,
            inputs,
            host,
        })
    }

    pub fn config(&self) -> &TabSettingsConfig {
        &self.config
    }

    pub fn options(&self) -> &[TabOption] {
        &self.options
    }

    pub fn preset_list(&self) -> &PresetList<S> {
        &self.preset_list
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn inputs_mut(&mut self) -> &mut PersistentInputs<S> {
        &mut self.inputs
    }

    pub fn name_option_id(&self) -> String {
        settings::preset_name_option_id(&self.config.subapp_id)
    }

    fn find_option_by(
        &self,
        description: &str,
        matches: impl Fn(&TabOption) -> bool,
    ) -> PresetResult<&TabOption> {
        self.options
            .iter()
            .find(|option| matches(option))
            .ok_or_else(|| PresetError::invariant(format!("no {description} option is configured")))
    }

    pub fn find_option(&self, option_id: &str) -> PresetResult<&TabOption> {
        self.find_option_by(option_id, |option| option.option_id() == option_id)
    }

    pub fn preset_option(&self) -> PresetResult<&TabOption> {
        self.find_option_by("preset-input", TabOption::is_preset_selector)
    }

    pub fn preset_selected(&self) -> PresetResult<Preset> {
        let selector_id = self.preset_option()?.option_id();
        let selected = self.inputs.input_value(selector_id)?;
        let preset_id = selected
            .as_ref()
            .and_then(PresetValue::as_str)
            .ok_or_else(|| PresetError::invariant("the preset selector holds no preset id"))?;
        self.preset_list.get_preset_by_name(preset_id)
    }

    /// ランダム選択中なら抽選済みのプリセットを返す。
    pub fn active_preset(&self) -> PresetResult<Preset> {
        let selected = self.preset_selected()?;
        if !selected.is_randomizer_preset() {
            return Ok(selected);
        }
        let picked = self.preset_list.random_preset(&mut rand::thread_rng())?;
        Ok(picked.clone())
    }

    pub fn select_preset(&mut self, preset_id: &str) -> PresetResult<()> {
        let preset = self.preset_list.get_preset_by_name(preset_id)?;
        let selector_id = self.preset_option()?.option_id().to_string();
        self.inputs
            .set_input_value(&selector_id, PresetValue::from(preset.preset_id()))
    }

    pub fn select_preset_creator(&mut self) -> PresetResult<()> {
        self.select_preset(CREATOR_PRESET_ID)
    }

    pub fn get_option_value(&self, option_id: &str) -> PresetResult<Option<PresetValue>> {
        let option = self.find_option(option_id)?;
        let selected = self.preset_selected()?;
        if selected.is_creator_preset() {
            return resolve_active_value(option, &selected, &selected, &self.inputs);
        }
        let active = self.active_preset()?;
        resolve_active_value(option, &selected, &active, &self.inputs)
    }

    /// 依存先オプションの実効値が偽なら非表示にする。
    pub fn is_option_visible(&self, option_id: &str) -> PresetResult<bool> {
        let option = self.find_option(option_id)?;
        let Some(dependency) = option.option_dependency() else {
            return Ok(true);
        };
        Ok(self
            .get_option_value(dependency)?
            .is_some_and(|value| value.is_truthy()))
    }

    pub fn current_font_name(&self) -> PresetResult<String> {
        let font_option_id = self
            .find_option_by("text-font-input", TabOption::is_font_option)?
            .option_id();
        self.get_option_value(font_option_id)?
            .as_ref()
            .and_then(PresetValue::as_str)
            .filter(|font_name| !font_name.is_empty())
            .map(str::to_string)
            .ok_or_else(|| PresetError::invariant("the active font name is empty"))
    }

    /// 背景画像が設定されていればそれを、なければ背景色を返す。
    pub fn current_background(&self) -> PresetResult<Option<PresetValue>> {
        let image_option_id = self
            .find_option_by("background-image-input", TabOption::is_background_image_option)?
            .option_id();
        if let Some(image) = self.get_option_value(image_option_id)? {
            if image.is_truthy() {
                return Ok(Some(image));
            }
        }
        let color_option_id = self
            .find_option_by("background-color-input", TabOption::is_background_color_option)?
            .option_id();
        self.get_option_value(color_option_id)
    }

    /// 選択中が保存プリセットなら共有リンクを返す。
    pub fn share_link(&self) -> PresetResult<Option<String>> {
        match self.preset_selected()? {
            Preset::Saved(saved) => Ok(Some(saved.share_link()?.to_string())),
            _ => Ok(None),
        }
    }

    fn reject(&mut self, message: String, error: PresetError) -> PresetResult<SavedPreset> {
        self.host.alert(&message);
        Err(error)
    }

    /// creator の入力内容を名前付きで保存する。名前の欠落・衝突はアラートを出して中断する。
    pub fn save_created_preset(&mut self) -> PresetResult<SavedPreset> {
        if !self.preset_selected()?.is_creator_preset() {
            return Err(PresetError::invariant(
                "saving requires the creator preset to be selected",
            ));
        }

        let concept = self.config.preset_concept_name.clone();
        let preset_name = self
            .inputs
            .input_value(&self.name_option_id())?
            .as_ref()
            .and_then(PresetValue::as_str)
            .map(str::to_string)
            .unwrap_or_default();
        let preset_id = if preset_name.is_empty() {
            String::new()
        } else {
            name_id::name_to_id(&preset_name)?
        };
        if preset_id.is_empty() {
            return self.reject(
                format!("You need to provide a name for your {concept} in order to save it."),
                PresetError::MissingPresetName,
            );
        }

        if self.preset_list.find_preset(&preset_id)?.is_some() {
            return self.reject(
                format!(
                    "Change the name of your {concept}; you already have a {concept} saved with ID \"{preset_id}\". (IDs are generated from name; change name to change ID.)"
                ),
                PresetError::DuplicatePresetId { preset_id },
            );
        }

        let mut preset_values = PresetValues::new();
        for option in self.options.iter().filter(|option| option.is_creator_option()) {
            let value = self.inputs.input_value(option.option_id())?.ok_or_else(|| {
                PresetError::invariant(format!(
                    "creator option '{}' has no value to save",
                    option.option_id()
                ))
            })?;
            preset_values.insert(option.option_id(), value);
        }

        let new_preset = self.preset_list.new_saved_preset(&preset_id, preset_values)?;
        self.preset_list.save_preset(&new_preset, &mut self.host)?;
        self.select_preset(&preset_id)?;
        self.reset_creator()?;
        Ok(new_preset)
    }

    /// creator 専用オプションと名前欄を既定値へ戻す。
    pub fn reset_creator(&mut self) -> PresetResult<()> {
        let creator_option_ids: Vec<String> = self
            .options
            .iter()
            .filter(|option| option.is_creator_option())
            .map(|option| option.option_id().to_string())
            .collect();
        for option_id in creator_option_ids {
            self.inputs.reset_input(&option_id)?;
        }
        let name_option_id = self.name_option_id();
        self.inputs.reset_input(&name_option_id)
    }

    /// 表示中のプリセット値を入力欄へ写し、creator を選択する。
    pub fn copy_to_creator(&mut self) -> PresetResult<()> {
        let preset = self.active_preset()?;
        let preset_values = preset.preset_values().ok_or_else(|| {
            PresetError::invariant(format!(
                "cannot copy values from '{}'",
                preset.preset_id()
            ))
        })?;

        for (option_id, value) in preset_values.iter() {
            self.find_option(option_id)?;
            self.inputs.set_input_value(option_id, value.clone())?;
        }
        self.select_preset_creator()
    }

    /// 表示中のプリセットを編集用にコピーし、新しいIDの名前を名前欄へ入れる。
    pub fn modify_preset(&mut self) -> PresetResult<String> {
        let preset = self.active_preset()?;
        if !preset.is_real_preset() {
            return Err(PresetError::invariant("only real presets can be modified"));
        }
        let new_preset_id = self.preset_list.generate_unique_preset_id_copy(&preset)?;
        self.copy_to_creator()?;
        let name_option_id = self.name_option_id();
        self.inputs.set_input_value(
            &name_option_id,
            PresetValue::from(name_id::id_to_name(&new_preset_id)?),
        )?;
        Ok(new_preset_id)
    }

    /// 保存プリセットを削除する。値は creator へ退避するので再保存できる。
    pub fn delete_preset(&mut self) -> PresetResult<RemoveOutcome> {
        let preset = self.active_preset()?;
        let Preset::Saved(saved) = &preset else {
            return Err(PresetError::invariant(format!(
                "'{}' is not a saved preset",
                preset.preset_id()
            )));
        };

        self.copy_to_creator()?;
        let name_option_id = self.name_option_id();
        self.inputs
            .set_input_value(&name_option_id, PresetValue::from(preset.preset_name()?))?;
        self.preset_list.remove_preset(saved, &mut self.host)
    }

    pub fn load_preset_from_url(&mut self, href: &str) -> PresetResult<ImportOutcome> {
        let concept = self.config.preset_concept_name.clone();
        let preset_data = match read_link(href, &mut self.host) {
            LinkRead::Preset(preset_data) => preset_data,
            LinkRead::Nothing => return Ok(ImportOutcome::NothingToImport),
            LinkRead::Malformed => return Ok(ImportOutcome::Malformed),
        };

        let preset_id = preset_data.preset_id().to_string();
        if let Some(existing) = self.preset_list.find_preset(&preset_id)? {
            self.select_preset(&preset_id)?;
            self.host.show_toast(
                &format!("{concept} \"{}\" already saved.", existing.preset_name()?),
                false,
            );
            return Ok(ImportOutcome::AlreadySaved { preset_id });
        }

        if preset_data.subapp_id() != self.config.subapp_id {
            self.host.alert(WRONG_APP_MESSAGE);
            return Ok(ImportOutcome::WrongSubapp {
                subapp_id: preset_data.subapp_id().to_string(),
            });
        }

        let new_preset = self
            .preset_list
            .new_saved_preset(&preset_id, preset_data.preset_values().clone())?;
        self.preset_list.save_preset(&new_preset, &mut self.host)?;
        self.select_preset(&preset_id)?;

        let preset_name = Preset::Saved(new_preset).preset_name()?;
        self.host
            .show_toast(&format!("{concept} \"{preset_name}\" successfully saved."), false);
        self.host.track_event(TrackedEvent {
            category: "preset_imported".to_string(),
            action: format!("{concept} {preset_name}"),
            label: href.to_string(),
        });
        Ok(ImportOutcome::Imported { preset_id })
    }

    pub fn track_user_presets(&mut self) -> PresetResult<()> {
        let preset_id = self.preset_selected()?.preset_id().to_string();
        self.host.track_event(TrackedEvent {
            category: "global_stats".to_string(),
            action: "preset_used".to_string(),
            label: format!(
                "{preset_id} {}",
                self.config.preset_concept_name.to_lowercase()
            ),
        });
        Ok(())
    }
}

use crate::services::preset::SavedPreset;
use crate::utils::error::{PresetError, PresetResult};
use crate::utils::migration::PRESETS_KEY_SUFFIX;
use crate::utils::preset_data::PresetData;
use crate::utils::serializer;
use crate::utils::storage::StoragePort;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    AlreadySaved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveOutcome {
    pub removed: usize,
}

#[derive(Debug, Clone)]
pub struct PresetSavior<S> {
    subapp_id: String,
    storage: S,
}

impl<S: StoragePort> PresetSavior<S> {
    pub fn new(subapp_id: impl Into<String>, storage: S) -> PresetResult<Self> {
        let subapp_id = subapp_id.into();
        if subapp_id.trim().is_empty() {
            return Err(PresetError::invariant("subapp_id must not be empty"));
        }
        Ok(Self { subapp_id, storage })
    }

    pub fn subapp_id(&self) -> &str {
        &self.subapp_id
    }

    pub fn storage_key(&self) -> String {
        format!("{}{PRESETS_KEY_SUFFIX}", self.subapp_id)
    }

    pub fn list(&self) -> PresetResult<Vec<PresetData>> {
        let raw = self.storage.get(&self.storage_key())?;
        serializer::deserialize_list(raw.as_deref())
    }

    fn write(&self, presets: &[PresetData]) -> PresetResult<()> {
        self.storage
            .set(&self.storage_key(), &serializer::serialize_list(presets)?)
    }

    pub fn save(&self, preset: &SavedPreset) -> PresetResult<SaveOutcome> {
        let mut presets = self.list()?;
        let preset_id = preset.preset_id();

        if presets.iter().any(|saved| saved.preset_id() == preset_id) {
            log::warn!("Trying to save {preset_id} but it is already saved.");
            return Ok(SaveOutcome::AlreadySaved);
        }

        presets.push(PresetData::new(
            self.subapp_id.clone(),
            preset_id,
            preset.data().preset_values().clone(),
        )?);
        self.write(&presets)?;
        log::info!("saved preset {preset_id} under {}", self.storage_key());
        Ok(SaveOutcome::Saved)
    }

    pub fn remove(&self, preset: &SavedPreset) -> PresetResult<RemoveOutcome> {
        let preset_id = preset.preset_id();
        let presets = self.list()?;
        let old_length = presets.len();

        let remaining: Vec<PresetData> = presets
            .into_iter()
            .filter(|saved| saved.preset_id() != preset_id)
            .collect();
        let removed = old_length - remaining.len();

        if removed == 0 {
            log::warn!("Preset {preset_id} not found.");
        }
        if removed > 1 {
            log::warn!("Preset {preset_id} found multiple times.");
        }

        self.write(&remaining)?;
        Ok(RemoveOutcome { removed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::preset_data::PresetValues;
    use crate::utils::storage::MemoryStorage;
    use url::Url;

    fn saved(subapp_id: &str, preset_id: &str, bg: &str) -> SavedPreset {
        let mut values = PresetValues::new();
        values.insert("bg", bg);
        let data = PresetData::new(subapp_id, preset_id, values).expect("valid");
        SavedPreset::new(data, Url::parse("https://example.com/").expect("url"))
    }

    fn count_with_id(savior: &PresetSavior<MemoryStorage>, preset_id: &str) -> usize {
        savior
            .list()
            .expect("list")
            .iter()
            .filter(|preset| preset.preset_id() == preset_id)
            .count()
    }

    #[test]
    fn empty_storage_lists_nothing() {
        let savior = PresetSavior::new("clock", MemoryStorage::new()).expect("savior");
        assert!(savior.list().expect("list").is_empty());
        assert_eq!(savior.storage_key(), "clock_presets");
    }

    #[test]
    fn save_is_idempotent() {
        let savior = PresetSavior::new("clock", MemoryStorage::new()).expect("savior");
        let preset = saved("clock", "ocean-blue", "blue");

        assert_eq!(savior.save(&preset).expect("save"), SaveOutcome::Saved);
        assert_eq!(count_with_id(&savior, "ocean-blue"), 1);

        let changed = saved("clock", "ocean-blue", "red");
        assert_eq!(savior.save(&changed).expect("save"), SaveOutcome::AlreadySaved);
        let listed = savior.list().expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(
            listed[0].preset_values().get("bg").and_then(|value| value.as_str()),
            Some("blue")
        );
    }

    #[test]
    fn save_stamps_own_subapp_id() {
        let savior = PresetSavior::new("clock", MemoryStorage::new()).expect("savior");
        savior.save(&saved("countdown", "imported", "blue")).expect("save");
        assert_eq!(savior.list().expect("list")[0].subapp_id(), "clock");
    }

    #[test]
    fn remove_present_and_absent() {
        let savior = PresetSavior::new("clock", MemoryStorage::new()).expect("savior");
        let ocean = saved("clock", "ocean-blue", "blue");
        let forest = saved("clock", "forest", "green");
        savior.save(&ocean).expect("save");
        savior.save(&forest).expect("save");

        assert_eq!(savior.remove(&ocean).expect("remove").removed, 1);
        assert_eq!(count_with_id(&savior, "ocean-blue"), 0);
        assert_eq!(savior.list().expect("list").len(), 1);

        assert_eq!(savior.remove(&ocean).expect("remove").removed, 0);
        assert_eq!(savior.list().expect("list").len(), 1);
    }

    #[test]
    fn remove_drops_every_duplicate() {
        let storage = MemoryStorage::new();
        let raw = r#"[
            {"subapp_id":"clock","preset_id":"dup","preset_values":{}},
            {"subapp_id":"clock","preset_id":"dup","preset_values":{}},
            {"subapp_id":"clock","preset_id":"keep","preset_values":{}}
        ]"#;
        storage.set("clock_presets", raw).expect("seed");
        let savior = PresetSavior::new("clock", storage).expect("savior");

        let outcome = savior.remove(&saved("clock", "dup", "x")).expect("remove");
        assert_eq!(outcome.removed, 2);
        let listed = savior.list().expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].preset_id(), "keep");
    }
}

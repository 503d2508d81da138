use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;
use std::cell::OnceCell;
use url::Url;

use crate::utils::error::{PresetError, PresetResult};
use crate::utils::link;
use crate::utils::name_id;
use crate::utils::preset_data::{PresetData, PresetValue, PresetValues};

pub const CREATOR_PRESET_ID: &str = "_creator";
pub const RANDOMIZER_PRESET_ID: &str = "_random";
const CREATOR_PRESET_NAME: &str = "<Creator>";
const RANDOMIZER_PRESET_NAME: &str = "<Random>";

// 保存プリセットのIDはハイフン区切りなので、同梱プリセットはハイフンを使えない。
const NATIVE_ID_PATTERN: &str = r"^[A-Za-z0-9_]+$";

/// ホスト設定から作られる同梱プリセット。
#[derive(Debug, Clone, PartialEq)]
pub struct NativePreset {
    preset_id: String,
    preset_values: PresetValues,
}

impl NativePreset {
    pub fn new(preset_id: impl Into<String>, preset_values: PresetValues) -> PresetResult<Self> {
        let preset_id = preset_id.into();
        let pattern = Regex::new(NATIVE_ID_PATTERN)
            .map_err(|e| PresetError::invariant(format!("invalid native id pattern: {e}")))?;
        if !pattern.is_match(&preset_id) {
            return Err(PresetError::invariant(format!(
                "native preset id '{preset_id}' must match {NATIVE_ID_PATTERN}"
            )));
        }
        Ok(Self {
            preset_id,
            preset_values,
        })
    }
}

/// ストレージから復元したユーザー保存プリセット。共有リンクは初回参照時に一度だけ生成する。
#[derive(Debug, Clone)]
pub struct SavedPreset {
    data: PresetData,
    link_base: Url,
    share_link: OnceCell<String>,
}

impl SavedPreset {
    pub fn new(data: PresetData, link_base: Url) -> Self {
        Self {
            data,
            link_base,
            share_link: OnceCell::new(),
        }
    }

    pub fn data(&self) -> &PresetData {
        &self.data
    }

    pub fn preset_id(&self) -> &str {
        self.data.preset_id()
    }

    pub fn share_link(&self) -> PresetResult<&str> {
        if let Some(share_link) = self.share_link.get() {
            return Ok(share_link);
        }
        let generated = link::to_url(&self.link_base, &self.data)?;
        Ok(self.share_link.get_or_init(|| generated))
    }
}

#[derive(Debug, Clone)]
pub enum Preset {
    Creator,
    Randomizer,
    Native(NativePreset),
    Saved(SavedPreset),
}

impl Preset {
    pub fn preset_id(&self) -> &str {
        match self {
            Self::Creator => CREATOR_PRESET_ID,
            Self::Randomizer => RANDOMIZER_PRESET_ID,
            Self::Native(native) => &native.preset_id,
            Self::Saved(saved) => saved.preset_id(),
        }
    }

    /// creator / randomizer は値を持たない。
    pub fn preset_values(&self) -> Option<&PresetValues> {
        match self {
            Self::Creator | Self::Randomizer => None,
            Self::Native(native) => Some(&native.preset_values),
            Self::Saved(saved) => Some(saved.data.preset_values()),
        }
    }

    pub fn is_creator_preset(&self) -> bool {
        matches!(self, Self::Creator)
    }

    pub fn is_randomizer_preset(&self) -> bool {
        matches!(self, Self::Randomizer)
    }

    pub fn is_saved_preset(&self) -> bool {
        matches!(self, Self::Saved(_))
    }

    pub fn is_real_preset(&self) -> bool {
        !self.is_creator_preset() && !self.is_randomizer_preset()
    }

    pub fn preset_name(&self) -> PresetResult<String> {
        match self {
            Self::Creator => Ok(CREATOR_PRESET_NAME.to_string()),
            Self::Randomizer => Ok(RANDOMIZER_PRESET_NAME.to_string()),
            Self::Native(_) | Self::Saved(_) => name_id::id_to_name(self.preset_id()),
        }
    }

    pub fn get_preset_value(&self, option_id: &str) -> Option<&PresetValue> {
        self.preset_values()?.get(option_id)
    }

    pub fn as_saved(&self) -> Option<&SavedPreset> {
        match self {
            Self::Saved(saved) => Some(saved),
            _ => None,
        }
    }
}

/// ランダムプリセットの抽選結果を保持する。一度引いたらこのインスタンスの間は変わらない。
#[derive(Debug, Default)]
pub struct RandomizerPreset {
    picked: OnceCell<Preset>,
}

impl RandomizerPreset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn picked(&self) -> Option<&Preset> {
        self.picked.get()
    }

    pub fn random_preset<R, F>(&self, candidates: F, rng: &mut R) -> PresetResult<&Preset>
    where
        R: Rng + ?Sized,
        F: FnOnce() -> PresetResult<Vec<Preset>>,
    {
        if let Some(picked) = self.picked.get() {
            return Ok(picked);
        }

        let candidates = candidates()?;
        let picked = candidates
            .choose(rng)
            .cloned()
            .ok_or_else(|| PresetError::invariant("no real preset available to pick at random"))?;
        if !picked.is_real_preset() {
            return Err(PresetError::invariant(format!(
                "random pick '{}' is not a real preset",
                picked.preset_id()
            )));
        }
        log::debug!("randomizer picked {}", picked.preset_id());
        Ok(self.picked.get_or_init(|| picked))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn native(id: &str) -> Preset {
        Preset::Native(NativePreset::new(id, PresetValues::new()).expect("valid native id"))
    }

    #[test]
    fn native_ids_reject_hyphens_and_symbols() {
        assert!(NativePreset::new("sunset_glow", PresetValues::new()).is_ok());
        assert!(NativePreset::new("sunset-glow", PresetValues::new()).is_err());
        assert!(NativePreset::new("sunset glow", PresetValues::new()).is_err());
        assert!(NativePreset::new("", PresetValues::new()).is_err());
    }

    #[test]
    fn capabilities_follow_variant() {
        assert!(Preset::Creator.is_creator_preset());
        assert!(!Preset::Creator.is_real_preset());
        assert!(!Preset::Randomizer.is_real_preset());
        assert!(native("classic").is_real_preset());
        assert_eq!(Preset::Randomizer.preset_id(), "_random");
        assert_eq!(Preset::Creator.preset_name().expect("name"), "<Creator>");
        assert_eq!(native("sunset_glow").preset_name().expect("name"), "Sunset Glow");
        assert_eq!(Preset::Creator.get_preset_value("clock_font"), None);
    }

    #[test]
    fn saved_share_link_is_memoized() {
        let mut values = PresetValues::new();
        values.insert("bg", "blue");
        let data = PresetData::new("clock", "ocean-blue", values).expect("valid");
        let page = Url::parse("https://example.com/clock/").expect("url");
        let saved = SavedPreset::new(data, page);

        let first = saved.share_link().expect("link").to_string();
        let second = saved.share_link().expect("link");
        assert_eq!(first, second);
        assert!(first.starts_with("https://example.com/clock/#ocean-blue/"));
    }

    #[test]
    fn randomizer_memoizes_its_pick() {
        let randomizer = RandomizerPreset::new();
        let mut rng = StdRng::seed_from_u64(7);
        let pool = vec![native("a"), native("b"), native("c")];

        let first = randomizer
            .random_preset(|| Ok(pool.clone()), &mut rng)
            .expect("pick")
            .preset_id()
            .to_string();
        for _ in 0..10 {
            let again = randomizer
                .random_preset(|| Ok(vec![native("z")]), &mut rng)
                .expect("pick");
            assert_eq!(again.preset_id(), first);
        }
    }

    #[test]
    fn randomizer_fails_on_empty_pool() {
        let randomizer = RandomizerPreset::new();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(randomizer.random_preset(|| Ok(Vec::new()), &mut rng).is_err());
        assert!(randomizer.picked().is_none());
    }
}

//! ホスト(UI側)が提供する協調インターフェース。

use serde::Serialize;

use crate::utils::error::PresetError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedEvent {
    pub category: String,
    pub action: String,
    pub label: String,
}

/// プリセット選択メニューの1行。`value` が空の行は区切り線。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetMenuEntry {
    pub value: String,
    pub label: String,
}

impl PresetMenuEntry {
    pub fn divider(label: &str) -> Self {
        Self {
            value: String::new(),
            label: label.to_string(),
        }
    }

    pub fn is_divider(&self) -> bool {
        self.value.is_empty()
    }
}

pub trait Host {
    fn show_toast(&mut self, message: &str, is_error: bool);
    fn alert(&mut self, message: &str);
    fn track_event(&mut self, event: TrackedEvent);
    fn track_error(&mut self, error: &PresetError);
    fn refresh_preset_menu(&mut self, entries: &[PresetMenuEntry]);
}

/// すべてを `log` へ流すホスト。CLI から使う。
#[derive(Debug, Default)]
pub struct LogHost;

impl Host for LogHost {
    fn show_toast(&mut self, message: &str, is_error: bool) {
        if is_error {
            log::error!("{message}");
        } else {
            log::info!("{message}");
        }
    }

    fn alert(&mut self, message: &str) {
        log::warn!("{message}");
    }

    fn track_event(&mut self, event: TrackedEvent) {
        log::debug!(
            "event {} / {} / {}",
            event.category,
            event.action,
            event.label
        );
    }

    fn track_error(&mut self, error: &PresetError) {
        log::debug!("tracked error: {error}");
    }

    fn refresh_preset_menu(&mut self, entries: &[PresetMenuEntry]) {
        log::debug!("preset menu now has {} entries", entries.len());
    }
}

//! 起動時に一度だけ走らせる保存済みプリセットのマイグレーション。
//! スキーマバージョンは持たず、毎回全ステップを全レコードへ適用する。
//! 各ステップは適用済みのレコードに対して何も変更しないこと。

use serde_json::{Map, Value};

use crate::utils::error::{PresetError, PresetResult};
use crate::utils::storage::StoragePort;

pub const PRESETS_KEY_SUFFIX: &str = "_presets";

type Record = Map<String, Value>;

/// レコードを書き換えた場合に `true` を返す。
pub type MigrationStep = fn(&mut Record) -> PresetResult<bool>;

pub const MIGRATIONS: &[(&str, MigrationStep)] = &[
    ("migrate-subapp-id", migrate_subapp_id),
    ("drop-null-preset-values", drop_null_preset_values),
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub scanned_keys: usize,
    pub rewritten_keys: Vec<String>,
}

/// 旧形式の `app_name` を `subapp_id` へ移す。
fn migrate_subapp_id(record: &mut Record) -> PresetResult<bool> {
    let has_subapp_id = record.get("subapp_id").is_some_and(|value| !value.is_null());
    let Some(app_name) = record.remove("app_name") else {
        if !has_subapp_id {
            return Err(PresetError::MalformedRecord(
                "record has neither app_name nor subapp_id".to_string(),
            ));
        }
        return Ok(false);
    };

    if app_name.is_null() && !has_subapp_id {
        return Err(PresetError::MalformedRecord(
            "record has neither app_name nor subapp_id".to_string(),
        ));
    }
    if !app_name.is_null() {
        record.insert("subapp_id".to_string(), app_name);
    }
    Ok(true)
}

/// `preset_values` 内の `null` を取り除く(キー不在と同じ意味になる)。
fn drop_null_preset_values(record: &mut Record) -> PresetResult<bool> {
    let Some(Value::Object(values)) = record.get_mut("preset_values") else {
        return Ok(false);
    };

    let before = values.len();
    values.retain(|_, value| !value.is_null());
    Ok(values.len() != before)
}

fn migrate_key(storage: &dyn StoragePort, key: &str) -> PresetResult<bool> {
    let Some(raw) = storage.get(key)? else {
        return Ok(false);
    };
    if raw.trim().is_empty() {
        return Ok(false);
    }

    let mut records: Vec<Value> = serde_json::from_str(&raw)?;
    let mut mutated = false;
    for (index, record) in records.iter_mut().enumerate() {
        let Value::Object(record) = record else {
            return Err(PresetError::MalformedRecord(format!(
                "entry {index} under {key} is not an object"
            )));
        };
        for (name, step) in MIGRATIONS {
            if step(&mut *record)? {
                log::info!("migration {name} updated entry {index} under {key}");
                mutated = true;
            }
        }
    }

    if mutated {
        storage.set(key, &serde_json::to_string(&records)?)?;
    }
    Ok(mutated)
}

/// `*_presets` キーをすべて走査し、変更があったキーだけ書き戻す。
pub fn run_migrations(storage: &dyn StoragePort) -> PresetResult<MigrationReport> {
    let mut report = MigrationReport::default();
    for key in storage.keys()? {
        if !key.ends_with(PRESETS_KEY_SUFFIX) {
            continue;
        }
        report.scanned_keys += 1;
        if migrate_key(storage, &key)? {
            report.rewritten_keys.push(key);
        }
    }
    Ok(report)
}

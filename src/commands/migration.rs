// 保存済みプリセットのマイグレーション実行結果を返すコマンド。
use crate::utils::migration;
use crate::utils::storage::StoragePort;

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationRunResult {
    pub scanned_keys: usize,
    pub rewritten_keys: Vec<String>,
}

/// `*_presets` キーへ全ステップを適用する。
pub fn migration_run(storage: &dyn StoragePort) -> Result<MigrationRunResult, String> {
    let report = migration::run_migrations(storage).map_err(|e| e.to_string())?;
    Ok(MigrationRunResult {
        scanned_keys: report.scanned_keys,
        rewritten_keys: report.rewritten_keys,
    })
}

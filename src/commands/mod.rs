// commands層の公開モジュールを集約するエントリ。
// 新規commandを追加した場合は、この一覧へ追記して公開対象に含める。
pub mod migration;
pub mod presets;
pub mod settings;

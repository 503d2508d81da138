//! タブ設定のプリセット解決・永続化エンジン。
//! utils: 変換・保存形式・設定、services: プリセットとオプションの業務ロジック、
//! commands: DTOを返す薄い境界。

pub mod commands;
pub mod services;
pub mod utils;

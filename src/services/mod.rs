//! サービス層モジュール。
//! commands層から業務ロジックを分離し、入出力境界を薄く保つ。
// プリセットの解決・保存・共有の実処理はこの配下へ集約する。

pub mod host;
pub mod option;
pub mod preset;
pub mod preset_list;
pub mod preset_savior;
pub mod tab_settings;

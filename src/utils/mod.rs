// utils層のモジュール公開一覧。
// プリセットの素のデータ・変換・永続化など、状態を持たない部品をここへ集める。
pub mod error;
pub mod link;
pub mod migration;
pub mod name_id;
pub mod preset_data;
pub mod serializer;
pub mod settings;
pub mod storage;

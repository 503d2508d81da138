//! プリセット処理全体で共有するエラー型。

use thiserror::Error;

pub type PresetResult<T> = std::result::Result<T, PresetError>;

/// エラーの深刻度。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// プログラム側の契約違反。即座に処理を中断する。
    InvariantViolation,
    /// 重複IDなどの衝突。ユーザーへ通知して処理を取りやめる。
    Conflict,
    /// 壊れた共有リンクなど、ユーザー入力起因で回復可能なもの。
    Recoverable,
}

#[derive(Debug, Error)]
pub enum PresetError {
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
    #[error("preset not found: {preset_id}")]
    PresetNotFound { preset_id: String },
    #[error("a preset with id \"{preset_id}\" already exists")]
    DuplicatePresetId { preset_id: String },
    #[error("a preset name is required")]
    MissingPresetName,
    #[error("preset belongs to subapp \"{found}\", expected \"{expected}\"")]
    WrongSubapp { expected: String, found: String },
    #[error("could not find a free copy id for \"{preset_id}\"")]
    CopyIdExhausted { preset_id: String },
    #[error("malformed preset record: {0}")]
    MalformedRecord(String),
    #[error("malformed share link: {0}")]
    MalformedLink(String),
    #[error("storage error for key {key}: {message}")]
    Storage { key: String, message: String },
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("failed to encode or decode preset JSON")]
    Json(#[from] serde_json::Error),
}

impl PresetError {
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicatePresetId { .. } | Self::MissingPresetName | Self::WrongSubapp { .. } => {
                ErrorKind::Conflict
            }
            Self::MalformedRecord(_) | Self::MalformedLink(_) | Self::Json(_) => {
                ErrorKind::Recoverable
            }
            Self::InvariantViolation(_)
            | Self::PresetNotFound { .. }
            | Self::CopyIdExhausted { .. }
            | Self::Storage { .. }
            | Self::Config(_) => ErrorKind::InvariantViolation,
        }
    }
}

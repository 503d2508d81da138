use crate::utils::error::{PresetError, PresetResult};

/// IDで単語を連結する区切り文字。
pub const ID_SEPARATOR: &str = "-";

fn is_name_separator(c: char) -> bool {
    c.is_whitespace() || c == '-' || c == '_'
}

fn is_id_separator(c: char) -> bool {
    c == '-' || c == '_'
}

/// 表示名をIDへ変換する。
pub fn name_to_id(name: &str) -> PresetResult<String> {
    if name.is_empty() {
        return Err(PresetError::invariant("cannot derive a preset id from an empty name"));
    }

    Ok(name
        .split(is_name_separator)
        .filter(|token| !token.is_empty())
        .map(|token| token.to_lowercase())
        .collect::<Vec<_>>()
        .join(ID_SEPARATOR))
}

/// IDを表示名へ変換する。各単語の先頭文字のみ大文字化する。
pub fn id_to_name(id: &str) -> PresetResult<String> {
    if id.is_empty() {
        return Err(PresetError::invariant("cannot derive a preset name from an empty id"));
    }

    Ok(id
        .split(is_id_separator)
        .filter(|token| !token.is_empty())
        .map(capitalize_first)
        .collect::<Vec<_>>()
        .join(" "))
}

fn capitalize_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

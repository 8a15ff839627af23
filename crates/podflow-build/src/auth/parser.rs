//! 認証ファイルの解析
//!
//! `auths` マップのキー（レジストリ名）だけを取り出します。
//! 各エントリの中身（エンコードされた認証情報）は参照しません。

use crate::error::AuthError;
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::Path;

/// 認証ファイルから認証済みレジストリの集合を取得
///
/// - `auths` が無い → 空集合（認証情報を持たない設定ファイル）
/// - JSON として不正、トップレベルがオブジェクトでない、`auths` がオブジェクトでない
///   → [`AuthError::MalformedAuthFile`]
pub fn parse_auth_file(path: &Path) -> Result<BTreeSet<String>, AuthError> {
    let content = std::fs::read_to_string(path).map_err(|source| AuthError::AuthFileRead {
        path: path.to_path_buf(),
        source,
    })?;

    parse_auths(&content).map_err(|message| AuthError::MalformedAuthFile {
        path: path.to_path_buf(),
        message,
    })
}

fn parse_auths(content: &str) -> Result<BTreeSet<String>, String> {
    let value: Value = serde_json::from_str(content).map_err(|e| e.to_string())?;

    let root = value
        .as_object()
        .ok_or_else(|| format!("expected a JSON object, found {}", kind(&value)))?;

    match root.get("auths") {
        None | Some(Value::Null) => Ok(BTreeSet::new()),
        Some(Value::Object(auths)) => Ok(auths.keys().cloned().collect()),
        Some(other) => Err(format!(
            "\"auths\" must be an object, found {}",
            kind(other)
        )),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

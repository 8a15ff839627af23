//! イメージ名の操作

use crate::error::{BuildError, BuildResult};

/// タグの最大長（podman / OCI distribution と同じ）
const MAX_TAG_LEN: usize = 128;

/// タグが podman に受け付けられる形か確認
///
/// `[A-Za-z0-9_][A-Za-z0-9_.-]{0,127}` に一致しなければ [`BuildError::InvalidTag`]。
pub fn validate_tag(tag: &str) -> BuildResult<()> {
    let invalid = |reason: String| {
        Err(BuildError::InvalidTag {
            tag: tag.to_string(),
            reason,
        })
    };

    let Some(first) = tag.chars().next() else {
        return invalid("tag is empty".to_string());
    };
    if tag.len() > MAX_TAG_LEN {
        return invalid(format!(
            "{} characters, at most {} allowed",
            tag.len(),
            MAX_TAG_LEN
        ));
    }
    if matches!(first, '.' | '-') {
        return invalid(format!("must not start with '{}'", first));
    }
    match tag
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')))
    {
        Some(c) => invalid(format!("contains '{}'", c)),
        None => Ok(()),
    }
}

/// イメージ名からレジストリを抽出
///
/// # Examples
/// - `ghcr.io/org/app:tag` -> `Some("ghcr.io")`
/// - `localhost:5000/app` -> `Some("localhost:5000")`
/// - `myuser/app:tag` -> `None`（レジストリ指定なし）
pub fn extract_registry(image: &str) -> Option<&str> {
    let (first, _) = image.split_once('/')?;

    // `.` か `:` を含む先頭要素をレジストリとみなす
    if first.contains('.') || first.contains(':') || first == "localhost" {
        Some(first)
    } else {
        None
    }
}

/// save 用のアーカイブ名
///
/// 最後のパス要素の `.` `/` `-` `*` `:` を `_` に置き換え、`.tar.gz` を付ける。
///
/// - `registry.example.com/org/my-app:1.0.0` -> `my_app_1_0_0.tar.gz`
pub fn archive_name(full_image_name: &str) -> String {
    let last = full_image_name
        .rsplit('/')
        .next()
        .unwrap_or(full_image_name);
    let normalised: String = last
        .chars()
        .map(|c| match c {
            '.' | '/' | '-' | '*' | ':' => '_',
            other => other,
        })
        .collect();
    format!("{}.tar.gz", normalised)
}

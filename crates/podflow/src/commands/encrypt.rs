use super::GlobalOptions;
use anyhow::bail;

/// 値を暗号化して標準出力に出す
pub fn handle(options: &GlobalOptions, value: &str) -> anyhow::Result<()> {
    if options.master_key.is_none() {
        bail!("マスターキーが指定されていません。--master-key または PODFLOW_MASTER_KEY を設定してください");
    }

    let encrypted = options.decrypter()?.encrypt_value(value)?;
    println!("{}", encrypted);
    Ok(())
}

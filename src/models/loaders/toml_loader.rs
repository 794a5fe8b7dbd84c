use crate::models::question::Question;
use crate::models::SetId;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

/// 单套试题文件（`set-<id>.toml`）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestionSetFile {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// 从 TOML 文件加载单套试题
pub async fn load_question_set(toml_file_path: &Path) -> Result<QuestionSetFile> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .with_context(|| format!("无法读取TOML文件: {}", toml_file_path.display()))?;

    let set: QuestionSetFile = toml::from_str(&content)
        .with_context(|| format!("无法解析TOML文件: {}", toml_file_path.display()))?;

    Ok(set)
}

/// 从文件名解析套号，例如 `set-3.toml` → 3
pub fn parse_set_file_name(path: &Path) -> Option<SetId> {
    if path.extension().and_then(|s| s.to_str()) != Some("toml") {
        return None;
    }
    path.file_stem()
        .and_then(|s| s.to_str())
        .and_then(|stem| stem.strip_prefix("set-"))
        .and_then(|n| n.parse::<u8>().ok())
        .map(SetId::new)
}

/// 从文件夹中加载所有试题文件
///
/// 无法解析的文件只记录警告并跳过。
pub async fn load_all_question_sets(folder_path: &str) -> Result<BTreeMap<SetId, Vec<Question>>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        anyhow::bail!("文件夹不存在: {}", folder_path);
    }

    let mut sets = BTreeMap::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let Some(set_id) = parse_set_file_name(&path) else {
            continue;
        };

        tracing::info!(
            "正在加载: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        );

        match load_question_set(&path).await {
            Ok(file) => {
                tracing::info!("第 {} 套: 成功加载 {} 个题目", set_id, file.questions.len());
                sets.insert(set_id, file.questions);
            }
            Err(e) => {
                tracing::warn!("加载文件失败 {}: {:#}", path.display(), e);
            }
        }
    }

    Ok(sets)
}

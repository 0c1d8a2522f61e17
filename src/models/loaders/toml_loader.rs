use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::fs;

use crate::error::{AppResult, FileError};
use crate::models::question::QuestionEntry;
use crate::models::taxonomy::{MajorCategory, Taxonomy};

/// 分类体系文件：`[[categories]] name = "..." subcategories = [...]`
#[derive(Debug, Deserialize)]
struct TaxonomyFile {
    categories: Vec<MajorCategory>,
}

/// 待评估题目文件：`[[questions]] question = "..." answer = "..." category_tag = "..."`
#[derive(Debug, Deserialize)]
struct QuestionFile {
    #[serde(default)]
    questions: Vec<QuestionEntry>,
}

/// 从 TOML 文件加载分类体系
pub async fn load_taxonomy(toml_file_path: &Path) -> AppResult<Taxonomy> {
    let file: TaxonomyFile = read_toml(toml_file_path).await?;
    let taxonomy = Taxonomy::new(file.categories)?;

    tracing::info!(
        "成功加载分类体系: {} 个大类 ({})",
        taxonomy.categories().len(),
        toml_file_path.display()
    );

    Ok(taxonomy)
}

/// 从 TOML 文件加载待评估题目
pub async fn load_question_entries(toml_file_path: &Path) -> AppResult<Vec<QuestionEntry>> {
    let file: QuestionFile = read_toml(toml_file_path).await?;

    tracing::info!(
        "成功加载 {} 个题目 ({})",
        file.questions.len(),
        toml_file_path.display()
    );

    Ok(file.questions)
}

async fn read_toml<T: DeserializeOwned>(toml_file_path: &Path) -> AppResult<T> {
    let path = toml_file_path.display().to_string();

    let content = fs::read_to_string(toml_file_path)
        .await
        .map_err(|source| FileError::ReadFailed {
            path: path.clone(),
            source,
        })?;

    let parsed = toml::from_str(&content).map_err(|source| FileError::TomlParseFailed { path, source })?;

    Ok(parsed)
}

//! 分类标签校验 - 业务能力层
//!
//! 标签格式：`[大类 - 子类]`。格式通过后错误累积而不是短路，
//! 一次调用可以同时报告大类与子类的问题。

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::Serialize;

use crate::models::taxonomy::Taxonomy;

static CATEGORY_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[(.+?)\s*-\s*(.+?)\]$").expect("合法的正则"));

/// 生成分类标签
pub fn format_category_tag(major: &str, subcategory: &str) -> String {
    format!("[{} - {}]", major, subcategory)
}

/// 单个标签的校验结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryValidation {
    pub valid: bool,
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub major_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
}

impl CategoryValidation {
    fn rejected(error: String) -> Self {
        Self {
            valid: false,
            errors: vec![error],
            major_category: None,
            subcategory: None,
        }
    }
}

/// 单题校验记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCheck {
    pub question: String,
    pub validation: CategoryValidation,
}

/// 批量校验汇总
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBatchSummary {
    pub results: Vec<CategoryCheck>,
    pub total_count: usize,
    pub valid_count: usize,
    pub invalid_count: usize,
    pub pass_rate: f64,
}

/// 分类标签校验器
#[derive(Debug, Clone)]
pub struct CategoryValidator {
    taxonomy: Arc<Taxonomy>,
}

impl CategoryValidator {
    pub fn new(taxonomy: Arc<Taxonomy>) -> Self {
        Self { taxonomy }
    }

    /// 校验单个分类标签
    pub fn validate_category(&self, category_tag: &str) -> CategoryValidation {
        let tag = category_tag.trim();

        if tag.is_empty() {
            return CategoryValidation::rejected("分类标签为空".to_string());
        }

        let Some(caps) = CATEGORY_TAG_RE.captures(tag) else {
            return CategoryValidation::rejected(format!(
                "格式错误: 期望 [Major Category - Subcategory]，实际为 \"{}\"",
                category_tag
            ));
        };

        let major = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
        let sub = caps.get(2).map(|m| m.as_str().trim()).unwrap_or_default();

        if major.is_empty() || sub.is_empty() {
            return CategoryValidation::rejected("缺少大类或子类".to_string());
        }

        let mut errors = Vec::new();

        match self.taxonomy.subcategories(major) {
            None => {
                let options: Vec<&str> = self.taxonomy.majors().collect();
                errors.push(format!(
                    "无效的大类: \"{}\"。可选: {}",
                    major,
                    options.join(", ")
                ));
                // 大类无效时子类无从比对，但仍要报告子类不在任何大类下
                if !self.taxonomy.all_subcategories().contains(&sub) {
                    errors.push(format!("无效的子类: \"{}\" 不属于任何大类", sub));
                }
            }
            Some(subs) if !subs.iter().any(|s| s == sub) => {
                errors.push(format!(
                    "无效的子类: \"{}\" 不属于 \"{}\"。可选: {}",
                    sub,
                    major,
                    subs.join(", ")
                ));
            }
            Some(_) => {}
        }

        CategoryValidation {
            valid: errors.is_empty(),
            errors,
            major_category: Some(major.to_string()),
            subcategory: Some(sub.to_string()),
        }
    }

    /// 批量校验 `(题干, 分类标签)`
    pub fn validate_categories<'a>(
        &self,
        items: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> CategoryBatchSummary {
        let results: Vec<CategoryCheck> = items
            .into_iter()
            .map(|(question, tag)| CategoryCheck {
                question: question.to_string(),
                validation: self.validate_category(tag),
            })
            .collect();

        let total_count = results.len();
        let valid_count = results.iter().filter(|r| r.validation.valid).count();
        let pass_rate = if total_count == 0 {
            0.0
        } else {
            valid_count as f64 / total_count as f64
        };

        CategoryBatchSummary {
            results,
            total_count,
            valid_count,
            invalid_count: total_count - valid_count,
            pass_rate,
        }
    }
}

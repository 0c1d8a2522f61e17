//! 题目分类体系
//!
//! 两级分类：大类 → 子类列表。构造后不可变，通过 `Arc<Taxonomy>`
//! 注入提示词构建、结构校验与分类校验。

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::ConfigError;

/// 内置分类（WQC 风格），顺序即提示词中的展示顺序
static WQC_CATEGORIES: phf::OrderedMap<&'static str, &'static [&'static str]> = phf::phf_ordered_map! {
    "Culture" => &[
        "Architecture",
        "Fine Art",
        "Mythology",
        "Religion",
        "Philosophy",
        "Performing Arts",
        "Language",
    ],
    "Entertainment" => &[
        "Film",
        "Television",
        "Popular Music",
        "Classical Music",
        "Theatre",
        "Celebrities",
    ],
    "History" => &[
        "History",
        "Current Affairs",
        "Exploration",
        "Military History",
        "Politics",
    ],
    "Lifestyle" => &[
        "Food & Drink",
        "Fashion",
        "Design",
        "Brands",
        "Travel & Leisure",
    ],
    "Media" => &[
        "Literature",
        "Journalism",
        "Comics",
        "Internet",
        "Advertising",
    ],
    "Sciences" => &[
        "Physics",
        "Chemistry",
        "Biology",
        "Fauna",
        "Flora",
        "Medicine",
        "Mathematics",
        "Astronomy",
        "Technology",
    ],
    "Sport & Games" => &[
        "Sports",
        "Olympics",
        "Football",
        "Motorsport",
        "Games",
    ],
    "World" => &[
        "Physical Geography",
        "Human Geography",
        "Countries",
        "Cities",
        "Flags",
    ],
};

/// 大类及其子类
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MajorCategory {
    pub name: String,
    pub subcategories: Vec<String>,
}

/// 分类体系
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Taxonomy {
    categories: Vec<MajorCategory>,
}

impl Taxonomy {
    /// 创建分类体系并校验约束：
    /// 至少一个大类、大类名唯一、子类列表非空且在列表内唯一
    pub fn new(categories: Vec<MajorCategory>) -> Result<Self, ConfigError> {
        if categories.is_empty() {
            return Err(invalid("至少需要一个大类"));
        }

        for (idx, category) in categories.iter().enumerate() {
            if category.name.trim().is_empty() {
                return Err(invalid(format!("第 {} 个大类名称为空", idx + 1)));
            }
            if categories[..idx].iter().any(|c| c.name == category.name) {
                return Err(invalid(format!("大类 \"{}\" 重复", category.name)));
            }
            if category.subcategories.is_empty() {
                return Err(invalid(format!("大类 \"{}\" 没有子类", category.name)));
            }
            for (sub_idx, sub) in category.subcategories.iter().enumerate() {
                if sub.trim().is_empty() {
                    return Err(invalid(format!("大类 \"{}\" 含有空子类", category.name)));
                }
                if category.subcategories[..sub_idx].contains(sub) {
                    return Err(invalid(format!(
                        "大类 \"{}\" 的子类 \"{}\" 重复",
                        category.name, sub
                    )));
                }
            }
        }

        Ok(Self { categories })
    }

    /// 内置分类体系
    pub fn builtin() -> Self {
        let categories = WQC_CATEGORIES
            .entries()
            .map(|(name, subs)| MajorCategory {
                name: (*name).to_string(),
                subcategories: subs.iter().map(|s| (*s).to_string()).collect(),
            })
            .collect();

        Self { categories }
    }

    pub fn categories(&self) -> &[MajorCategory] {
        &self.categories
    }

    /// 所有大类名称（保持顺序）
    pub fn majors(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.name.as_str())
    }

    /// 大类下的子类列表，大类不存在时返回 None
    pub fn subcategories(&self, major: &str) -> Option<&[String]> {
        self.categories
            .iter()
            .find(|c| c.name == major)
            .map(|c| c.subcategories.as_slice())
    }

    pub fn contains_major(&self, major: &str) -> bool {
        self.subcategories(major).is_some()
    }

    /// 大类与子类必须同时校验
    pub fn contains(&self, major: &str, subcategory: &str) -> bool {
        self.subcategories(major)
            .is_some_and(|subs| subs.iter().any(|s| s == subcategory))
    }

    /// 所有子类（去重，保持首次出现的顺序）
    pub fn all_subcategories(&self) -> Vec<&str> {
        let mut all: Vec<&str> = Vec::new();
        for sub in self.categories.iter().flat_map(|c| c.subcategories.iter()) {
            if !all.contains(&sub.as_str()) {
                all.push(sub);
            }
        }
        all
    }

    /// 以 `{大类: [子类...]}` 形式输出的 JSON，用于嵌入提示词
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Serialize for Taxonomy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.categories.len()))?;
        for category in &self.categories {
            map.serialize_entry(&category.name, &category.subcategories)?;
        }
        map.end()
    }
}

fn invalid(reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidTaxonomy {
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(name: &str, subs: &[&str]) -> MajorCategory {
        MajorCategory {
            name: name.to_string(),
            subcategories: subs.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_builtin_satisfies_invariants() {
        let builtin = Taxonomy::builtin();
        let rebuilt = Taxonomy::new(builtin.categories().to_vec()).unwrap();
        assert_eq!(builtin, rebuilt);
        assert_eq!(builtin.majors().count(), 8);
    }

    #[test]
    fn test_builtin_order_is_stable() {
        let taxonomy = Taxonomy::builtin();
        let majors: Vec<&str> = taxonomy.majors().collect();
        assert_eq!(
            majors,
            vec![
                "Culture",
                "Entertainment",
                "History",
                "Lifestyle",
                "Media",
                "Sciences",
                "Sport & Games",
                "World"
            ]
        );
    }

    #[test]
    fn test_contains_checks_both_levels() {
        let taxonomy = Taxonomy::builtin();
        assert!(taxonomy.contains("Culture", "Mythology"));
        assert!(!taxonomy.contains("Sciences", "Mythology"));
        assert!(!taxonomy.contains("Nonsense", "Mythology"));
    }

    #[test]
    fn test_rejects_empty_subcategories() {
        let result = Taxonomy::new(vec![category("Culture", &[])]);
        assert!(matches!(result, Err(ConfigError::InvalidTaxonomy { .. })));
    }

    #[test]
    fn test_rejects_duplicate_subcategory() {
        let result = Taxonomy::new(vec![category("Culture", &["Mythology", "Mythology"])]);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_duplicate_major() {
        let result = Taxonomy::new(vec![
            category("Culture", &["Mythology"]),
            category("Culture", &["Fine Art"]),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_json_keeps_declaration_order() {
        let taxonomy = Taxonomy::new(vec![
            category("World", &["Flags"]),
            category("Culture", &["Mythology"]),
        ])
        .unwrap();

        let json = taxonomy.to_pretty_json();
        let world = json.find("World").unwrap();
        let culture = json.find("Culture").unwrap();
        assert!(world < culture);
    }

    #[test]
    fn test_all_subcategories_deduplicates() {
        let taxonomy = Taxonomy::new(vec![
            category("History", &["History", "Politics"]),
            category("Media", &["Politics"]),
        ])
        .unwrap();

        assert_eq!(taxonomy.all_subcategories(), vec!["History", "Politics"]);
    }
}

//! 菜系分类
//! 名称分词命中优先, 其次搜索关键词, 最后是提供方类别标签

/// 提供方类别/关键词到规范菜系标签的映射
/// 按声明顺序匹配; 空值表示该键不参与分类(泛化类别)
const CUISINE_MAPPING: &[(&str, &str)] = &[
    // 泛化类别
    ("restaurant", ""),
    ("food", ""),
    ("point_of_interest", ""),
    ("establishment", ""),
    ("meal_takeaway", ""),
    ("meal_delivery", ""),
    ("store", ""),
    ("bar", ""),
    ("cafe", ""),
    ("bakery", ""),
    // 具体菜系
    ("american", "American"),
    ("steakhouse", "American"),
    ("burger", "American"),
    ("bbq", "American"),
    ("italian", "Italian"),
    ("pizza", "Italian"),
    ("chinese", "Chinese"),
    ("asian", "Chinese"),
    ("japanese", "Japanese"),
    ("sushi", "Japanese"),
    ("ramen", "Japanese"),
    ("mexican", "Mexican"),
    ("taco", "Mexican"),
    ("indian", "Indian"),
    ("curry", "Indian"),
    ("thai", "Thai"),
    ("mediterranean", "Mediterranean"),
    ("greek", "Mediterranean"),
    ("middle_eastern", "Mediterranean"),
];

fn lookup(key: &str) -> Option<&'static str> {
    CUISINE_MAPPING
        .iter()
        .find(|(mapping_key, _)| *mapping_key == key)
        .map(|(_, tag)| *tag)
}

/// 纯函数: 同样的输入永远得到同样的标签
/// 没有可识别菜系时返回 None
pub fn classify(name: &str, types: &[String], keyword: Option<&str>) -> Option<&'static str> {
    // 1. 名称分词后与映射键精确比较, 按映射表声明顺序决出
    let lowered = name.to_lowercase();
    let tokens: Vec<&str> = lowered
        .split(|c: char| c.is_whitespace() || matches!(c, '-' | '.' | ',' | '&' | '(' | ')'))
        .filter(|token| !token.is_empty())
        .collect();
    for (key, tag) in CUISINE_MAPPING {
        if !tag.is_empty() && tokens.iter().any(|token| token == key) {
            return Some(tag);
        }
    }

    // 2. 搜索关键词本身就是映射键
    if let Some(keyword) = keyword {
        if let Some(tag) = lookup(&keyword.to_lowercase()) {
            if !tag.is_empty() {
                return Some(tag);
            }
        }
    }

    // 3. 按提供方给出的顺序取第一个非空类别
    for place_type in types {
        if let Some(tag) = lookup(&place_type.to_lowercase()) {
            if !tag.is_empty() {
                return Some(tag);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn name_token_wins_over_keyword_and_types() {
        let result = classify(
            "Tony's Pizza House",
            &types(&["restaurant", "mexican"]),
            Some("Chinese"),
        );
        assert_eq!(result, Some("Italian"));
    }

    #[test]
    fn name_matches_whole_tokens_only() {
        // "sushiya" 不等于映射键 "sushi", 不触发名称规则
        assert_eq!(
            classify("Sushiya", &types(&["restaurant"]), None),
            None
        );
        assert_eq!(
            classify("Sushi - Ya", &types(&["restaurant"]), None),
            Some("Japanese")
        );
    }

    #[test]
    fn keyword_wins_over_types() {
        let result = classify(
            "Golden Dragon",
            &types(&["restaurant", "japanese"]),
            Some("Chinese"),
        );
        assert_eq!(result, Some("Chinese"));
    }

    #[test]
    fn keyword_is_case_insensitive() {
        assert_eq!(
            classify("Some Place", &[], Some("mExIcAn")),
            Some("Mexican")
        );
    }

    #[test]
    fn generic_types_never_classify() {
        assert_eq!(
            classify(
                "Corner Spot",
                &types(&["restaurant", "food", "point_of_interest", "establishment"]),
                None,
            ),
            None
        );
    }

    #[test]
    fn first_non_empty_type_wins() {
        let result = classify(
            "Corner Spot",
            &types(&["restaurant", "curry", "thai"]),
            None,
        );
        assert_eq!(result, Some("Indian"));
    }

    #[test]
    fn classification_is_deterministic() {
        let place_types = types(&["restaurant", "greek"]);
        let first = classify("Harbor View", &place_types, Some("Mediterranean"));
        for _ in 0..10 {
            assert_eq!(classify("Harbor View", &place_types, Some("Mediterranean")), first);
        }
        assert_eq!(first, Some("Mediterranean"));
    }

    #[test]
    fn no_match_yields_none() {
        assert_eq!(classify("Mystery Venue", &[], None), None);
    }
}

//! 通知模板渲染
//!
//! 模板正文使用 `{name}` 形式的占位符。渲染是单遍替换，
//! 已替换进去的值不会被再次扫描；未知占位符保留原样。
//!
//! ```ignore
//! let fields = HashMap::from([("name".to_string(), "Ann Lee".to_string())]);
//! let text = template::render("Dear {name}, evacuate {city}!", &fields);
//! // "Dear Ann Lee, evacuate {city}!"
//! ```

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{NotificationError, Result};
use crate::models::Person;

/// 接收人姓名占位符
pub const NAME_FIELD: &str = "name";
/// 接收人城市占位符
pub const CITY_FIELD: &str = "city";

/// 每个模板正文必须包含的占位符
pub const REQUIRED_FIELDS: [&str; 2] = [NAME_FIELD, CITY_FIELD];

static PLACEHOLDER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("占位符正则非法")
});

/// 渲染模板正文
pub fn render(body: &str, fields: &HashMap<String, String>) -> String {
    PLACEHOLDER_REGEX
        .replace_all(body, |caps: &regex::Captures| match fields.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// 提取正文中出现的占位符名称（按出现顺序，可重复）
pub fn placeholders(body: &str) -> Vec<String> {
    PLACEHOLDER_REGEX
        .captures_iter(body)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// 校验正文至少包含一次 `{name}` 和 `{city}`
pub fn validate_body(body: &str) -> Result<()> {
    let present = placeholders(body);
    let missing: Vec<String> = REQUIRED_FIELDS
        .iter()
        .filter(|field| !present.iter().any(|p| p == *field))
        .map(|field| format!("{{{field}}}"))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(NotificationError::Validation(format!(
            "模板缺少占位符: {}",
            missing.join(", ")
        )))
    }
}

/// 构造接收人的渲染字段
pub fn recipient_fields(person: &Person) -> HashMap<String, String> {
    HashMap::from([
        (NAME_FIELD.to_string(), person.full_name.clone()),
        (CITY_FIELD.to_string(), person.city.clone()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(name: &str, city: &str) -> HashMap<String, String> {
        HashMap::from([
            (NAME_FIELD.to_string(), name.to_string()),
            (CITY_FIELD.to_string(), city.to_string()),
        ])
    }

    #[test]
    fn test_render_example() {
        let text = render("Dear {name}, evacuate {city}!", &fields("Ann Lee", "Riverton"));
        assert_eq!(text, "Dear Ann Lee, evacuate Riverton!");
    }

    #[test]
    fn test_render_repeated_placeholders() {
        let text = render("{name}! {name}, leave {city} now", &fields("Bo", "Lakeside"));
        assert_eq!(text, "Bo! Bo, leave Lakeside now");
    }

    #[test]
    fn test_render_keeps_unknown_placeholders() {
        let text = render("{name} meet at {shelter}", &fields("Bo", "Lakeside"));
        assert_eq!(text, "Bo meet at {shelter}");
    }

    #[test]
    fn test_render_does_not_rescan_values() {
        let text = render("{name} in {city}", &fields("{city}", "Lakeside"));
        assert_eq!(text, "{city} in Lakeside");
    }

    #[test]
    fn test_render_leaves_stray_braces() {
        let text = render("{ name } {} {name", &fields("Bo", "Lakeside"));
        assert_eq!(text, "{ name } {} {name");
    }

    #[test]
    fn test_validate_body() {
        assert!(validate_body("Dear {name}, evacuate {city}!").is_ok());

        let err = validate_body("Dear {name}, evacuate now").unwrap_err();
        assert!(err.to_string().contains("{city}"));

        let err = validate_body("Evacuate now").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("{name}") && message.contains("{city}"));
    }
}

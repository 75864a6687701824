use serde::Serialize;
use std::fmt;

use crate::error::AppError;

/// 姓名缺失时统一的校验文案
pub const NAMES_REQUIRED: &str = "Both first_name and last_name are required";

/// 两个字符的大写首字母组合，例如 `AS`。
///
/// 只能通过 [`Initials::from_names`] 构造，因此始终恰好包含两个字符。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Initials(String);

impl Initials {
    /// 取名与姓各自去除首尾空白后的第一个字符并转为大写。
    ///
    /// 任一输入在去除空白后为空时返回 `AppError::Validation`。
    pub fn from_names(first_name: &str, last_name: &str) -> Result<Self, AppError> {
        let (Some(first), Some(last)) = (leading_char(first_name), leading_char(last_name)) else {
            return Err(AppError::Validation(NAMES_REQUIRED.to_string()));
        };

        let mut s = String::with_capacity(8);
        s.push(upper_single(first));
        s.push(upper_single(last));
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Initials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn leading_char(name: &str) -> Option<char> {
    name.trim().chars().next()
}

/// 大写映射为多字符（如 `ß` → `SS`）时保留原字符，保证结果仍为单个字符。
fn upper_single(c: char) -> char {
    let mut upper = c.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(u), None) => u,
        _ => c,
    }
}

#[cfg(test)]
mod tests {
    use super::{Initials, NAMES_REQUIRED};
    use crate::error::AppError;

    #[test]
    fn takes_first_char_of_each_name_uppercased() {
        let i = Initials::from_names("arjun", "sharma").expect("initials");
        assert_eq!(i.as_str(), "AS");
        let i = Initials::from_names("  mary ", "\tjane").expect("initials");
        assert_eq!(i.as_str(), "MJ");
    }

    #[test]
    fn unicode_first_chars_are_single_units() {
        let i = Initials::from_names("élodie", "øster").expect("initials");
        assert_eq!(i.as_str(), "ÉØ");
        assert_eq!(i.as_str().chars().count(), 2);

        let i = Initials::from_names("李", "雷").expect("initials");
        assert_eq!(i.as_str().chars().count(), 2);
    }

    #[test]
    fn multi_char_uppercase_mapping_keeps_original_char() {
        let i = Initials::from_names("ßam", "lee").expect("initials");
        assert_eq!(i.as_str(), "ßL");
    }

    #[test]
    fn empty_or_blank_names_are_rejected() {
        for (first, last) in [("", "Doe"), ("John", ""), ("   ", "Doe"), ("John", "\n\t"), ("", "")] {
            match Initials::from_names(first, last) {
                Err(AppError::Validation(msg)) => assert_eq!(msg, NAMES_REQUIRED),
                other => panic!("expected validation error for ({first:?}, {last:?}), got {other:?}"),
            }
        }
    }
}

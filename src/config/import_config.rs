// ==========================================
// 发票导入系统 - 导入配置
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE（与 config_kv 中的取值一致）
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 事务策略 (Commit Policy)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommitPolicy {
    /// 整个运行包在一个事务中，任一致命错误整体回滚
    #[default]
    AllOrNothing,
    /// 每次写入立即提交，失败前的写入保留
    BestEffort,
}

impl CommitPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommitPolicy::AllOrNothing => "ALL_OR_NOTHING",
            CommitPolicy::BestEffort => "BEST_EFFORT",
        }
    }

    /// 解析配置值（大小写不敏感），无法识别返回 None
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "ALL_OR_NOTHING" => Some(CommitPolicy::AllOrNothing),
            "BEST_EFFORT" => Some(CommitPolicy::BestEffort),
            _ => None,
        }
    }
}

// ==========================================
// 坏行策略 (Malformed Row Policy)
// ==========================================
// 仅作用于单元格提取阶段的错误（行结构错误/数值解析失败）
// 存储写入失败始终中止
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MalformedRowPolicy {
    #[default]
    Abort,
    Skip,
}

impl MalformedRowPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MalformedRowPolicy::Abort => "ABORT",
            MalformedRowPolicy::Skip => "SKIP",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "ABORT" => Some(MalformedRowPolicy::Abort),
            "SKIP" => Some(MalformedRowPolicy::Skip),
            _ => None,
        }
    }
}

// ==========================================
// 工作表范围 (Sheet Scope)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SheetScope {
    /// 依次读取所有工作表，每张表的首行均视为表头
    #[default]
    All,
    /// 仅读取第一张工作表
    First,
}

impl SheetScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            SheetScope::All => "ALL",
            SheetScope::First => "FIRST",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "ALL" => Some(SheetScope::All),
            "FIRST" => Some(SheetScope::First),
            _ => None,
        }
    }
}

impl fmt::Display for CommitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for MalformedRowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for SheetScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// ImportConfig - 单次导入运行的配置
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImportConfig {
    pub commit_policy: CommitPolicy,
    pub malformed_row_policy: MalformedRowPolicy,
    pub sheet_scope: SheetScope,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_strict() {
        let config = ImportConfig::default();
        assert_eq!(config.commit_policy, CommitPolicy::AllOrNothing);
        assert_eq!(config.malformed_row_policy, MalformedRowPolicy::Abort);
        assert_eq!(config.sheet_scope, SheetScope::All);
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(CommitPolicy::parse(" best_effort "), Some(CommitPolicy::BestEffort));
        assert_eq!(MalformedRowPolicy::parse("skip"), Some(MalformedRowPolicy::Skip));
        assert_eq!(SheetScope::parse("First"), Some(SheetScope::First));
        assert_eq!(CommitPolicy::parse("sometimes"), None);
    }

    #[test]
    fn test_serde_uses_screaming_snake_case() {
        let json = serde_json::to_string(&CommitPolicy::AllOrNothing).unwrap();
        assert_eq!(json, "\"ALL_OR_NOTHING\"");
    }
}

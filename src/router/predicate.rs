//! 世界名谓词：`ifInWorld` / `ifNotInWorld`
//!
//! 正则在规则表构建时编译一次，大小写不敏感、整串匹配。
//! 编译失败的模式保留失败状态，每次求值都会报告错误并让规则不生效，
//! 不影响其它规则。

use std::fmt;

use regex::{Regex, RegexBuilder};
use tracing::{debug, error};

use super::rules::VhostRule;
use crate::common::VhostError;

/// 已编译（或编译失败）的世界名模式
#[derive(Clone)]
pub struct WorldPattern {
    source: String,
    compiled: Result<Regex, regex::Error>,
}

impl WorldPattern {
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let compiled = compile_anchored(&source);
        Self { source, compiled }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_valid(&self) -> bool {
        self.compiled.is_ok()
    }

    /// 整串匹配 `world`
    pub fn full_match(&self, world: &str) -> Result<bool, VhostError> {
        match &self.compiled {
            Ok(re) => Ok(re.is_match(world)),
            Err(e) => Err(VhostError::PatternCompile {
                pattern: self.source.clone(),
                source: e.clone(),
            }),
        }
    }
}

impl fmt::Debug for WorldPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorldPattern")
            .field("source", &self.source)
            .field("valid", &self.is_valid())
            .finish()
    }
}

impl fmt::Display for WorldPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/", self.source)
    }
}

fn build(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

/// 先校验原始模式，再包一层锚点。
/// 原始模式括号不平衡时包装后可能反而能编译，所以必须先单独编译一次。
/// `(?x)` 模式末尾的 `#` 注释会吞掉闭合的 `)$`，此时在注释后补换行再试。
fn compile_anchored(source: &str) -> Result<Regex, regex::Error> {
    build(source)?;
    build(&format!("^(?:{})$", source)).or_else(|_| build(&format!("^(?:{}\n)$", source)))
}

/// 规则在 `world` 中是否生效；模式错误以 Err 返回
pub fn check(rule: &VhostRule, world: &str) -> Result<bool, VhostError> {
    if let Some(pattern) = &rule.if_in_world {
        if !pattern.full_match(world)? {
            debug!(
                vhost = rule.key,
                world = world,
                pattern = %pattern,
                "world does not match ifInWorld, skipping"
            );
            return Ok(false);
        }
    }
    if let Some(pattern) = &rule.if_not_in_world {
        if pattern.full_match(world)? {
            debug!(
                vhost = rule.key,
                world = world,
                pattern = %pattern,
                "world matches ifNotInWorld, skipping"
            );
            return Ok(false);
        }
    }
    Ok(true)
}

/// 同 [`check`]，但模式错误只记录日志并视为不生效
pub fn applies(rule: &VhostRule, world: &str) -> bool {
    match check(rule, world) {
        Ok(applies) => applies,
        Err(e) => {
            error!(
                vhost = rule.key,
                error_code = e.kind().as_str(),
                error = %e,
                "world predicate failed, rule skipped"
            );
            false
        }
    }
}

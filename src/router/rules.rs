use std::fmt;
use std::path::PathBuf;

use crate::config::types::VhostEntry;

use super::predicate::WorldPattern;

/// 虚拟主机规则
#[derive(Debug, Clone)]
pub struct VhostRule {
    /// vhosts 段中的配置键
    pub key: String,
    /// 小写的主机名前缀
    pub hostname_prefix: String,
    pub commands: Vec<String>,
    pub if_in_world: Option<WorldPattern>,
    pub if_not_in_world: Option<WorldPattern>,
    pub motd: Option<String>,
    pub icon: Option<PathBuf>,
}

impl VhostRule {
    pub fn new(key: impl Into<String>, hostname_prefix: &str) -> Self {
        Self {
            key: key.into(),
            hostname_prefix: hostname_prefix.to_lowercase(),
            commands: Vec::new(),
            if_in_world: None,
            if_not_in_world: None,
            motd: None,
            icon: None,
        }
    }

    pub fn from_entry(entry: &VhostEntry) -> Self {
        let config = &entry.config;
        Self {
            key: entry.key.clone(),
            hostname_prefix: config.hostname.to_lowercase(),
            commands: config.commands.clone(),
            if_in_world: config.if_in_world.as_deref().map(WorldPattern::new),
            if_not_in_world: config.if_not_in_world.as_deref().map(WorldPattern::new),
            motd: config.motd.clone(),
            icon: config.icon.as_ref().map(PathBuf::from),
        }
    }

    pub fn with_commands<I, S>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.commands = commands.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_if_in_world(mut self, pattern: &str) -> Self {
        self.if_in_world = Some(WorldPattern::new(pattern));
        self
    }

    pub fn with_if_not_in_world(mut self, pattern: &str) -> Self {
        self.if_not_in_world = Some(WorldPattern::new(pattern));
        self
    }

    pub fn with_motd(mut self, motd: impl Into<String>) -> Self {
        self.motd = Some(motd.into());
        self
    }

    pub fn with_icon(mut self, path: impl Into<PathBuf>) -> Self {
        self.icon = Some(path.into());
        self
    }

    /// `normalized_host` 必须已经是小写
    pub fn matches_normalized(&self, normalized_host: &str) -> bool {
        normalized_host.starts_with(&self.hostname_prefix)
    }

    pub fn matches(&self, hostname: &str) -> bool {
        self.matches_normalized(&hostname.to_lowercase())
    }
}

impl fmt::Display for VhostRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vhost({}: {}*)", self.key, self.hostname_prefix)
    }
}

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_yml::Value;
use tracing::warn;

use crate::common::{VhostError, VhostErrorKind};

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub log: LogConfig,
    pub sessions: SessionConfig,
    /// vhosts 段，按声明顺序
    pub vhosts: Vec<VhostEntry>,
}

impl Config {
    /// 解析 YAML 文本。只有整体语法错误才返回 Err，
    /// 各个段落的格式问题只记录日志并回退到默认值。
    pub fn from_yaml_str(content: &str) -> Result<Self, VhostError> {
        let root: Value = serde_yml::from_str(content)?;
        Ok(Self::from_value(&root))
    }

    pub fn from_value(root: &Value) -> Self {
        Self {
            log: section(root, "log"),
            sessions: section(root, "sessions"),
            vhosts: parse_vhosts(root.get("vhosts")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// 登录后迟迟未 join 的记录在此时长后清理
    #[serde(default = "default_login_ttl_secs")]
    pub login_ttl_secs: u64,
}

impl SessionConfig {
    pub fn login_ttl(&self) -> Duration {
        Duration::from_secs(self.login_ttl_secs)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            login_ttl_secs: default_login_ttl_secs(),
        }
    }
}

fn default_login_ttl_secs() -> u64 {
    120
}

/// 单个虚拟主机配置
///
/// 字段按宽松规则读取：标量（数字、布尔）转成字符串，
/// `commands` 不是列表时视为空列表，列表中的非标量元素被忽略。
/// 只有条目本身不是映射或缺少 `hostname` 时才算格式错误。
#[derive(Debug, Clone, Default)]
pub struct VhostConfig {
    pub hostname: String,
    pub commands: Vec<String>,
    pub if_in_world: Option<String>,
    pub if_not_in_world: Option<String>,
    pub motd: Option<String>,
    pub icon: Option<String>,
}

impl VhostConfig {
    pub fn from_value(value: &Value) -> Result<Self, VhostError> {
        let Value::Mapping(_) = value else {
            return Err(VhostError::ConfigParse("entry must be a mapping".into()));
        };
        let hostname = value
            .get("hostname")
            .and_then(scalar_string)
            .ok_or_else(|| VhostError::ConfigParse("missing 'hostname'".into()))?;
        Ok(Self {
            hostname,
            commands: value.get("commands").map(string_list).unwrap_or_default(),
            if_in_world: value.get("ifInWorld").and_then(scalar_string),
            if_not_in_world: value.get("ifNotInWorld").and_then(scalar_string),
            motd: value.get("motd").and_then(scalar_string),
            icon: value.get("icon").and_then(scalar_string),
        })
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_string(&tagged.value),
        _ => None,
    }
}

fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Sequence(items) => items.iter().filter_map(scalar_string).collect(),
        _ => Vec::new(),
    }
}

/// vhosts 段中的一项：配置键 + 内容
#[derive(Debug, Clone)]
pub struct VhostEntry {
    pub key: String,
    pub config: VhostConfig,
}

impl VhostEntry {
    pub fn new(key: impl Into<String>, config: VhostConfig) -> Self {
        Self {
            key: key.into(),
            config,
        }
    }
}

fn section<T: DeserializeOwned + Default>(root: &Value, name: &str) -> T {
    match root.get(name) {
        None | Some(Value::Null) => T::default(),
        Some(value) => serde_yml::from_value(value.clone()).unwrap_or_else(|e| {
            warn!(
                section = name,
                error_code = VhostErrorKind::ConfigParse.as_str(),
                error = %e,
                "malformed config section, using defaults"
            );
            T::default()
        }),
    }
}

/// 解析 vhosts 段。缺失或格式错误时返回空表；单个条目出错时跳过该条目。
pub fn parse_vhosts(section: Option<&Value>) -> Vec<VhostEntry> {
    let mapping = match section {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Mapping(mapping)) => mapping,
        Some(_) => {
            let err = VhostError::ConfigParse("'vhosts' must be a mapping".into());
            warn!(error_code = err.kind().as_str(), error = %err, "ignoring vhosts section");
            return Vec::new();
        }
    };

    let mut entries = Vec::with_capacity(mapping.len());
    for (key, value) in mapping.iter() {
        let key = key_name(key);
        match VhostConfig::from_value(value) {
            Ok(config) => entries.push(VhostEntry { key, config }),
            Err(e) => {
                let err = VhostError::ConfigParse(format!("vhost '{}': {}", key, e));
                warn!(error_code = err.kind().as_str(), error = %err, "skipping vhost entry");
            }
        }
    }
    entries
}

fn key_name(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => format!("{:?}", other),
    }
}

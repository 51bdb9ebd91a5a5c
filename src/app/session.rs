use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::common::VirtualHost;

/// 一个已登录身份的会话上下文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub identity: String,
    pub host: VirtualHost,
}

impl SessionContext {
    pub fn new(identity: impl Into<String>, raw_hostname: impl Into<VirtualHost>) -> Self {
        Self {
            identity: identity.into(),
            host: raw_hostname.into(),
        }
    }
}

struct SessionEntry {
    host: VirtualHost,
    login_time: Instant,
    joined: bool,
}

/// 登录主机名登记表：login 写入，join 读取并标记，quit 移除
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, SessionEntry>>,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// 记录登录主机名；同一身份再次登录时覆盖
    pub fn record_login(&self, identity: &str, raw_hostname: &str) {
        let entry = SessionEntry {
            host: VirtualHost::new(raw_hostname),
            login_time: Instant::now(),
            joined: false,
        };
        let previous = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(identity.to_string(), entry);
        debug!(
            identity = identity,
            hostname = raw_hostname,
            replaced = previous.is_some(),
            "login hostname recorded"
        );
    }

    /// join 时取出会话上下文并标记为已加入；无登录记录时返回 None
    pub fn mark_joined(&self, identity: &str) -> Option<SessionContext> {
        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let entry = sessions.get_mut(identity)?;
        entry.joined = true;
        Some(SessionContext {
            identity: identity.to_string(),
            host: entry.host.clone(),
        })
    }

    pub fn get(&self, identity: &str) -> Option<SessionContext> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(identity)
            .map(|entry| SessionContext {
                identity: identity.to_string(),
                host: entry.host.clone(),
            })
    }

    /// 移除会话，返回是否存在
    pub fn remove(&self, identity: &str) -> bool {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(identity)
            .is_some()
    }

    /// 清理登录后超过 `ttl` 仍未 join 的记录，返回清理数量
    pub fn purge_stale_logins(&self, ttl: Duration) -> usize {
        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = sessions.len();
        sessions.retain(|identity, entry| {
            let keep = entry.joined || entry.login_time.elapsed() <= ttl;
            if !keep {
                debug!(identity = identity.as_str(), "stale login purged");
            }
            keep
        });
        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

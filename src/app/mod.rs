pub mod dispatcher;
pub mod pump;
pub mod session;
pub mod status;

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

use crate::common::VhostError;
use crate::config::{self, Config};
use crate::router::{predicate, RuleTable};

use dispatcher::{CommandSink, DispatchReport};
use session::SessionRegistry;
use status::{IconLoader, StatusResponse};

/// 宿主连接事件接口，由适配层在对应时机调用
pub trait ConnectionEvents: Send + Sync {
    /// 登录：记录客户端使用的主机名
    fn on_login(&self, identity: &str, raw_hostname: &str);
    /// 加入：匹配规则并执行命令
    fn on_join(&self, identity: &str, world: &str) -> JoinOutcome;
    /// 退出：释放登录记录
    fn on_quit(&self, identity: &str);
    /// 服务器列表 ping
    fn on_status_query(&self, hostname: Option<&str>) -> StatusResponse;
}

/// join 处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// 没有登录记录，未做任何处理
    NoSession,
    Evaluated {
        /// 主机名匹配的规则数
        matched: usize,
        /// 通过世界谓词的规则数
        applied: usize,
        dispatch: DispatchReport,
    },
}

pub struct VhostService {
    rules: RwLock<Arc<RuleTable>>,
    sessions: SessionRegistry,
    sink: Arc<dyn CommandSink>,
    icons: Arc<dyn IconLoader>,
    login_ttl: Duration,
}

impl VhostService {
    pub fn new(rules: RuleTable, sink: Arc<dyn CommandSink>, icons: Arc<dyn IconLoader>) -> Self {
        Self {
            rules: RwLock::new(Arc::new(rules)),
            sessions: SessionRegistry::new(),
            sink,
            icons,
            login_ttl: config::SessionConfig::default().login_ttl(),
        }
    }

    pub fn from_config(config: &Config, sink: Arc<dyn CommandSink>, icons: Arc<dyn IconLoader>) -> Self {
        Self::new(RuleTable::from_config(config), sink, icons).with_login_ttl(config.sessions.login_ttl())
    }

    pub fn with_login_ttl(mut self, ttl: Duration) -> Self {
        self.login_ttl = ttl;
        self
    }

    /// 获取当前规则表快照
    pub fn rules(&self) -> Arc<RuleTable> {
        self.rules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// 整体替换规则表
    pub fn reload(&self, rules: RuleTable) {
        let count = rules.len();
        *self.rules.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(rules);
        info!(count = count, "vhost rules reloaded");
    }

    /// 从文件重新加载；文件不可读或 YAML 无效时保留旧规则表
    pub fn reload_from_path(&self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        match config::load_config(path) {
            Ok(config) => {
                let table = RuleTable::from_config(&config);
                let count = table.len();
                self.reload(table);
                Ok(count)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %format!("{:#}", e), "reload failed, keeping current vhost rules");
                Err(e)
            }
        }
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn login_ttl(&self) -> Duration {
        self.login_ttl
    }

    /// 清理过期的未加入登录记录
    pub fn purge_stale_logins(&self) -> usize {
        let purged = self.sessions.purge_stale_logins(self.login_ttl);
        if purged > 0 {
            info!(count = purged, "stale logins purged");
        }
        purged
    }
}

impl ConnectionEvents for VhostService {
    fn on_login(&self, identity: &str, raw_hostname: &str) {
        info!(identity = identity, hostname = raw_hostname, "player logging in");
        self.sessions.record_login(identity, raw_hostname);
    }

    fn on_join(&self, identity: &str, world: &str) -> JoinOutcome {
        let Some(session) = self.sessions.mark_joined(identity) else {
            let err = VhostError::MissingSession(identity.to_string());
            warn!(identity = identity, error_code = err.kind().as_str(), error = %err, "join without login, skipping vhost rules");
            return JoinOutcome::NoSession;
        };
        info!(
            identity = identity,
            hostname = %session.host,
            world = world,
            "player joining"
        );

        // 整个处理过程使用同一个规则表快照（热重载安全）
        let rules = self.rules();
        let matched = rules.match_all(session.host.raw());
        let mut applied = 0;
        let mut report = DispatchReport::default();
        for rule in &matched {
            if !predicate::applies(rule, world) {
                continue;
            }
            applied += 1;
            report.merge(dispatcher::dispatch(rule, &session, self.sink.as_ref()));
        }

        JoinOutcome::Evaluated {
            matched: matched.len(),
            applied,
            dispatch: report,
        }
    }

    fn on_quit(&self, identity: &str) {
        if self.sessions.remove(identity) {
            info!(identity = identity, "player leaving");
        } else {
            let err = VhostError::MissingSession(identity.to_string());
            warn!(identity = identity, error_code = err.kind().as_str(), error = %err, "quit without login");
        }
    }

    fn on_status_query(&self, hostname: Option<&str>) -> StatusResponse {
        let rules = self.rules();
        status::respond(&rules, hostname, self.icons.as_ref())
    }
}

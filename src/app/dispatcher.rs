use tracing::{error, info};

use crate::common::VhostError;
use crate::router::rules::VhostRule;

use super::session::SessionContext;

/// 命令执行端，由宿主实现。
///
/// 命令以控制台权限执行，不是玩家自己的权限。配置中的命令视为
/// 运维人员编写的可信输入，这里不做任何过滤。
pub trait CommandSink: Send + Sync {
    fn dispatch_command(&self, command: &str) -> anyhow::Result<()>;
}

impl<F> CommandSink for F
where
    F: Fn(&str) -> anyhow::Result<()> + Send + Sync,
{
    fn dispatch_command(&self, command: &str) -> anyhow::Result<()> {
        self(command)
    }
}

/// 一次分发的结果统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub submitted: usize,
    pub failed: usize,
}

impl DispatchReport {
    pub fn merge(&mut self, other: DispatchReport) {
        self.submitted += other.submitted;
        self.failed += other.failed;
    }
}

/// 替换 `%player%` / `%hostname%` / `%port%` 占位符（纯字面替换）
pub fn expand_placeholders(template: &str, session: &SessionContext) -> String {
    template
        .replace("%player%", &session.identity)
        .replace("%hostname%", session.host.host_part())
        .replace("%port%", session.host.port_part())
}

/// 依次提交规则中的所有命令。单条失败只记录，不影响后续命令。
pub fn dispatch(rule: &VhostRule, session: &SessionContext, sink: &dyn CommandSink) -> DispatchReport {
    let mut report = DispatchReport::default();
    for template in &rule.commands {
        let command = expand_placeholders(template, session);
        info!(
            identity = session.identity,
            vhost = rule.key,
            command = command,
            "running vhost command"
        );
        match sink.dispatch_command(&command) {
            Ok(()) => report.submitted += 1,
            Err(e) => {
                report.failed += 1;
                let err = VhostError::Dispatch(format!("{:#}", e));
                error!(
                    identity = session.identity,
                    vhost = rule.key,
                    command = command,
                    error_code = err.kind().as_str(),
                    error = %err,
                    "vhost command failed"
                );
            }
        }
    }
    report
}

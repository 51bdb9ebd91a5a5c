//! 事件泵：由单个 tokio 任务持有 `VhostService`，通过 mpsc 通道接收宿主事件

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::status::StatusResponse;
use super::{ConnectionEvents, VhostService};

/// 过期登录清理间隔
const PURGE_INTERVAL_SECS: u64 = 30;

/// 宿主事件
#[derive(Debug)]
pub enum HostEvent {
    Login { identity: String, hostname: String },
    Join { identity: String, world: String },
    Quit { identity: String },
    StatusQuery {
        hostname: Option<String>,
        reply: oneshot::Sender<StatusResponse>,
    },
    Reload { path: PathBuf },
}

pub struct EventPump {
    service: Arc<VhostService>,
    events: mpsc::Receiver<HostEvent>,
    cancel: CancellationToken,
    purge_interval: Duration,
}

/// 创建事件通道和对应的泵
pub fn channel(
    service: Arc<VhostService>,
    capacity: usize,
    cancel: CancellationToken,
) -> (mpsc::Sender<HostEvent>, EventPump) {
    let (tx, rx) = mpsc::channel(capacity);
    let pump = EventPump {
        service,
        events: rx,
        cancel,
        purge_interval: Duration::from_secs(PURGE_INTERVAL_SECS),
    };
    (tx, pump)
}

impl EventPump {
    pub fn with_purge_interval(mut self, interval: Duration) -> Self {
        self.purge_interval = interval;
        self
    }

    /// 运行直到取消或所有发送端关闭
    pub async fn run(mut self) {
        let mut purge = tokio::time::interval(self.purge_interval);
        purge.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        info!("vhost event pump started");

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    debug!("vhost event pump cancelled");
                    break;
                }
                event = self.events.recv() => match event {
                    Some(event) => self.handle(event),
                    None => {
                        debug!("all event senders dropped");
                        break;
                    }
                },
                _ = purge.tick() => {
                    self.service.purge_stale_logins();
                }
            }
        }

        info!("vhost event pump stopped");
    }

    fn handle(&self, event: HostEvent) {
        match event {
            HostEvent::Login { identity, hostname } => self.service.on_login(&identity, &hostname),
            HostEvent::Join { identity, world } => {
                self.service.on_join(&identity, &world);
            }
            HostEvent::Quit { identity } => self.service.on_quit(&identity),
            HostEvent::StatusQuery { hostname, reply } => {
                let response = self.service.on_status_query(hostname.as_deref());
                if reply.send(response).is_err() {
                    debug!("status query requester went away");
                }
            }
            HostEvent::Reload { path } => {
                // 失败时 reload_from_path 已记录日志并保留旧规则
                let _ = self.service.reload_from_path(&path);
            }
        }
    }
}

//! 服务器列表 ping 的 MOTD / 图标

use std::path::Path;

use base64::Engine;
use tracing::{debug, error};

use crate::common::VhostError;
use crate::router::RuleTable;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];
/// 游戏客户端要求服务器图标为 64x64
pub const ICON_SIZE: u32 = 64;

/// 图标加载，由宿主实现
pub trait IconLoader: Send + Sync {
    fn load_icon(&self, path: &Path) -> Result<Vec<u8>, VhostError>;
}

/// 从本地文件读取并校验 64x64 PNG
#[derive(Debug, Clone, Copy, Default)]
pub struct FsIconLoader;

impl IconLoader for FsIconLoader {
    fn load_icon(&self, path: &Path) -> Result<Vec<u8>, VhostError> {
        let bytes = std::fs::read(path).map_err(|e| VhostError::IconLoad {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        validate_png_icon(&bytes).map_err(|reason| VhostError::IconLoad {
            path: path.display().to_string(),
            reason,
        })?;
        Ok(bytes)
    }
}

/// 检查 PNG 签名和 IHDR 中的宽高
fn validate_png_icon(bytes: &[u8]) -> Result<(), String> {
    // signature(8) + length(4) + "IHDR"(4) + width(4) + height(4)
    if bytes.len() < 24 || bytes[..8] != PNG_SIGNATURE {
        return Err("not a PNG image".into());
    }
    if &bytes[12..16] != b"IHDR" {
        return Err("missing IHDR chunk".into());
    }
    let width = u32::from_be_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]);
    let height = u32::from_be_bytes([bytes[20], bytes[21], bytes[22], bytes[23]]);
    if width != ICON_SIZE || height != ICON_SIZE {
        return Err(format!(
            "icon must be {}x{} pixels, got {}x{}",
            ICON_SIZE, ICON_SIZE, width, height
        ));
    }
    Ok(())
}

/// 状态查询结果；字段为 None 时宿主保留自己的默认值
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusResponse {
    pub motd: Option<String>,
    pub icon: Option<Vec<u8>>,
}

impl StatusResponse {
    pub fn is_empty(&self) -> bool {
        self.motd.is_none() && self.icon.is_none()
    }

    /// `data:image/png;base64,...` 形式的图标
    pub fn favicon_data_uri(&self) -> Option<String> {
        self.icon.as_ref().map(|bytes| {
            format!(
                "data:image/png;base64,{}",
                base64::engine::general_purpose::STANDARD.encode(bytes)
            )
        })
    }

    /// 把 motd / favicon 写入服务器列表 ping 的 JSON 文档
    pub fn apply_to(&self, doc: &mut serde_json::Value) {
        let Some(obj) = doc.as_object_mut() else {
            return;
        };
        if let Some(motd) = &self.motd {
            obj.insert(
                "description".to_string(),
                serde_json::json!({ "text": motd }),
            );
        }
        if let Some(favicon) = self.favicon_data_uri() {
            obj.insert("favicon".to_string(), serde_json::Value::String(favicon));
        }
    }
}

/// 对所有匹配规则依次应用：motd 后者覆盖前者；图标加载失败时保留之前的图标
pub fn respond(table: &RuleTable, hostname: Option<&str>, loader: &dyn IconLoader) -> StatusResponse {
    let mut response = StatusResponse::default();
    let Some(hostname) = hostname.filter(|h| !h.trim().is_empty()) else {
        debug!("status query without hostname");
        return response;
    };

    for rule in table.match_all(hostname) {
        if let Some(motd) = &rule.motd {
            debug!(hostname = hostname, vhost = rule.key, motd = motd.as_str(), "vhost motd found");
            response.motd = Some(motd.clone());
        }
        if let Some(path) = &rule.icon {
            debug!(hostname = hostname, vhost = rule.key, icon = %path.display(), "vhost icon found");
            match loader.load_icon(path) {
                Ok(bytes) => response.icon = Some(bytes),
                Err(e) => {
                    error!(
                        hostname = hostname,
                        vhost = rule.key,
                        error_code = e.kind().as_str(),
                        error = %e,
                        "could not load server icon"
                    );
                }
            }
        }
    }
    response
}

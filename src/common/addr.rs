use std::fmt;

/// 客户端连接时使用的虚拟主机名（含端口），如 `hub.example.com:25565`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VirtualHost {
    raw: String,
}

impl VirtualHost {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// 原始主机名字符串
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// 第一个 `:` 之前的部分；没有 `:` 时为整个字符串
    pub fn host_part(&self) -> &str {
        match self.raw.split_once(':') {
            Some((host, _)) => host,
            None => &self.raw,
        }
    }

    /// 第一个 `:` 之后的部分；没有 `:` 时为空
    pub fn port_part(&self) -> &str {
        match self.raw.split_once(':') {
            Some((_, port)) => port,
            None => "",
        }
    }

    /// 小写形式，用于前缀匹配
    pub fn normalized(&self) -> String {
        self.raw.to_lowercase()
    }
}

impl fmt::Display for VirtualHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for VirtualHost {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for VirtualHost {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

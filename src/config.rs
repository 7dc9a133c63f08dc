use crate::error::{Result, RustemError};
use crate::launcher::LauncherConfig;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// 完整的配置文件
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RustemConfig {
    /// 所有启动器，按名称排序
    #[serde(default)]
    pub launchers: BTreeMap<String, LauncherConfig>,
}

impl RustemConfig {
    /// 解析配置文本，并把表名填入每个启动器
    pub fn parse(content: &str) -> Result<Self> {
        let mut config: RustemConfig = toml::from_str(content)?;
        for (name, launcher) in config.launchers.iter_mut() {
            launcher.name = name.clone();
        }
        Ok(config)
    }

    /// 获取指定启动器
    pub fn launcher(&self, name: &str) -> Result<&LauncherConfig> {
        self.launchers
            .get(name)
            .ok_or_else(|| RustemError::Config(format!("unknown launcher: {}", name)))
    }
}

/// 配置文件加载器
pub struct ConfigLoader;

impl ConfigLoader {
    /// 配置文件名
    const CONFIG_FILE: &'static str = "rustem.toml";

    /// 从指定路径加载配置文件
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<RustemConfig> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            RustemError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;

        RustemConfig::parse(&content)
    }

    /// 查找并加载配置文件
    /// 查找顺序：
    /// 1. 当前目录及其父目录
    /// 2. 用户配置目录 ~/.config/rustem/
    pub fn find_and_load() -> Result<Option<RustemConfig>> {
        if let Some(config) = Self::try_load_from_current_dir()? {
            return Ok(Some(config));
        }

        Self::try_load_from_user_dir()
    }

    /// 尝试从当前目录及其父目录加载
    fn try_load_from_current_dir() -> Result<Option<RustemConfig>> {
        let mut current = std::env::current_dir()?;

        loop {
            let config_path = current.join(Self::CONFIG_FILE);
            if config_path.exists() {
                return Self::load_from_path(&config_path).map(Some);
            }

            // 尝试父目录
            if !current.pop() {
                break;
            }
        }

        Ok(None)
    }

    /// 尝试从用户配置目录加载
    fn try_load_from_user_dir() -> Result<Option<RustemConfig>> {
        let Some(home) = dirs::home_dir() else {
            return Ok(None);
        };
        let config_path = home.join(".config").join("rustem").join(Self::CONFIG_FILE);

        if config_path.exists() {
            Self::load_from_path(&config_path).map(Some)
        } else {
            Ok(None)
        }
    }
}

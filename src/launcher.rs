use crate::error::{Result, RustemError};
use serde::Deserialize;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, warn};

const READ_CHUNK_BYTES: usize = 8 * 1024;

/// 一个启动器的配置（来自 rustem.toml 的 `[launchers.<name>]`）
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LauncherConfig {
    /// 启动器名称，加载配置时由表名填入
    #[serde(skip)]
    pub name: String,

    /// 可执行文件
    pub command: String,

    /// 命令行参数
    #[serde(default)]
    pub args: Vec<String>,

    /// 工作目录
    #[serde(default)]
    pub cwd: Option<PathBuf>,
}

/// 被启动进程的事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEvent {
    /// 标准输出的一段数据，边界任意
    Stdout(Vec<u8>),

    /// 进程退出；被信号终止时没有退出码
    Exited(Option<i32>),
}

/// 已启动的进程及其事件流
#[derive(Debug)]
pub struct Launcher {
    name: String,
    events: mpsc::UnboundedReceiver<ProcessEvent>,
}

impl Launcher {
    /// 用现成的事件流构造
    pub fn from_events(
        name: impl Into<String>,
        events: mpsc::UnboundedReceiver<ProcessEvent>,
    ) -> Self {
        Self {
            name: name.into(),
            events,
        }
    }

    /// 启动进程，后台任务把 stdout 分块转发到事件流
    ///
    /// 必须在 tokio 运行时中调用。
    pub fn spawn(config: &LauncherConfig) -> Result<Self> {
        let mut command = Command::new(&config.command);
        command
            .args(&config.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &config.cwd {
            command.current_dir(cwd);
        }

        let mut child = command
            .spawn()
            .map_err(|e| RustemError::Launch(format!("{}: {}", config.command, e)))?;
        let mut stdout = child.stdout.take().ok_or_else(|| {
            RustemError::Launch(format!("{}: stdout not captured", config.command))
        })?;

        debug!(launcher = %config.name, pid = ?child.id(), "Process spawned");

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            let mut buf = vec![0u8; READ_CHUNK_BYTES];
            loop {
                match stdout.read(&mut buf).await {
                    Ok(0) => break,
                    Ok(n) => {
                        if tx.send(ProcessEvent::Stdout(buf[..n].to_vec())).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Failed to read process stdout: {}", e);
                        break;
                    }
                }
            }

            let code = match child.wait().await {
                Ok(status) => status.code(),
                Err(e) => {
                    warn!("Failed to wait for process: {}", e);
                    None
                }
            };
            let _ = tx.send(ProcessEvent::Exited(code));
        });

        Ok(Self::from_events(config.name.clone(), rx))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 下一个事件；进程结束且事件取完后返回 None
    pub async fn next_event(&mut self) -> Option<ProcessEvent> {
        self.events.recv().await
    }
}

use super::{Listener, ResultSet, Runner, RunnerId, RunnerState};
use crate::launcher::{Launcher, ProcessEvent};
use crate::server::AppContext;
use std::borrow::Cow;
use std::sync::Arc;
use tracing::debug;

/// 本地启动的进程
#[derive(Debug)]
pub struct ProcessRunner {
    state: RunnerState,
    launcher: Launcher,
    /// 按字节保存，避免 UTF-8 字符被切在两个分块之间
    log: Vec<u8>,
}

impl ProcessRunner {
    pub fn new(app: &Arc<dyn AppContext>, launcher: Launcher) -> Self {
        let mut state = RunnerState::new(app);
        state.set_name(launcher.name());

        Self {
            state,
            launcher,
            log: Vec::new(),
        }
    }

    pub fn launcher(&self) -> &Launcher {
        &self.launcher
    }

    /// 累积的标准输出
    pub fn log_output(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.log)
    }

    /// 处理一个进程事件
    pub fn handle(&mut self, event: ProcessEvent) {
        match event {
            ProcessEvent::Stdout(chunk) => self.log.extend_from_slice(&chunk),
            // 退出码由启动器一方处理
            ProcessEvent::Exited(code) => {
                debug!(runner = %self.state.id(), ?code, "Process exited");
            }
        }
    }

    /// 消费事件流直到进程结束
    pub async fn run(&mut self) {
        while let Some(event) = self.launcher.next_event().await {
            self.handle(event);
        }
        debug!(
            runner = %self.state.id(),
            bytes = self.log.len(),
            "Process event stream closed"
        );
    }
}

impl Runner for ProcessRunner {
    fn id(&self) -> RunnerId {
        self.state.id()
    }

    fn name(&self) -> Option<&str> {
        self.state.name()
    }

    fn results(&self) -> &ResultSet {
        self.state.results()
    }

    fn subscribe_boxed(&mut self, listener: Listener) {
        self.state.subscribe_boxed(listener);
    }
}

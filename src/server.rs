use crate::runner::{ResultSet, Runner, RunnerId};
use tokio::sync::mpsc;
use tracing::warn;

/// Runner 对外（服务端）能发出的信号
///
/// Runner 只持有它的弱引用，不会修改服务端状态。
pub trait AppContext: Send + Sync {
    /// 某个 Runner 收到了 all-test-results
    fn all_test_results(&self, results: &ResultSet, runner: &dyn Runner);

    /// 请求把 Runner 从活动列表中移除
    fn remove_runner(&self, runner: &dyn Runner);
}

/// 服务端收到的事件
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    AllTestResults {
        runner: RunnerId,
        name: Option<String>,
        results: ResultSet,
    },
    RemoveRunner {
        runner: RunnerId,
    },
}

/// 基于 mpsc 通道的 AppContext
///
/// 把 Runner 的信号转成带快照的 `ServerEvent`，交给服务端的事件循环处理。
#[derive(Debug, Clone)]
pub struct ServerLink {
    tx: mpsc::UnboundedSender<ServerEvent>,
}

impl ServerLink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: ServerEvent) {
        if let Err(e) = self.tx.send(event) {
            warn!("Server event dropped, receiver closed: {:?}", e.0);
        }
    }
}

impl AppContext for ServerLink {
    fn all_test_results(&self, results: &ResultSet, runner: &dyn Runner) {
        self.send(ServerEvent::AllTestResults {
            runner: runner.id(),
            name: runner.name().map(|s| s.to_string()),
            results: results.clone(),
        });
    }

    fn remove_runner(&self, runner: &dyn Runner) {
        self.send(ServerEvent::RemoveRunner {
            runner: runner.id(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::RunnerState;
    use std::sync::Arc;

    #[test]
    fn test_server_link_forwards_snapshots() {
        let (link, mut rx) = ServerLink::new();
        let app: Arc<dyn AppContext> = Arc::new(link.clone());
        let mut state = RunnerState::new(&app);
        state.set_name("Firefox 120");
        state.results_mut().mark_all_received();

        link.all_test_results(state.results(), &state);
        link.remove_runner(&state);

        match rx.try_recv().unwrap() {
            ServerEvent::AllTestResults {
                runner,
                name,
                results,
            } => {
                assert_eq!(runner, state.id());
                assert_eq!(name.as_deref(), Some("Firefox 120"));
                assert!(results.all());
            }
            other => panic!("Expected AllTestResults, got {:?}", other),
        }
        assert_eq!(
            rx.try_recv().unwrap(),
            ServerEvent::RemoveRunner { runner: state.id() }
        );
    }

    #[test]
    fn test_send_after_receiver_dropped() {
        let (link, rx) = ServerLink::new();
        drop(rx);
        let app: Arc<dyn AppContext> = Arc::new(link.clone());
        let state = RunnerState::new(&app);
        // 接收端已关闭，只记录警告
        link.remove_runner(&state);
    }
}

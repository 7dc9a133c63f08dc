pub mod browser;
pub mod notify;
pub mod process;
pub mod results;

pub use browser::{BrowserChannel, BrowserEvent, BrowserRunner, OutboundEvent};
pub use notify::{Listener, Notifier, RunnerEvent};
pub use process::ProcessRunner;
pub use results::{ResultSet, TestOutcome};

use crate::server::AppContext;
use std::sync::{Arc, Weak};
use tracing::debug;
use uuid::Uuid;

/// Runner 的唯一标识，服务端用它做键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunnerId(Uuid);

impl RunnerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunnerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

/// 所有执行端共有的能力
pub trait Runner {
    fn id(&self) -> RunnerId;

    /// 执行端报上来的名字，未登录前为 None
    fn name(&self) -> Option<&str>;

    fn results(&self) -> &ResultSet;

    /// 订阅状态变化，可通过 `&mut dyn Runner` 调用
    fn subscribe_boxed(&mut self, listener: Listener);

    fn subscribe(&mut self, listener: impl FnMut(&RunnerEvent) + Send + 'static)
    where
        Self: Sized,
    {
        self.subscribe_boxed(Box::new(listener));
    }
}

/// Runner 的公共状态，由各个变体组合持有
#[derive(Debug)]
pub struct RunnerState {
    id: RunnerId,
    name: Option<String>,
    results: ResultSet,
    app: Weak<dyn AppContext>,
    notifier: Notifier,
}

impl RunnerState {
    pub fn new(app: &Arc<dyn AppContext>) -> Self {
        Self {
            id: RunnerId::new(),
            name: None,
            results: ResultSet::new(),
            app: Arc::downgrade(app),
            notifier: Notifier::new(),
        }
    }

    /// 设置名字，每次调用都会通知一次
    pub fn set_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.name = Some(name.clone());
        self.emit(&RunnerEvent::NameChanged { name });
    }

    pub fn emit(&mut self, event: &RunnerEvent) {
        self.notifier.emit(event);
    }

    pub fn results_mut(&mut self) -> &mut ResultSet {
        &mut self.results
    }

    /// 服务端已经释放时返回 None
    pub fn app(&self) -> Option<Arc<dyn AppContext>> {
        let app = self.app.upgrade();
        if app.is_none() {
            debug!(runner = %self.id, "App context dropped, signal discarded");
        }
        app
    }
}

impl Runner for RunnerState {
    fn id(&self) -> RunnerId {
        self.id
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn results(&self) -> &ResultSet {
        &self.results
    }

    fn subscribe_boxed(&mut self, listener: Listener) {
        self.notifier.subscribe(listener);
    }
}

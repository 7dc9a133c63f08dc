/// Runner 自身发出的状态变化
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunnerEvent {
    /// 执行端报上名字（browser-login）
    NameChanged { name: String },

    /// 执行端开始跑测试
    TestsStart,
}

pub type Listener = Box<dyn FnMut(&RunnerEvent) + Send>;

/// 监听器列表
///
/// 按注册顺序同步调用，`emit` 返回前所有监听器都已执行完毕。
#[derive(Default)]
pub struct Notifier {
    listeners: Vec<Listener>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Listener) {
        self.listeners.push(listener);
    }

    pub fn emit(&mut self, event: &RunnerEvent) {
        for listener in &mut self.listeners {
            listener(event);
        }
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

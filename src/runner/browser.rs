use super::{Listener, ResultSet, Runner, RunnerEvent, RunnerId, RunnerState, TestOutcome};
use crate::error::{Result, RustemError};
use crate::server::AppContext;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// 浏览器发来的事件
#[derive(Debug, Clone, PartialEq)]
pub enum BrowserEvent {
    BrowserLogin { name: String },
    Error { message: String, source: String, line: u32 },
    TestsStart,
    TestResult(TestOutcome),
    AllTestResults,
    Disconnect,
}

/// 线上传输的帧: `{"event": "test-result", "args": [{...}]}`
#[derive(Debug, Deserialize)]
struct WireFrame {
    event: String,
    #[serde(default)]
    args: Vec<Value>,
}

impl BrowserEvent {
    /// 按事件名和位置参数解码
    pub fn from_wire(name: &str, args: Vec<Value>) -> Result<Self> {
        let mut args = args.into_iter();

        let event = match name {
            "browser-login" => BrowserEvent::BrowserLogin {
                name: string_arg(name, args.next(), "browser name")?,
            },
            "error" => BrowserEvent::Error {
                message: string_arg(name, args.next(), "message")?,
                source: string_arg(name, args.next(), "source")?,
                line: line_arg(name, args.next())?,
            },
            "tests-start" => BrowserEvent::TestsStart,
            "test-result" => {
                let payload = args
                    .next()
                    .ok_or_else(|| RustemError::malformed(name, "missing test outcome"))?;
                let outcome = TestOutcome::try_from(payload).map_err(|other| {
                    RustemError::malformed(name, format!("expected object, got {}", other))
                })?;
                BrowserEvent::TestResult(outcome)
            }
            "all-test-results" => BrowserEvent::AllTestResults,
            "disconnect" => BrowserEvent::Disconnect,
            other => return Err(RustemError::UnknownEvent(other.to_string())),
        };

        Ok(event)
    }

    /// 解码一帧 JSON 文本
    pub fn from_json(text: &str) -> Result<Self> {
        let frame: WireFrame = serde_json::from_str(text)?;
        Self::from_wire(&frame.event, frame.args)
    }

    /// 线上事件名
    pub fn name(&self) -> &'static str {
        match self {
            BrowserEvent::BrowserLogin { .. } => "browser-login",
            BrowserEvent::Error { .. } => "error",
            BrowserEvent::TestsStart => "tests-start",
            BrowserEvent::TestResult(_) => "test-result",
            BrowserEvent::AllTestResults => "all-test-results",
            BrowserEvent::Disconnect => "disconnect",
        }
    }
}

fn string_arg(event: &str, arg: Option<Value>, what: &str) -> Result<String> {
    match arg {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(RustemError::malformed(
            event,
            format!("{} must be a string, got {}", what, other),
        )),
        None => Err(RustemError::malformed(event, format!("missing {}", what))),
    }
}

/// 行号允许数字或数字字符串
fn line_arg(event: &str, arg: Option<Value>) -> Result<u32> {
    let line = match &arg {
        Some(Value::Number(n)) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Some(Value::String(s)) => s.trim().parse().ok(),
        Some(_) => None,
        None => return Err(RustemError::malformed(event, "missing line")),
    };
    line.ok_or_else(|| {
        RustemError::malformed(event, format!("invalid line number: {}", arg.unwrap_or_default()))
    })
}

/// 发给浏览器的事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboundEvent {
    StartTests,
}

impl OutboundEvent {
    pub fn name(&self) -> &'static str {
        match self {
            OutboundEvent::StartTests => "start-tests",
        }
    }
}

/// 到浏览器的双向通道的发送端
///
/// 发送是 fire-and-forget，投递失败由传输层负责。
pub trait BrowserChannel {
    fn send(&self, event: OutboundEvent);
}

impl BrowserChannel for mpsc::UnboundedSender<OutboundEvent> {
    fn send(&self, event: OutboundEvent) {
        if mpsc::UnboundedSender::send(self, event).is_err() {
            warn!("Browser channel closed, {} not delivered", event.name());
        }
    }
}

/// 通过双向通道连接的浏览器
#[derive(Debug)]
pub struct BrowserRunner<C> {
    state: RunnerState,
    client: C,
}

impl<C: BrowserChannel> BrowserRunner<C> {
    pub fn new(client: C, app: &Arc<dyn AppContext>) -> Self {
        Self {
            state: RunnerState::new(app),
            client,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// 处理一个入站事件
    pub fn handle(&mut self, event: BrowserEvent) {
        debug!(runner = %self.state.id(), event = event.name(), "Browser event");

        match event {
            BrowserEvent::BrowserLogin { name } => {
                info!(runner = %self.state.id(), "Browser logged in: {}", name);
                self.state.set_name(name);
            }
            BrowserEvent::Error {
                message,
                source,
                line,
            } => {
                self.state
                    .results_mut()
                    .set_top_level_error(&message, &source, line);
            }
            BrowserEvent::TestsStart => self.state.emit(&RunnerEvent::TestsStart),
            BrowserEvent::TestResult(outcome) => self.state.results_mut().add_result(outcome),
            BrowserEvent::AllTestResults => {
                self.state.results_mut().mark_all_received();
                let results = self.state.results();
                info!(
                    runner = %self.state.id(),
                    "All results received: {} passed, {} failed",
                    results.passed(),
                    results.failed()
                );
                if let Some(app) = self.state.app() {
                    let this: &Self = self;
                    app.all_test_results(this.results(), this);
                }
            }
            BrowserEvent::Disconnect => {
                info!(runner = %self.state.id(), "Browser disconnected");
                if let Some(app) = self.state.app() {
                    app.remove_runner(&*self);
                }
            }
        }
    }

    /// 解码并处理一帧；格式错误的帧被拒绝，状态不变
    pub fn handle_json(&mut self, text: &str) -> Result<()> {
        let event = BrowserEvent::from_json(text)?;
        self.handle(event);
        Ok(())
    }

    /// 清空结果并通知浏览器开始测试
    pub fn start_tests(&mut self) {
        self.state.results_mut().reset();
        self.client.send(OutboundEvent::StartTests);
    }
}

impl<C> Runner for BrowserRunner<C> {
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_wire_login() {
        let event = BrowserEvent::from_wire("browser-login", vec![json!("PhantomJS 1.9")]).unwrap();
        assert_eq!(
            event,
            BrowserEvent::BrowserLogin {
                name: "PhantomJS 1.9".to_string()
            }
        );
    }

    #[test]
    fn test_from_wire_error_line_forms() {
        let event = BrowserEvent::from_wire(
            "error",
            vec![json!("TypeError: bad news"), json!("http://test.com/bad.js"), json!(45)],
        )
        .unwrap();
        assert_eq!(
            event,
            BrowserEvent::Error {
                message: "TypeError: bad news".to_string(),
                source: "http://test.com/bad.js".to_string(),
                line: 45,
            }
        );

        let event =
            BrowserEvent::from_wire("error", vec![json!("e"), json!("a.js"), json!("7")]).unwrap();
        assert!(matches!(event, BrowserEvent::Error { line: 7, .. }));

        let err = BrowserEvent::from_wire("error", vec![json!("e"), json!("a.js"), json!(-1)])
            .unwrap_err();
        assert!(matches!(err, RustemError::MalformedEvent { .. }));
    }

    #[test]
    fn test_from_wire_rejects_bad_payloads() {
        assert!(matches!(
            BrowserEvent::from_wire("browser-login", vec![]),
            Err(RustemError::MalformedEvent { .. })
        ));
        assert!(matches!(
            BrowserEvent::from_wire("test-result", vec![json!(true)]),
            Err(RustemError::MalformedEvent { .. })
        ));
        assert!(matches!(
            BrowserEvent::from_wire("launch-rockets", vec![]),
            Err(RustemError::UnknownEvent(name)) if name == "launch-rockets"
        ));
    }

    #[test]
    fn test_from_json() {
        let event = BrowserEvent::from_json(r#"{"event": "test-result", "args": [{"failed": 1}]}"#)
            .unwrap();
        match event {
            BrowserEvent::TestResult(outcome) => assert!(outcome.failed()),
            other => panic!("Expected TestResult, got {:?}", other),
        }

        let event = BrowserEvent::from_json(r#"{"event": "disconnect"}"#).unwrap();
        assert_eq!(event, BrowserEvent::Disconnect);
        assert_eq!(event.name(), "disconnect");

        assert!(matches!(
            BrowserEvent::from_json("not json"),
            Err(RustemError::JsonError(_))
        ));
    }

    #[test]
    fn test_outbound_name() {
        assert_eq!(OutboundEvent::StartTests.name(), "start-tests");
    }
}

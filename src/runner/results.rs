use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 单个测试的结果
///
/// 执行端上报的是任意 JSON 对象，这里原样保存，只解释 `failed` 字段。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestOutcome {
    fields: Map<String, Value>,
}

impl TestOutcome {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// 是否失败
    ///
    /// 按 JS 的真值规则判断 `failed` 字段；字段缺失视为通过。
    pub fn failed(&self) -> bool {
        match self.fields.get("failed") {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Array(_)) | Some(Value::Object(_)) => true,
        }
    }

    /// 测试名称（来自 `name` 字段）
    pub fn name(&self) -> Option<&str> {
        self.fields.get("name").and_then(Value::as_str)
    }
}

impl TryFrom<Value> for TestOutcome {
    type Error = Value;

    /// 只接受 JSON 对象，其他类型原样退回
    fn try_from(value: Value) -> std::result::Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Ok(Self::new(fields)),
            other => Err(other),
        }
    }
}

/// 一个 Runner 的测试结果汇总
///
/// 反序列化时忽略传入的计数，按 `tests` 重新统计。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "ResultSetWire")]
pub struct ResultSet {
    total: usize,
    passed: usize,
    failed: usize,
    tests: Vec<TestOutcome>,
    top_level_error: Option<String>,
    all: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultSetWire {
    #[serde(default)]
    tests: Vec<TestOutcome>,
    #[serde(default)]
    top_level_error: Option<String>,
    #[serde(default)]
    all: bool,
}

impl From<ResultSetWire> for ResultSet {
    fn from(wire: ResultSetWire) -> Self {
        let mut results = ResultSet::new();
        for outcome in wire.tests {
            results.add_result(outcome);
        }
        results.top_level_error = wire.top_level_error;
        results.all = wire.all;
        results
    }
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 恢复到初始状态
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// 追加一个测试结果
    pub fn add_result(&mut self, outcome: TestOutcome) {
        if outcome.failed() {
            self.failed += 1;
        } else {
            self.passed += 1;
        }
        self.total = self.passed + self.failed;
        self.tests.push(outcome);
    }

    /// 记录执行端的顶层错误，只保留最后一次
    pub fn set_top_level_error(&mut self, message: &str, source: &str, line: u32) {
        self.top_level_error = Some(format!("{} at {}, line {}", message, source, line));
    }

    /// 收到 all-test-results 事件
    pub fn mark_all_received(&mut self) {
        self.all = true;
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn passed(&self) -> usize {
        self.passed
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn tests(&self) -> &[TestOutcome] {
        &self.tests
    }

    pub fn top_level_error(&self) -> Option<&str> {
        self.top_level_error.as_deref()
    }

    pub fn all(&self) -> bool {
        self.all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn outcome(value: Value) -> TestOutcome {
        TestOutcome::try_from(value).unwrap()
    }

    #[test]
    fn test_counters_stay_consistent() {
        let mut results = ResultSet::new();
        let payloads = [
            json!({"failed": true}),
            json!({"failed": 0}),
            json!({}),
            json!({"failed": 2, "name": "adds numbers"}),
            json!({"failed": null}),
        ];

        for payload in payloads {
            results.add_result(outcome(payload));
            assert_eq!(results.total(), results.passed() + results.failed());
            assert_eq!(results.total(), results.tests().len());
        }

        assert_eq!(results.failed(), 2);
        assert_eq!(results.passed(), 3);
        assert_eq!(results.tests()[3].name(), Some("adds numbers"));
    }

    #[test]
    fn test_failed_flag_truthiness() {
        assert!(outcome(json!({"failed": true})).failed());
        assert!(outcome(json!({"failed": 1})).failed());
        assert!(outcome(json!({"failed": "yes"})).failed());
        assert!(outcome(json!({"failed": []})).failed());
        assert!(!outcome(json!({"failed": false})).failed());
        assert!(!outcome(json!({"failed": 0.0})).failed());
        assert!(!outcome(json!({"failed": ""})).failed());
        assert!(!outcome(json!({"passed": true})).failed());
    }

    #[test]
    fn test_outcome_rejects_non_object() {
        assert!(TestOutcome::try_from(json!("failed")).is_err());
        assert!(TestOutcome::try_from(json!(null)).is_err());
    }

    #[test]
    fn test_reset() {
        let mut results = ResultSet::new();
        results.add_result(outcome(json!({"failed": false, "passed": true})));
        results.set_top_level_error("boom", "app.js", 1);
        results.mark_all_received();

        results.reset();
        assert_eq!(results, ResultSet::new());
        assert_eq!(results.total(), 0);
        assert_eq!(results.passed(), 0);
        assert_eq!(results.top_level_error(), None);
        assert!(!results.all());
    }

    #[test]
    fn test_top_level_error_format() {
        let mut results = ResultSet::new();
        results.set_top_level_error("TypeError: bad news", "http://test.com/bad.js", 45);
        assert_eq!(
            results.top_level_error(),
            Some("TypeError: bad news at http://test.com/bad.js, line 45")
        );

        // 后一次覆盖前一次
        results.set_top_level_error("ReferenceError: x", "a.js", 3);
        assert_eq!(results.top_level_error(), Some("ReferenceError: x at a.js, line 3"));
    }

    #[test]
    fn test_mark_all_received_idempotent() {
        let mut results = ResultSet::new();
        results.mark_all_received();
        results.mark_all_received();
        assert!(results.all());
    }

    #[test]
    fn test_serialize_camel_case() {
        let mut results = ResultSet::new();
        results.add_result(outcome(json!({"failed": 1, "name": "t"})));
        results.set_top_level_error("e", "s.js", 2);

        let value = serde_json::to_value(&results).unwrap();
        assert_eq!(value["total"], 1);
        assert_eq!(value["failed"], 1);
        assert_eq!(value["topLevelError"], "e at s.js, line 2");
        assert_eq!(value["tests"][0]["name"], "t");
        assert_eq!(value["all"], false);
    }

    #[test]
    fn test_deserialize_recounts_from_tests() {
        let mut results: ResultSet = serde_json::from_value(json!({
            "total": 0,
            "passed": 3,
            "failed": 0,
            "tests": [{"failed": true}],
            "topLevelError": null,
            "all": true
        }))
        .unwrap();
        assert_eq!(results.failed(), 1);
        assert_eq!(results.passed(), 0);
        assert!(results.all());

        results.add_result(outcome(json!({"failed": false})));
        assert_eq!(results.total(), results.tests().len());
        assert_eq!(results.total(), results.passed() + results.failed());
        assert_eq!(results.passed(), 1);
    }

    #[test]
    fn test_serialized_form_reads_back() {
        let mut results = ResultSet::new();
        results.add_result(outcome(json!({"failed": 0, "name": "a"})));
        results.set_top_level_error("e", "s.js", 2);

        let value = serde_json::to_value(&results).unwrap();
        let back: ResultSet = serde_json::from_value(value).unwrap();
        assert_eq!(back, results);
    }
}

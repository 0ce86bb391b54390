use super::offline::{offline_decision, offline_rollover, OfflineRolloverParams};
use super::request::{RequestValidationError, RolloverRequest};
use super::response::{extract_json_object, normalize, ParsedRolloverResponse};
use super::RolloverEngine;
use crate::domain::rollover::{CurrentShiftReport, NextShiftPlan, PlannedTask, TaskAchievementDelta};
use crate::domain::types::{DecisionSource, RolloverAction};
use crate::engine::shift_calendar::ShiftCalendar;
use crate::reasoning::{ReasoningBackend, ReasoningClient, ReasoningError, ReasoningPrompt, RetryPolicy};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ==========================================
// 测试桩
// ==========================================

struct ScriptedBackend {
    name: String,
    replies: Mutex<VecDeque<Result<String, ReasoningError>>>,
    calls: AtomicUsize,
}

impl ScriptedBackend {
    fn new(name: &str, replies: Vec<Result<String, ReasoningError>>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            replies: Mutex::new(replies.into()),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReasoningBackend for ScriptedBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, _prompt: &ReasoningPrompt) -> Result<String, ReasoningError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ReasoningError::Connection("脚本已耗尽".to_string())))
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn task(id: &str, target: f64, achieved: f64, rate: Option<f64>) -> TaskAchievementDelta {
    TaskAchievementDelta {
        task_id: id.to_string(),
        product_name: format!("产品{}", id),
        target_amount: target,
        target_unit: "pcs".to_string(),
        achieved_amount: achieved,
        production_rate_per_hour: rate,
    }
}

fn current_report(tasks: Vec<TaskAchievementDelta>) -> CurrentShiftReport {
    CurrentShiftReport {
        shift_name: "Morning".to_string(),
        date: date(2026, 10, 19),
        tasks,
    }
}

fn next_plan() -> NextShiftPlan {
    NextShiftPlan {
        name: "Evening".to_string(),
        date: date(2026, 10, 19),
        planned_tasks: vec![PlannedTask {
            task_id: "P1".to_string(),
            product_name: "产品P1".to_string(),
            target_amount: 200.0,
            target_unit: "pcs".to_string(),
            production_rate_per_hour: Some(50.0),
        }],
    }
}

fn engine_with(primary: Arc<ScriptedBackend>, fallback: Arc<ScriptedBackend>) -> RolloverEngine {
    let client = ReasoningClient::new(primary, fallback, RetryPolicy::new(3));
    RolloverEngine::new(client, ShiftCalendar::default(), OfflineRolloverParams::default())
}

// ==========================================
// 离线算法
// ==========================================

#[test]
fn test_offline_shortage_rolls_over() {
    let d = offline_decision(&task("T1", 100.0, 90.0, Some(20.0)), &OfflineRolloverParams::default());
    assert_eq!(d.action, RolloverAction::Rollover);
    assert_eq!(d.amount_to_transfer, 10.0);
    assert_eq!(d.time_to_transfer_hours, Some(0.5));
}

#[test]
fn test_offline_surplus_balances() {
    let d = offline_decision(&task("T1", 100.0, 110.0, None), &OfflineRolloverParams::default());
    assert_eq!(d.action, RolloverAction::Balance);
    assert_eq!(d.amount_to_transfer, 10.0);
    // 产能 = 100 / 8 = 12.5
    assert_eq!(d.time_to_transfer_hours, Some(0.8));
}

#[test]
fn test_offline_within_tolerance_is_none() {
    let params = OfflineRolloverParams::default();
    for achieved in [100.0, 95.0, 105.0] {
        let d = offline_decision(&task("T1", 100.0, achieved, None), &params);
        assert_eq!(d.action, RolloverAction::None, "achieved={}", achieved);
        assert_eq!(d.amount_to_transfer, 0.0);
        assert_eq!(d.time_to_transfer_hours, Some(0.0));
    }
}

#[test]
fn test_offline_zero_target_uses_neutral_rate() {
    let d = offline_decision(&task("T1", 0.0, 50.0, Some(-1.0)), &OfflineRolloverParams::default());
    assert_eq!(d.action, RolloverAction::Balance);
    assert_eq!(d.time_to_transfer_hours, Some(0.5));
}

#[test]
fn test_offline_outcome_marked_as_fallback() {
    let outcome = offline_rollover(
        &[task("T1", 100.0, 90.0, None), task("T2", 50.0, 50.0, None)],
        &OfflineRolloverParams::default(),
    );
    assert!(outcome.fallback);
    assert_eq!(outcome.source, DecisionSource::Offline);
    assert_eq!(outcome.decisions.len(), 2);
    assert!(outcome.summary.starts_with("Offline estimate:"));
    assert!(outcome.summary.contains("T1"));
    assert!(outcome.summary.contains("T2"));
}

// ==========================================
// 请求构建
// ==========================================

#[test]
fn test_request_carries_capacity_constraint() {
    let req = RolloverRequest::build(
        &current_report(vec![task("T1", 100.0, 90.0, None)]),
        &next_plan(),
        &ShiftCalendar::default(),
        &OfflineRolloverParams::default(),
    )
    .unwrap();

    assert_eq!(req.current_shift.duration_minutes, 480);
    assert_eq!(req.next_shift.duration_minutes, 480);
    assert_eq!(req.constraints.max_shift_hours, 8.0);
    assert_eq!(req.next_shift.committed_hours, 4.0);
    assert_eq!(req.next_shift.available_hours, 4.0);
    assert_eq!(req.tasks[0].difference, -10.0);

    let prompt = req.to_prompt().unwrap();
    assert!(prompt.expect_json);
    assert!(prompt.user.contains("\"maxShiftHours\""));
    assert!(prompt.system.contains("decisions"));
}

#[test]
fn test_request_rejects_duplicate_task_ids() {
    let err = RolloverRequest::build(
        &current_report(vec![task("T1", 10.0, 5.0, None), task("T1", 10.0, 5.0, None)]),
        &next_plan(),
        &ShiftCalendar::default(),
        &OfflineRolloverParams::default(),
    )
    .unwrap_err();
    assert_eq!(err, RequestValidationError::DuplicateTaskId("T1".to_string()));
}

#[test]
fn test_request_rejects_non_finite_amount() {
    let err = RolloverRequest::build(
        &current_report(vec![task("T1", f64::NAN, 5.0, None)]),
        &next_plan(),
        &ShiftCalendar::default(),
        &OfflineRolloverParams::default(),
    )
    .unwrap_err();
    assert!(matches!(err, RequestValidationError::NonFiniteAmount { .. }));
}

// ==========================================
// 应答解析
// ==========================================

#[test]
fn test_extract_json_from_markdown_fence() {
    let text = "Here you go:\n```json\n{\"decisions\": [], \"summary\": \"ok\"}\n```";
    assert_eq!(
        extract_json_object(text),
        Some("{\"decisions\": [], \"summary\": \"ok\"}")
    );
    assert_eq!(extract_json_object("no json here"), None);
}

#[test]
fn test_parse_single_decision_object_is_wrapped() {
    let text = r#"{"decisions": {"taskId": "T1", "action": "rollover", "amountToTransfer": 10}, "summary": "s"}"#;
    let parsed = ParsedRolloverResponse::parse(text).unwrap();
    assert!(matches!(parsed, ParsedRolloverResponse::Single { .. }));
    assert_eq!(parsed.into_decisions().len(), 1);
}

#[test]
fn test_parse_missing_decisions_fails() {
    assert!(ParsedRolloverResponse::parse(r#"{"summary": "nothing"}"#).is_none());
    assert!(ParsedRolloverResponse::parse(r#"{"decisions": "T1"}"#).is_none());
    assert!(ParsedRolloverResponse::parse("not json {").is_none());
}

#[test]
fn test_normalize_clamps_and_recomputes() {
    let text = r#"{"decisions": [
        {"taskId": "T1", "action": "ROLLOVER", "amountToTransfer": -4, "timeToTransfer": -1},
        {"taskId": "T2", "action": "balance", "amountToTransfer": "20"},
        {"taskId": "GHOST", "action": "rollover", "amountToTransfer": 5},
        {"taskId": "T1", "action": "balance", "amountToTransfer": 99}
    ], "summary": "s"}"#;
    let tasks = vec![task("T1", 100.0, 90.0, None), task("T2", 80.0, 100.0, Some(40.0))];
    let decisions = normalize(ParsedRolloverResponse::parse(text).unwrap().into_decisions(), &tasks, 100.0);

    assert_eq!(decisions.len(), 2);
    assert_eq!(decisions[0].task_id, "T1");
    assert_eq!(decisions[0].action, RolloverAction::Rollover);
    assert_eq!(decisions[0].amount_to_transfer, 0.0);
    assert_eq!(decisions[0].time_to_transfer_hours, Some(0.0));
    assert_eq!(decisions[1].amount_to_transfer, 20.0);
    assert_eq!(decisions[1].time_to_transfer_hours, Some(0.5));
    assert_eq!(decisions[1].product_name, "产品T2");
}

#[test]
fn test_normalize_none_action_carries_no_hours() {
    let text = r#"{"decisions": [
        {"taskId": "T1", "action": "none", "amountToTransfer": 30, "timeToTransfer": 3},
        {"taskId": "T2", "action": "rollover", "amountToTransfer": 0, "timeToTransfer": 2}
    ], "summary": "s"}"#;
    let tasks = vec![task("T1", 100.0, 100.0, None), task("T2", 100.0, 98.0, None)];
    let decisions = normalize(ParsedRolloverResponse::parse(text).unwrap().into_decisions(), &tasks, 100.0);

    assert_eq!(decisions[0].action, RolloverAction::None);
    assert_eq!(decisions[0].amount_to_transfer, 0.0);
    assert_eq!(decisions[0].time_to_transfer_hours, Some(0.0));
    assert_eq!(decisions[1].amount_to_transfer, 0.0);
    assert_eq!(decisions[1].time_to_transfer_hours, Some(0.0));
}

#[test]
fn test_normalize_accepts_numeric_task_ids() {
    let text = r#"{"decisions": [
        {"taskId": 17, "action": "rollover", "amountToTransfer": 50},
        {"taskId": " 18 ", "action": "balance", "amountToTransfer": 10}
    ], "summary": "s"}"#;
    let tasks = vec![task("17", 100.0, 50.0, Some(25.0)), task("18", 100.0, 110.0, None)];
    let decisions = normalize(ParsedRolloverResponse::parse(text).unwrap().into_decisions(), &tasks, 100.0);

    assert_eq!(decisions.len(), 2);
    assert_eq!(decisions[0].task_id, "17");
    assert_eq!(decisions[0].time_to_transfer_hours, Some(2.0));
    assert_eq!(decisions[1].task_id, "18");
    assert_eq!(decisions[1].action, RolloverAction::Balance);
}

// ==========================================
// 引擎端到端（测试桩）
// ==========================================

#[tokio::test]
async fn test_engine_uses_remote_decisions() {
    let primary = ScriptedBackend::new(
        "primary",
        vec![Ok("```json\n{\"decisions\":[{\"taskId\":\"T1\",\"productName\":\"产品T1\",\"action\":\"rollover\",\"amountToTransfer\":10,\"timeToTransfer\":0.4,\"reason\":\"short\"}],\"summary\":\"move 10\"}\n```".to_string())],
    );
    let fallback = ScriptedBackend::new("fallback", vec![]);
    let engine = engine_with(primary.clone(), fallback.clone());

    let outcome = engine
        .decide(&current_report(vec![task("T1", 100.0, 90.0, None)]), &next_plan())
        .await;

    assert!(!outcome.fallback);
    assert_eq!(
        outcome.source,
        DecisionSource::Remote {
            backend: "primary".to_string()
        }
    );
    assert_eq!(outcome.summary, "move 10");
    assert_eq!(outcome.decisions[0].time_to_transfer_hours, Some(0.4));
    assert_eq!(primary.calls(), 1);
    assert_eq!(fallback.calls(), 0);
}

#[tokio::test]
async fn test_engine_fills_tasks_missing_from_remote_answer() {
    let primary = ScriptedBackend::new(
        "primary",
        vec![Ok(r#"{"decisions":{"taskId":"T2","action":"none"},"summary":"partial"}"#.to_string())],
    );
    let engine = engine_with(primary, ScriptedBackend::new("fallback", vec![]));

    let outcome = engine
        .decide(
            &current_report(vec![task("T1", 100.0, 90.0, None), task("T2", 10.0, 10.0, None)]),
            &next_plan(),
        )
        .await;

    assert!(!outcome.fallback);
    assert_eq!(outcome.decisions.len(), 2);
    assert_eq!(outcome.decisions[0].task_id, "T1");
    assert_eq!(outcome.decisions[0].action, RolloverAction::Rollover);
    assert_eq!(outcome.decisions[1].action, RolloverAction::None);
}

#[tokio::test]
async fn test_engine_falls_back_on_malformed_reply() {
    let primary = ScriptedBackend::new("primary", vec![Ok("I cannot help with that".to_string())]);
    let engine = engine_with(primary, ScriptedBackend::new("fallback", vec![]));

    let outcome = engine
        .decide(&current_report(vec![task("T1", 100.0, 110.0, None)]), &next_plan())
        .await;

    assert!(outcome.fallback);
    assert_eq!(outcome.decisions[0].action, RolloverAction::Balance);
}

#[tokio::test]
async fn test_engine_falls_back_when_no_decision_survives() {
    let primary = ScriptedBackend::new(
        "primary",
        vec![Ok(r#"{"decisions":[{"taskId":"UNKNOWN","action":"rollover"}],"summary":"x"}"#.to_string())],
    );
    let engine = engine_with(primary, ScriptedBackend::new("fallback", vec![]));

    let outcome = engine
        .decide(&current_report(vec![task("T1", 100.0, 90.0, None)]), &next_plan())
        .await;

    assert!(outcome.fallback);
    assert_eq!(outcome.source, DecisionSource::Offline);
}

#[tokio::test(start_paused = true)]
async fn test_engine_offline_when_both_backends_fail() {
    let primary = ScriptedBackend::new(
        "primary",
        vec![
            Err(ReasoningError::Timeout("t1".to_string())),
            Err(ReasoningError::Timeout("t2".to_string())),
            Err(ReasoningError::Timeout("t3".to_string())),
        ],
    );
    let fallback = ScriptedBackend::new(
        "fallback",
        vec![Err(ReasoningError::Unauthorized("no key".to_string()))],
    );
    let engine = engine_with(primary.clone(), fallback.clone());

    let outcome = engine
        .decide(&current_report(vec![task("T1", 100.0, 90.0, Some(20.0))]), &next_plan())
        .await;

    assert!(outcome.fallback);
    assert_eq!(outcome.decisions[0].action, RolloverAction::Rollover);
    assert_eq!(outcome.decisions[0].amount_to_transfer, 10.0);
    assert_eq!(primary.calls(), 3);
    assert_eq!(fallback.calls(), 1);
}

#[tokio::test]
async fn test_engine_skips_remote_for_empty_task_list() {
    let primary = ScriptedBackend::new("primary", vec![]);
    let engine = engine_with(primary.clone(), ScriptedBackend::new("fallback", vec![]));

    let outcome = engine.decide(&current_report(vec![]), &next_plan()).await;

    assert!(outcome.fallback);
    assert!(outcome.decisions.is_empty());
    assert_eq!(primary.calls(), 0);
}

#[tokio::test]
async fn test_offline_only_engine_never_calls_remote() {
    let engine = RolloverEngine::offline_only(ShiftCalendar::default(), OfflineRolloverParams::default());
    let outcome = engine
        .decide(&current_report(vec![task("T1", 100.0, 90.0, None)]), &next_plan())
        .await;
    assert!(outcome.fallback);
    assert_eq!(outcome.decisions.len(), 1);
}

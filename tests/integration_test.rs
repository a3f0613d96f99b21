use async_trait::async_trait;
use grammar_quiz::services::parse_question_response;
use grammar_quiz::{
    Config, LlmService, Phase, Question, QuestionError, QuestionResult, QuestionSource,
    QuizController,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio_test::{assert_err, assert_ok};

/// 按顺序返回预设结果的题目来源
struct ScriptedSource {
    responses: Mutex<VecDeque<QuestionResult<Question>>>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    fn new(responses: Vec<QuestionResult<Question>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuestionSource for ScriptedSource {
    async fn fetch_question(&self) -> QuestionResult<Question> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(QuestionError::source_unavailable("脚本已耗尽")))
    }
}

fn question(n: u32) -> Question {
    Question::new(
        format!("I ___ my homework yesterday ({}).", n),
        vec!["did".to_string(), "was".to_string(), "do".to_string()],
        "did",
        "Se usa 'did' para el pasado simple.",
    )
    .unwrap()
}

fn unavailable() -> QuestionResult<Question> {
    Err(QuestionError::source_unavailable("connection refused"))
}

fn controller_for(source: &Arc<ScriptedSource>) -> QuizController {
    QuizController::new(source.clone())
}

#[tokio::test]
async fn test_start_then_correct_answer_uses_buffer() {
    let source = ScriptedSource::new(vec![Ok(question(1)), Ok(question(2)), Ok(question(3))]);
    let mut controller = controller_for(&source);

    controller.start().await;
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.phase, Phase::Ready);
    assert_eq!(snapshot.current_question, Some(question(1)));
    assert_eq!(snapshot.buffered_question, Some(question(2)));
    assert_eq!(snapshot.question_index, 1);
    assert_eq!(snapshot.score, 0);

    controller.submit_answer("did").await;
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.phase, Phase::Ready);
    assert_eq!(snapshot.score, 1);
    assert_eq!(snapshot.question_index, 2);
    assert_eq!(snapshot.current_question, Some(question(2)));

    // 后台补货
    controller.wait_for_refill().await;
    assert_eq!(controller.snapshot().buffered_question, Some(question(3)));
    assert_eq!(source.calls(), 3);
}

#[tokio::test]
async fn test_wrong_answer_keeps_score() {
    let source = ScriptedSource::new(vec![Ok(question(1)), Ok(question(2)), Ok(question(3))]);
    let mut controller = controller_for(&source);
    controller.start().await;

    let before = controller.snapshot();
    let feedback = before.current_question.as_ref().unwrap().check("was");
    assert!(!feedback.is_correct);
    assert_eq!(controller.snapshot(), before);

    controller.submit_answer("was").await;
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.score, 0);
    assert_eq!(snapshot.question_index, 2);
    assert_eq!(snapshot.current_question, Some(question(2)));
}

#[tokio::test]
async fn test_start_is_idempotent() {
    let source = ScriptedSource::new(vec![Ok(question(1)), Ok(question(2))]);
    let mut controller = controller_for(&source);

    controller.start().await;
    let before = controller.snapshot();

    controller.start().await;
    assert_eq!(controller.snapshot(), before);
    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn test_initial_failure_then_restart() {
    let source = ScriptedSource::new(vec![unavailable()]);
    let mut controller = controller_for(&source);

    controller.start().await;
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.phase, Phase::Failed);
    assert!(snapshot
        .last_error
        .is_some_and(|e| e.contains("connection refused")));

    // 脚本已耗尽，重试仍然失败
    controller.restart().await;
    assert_eq!(controller.snapshot().phase, Phase::Failed);
    assert_eq!(controller.snapshot().question_index, 1);
}

#[tokio::test]
async fn test_recovery_fetch_success() {
    let source = ScriptedSource::new(vec![
        Ok(question(1)),
        Ok(question(2)),
        unavailable(), // 补货失败
        Ok(question(4)), // 恢复请求
        Ok(question(5)), // 再次补货
    ]);
    let mut controller = controller_for(&source);
    controller.start().await;

    controller.submit_answer("did").await;
    controller.wait_for_refill().await;
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.phase, Phase::Ready);
    assert!(snapshot.buffered_question.is_none());
    assert!(snapshot.last_error.is_none());

    controller.submit_answer("did").await;
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.phase, Phase::Ready);
    assert_eq!(snapshot.current_question, Some(question(4)));
    assert_eq!(snapshot.question_index, 3);
    assert_eq!(snapshot.score, 2);

    controller.wait_for_refill().await;
    assert_eq!(controller.snapshot().buffered_question, Some(question(5)));
}

#[tokio::test]
async fn test_recovery_failure_then_restart() {
    let source = ScriptedSource::new(vec![
        Ok(question(1)),
        Ok(question(2)),
        unavailable(), // 补货失败
        Err(QuestionError::malformed("expected object")), // 恢复失败
        Ok(question(5)),
        Ok(question(6)),
    ]);
    let mut controller = controller_for(&source);
    controller.start().await;

    controller.submit_answer("did").await;
    controller.wait_for_refill().await;

    controller.submit_answer("was").await;
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.phase, Phase::Failed);
    assert!(snapshot.last_error.is_some());

    // Failed 阶段提交被忽略
    controller.submit_answer("did").await;
    assert_eq!(controller.snapshot(), snapshot);

    controller.restart().await;
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.phase, Phase::Ready);
    assert_eq!(snapshot.score, 0);
    assert_eq!(snapshot.question_index, 1);
    assert_eq!(snapshot.current_question, Some(question(5)));
    assert_eq!(snapshot.buffered_question, Some(question(6)));
    assert!(snapshot.last_error.is_none());
}

#[tokio::test]
async fn test_submit_before_start_is_ignored() {
    let source = ScriptedSource::new(vec![]);
    let mut controller = controller_for(&source);

    controller.submit_answer("did").await;
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.phase, Phase::Initializing);
    assert_eq!(snapshot.question_index, 1);
    assert_eq!(source.calls(), 0);
}

#[tokio::test]
async fn test_stale_refill_after_restart_is_dropped() {
    let source = ScriptedSource::new((1..=5).map(|n| Ok(question(n))).collect());
    let mut controller = controller_for(&source);
    controller.start().await;
    let first_generation = controller.snapshot().generation;

    // 补货任务已发起但尚未完成时 restart
    controller.submit_answer("did").await;
    controller.restart().await;

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.phase, Phase::Ready);
    assert_ne!(snapshot.generation, first_generation);
    assert_eq!(snapshot.question_index, 1);
    assert_eq!(snapshot.score, 0);
    assert!(snapshot.current_question.is_some());
    assert!(snapshot.buffered_question.is_some());

    // 旧会话的补货结果到达后不影响新会话
    tokio::task::yield_now().await;
    controller.sync_background();
    controller.wait_for_refill().await;
    assert_eq!(controller.snapshot(), snapshot);
    assert_eq!(source.calls(), 5);
}

#[tokio::test]
async fn test_score_never_exceeds_index() {
    let source = ScriptedSource::new((1..=20).map(|n| Ok(question(n))).collect());
    let mut controller = controller_for(&source);
    controller.start().await;

    for n in 0..12u32 {
        let before = controller.snapshot().question_index;
        let answer = if n % 4 == 0 { "do" } else { "did" };

        controller.submit_answer(answer).await;
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.question_index, before + 1);
        assert!(snapshot.score <= snapshot.question_index);

        controller.wait_for_refill().await;
    }

    assert_eq!(controller.snapshot().score, 9);
}

#[tokio::test]
async fn test_subscribers_see_latest_snapshot() {
    let source = ScriptedSource::new(vec![Ok(question(1)), Ok(question(2))]);
    let mut controller = controller_for(&source);
    let rx = controller.subscribe();

    controller.start().await;
    assert_eq!(*rx.borrow(), controller.snapshot());
    assert_eq!(rx.borrow().phase, Phase::Ready);
}

#[test]
fn test_parse_fenced_response() {
    let raw = "```json\n{\"question\": \"We ___ tired.\", \"options\": [\"were\", \"was\"], \"answer\": \"were\", \"explanation\": \"Plural.\"}\n```";
    assert_ok!(parse_question_response(raw));
    assert_err!(parse_question_response("[]"));
}

#[test]
fn test_llm_service_is_a_question_source() {
    let source: Arc<dyn QuestionSource> = Arc::new(LlmService::new(&Config::default()));
    assert_eq!(Arc::strong_count(&source), 1);
}

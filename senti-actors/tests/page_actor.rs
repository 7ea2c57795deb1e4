use async_trait::async_trait;
use senti_actors::actor::{spawn_actor, Addr};
use senti_actors::{PageActor, PageEvent, PageMsg};
use senti_api::{ApiError, FeedbackAck, SentimentApi};
use senti_common::{
    BatchLine, BatchResult, FeedbackRecord, Mode, Model, PredictionResult, Probabilities,
    Sentiment,
};
use senti_page::{ControllerSettings, Displayed, FeedbackPhase, Notice, NoticeLevel, PageView, Phase};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

type Reply<T> = (Duration, Result<T, ApiError>);

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Predict(String, Model),
    Batch(Vec<String>, Model),
    Feedback(FeedbackRecord),
}

struct ScriptedApi {
    predict: Box<dyn Fn(&str) -> Reply<PredictionResult> + Send + Sync>,
    feedback: Mutex<VecDeque<Result<FeedbackAck, ApiError>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedApi {
    fn new() -> Self {
        Self {
            predict: Box::new(|text| {
                (
                    Duration::from_millis(50),
                    Ok(prediction(text, Sentiment::Positive)),
                )
            }),
            feedback: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn on_predict(
        mut self,
        f: impl Fn(&str) -> Reply<PredictionResult> + Send + Sync + 'static,
    ) -> Self {
        self.predict = Box::new(f);
        self
    }

    fn feedback_results(self, results: Vec<Result<FeedbackAck, ApiError>>) -> Self {
        *self.feedback.lock().unwrap() = results.into();
        self
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SentimentApi for ScriptedApi {
    async fn predict_single(&self, text: &str, model: Model) -> Result<PredictionResult, ApiError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Predict(text.to_string(), model));
        let (delay, reply) = (self.predict)(text);
        tokio::time::sleep(delay).await;
        reply
    }

    async fn predict_batch(&self, lines: &[String], model: Model) -> Result<BatchResult, ApiError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Batch(lines.to_vec(), model));
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(BatchResult {
            overall: PredictionResult {
                id: None,
                label: Sentiment::Neutral,
                probabilities: Probabilities::new(),
            },
            per_line: lines
                .iter()
                .map(|l| BatchLine {
                    text: l.clone(),
                    label: Sentiment::Neutral,
                    probabilities: Probabilities::new(),
                })
                .collect(),
        })
    }

    async fn submit_feedback(&self, record: &FeedbackRecord) -> Result<FeedbackAck, ApiError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Feedback(record.clone()));
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.feedback
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(FeedbackAck(serde_json::Value::Null)))
    }
}

/// Prediction whose id is derived from the input text.
fn prediction(text: &str, label: Sentiment) -> PredictionResult {
    PredictionResult {
        id: Some(format!("id-{text}")),
        label,
        probabilities: [("positive", 0.9), ("neutral", 0.07), ("negative", 0.03)]
            .into_iter()
            .collect(),
    }
}

struct Harness {
    page: Addr<PageActor>,
    events: mpsc::UnboundedReceiver<PageEvent>,
    notices: VecDeque<Notice>,
    api: Arc<ScriptedApi>,
}

impl Harness {
    fn start(api: ScriptedApi) -> Self {
        let api = Arc::new(api);
        let (tx, events) = mpsc::unbounded_channel();
        let actor = PageActor::new(api.clone(), ControllerSettings::default(), tx);
        let handle = spawn_actor(actor, 32);
        Self {
            page: handle.addr,
            events,
            notices: VecDeque::new(),
            api,
        }
    }

    async fn send(&self, msg: PageMsg) {
        assert!(self.page.send(msg).await.is_ok(), "page actor stopped");
    }

    async fn submit_text(&self, text: &str) {
        self.send(PageMsg::SetText(text.to_string())).await;
        self.send(PageMsg::Submit).await;
    }

    async fn next_event(&mut self) -> PageEvent {
        tokio::time::timeout(Duration::from_secs(30), self.events.recv())
            .await
            .expect("page event before timeout")
            .expect("page actor alive")
    }

    async fn wait_view(&mut self, pred: impl Fn(&PageView) -> bool) -> PageView {
        loop {
            match self.next_event().await {
                PageEvent::View(v) if pred(&v) => return v,
                PageEvent::View(_) => {}
                PageEvent::Notice(n) => self.notices.push_back(n),
            }
        }
    }

    async fn wait_notice(&mut self) -> Notice {
        if let Some(n) = self.notices.pop_front() {
            return n;
        }
        loop {
            if let PageEvent::Notice(n) = self.next_event().await {
                return n;
            }
        }
    }

    /// Everything published so far, without waiting.
    fn drain(&mut self) -> Vec<PageEvent> {
        let mut out = Vec::new();
        while let Ok(ev) = self.events.try_recv() {
            out.push(ev);
        }
        out
    }
}

fn shown_single(v: &PageView) -> Option<&PredictionResult> {
    match &v.result {
        Some(Displayed::Single(r)) => Some(r),
        _ => None,
    }
}

#[tokio::test(start_paused = true)]
async fn empty_input_never_reaches_backend() {
    let mut h = Harness::start(ScriptedApi::new());
    h.submit_text("  \n  ").await;

    let notice = h.wait_notice().await;
    assert_eq!(notice.level, NoticeLevel::Error);
    assert_eq!(notice.title, "Input required");
    assert_eq!(notice.message, "Please enter some text to analyze.");
    assert!(h.api.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn too_many_batch_lines_never_reach_backend() {
    let mut h = Harness::start(ScriptedApi::new());
    h.send(PageMsg::SetMode(Mode::Batch)).await;
    let text = (1..=11).map(|i| format!("line {i}\n")).collect::<String>();
    h.submit_text(&text).await;

    let notice = h.wait_notice().await;
    assert_eq!(notice.title, "Too many lines");
    assert!(h.api.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn feedback_question_appears_after_delay() {
    let mut h = Harness::start(ScriptedApi::new());
    let started = Instant::now();
    h.submit_text("I love this!").await;

    let v = h.wait_view(|v| v.phase == Phase::Resulted).await;
    assert_eq!(v.feedback, FeedbackPhase::None);
    let r = shown_single(&v).expect("single result");
    assert_eq!(r.label, Sentiment::Positive);
    assert_eq!(
        r.probabilities.ordered(),
        vec![("positive", 0.9), ("neutral", 0.07), ("negative", 0.03)]
    );

    h.wait_view(|v| v.feedback == FeedbackPhase::Question).await;
    assert!(started.elapsed() >= Duration::from_millis(3000));
    assert_eq!(
        h.api.calls(),
        vec![Call::Predict("I love this!".into(), Model::Roberta)]
    );
}

#[tokio::test(start_paused = true)]
async fn batch_results_never_ask_for_feedback() {
    let mut h = Harness::start(ScriptedApi::new());
    h.send(PageMsg::SetMode(Mode::Batch)).await;
    h.submit_text("good day\n\n  bad day  \n").await;

    let v = h.wait_view(|v| v.phase == Phase::Resulted).await;
    match v.result {
        Some(Displayed::Batch(b)) => {
            let texts: Vec<&str> = b.per_line.iter().map(|l| l.text.as_str()).collect();
            assert_eq!(texts, ["good day", "bad day"]);
        }
        other => panic!("expected batch result, got {other:?}"),
    }

    tokio::time::sleep(Duration::from_secs(10)).await;
    let asked = h
        .drain()
        .into_iter()
        .any(|e| matches!(e, PageEvent::View(v) if v.feedback != FeedbackPhase::None));
    assert!(!asked);
    assert_eq!(
        h.api.calls(),
        vec![Call::Batch(
            vec!["good day".into(), "bad day".into()],
            Model::Roberta
        )]
    );
}

#[tokio::test(start_paused = true)]
async fn slow_stale_response_is_discarded() {
    let api = ScriptedApi::new().on_predict(|text| match text {
        "slow" => (
            Duration::from_millis(500),
            Ok(prediction(text, Sentiment::Negative)),
        ),
        _ => (
            Duration::from_millis(10),
            Ok(prediction(text, Sentiment::Positive)),
        ),
    });
    let mut h = Harness::start(api);
    h.submit_text("slow").await;
    h.submit_text("fast").await;

    let v = h.wait_view(|v| v.phase == Phase::Resulted).await;
    assert_eq!(shown_single(&v).and_then(|r| r.id.as_deref()), Some("id-fast"));

    tokio::time::sleep(Duration::from_secs(1)).await;
    for ev in h.drain() {
        if let PageEvent::View(v) = ev {
            assert_eq!(
                shown_single(&v).and_then(|r| r.id.as_deref()),
                Some("id-fast")
            );
        }
    }
    assert_eq!(h.api.calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn resubmitting_cancels_pending_prompt() {
    let api = ScriptedApi::new().on_predict(|text| match text {
        "second" => (
            Duration::from_secs(5),
            Ok(prediction(text, Sentiment::Negative)),
        ),
        _ => (
            Duration::from_millis(10),
            Ok(prediction(text, Sentiment::Positive)),
        ),
    });
    let mut h = Harness::start(api);
    h.submit_text("first").await;
    h.wait_view(|v| v.phase == Phase::Resulted).await;

    tokio::time::sleep(Duration::from_millis(1000)).await;
    h.submit_text("second").await;

    // The first prompt would have fired 2s into the second request.
    let v = h
        .wait_view(|v| v.phase == Phase::Resulted || v.feedback != FeedbackPhase::None)
        .await;
    assert_eq!(v.phase, Phase::Resulted);
    assert_eq!(v.feedback, FeedbackPhase::None);
    assert_eq!(shown_single(&v).and_then(|r| r.id.as_deref()), Some("id-second"));
}

#[tokio::test(start_paused = true)]
async fn failure_clears_previous_result_and_reports_server_message() {
    let api = ScriptedApi::new().on_predict(|text| match text {
        "bad" => (
            Duration::from_millis(10),
            Err(ApiError::Request {
                status: 500,
                message: "model warming up".into(),
            }),
        ),
        _ => (
            Duration::from_millis(10),
            Ok(prediction(text, Sentiment::Positive)),
        ),
    });
    let mut h = Harness::start(api);
    h.submit_text("good").await;
    h.wait_view(|v| v.phase == Phase::Resulted).await;

    h.submit_text("bad").await;
    let notice = h.wait_notice().await;
    assert_eq!(notice.title, "Analysis failed");
    assert_eq!(notice.message, "model warming up");

    let v = h.wait_view(|v| v.phase == Phase::Idle).await;
    assert!(v.result.is_none());
}

#[tokio::test(start_paused = true)]
async fn yes_sends_correct_feedback() {
    let mut h = Harness::start(ScriptedApi::new());
    h.submit_text("x").await;
    h.wait_view(|v| v.feedback == FeedbackPhase::Question).await;

    h.send(PageMsg::AnswerCorrect).await;
    let notice = h.wait_notice().await;
    assert_eq!(notice.level, NoticeLevel::Success);
    assert_eq!(notice.message, "Thanks for your feedback!");
    h.wait_view(|v| v.feedback == FeedbackPhase::Done).await;

    assert_eq!(
        h.api.calls().last(),
        Some(&Call::Feedback(FeedbackRecord::correct("id-x")))
    );
}

#[tokio::test(start_paused = true)]
async fn no_then_neutral_sends_corrected_label() {
    let mut h = Harness::start(ScriptedApi::new());
    h.submit_text("x").await;
    h.wait_view(|v| v.feedback == FeedbackPhase::Question).await;

    h.send(PageMsg::AnswerIncorrect).await;
    let v = h
        .wait_view(|v| v.feedback == FeedbackPhase::Correction)
        .await;
    assert_eq!(
        v.correction_labels,
        vec![Sentiment::Positive, Sentiment::Neutral, Sentiment::Negative]
    );

    h.send(PageMsg::ChooseLabel(Sentiment::Neutral)).await;
    h.send(PageMsg::SubmitCorrection).await;
    h.wait_view(|v| v.feedback == FeedbackPhase::Done).await;

    let feedback: Vec<Call> = h
        .api
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::Feedback(_)))
        .collect();
    assert_eq!(
        feedback,
        vec![Call::Feedback(FeedbackRecord::corrected(
            "id-x",
            Sentiment::Neutral
        ))]
    );
}

#[tokio::test(start_paused = true)]
async fn feedback_failure_allows_retry() {
    let api = ScriptedApi::new().feedback_results(vec![Err(ApiError::Request {
        status: 500,
        message: "db down".into(),
    })]);
    let mut h = Harness::start(api);
    h.submit_text("x").await;
    h.wait_view(|v| v.feedback == FeedbackPhase::Question).await;

    h.send(PageMsg::AnswerCorrect).await;
    let notice = h.wait_notice().await;
    assert_eq!(notice.title, "Feedback failed");
    assert_eq!(notice.message, "db down");
    h.wait_view(|v| v.feedback == FeedbackPhase::Question && !v.feedback_in_flight)
        .await;

    h.send(PageMsg::AnswerCorrect).await;
    h.wait_view(|v| v.feedback == FeedbackPhase::Done).await;
    let sent = h
        .api
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::Feedback(_)))
        .count();
    assert_eq!(sent, 2);
}

#[tokio::test(start_paused = true)]
async fn binary_model_is_sent_and_offers_two_labels() {
    let mut h = Harness::start(ScriptedApi::new());
    h.send(PageMsg::SetModel(Model::Bertweet2L)).await;
    h.submit_text("meh").await;
    h.wait_view(|v| v.feedback == FeedbackPhase::Question).await;
    h.send(PageMsg::AnswerIncorrect).await;
    let v = h
        .wait_view(|v| v.feedback == FeedbackPhase::Correction)
        .await;
    assert_eq!(
        v.correction_labels,
        vec![Sentiment::Positive, Sentiment::Negative]
    );
    assert_eq!(
        h.api.calls()[0],
        Call::Predict("meh".into(), Model::Bertweet2L)
    );
}

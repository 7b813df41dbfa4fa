//! Message -> run -> poll -> reply exchange, including failure and transient policies.

mod common;

use std::sync::Arc;

use assistant::{
    Assistant, AssistantClient, AssistantError, AssistantThread, RunStatus, ThreadedAssistant,
    TransientFallback, TransientPollPolicy,
};
use common::{client, fast_poll, CountingStore, ScriptedApi};

fn transient() -> AssistantError {
    AssistantError::Http("connection reset by peer".into())
}

#[tokio::test]
async fn completed_run_returns_latest_message_text() {
    let api = Arc::new(
        ScriptedApi::new()
            .script(vec![
                Ok(RunStatus::Queued),
                Ok(RunStatus::InProgress),
                Ok(RunStatus::Completed),
            ])
            .reply(Some("hey senpai")),
    );
    let c = client(api.clone());

    let reply = c.ask(&AssistantThread::new("thread_x"), "hi").await.unwrap();
    assert_eq!(reply, "hey senpai");
    assert_eq!(
        api.messages.lock().unwrap().as_slice(),
        &[("thread_x".to_string(), "hi".to_string())]
    );
    assert_eq!(ScriptedApi::count(&api.polls), 3);
    assert_eq!(ScriptedApi::count(&api.runs_created), 1);
}

#[tokio::test]
async fn failed_run_surfaces_run_failed() {
    let api = Arc::new(ScriptedApi::new().script(vec![Ok(RunStatus::InProgress), Ok(RunStatus::Failed)]));
    let c = client(api.clone());

    let err = c.ask(&AssistantThread::new("t"), "hi").await.unwrap_err();
    match err {
        AssistantError::RunFailed { status, .. } => assert_eq!(status, "failed"),
        other => panic!("expected RunFailed, got {other:?}"),
    }
    assert_eq!(ScriptedApi::count(&api.latest_calls), 0);
}

#[tokio::test]
async fn expired_and_cancelled_runs_are_failures() {
    for status in [RunStatus::Expired, RunStatus::Cancelled, RunStatus::Incomplete] {
        let api = Arc::new(ScriptedApi::new().script(vec![Ok(status)]));
        let err = client(api).ask(&AssistantThread::new("t"), "hi").await.unwrap_err();
        assert!(
            matches!(err, AssistantError::RunFailed { ref status, .. } if status != "completed"),
            "got {err:?}"
        );
    }
}

#[tokio::test]
async fn transient_poll_error_defaults_to_apology() {
    let api = Arc::new(ScriptedApi::new().script(vec![Ok(RunStatus::InProgress), Err(transient())]));
    let c = client(api.clone());

    let reply = c.ask(&AssistantThread::new("t"), "hi").await.unwrap();
    assert_eq!(reply, "Senpai, leave me alone for a bit");
    assert_eq!(ScriptedApi::count(&api.latest_calls), 0);
}

#[tokio::test]
async fn transient_poll_errors_are_retried_within_budget() {
    let api = Arc::new(
        ScriptedApi::new()
            .script(vec![Err(transient()), Err(transient()), Ok(RunStatus::Completed)])
            .reply(Some("made it")),
    );
    let c = client(api.clone()).with_transient_policy(TransientPollPolicy {
        retries: 2,
        fallback: TransientFallback::Fail,
    });

    assert_eq!(c.ask(&AssistantThread::new("t"), "hi").await.unwrap(), "made it");
    assert_eq!(ScriptedApi::count(&api.polls), 3);
}

#[tokio::test]
async fn successful_poll_resets_transient_budget() {
    let api = Arc::new(ScriptedApi::new().script(vec![
        Err(transient()),
        Ok(RunStatus::InProgress),
        Err(transient()),
        Ok(RunStatus::Completed),
    ]));
    let c = client(api).with_transient_policy(TransientPollPolicy {
        retries: 1,
        fallback: TransientFallback::Fail,
    });

    assert_eq!(c.ask(&AssistantThread::new("t"), "hi").await.unwrap(), "hello senpai");
}

#[tokio::test]
async fn transient_fail_policy_surfaces_error() {
    let api = Arc::new(ScriptedApi::new().script(vec![Err(transient()), Err(transient())]));
    let c = client(api).with_transient_policy(TransientPollPolicy {
        retries: 1,
        fallback: TransientFallback::Fail,
    });

    let err = c.ask(&AssistantThread::new("t"), "hi").await.unwrap_err();
    assert!(matches!(err, AssistantError::TransientPoll(_)), "got {err:?}");
}

#[tokio::test]
async fn non_transient_poll_error_is_propagated() {
    let api = Arc::new(ScriptedApi::new().script(vec![Err(AssistantError::Api {
        status: 401,
        message: "invalid api key".into(),
    })]));
    let err = client(api).ask(&AssistantThread::new("t"), "hi").await.unwrap_err();
    assert!(matches!(err, AssistantError::Api { status: 401, .. }));
}

#[tokio::test]
async fn run_that_never_finishes_times_out() {
    let api = Arc::new(ScriptedApi::new().script((0..10).map(|_| Ok(RunStatus::InProgress)).collect()));
    let c = AssistantClient::new(api.clone(), "asst").with_poll_policy(fast_poll(4));

    let err = c.ask(&AssistantThread::new("t"), "hi").await.unwrap_err();
    assert!(matches!(err, AssistantError::RunTimeout { attempts: 4, .. }), "got {err:?}");
    assert_eq!(ScriptedApi::count(&api.polls), 4);
}

#[tokio::test]
async fn completed_run_without_text_is_empty_reply() {
    let api = Arc::new(ScriptedApi::new().reply(None));
    let err = client(api).ask(&AssistantThread::new("t"), "hi").await.unwrap_err();
    assert!(matches!(err, AssistantError::EmptyReply(_)));
}

#[tokio::test]
async fn ask_personal_binds_chat_and_continues_thread() {
    let api = Arc::new(ScriptedApi::new().reply(Some("hi yourself")));
    let store = Arc::new(CountingStore::default());
    let backend = ThreadedAssistant::new(Arc::new(client(api.clone())), store.clone());

    assert_eq!(backend.ask_personal(1001, "hi").await.unwrap(), "hi yourself");
    assert_eq!(backend.ask_personal(1001, "again").await.unwrap(), "hi yourself");

    assert_eq!(store.thread_for(1001).as_deref(), Some("thread_1"));
    assert_eq!(ScriptedApi::count(&api.threads_created), 1);
    let messages = api.messages.lock().unwrap().clone();
    assert_eq!(
        messages,
        vec![
            ("thread_1".to_string(), "hi".to_string()),
            ("thread_1".to_string(), "again".to_string()),
        ]
    );
}

#[tokio::test]
async fn reset_through_backend_starts_fresh_thread() {
    let api = Arc::new(ScriptedApi::new());
    let store = Arc::new(CountingStore::default());
    let backend = ThreadedAssistant::new(Arc::new(client(api.clone())), store.clone());

    backend.ask_personal(7, "one").await.unwrap();
    backend.reset(7).await.unwrap();
    backend.ask_personal(7, "two").await.unwrap();

    assert_eq!(store.thread_for(7).as_deref(), Some("thread_2"));
}

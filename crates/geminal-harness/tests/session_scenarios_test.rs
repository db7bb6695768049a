//! End-to-end session scenarios.
//!
//! # Test Strategy
//!
//! Each test runs the production [`Runtime`] against a [`SimDriver`] and a
//! [`MockInference`], then does what a user at the terminal would do:
//! 1. Type a prompt and press Enter
//! 2. Let the scripted backend answer (immediately or when released)
//! 3. Observe the rendered frames and the reported exit status
//!
//! # Oracle Pattern
//!
//! Tests end with oracle checks that verify:
//! - Exactly the expected prompts reached the backend
//! - No more than one call was ever outstanding
//! - Nothing was written after the session closed

use std::{future::Future, sync::Arc, time::Duration};

use geminal_app::{
    BANNER, EXIT_FAILURE, EXIT_INTERRUPTED, EXIT_OK, InferenceError, KeyInput, Runtime,
    SessionEvent, SessionOutcome,
};
use geminal_harness::{MockInference, SimDriverError, SimHandle, sim_session};
use tokio::task::JoinHandle;

const TIMEOUT: Duration = Duration::from_secs(5);

/// Await `fut`, failing the test instead of hanging.
async fn within<T>(fut: impl Future<Output = T>) -> T {
    tokio::time::timeout(TIMEOUT, fut).await.expect("timed out")
}

/// Start a session runtime on its own task.
fn start(
    mock: &Arc<MockInference>,
) -> (SimHandle, JoinHandle<Result<SessionOutcome, SimDriverError>>) {
    let (driver, handle) = sim_session();
    let runtime = Runtime::new(driver, Arc::clone(mock));
    (handle, tokio::spawn(runtime.run()))
}

/// Oracle checks shared by every scenario.
fn assert_oracles(handle: &SimHandle, mock: &MockInference) {
    assert!(mock.max_in_flight() <= 1, "more than one call outstanding");
    assert_eq!(handle.writes_after_close(), 0, "session wrote after closing");
}

#[tokio::test]
async fn reply_is_shown_and_input_reopens() {
    let mock = Arc::new(MockInference::new().reply(Ok("Hi there".into())));
    let (handle, task) = start(&mock);

    within(handle.wait_for_frame(|f| f.starts_with(BANNER))).await;
    handle.submit("hello");

    let frame = within(handle.wait_for_frame(|f| f.contains("Hi there"))).await;
    assert!(frame.ends_with("> "), "input line reopened: {frame:?}");
    assert_eq!(mock.calls(), vec!["hello"]);

    handle.press(KeyInput::Interrupt);
    assert_eq!(within(handle.wait_for_exit()).await, EXIT_INTERRUPTED);
    assert_eq!(
        within(task).await.unwrap().unwrap(),
        SessionOutcome::Closed { exit_status: EXIT_INTERRUPTED }
    );
    assert_oracles(&handle, &mock);
}

#[tokio::test]
async fn backspace_edits_the_submitted_prompt() {
    let mock = Arc::new(MockInference::new().reply(Ok("ok".into())));
    let (handle, task) = start(&mock);

    handle.type_text("abc");
    handle.press(KeyInput::Backspace);
    handle.press(KeyInput::Backspace);
    handle.type_text("x");
    handle.press(KeyInput::Enter);

    within(mock.wait_for_calls(1)).await;
    assert_eq!(mock.calls(), vec!["ax"]);

    handle.press(KeyInput::EndOfInput);
    assert_eq!(within(handle.wait_for_exit()).await, EXIT_OK);
    within(task).await.unwrap().unwrap();
    assert_oracles(&handle, &mock);
}

#[tokio::test]
async fn inference_failure_closes_session() {
    let err = InferenceError::Status { code: 500, body: "server error".into() };
    let mock = Arc::new(MockInference::new().reply(Err(err)));
    let (handle, task) = start(&mock);

    handle.submit("x");

    assert_eq!(within(handle.wait_for_exit()).await, EXIT_FAILURE);
    let last = handle.last_frame().unwrap();
    assert!(last.contains("Error: HTTP 500: server error"));
    assert!(last.contains("Reconnect"));

    // Further input is ignored: the runtime has already returned.
    handle.submit("more");
    assert_eq!(
        within(task).await.unwrap().unwrap(),
        SessionOutcome::Closed { exit_status: EXIT_FAILURE }
    );
    assert_eq!(mock.calls().len(), 1);
    assert_oracles(&handle, &mock);
}

#[tokio::test]
async fn blank_submit_never_reaches_backend() {
    let mock = Arc::new(MockInference::new());
    let (handle, task) = start(&mock);

    handle.submit("   ");
    handle.press(KeyInput::Enter);
    handle.press(KeyInput::EndOfInput);

    assert_eq!(within(handle.wait_for_exit()).await, EXIT_OK);
    within(task).await.unwrap().unwrap();
    assert!(mock.calls().is_empty());
    assert_oracles(&handle, &mock);
}

#[tokio::test]
async fn input_while_pending_is_ignored() {
    let mock = Arc::new(MockInference::new());
    let gate = mock.reply_later();
    let (handle, task) = start(&mock);

    handle.submit("first");
    within(mock.wait_for_calls(1)).await;
    handle.submit("second");
    within(handle.wait_for_frame(|f| f.contains("Waiting for response..."))).await;
    // "first" + Enter + "second" + Enter all taken before the reply lands.
    within(handle.wait_for_events(13)).await;

    assert!(gate.release(Ok("reply".into())));
    let frame = within(handle.wait_for_frame(|f| f.contains("reply"))).await;
    assert!(frame.ends_with("> "), "typing while pending left no trace: {frame:?}");

    handle.press(KeyInput::Interrupt);
    within(task).await.unwrap().unwrap();
    assert_eq!(mock.calls(), vec!["first"]);
    assert_oracles(&handle, &mock);
}

#[tokio::test]
async fn input_closed_while_pending_waits_for_reply() {
    let mock = Arc::new(MockInference::new());
    let gate = mock.reply_later();
    let (handle, task) = start(&mock);

    handle.submit("one-shot");
    handle.send(SessionEvent::InputClosed);
    within(mock.wait_for_calls(1)).await;
    assert_eq!(handle.exit_status(), None);

    assert!(gate.release(Ok("answer".into())));
    assert_eq!(within(handle.wait_for_exit()).await, EXIT_OK);

    let last = handle.last_frame().unwrap();
    assert!(last.contains("answer"));
    assert!(last.contains("Goodbye."));
    within(task).await.unwrap().unwrap();
    assert_oracles(&handle, &mock);
}

#[tokio::test]
async fn disconnect_while_pending_discards_reply() {
    let mock = Arc::new(MockInference::new());
    let gate = mock.reply_later();
    let (mut handle, task) = start(&mock);

    handle.submit("abandoned");
    within(mock.wait_for_calls(1)).await;

    handle.disconnect();
    assert_eq!(within(task).await.unwrap().unwrap(), SessionOutcome::Disconnected);
    let frames_at_disconnect = handle.frames().len();

    // The detached call still runs to completion; its result goes nowhere.
    assert!(gate.release(Ok("too late".into())));
    within(mock.wait_for_completed(1)).await;

    assert_eq!(handle.frames().len(), frames_at_disconnect);
    assert!(!handle.frames().iter().any(|f| f.contains("too late")));
    assert_eq!(handle.exit_status(), None);
    assert_oracles(&handle, &mock);
}

#[tokio::test]
async fn sessions_are_isolated() {
    let mock = Arc::new(MockInference::new());
    let slow = mock.reply_later();
    let fast = mock.reply_later();

    let (first, first_task) = start(&mock);
    first.submit("slow question");
    within(mock.wait_for_calls(1)).await;
    within(first.wait_for_frame(|f| f.contains("Waiting for response..."))).await;

    let (second, second_task) = start(&mock);
    second.submit("fast question");
    within(mock.wait_for_calls(2)).await;

    assert!(fast.release(Ok("fast answer".into())));
    within(second.wait_for_frame(|f| f.contains("fast answer"))).await;
    assert!(first.last_frame().unwrap().contains("Waiting for response..."));

    assert!(slow.release(Ok("slow answer".into())));
    within(first.wait_for_frame(|f| f.contains("slow answer"))).await;
    assert!(!second.frames().iter().any(|f| f.contains("slow answer")));

    first.press(KeyInput::Interrupt);
    second.press(KeyInput::Interrupt);
    within(first_task).await.unwrap().unwrap();
    within(second_task).await.unwrap().unwrap();
    assert_eq!(first.writes_after_close(), 0);
    assert_eq!(second.writes_after_close(), 0);
}

use anyhow::Result;
use tutor_ai::llm::CompletionError;
use tutor_ai::tutor::{Speaker, TurnStatus};

use crate::ui_rendering::common::{
    answers, new_harness, press_down, press_enter, press_up, status_snapshot, submit_line,
    timeline_snapshot,
};

#[tokio::test]
async fn question_and_answer_appear_in_the_timeline() -> Result<()> {
    let mut harness = new_harness(
        "ui-first-question",
        100,
        24,
        answers(&["A tuple is an immutable sequence."]),
    )?;

    submit_line(&mut harness, "What is a tuple?").await?;

    let timeline = timeline_snapshot(&harness)?;
    assert!(timeline.contains("you> What is a tuple?"));
    assert!(timeline.contains("TutorAI:\nA tuple is an immutable sequence."));
    assert!(status_snapshot(&harness)?.ends_with("| Idle"));

    let turns = harness.session().transcript().turns();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].speaker(), Speaker::Student);
    assert_eq!(turns[1].speaker(), Speaker::Tutor);

    let prompts = harness.state().client().prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("* **Student's Previous Interactions (History):**\nNone"));
    assert!(prompts[0].contains("* **Student's Current Query:** What is a tuple?"));

    Ok(())
}

#[tokio::test]
async fn follow_up_prompt_carries_the_previous_exchange() -> Result<()> {
    let mut harness = new_harness(
        "ui-follow-up",
        100,
        24,
        answers(&["Lists are mutable.", "Use a tuple when the data is fixed."]),
    )?;

    submit_line(&mut harness, "What is a list?").await?;
    submit_line(&mut harness, "And when should I use a tuple?").await?;

    let prompts = harness.state().client().prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].contains("Student: What is a list?\nTutor: Lists are mutable."));
    assert!(!prompts[1].contains("Student: And when should I use a tuple?"));

    Ok(())
}

#[tokio::test]
async fn failed_answer_is_shown_and_the_next_question_still_works() -> Result<()> {
    let mut harness = new_harness(
        "ui-recovery",
        100,
        24,
        vec![
            Err(CompletionError::Service("API key not valid".to_string())),
            Ok("Recovered answer".to_string()),
        ],
    )?;

    submit_line(&mut harness, "first question").await?;
    submit_line(&mut harness, "second question").await?;

    let timeline = timeline_snapshot(&harness)?;
    assert!(timeline.contains(
        "An AI API error occurred: API key not valid. Check your API key's validity."
    ));
    assert!(timeline.contains("Recovered answer"));

    let turns = harness.session().transcript().turns();
    assert_eq!(turns.len(), 4);
    assert_eq!(turns[1].status(), TurnStatus::Failed);
    assert_eq!(turns[3].status(), TurnStatus::Answer);

    Ok(())
}

#[tokio::test]
async fn blank_submission_warns_without_asking_the_tutor() -> Result<()> {
    let mut harness = new_harness("ui-blank", 100, 24, Vec::new())?;

    press_enter(&mut harness).await?;

    let timeline = timeline_snapshot(&harness)?;
    assert!(timeline.contains("Please type your question above to start tutoring!"));
    assert!(harness.session().transcript().is_empty());
    assert!(harness.state().client().prompts().is_empty());

    Ok(())
}

#[tokio::test]
async fn slash_commands_show_notices_and_skip_the_tutor() -> Result<()> {
    let mut harness = new_harness("ui-commands", 100, 30, answers(&["Loops repeat code."]))?;

    submit_line(&mut harness, "/help").await?;
    let timeline = timeline_snapshot(&harness)?;
    assert!(timeline.contains("Available commands:"));
    assert!(timeline.contains("/history [n]"));

    submit_line(&mut harness, "What is a for loop?").await?;
    submit_line(&mut harness, "/history 1").await?;
    let timeline = timeline_snapshot(&harness)?;
    assert!(timeline.contains("Previous interactions (last 1):"));
    assert!(timeline.contains("1. Student: What is a for loop?"));

    submit_line(&mut harness, "/bogus").await?;
    assert!(timeline_snapshot(&harness)?.contains("unknown command '/bogus'. Try /help"));

    submit_line(&mut harness, "/trace").await?;
    assert!(timeline_snapshot(&harness)?.contains("Trace file: "));

    assert_eq!(harness.state().client().prompts().len(), 1);
    assert_eq!(harness.session().transcript().len(), 2);

    Ok(())
}

#[tokio::test]
async fn exit_word_ends_the_session() -> Result<()> {
    let mut harness = new_harness("ui-exit", 100, 24, Vec::new())?;

    submit_line(&mut harness, "quit").await?;

    assert!(harness.state().should_quit());
    assert!(harness.session().transcript().is_empty());

    Ok(())
}

#[tokio::test]
async fn up_down_history_navigation_recalls_questions_and_commands() -> Result<()> {
    let mut harness = new_harness("ui-history-nav", 100, 24, answers(&["one"]))?;

    submit_line(&mut harness, "what is a?").await?;
    submit_line(&mut harness, "/help").await?;

    press_up(&mut harness).await?;
    assert_eq!(harness.ui_state_view().input, "/help");
    press_up(&mut harness).await?;
    assert_eq!(harness.ui_state_view().input, "what is a?");
    press_down(&mut harness).await?;
    assert_eq!(harness.ui_state_view().input, "/help");
    press_down(&mut harness).await?;
    assert_eq!(harness.ui_state_view().input, "");

    Ok(())
}

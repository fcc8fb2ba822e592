use anyhow::Result;

use crate::ui_rendering::common::{
    answers, input_snapshot, new_harness, press_ctrl_j, press_page_down, press_page_up,
    status_snapshot, submit_line, timeline_snapshot, type_text,
};

#[tokio::test]
async fn initial_render_shows_welcome_and_status_with_session() -> Result<()> {
    let mut harness = new_harness("ui-welcome", 100, 24, Vec::new())?;
    harness.render()?;

    let timeline = timeline_snapshot(&harness)?;
    assert!(timeline.starts_with(
        "Hello! I'm TutorAI, an expert, adaptive tutor. Ask me anything about Python!"
    ));

    assert_eq!(
        status_snapshot(&harness)?,
        "TutorAI | Session: ui-welcome | Idle"
    );

    Ok(())
}

#[tokio::test]
async fn narrow_timeline_wraps_words() -> Result<()> {
    let mut harness = new_harness(
        "ui-narrow",
        40,
        12,
        answers(&["An immutable sequence."]),
    )?;

    submit_line(&mut harness, "What is a tuple?").await?;

    let timeline = timeline_snapshot(&harness)?;
    assert_eq!(
        timeline.trim_end(),
        "Hello! I'm TutorAI, an expert, adaptive\n\
         tutor. Ask me anything about Python!\n\
         \n\
         you> What is a tuple?\n\
         TutorAI:\n\
         An immutable sequence."
    );

    Ok(())
}

#[tokio::test]
async fn prompt_changes_for_question_and_command_input() -> Result<()> {
    let mut harness = new_harness("ui-prompt", 100, 24, Vec::new())?;

    assert_eq!(harness.ui_state_view().prompt, "you> ");
    assert!(input_snapshot(&harness)?.contains("you> "));

    type_text(&mut harness, "/trace").await?;
    assert_eq!(harness.ui_state_view().prompt, "cmd> ");
    assert!(input_snapshot(&harness)?.contains("cmd> /trace"));

    Ok(())
}

#[tokio::test]
async fn multiline_input_scroll_keeps_latest_lines_visible() -> Result<()> {
    let mut harness = new_harness("ui-multiline", 100, 24, Vec::new())?;

    for line_no in 1..=8 {
        type_text(&mut harness, &format!("line-{line_no}")).await?;
        if line_no < 8 {
            press_ctrl_j(&mut harness).await?;
        }
    }

    harness.render()?;

    let view = harness.ui_state_view();
    assert!(view.input.contains("line-1\nline-2\nline-3"));
    assert!(view.input.ends_with("line-8"));

    let input = input_snapshot(&harness)?;
    assert!(!input.contains("line-1"));
    assert!(input.contains("line-8"));

    let regions = harness.regions()?;
    let last_content_row = regions.input.y + regions.input.height.saturating_sub(2);
    let last_row = harness.line(last_content_row).unwrap_or_default();
    assert!(last_row.contains("line-8"));

    Ok(())
}

#[tokio::test]
async fn page_keys_scroll_long_answers() -> Result<()> {
    let long_answer = (1..=30)
        .map(|n| format!("line {n}"))
        .collect::<Vec<_>>()
        .join("\n");
    let mut harness = new_harness("ui-scroll", 80, 16, answers(&[long_answer.as_str()]))?;

    submit_line(&mut harness, "Show me thirty lines").await?;
    let bottom = timeline_snapshot(&harness)?;
    assert!(bottom.contains("line 30"));
    assert!(!bottom.contains("Hello! I'm TutorAI"));

    press_page_up(&mut harness).await?;
    let scrolled = timeline_snapshot(&harness)?;
    assert!(scrolled.contains("line 10"));
    assert!(!scrolled.contains("line 30"));

    for _ in 0..5 {
        press_page_up(&mut harness).await?;
    }
    assert!(timeline_snapshot(&harness)?.contains("Hello! I'm TutorAI"));

    for _ in 0..6 {
        press_page_down(&mut harness).await?;
    }
    assert!(timeline_snapshot(&harness)?.contains("line 30"));

    Ok(())
}

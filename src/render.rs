use crate::engine::{DemoEvent, RunState, StepOutcome};
use crate::theme::Theme;
use std::io::{self, Write};
use tokio::sync::mpsc::UnboundedReceiver;

/// 실행 이벤트를 터미널 텍스트로 표시한다.
pub struct Renderer<W: Write> {
    theme: Theme,
    hide_descriptions: bool,
    out: W,
}

impl<W: Write> Renderer<W> {
    pub fn new(theme: Theme, hide_descriptions: bool, out: W) -> Self {
        Self {
            theme,
            hide_descriptions,
            out,
        }
    }

    /// 이벤트 하나를 출력한다.
    pub fn render(&mut self, event: &DemoEvent) -> io::Result<()> {
        let theme = &self.theme;
        match event {
            DemoEvent::RunStarted { title, description } => {
                writeln!(self.out)?;
                writeln!(self.out, "{}", theme.heading(title))?;
                if !self.hide_descriptions {
                    for line in description {
                        writeln!(self.out, "{line}")?;
                    }
                }
            }
            DemoEvent::SetupStarted => {
                writeln!(self.out, "{}", theme.paint("setup 실행 중...", theme.muted))?;
            }
            DemoEvent::SetupFinished { error: None } => {}
            DemoEvent::SetupFinished { error: Some(message) } => {
                let text = format!("✗ setup 실패: {message}");
                writeln!(self.out, "{}", theme.paint(&text, theme.failure))?;
            }
            DemoEvent::AwaitingAdvance => {
                let text = "(Enter를 누르면 다음 Step으로 진행합니다)";
                writeln!(self.out, "{}", theme.paint(text, theme.muted))?;
            }
            DemoEvent::StepStarted {
                index,
                total,
                caption,
            } => {
                writeln!(self.out)?;
                let prefix = format!("[{index}/{total}]");
                for (n, line) in caption.iter().enumerate() {
                    if n == 0 {
                        writeln!(
                            self.out,
                            "{} {}",
                            theme.paint(&prefix, theme.muted),
                            theme.heading(line)
                        )?;
                    } else {
                        writeln!(self.out, "{:width$} {line}", "", width = prefix.len())?;
                    }
                }
            }
            DemoEvent::CommandStarted { command, .. } => {
                let text = format!("$ {command}");
                writeln!(self.out, "{}", theme.paint(&text, theme.command))?;
            }
            DemoEvent::StepOutput { line, .. } => {
                writeln!(self.out, "{line}")?;
            }
            DemoEvent::StepFinished { index, outcome } => {
                let color = theme.outcome_color(outcome);
                let text = match outcome {
                    StepOutcome::Narrated => None,
                    StepOutcome::Succeeded => Some("✓ 성공".to_string()),
                    StepOutcome::Tolerated(message) => {
                        Some(format!("⚠ 허용된 실패, 계속 진행합니다: {message}"))
                    }
                    StepOutcome::Fatal(message) => Some(format!("✗ 실패: {message}")),
                    StepOutcome::Skipped => Some(format!("[{index}] 건너뜀")),
                    StepOutcome::Aborted => Some(format!("[{index}] 실행하지 않음 (이전 실패)")),
                };
                if let Some(text) = text {
                    writeln!(self.out, "{}", theme.paint(&text, color))?;
                }
            }
            DemoEvent::CleanupStarted => {
                writeln!(self.out, "{}", theme.paint("cleanup 실행 중...", theme.muted))?;
            }
            DemoEvent::CleanupFinished { error: None } => {
                writeln!(self.out, "{}", theme.paint("cleanup 완료", theme.muted))?;
            }
            DemoEvent::CleanupFinished { error: Some(message) } => {
                let text = format!("⚠ cleanup 실패 (결과에는 영향 없음): {message}");
                writeln!(self.out, "{}", theme.paint(&text, theme.tolerated))?;
            }
            DemoEvent::RunFinished {
                title,
                state,
                failure,
            } => {
                let (text, color) = match (state, failure) {
                    (RunState::Completed, _) => (format!("■ {title}: 완료"), theme.success),
                    (_, Some(reason)) => (format!("■ {title}: 실패 ({reason})"), theme.failure),
                    (_, None) => (format!("■ {title}: 실패"), theme.failure),
                };
                writeln!(self.out, "{}", theme.paint(&text, color))?;
            }
            DemoEvent::BatchFinished {
                completed,
                failed,
                not_started,
            } => {
                writeln!(self.out)?;
                let mut text = format!("데모 {completed}개 완료, {failed}개 실패");
                if *not_started > 0 {
                    text.push_str(&format!(", {not_started}개 중단으로 실행 안 함"));
                }
                let color = if *failed == 0 && *not_started == 0 {
                    theme.success
                } else {
                    theme.failure
                };
                writeln!(self.out, "{}", theme.paint(&text, color))?;
            }
        }
        self.out.flush()
    }
}

/// 채널이 닫힐 때까지 이벤트를 모두 소비하여 출력한다.
pub async fn drain_events<W: Write>(
    mut rx: UnboundedReceiver<DemoEvent>,
    mut renderer: Renderer<W>,
) -> io::Result<()> {
    while let Some(event) = rx.recv().await {
        renderer.render(&event)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RunFailure;

    fn render_all(events: &[DemoEvent], hide_descriptions: bool) -> String {
        crate::theme::set_color_enabled(false);
        let mut buf = Vec::new();
        {
            let mut renderer = Renderer::new(Theme::default(), hide_descriptions, &mut buf);
            for event in events {
                renderer.render(event).expect("출력");
            }
        }
        String::from_utf8(buf).expect("UTF-8")
    }

    #[test]
    fn outcomes_are_visibly_distinct() {
        let text = render_all(
            &[
                DemoEvent::StepFinished {
                    index: 1,
                    outcome: StepOutcome::Succeeded,
                },
                DemoEvent::StepFinished {
                    index: 2,
                    outcome: StepOutcome::Tolerated("exit 1".into()),
                },
                DemoEvent::StepFinished {
                    index: 3,
                    outcome: StepOutcome::Fatal("exit 2".into()),
                },
                DemoEvent::StepFinished {
                    index: 4,
                    outcome: StepOutcome::Aborted,
                },
                DemoEvent::CleanupStarted,
                DemoEvent::CleanupFinished { error: None },
                DemoEvent::RunFinished {
                    title: "demo".into(),
                    state: RunState::Failed,
                    failure: Some(RunFailure::Step {
                        index: 3,
                        message: "exit 2".into(),
                    }),
                },
            ],
            false,
        );
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "✓ 성공");
        assert!(lines[1].starts_with("⚠ 허용된 실패"));
        assert!(lines[2].starts_with("✗ 실패"));
        assert_eq!(lines[3], "[4] 실행하지 않음 (이전 실패)");
        assert_eq!(lines[5], "cleanup 완료");
        assert!(lines[6].contains("실패 (3번 Step 실패: exit 2)"));
    }

    #[test]
    fn caption_comes_before_command_and_output() {
        let text = render_all(
            &[
                DemoEvent::RunStarted {
                    title: "Running policies".into(),
                    description: vec!["In this demo".into()],
                },
                DemoEvent::StepStarted {
                    index: 1,
                    total: 2,
                    caption: vec!["List policies".into(), "second line".into()],
                },
                DemoEvent::CommandStarted {
                    index: 1,
                    command: "kwctl policies".into(),
                },
                DemoEvent::StepOutput {
                    index: 1,
                    stream: crate::engine::OutputStream::Stdout,
                    line: "  policy  ".into(),
                },
            ],
            true,
        );
        assert!(!text.contains("In this demo"));
        let caption = text.find("[1/2] List policies").expect("캡션");
        let continuation = text.find("      second line").expect("두 번째 캡션 줄");
        let command = text.find("$ kwctl policies").expect("명령");
        let output = text.find("\n  policy  \n").expect("출력은 그대로 표시");
        assert!(caption < continuation && continuation < command && command < output);
    }
}

use super::action::SharedAction;
use super::error::RunError;
use super::events::DemoEvent;
use super::pacing::{Pacer, Pacing};
use super::process::run_shell_command;
use super::run::Run;
use super::state::{RunFailure, RunReport, RunState, StepOutcome, StepReport};
use super::step::Step;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Run 실행 옵션이다.
#[derive(Debug, Clone, Copy)]
pub struct ExecuteOptions {
    /// 각 Run 앞에서 건너뛸 Step 수.
    pub skip_steps: usize,
    /// Step 사이 진행 방식.
    pub pacing: Pacing,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            skip_steps: 0,
            pacing: Pacing::Immediate,
        }
    }
}

/// Run 하나의 setup, Step, cleanup 생애주기를 실행한다.
///
/// 모든 작업은 순차적으로 대기하며, cleanup은 setup 실패나 치명적 Step 실패,
/// 외부 중단 이후에도 항상 시도한다.
pub struct RunExecutor {
    sender: UnboundedSender<DemoEvent>,
    cancel: CancellationToken,
    pacer: Pacer,
    skip_steps: usize,
}

impl RunExecutor {
    pub fn new(
        options: ExecuteOptions,
        sender: UnboundedSender<DemoEvent>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            sender,
            cancel,
            pacer: Pacer::new(options.pacing),
            skip_steps: options.skip_steps,
        }
    }

    /// 외부 중단이 요청되었는지 여부.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub(crate) fn emit(&self, event: DemoEvent) {
        let _ = self.sender.send(event);
    }

    /// Run 전체를 실행하고 결과를 반환한다.
    ///
    /// # 반환값
    /// Run이 `Pending` 상태가 아니면 `RunError::NotPending`을 반환한다.
    /// 그 외의 실패는 모두 `RunReport`에 기록된다.
    pub async fn execute(&mut self, run: &mut Run) -> Result<RunReport, RunError> {
        if run.state() != RunState::Pending {
            return Err(RunError::NotPending {
                title: run.title().to_string(),
            });
        }
        info!(run = %run.title(), steps = run.steps().len(), "Run 시작");
        self.emit(DemoEvent::RunStarted {
            title: run.title().to_string(),
            description: run.description().to_vec(),
        });

        let mut failure: Option<RunFailure> = None;
        let setup = match run.setup() {
            Some(action) => {
                run.transition(RunState::SettingUp);
                let result = self.run_setup(&action).await;
                if let Err(message) = &result {
                    failure = Some(RunFailure::Setup(message.clone()));
                }
                Some(result)
            }
            None => None,
        };

        if failure.is_none() && self.cancel.is_cancelled() {
            failure = Some(RunFailure::Cancelled);
        }

        let total = run.steps().len();
        let mut steps = Vec::with_capacity(total);
        if failure.is_none() {
            run.transition(RunState::Running);
            failure = self.run_steps(run, total, &mut steps).await;
        }
        // 실행하지 못한 나머지 Step은 중단으로 기록한다.
        while let Some((index, step)) = run.next_step() {
            self.emit(DemoEvent::StepFinished {
                index,
                outcome: StepOutcome::Aborted,
            });
            steps.push(StepReport {
                index,
                command: step.command_line(),
                outcome: StepOutcome::Aborted,
                output: Vec::new(),
            });
        }

        let cleanup = match run.cleanup() {
            Some(action) => {
                run.transition(RunState::CleaningUp);
                Some(self.run_cleanup(&action).await)
            }
            None => None,
        };

        let state = if failure.is_some() {
            RunState::Failed
        } else {
            RunState::Completed
        };
        debug_assert!(state.is_terminal());
        run.transition(state);
        match &failure {
            Some(reason) => warn!(run = %run.title(), "Run 실패: {reason}"),
            None => info!(run = %run.title(), "Run 완료"),
        }
        self.emit(DemoEvent::RunFinished {
            title: run.title().to_string(),
            state,
            failure: failure.clone(),
        });
        Ok(RunReport {
            title: run.title().to_string(),
            state,
            failure,
            setup,
            steps,
            cleanup,
        })
    }

    async fn run_setup(&self, action: &SharedAction) -> Result<(), String> {
        self.emit(DemoEvent::SetupStarted);
        debug!("setup 실행: {}", action.describe());
        let result = action.run().await.map_err(|err| format!("{err:#}"));
        self.emit(DemoEvent::SetupFinished {
            error: result.as_ref().err().cloned(),
        });
        result
    }

    /// cleanup은 중단 토큰과 무관하게 끝까지 실행하며, 실패해도 Run 결과를 바꾸지 않는다.
    async fn run_cleanup(&self, action: &SharedAction) -> Result<(), String> {
        self.emit(DemoEvent::CleanupStarted);
        debug!("cleanup 실행: {}", action.describe());
        let result = action.run().await.map_err(|err| format!("{err:#}"));
        if let Err(message) = &result {
            warn!("cleanup 실패: {message}");
        }
        self.emit(DemoEvent::CleanupFinished {
            error: result.as_ref().err().cloned(),
        });
        result
    }

    /// Step을 순서대로 실행하고, Run을 중단시킨 원인이 있으면 반환한다.
    async fn run_steps(
        &mut self,
        run: &mut Run,
        total: usize,
        reports: &mut Vec<StepReport>,
    ) -> Option<RunFailure> {
        let mut displayed = 0usize;
        while let Some((index, step)) = run.next_step() {
            if index <= self.skip_steps {
                self.emit(DemoEvent::StepFinished {
                    index,
                    outcome: StepOutcome::Skipped,
                });
                reports.push(StepReport {
                    index,
                    command: step.command_line(),
                    outcome: StepOutcome::Skipped,
                    output: Vec::new(),
                });
                continue;
            }
            if displayed > 0 || self.pacer.is_interactive() {
                if self.pacer.is_interactive() {
                    self.emit(DemoEvent::AwaitingAdvance);
                }
                if !self.pacer.wait(&self.cancel).await {
                    return Some(self.abort_at(index, &step, reports));
                }
            }
            if self.cancel.is_cancelled() {
                return Some(self.abort_at(index, &step, reports));
            }
            displayed += 1;
            let report = self.run_step(index, total, &step).await;
            let failure = match &report.outcome {
                _ if self.cancel.is_cancelled() => Some(RunFailure::Cancelled),
                StepOutcome::Fatal(message) => Some(RunFailure::Step {
                    index,
                    message: message.clone(),
                }),
                _ => None,
            };
            reports.push(report);
            if failure.is_some() {
                return failure;
            }
        }
        None
    }

    /// 중단 시점의 Step을 Aborted로 기록하고 취소 원인을 반환한다.
    fn abort_at(&self, index: usize, step: &Step, reports: &mut Vec<StepReport>) -> RunFailure {
        self.emit(DemoEvent::StepFinished {
            index,
            outcome: StepOutcome::Aborted,
        });
        reports.push(StepReport {
            index,
            command: step.command_line(),
            outcome: StepOutcome::Aborted,
            output: Vec::new(),
        });
        RunFailure::Cancelled
    }

    /// 단일 Step을 실행한다. 캡션을 먼저 표시하고, 명령이 있으면 실행해 결과를 분류한다.
    async fn run_step(&self, index: usize, total: usize, step: &Step) -> StepReport {
        self.emit(DemoEvent::StepStarted {
            index,
            total,
            caption: step.caption().to_vec(),
        });
        let Some(command) = step.command_line() else {
            self.emit(DemoEvent::StepFinished {
                index,
                outcome: StepOutcome::Narrated,
            });
            return StepReport {
                index,
                command: None,
                outcome: StepOutcome::Narrated,
                output: Vec::new(),
            };
        };

        self.emit(DemoEvent::CommandStarted {
            index,
            command: command.clone(),
        });
        let run = run_shell_command(&command, index, step.timeout(), &self.sender, &self.cancel)
            .await;
        let outcome = match run.result {
            Ok(()) => StepOutcome::Succeeded,
            // 중단은 실패 허용 여부와 무관하게 Run을 멈춘다.
            Err(err) if err.is_cancelled() => StepOutcome::Fatal(err.to_string()),
            Err(err) if step.is_fault_tolerant() => {
                debug!(step = index, "허용된 실패: {err}");
                StepOutcome::Tolerated(err.to_string())
            }
            Err(err) => StepOutcome::Fatal(err.to_string()),
        };
        self.emit(DemoEvent::StepFinished {
            index,
            outcome: outcome.clone(),
        });
        StepReport {
            index,
            command: Some(command),
            outcome,
            output: run.output,
        }
    }
}

/// Run 생애주기 상태를 표현한다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// 아직 실행 전.
    Pending,
    /// setup 동작 실행 중.
    SettingUp,
    /// Step 실행 중.
    Running,
    /// cleanup 동작 실행 중.
    CleaningUp,
    /// 치명적 실패 없이 종료.
    Completed,
    /// setup 또는 Step의 치명적 실패로 종료.
    Failed,
}

impl RunState {
    /// 종료 상태인지 여부를 반환한다.
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Completed | RunState::Failed)
    }
}

/// Step 하나의 실행 결과이다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// 명령 없이 캡션만 표시했다.
    Narrated,
    /// 명령이 0으로 종료했다.
    Succeeded,
    /// 명령이 실패했지만 실패 허용 Step이라 계속 진행했다.
    Tolerated(String),
    /// 명령이 실패해 Run을 중단시켰다.
    Fatal(String),
    /// 실행 옵션에 따라 건너뛰었다.
    Skipped,
    /// 앞선 치명적 실패나 중단 때문에 실행하지 않았다.
    Aborted,
}

impl StepOutcome {
    /// 명령이 실제로 실행되었는지 여부를 반환한다.
    pub fn executed(&self) -> bool {
        matches!(
            self,
            StepOutcome::Succeeded | StepOutcome::Tolerated(_) | StepOutcome::Fatal(_)
        )
    }
}

/// Step 실행 기록이다.
#[derive(Debug, Clone)]
pub struct StepReport {
    /// 1부터 시작하는 Step 번호.
    pub index: usize,
    /// 실행한 명령 문자열.
    pub command: Option<String>,
    /// 결과.
    pub outcome: StepOutcome,
    /// stdout/stderr를 도착 순서대로 합친 출력.
    pub output: Vec<String>,
}

/// Run을 Failed로 만든 원인이다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunFailure {
    /// setup 동작이 실패했다.
    Setup(String),
    /// 실패 허용이 아닌 Step이 실패했다.
    Step { index: usize, message: String },
    /// 외부 중단 요청을 받았다.
    Cancelled,
}

impl std::fmt::Display for RunFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunFailure::Setup(message) => write!(f, "setup 실패: {message}"),
            RunFailure::Step { index, message } => write!(f, "{index}번 Step 실패: {message}"),
            RunFailure::Cancelled => write!(f, "사용자에 의해 중단됨"),
        }
    }
}

/// Run 하나의 최종 결과이다.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Run 제목.
    pub title: String,
    /// 종료 상태. 항상 `Completed` 또는 `Failed`이다.
    pub state: RunState,
    /// 실패 원인.
    pub failure: Option<RunFailure>,
    /// setup 결과. setup이 없으면 `None`.
    pub setup: Option<Result<(), String>>,
    /// Step별 기록.
    pub steps: Vec<StepReport>,
    /// cleanup 결과. cleanup이 없으면 `None`.
    pub cleanup: Option<Result<(), String>>,
}

impl RunReport {
    pub fn is_completed(&self) -> bool {
        self.state == RunState::Completed
    }

    /// 명령이 실제로 실행된 Step 수를 반환한다.
    pub fn executed_steps(&self) -> usize {
        self.steps.iter().filter(|s| s.outcome.executed()).count()
    }
}

/// Registry 일괄 실행 결과이다.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// 실행된 Run 결과 목록 (실행 순서).
    pub runs: Vec<RunReport>,
    /// 중단으로 시작하지 못한 Run 제목.
    pub not_started: Vec<String>,
    /// 외부 중단 요청으로 일괄 실행이 멈췄는지 여부.
    pub cancelled: bool,
}

impl BatchReport {
    pub fn completed(&self) -> usize {
        self.runs.iter().filter(|r| r.is_completed()).count()
    }

    pub fn failed(&self) -> usize {
        self.runs.len() - self.completed()
    }

    /// 모든 Run이 완료되었고 중단도 없었는지 여부.
    pub fn is_success(&self) -> bool {
        !self.cancelled && self.failed() == 0
    }
}

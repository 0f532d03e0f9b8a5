use super::state::{RunFailure, RunState, StepOutcome};

/// 출력 라인이 나온 스트림이다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// 실행기에서 표시 계층으로 전달되는 이벤트 모델이다.
///
/// 하나의 Step에 대해 캡션, 명령, 출력, 결과 순서로 전달된다.
#[derive(Debug, Clone)]
pub enum DemoEvent {
    /// Run 시작 알림과 제목/설명.
    RunStarted {
        title: String,
        description: Vec<String>,
    },
    /// setup 시작.
    SetupStarted,
    /// setup 종료. 실패 시 오류 메시지를 포함한다.
    SetupFinished { error: Option<String> },
    /// 다음 Step 진행 전 입력 대기.
    AwaitingAdvance,
    /// Step 시작과 캡션.
    StepStarted {
        index: usize,
        total: usize,
        caption: Vec<String>,
    },
    /// 실행할 명령 문자열.
    CommandStarted { index: usize, command: String },
    /// 명령 출력 한 줄.
    StepOutput {
        index: usize,
        stream: OutputStream,
        line: String,
    },
    /// Step 종료와 결과.
    StepFinished { index: usize, outcome: StepOutcome },
    /// cleanup 시작.
    CleanupStarted,
    /// cleanup 종료. 실패 시 오류 메시지를 포함한다.
    CleanupFinished { error: Option<String> },
    /// Run 종료.
    RunFinished {
        title: String,
        state: RunState,
        failure: Option<RunFailure>,
    },
    /// 일괄 실행 종료.
    BatchFinished {
        completed: usize,
        failed: usize,
        not_started: usize,
    },
}

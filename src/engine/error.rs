use std::time::Duration;

/// Step 명령 실행 중 발생 가능한 오류를 표현한다.
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    /// 셸 프로세스를 시작하지 못한 경우이다.
    #[error("명령을 시작할 수 없습니다: {command} ({source})")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },
    /// 프로세스 대기 중 입출력 오류가 발생한 경우이다.
    #[error("명령 대기 중 오류가 발생했습니다: {command} ({source})")]
    Wait {
        command: String,
        #[source]
        source: std::io::Error,
    },
    /// 0이 아닌 종료 코드로 끝난 경우이다.
    #[error("명령이 실패했습니다 (종료 코드: {}): {command}", display_code(.code))]
    ExitStatus { command: String, code: Option<i32> },
    /// 제한 시간을 넘긴 경우이다.
    #[error("명령이 {}초 제한 시간을 초과했습니다: {command}", .limit.as_secs())]
    Timeout { command: String, limit: Duration },
    /// 외부 중단 요청으로 종료된 경우이다.
    #[error("사용자 중단으로 명령이 종료되었습니다: {command}")]
    Cancelled { command: String },
}

impl StepError {
    /// 중단에 의한 오류인지 여부를 반환한다.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, StepError::Cancelled { .. })
    }
}

fn display_code(code: &Option<i32>) -> String {
    code.map(|c| c.to_string())
        .unwrap_or_else(|| "시그널".to_string())
}

/// Step 정의가 유효하지 않은 경우의 오류이다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidStep {
    /// 캡션 라인이 하나도 없는 경우이다.
    #[error("Step 캡션이 비어 있습니다.")]
    EmptyCaption,
    /// 명령이 지정되었지만 조각이 하나도 없는 경우이다.
    #[error("Step 명령이 비어 있습니다.")]
    EmptyCommand,
}

/// Run 실행 자체를 시작할 수 없는 경우의 오류이다.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// 이미 실행을 마친 Run을 reset 없이 다시 실행하려 한 경우이다.
    #[error("Run '{title}'은(는) 대기 상태가 아닙니다. reset 후 다시 실행하세요.")]
    NotPending { title: String },
}

/// Registry 선택 및 실행 오류이다.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// 선택한 라벨과 일치하는 Run이 없는 경우이다.
    #[error("등록되지 않은 데모입니다: {0}")]
    UnknownRun(String),
    /// 개별 Run을 시작할 수 없는 경우이다.
    #[error(transparent)]
    Run(#[from] RunError),
}

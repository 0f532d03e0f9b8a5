use crate::engine::StepOutcome;
use colored::{Color, ColoredString, Colorize};

/// 터미널 출력 전체에서 참조할 공통 테마 정보.
pub struct Theme {
    /// 제목 색상.
    pub title: Color,
    /// 실행 명령 색상.
    pub command: Color,
    /// 성공 상태 색상.
    pub success: Color,
    /// 허용된 실패 색상.
    pub tolerated: Color,
    /// 실패 상태 색상.
    pub failure: Color,
    /// 보조 정보 색상.
    pub muted: Color,
}

impl Default for Theme {
    /// 기본 테마 색상을 정의한다.
    fn default() -> Self {
        Self {
            title: Color::BrightWhite,
            command: Color::Cyan,
            success: Color::Green,
            tolerated: Color::Yellow,
            failure: Color::Red,
            muted: Color::BrightBlack,
        }
    }
}

impl Theme {
    /// Step 결과에 따른 색상을 반환한다.
    pub fn outcome_color(&self, outcome: &StepOutcome) -> Color {
        match outcome {
            StepOutcome::Narrated | StepOutcome::Skipped | StepOutcome::Aborted => self.muted,
            StepOutcome::Succeeded => self.success,
            StepOutcome::Tolerated(_) => self.tolerated,
            StepOutcome::Fatal(_) => self.failure,
        }
    }

    pub fn paint(&self, text: &str, color: Color) -> ColoredString {
        text.color(color)
    }

    pub fn heading(&self, text: &str) -> ColoredString {
        text.color(self.title).bold()
    }
}

/// 색상 출력 사용 여부를 전역으로 지정한다.
pub fn set_color_enabled(enabled: bool) {
    colored::control::set_override(enabled);
}

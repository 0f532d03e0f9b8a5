use super::error::InvalidStep;
use std::time::Duration;

/// Step은 Run 안에서 화면에 표시되는 최소 단위이다.
///
/// 캡션은 항상 한 줄 이상이며, 명령이 있으면 조각들을 공백 하나로 이어
/// 단일 프로세스로 실행한다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// 실행 전에 표시할 캡션 라인.
    caption: Vec<String>,
    /// 실행할 명령 조각 목록. 캡션 전용 Step이면 `None`이다.
    command: Option<Vec<String>>,
    /// 명령 실패가 Run을 중단시키지 않는지 여부.
    fault_tolerant: bool,
    /// 명령 최대 대기 시간.
    timeout: Option<Duration>,
}

impl Step {
    /// 캡션과 선택적 명령으로 Step을 생성한다.
    ///
    /// 캡션이 비어 있거나 명령 조각이 하나도 없으면 `InvalidStep`을 반환한다.
    pub fn new<C, S>(caption: C, command: Option<Vec<String>>) -> Result<Self, InvalidStep>
    where
        C: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let caption: Vec<String> = caption.into_iter().map(Into::into).collect();
        if caption.is_empty() {
            return Err(InvalidStep::EmptyCaption);
        }
        if command.as_ref().is_some_and(|fragments| fragments.is_empty()) {
            return Err(InvalidStep::EmptyCommand);
        }
        Ok(Self {
            caption,
            command,
            fault_tolerant: false,
            timeout: None,
        })
    }

    /// 캡션 한 줄만 가진 서술용 Step을 생성한다.
    pub fn narration(line: impl Into<String>) -> Self {
        Self {
            caption: vec![line.into()],
            command: None,
            fault_tolerant: false,
            timeout: None,
        }
    }

    /// 캡션 한 줄과 단일 명령 문자열로 Step을 생성한다.
    pub fn command(line: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            caption: vec![line.into()],
            command: Some(vec![command.into()]),
            fault_tolerant: false,
            timeout: None,
        }
    }

    /// 실패를 허용하는 Step으로 표시한다.
    pub fn tolerant(mut self) -> Self {
        self.fault_tolerant = true;
        self
    }

    /// 실패 허용 여부를 지정한다.
    pub fn with_fault_tolerance(mut self, fault_tolerant: bool) -> Self {
        self.fault_tolerant = fault_tolerant;
        self
    }

    /// 명령 제한 시간을 지정한다.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn caption(&self) -> &[String] {
        &self.caption
    }

    /// 명령 조각 목록. 캡션 전용 Step이면 `None`이다.
    pub fn fragments(&self) -> Option<&[String]> {
        self.command.as_deref()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// 명령 조각을 공백 하나로 이어 붙인 실행 문자열을 반환한다.
    pub fn command_line(&self) -> Option<String> {
        self.fragments().map(|fragments| fragments.join(" "))
    }

    /// 실제로 적용되는 실패 허용 여부이다. 명령이 없으면 실패할 수 없으므로 항상 참이다.
    pub fn is_fault_tolerant(&self) -> bool {
        self.fault_tolerant || self.command.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragments_are_joined_with_single_spaces() {
        let step = Step::new(
            ["Evaluate request"],
            Some(vec![
                "kwctl run".to_string(),
                "--request-path test_data/production-ingress.json".to_string(),
                "policy.wasm | jq".to_string(),
            ]),
        )
        .expect("유효한 Step");
        assert_eq!(step.fragments().map(<[String]>::len), Some(3));
        assert_eq!(
            step.command_line().as_deref(),
            Some("kwctl run --request-path test_data/production-ingress.json policy.wasm | jq")
        );
    }

    #[test]
    fn caption_only_step_is_always_fault_tolerant() {
        let step = Step::narration("Search for a policy");
        assert!(step.command_line().is_none());
        assert!(step.is_fault_tolerant());
        assert!(!Step::command("List", "kwctl policies").is_fault_tolerant());
        assert!(Step::command("List", "kwctl policies").tolerant().is_fault_tolerant());
    }

    #[test]
    fn empty_caption_or_command_is_rejected() {
        assert_eq!(
            Step::new(Vec::<String>::new(), None),
            Err(InvalidStep::EmptyCaption)
        );
        assert_eq!(
            Step::new(["caption"], Some(Vec::new())),
            Err(InvalidStep::EmptyCommand)
        );
        // 캡션이 비어 있으면 명령보다 먼저 보고한다.
        assert_eq!(
            Step::new(Vec::<String>::new(), Some(Vec::new())),
            Err(InvalidStep::EmptyCaption)
        );
    }
}

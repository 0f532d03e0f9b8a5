use super::action::SharedAction;
use super::state::RunState;
use super::step::Step;

/// Run은 setup/cleanup과 순서 있는 Step으로 구성된 하나의 데모이다.
#[derive(Clone)]
pub struct Run {
    /// 표시 제목.
    title: String,
    /// 첫 Step 전에 보여 줄 설명 라인.
    description: Vec<String>,
    /// 첫 Step 전에 한 번 실행할 동작.
    setup: Option<SharedAction>,
    /// 마지막 Step 후 (실패 시에도) 한 번 실행할 동작.
    cleanup: Option<SharedAction>,
    /// 실행 순서대로의 Step 목록.
    steps: Vec<Step>,
    /// 다음에 실행할 Step 위치.
    cursor: usize,
    /// 생애주기 상태.
    state: RunState,
}

impl Run {
    /// 제목과 설명으로 빈 Run을 생성한다.
    pub fn new<D, S>(title: impl Into<String>, description: D) -> Self
    where
        D: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            title: title.into(),
            description: description.into_iter().map(Into::into).collect(),
            setup: None,
            cleanup: None,
            steps: Vec::new(),
            cursor: 0,
            state: RunState::Pending,
        }
    }

    pub fn set_setup(&mut self, action: SharedAction) -> &mut Self {
        self.setup = Some(action);
        self
    }

    pub fn set_cleanup(&mut self, action: SharedAction) -> &mut Self {
        self.cleanup = Some(action);
        self
    }

    /// Step을 맨 뒤에 추가한다.
    pub fn push_step(&mut self, step: Step) -> &mut Self {
        self.steps.push(step);
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &[String] {
        &self.description
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// 실행 상태와 커서를 초기화해 다시 실행할 수 있게 한다.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.state = RunState::Pending;
    }

    pub(crate) fn setup(&self) -> Option<SharedAction> {
        self.setup.clone()
    }

    pub(crate) fn cleanup(&self) -> Option<SharedAction> {
        self.cleanup.clone()
    }

    pub(crate) fn transition(&mut self, state: RunState) {
        tracing::debug!(run = %self.title, from = ?self.state, to = ?state, "상태 전이");
        self.state = state;
    }

    /// 다음 Step과 1부터 시작하는 번호를 반환하고 커서를 전진시킨다.
    pub(crate) fn next_step(&mut self) -> Option<(usize, Step)> {
        let step = self.steps.get(self.cursor)?.clone();
        self.cursor += 1;
        Some((self.cursor, step))
    }
}

impl std::fmt::Debug for Run {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Run")
            .field("title", &self.title)
            .field("steps", &self.steps.len())
            .field("setup", &self.setup.as_ref().map(|a| a.describe()))
            .field("cleanup", &self.cleanup.as_ref().map(|a| a.describe()))
            .field("cursor", &self.cursor)
            .field("state", &self.state)
            .finish()
    }
}

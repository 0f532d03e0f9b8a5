use crate::engine::{
    ActionSequence, DemoVars, InvalidStep, RemovePaths, Run, SharedAction, ShellAction, Step,
    UnknownVariable,
};
use crate::registry::Registry;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// 데모 파일을 읽거나 Run으로 변환할 때 발생 가능한 오류이다.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 파일을 읽을 수 없는 경우이다.
    #[error("데모 파일을 읽을 수 없습니다: {0}")]
    Io(#[from] std::io::Error),
    /// YAML 형식이 잘못된 경우이다.
    #[error("데모 파일 형식 오류: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// Step 정의가 유효하지 않은 경우이다.
    #[error("'{run}' 데모의 {step}번 Step: {source}")]
    InvalidStep {
        run: String,
        step: usize,
        #[source]
        source: InvalidStep,
    },
    /// 등록된 데모가 하나도 없는 경우이다.
    #[error("데모 파일에 Run이 정의되어 있지 않습니다.")]
    NoRuns,
    /// 정의되지 않은 변수를 참조한 경우이다.
    #[error("'{run}' 데모: {source}")]
    UnknownVariable {
        run: String,
        #[source]
        source: UnknownVariable,
    },
}

/// 문자열 하나 또는 문자열 목록을 모두 받아들이는 필드이다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lines(pub Vec<String>);

impl<'de> Deserialize<'de> for Lines {
    /// 단일 문자열 또는 목록 형태를 모두 지원하도록 역직렬화한다.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Helper {
            Single(String),
            Many(Vec<String>),
        }

        Ok(match Helper::deserialize(deserializer)? {
            Helper::Single(line) => Lines(vec![line]),
            Helper::Many(lines) => Lines(lines),
        })
    }
}

/// setup/cleanup 동작 정의이다.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ActionConfig {
    /// 경로 또는 glob 패턴을 삭제한다.
    Remove {
        /// 삭제할 경로 목록.
        remove: Lines,
    },
    /// 셸 명령을 실행한다.
    Command {
        /// 실행할 명령 문자열.
        command: String,
        /// 실패를 무시할지 여부.
        #[serde(default)]
        ignore_failure: bool,
    },
}

/// Step 정의이다.
#[derive(Debug, Clone, Deserialize)]
pub struct StepConfig {
    /// 표시할 캡션.
    pub caption: Lines,
    /// 실행할 명령 조각.
    #[serde(default)]
    pub command: Option<Lines>,
    /// 실패 허용 여부.
    #[serde(default)]
    pub can_fail: bool,
    /// 실행 제한 시간(초 단위).
    #[serde(default)]
    pub timeout_sec: Option<u64>,
}

/// Run 정의이다.
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    /// 선택에 사용하는 짧은 라벨.
    pub label: String,
    /// 목록에 표시할 한 줄 설명.
    #[serde(default)]
    pub summary: String,
    /// 데모 제목.
    pub title: String,
    /// 첫 Step 전에 표시할 설명.
    #[serde(default)]
    pub description: Lines,
    /// setup 동작 목록.
    #[serde(default)]
    pub setup: Vec<ActionConfig>,
    /// cleanup 동작 목록.
    #[serde(default)]
    pub cleanup: Vec<ActionConfig>,
    /// Step 목록.
    #[serde(default)]
    pub steps: Vec<StepConfig>,
}

/// 데모 파일 전체 정의이다.
#[derive(Debug, Clone, Deserialize)]
pub struct DemoFile {
    /// 동작 치환에 사용할 변수.
    #[serde(default)]
    pub vars: BTreeMap<String, String>,
    /// 등록 순서대로의 Run 목록.
    pub runs: Vec<RunConfig>,
}

impl DemoFile {
    /// 파일 변수 위에 호출자 변수를 덮어쓴 최종 변수 집합을 만든다.
    fn resolve_vars(&self, overrides: &DemoVars) -> DemoVars {
        let mut vars = DemoVars::new();
        for (key, value) in &self.vars {
            vars.set_var(key, value);
        }
        vars.merge(overrides);
        vars
    }

    /// 정의된 Run을 모두 Registry에 등록한다.
    ///
    /// # 매개변수
    /// - `overrides`: 시작 시점에 수집한 변수 (`HOME`, `--var` 값 등).
    pub fn into_registry(self, overrides: &DemoVars) -> Result<Registry, ConfigError> {
        if self.runs.is_empty() {
            return Err(ConfigError::NoRuns);
        }
        let vars = self.resolve_vars(overrides);
        let mut registry = Registry::new();
        for config in self.runs {
            let label = config.label.clone();
            let summary = config.summary.clone();
            registry.add(build_run(config, &vars)?, label, summary);
        }
        Ok(registry)
    }
}

/// Run 정의를 실행 가능한 Run으로 변환한다.
fn build_run(config: RunConfig, vars: &DemoVars) -> Result<Run, ConfigError> {
    let mut run = Run::new(config.title.clone(), config.description.0);
    if let Some(action) = build_actions(&config.title, &config.setup, vars, "setup")? {
        run.set_setup(action);
    }
    if let Some(action) = build_actions(&config.title, &config.cleanup, vars, "cleanup")? {
        run.set_cleanup(action);
    }
    for (position, step_config) in config.steps.into_iter().enumerate() {
        let number = position + 1;
        let command = step_config.command.map(|lines| lines.0);
        let step = Step::new(step_config.caption.0, command)
            .map_err(|source| ConfigError::InvalidStep {
                run: config.title.clone(),
                step: number,
                source,
            })?
            .with_fault_tolerance(step_config.can_fail)
            .with_timeout(step_config.timeout_sec.map(Duration::from_secs));
        run.push_step(step);
    }
    Ok(run)
}

/// 동작 정의 목록을 변수 치환된 단일 동작으로 만든다. 비어 있으면 `None`이다.
fn build_actions(
    run: &str,
    configs: &[ActionConfig],
    vars: &DemoVars,
    field: &str,
) -> Result<Option<SharedAction>, ConfigError> {
    if configs.is_empty() {
        return Ok(None);
    }
    let expand = |template: &str| {
        vars.expand(template, field)
            .map_err(|source| ConfigError::UnknownVariable {
                run: run.to_string(),
                source,
            })
    };
    let mut actions: Vec<SharedAction> = Vec::with_capacity(configs.len());
    for config in configs {
        let action: SharedAction = match config {
            ActionConfig::Remove { remove } => {
                let patterns = remove
                    .0
                    .iter()
                    .map(|pattern| expand(pattern))
                    .collect::<Result<Vec<_>, _>>()?;
                Arc::new(RemovePaths::new(patterns))
            }
            ActionConfig::Command {
                command,
                ignore_failure,
            } => Arc::new(ShellAction::new(expand(command)?, *ignore_failure)),
        };
        actions.push(action);
    }
    if actions.len() == 1 {
        return Ok(actions.pop());
    }
    Ok(Some(Arc::new(ActionSequence::new(actions))))
}

/// YAML 파일을 읽어 DemoFile로 역직렬화한다.
pub fn load_demo_from_file(path: &Path) -> Result<DemoFile, ConfigError> {
    let mut file = File::open(path)?;
    load_demo_from_reader(&mut file)
}

/// Reader에서 YAML을 읽어 DemoFile 구조체로 파싱한다.
pub fn load_demo_from_reader<R: Read>(reader: &mut R) -> Result<DemoFile, ConfigError> {
    let mut buf = String::new();
    reader.read_to_string(&mut buf)?;
    let demo: DemoFile = serde_yaml::from_str(&buf)?;
    Ok(demo)
}

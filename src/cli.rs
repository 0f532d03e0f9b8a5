use crate::engine::{DemoVars, ExecuteOptions, Pacing};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// 명령줄 도구 시연을 위한 스크립트 데모 실행기
#[derive(Debug, Parser)]
#[command(name = "demo-runner")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// 실행할 데모 라벨. 생략하면 등록된 모든 데모를 순서대로 실행한다.
    #[arg(value_name = "RUN")]
    pub runs: Vec<String>,

    /// 데모 정의 YAML 파일 경로
    #[arg(short, long, env = "DEMO_FILE", default_value = "demos/kubewarden.yaml")]
    pub file: PathBuf,

    /// 등록된 데모 목록을 출력하고 종료한다
    #[arg(short, long)]
    pub list: bool,

    /// Enter 입력 없이 자동으로 진행한다
    #[arg(short, long)]
    pub auto: bool,

    /// 자동 진행 시 Step 사이 대기 시간(초)
    #[arg(long, default_value_t = 3, value_name = "SECS")]
    pub auto_timeout: u64,

    /// Step 사이에 전혀 기다리지 않는다
    #[arg(short, long, conflicts_with = "auto")]
    pub immediate: bool,

    /// 중단될 때까지 선택한 데모를 반복 실행한다
    #[arg(short, long)]
    pub continuously: bool,

    /// 각 데모 앞에서 건너뛸 Step 수
    #[arg(short, long, default_value_t = 0, value_name = "N")]
    pub skip_steps: usize,

    /// 데모 설명을 표시하지 않는다
    #[arg(long)]
    pub hide_descriptions: bool,

    /// 색상 출력을 끈다
    #[arg(long)]
    pub no_color: bool,

    /// setup/cleanup 동작에 전달할 변수 (KEY=VALUE, 여러 번 지정 가능)
    #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_var)]
    pub vars: Vec<(String, String)>,

    /// 상세 로그를 출력한다
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// 명령줄 옵션에 따른 실행 옵션을 만든다.
    pub fn execute_options(&self) -> ExecuteOptions {
        let pacing = if self.immediate {
            Pacing::Immediate
        } else if self.auto {
            Pacing::Auto(Duration::from_secs(self.auto_timeout))
        } else {
            Pacing::Interactive
        };
        ExecuteOptions {
            skip_steps: self.skip_steps,
            pacing,
        }
    }

    /// 시작 시점의 HOME 값과 `--var` 값을 합친 변수 집합을 만든다.
    ///
    /// # 매개변수
    /// - `home`: 프로세스 환경에서 한 번 읽은 HOME 값.
    pub fn demo_vars(&self, home: Option<String>) -> DemoVars {
        let mut vars = DemoVars::new();
        if let Some(home) = home {
            vars.set_var("HOME", home);
        }
        for (key, value) in &self.vars {
            vars.set_var(key, value);
        }
        vars
    }
}

/// `KEY=VALUE` 형식의 변수 인자를 파싱한다.
fn parse_var(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("KEY=VALUE 형식이 아닙니다: {raw}"))?;
    if key.is_empty() {
        return Err(format!("변수 이름이 비어 있습니다: {raw}"));
    }
    Ok((key.to_string(), value.to_string()))
}

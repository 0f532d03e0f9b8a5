use anyhow::Context;
use clap::Parser;
use demo_runner::cli::Cli;
use demo_runner::engine::RunExecutor;
use demo_runner::registry::Registry;
use demo_runner::render::{Renderer, drain_events};
use demo_runner::scenario::load_demo_from_file;
use demo_runner::theme::{self, Theme};
use std::process::ExitCode;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{Level, warn};

/// 명령줄을 해석하고 단일 스레드 런타임에서 데모를 실행하는 진입점입니다.
fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Tokio 런타임 생성 실패: {err}");
            return ExitCode::from(2);
        }
    };
    let result = runtime.block_on(run(cli));
    // 대기 중인 표준 입력 읽기가 종료를 막지 않도록 한다.
    runtime.shutdown_background();

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("오류: {err:#}");
            ExitCode::from(2)
        }
    }
}

/// 로그는 데모 출력과 섞이지 않도록 stderr로 보낸다.
fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// 데모 파일을 읽어 선택된 데모를 실행한다.
///
/// # 반환값
/// 모든 데모가 완료되면 `true`, 하나라도 실패하거나 중단되면 `false`를 반환한다.
async fn run(cli: Cli) -> anyhow::Result<bool> {
    if cli.no_color {
        theme::set_color_enabled(false);
    }
    let demo = load_demo_from_file(&cli.file)
        .with_context(|| format!("데모 파일 로드 실패: {}", cli.file.display()))?;
    let home = std::env::var("HOME").ok();
    let mut registry = demo
        .into_registry(&cli.demo_vars(home))
        .with_context(|| format!("데모 구성 오류: {}", cli.file.display()))?;

    if cli.list {
        print_catalog(&registry);
        return Ok(true);
    }

    let cancel = CancellationToken::new();
    tokio::spawn(watch_interrupt(cancel.clone()));

    let (tx, rx) = mpsc::unbounded_channel();
    let renderer = Renderer::new(Theme::default(), cli.hide_descriptions, std::io::stdout());
    let display = tokio::spawn(drain_events(rx, renderer));
    let mut executor = RunExecutor::new(cli.execute_options(), tx, cancel.clone());

    let mut success = true;
    loop {
        let batch = registry.execute(&cli.runs, &mut executor).await?;
        if batch.failed() > 0 || (batch.cancelled && !cli.continuously) {
            success = false;
        }
        if !cli.continuously || batch.cancelled {
            break;
        }
    }

    drop(executor);
    display
        .await
        .context("출력 작업이 비정상 종료되었습니다.")?
        .context("데모 출력 실패")?;
    Ok(success)
}

/// 첫 번째 Ctrl-C는 cleanup을 포함한 정상 중단을 요청하고, 두 번째는 즉시 종료한다.
async fn watch_interrupt(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_err() {
        return;
    }
    warn!("중단 요청을 받았습니다. cleanup 후 종료합니다. 즉시 종료하려면 다시 누르세요.");
    cancel.cancel();
    if tokio::signal::ctrl_c().await.is_ok() {
        std::process::exit(130);
    }
}

/// 등록된 데모를 선택 메뉴 순서대로 출력한다.
fn print_catalog(registry: &Registry) {
    let width = registry
        .entries()
        .iter()
        .map(|entry| entry.label.len())
        .max()
        .unwrap_or(0);
    for entry in registry.entries() {
        println!(
            "{:width$}  {}  ({} Step)",
            entry.label,
            entry.description,
            entry.run.steps().len()
        );
    }
}

use super::error::StepError;
use super::events::{DemoEvent, OutputStream};
use futures::StreamExt;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncRead;
use tokio::process::Command;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio_util::codec::{AnyDelimiterCodec, FramedRead};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// 명령 종료 후 남은 출력을 기다리는 최대 유휴 시간.
const DRAIN_IDLE_GRACE: Duration = Duration::from_secs(1);

/// 명령 한 번의 실행 결과와 수집된 출력이다.
#[derive(Debug)]
pub(crate) struct CommandRun {
    /// stdout/stderr를 도착 순서대로 합친 출력.
    pub output: Vec<String>,
    /// 성공 여부.
    pub result: Result<(), StepError>,
}

/// 플랫폼 셸로 명령 문자열을 실행하는 프로세스 빌더를 만든다.
pub(super) fn shell_command(command_line: &str) -> Command {
    let mut command = if cfg!(target_os = "windows") {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(command_line);
        cmd
    } else {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command_line);
        cmd
    };
    command.stdin(Stdio::null());
    command.stdout(Stdio::piped());
    command.stderr(Stdio::piped());
    command.kill_on_drop(true);
    command
}

/// 쉘 명령을 실행하고 출력을 실시간으로 전달한다.
///
/// # 인자
/// - `command_line`: 공백으로 이어 붙인 실행 문자열
/// - `index`: 출력 이벤트에 붙일 Step 번호
/// - `limit`: 최대 대기 시간. `None`이면 제한 없음
/// - `sender`: 출력 라인을 내보낼 이벤트 송신자
/// - `cancel`: 외부 중단 토큰. 취소되면 프로세스를 종료한다
///
/// # 반환값
/// 수집된 출력과 함께, 0으로 종료하면 `Ok(())`, 그 외에는 `StepError`를 반환한다.
pub(crate) async fn run_shell_command(
    command_line: &str,
    index: usize,
    limit: Option<Duration>,
    sender: &UnboundedSender<DemoEvent>,
    cancel: &CancellationToken,
) -> CommandRun {
    let mut child = match shell_command(command_line).spawn() {
        Ok(child) => child,
        Err(source) => {
            return CommandRun {
                output: Vec::new(),
                result: Err(StepError::Launch {
                    command: command_line.to_string(),
                    source,
                }),
            };
        }
    };
    debug!(step = index, pid = ?child.id(), "명령 실행: {command_line}");

    let (line_tx, mut line_rx) = mpsc::unbounded_channel();
    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(pipe_forwarder(stdout, line_tx.clone(), OutputStream::Stdout));
    }
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(pipe_forwarder(stderr, line_tx.clone(), OutputStream::Stderr));
    }
    drop(line_tx);

    let deadline = async {
        match limit {
            Some(limit) => tokio::time::sleep(limit).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);

    let mut output = Vec::new();
    let forward = |stream: OutputStream, line: String, output: &mut Vec<String>| {
        let _ = sender.send(DemoEvent::StepOutput {
            index,
            stream,
            line: line.clone(),
        });
        output.push(line);
    };

    let waited = loop {
        tokio::select! {
            Some((stream, line)) = line_rx.recv() => forward(stream, line, &mut output),
            status = child.wait() => break status.map_err(|source| StepError::Wait {
                command: command_line.to_string(),
                source,
            }),
            _ = &mut deadline => break Err(StepError::Timeout {
                command: command_line.to_string(),
                limit: limit.unwrap_or_default(),
            }),
            _ = cancel.cancelled() => break Err(StepError::Cancelled {
                command: command_line.to_string(),
            }),
        }
    };

    let status = match waited {
        Ok(status) => status,
        Err(err) => {
            if let Err(kill_err) = child.kill().await {
                warn!(step = index, "프로세스 종료 실패: {kill_err}");
            }
            while let Ok((stream, line)) = line_rx.try_recv() {
                forward(stream, line, &mut output);
            }
            return CommandRun {
                output,
                result: Err(err),
            };
        }
    };

    // 프로세스 종료 후 파이프에 남은 출력을 마저 읽는다. 백그라운드 자식이 파이프를
    // 잡고 있으면 제한 시간 또는 유휴 대기 시간이 지난 뒤 멈춘다.
    loop {
        tokio::select! {
            next = line_rx.recv() => match next {
                Some((stream, line)) => forward(stream, line, &mut output),
                None => break,
            },
            _ = &mut deadline => {
                return CommandRun {
                    output,
                    result: Err(StepError::Timeout {
                        command: command_line.to_string(),
                        limit: limit.unwrap_or_default(),
                    }),
                };
            }
            _ = tokio::time::sleep(DRAIN_IDLE_GRACE) => {
                debug!(step = index, "종료 후 출력이 없어 파이프 읽기를 멈춥니다.");
                break;
            }
            _ = cancel.cancelled() => break,
        }
    }

    debug!(step = index, code = ?status.code(), "명령 종료");
    let result = if status.success() {
        Ok(())
    } else {
        Err(StepError::ExitStatus {
            command: command_line.to_string(),
            code: status.code(),
        })
    };
    CommandRun { output, result }
}

/// 프로세스 파이프를 라인 단위로 읽어 수집 채널로 중계한다.
///
/// UTF-8이 아닌 바이트는 대체 문자로 바꾸며, 파이프가 닫힐 때까지 읽기를 멈추지 않는다.
async fn pipe_forwarder<R>(
    reader: R,
    sender: UnboundedSender<(OutputStream, String)>,
    stream: OutputStream,
) where
    R: AsyncRead + Unpin + Send + 'static,
{
    let codec = AnyDelimiterCodec::new(b"\n".to_vec(), Vec::new());
    let mut chunks = FramedRead::new(reader, codec);
    while let Some(chunk_result) = chunks.next().await {
        match chunk_result {
            Ok(chunk) => {
                let line = String::from_utf8_lossy(&chunk)
                    .trim_end_matches('\r')
                    .to_string();
                let _ = sender.send((stream, line));
            }
            Err(err) => {
                warn!("출력 읽기 오류: {err}");
                let _ = sender.send((stream, format!("출력 읽기 오류: {err}")));
                break;
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    async fn run(command: &str, limit: Option<Duration>) -> (CommandRun, Vec<DemoEvent>) {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let run = run_shell_command(command, 1, limit, &tx, &cancel).await;
        drop(tx);
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        (run, events)
    }

    #[tokio::test]
    async fn captures_stdout_and_stderr() {
        let (run, events) = run("echo hello; echo oops 1>&2", None).await;
        assert!(run.result.is_ok());
        let mut output = run.output.clone();
        output.sort();
        assert_eq!(output, vec!["hello".to_string(), "oops".to_string()]);
        assert_eq!(events.len(), 2);
        assert!(events.iter().any(|e| matches!(
            e,
            DemoEvent::StepOutput { stream: OutputStream::Stderr, line, .. } if line == "oops"
        )));
    }

    #[tokio::test]
    async fn non_zero_exit_reports_the_code() {
        let (run, _) = run("echo partial; exit 3", None).await;
        assert_eq!(run.output, vec!["partial".to_string()]);
        match run.result {
            Err(StepError::ExitStatus { code, command }) => {
                assert_eq!(code, Some(3));
                assert_eq!(command, "echo partial; exit 3");
            }
            other => panic!("예상하지 못한 결과: {other:?}"),
        }
    }

    #[tokio::test]
    async fn timeout_kills_the_process() {
        let (run, _) = run("sleep 5", Some(Duration::from_millis(100))).await;
        assert!(matches!(run.result, Err(StepError::Timeout { .. })));
    }

    #[tokio::test]
    async fn cancellation_kills_the_process() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });
        let run = run_shell_command("sleep 5", 1, None, &tx, &cancel).await;
        assert!(matches!(run.result, Err(StepError::Cancelled { .. })));
    }

    #[tokio::test]
    async fn invalid_utf8_output_does_not_break_the_command() {
        let script = "printf 'ok\\n\\377\\n'; sleep 0.2; \
                      i=0; while [ $i -lt 2000 ]; do echo line$i; i=$((i+1)); done; exit 0";
        let (run, _) = run(script, None).await;
        assert!(run.result.is_ok(), "{:?}", run.result);
        assert_eq!(run.output.len(), 2002);
        assert_eq!(run.output[0], "ok");
        assert_eq!(run.output[1], "\u{FFFD}");
        assert_eq!(run.output[2001], "line1999");
    }

    #[tokio::test]
    async fn background_job_holding_the_pipe_respects_the_timeout() {
        let started = std::time::Instant::now();
        let (run, _) = run("sleep 4 & echo started", Some(Duration::from_millis(200))).await;
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(run.output, vec!["started".to_string()]);
        assert!(matches!(run.result, Err(StepError::Timeout { .. })));
    }

    #[tokio::test]
    async fn background_job_without_timeout_stops_after_idle_grace() {
        let started = std::time::Instant::now();
        let (run, _) = run("sleep 4 & echo started", None).await;
        assert!(started.elapsed() < Duration::from_secs(3));
        assert_eq!(run.output, vec!["started".to_string()]);
        assert!(run.result.is_ok());
    }
}

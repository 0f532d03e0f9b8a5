use super::process::shell_command;
use anyhow::Context;
use async_trait::async_trait;
use glob::glob;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// DemoAction은 Run 앞뒤에서 실행되는 인자 없는 setup/cleanup 동작을 정의한다.
#[async_trait]
pub trait DemoAction: Send + Sync {
    /// 동작을 실행하고 성공 여부를 반환한다.
    async fn run(&self) -> anyhow::Result<()>;

    /// 로그에 표시할 짧은 설명.
    fn describe(&self) -> String;
}

/// DemoAction을 공유하기 위한 Arc 타입 별칭이다.
pub type SharedAction = Arc<dyn DemoAction>;

/// 동기 클로저를 감싼 동작이다.
pub struct FnAction<F> {
    name: String,
    func: F,
}

impl<F> FnAction<F>
where
    F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }

    /// 공유 가능한 동작으로 감싼다.
    pub fn shared(name: impl Into<String>, func: F) -> SharedAction {
        Arc::new(Self::new(name, func))
    }
}

#[async_trait]
impl<F> DemoAction for FnAction<F>
where
    F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
{
    async fn run(&self) -> anyhow::Result<()> {
        (self.func)()
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}

/// 경로 또는 glob 패턴에 해당하는 파일과 디렉터리를 재귀적으로 삭제한다.
///
/// 존재하지 않는 경로는 성공으로 간주한다.
#[derive(Debug, Clone)]
pub struct RemovePaths {
    patterns: Vec<String>,
}

impl RemovePaths {
    pub fn new(patterns: Vec<String>) -> Self {
        Self { patterns }
    }
}

#[async_trait]
impl DemoAction for RemovePaths {
    async fn run(&self) -> anyhow::Result<()> {
        for pattern in &self.patterns {
            let entries =
                glob(pattern).with_context(|| format!("glob 패턴 파싱 실패: {pattern}"))?;
            for entry in entries {
                let path = entry.with_context(|| format!("경로 조회 실패: {pattern}"))?;
                remove_path(&path).await?;
            }
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("remove {}", self.patterns.join(" "))
    }
}

async fn remove_path(path: &Path) -> anyhow::Result<()> {
    let metadata = match tokio::fs::symlink_metadata(path).await {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(()),
        Err(err) => {
            return Err(err).with_context(|| format!("경로 확인 실패: {}", path.display()));
        }
    };
    let result = if metadata.is_dir() {
        tokio::fs::remove_dir_all(path).await
    } else {
        tokio::fs::remove_file(path).await
    };
    match result {
        Ok(()) => {
            debug!("삭제 완료: {}", path.display());
            Ok(())
        }
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err).with_context(|| format!("삭제 실패: {}", path.display())),
    }
}

/// 셸 명령을 실행하는 동작이다.
#[derive(Debug, Clone)]
pub struct ShellAction {
    command: String,
    ignore_failure: bool,
}

impl ShellAction {
    pub fn new(command: impl Into<String>, ignore_failure: bool) -> Self {
        Self {
            command: command.into(),
            ignore_failure,
        }
    }
}

#[async_trait]
impl DemoAction for ShellAction {
    async fn run(&self) -> anyhow::Result<()> {
        let result = match shell_command(&self.command).output().await {
            Ok(output) if output.status.success() => Ok(()),
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(anyhow::anyhow!(
                    "명령 종료 코드 {}: {} {}",
                    output.status,
                    self.command,
                    stderr.trim()
                ))
            }
            Err(err) => Err(anyhow::Error::new(err)
                .context(format!("명령 실행 실패: {}", self.command))),
        };
        match result {
            Err(err) if self.ignore_failure => {
                warn!("실패를 무시합니다: {err:#}");
                Ok(())
            }
            other => other,
        }
    }

    fn describe(&self) -> String {
        self.command.clone()
    }
}

/// 여러 동작을 순서대로 실행하고 첫 실패에서 멈추는 동작이다.
#[derive(Clone)]
pub struct ActionSequence {
    actions: Vec<SharedAction>,
}

impl ActionSequence {
    pub fn new(actions: Vec<SharedAction>) -> Self {
        Self { actions }
    }
}

#[async_trait]
impl DemoAction for ActionSequence {
    async fn run(&self) -> anyhow::Result<()> {
        for action in &self.actions {
            debug!("동작 실행: {}", action.describe());
            action
                .run()
                .await
                .with_context(|| format!("동작 실패: {}", action.describe()))?;
        }
        Ok(())
    }

    fn describe(&self) -> String {
        self.actions
            .iter()
            .map(|action| action.describe())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn remove_paths_deletes_globbed_entries_and_ignores_missing() {
        let dir = tempfile::tempdir().expect("임시 디렉터리 생성 실패");
        let cache = dir.path().join("cache");
        std::fs::create_dir_all(cache.join("nested")).expect("디렉터리 생성 실패");
        std::fs::write(cache.join("nested/policy.wasm"), "x").expect("파일 작성 실패");
        std::fs::write(dir.path().join("bundle.tar.gz"), "x").expect("파일 작성 실패");
        std::fs::write(dir.path().join("keep.txt"), "x").expect("파일 작성 실패");

        let action = RemovePaths::new(vec![
            cache.display().to_string(),
            format!("{}/*.tar.gz", dir.path().display()),
            dir.path().join("missing").display().to_string(),
        ]);
        action.run().await.expect("삭제 성공");

        assert!(!cache.exists());
        assert!(!dir.path().join("bundle.tar.gz").exists());
        assert!(dir.path().join("keep.txt").exists());
        // 두 번째 실행도 성공해야 한다.
        action.run().await.expect("재실행 성공");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn shell_action_reports_failure_unless_ignored() {
        assert!(ShellAction::new("true", false).run().await.is_ok());
        assert!(ShellAction::new("exit 4", false).run().await.is_err());
        assert!(ShellAction::new("exit 4", true).run().await.is_ok());
    }

    #[tokio::test]
    async fn sequence_stops_at_first_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let first = calls.clone();
        let third = calls.clone();
        let sequence = ActionSequence::new(vec![
            FnAction::shared("first", move || {
                first.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
            FnAction::shared("broken", || anyhow::bail!("boom")),
            FnAction::shared("third", move || {
                third.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        ]);
        let err = sequence.run().await.unwrap_err();
        assert!(format!("{err:#}").contains("broken"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

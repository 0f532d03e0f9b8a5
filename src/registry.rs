use crate::engine::{BatchReport, DemoEvent, RegistryError, Run, RunExecutor};
use tracing::{info, warn};

/// 등록된 Run과 선택용 라벨, 설명이다.
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    pub run: Run,
    pub label: String,
    pub description: String,
}

/// Run 목록을 등록 순서대로 보관하고 일괄 실행한다.
#[derive(Debug, Default)]
pub struct Registry {
    entries: Vec<RegistryEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run을 등록한다. 라벨 중복은 검사하지 않는다.
    pub fn add(&mut self, run: Run, label: impl Into<String>, description: impl Into<String>) {
        self.entries.push(RegistryEntry {
            run,
            label: label.into(),
            description: description.into(),
        });
    }

    /// 등록 순서대로의 목록.
    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 선택한 라벨에 해당하는 항목 위치를 등록 순서대로 반환한다.
    ///
    /// 선택이 비어 있으면 전체를 반환하며, 어떤 항목과도 맞지 않는 라벨이 있으면 오류이다.
    fn select(&self, selection: &[String]) -> Result<Vec<usize>, RegistryError> {
        if selection.is_empty() {
            return Ok((0..self.entries.len()).collect());
        }
        if let Some(unknown) = selection
            .iter()
            .find(|label| !self.entries.iter().any(|entry| &entry.label == *label))
        {
            return Err(RegistryError::UnknownRun(unknown.clone()));
        }
        Ok(self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| selection.contains(&entry.label))
            .map(|(position, _)| position)
            .collect())
    }

    /// 선택된 Run (선택이 없으면 전체)을 등록 순서대로 실행한다.
    ///
    /// 한 Run의 실패는 다음 Run 실행을 막지 않는다. 외부 중단이 요청되면 현재 Run의
    /// cleanup 이후 멈추고, 남은 Run은 시작하지 않은 것으로 기록한다.
    pub async fn execute(
        &mut self,
        selection: &[String],
        executor: &mut RunExecutor,
    ) -> Result<BatchReport, RegistryError> {
        let positions = self.select(selection)?;
        let mut batch = BatchReport::default();
        for position in positions {
            let entry = &mut self.entries[position];
            if executor.is_cancelled() {
                batch.cancelled = true;
                batch.not_started.push(entry.run.title().to_string());
                continue;
            }
            info!(label = %entry.label, "데모 실행");
            entry.run.reset();
            let report = executor.execute(&mut entry.run).await?;
            if !report.is_completed() {
                warn!(label = %entry.label, "데모가 실패했지만 다음 데모를 계속 진행합니다.");
            }
            batch.runs.push(report);
        }
        if executor.is_cancelled() {
            batch.cancelled = true;
        }
        executor.emit(DemoEvent::BatchFinished {
            completed: batch.completed(),
            failed: batch.failed(),
            not_started: batch.not_started.len(),
        });
        Ok(batch)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::engine::{ExecuteOptions, RunState, Step};
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    fn simple_run(title: &str, command: &str) -> Run {
        let mut run = Run::new(title, Vec::<String>::new());
        run.push_step(Step::command(title, command));
        run
    }

    fn executor(cancel: CancellationToken) -> RunExecutor {
        let (tx, _rx) = mpsc::unbounded_channel();
        RunExecutor::new(ExecuteOptions::default(), tx, cancel)
    }

    #[tokio::test]
    async fn failed_run_does_not_stop_the_batch() {
        let mut registry = Registry::new();
        registry.add(simple_run("first", "true"), "first", "first demo");
        registry.add(simple_run("second", "false"), "second", "second demo");
        registry.add(simple_run("third", "true"), "third", "third demo");

        let mut executor = executor(CancellationToken::new());
        let batch = registry.execute(&[], &mut executor).await.expect("실행");

        let titles: Vec<&str> = batch.runs.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second", "third"]);
        assert_eq!(batch.runs[1].state, RunState::Failed);
        assert_eq!(batch.runs[2].state, RunState::Completed);
        assert_eq!(batch.runs[2].executed_steps(), 1);
        assert_eq!(batch.completed(), 2);
        assert_eq!(batch.failed(), 1);
        assert!(!batch.is_success());
    }

    #[tokio::test]
    async fn selection_runs_matching_labels_in_registration_order() {
        let mut registry = Registry::new();
        registry.add(simple_run("a", "true"), "a", "");
        registry.add(simple_run("b", "true"), "b", "");
        registry.add(simple_run("c", "true"), "c", "");

        let mut executor = executor(CancellationToken::new());
        let selection = vec!["c".to_string(), "a".to_string()];
        let batch = registry
            .execute(&selection, &mut executor)
            .await
            .expect("실행");
        let titles: Vec<&str> = batch.runs.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn duplicate_labels_select_every_match() {
        let mut registry = Registry::new();
        registry.add(simple_run("one", "true"), "dup", "");
        registry.add(simple_run("two", "true"), "dup", "");
        let mut executor = executor(CancellationToken::new());
        let batch = registry
            .execute(&["dup".to_string()], &mut executor)
            .await
            .expect("실행");
        assert_eq!(batch.runs.len(), 2);
    }

    #[tokio::test]
    async fn unknown_label_is_rejected_before_anything_runs() {
        let mut registry = Registry::new();
        registry.add(simple_run("a", "true"), "a", "");
        let mut executor = executor(CancellationToken::new());
        let err = registry
            .execute(&["missing".to_string()], &mut executor)
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::UnknownRun(label) if label == "missing"));
        assert_eq!(registry.entries()[0].run.state(), RunState::Pending);
    }

    #[tokio::test]
    async fn batch_can_be_executed_again() {
        let mut registry = Registry::new();
        registry.add(simple_run("a", "true"), "a", "");
        let mut executor = executor(CancellationToken::new());
        registry.execute(&[], &mut executor).await.expect("첫 실행");
        let batch = registry.execute(&[], &mut executor).await.expect("재실행");
        assert_eq!(batch.completed(), 1);
    }

    #[tokio::test]
    async fn cancelled_batch_does_not_start_remaining_runs() {
        let mut registry = Registry::new();
        registry.add(simple_run("a", "true"), "a", "");
        registry.add(simple_run("b", "true"), "b", "");
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut executor = executor(cancel);
        let batch = registry.execute(&[], &mut executor).await.expect("실행");
        assert!(batch.cancelled);
        assert!(batch.runs.is_empty());
        assert_eq!(batch.not_started, vec!["a".to_string(), "b".to_string()]);
    }
}

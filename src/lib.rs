//! 명령줄 도구 사용법을 시연하기 위한 스크립트 데모 실행기.
//!
//! 데모는 이름 있는 Run 목록으로 구성되며, 각 Run은 setup, 순서 있는 Step,
//! cleanup 순으로 실행된다. Step은 캡션을 표시하고 필요하면 외부 명령을 하나 실행한다.
//!
//! ```no_run
//! use demo_runner::engine::{ExecuteOptions, Run, RunExecutor, Step};
//! use demo_runner::registry::Registry;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let mut run = Run::new("Running policies with kwctl", ["In this demo, we are going to:"]);
//! run.push_step(Step::narration("Search for a policy"))
//!     .push_step(Step::command("List policies", "kwctl policies"))
//!     .push_step(Step::command("Evaluate a rejected request", "kwctl run policy.wasm").tolerant());
//!
//! let mut registry = Registry::new();
//! registry.add(run, "kwctl", "kwctl demo");
//!
//! let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
//! let mut executor = RunExecutor::new(ExecuteOptions::default(), tx, CancellationToken::new());
//! let batch = registry.execute(&[], &mut executor).await?;
//! assert!(batch.is_success());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod engine;
pub mod registry;
pub mod render;
pub mod scenario;
pub mod theme;

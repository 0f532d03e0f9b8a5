use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Step 사이 진행 방식이다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    /// Enter 입력을 기다린다.
    Interactive,
    /// 지정한 시간만큼 기다린 뒤 자동으로 진행한다.
    Auto(Duration),
    /// 기다리지 않는다.
    Immediate,
}

/// Step 사이 대기를 수행한다. 표준 입력 리더를 한 번만 만들어 재사용한다.
pub struct Pacer {
    pacing: Pacing,
    stdin: Option<Lines<BufReader<Stdin>>>,
}

impl Pacer {
    pub fn new(pacing: Pacing) -> Self {
        Self {
            pacing,
            stdin: None,
        }
    }

    /// 사용자 입력을 기다려야 하는지 여부.
    pub fn is_interactive(&self) -> bool {
        self.pacing == Pacing::Interactive
    }

    /// 다음 Step까지 대기한다.
    ///
    /// # 반환값
    /// 대기 중 취소되면 `false`, 그 외에는 `true`를 반환한다.
    pub async fn wait(&mut self, cancel: &CancellationToken) -> bool {
        match self.pacing {
            Pacing::Immediate => !cancel.is_cancelled(),
            Pacing::Auto(delay) => {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => true,
                    _ = cancel.cancelled() => false,
                }
            }
            Pacing::Interactive => {
                let lines = self
                    .stdin
                    .get_or_insert_with(|| BufReader::new(tokio::io::stdin()).lines());
                tokio::select! {
                    line = lines.next_line() => {
                        if !matches!(line, Ok(Some(_))) {
                            debug!("표준 입력이 닫혀 대기 없이 진행합니다.");
                            self.pacing = Pacing::Immediate;
                        }
                        true
                    }
                    _ = cancel.cancelled() => false,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn immediate_pacing_never_blocks() {
        let mut pacer = Pacer::new(Pacing::Immediate);
        let cancel = CancellationToken::new();
        assert!(pacer.wait(&cancel).await);
        cancel.cancel();
        assert!(!pacer.wait(&cancel).await);
    }

    #[tokio::test]
    async fn auto_pacing_is_interrupted_by_cancellation() {
        let mut pacer = Pacer::new(Pacing::Auto(Duration::from_secs(30)));
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(!pacer.wait(&cancel).await);
    }
}

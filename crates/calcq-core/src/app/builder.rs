//! ManagerBuilder: wires a manager to its executor.
//!
//! # 学習ポイント
//! - Builder パターンで executor の差し替えを可能にする
//! - 起動時検証（Fail-fast 設計）: 設定の誤りは `build()` で検出する
//! - executor 未指定なら tokio のブロッキングプールを使う

use std::marker::PhantomData;
use std::sync::Arc;

use log::debug;

use super::ConcurrentCalculationManager;
use crate::config::PoolConfig;
use crate::error::CalcError;
use crate::impls::TokioBlockingPool;
use crate::ports::Executor;

/// Builds a [`ConcurrentCalculationManager`].
///
/// # Example
/// ```ignore
/// let manager = ManagerBuilder::<u64>::new()
///     .config(PoolConfig::default().with_max_threads(8))
///     .build()?;
/// ```
///
/// The config is validated in `build()` even when a custom executor is
/// injected, so a bad config file fails at startup either way.
pub struct ManagerBuilder<T> {
    config: PoolConfig,
    executor: Option<Arc<dyn Executor>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + 'static> ManagerBuilder<T> {
    pub fn new() -> Self {
        Self {
            config: PoolConfig::default(),
            executor: None,
            _marker: PhantomData,
        }
    }

    /// Sizing for the default pool.
    pub fn config(mut self, config: PoolConfig) -> Self {
        self.config = config;
        self
    }

    /// Run jobs on `executor` instead of a dedicated pool.
    pub fn executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn build(self) -> Result<ConcurrentCalculationManager<T>, CalcError> {
        self.config.validate()?;

        let executor = match self.executor {
            Some(executor) => {
                debug!("using injected executor {}", executor.name());
                executor
            }
            None => Arc::new(TokioBlockingPool::new(&self.config)?),
        };
        Ok(ConcurrentCalculationManager::with_executor(executor))
    }
}

impl<T: Send + 'static> Default for ManagerBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use crate::impls::InlineExecutor;

    #[test]
    fn build_default_pool() {
        let manager = ManagerBuilder::<u8>::new()
            .config(PoolConfig::default().with_max_threads(2))
            .build()
            .unwrap();
        assert_eq!(manager.executor_name(), "tokio-blocking-pool");
    }

    #[test]
    fn build_with_injected_executor() {
        let manager = ManagerBuilder::<u8>::new()
            .executor(Arc::new(InlineExecutor::new()))
            .build()
            .unwrap();
        assert_eq!(manager.executor_name(), "inline");
    }

    #[test]
    fn build_rejects_invalid_config() {
        let result = ManagerBuilder::<u8>::new()
            .config(PoolConfig::default().with_max_threads(0))
            .executor(Arc::new(InlineExecutor::new()))
            .build();
        assert!(matches!(
            result,
            Err(CalcError::Config(ConfigError::Invalid(_)))
        ));
    }
}

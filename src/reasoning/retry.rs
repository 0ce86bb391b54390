// ==========================================
// 车间停机工时核算 - 重试/降级调用包装
// ==========================================
// 状态机:
//   Attempting(primary, n) -> Success
//                          -> Attempting(primary, n+1)   [瞬时错误, n < max]
//                          -> FallbackAttempt            [永久错误 / 次数耗尽]
//   FallbackAttempt        -> Success | Failed(None)
// 红线: 备用调用只执行一次; 全部失败返回 None, 不抛错
// ==========================================

use crate::reasoning::error::ErrorClass;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const DEFAULT_BASE_DELAY_MS: u64 = 1_000;
pub const DEFAULT_MAX_DELAY_MS: u64 = 5_000;
pub const DEFAULT_ATTEMPT_TIMEOUT_SECS: u64 = 30;

// ==========================================
// RetryPolicy - 重试策略
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 主调用最大尝试次数（≥1）
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// 单次调用超时, 超时按瞬时错误处理
    pub attempt_timeout: Option<Duration>,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
            attempt_timeout: Some(Duration::from_secs(DEFAULT_ATTEMPT_TIMEOUT_SECS)),
        }
    }

    pub fn with_attempt_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// 第 attempt 次失败后的等待时长: min(base × attempt, max)
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(attempt.max(1))
            .min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

/// 单次尝试的失败原因
enum AttemptFailure<E> {
    TimedOut(Duration),
    Failed(E),
}

impl<E: fmt::Display> fmt::Display for AttemptFailure<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptFailure::TimedOut(d) => write!(f, "调用超时({}ms)", d.as_millis()),
            AttemptFailure::Failed(e) => write!(f, "{}", e),
        }
    }
}

async fn run_attempt<T, E, Fut>(timeout: Option<Duration>, fut: Fut) -> Result<T, AttemptFailure<E>>
where
    Fut: Future<Output = Result<T, E>>,
{
    match timeout {
        Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(result) => result.map_err(AttemptFailure::Failed),
            Err(_) => Err(AttemptFailure::TimedOut(limit)),
        },
        None => fut.await.map_err(AttemptFailure::Failed),
    }
}

/// 主调用带重试, 失败后降级到备用调用
///
/// # 参数
/// - operation: 日志中的操作名
/// - classify: 错误分类器
/// - primary: 主调用工厂（每次尝试调用一次）
/// - fallback: 备用调用（至多调用一次）
///
/// # 返回
/// - Some(T): 主调用或备用调用成功
/// - None: 全部失败, 调用方按“无答案”处理
pub async fn invoke_with_fallback<T, E, C, P, PFut, F, FFut>(
    operation: &str,
    policy: &RetryPolicy,
    classify: C,
    mut primary: P,
    fallback: F,
) -> Option<T>
where
    E: fmt::Display,
    C: Fn(&E) -> ErrorClass,
    P: FnMut() -> PFut,
    PFut: Future<Output = Result<T, E>>,
    F: FnOnce() -> FFut,
    FFut: Future<Output = Result<T, E>>,
{
    let max_attempts = policy.max_attempts.max(1);

    for attempt in 1..=max_attempts {
        debug!(operation, attempt, max_attempts, "调用主推理服务");

        match run_attempt(policy.attempt_timeout, primary()).await {
            Ok(value) => {
                info!(operation, attempt, max_attempts, outcome = "success", "主推理服务调用成功");
                return Some(value);
            }
            Err(failure) => {
                let class = match &failure {
                    AttemptFailure::TimedOut(_) => ErrorClass::Transient,
                    AttemptFailure::Failed(e) => classify(e),
                };

                warn!(
                    operation,
                    attempt,
                    max_attempts,
                    class = %class,
                    error = %failure,
                    "主推理服务调用失败"
                );

                if class == ErrorClass::Permanent {
                    info!(operation, attempt, "永久错误, 跳过重试直接切换备用服务");
                    break;
                }

                if attempt < max_attempts {
                    let delay = policy.backoff_delay(attempt);
                    debug!(operation, attempt, delay_ms = delay.as_millis() as u64, "等待后重试");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    info!(operation, "切换备用推理服务");
    match run_attempt(policy.attempt_timeout, fallback()).await {
        Ok(value) => {
            info!(operation, outcome = "fallback_success", "备用推理服务调用成功");
            Some(value)
        }
        Err(failure) => {
            error!(
                operation,
                outcome = "failed",
                error = %failure,
                "备用推理服务调用失败, 返回空结果"
            );
            None
        }
    }
}

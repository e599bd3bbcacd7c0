use rand::Rng;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

pub const DEFAULT_MAX_CALLS_PER_SECOND: f64 = 2.0;
const RATE_ADAPT_FACTOR: f64 = 1.2;
const DEFAULT_JITTER_CAP: Duration = Duration::from_millis(100);

#[derive(Debug)]
struct RateState {
    rate: f64,
    last_call: Option<Instant>,
}

/// 自適應速率控制:成功逐步加速到上限,被 429 就降速,速率只會趨近零不會歸零
pub struct RateController {
    max_rate: f64,
    jitter_cap: Duration,
    state: Mutex<RateState>,
}

impl RateController {
    pub fn new(max_calls_per_second: f64) -> Self {
        Self {
            max_rate: max_calls_per_second,
            jitter_cap: DEFAULT_JITTER_CAP,
            state: Mutex::new(RateState {
                rate: max_calls_per_second,
                last_call: None,
            }),
        }
    }

    pub fn with_jitter_cap(mut self, cap: Duration) -> Self {
        self.jitter_cap = cap;
        self
    }

    fn state(&self) -> MutexGuard<'_, RateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn current_rate(&self) -> f64 {
        self.state().rate
    }

    /// 睡到下一次請求安全為止;鎖只拿來算等待時間,不會抱著鎖睡
    pub async fn wait(&self) {
        let pause = {
            let state = self.state();
            let interval = Duration::from_secs_f64(1.0 / state.rate);
            match state.last_call {
                Some(last) => interval.saturating_sub(last.elapsed()),
                None => Duration::ZERO,
            }
        };

        let jitter = if self.jitter_cap.is_zero() {
            Duration::ZERO
        } else {
            let cap_ms = self.jitter_cap.as_millis() as u64;
            Duration::from_millis(rand::thread_rng().gen_range(0..=cap_ms))
        };

        let delay = pause + jitter;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.state().last_call = Some(Instant::now());
    }

    pub fn on_success(&self) {
        let mut state = self.state();
        state.rate = (state.rate * RATE_ADAPT_FACTOR).min(self.max_rate);
    }

    pub fn on_rate_limited(&self) {
        let mut state = self.state();
        state.rate /= RATE_ADAPT_FACTOR;
        tracing::info!("🔶 Rate limited; slowing down to {:.2} calls/s", state.rate);
    }
}

impl Default for RateController {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CALLS_PER_SECOND)
    }
}

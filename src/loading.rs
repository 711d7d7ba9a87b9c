use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rand::Rng;
use tokio::task::AbortHandle;
use tokio::time::{interval_at, Instant};

use crate::surface::{Control, Page, ProgressTarget, RenderTarget};

pub const SEARCH_LABEL: &str = r#"<i class="fas fa-search"></i> Start Scraping"#;
pub const BUSY_LABEL: &str = r#"<i class="fas fa-spinner fa-spin"></i> Processing..."#;

#[derive(Clone, Debug)]
pub struct LoadingOptions {
    pub tick: Duration,
    /// Each tick adds a uniform random step in `[0, max_step)`.
    pub max_step: f64,
    /// The animation never goes past this; only completion hides the bar.
    pub ceiling: f64,
    /// The animation stops after this long even if the search is still pending.
    pub safety_timeout: Duration,
}

impl Default for LoadingOptions {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(500),
            max_step: 15.0,
            ceiling: 90.0,
            safety_timeout: Duration::from_secs(30),
        }
    }
}

struct AnimationTasks {
    animation: AbortHandle,
    safety: AbortHandle,
}

#[derive(Default)]
struct LoadingState {
    // Bumped on every show/hide; a tick from an older epoch is dropped.
    epoch: u64,
    tasks: Option<AnimationTasks>,
}

impl LoadingState {
    fn cancel(&mut self) {
        if let Some(tasks) = self.tasks.take() {
            tasks.animation.abort();
            tasks.safety.abort();
        }
    }
}

pub struct LoadingIndicator {
    button: Arc<dyn Control>,
    section: Arc<dyn RenderTarget>,
    results_section: Arc<dyn RenderTarget>,
    progress: Arc<dyn ProgressTarget>,
    options: LoadingOptions,
    state: Arc<Mutex<LoadingState>>,
}

impl LoadingIndicator {
    pub fn new(page: &Page, options: LoadingOptions) -> Self {
        Self {
            button: page.search_button.clone(),
            section: page.loading_section.clone(),
            results_section: page.results_section.clone(),
            progress: page.progress_fill.clone(),
            options,
            state: Arc::new(Mutex::new(LoadingState::default())),
        }
    }

    /// Must be called inside a tokio runtime; spawns the animation tasks.
    pub fn show(&self) {
        self.section.show();
        self.results_section.hide();
        self.button.set_disabled(true);
        self.button.set_content(BUSY_LABEL);
        self.start_animation();
    }

    pub fn hide(&self) {
        {
            let mut state = self.state.lock();
            state.epoch += 1;
            state.cancel();
            self.progress.set_percent(0.0);
        }
        self.section.hide();
        self.button.set_disabled(false);
        self.button.set_content(SEARCH_LABEL);
    }

    pub fn is_animating(&self) -> bool {
        self.state
            .lock()
            .tasks
            .as_ref()
            .map(|t| !t.animation.is_finished())
            .unwrap_or(false)
    }

    fn start_animation(&self) {
        let mut state = self.state.lock();
        state.cancel();
        state.epoch += 1;
        let epoch = state.epoch;

        let options = self.options.clone();
        let progress = self.progress.clone();
        let shared = self.state.clone();
        let animation = tokio::spawn(async move {
            let mut percent = 0.0_f64;
            let mut ticker = interval_at(Instant::now() + options.tick, options.tick);
            loop {
                ticker.tick().await;
                let step = if options.max_step > 0.0 {
                    rand::thread_rng().gen_range(0.0..options.max_step)
                } else {
                    0.0
                };
                percent = (percent + step).min(options.ceiling);

                let current = {
                    let state = shared.lock();
                    let current = state.epoch == epoch;
                    if current {
                        progress.set_percent(percent);
                    }
                    current
                };
                if !current {
                    break;
                }
            }
        })
        .abort_handle();

        let animation_for_timeout = animation.clone();
        let safety_timeout = self.options.safety_timeout;
        let safety = tokio::spawn(async move {
            tokio::time::sleep(safety_timeout).await;
            log::debug!("progress animation stopped by safety timeout");
            animation_for_timeout.abort();
        })
        .abort_handle();

        state.tasks = Some(AnimationTasks { animation, safety });
    }
}

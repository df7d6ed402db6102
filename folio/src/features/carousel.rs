//! Project image carousels, loaded as a deferred module.

use crate::modules::FeatureModule;
use crate::registry::{Initializer, InitializerRegistry, InitializerRole, PageView};
use async_trait::async_trait;
use folio_shared::errors::FolioResult;
use parking_lot::{Mutex, RwLock};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Class marking a carousel root element.
pub const CAROUSEL_CLASS: &str = "project-carousel";
const SLIDE_CLASS: &str = "carousel-slide";

pub const AUTO_ADVANCE_INTERVAL: Duration = Duration::from_secs(5);
/// Minimum horizontal travel, in pixels, for a touch to count as a swipe.
pub const SWIPE_THRESHOLD: f64 = 50.0;
/// Image formats tried, in order, when the referenced file is missing.
pub const SUPPORTED_FORMATS: [&str; 4] = ["webp", "png", "jpg", "jpeg"];

/// Slide position of one carousel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarouselState {
    slide_count: usize,
    current: usize,
    paused: bool,
}

impl CarouselState {
    pub fn new(slide_count: usize) -> Self {
        Self {
            slide_count,
            current: 0,
            paused: false,
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn slide_count(&self) -> usize {
        self.slide_count
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn next(&mut self) {
        if self.slide_count > 0 {
            self.current = (self.current + 1) % self.slide_count;
        }
    }

    pub fn prev(&mut self) {
        if self.slide_count > 0 {
            self.current = (self.current + self.slide_count - 1) % self.slide_count;
        }
    }

    /// Jump to a slide; out-of-range indices are ignored.
    pub fn go_to(&mut self, index: usize) -> bool {
        if index >= self.slide_count {
            return false;
        }
        self.current = index;
        true
    }

    /// Apply a touch gesture. Swiping right goes back, left goes forward.
    pub fn swipe(&mut self, start_x: f64, end_x: f64) -> bool {
        let distance = end_x - start_x;
        if distance.abs() <= SWIPE_THRESHOLD {
            return false;
        }
        if distance > 0.0 {
            self.prev();
        } else {
            self.next();
        }
        true
    }

    /// Pointer entered the carousel.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Pointer left the carousel.
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Auto-advance tick; returns whether the slide moved.
    pub fn tick(&mut self) -> bool {
        if self.paused || self.slide_count < 2 {
            return false;
        }
        self.next();
        true
    }
}

/// Existence check for image assets.
#[async_trait]
pub trait AssetLocator: Send + Sync {
    async fn exists(&self, path: &str) -> bool;
}

/// Looks up files under a site root.
#[derive(Debug, Clone)]
pub struct DirAssetLocator {
    root: PathBuf,
}

impl DirAssetLocator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl AssetLocator for DirAssetLocator {
    async fn exists(&self, path: &str) -> bool {
        let path = self.root.join(path.trim_start_matches('/'));
        tokio::fs::try_exists(&path).await.unwrap_or(false)
    }
}

/// Find a loadable image for `path`, trying other formats if needed.
pub async fn resolve_image(assets: &dyn AssetLocator, path: &str) -> Option<String> {
    if assets.exists(path).await {
        return Some(path.to_string());
    }

    let file_start = path.rfind('/').map_or(0, |i| i + 1);
    let base = match path[file_start..].rfind('.') {
        Some(dot) => &path[..file_start + dot],
        None => path,
    };
    for format in SUPPORTED_FORMATS {
        let candidate = format!("{}.{}", base, format);
        if assets.exists(&candidate).await {
            return Some(candidate);
        }
    }
    None
}

/// A slide image reference and where it resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideImage {
    pub requested: String,
    pub resolved: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Carousel {
    pub project: String,
    pub images: Vec<SlideImage>,
    pub state: CarouselState,
    next_due: Instant,
}

/// Carousels found in the page plus the ticker that advances them.
///
/// Every carousel has its own auto-advance deadline. Any interaction through
/// [`with_carousel`](Self::with_carousel) restarts that carousel's window, so
/// a manual move is never followed by an immediate automatic one.
pub struct CarouselFeature {
    this: Weak<CarouselFeature>,
    assets: Arc<dyn AssetLocator>,
    interval: Duration,
    carousels: RwLock<Vec<Carousel>>,
    ticker: Mutex<Option<JoinHandle<()>>>,
    ticks: AtomicU64,
}

impl CarouselFeature {
    pub fn new(assets: Arc<dyn AssetLocator>) -> Arc<Self> {
        Self::with_interval(assets, AUTO_ADVANCE_INTERVAL)
    }

    pub fn with_interval(assets: Arc<dyn AssetLocator>, interval: Duration) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            assets,
            interval,
            carousels: RwLock::new(Vec::new()),
            ticker: Mutex::new(None),
            ticks: AtomicU64::new(0),
        })
    }

    pub fn carousels(&self) -> Vec<Carousel> {
        self.carousels.read().clone()
    }

    /// Interact with the carousel for `project`, restarting its auto-advance
    /// window.
    pub fn with_carousel<R>(
        &self,
        project: &str,
        f: impl FnOnce(&mut CarouselState) -> R,
    ) -> Option<R> {
        let now = Instant::now();
        let mut carousels = self.carousels.write();
        carousels.iter_mut().find(|c| c.project == project).map(|c| {
            c.next_due = now + self.interval;
            f(&mut c.state)
        })
    }

    /// Advance every carousel whose window has elapsed at `now`.
    ///
    /// Returns how many slides moved.
    pub fn advance_due(&self, now: Instant) -> usize {
        let mut moved = 0;
        for carousel in self.carousels.write().iter_mut() {
            if now < carousel.next_due {
                continue;
            }
            carousel.next_due = now + self.interval;
            self.ticks.fetch_add(1, Ordering::Relaxed);
            if carousel.state.tick() {
                moved += 1;
            }
        }
        moved
    }

    /// Number of elapsed auto-advance windows, paused or not.
    pub fn tick_count(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    fn next_due(&self) -> Option<Instant> {
        self.carousels.read().iter().map(|c| c.next_due).min()
    }

    /// Start the background ticker unless it is already running.
    fn ensure_ticker(&self) {
        let mut ticker = self.ticker.lock();
        if ticker.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        let weak = self.this.clone();
        let idle = self.interval;
        *ticker = Some(tokio::spawn(async move {
            loop {
                let wake = match weak.upgrade() {
                    Some(feature) => feature
                        .next_due()
                        .unwrap_or_else(|| Instant::now() + idle),
                    None => break,
                };
                tokio::time::sleep_until(wake).await;
                let Some(feature) = weak.upgrade() else {
                    break;
                };
                feature.advance_due(Instant::now());
            }
        }));
        tracing::debug!(interval_ms = idle.as_millis() as u64, "Carousel ticker started");
    }
}

impl Drop for CarouselFeature {
    fn drop(&mut self) {
        if let Some(handle) = self.ticker.get_mut().take() {
            handle.abort();
        }
    }
}

#[async_trait]
impl Initializer for CarouselFeature {
    async fn init(&self, page: &PageView) -> FolioResult<()> {
        let mut found = Vec::new();

        for (root, scope) in page.container().scoped(CAROUSEL_CLASS) {
            let Some(project) = root.data("project") else {
                tracing::debug!("Skipping carousel without data-project");
                continue;
            };
            let slides = scope.iter().filter(|t| t.has_class(SLIDE_CLASS)).count();

            let mut images = Vec::new();
            for img in scope.iter().filter(|t| t.name == "img") {
                let Some(src) = img.data("src") else {
                    tracing::warn!(project, "Slide image without data-src");
                    continue;
                };
                let resolved = resolve_image(self.assets.as_ref(), src).await;
                if resolved.is_none() {
                    tracing::warn!(project, src, "No valid image found");
                }
                images.push(SlideImage {
                    requested: src.to_string(),
                    resolved,
                });
            }

            tracing::debug!(project, slides, images = images.len(), "Carousel ready");
            found.push(Carousel {
                project: project.to_string(),
                images,
                state: CarouselState::new(slides),
                next_due: Instant::now() + self.interval,
            });
        }

        let any = !found.is_empty();
        *self.carousels.write() = found;
        if any {
            self.ensure_ticker();
        }
        Ok(())
    }
}

/// Module entry for `js/modules/carousel.js`.
pub struct CarouselModule {
    feature: Arc<CarouselFeature>,
}

impl CarouselModule {
    pub fn new(feature: Arc<CarouselFeature>) -> Self {
        Self { feature }
    }
}

impl FeatureModule for CarouselModule {
    fn install(&self, registry: &InitializerRegistry) -> FolioResult<()> {
        registry.register(InitializerRole::Carousel, self.feature.clone());
        Ok(())
    }
}

//! Headless banner slideshow shared by the full-size carousel and the mobile preview.
//!
//! A [`Slideshow`] owns the banner list handed to it, a [`Rotation`], and every
//! timer it needs: one autoplay interval, one transition cooldown and one
//! palette sampler for the active video slide. Timers come from a
//! [`TimerHost`] so they can be driven in virtual time.

mod controller;
mod hub;
mod media;
mod timer;
mod view;

pub use controller::*;
pub use hub::*;
pub use media::*;
pub use timer::*;
pub use view::*;

#[cfg(test)]
pub(crate) use timer::manual;

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;

use crate::models::Banner;
use crate::palette::{extract_palette, PaletteCache, PaletteSink, SAMPLE_INTERVAL};

/// Timing and size of one slideshow variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlideshowConfig {
    pub autoplay_interval: Duration,
    pub transition_cooldown: Duration,
    pub sample_interval: Duration,
    pub viewport: Viewport,
}

impl SlideshowConfig {
    /// The dashboard carousel.
    pub fn full_size() -> Self {
        Self {
            autoplay_interval: Duration::from_millis(5000),
            transition_cooldown: Duration::from_millis(1200),
            sample_interval: SAMPLE_INTERVAL,
            viewport: Viewport {
                width: 1280,
                height: 480,
            },
        }
    }

    /// The phone-sized preview shown next to the banner editor.
    pub fn mobile_preview() -> Self {
        Self {
            autoplay_interval: Duration::from_millis(4000),
            transition_cooldown: Duration::from_millis(800),
            sample_interval: SAMPLE_INTERVAL,
            viewport: Viewport {
                width: 320,
                height: 180,
            },
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum TimerKind {
    Autoplay,
    Cooldown,
    Sampler,
}

/// A live timer and the token its callback carries.
///
/// Callbacks compare tokens so a tick that raced with `clear` is ignored.
#[derive(Debug, Clone, Copy)]
struct Armed {
    id: TimerId,
    token: u64,
}

struct State {
    banners: Vec<Banner>,
    rotation: Rotation,
    autoplay: Option<Armed>,
    cooldown: Option<Armed>,
    sampler: Option<Armed>,
    /// Video currently asked to play
    playing_video: Option<String>,
    next_token: u64,
    disposed: bool,
}

impl State {
    fn current_banner(&self) -> Option<&Banner> {
        self.banners.get(self.rotation.current())
    }
}

struct Inner {
    config: SlideshowConfig,
    timers: Arc<dyn TimerHost>,
    cache: Arc<PaletteCache>,
    media: Option<Arc<dyn MediaBackend>>,
    sink: Option<Arc<dyn PaletteSink>>,
    poster_url: String,
    me: Weak<Inner>,
    state: Mutex<State>,
}

/// One slideshow instance. Disposed when dropped.
pub struct Slideshow {
    inner: Arc<Inner>,
}

impl Slideshow {
    pub fn new(
        config: SlideshowConfig,
        timers: Arc<dyn TimerHost>,
        cache: Arc<PaletteCache>,
        media: Option<Arc<dyn MediaBackend>>,
        sink: Option<Arc<dyn PaletteSink>>,
        poster_url: impl Into<String>,
    ) -> Self {
        let poster_url = poster_url.into();
        let inner = Arc::new_cyclic(|me| Inner {
            config,
            timers,
            cache,
            media,
            sink,
            poster_url,
            me: me.clone(),
            state: Mutex::new(State {
                banners: Vec::new(),
                rotation: Rotation::new(0),
                autoplay: None,
                cooldown: None,
                sampler: None,
                playing_video: None,
                next_token: 0,
                disposed: false,
            }),
        });
        Self { inner }
    }

    /// Replace the banner list. Callers pass only eligible banners.
    pub fn set_banners(&self, banners: Vec<Banner>) {
        self.inner.set_banners(banners);
    }

    pub fn advance(&self) -> bool {
        self.inner.navigate(Rotation::advance)
    }

    pub fn retreat(&self) -> bool {
        self.inner.navigate(Rotation::retreat)
    }

    pub fn jump_to(&self, index: usize) -> bool {
        self.inner.navigate(|rotation| rotation.jump_to(index))
    }

    /// Flip play/pause. Returns the new playing flag.
    pub fn toggle_play(&self) -> bool {
        self.inner.toggle_play()
    }

    pub fn set_hovering(&self, hovering: bool) {
        self.inner.set_hovering(hovering);
    }

    /// The media element decoded its first frame; drop the poster from now on.
    /// Whether any banner in the rotation uses `media_url`.
    pub fn shows_media(&self, media_url: &str) -> bool {
        self.inner
            .state
            .lock()
            .banners
            .iter()
            .any(|b| b.media_url == media_url)
    }

    pub fn notify_frame_decoded(&self, media_url: &str) {
        self.inner.cache.mark_known(media_url);
    }

    pub fn view(&self) -> SlideshowView {
        self.inner.view()
    }

    /// Clear every live timer and pause playback. Later calls are no-ops.
    pub fn dispose(&self) {
        self.inner.dispose();
    }
}

impl Drop for Slideshow {
    fn drop(&mut self) {
        self.inner.dispose();
    }
}

impl Inner {
    fn set_banners(&self, banners: Vec<Banner>) {
        let mut st = self.state.lock();
        if st.disposed {
            return;
        }

        let active_before = st.current_banner().map(|b| b.id.clone());
        let ids_changed = st.banners.len() != banners.len()
            || st.banners.iter().zip(&banners).any(|(a, b)| a.id != b.id);

        st.banners = banners;
        let len = st.banners.len();
        st.rotation.reset(len);

        if st.banners.is_empty() {
            if let Some(cooldown) = st.cooldown.take() {
                self.timers.clear(cooldown.id);
            }
            st.rotation.finish_transition();
        }

        let active_after = st.current_banner().map(|b| b.id.clone());
        if active_before != active_after {
            self.deactivate(&mut st);
            if !st.rotation.is_transitioning() {
                self.activate(&mut st);
            }
        }

        if ids_changed {
            if let Some(autoplay) = st.autoplay.take() {
                self.timers.clear(autoplay.id);
            }
        }
        self.supervise_autoplay(&mut st);

        tracing::debug!(
            "Slideshow {}x{} now rotates {} banners",
            self.config.viewport.width,
            self.config.viewport.height,
            len
        );
    }

    fn navigate(&self, step: impl FnOnce(&mut Rotation) -> bool) -> bool {
        let mut st = self.state.lock();
        if st.disposed {
            return false;
        }
        self.navigate_locked(&mut st, step)
    }

    fn navigate_locked(&self, st: &mut State, step: impl FnOnce(&mut Rotation) -> bool) -> bool {
        if !step(&mut st.rotation) {
            return false;
        }

        self.deactivate(st);
        if let Some(stale) = st.cooldown.take() {
            self.timers.clear(stale.id);
        }
        let cooldown = self.schedule(st, TimerKind::Cooldown);
        st.cooldown = Some(cooldown);
        self.supervise_autoplay(st);
        true
    }

    fn toggle_play(&self) -> bool {
        let mut st = self.state.lock();
        let playing = st.rotation.toggle_play();
        if !st.disposed {
            self.supervise_autoplay(&mut st);
        }
        playing
    }

    fn set_hovering(&self, hovering: bool) {
        let mut st = self.state.lock();
        st.rotation.set_hovering(hovering);
        if !st.disposed {
            self.supervise_autoplay(&mut st);
        }
    }

    fn dispose(&self) {
        let mut st = self.state.lock();
        if st.disposed {
            return;
        }
        st.disposed = true;

        self.deactivate(&mut st);
        for armed in [st.autoplay.take(), st.cooldown.take()].into_iter().flatten() {
            self.timers.clear(armed.id);
        }
    }

    /// Keep exactly one autoplay interval while the rotation wants one.
    fn supervise_autoplay(&self, st: &mut State) {
        let wanted = st.rotation.wants_autoplay();
        if wanted && st.autoplay.is_none() {
            let autoplay = self.schedule(st, TimerKind::Autoplay);
            st.autoplay = Some(autoplay);
        } else if !wanted {
            if let Some(autoplay) = st.autoplay.take() {
                self.timers.clear(autoplay.id);
            }
        }
    }

    /// Start the active slide's video and its palette sampler.
    fn activate(&self, st: &mut State) {
        let Some(media) = &self.media else {
            return;
        };
        let Some(banner) = st.current_banner().filter(|b| b.is_video()) else {
            return;
        };
        let url = banner.media_url.clone();

        match media.play(&url) {
            Ok(()) => st.playing_video = Some(url),
            Err(e) => tracing::warn!("Playback of {} rejected: {}", url, e),
        }

        if st.sampler.is_none() {
            let sampler = self.schedule(st, TimerKind::Sampler);
            st.sampler = Some(sampler);
        }
    }

    /// Pause the playing video and stop sampling it.
    fn deactivate(&self, st: &mut State) {
        if let Some(url) = st.playing_video.take() {
            if let Some(media) = &self.media {
                media.pause(&url);
            }
        }
        if let Some(sampler) = st.sampler.take() {
            self.timers.clear(sampler.id);
        }
    }

    fn schedule(&self, st: &mut State, kind: TimerKind) -> Armed {
        st.next_token += 1;
        let token = st.next_token;
        let me = self.me.clone();
        let callback: TimerCallback = Arc::new(move || {
            if let Some(inner) = me.upgrade() {
                inner.fire(kind, token);
            }
        });

        let id = match kind {
            TimerKind::Autoplay => self
                .timers
                .set_interval(self.config.autoplay_interval, callback),
            TimerKind::Cooldown => self
                .timers
                .set_timeout(self.config.transition_cooldown, callback),
            TimerKind::Sampler => self
                .timers
                .set_interval(self.config.sample_interval, callback),
        };
        Armed { id, token }
    }

    fn fire(&self, kind: TimerKind, token: u64) {
        match kind {
            TimerKind::Autoplay => self.on_autoplay(token),
            TimerKind::Cooldown => self.on_cooldown(token),
            TimerKind::Sampler => self.on_sample(token),
        }
    }

    fn on_autoplay(&self, token: u64) {
        let mut st = self.state.lock();
        if st.disposed || st.autoplay.map(|a| a.token) != Some(token) {
            return;
        }
        self.navigate_locked(&mut st, Rotation::advance);
    }

    fn on_cooldown(&self, token: u64) {
        let mut st = self.state.lock();
        if st.disposed || st.cooldown.map(|a| a.token) != Some(token) {
            return;
        }
        if let Some(cooldown) = st.cooldown.take() {
            self.timers.clear(cooldown.id);
        }
        st.rotation.finish_transition();
        self.activate(&mut st);
        self.supervise_autoplay(&mut st);
    }

    fn on_sample(&self, token: u64) {
        let Some(media) = &self.media else {
            return;
        };
        let target = {
            let st = self.state.lock();
            if st.disposed || st.sampler.map(|a| a.token) != Some(token) {
                return;
            }
            st.current_banner()
                .map(|b| (b.id.clone(), b.media_url.clone()))
        };
        let Some((banner_id, media_url)) = target else {
            return;
        };

        let frame = match media.capture_frame(&media_url) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!("Skipping palette sample of {}: {}", media_url, e);
                return;
            }
        };
        self.cache.mark_known(&media_url);

        let palette = extract_palette(&frame);
        if palette.is_empty() {
            return;
        }
        self.cache.insert(&media_url, &palette);

        let changed = {
            let mut st = self.state.lock();
            if st.disposed || st.sampler.map(|a| a.token) != Some(token) {
                return;
            }
            match st.banners.iter_mut().find(|b| b.id == banner_id) {
                Some(banner) if banner.palette() != Some(palette.as_slice()) => {
                    banner.extracted_palette = Some(palette.clone());
                    true
                }
                _ => false,
            }
        };

        if changed {
            tracing::debug!("Palette of banner {} changed", banner_id);
            if let Some(sink) = &self.sink {
                sink.publish(&banner_id, &palette);
            }
        }
    }

    fn view(&self) -> SlideshowView {
        let st = self.state.lock();
        let viewport = self.config.viewport;
        let Some(banner) = st.current_banner() else {
            return SlideshowView::Empty { viewport };
        };

        let palette = banner
            .palette()
            .map(<[_]>::to_vec)
            .or_else(|| self.cache.get(&banner.media_url))
            .unwrap_or_default();
        let loading = banner.is_video() && !self.cache.is_known(&banner.media_url);
        let call_to_action = match (&banner.call_to_action_text, &banner.call_to_action_link) {
            (Some(text), Some(link)) if !text.is_empty() && !link.is_empty() => Some(CallToAction {
                text: text.clone(),
                link: link.clone(),
            }),
            _ => None,
        };

        SlideshowView::Slide(SlideView {
            index: st.rotation.current(),
            total: st.rotation.len(),
            banner_id: banner.id.clone(),
            media_type: banner.media_type,
            media_url: banner.media_url.clone(),
            poster_url: loading.then(|| self.poster_url.clone()),
            loading,
            title: banner.title.clone(),
            description: banner.description.clone(),
            tag: banner.first_tag().map(str::to_string),
            call_to_action,
            overlay_gradient: overlay_gradient(&palette),
            palette,
            playing: st.rotation.is_playing(),
            transitioning: st.rotation.is_transitioning(),
            hovering: st.rotation.is_hovering(),
            viewport,
        })
    }
}

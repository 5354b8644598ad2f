// File: session.rs
// Location: /src/session.rs

use anyhow::Result;
use image::RgbaImage;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::compositor::{self, LogoOverlay};
use crate::config::QrConfig;
use crate::export;
use crate::forms::{self, ValidationErrors};
use crate::logo::{self, LogoError};
use crate::payload::Payload;
use crate::qr::{self, MatrixRenderer, QrCodeRenderer};

/// Quiet period after the last edit before the preview is rebuilt.
pub const RECOMPOSE_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Default)]
pub enum LogoSlot {
    #[default]
    Empty,
    Ready(Arc<RgbaImage>),
    Failed(Arc<LogoError>),
}

/// Ticket for one logo load. Only the most recent ticket may install a
/// logo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogoRequest {
    id: u64,
}

#[derive(Debug)]
pub enum LogoOutcome {
    Applied,
    Failed(Arc<LogoError>),
    Stale,
}

/// One finished recomposite.
#[derive(Debug)]
pub struct Frame {
    pub image: RgbaImage,
    pub generation: u64,
    pub rendered_width: u32,
    pub warning: Option<Arc<LogoError>>,
}

/// Owns the configuration and sequences render -> composite -> export.
pub struct Session<R = QrCodeRenderer> {
    config: QrConfig,
    logo: LogoSlot,
    renderer: R,
    generation: u64,
    logo_requests: u64,
}

impl Session<QrCodeRenderer> {
    pub fn new() -> Self {
        Self::with_renderer(QrCodeRenderer)
    }
}

impl Default for Session<QrCodeRenderer> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: MatrixRenderer> Session<R> {
    pub fn with_renderer(renderer: R) -> Self {
        Self {
            config: QrConfig::default(),
            logo: LogoSlot::Empty,
            renderer,
            generation: 0,
            logo_requests: 0,
        }
    }

    pub fn config(&self) -> &QrConfig {
        &self.config
    }

    pub fn logo(&self) -> &LogoSlot {
        &self.logo
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    fn bump(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Applies one edit and returns the generation that now needs drawing.
    pub fn update(&mut self, change: impl FnOnce(&mut QrConfig)) -> u64 {
        change(&mut self.config);
        self.config.normalize();
        self.bump()
    }

    /// Validates a submitted form and stores its formatted text.
    pub fn apply_payload(&mut self, payload: &Payload) -> Result<u64, ValidationErrors> {
        forms::validate(payload)?;
        let text = payload.to_qr_text();
        log::debug!("Applying {} payload ({} chars)", payload.kind(), text.len());
        Ok(self.update(|config| config.text = text))
    }

    pub fn begin_logo_load(&mut self) -> LogoRequest {
        self.logo_requests += 1;
        LogoRequest {
            id: self.logo_requests,
        }
    }

    pub fn finish_logo_load(
        &mut self,
        request: LogoRequest,
        result: Result<RgbaImage, LogoError>,
    ) -> LogoOutcome {
        if request.id != self.logo_requests {
            log::warn!("Discarding logo load #{} superseded by #{}", request.id, self.logo_requests);
            return LogoOutcome::Stale;
        }

        match result {
            Ok(image) => {
                log::info!("Logo loaded ({}x{})", image.width(), image.height());
                self.logo = LogoSlot::Ready(Arc::new(image));
                self.bump();
                LogoOutcome::Applied
            }
            Err(e) => {
                log::warn!("Failed to load logo: {}", e);
                let e = Arc::new(e);
                self.logo = LogoSlot::Failed(e.clone());
                self.bump();
                LogoOutcome::Failed(e)
            }
        }
    }

    /// Drops the logo and invalidates any load still in flight.
    pub fn clear_logo(&mut self) -> u64 {
        self.logo_requests += 1;
        self.logo = LogoSlot::Empty;
        self.bump()
    }

    /// Renders the current configuration from scratch.
    pub fn render(&self) -> Result<Frame> {
        let config = &self.config;
        let code = self.renderer.render(config)?;
        let background = qr::resolve_color(&config.bg_color, qr::FALLBACK_BG);

        let (overlay, mut warning) = match &self.logo {
            LogoSlot::Empty => (None, None),
            LogoSlot::Ready(image) => (
                Some(LogoOverlay {
                    image: image.as_ref(),
                    size: config.logo_size,
                    opacity: config.logo_opacity,
                    shape: config.logo_shape,
                }),
                None,
            ),
            LogoSlot::Failed(e) => (None, Some(e.clone())),
        };

        let composition = compositor::compose(&code, config.size, background, overlay.as_ref());
        if let Some(e) = composition.warning {
            warning = Some(Arc::new(e));
        }

        Ok(Frame {
            image: composition.image,
            generation: self.generation,
            rendered_width: code.width(),
            warning,
        })
    }

    pub fn export(&self, path: &Path) -> Result<PathBuf> {
        let frame = self.render()?;
        export::save_png(&frame.image, path)
    }
}

/// Loads a logo file and installs it unless a newer load or a clear
/// happened meanwhile.
pub async fn load_logo_into<R: MatrixRenderer>(
    session: &RefCell<Session<R>>,
    path: impl AsRef<Path>,
) -> LogoOutcome {
    let request = session.borrow_mut().begin_logo_load();
    let result = logo::load_logo(path).await;
    session.borrow_mut().finish_logo_load(request, result)
}

/// Waits out `delay`, then renders if `generation` is still the latest.
/// The configuration is read after the wait, never before it.
pub async fn recompose_after<R: MatrixRenderer>(
    session: &RefCell<Session<R>>,
    generation: u64,
    delay: Duration,
) -> Option<Result<Frame>> {
    tokio::time::sleep(delay).await;

    let session = session.borrow();
    if !session.is_current(generation) {
        log::debug!(
            "Skipping recomposite for generation {} (now {})",
            generation,
            session.generation()
        );
        return None;
    }

    Some(session.render())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogoShape;
    use crate::payload::{WebsitePayload, WifiPayload, WifiSecurity};
    use image::Rgba;

    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    /// Returns a solid surface of a fixed width regardless of the request.
    struct FixedRenderer(u32);

    impl MatrixRenderer for FixedRenderer {
        fn render(&self, _config: &QrConfig) -> Result<RgbaImage> {
            Ok(RgbaImage::from_pixel(self.0, self.0, Rgba([0, 0, 0, 255])))
        }
    }

    fn blue_logo() -> RgbaImage {
        RgbaImage::from_pixel(10, 10, BLUE)
    }

    #[test]
    fn test_default_session_renders_with_margin() {
        let session = Session::new();
        let frame = session.render().unwrap();
        assert_eq!(frame.generation, 0);
        assert!(frame.warning.is_none());
        assert_eq!(frame.image.width(), frame.rendered_width + 20);
        assert_eq!(*frame.image.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_update_normalizes_and_bumps_generation() {
        let mut session = Session::new();
        let generation = session.update(|c| {
            c.size = 1000;
            c.logo_opacity = 3.0;
        });
        assert_eq!(generation, 1);
        assert!(session.is_current(1));
        assert_eq!(session.config().size, 512);
        assert_eq!(session.config().logo_opacity, 1.0);

        session.update(|c| c.logo_shape = LogoShape::Circle);
        assert!(!session.is_current(generation));
    }

    #[test]
    fn test_apply_payload_sets_text() {
        let mut session = Session::new();
        let payload = Payload::Wifi(WifiPayload {
            ssid: "MyNet".to_string(),
            password: "secret".to_string(),
            security: WifiSecurity::Wpa,
            hidden: false,
        });
        session.apply_payload(&payload).unwrap();
        assert_eq!(session.config().text, "WIFI:T:WPA;S:MyNet;P:secret;H:false;;");
    }

    #[test]
    fn test_invalid_payload_leaves_state_alone() {
        let mut session = Session::new();
        let payload = Payload::Website(WebsitePayload {
            url: "example.com".to_string(),
        });
        let err = session.apply_payload(&payload).unwrap_err();
        assert!(err.for_field("url").is_some());
        assert_eq!(session.config().text, "https://example.com");
        assert_eq!(session.generation(), 0);
    }

    #[test]
    fn test_stale_logo_load_is_discarded() {
        let mut session = Session::new();
        let first = session.begin_logo_load();
        let second = session.begin_logo_load();

        assert!(matches!(session.finish_logo_load(first, Ok(blue_logo())), LogoOutcome::Stale));
        assert!(matches!(session.logo(), LogoSlot::Empty));
        assert_eq!(session.generation(), 0);

        assert!(matches!(session.finish_logo_load(second, Ok(blue_logo())), LogoOutcome::Applied));
        assert!(matches!(session.logo(), LogoSlot::Ready(_)));
        assert_eq!(session.generation(), 1);
    }

    #[test]
    fn test_clear_cancels_in_flight_load() {
        let mut session = Session::new();
        let request = session.begin_logo_load();
        session.clear_logo();
        assert!(matches!(session.finish_logo_load(request, Ok(blue_logo())), LogoOutcome::Stale));
        assert!(matches!(session.logo(), LogoSlot::Empty));
    }

    #[test]
    fn test_failed_logo_renders_plain_code_with_warning() {
        let mut session = Session::new();
        let plain = session.render().unwrap();

        let request = session.begin_logo_load();
        let err = logo::decode_logo(b"nope").unwrap_err();
        assert!(matches!(session.finish_logo_load(request, Err(err)), LogoOutcome::Failed(_)));

        let frame = session.render().unwrap();
        assert!(frame.warning.is_some());
        assert_eq!(frame.image.as_raw(), plain.image.as_raw());
    }

    #[test]
    fn test_logo_is_composited_at_center() {
        let mut session = Session::new();
        let request = session.begin_logo_load();
        session.finish_logo_load(request, Ok(blue_logo()));

        let frame = session.render().unwrap();
        let mid = frame.image.width() / 2;
        let center = *frame.image.get_pixel(mid, mid);
        assert!(center[2] > 200 && center[0] < 50, "center {center:?}");
    }

    #[test]
    fn test_custom_renderer_width_drives_logo_scale() {
        let mut session = Session::with_renderer(FixedRenderer(128));
        session.update(|c| {
            c.size = 256;
            c.logo_size = 100;
            c.logo_shape = LogoShape::Square;
        });
        let request = session.begin_logo_load();
        session.finish_logo_load(request, Ok(blue_logo()));

        let frame = session.render().unwrap();
        assert_eq!(frame.rendered_width, 128);
        assert_eq!(frame.image.dimensions(), (148, 148));
        assert_eq!(*frame.image.get_pixel(40, 74), Rgba([0, 0, 0, 255]));
        assert_eq!(*frame.image.get_pixel(50, 74), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_unparsed_color_still_renders_a_frame() {
        let mut session = Session::new();
        session.update(|c| {
            c.fg_color = "#zzzzzz".to_string();
            c.bg_color = "rgb(1,2,3)".to_string();
        });

        let frame = session.render().unwrap();
        assert_eq!(*frame.image.get_pixel(0, 0), qr::FALLBACK_BG);
        assert_eq!(*frame.image.get_pixel(compositor::MARGIN, compositor::MARGIN), qr::FALLBACK_FG);
        assert_eq!(session.config().fg_color, "#zzzzzz");
        assert_eq!(session.config().bg_color, "rgb(1,2,3)");
    }

    #[tokio::test]
    async fn test_superseded_recomposite_is_skipped() {
        let session = RefCell::new(Session::new());
        let first = session.borrow_mut().update(|c| c.size = 128);

        let stale = recompose_after(&session, first, Duration::from_millis(30));
        let fresh = async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            let second = session.borrow_mut().update(|c| c.size = 512);
            recompose_after(&session, second, Duration::from_millis(5)).await
        };

        let (stale, fresh) = tokio::join!(stale, fresh);
        assert!(stale.is_none());

        let frame = fresh.expect("latest edit renders").unwrap();
        assert_eq!(frame.generation, 2);
        assert!(frame.rendered_width > 128);
    }

    #[tokio::test]
    async fn test_load_logo_into_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.png");
        export::save_png(&blue_logo(), &path).unwrap();

        let session = RefCell::new(Session::new());
        let outcome = load_logo_into(&session, &path).await;
        assert!(matches!(outcome, LogoOutcome::Applied));
        assert!(matches!(session.borrow().logo(), LogoSlot::Ready(_)));

        let outcome = load_logo_into(&session, dir.path().join("missing.png")).await;
        assert!(matches!(outcome, LogoOutcome::Failed(_)));
        assert!(matches!(session.borrow().logo(), LogoSlot::Failed(_)));
    }

    #[test]
    fn test_export_writes_current_frame() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new();
        let saved = session.export(dir.path()).unwrap();
        assert!(saved.ends_with("qrcode.png"));

        let decoded = image::open(&saved).unwrap();
        assert_eq!(decoded.width(), session.render().unwrap().image.width());
    }
}

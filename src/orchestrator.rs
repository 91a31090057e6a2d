// src/orchestrator.rs
//! Orchestrates the viewer: pulls one notification at a time from the
//! driver and turns it into geometry updates, redraws or shutdown. All
//! windowing-system access goes through the `Driver` trait so the whole
//! state machine runs against a mock in tests.

use crate::{
    backends::{BackendEvent, Driver, KeySymbol, WindowRequest},
    compositor::Compositor,
    config::Config,
    error::Result,
    geometry::WindowGeometry,
    image_loader::ImageLoader,
};

/// Represents the status of the orchestrator after processing an event.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum OrchestratorStatus {
    /// The event was handled and the loop should keep going.
    Running,
    /// Quit was requested. Resources are already released.
    Shutdown,
}

/// Lifecycle of the viewer.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ViewerState {
    /// No window yet.
    Idle,
    /// Window mapped, event loop active.
    Running,
    /// Resources released; no further events are processed.
    Terminated,
}

pub struct AppOrchestrator<'a> {
    driver: &'a mut dyn Driver,
    loader: ImageLoader,
    compositor: Compositor,
    geometry: WindowGeometry,
    state: ViewerState,
    quit_key: KeySymbol,
    window_request: WindowRequest,
}

impl<'a> AppOrchestrator<'a> {
    /// Creates a new `AppOrchestrator` in the `Idle` state.
    ///
    /// Nothing is decoded and no window is opened until the first call to
    /// `process_event_cycle` (or `start`).
    ///
    /// # Arguments
    ///
    /// * `driver`: The backend to draw through. Borrowed for the
    ///   orchestrator's lifetime and cleaned up on shutdown.
    /// * `loader`: Decodes the image file on first draw.
    /// * `config`: Supplies the window title prefix, colors, size hints and
    ///   the quit key.
    ///
    /// # Returns
    ///
    /// A new `AppOrchestrator` instance.
    pub fn new(driver: &'a mut dyn Driver, loader: ImageLoader, config: &Config) -> Self {
        let window_request = WindowRequest {
            title: format!(
                "{} {}",
                config.appearance.title_prefix,
                loader.path().display()
            ),
            background: config.appearance.background,
            min_width: config.window.min_width,
            min_height: config.window.min_height,
            base_width: config.window.base_width,
            base_height: config.window.base_height,
        };
        AppOrchestrator {
            driver,
            loader,
            compositor: Compositor::new(config.appearance.neutral_fill),
            geometry: WindowGeometry::default(),
            state: ViewerState::Idle,
            quit_key: config.keybindings.quit,
            window_request,
        }
    }

    /// Opens and maps the window, seeding geometry from its initial size.
    pub fn start(&mut self) -> Result<()> {
        if self.state != ViewerState::Idle {
            log::warn!("Orchestrator: start() called in state {:?}; ignoring.", self.state);
            return Ok(());
        }
        let (width, height) = self.driver.open_window(&self.window_request)?;
        self.geometry.update(width, height);
        self.state = ViewerState::Running;
        log::info!(
            "Orchestrator: Window '{}' mapped at {}x{}.",
            self.window_request.title,
            width,
            height
        );
        Ok(())
    }

    /// Waits for one notification and handles it to completion.
    pub fn process_event_cycle(&mut self) -> Result<OrchestratorStatus> {
        match self.state {
            ViewerState::Idle => self.start()?,
            ViewerState::Running => {}
            ViewerState::Terminated => return Ok(OrchestratorStatus::Shutdown),
        }

        let event = self.driver.next_event()?;
        log::trace!("Orchestrator: Handling BackendEvent: {:?}", event);
        match event {
            BackendEvent::Expose { count } => {
                log::debug!("Orchestrator: Expose ({} more queued), redrawing.", count);
                self.redraw()?;
            }
            BackendEvent::Resize { width, height } => {
                self.geometry.update(width, height);
            }
            BackendEvent::Key { symbol } if symbol == self.quit_key => {
                log::info!("Orchestrator: Quit key pressed. Signaling shutdown.");
                self.shutdown()?;
                return Ok(OrchestratorStatus::Shutdown);
            }
            BackendEvent::CloseRequested => {
                log::info!("Orchestrator: CloseRequested event received. Signaling shutdown.");
                self.shutdown()?;
                return Ok(OrchestratorStatus::Shutdown);
            }
            BackendEvent::Key { symbol } => {
                if !symbol.is_modifier() {
                    log::trace!("Orchestrator: Ignoring key {:?}.", symbol);
                }
            }
            BackendEvent::ButtonPress { .. } | BackendEvent::Other(_) => {}
        }
        Ok(OrchestratorStatus::Running)
    }

    /// Runs the loop until quit. On error the window is torn down and the
    /// display closed before the error is returned.
    pub fn run(&mut self) -> Result<()> {
        loop {
            match self.process_event_cycle() {
                Ok(OrchestratorStatus::Running) => {}
                Ok(OrchestratorStatus::Shutdown) => return Ok(()),
                Err(e) => {
                    log::debug!("Orchestrator: Stopping on error: {}", e);
                    if let Err(cleanup_err) = self.shutdown() {
                        log::warn!("Orchestrator: Cleanup after error failed: {}", cleanup_err);
                    }
                    return Err(e);
                }
            }
        }
    }

    /// Drops the cached image and releases every driver resource. Idempotent.
    pub fn shutdown(&mut self) -> Result<()> {
        if self.state == ViewerState::Terminated {
            return Ok(());
        }
        self.state = ViewerState::Terminated;
        self.loader.release();
        self.driver.cleanup()
    }

    fn redraw(&mut self) -> Result<()> {
        let image = self.loader.load()?;
        self.compositor
            .draw(&mut *self.driver, image, &self.geometry)?;
        self.driver.flush();
        Ok(())
    }

    pub fn state(&self) -> ViewerState {
        self.state
    }

    pub fn geometry(&self) -> &WindowGeometry {
        &self.geometry
    }

    pub fn is_image_loaded(&self) -> bool {
        self.loader.is_loaded()
    }
}

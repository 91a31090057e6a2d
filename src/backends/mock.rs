// src/backends/mock.rs

//! In-memory driver for tests. Surfaces are plain `0x00RRGGBB` buffers and
//! `copy_area` applies the raster ops bit for bit the way the X server does,
//! so compositing results can be checked pixel-exactly.

use crate::backends::{
    BackendEvent, Drawable, Driver, Rect, RasterOp, SurfaceId, WindowRequest,
};
use crate::error::{Result, ViewerError};
use crate::image_loader::ImageBuffer;
use std::collections::{HashMap, VecDeque};

/// Pixels of a 24-bit drawable only use the low three bytes.
const PIXEL_MASK: u32 = 0x00FF_FFFF;

/// Applies `op` to one pixel pair.
pub fn apply_raster_op(op: RasterOp, src: u32, dst: u32) -> u32 {
    let combined = match op {
        RasterOp::Copy => src,
        RasterOp::And => src & dst,
        RasterOp::AndInverted => !src & dst,
        RasterOp::Or => src | dst,
    };
    combined & PIXEL_MASK
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftSurface {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u32>,
}

impl SoftSurface {
    pub fn filled(width: u32, height: u32, pixel: u32) -> Self {
        SoftSurface {
            width,
            height,
            pixels: vec![pixel; width as usize * height as usize],
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> u32 {
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    /// Copies the `width` x `height` block at `(x, y)` out of the surface.
    pub fn region(&self, x: u32, y: u32, width: u32, height: u32) -> Vec<u32> {
        let mut out = Vec::with_capacity(width as usize * height as usize);
        for row in y..y + height {
            for col in x..x + width {
                out.push(self.pixel(col, row));
            }
        }
        out
    }
}

/// Every call the viewer made, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    OpenWindow(String),
    CreateSurface(SurfaceId, u32, u32),
    PutImage(SurfaceId),
    SetRasterOp(RasterOp),
    CopyArea {
        src: Drawable,
        dst: Drawable,
        area: Rect,
        dst_x: i32,
        dst_y: i32,
        op: RasterOp,
    },
    FreeSurface(SurfaceId),
    Flush,
    Cleanup,
}

pub struct MockDriver {
    events: VecDeque<BackendEvent>,
    calls: Vec<MockCall>,
    screen_size: (u32, u32),
    background: u32,
    window: Option<SoftSurface>,
    surfaces: HashMap<SurfaceId, SoftSurface>,
    next_surface: u64,
    raster_op: RasterOp,
    /// Number of surfaces that can still be created before allocation fails.
    surface_budget: Option<usize>,
    connected: bool,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::with_screen(800, 600)
    }

    pub fn with_screen(width: u32, height: u32) -> Self {
        Self {
            events: VecDeque::new(),
            calls: Vec::new(),
            screen_size: (width, height),
            background: 0,
            window: None,
            surfaces: HashMap::new(),
            next_surface: 1,
            raster_op: RasterOp::Copy,
            surface_budget: None,
            connected: true,
        }
    }

    pub fn push_event(&mut self, event: BackendEvent) {
        self.events.push_back(event);
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    pub fn calls(&self) -> &[MockCall] {
        &self.calls
    }

    pub fn copy_calls(&self) -> Vec<&MockCall> {
        self.calls
            .iter()
            .filter(|call| matches!(call, MockCall::CopyArea { .. }))
            .collect()
    }

    /// Makes surface creation fail once `remaining` more surfaces exist.
    pub fn limit_surfaces(&mut self, remaining: usize) {
        self.surface_budget = Some(remaining);
    }

    pub fn window(&self) -> Option<&SoftSurface> {
        self.window.as_ref()
    }

    pub fn is_window_mapped(&self) -> bool {
        self.window.is_some()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn live_surfaces(&self) -> usize {
        self.surfaces.len()
    }

    fn drawable(&self, drawable: Drawable) -> Result<&SoftSurface> {
        match drawable {
            Drawable::Window => self.window.as_ref(),
            Drawable::Surface(id) => self.surfaces.get(&id),
        }
        .ok_or_else(|| ViewerError::ResourceAllocation(format!("mock drawable {drawable:?}")))
    }

    fn drawable_mut(&mut self, drawable: Drawable) -> Result<&mut SoftSurface> {
        match drawable {
            Drawable::Window => self.window.as_mut(),
            Drawable::Surface(id) => self.surfaces.get_mut(&id),
        }
        .ok_or_else(|| ViewerError::ResourceAllocation(format!("mock drawable {drawable:?}")))
    }
}

impl Driver for MockDriver {
    fn open_window(&mut self, request: &WindowRequest) -> Result<(u32, u32)> {
        let (width, height) = self.screen_size;
        self.background = request.background.to_xrgb();
        self.window = Some(SoftSurface::filled(width, height, self.background));
        self.calls.push(MockCall::OpenWindow(request.title.clone()));
        Ok((width, height))
    }

    fn next_event(&mut self) -> Result<BackendEvent> {
        let event = self
            .events
            .pop_front()
            .expect("MockDriver: event queue exhausted");
        // The server repaints a resized window with its background.
        if let BackendEvent::Resize { width, height } = event {
            if self.window.is_some() {
                self.window = Some(SoftSurface::filled(width, height, self.background));
            }
        }
        Ok(event)
    }

    fn create_surface(&mut self, width: u32, height: u32) -> Result<SurfaceId> {
        if let Some(budget) = self.surface_budget.as_mut() {
            if *budget == 0 {
                return Err(ViewerError::ResourceAllocation("XCreatePixmap".to_string()));
            }
            *budget -= 1;
        }
        let id = SurfaceId(self.next_surface);
        self.next_surface += 1;
        // Fresh pixmaps hold garbage; a distinctive value makes leaks visible.
        self.surfaces
            .insert(id, SoftSurface::filled(width, height, 0x00DE_AD00));
        self.calls.push(MockCall::CreateSurface(id, width, height));
        Ok(id)
    }

    fn put_image(&mut self, surface: SurfaceId, image: &ImageBuffer) -> Result<()> {
        let pixels = image.to_xrgb();
        let (width, height) = (image.width(), image.height());
        let target = self.drawable_mut(Drawable::Surface(surface))?;
        for y in 0..height.min(target.height) {
            for x in 0..width.min(target.width) {
                target.pixels[(y * target.width + x) as usize] = pixels[(y * width + x) as usize];
            }
        }
        self.calls.push(MockCall::PutImage(surface));
        Ok(())
    }

    fn raster_op(&self) -> RasterOp {
        self.raster_op
    }

    fn set_raster_op(&mut self, op: RasterOp) {
        self.raster_op = op;
        self.calls.push(MockCall::SetRasterOp(op));
    }

    fn copy_area(
        &mut self,
        src: Drawable,
        dst: Drawable,
        area: Rect,
        dst_x: i32,
        dst_y: i32,
    ) -> Result<()> {
        let op = self.raster_op;
        let source = self.drawable(src)?.clone();
        let target = self.drawable_mut(dst)?;

        for row in 0..i64::from(area.height) {
            for col in 0..i64::from(area.width) {
                let (sx, sy) = (i64::from(area.x) + col, i64::from(area.y) + row);
                let (dx, dy) = (i64::from(dst_x) + col, i64::from(dst_y) + row);
                let in_source = (0..i64::from(source.width)).contains(&sx)
                    && (0..i64::from(source.height)).contains(&sy);
                let in_target = (0..i64::from(target.width)).contains(&dx)
                    && (0..i64::from(target.height)).contains(&dy);
                if !(in_source && in_target) {
                    continue;
                }
                let s = source.pixels[(sy * i64::from(source.width) + sx) as usize];
                let index = (dy * i64::from(target.width) + dx) as usize;
                target.pixels[index] = apply_raster_op(op, s, target.pixels[index]);
            }
        }

        self.calls.push(MockCall::CopyArea {
            src,
            dst,
            area,
            dst_x,
            dst_y,
            op,
        });
        Ok(())
    }

    fn free_surface(&mut self, surface: SurfaceId) {
        self.surfaces.remove(&surface);
        self.calls.push(MockCall::FreeSurface(surface));
    }

    fn flush(&mut self) {
        self.calls.push(MockCall::Flush);
    }

    fn cleanup(&mut self) -> Result<()> {
        self.surfaces.clear();
        self.window = None;
        self.connected = false;
        self.calls.push(MockCall::Cleanup);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    fn request() -> WindowRequest {
        WindowRequest {
            title: "sip test".to_string(),
            background: Color::BACKGROUND,
            min_width: 300,
            min_height: 200,
            base_width: 400,
            base_height: 250,
        }
    }

    #[test]
    fn raster_ops_follow_the_x_gc_functions() {
        let (src, dst) = (0x00F0_0F0F, 0x00FF_00F0);
        assert_eq!(apply_raster_op(RasterOp::Copy, src, dst), 0x00F0_0F0F);
        assert_eq!(apply_raster_op(RasterOp::And, src, dst), 0x00F0_0000);
        assert_eq!(apply_raster_op(RasterOp::AndInverted, src, dst), 0x000F_00F0);
        assert_eq!(apply_raster_op(RasterOp::Or, src, dst), 0x00FF_0FFF);
    }

    #[test]
    fn copy_area_clips_negative_offsets() {
        let mut driver = MockDriver::with_screen(4, 4);
        driver.open_window(&request()).unwrap();
        let id = driver.create_surface(3, 3).unwrap();
        driver.drawable_mut(Drawable::Surface(id)).unwrap().pixels = vec![7; 9];

        driver
            .copy_area(Drawable::Surface(id), Drawable::Window, Rect::sized(3, 3), -2, -2)
            .unwrap();

        let window = driver.window().unwrap();
        assert_eq!(window.pixel(0, 0), 7);
        assert_eq!(window.pixel(1, 0), Color::BACKGROUND.to_xrgb());
        assert_eq!(window.pixel(0, 1), Color::BACKGROUND.to_xrgb());
    }

    #[test]
    fn surface_budget_turns_into_allocation_errors() {
        let mut driver = MockDriver::new();
        driver.limit_surfaces(1);
        assert!(driver.create_surface(1, 1).is_ok());
        assert!(matches!(
            driver.create_surface(1, 1),
            Err(ViewerError::ResourceAllocation(_))
        ));
    }
}

//! Browser surface backed by the page layout

use glam::Vec2;

use crate::sim::{RenderSurface, ScreenGeometry, Target};

/// Reads rendered geometry from `#target-{id}` elements
pub struct DomSurface {
    document: web_sys::Document,
}

impl DomSurface {
    pub fn new(document: web_sys::Document) -> Self {
        Self { document }
    }

    pub fn element_id(target: &Target) -> String {
        format!("target-{}", target.id)
    }
}

impl RenderSurface for DomSurface {
    fn screen_geometry(&self, target: &Target) -> Option<ScreenGeometry> {
        let element = self.document.get_element_by_id(&Self::element_id(target))?;
        let rect = element.get_bounding_client_rect();
        Some(ScreenGeometry {
            center: Vec2::new(
                (rect.left() + rect.width() / 2.0) as f32,
                (rect.top() + rect.height() / 2.0) as f32,
            ),
            radius: (rect.width() / 2.0) as f32,
        })
    }
}

//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (live targets in spawn order)
//! - Layout is read only through [`RenderSurface`]

pub mod aim;
pub mod session;
pub mod spawner;
pub mod state;
pub mod target;
pub mod tick;

pub use aim::{Aim, CachedGeometry, GeometryCache, Proximity, RenderSurface, ScreenGeometry};
pub use session::{Session, SessionPhase, accuracy};
pub use spawner::Spawner;
pub use state::{GameEvent, GameState};
pub use target::{Direction, Target, TargetId, Viewport};
pub use tick::{TickInput, tick};

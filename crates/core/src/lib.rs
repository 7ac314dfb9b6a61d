//! Core library for the Particle Canvas animation engine.
//!
//! A [`Container`] owns a pool of particles and advances them one frame at a
//! time: movement, pointer interactions, lifetimes, color animation and
//! out-of-bounds handling, followed by drawing onto a [`DrawingSurface`].
//! Shapes, effects, out modes, path generators and updaters are pluggable
//! through the capability traits in [`capability`] and are looked up by key
//! in [`Registries`].

pub mod animation;
pub mod assets;
pub mod capability;
pub mod color;
pub mod config;
pub mod container;
pub mod effects;
pub mod error;
pub mod interaction;
pub mod lifecycle;
pub mod math;
pub mod out_modes;
pub mod particle;
pub mod paths;
pub mod record;
pub mod registry;
pub mod render;
pub mod shapes;
pub mod spatial;
pub mod timeline;
pub mod updaters;

pub use animation::{AnimatedChannel, AnimationStatus, BoundaryPolicy, ChannelAnimation};
pub use assets::{AssetStore, Bitmap, BlankRasterizer};
pub use capability::{
    EffectDrawer, FrameEnv, OutModeManager, ParticleUpdater, PathGenerator, SetupContext,
    ShapeDrawer,
};
pub use config::{EngineConfig, ParticleOptions};
pub use container::{Container, FrameStats};
pub use error::{ParticleError, Result};
pub use lifecycle::{LifeOptions, LifeState, LifeTransition, LifeUpdater};
pub use math::{CanvasSize, RangeValue};
pub use out_modes::{OutMode, OutOfBoundsResolver};
pub use particle::{Particle, ParticleId};
pub use record::{DrawCommand, RecordingSurface};
pub use registry::Registries;
pub use render::{DrawingSurface, FrameRenderer};
pub use spatial::{QuadTree, Rect, Region};
pub use timeline::{ClockSettings, FrameClock, FrameDelta};

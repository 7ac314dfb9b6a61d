use std::{
    any::{Any, TypeId},
    collections::HashMap,
    fmt,
};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{
    color::{Hsl, HslAnimation, Rgb},
    lifecycle::{Life, LifeState},
};

/// Stable identity assigned by the pool at spawn time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticleId(pub usize);

/// Region a particle is expected to stay in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutType {
    /// Rectangular canvas bounds.
    #[default]
    Normal,
    /// Must stay outside the move-center circle.
    Outside,
    /// Must stay inside the move-center circle.
    Inside,
}

/// Point and radius used by the circular out types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MoveCenter {
    pub position: Vec2,
    pub radius: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub width: f32,
    pub opacity: f32,
    pub color: Option<HslAnimation>,
    /// Whether the configured stroke carries an animation.
    pub animated: bool,
}

/// Open set of capability-owned data blobs, one per concrete type.
///
/// Each capability stores its own state type here and is the only writer of
/// it, so one capability cannot clobber another's data.
#[derive(Default)]
pub struct Attachments {
    slots: HashMap<TypeId, Box<dyn Any>>,
}

impl Attachments {
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.slots
            .get(&TypeId::of::<T>())
            .and_then(|slot| slot.downcast_ref())
    }

    pub fn get_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.slots
            .get_mut(&TypeId::of::<T>())
            .and_then(|slot| slot.downcast_mut())
    }

    /// Returns the slot for `T`, creating it with `init` when missing.
    pub fn get_or_insert_with<T: Any>(&mut self, init: impl FnOnce() -> T) -> &mut T {
        self.slots
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(init()))
            .downcast_mut()
            .unwrap_or_else(|| unreachable!("attachment slots are keyed by their own type"))
    }

    pub fn insert<T: Any>(&mut self, value: T) -> Option<T> {
        self.slots
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|old| old.downcast().ok().map(|boxed| *boxed))
    }

    pub fn remove<T: Any>(&mut self) -> Option<T> {
        self.slots
            .remove(&TypeId::of::<T>())
            .and_then(|old| old.downcast().ok().map(|boxed| *boxed))
    }

    pub fn contains<T: Any>(&self) -> bool {
        self.slots.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl fmt::Debug for Attachments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachments")
            .field("slots", &self.slots.len())
            .finish()
    }
}

#[derive(Debug)]
pub struct Particle {
    pub id: ParticleId,
    pub position: Vec2,
    pub initial_position: Vec2,
    /// Unit-ish direction vector; movement scales it by `speed`.
    pub velocity: Vec2,
    /// Surface pixels per 60 fps frame.
    pub speed: f32,
    /// Heading in radians, kept in sync with `velocity` by out modes.
    pub direction: f32,
    pub rotation: f32,
    /// Adds the velocity angle to `rotation` when drawing.
    pub path_rotation: bool,
    pub radius: f32,
    /// Shape offset applied to boundary tests.
    pub offset: Vec2,
    pub opacity: f32,
    pub color: Option<HslAnimation>,
    pub stroke: Option<Stroke>,
    pub life: Option<Life>,
    pub shape: Option<String>,
    pub effect: Option<String>,
    pub shape_close: bool,
    pub shape_fill: bool,
    pub shadow_color: Option<Rgb>,
    /// Set once every capability has run its `particle_init`.
    pub initialized: bool,
    pub destroyed: bool,
    pub spawning: bool,
    pub out_type: OutType,
    pub move_center: MoveCenter,
    pub attachments: Attachments,
}

impl Particle {
    pub fn new(id: ParticleId, position: Vec2) -> Self {
        Self {
            id,
            position,
            initial_position: position,
            velocity: Vec2::ZERO,
            speed: 0.0,
            direction: 0.0,
            rotation: 0.0,
            path_rotation: false,
            radius: 1.0,
            offset: Vec2::ZERO,
            opacity: 1.0,
            color: None,
            stroke: None,
            life: None,
            shape: None,
            effect: None,
            shape_close: true,
            shape_fill: true,
            shadow_color: None,
            initialized: false,
            destroyed: false,
            spawning: false,
            out_type: OutType::Normal,
            move_center: MoveCenter::default(),
            attachments: Attachments::default(),
        }
    }

    /// Radius used for drawing and bounds; negative radii collapse to zero.
    pub fn get_radius(&self) -> f32 {
        self.radius.max(0.0)
    }

    /// Current fill color, if one has been assigned.
    pub fn fill_color(&self) -> Option<Hsl> {
        self.color.as_ref().map(HslAnimation::hsl)
    }

    /// Current stroke color, falling back to the fill color.
    pub fn stroke_color(&self) -> Option<Hsl> {
        self.stroke
            .as_ref()
            .and_then(|stroke| stroke.color.as_ref())
            .map(HslAnimation::hsl)
            .or_else(|| self.fill_color())
    }

    /// Marks the particle destroyed. Destruction is terminal.
    pub fn destroy(&mut self) {
        self.destroyed = true;
        self.spawning = false;
    }

    pub fn life_state(&self) -> LifeState {
        if self.destroyed {
            LifeState::Destroyed
        } else if self.spawning {
            LifeState::Spawning
        } else if !self.initialized {
            LifeState::NotSpawned
        } else {
            LifeState::Alive
        }
    }

    /// Whether per-frame capabilities may touch this particle.
    pub fn is_active(&self) -> bool {
        !self.destroyed && !self.spawning
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Marker(u32);

    #[derive(Debug, PartialEq)]
    struct Other(&'static str);

    #[test]
    fn attachments_are_isolated_by_type() {
        let mut attachments = Attachments::default();
        attachments.insert(Marker(1));
        attachments.insert(Other("x"));

        *attachments.get_or_insert_with(|| Marker(0)) = Marker(5);

        assert_eq!(attachments.get::<Marker>(), Some(&Marker(5)));
        assert_eq!(attachments.get::<Other>(), Some(&Other("x")));
        assert_eq!(attachments.remove::<Marker>(), Some(Marker(5)));
        assert!(!attachments.contains::<Marker>());
        assert_eq!(attachments.len(), 1);
    }

    #[test]
    fn destroy_is_terminal_and_clears_spawning() {
        let mut particle = Particle::new(ParticleId(0), Vec2::ZERO);
        assert_eq!(particle.life_state(), LifeState::NotSpawned);
        particle.initialized = true;
        assert_eq!(particle.life_state(), LifeState::Alive);
        particle.spawning = true;
        assert_eq!(particle.life_state(), LifeState::Spawning);

        particle.destroy();
        assert_eq!(particle.life_state(), LifeState::Destroyed);
        assert!(!particle.is_active());
    }

    #[test]
    fn negative_radius_is_neutral() {
        let mut particle = Particle::new(ParticleId(0), Vec2::ZERO);
        particle.radius = -3.0;
        assert_eq!(particle.get_radius(), 0.0);
    }
}

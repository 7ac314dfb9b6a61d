//! Pointer driven forces.
//!
//! Attract pulls every eligible particle within the attract distance of the
//! pointer towards it. Candidates come from the frame's [`QuadTree`], so the
//! tree must be rebuilt before interactions run.

use glam::Vec2;

use crate::{
    config::AttractOptions,
    math::{clamp, get_distances},
    particle::{Particle, ParticleId},
    spatial::{QuadTree, Region},
};

const MIN_FACTOR: f32 = 1.0;

/// Pointer state fed to interactions by the container.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct PointerState {
    /// Last hover position; `None` once the pointer leaves the canvas.
    pub position: Option<Vec2>,
    pub click_position: Option<Vec2>,
}

/// Per-container bookkeeping of a click attract.
///
/// `count` goes up once per frame while the click is being processed and
/// `finish` latches when it reaches the particle population. After that the
/// set of tracked particles is frozen until the next click.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AttractState {
    pub particles: Vec<ParticleId>,
    pub count: usize,
    pub finish: bool,
    /// `None` until the first click, then whether the button is held.
    pub clicking: Option<bool>,
}

impl AttractState {
    /// Arms a new click: the guard and tracked particles start over.
    pub fn press(&mut self) {
        self.particles.clear();
        self.count = 0;
        self.finish = false;
        self.clicking = Some(true);
    }

    pub fn release(&mut self) {
        self.clicking = Some(false);
    }
}

/// Attract towards the click position while the button is held.
///
/// Returns the ids moved this call.
pub fn click_attract<F>(
    state: &mut AttractState,
    particles: &mut [Particle],
    tree: &QuadTree,
    pointer: &PointerState,
    options: &AttractOptions,
    pixel_ratio: f32,
    is_enabled: F,
) -> Vec<ParticleId>
where
    F: Fn(&Particle) -> bool,
{
    let tracking = !state.finish;
    if tracking {
        state.count += 1;
        if state.count >= particles.len() {
            state.finish = true;
        }
    }

    match state.clicking {
        Some(true) => {
            let Some(position) = pointer.click_position else {
                return Vec::new();
            };
            let moved = process_attract(
                particles,
                tree,
                position,
                options.distance * pixel_ratio,
                options,
                is_enabled,
            );
            if tracking {
                for id in &moved {
                    if !state.particles.contains(id) {
                        state.particles.push(*id);
                    }
                }
            }
            moved
        }
        Some(false) => {
            state.particles.clear();
            Vec::new()
        }
        None => Vec::new(),
    }
}

/// Attract towards the hover position.
pub fn hover_attract<F>(
    particles: &mut [Particle],
    tree: &QuadTree,
    pointer: &PointerState,
    options: &AttractOptions,
    pixel_ratio: f32,
    is_enabled: F,
) -> Vec<ParticleId>
where
    F: Fn(&Particle) -> bool,
{
    let Some(position) = pointer.position else {
        return Vec::new();
    };
    process_attract(
        particles,
        tree,
        position,
        options.distance * pixel_ratio,
        options,
        is_enabled,
    )
}

fn process_attract<F>(
    particles: &mut [Particle],
    tree: &QuadTree,
    position: Vec2,
    radius: f32,
    options: &AttractOptions,
    is_enabled: F,
) -> Vec<ParticleId>
where
    F: Fn(&Particle) -> bool,
{
    if !(radius > 0.0) {
        return Vec::new();
    }

    let candidates = tree.query(&Region::circle(position, radius), |index| {
        particles.get(index).is_some_and(&is_enabled)
    });

    let velocity = options.speed * options.factor;
    let mut moved = Vec::with_capacity(candidates.len());
    for index in candidates {
        let Some(particle) = particles.get_mut(index) else {
            continue;
        };
        let distances = get_distances(particle.position, position);
        let eased = options.easing.apply(1.0 - distances.distance / radius);
        let factor = clamp(eased * velocity, MIN_FACTOR, options.max_speed);

        let pull = if distances.distance == 0.0 {
            Vec2::splat(velocity)
        } else {
            Vec2::new(
                distances.dx / distances.distance * factor,
                distances.dy / distances.distance * factor,
            )
        };
        particle.position -= pull;
        moved.push(particle.id);
    }
    moved
}

//! The frame orchestrator.
//!
//! A [`Container`] owns the particle pool and every capability registry and
//! drives one frame per [`Container::tick`]:
//!
//! 1. advance the clock
//! 2. move particles, steering them with the configured path generator
//! 3. rebuild the quadtree
//! 4. apply pointer interactions
//! 5. step each particle's life
//! 6. run the updaters in registration order
//! 7. resolve out-of-bounds particles
//! 8. render
//! 9. drop destroyed particles from the pool

use std::{collections::HashSet, f32::consts::TAU};

use glam::Vec2;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde_json::Value;

use crate::{
    assets::AssetStore,
    capability::{FrameEnv, SetupContext},
    color::{item_from_single_or_multiple, Hsl},
    config::EngineConfig,
    interaction::{click_attract, hover_attract, AttractState, PointerState},
    lifecycle::{LifeTransition, LifeUpdater},
    math::{from_polar, random_in_range},
    out_modes::OutOfBoundsResolver,
    particle::{MoveCenter, Particle, ParticleId},
    registry::Registries,
    render::{clear, paint_base, DrawingSurface, FrameRenderer},
    spatial::{QuadTree, Rect},
    timeline::{FrameClock, FrameDelta},
    ParticleError, Result,
};

/// Counters describing one frame.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct FrameStats {
    pub frame: u64,
    pub delta: FrameDelta,
    /// Pool size after compaction.
    pub particles: usize,
    pub drawn: usize,
    pub attracted: usize,
    pub respawned: usize,
    pub destroyed: usize,
}

#[derive(Debug)]
pub struct Container {
    config: EngineConfig,
    registries: Registries,
    assets: AssetStore,
    particles: Vec<Particle>,
    next_id: usize,
    tree: QuadTree,
    pointer: PointerState,
    attract: AttractState,
    clock: FrameClock,
    rng: StdRng,
    renderer: FrameRenderer,
    life: LifeUpdater,
    resolver: OutOfBoundsResolver,
    /// Path generator resolved at start, if movement paths are enabled.
    path_key: Option<String>,
    disabled_shapes: HashSet<String>,
    disabled_effects: HashSet<String>,
    started: bool,
    stopped: bool,
}

impl Container {
    pub fn new(config: EngineConfig, registries: Registries, assets: AssetStore) -> Self {
        let mut renderer = FrameRenderer::new(config.pixel_ratio);
        renderer.transform = config.particles.transform.clone();
        renderer.shadow = config.particles.shadow.clone();
        renderer.mask_composite = config
            .background
            .mask
            .then(|| config.background.composite.clone());

        Self {
            tree: QuadTree::new(tree_bounds(&config, [])),
            clock: FrameClock::new(config.clock.clone()),
            rng: StdRng::seed_from_u64(config.seed),
            life: LifeUpdater::new(config.reduce_factor),
            resolver: OutOfBoundsResolver,
            renderer,
            registries,
            assets,
            particles: Vec::new(),
            next_id: 0,
            pointer: PointerState::default(),
            attract: AttractState::default(),
            path_key: None,
            disabled_shapes: HashSet::new(),
            disabled_effects: HashSet::new(),
            started: false,
            stopped: false,
            config,
        }
    }

    /// Container with the bundled capability handlers.
    pub fn with_defaults(config: EngineConfig, assets: AssetStore) -> Result<Self> {
        Ok(Self::new(config, Registries::with_defaults()?, assets))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Registries for adding handlers; registration fails once started.
    pub fn registries_mut(&mut self) -> &mut Registries {
        &mut self.registries
    }

    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn attract(&self) -> &AttractState {
        &self.attract
    }

    pub fn frames(&self) -> u64 {
        self.clock.frames
    }

    pub fn is_running(&self) -> bool {
        self.started && !self.stopped
    }

    /// Merges partial option sources through every capability that accepts
    /// them. Call before [`Container::start`].
    pub fn load_options(&mut self, sources: &[Value]) -> Result<()> {
        self.life.load_options(&mut self.config.particles, sources)?;
        for updater in self.registries.updaters.values_mut() {
            updater.load_options(&mut self.config.particles, sources)?;
        }
        Ok(())
    }

    /// Initialises drawers and the path generator, seals the registries and
    /// spawns the configured number of particles.
    ///
    /// A drawer that fails to initialise is disabled and particles fall back
    /// to drawing nothing for it; the rest of the container carries on.
    pub fn start(&mut self) -> Result<()> {
        if self.started {
            return Ok(());
        }
        let canvas = self.config.canvas;
        if !(canvas.width > 0.0 && canvas.height > 0.0) {
            return Err(ParticleError::ContextUnavailable);
        }

        let Self {
            config,
            registries,
            assets,
            rng,
            path_key,
            disabled_shapes,
            disabled_effects,
            ..
        } = self;

        let mut ctx = SetupContext {
            options: &config.particles,
            canvas,
            pixel_ratio: config.pixel_ratio,
            reduce_factor: config.reduce_factor,
            assets: &mut *assets,
            random_fns: &registries.random_fns,
            rng: &mut *rng,
        };

        for (key, drawer) in registries.shapes.iter_mut() {
            if let Err(err) = drawer.init(&mut ctx) {
                tracing::warn!(shape = %key, %err, "shape drawer disabled");
                disabled_shapes.insert(key.clone());
            }
        }
        for (key, drawer) in registries.effects.iter_mut() {
            if let Err(err) = drawer.init(&mut ctx) {
                tracing::warn!(effect = %key, %err, "effect drawer disabled");
                disabled_effects.insert(key.clone());
            }
        }

        let path = &config.particles.movement.path;
        if path.enable {
            if let Some(key) = path.generator.as_deref() {
                match registries.paths.get_mut(key) {
                    Some(generator) => match generator.init(&mut ctx) {
                        Ok(()) => *path_key = Some(key.to_string()),
                        Err(err) => tracing::warn!(path = key, %err, "path generator disabled"),
                    },
                    None => tracing::debug!(path = key, "no path generator registered"),
                }
            }
        }

        registries.seal();
        self.started = true;

        for _ in 0..self.config.number.value {
            self.spawn(None)?;
        }
        tracing::info!(
            particles = self.particles.len(),
            seed = self.config.seed,
            "container started"
        );
        Ok(())
    }

    /// Adds a particle at `position`, or at a random canvas position.
    ///
    /// When the pool is at `number.limit` the oldest live particle is removed
    /// first.
    pub fn spawn(&mut self, position: Option<Vec2>) -> Result<ParticleId> {
        if !self.is_running() {
            return Err(ParticleError::msg("container is not running"));
        }

        let limit = self.config.number.limit;
        while limit > 0 && self.live_count() >= limit {
            if !self.prune_oldest() {
                break;
            }
        }

        let Self {
            config,
            registries,
            assets,
            particles,
            next_id,
            rng,
            life,
            disabled_shapes,
            disabled_effects,
            ..
        } = self;

        let id = ParticleId(*next_id);
        *next_id += 1;

        let options = &config.particles;
        let canvas = config.canvas;
        let pixel_ratio = config.pixel_ratio;
        let reduce_duplicates = options.reduce_duplicates;

        let position = position.unwrap_or_else(|| {
            Vec2::new(
                random_in_range(rng, 0.0, canvas.width),
                random_in_range(rng, 0.0, canvas.height),
            )
        });
        let mut particle = Particle::new(id, position);
        particle.radius = options.size.pick(rng) * pixel_ratio;
        particle.opacity = options.opacity.pick(rng);
        particle.rotation = options.rotation.pick(rng);

        let movement = &options.movement;
        if movement.enable {
            particle.speed = movement.speed.pick(rng) * pixel_ratio;
            particle.direction = movement
                .direction
                .unwrap_or_else(|| rng.gen::<f32>() * TAU);
            particle.velocity = from_polar(1.0, particle.direction);
        }
        particle.path_rotation = movement.path_rotation;
        if let Some(center) = &movement.center {
            particle.out_type = center.mode;
            particle.move_center = MoveCenter {
                position: Vec2::new(
                    canvas.width * center.x / 100.0,
                    canvas.height * center.y / 100.0,
                ),
                radius: center.radius * pixel_ratio,
            };
        }

        particle.shape =
            item_from_single_or_multiple(&options.shape.kind, id.0, reduce_duplicates, rng)
                .filter(|shape| !disabled_shapes.contains(*shape))
                .cloned();
        particle.shape_close = options.shape.close;
        particle.shape_fill = options.shape.fill;
        particle.effect = options
            .effect
            .as_ref()
            .and_then(|effects| item_from_single_or_multiple(effects, id.0, reduce_duplicates, rng))
            .filter(|effect| !disabled_effects.contains(*effect))
            .cloned();

        if options.shadow.enable {
            particle.shadow_color = options
                .shadow
                .color
                .as_ref()
                .and_then(|color| color.to_hsl(rng))
                .map(Hsl::to_rgb);
        }

        life.init(&mut particle, options.life.as_ref(), rng);

        let mut env = FrameEnv {
            options,
            canvas,
            pixel_ratio,
            reduce_factor: config.reduce_factor,
            rng: &mut *rng,
        };
        for name in &registries.updater_order {
            if let Some(updater) = registries.updaters.get_mut(name.as_str()) {
                if let Err(err) = updater.init(&mut particle, &mut env) {
                    tracing::warn!(updater = %name, id = id.0, %err, "updater init failed");
                }
            }
        }

        let mut ctx = SetupContext {
            options,
            canvas,
            pixel_ratio,
            reduce_factor: config.reduce_factor,
            assets: &mut *assets,
            random_fns: &registries.random_fns,
            rng: &mut *rng,
        };
        if let Some(shape) = particle.shape.clone() {
            if let Some(drawer) = registries.shapes.get_mut(shape.as_str()) {
                if let Err(err) = drawer.particle_init(&mut ctx, &mut particle) {
                    tracing::warn!(%shape, id = id.0, %err, "particle shape unavailable");
                    particle.shape = None;
                }
            }
        }
        if let Some(effect) = particle.effect.clone() {
            if let Some(drawer) = registries.effects.get_mut(effect.as_str()) {
                if let Err(err) = drawer.particle_init(&mut ctx, &mut particle) {
                    tracing::warn!(%effect, id = id.0, %err, "particle effect unavailable");
                    particle.effect = None;
                }
            }
        }

        particle.initialized = true;
        particles.push(particle);
        Ok(id)
    }

    pub fn set_pointer(&mut self, position: Option<Vec2>) {
        self.pointer.position = position;
    }

    pub fn click(&mut self, position: Vec2) {
        self.pointer.click_position = Some(position);
        self.attract.press();
    }

    pub fn release(&mut self) {
        self.attract.release();
    }

    /// Runs one frame and draws it onto `surface`.
    pub fn tick(&mut self, elapsed: f32, surface: &mut dyn DrawingSurface) -> FrameStats {
        let delta = self.clock.advance(elapsed);
        let mut stats = FrameStats {
            frame: self.clock.frames,
            delta,
            particles: self.particles.len(),
            ..FrameStats::default()
        };
        if !self.is_running() {
            return stats;
        }

        let Self {
            config,
            registries,
            particles,
            tree,
            pointer,
            attract,
            rng,
            renderer,
            life,
            resolver,
            path_key,
            ..
        } = self;
        let options = &config.particles;
        let canvas = config.canvas;
        let pixel_ratio = config.pixel_ratio;
        let reduce_factor = config.reduce_factor;
        let path_key = path_key.as_deref();

        if let Some(generator) = path_key.and_then(|key| registries.paths.get_mut(key)) {
            generator.update();
        }
        if options.movement.enable {
            let generator = path_key.and_then(|key| registries.paths.get(key));
            let mut env = FrameEnv {
                options,
                canvas,
                pixel_ratio,
                reduce_factor,
                rng: &mut *rng,
            };
            for particle in particles.iter_mut().filter(|particle| particle.is_active()) {
                let steer = generator.map_or(Vec2::ZERO, |generator| {
                    generator.generate(particle, &delta, &mut env)
                });
                particle.velocity += steer;
                particle.position += particle.velocity * particle.speed * delta.factor;
            }
        }

        let bounds = tree_bounds(
            config,
            particles
                .iter()
                .filter(|particle| particle.is_active())
                .map(|particle| particle.position),
        );
        tree.build(
            bounds,
            particles
                .iter()
                .enumerate()
                .filter(|(_, particle)| particle.is_active())
                .map(|(index, particle)| (index, particle.position)),
        );

        let interactivity = &config.interactivity;
        if interactivity.on_click_attract {
            stats.attracted += click_attract(
                attract,
                particles,
                tree,
                pointer,
                &interactivity.attract,
                pixel_ratio,
                Particle::is_active,
            )
            .len();
        }
        if interactivity.on_hover_attract {
            stats.attracted += hover_attract(
                particles,
                tree,
                pointer,
                &interactivity.attract,
                pixel_ratio,
                Particle::is_active,
            )
            .len();
        }

        for particle in particles.iter_mut().filter(|particle| !particle.destroyed) {
            match life.update(particle, &delta, canvas, options.life.as_ref(), rng) {
                LifeTransition::Respawned => {
                    stats.respawned += 1;
                    reset_path(registries, path_key, particle);
                }
                LifeTransition::Destroyed => {
                    stats.destroyed += 1;
                    teardown(registries, path_key, particle);
                }
                _ => {}
            }
        }

        let mut env = FrameEnv {
            options,
            canvas,
            pixel_ratio,
            reduce_factor,
            rng: &mut *rng,
        };
        for name in &registries.updater_order {
            let Some(updater) = registries.updaters.get_mut(name.as_str()) else {
                continue;
            };
            for particle in particles.iter_mut() {
                if updater.is_enabled(particle) {
                    updater.update(particle, &delta, &mut env);
                }
            }
        }

        for particle in particles.iter_mut().filter(|particle| particle.is_active()) {
            resolver.resolve(particle, &delta, &registries.out_modes, &mut env);
            if particle.destroyed {
                stats.destroyed += 1;
                teardown(registries, path_key, particle);
            }
        }

        clear(surface, canvas);
        if let Some(color) = config.background.color.as_deref() {
            paint_base(surface, canvas, Some(color));
        }
        for particle in particles.iter() {
            if particle.is_active() {
                stats.drawn += 1;
            }
            renderer.draw_particle(
                surface,
                particle,
                &delta,
                &registries.shapes,
                &registries.effects,
            );
        }

        particles.retain(|particle| !particle.destroyed);
        stats.particles = particles.len();
        tracing::trace!(frame = stats.frame, particles = stats.particles, "frame done");
        stats
    }

    /// Destroys every particle and releases drawer resources. Only the first
    /// call has any effect.
    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;

        let path_key = self.path_key.as_deref();
        for particle in self.particles.iter_mut().filter(|particle| !particle.destroyed) {
            particle.destroy();
            teardown(&mut self.registries, path_key, particle);
        }
        self.particles.clear();

        for drawer in self.registries.shapes.values_mut() {
            drawer.destroy();
        }
        for drawer in self.registries.effects.values_mut() {
            drawer.destroy();
        }
        tracing::info!(frames = self.clock.frames, "container stopped");
    }

    fn live_count(&self) -> usize {
        self.particles.iter().filter(|particle| !particle.destroyed).count()
    }

    fn prune_oldest(&mut self) -> bool {
        let Some(index) = self.particles.iter().position(|particle| !particle.destroyed) else {
            return false;
        };
        let mut particle = self.particles.remove(index);
        particle.destroy();
        teardown(&mut self.registries, self.path_key.as_deref(), &mut particle);
        tracing::debug!(id = particle.id.0, "pruned oldest particle");
        true
    }
}

impl Drop for Container {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Quadtree bounds: the canvas grown by the largest particle diameter and
/// stretched over any particle that has left it.
fn tree_bounds<I>(config: &EngineConfig, positions: I) -> Rect
where
    I: IntoIterator<Item = Vec2>,
{
    let margin = config.particles.size.max().max(0.0) * config.pixel_ratio * 2.0;
    Rect::new(
        -margin,
        -margin,
        config.canvas.width + margin * 2.0,
        config.canvas.height + margin * 2.0,
    )
    .covering(positions, 1.0)
}

fn reset_path(registries: &Registries, path_key: Option<&str>, particle: &mut Particle) {
    if let Some(generator) = path_key.and_then(|key| registries.paths.get(key)) {
        generator.reset(particle);
    }
}

/// Lets every capability holding particle data drop it.
fn teardown(registries: &mut Registries, path_key: Option<&str>, particle: &mut Particle) {
    if let Some(shape) = particle.shape.clone() {
        if let Some(drawer) = registries.shapes.get_mut(shape.as_str()) {
            drawer.particle_destroy(particle);
        }
    }
    if let Some(effect) = particle.effect.clone() {
        if let Some(drawer) = registries.effects.get_mut(effect.as_str()) {
            drawer.particle_destroy(particle);
        }
    }
    reset_path(registries, path_key, particle);
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        assets::BlankRasterizer,
        color::OneOrMany,
        lifecycle::{LifeOptions, LifeTiming},
        math::{CanvasSize, RangeValue},
        out_modes::OutMode,
        record::{DrawCommand, RecordingSurface},
    };

    const FRAME: f32 = 1.0 / 60.0;

    fn config(number: usize) -> EngineConfig {
        let mut config = EngineConfig {
            canvas: CanvasSize::new(200.0, 100.0),
            seed: 42,
            ..EngineConfig::default()
        };
        config.number.value = number;
        config
    }

    fn still(mut config: EngineConfig) -> EngineConfig {
        config.particles.movement.enable = false;
        config
    }

    fn container(config: EngineConfig) -> Container {
        Container::with_defaults(config, AssetStore::new()).unwrap()
    }

    fn emoji_config() -> EngineConfig {
        let mut config = config(9);
        config.particles.reduce_duplicates = true;
        config.particles.shape.kind = OneOrMany::One("emoji".to_string());
        config
            .particles
            .shape
            .options
            .insert("emoji".to_string(), json!({ "value": ["a", "b", "c"] }));
        config
    }

    #[test]
    fn start_populates_and_draws_every_particle() {
        let mut container = container(config(25));
        container.start().unwrap();
        assert_eq!(container.particles().len(), 25);

        let mut surface = RecordingSurface::new();
        let stats = container.tick(FRAME, &mut surface);

        let arcs = surface
            .commands()
            .iter()
            .filter(|command| matches!(command, DrawCommand::Arc(_)))
            .count();
        assert_eq!(arcs, 25);
        assert_eq!(stats.drawn, 25);
        assert_eq!(stats.frame, 1);
        assert_eq!(surface.commands()[0], DrawCommand::ClearRect([0.0, 0.0, 200.0, 100.0]));
    }

    #[test]
    fn spawn_requires_a_running_container() {
        let mut container = container(config(0));
        assert!(container.spawn(None).is_err());

        container.start().unwrap();
        assert!(container.spawn(None).is_ok());

        container.stop();
        assert!(container.spawn(None).is_err());
    }

    #[test]
    fn zero_sized_canvas_has_no_context() {
        let mut config = config(1);
        config.canvas = CanvasSize::new(0.0, 100.0);
        let result = container(config).start();
        assert!(matches!(result, Err(ParticleError::ContextUnavailable)));
    }

    #[test]
    fn registration_after_start_is_rejected() {
        let mut container = container(config(0));
        container.start().unwrap();
        let late = container
            .registries_mut()
            .add_effect("late", Box::new(crate::effects::BubbleEffect));
        assert!(matches!(late, Err(ParticleError::RegistrySealed { .. })));
    }

    #[test]
    fn limit_prunes_oldest_particle() {
        let mut config = config(0);
        config.number.limit = 3;
        let mut container = container(config);
        container.start().unwrap();

        for _ in 0..5 {
            container.spawn(None).unwrap();
        }

        let ids: Vec<usize> = container.particles().iter().map(|p| p.id.0).collect();
        assert_eq!(ids, vec![2, 3, 4]);
    }

    #[test]
    fn finite_lives_are_compacted_away() {
        let mut config = still(config(10));
        config.particles.life = Some(LifeOptions {
            count: 1,
            duration: LifeTiming {
                value: RangeValue::Fixed(0.5),
                sync: true,
            },
            ..LifeOptions::default()
        });
        let mut container = container(config);
        container.start().unwrap();
        let mut surface = RecordingSurface::new();

        let mut destroyed = 0;
        for _ in 0..40 {
            destroyed += container.tick(FRAME, &mut surface).destroyed;
        }

        assert_eq!(destroyed, 10);
        assert!(container.particles().is_empty());
    }

    #[test]
    fn destroy_out_mode_removes_particles_outside() {
        let mut config = still(config(0));
        config.particles.movement.out_modes.default = OutMode::Destroy;
        let mut container = container(config);
        container.start().unwrap();
        container.spawn(Some(Vec2::new(-50.0, 50.0))).unwrap();
        container.spawn(Some(Vec2::new(50.0, 50.0))).unwrap();

        let stats = container.tick(FRAME, &mut RecordingSurface::new());

        assert_eq!(stats.destroyed, 1);
        assert_eq!(container.particles().len(), 1);
        assert_eq!(container.particles()[0].id, ParticleId(1));
    }

    #[test]
    fn out_mode_wraps_moving_particles() {
        let mut config = config(0);
        config.particles.movement.direction = Some(0.0);
        config.particles.movement.speed = RangeValue::Fixed(10.0);
        config.particles.movement.warp = true;
        let mut container = container(config);
        container.start().unwrap();
        container.spawn(Some(Vec2::new(199.0, 50.0))).unwrap();

        let mut surface = RecordingSurface::new();
        container.tick(FRAME, &mut surface);

        let particle = &container.particles()[0];
        assert_eq!(particle.position, Vec2::new(-3.0, 50.0));
    }

    #[test]
    fn click_attract_pulls_towards_click() {
        let mut config = still(config(0));
        config.interactivity.on_click_attract = true;
        let mut container = container(config);
        container.start().unwrap();
        container.spawn(Some(Vec2::new(60.0, 50.0))).unwrap();
        let mut surface = RecordingSurface::new();

        container.tick(FRAME, &mut surface);
        assert_eq!(container.particles()[0].position, Vec2::new(60.0, 50.0));

        container.click(Vec2::new(50.0, 50.0));
        let stats = container.tick(FRAME, &mut surface);

        assert_eq!(stats.attracted, 1);
        assert!((container.particles()[0].position.x - 59.0).abs() < 1e-4);
        assert!(container.attract().finish);
    }

    #[test]
    fn hover_attract_reaches_particles_off_canvas() {
        let mut config = still(config(0));
        config.particles.movement.out_modes.default = OutMode::None;
        config.interactivity.on_hover_attract = true;
        let mut container = container(config);
        container.start().unwrap();
        container.spawn(Some(Vec2::new(-30.0, 50.0))).unwrap();
        container.spawn(Some(Vec2::new(900.0, -400.0))).unwrap();
        container.set_pointer(Some(Vec2::new(5.0, 50.0)));

        let stats = container.tick(FRAME, &mut RecordingSurface::new());

        assert_eq!(stats.attracted, 1);
        let pulled = &container.particles()[0];
        assert!(pulled.position.x > -30.0);
        assert_eq!(pulled.position.y, 50.0);
        assert_eq!(container.particles()[1].position, Vec2::new(900.0, -400.0));
    }

    #[test]
    fn same_seed_gives_same_frames() {
        let run = || {
            let mut container = container(config(20));
            container.start().unwrap();
            let mut surface = RecordingSurface::new();
            for _ in 0..10 {
                container.tick(FRAME, &mut surface);
            }
            container
                .particles()
                .iter()
                .map(|particle| particle.position)
                .collect::<Vec<_>>()
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn curves_path_moves_particles() {
        let mut config = config(5);
        config.particles.movement.path.enable = true;
        config.particles.movement.path.generator = Some("curves".to_string());
        let mut container = container(config);
        container.start().unwrap();
        let before: Vec<Vec2> = container.particles().iter().map(|p| p.position).collect();

        container.tick(FRAME, &mut RecordingSurface::new());

        for (particle, start) in container.particles().iter().zip(before) {
            assert_ne!(particle.position, start);
            assert!(particle
                .attachments
                .contains::<crate::paths::CurvesPathState>());
        }
    }

    #[test]
    fn stop_releases_shared_bitmaps_once() {
        let mut assets = AssetStore::with_rasterizer(Box::new(BlankRasterizer));
        assets.register_font("Noto Color Emoji");
        let mut container = Container::with_defaults(emoji_config(), assets).unwrap();
        container.start().unwrap();

        let mut surface = RecordingSurface::new();
        container.tick(FRAME, &mut surface);
        let images = surface
            .commands()
            .iter()
            .filter(|command| matches!(command, DrawCommand::DrawImage { .. }))
            .count();
        assert_eq!(images, 9);

        container.stop();
        container.stop();
        assert_eq!(container.assets().released_bitmaps(), 3);
        assert!(container.particles().is_empty());
    }

    #[test]
    fn missing_font_disables_emoji_only() {
        let mut config = emoji_config();
        config.particles.shape.kind =
            OneOrMany::Many(vec!["emoji".to_string(), "circle".to_string()]);
        let assets = AssetStore::with_rasterizer(Box::new(BlankRasterizer));
        let mut container = Container::with_defaults(config, assets).unwrap();

        container.start().unwrap();

        assert!(container
            .particles()
            .iter()
            .all(|particle| particle.shape.as_deref() != Some("emoji")));
        assert!(container
            .particles()
            .iter()
            .any(|particle| particle.shape.as_deref() == Some("circle")));
    }

    #[test]
    fn load_options_merges_life_sources() {
        let mut container = container(config(0));
        container
            .load_options(&[
                json!({ "life": { "count": 2 } }),
                json!({ "life": { "duration": { "value": 3 } } }),
            ])
            .unwrap();

        let life = container.config().particles.life.as_ref().unwrap();
        assert_eq!(life.count, 2);
        assert_eq!(life.duration.value, RangeValue::Fixed(3.0));
    }
}

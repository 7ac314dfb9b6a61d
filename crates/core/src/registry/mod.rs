use std::{borrow::Borrow, collections::HashMap, fmt, hash::Hash};

use crate::{
    capability::{EffectDrawer, OutModeManager, ParticleUpdater, PathGenerator, ShapeDrawer},
    effects::BubbleEffect,
    out_modes::{BounceOutMode, DestroyOutMode, NoneOutMode, OutMode, OutOutMode},
    paths::{CurvesPathGenerator, RandomFnRegistry, CURVES_PATH_KEY},
    shapes::{CircleDrawer, EmojiDrawer, SquareDrawer},
    updaters::{ColorUpdater, StrokeColorUpdater},
    ParticleError, Result,
};

/// Keyed table of capability handlers.
///
/// Populated during setup and sealed when the simulation starts; after that
/// only lookups are possible. A missing key is not an error, callers treat it
/// as nothing to do.
pub struct CapabilityRegistry<K, V: ?Sized> {
    name: &'static str,
    handlers: HashMap<K, Box<V>>,
    sealed: bool,
}

impl<K, V> CapabilityRegistry<K, V>
where
    K: Eq + Hash + fmt::Debug,
    V: ?Sized,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            handlers: HashMap::new(),
            sealed: false,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Registers `handler` under `key`; at most one handler per key.
    pub fn register(&mut self, key: K, handler: Box<V>) -> Result<()> {
        if self.sealed {
            return Err(ParticleError::RegistrySealed {
                registry: self.name,
            });
        }
        if self.handlers.contains_key(&key) {
            return Err(ParticleError::DuplicateCapability {
                registry: self.name,
                key: format!("{key:?}"),
            });
        }
        tracing::debug!(registry = self.name, key = ?key, "capability registered");
        self.handlers.insert(key, handler);
        Ok(())
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.handlers.get(key).map(|handler| &**handler)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.handlers.get_mut(key).map(|handler| &mut **handler)
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.handlers.contains_key(key)
    }

    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.handlers.keys()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.handlers.values_mut().map(|handler| &mut **handler)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&K, &mut V)> {
        self.handlers
            .iter_mut()
            .map(|(key, handler)| (key, &mut **handler))
    }
}

impl<K: fmt::Debug, V: ?Sized> fmt::Debug for CapabilityRegistry<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("name", &self.name)
            .field("keys", &self.handlers.keys().collect::<Vec<_>>())
            .field("sealed", &self.sealed)
            .finish()
    }
}

pub type ShapeRegistry = CapabilityRegistry<String, dyn ShapeDrawer>;
pub type EffectRegistry = CapabilityRegistry<String, dyn EffectDrawer>;
pub type OutModeRegistry = CapabilityRegistry<OutMode, dyn OutModeManager>;
pub type PathRegistry = CapabilityRegistry<String, dyn PathGenerator>;
pub type UpdaterRegistry = CapabilityRegistry<String, dyn ParticleUpdater>;

/// Every registry a container consults, plus the ordered updater list.
#[derive(Debug)]
pub struct Registries {
    pub shapes: ShapeRegistry,
    pub effects: EffectRegistry,
    pub out_modes: OutModeRegistry,
    pub paths: PathRegistry,
    pub updaters: UpdaterRegistry,
    /// Order in which updaters run each frame.
    pub updater_order: Vec<String>,
    pub random_fns: RandomFnRegistry,
}

impl Registries {
    pub fn empty() -> Self {
        Self {
            shapes: CapabilityRegistry::new("shape drawers"),
            effects: CapabilityRegistry::new("effect drawers"),
            out_modes: CapabilityRegistry::new("out mode managers"),
            paths: CapabilityRegistry::new("path generators"),
            updaters: CapabilityRegistry::new("particle updaters"),
            updater_order: Vec::new(),
            random_fns: RandomFnRegistry::with_builtins(),
        }
    }

    /// Registries preloaded with the bundled handlers.
    pub fn with_defaults() -> Result<Self> {
        let mut registries = Self::empty();

        registries.add_shape("circle", Box::new(CircleDrawer))?;
        registries.add_shape("square", Box::new(SquareDrawer))?;
        registries.add_shape("emoji", Box::new(EmojiDrawer::new()))?;
        registries.add_effect("bubble", Box::new(BubbleEffect))?;

        registries.add_out_mode(OutMode::Out, Box::new(OutOutMode::new()))?;
        registries.add_out_mode(OutMode::Bounce, Box::new(BounceOutMode::new()))?;
        registries.add_out_mode(OutMode::Split, Box::new(BounceOutMode::new()))?;
        registries.add_out_mode(OutMode::Destroy, Box::new(DestroyOutMode::new()))?;
        registries.add_out_mode(OutMode::None, Box::new(NoneOutMode::new()))?;

        registries.add_path(CURVES_PATH_KEY, Box::new(CurvesPathGenerator::new()))?;

        registries.add_updater(Box::new(ColorUpdater))?;
        registries.add_updater(Box::new(StrokeColorUpdater))?;

        Ok(registries)
    }

    pub fn add_shape(&mut self, key: impl Into<String>, drawer: Box<dyn ShapeDrawer>) -> Result<()> {
        self.shapes.register(key.into(), drawer)
    }

    pub fn add_effect(&mut self, key: impl Into<String>, drawer: Box<dyn EffectDrawer>) -> Result<()> {
        self.effects.register(key.into(), drawer)
    }

    pub fn add_out_mode(&mut self, mode: OutMode, manager: Box<dyn OutModeManager>) -> Result<()> {
        self.out_modes.register(mode, manager)
    }

    pub fn add_path(&mut self, key: impl Into<String>, generator: Box<dyn PathGenerator>) -> Result<()> {
        self.paths.register(key.into(), generator)
    }

    /// Appends an updater; updaters run in registration order.
    pub fn add_updater(&mut self, updater: Box<dyn ParticleUpdater>) -> Result<()> {
        let name = updater.name().to_string();
        self.updaters.register(name.clone(), updater)?;
        self.updater_order.push(name);
        Ok(())
    }

    pub fn seal(&mut self) {
        self.shapes.seal();
        self.effects.seal();
        self.out_modes.seal();
        self.paths.seal();
        self.updaters.seal();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter {
        fn greet(&self) -> String;
    }

    struct Hello(&'static str);

    impl Greeter for Hello {
        fn greet(&self) -> String {
            format!("hello {}", self.0)
        }
    }

    #[test]
    fn looks_up_by_borrowed_key() {
        let mut registry: CapabilityRegistry<String, dyn Greeter> = CapabilityRegistry::new("greeters");
        registry.register("a".to_string(), Box::new(Hello("a"))).unwrap();

        assert_eq!(registry.get("a").map(|g| g.greet()), Some("hello a".to_string()));
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn rejects_duplicates_and_sealed_registration() {
        let mut registry: CapabilityRegistry<String, dyn Greeter> = CapabilityRegistry::new("greeters");
        registry.register("a".to_string(), Box::new(Hello("a"))).unwrap();

        let duplicate = registry.register("a".to_string(), Box::new(Hello("b")));
        assert!(matches!(duplicate, Err(ParticleError::DuplicateCapability { .. })));

        registry.seal();
        let late = registry.register("c".to_string(), Box::new(Hello("c")));
        assert!(matches!(late, Err(ParticleError::RegistrySealed { .. })));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn defaults_cover_every_out_mode() {
        let registries = Registries::with_defaults().unwrap();
        for mode in [
            OutMode::Out,
            OutMode::Bounce,
            OutMode::Split,
            OutMode::Destroy,
            OutMode::None,
        ] {
            let manager = registries.out_modes.get(&mode).unwrap();
            assert!(manager.handles(mode));
        }
        assert_eq!(registries.updater_order, ["color", "stroke-color"]);
    }
}

//! Per-frame color updaters.

use crate::{
    capability::{FrameEnv, ParticleUpdater},
    color::{item_from_single_or_multiple, range_color_to_hsl, HslAnimation},
    particle::{Particle, Stroke},
    timeline::FrameDelta,
    Result,
};

/// Animates the fill color.
#[derive(Debug, Default, Clone, Copy)]
pub struct ColorUpdater;

impl ParticleUpdater for ColorUpdater {
    fn name(&self) -> &str {
        "color"
    }

    fn init(&mut self, particle: &mut Particle, env: &mut FrameEnv<'_>) -> Result<()> {
        let options = &env.options.color;
        let hsl = range_color_to_hsl(
            &options.value,
            particle.id.0,
            env.options.reduce_duplicates,
            env.rng,
        );

        if let Some(hsl) = hsl {
            particle.color = Some(HslAnimation::from_hsl(
                hsl,
                Some(&options.animation),
                env.reduce_factor,
                env.rng,
            ));
        }
        Ok(())
    }

    fn is_enabled(&self, particle: &Particle) -> bool {
        particle.is_active() && particle.color.as_ref().is_some_and(HslAnimation::any_enabled)
    }

    fn update(&mut self, particle: &mut Particle, delta: &FrameDelta, env: &mut FrameEnv<'_>) {
        if let Some(color) = particle.color.as_mut() {
            color.update(delta, env.rng);
        }
    }
}

/// Sets stroke width and opacity and animates the stroke color. Without a
/// configured stroke color the fill color is copied at init.
#[derive(Debug, Default, Clone, Copy)]
pub struct StrokeColorUpdater;

impl ParticleUpdater for StrokeColorUpdater {
    fn name(&self) -> &str {
        "stroke-color"
    }

    fn init(&mut self, particle: &mut Particle, env: &mut FrameEnv<'_>) -> Result<()> {
        let reduce_duplicates = env.options.reduce_duplicates;
        let Some(stroke) = item_from_single_or_multiple(
            &env.options.stroke,
            particle.id.0,
            reduce_duplicates,
            env.rng,
        ) else {
            return Ok(());
        };

        let width = stroke.width.pick(env.rng) * env.pixel_ratio;
        let opacity = stroke.opacity.map_or(1.0, |opacity| opacity.pick(env.rng));
        let animation = stroke.color.as_ref().map(|color| &color.animation);

        let hsl = stroke
            .color
            .as_ref()
            .and_then(|color| {
                range_color_to_hsl(&color.value, particle.id.0, reduce_duplicates, env.rng)
            })
            .or_else(|| particle.fill_color());
        let color = hsl.map(|hsl| HslAnimation::from_hsl(hsl, animation, env.reduce_factor, env.rng));

        particle.stroke = Some(Stroke {
            width,
            opacity,
            color,
            animated: animation.is_some(),
        });
        Ok(())
    }

    fn is_enabled(&self, particle: &Particle) -> bool {
        particle.is_active()
            && particle.stroke.as_ref().is_some_and(|stroke| {
                stroke.animated && stroke.color.as_ref().is_some_and(HslAnimation::any_enabled)
            })
    }

    fn update(&mut self, particle: &mut Particle, delta: &FrameDelta, env: &mut FrameEnv<'_>) {
        if let Some(color) = particle.stroke.as_mut().and_then(|stroke| stroke.color.as_mut()) {
            color.update(delta, env.rng);
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;
    use rand::{rngs::StdRng, SeedableRng};
    use serde_json::json;

    use super::*;
    use crate::{
        color::{ColorOptions, Hsl, OneOrMany},
        config::{ParticleOptions, StrokeOptions},
        math::{CanvasSize, RangeValue},
        particle::ParticleId,
    };

    fn env<'a>(options: &'a ParticleOptions, rng: &'a mut StdRng) -> FrameEnv<'a> {
        FrameEnv {
            options,
            canvas: CanvasSize::default(),
            pixel_ratio: 2.0,
            reduce_factor: 1.0,
            rng,
        }
    }

    fn palette_options() -> ParticleOptions {
        let mut options = ParticleOptions::default();
        options.reduce_duplicates = true;
        options.color = serde_json::from_value(json!({
            "value": ["#ff0000", "#00ff00", "#0000ff"]
        }))
        .unwrap();
        options.stroke = OneOrMany::One(StrokeOptions {
            width: RangeValue::Fixed(1.5),
            opacity: Some(RangeValue::Fixed(0.4)),
            color: None,
        });
        options
    }

    fn init_both(options: &ParticleOptions, id: usize, seed: u64) -> Particle {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut particle = Particle::new(ParticleId(id), Vec2::ZERO);
        ColorUpdater.init(&mut particle, &mut env(options, &mut rng)).unwrap();
        StrokeColorUpdater.init(&mut particle, &mut env(options, &mut rng)).unwrap();
        particle
    }

    #[test]
    fn stroke_falls_back_to_fill_deterministically() {
        let options = palette_options();

        for id in 0..6 {
            let a = init_both(&options, id, 1);
            let b = init_both(&options, id, 777);

            assert_eq!(a.stroke_color(), b.stroke_color());
            assert_eq!(a.stroke_color(), a.fill_color());
        }

        let green = init_both(&options, 4, 5).fill_color().unwrap();
        assert!((green.h - 120.0).abs() < 1e-3);
    }

    #[test]
    fn stroke_width_scales_with_pixel_ratio() {
        let options = palette_options();
        let particle = init_both(&options, 0, 1);
        let stroke = particle.stroke.unwrap();

        assert_eq!(stroke.width, 3.0);
        assert_eq!(stroke.opacity, 0.4);
        assert!(!stroke.animated);
    }

    #[test]
    fn configured_stroke_color_wins_over_fill() {
        let mut options = palette_options();
        options.stroke = OneOrMany::One(StrokeOptions {
            width: RangeValue::Fixed(1.0),
            opacity: None,
            color: Some(ColorOptions {
                value: OneOrMany::One(crate::color::ColorSpec::Hsl(Hsl {
                    h: 200.0,
                    s: 50.0,
                    l: 50.0,
                })),
                ..Default::default()
            }),
        });

        let particle = init_both(&options, 0, 1);
        assert_eq!(particle.stroke_color().map(|c| c.h), Some(200.0));
        assert_eq!(particle.stroke.as_ref().map(|s| s.opacity), Some(1.0));
    }

    #[test]
    fn disabled_without_animation_and_while_spawning() {
        let mut options = palette_options();
        let mut particle = init_both(&options, 0, 1);
        assert!(!ColorUpdater.is_enabled(&particle));

        options.color.animation.h.enable = true;
        options.color.animation.h.speed = RangeValue::Fixed(30.0);
        particle = init_both(&options, 0, 1);
        assert!(ColorUpdater.is_enabled(&particle));

        particle.spawning = true;
        assert!(!ColorUpdater.is_enabled(&particle));
        particle.spawning = false;
        particle.destroy();
        assert!(!ColorUpdater.is_enabled(&particle));
    }

    #[test]
    fn color_update_advances_hue() {
        let mut options = palette_options();
        options.color.animation.h.enable = true;
        options.color.animation.h.speed = RangeValue::Fixed(60.0);
        let mut particle = init_both(&options, 0, 1);
        let mut rng = StdRng::seed_from_u64(2);

        let mut updater = ColorUpdater;
        updater.update(
            &mut particle,
            &crate::timeline::FrameDelta::from_seconds(0.5),
            &mut env(&options, &mut rng),
        );

        let hue = particle.fill_color().unwrap().h;
        assert!((hue - 30.0).abs() < 1e-3, "{hue}");
    }
}

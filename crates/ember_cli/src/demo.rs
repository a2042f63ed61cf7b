//! The built-in demo scene.

use anyhow::{Context, Result};
use ember_core::{
    AmbientOcclusion, AxisBox, Background, CameraDef, CheckerTexture, ClipGroup, Cone,
    DirectionalLight, FiniteCylinder, Gradient, ImageCache, ImageTexture, Mapping, Material,
    PhongType, Plane, PointLight, RenderOptions, Ring, Scene, Sphere, SpotLight,
};
use ember_math::{Color, Vec3, Vec4};
use std::sync::Arc;

/// Per-scene knobs that live on the camera or environment rather than in
/// [`RenderOptions`].
#[derive(Debug, Clone, Default)]
pub struct DemoSettings {
    pub aa_samples: Option<u32>,
    pub ao_samples: Option<u32>,
    pub max_depth: Option<u32>,
    pub texture: Option<String>,
}

/// Checkered floor, a few spheres of different materials, a clipped
/// sphere, a box, a ring, a cylinder and a cone under three lights.
pub fn build(options: &RenderOptions, settings: &DemoSettings, images: &mut ImageCache) -> Result<Scene> {
    let mut scene = Scene::with_options(options.clone());

    let mut camera = CameraDef::new().looking_at(
        Vec3::new(0.0, 2.0, -7.0),
        Vec3::new(0.0, 0.5, 0.0),
        Vec3::Y,
    );
    if let Some(samples) = settings.aa_samples {
        camera = camera.with_antialiasing(samples);
    }
    if let Some(depth) = settings.max_depth {
        camera = camera.with_max_depth(depth);
    }
    scene.camera = camera;

    scene.background = Background::SkySphere(Gradient {
        up: Vec3::Y,
        top_value: 1.0,
        bottom_value: 0.0,
        top_color: Color::new(0.2, 0.35, 0.7),
        bottom_color: Color::new(0.8, 0.85, 0.9),
    });
    if let Some(samples) = settings.ao_samples {
        scene.ambient_occlusion = AmbientOcclusion {
            samples,
            color: Color::splat(0.3),
        };
    }

    let floor = Material::textured(Arc::new(CheckerTexture::new(
        Color::splat(0.9),
        Color::splat(0.2),
        1.0,
    )))
    .with_specular(0.1);
    scene.add_object(Plane::new(Vec3::new(0.0, -1.0, 0.0), Vec3::Y), Arc::new(floor));

    let center = match &settings.texture {
        Some(path) => {
            let image = images
                .load(path)
                .with_context(|| format!("Failed to load texture {path}"))?;
            Material::textured(Arc::new(ImageTexture::new(
                image,
                Mapping::Spherical,
                Vec3::ZERO,
            )))
        }
        None => Material::new(Color::new(0.8, 0.2, 0.15)),
    }
    .with_specular(0.3)
    .with_phong(0.6, 40.0, PhongType::Plastic);
    scene.add_object(Sphere::new(Vec3::ZERO, 1.0), Arc::new(center));

    let glass = Material::new(Color::new(0.7, 0.9, 1.0))
        .with_opacity(0.35)
        .with_specular(0.1)
        .with_phong(0.8, 80.0, PhongType::Plastic);
    scene.add_object(Sphere::new(Vec3::new(-2.2, -0.3, -0.8), 0.7), Arc::new(glass));

    let metal = Material::new(Color::new(0.9, 0.75, 0.3))
        .with_specular(0.6)
        .with_phong(0.5, 30.0, PhongType::Metal);
    scene.add_object(Sphere::new(Vec3::new(2.2, -0.3, -0.6), 0.7), Arc::new(metal));

    // Front half clipped away
    let clip = Arc::new(ClipGroup::new(vec![Vec4::new(0.0, 0.0, -1.0, -2.2)]));
    let shell = Material::new(Color::new(0.3, 0.8, 0.4)).with_outline(0.6, 0.4);
    scene.add_clipped_object(
        Sphere::new(Vec3::new(0.0, -0.4, 2.2), 0.6),
        Arc::new(shell),
        clip,
    );

    scene.add_object(
        AxisBox::new(Vec3::new(-3.2, -1.0, 1.5), Vec3::new(-2.4, -0.2, 2.3)),
        Arc::new(Material::new(Color::new(0.5, 0.4, 0.8))),
    );
    scene.add_object(
        Ring::new(Vec3::new(0.0, -0.99, 0.0), Vec3::Y, 1.3, 1.6),
        Arc::new(Material::new(Color::new(0.95, 0.95, 0.2))),
    );
    scene.add_object(
        FiniteCylinder::new(Vec3::new(3.0, -1.0, 2.0), Vec3::new(0.0, 1.6, 0.0), 0.3),
        Arc::new(Material::new(Color::new(0.2, 0.6, 0.9)).with_specular(0.2)),
    );

    // Cone standing on the floor, closed by a disc
    let cone = Arc::new(Material::new(Color::new(0.9, 0.5, 0.1)).with_specular(0.2));
    scene.add_object(
        Cone::new(Vec3::new(1.2, 0.4, 2.4), Vec3::new(0.0, -1.4, 0.0), 0.5),
        cone.clone(),
    );
    scene.add_object(
        Ring::new(Vec3::new(1.2, -0.999, 2.4), -Vec3::Y, 0.0, 0.5),
        cone,
    );

    scene.add_light(DirectionalLight::new(Vec3::new(-0.4, -1.0, 0.6), Color::splat(0.5)));
    scene.add_light(
        PointLight::new(Vec3::new(3.0, 4.0, -3.0), 0.1, Color::splat(0.8))
            .with_attenuation(1.0, 0.05, 0.0),
    );
    scene.add_light(SpotLight::new(
        PointLight::new(Vec3::new(-2.0, 3.0, -2.0), 0.0, Color::new(0.4, 0.4, 0.6)),
        Vec3::new(2.0, -3.0, 2.0),
        0.3,
        0.6,
    ));

    log::debug!(
        "Demo scene: {} objects, {} lights",
        scene.object_count(),
        scene.lights().len()
    );
    Ok(scene)
}

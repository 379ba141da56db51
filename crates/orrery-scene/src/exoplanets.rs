//! Maps exoplanet records to a point cloud around the star.
//!
//! Orbital distance sets the ring radius, mass sets the hue and lightness,
//! and planet radius sets the sprite size. The angle around the star is
//! random since the archive carries no orbital phase.

use std::f32::consts::TAU;
use std::sync::Arc;

use glam::Vec3;
use orrery_data::ExoplanetRecord;
use rand::Rng;

use crate::arena::{EntityId, EntityKind, SceneArena, Transform};
use crate::color::hsl_to_linear;
use crate::geometry::PointCloud;
use crate::material::{Blending, Drawable, Geometry, Material, MaterialKind};

pub const MAX_CLOUD_POINTS: usize = 2000;
/// Scene units per AU.
pub const AU_SCALE: f32 = 38.0;
pub const MIN_AU: f32 = 0.02;
pub const SIZE_MULTIPLIER: f32 = 6.0;

/// Visual attributes of one record, before the random angle is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointStyle {
    pub radius: f32,
    pub color: Vec3,
    pub size: f32,
}

pub fn point_style(record: &ExoplanetRecord) -> PointStyle {
    let au = (record.semi_major_axis().unwrap_or(1.0) as f32).max(MIN_AU);
    let mass = (record.mass().unwrap_or(1.0) as f32).max(0.1);
    let norm = (mass / 500.0).min(1.0);
    PointStyle {
        radius: au * AU_SCALE,
        color: hsl_to_linear(0.62 - 0.5 * norm, 0.75, 0.55 + 0.1 * norm),
        size: (record.radius().unwrap_or(1.0) as f32 * 0.4).max(0.5),
    }
}

/// Point attributes for the first [`MAX_CLOUD_POINTS`] records, in order.
pub fn map_records(records: &[ExoplanetRecord], rng: &mut impl Rng) -> PointCloud {
    let count = records.len().min(MAX_CLOUD_POINTS);
    let mut cloud = PointCloud {
        positions: Vec::with_capacity(count),
        colors: Vec::with_capacity(count),
        sizes: Vec::with_capacity(count),
    };
    for record in &records[..count] {
        let style = point_style(record);
        let angle = rng.random::<f32>() * TAU;
        let height = (rng.random::<f32>() - 0.5) * style.radius * 0.1;
        cloud.positions.push(Vec3::new(
            angle.cos() * style.radius,
            height,
            angle.sin() * style.radius,
        ));
        cloud.colors.push(style.color);
        cloud.sizes.push(style.size);
    }
    cloud
}

/// Point sprite size in pixels at view-space depth `view_z` (negative in front of the camera).
pub fn point_size_pixels(size: f32, size_multiplier: f32, view_z: f32) -> f32 {
    (size * size_multiplier * (300.0 / -view_z)).max(1.0)
}

/// Replace the cloud held in `current`.
///
/// The old cloud is always despawned. `None` or an empty slice leaves no cloud.
pub fn populate_cloud(
    arena: &mut SceneArena,
    current: &mut Option<EntityId>,
    records: Option<&[ExoplanetRecord]>,
    rng: &mut impl Rng,
    visible: bool,
) {
    if let Some(old) = current.take() {
        arena.despawn(old);
    }
    let Some(records) = records.filter(|r| !r.is_empty()) else {
        return;
    };

    let cloud = map_records(records, rng);
    let material = Material::opaque(MaterialKind::Points {
        size_multiplier: SIZE_MULTIPLIER,
    })
    .with_blending(Blending::Additive)
    .without_depth_write();
    let id = arena.spawn(
        "exoplanets",
        EntityKind::Points,
        None,
        Transform::default(),
        Some(Drawable::new(Geometry::Points(Arc::new(cloud)), material)),
    );
    arena.set_visible(id, visible);
    *current = Some(id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn record(name: &str, au: Option<f64>, mass: Option<f64>, radius: Option<f64>) -> ExoplanetRecord {
        ExoplanetRecord {
            pl_name: Some(name.to_string()),
            pl_orbsmax: au,
            pl_masse: mass,
            pl_rade: radius,
            ..Default::default()
        }
    }

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(11)
    }

    fn cloud_of(arena: &SceneArena, id: EntityId) -> Arc<PointCloud> {
        match arena.get(id).and_then(|e| e.drawable.as_ref()).map(|d| &d.geometry) {
            Some(Geometry::Points(cloud)) => cloud.clone(),
            other => panic!("expected a point cloud, got {other:?}"),
        }
    }

    #[test]
    fn test_non_positive_distance_clamps() {
        for au in [0.0, -3.0] {
            let style = point_style(&record("x", Some(au), None, None));
            assert!((style.radius - 0.02 * 38.0).abs() < 1e-6, "au {au} gave {}", style.radius);
        }
    }

    #[test]
    fn test_distance_falls_back_to_alternate_column_then_one() {
        let alt = ExoplanetRecord {
            orbital_distance: Some(2.0),
            ..Default::default()
        };
        assert_eq!(point_style(&alt).radius, 76.0);
        assert_eq!(point_style(&ExoplanetRecord::default()).radius, 38.0);
    }

    #[test]
    fn test_mass_sets_hue_and_size_floor() {
        let light = point_style(&record("a", Some(1.0), Some(1.0), Some(0.1)));
        let heavy = point_style(&record("b", Some(1.0), Some(5000.0), Some(11.0)));
        assert_eq!(light.size, 0.5);
        assert!((heavy.size - 4.4).abs() < 1e-5);
        // Light planets lean blue, heavy ones orange.
        assert!(light.color.z > light.color.x);
        assert!(heavy.color.x > light.color.x);
        assert_eq!(heavy.color, hsl_to_linear(0.62 - 0.5, 0.75, 0.55 + 0.1));
    }

    #[test]
    fn test_positions_sit_on_their_ring() {
        let records = vec![record("a", Some(1.5), None, None); 50];
        let cloud = map_records(&records, &mut rng());
        for p in &cloud.positions {
            let r = Vec3::new(p.x, 0.0, p.z).length();
            assert!((r - 57.0).abs() < 1e-3);
            assert!(p.y.abs() <= 57.0 * 0.05 + 1e-4);
        }
    }

    #[test]
    fn test_more_than_limit_keeps_first_in_order() {
        let records: Vec<ExoplanetRecord> = (0..2500)
            .map(|i| record("p", Some(1.0 + i as f64 * 0.01), None, None))
            .collect();
        let cloud = map_records(&records, &mut rng());
        assert_eq!(cloud.len(), MAX_CLOUD_POINTS);
        for (i, p) in cloud.positions.iter().enumerate() {
            let expected = point_style(&records[i]).radius;
            let r = Vec3::new(p.x, 0.0, p.z).length();
            assert!((r - expected).abs() < 1e-2, "point {i}: radius {r}, expected {expected}");
        }
    }

    #[test]
    fn test_empty_or_none_releases_previous_cloud() {
        let mut arena = SceneArena::new();
        let mut current = None;
        let records = vec![record("a", Some(1.0), None, None)];

        populate_cloud(&mut arena, &mut current, Some(records.as_slice()), &mut rng(), true);
        let first = current.unwrap();
        assert!(arena.contains(first));

        populate_cloud(&mut arena, &mut current, Some(&[]), &mut rng(), true);
        assert!(current.is_none());
        assert!(!arena.contains(first));
        assert!(arena.drain_released().contains(&first));

        populate_cloud(&mut arena, &mut current, Some(records.as_slice()), &mut rng(), true);
        let second = current.unwrap();
        populate_cloud(&mut arena, &mut current, None, &mut rng(), true);
        assert!(current.is_none());
        assert!(arena.is_empty(), "no cloud should remain after {second:?}");
    }

    #[test]
    fn test_reload_replaces_single_cloud() {
        let mut arena = SceneArena::new();
        let mut current = None;
        let a = vec![record("a", Some(1.0), None, None); 3];
        let b = vec![record("b", Some(2.0), None, None); 7];
        populate_cloud(&mut arena, &mut current, Some(a.as_slice()), &mut rng(), false);
        populate_cloud(&mut arena, &mut current, Some(b.as_slice()), &mut rng(), false);

        let clouds: Vec<_> = arena.iter().filter(|(_, e)| e.kind == EntityKind::Points).collect();
        assert_eq!(clouds.len(), 1);
        let id = current.unwrap();
        assert_eq!(cloud_of(&arena, id).len(), 7);
        assert!(!arena.is_visible(id));
    }

    #[test]
    fn test_point_size_attenuates_with_depth() {
        assert_eq!(point_size_pixels(1.0, 6.0, -300.0), 6.0);
        assert_eq!(point_size_pixels(0.5, 6.0, -100_000.0), 1.0);
    }
}

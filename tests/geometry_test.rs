use cgmath::{InnerSpace, Vector3, Vector4};
use quote_ngin::{
    WorldConfig,
    config::{GroundConfig, LightingConfig, PointLightConfig},
    data_structures::{
        color::Color,
        geometry::Geometry,
        scene_graph::{NodeId, SceneNode},
    },
    objects::{ground::Ground, lighting::LightingRig},
    pipelines::light::LightUniform,
    render::shadow_instances,
};

use crate::common::test_utils::{assert_close, quote_config, ready_world};

mod common;

fn single_light(position: [f32; 3]) -> LightingRig {
    LightingRig::create(&LightingConfig {
        point_lights: vec![PointLightConfig {
            position,
            ..Default::default()
        }],
        ..Default::default()
    })
    .unwrap()
}

fn project(m: cgmath::Matrix4<f32>, p: [f32; 3]) -> Vector3<f32> {
    let v = m * Vector4::new(p[0], p[1], p[2], 1.0);
    v.truncate() / v.w
}

/// Every triangle must wind counter-clockwise around its vertex normal.
fn assert_ccw(geometry: &Geometry) {
    for tri in geometry.indices.chunks(3) {
        let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| {
            let v = geometry.vertices[i as usize];
            (Vector3::from(v.position), Vector3::from(v.normal))
        });
        let face = (b.0 - a.0).cross(c.0 - a.0);
        assert!(face.dot(a.1) > 0.0, "triangle {tri:?} winds clockwise");
    }
}

#[test]
fn should_wind_primitives_counter_clockwise() {
    assert_ccw(&Geometry::plane(2.0, 3.0));
    assert_ccw(&Geometry::cuboid(1.0, 2.0, 3.0));
}

#[test]
fn should_build_a_centered_plane() {
    let plane = Geometry::plane(4.0, 2.0);
    assert_eq!(plane.vertices.len(), 4);
    assert_eq!(plane.triangle_count(), 2);
    assert_eq!(plane.bounds(), Some(([-2.0, -1.0, 0.0], [2.0, 1.0, 0.0])));
}

#[test]
fn should_center_translated_geometry() {
    let mut cube = Geometry::cuboid(2.0, 2.0, 2.0);
    cube.translate([3.0, 0.0, -1.0]);
    let offset = cube.center();
    assert_eq!(offset, [-3.0, 0.0, 1.0]);
    assert_eq!(cube.bounds(), Some(([-1.0; 3], [1.0; 3])));
    assert_eq!(Geometry::default().bounds(), None);
}

#[test]
fn should_lay_the_ground_flat_below_everything() {
    let ground = Ground::create(&GroundConfig::default());
    assert_eq!(ground.height(), -5.0);
    assert!(ground.shadows().receive);
    assert!(!ground.shadows().cast);

    let model = ground.transform().to_matrix();
    let geometry = ground.geometry().unwrap();
    for v in &geometry.vertices {
        let world = project(model, v.position);
        assert_close(world.y, -5.0, 1e-3);
        let normal = (model * Vector3::from(v.normal).extend(0.0)).truncate();
        assert_close(normal.y, 1.0, 1e-5);
    }
}

#[test]
fn should_flatten_points_onto_the_ground() {
    let rig = single_light([0.0, 10.0, 0.0]);
    let light = &rig.point_lights()[0];
    let m = light.planar_shadow_matrix(-5.0).unwrap();

    let shadow = project(m, [1.0, 0.0, 0.0]);
    assert_close(shadow.x, 1.499, 1e-3);
    assert_close(shadow.y, -4.99, 1e-4);
    assert_close(shadow.z, 0.0, 1e-5);

    // the shadow lies on the ray from the light through the point
    for p in [[2.0, 1.0, -3.0], [-0.5, 4.0, 0.25]] {
        let s = project(m, p);
        assert_close(s.y, -4.99, 1e-3);
        let to_point = (Vector3::from(p) - light.position).normalize();
        let to_shadow = (s - light.position).normalize();
        assert_close(to_point.dot(to_shadow), 1.0, 1e-4);
    }
}

#[test]
fn should_not_flatten_for_lights_below_the_ground() {
    let rig = single_light([0.0, -6.0, 0.0]);
    assert!(rig.point_lights()[0].planar_shadow_matrix(-5.0).is_none());
}

#[test]
fn should_limit_shadows_to_the_light_range() {
    let rig = single_light([-3.0, 6.0, -3.0]);
    let light = &rig.point_lights()[0];
    assert!(light.shadows_point(Vector3::new(0.0, 0.0, 0.0)));
    assert!(!light.shadows_point(Vector3::new(100.0, 0.0, 0.0)));

    let dark = LightingRig::create(&LightingConfig {
        point_lights: vec![PointLightConfig {
            casts_shadow: false,
            ..Default::default()
        }],
        ..Default::default()
    })
    .unwrap();
    assert!(!dark.point_lights()[0].shadows_point(Vector3::new(0.0, 0.0, 0.0)));
    assert_eq!(dark.shadow_casters().count(), 0);
}

#[test]
fn should_cast_shadows_only_after_finalize() {
    let waiting = quote_ngin::World::new(quote_config(), 800, 600).unwrap();
    assert!(shadow_instances(waiting.shape(), &waiting).is_empty());

    let world = ready_world(quote_config());
    assert!(world.scene().contains(NodeId::Ground));
    // one of the two default lights casts shadows
    assert_eq!(shadow_instances(world.shape(), &world).len(), 1);
    for label in world.labels() {
        assert_eq!(shadow_instances(label, &world).len(), 1);
    }
    let ground = world.ground().unwrap();
    assert!(shadow_instances(ground, &world).is_empty());
}

#[test]
fn should_not_cast_shadows_without_ground() {
    let world = quote_ngin::World::new(WorldConfig::rotating_cube(), 800, 600).unwrap();
    assert!(world.is_running());
    assert!(shadow_instances(world.shape(), &world).is_empty());
}

#[test]
fn should_pack_lights_once_attached() {
    let waiting = quote_ngin::World::new(quote_config(), 800, 600).unwrap();
    let unlit = LightUniform::from_scene(waiting.scene(), waiting.lighting(), None);
    assert_eq!(unlit.point_light_count(), 0);
    assert_eq!(unlit.ambient(), [0.0; 3]);

    let world = ready_world(quote_config());
    let lit = LightUniform::from_scene(world.scene(), world.lighting(), Some(Color::WHITE));
    assert_eq!(lit.point_light_count(), 2);
    let ambient = Color::from_hex(0x404040);
    for (a, e) in lit.ambient().into_iter().zip(ambient.to_array()) {
        assert_close(a, e * 1.2, 1e-5);
    }
}

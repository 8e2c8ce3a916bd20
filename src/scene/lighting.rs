use glam::Vec3;

use crate::scene::materials::Color;

/// Base fill so nothing goes pure black.
#[derive(Debug, Clone, PartialEq)]
pub struct AmbientLight {
    pub color: Color,
    pub intensity: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalLight {
    pub enabled: bool,
    pub color: Color,
    pub intensity: f32,
    pub position: Vec3,
    pub cast_shadow: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointLight {
    pub enabled: bool,
    pub color: Color,
    pub intensity: f32,
    pub position: Vec3,
    pub range: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpotLight {
    pub enabled: bool,
    pub color: Color,
    pub intensity: f32,
    pub position: Vec3,
    pub target: Vec3,
    pub range: f32,
    pub angle: f32,
    pub penumbra: f32,
}

/// The six-light studio rig: warm key with shadows, blue fill bounce, cold
/// rim from behind, plus a point accent and a top-down spot that start off.
#[derive(Debug, Clone, PartialEq)]
pub struct LightRig {
    pub ambient: AmbientLight,
    pub key: DirectionalLight,
    pub fill: DirectionalLight,
    pub rim: DirectionalLight,
    pub point: PointLight,
    pub spot: SpotLight,
}

impl Default for LightRig {
    fn default() -> Self {
        Self {
            ambient: AmbientLight {
                color: Color::WHITE,
                intensity: 0.25,
            },
            key: DirectionalLight {
                enabled: true,
                color: Color::from_hex(0xfff4e0),
                intensity: 1.2,
                position: Vec3::new(5.0, 8.0, 5.0),
                cast_shadow: true,
            },
            fill: DirectionalLight {
                enabled: true,
                color: Color::from_hex(0x8090ff),
                intensity: 0.4,
                position: Vec3::new(-5.0, 3.0, -5.0),
                cast_shadow: false,
            },
            rim: DirectionalLight {
                enabled: true,
                color: Color::from_hex(0xc0e8ff),
                intensity: 0.6,
                position: Vec3::new(0.0, -3.0, -8.0),
                cast_shadow: false,
            },
            point: PointLight {
                enabled: false,
                color: Color::from_hex(0xff8844),
                intensity: 1.5,
                position: Vec3::new(3.0, 2.0, 3.0),
                range: 20.0,
            },
            spot: SpotLight {
                enabled: false,
                color: Color::WHITE,
                intensity: 2.0,
                position: Vec3::new(0.0, 10.0, 0.0),
                target: Vec3::ZERO,
                range: 30.0,
                angle: std::f32::consts::PI / 8.0,
                penumbra: 0.3,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accent_lights_start_disabled() {
        let rig = LightRig::default();
        assert!(rig.key.enabled && rig.fill.enabled && rig.rim.enabled);
        assert!(!rig.point.enabled);
        assert!(!rig.spot.enabled);
        assert!(rig.key.cast_shadow);
    }
}

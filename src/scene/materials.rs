use std::collections::HashMap;
use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Linear RGB color. Serializes as `#rrggbb`, the form the control panel
/// and the settings export use.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as f32 / 255.0,
            g: ((hex >> 8) & 0xff) as f32 / 255.0,
            b: (hex & 0xff) as f32 / 255.0,
        }
    }

    pub fn to_hex_string(&self) -> String {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!(
            "#{:02x}{:02x}{:02x}",
            channel(self.r),
            channel(self.g),
            channel(self.b)
        )
    }

    pub fn parse_hex(text: &str) -> Option<Self> {
        let digits = text.strip_prefix('#').unwrap_or(text);
        if digits.len() != 6 {
            return None;
        }
        let value = u32::from_str_radix(digits, 16).ok()?;
        Some(Self::from_hex(value))
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex_string())
    }
}

struct ColorVisitor;

impl Visitor<'_> for ColorVisitor {
    type Value = Color;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a #rrggbb color string")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Color, E> {
        Color::parse_hex(value).ok_or_else(|| E::custom(format!("invalid color: {value}")))
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_str(ColorVisitor)
    }
}

/// Handle into the [`MaterialRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(u32);

/// Parameters of the scan-line hologram shader. `time` is advanced every
/// frame by the material controller.
#[derive(Debug, Clone, PartialEq)]
pub struct HologramParams {
    pub color: Color,
    pub aberration_strength: f32,
    pub time: f32,
}

/// As-imported PBR parameters, kept so `Original` mode can restore them.
#[derive(Debug, Clone, PartialEq)]
pub struct PbrParams {
    pub base_color: Color,
    pub metallic: f32,
    pub roughness: f32,
    pub emissive: Color,
    pub opacity: f32,
}

impl Default for PbrParams {
    fn default() -> Self {
        Self {
            base_color: Color::WHITE,
            metallic: 0.0,
            roughness: 1.0,
            emissive: Color::BLACK,
            opacity: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Material {
    Hologram(HologramParams),
    Wireframe { color: Color },
    Clay {
        color: Color,
        roughness: f32,
        metalness: f32,
    },
    Pbr(PbrParams),
}

/// Process-wide material store. Override materials live for the whole
/// session; per-model originals are registered at install and removed at
/// dispose.
#[derive(Debug, Default)]
pub struct MaterialRegistry {
    materials: HashMap<MaterialId, Material>,
    next: u32,
}

impl MaterialRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, material: Material) -> MaterialId {
        let id = MaterialId(self.next);
        self.next += 1;
        self.materials.insert(id, material);
        id
    }

    pub fn get(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(&id)
    }

    pub fn get_mut(&mut self, id: MaterialId) -> Option<&mut Material> {
        self.materials.get_mut(&id)
    }

    pub fn remove(&mut self, id: MaterialId) -> Option<Material> {
        self.materials.remove(&id)
    }

    pub fn contains(&self, id: MaterialId) -> bool {
        self.materials.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_hex_round_trip() {
        let color = Color::from_hex(0x70c1ff);
        assert_eq!(color.to_hex_string(), "#70c1ff");
        assert_eq!(Color::parse_hex("#70c1ff"), Some(color));
        assert_eq!(Color::parse_hex("garbage"), None);
    }

    #[test]
    fn color_serializes_as_hex_string() {
        let json = serde_json::to_string(&Color::from_hex(0x0a0e1a)).unwrap();
        assert_eq!(json, "\"#0a0e1a\"");
        let back: Color = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Color::from_hex(0x0a0e1a));
    }

    #[test]
    fn registry_hands_out_unique_ids() {
        let mut registry = MaterialRegistry::new();
        let a = registry.insert(Material::Wireframe {
            color: Color::WHITE,
        });
        let b = registry.insert(Material::Pbr(PbrParams::default()));
        assert_ne!(a, b);
        assert!(registry.contains(a));
        registry.remove(a);
        assert!(!registry.contains(a));
        assert!(registry.contains(b));
    }
}

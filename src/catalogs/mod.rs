//! Built-in catalogs (small, hand-written recipe graphs for demos and tests).

use crate::catalog::RawElement;

/// `mud = earth + water`, `brick = mud + fire`.
pub fn brick() -> Vec<RawElement> {
    vec![
        RawElement::new("Mud", &[("Earth", "Water")]),
        RawElement::new("Brick", &[("Mud", "Fire")]),
    ]
}

/// [`brick`] plus `sand = air + earth` and a second brick recipe `brick = sand + fire`.
pub fn brick_sand() -> Vec<RawElement> {
    vec![
        RawElement::new("Mud", &[("Earth", "Water")]),
        RawElement::new("Sand", &[("Air", "Earth")]),
        RawElement::new("Brick", &[("Mud", "Fire"), ("Sand", "Fire")]),
    ]
}

/// Two elements that only derive from each other (`x`, `y`), one that depends on them (`z`),
/// and an ordinary element (`mud`).
pub fn cyclic() -> Vec<RawElement> {
    vec![
        RawElement::new("Mud", &[("Earth", "Water")]),
        RawElement::new("X", &[("Y", "Fire")]),
        RawElement::new("Y", &[("X", "Water")]),
        RawElement::new("Z", &[("X", "Mud")]),
    ]
}

/// A Little-Alchemy-style starter set.
///
/// It carries the usual catalog noise: recipes that break the tier order (`lava = stone + fire`,
/// `brick = clay + fire`), a recipe with an unknown ingredient (`phoenix`) and a doubled recipe
/// (`pressure = air + air`).
pub fn starter() -> Vec<RawElement> {
    vec![
        // tier 1
        RawElement::new("Mud", &[("Earth", "Water")]),
        RawElement::new("Steam", &[("Water", "Fire")]),
        RawElement::new("Lava", &[("Earth", "Fire"), ("Stone", "Fire")]),
        RawElement::new("Dust", &[("Earth", "Air")]),
        RawElement::new("Energy", &[("Fire", "Air")]),
        RawElement::new("Pressure", &[("Air", "Air")]),
        RawElement::new("Sea", &[("Water", "Water")]),
        RawElement::new("Rain", &[("Water", "Air")]),
        // tier 2
        RawElement::new("Stone", &[("Lava", "Air"), ("Lava", "Water")]),
        RawElement::new("Cloud", &[("Steam", "Air"), ("Rain", "Pressure")]),
        RawElement::new("Plant", &[("Earth", "Rain"), ("Mud", "Rain")]),
        RawElement::new("Brick", &[("Mud", "Fire"), ("Clay", "Fire")]),
        RawElement::new("Volcano", &[("Lava", "Earth"), ("Lava", "Pressure")]),
        // tier 3+
        RawElement::new("Sand", &[("Stone", "Air"), ("Stone", "Water")]),
        RawElement::new("Metal", &[("Stone", "Fire")]),
        RawElement::new("Sky", &[("Cloud", "Air")]),
        RawElement::new("Storm", &[("Cloud", "Energy")]),
        RawElement::new("Swamp", &[("Mud", "Plant")]),
        RawElement::new("Glass", &[("Sand", "Fire")]),
        RawElement::new("Clay", &[("Mud", "Sand")]),
        RawElement::new("Tool", &[("Metal", "Stone")]),
        RawElement::new("Lightning", &[("Storm", "Energy"), ("Cloud", "Energy")]),
        RawElement::new("Life", &[("Swamp", "Energy"), ("Lightning", "Sea")]),
        RawElement::new("Phoenix", &[("Fire", "Unicorn")]),
    ]
}

pub fn by_name(name: &str) -> Option<Vec<RawElement>> {
    match name {
        "brick" => Some(brick()),
        "brick_sand" => Some(brick_sand()),
        "cyclic" => Some(cyclic()),
        "starter" => Some(starter()),
        _ => None,
    }
}

/// Names of all built-in catalogs.
pub fn names() -> &'static [&'static str] {
    &["brick", "brick_sand", "cyclic", "starter"]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_name_resolves() {
        for name in names() {
            assert!(by_name(name).is_some(), "{name}");
        }
        assert!(by_name("nope").is_none());
    }
}

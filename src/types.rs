//! Core types for plants-api

use std::fmt;

use serde::de::{IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// Plant ID type
pub type PlantId = i64;

/// A persisted plant record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Plant {
    pub id: PlantId,
    pub name: Option<String>,
    pub species: Option<String>,
    /// Free-form care instructions
    pub plan: Option<String>,
}

impl Plant {
    /// Apply an update payload over this record.
    ///
    /// The id is never touched, whatever the payload carried.
    pub fn apply(&mut self, patch: PlantPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(species) = patch.species {
            self.species = species;
        }
        if let Some(plan) = patch.plan {
            self.plan = plan;
        }
    }
}

/// Body of a create request. The storage engine assigns the id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewPlant {
    pub name: Option<String>,
    pub species: Option<String>,
    pub plan: Option<String>,
}

impl<'de> Deserialize<'de> for NewPlant {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let fields = PlantPatch::deserialize(deserializer)?;
        Ok(Self {
            name: fields.name.flatten(),
            species: fields.species.flatten(),
            plan: fields.plan.flatten(),
        })
    }
}

/// Body of an update request.
///
/// Each field distinguishes three cases:
/// - key absent: `None`, the stored value is kept
/// - key set to `null`: `Some(None)`, the stored value is cleared
/// - key set to a string: `Some(Some(s))`, the stored value is replaced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlantPatch {
    pub name: Option<Option<String>>,
    pub species: Option<Option<String>>,
    pub plan: Option<Option<String>>,
}

impl PlantPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.species.is_none() && self.plan.is_none()
    }
}

// Bodies must be JSON objects. A derived impl would also take an array and
// fill the fields by position.
impl<'de> Deserialize<'de> for PlantPatch {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(PlantFieldsVisitor)
    }
}

struct PlantFieldsVisitor;

impl<'de> Visitor<'de> for PlantFieldsVisitor {
    type Value = PlantPatch;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a plant object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut patch = PlantPatch::default();
        while let Some(key) = map.next_key::<String>()? {
            let slot = match key.as_str() {
                "name" => &mut patch.name,
                "species" => &mut patch.species,
                "plan" => &mut patch.plan,
                _ => {
                    map.next_value::<IgnoredAny>()?;
                    continue;
                }
            };
            *slot = Some(map.next_value::<Option<String>>()?);
        }
        Ok(patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rose() -> Plant {
        Plant {
            id: 7,
            name: Some("Rose".into()),
            species: Some("Rosa".into()),
            plan: Some("Water daily".into()),
        }
    }

    #[test]
    fn patch_distinguishes_absent_null_and_value() {
        let patch: PlantPatch =
            serde_json::from_str(r#"{"species": null, "plan": "Water weekly"}"#).unwrap();

        assert_eq!(patch.name, None);
        assert_eq!(patch.species, Some(None));
        assert_eq!(patch.plan, Some(Some("Water weekly".to_string())));
    }

    #[test]
    fn apply_keeps_absent_fields() {
        let mut plant = rose();
        let patch: PlantPatch = serde_json::from_str(r#"{"plan": "Water weekly"}"#).unwrap();
        plant.apply(patch);

        assert_eq!(plant.name.as_deref(), Some("Rose"));
        assert_eq!(plant.species.as_deref(), Some("Rosa"));
        assert_eq!(plant.plan.as_deref(), Some("Water weekly"));
    }

    #[test]
    fn apply_clears_explicit_nulls() {
        let mut plant = rose();
        let patch: PlantPatch = serde_json::from_str(r#"{"name": null}"#).unwrap();
        plant.apply(patch);

        assert_eq!(plant.name, None);
        assert_eq!(plant.species.as_deref(), Some("Rosa"));
    }

    #[test]
    fn patch_ignores_id_and_unknown_keys() {
        let mut plant = rose();
        let patch: PlantPatch =
            serde_json::from_str(r#"{"id": 99, "colour": "red", "name": "Tea rose"}"#).unwrap();
        plant.apply(patch);

        assert_eq!(plant.id, 7);
        assert_eq!(plant.name.as_deref(), Some("Tea rose"));
    }

    #[test]
    fn empty_patch_is_a_no_op() {
        let patch: PlantPatch = serde_json::from_str("{}").unwrap();
        assert!(patch.is_empty());

        let mut plant = rose();
        plant.apply(patch);
        assert_eq!(plant, rose());
    }

    #[test]
    fn patch_rejects_wrong_types() {
        assert!(serde_json::from_str::<PlantPatch>(r#"{"name": 5}"#).is_err());
        assert!(serde_json::from_str::<NewPlant>(r#"{"plan": ["a"]}"#).is_err());
    }

    #[test]
    fn bodies_must_be_objects() {
        for body in ["[]", r#"["Rose", "Rosa", "Water daily"]"#, "[null]", "\"Rose\"", "null"] {
            assert!(serde_json::from_str::<NewPlant>(body).is_err(), "{body}");
            assert!(serde_json::from_str::<PlantPatch>(body).is_err(), "{body}");
        }
    }

    #[test]
    fn new_plant_treats_null_as_missing() {
        let plant: NewPlant = serde_json::from_str(r#"{"name": "Fern", "plan": null}"#).unwrap();
        assert_eq!(plant.name.as_deref(), Some("Fern"));
        assert_eq!(plant.plan, None);
    }

    #[test]
    fn plant_serializes_every_column() {
        let plant = Plant {
            id: 1,
            name: None,
            species: Some("Ficus".into()),
            plan: None,
        };
        let value = serde_json::to_value(&plant).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"id": 1, "name": null, "species": "Ficus", "plan": null})
        );
    }
}

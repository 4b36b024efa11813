use std::collections::HashMap;

use log::warn;
use serde::Deserialize;
use serde_json::Value;

use crate::score::note::FlickType;
use crate::score::timing::beat_to_tick;

// --- Wire Document ---

#[derive(Deserialize, Clone, Debug)]
pub struct RawScore {
    #[serde(rename = "bgmOffset")]
    pub bgm_offset: f64,
    pub entities: Vec<RawEntity>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct RawEntity {
    #[serde(default)]
    pub name: String,
    pub archetype: String,
    #[serde(default)]
    pub data: Vec<RawField>,
}

/// One `data` record: a literal `value` or a symbolic `ref` to another
/// entity's name. A record carrying both keeps the literal.
#[derive(Deserialize, Clone, Debug)]
pub struct RawField {
    pub name: String,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default, rename = "ref")]
    pub target: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Literal(Value),
    Ref(String),
}

// --- Normalized Lookup ---

/// Name-keyed view of an entity's `data` array. Duplicate names keep the
/// last record, matching how the document is written out.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EntityData {
    fields: HashMap<String, FieldValue>,
}

impl EntityData {
    pub fn from_entity(entity: &RawEntity) -> EntityData {
        let mut fields = HashMap::with_capacity(entity.data.len());
        for field in &entity.data {
            let value = match (&field.value, &field.target) {
                (Some(value), _) => FieldValue::Literal(value.clone()),
                (None, Some(target)) => FieldValue::Ref(target.clone()),
                (None, None) => FieldValue::Literal(Value::Null),
            };
            fields.insert(field.name.clone(), value);
        }
        EntityData { fields }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        match self.fields.get(name)? {
            FieldValue::Literal(value) => value.as_f64(),
            FieldValue::Ref(_) => None,
        }
    }

    /// Integral literal; numbers with a fractional part don't count.
    pub fn integer(&self, name: &str) -> Option<i64> {
        let value = self.number(name)?;
        if value.fract() == 0.0 {
            Some(value as i64)
        } else {
            None
        }
    }

    pub fn ref_target(&self, name: &str) -> Option<&str> {
        match self.fields.get(name)? {
            FieldValue::Ref(target) => Some(target.as_str()),
            // Some exporters write group references as plain strings
            FieldValue::Literal(Value::String(target)) => Some(target.as_str()),
            FieldValue::Literal(_) => None,
        }
    }

    // --- Common Attribute Extraction ---

    /// `#BEAT` converted to editor ticks.
    pub fn tick(&self) -> Option<i32> {
        self.number("#BEAT").map(beat_to_tick)
    }

    /// `size` doubled into half-lane width units.
    pub fn width(&self) -> Option<f32> {
        self.number("size").map(|size| (size * 2.0) as f32)
    }

    /// Left edge shifted into the 0..12 coordinate system centered at 6.
    pub fn lane(&self) -> Option<f32> {
        let lane = self.number("lane")?;
        let size = self.number("size")?;
        Some((lane - size + 6.0) as f32)
    }

    /// Layer index from a time-scale-group reference under `key`.
    /// Group entities are named `tscg<N>`; group N owns layer N + 1 and the
    /// absence of a reference means the default layer 0.
    pub fn layer_index(&self, key: &str) -> i32 {
        let Some(group) = self.ref_target(key) else {
            return 0;
        };
        match group.get(4..).and_then(|tail| tail.parse::<i32>().ok()) {
            Some(index) => index + 1,
            None => {
                warn!("Unrecognized time scale group name '{}', using default layer", group);
                0
            }
        }
    }

    /// Flick direction per the `direction` field: +1 right, -1 left, any
    /// other present value the default (up) flick, absent no flick.
    pub fn flick(&self) -> FlickType {
        match self.number("direction") {
            Some(dir) if dir == 1.0 => FlickType::Right,
            Some(dir) if dir == -1.0 => FlickType::Left,
            Some(_) => FlickType::Default,
            None => FlickType::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entity(data: Value) -> RawEntity {
        serde_json::from_value(json!({
            "name": "e0",
            "archetype": "NormalTapNote",
            "data": data,
        }))
        .unwrap()
    }

    #[test]
    fn normalization_is_idempotent() {
        let raw = entity(json!([
            {"name": "#BEAT", "value": 1.5},
            {"name": "head", "ref": "s0"},
            {"name": "#BEAT", "value": 2.0},
        ]));
        let first = EntityData::from_entity(&raw);
        let second = EntityData::from_entity(&raw);
        assert_eq!(first, second);
        // Last duplicate wins
        assert_eq!(first.tick(), Some(960));
        assert_eq!(first.ref_target("head"), Some("s0"));
    }

    #[test]
    fn lane_and_width_extraction() {
        let data = EntityData::from_entity(&entity(json!([
            {"name": "lane", "value": -3.0},
            {"name": "size", "value": 1.5},
        ])));
        assert_eq!(data.lane(), Some(1.5));
        assert_eq!(data.width(), Some(3.0));
        // Lane needs size as well
        let lonely = EntityData::from_entity(&entity(json!([
            {"name": "lane", "value": -3.0},
        ])));
        assert_eq!(lonely.lane(), None);
    }

    #[test]
    fn layer_index_from_group_ref() {
        let data = EntityData::from_entity(&entity(json!([
            {"name": "timeScaleGroup", "ref": "tscg2"},
        ])));
        assert_eq!(data.layer_index("timeScaleGroup"), 3);

        let absent = EntityData::from_entity(&entity(json!([])));
        assert_eq!(absent.layer_index("timeScaleGroup"), 0);

        let garbled = EntityData::from_entity(&entity(json!([
            {"name": "timeScaleGroup", "ref": "group-a"},
        ])));
        assert_eq!(garbled.layer_index("timeScaleGroup"), 0);
    }

    #[test]
    fn flick_direction_decode() {
        let right = EntityData::from_entity(&entity(json!([
            {"name": "direction", "value": 1},
        ])));
        assert_eq!(right.flick(), FlickType::Right);
        let left = EntityData::from_entity(&entity(json!([
            {"name": "direction", "value": -1},
        ])));
        assert_eq!(left.flick(), FlickType::Left);
        let odd = EntityData::from_entity(&entity(json!([
            {"name": "direction", "value": 3},
        ])));
        assert_eq!(odd.flick(), FlickType::Default);
        let none = EntityData::from_entity(&entity(json!([])));
        assert_eq!(none.flick(), FlickType::None);
    }
}

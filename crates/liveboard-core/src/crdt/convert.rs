//! Conversion between shape records and Loro values.
//!
//! Every record field is stored under its own key so concurrent edits to
//! different attributes of the same shape merge instead of overwriting
//! each other.

use crate::record::{Payload, RecordError, ShapeRecord};
use crate::shapes::ShapeKind;
use loro::{LoroMap, LoroMapValue, LoroResult, LoroValue, ValueOrContainer};

// Common keys
const KEY_ID: &str = "id";
const KEY_TYPE: &str = "type";

// Geometry keys
const KEY_LEFT: &str = "left";
const KEY_TOP: &str = "top";
const KEY_WIDTH: &str = "width";
const KEY_HEIGHT: &str = "height";
const KEY_ANGLE: &str = "angle";

// Style keys
const KEY_FILL: &str = "fill";
const KEY_STROKE: &str = "stroke";
const KEY_STROKE_WIDTH: &str = "strokeWidth";
const KEY_FONT_SIZE: &str = "fontSize";
const KEY_FONT_FAMILY: &str = "fontFamily";
const KEY_FONT_WEIGHT: &str = "fontWeight";

// Line keys
const KEY_X1: &str = "x1";
const KEY_Y1: &str = "y1";
const KEY_X2: &str = "x2";
const KEY_Y2: &str = "y2";

// Payload keys
const KEY_POINTS: &str = "points";
const KEY_SRC: &str = "src";
const KEY_TEXT: &str = "text";

fn get_double(map: &LoroMapValue, key: &'static str) -> Result<f64, RecordError> {
    match map.get(key) {
        Some(LoroValue::Double(d)) => Ok(*d),
        Some(LoroValue::I64(i)) => Ok(*i as f64),
        _ => Err(RecordError::MissingField(key)),
    }
}

fn get_string(map: &LoroMapValue, key: &'static str) -> Result<String, RecordError> {
    get_opt_string(map, key).ok_or(RecordError::MissingField(key))
}

/// Missing keys and explicit nulls both read as `None`.
fn get_opt_string(map: &LoroMapValue, key: &str) -> Option<String> {
    match map.get(key)? {
        LoroValue::String(s) => Some(s.to_string()),
        _ => None,
    }
}

fn get_opt_double(map: &LoroMapValue, key: &str) -> Option<f64> {
    match map.get(key)? {
        LoroValue::Double(d) => Some(*d),
        LoroValue::I64(i) => Some(*i as f64),
        _ => None,
    }
}

fn opt_string(value: &Option<String>) -> LoroValue {
    match value {
        Some(s) => LoroValue::from(s.as_str()),
        None => LoroValue::Null,
    }
}

fn points_to_loro(points: &[[f64; 2]]) -> LoroValue {
    let list: Vec<LoroValue> = points
        .iter()
        .map(|[x, y]| LoroValue::List(vec![LoroValue::Double(*x), LoroValue::Double(*y)].into()))
        .collect();
    LoroValue::List(list.into())
}

fn points_from_loro(map: &LoroMapValue) -> Result<Vec<[f64; 2]>, RecordError> {
    let Some(LoroValue::List(list)) = map.get(KEY_POINTS) else {
        return Err(RecordError::MissingField(KEY_POINTS));
    };
    let coord = |v: Option<&LoroValue>| match v {
        Some(LoroValue::Double(d)) => Some(*d),
        Some(LoroValue::I64(i)) => Some(*i as f64),
        _ => None,
    };
    Ok(list
        .iter()
        .filter_map(|p| match p {
            LoroValue::List(xy) => Some([coord(xy.first())?, coord(xy.get(1))?]),
            _ => None,
        })
        .collect())
}

/// Flatten a record into `(key, value)` pairs.
pub fn record_fields(record: &ShapeRecord) -> Vec<(&'static str, LoroValue)> {
    let mut fields = vec![
        (KEY_ID, LoroValue::from(record.id.as_str())),
        (KEY_TYPE, LoroValue::from(record.kind.as_str())),
        (KEY_LEFT, LoroValue::Double(record.left)),
        (KEY_TOP, LoroValue::Double(record.top)),
        (KEY_WIDTH, LoroValue::Double(record.width)),
        (KEY_HEIGHT, LoroValue::Double(record.height)),
        (KEY_ANGLE, LoroValue::Double(record.angle)),
        (KEY_FILL, opt_string(&record.fill)),
        (KEY_STROKE, opt_string(&record.stroke)),
        (KEY_STROKE_WIDTH, LoroValue::Double(record.stroke_width)),
    ];
    if let Some(size) = record.font_size {
        fields.push((KEY_FONT_SIZE, LoroValue::Double(size)));
    }
    if let Some(family) = &record.font_family {
        fields.push((KEY_FONT_FAMILY, LoroValue::from(family.as_str())));
    }
    if let Some(weight) = &record.font_weight {
        fields.push((KEY_FONT_WEIGHT, LoroValue::from(weight.as_str())));
    }
    match &record.payload {
        Payload::None => {}
        Payload::Line { x1, y1, x2, y2 } => {
            fields.push((KEY_X1, LoroValue::Double(*x1)));
            fields.push((KEY_Y1, LoroValue::Double(*y1)));
            fields.push((KEY_X2, LoroValue::Double(*x2)));
            fields.push((KEY_Y2, LoroValue::Double(*y2)));
        }
        Payload::FreeDraw { points } => fields.push((KEY_POINTS, points_to_loro(points))),
        Payload::Image { src } => fields.push((KEY_SRC, LoroValue::from(src.as_str()))),
        Payload::Text { text } => fields.push((KEY_TEXT, LoroValue::from(text.as_str()))),
    }
    fields
}

/// Write a record into a shape map, touching only fields whose value changed.
/// Returns whether anything was written.
pub fn record_to_loro(record: &ShapeRecord, map: &LoroMap) -> LoroResult<bool> {
    let fields = record_fields(record);
    let mut changed = false;

    for (key, value) in &fields {
        let same = matches!(map.get(key), Some(ValueOrContainer::Value(ref current)) if current == value);
        if !same {
            map.insert(key, value.clone())?;
            changed = true;
        }
    }

    // Drop keys the record no longer carries
    if let LoroValue::Map(current) = map.get_value() {
        let stale: Vec<String> = current
            .keys()
            .filter(|k| !fields.iter().any(|(key, _)| *key == k.as_str()))
            .cloned()
            .collect();
        for key in stale {
            map.delete(&key)?;
            changed = true;
        }
    }

    Ok(changed)
}

/// Read a record back from a shape map value.
pub fn record_from_loro(map: &LoroMapValue) -> Result<ShapeRecord, RecordError> {
    let tag = get_string(map, KEY_TYPE)?;
    let kind = ShapeKind::from_tag(&tag).ok_or(RecordError::UnknownType(tag))?;

    let payload = match kind {
        ShapeKind::Line => Payload::Line {
            x1: get_double(map, KEY_X1)?,
            y1: get_double(map, KEY_Y1)?,
            x2: get_double(map, KEY_X2)?,
            y2: get_double(map, KEY_Y2)?,
        },
        ShapeKind::FreeDraw => Payload::FreeDraw {
            points: points_from_loro(map)?,
        },
        ShapeKind::Image => Payload::Image {
            src: get_string(map, KEY_SRC)?,
        },
        ShapeKind::Text => Payload::Text {
            text: get_string(map, KEY_TEXT)?,
        },
        ShapeKind::Rectangle | ShapeKind::Ellipse | ShapeKind::Triangle => Payload::None,
    };

    Ok(ShapeRecord {
        id: get_string(map, KEY_ID)?,
        kind,
        left: get_double(map, KEY_LEFT)?,
        top: get_double(map, KEY_TOP)?,
        width: get_double(map, KEY_WIDTH)?,
        height: get_double(map, KEY_HEIGHT)?,
        angle: get_opt_double(map, KEY_ANGLE).unwrap_or(0.0),
        fill: get_opt_string(map, KEY_FILL),
        stroke: get_opt_string(map, KEY_STROKE),
        stroke_width: get_opt_double(map, KEY_STROKE_WIDTH).unwrap_or(1.0),
        font_size: get_opt_double(map, KEY_FONT_SIZE),
        font_family: get_opt_string(map, KEY_FONT_FAMILY),
        font_weight: get_opt_string(map, KEY_FONT_WEIGHT),
        payload,
    })
}

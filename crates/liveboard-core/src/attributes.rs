//! Attribute panel values for the selected shape.

use crate::shapes::{Shape, ShapeKind};
use serde::{Deserialize, Serialize};

/// String values bound to the attribute panel inputs.
///
/// Font fields are empty for shapes that are not text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attributes {
    pub width: String,
    pub height: String,
    pub font_size: String,
    pub font_family: String,
    pub font_weight: String,
    pub fill: String,
    pub stroke: String,
}

impl Attributes {
    /// Read the panel values off a shape.
    pub fn from_shape(shape: &Shape) -> Self {
        let bounds = shape.bounds();
        let style = shape.style();
        let mut attributes = Self {
            width: format!("{:.0}", bounds.width()),
            height: format!("{:.0}", bounds.height()),
            fill: style.fill.map(|c| c.to_hex()).unwrap_or_default(),
            stroke: style.stroke.map(|c| c.to_hex()).unwrap_or_default(),
            ..Self::default()
        };
        if shape.kind() == ShapeKind::Text {
            attributes.font_size = format!("{}", style.font_size);
            attributes.font_family = style.font_family.clone();
            attributes.font_weight = style.font_weight.clone();
        }
        attributes
    }

    /// Refresh only the size readout (live scaling).
    pub fn update_size(&mut self, shape: &Shape) {
        let bounds = shape.bounds();
        self.width = format!("{:.0}", bounds.width());
        self.height = format!("{:.0}", bounds.height());
    }

    /// Mirror a panel edit into the stored values. Unknown names are ignored.
    pub fn set(&mut self, property: &str, value: &str) {
        let slot = match property {
            "width" => &mut self.width,
            "height" => &mut self.height,
            "fontSize" => &mut self.font_size,
            "fontFamily" => &mut self.font_family,
            "fontWeight" => &mut self.font_weight,
            "fill" => &mut self.fill,
            "stroke" => &mut self.stroke,
            _ => return,
        };
        *slot = value.to_string();
    }
}

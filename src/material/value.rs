use std::fmt::{Display, Formatter};

use glam::{IVec2, IVec3, IVec4, Vec2, Vec3, Vec4};
use itertools::Itertools;
use procmat_descriptors::package::InputType;

/// The value of a graph input. Numeric values print to and parse from the comma separated
/// form used by descriptors, e.g. `"0.5,0.25"`.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphValue {
    Float1(f32),
    Float2(Vec2),
    Float3(Vec3),
    Float4(Vec4),
    Int1(i32),
    Int2(IVec2),
    Int3(IVec3),
    Int4(IVec4),
    /// Path of the bound external image, empty when unbound.
    Image(String),
    String(String),
}

impl GraphValue {
    /// The zero value of a type, used when a package doesn't declare a default.
    pub fn zero(input_type: InputType) -> Self {
        match input_type {
            InputType::Float1 => GraphValue::Float1(0.0),
            InputType::Float2 => GraphValue::Float2(Vec2::ZERO),
            InputType::Float3 => GraphValue::Float3(Vec3::ZERO),
            InputType::Float4 => GraphValue::Float4(Vec4::ZERO),
            InputType::Integer1 => GraphValue::Int1(0),
            InputType::Integer2 => GraphValue::Int2(IVec2::ZERO),
            InputType::Integer3 => GraphValue::Int3(IVec3::ZERO),
            InputType::Integer4 => GraphValue::Int4(IVec4::ZERO),
            InputType::Image => GraphValue::Image(String::new()),
            InputType::String => GraphValue::String(String::new()),
        }
    }

    /// Parses `text` as a value of `input_type`. An empty text yields the zero value. Returns
    /// `None` when a component doesn't parse or the component count doesn't match.
    pub fn parse(input_type: InputType, text: &str) -> Option<Self> {
        match input_type {
            InputType::Image => return Some(GraphValue::Image(text.to_string())),
            InputType::String => return Some(GraphValue::String(text.to_string())),
            _ => {}
        }

        if text.trim().is_empty() {
            return Some(Self::zero(input_type));
        }

        let parts = text.split(',').map(str::trim).collect_vec();
        if parts.len() != input_type.dimension() {
            return None;
        }

        if matches!(
            input_type,
            InputType::Float1 | InputType::Float2 | InputType::Float3 | InputType::Float4
        ) {
            let floats = parts.iter().map(|part| part.parse::<f32>()).collect::<Result<Vec<_>, _>>().ok()?;
            Some(match input_type {
                InputType::Float1 => GraphValue::Float1(floats[0]),
                InputType::Float2 => GraphValue::Float2(Vec2::from_slice(&floats)),
                InputType::Float3 => GraphValue::Float3(Vec3::from_slice(&floats)),
                _ => GraphValue::Float4(Vec4::from_slice(&floats)),
            })
        } else {
            let ints = parts.iter().map(|part| part.parse::<i32>()).collect::<Result<Vec<_>, _>>().ok()?;
            Some(match input_type {
                InputType::Integer1 => GraphValue::Int1(ints[0]),
                InputType::Integer2 => GraphValue::Int2(IVec2::from_slice(&ints)),
                InputType::Integer3 => GraphValue::Int3(IVec3::from_slice(&ints)),
                _ => GraphValue::Int4(IVec4::from_slice(&ints)),
            })
        }
    }

    pub fn input_type(&self) -> InputType {
        match self {
            GraphValue::Float1(_) => InputType::Float1,
            GraphValue::Float2(_) => InputType::Float2,
            GraphValue::Float3(_) => InputType::Float3,
            GraphValue::Float4(_) => InputType::Float4,
            GraphValue::Int1(_) => InputType::Integer1,
            GraphValue::Int2(_) => InputType::Integer2,
            GraphValue::Int3(_) => InputType::Integer3,
            GraphValue::Int4(_) => InputType::Integer4,
            GraphValue::Image(_) => InputType::Image,
            GraphValue::String(_) => InputType::String,
        }
    }

    /// Numeric components widened to f32, empty for images and strings.
    pub fn components(&self) -> Vec<f32> {
        match self {
            GraphValue::Float1(v) => vec![*v],
            GraphValue::Float2(v) => v.to_array().to_vec(),
            GraphValue::Float3(v) => v.to_array().to_vec(),
            GraphValue::Float4(v) => v.to_array().to_vec(),
            GraphValue::Int1(v) => vec![*v as f32],
            GraphValue::Int2(v) => v.to_array().iter().map(|&c| c as f32).collect_vec(),
            GraphValue::Int3(v) => v.to_array().iter().map(|&c| c as f32).collect_vec(),
            GraphValue::Int4(v) => v.to_array().iter().map(|&c| c as f32).collect_vec(),
            GraphValue::Image(_) | GraphValue::String(_) => Vec::new(),
        }
    }
}

impl Display for GraphValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphValue::Float1(v) => write!(f, "{}", v),
            GraphValue::Float2(v) => write!(f, "{}", v.to_array().iter().join(",")),
            GraphValue::Float3(v) => write!(f, "{}", v.to_array().iter().join(",")),
            GraphValue::Float4(v) => write!(f, "{}", v.to_array().iter().join(",")),
            GraphValue::Int1(v) => write!(f, "{}", v),
            GraphValue::Int2(v) => write!(f, "{}", v.to_array().iter().join(",")),
            GraphValue::Int3(v) => write!(f, "{}", v.to_array().iter().join(",")),
            GraphValue::Int4(v) => write!(f, "{}", v.to_array().iter().join(",")),
            GraphValue::Image(path) => write!(f, "{}", path),
            GraphValue::String(text) => write!(f, "{}", text),
        }
    }
}

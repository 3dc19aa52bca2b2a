//! Type-driven inference of field values from declared types.
//!
//! Integer scalars give ~30% weight to boundary values (0, 1, -1, MIN, MAX);
//! floats favour 0.0, -0.0, 1.0 and -1.0 the same way and otherwise stay
//! within a finite range. Nested records are left as [`Inference::Record`]
//! and drawn through the generator that planned them, so records may refer
//! to themselves and their errors reach the caller intact.

use fieldgen_core::{DeclaredType, ScalarType, TypeId, TypeRegistry, Value};
use proptest::prelude::*;
use proptest::sample::select;
use proptest::strategy::SBoxedStrategy;

use crate::draw::Drawer;
use crate::error::DrawError;

/// Nesting depth past which optionals draw `None` and enums draw their unit
/// variants, when they have any.
pub const NESTING_LIMIT: usize = 8;

macro_rules! boundary_int {
    ($ty:ty, $variant:ident) => {
        prop_oneof![
            3 => select(vec![0 as $ty, 1, -1, <$ty>::MIN, <$ty>::MAX]),
            7 => any::<$ty>(),
        ]
        .prop_map(Value::$variant)
        .sboxed()
    };
}

macro_rules! boundary_float {
    ($ty:ty, $variant:ident, $bound:expr) => {
        prop_oneof![
            3 => select(vec![0.0 as $ty, -0.0, 1.0, -1.0]),
            7 => -$bound..$bound,
        ]
        .prop_map(Value::$variant)
        .sboxed()
    };
}

fn scalar(ty: ScalarType) -> SBoxedStrategy<Value> {
    match ty {
        ScalarType::Bool => any::<bool>().prop_map(Value::Bool).sboxed(),
        ScalarType::I8 => boundary_int!(i8, I8),
        ScalarType::I16 => boundary_int!(i16, I16),
        ScalarType::I32 => boundary_int!(i32, I32),
        ScalarType::I64 => boundary_int!(i64, I64),
        ScalarType::F32 => boundary_float!(f32, F32, 1e6f32),
        ScalarType::F64 => boundary_float!(f64, F64, 1e12f64),
    }
}

/// How to draw values of a declared type.
#[derive(Debug, Clone)]
pub enum Inference {
    /// Scalars, text and unit.
    Leaf(SBoxedStrategy<Value>),
    Array {
        element: Box<Inference>,
        length: usize,
    },
    Optional(Box<Inference>),
    /// Inhabited variants by index, with their payload if any.
    Enum(Vec<(u32, Option<Inference>)>),
    Record(TypeId),
}

impl Inference {
    /// Nested records reached by this inference, each with whether an
    /// optional or an enum unit variant lies on the way to it.
    pub fn nested_records(&self) -> Vec<(TypeId, bool)> {
        let mut found = Vec::new();
        self.collect_records(false, &mut found);
        found
    }

    fn collect_records(&self, guarded: bool, found: &mut Vec<(TypeId, bool)>) {
        match self {
            Inference::Leaf(_) => {}
            Inference::Array { element, .. } => element.collect_records(guarded, found),
            Inference::Optional(inner) => inner.collect_records(true, found),
            Inference::Enum(variants) => {
                let guarded = guarded || variants.iter().any(|(_, p)| p.is_none());
                for payload in variants.iter().filter_map(|(_, p)| p.as_ref()) {
                    payload.collect_records(guarded, found);
                }
            }
            Inference::Record(id) => found.push((*id, guarded)),
        }
    }

    /// Draws one value.
    pub(crate) fn draw(&self, drawer: &mut Drawer<'_>) -> Result<Value, DrawError> {
        let limited = drawer.depth() >= NESTING_LIMIT;
        match self {
            Inference::Leaf(strategy) => drawer.draw(strategy),
            Inference::Array { element, length } => (0..*length)
                .map(|_| element.draw(drawer))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Inference::Optional(inner) => {
                if limited || !drawer.draw(&any::<bool>())? {
                    return Ok(Value::Optional(None));
                }
                Ok(Value::Optional(Some(Box::new(inner.draw(drawer)?))))
            }
            Inference::Enum(variants) => {
                let units: Vec<&(u32, Option<Inference>)> =
                    variants.iter().filter(|(_, p)| p.is_none()).collect();
                let candidates: Vec<&(u32, Option<Inference>)> = if limited && !units.is_empty() {
                    units
                } else {
                    variants.iter().collect()
                };
                let pick = drawer.draw(&(0..candidates.len()))?;
                let (variant, payload) = candidates[pick];
                let payload = match payload {
                    Some(inference) => Some(Box::new(inference.draw(drawer)?)),
                    None => None,
                };
                Ok(Value::Enum {
                    variant: *variant,
                    payload,
                })
            }
            Inference::Record(id) => drawer.draw_record(*id).map(Value::from),
        }
    }
}

/// Infers how to draw values of `ty`, or explains why no value can be drawn.
pub fn infer(registry: &TypeRegistry, ty: TypeId) -> Result<Inference, String> {
    infer_within(registry, ty, &mut Vec::new())
}

fn infer_within(registry: &TypeRegistry, ty: TypeId, outer: &mut Vec<TypeId>) -> Result<Inference, String> {
    let declared = registry
        .get(ty)
        .ok_or_else(|| format!("declared type {ty} is not registered"))?;
    if outer.contains(&ty) {
        return Err(format!("declared type {ty} contains itself"));
    }

    outer.push(ty);
    let inference = match declared {
        DeclaredType::Scalar(s) => Ok(Inference::Leaf(scalar(*s))),
        DeclaredType::Text => Ok(Inference::Leaf(any::<String>().prop_map(Value::Text).sboxed())),
        DeclaredType::Unit => Ok(Inference::Leaf(Just(Value::Unit).sboxed())),
        DeclaredType::Array { element, length } => {
            infer_within(registry, *element, outer).map(|element| Inference::Array {
                element: Box::new(element),
                length: *length as usize,
            })
        }
        DeclaredType::Optional(inner) => {
            infer_within(registry, *inner, outer).map(|inner| Inference::Optional(Box::new(inner)))
        }
        DeclaredType::Enum(def) => {
            let mut variants = Vec::with_capacity(def.variants.len());
            for variant in def.variants.values() {
                match variant.payload {
                    None => variants.push((variant.index, None)),
                    // Variants whose payload has no values are never drawn.
                    Some(payload) => {
                        if let Ok(payload) = infer_within(registry, payload, outer) {
                            variants.push((variant.index, Some(payload)));
                        }
                    }
                }
            }
            if variants.is_empty() {
                Err(format!("enum '{}' has no variant with values", def.name))
            } else {
                Ok(Inference::Enum(variants))
            }
        }
        DeclaredType::Record(def) => Ok(Inference::Record(def.type_id)),
        DeclaredType::Never => Err("the Never type has no values".to_string()),
        DeclaredType::Opaque { name } => Err(format!("no strategy can be inferred for opaque type '{name}'")),
    };
    outer.pop();
    inference
}

//! TypeId and TypeRegistry for nominal typing.
//!
//! Every type has a unique [`TypeId`] providing O(1) identity comparison.
//! The [`TypeRegistry`] manages type registration and lookup, pre-registering
//! the builtin scalar types plus Text, Unit and Never on construction. It is
//! also the record system: records are registered here, and their ancestry,
//! merged fields and merged namespace are answered from here.

use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::attr::Attribute;
use crate::error::CoreError;
use crate::record::{FieldDef, RecordDef};
use crate::types::{DeclaredType, ScalarType};

/// Unique identifier for a type in the type registry.
///
/// The inner value is an index into the [`TypeRegistry`]'s type vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeId(pub u32);

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeId({})", self.0)
    }
}

/// Pre-registered TypeId constants for built-in types.
impl TypeId {
    pub const BOOL: TypeId = TypeId(0);
    pub const I8: TypeId = TypeId(1);
    pub const I16: TypeId = TypeId(2);
    pub const I32: TypeId = TypeId(3);
    pub const I64: TypeId = TypeId(4);
    pub const F32: TypeId = TypeId(5);
    pub const F64: TypeId = TypeId(6);
    pub const TEXT: TypeId = TypeId(7);
    pub const UNIT: TypeId = TypeId(8);
    pub const NEVER: TypeId = TypeId(9);
}

/// Base-to-derived chain of record definitions. Most hierarchies are shallow.
pub type Ancestry<'r> = SmallVec<[&'r RecordDef; 4]>;

/// Registry of all types, providing nominal identity via [`TypeId`].
///
/// On construction, the registry pre-registers the 10 built-in types:
/// - `TypeId(0)` = Bool
/// - `TypeId(1)` = I8
/// - `TypeId(2)` = I16
/// - `TypeId(3)` = I32
/// - `TypeId(4)` = I64
/// - `TypeId(5)` = F32
/// - `TypeId(6)` = F64
/// - `TypeId(7)` = Text
/// - `TypeId(8)` = Unit
/// - `TypeId(9)` = Never
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    /// Types indexed by TypeId.0
    types: Vec<DeclaredType>,
    /// Named type lookup (records, enums, opaque types)
    names: HashMap<String, TypeId>,
    /// Next available ID
    next_id: u32,
}

impl TypeRegistry {
    /// Number of built-in types pre-registered on construction.
    const BUILTIN_COUNT: u32 = 10;

    /// Creates a new type registry with the built-in types pre-registered.
    pub fn new() -> Self {
        let types = vec![
            DeclaredType::Scalar(ScalarType::Bool),
            DeclaredType::Scalar(ScalarType::I8),
            DeclaredType::Scalar(ScalarType::I16),
            DeclaredType::Scalar(ScalarType::I32),
            DeclaredType::Scalar(ScalarType::I64),
            DeclaredType::Scalar(ScalarType::F32),
            DeclaredType::Scalar(ScalarType::F64),
            DeclaredType::Text,
            DeclaredType::Unit,
            DeclaredType::Never,
        ];

        TypeRegistry {
            types,
            names: HashMap::new(),
            next_id: Self::BUILTIN_COUNT,
        }
    }

    /// Registers a type and returns its new [`TypeId`].
    ///
    /// The type is added without a name. Use [`register_named`](Self::register_named)
    /// for named types (enums, opaque types) and
    /// [`register_record`](Self::register_record) for records.
    pub fn register(&mut self, ty: DeclaredType) -> TypeId {
        let id = TypeId(self.next_id);
        self.types.push(ty);
        self.next_id += 1;
        id
    }

    /// The id the next registration receives. Lets a record refer to itself
    /// through a wrapper type registered just before it.
    pub fn next_id(&self) -> TypeId {
        TypeId(self.next_id)
    }

    /// Registers a named type, returning its [`TypeId`].
    ///
    /// Returns [`CoreError::DuplicateTypeName`] if a type with the same name
    /// already exists.
    pub fn register_named(&mut self, name: &str, ty: DeclaredType) -> Result<TypeId, CoreError> {
        if self.names.contains_key(name) {
            return Err(CoreError::DuplicateTypeName {
                name: name.to_string(),
            });
        }
        let id = self.register(ty);
        self.names.insert(name.to_string(), id);
        Ok(id)
    }

    /// Registers a record definition under its own name.
    ///
    /// The record's `type_id` is overwritten with the assigned id. The base
    /// (if any) must already be a registered record, every declared field
    /// type must exist, and the options must be consistent.
    pub fn register_record(&mut self, mut def: RecordDef) -> Result<TypeId, CoreError> {
        if let Some(base) = def.base {
            if self.record(base).is_none() {
                return Err(CoreError::InvalidBase {
                    record: def.name.clone(),
                    base,
                });
            }
        }
        for field in def.fields.values() {
            if let Some(ty) = field.declared_type {
                if self.get(ty).is_none() {
                    return Err(CoreError::UnknownFieldType {
                        record: def.name.clone(),
                        field: field.name.clone(),
                        ty,
                    });
                }
            }
        }
        if def.options.order && !def.options.eq {
            return Err(CoreError::InvalidOptions {
                record: def.name.clone(),
                reason: "order requires eq".into(),
            });
        }
        if def.options.kw_only {
            for field in def.fields.values_mut() {
                field.kw_only = true;
            }
        }

        def.type_id = TypeId(self.next_id);
        let name = def.name.clone();
        self.register_named(&name, DeclaredType::Record(def))
    }

    /// Looks up a type by its [`TypeId`].
    pub fn get(&self, id: TypeId) -> Option<&DeclaredType> {
        self.types.get(id.0 as usize)
    }

    /// Looks up a named type's [`TypeId`] by name.
    pub fn get_by_name(&self, name: &str) -> Option<TypeId> {
        self.names.get(name).copied()
    }

    /// Returns the record definition for `id`, or `None` if `id` is not a record.
    pub fn record(&self, id: TypeId) -> Option<&RecordDef> {
        match self.get(id) {
            Some(DeclaredType::Record(def)) => Some(def),
            _ => None,
        }
    }

    /// Returns `true` if `id` names a registered record type.
    pub fn is_record(&self, id: TypeId) -> bool {
        self.record(id).is_some()
    }

    /// Returns a printable name for any type id.
    pub fn display_name(&self, id: TypeId) -> String {
        match self.get(id) {
            Some(DeclaredType::Record(def)) => def.name.clone(),
            Some(DeclaredType::Enum(def)) => def.name.clone(),
            Some(DeclaredType::Opaque { name }) => name.clone(),
            _ => id.to_string(),
        }
    }

    /// Returns the record's inheritance chain, most-base first and the
    /// record itself last.
    pub fn ancestry(&self, id: TypeId) -> Result<Ancestry<'_>, CoreError> {
        let mut chain = Ancestry::new();
        let mut current = Some(id);
        while let Some(cur) = current {
            let def = self.record(cur).ok_or_else(|| match self.get(cur) {
                Some(_) => CoreError::NotARecord { id: cur },
                None => CoreError::TypeNotFound { id: cur },
            })?;
            chain.push(def);
            current = def.base;
        }
        chain.reverse();
        Ok(chain)
    }

    /// Returns the record's fields merged along its ancestry.
    ///
    /// Base fields come first. A record redeclaring a field of one of its
    /// bases replaces that field in place, keeping the base's position.
    pub fn fields(&self, id: TypeId) -> Result<IndexMap<&str, &FieldDef>, CoreError> {
        let mut merged = IndexMap::new();
        for def in self.ancestry(id)? {
            for (name, field) in &def.fields {
                merged.insert(name.as_str(), field);
            }
        }
        Ok(merged)
    }

    /// Returns the record's namespace members merged along its ancestry.
    ///
    /// A member redeclared under the same name by a more-derived record
    /// replaces the base member in place; new names are appended.
    pub fn namespace(&self, id: TypeId) -> Result<IndexMap<&str, &Attribute>, CoreError> {
        let mut merged = IndexMap::new();
        for def in self.ancestry(id)? {
            for (name, member) in &def.namespace {
                merged.insert(name.as_str(), member);
            }
        }
        Ok(merged)
    }

    /// Returns the pre-registered [`TypeId`] for a scalar type.
    pub fn scalar_type_id(&self, scalar: ScalarType) -> TypeId {
        match scalar {
            ScalarType::Bool => TypeId::BOOL,
            ScalarType::I8 => TypeId::I8,
            ScalarType::I16 => TypeId::I16,
            ScalarType::I32 => TypeId::I32,
            ScalarType::I64 => TypeId::I64,
            ScalarType::F32 => TypeId::F32,
            ScalarType::F64 => TypeId::F64,
        }
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

//! Record definitions, field descriptors and keyword construction.
//!
//! A [`RecordDef`] declares its own fields (insertion-ordered), an optional
//! single base record, a namespace of named members, validators and
//! record-level options. Registered records are constructed from a
//! name-to-value mapping with [`TypeRegistry::construct`], which fills
//! defaults and runs every validator along the ancestry.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::attr::Attribute;
use crate::error::{CoreError, ValidationError, Violation};
use crate::type_id::{TypeId, TypeRegistry};
use crate::value::Value;

/// Open key-to-value mapping attached to a field.
#[derive(Debug, Clone, Default)]
pub struct Metadata(IndexMap<String, Attribute>);

impl Metadata {
    pub fn new() -> Self {
        Metadata(IndexMap::new())
    }

    /// Adds an entry, returning the mapping (builder style).
    pub fn with<T: std::any::Any + Send + Sync>(mut self, key: impl Into<String>, value: T) -> Self {
        self.0.insert(key.into(), Attribute::new(value));
        self
    }

    /// Inserts an attribute, returning the previous one under `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: Attribute) -> Option<Attribute> {
        self.0.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<&Attribute> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Attribute)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// A single declared field of a record.
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: String,
    /// Declared type, used for type-driven inference. `None` = unannotated.
    pub declared_type: Option<TypeId>,
    pub default: Option<Value>,
    /// Whether the field is a constructor parameter.
    pub init: bool,
    pub repr: bool,
    /// Carried for callers; instances are not hashable.
    pub hash: bool,
    pub compare: bool,
    pub kw_only: bool,
    pub metadata: Metadata,
}

impl FieldDef {
    /// A constructor field of the given declared type with default flags.
    pub fn new(name: impl Into<String>, declared_type: TypeId) -> Self {
        FieldDef {
            declared_type: Some(declared_type),
            ..FieldDef::untyped(name)
        }
    }

    /// A constructor field with no declared type.
    pub fn untyped(name: impl Into<String>) -> Self {
        FieldDef {
            name: name.into(),
            declared_type: None,
            default: None,
            init: true,
            repr: true,
            hash: true,
            compare: true,
            kw_only: false,
            metadata: Metadata::new(),
        }
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Excludes the field from the constructor.
    pub fn no_init(mut self) -> Self {
        self.init = false;
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

/// Record-level options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordOptions {
    /// Render fields in `Display`; otherwise only the record name is shown.
    pub repr: bool,
    /// Instances compare equal by their `compare` fields. Without it an
    /// instance equals only itself and its clones.
    pub eq: bool,
    /// Instances are ordered by their `compare` fields, in declaration
    /// order (requires `eq`).
    pub order: bool,
    /// Carried for callers; instances expose no mutation either way.
    pub frozen: bool,
    /// Every own field is keyword-only.
    pub kw_only: bool,
}

impl Default for RecordOptions {
    fn default() -> Self {
        RecordOptions {
            repr: true,
            eq: true,
            order: false,
            frozen: false,
            kw_only: false,
        }
    }
}

/// A check run on every constructed instance.
pub type Validator = Arc<dyn Fn(&RecordInstance) -> Result<(), Violation> + Send + Sync>;

/// A record type declaration.
#[derive(Clone)]
pub struct RecordDef {
    pub name: String,
    /// Assigned by [`TypeRegistry::register_record`].
    pub type_id: TypeId,
    pub base: Option<TypeId>,
    /// Own fields, in declaration order.
    pub fields: IndexMap<String, FieldDef>,
    /// Own named members, in declaration order.
    pub namespace: IndexMap<String, Attribute>,
    pub validators: Vec<Validator>,
    pub options: RecordOptions,
}

impl RecordDef {
    pub fn new(name: impl Into<String>) -> Self {
        RecordDef {
            name: name.into(),
            type_id: TypeId::UNIT,
            base: None,
            fields: IndexMap::new(),
            namespace: IndexMap::new(),
            validators: Vec::new(),
            options: RecordOptions::default(),
        }
    }

    pub fn extends(mut self, base: TypeId) -> Self {
        self.base = Some(base);
        self
    }

    /// Declares a field. Redeclaring a name replaces the earlier field.
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }

    /// Declares a named namespace member. Redeclaring a name replaces it.
    pub fn member<T: std::any::Any + Send + Sync>(mut self, name: impl Into<String>, value: T) -> Self {
        self.namespace.insert(name.into(), Attribute::new(value));
        self
    }

    pub fn validator<F>(mut self, check: F) -> Self
    where
        F: Fn(&RecordInstance) -> Result<(), Violation> + Send + Sync + 'static,
    {
        self.validators.push(Arc::new(check));
        self
    }

    pub fn options(mut self, options: RecordOptions) -> Self {
        self.options = options;
        self
    }
}

impl fmt::Debug for RecordDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordDef")
            .field("name", &self.name)
            .field("type_id", &self.type_id)
            .field("base", &self.base)
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .field("namespace", &self.namespace)
            .field("validators", &self.validators.len())
            .field("options", &self.options)
            .finish()
    }
}

/// Which fields take part in rendering and comparison.
///
/// `None` means every field. The default applies to deserialized instances.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Layout {
    repr: Option<Vec<String>>,
    compare: Option<Vec<String>>,
    identity: bool,
    order: bool,
}

/// A constructed record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordInstance {
    type_id: TypeId,
    name: String,
    values: IndexMap<String, Value>,
    #[serde(skip)]
    layout: Arc<Layout>,
}

impl RecordInstance {
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Name of the record type.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// All assigned fields in declaration order.
    pub fn values(&self) -> &IndexMap<String, Value> {
        &self.values
    }

    pub fn into_values(self) -> IndexMap<String, Value> {
        self.values
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl PartialEq for RecordInstance {
    fn eq(&self, other: &Self) -> bool {
        if self.type_id != other.type_id {
            return false;
        }
        if self.layout.identity {
            return Arc::ptr_eq(&self.layout, &other.layout);
        }
        match &self.layout.compare {
            Some(fields) => fields
                .iter()
                .all(|f| self.values.get(f) == other.values.get(f)),
            None => self.values == other.values,
        }
    }
}

impl PartialOrd for RecordInstance {
    /// Instances of one record type declared with `order` compare
    /// lexicographically by their `compare` fields. Anything else is
    /// unordered.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.type_id != other.type_id || !self.layout.order || self.layout.identity {
            return None;
        }
        let keys: Vec<&String> = match &self.layout.compare {
            Some(fields) => fields.iter().collect(),
            None => self.values.keys().collect(),
        };
        for key in keys {
            match self.values.get(key).partial_cmp(&other.values.get(key))? {
                Ordering::Equal => continue,
                ord => return Some(ord),
            }
        }
        Some(Ordering::Equal)
    }
}

impl fmt::Display for RecordInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        let mut first = true;
        for (name, value) in &self.values {
            let shown = match &self.layout.repr {
                Some(fields) => fields.iter().any(|r| r == name),
                None => true,
            };
            if !shown {
                continue;
            }
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            write!(f, "{name}={value:?}")?;
        }
        write!(f, ")")
    }
}

impl TypeRegistry {
    /// Constructs an instance of record `id` from keyword arguments.
    ///
    /// Every argument must name a constructor field. Constructor fields not
    /// supplied take their default; a constructor field with no default must
    /// be supplied. Non-constructor fields with a default are set to it.
    /// Validators run base-first and all violations are reported together
    /// as [`CoreError::Validation`].
    pub fn construct(
        &self,
        id: TypeId,
        mut args: IndexMap<String, Value>,
    ) -> Result<RecordInstance, CoreError> {
        let ancestry = self.ancestry(id)?;
        let def = *ancestry.last().ok_or(CoreError::NotARecord { id })?;
        let fields = self.fields(id)?;

        if let Some(unexpected) = args
            .keys()
            .find(|k| !fields.get(k.as_str()).is_some_and(|f| f.init))
        {
            return Err(CoreError::UnexpectedArgument {
                record: def.name.clone(),
                field: unexpected.clone(),
            });
        }

        let mut values = IndexMap::with_capacity(fields.len());
        for (name, field) in &fields {
            let value = match args.shift_remove(*name) {
                Some(v) => Some(v),
                None if field.init && field.default.is_none() => {
                    return Err(CoreError::MissingArgument {
                        record: def.name.clone(),
                        field: (*name).to_string(),
                    })
                }
                None => field.default.clone(),
            };
            if let Some(v) = value {
                values.insert((*name).to_string(), v);
            }
        }

        let repr = if def.options.repr {
            fields
                .values()
                .filter(|f| f.repr)
                .map(|f| f.name.clone())
                .collect()
        } else {
            Vec::new()
        };
        let layout = Layout {
            repr: Some(repr),
            compare: Some(
                fields
                    .values()
                    .filter(|f| f.compare)
                    .map(|f| f.name.clone())
                    .collect(),
            ),
            identity: !def.options.eq,
            order: def.options.order,
        };

        let instance = RecordInstance {
            type_id: def.type_id,
            name: def.name.clone(),
            values,
            layout: Arc::new(layout),
        };

        let violations: Vec<Violation> = ancestry
            .iter()
            .flat_map(|d| d.validators.iter())
            .filter_map(|check| check(&instance).err())
            .collect();
        if !violations.is_empty() {
            return Err(ValidationError {
                record: def.name.clone(),
                violations,
            }
            .into());
        }

        Ok(instance)
    }
}

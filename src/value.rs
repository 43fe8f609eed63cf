use indexmap::IndexMap;
use num_bigint::BigInt;
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};

/// A raw bit-sequence, as produced by the `BitSet` codec. Bit 0 is the
/// first bit read, regardless of the storage byte order used on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BitSet {
    pub bits: Vec<bool>,
}

impl BitSet {
    pub fn new(bits: Vec<bool>) -> Self {
        Self { bits }
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }
}

/// A host object a context entry may carry, letting expressions call
/// methods on it (`#deviceTypes.getDeviceTypeName(code)`). This is the
/// evaluator's only way to reach user code; codecs never interpret
/// strings directly.
pub trait HostObject: fmt::Debug + Send + Sync {
    fn call(&self, method: &str, args: &[Value]) -> Result<Value>;
}

/// The neutral, dynamically-typed runtime value a Template decodes into
/// and encodes from. See SPEC_FULL.md §2 for why this replaces a
/// generic `Template<T>` bound to a concrete Rust type.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    BigInt(BigInt),
    Float(f64),
    Str(String),
    Bits(BitSet),
    Array(Vec<Value>),
    Struct(StructValue),
    Host(Arc<dyn HostObject>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::BigInt(a), Value::BigInt(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bits(a), Value::Bits(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Struct(a), Value::Struct(b)) => a == b,
            (Value::Host(a), Value::Host(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// A decoded (or to-be-encoded) struct-shaped value: the template name it
/// belongs to, plus its fields in declared order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructValue {
    pub type_name: String,
    pub fields: IndexMap<String, Value>,
}

impl StructValue {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: IndexMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }
}

impl Value {
    pub fn as_i64(&self) -> Result<i64> {
        match self {
            Value::Int(i) => Ok(*i),
            Value::BigInt(b) => b.try_into().map_err(|_| {
                Error::Expression {
                    expression: "<value>".into(),
                    message: "arbitrary-precision integer does not fit in i64".into(),
                }
            }),
            Value::Bool(b) => Ok(if *b { 1 } else { 0 }),
            Value::Float(f) => Ok(*f as i64),
            other => Err(Error::Expression {
                expression: "<value>".into(),
                message: format!("expected integer, got {other:?}"),
            }),
        }
    }

    pub fn as_u64(&self) -> Result<u64> {
        self.as_i64().map(|v| v as u64)
    }

    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            Value::Int(i) => Ok(*i != 0),
            other => Err(Error::Expression {
                expression: "<value>".into(),
                message: format!("expected boolean, got {other:?}"),
            }),
        }
    }

    pub fn as_str(&self) -> Result<&str> {
        match self {
            Value::Str(s) => Ok(s),
            other => Err(Error::Expression {
                expression: "<value>".into(),
                message: format!("expected string, got {other:?}"),
            }),
        }
    }

    pub fn as_struct(&self) -> Result<&StructValue> {
        match self {
            Value::Struct(s) => Ok(s),
            other => Err(Error::Expression {
                expression: "<value>".into(),
                message: format!("expected struct, got {other:?}"),
            }),
        }
    }

    pub fn type_name(&self) -> &str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::BigInt(_) => "bigint",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Bits(_) => "bitset",
            Value::Array(_) => "array",
            Value::Struct(s) => &s.type_name,
            Value::Host(_) => "host",
        }
    }
}

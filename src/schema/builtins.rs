//! Built-in types of the system namespace
//!
//! This module defines the type kinds of the schema language, the built-in
//! derivation chains between them and the facets each kind admits.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// Type Kinds
// =============================================================================

/// Kind of a type
///
/// The first four kinds are the abstract roots of the system namespace. Every
/// other kind is an atomic value kind; user-defined atomic types share the kind
/// of the built-in type they derive from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TypeKind {
    /// Root of all complex types
    ComplexType,
    /// Root of all simple types
    SimpleType,
    /// Root of all atomic types
    AtomicType,
    /// Root of all list types
    ListType,
    /// Unicode string
    String,
    /// String compared case-insensitively
    IgnoreCaseString,
    /// 96-bit decimal
    Decimal,
    /// Signed 64-bit integer
    Int64,
    /// Signed 32-bit integer
    Int32,
    /// Signed 16-bit integer
    Int16,
    /// Signed 8-bit integer
    SByte,
    /// Unsigned 64-bit integer
    UInt64,
    /// Unsigned 32-bit integer
    UInt32,
    /// Unsigned 16-bit integer
    UInt16,
    /// Unsigned 8-bit integer
    Byte,
    /// 64-bit float
    Double,
    /// 32-bit float
    Single,
    /// Boolean
    Boolean,
    /// Byte string
    Binary,
    /// GUID
    Guid,
    /// Time span
    Duration,
    /// Date and time with offset
    DateTime,
}

impl TypeKind {
    /// Every kind, roots first
    pub const ALL: [TypeKind; 22] = [
        TypeKind::ComplexType,
        TypeKind::SimpleType,
        TypeKind::AtomicType,
        TypeKind::ListType,
        TypeKind::String,
        TypeKind::IgnoreCaseString,
        TypeKind::Decimal,
        TypeKind::Int64,
        TypeKind::Int32,
        TypeKind::Int16,
        TypeKind::SByte,
        TypeKind::UInt64,
        TypeKind::UInt32,
        TypeKind::UInt16,
        TypeKind::Byte,
        TypeKind::Double,
        TypeKind::Single,
        TypeKind::Boolean,
        TypeKind::Binary,
        TypeKind::Guid,
        TypeKind::Duration,
        TypeKind::DateTime,
    ];

    /// Name of the built-in type of this kind in the system namespace
    pub fn name(&self) -> &'static str {
        match self {
            TypeKind::ComplexType => "ComplexType",
            TypeKind::SimpleType => "SimpleType",
            TypeKind::AtomicType => "AtomicType",
            TypeKind::ListType => "ListType",
            TypeKind::String => "String",
            TypeKind::IgnoreCaseString => "IgnoreCaseString",
            TypeKind::Decimal => "Decimal",
            TypeKind::Int64 => "Int64",
            TypeKind::Int32 => "Int32",
            TypeKind::Int16 => "Int16",
            TypeKind::SByte => "SByte",
            TypeKind::UInt64 => "UInt64",
            TypeKind::UInt32 => "UInt32",
            TypeKind::UInt16 => "UInt16",
            TypeKind::Byte => "Byte",
            TypeKind::Double => "Double",
            TypeKind::Single => "Single",
            TypeKind::Boolean => "Boolean",
            TypeKind::Binary => "Binary",
            TypeKind::Guid => "Guid",
            TypeKind::Duration => "Duration",
            TypeKind::DateTime => "DateTime",
        }
    }

    /// Look up a kind by its built-in type name
    pub fn from_name(name: &str) -> Option<TypeKind> {
        TypeKind::ALL.iter().copied().find(|k| k.name() == name)
    }

    /// Kind of the built-in base type, `None` for the two roots
    pub fn base_kind(&self) -> Option<TypeKind> {
        match self {
            TypeKind::ComplexType | TypeKind::SimpleType => None,
            TypeKind::AtomicType | TypeKind::ListType => Some(TypeKind::SimpleType),
            TypeKind::IgnoreCaseString => Some(TypeKind::String),
            TypeKind::Int64 | TypeKind::UInt64 => Some(TypeKind::Decimal),
            TypeKind::Int32 => Some(TypeKind::Int64),
            TypeKind::Int16 => Some(TypeKind::Int32),
            TypeKind::SByte => Some(TypeKind::Int16),
            TypeKind::UInt32 => Some(TypeKind::UInt64),
            TypeKind::UInt16 => Some(TypeKind::UInt32),
            TypeKind::Byte => Some(TypeKind::UInt16),
            TypeKind::Single => Some(TypeKind::Double),
            _ => Some(TypeKind::AtomicType),
        }
    }

    /// Whether this is the complex root
    pub fn is_complex(&self) -> bool {
        *self == TypeKind::ComplexType
    }

    /// Whether this is a simple kind (root, list or atomic)
    pub fn is_simple(&self) -> bool {
        !self.is_complex()
    }

    /// Whether this is a concrete atomic value kind
    pub fn is_atomic(&self) -> bool {
        !matches!(
            self,
            TypeKind::ComplexType | TypeKind::SimpleType | TypeKind::AtomicType | TypeKind::ListType
        )
    }

    /// Whether this is the list kind
    pub fn is_list(&self) -> bool {
        *self == TypeKind::ListType
    }

    /// Whether this is one of the three simple roots that cannot be derived from directly
    pub fn is_simple_root(&self) -> bool {
        matches!(
            self,
            TypeKind::SimpleType | TypeKind::AtomicType | TypeKind::ListType
        )
    }

    /// Whether this kind belongs to the decimal family
    pub fn is_decimal_family(&self) -> bool {
        matches!(
            self,
            TypeKind::Decimal
                | TypeKind::Int64
                | TypeKind::Int32
                | TypeKind::Int16
                | TypeKind::SByte
                | TypeKind::UInt64
                | TypeKind::UInt32
                | TypeKind::UInt16
                | TypeKind::Byte
        )
    }

    /// Whether this kind is an integer kind
    pub fn is_integer(&self) -> bool {
        self.is_decimal_family() && *self != TypeKind::Decimal
    }

    /// Whether this kind belongs to the double family
    pub fn is_double_family(&self) -> bool {
        matches!(self, TypeKind::Double | TypeKind::Single)
    }

    /// Whether this kind belongs to the string family
    pub fn is_string_family(&self) -> bool {
        matches!(self, TypeKind::String | TypeKind::IgnoreCaseString)
    }

    /// Facets admitted by this kind
    pub fn admitted_facets(&self) -> &'static HashSet<FacetKind> {
        match self {
            TypeKind::String | TypeKind::IgnoreCaseString => &*STRING_FACETS,
            TypeKind::Binary => &*BINARY_FACETS,
            TypeKind::ListType => &*LIST_FACETS,
            TypeKind::Decimal => &*DECIMAL_FACETS,
            k if k.is_integer() => &*INTEGER_FACETS,
            TypeKind::Double | TypeKind::Single => &*ORDERED_FACETS,
            TypeKind::Duration | TypeKind::DateTime => &*ORDERED_FACETS,
            TypeKind::Boolean => &*BOOLEAN_FACETS,
            TypeKind::Guid => &*GUID_FACETS,
            _ => &*NO_FACETS,
        }
    }

    /// Whether this kind admits a facet
    pub fn admits(&self, facet: FacetKind) -> bool {
        self.admitted_facets().contains(&facet)
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// =============================================================================
// Facet Kinds
// =============================================================================

/// The facets of the schema language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FacetKind {
    /// `lengthrange min .. max`
    LengthRange,
    /// `precision n`
    Precision,
    /// `scale n`
    Scale,
    /// `valuerange [min .. max]`
    ValueRange,
    /// `enums { ... }`
    Enumeration,
    /// `pattern "..."`
    Pattern,
    /// `lists ItemType`
    ListItemType,
}

impl FacetKind {
    /// Keyword of the facet in schema text
    pub fn keyword(&self) -> &'static str {
        match self {
            FacetKind::LengthRange => "lengthrange",
            FacetKind::Precision => "precision",
            FacetKind::Scale => "scale",
            FacetKind::ValueRange => "valuerange",
            FacetKind::Enumeration => "enums",
            FacetKind::Pattern => "pattern",
            FacetKind::ListItemType => "lists",
        }
    }
}

impl fmt::Display for FacetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.keyword())
    }
}

// =============================================================================
// Admitted Facets Sets
// =============================================================================

lazy_static::lazy_static! {
    /// Facets admitted for string types
    pub static ref STRING_FACETS: HashSet<FacetKind> = {
        let mut s = HashSet::new();
        s.insert(FacetKind::LengthRange);
        s.insert(FacetKind::Enumeration);
        s.insert(FacetKind::Pattern);
        s
    };

    /// Facets admitted for the binary type
    pub static ref BINARY_FACETS: HashSet<FacetKind> = {
        let mut s = HashSet::new();
        s.insert(FacetKind::LengthRange);
        s
    };

    /// Facets admitted for list types
    pub static ref LIST_FACETS: HashSet<FacetKind> = {
        let mut s = HashSet::new();
        s.insert(FacetKind::LengthRange);
        s.insert(FacetKind::ListItemType);
        s
    };

    /// Facets admitted for the decimal type
    pub static ref DECIMAL_FACETS: HashSet<FacetKind> = {
        let mut s = HashSet::new();
        s.insert(FacetKind::Precision);
        s.insert(FacetKind::Scale);
        s.insert(FacetKind::ValueRange);
        s.insert(FacetKind::Enumeration);
        s.insert(FacetKind::Pattern);
        s
    };

    /// Facets admitted for integer types
    pub static ref INTEGER_FACETS: HashSet<FacetKind> = {
        let mut s = HashSet::new();
        s.insert(FacetKind::Precision);
        s.insert(FacetKind::ValueRange);
        s.insert(FacetKind::Enumeration);
        s.insert(FacetKind::Pattern);
        s
    };

    /// Facets admitted for floating point and temporal types
    pub static ref ORDERED_FACETS: HashSet<FacetKind> = {
        let mut s = HashSet::new();
        s.insert(FacetKind::ValueRange);
        s.insert(FacetKind::Enumeration);
        s.insert(FacetKind::Pattern);
        s
    };

    /// Facets admitted for the boolean type
    pub static ref BOOLEAN_FACETS: HashSet<FacetKind> = {
        let mut s = HashSet::new();
        s.insert(FacetKind::Pattern);
        s
    };

    /// Facets admitted for the guid type
    pub static ref GUID_FACETS: HashSet<FacetKind> = {
        let mut s = HashSet::new();
        s.insert(FacetKind::Enumeration);
        s.insert(FacetKind::Pattern);
        s
    };

    /// The roots admit no facet
    pub static ref NO_FACETS: HashSet<FacetKind> = HashSet::new();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_round_trip() {
        for kind in TypeKind::ALL {
            assert_eq!(TypeKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(TypeKind::from_name("Int128"), None);
    }

    #[test]
    fn test_builtin_chains_end_at_roots() {
        for kind in TypeKind::ALL {
            let mut current = kind;
            let mut steps = 0;
            while let Some(base) = current.base_kind() {
                current = base;
                steps += 1;
                assert!(steps < TypeKind::ALL.len());
            }
            assert!(matches!(current, TypeKind::ComplexType | TypeKind::SimpleType));
        }
        assert_eq!(TypeKind::SByte.base_kind(), Some(TypeKind::Int16));
        assert_eq!(TypeKind::Single.base_kind(), Some(TypeKind::Double));
    }

    #[test]
    fn test_kind_categories() {
        assert!(TypeKind::ComplexType.is_complex());
        assert!(TypeKind::ListType.is_simple());
        assert!(!TypeKind::ListType.is_atomic());
        assert!(TypeKind::Int32.is_atomic());
        assert!(TypeKind::Int32.is_integer());
        assert!(!TypeKind::Decimal.is_integer());
        assert!(TypeKind::AtomicType.is_simple_root());
    }

    #[test]
    fn test_admitted_facets() {
        assert!(TypeKind::String.admits(FacetKind::LengthRange));
        assert!(TypeKind::Binary.admits(FacetKind::LengthRange));
        assert!(TypeKind::ListType.admits(FacetKind::LengthRange));
        assert!(!TypeKind::Int32.admits(FacetKind::LengthRange));
        assert!(TypeKind::Decimal.admits(FacetKind::Scale));
        assert!(!TypeKind::Int64.admits(FacetKind::Scale));
        assert!(!TypeKind::String.admits(FacetKind::ListItemType));
        assert!(TypeKind::ComplexType.admitted_facets().is_empty());
    }
}

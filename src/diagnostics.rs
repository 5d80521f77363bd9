//! Diagnostic ledger
//!
//! Every compiler and validator pass records its findings as [`Diagnostic`]s
//! in a [`Context`]. The context is append-only except for [`Context::restore`],
//! which truncates back to a [`Marker`] taken earlier; together with
//! [`Context::has_errors_since`] this gives a checkpoint/rollback mechanism for
//! speculative work.
//!
//! Diagnostic codes are partitioned into bands that downstream tooling relies
//! on:
//!
//! - `-1000..=-1999`: parser faults
//! - `-2000..=-2999`: compiler (semantic) faults
//! - `0..`: runtime/structural validation faults

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::objects::ObjectId;

/// Severity of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Makes the compilation or validation fail
    Error,
    /// Reported but does not affect validity
    Warning,
    /// Informational
    Info,
}

impl Severity {
    /// Get the severity as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Line/column position in a source file (both 1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TextPosition {
    /// Line number
    pub line: u32,
    /// Column number
    pub column: u32,
}

impl TextPosition {
    /// Create a new position
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// A region of a source file
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TextSpan {
    /// Path of the file the span points into
    pub file_path: String,
    /// Start position (inclusive)
    pub start: TextPosition,
    /// End position (exclusive)
    pub end: TextPosition,
}

impl TextSpan {
    /// Create a new span
    pub fn new(file_path: impl Into<String>, start: TextPosition, end: TextPosition) -> Self {
        Self {
            file_path: file_path.into(),
            start,
            end,
        }
    }

    /// A span covering a single line range, handy for tests and loaders
    pub fn at_line(file_path: impl Into<String>, line: u32) -> Self {
        Self::new(
            file_path,
            TextPosition::new(line, 1),
            TextPosition::new(line + 1, 1),
        )
    }
}

impl fmt::Display for TextSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.file_path, self.start.line, self.start.column
        )
    }
}

/// Numeric diagnostic codes
///
/// The discriminants are part of the public contract and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum DiagnosticCode {
    // Parser band
    /// Malformed schema text
    Parsing = -1000,
    /// A serialized parse tree could not be loaded
    InvalidSchemaFile = -1001,

    // Compiler band: namespaces and names
    /// Internal compiler error (a bug, not a bad input)
    InternalCompilerError = -2000,
    /// Two members of one logical namespace share a name
    DuplicateNamespaceMember = -2001,
    /// Two imports in one namespace declaration share an alias
    DuplicateImportAlias = -2002,
    /// The alias `sys` is reserved for the system namespace
    AliasSysIsReserved = -2003,
    /// An import names a namespace URI that is not declared
    InvalidNamespaceReference = -2004,
    /// A qualified name uses an alias that is not imported
    InvalidImportAliasReference = -2005,
    /// A name does not denote any namespace member
    InvalidNameReference = -2006,
    /// An unqualified name matches members of several imported namespaces
    AmbiguousNameReference = -2007,
    /// A name denotes a member that is not a type
    InvalidTypeNameReference = -2008,
    /// A name denotes a member that is not a global attribute
    InvalidAttributeNameReference = -2009,
    /// A name denotes a member that is not a global element
    InvalidElementNameReference = -2010,
    /// A declaration depends on itself
    CircularReferenceDetected = -2011,

    // Compiler band: type derivation
    /// The base type is sealed
    BaseTypeIsSealed = -2012,
    /// `sys:ComplexType` cannot be extended or restricted directly
    CannotExtendOrRestrictSysComplexType = -2013,
    /// `sys:SimpleType`, `sys:AtomicType` and `sys:ListType` cannot be derived from directly
    CannotExtendOrRestrictSysSimpleType = -2014,
    /// Simple content cannot be extended with structural children
    CannotExtendSimpleChildWithComplexChildren = -2015,
    /// Structural children cannot be extended with simple content
    CannotExtendChildrenWithSimpleChild = -2016,
    /// Attribute name collides with an existing attribute
    DuplicateAttributeName = -2017,
    /// Child member name collides with an existing member
    DuplicateMemberName = -2018,
    /// A restricting attribute is optional while the restricted one is required
    AttributeIsOptionalButRestrictedIsRequired = -2019,
    /// A restricting attribute is nullable while the restricted one is not
    AttributeIsNullableButRestrictedIsNotNullable = -2020,
    /// A required base attribute is neither re-declared nor deletable
    RequiredAttributeNotRestricting = -2021,
    /// A restricting attribute's type does not derive from the restricted one's
    AttributeTypeNotEqualToOrDeriveFromRestricted = -2022,
    /// A restriction names an attribute the base does not have
    CannotFindRestrictedAttribute = -2023,
    /// A restriction names a child member the base does not have
    CannotFindRestrictedChildMember = -2024,
    /// A restricting member has a different kind than the restricted member
    MemberKindNotEqualToRestricted = -2025,
    /// A restricting member loosens min occurs
    MinOccursNotGreaterThanOrEqualToRestricted = -2026,
    /// A restricting member loosens max occurs
    MaxOccursNotLessThanOrEqualToRestricted = -2027,
    /// A required base member is neither re-declared nor deletable
    RequiredChildMemberNotRestricting = -2028,
    /// A restricting element's type does not derive from the restricted one's
    ElementTypeNotEqualToOrDeriveFromRestricted = -2029,
    /// A restricting element is nullable while the restricted one is not
    ElementIsNullableButRestrictedIsNotNullable = -2030,
    /// A restricting element reference neither equals nor substitutes the restricted one
    ElementReferenceNotEqualToOrSubstituteRestricted = -2031,
    /// A restricting simple child type does not derive from the restricted one
    SimpleChildTypeNotEqualToOrDeriveFromRestricted = -2032,
    /// Facets were declared on a complex type restriction
    FacetsNotAllowedOnComplexType = -2033,
    /// Attributes or children were declared on a simple type restriction
    AttributesOrChildrenNotAllowedOnSimpleType = -2034,
    /// min occurs is greater than max occurs, or max occurs is zero
    InvalidOccurrence = -2035,
    /// The substituted element is sealed
    SubstitutedElementIsSealed = -2036,
    /// A substituting element's type does not derive from the substituted one's
    ElementTypeNotEqualToOrDeriveFromSubstituted = -2037,
    /// A substituting element is nullable while the substituted one is not
    ElementIsNullableButSubstitutedIsNotNullable = -2038,
    /// A simple type was required but a complex type was given
    TypeIsNotSimple = -2039,

    // Compiler band: facets
    /// A facet does not apply to the type kind
    FacetNotApplicable = -2040,
    /// Min length is below the base min length
    MinLengthBelowBase = -2041,
    /// Max length is above the base max length
    MaxLengthAboveBase = -2042,
    /// Min length is greater than max length
    MinLengthGreaterThanMaxLength = -2043,
    /// Precision is above the base precision
    PrecisionAboveBase = -2044,
    /// Scale is above the base scale
    ScaleAboveBase = -2045,
    /// Scale is greater than precision
    ScaleGreaterThanPrecision = -2046,
    /// Min value is below the base min value
    MinValueBelowBase = -2047,
    /// Max value is above the base max value
    MaxValueAboveBase = -2048,
    /// Min value is greater than max value
    MinValueGreaterThanMaxValue = -2049,
    /// An enumeration item is not in the base enumeration
    EnumItemNotInBase = -2050,
    /// Two enumeration items share a display name
    DuplicateEnumItemName = -2051,
    /// A pattern is not a valid regular expression
    InvalidPattern = -2052,
    /// A literal cannot be parsed as a value of the type kind
    InvalidAtomValueLiteral = -2053,
    /// A list item type does not derive from the restricted item type
    ListItemTypeNotEqualToOrDeriveFromRestricted = -2054,
    /// Precision must be greater than zero
    InvalidPrecision = -2055,
    /// A derivation chain exceeded the configured depth
    DerivationTooDeep = -2056,

    // Runtime band
    /// A required attribute is missing
    RequiredAttributeNotFound = 1,
    /// An attribute is not declared by the type
    RedundantAttribute = 2,
    /// A required child member is missing
    RequiredChildMemberNotFound = 3,
    /// A child is not declared by the type
    RedundantChildMember = 4,
    /// An abstract element was used directly
    ElementIsAbstract = 5,
    /// An abstract type was used directly
    TypeIsAbstract = 6,
    /// The instance type is not equal to or derived from the expected type
    InvalidObjectType = 7,
    /// The instance names a type the schema does not declare
    UnknownTypeName = 8,
    /// An element without a value is not nullable
    ElementIsNotNullable = 9,
    /// An attribute without a value is not nullable
    AttributeIsNotNullable = 10,
    /// The value's kind does not match the type kind
    ValueKindMismatch = 11,
    /// The value length is outside the length range
    LengthNotInRange = 12,
    /// The value has more significant digits than allowed
    PrecisionExceeded = 13,
    /// The value has more fractional digits than allowed
    ScaleExceeded = 14,
    /// The value is outside the value range
    ValueNotInRange = 15,
    /// The value is not in the enumeration
    ValueNotInEnumeration = 16,
    /// The value matches none of the patterns
    PatternNotMatched = 17,
    /// A child list has fewer items than min occurs
    ChildListCountLessThanMinOccurs = 18,
    /// A child list has more items than max occurs
    ChildListCountGreaterThanMaxOccurs = 19,
    /// A choice instance holds more than one member
    MultipleChoiceMembers = 20,
    /// The object tree is deeper than the configured limit
    ObjectTooDeep = 21,
    /// A container holds an object of the wrong kind
    InvalidObjectKind = 22,
}

impl DiagnosticCode {
    /// The numeric value of the code
    pub fn value(self) -> i32 {
        self as i32
    }

    /// Whether the code lies in the parser band
    pub fn is_parsing(self) -> bool {
        (-1999..=-1000).contains(&self.value())
    }

    /// Whether the code lies in the compiler band
    pub fn is_compiler(self) -> bool {
        (-2999..=-2000).contains(&self.value())
    }

    /// Whether the code lies in the runtime band
    pub fn is_runtime(self) -> bool {
        self.value() >= 0
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.value())
    }
}

/// A single diagnostic message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity level
    pub severity: Severity,
    /// Diagnostic code
    pub code: DiagnosticCode,
    /// Human-readable message
    pub message: String,
    /// Source location, when the diagnostic comes from schema or data text
    pub span: Option<TextSpan>,
    /// Offending runtime object, when the diagnostic comes from validation
    #[serde(skip)]
    pub object: Option<ObjectId>,
}

impl Diagnostic {
    /// Create a new diagnostic
    pub fn new(severity: Severity, code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            span: None,
            object: None,
        }
    }

    /// Create an error diagnostic
    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, message)
    }

    /// Create a warning diagnostic
    pub fn warning(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, message)
    }

    /// Set the source span
    pub fn with_span(mut self, span: Option<&TextSpan>) -> Self {
        self.span = span.cloned();
        self
    }

    /// Set the offending object
    pub fn with_object(mut self, object: ObjectId) -> Self {
        self.object = Some(object);
        self
    }

    /// Whether this diagnostic has error severity
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref span) = self.span {
            write!(f, "{}: ", span)?;
        }
        write!(f, "{} {}: {}", self.severity, self.code.value(), self.message)?;
        if let Some(object) = self.object {
            write!(f, " (object {})", object)?;
        }
        Ok(())
    }
}

/// A checkpoint over the diagnostic list
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Marker(usize);

/// The diagnostic ledger of one compilation or validation pass
///
/// A context must not be shared between concurrent passes; build a fresh one
/// for each.
#[derive(Debug, Default)]
pub struct Context {
    diagnostics: Vec<Diagnostic>,
}

impl Context {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a diagnostic
    pub fn add(&mut self, diagnostic: Diagnostic) {
        tracing::trace!(code = diagnostic.code.value(), "{}", diagnostic.message);
        self.diagnostics.push(diagnostic);
    }

    /// Append an error diagnostic with an optional span
    pub fn error(&mut self, code: DiagnosticCode, message: impl Into<String>, span: Option<&TextSpan>) {
        self.add(Diagnostic::error(code, message).with_span(span));
    }

    /// Append every diagnostic from an iterator
    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        for diagnostic in diagnostics {
            self.add(diagnostic);
        }
    }

    /// Take a checkpoint at the current end of the list
    pub fn mark(&self) -> Marker {
        Marker(self.diagnostics.len())
    }

    /// Whether any error-severity diagnostic was added since `marker`
    pub fn has_errors_since(&self, marker: Marker) -> bool {
        self.diagnostics
            .get(marker.0..)
            .map(|tail| tail.iter().any(Diagnostic::is_error))
            .unwrap_or(false)
    }

    /// Whether the context holds any error-severity diagnostic
    pub fn has_errors(&self) -> bool {
        self.has_errors_since(Marker(0))
    }

    /// Drop every diagnostic added since `marker`
    pub fn restore(&mut self, marker: Marker) {
        self.diagnostics.truncate(marker.0);
    }

    /// All diagnostics recorded so far
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Number of diagnostics recorded so far
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// Whether no diagnostic was recorded
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Count the diagnostics carrying `code`
    pub fn count(&self, code: DiagnosticCode) -> usize {
        self.diagnostics.iter().filter(|d| d.code == code).count()
    }

    /// Consume the context, returning its diagnostics
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

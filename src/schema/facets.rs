//! Facets of simple types
//!
//! A [`FacetSet`] holds the effective value restrictions of a simple type.
//! Restricting a type narrows the base set with the declared facets through
//! [`narrow`]; a narrowed set never admits a value its base rejects, except for
//! patterns, which accumulate as alternatives.
//!
//! Patterns are full-match anchored and compiled once per process through a
//! shared cache keyed by pattern text.

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use super::builtins::{FacetKind, TypeKind};
use crate::ast::FacetsNode;
use crate::diagnostics::{Diagnostic, DiagnosticCode, TextSpan};
use crate::values::{AtomicValue, SimpleValue};

/// The declared facets of one restriction step
pub type FacetPatch = FacetsNode;

/// Largest precision and scale of the decimal family
pub const MAX_PRECISION: u32 = 28;

// =============================================================================
// Pattern Cache
// =============================================================================

static PATTERN_CACHE: Lazy<RwLock<HashMap<String, Regex>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Compile a pattern as a full-match regular expression, reusing the cached
/// regex for the same text
pub fn compiled_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    if let Ok(cache) = PATTERN_CACHE.read() {
        if let Some(regex) = cache.get(pattern) {
            return Ok(regex.clone());
        }
    }
    let regex = Regex::new(&format!("^(?:{})$", pattern))?;
    if let Ok(mut cache) = PATTERN_CACHE.write() {
        cache.insert(pattern.to_string(), regex.clone());
    }
    Ok(regex)
}

// =============================================================================
// Facet Set
// =============================================================================

/// One bound of a value range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueBound {
    /// Bound value
    pub value: AtomicValue,
    /// Whether the bound value is itself in range
    pub inclusive: bool,
}

impl ValueBound {
    /// Create a bound
    pub fn new(value: AtomicValue, inclusive: bool) -> Self {
        Self { value, inclusive }
    }
}

impl fmt::Display for ValueBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({})",
            self.value,
            if self.inclusive { "inclusive" } else { "exclusive" }
        )
    }
}

/// Effective facets of a simple type
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FacetSet {
    /// Minimum length
    pub min_length: Option<u64>,
    /// Maximum length
    pub max_length: Option<u64>,
    /// Maximum total digits
    pub precision: Option<u32>,
    /// Maximum fractional digits
    pub scale: Option<u32>,
    /// Lower value bound
    pub min_value: Option<ValueBound>,
    /// Upper value bound
    pub max_value: Option<ValueBound>,
    /// Admitted values with their optional display names
    pub enumeration: Option<IndexMap<AtomicValue, Option<String>>>,
    /// Alternative patterns; a value must match at least one
    pub patterns: Vec<String>,
}

impl FacetSet {
    /// Whether no facet is set
    pub fn is_empty(&self) -> bool {
        *self == FacetSet::default()
    }

    /// Check a value against every facet, returning one diagnostic per
    /// violated facet
    pub fn validate(&self, value: &SimpleValue) -> Vec<Diagnostic> {
        let mut failures = Vec::new();

        if let Some(length) = value.length() {
            let too_short = self.min_length.map_or(false, |min| length < min);
            let too_long = self.max_length.map_or(false, |max| length > max);
            if too_short || too_long {
                failures.push(Diagnostic::error(
                    DiagnosticCode::LengthNotInRange,
                    format!(
                        "length {} is not in range {}..{}",
                        length,
                        self.min_length.map(|v| v.to_string()).unwrap_or_default(),
                        self.max_length.map(|v| v.to_string()).unwrap_or_default()
                    ),
                ));
            }
        }

        let atomic = match value.as_atomic() {
            Some(atomic) => atomic,
            None => return failures,
        };

        if let Some((precision, scale)) = atomic.digits() {
            if let Some(max) = self.precision {
                if precision > max {
                    failures.push(Diagnostic::error(
                        DiagnosticCode::PrecisionExceeded,
                        format!("'{}' has {} digits, at most {} allowed", atomic, precision, max),
                    ));
                }
            }
            if let Some(max) = self.scale {
                if scale > max {
                    failures.push(Diagnostic::error(
                        DiagnosticCode::ScaleExceeded,
                        format!(
                            "'{}' has {} fractional digits, at most {} allowed",
                            atomic, scale, max
                        ),
                    ));
                }
            }
        }

        let below = self
            .min_value
            .as_ref()
            .map_or(false, |bound| !satisfies_min(atomic, bound));
        let above = self
            .max_value
            .as_ref()
            .map_or(false, |bound| !satisfies_max(atomic, bound));
        if below || above {
            failures.push(Diagnostic::error(
                DiagnosticCode::ValueNotInRange,
                format!("'{}' is not in the value range", atomic),
            ));
        }

        if let Some(enumeration) = &self.enumeration {
            if !enumeration.contains_key(atomic) {
                failures.push(Diagnostic::error(
                    DiagnosticCode::ValueNotInEnumeration,
                    format!("'{}' is not in the enumeration", atomic),
                ));
            }
        }

        if !self.patterns.is_empty() {
            let text = atomic.to_string();
            let matched = self.patterns.iter().any(|pattern| {
                compiled_pattern(pattern)
                    .map(|regex| regex.is_match(&text))
                    .unwrap_or(false)
            });
            if !matched {
                failures.push(Diagnostic::error(
                    DiagnosticCode::PatternNotMatched,
                    format!("'{}' does not match any pattern", text),
                ));
            }
        }

        failures
    }
}

fn satisfies_min(value: &AtomicValue, bound: &ValueBound) -> bool {
    match value.compare(&bound.value) {
        Some(std::cmp::Ordering::Greater) => true,
        Some(std::cmp::Ordering::Equal) => bound.inclusive,
        _ => false,
    }
}

fn satisfies_max(value: &AtomicValue, bound: &ValueBound) -> bool {
    match value.compare(&bound.value) {
        Some(std::cmp::Ordering::Less) => true,
        Some(std::cmp::Ordering::Equal) => bound.inclusive,
        _ => false,
    }
}

/// Whether `new` is a lower bound at least as tight as `base`
fn narrows_min(base: &ValueBound, new: &ValueBound) -> bool {
    match new.value.compare(&base.value) {
        Some(std::cmp::Ordering::Greater) => true,
        Some(std::cmp::Ordering::Equal) => base.inclusive || !new.inclusive,
        _ => false,
    }
}

/// Whether `new` is an upper bound at least as tight as `base`
fn narrows_max(base: &ValueBound, new: &ValueBound) -> bool {
    match new.value.compare(&base.value) {
        Some(std::cmp::Ordering::Less) => true,
        Some(std::cmp::Ordering::Equal) => base.inclusive || !new.inclusive,
        _ => false,
    }
}

/// Whether a range with these bounds contains at least one value
fn is_ordered_range(min: &ValueBound, max: &ValueBound) -> bool {
    match min.value.compare(&max.value) {
        Some(std::cmp::Ordering::Less) => true,
        Some(std::cmp::Ordering::Equal) => min.inclusive && max.inclusive,
        _ => false,
    }
}

// =============================================================================
// Narrowing
// =============================================================================

/// Narrow `base` with the facets declared by one restriction step
///
/// Inapplicable facets are reported once each and left out of the result; all
/// other violations are collected before returning, so one call reports every
/// problem of the declaration. The list item type facet is only checked for
/// applicability here: resolving and checking the item type needs the schema.
pub fn narrow(
    kind: TypeKind,
    base: Option<&FacetSet>,
    declared: &FacetPatch,
) -> Result<FacetSet, Vec<Diagnostic>> {
    let mut result = base.cloned().unwrap_or_default();
    let mut errors = Vec::new();
    let span = declared.span.as_ref();

    let applicable = |facet: FacetKind, facet_span: Option<&TextSpan>, errors: &mut Vec<Diagnostic>| {
        if kind.admits(facet) {
            true
        } else {
            errors.push(
                Diagnostic::error(
                    DiagnosticCode::FacetNotApplicable,
                    format!("facet '{}' is not applicable to {} types", facet, kind),
                )
                .with_span(facet_span.or(span)),
            );
            false
        }
    };

    if let Some(range) = &declared.length_range {
        if applicable(FacetKind::LengthRange, range.span.as_ref(), &mut errors) {
            narrow_length(&mut result, base, range, &mut errors);
        }
    }

    if let Some(precision) = &declared.precision {
        if applicable(FacetKind::Precision, precision.span.as_ref(), &mut errors) {
            match check_digits(precision.value, precision.span.as_ref(), true) {
                Ok(value) => {
                    if base.and_then(|b| b.precision).map_or(false, |b| value > b) {
                        errors.push(
                            Diagnostic::error(
                                DiagnosticCode::PrecisionAboveBase,
                                format!(
                                    "precision {} is greater than the base precision {}",
                                    value,
                                    base.and_then(|b| b.precision).unwrap_or_default()
                                ),
                            )
                            .with_span(precision.span.as_ref()),
                        );
                    } else {
                        result.precision = Some(value);
                    }
                }
                Err(diagnostic) => errors.push(diagnostic),
            }
        }
    }

    if let Some(scale) = &declared.scale {
        if applicable(FacetKind::Scale, scale.span.as_ref(), &mut errors) {
            match check_digits(scale.value, scale.span.as_ref(), false) {
                Ok(value) => {
                    if base.and_then(|b| b.scale).map_or(false, |b| value > b) {
                        errors.push(
                            Diagnostic::error(
                                DiagnosticCode::ScaleAboveBase,
                                format!(
                                    "scale {} is greater than the base scale {}",
                                    value,
                                    base.and_then(|b| b.scale).unwrap_or_default()
                                ),
                            )
                            .with_span(scale.span.as_ref()),
                        );
                    } else {
                        result.scale = Some(value);
                    }
                }
                Err(diagnostic) => errors.push(diagnostic),
            }
        }
    }

    if let (Some(precision), Some(scale)) = (result.precision, result.scale) {
        if scale > precision {
            errors.push(
                Diagnostic::error(
                    DiagnosticCode::ScaleGreaterThanPrecision,
                    format!("scale {} is greater than precision {}", scale, precision),
                )
                .with_span(
                    declared
                        .scale
                        .as_ref()
                        .and_then(|s| s.span.as_ref())
                        .or(span),
                ),
            );
        }
    }

    if let Some(range) = &declared.value_range {
        if applicable(FacetKind::ValueRange, range.span.as_ref(), &mut errors) {
            narrow_value_range(kind, &mut result, base, range, &mut errors);
        }
    }

    if !declared.enums.is_empty() {
        let enum_span = declared.enums[0].span.as_ref();
        if applicable(FacetKind::Enumeration, enum_span, &mut errors) {
            narrow_enumeration(kind, &mut result, base, declared, &mut errors);
        }
    }

    if !declared.patterns.is_empty() {
        let pattern_span = declared.patterns[0].span.as_ref();
        if applicable(FacetKind::Pattern, pattern_span, &mut errors) {
            for pattern in &declared.patterns {
                if let Err(e) = compiled_pattern(&pattern.pattern) {
                    errors.push(
                        Diagnostic::error(
                            DiagnosticCode::InvalidPattern,
                            format!("invalid pattern '{}': {}", pattern.pattern, e),
                        )
                        .with_span(pattern.span.as_ref()),
                    );
                } else if !result.patterns.contains(&pattern.pattern) {
                    result.patterns.push(pattern.pattern.clone());
                }
            }
        }
    }

    if let Some(item) = &declared.list_item_type {
        applicable(FacetKind::ListItemType, item.span(), &mut errors);
    }

    tracing::trace!(%kind, errors = errors.len(), "narrowed facets");
    if errors.is_empty() {
        Ok(result)
    } else {
        Err(errors)
    }
}

fn check_digits(value: u64, span: Option<&TextSpan>, is_precision: bool) -> Result<u32, Diagnostic> {
    let min = if is_precision { 1 } else { 0 };
    if value < min || value > MAX_PRECISION as u64 {
        Err(Diagnostic::error(
            DiagnosticCode::InvalidPrecision,
            format!(
                "{} {} is not in range {}..{}",
                if is_precision { "precision" } else { "scale" },
                value,
                min,
                MAX_PRECISION
            ),
        )
        .with_span(span))
    } else {
        Ok(value as u32)
    }
}

fn narrow_length(
    result: &mut FacetSet,
    base: Option<&FacetSet>,
    range: &crate::ast::LengthRangeNode,
    errors: &mut Vec<Diagnostic>,
) {
    let span = range.span.as_ref();
    if let Some(min) = range.min {
        match base.and_then(|b| b.min_length) {
            Some(base_min) if min < base_min => errors.push(
                Diagnostic::error(
                    DiagnosticCode::MinLengthBelowBase,
                    format!("min length {} is less than the base min length {}", min, base_min),
                )
                .with_span(span),
            ),
            _ => result.min_length = Some(min),
        }
    }
    if let Some(max) = range.max {
        match base.and_then(|b| b.max_length) {
            Some(base_max) if max > base_max => errors.push(
                Diagnostic::error(
                    DiagnosticCode::MaxLengthAboveBase,
                    format!(
                        "max length {} is greater than the base max length {}",
                        max, base_max
                    ),
                )
                .with_span(span),
            ),
            _ => result.max_length = Some(max),
        }
    }
    if let (Some(min), Some(max)) = (result.min_length, result.max_length) {
        if min > max {
            errors.push(
                Diagnostic::error(
                    DiagnosticCode::MinLengthGreaterThanMaxLength,
                    format!("min length {} is greater than max length {}", min, max),
                )
                .with_span(span),
            );
        }
    }
}

fn parse_literal(
    kind: TypeKind,
    text: &str,
    span: Option<&TextSpan>,
    errors: &mut Vec<Diagnostic>,
) -> Option<AtomicValue> {
    let value = AtomicValue::parse(kind, text);
    if value.is_none() {
        errors.push(
            Diagnostic::error(
                DiagnosticCode::InvalidAtomValueLiteral,
                format!("'{}' is not a valid {} value", text, kind),
            )
            .with_span(span),
        );
    }
    value
}

fn narrow_value_range(
    kind: TypeKind,
    result: &mut FacetSet,
    base: Option<&FacetSet>,
    range: &crate::ast::ValueRangeNode,
    errors: &mut Vec<Diagnostic>,
) {
    let span = range.span.as_ref();
    if let Some(node) = &range.min {
        if let Some(value) = parse_literal(kind, &node.value, span, errors) {
            let bound = ValueBound::new(value, node.inclusive);
            match base.and_then(|b| b.min_value.as_ref()) {
                Some(base_min) if !narrows_min(base_min, &bound) => errors.push(
                    Diagnostic::error(
                        DiagnosticCode::MinValueBelowBase,
                        format!("min value {} is below the base min value {}", bound, base_min),
                    )
                    .with_span(span),
                ),
                _ => result.min_value = Some(bound),
            }
        }
    }
    if let Some(node) = &range.max {
        if let Some(value) = parse_literal(kind, &node.value, span, errors) {
            let bound = ValueBound::new(value, node.inclusive);
            match base.and_then(|b| b.max_value.as_ref()) {
                Some(base_max) if !narrows_max(base_max, &bound) => errors.push(
                    Diagnostic::error(
                        DiagnosticCode::MaxValueAboveBase,
                        format!("max value {} is above the base max value {}", bound, base_max),
                    )
                    .with_span(span),
                ),
                _ => result.max_value = Some(bound),
            }
        }
    }
    if let (Some(min), Some(max)) = (&result.min_value, &result.max_value) {
        if !is_ordered_range(min, max) {
            errors.push(
                Diagnostic::error(
                    DiagnosticCode::MinValueGreaterThanMaxValue,
                    format!("min value {} is greater than max value {}", min, max),
                )
                .with_span(span),
            );
        }
    }
}

fn narrow_enumeration(
    kind: TypeKind,
    result: &mut FacetSet,
    base: Option<&FacetSet>,
    declared: &FacetPatch,
    errors: &mut Vec<Diagnostic>,
) {
    let inherited = base.and_then(|b| b.enumeration.as_ref());
    let mut merged: IndexMap<AtomicValue, Option<String>> = IndexMap::new();

    for node in &declared.enums {
        let mut names: Vec<&str> = Vec::new();
        for item in &node.items {
            let span = item.span.as_ref().or(node.span.as_ref());
            if let Some(name) = &item.name {
                if names.contains(&name.value.as_str()) {
                    errors.push(
                        Diagnostic::error(
                            DiagnosticCode::DuplicateEnumItemName,
                            format!("duplicate enum item name '{}'", name.value),
                        )
                        .with_span(name.span.as_ref().or(span)),
                    );
                    continue;
                }
                names.push(&name.value);
            }
            let value = match parse_literal(kind, &item.value, span, errors) {
                Some(value) => value,
                None => continue,
            };
            if let Some(inherited) = inherited {
                if !inherited.contains_key(&value) {
                    errors.push(
                        Diagnostic::error(
                            DiagnosticCode::EnumItemNotInBase,
                            format!("enum item '{}' is not in the base enumeration", value),
                        )
                        .with_span(span),
                    );
                    continue;
                }
            }
            let name = item.name.as_ref().map(|n| n.value.clone());
            match merged.get_mut(&value) {
                Some(existing) => {
                    if existing.is_none() {
                        *existing = name;
                    }
                }
                None => {
                    merged.insert(value, name);
                }
            }
        }
    }

    result.enumeration = Some(merged);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{EnumItemNode, EnumsNode, NameNode, ValueBoundNode};

    fn codes(errors: &[Diagnostic]) -> Vec<DiagnosticCode> {
        errors.iter().map(|d| d.code).collect()
    }

    #[test]
    fn test_value_range_narrowing_valid() {
        let base = narrow(
            TypeKind::Decimal,
            None,
            &FacetPatch::new().value_range(Some(ValueBoundNode::inclusive("0")), None),
        )
        .unwrap();
        let derived = narrow(
            TypeKind::Decimal,
            Some(&base),
            &FacetPatch::new().value_range(
                Some(ValueBoundNode::inclusive("0")),
                Some(ValueBoundNode::inclusive("999.99")),
            ),
        )
        .unwrap();

        let min = derived.min_value.as_ref().unwrap();
        let max = derived.max_value.as_ref().unwrap();
        assert_eq!(min.value.to_string(), "0");
        assert!(min.inclusive);
        assert_eq!(max.value.to_string(), "999.99");
        assert!(max.inclusive);
    }

    #[test]
    fn test_value_range_inclusivity() {
        let base = narrow(
            TypeKind::Int32,
            None,
            &FacetPatch::new().value_range(
                Some(ValueBoundNode::inclusive("0")),
                Some(ValueBoundNode::exclusive("100")),
            ),
        )
        .unwrap();

        // exclusive at an inclusive base bound narrows
        assert!(narrow(
            TypeKind::Int32,
            Some(&base),
            &FacetPatch::new().value_range(Some(ValueBoundNode::exclusive("0")), None),
        )
        .is_ok());

        // inclusive at an exclusive base bound widens
        let errors = narrow(
            TypeKind::Int32,
            Some(&base),
            &FacetPatch::new().value_range(None, Some(ValueBoundNode::inclusive("100"))),
        )
        .unwrap_err();
        assert_eq!(codes(&errors), vec![DiagnosticCode::MaxValueAboveBase]);
    }

    #[test]
    fn test_length_range_narrowing_invalid() {
        let base = narrow(
            TypeKind::String,
            None,
            &FacetPatch::new().length_range(Some(5), Some(10)),
        )
        .unwrap();
        let errors = narrow(
            TypeKind::String,
            Some(&base),
            &FacetPatch::new().length_range(Some(0), Some(20)),
        )
        .unwrap_err();
        assert_eq!(
            codes(&errors),
            vec![
                DiagnosticCode::MinLengthBelowBase,
                DiagnosticCode::MaxLengthAboveBase
            ]
        );
    }

    #[test]
    fn test_min_length_greater_than_max() {
        let errors = narrow(
            TypeKind::String,
            None,
            &FacetPatch::new().length_range(Some(8), Some(2)),
        )
        .unwrap_err();
        assert_eq!(codes(&errors), vec![DiagnosticCode::MinLengthGreaterThanMaxLength]);
    }

    #[test]
    fn test_precision_and_scale() {
        let base = narrow(
            TypeKind::Decimal,
            None,
            &FacetPatch::new().precision(10).scale(2),
        )
        .unwrap();
        assert_eq!(base.precision, Some(10));

        let errors = narrow(
            TypeKind::Decimal,
            Some(&base),
            &FacetPatch::new().precision(12).scale(3),
        )
        .unwrap_err();
        assert_eq!(
            codes(&errors),
            vec![DiagnosticCode::PrecisionAboveBase, DiagnosticCode::ScaleAboveBase]
        );

        let errors = narrow(TypeKind::Decimal, None, &FacetPatch::new().precision(2).scale(4))
            .unwrap_err();
        assert_eq!(codes(&errors), vec![DiagnosticCode::ScaleGreaterThanPrecision]);
    }

    #[test]
    fn test_inapplicable_facets_reported_once_each() {
        let errors = narrow(
            TypeKind::Int32,
            None,
            &FacetPatch::new()
                .length_range(Some(1), None)
                .scale(2)
                .lists("sys:Int32")
                .value_range(Some(ValueBoundNode::inclusive("1")), None),
        )
        .unwrap_err();
        assert_eq!(
            codes(&errors),
            vec![DiagnosticCode::FacetNotApplicable; 3]
        );
    }

    #[test]
    fn test_enumeration_subset() {
        let base = narrow(
            TypeKind::String,
            None,
            &FacetPatch::new().enums(&["red", "green", "blue"]),
        )
        .unwrap();

        let derived = narrow(
            TypeKind::String,
            Some(&base),
            &FacetPatch::new().enums(&["red"]).enums(&["blue"]),
        )
        .unwrap();
        let values: Vec<String> = derived
            .enumeration
            .unwrap()
            .keys()
            .map(|v| v.to_string())
            .collect();
        assert_eq!(values, vec!["red", "blue"]);

        let errors = narrow(
            TypeKind::String,
            Some(&base),
            &FacetPatch::new().enums(&["red", "purple"]),
        )
        .unwrap_err();
        assert_eq!(codes(&errors), vec![DiagnosticCode::EnumItemNotInBase]);
    }

    #[test]
    fn test_duplicate_enum_item_name() {
        let item = |name: &str, value: &str| EnumItemNode {
            name: Some(NameNode::new(name)),
            value: value.to_string(),
            span: None,
        };
        let mut patch = FacetPatch::new();
        patch.enums.push(EnumsNode {
            items: vec![item("A", "1"), item("A", "2")],
            span: None,
        });
        let errors = narrow(TypeKind::Int32, None, &patch).unwrap_err();
        assert_eq!(codes(&errors), vec![DiagnosticCode::DuplicateEnumItemName]);
    }

    #[test]
    fn test_invalid_literal() {
        let errors = narrow(
            TypeKind::Int32,
            None,
            &FacetPatch::new().value_range(Some(ValueBoundNode::inclusive("abc")), None),
        )
        .unwrap_err();
        assert_eq!(codes(&errors), vec![DiagnosticCode::InvalidAtomValueLiteral]);
    }

    #[test]
    fn test_patterns_accumulate_without_duplicates() {
        let base = narrow(TypeKind::String, None, &FacetPatch::new().pattern("[a-z]+")).unwrap();
        let derived = narrow(
            TypeKind::String,
            Some(&base),
            &FacetPatch::new().pattern("[a-z]+").pattern("[0-9]+"),
        )
        .unwrap();
        assert_eq!(derived.patterns, vec!["[a-z]+", "[0-9]+"]);

        let value = SimpleValue::Atomic(AtomicValue::String("123".into()));
        assert!(derived.validate(&value).is_empty());
        let value = SimpleValue::Atomic(AtomicValue::String("12a".into()));
        assert_eq!(
            codes(&derived.validate(&value)),
            vec![DiagnosticCode::PatternNotMatched]
        );
    }

    #[test]
    fn test_invalid_pattern() {
        let errors = narrow(TypeKind::String, None, &FacetPatch::new().pattern("[a-")).unwrap_err();
        assert_eq!(codes(&errors), vec![DiagnosticCode::InvalidPattern]);
    }

    #[test]
    fn test_pattern_is_anchored() {
        let regex = compiled_pattern("ab").unwrap();
        assert!(regex.is_match("ab"));
        assert!(!regex.is_match("xaby"));
    }

    #[test]
    fn test_validate_values() {
        let facets = narrow(
            TypeKind::Decimal,
            None,
            &FacetPatch::new()
                .precision(5)
                .scale(2)
                .value_range(
                    Some(ValueBoundNode::inclusive("0")),
                    Some(ValueBoundNode::exclusive("1000")),
                ),
        )
        .unwrap();

        let ok = SimpleValue::Atomic(AtomicValue::parse(TypeKind::Decimal, "999.99").unwrap());
        assert!(facets.validate(&ok).is_empty());

        let out = SimpleValue::Atomic(AtomicValue::parse(TypeKind::Decimal, "1000").unwrap());
        assert_eq!(codes(&facets.validate(&out)), vec![DiagnosticCode::ValueNotInRange]);

        let digits = SimpleValue::Atomic(AtomicValue::parse(TypeKind::Decimal, "1.234").unwrap());
        assert_eq!(codes(&facets.validate(&digits)), vec![DiagnosticCode::ScaleExceeded]);
    }

    #[test]
    fn test_validate_list_length() {
        let facets = narrow(
            TypeKind::ListType,
            None,
            &FacetPatch::new().length_range(Some(1), Some(2)),
        )
        .unwrap();
        let list = SimpleValue::List(vec![
            AtomicValue::Int32(1).into(),
            AtomicValue::Int32(2).into(),
            AtomicValue::Int32(3).into(),
        ]);
        assert_eq!(codes(&facets.validate(&list)), vec![DiagnosticCode::LengthNotInRange]);
    }
}

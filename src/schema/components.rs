//! Compiled schema components.

use super::builtins::Builtin;
use regex::Regex;

/// Upper bound used for `maxOccurs="unbounded"`.
pub(crate) const UNBOUNDED: u32 = u32::MAX;

/// A reference to a type definition.
#[derive(Debug, Clone)]
pub(crate) enum TypeRef {
    /// A built-in XML Schema type
    Builtin(Builtin),
    /// A named type in the target namespace
    Named(String),
    /// The type of a global element declaration (element `ref`)
    Element(String),
    /// An anonymous complex type
    Complex(Box<ComplexTypeDefinition>),
    /// An anonymous simple type
    Simple(Box<SimpleTypeDefinition>),
}

/// A local element declaration inside a content model.
#[derive(Debug, Clone)]
pub(crate) struct ElementDeclaration {
    pub name: String,
    pub type_ref: TypeRef,
}

/// A term of a content model with its occurrence bounds.
#[derive(Debug, Clone)]
pub(crate) struct Particle {
    pub min_occurs: u32,
    pub max_occurs: u32,
    pub term: Term,
}

#[derive(Debug, Clone)]
pub(crate) enum Term {
    Element(ElementDeclaration),
    Group(ModelGroup),
    /// `xs:any`; children matched by it are not validated
    Wildcard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Compositor {
    Sequence,
    Choice,
    All,
}

#[derive(Debug, Clone)]
pub(crate) struct ModelGroup {
    pub compositor: Compositor,
    pub particles: Vec<Particle>,
}

#[derive(Debug, Clone)]
pub(crate) struct AttributeUse {
    pub name: String,
    pub type_ref: TypeRef,
    pub required: bool,
}

/// A complex type. Extensions keep their base by name and are merged at
/// validation time, base content first.
#[derive(Debug, Clone, Default)]
pub(crate) struct ComplexTypeDefinition {
    pub base: Option<String>,
    pub mixed: bool,
    pub content: Option<Particle>,
    pub simple_content: Option<TypeRef>,
    pub attributes: Vec<AttributeUse>,
    pub any_attribute: bool,
}

#[derive(Debug, Clone)]
pub(crate) enum SimpleTypeDefinition {
    Restriction { base: TypeRef, facets: Facets },
    List(TypeRef),
    Union(Vec<TypeRef>),
}

/// Constraining facets of a restriction.
#[derive(Debug, Clone, Default)]
pub(crate) struct Facets {
    pub enumeration: Vec<String>,
    /// Patterns of one derivation step; a value must match one of them
    pub patterns: Vec<Regex>,
    pub min_inclusive: Option<f64>,
    pub max_inclusive: Option<f64>,
    pub min_exclusive: Option<f64>,
    pub max_exclusive: Option<f64>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
}

impl Facets {
    pub(crate) fn check(&self, value: &str) -> Result<(), String> {
        if !self.enumeration.is_empty() && !self.enumeration.iter().any(|e| e == value) {
            return Err(format!(
                "[{}] is not an element of the set {{{}}}",
                value,
                self.enumeration
                    .iter()
                    .map(|e| format!("'{}'", e))
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }

        if !self.patterns.is_empty() && !self.patterns.iter().any(|p| p.is_match(value)) {
            return Err(format!("[{}] is not accepted by the pattern facet", value));
        }

        let length = value.chars().count();
        if self.min_length.is_some_and(|min| length < min) {
            return Err(format!("[{}] is shorter than the minimum length", value));
        }
        if self.max_length.is_some_and(|max| length > max) {
            return Err(format!("[{}] is longer than the maximum length", value));
        }

        let bounded = self.min_inclusive.is_some()
            || self.max_inclusive.is_some()
            || self.min_exclusive.is_some()
            || self.max_exclusive.is_some();
        if bounded {
            let number: f64 = value
                .trim()
                .parse()
                .map_err(|_| format!("[{}] is not a number", value))?;
            let in_range = self.min_inclusive.map_or(true, |m| number >= m)
                && self.max_inclusive.map_or(true, |m| number <= m)
                && self.min_exclusive.map_or(true, |m| number > m)
                && self.max_exclusive.map_or(true, |m| number < m);
            if !in_range {
                return Err(format!("[{}] is outside the allowed range", value));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enumeration_facet() {
        let facets = Facets {
            enumeration: vec!["left".into(), "right".into()],
            ..Default::default()
        };
        assert!(facets.check("left").is_ok());
        let err = facets.check("centre").unwrap_err();
        assert!(err.contains("'left', 'right'"));
    }

    #[test]
    fn test_range_facet() {
        let facets = Facets {
            min_inclusive: Some(0.0),
            max_inclusive: Some(1.0),
            ..Default::default()
        };
        assert!(facets.check("0.5").is_ok());
        assert!(facets.check("1").is_ok());
        assert!(facets.check("1.5").is_err());
        assert!(facets.check("abc").is_err());
    }

    #[test]
    fn test_pattern_facet() {
        let facets = Facets {
            patterns: vec![Regex::new("^(?:[0-9]+)$").unwrap()],
            ..Default::default()
        };
        assert!(facets.check("42").is_ok());
        assert!(facets.check("4a").is_err());
    }
}

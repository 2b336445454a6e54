//! Compiles an XSD document into schema components.

use super::builtins::Builtin;
use super::components::{
    AttributeUse, ComplexTypeDefinition, Compositor, ElementDeclaration, Facets, ModelGroup,
    Particle, SimpleTypeDefinition, Term, TypeRef, UNBOUNDED,
};
use super::XSD_NAMESPACE;
use regex::Regex;
use roxmltree::Node;
use std::collections::HashMap;

pub(crate) type CompileResult<T> = std::result::Result<T, String>;

/// Global definitions of one schema document.
#[derive(Debug, Default)]
pub(crate) struct Components {
    pub target_namespace: Option<String>,
    pub elements: HashMap<String, TypeRef>,
    pub complex_types: HashMap<String, ComplexTypeDefinition>,
    pub simple_types: HashMap<String, SimpleTypeDefinition>,
}

/// Compile the `xs:schema` root of `doc`.
pub(crate) fn compile(doc: &roxmltree::Document<'_>) -> CompileResult<Components> {
    let root = doc.root_element();
    if !is_xsd(&root, "schema") {
        return Err(format!(
            "root element <{}> is not an XML Schema <schema>",
            root.tag_name().name()
        ));
    }

    let mut components = Components {
        target_namespace: root.attribute("targetNamespace").map(str::to_string),
        ..Default::default()
    };

    if root.attribute("elementFormDefault") != Some("qualified") && components.target_namespace.is_some() {
        return Err("only elementFormDefault=\"qualified\" is supported".to_string());
    }

    for node in xsd_children(root) {
        match node.tag_name().name() {
            "element" => {
                let name = required(&node, "name")?;
                let type_ref = element_type(&node)?;
                components.elements.insert(name, type_ref);
            }
            "complexType" => {
                let name = required(&node, "name")?;
                components.complex_types.insert(name, complex_type(&node)?);
            }
            "simpleType" => {
                let name = required(&node, "name")?;
                components.simple_types.insert(name, simple_type(&node)?);
            }
            "annotation" => {}
            other => return Err(format!("unsupported top-level construct <xs:{}>", other)),
        }
    }

    check_references(&components)?;
    Ok(components)
}

fn is_xsd(node: &Node<'_, '_>, name: &str) -> bool {
    node.is_element()
        && node.tag_name().namespace() == Some(XSD_NAMESPACE)
        && node.tag_name().name() == name
}

/// Child elements in the XML Schema namespace.
fn xsd_children<'a, 'input>(node: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(|n| n.is_element() && n.tag_name().namespace() == Some(XSD_NAMESPACE))
}

fn required(node: &Node<'_, '_>, attr: &str) -> CompileResult<String> {
    node.attribute(attr).map(str::to_string).ok_or_else(|| {
        format!(
            "<xs:{}> is missing the '{}' attribute",
            node.tag_name().name(),
            attr
        )
    })
}

/// Resolve a QName attribute value to a type reference.
fn resolve_type(node: &Node<'_, '_>, qname: &str) -> CompileResult<TypeRef> {
    let (prefix, local) = match qname.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, qname),
    };
    let namespace = node.lookup_namespace_uri(prefix);

    if namespace == Some(XSD_NAMESPACE) {
        Builtin::from_name(local)
            .map(TypeRef::Builtin)
            .ok_or_else(|| format!("unsupported built-in type 'xs:{}'", local))
    } else {
        Ok(TypeRef::Named(local.to_string()))
    }
}

fn local_name(qname: &str) -> &str {
    qname.split_once(':').map_or(qname, |(_, local)| local)
}

fn occurs(node: &Node<'_, '_>) -> CompileResult<(u32, u32)> {
    let min = match node.attribute("minOccurs") {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| format!("invalid minOccurs [{}]", v))?,
        None => 1,
    };
    let max = match node.attribute("maxOccurs") {
        Some("unbounded") => UNBOUNDED,
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| format!("invalid maxOccurs [{}]", v))?,
        None => 1,
    };
    if max < min {
        return Err(format!("maxOccurs {} is less than minOccurs {}", max, min));
    }
    Ok((min, max))
}

/// The type of an element declaration: `type` attribute, inline type or `xs:anyType`.
fn element_type(node: &Node<'_, '_>) -> CompileResult<TypeRef> {
    if let Some(type_name) = node.attribute("type") {
        return resolve_type(node, type_name);
    }
    for child in xsd_children(*node) {
        match child.tag_name().name() {
            "complexType" => return Ok(TypeRef::Complex(Box::new(complex_type(&child)?))),
            "simpleType" => return Ok(TypeRef::Simple(Box::new(simple_type(&child)?))),
            _ => {}
        }
    }
    Ok(TypeRef::Builtin(Builtin::AnyType))
}

fn attribute_use(node: &Node<'_, '_>) -> CompileResult<AttributeUse> {
    let name = required(node, "name")?;
    let type_ref = match node.attribute("type") {
        Some(type_name) => resolve_type(node, type_name)?,
        None => match xsd_children(*node).find(|c| c.tag_name().name() == "simpleType") {
            Some(inline) => TypeRef::Simple(Box::new(simple_type(&inline)?)),
            None => TypeRef::Builtin(Builtin::AnySimpleType),
        },
    };
    Ok(AttributeUse {
        name,
        type_ref,
        required: node.attribute("use") == Some("required"),
    })
}

fn complex_type(node: &Node<'_, '_>) -> CompileResult<ComplexTypeDefinition> {
    let mut def = ComplexTypeDefinition {
        mixed: node.attribute("mixed") == Some("true"),
        ..Default::default()
    };
    read_complex_body(node, &mut def)?;
    Ok(def)
}

/// Read content model and attribute declarations of a complex type or an
/// extension body into `def`.
fn read_complex_body(node: &Node<'_, '_>, def: &mut ComplexTypeDefinition) -> CompileResult<()> {
    for child in xsd_children(*node) {
        match child.tag_name().name() {
            "sequence" | "choice" | "all" => def.content = Some(model_group(&child)?),
            "attribute" => def.attributes.push(attribute_use(&child)?),
            "anyAttribute" => def.any_attribute = true,
            "complexContent" => {
                if child.attribute("mixed") == Some("true") {
                    def.mixed = true;
                }
                let derivation = xsd_children(child)
                    .find(|c| matches!(c.tag_name().name(), "extension" | "restriction"))
                    .ok_or("<xs:complexContent> needs an extension or restriction")?;
                if derivation.tag_name().name() == "extension" {
                    let base = required(&derivation, "base")?;
                    def.base = Some(local_name(&base).to_string());
                }
                read_complex_body(&derivation, def)?;
            }
            "simpleContent" => {
                let extension = xsd_children(child)
                    .find(|c| c.tag_name().name() == "extension")
                    .ok_or("only <xs:simpleContent> extensions are supported")?;
                let base = required(&extension, "base")?;
                def.simple_content = Some(resolve_type(&extension, &base)?);
                read_complex_body(&extension, def)?;
            }
            "annotation" => {}
            "attributeGroup" | "group" => {
                return Err(format!(
                    "unsupported construct <xs:{}>",
                    child.tag_name().name()
                ))
            }
            _ => {}
        }
    }
    Ok(())
}

fn model_group(node: &Node<'_, '_>) -> CompileResult<Particle> {
    let compositor = match node.tag_name().name() {
        "sequence" => Compositor::Sequence,
        "choice" => Compositor::Choice,
        "all" => Compositor::All,
        other => return Err(format!("<xs:{}> is not a model group", other)),
    };
    let (min_occurs, max_occurs) = occurs(node)?;

    let mut particles = Vec::new();
    for child in xsd_children(*node) {
        match child.tag_name().name() {
            "element" => particles.push(element_particle(&child)?),
            "sequence" | "choice" | "all" => particles.push(model_group(&child)?),
            "any" => {
                let (min_occurs, max_occurs) = occurs(&child)?;
                particles.push(Particle {
                    min_occurs,
                    max_occurs,
                    term: Term::Wildcard,
                });
            }
            "annotation" => {}
            other => return Err(format!("unsupported particle <xs:{}>", other)),
        }
    }

    if compositor == Compositor::All
        && particles
            .iter()
            .any(|p| p.max_occurs > 1 || !matches!(p.term, Term::Element(_)))
    {
        return Err("<xs:all> may only contain elements with maxOccurs 1".to_string());
    }

    Ok(Particle {
        min_occurs,
        max_occurs,
        term: Term::Group(ModelGroup {
            compositor,
            particles,
        }),
    })
}

fn element_particle(node: &Node<'_, '_>) -> CompileResult<Particle> {
    let (min_occurs, max_occurs) = occurs(node)?;
    let declaration = match node.attribute("ref") {
        Some(reference) => {
            let name = local_name(reference).to_string();
            ElementDeclaration {
                type_ref: TypeRef::Element(name.clone()),
                name,
            }
        }
        None => ElementDeclaration {
            name: required(node, "name")?,
            type_ref: element_type(node)?,
        },
    };
    Ok(Particle {
        min_occurs,
        max_occurs,
        term: Term::Element(declaration),
    })
}

fn simple_type(node: &Node<'_, '_>) -> CompileResult<SimpleTypeDefinition> {
    let derivation = xsd_children(*node)
        .find(|c| matches!(c.tag_name().name(), "restriction" | "list" | "union"))
        .ok_or("<xs:simpleType> needs a restriction, list or union")?;

    match derivation.tag_name().name() {
        "restriction" => {
            let base = match derivation.attribute("base") {
                Some(base) => resolve_type(&derivation, base)?,
                None => match xsd_children(derivation).find(|c| c.tag_name().name() == "simpleType") {
                    Some(inline) => TypeRef::Simple(Box::new(simple_type(&inline)?)),
                    None => return Err("<xs:restriction> needs a base type".to_string()),
                },
            };
            Ok(SimpleTypeDefinition::Restriction {
                base,
                facets: facets(&derivation)?,
            })
        }
        "list" => {
            let item = match derivation.attribute("itemType") {
                Some(item) => resolve_type(&derivation, item)?,
                None => match xsd_children(derivation).find(|c| c.tag_name().name() == "simpleType") {
                    Some(inline) => TypeRef::Simple(Box::new(simple_type(&inline)?)),
                    None => return Err("<xs:list> needs an item type".to_string()),
                },
            };
            Ok(SimpleTypeDefinition::List(item))
        }
        _ => {
            let mut members = Vec::new();
            if let Some(names) = derivation.attribute("memberTypes") {
                for name in names.split_whitespace() {
                    members.push(resolve_type(&derivation, name)?);
                }
            }
            for inline in xsd_children(derivation).filter(|c| c.tag_name().name() == "simpleType") {
                members.push(TypeRef::Simple(Box::new(simple_type(&inline)?)));
            }
            if members.is_empty() {
                return Err("<xs:union> has no member types".to_string());
            }
            Ok(SimpleTypeDefinition::Union(members))
        }
    }
}

fn facets(node: &Node<'_, '_>) -> CompileResult<Facets> {
    let mut facets = Facets::default();
    for child in xsd_children(*node) {
        let name = child.tag_name().name();
        if matches!(name, "simpleType" | "annotation") {
            continue;
        }
        let value = required(&child, "value")?;
        match name {
            "enumeration" => facets.enumeration.push(value),
            "pattern" => facets.patterns.push(pattern(&value)?),
            "minInclusive" => facets.min_inclusive = Some(number(&value)?),
            "maxInclusive" => facets.max_inclusive = Some(number(&value)?),
            "minExclusive" => facets.min_exclusive = Some(number(&value)?),
            "maxExclusive" => facets.max_exclusive = Some(number(&value)?),
            "length" => {
                let length = number(&value)? as usize;
                facets.min_length = Some(length);
                facets.max_length = Some(length);
            }
            "minLength" => facets.min_length = Some(number(&value)? as usize),
            "maxLength" => facets.max_length = Some(number(&value)? as usize),
            "whiteSpace" => {}
            other => return Err(format!("unsupported facet <xs:{}>", other)),
        }
    }
    Ok(facets)
}

fn number(value: &str) -> CompileResult<f64> {
    value
        .trim()
        .parse()
        .map_err(|_| format!("invalid numeric facet value [{}]", value))
}

/// XSD patterns are implicitly anchored.
fn pattern(value: &str) -> CompileResult<Regex> {
    if value.contains("\\i") || value.contains("\\c") {
        return Err(format!("unsupported XSD character class in pattern [{}]", value));
    }
    Regex::new(&format!("^(?:{})$", value)).map_err(|e| format!("invalid pattern [{}]: {}", value, e))
}

/// Every named reference must resolve within the schema.
fn check_references(components: &Components) -> CompileResult<()> {
    fn check_type(c: &Components, type_ref: &TypeRef) -> CompileResult<()> {
        match type_ref {
            TypeRef::Builtin(_) => Ok(()),
            TypeRef::Named(name) => {
                if c.complex_types.contains_key(name) || c.simple_types.contains_key(name) {
                    Ok(())
                } else {
                    Err(format!("type '{}' is not defined", name))
                }
            }
            TypeRef::Element(name) => {
                if c.elements.contains_key(name) {
                    Ok(())
                } else {
                    Err(format!("element '{}' is not declared", name))
                }
            }
            TypeRef::Complex(def) => check_complex(c, def),
            TypeRef::Simple(def) => check_simple(c, def),
        }
    }

    fn check_particle(c: &Components, particle: &Particle) -> CompileResult<()> {
        match &particle.term {
            Term::Element(decl) => check_type(c, &decl.type_ref),
            Term::Group(group) => group.particles.iter().try_for_each(|p| check_particle(c, p)),
            Term::Wildcard => Ok(()),
        }
    }

    fn check_complex(c: &Components, def: &ComplexTypeDefinition) -> CompileResult<()> {
        if let Some(base) = &def.base {
            if !c.complex_types.contains_key(base) {
                return Err(format!("base type '{}' is not a defined complex type", base));
            }
        }
        if let Some(content) = &def.content {
            check_particle(c, content)?;
        }
        if let Some(simple) = &def.simple_content {
            check_type(c, simple)?;
        }
        def.attributes
            .iter()
            .try_for_each(|a| check_type(c, &a.type_ref))
    }

    fn check_simple(c: &Components, def: &SimpleTypeDefinition) -> CompileResult<()> {
        match def {
            SimpleTypeDefinition::Restriction { base, .. } => check_type(c, base),
            SimpleTypeDefinition::List(item) => check_type(c, item),
            SimpleTypeDefinition::Union(members) => members.iter().try_for_each(|m| check_type(c, m)),
        }
    }

    for type_ref in components.elements.values() {
        check_type(components, type_ref)?;
    }
    for def in components.complex_types.values() {
        check_complex(components, def)?;
    }
    for def in components.simple_types.values() {
        check_simple(components, def)?;
    }
    Ok(())
}

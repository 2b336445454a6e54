//! Instance validation against compiled components.

use super::builtins::Builtin;
use super::compile::Components;
use super::components::{
    AttributeUse, ComplexTypeDefinition, Compositor, ElementDeclaration, ModelGroup, Particle,
    SimpleTypeDefinition, Term, TypeRef,
};
use roxmltree::Node;
use std::cell::RefCell;
use std::collections::HashSet;

type Outcome = std::result::Result<(), String>;

/// Maximum depth of base-type chains, guarding against cyclic extension.
const MAX_DERIVATION_DEPTH: usize = 32;

pub(crate) struct Validator<'s> {
    components: &'s Components,
    /// `xs:ID` values seen so far in the current document.
    ids: RefCell<HashSet<String>>,
}

impl<'s> Validator<'s> {
    pub(crate) fn new(components: &'s Components) -> Self {
        Self {
            components,
            ids: RefCell::new(HashSet::new()),
        }
    }

    /// Validate a whole document, returning the first violation.
    pub(crate) fn validate_document(&self, doc: &roxmltree::Document<'_>) -> Outcome {
        let root = doc.root_element();
        let tag = root.tag_name();

        if tag.namespace() != self.components.target_namespace.as_deref() {
            return Err(format!(
                "Element '{}': No matching global declaration available for the validation root (namespace [{}]).",
                tag.name(),
                tag.namespace().unwrap_or("")
            ));
        }

        let type_ref = self.components.elements.get(tag.name()).ok_or_else(|| {
            format!(
                "Element '{}': No matching global declaration available for the validation root.",
                tag.name()
            )
        })?;

        self.element(root, type_ref)
    }

    fn element(&self, node: Node<'_, '_>, type_ref: &'s TypeRef) -> Outcome {
        match type_ref {
            TypeRef::Builtin(Builtin::AnyType) => Ok(()),
            TypeRef::Builtin(builtin) => self.simple_element(node, |v| builtin.check(v)),
            TypeRef::Named(name) => {
                if let Some(def) = self.components.complex_types.get(name) {
                    self.complex_element(node, def)
                } else if let Some(def) = self.components.simple_types.get(name) {
                    self.simple_element(node, |v| self.simple(def, v))
                } else {
                    Err(format!("type '{}' is not defined", name))
                }
            }
            TypeRef::Element(name) => match self.components.elements.get(name) {
                Some(global) => self.element(node, global),
                None => Err(format!("element '{}' is not declared", name)),
            },
            TypeRef::Complex(def) => self.complex_element(node, def),
            TypeRef::Simple(def) => self.simple_element(node, |v| self.simple(def, v)),
        }
    }

    /// An element with simple content: no element children, no attributes.
    fn simple_element<F>(&self, node: Node<'_, '_>, check: F) -> Outcome
    where
        F: Fn(&str) -> Outcome,
    {
        if let Some(child) = node.children().find(Node::is_element) {
            return Err(format!(
                "Element '{}': Element content is not allowed, because the content type is a simple type (found '{}').",
                node.tag_name().name(),
                child.tag_name().name()
            ));
        }
        if let Some(attr) = foreign_free_attributes(node).next() {
            return Err(format!(
                "Element '{}', attribute '{}': The attribute '{}' is not allowed.",
                node.tag_name().name(),
                attr.name(),
                attr.name()
            ));
        }
        check(&element_text(node))
            .map_err(|e| format!("Element '{}': {}", node.tag_name().name(), e))
    }

    fn complex_element(&self, node: Node<'_, '_>, def: &'s ComplexTypeDefinition) -> Outcome {
        let chain = self.derivation_chain(def)?;
        let name = node.tag_name().name();

        self.attributes(node, &chain)?;

        if let Some(simple) = chain.iter().find_map(|d| d.simple_content.as_ref()) {
            if let Some(child) = node.children().find(Node::is_element) {
                return Err(format!(
                    "Element '{}': Element content is not allowed (found '{}').",
                    name,
                    child.tag_name().name()
                ));
            }
            return self
                .value(simple, &element_text(node))
                .map_err(|e| format!("Element '{}': {}", name, e));
        }

        let mixed = chain.iter().any(|d| d.mixed);
        if !mixed {
            let stray = node
                .children()
                .filter(Node::is_text)
                .filter_map(|n| n.text())
                .any(|t| !t.trim().is_empty());
            if stray {
                return Err(format!(
                    "Element '{}': Character content other than whitespace is not allowed because the content type is 'element-only'.",
                    name
                ));
            }
        }

        let children: Vec<Node<'_, '_>> = node.children().filter(Node::is_element).collect();
        for child in &children {
            if child.tag_name().namespace() != self.components.target_namespace.as_deref() {
                return Err(format!(
                    "Element '{}': This element is not expected (namespace [{}]).",
                    child.tag_name().name(),
                    child.tag_name().namespace().unwrap_or("")
                ));
            }
        }

        let mut matcher = Matcher::new(&children);
        let mut pos = 0;
        for particle in chain.iter().filter_map(|d| d.content.as_ref()) {
            match matcher.particle(particle, pos) {
                Some(next) => pos = next,
                None => return Err(matcher.diagnostic(name)),
            }
        }
        if pos < children.len() {
            matcher.furthest = matcher.furthest.max(pos);
            return Err(matcher.diagnostic(name));
        }

        for (index, decl) in matcher.matched {
            self.element(children[index], &decl.type_ref)?;
        }
        Ok(())
    }

    /// Base-first list of the type and everything it extends.
    fn derivation_chain(&self, def: &'s ComplexTypeDefinition) -> Result<Vec<&'s ComplexTypeDefinition>, String> {
        let mut chain = vec![def];
        let mut current = def;
        while let Some(base) = &current.base {
            if chain.len() > MAX_DERIVATION_DEPTH {
                return Err(format!("type derivation from '{}' is too deep", base));
            }
            current = self
                .components
                .complex_types
                .get(base)
                .ok_or_else(|| format!("base type '{}' is not defined", base))?;
            chain.push(current);
        }
        chain.reverse();
        Ok(chain)
    }

    fn attributes(&self, node: Node<'_, '_>, chain: &[&'s ComplexTypeDefinition]) -> Outcome {
        let name = node.tag_name().name();
        let declared: Vec<&'s AttributeUse> = chain.iter().flat_map(|d| d.attributes.iter()).collect();
        let any_attribute = chain.iter().any(|d| d.any_attribute);

        for attr in foreign_free_attributes(node) {
            match declared.iter().find(|a| a.name == attr.name()) {
                Some(decl) => {
                    self.value(&decl.type_ref, attr.value()).map_err(|e| {
                        format!("Element '{}', attribute '{}': {}", name, attr.name(), e)
                    })?;
                    if self.is_id(&decl.type_ref) {
                        self.claim_id(name, attr.name(), attr.value())?;
                    }
                }
                None if any_attribute => {}
                None => {
                    return Err(format!(
                        "Element '{}', attribute '{}': The attribute '{}' is not allowed.",
                        name,
                        attr.name(),
                        attr.name()
                    ))
                }
            }
        }

        for decl in declared.iter().filter(|a| a.required) {
            if node.attribute(decl.name.as_str()).is_none() {
                return Err(format!(
                    "Element '{}': The attribute '{}' is required but missing.",
                    name, decl.name
                ));
            }
        }
        Ok(())
    }

    /// Whether a simple type is `xs:ID` or restricts it.
    fn is_id(&self, type_ref: &TypeRef) -> bool {
        let mut current = type_ref;
        for _ in 0..MAX_DERIVATION_DEPTH {
            current = match current {
                TypeRef::Builtin(builtin) => return *builtin == Builtin::Id,
                TypeRef::Named(name) => match self.components.simple_types.get(name) {
                    Some(SimpleTypeDefinition::Restriction { base, .. }) => base,
                    _ => return false,
                },
                TypeRef::Simple(def) => match def.as_ref() {
                    SimpleTypeDefinition::Restriction { base, .. } => base,
                    _ => return false,
                },
                TypeRef::Complex(_) | TypeRef::Element(_) => return false,
            };
        }
        false
    }

    /// ID values must be unique within a document.
    fn claim_id(&self, element: &str, attribute: &str, value: &str) -> Outcome {
        let value = value.trim();
        if self.ids.borrow_mut().insert(value.to_string()) {
            Ok(())
        } else {
            Err(format!(
                "Element '{}', attribute '{}': '{}' is not a valid value of the atomic type 'xs:ID'.",
                element, attribute, value
            ))
        }
    }

    /// Check a lexical value against a simple type reference.
    fn value(&self, type_ref: &TypeRef, value: &str) -> Outcome {
        match type_ref {
            TypeRef::Builtin(builtin) => builtin.check(value),
            TypeRef::Named(name) => match self.components.simple_types.get(name) {
                Some(def) => self.simple(def, value),
                None => Err(format!("'{}' is not a simple type", name)),
            },
            TypeRef::Simple(def) => self.simple(def, value),
            TypeRef::Complex(_) | TypeRef::Element(_) => {
                Err("a complex type cannot constrain a value".to_string())
            }
        }
    }

    fn simple(&self, def: &SimpleTypeDefinition, value: &str) -> Outcome {
        match def {
            SimpleTypeDefinition::Restriction { base, facets } => {
                self.value(base, value)?;
                facets.check(value)
            }
            SimpleTypeDefinition::List(item) => value
                .split_whitespace()
                .try_for_each(|v| self.value(item, v)),
            SimpleTypeDefinition::Union(members) => {
                if members.iter().any(|m| self.value(m, value).is_ok()) {
                    Ok(())
                } else {
                    Err(format!("[{}] is not a valid value of the union type", value))
                }
            }
        }
    }
}

/// Attributes without a namespace. `xsi:`, `xml:` and other qualified
/// attributes are outside the content model.
fn foreign_free_attributes<'a, 'input>(
    node: Node<'a, 'input>,
) -> impl Iterator<Item = roxmltree::Attribute<'a, 'input>> {
    node.attributes().filter(|a| a.namespace().is_none())
}

fn element_text(node: Node<'_, '_>) -> String {
    node.children()
        .filter(Node::is_text)
        .filter_map(|n| n.text())
        .collect()
}

/// Greedy content-model matcher over an element's children.
///
/// Each particle consumes as many occurrences as it can. Content models
/// are assumed to satisfy Unique Particle Attribution.
struct Matcher<'n, 'a, 'input, 's> {
    children: &'n [Node<'a, 'input>],
    matched: Vec<(usize, &'s ElementDeclaration)>,
    furthest: usize,
}

impl<'n, 'a, 'input, 's> Matcher<'n, 'a, 'input, 's> {
    fn new(children: &'n [Node<'a, 'input>]) -> Self {
        Self {
            children,
            matched: Vec::new(),
            furthest: 0,
        }
    }

    /// Match a particle with its occurrence bounds starting at `pos`.
    fn particle(&mut self, particle: &'s Particle, mut pos: usize) -> Option<usize> {
        let mut count = 0u32;
        while count < particle.max_occurs {
            let mark = self.matched.len();
            match self.term(&particle.term, pos) {
                Some(next) if next > pos => {
                    pos = next;
                    count += 1;
                }
                Some(_) => {
                    // An empty match satisfies any remaining minimum.
                    count = count.max(particle.min_occurs);
                    break;
                }
                None => {
                    self.matched.truncate(mark);
                    break;
                }
            }
        }
        (count >= particle.min_occurs).then_some(pos)
    }

    fn term(&mut self, term: &'s Term, pos: usize) -> Option<usize> {
        self.furthest = self.furthest.max(pos);
        match term {
            Term::Element(decl) => {
                let child = self.children.get(pos)?;
                if child.tag_name().name() == decl.name {
                    self.matched.push((pos, decl));
                    Some(pos + 1)
                } else {
                    None
                }
            }
            Term::Wildcard => (pos < self.children.len()).then_some(pos + 1),
            Term::Group(group) => match group.compositor {
                Compositor::Sequence => self.sequence(group, pos),
                Compositor::Choice => self.choice(group, pos),
                Compositor::All => self.all(group, pos),
            },
        }
    }

    fn sequence(&mut self, group: &'s ModelGroup, pos: usize) -> Option<usize> {
        let mark = self.matched.len();
        let mut cur = pos;
        for particle in &group.particles {
            match self.particle(particle, cur) {
                Some(next) => cur = next,
                None => {
                    self.matched.truncate(mark);
                    return None;
                }
            }
        }
        Some(cur)
    }

    fn choice(&mut self, group: &'s ModelGroup, pos: usize) -> Option<usize> {
        let mut empty = false;
        for particle in &group.particles {
            let mark = self.matched.len();
            match self.particle(particle, pos) {
                Some(next) if next > pos => return Some(next),
                Some(_) => empty = true,
                None => {}
            }
            self.matched.truncate(mark);
        }
        empty.then_some(pos)
    }

    fn all(&mut self, group: &'s ModelGroup, pos: usize) -> Option<usize> {
        let mark = self.matched.len();
        let mut used = vec![false; group.particles.len()];
        let mut cur = pos;

        'next: while let Some(child) = self.children.get(cur) {
            for (i, particle) in group.particles.iter().enumerate() {
                if used[i] {
                    continue;
                }
                if let Term::Element(decl) = &particle.term {
                    if child.tag_name().name() == decl.name {
                        self.matched.push((cur, decl));
                        used[i] = true;
                        cur += 1;
                        continue 'next;
                    }
                }
            }
            break;
        }
        self.furthest = self.furthest.max(cur);

        let complete = group
            .particles
            .iter()
            .zip(&used)
            .all(|(p, used)| *used || p.min_occurs == 0);
        if complete {
            Some(cur)
        } else {
            self.matched.truncate(mark);
            None
        }
    }

    fn diagnostic(&self, parent: &str) -> String {
        match self.children.get(self.furthest) {
            Some(child) => format!(
                "Element '{}': This element is not expected (in '{}').",
                child.tag_name().name(),
                parent
            ),
            None => format!("Element '{}': Missing child element(s).", parent),
        }
    }
}

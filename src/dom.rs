//! In-memory document model the recoloring engine operates on.
//!
//! This module provides:
//! - A slot map of elements addressed by versioned [`NodeId`] keys
//! - Inline style declarations with priority, plus cascaded page styles
//! - Computed-style resolution for the handful of properties the engine reads
//! - Child-list mutation observation with pull-based record delivery
//!
//! A [`NodeId`] never owns its element. Removing a subtree frees its keys, so
//! ids held elsewhere simply stop resolving and are never handed out again.

use std::collections::BTreeMap;
use std::fmt;

use anyhow::{Result, bail};
use slotmap::{SlotMap, new_key_type};

new_key_type! {
    /// Non-owning identity of an element in a [`Document`].
    pub struct NodeId;
}

/// Handle to a registered mutation observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

/// Priority of an inline style declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Priority {
    /// Plain declaration.
    #[default]
    Normal,
    /// `!important` declaration.
    Important,
}

/// One inline style declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Property name, e.g. `background-color`.
    pub property: String,
    /// Serialized value.
    pub value: String,
    /// Declaration priority.
    pub priority: Priority,
}

/// A batch of child-list changes under one parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    /// The parent whose child list changed.
    pub target: NodeId,
    /// Elements inserted under `target`.
    pub added: Vec<NodeId>,
    /// Elements removed from `target`, including every freed descendant.
    pub removed: Vec<NodeId>,
}

#[derive(Debug, Clone, Default)]
struct Element {
    tag: String,
    attributes: BTreeMap<String, String>,
    inline: Vec<Declaration>,
    cascaded: BTreeMap<String, String>,
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug)]
struct Observer {
    target: NodeId,
    queue: Vec<MutationRecord>,
}

/// A single-threaded document: `html > (head, body)` plus whatever the page adds.
#[derive(Debug)]
pub struct Document {
    elements: SlotMap<NodeId, Element>,
    root: NodeId,
    head: NodeId,
    body: NodeId,
    observers: BTreeMap<u64, Observer>,
    next_observer: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty `html` document with a `head` and a `body`.
    #[must_use]
    pub fn new() -> Self {
        let mut elements: SlotMap<NodeId, Element> = SlotMap::with_key();
        let mut skeleton = |tag: &str| {
            elements.insert(Element {
                tag: tag.to_string(),
                ..Element::default()
            })
        };
        let (root, head, body) = (skeleton("html"), skeleton("head"), skeleton("body"));
        let mut doc = Self {
            elements,
            root,
            head,
            body,
            observers: BTreeMap::new(),
            next_observer: 0,
        };
        doc.link(doc.root, doc.head);
        doc.link(doc.root, doc.body);
        doc
    }

    /// The `html` element.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The `head` element.
    #[must_use]
    pub fn head(&self) -> NodeId {
        self.head
    }

    /// The `body` element.
    #[must_use]
    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Create a detached element. Tag names are stored lowercase.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.elements.insert(Element {
            tag: tag.to_ascii_lowercase(),
            ..Element::default()
        })
    }

    /// Whether `id` still refers to a live (not freed) element.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.elements.contains_key(id)
    }

    /// Whether `id` is live and attached under the document root.
    #[must_use]
    pub fn is_connected(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == self.root {
                return true;
            }
            current = self.get(node).and_then(|el| el.parent);
        }
        false
    }

    /// Lowercase tag name of a live element.
    #[must_use]
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.get(id).map(|el| el.tag.as_str())
    }

    /// Parent of a live element.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|el| el.parent)
    }

    /// Children of a live element, empty for stale ids.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id)
            .map(|el| el.children.as_slice())
            .unwrap_or_default()
    }

    /// All descendants of `id` in document order, excluding `id` itself.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// Append `child` as the last child of `parent`, moving it if already attached.
    ///
    /// # Errors
    ///
    /// Returns an error if either id is stale, if `child` is the document root,
    /// or if `child` is an inclusive ancestor of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if !self.contains(parent) {
            bail!("parent {parent:?} is not a live element");
        }
        if !self.contains(child) {
            bail!("child {child:?} is not a live element");
        }
        if child == self.root {
            bail!("the document root cannot be re-parented");
        }
        if self.is_inclusive_ancestor(child, parent) {
            bail!("appending {child:?} under {parent:?} would create a cycle");
        }

        if let Some(old_parent) = self.detach(child) {
            self.queue_record(MutationRecord {
                target: old_parent,
                added: Vec::new(),
                removed: vec![child],
            });
        }
        self.link(parent, child);
        self.queue_record(MutationRecord {
            target: parent,
            added: vec![child],
            removed: Vec::new(),
        });
        Ok(())
    }

    /// Detach `id` from its parent and free it together with its subtree.
    ///
    /// # Errors
    ///
    /// Returns an error for stale ids and for the `html`, `head` and `body`
    /// elements, which are permanent.
    pub fn remove(&mut self, id: NodeId) -> Result<()> {
        if !self.contains(id) {
            bail!("{id:?} is not a live element");
        }
        if id == self.root || id == self.head || id == self.body {
            bail!("the document skeleton cannot be removed");
        }

        let mut subtree = vec![id];
        subtree.extend(self.descendants(id));

        if let Some(parent) = self.detach(id) {
            self.queue_record(MutationRecord {
                target: parent,
                added: Vec::new(),
                removed: subtree.clone(),
            });
        }

        for node in subtree {
            self.elements.remove(node);
        }
        Ok(())
    }

    /// Set an attribute. No-op on stale ids.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(el) = self.get_mut(id) {
            el.attributes.insert(name.to_string(), value.to_string());
        }
    }

    /// Remove an attribute. No-op on stale ids.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) {
        if let Some(el) = self.get_mut(id) {
            el.attributes.remove(name);
        }
    }

    /// Attribute value of a live element.
    #[must_use]
    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.get(id)
            .and_then(|el| el.attributes.get(name))
            .map(String::as_str)
    }

    /// Whether a live element carries `name`.
    #[must_use]
    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.get_attribute(id, name).is_some()
    }

    /// Text content of a live element.
    #[must_use]
    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.get(id).map(|el| el.text.as_str())
    }

    /// Replace the text content of an element. No-op on stale ids.
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        if let Some(el) = self.get_mut(id) {
            el.text = text.to_string();
        }
    }

    /// First connected element whose `id` attribute equals `html_id`.
    #[must_use]
    pub fn get_element_by_id(&self, html_id: &str) -> Option<NodeId> {
        self.connected()
            .into_iter()
            .find(|&node| self.get_attribute(node, "id") == Some(html_id))
    }

    /// Every connected element carrying `name`, in document order.
    #[must_use]
    pub fn query_attribute(&self, name: &str) -> Vec<NodeId> {
        self.connected()
            .into_iter()
            .filter(|&node| self.has_attribute(node, name))
            .collect()
    }

    /// Set the value the page's own stylesheets give `property` on this element.
    pub fn set_cascaded_style(&mut self, id: NodeId, property: &str, value: &str) {
        if let Some(el) = self.get_mut(id) {
            el.cascaded.insert(property.to_string(), value.to_string());
        }
    }

    /// Set or replace an inline declaration. No-op on stale ids.
    pub fn set_style_property(&mut self, id: NodeId, property: &str, value: &str, priority: Priority) {
        let Some(el) = self.get_mut(id) else {
            return;
        };
        let declaration = Declaration {
            property: property.to_string(),
            value: value.to_string(),
            priority,
        };
        match el.inline.iter_mut().find(|d| d.property == property) {
            Some(existing) => *existing = declaration,
            None => el.inline.push(declaration),
        }
    }

    /// Remove an inline declaration. No-op if absent.
    pub fn remove_style_property(&mut self, id: NodeId, property: &str) {
        if let Some(el) = self.get_mut(id) {
            el.inline.retain(|d| d.property != property);
        }
    }

    /// Inline declaration for `property`, if any.
    #[must_use]
    pub fn style_property(&self, id: NodeId, property: &str) -> Option<&Declaration> {
        self.get(id)
            .and_then(|el| el.inline.iter().find(|d| d.property == property))
    }

    /// All inline declarations of an element, in insertion order.
    #[must_use]
    pub fn inline_style(&self, id: NodeId) -> &[Declaration] {
        self.get(id)
            .map(|el| el.inline.as_slice())
            .unwrap_or_default()
    }

    /// Resolve the used value of `property`: inline, then cascaded, then initial.
    ///
    /// Elements that are not connected compute to the empty string.
    #[must_use]
    pub fn computed_style(&self, id: NodeId, property: &str) -> String {
        if !self.is_connected(id) {
            return String::new();
        }
        let Some(el) = self.get(id) else {
            return String::new();
        };
        if let Some(d) = el.inline.iter().find(|d| d.property == property) {
            return d.value.clone();
        }
        if let Some(value) = el.cascaded.get(property) {
            return value.clone();
        }
        initial_value(property).to_string()
    }

    /// Start observing child-list changes anywhere under `target`.
    pub fn observe(&mut self, target: NodeId) -> ObserverId {
        let id = self.next_observer;
        self.next_observer += 1;
        self.observers.insert(
            id,
            Observer {
                target,
                queue: Vec::new(),
            },
        );
        ObserverId(id)
    }

    /// Stop an observer and drop its pending records.
    pub fn disconnect(&mut self, observer: ObserverId) {
        self.observers.remove(&observer.0);
    }

    /// Drain the records queued for `observer`. Empty once disconnected.
    pub fn take_records(&mut self, observer: ObserverId) -> Vec<MutationRecord> {
        self.observers
            .get_mut(&observer.0)
            .map(|o| std::mem::take(&mut o.queue))
            .unwrap_or_default()
    }

    /// Number of registered observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    fn get(&self, id: NodeId) -> Option<&Element> {
        self.elements.get(id)
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        self.elements.get_mut(id)
    }

    fn link(&mut self, parent: NodeId, child: NodeId) {
        if let Some(el) = self.get_mut(parent) {
            el.children.push(child);
        }
        if let Some(el) = self.get_mut(child) {
            el.parent = Some(parent);
        }
    }

    fn detach(&mut self, child: NodeId) -> Option<NodeId> {
        let parent = self.get_mut(child)?.parent.take()?;
        if let Some(el) = self.get_mut(parent) {
            el.children.retain(|&c| c != child);
        }
        Some(parent)
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    fn queue_record(&mut self, record: MutationRecord) {
        if !self.is_connected(record.target) {
            return;
        }
        let targets: Vec<u64> = self
            .observers
            .iter()
            .filter(|(_, o)| self.is_inclusive_ancestor(o.target, record.target))
            .map(|(&id, _)| id)
            .collect();
        for id in targets {
            if let Some(o) = self.observers.get_mut(&id) {
                o.queue.push(record.clone());
            }
        }
    }

    fn connected(&self) -> Vec<NodeId> {
        let mut nodes = vec![self.root];
        nodes.extend(self.descendants(self.root));
        nodes
    }

    fn write_node(&self, f: &mut fmt::Formatter<'_>, id: NodeId) -> fmt::Result {
        let Some(el) = self.get(id) else {
            return Ok(());
        };
        write!(f, "<{}", el.tag)?;
        for (name, value) in &el.attributes {
            write!(f, " {name}=\"{value}\"")?;
        }
        if !el.inline.is_empty() {
            let style: Vec<String> = el.inline.iter().map(render_declaration).collect();
            write!(f, " style=\"{}\"", style.join(" "))?;
        }
        write!(f, ">{}", el.text)?;
        for &child in &el.children {
            self.write_node(f, child)?;
        }
        write!(f, "</{}>", el.tag)
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_node(f, self.root)
    }
}

fn render_declaration(d: &Declaration) -> String {
    match d.priority {
        Priority::Normal => format!("{}: {};", d.property, d.value),
        Priority::Important => format!("{}: {} !important;", d.property, d.value),
    }
}

fn initial_value(property: &str) -> &'static str {
    match property {
        "background-color" => "rgba(0, 0, 0, 0)",
        "color" => "rgb(0, 0, 0)",
        "background-image" | "filter" => "none",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_document_skeleton() {
        let doc = Document::new();
        assert_eq!(doc.tag_name(doc.root()), Some("html"));
        assert_eq!(doc.children(doc.root()), &[doc.head(), doc.body()]);
        assert_eq!(doc.to_string(), "<html><head></head><body></body></html>");
    }

    #[test]
    fn test_append_and_descendants_in_document_order() -> Result<()> {
        let mut doc = Document::new();
        let outer = doc.create_element("DIV");
        let a = doc.create_element("p");
        let b = doc.create_element("span");
        let c = doc.create_element("em");
        doc.append_child(outer, a)?;
        doc.append_child(a, c)?;
        doc.append_child(outer, b)?;
        doc.append_child(doc.body(), outer)?;

        assert_eq!(doc.tag_name(outer), Some("div"));
        assert_eq!(doc.descendants(outer), vec![a, c, b]);
        assert!(doc.is_connected(c));
        Ok(())
    }

    #[test]
    fn test_append_rejects_cycles_and_stale_ids() -> Result<()> {
        let mut doc = Document::new();
        let a = doc.create_element("div");
        let b = doc.create_element("div");
        doc.append_child(a, b)?;
        assert!(doc.append_child(b, a).is_err());
        assert!(doc.append_child(a, a).is_err());
        assert!(doc.append_child(b, doc.root()).is_err());

        doc.append_child(doc.body(), a)?;
        doc.remove(a)?;
        assert!(doc.append_child(doc.body(), b).is_err());
        assert!(!doc.contains(b));
        Ok(())
    }

    #[test]
    fn test_removed_ids_do_not_alias_new_elements() -> Result<()> {
        let mut doc = Document::new();
        let old = doc.create_element("div");
        doc.append_child(doc.body(), old)?;
        doc.remove(old)?;
        let fresh = doc.create_element("div");
        assert_ne!(old, fresh);
        assert!(!doc.contains(old));
        assert!(doc.contains(fresh));
        Ok(())
    }

    #[test]
    fn test_skeleton_cannot_be_removed() {
        let mut doc = Document::new();
        assert!(doc.remove(doc.body()).is_err());
        assert!(doc.remove(doc.head()).is_err());
        assert!(doc.remove(doc.root()).is_err());
    }

    #[test]
    fn test_computed_style_resolution() -> Result<()> {
        let mut doc = Document::new();
        let div = doc.create_element("div");
        // Detached elements compute to nothing.
        assert_eq!(doc.computed_style(div, "color"), "");

        doc.append_child(doc.body(), div)?;
        assert_eq!(doc.computed_style(div, "background-color"), "rgba(0, 0, 0, 0)");
        assert_eq!(doc.computed_style(div, "background-image"), "none");

        doc.set_cascaded_style(div, "color", "rgb(10, 20, 30)");
        assert_eq!(doc.computed_style(div, "color"), "rgb(10, 20, 30)");

        doc.set_style_property(div, "color", "rgba(1,2,3,1)", Priority::Important);
        assert_eq!(doc.computed_style(div, "color"), "rgba(1,2,3,1)");

        doc.remove_style_property(div, "color");
        assert_eq!(doc.computed_style(div, "color"), "rgb(10, 20, 30)");
        Ok(())
    }

    #[test]
    fn test_set_style_property_replaces_in_place() -> Result<()> {
        let mut doc = Document::new();
        let div = doc.create_element("div");
        doc.append_child(doc.body(), div)?;
        doc.set_style_property(div, "color", "red", Priority::Normal);
        doc.set_style_property(div, "width", "1px", Priority::Normal);
        doc.set_style_property(div, "color", "blue", Priority::Important);
        assert_eq!(doc.inline_style(div).len(), 2);
        assert_eq!(
            doc.to_string(),
            "<html><head></head><body><div style=\"color: blue !important; width: 1px;\"></div></body></html>"
        );
        Ok(())
    }

    #[test]
    fn test_attributes_and_lookup() -> Result<()> {
        let mut doc = Document::new();
        let div = doc.create_element("div");
        doc.set_attribute(div, "id", "main");
        assert_eq!(doc.get_element_by_id("main"), None);

        doc.append_child(doc.body(), div)?;
        assert_eq!(doc.get_element_by_id("main"), Some(div));

        doc.set_attribute(div, "data-flag", "");
        assert_eq!(doc.query_attribute("data-flag"), vec![div]);
        doc.remove_attribute(div, "data-flag");
        assert!(doc.query_attribute("data-flag").is_empty());
        Ok(())
    }

    #[test]
    fn test_observer_sees_subtree_additions_only() -> Result<()> {
        let mut doc = Document::new();
        let observer = doc.observe(doc.body());

        let style = doc.create_element("style");
        doc.append_child(doc.head(), style)?;
        assert!(doc.take_records(observer).is_empty());

        let outer = doc.create_element("div");
        doc.append_child(doc.body(), outer)?;
        let inner = doc.create_element("span");
        doc.append_child(outer, inner)?;

        let records = doc.take_records(observer);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].target, doc.body());
        assert_eq!(records[0].added, vec![outer]);
        assert_eq!(records[1].target, outer);
        assert!(doc.take_records(observer).is_empty());
        Ok(())
    }

    #[test]
    fn test_detached_subtree_changes_are_not_recorded() -> Result<()> {
        let mut doc = Document::new();
        let observer = doc.observe(doc.body());
        let outer = doc.create_element("div");
        let inner = doc.create_element("span");
        doc.append_child(outer, inner)?;
        assert!(doc.take_records(observer).is_empty());

        doc.append_child(doc.body(), outer)?;
        let records = doc.take_records(observer);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].added, vec![outer]);
        Ok(())
    }

    #[test]
    fn test_removal_record_lists_whole_subtree() -> Result<()> {
        let mut doc = Document::new();
        let outer = doc.create_element("div");
        let inner = doc.create_element("span");
        doc.append_child(outer, inner)?;
        doc.append_child(doc.body(), outer)?;

        let observer = doc.observe(doc.body());
        doc.remove(outer)?;
        let records = doc.take_records(observer);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].removed, vec![outer, inner]);
        Ok(())
    }

    #[test]
    fn test_disconnect_drops_queue() -> Result<()> {
        let mut doc = Document::new();
        let observer = doc.observe(doc.body());
        assert_eq!(doc.observer_count(), 1);
        let div = doc.create_element("div");
        doc.append_child(doc.body(), div)?;
        doc.disconnect(observer);
        assert_eq!(doc.observer_count(), 0);
        assert!(doc.take_records(observer).is_empty());
        Ok(())
    }
}

//! Resource registry.
//!
//! Content streams refer to shared objects (graphics states, patterns,
//! shadings, soft mask forms) by name. A [`ResourceRegistry`] hands out
//! those names and the indirect object ids behind them. Registration is
//! idempotent by content: registering an equal object twice returns the
//! first name.
//!
//! [`ResourceCatalog`] is the in-memory registry used by the document
//! writer and the tests.

use std::collections::HashMap;

use crate::comp_op::PaintSoftMask;
use crate::error::Result;
use crate::pdf_primitive::Name;
use crate::style::GraphicsStyle;

// ============================================================================
// ResourceType
// ============================================================================

/// Kind of named resource, keyed by its resource dictionary entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceType {
    ExtGState,
    Pattern,
    Shading,
    XObject,
    Font,
}

impl ResourceType {
    pub const ALL: [ResourceType; 5] = [
        ResourceType::ExtGState,
        ResourceType::Pattern,
        ResourceType::Shading,
        ResourceType::XObject,
        ResourceType::Font,
    ];

    /// Key in a resource dictionary.
    pub fn name(&self) -> &'static str {
        match self {
            ResourceType::ExtGState => "ExtGState",
            ResourceType::Pattern => "Pattern",
            ResourceType::Shading => "Shading",
            ResourceType::XObject => "XObject",
            ResourceType::Font => "Font",
        }
    }

    /// Prefix of generated resource names.
    pub fn prefix(&self) -> &'static str {
        match self {
            ResourceType::ExtGState => "GS",
            ResourceType::Pattern => "P",
            ResourceType::Shading => "Sh",
            ResourceType::XObject => "X",
            ResourceType::Font => "F",
        }
    }

    /// The resource kind a content stream operator refers to.
    pub fn from_operator(op: &str) -> Option<ResourceType> {
        match op {
            "gs" => Some(ResourceType::ExtGState),
            "scn" | "SCN" => Some(ResourceType::Pattern),
            "sh" => Some(ResourceType::Shading),
            "Do" => Some(ResourceType::XObject),
            "Tf" => Some(ResourceType::Font),
            _ => None,
        }
    }
}

// ============================================================================
// ResourceRegistry
// ============================================================================

/// Names and numbers the shared objects a drawing refers to.
pub trait ResourceRegistry {
    /// Register the graphics state dictionary of `style`. `None` when the
    /// style has nothing to put in one.
    fn register_graphics_style(&mut self, style: &GraphicsStyle) -> Option<Name>;

    /// Register the form behind a soft mask, returning its object id.
    /// Registering the same mask again returns the same id.
    fn register_soft_mask(&mut self, mask: &PaintSoftMask) -> Result<u32>;

    /// Store an unnamed indirect object, returning its id.
    fn add_object(&mut self, body: String) -> u32;

    /// Store a named resource. A `name` is only used when the object is new.
    fn add(&mut self, kind: ResourceType, body: String, name: Option<Name>) -> Name;

    /// Object id behind a registered resource name.
    fn object_id(&self, kind: ResourceType, name: &Name) -> Option<u32>;

    /// Resources referenced by a content stream, in order of first use.
    fn scan_stream(&self, content: &str) -> Vec<(ResourceType, Name)> {
        scan_stream(content)
    }
}

/// Find the `/Name op` resource references in a content stream.
///
/// Font selection has a size operand between the name and `Tf`.
pub fn scan_stream(content: &str) -> Vec<(ResourceType, Name)> {
    let tokens: Vec<&str> = content.split_whitespace().collect();
    let mut found: Vec<(ResourceType, Name)> = Vec::new();
    for (i, token) in tokens.iter().enumerate() {
        let Some(name) = token.strip_prefix('/') else {
            continue;
        };
        if name.is_empty() {
            continue;
        }
        let kind = match tokens.get(i + 1).copied() {
            Some("Tf") => None,
            Some(op) => ResourceType::from_operator(op),
            None => None,
        }
        .or_else(|| match (tokens.get(i + 1), tokens.get(i + 2)) {
            (Some(size), Some(&"Tf")) if size.parse::<f64>().is_ok() => Some(ResourceType::Font),
            _ => None,
        });
        if let Some(kind) = kind {
            let entry = (kind, Name::new(name));
            if !found.contains(&entry) {
                found.push(entry);
            }
        }
    }
    found
}

// ============================================================================
// ResourceCatalog
// ============================================================================

/// In-memory [`ResourceRegistry`].
///
/// Objects are numbered sequentially from `first_object_id`; resource names
/// are the type's prefix followed by a per-type counter (`GS1`, `P1`,
/// `Sh1`).
#[derive(Debug, Clone)]
pub struct ResourceCatalog {
    first_object_id: u32,
    objects: Vec<String>,
    object_ids: HashMap<String, u32>,
    named: HashMap<(ResourceType, String), Name>,
    names: HashMap<(ResourceType, Name), u32>,
    order: Vec<(ResourceType, Name)>,
}

impl ResourceCatalog {
    pub fn new() -> Self {
        Self::with_first_object_id(1)
    }

    /// Catalog whose first object gets id `first_object_id`.
    pub fn with_first_object_id(first_object_id: u32) -> Self {
        Self {
            first_object_id,
            objects: Vec::new(),
            object_ids: HashMap::new(),
            named: HashMap::new(),
            names: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Object body stored under `id`.
    pub fn object(&self, id: u32) -> Option<&str> {
        let index = id.checked_sub(self.first_object_id)? as usize;
        self.objects.get(index).map(String::as_str)
    }

    /// All objects with their ids, in allocation order.
    pub fn objects(&self) -> impl Iterator<Item = (u32, &str)> + '_ {
        self.objects
            .iter()
            .enumerate()
            .map(move |(i, body)| (self.first_object_id + i as u32, body.as_str()))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Named resources of one kind, in registration order.
    pub fn resources(&self, kind: ResourceType) -> Vec<&Name> {
        self.order
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, name)| name)
            .collect()
    }

    /// Resource dictionary covering every named resource.
    pub fn resource_dictionary(&self) -> String {
        resource_dictionary(&self.order, |kind, name| self.object_id(kind, name))
    }

    fn next_name(&self, kind: ResourceType) -> Name {
        let count = self.order.iter().filter(|(k, _)| *k == kind).count();
        Name::new(format!("{}{}", kind.prefix(), count + 1))
    }
}

impl Default for ResourceCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceRegistry for ResourceCatalog {
    fn register_graphics_style(&mut self, style: &GraphicsStyle) -> Option<Name> {
        let body = style.serialize()?;
        let name = self.add(ResourceType::ExtGState, body, None);
        log::trace!("graphics state registered as /{name}");
        Some(name)
    }

    fn register_soft_mask(&mut self, mask: &PaintSoftMask) -> Result<u32> {
        if let Some(id) = mask.object_id() {
            return Ok(id);
        }
        let stream = mask.render(self)?;
        let (x0, y0, x1, y1) = mask.get_bounding_box();
        let resources = mask.get_resource_dictionary(&*self)?;
        let body = format!(
            "<</Type /XObject /Subtype /Form /BBox [{} {} {} {}] \
             /Group <</S /Transparency /CS /DeviceGray>> /Resources {resources} /Length {}>>\n\
             stream\n{stream}\nendstream",
            crate::basics::number_to_str(x0),
            crate::basics::number_to_str(y0),
            crate::basics::number_to_str(x1),
            crate::basics::number_to_str(y1),
            stream.len(),
        );
        let id = self.add_object(body);
        mask.set_object_id(id);
        log::debug!("soft mask form registered as object {id}");
        Ok(id)
    }

    fn add_object(&mut self, body: String) -> u32 {
        if let Some(&id) = self.object_ids.get(&body) {
            return id;
        }
        let id = self.first_object_id + self.objects.len() as u32;
        self.objects.push(body.clone());
        self.object_ids.insert(body, id);
        id
    }

    fn add(&mut self, kind: ResourceType, body: String, name: Option<Name>) -> Name {
        if let Some(existing) = self.named.get(&(kind, body.clone())) {
            return existing.clone();
        }
        let name = name.unwrap_or_else(|| self.next_name(kind));
        let id = self.add_object(body.clone());
        self.named.insert((kind, body), name.clone());
        self.names.insert((kind, name.clone()), id);
        self.order.push((kind, name.clone()));
        log::debug!("{} /{name} registered as object {id}", kind.name());
        name
    }

    fn object_id(&self, kind: ResourceType, name: &Name) -> Option<u32> {
        self.names.get(&(kind, name.clone())).copied()
    }
}

/// `<</Kind<</Name id 0 R...>>...>>` for the given references, grouped by
/// kind in first-seen order. References with no object id are skipped.
pub fn resource_dictionary(
    refs: &[(ResourceType, Name)],
    object_id: impl Fn(ResourceType, &Name) -> Option<u32>,
) -> String {
    let mut kinds: Vec<ResourceType> = Vec::new();
    for (kind, _) in refs {
        if !kinds.contains(kind) {
            kinds.push(*kind);
        }
    }
    let mut out = String::from("<<");
    for kind in kinds {
        out.push_str(&format!("/{}<<", kind.name()));
        for (_, name) in refs.iter().filter(|(k, _)| *k == kind) {
            if let Some(id) = object_id(kind, name) {
                out.push_str(&format!("/{name} {id} 0 R"));
            }
        }
        out.push_str(">>");
    }
    out.push_str(">>");
    out
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::StyleValue;

    #[test]
    fn test_add_deduplicates_by_content() {
        let mut catalog = ResourceCatalog::new();
        let a = catalog.add(ResourceType::Pattern, "<<A>>".into(), None);
        let b = catalog.add(ResourceType::Pattern, "<<B>>".into(), None);
        let a2 = catalog.add(ResourceType::Pattern, "<<A>>".into(), None);
        assert_eq!(a.as_str(), "P1");
        assert_eq!(b.as_str(), "P2");
        assert_eq!(a, a2);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.object_id(ResourceType::Pattern, &b), Some(2));
        assert_eq!(catalog.object(2), Some("<<B>>"));
    }

    #[test]
    fn test_names_are_per_type() {
        let mut catalog = ResourceCatalog::with_first_object_id(10);
        let sh = catalog.add(ResourceType::Shading, "<<S>>".into(), None);
        let p = catalog.add(ResourceType::Pattern, "<<P>>".into(), None);
        let named = catalog.add(ResourceType::Pattern, "<<Q>>".into(), Some(Name::new("Custom")));
        assert_eq!(sh.as_str(), "Sh1");
        assert_eq!(p.as_str(), "P1");
        assert_eq!(named.as_str(), "Custom");
        assert_eq!(catalog.object_id(ResourceType::Shading, &sh), Some(10));
        assert_eq!(catalog.object_id(ResourceType::Pattern, &sh), None);
        assert_eq!(
            catalog.resource_dictionary(),
            "<</Shading<</Sh1 10 0 R>>/Pattern<</P1 11 0 R/Custom 12 0 R>>>>"
        );
    }

    #[test]
    fn test_register_graphics_style() {
        let mut catalog = ResourceCatalog::new();
        assert_eq!(catalog.register_graphics_style(&GraphicsStyle::new()), None);
        let mut style = GraphicsStyle::new();
        style.set_stroke_width(StyleValue::Value(2.0));
        let first = catalog.register_graphics_style(&style).unwrap();
        let again = catalog.register_graphics_style(&style.clone()).unwrap();
        assert_eq!(first.as_str(), "GS1");
        assert_eq!(first, again);
        assert_eq!(catalog.object(1), Some("<< /Type /ExtGState\n/LW 2 >>"));
    }

    #[test]
    fn test_scan_stream() {
        let refs = scan_stream("q /GS1 gs /Pattern cs /P1 scn 0 0 m /F2 12 Tf /GS1 gs /Sh1 sh Q");
        assert_eq!(
            refs,
            vec![
                (ResourceType::ExtGState, Name::new("GS1")),
                (ResourceType::Pattern, Name::new("P1")),
                (ResourceType::Font, Name::new("F2")),
                (ResourceType::Shading, Name::new("Sh1")),
            ]
        );
        assert!(scan_stream("/Pattern cs 1 0 0 rg").is_empty());
    }
}

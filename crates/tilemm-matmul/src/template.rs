use std::collections::BTreeMap;
use std::fmt::Display;

use tilemm_common::Shape3;
use tilemm_runtime::ElemType;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// The names a kernel template can reference between double braces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Placeholder {
    /// WGSL name of the element type.
    Precision,
    /// Workgroup shape, as `x, y, z`.
    WorkgroupSize,
    /// Rows of `A` and `C`.
    M,
    /// Shared dimension.
    K,
    /// Columns of `C`, rows of `Bᵗ`.
    N,
    /// Side of the square tiles of the shared memory kernel.
    TileSize,
    /// Number of elements in a square tile.
    TileArea,
    /// Rows of a block tile.
    BM,
    /// Depth of a block tile.
    BK,
    /// Columns of a block tile.
    BN,
    /// Output rows computed by one worker.
    TM,
    /// Number of elements in a `BM x BK` tile.
    TileAreaA,
    /// Number of elements in a `BK x BN` tile.
    TileAreaB,
}

impl Placeholder {
    /// Every placeholder.
    pub const ALL: [Placeholder; 13] = [
        Placeholder::Precision,
        Placeholder::WorkgroupSize,
        Placeholder::M,
        Placeholder::K,
        Placeholder::N,
        Placeholder::TileSize,
        Placeholder::TileArea,
        Placeholder::BM,
        Placeholder::BK,
        Placeholder::BN,
        Placeholder::TM,
        Placeholder::TileAreaA,
        Placeholder::TileAreaB,
    ];

    /// The name written between the braces.
    pub fn name(&self) -> &'static str {
        match self {
            Placeholder::Precision => "precision",
            Placeholder::WorkgroupSize => "workgroupSize",
            Placeholder::M => "M",
            Placeholder::K => "K",
            Placeholder::N => "N",
            Placeholder::TileSize => "tileSize",
            Placeholder::TileArea => "tileArea",
            Placeholder::BM => "BM",
            Placeholder::BK => "BK",
            Placeholder::BN => "BN",
            Placeholder::TM => "TM",
            Placeholder::TileAreaA => "tileAreaA",
            Placeholder::TileAreaB => "tileAreaB",
        }
    }

    /// Find the placeholder with the given name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

impl Display for Placeholder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{OPEN}{}{CLOSE}", self.name())
    }
}

/// A value substituted for a placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum PlaceholderValue {
    /// An integer literal.
    #[display("{_0}")]
    Int(u64),
    /// A workgroup shape, as `x, y, z`.
    #[display("{_0}")]
    Shape(Shape3),
    /// An element type, as its WGSL name.
    #[display("{}", _0.wgsl_name())]
    Precision(ElemType),
}

impl From<u32> for PlaceholderValue {
    fn from(value: u32) -> Self {
        Self::Int(value as u64)
    }
}

impl From<usize> for PlaceholderValue {
    fn from(value: usize) -> Self {
        Self::Int(value as u64)
    }
}

impl From<Shape3> for PlaceholderValue {
    fn from(value: Shape3) -> Self {
        Self::Shape(value)
    }
}

impl From<ElemType> for PlaceholderValue {
    fn from(value: ElemType) -> Self {
        Self::Precision(value)
    }
}

/// Values of the placeholders of one instantiation, ordered by placeholder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceholderMap {
    values: BTreeMap<Placeholder, PlaceholderValue>,
}

impl PlaceholderMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the value of a placeholder, replacing any previous value.
    pub fn with<V: Into<PlaceholderValue>>(mut self, placeholder: Placeholder, value: V) -> Self {
        self.insert(placeholder, value);
        self
    }

    /// Set the value of a placeholder, returning the previous value.
    pub fn insert<V: Into<PlaceholderValue>>(
        &mut self,
        placeholder: Placeholder,
        value: V,
    ) -> Option<PlaceholderValue> {
        self.values.insert(placeholder, value.into())
    }

    /// The value of a placeholder.
    pub fn get(&self, placeholder: Placeholder) -> Option<&PlaceholderValue> {
        self.values.get(&placeholder)
    }

    /// Iterate over the entries in placeholder order.
    pub fn iter(&self) -> impl Iterator<Item = (Placeholder, PlaceholderValue)> + '_ {
        self.values.iter().map(|(k, v)| (*k, *v))
    }

    /// Number of placeholders with a value.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no placeholder has a value.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Errors detected when compiling a [template](ShaderTemplate).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// The template references a name that isn't a [placeholder](Placeholder).
    #[error("Template `{template}` references the unknown placeholder `{{{{{name}}}}}`")]
    UnknownPlaceholder {
        /// The template name.
        template: &'static str,
        /// The unknown name.
        name: String,
    },
    /// The template references a placeholder without a value.
    #[error("Template `{template}` references {placeholder}, which has no value")]
    Unresolved {
        /// The template name.
        template: &'static str,
        /// The placeholder.
        placeholder: Placeholder,
    },
    /// A value was supplied for a placeholder the template never references.
    #[error("Template `{template}` never references {placeholder}, but a value was supplied")]
    Unused {
        /// The template name.
        template: &'static str,
        /// The placeholder.
        placeholder: Placeholder,
    },
    /// An opening marker isn't closed.
    #[error("Template `{template}` has an unterminated placeholder at byte {offset}")]
    Unterminated {
        /// The template name.
        template: &'static str,
        /// Byte offset of the opening marker.
        offset: usize,
    },
}

/// Shader source with `{{NAME}}` placeholders. Shared by every instantiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderTemplate {
    name: &'static str,
    source: &'static str,
}

impl ShaderTemplate {
    /// Create a template from its name and source.
    pub const fn new(name: &'static str, source: &'static str) -> Self {
        Self { name, source }
    }

    /// The template name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The raw template source.
    pub fn source(&self) -> &'static str {
        self.source
    }

    /// Replace every placeholder with its value.
    ///
    /// Placeholders without a value are left untouched and nothing is validated: an incomplete
    /// map only shows up when the shader is rejected by the device compiler.
    pub fn render(&self, values: &PlaceholderMap) -> String {
        let mut out = String::with_capacity(self.source.len());
        let mut rest = self.source;

        while let Some(start) = rest.find(OPEN) {
            let Some(len) = rest[start + OPEN.len()..].find(CLOSE) else {
                break;
            };
            let name = &rest[start + OPEN.len()..start + OPEN.len() + len];
            let end = start + OPEN.len() + len + CLOSE.len();

            out.push_str(&rest[..start]);
            match Placeholder::from_name(name).and_then(|p| values.get(p)) {
                Some(value) => out.push_str(&value.to_string()),
                None => out.push_str(&rest[start..end]),
            }
            rest = &rest[end..];
        }

        out.push_str(rest);
        out
    }

    /// Replace every placeholder with its value, rejecting unknown names, placeholders without
    /// a value and values that are never used.
    pub fn compile(&self, values: &PlaceholderMap) -> Result<String, TemplateError> {
        let mut referenced = Vec::new();
        let mut rest = self.source;
        let mut offset = 0;

        while let Some(start) = rest.find(OPEN) {
            let name_start = start + OPEN.len();
            let len = rest[name_start..]
                .find(CLOSE)
                .ok_or(TemplateError::Unterminated {
                    template: self.name,
                    offset: offset + start,
                })?;
            let name = &rest[name_start..name_start + len];

            let placeholder =
                Placeholder::from_name(name).ok_or_else(|| TemplateError::UnknownPlaceholder {
                    template: self.name,
                    name: name.to_string(),
                })?;
            if values.get(placeholder).is_none() {
                return Err(TemplateError::Unresolved {
                    template: self.name,
                    placeholder,
                });
            }
            referenced.push(placeholder);

            let end = name_start + len + CLOSE.len();
            offset += end;
            rest = &rest[end..];
        }

        if let Some((placeholder, _)) = values.iter().find(|(p, _)| !referenced.contains(p)) {
            return Err(TemplateError::Unused {
                template: self.name,
                placeholder,
            });
        }

        Ok(self.render(values))
    }

    /// The distinct placeholders referenced by the template, in order of first appearance.
    pub fn placeholders(&self) -> Vec<Placeholder> {
        let mut found = Vec::new();
        let mut rest = self.source;

        while let Some(start) = rest.find(OPEN) {
            let name_start = start + OPEN.len();
            let Some(len) = rest[name_start..].find(CLOSE) else {
                break;
            };
            if let Some(p) = Placeholder::from_name(&rest[name_start..name_start + len]) {
                if !found.contains(&p) {
                    found.push(p);
                }
            }
            rest = &rest[name_start + len + CLOSE.len()..];
        }

        found
    }
}

/// Prepend the `enable` directive the element type needs, if any.
pub fn with_extensions(source: String, elem: ElemType) -> String {
    match elem.wgsl_extension() {
        Some(extension) => format!("{extension}\n{source}"),
        None => source,
    }
}

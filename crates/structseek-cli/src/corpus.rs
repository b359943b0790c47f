//! Directory-backed corpus.
//!
//! Each `*.json`, `*.yaml` or `*.yml` file in the corpus directory holds one
//! decoded resource. The resource name is the file name without that
//! extension (`SW1H01.ITM.json` is `SW1H01.ITM`). Documents are read when a
//! search loads them; only aliases are indexed up front.
//!
//! ```yaml
//! alias: Varscona
//! root:
//!   name: SW1H01.ITM
//!   kind: ITM
//!   children:
//!     - { name: Type, offset: 0x1c, number: 20, display: Long sword }
//!     - name: Ability 0
//!       offset: 0x72
//!       children:
//!         - { name: Flags, offset: 0x72, bits: 0x4 }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use structseek::{
    FieldValue, NodeId, Number, RecordTree, RecordTreeBuilder, ResourceId, ResourceRef,
    ResourceSource, Scalar, SearchError,
};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors raised while reading a resource document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("unsupported document extension: {0}")]
    UnsupportedFormat(String),

    #[error("node '{node}': invalid {field} '{input}'")]
    InvalidNumber {
        node: String,
        field: &'static str,
        input: String,
    },
}

/// One resource document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceDoc {
    #[serde(default)]
    pub alias: Option<String>,
    /// Absent for resources that are not structured records.
    #[serde(default)]
    pub root: Option<NodeDoc>,
}

/// One field or substructure of a resource document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeDoc {
    pub name: String,
    /// Defaults to the parent's offset.
    #[serde(default)]
    pub offset: Option<Scalar>,
    /// Shape of the node; defaults to the name without a trailing index.
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub number: Option<Scalar>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub bits: Option<Scalar>,
    #[serde(default)]
    pub display: Option<String>,
    /// Marks a childless node as a substructure.
    #[serde(default)]
    pub structure: bool,
    #[serde(default)]
    pub children: Vec<NodeDoc>,
}

impl NodeDoc {
    fn shape(&self) -> String {
        match &self.kind {
            Some(kind) => kind.clone(),
            None => strip_index(&self.name).to_string(),
        }
    }

    fn offset_or(&self, parent: u64) -> Result<u64, DocumentError> {
        match &self.offset {
            Some(offset) => offset.to_u64("offset").map_err(|_| self.invalid("offset", offset)),
            None => Ok(parent),
        }
    }

    fn value(&self) -> Result<FieldValue, DocumentError> {
        let mut value = FieldValue::none();
        if let Some(number) = &self.number {
            let n = to_number(number).ok_or_else(|| self.invalid("number", number))?;
            value = value.with_numeric(n);
        }
        if let Some(text) = &self.text {
            value = value.with_text(text.as_str());
        }
        if let Some(reference) = &self.reference {
            value = value.with_reference(ResourceRef::named(reference.as_str()));
        }
        if let Some(bits) = &self.bits {
            let n = bits.to_u64("bits").map_err(|_| self.invalid("bits", bits))?;
            value = value.with_bitfield(n);
        }
        if let Some(display) = &self.display {
            value = value.with_display(display.as_str());
        }
        Ok(value)
    }

    fn invalid(&self, field: &'static str, input: &Scalar) -> DocumentError {
        DocumentError::InvalidNumber {
            node: self.name.clone(),
            field,
            input: input.describe(),
        }
    }
}

/// `Actor 12` -> `Actor`.
fn strip_index(name: &str) -> &str {
    match name.trim_end().rsplit_once(char::is_whitespace) {
        Some((base, index)) if !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()) => {
            base.trim_end()
        }
        _ => name,
    }
}

fn to_number(scalar: &Scalar) -> Option<Number> {
    match scalar {
        Scalar::Unsigned(n) => Some(Number::U64(*n)),
        Scalar::Signed(n) => Some(Number::I64(*n)),
        Scalar::Text(_) => {
            let n = scalar.to_i128()?;
            i64::try_from(n)
                .map(Number::I64)
                .or_else(|_| u64::try_from(n).map(Number::U64))
                .ok()
        }
    }
}

impl ResourceDoc {
    /// Parses a document, choosing the format from the file extension.
    pub fn read(path: &Path) -> Result<Self, DocumentError> {
        let text = fs::read_to_string(path).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        match document_format(path) {
            Some(Format::Json) => Ok(serde_json::from_str(&text)?),
            Some(Format::Yaml) => Ok(serde_yaml::from_str(&text)?),
            None => Err(DocumentError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Builds the record tree, or `None` for non-structured resources.
    pub fn to_tree(&self) -> Result<Option<RecordTree>, DocumentError> {
        let Some(root) = &self.root else {
            return Ok(None);
        };
        let mut builder = RecordTreeBuilder::new(root.name.as_str(), root.shape().as_str());
        let base = root.offset_or(0)?;
        let parent = builder.root();
        for child in &root.children {
            add_node(&mut builder, parent, base, child)?;
        }
        Ok(Some(builder.build()))
    }
}

fn add_node(
    builder: &mut RecordTreeBuilder,
    parent: NodeId,
    parent_offset: u64,
    doc: &NodeDoc,
) -> Result<(), DocumentError> {
    let offset = doc.offset_or(parent_offset)?;
    if doc.structure || !doc.children.is_empty() {
        let id = builder.structure(parent, doc.name.as_str(), offset, doc.shape().as_str());
        for child in &doc.children {
            add_node(builder, id, offset, child)?;
        }
    } else {
        builder.field(parent, doc.name.as_str(), offset, doc.shape().as_str(), doc.value()?);
    }
    Ok(())
}

enum Format {
    Json,
    Yaml,
}

fn document_format(path: &Path) -> Option<Format> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "json" => Some(Format::Json),
        "yaml" | "yml" => Some(Format::Yaml),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct AliasOnly {
    #[serde(default)]
    alias: Option<String>,
}

/// Corpus read from a directory of resource documents.
#[derive(Debug, Default)]
pub struct DirectorySource {
    files: BTreeMap<ResourceId, PathBuf>,
    aliases: HashMap<ResourceId, String>,
}

impl DirectorySource {
    /// Lists the documents in `dir` and indexes their aliases.
    ///
    /// Documents whose alias cannot be read are still listed; the error
    /// surfaces when the search loads them.
    pub fn open(dir: &Path) -> Result<Self, DocumentError> {
        let io_err = |source| DocumentError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut source = DirectorySource::default();
        for entry in fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if !path.is_file() {
                continue;
            }
            let (Some(format), Some(stem)) = (
                document_format(&path),
                path.file_stem().and_then(|s| s.to_str()),
            ) else {
                continue;
            };

            let id = ResourceId::new(stem);
            match read_alias(&path, format) {
                Ok(Some(alias)) => {
                    source.aliases.insert(id.clone(), alias);
                }
                Ok(None) => {}
                Err(err) => warn!(resource = %id, error = %err, "cannot index alias"),
            }
            source.files.insert(id, path);
        }

        debug!(dir = %dir.display(), resources = source.files.len(), "corpus opened");
        Ok(source)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Distinct resource types present, e.g. `["CRE", "ITM"]`.
    pub fn types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.files.keys().map(ResourceId::type_tag).collect();
        types.sort();
        types.dedup();
        types
    }
}

fn read_alias(path: &Path, format: Format) -> Result<Option<String>, DocumentError> {
    let text = fs::read_to_string(path).map_err(|source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let doc: AliasOnly = match format {
        Format::Json => serde_json::from_str(&text)?,
        Format::Yaml => serde_yaml::from_str(&text)?,
    };
    Ok(doc.alias.filter(|alias| !alias.trim().is_empty()))
}

impl ResourceSource for DirectorySource {
    fn resources_of_type(&self, type_tag: &str) -> Vec<ResourceId> {
        self.files
            .keys()
            .filter(|id| id.is_type(type_tag))
            .cloned()
            .collect()
    }

    fn load(&self, id: &ResourceId) -> structseek::Result<Option<Arc<RecordTree>>> {
        let load_err = |message: String| SearchError::Load {
            resource: id.to_string(),
            message,
        };
        let path = self
            .files
            .get(id)
            .ok_or_else(|| load_err("resource not found".to_string()))?;
        let doc = ResourceDoc::read(path).map_err(|err| load_err(err.to_string()))?;
        let tree = doc.to_tree().map_err(|err| load_err(err.to_string()))?;
        Ok(tree.map(Arc::new))
    }

    fn alias(&self, id: &ResourceId) -> Option<String> {
        self.aliases.get(id).cloned()
    }
}

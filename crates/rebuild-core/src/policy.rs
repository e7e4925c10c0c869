//! Content management policy: per-document-type allow / sanitise / disallow flags
//! and the XML payload pushed to the engine.
//!
//! Caller-supplied flags are stored verbatim and only normalized when the
//! engine payload is built, so an out-of-range value never fails validation; it
//! simply becomes `sanitise`.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::error::{RebuildError, Result};

/// Literal prefix of every engine configuration payload.
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;

/// Error key used for unexpected top-level policy keys.
pub const POLICY_ERROR_KEY: &str = "ContentManagementPolicy";

/// Ordered field -> message map produced by request validation.
pub type FieldErrors = BTreeMap<String, String>;

/// Normalized flag value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Disposition {
    Allow,
    Sanitise,
    Disallow,
}

impl Disposition {
    pub fn as_str(self) -> &'static str {
        match self {
            Disposition::Allow => "allow",
            Disposition::Sanitise => "sanitise",
            Disposition::Disallow => "disallow",
        }
    }
}

/// `0 -> allow`, `2 -> disallow`, everything else -> `sanitise`.
pub fn normalize(flag: &Value) -> Disposition {
    match flag.as_f64() {
        Some(v) if v == 0.0 => Disposition::Allow,
        Some(v) if v == 2.0 => Disposition::Disallow,
        _ => Disposition::Sanitise,
    }
}

/// Content category a flag applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Metadata,
    InternalHyperlinks,
    ExternalHyperlinks,
    EmbeddedFiles,
    EmbeddedImages,
    Javascript,
    Acroform,
    ActionsAll,
    Macros,
    ReviewComments,
    DynamicDataExchange,
}

impl Category {
    /// Key callers use in request JSON.
    pub fn key(self) -> &'static str {
        match self {
            Category::Metadata => "Metadata",
            Category::InternalHyperlinks => "InternalHyperlinks",
            Category::ExternalHyperlinks => "ExternalHyperlinks",
            Category::EmbeddedFiles => "EmbeddedFiles",
            Category::EmbeddedImages => "EmbeddedImages",
            Category::Javascript => "Javascript",
            Category::Acroform => "Acroform",
            Category::ActionsAll => "ActionsAll",
            Category::Macros => "Macros",
            Category::ReviewComments => "ReviewComments",
            Category::DynamicDataExchange => "DynamicDataExchange",
        }
    }

    /// Element name in the engine payload.
    pub fn tag(self) -> &'static str {
        match self {
            Category::Metadata => "metadata",
            Category::InternalHyperlinks => "internal_hyperlinks",
            Category::ExternalHyperlinks => "external_hyperlinks",
            Category::EmbeddedFiles => "embedded_files",
            Category::EmbeddedImages => "embedded_images",
            Category::Javascript => "javascript",
            Category::Acroform => "acroform",
            Category::ActionsAll => "actions_all",
            Category::Macros => "macros",
            Category::ReviewComments => "review_comments",
            Category::DynamicDataExchange => "dynamic_data_exchange",
        }
    }
}

const PDF_CATEGORIES: &[Category] = &[
    Category::Metadata,
    Category::InternalHyperlinks,
    Category::ExternalHyperlinks,
    Category::EmbeddedFiles,
    Category::EmbeddedImages,
    Category::Javascript,
    Category::Acroform,
    Category::ActionsAll,
];

const OFFICE_CATEGORIES: &[Category] = &[
    Category::Metadata,
    Category::InternalHyperlinks,
    Category::ExternalHyperlinks,
    Category::EmbeddedFiles,
    Category::EmbeddedImages,
    Category::DynamicDataExchange,
    Category::Macros,
    Category::ReviewComments,
];

const POWERPOINT_CATEGORIES: &[Category] = &[
    Category::Metadata,
    Category::InternalHyperlinks,
    Category::ExternalHyperlinks,
    Category::EmbeddedFiles,
    Category::EmbeddedImages,
    Category::Macros,
    Category::ReviewComments,
];

/// Document family a policy section covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DocumentKind {
    Pdf,
    Excel,
    PowerPoint,
    Word,
}

impl DocumentKind {
    /// Caller-facing order of sections.
    pub const ALL: [DocumentKind; 4] = [
        DocumentKind::Pdf,
        DocumentKind::Excel,
        DocumentKind::PowerPoint,
        DocumentKind::Word,
    ];

    /// Section key in request JSON.
    pub fn section_key(self) -> &'static str {
        match self {
            DocumentKind::Pdf => "PdfContentManagement",
            DocumentKind::Excel => "ExcelContentManagement",
            DocumentKind::PowerPoint => "PowerPointContentManagement",
            DocumentKind::Word => "WordContentManagement",
        }
    }

    /// Block name in the engine payload.
    pub fn block_name(self) -> &'static str {
        match self {
            DocumentKind::Pdf => "pdfConfig",
            DocumentKind::Excel => "xlsConfig",
            DocumentKind::PowerPoint => "pptConfig",
            DocumentKind::Word => "wordConfig",
        }
    }

    pub fn categories(self) -> &'static [Category] {
        match self {
            DocumentKind::Pdf => PDF_CATEGORIES,
            DocumentKind::Excel | DocumentKind::Word => OFFICE_CATEGORIES,
            DocumentKind::PowerPoint => POWERPOINT_CATEGORIES,
        }
    }

    pub fn from_section_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.section_key() == key)
    }

    fn category_for_key(self, key: &str) -> Option<Category> {
        self.categories().iter().copied().find(|c| c.key() == key)
    }
}

/// Flags for one document kind, keyed by category.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionPolicy {
    kind: DocumentKind,
    flags: BTreeMap<Category, Value>,
}

impl SectionPolicy {
    fn defaults(kind: DocumentKind) -> Self {
        let flags = kind
            .categories()
            .iter()
            .map(|c| (*c, Value::from(1)))
            .collect();
        Self { kind, flags }
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    /// Raw flag as supplied (or defaulted).
    pub fn flag(&self, category: Category) -> Option<&Value> {
        self.flags.get(&category)
    }

    pub fn disposition(&self, category: Category) -> Option<Disposition> {
        self.flag(category).map(normalize)
    }

    fn tag(&self, category: Category) -> &'static str {
        self.flags
            .get(&category)
            .map_or(Disposition::Sanitise, normalize)
            .as_str()
    }
}

/// The four per-document sections pushed to the engine before a rebuild.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentManagementPolicy {
    pdf: SectionPolicy,
    excel: SectionPolicy,
    powerpoint: SectionPolicy,
    word: SectionPolicy,
}

impl Default for ContentManagementPolicy {
    /// Every category set to `1` (sanitise).
    fn default() -> Self {
        Self {
            pdf: SectionPolicy::defaults(DocumentKind::Pdf),
            excel: SectionPolicy::defaults(DocumentKind::Excel),
            powerpoint: SectionPolicy::defaults(DocumentKind::PowerPoint),
            word: SectionPolicy::defaults(DocumentKind::Word),
        }
    }
}

impl ContentManagementPolicy {
    pub fn section(&self, kind: DocumentKind) -> &SectionPolicy {
        match kind {
            DocumentKind::Pdf => &self.pdf,
            DocumentKind::Excel => &self.excel,
            DocumentKind::PowerPoint => &self.powerpoint,
            DocumentKind::Word => &self.word,
        }
    }

    fn section_mut(&mut self, kind: DocumentKind) -> &mut SectionPolicy {
        match kind {
            DocumentKind::Pdf => &mut self.pdf,
            DocumentKind::Excel => &mut self.excel,
            DocumentKind::PowerPoint => &mut self.powerpoint,
            DocumentKind::Word => &mut self.word,
        }
    }

    /// Overwrite one flag. Returns `false` if `category` does not apply to `kind`.
    pub fn set_flag(&mut self, kind: DocumentKind, category: Category, value: Value) -> bool {
        if !kind.categories().contains(&category) {
            return false;
        }
        self.section_mut(kind).flags.insert(category, value);
        true
    }

    /// Build a policy from caller-supplied JSON.
    ///
    /// `null` yields the defaults. Every top-level key must be a known section
    /// and every section key a category of that section; violations are
    /// reported per section as `Unexpected item found in policy: <key>`.
    /// Accepted flags overwrite the defaults verbatim.
    pub fn load_from_untrusted(candidate: &Value) -> std::result::Result<Self, FieldErrors> {
        let mut policy = Self::default();
        let mut errors = FieldErrors::new();

        let top = match candidate {
            Value::Null => return Ok(policy),
            Value::Object(map) => map,
            _ => {
                errors.insert(
                    POLICY_ERROR_KEY.to_string(),
                    "Policy must be a JSON object".to_string(),
                );
                return Err(errors);
            }
        };

        for key in top.keys() {
            if DocumentKind::from_section_key(key).is_none() {
                errors.insert(POLICY_ERROR_KEY.to_string(), unexpected(key));
            }
        }

        for kind in DocumentKind::ALL {
            let section = match top.get(kind.section_key()) {
                None | Some(Value::Null) => continue,
                Some(Value::Object(section)) => section,
                Some(_) => {
                    errors.insert(
                        kind.section_key().to_string(),
                        "Section must be a JSON object".to_string(),
                    );
                    continue;
                }
            };

            for (key, value) in section {
                match kind.category_for_key(key) {
                    Some(category) => {
                        policy.section_mut(kind).flags.insert(category, value.clone());
                    }
                    None => {
                        errors.insert(kind.section_key().to_string(), unexpected(key));
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(policy)
        } else {
            Err(errors)
        }
    }

    /// Fixed nested structure with every flag normalized.
    pub fn engine_config(&self) -> EngineConfig {
        let pdf = &self.pdf;
        let ppt = &self.powerpoint;
        EngineConfig {
            pdf: PdfConfig {
                acroform: pdf.tag(Category::Acroform),
                actions_all: pdf.tag(Category::ActionsAll),
                internal_hyperlinks: pdf.tag(Category::InternalHyperlinks),
                external_hyperlinks: pdf.tag(Category::ExternalHyperlinks),
                embedded_files: pdf.tag(Category::EmbeddedFiles),
                embedded_images: pdf.tag(Category::EmbeddedImages),
                javascript: pdf.tag(Category::Javascript),
                metadata: pdf.tag(Category::Metadata),
            },
            ppt: PptConfig {
                embedded_files: ppt.tag(Category::EmbeddedFiles),
                embedded_images: ppt.tag(Category::EmbeddedImages),
                internal_hyperlinks: ppt.tag(Category::InternalHyperlinks),
                external_hyperlinks: ppt.tag(Category::ExternalHyperlinks),
                macros: ppt.tag(Category::Macros),
                metadata: ppt.tag(Category::Metadata),
                review_comments: ppt.tag(Category::ReviewComments),
            },
            xls: OfficeConfig::from_section(&self.excel),
            word: OfficeConfig::from_section(&self.word),
        }
    }

    /// Engine payload using the default XML encoder.
    pub fn serialize(&self) -> Result<String> {
        self.serialize_with(|config| {
            quick_xml::se::to_string(config)
                .map_err(|e| RebuildError::Unexpected(format!("config serialization: {e}")))
        })
    }

    /// Engine payload with an injected structure-to-text step.
    pub fn serialize_with<F, E>(&self, encode: F) -> std::result::Result<String, E>
    where
        F: FnOnce(&EngineConfig) -> std::result::Result<String, E>,
    {
        let body = encode(&self.engine_config())?;
        Ok(format!("{XML_DECLARATION}{body}"))
    }
}

fn unexpected(key: &str) -> String {
    format!("Unexpected item found in policy: {key}")
}

/// Root of the engine payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename = "config")]
pub struct EngineConfig {
    #[serde(rename = "pdfConfig")]
    pub pdf: PdfConfig,
    #[serde(rename = "pptConfig")]
    pub ppt: PptConfig,
    #[serde(rename = "xlsConfig")]
    pub xls: OfficeConfig,
    #[serde(rename = "wordConfig")]
    pub word: OfficeConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PdfConfig {
    pub acroform: &'static str,
    pub actions_all: &'static str,
    pub internal_hyperlinks: &'static str,
    pub external_hyperlinks: &'static str,
    pub embedded_files: &'static str,
    pub embedded_images: &'static str,
    pub javascript: &'static str,
    pub metadata: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PptConfig {
    pub embedded_files: &'static str,
    pub embedded_images: &'static str,
    pub internal_hyperlinks: &'static str,
    pub external_hyperlinks: &'static str,
    pub macros: &'static str,
    pub metadata: &'static str,
    pub review_comments: &'static str,
}

/// Shared by the Excel and Word blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OfficeConfig {
    pub embedded_files: &'static str,
    pub embedded_images: &'static str,
    pub internal_hyperlinks: &'static str,
    pub external_hyperlinks: &'static str,
    pub macros: &'static str,
    pub metadata: &'static str,
    pub review_comments: &'static str,
    pub dynamic_data_exchange: &'static str,
}

impl OfficeConfig {
    fn from_section(section: &SectionPolicy) -> Self {
        Self {
            embedded_files: section.tag(Category::EmbeddedFiles),
            embedded_images: section.tag(Category::EmbeddedImages),
            internal_hyperlinks: section.tag(Category::InternalHyperlinks),
            external_hyperlinks: section.tag(Category::ExternalHyperlinks),
            macros: section.tag(Category::Macros),
            metadata: section.tag(Category::Metadata),
            review_comments: section.tag(Category::ReviewComments),
            dynamic_data_exchange: section.tag(Category::DynamicDataExchange),
        }
    }
}

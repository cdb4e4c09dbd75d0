//! Static category and tool catalog plus the lookups the navigation shell uses.
//!
//! Categories are addressable both by numeric id and by URL slug. Id `0` is
//! reserved for the synthetic "all" category, which is never stored in
//! [`CATEGORIES`] but is returned by the lookups whenever the caller asks for
//! "no particular category".

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

const SITE_NAME: &str = "QuickToolify";
const SITE_TITLE: &str = "QuickToolify - Handy everyday tool collection";
const SITE_DESCRIPTION: &str =
    "QuickToolify makes it easy to find handy tools across a range of categories.";
const SITE_KEYWORDS: &str = "tools, online tools, QuickToolify, utilities";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),
}

/// Path used when no category is selected.
pub const ALL_CATEGORY_PATH: &str = "/category/all";

/// A named grouping of tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: u32,
    pub name: &'static str,
    pub slug: &'static str,
    pub bg: &'static str,
    pub text: &'static str,
    pub description: &'static str,
    pub keywords: &'static [&'static str],
}

/// A single-purpose utility, linked to exactly one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub id: u32,
    pub category_id: u32,
    pub name: &'static str,
    pub description: &'static str,
    pub icon_name: &'static str,
    pub slug: &'static str,
    pub url: &'static str,
    pub bg: &'static str,
    pub text: &'static str,
}

pub static ALL_CATEGORY: Category = Category {
    id: 0,
    name: "All",
    slug: "all",
    bg: "#FFFFFF",
    text: "#000000",
    description: "Show every tool category",
    keywords: &["tools", "all", "collection", "online tools"],
};

pub static CATEGORIES: &[Category] = &[
    Category {
        id: 1,
        name: "Image editing",
        slug: "image-editing",
        bg: "#FFEBEE",
        text: "#D32F2F",
        description: "Image editing tools for resizing, compression and format conversion",
        keywords: &["image editing", "image conversion", "resize", "compression"],
    },
    Category {
        id: 2,
        name: "JSON formatting",
        slug: "json-formatter",
        bg: "#E3F2FD",
        text: "#1976D2",
        description: "Tools to format, validate and transform JSON data",
        keywords: &["JSON", "data formatting", "formatter", "structured data"],
    },
    Category {
        id: 3,
        name: "Video conversion",
        slug: "video-converter",
        bg: "#FFF9C4",
        text: "#FBC02D",
        description: "Conversion between the common video formats",
        keywords: &["video conversion", "MP4", "video format", "conversion"],
    },
    Category {
        id: 4,
        name: "Compression",
        slug: "compression-tools",
        bg: "#E8F5E9",
        text: "#388E3C",
        description: "Compression tools that shrink file sizes",
        keywords: &["compression", "ZIP", "file compression", "size reduction"],
    },
    Category {
        id: 5,
        name: "Document conversion",
        slug: "document-converter",
        bg: "#F3E5F5",
        text: "#8E24AA",
        description: "Conversion between PDF, Word and Excel documents",
        keywords: &["document conversion", "PDF", "Word", "Excel", "conversion"],
    },
    Category {
        id: 6,
        name: "Utilities",
        slug: "utilities",
        bg: "#FFFDE7",
        text: "#F9A825",
        description: "Everyday helpers such as password generation, to-do lists and typing practice",
        keywords: &["utilities", "password", "to-do", "typing"],
    },
];

pub static TOOLS: &[Tool] = &[
    Tool {
        id: 1,
        category_id: 1,
        name: "Image resize",
        description: "Change the dimensions of an image",
        icon_name: "Image",
        slug: "image-resize",
        url: "/tool/image-resize",
        bg: "#FFF3F3",
        text: "#C62828",
    },
    Tool {
        id: 2,
        category_id: 1,
        name: "Image compression",
        description: "Make images lighter",
        icon_name: "FileArchive",
        slug: "image-compress",
        url: "/tool/image-compress",
        bg: "#F3E5F5",
        text: "#6A1B9A",
    },
    Tool {
        id: 3,
        category_id: 1,
        name: "Image format conversion",
        description: "JPEG, PNG, WebP conversion",
        icon_name: "RefreshCw",
        slug: "image-convert",
        url: "/tool/image-convert",
        bg: "#E8F5E9",
        text: "#2E7D32",
    },
    Tool {
        id: 4,
        category_id: 2,
        name: "JSON format",
        description: "Pretty-print JSON data",
        icon_name: "FileArchive",
        slug: "json-format",
        url: "/tool/json-format",
        bg: "#E8F4FD",
        text: "#1565C0",
    },
    Tool {
        id: 5,
        category_id: 6,
        name: "Password generator",
        description: "Generate passwords automatically",
        icon_name: "Key",
        slug: "generate-password",
        url: "/tool/generate-password",
        bg: "#FFFDE7",
        text: "#F9A825",
    },
    Tool {
        id: 6,
        category_id: 4,
        name: "ZIP compression",
        description: "Compress files into a ZIP archive",
        icon_name: "FileArchive",
        slug: "zip-compress",
        url: "/tool/zip-compress",
        bg: "#E8F5E9",
        text: "#2E7D32",
    },
    Tool {
        id: 7,
        category_id: 5,
        name: "PDF conversion",
        description: "Convert documents to PDF",
        icon_name: "RefreshCw",
        slug: "pdf-convert",
        url: "/tool/pdf-convert",
        bg: "#F3E5F5",
        text: "#6A1B9A",
    },
    Tool {
        id: 8,
        category_id: 6,
        name: "To-do list",
        description: "A simple task manager",
        icon_name: "CheckSquare",
        slug: "todo-list",
        url: "/tool/todo-list",
        bg: "#E0F7FA",
        text: "#00838F",
    },
    Tool {
        id: 9,
        category_id: 6,
        name: "Typing practice",
        description: "Train typing speed and accuracy",
        icon_name: "Keyboard",
        slug: "typing-practice",
        url: "/tool/typing-practice",
        bg: "#EDE7F6",
        text: "#4527A0",
    },
];

fn is_all(id: Option<u32>) -> bool {
    matches!(id, None | Some(0))
}

/// Look up a category by id. `None` and `Some(0)` resolve to [`ALL_CATEGORY`].
pub fn get_category_by_id(id: Option<u32>) -> Option<&'static Category> {
    if is_all(id) {
        return Some(&ALL_CATEGORY);
    }
    CATEGORIES.iter().find(|cat| Some(cat.id) == id)
}

/// Look up a category by its URL slug. `"all"` resolves to [`ALL_CATEGORY`].
pub fn get_category_by_slug(slug: &str) -> Option<&'static Category> {
    if slug == ALL_CATEGORY.slug {
        return Some(&ALL_CATEGORY);
    }
    CATEGORIES.iter().find(|cat| cat.slug == slug)
}

/// Build the `/category/{slug}` path for an id. Unknown ids fall back to the
/// "all" path.
pub fn get_category_path_by_id(id: Option<u32>) -> String {
    if is_all(id) {
        return ALL_CATEGORY_PATH.to_string();
    }
    match get_category_by_id(id) {
        Some(category) => format!("/category/{}", category.slug),
        None => ALL_CATEGORY_PATH.to_string(),
    }
}

pub fn get_category_path_by_slug(slug: Option<&str>) -> String {
    match slug {
        None => ALL_CATEGORY_PATH.to_string(),
        Some(slug) => format!("/category/{slug}"),
    }
}

fn category_path_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/category/(.+)$").expect("static regex is valid"))
}

/// Resolve a `/category/{param}` path back to a category id.
///
/// The parameter is tried as a slug first and only then as a legacy numeric
/// id, so old `/category/3` links keep working. `all`, unknown parameters and
/// paths that do not match the pattern resolve to `None` ("all categories").
pub fn get_category_id_from_path(path: &str) -> Option<u32> {
    let param = category_path_regex().captures(path)?.get(1)?.as_str();
    if param == ALL_CATEGORY.slug {
        return None;
    }

    if let Some(category) = get_category_by_slug(param) {
        return Some(category.id);
    }

    if param.chars().all(|c| c.is_ascii_digit()) {
        let id = param.parse::<u32>().ok()?;
        return get_category_by_id(Some(id)).and_then(|cat| (cat.id != 0).then_some(cat.id));
    }

    None
}

/// Tools belonging to a category, in catalog order. `None`/`Some(0)` returns
/// every tool.
pub fn get_tools_by_category(id: Option<u32>) -> Vec<&'static Tool> {
    if is_all(id) {
        return TOOLS.iter().collect();
    }
    TOOLS
        .iter()
        .filter(|tool| Some(tool.category_id) == id)
        .collect()
}

pub fn get_tool_by_slug(slug: &str) -> Option<&'static Tool> {
    TOOLS.iter().find(|tool| tool.slug == slug)
}

/// Resolve a user-supplied category argument: `all`, a slug or a numeric id.
/// `Ok(None)` means "all categories".
pub fn resolve_category(param: &str) -> Result<Option<&'static Category>, CatalogError> {
    let param = param.trim();
    if param.is_empty() || param == ALL_CATEGORY.slug {
        return Ok(None);
    }

    let found = get_category_by_slug(param).or_else(|| {
        param
            .parse::<u32>()
            .ok()
            .and_then(|id| get_category_by_id(Some(id)))
    });

    match found {
        Some(category) if category.id == 0 => Ok(None),
        Some(category) => Ok(Some(category)),
        None => Err(CatalogError::UnknownCategory(param.to_string())),
    }
}

pub fn require_tool(slug: &str) -> Result<&'static Tool, CatalogError> {
    get_tool_by_slug(slug).ok_or_else(|| CatalogError::UnknownTool(slug.to_string()))
}

/// Tools whose `category_id` does not name an existing category.
pub fn find_orphaned_tools() -> Vec<&'static Tool> {
    TOOLS
        .iter()
        .filter(|tool| !CATEGORIES.iter().any(|cat| cat.id == tool.category_id))
        .collect()
}

/// The entries a category filter shows: "all" first, then every category.
pub fn category_filter_entries() -> Vec<&'static Category> {
    std::iter::once(&ALL_CATEGORY)
        .chain(CATEGORIES.iter())
        .collect()
}

pub fn get_page_title(id: Option<u32>) -> String {
    match get_category_by_id(id) {
        Some(category) => format!("{} - {SITE_NAME}", category.name),
        None => SITE_TITLE.to_string(),
    }
}

pub fn get_page_description(id: Option<u32>) -> String {
    match get_category_by_id(id) {
        Some(category) if category.id != 0 => category.description.to_string(),
        _ => SITE_DESCRIPTION.to_string(),
    }
}

pub fn get_page_keywords(id: Option<u32>) -> String {
    match get_category_by_id(id) {
        Some(category) if category.id != 0 => category.keywords.join(", "),
        _ => SITE_KEYWORDS.to_string(),
    }
}

//! Sitemap generation.
//!
//! Content comes from the remote database: published posts and pages, active
//! categories and forums. The default locale lives at the site root, every
//! other locale under `/<locale>`. The combined sitemap lists default-locale
//! URLs with `xhtml:link` alternates for each locale.

use std::fmt::Write as _;

use chrono::{DateTime, SecondsFormat, Utc};

use anacan_provision::{Document, DocumentService, Query};
use anacan_shared::constants::{
    COLLECTION_CATEGORIES, COLLECTION_FORUMS, COLLECTION_PAGES, COLLECTION_POSTS, LOCALES,
};

use crate::error::ServerError;

/// Upper bound on documents fetched per collection.
const MAX_DOCUMENTS: u32 = 5000;

const XML_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
const URLSET_OPEN: &str = r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#;
const URLSET_OPEN_ALTERNATES: &str = r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9" xmlns:xhtml="http://www.w3.org/1999/xhtml">"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeFreq {
    Daily,
    Weekly,
    Monthly,
}

impl ChangeFreq {
    fn as_str(self) -> &'static str {
        match self {
            ChangeFreq::Daily => "daily",
            ChangeFreq::Weekly => "weekly",
            ChangeFreq::Monthly => "monthly",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    /// Locale-neutral path, always starting with `/`.
    pub path: String,
    pub lastmod: Option<DateTime<Utc>>,
    pub changefreq: ChangeFreq,
    pub priority: f32,
}

impl SitemapEntry {
    pub fn new(path: impl Into<String>, changefreq: ChangeFreq, priority: f32) -> Self {
        Self {
            path: path.into(),
            lastmod: None,
            changefreq,
            priority,
        }
    }

    /// Set `lastmod` from an RFC-3339 timestamp; unparsable values are ignored.
    pub fn with_lastmod(mut self, raw: Option<&str>) -> Self {
        self.lastmod = raw
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));
        self
    }
}

/// Sections of the site that exist regardless of content.
pub fn static_entries() -> Vec<SitemapEntry> {
    vec![
        SitemapEntry::new("/", ChangeFreq::Daily, 1.0),
        SitemapEntry::new("/blog", ChangeFreq::Daily, 0.9),
        SitemapEntry::new("/forum", ChangeFreq::Daily, 0.8),
    ]
}

/// Fetch every public document that should appear in the sitemap.
pub async fn collect_entries(
    documents: &dyn DocumentService,
    database_id: &str,
) -> Result<Vec<SitemapEntry>, ServerError> {
    let mut entries = static_entries();

    let categories = documents
        .list_documents(
            database_id,
            COLLECTION_CATEGORIES,
            &[
                Query::equal("is_active", true),
                Query::order_asc("sort_order"),
                Query::limit(MAX_DOCUMENTS),
            ],
        )
        .await?;
    entries.extend(to_entries(&categories.documents, "/category", ChangeFreq::Weekly, 0.7));

    let posts = documents
        .list_documents(
            database_id,
            COLLECTION_POSTS,
            &[
                Query::equal("status", "published"),
                Query::order_desc("published_at"),
                Query::limit(MAX_DOCUMENTS),
            ],
        )
        .await?;
    entries.extend(to_entries(&posts.documents, "/blog", ChangeFreq::Weekly, 0.8));

    let pages = documents
        .list_documents(
            database_id,
            COLLECTION_PAGES,
            &[Query::equal("status", "published"), Query::limit(MAX_DOCUMENTS)],
        )
        .await?;
    entries.extend(to_entries(&pages.documents, "", ChangeFreq::Monthly, 0.5));

    let forums = documents
        .list_documents(
            database_id,
            COLLECTION_FORUMS,
            &[
                Query::equal("is_active", true),
                Query::order_asc("sort_order"),
                Query::limit(MAX_DOCUMENTS),
            ],
        )
        .await?;
    entries.extend(to_entries(&forums.documents, "/forum", ChangeFreq::Daily, 0.6));

    Ok(entries)
}

fn to_entries(
    documents: &[Document],
    prefix: &str,
    changefreq: ChangeFreq,
    priority: f32,
) -> Vec<SitemapEntry> {
    documents
        .iter()
        .filter_map(|doc| {
            let slug = doc.str_field("slug").filter(|s| !s.is_empty())?;
            let lastmod = doc
                .updated_at
                .as_deref()
                .or_else(|| doc.str_field("published_at"));
            Some(SitemapEntry::new(format!("{prefix}/{slug}"), changefreq, priority).with_lastmod(lastmod))
        })
        .collect()
}

/// Absolute URL of `path` in `locale`. The default locale is unprefixed.
pub fn localized_url(site_url: &str, locale: &str, path: &str) -> String {
    if locale == LOCALES[0] {
        format!("{site_url}{path}")
    } else if path == "/" {
        format!("{site_url}/{locale}")
    } else {
        format!("{site_url}/{locale}{path}")
    }
}

/// Sitemap for a single locale.
pub fn render_locale(site_url: &str, entries: &[SitemapEntry], locale: &str) -> String {
    let mut xml = String::with_capacity(128 * (entries.len() + 1));
    xml.push_str(XML_HEADER);
    xml.push('\n');
    xml.push_str(URLSET_OPEN);
    xml.push('\n');
    for entry in entries {
        push_url(&mut xml, &localized_url(site_url, locale, &entry.path), entry, None);
    }
    xml.push_str("</urlset>\n");
    xml
}

/// Combined sitemap: default-locale URLs with alternates for every locale.
pub fn render_all(site_url: &str, entries: &[SitemapEntry]) -> String {
    let mut xml = String::with_capacity(256 * (entries.len() + 1));
    xml.push_str(XML_HEADER);
    xml.push('\n');
    xml.push_str(URLSET_OPEN_ALTERNATES);
    xml.push('\n');
    for entry in entries {
        push_url(
            &mut xml,
            &localized_url(site_url, LOCALES[0], &entry.path),
            entry,
            Some(site_url),
        );
    }
    xml.push_str("</urlset>\n");
    xml
}

/// Served when the content could not be fetched: just the site root.
pub fn fallback(site_url: &str) -> String {
    format!(
        "{XML_HEADER}\n{URLSET_OPEN}\n  <url>\n    <loc>{}/</loc>\n  </url>\n</urlset>\n",
        escape(site_url)
    )
}

fn push_url(xml: &mut String, loc: &str, entry: &SitemapEntry, alternates_for: Option<&str>) {
    // Writing to a String cannot fail.
    let _ = writeln!(xml, "  <url>");
    let _ = writeln!(xml, "    <loc>{}</loc>", escape(loc));
    if let Some(site_url) = alternates_for {
        for locale in LOCALES {
            let _ = writeln!(
                xml,
                r#"    <xhtml:link rel="alternate" hreflang="{locale}" href="{}"/>"#,
                escape(&localized_url(site_url, locale, &entry.path))
            );
        }
    }
    if let Some(lastmod) = entry.lastmod {
        let _ = writeln!(
            xml,
            "    <lastmod>{}</lastmod>",
            lastmod.to_rfc3339_opts(SecondsFormat::Secs, true)
        );
    }
    let _ = writeln!(xml, "    <changefreq>{}</changefreq>", entry.changefreq.as_str());
    let _ = writeln!(xml, "    <priority>{:.1}</priority>", entry.priority);
    let _ = writeln!(xml, "  </url>");
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

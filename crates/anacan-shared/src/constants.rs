/// Application name
pub const APP_NAME: &str = "Anacan.az";

/// Public site URL used in sitemaps
pub const DEFAULT_SITE_URL: &str = "https://anacan.az";

/// Default Appwrite-compatible API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://cloud.appwrite.io/v1";

/// Default database identifier
pub const DEFAULT_DATABASE_ID: &str = "anacan";

/// Human-readable database name used when the database has to be created
pub const DATABASE_NAME: &str = "Anacan";

/// Placeholder id that asks the remote service to generate a document id
pub const UNIQUE_ID: &str = "unique()";

/// Default number of attempts for one remote operation
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default base delay between retries (milliseconds)
pub const DEFAULT_RETRY_BASE_MS: u64 = 1_500;

/// Default upper bound of a single retry delay (milliseconds)
pub const DEFAULT_RETRY_MAX_MS: u64 = 3_000;

/// Default random jitter added to a retry delay (milliseconds)
pub const DEFAULT_JITTER_MS: u64 = 250;

/// Default settle delay after a schema mutation (milliseconds)
pub const DEFAULT_SETTLE_MS: u64 = 1_000;

/// Locales served by the site; the first one is the default and is not
/// prefixed in URLs.
pub const LOCALES: [&str; 2] = ["az", "ru"];

/// Collection identifiers
pub const COLLECTION_CATEGORIES: &str = "categories";
pub const COLLECTION_POSTS: &str = "posts";
pub const COLLECTION_PAGES: &str = "pages";
pub const COLLECTION_FORUMS: &str = "forums";
pub const COLLECTION_FORUM_TOPICS: &str = "forum_topics";
pub const COLLECTION_COMMENTS: &str = "comments";
pub const COLLECTION_READING_LISTS: &str = "reading_lists";
pub const COLLECTION_READING_LIST_ITEMS: &str = "reading_list_items";
pub const COLLECTION_SUBSCRIBERS: &str = "newsletter_subscribers";

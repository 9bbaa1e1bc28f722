// Timeouts (milliseconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 30000;
pub const CONTAINER_WAIT_TIMEOUT_MS: u64 = 10000;
pub const URL_NAVIGATION_TIMEOUT_MS: u64 = 5000;
pub const ELEMENT_VISIBILITY_TIMEOUT_MS: u64 = 2000;

// Safety limits
pub const MAX_PAGINATION_PAGES: usize = 10;
pub const MAX_REPEAT_CLICKS: usize = 50;

// Validation thresholds
pub const MIN_TITLE_LENGTH: usize = 3;
pub const MIN_TITLE_WORDS: usize = 2;
pub const MIN_ROW_TEXT_LENGTH: usize = 10;
pub const MIN_URL_DEPTH: usize = 4;
pub const FALLBACK_TITLE_CHARS: usize = 100;

// Pacing (milliseconds)
pub const DEFAULT_ACTION_WAIT_MS: u64 = 500;
pub const RESPECTFUL_DELAY_MS: u64 = 1000;
pub const POST_NAVIGATION_DELAY_MS: u64 = 1000;
pub const URL_RECHECK_DELAY_MS: u64 = 1000;

// Navigation retry
pub const NAVIGATION_ATTEMPTS: usize = 3;
pub const NAVIGATION_BACKOFF_MIN_MS: u64 = 4000;
pub const NAVIGATION_BACKOFF_MAX_MS: u64 = 10000;

pub const VIEWPORT: (u32, u32) = (1920, 1080);

pub const HEADING_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];
pub const CHROME_TAGS: &[&str] = &["nav", "header", "footer"];

/// Greenhouse-style containers inside embedded boards.
pub const IFRAME_JOB_SELECTORS: &[&str] = &[
    ".opening",
    "div.opening",
    "section.level-0",
    "div[id*=\"job\"]",
];

/// Cheap relevance gate for frame text.
pub const JOB_INDICATORS: &[&str] = &["job", "position", "career", "opening", "apply", "role"];

pub const JOB_URL_PATTERNS: &[&str] = &[
    "/job/",
    "/jobs/",
    "/position/",
    "/positions/",
    "/career/",
    "/careers/",
    "/opening/",
    "/openings/",
    "/role/",
    "/roles/",
];

// A trailing `$` anchors the pattern to the end of the href.
pub const EXCLUDE_URL_PATTERNS: &[&str] = &[
    "/embed/",
    "/careers$",
    "/careers/$",
    "/careers#",
    "#",
    "javascript:",
    "mailto:",
    "/search",
    "/filter",
];

pub const EXCLUDE_TITLE_KEYWORDS: &[&str] = &["view all", "see all", "back to", "home", "careers", "about", "apply"];

pub const NON_JOB_KEYWORDS: &[&str] = &[
    "talent network",
    "join our",
    "join the",
    "talent community",
    "sign up",
    "career alert",
    "job alert",
    "newsletter",
    "filter",
    "sort by",
    "results",
    "open positions",
    "our values",
    "company values",
    "benefits",
    "perks",
];

pub const DATA_ATTR_EXCLUSIONS: &[&str] = &["talent", "community", "event", "tcjoin"];

pub const DEFAULT_PAGINATION_SELECTORS: &[&str] = &[
    "a[aria-label=\"Next\"]",
    "a[aria-label=\"Next page\"]",
    "button[aria-label=\"Next\"]",
    "button[aria-label=\"Next page\"]",
    "a[rel=\"next\"]",
    "a.next-page",
    "a.pagination-next",
    "button.next-page",
    "button.pagination-next",
    "nav a:has-text(\"Next\")",
    "nav button:has-text(\"Next\")",
    "div[role=\"navigation\"] a:has-text(\"Next\")",
    "div[role=\"navigation\"] button:has-text(\"Next\")",
    "button:has-text(\"Show More\")",
    "button:has-text(\"Load More\")",
    "a:has-text(\"Show More\")",
    "a:has-text(\"Load More\")",
    "nav.pagination a.next",
    "ul.pagination a.next",
    "div.pagination a.next",
    "nav[aria-label*=\"pagination\" i] a:last-child",
];

pub const PAGINATION_KEYWORDS: &[&str] = &["next", "more", ">", "→", "»", "load more", "show more"];
pub const PAGINATION_SYMBOLS: &[&str] = &[">", "→", "»"];

pub const DEFAULT_CONTAINER_TAGS: &[&str] = &["article", "li", "div"];
pub const DEFAULT_CONTAINER_ATTRS: &[&str] = &["class", "id", "data-qa", "data-testid"];

pub const DEFAULT_CONTAINER_KEYWORDS: &[&str] = &[
    "job",
    "position",
    "role",
    "opening",
    "listing",
    "vacancy",
    "post-card",
    "posting",
    "opportunity",
];

pub const RESULT_ITEM_PATTERNS: &[&str] = &[
    "li[data-qa*=\"ResultItem\"]",
    "li[data-qa*=\"resultItem\"]",
    "div[data-qa*=\"ResultItem\"]",
    "div[data-qa*=\"resultItem\"]",
    "li[data-qa=\"searchResultItem\"]",
    "div[data-qa=\"searchResultItem\"]",
];

pub const JOB_LINK_SELECTORS: &[&str] = &[
    "a[href*=\"/job/\"]",
    "a[href*=\"/jobs/\"]",
    "a[href*=\"/position/\"]",
    "a[href*=\"/positions/\"]",
    "a[href*=\"/opening/\"]",
    "a[href*=\"/openings/\"]",
    "a[href*=\"/role/\"]",
    "a[href*=\"/roles/\"]",
];

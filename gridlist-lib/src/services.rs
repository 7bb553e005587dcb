//! Capabilities the list consumes from its host
//!
//! Every collaborator outside the data pipeline is a trait object injected
//! through [`Services`]. The defaults are self-contained so a list can run
//! without a host application.

use chrono::DateTime;
use chrono::FixedOffset;
use chrono::Offset;
use chrono::Utc;
use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use crate::column::ColumnDefinition;
use crate::model::Record;

// =============================================================================
// Translation
// =============================================================================

/// Resolves label keys to localized text.
pub trait Translator {
    /// Returns the translation of `key`, or `key` itself when unknown.
    fn translate(&self, key: &str) -> String;
}

/// English strings for the keys the list uses itself. Other keys pass through.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTranslator;

impl Translator for DefaultTranslator {
    fn translate(&self, key: &str) -> String {
        match key {
            "backend::lang.list.no_records" => "There are no records in this view.",
            "backend::lang.list.column_switch_true" => "Yes",
            "backend::lang.list.column_switch_false" => "No",
            "backend::lang.list.setup_title" => "List setup",
            "backend::lang.list.records_per_page" => "Records per page",
            other => other,
        }
        .to_string()
    }
}

// =============================================================================
// Access control
// =============================================================================

/// Answers permission checks for the current user.
pub trait AccessControl {
    /// Returns `true` if the user holds any of `permissions`.
    fn user_can_access(&self, permissions: &[String]) -> bool;
}

/// Grants every permission.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AccessControl for AllowAll {
    fn user_can_access(&self, _permissions: &[String]) -> bool {
        true
    }
}

/// Grants a fixed set of permissions.
#[derive(Debug, Clone, Default)]
pub struct PermissionSet {
    granted: Vec<String>,
}

impl PermissionSet {
    /// Creates a set granting the given permissions.
    pub fn new<I, S>(granted: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            granted: granted.into_iter().map(Into::into).collect(),
        }
    }
}

impl AccessControl for PermissionSet {
    fn user_can_access(&self, permissions: &[String]) -> bool {
        permissions.iter().any(|p| self.granted.contains(p))
    }
}

// =============================================================================
// Rendering
// =============================================================================

/// Renders named partials.
pub trait Renderer {
    /// Renders `name` with the given context object.
    fn render_partial(&self, name: &str, context: &JsonValue) -> String;
}

/// Renders a partial as a JSON object `{"partial": name, "vars": context}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn render_partial(&self, name: &str, context: &JsonValue) -> String {
        serde_json::json!({ "partial": name, "vars": context }).to_string()
    }
}

// =============================================================================
// Images
// =============================================================================

/// Resolves media paths and produces resized image URLs.
pub trait ImageResolver {
    /// Public URL of a media library path.
    fn media_url(&self, path: &str) -> String;

    /// URL of `source` resized to the given dimensions.
    fn resize(&self, source: &str, width: &JsonValue, height: &JsonValue, options: &JsonValue)
    -> String;
}

/// Prefixes media paths with a base URL and leaves images unresized.
#[derive(Debug, Clone)]
pub struct MediaLibrary {
    base_url: String,
}

impl MediaLibrary {
    /// Creates a resolver rooted at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl Default for MediaLibrary {
    fn default() -> Self {
        Self::new("/storage/app/media")
    }
}

impl ImageResolver for MediaLibrary {
    fn media_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn resize(
        &self,
        source: &str,
        _width: &JsonValue,
        _height: &JsonValue,
        _options: &JsonValue,
    ) -> String {
        source.to_string()
    }
}

// =============================================================================
// Options
// =============================================================================

/// Supplies option lists for selectable columns without static options.
pub trait OptionProvider {
    /// Returns the options for `column` on `entity`, or `None` if the entity
    /// provides none. `method` is the option method named by the column, if any.
    fn options(
        &self,
        entity: &str,
        method: Option<&str>,
        column: &ColumnDefinition,
        record: &Record,
    ) -> Option<IndexMap<String, String>>;
}

// =============================================================================
// Time
// =============================================================================

/// Source of the current time.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock stopped at a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

// =============================================================================
// Bundle
// =============================================================================

/// The host capabilities available to a list.
///
/// # Example
///
/// ```
/// use chrono::FixedOffset;
/// use gridlist_lib::services::{PermissionSet, Services};
///
/// let services = Services::default()
///     .with_access(PermissionSet::new(["movies.manage"]))
///     .with_timezone(FixedOffset::east_opt(3600).unwrap());
/// assert_eq!(services.backend_url("movies/update/1"), "/backend/movies/update/1");
/// ```
pub struct Services {
    pub translator: Box<dyn Translator>,
    pub access: Box<dyn AccessControl>,
    pub renderer: Box<dyn Renderer>,
    pub images: Box<dyn ImageResolver>,
    pub options: Option<Box<dyn OptionProvider>>,
    pub clock: Box<dyn Clock>,

    /// Display timezone for timezone-aware date columns.
    pub timezone: FixedOffset,

    /// Prefix for backend URLs.
    pub backend_uri: String,
}

impl Default for Services {
    fn default() -> Self {
        Self {
            translator: Box::new(DefaultTranslator),
            access: Box::new(AllowAll),
            renderer: Box::new(JsonRenderer),
            images: Box::new(MediaLibrary::default()),
            options: None,
            clock: Box::new(SystemClock),
            timezone: Utc.fix(),
            backend_uri: "/backend".to_string(),
        }
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("timezone", &self.timezone)
            .field("backend_uri", &self.backend_uri)
            .field("options", &self.options.is_some())
            .finish_non_exhaustive()
    }
}

impl Services {
    /// Creates the default services.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the translator.
    pub fn with_translator(mut self, translator: impl Translator + 'static) -> Self {
        self.translator = Box::new(translator);
        self
    }

    /// Sets the access control.
    pub fn with_access(mut self, access: impl AccessControl + 'static) -> Self {
        self.access = Box::new(access);
        self
    }

    /// Sets the renderer.
    pub fn with_renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    /// Sets the image resolver.
    pub fn with_images(mut self, images: impl ImageResolver + 'static) -> Self {
        self.images = Box::new(images);
        self
    }

    /// Sets the selectable option provider.
    pub fn with_options(mut self, options: impl OptionProvider + 'static) -> Self {
        self.options = Some(Box::new(options));
        self
    }

    /// Sets the clock.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Sets the display timezone.
    pub fn with_timezone(mut self, timezone: FixedOffset) -> Self {
        self.timezone = timezone;
        self
    }

    /// Sets the backend URL prefix.
    pub fn with_backend_uri(mut self, uri: impl Into<String>) -> Self {
        self.backend_uri = uri.into();
        self
    }

    /// Prefixes a relative path with the backend URI. Absolute URLs pass through.
    pub fn backend_url(&self, path: &str) -> String {
        if path.contains("://") || path.starts_with("javascript:") {
            return path.to_string();
        }
        format!(
            "{}/{}",
            self.backend_uri.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

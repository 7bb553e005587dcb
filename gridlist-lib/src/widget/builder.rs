//! Typestate builder for list widgets

use std::sync::Arc;

use log::debug;

use super::ListConfig;
use super::ListWidget;
use crate::column::ColumnRegistry;
use crate::error::ConfigurationError;
use crate::error::Error;
use crate::eval::ColumnTypeRegistry;
use crate::executor::QueryExecutor;
use crate::hooks::ExtensionHooks;
use crate::model::EntityDefinition;
use crate::query::SearchScopes;
use crate::query::SearchState;
use crate::services::Services;
use crate::storage::PREF_PER_PAGE;
use crate::storage::PreferenceStore;
use crate::storage::SessionStore;

/// Marker type for missing required builder fields.
pub struct Missing;

/// Marker type for set builder fields.
pub struct Set<T>(T);

/// Builder for constructing a [`ListWidget`].
///
/// Uses the typestate pattern to ensure a query executor is set at compile
/// time. The bound model is checked when building.
///
/// # Example
///
/// ```
/// use gridlist_lib::ListWidget;
/// use gridlist_lib::executor::MemoryExecutor;
/// use gridlist_lib::model::EntityDefinition;
/// use gridlist_lib::widget::ListConfig;
///
/// let widget = ListWidget::builder("movies")
///     .model(EntityDefinition::new("Movie", "movies"))
///     .config(ListConfig::new().with_column("title", "Title"))
///     .executor(MemoryExecutor::default())
///     .build()
///     .unwrap();
///
/// assert_eq!(widget.id(), "movies");
/// ```
pub struct ListWidgetBuilder<Executor> {
    id: String,
    entity: Option<EntityDefinition>,
    config: ListConfig,
    executor: Executor,
    services: Services,
    hooks: ExtensionHooks,
    types: ColumnTypeRegistry,
    scopes: SearchScopes,
    preferences: Option<PreferenceStore>,
    session: Option<SessionStore>,
}

impl ListWidgetBuilder<Missing> {
    /// Creates a builder for the widget with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entity: None,
            config: ListConfig::default(),
            executor: Missing,
            services: Services::default(),
            hooks: ExtensionHooks::default(),
            types: ColumnTypeRegistry::default(),
            scopes: SearchScopes::default(),
            preferences: None,
            session: None,
        }
    }

    /// Sets the executor that runs list queries.
    pub fn executor<E: QueryExecutor + 'static>(
        self,
        executor: E,
    ) -> ListWidgetBuilder<Set<Box<dyn QueryExecutor>>> {
        ListWidgetBuilder {
            id: self.id,
            entity: self.entity,
            config: self.config,
            executor: Set(Box::new(executor) as Box<dyn QueryExecutor>),
            services: self.services,
            hooks: self.hooks,
            types: self.types,
            scopes: self.scopes,
            preferences: self.preferences,
            session: self.session,
        }
    }
}

impl<E> ListWidgetBuilder<E> {
    /// Binds the entity the list shows.
    pub fn model(mut self, entity: EntityDefinition) -> Self {
        self.entity = Some(entity);
        self
    }

    pub fn config(mut self, config: ListConfig) -> Self {
        self.config = config;
        self
    }

    pub fn services(mut self, services: Services) -> Self {
        self.services = services;
        self
    }

    pub fn hooks(mut self, hooks: ExtensionHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Sets the registry consulted for custom column types.
    pub fn column_types(mut self, types: ColumnTypeRegistry) -> Self {
        self.types = types;
        self
    }

    pub fn search_scopes(mut self, scopes: SearchScopes) -> Self {
        self.scopes = scopes;
        self
    }

    /// Sets the per-user preference store.
    pub fn preferences(mut self, preferences: PreferenceStore) -> Self {
        self.preferences = Some(preferences);
        self
    }

    /// Sets the session slot for the last visited page.
    pub fn session(mut self, session: SessionStore) -> Self {
        self.session = Some(session);
        self
    }
}

impl ListWidgetBuilder<Set<Box<dyn QueryExecutor>>> {
    /// Builds the [`ListWidget`].
    ///
    /// Fails if no model is bound or the model is invalid. With setup enabled
    /// the page size comes from the user's preference when one is stored.
    pub fn build(self) -> Result<ListWidget, Error> {
        let entity = self.entity.ok_or_else(|| ConfigurationError::MissingModel {
            widget: self.id.clone(),
        })?;
        entity.validate()?;

        let mut records_per_page = self.config.records_per_page;
        if self.config.show_setup
            && let Some(preferences) = &self.preferences
            && let Some(stored) = preferences.get::<Option<usize>>(PREF_PER_PAGE)?
        {
            records_per_page = stored;
        }
        let show_pagination = self.config.show_pagination.resolve(records_per_page);

        debug!(
            "Built list '{}' for model '{}' ({} configured columns)",
            self.id,
            entity.name,
            self.config.columns.len()
        );

        Ok(ListWidget {
            id: self.id,
            entity: Arc::new(entity),
            config: self.config,
            executor: self.executor.0,
            services: self.services,
            hooks: self.hooks,
            types: self.types,
            scopes: self.scopes,
            preferences: self.preferences,
            session: self.session,
            columns: ColumnRegistry::new(),
            resolved: None,
            column_override: None,
            records_per_page,
            show_pagination,
            current_page: None,
            search: SearchState::default(),
            filters: Vec::new(),
            sort_column: None,
            sort_direction: None,
            checked: Vec::new(),
            css_classes: Vec::new(),
        })
    }
}

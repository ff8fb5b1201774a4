use tracing::{debug, warn};

use crate::{
    browse::CatalogSource,
    error::BridgeError,
    lms::{Course, Module, ModuleItem},
};

/// Collection level currently displayed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Level {
    Courses,
    Modules,
    Items,
}

/// Navigation calls that are not valid from the current state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    #[error("cannot {action} from the {level:?} level")]
    WrongLevel { action: &'static str, level: Level },
    #[error("a course must be selected before opening a module")]
    NoCourseSelected,
}

/// What a pending load will display once it lands.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadTarget {
    Courses,
    Modules { course: Course },
    Items { course: Course, module: Module },
}

/// Handle for an outstanding browse request, stamped with the navigation
/// generation it was issued in.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct LoadTicket {
    generation: u64,
    target: LoadTarget,
}

impl LoadTicket {
    pub fn target(&self) -> &LoadTarget {
        &self.target
    }
}

/// Payload delivered for a [`LoadTicket`].
#[derive(Debug, Clone, PartialEq)]
pub enum Loaded {
    Courses(Vec<Course>),
    Modules(Vec<Module>),
    Items(Vec<ModuleItem>),
}

/// Render-ready snapshot of the navigator.
#[derive(Debug, PartialEq)]
pub enum View<'a> {
    Loading,
    Error(&'a str),
    Courses(&'a [Course]),
    Modules {
        course: &'a Course,
        modules: &'a [Module],
    },
    Items {
        course: &'a Course,
        module: &'a Module,
        items: &'a [ModuleItem],
    },
}

/// Three-level course → module → item browser.
///
/// Requests are split into [`Navigator::request_courses`]-style calls that
/// return a [`LoadTicket`] and [`Navigator::apply`], which lands the result.
/// Any navigation bumps the generation, so responses from superseded requests
/// are dropped instead of overwriting the newer view.
#[derive(Debug)]
pub struct Navigator {
    level: Level,
    selected_course: Option<Course>,
    selected_module: Option<Module>,
    courses: Vec<Course>,
    modules: Vec<Module>,
    items: Vec<ModuleItem>,
    loading: bool,
    error: Option<String>,
    generation: u64,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator {
    pub fn new() -> Self {
        Self {
            level: Level::Courses,
            selected_course: None,
            selected_module: None,
            courses: Vec::new(),
            modules: Vec::new(),
            items: Vec::new(),
            loading: false,
            error: None,
            generation: 0,
        }
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn selected_course(&self) -> Option<&Course> {
        self.selected_course.as_ref()
    }

    pub fn selected_module(&self) -> Option<&Module> {
        self.selected_module.as_ref()
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn items(&self) -> &[ModuleItem] {
        &self.items
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn view(&self) -> View<'_> {
        if self.loading {
            return View::Loading;
        }
        if let Some(error) = self.error.as_deref() {
            return View::Error(error);
        }
        match (self.level, &self.selected_course, &self.selected_module) {
            (Level::Items, Some(course), Some(module)) => View::Items {
                course,
                module,
                items: &self.items,
            },
            (Level::Modules, Some(course), _) => View::Modules {
                course,
                modules: &self.modules,
            },
            _ => View::Courses(&self.courses),
        }
    }

    /// Start (re)loading the course list. Valid only at the course level.
    pub fn request_courses(&mut self) -> Result<LoadTicket, NavigationError> {
        self.expect_level(Level::Courses, "list courses")?;
        Ok(self.issue(LoadTarget::Courses))
    }

    /// Start loading the modules of `course`. Valid only at the course level.
    pub fn request_modules(&mut self, course: Course) -> Result<LoadTicket, NavigationError> {
        self.expect_level(Level::Courses, "open a course")?;
        Ok(self.issue(LoadTarget::Modules { course }))
    }

    /// Start loading the items of `module` within the selected course.
    pub fn request_items(&mut self, module: Module) -> Result<LoadTicket, NavigationError> {
        let course = self
            .selected_course
            .clone()
            .ok_or(NavigationError::NoCourseSelected)?;
        self.expect_level(Level::Modules, "open a module")?;
        Ok(self.issue(LoadTarget::Items { course, module }))
    }

    /// Land the result of `ticket`. Returns `false` when the ticket is stale,
    /// which leaves the state untouched, or when the payload does not match
    /// its target, which ends the load with an error.
    pub fn apply(&mut self, ticket: LoadTicket, result: Result<Loaded, BridgeError>) -> bool {
        if ticket.generation != self.generation {
            debug!(
                ticket = ticket.generation,
                current = self.generation,
                "discarding stale browse response"
            );
            return false;
        }

        let loaded = match result {
            Ok(loaded) => loaded,
            Err(err) => {
                self.loading = false;
                self.error = Some(err.to_string());
                return true;
            }
        };

        match (ticket.target, loaded) {
            (LoadTarget::Courses, Loaded::Courses(courses)) => {
                self.courses = courses;
            }
            (LoadTarget::Modules { course }, Loaded::Modules(modules)) => {
                self.selected_course = Some(course);
                self.modules = modules;
                self.level = Level::Modules;
            }
            (LoadTarget::Items { course, module }, Loaded::Items(items)) => {
                self.selected_course = Some(course);
                self.selected_module = Some(module);
                self.items = items;
                self.level = Level::Items;
            }
            (target, _) => {
                warn!(?target, "browse response does not match its request");
                self.loading = false;
                self.error = Some("Unexpected response from the catalog".to_string());
                return false;
            }
        }
        self.loading = false;
        true
    }

    /// Step back one level. No-op at the course level.
    pub fn back(&mut self) -> Level {
        match self.level {
            Level::Courses => return self.level,
            Level::Items => {
                self.selected_module = None;
                self.items.clear();
                self.level = Level::Modules;
            }
            Level::Modules => {
                self.selected_course = None;
                self.modules.clear();
                self.level = Level::Courses;
            }
        }
        self.generation += 1;
        self.loading = false;
        self.error = None;
        self.level
    }

    /// Load the course list from `catalog`.
    pub async fn enter<C: CatalogSource>(&mut self, catalog: &C) -> Result<(), NavigationError> {
        let ticket = self.request_courses()?;
        let result = catalog.list_courses().await.map(Loaded::Courses);
        self.apply(ticket, result);
        Ok(())
    }

    pub async fn drill_into_course<C: CatalogSource>(
        &mut self,
        catalog: &C,
        course: Course,
    ) -> Result<(), NavigationError> {
        let course_id = course.id;
        let ticket = self.request_modules(course)?;
        let result = catalog.list_modules(course_id).await.map(Loaded::Modules);
        self.apply(ticket, result);
        Ok(())
    }

    pub async fn drill_into_module<C: CatalogSource>(
        &mut self,
        catalog: &C,
        module: Module,
    ) -> Result<(), NavigationError> {
        let module_id = module.id;
        let ticket = self.request_items(module)?;
        let course_id = match ticket.target() {
            LoadTarget::Items { course, .. } => course.id,
            _ => return Err(NavigationError::NoCourseSelected),
        };
        let result = catalog
            .list_items(course_id, module_id)
            .await
            .map(Loaded::Items);
        self.apply(ticket, result);
        Ok(())
    }

    /// Step back, re-entering the course list when that is where we land.
    pub async fn go_back<C: CatalogSource>(&mut self, catalog: &C) -> Level {
        let previous = self.level;
        let level = self.back();
        if previous != Level::Courses && level == Level::Courses {
            if let Err(err) = self.enter(catalog).await {
                warn!(%err, "failed to reload the course list");
            }
        }
        self.level
    }

    fn expect_level(&self, level: Level, action: &'static str) -> Result<(), NavigationError> {
        if self.level == level {
            Ok(())
        } else {
            Err(NavigationError::WrongLevel {
                action,
                level: self.level,
            })
        }
    }

    fn issue(&mut self, target: LoadTarget) -> LoadTicket {
        self.generation += 1;
        self.loading = true;
        self.error = None;
        LoadTicket {
            generation: self.generation,
            target,
        }
    }
}

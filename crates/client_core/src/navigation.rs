//! Role dashboards, sidebar highlighting and route guarding.

use shared::domain::Role;

use crate::session::decode_claims;

pub const LOGIN_PATH: &str = "/login";
pub const ROOT_PATH: &str = "/";

/// Prefixes reachable without a token.
pub const PUBLIC_PATHS: [&str; 4] = ["/login", "/forgot-password", "/images", "/icons"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavItem {
    pub href: &'static str,
    pub label: &'static str,
    /// Exact items only match their own path, never a sub-path.
    pub exact: bool,
}

impl NavItem {
    const fn exact(href: &'static str, label: &'static str) -> Self {
        Self {
            href,
            label,
            exact: true,
        }
    }

    const fn prefix(href: &'static str, label: &'static str) -> Self {
        Self {
            href,
            label,
            exact: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavDescriptor {
    pub role: Role,
    pub home: &'static str,
    pub items: &'static [NavItem],
}

const ADMIN_ITEMS: &[NavItem] = &[
    NavItem::exact("/admin", "Dashboard"),
    NavItem::prefix("/admin/academic-years", "Academic years"),
    NavItem::prefix("/admin/users", "Users"),
    NavItem::prefix("/admin/faculties", "Faculties"),
    NavItem::prefix("/admin/announcements", "Announcements"),
];

const STUDENT_ITEMS: &[NavItem] = &[
    NavItem::exact("/student", "Home"),
    NavItem::prefix("/student/announcements", "Announcements"),
    NavItem::prefix("/student/profile", "Profile"),
    NavItem::prefix("/student/messages", "Messages"),
    NavItem::prefix("/student/my-topics", "My topics"),
    NavItem::prefix("/student/topic-propose", "Propose a topic"),
    NavItem::prefix("/student/topics", "Topics"),
];

const TEACHER_ITEMS: &[NavItem] = &[
    NavItem::exact("/teacher", "Home"),
    NavItem::prefix("/teacher/announcements", "Announcements"),
    NavItem::prefix("/teacher/profile", "Profile"),
    NavItem::prefix("/teacher/messages", "Messages"),
    NavItem::prefix("/teacher/my-topics", "My topics"),
    NavItem::prefix("/teacher/topic-registration", "Propose a topic"),
    NavItem::prefix("/teacher/topics", "Topics"),
];

const ASSISTANT_ITEMS: &[NavItem] = &[
    NavItem::exact("/assistant", "Overview"),
    NavItem::prefix("/assistant/topics-registration", "Registrations"),
    NavItem::prefix("/assistant/topics", "Topics"),
    NavItem::prefix("/assistant/years-session", "Year sessions"),
    NavItem::prefix("/assistant/announcements", "Announcements"),
];

static ADMIN_NAV: NavDescriptor = NavDescriptor {
    role: Role::Admin,
    home: "/admin",
    items: ADMIN_ITEMS,
};

static STUDENT_NAV: NavDescriptor = NavDescriptor {
    role: Role::Student,
    home: "/student",
    items: STUDENT_ITEMS,
};

static TEACHER_NAV: NavDescriptor = NavDescriptor {
    role: Role::Teacher,
    home: "/teacher",
    items: TEACHER_ITEMS,
};

static ASSISTANT_NAV: NavDescriptor = NavDescriptor {
    role: Role::Assistant,
    home: "/assistant",
    items: ASSISTANT_ITEMS,
};

pub fn nav_for(role: Role) -> &'static NavDescriptor {
    match role {
        Role::Admin => &ADMIN_NAV,
        Role::Student => &STUDENT_NAV,
        Role::Teacher => &TEACHER_NAV,
        Role::Assistant => &ASSISTANT_NAV,
    }
}

fn normalize_path(path: &str) -> &str {
    if path == ROOT_PATH {
        return path;
    }
    match path.trim_end_matches('/') {
        "" => ROOT_PATH,
        trimmed => trimmed,
    }
}

fn is_under(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Sidebar entry to highlight for `path`: an exact item equal to the path,
/// otherwise the longest non-exact item the path sits under.
pub fn pick_active_href<'a>(items: &'a [NavItem], path: &str) -> Option<&'a str> {
    let current = normalize_path(path);

    if let Some(hit) = items
        .iter()
        .find(|item| item.exact && normalize_path(item.href) == current)
    {
        return Some(hit.href);
    }

    items
        .iter()
        .filter(|item| !item.exact && is_under(current, normalize_path(item.href)))
        .max_by_key(|item| item.href.len())
        .map(|item| item.href)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    Redirect(&'static str),
}

fn role_for_prefix(path: &str) -> Option<Role> {
    [Role::Admin, Role::Student, Role::Teacher, Role::Assistant]
        .into_iter()
        .find(|role| path.starts_with(nav_for(*role).home))
}

/// Decides whether `path` may be shown for the holder of `token`.
pub fn guard_route(token: Option<&str>, path: &str) -> RouteDecision {
    let is_public = PUBLIC_PATHS.iter().any(|public| path.starts_with(public));

    let Some(token) = token else {
        return if is_public {
            RouteDecision::Allow
        } else {
            RouteDecision::Redirect(LOGIN_PATH)
        };
    };

    // A token that no longer decodes sends every page to the login form;
    // the form itself stays reachable so the user can sign in again.
    let role = match decode_claims(token) {
        Ok(claims) => claims.role,
        Err(_) if path == LOGIN_PATH => return RouteDecision::Allow,
        Err(_) => return RouteDecision::Redirect(LOGIN_PATH),
    };

    if path == LOGIN_PATH {
        return RouteDecision::Redirect(ROOT_PATH);
    }

    if path == ROOT_PATH {
        return RouteDecision::Redirect(nav_for(role).home);
    }

    match role_for_prefix(path) {
        Some(owner) if owner != role => RouteDecision::Redirect(ROOT_PATH),
        _ => RouteDecision::Allow,
    }
}

#[cfg(test)]
#[path = "tests/navigation_tests.rs"]
mod tests;

//! Dependency specification parsing and representation.
//!
//! A dependency is one atom of a `Requires:`, `Requires.private:`,
//! `Conflicts:` or `Provides:` line: a package name, optionally followed by
//! a comparator and a version (e.g. `zlib >= 1.2`). This module parses that
//! textual form into [`Dependency`] records and manages the collision policy
//! when two dependency lists are merged.

use crate::version::Comparator;

/// A single dependency atom: a package name plus an optional version
/// constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// The referenced package name (e.g. `zlib`).
    pub package: String,
    /// The comparison operator against `version`. [`Comparator::Any`] when
    /// no version constraint was given.
    pub compare: Comparator,
    /// The version operand, or `None` when `compare` is [`Comparator::Any`].
    pub version: Option<String>,
    /// Flags carried alongside the dependency (e.g. private-graph marker).
    pub flags: DependencyFlags,
}

/// Flags attached to a [`Dependency`], mirroring pkgconf's
/// `PKGCONF_PKG_DEPF_*` constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DependencyFlags(u32);

impl DependencyFlags {
    /// No flags.
    pub const NONE: Self = Self(0);
    /// This dependency was reached through a `Requires.private` edge.
    pub const PRIVATE: Self = Self(0x1);

    /// Check whether a flag is set.
    pub fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Set a flag, returning the updated value.
    pub fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Check whether any flag is set.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl Dependency {
    /// Create an unversioned dependency on `package`.
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            compare: Comparator::Any,
            version: None,
            flags: DependencyFlags::NONE,
        }
    }

    /// Create a versioned dependency: `package <compare> version`.
    pub fn with_version(package: impl Into<String>, compare: Comparator, version: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            compare,
            version: Some(version.into()),
            flags: DependencyFlags::NONE,
        }
    }

    /// Whether `actual` (a concrete package version) satisfies this
    /// dependency's constraint.
    ///
    /// An unversioned dependency (`compare == Any`) is always satisfied.
    pub fn version_satisfied_by(&self, actual: &str) -> bool {
        match &self.version {
            Some(required) => self.compare.eval(actual, required),
            None => true,
        }
    }

    /// Mark this dependency as reached through a private (`Requires.private`
    /// / `Libs.private`) edge.
    pub fn with_flags(mut self, flags: DependencyFlags) -> Self {
        self.flags = flags;
        self
    }
}

impl std::fmt::Display for Dependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.version, self.compare) {
            (Some(version), compare) if compare != Comparator::Any => {
                write!(f, "{} {} {}", self.package, compare.as_str(), version)
            }
            _ => write!(f, "{}", self.package),
        }
    }
}

/// An ordered list of [`Dependency`] records, as found in a `Requires:`,
/// `Conflicts:` or `Provides:` line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyList {
    entries: Vec<Dependency>,
}

impl DependencyList {
    /// Create a new, empty dependency list.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Parse a `Requires:`-style expression into a dependency list.
    ///
    /// Commas are treated the same as whitespace, so `zlib, >=1.2` and
    /// `zlib >= 1.2` parse identically (this lets a `.pc` file substitute a
    /// variable such as `@ZLIB_REQUIRES@` with a leading comma left over).
    pub fn parse(text: &str) -> Self {
        let mut list = Self::new();
        parse_str(&mut list, text);
        list
    }

    /// Push a dependency onto the list, applying the collision policy
    /// against any existing entry for the same package name.
    pub fn push(&mut self, dep: Dependency) {
        if let Some(existing) = self
            .entries
            .iter()
            .position(|d| d.package == dep.package && d.flags != dep.flags)
        {
            let existing_is_flagged = !self.entries[existing].flags.is_empty();
            let incoming_is_flagged = !dep.flags.is_empty();

            // Exactly one side carries flags: the unflagged side wins, so
            // drop whichever side is flagged.
            if existing_is_flagged != incoming_is_flagged {
                if incoming_is_flagged {
                    // Keep the existing (unflagged) entry; drop the incoming one.
                    return;
                }
                self.entries[existing] = dep;
                return;
            }
        }

        self.entries.push(dep);
    }

    /// Number of dependencies in the list.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list has no dependencies.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the dependencies in source order.
    pub fn iter(&self) -> impl Iterator<Item = &Dependency> {
        self.entries.iter()
    }

    /// Iterate mutably over the dependencies in source order.
    pub fn entries_mut(&mut self) -> impl Iterator<Item = &mut Dependency> {
        self.entries.iter_mut()
    }

    /// Find the first dependency on `package`, if any.
    pub fn find(&self, package: &str) -> Option<&Dependency> {
        self.entries.iter().find(|d| d.package == package)
    }
}

impl std::fmt::Display for DependencyList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rendered: Vec<String> = self.entries.iter().map(|d| d.to_string()).collect();
        f.write_str(&rendered.join(", "))
    }
}

impl IntoIterator for DependencyList {
    type Item = Dependency;
    type IntoIter = std::vec::IntoIter<Dependency>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a DependencyList {
    type Item = &'a Dependency;
    type IntoIter = std::slice::Iter<'a, Dependency>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<Dependency> for DependencyList {
    fn from_iter<I: IntoIterator<Item = Dependency>>(iter: I) -> Self {
        let mut list = Self::new();
        for dep in iter {
            list.push(dep);
        }
        list
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    Outside,
    Name,
    BeforeOp,
    Op,
    AfterOp,
    Version,
}

fn is_module_separator(c: char) -> bool {
    c == ',' || c.is_ascii_whitespace()
}

fn is_operator_char(c: char) -> bool {
    matches!(c, '<' | '>' | '=' | '!')
}

/// Six-state scan over a dependency expression, mirroring pkgconf's
/// `pkg_dependency_parse_str`. Whitespace and commas both separate atoms;
/// `<>=!` begin an operator lexeme. A one-character lookahead resolves
/// whether a run of whitespace inside a name is trailing (end of atom) or
/// leads into an operator (`zlib >= 1.2`), exactly as the original peeks
/// ahead past spaces before deciding.
fn parse_str(list: &mut DependencyList, text: &str) {
    let chars: Vec<char> = text.chars().collect();
    let mut state = ParseState::Outside;
    let mut package = String::new();
    let mut operator = String::new();
    let mut version = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match state {
            ParseState::Outside => {
                if !is_module_separator(c) {
                    package.push(c);
                    state = ParseState::Name;
                }
            }
            ParseState::Name => {
                if c.is_whitespace() {
                    let next = chars[i..].iter().copied().find(|c| !c.is_whitespace());
                    state = match next {
                        None => ParseState::Outside,
                        Some(n) if is_module_separator(n) => ParseState::Outside,
                        Some(n) if is_operator_char(n) => ParseState::BeforeOp,
                        Some(_) => ParseState::Outside,
                    };
                    if state == ParseState::Outside {
                        list.push(Dependency::new(package.trim()));
                        package.clear();
                    }
                } else if is_module_separator(c) {
                    list.push(Dependency::new(package.trim()));
                    package.clear();
                    state = ParseState::Outside;
                } else if is_operator_char(c) {
                    operator.push(c);
                    state = ParseState::Op;
                } else {
                    package.push(c);
                }
            }
            ParseState::BeforeOp => {
                if is_operator_char(c) {
                    operator.push(c);
                    state = ParseState::Op;
                }
            }
            ParseState::Op => {
                if is_operator_char(c) {
                    operator.push(c);
                } else if !c.is_whitespace() {
                    version.push(c);
                    state = ParseState::Version;
                } else {
                    state = ParseState::AfterOp;
                }
            }
            ParseState::AfterOp => {
                if !c.is_whitespace() {
                    version.push(c);
                    state = ParseState::Version;
                }
            }
            ParseState::Version => {
                if is_module_separator(c) || i + 1 == chars.len() {
                    if i + 1 == chars.len() && !is_module_separator(c) {
                        version.push(c);
                    }
                    let compare = Comparator::lookup(operator.trim());
                    list.push(Dependency::with_version(
                        package.trim(),
                        compare,
                        version.trim(),
                    ));
                    package.clear();
                    operator.clear();
                    version.clear();
                    state = ParseState::Outside;
                } else {
                    version.push(c);
                }
            }
        }
        i += 1;
    }

    if state == ParseState::Name && !package.trim().is_empty() {
        list.push(Dependency::new(package.trim()));
    }
}

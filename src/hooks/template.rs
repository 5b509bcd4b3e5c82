//! Argument template substitution.
//!
//! Hook arguments may contain tokens of the form `${namespace.field}`. Tokens
//! are looked up in a closed set of [`Variable`]s; nothing is evaluated.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

/// A variable that can be bound for hook arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variable {
    /// `presentation.path`: canonical absolute path of the document.
    PresentationPath,
    /// `presentation.directory`: directory containing the document.
    PresentationDirectory,
    /// `presentation.title`: the configured title.
    PresentationTitle,
    /// `page.current`: the current 1-based page number.
    PageCurrent,
    /// `page.count`: the number of pages.
    PageCount,
}

impl Variable {
    pub const ALL: [Variable; 5] = [
        Variable::PresentationPath,
        Variable::PresentationDirectory,
        Variable::PresentationTitle,
        Variable::PageCurrent,
        Variable::PageCount,
    ];

    /// The token name used inside `${...}`.
    pub fn key(&self) -> &'static str {
        match self {
            Variable::PresentationPath => "presentation.path",
            Variable::PresentationDirectory => "presentation.directory",
            Variable::PresentationTitle => "presentation.title",
            Variable::PageCurrent => "page.current",
            Variable::PageCount => "page.count",
        }
    }
}

impl FromStr for Variable {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Variable::ALL
            .into_iter()
            .find(|variable| variable.key() == s)
            .ok_or(())
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Values bound to variables for one dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    values: HashMap<Variable, String>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `variable` to `value`, replacing any previous binding.
    pub fn with(mut self, variable: Variable, value: impl ToString) -> Self {
        self.values.insert(variable, value.to_string());
        self
    }

    pub fn get(&self, variable: Variable) -> Option<&str> {
        self.values.get(&variable).map(String::as_str)
    }

    /// Resolves a raw token. Unknown names and unbound variables both yield `None`.
    pub fn resolve(&self, token: &str) -> Option<&str> {
        token.parse::<Variable>().ok().and_then(|v| self.get(v))
    }
}

/// Substitutes every `${token}` in `template`.
///
/// Returns the offending token name if one cannot be resolved. A `$` that is
/// not followed by a braced token is kept as is.
///
/// # Examples
///
/// ```
/// use slidehook::hooks::{interpolate, Bindings, Variable};
///
/// let bindings = Bindings::new().with(Variable::PageCurrent, 2);
/// assert_eq!(interpolate("page-${page.current}.pdf", &bindings).unwrap(), "page-2.pdf");
/// assert_eq!(interpolate("${page.count}", &bindings).unwrap_err(), "page.count");
/// ```
pub fn interpolate(template: &str, bindings: &Bindings) -> Result<String, String> {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    let token = TOKEN.get_or_init(|| Regex::new(r"\$\{([^}]*)\}").unwrap());

    let mut result = String::with_capacity(template.len());
    let mut last = 0;
    for captures in token.captures_iter(template) {
        let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        let value = bindings
            .resolve(name.as_str().trim())
            .ok_or_else(|| name.as_str().to_string())?;
        result.push_str(&template[last..whole.start()]);
        result.push_str(value);
        last = whole.end();
    }
    result.push_str(&template[last..]);
    Ok(result)
}

use regex::Regex;

#[derive(Debug, Clone)]
enum Rule {
    Exact(String),
    Glob(Regex),
}

impl Rule {
    fn parse(pattern: &str) -> Result<Self, regex::Error> {
        if !pattern.contains('*') {
            return Ok(Rule::Exact(pattern.to_string()));
        }
        let body = pattern
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");
        Ok(Rule::Glob(Regex::new(&format!("^{body}$"))?))
    }

    fn matches(&self, path: &str) -> bool {
        match self {
            Rule::Exact(exact) => exact == path,
            Rule::Glob(regex) => regex.is_match(path),
        }
    }
}

/// Whole-path accept/reject rules. Patterns are exact paths or `*` globs.
#[derive(Debug, Clone, Default)]
pub struct PathRules {
    accept: Vec<Rule>,
    reject: Vec<Rule>,
}

impl PathRules {
    pub fn new<A, R>(accept: A, reject: R) -> crate::Result<Self>
    where
        A: IntoIterator,
        A::Item: AsRef<str>,
        R: IntoIterator,
        R::Item: AsRef<str>,
    {
        let accept = accept
            .into_iter()
            .map(|p| Rule::parse(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        let reject = reject
            .into_iter()
            .map(|p| Rule::parse(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { accept, reject })
    }

    /// No accept and no reject rules.
    pub fn is_empty(&self) -> bool {
        self.accept.is_empty() && self.reject.is_empty()
    }

    pub fn is_blacklisted(&self, path: &str) -> bool {
        self.reject.iter().any(|rule| rule.matches(path))
    }

    /// Matched by an accept rule, and not rejected.
    pub fn is_specifically_whitelisted(&self, path: &str) -> bool {
        self.accept.iter().any(|rule| rule.matches(path)) && !self.is_blacklisted(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_and_glob() {
        let rules = PathRules::new(["META-INF/*.SF", "module-info.class"], ["secret/key.pem"]).unwrap();

        assert!(rules.is_specifically_whitelisted("META-INF/APP.SF"));
        assert!(rules.is_specifically_whitelisted("module-info.class"));
        assert!(!rules.is_specifically_whitelisted("META-INF/APP.SFX"));
        assert!(rules.is_blacklisted("secret/key.pem"));
        assert!(!rules.is_blacklisted("secret/key.pem.bak"));
    }

    #[test]
    fn test_glob_escapes_regex_metacharacters() {
        let rules = PathRules::new(Vec::<&str>::new(), ["a.b/*"]).unwrap();
        assert!(rules.is_blacklisted("a.b/c"));
        assert!(!rules.is_blacklisted("axb/c"));
    }

    #[test]
    fn test_empty_rules_match_nothing() {
        let rules = PathRules::default();
        assert!(rules.is_empty());
        assert!(!rules.is_blacklisted("any/path"));
        assert!(!rules.is_specifically_whitelisted("any/path"));
    }
}

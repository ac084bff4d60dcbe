//! Locator descriptors and the placeholder formatter that turns them into
//! concrete, queryable locators.
//!
//! Templates use `str.format`-style fields: `{}` (next positional value),
//! `{0}` (explicit position), `{name}` (named value) and `{{` / `}}` for
//! literal braces. A [`ResolvedLocator`] can only be produced by formatting,
//! and has no formatting method of its own, so substitution happens once.

use crate::errors::{HarnessError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// How a locator finds elements. Mirrors the WebDriver `By` strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    #[serde(rename = "xpath")]
    Xpath,
    #[serde(rename = "css", alias = "css selector", alias = "css_selector")]
    Css,
    #[serde(rename = "id")]
    Id,
    #[serde(rename = "name")]
    Name,
    #[serde(rename = "class_name", alias = "class name")]
    ClassName,
    #[serde(rename = "tag_name", alias = "tag name")]
    TagName,
    #[serde(rename = "link_text", alias = "link text")]
    LinkText,
    #[serde(rename = "partial_link_text", alias = "partial link text")]
    PartialLinkText,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Xpath => "xpath",
            Strategy::Css => "css",
            Strategy::Id => "id",
            Strategy::Name => "name",
            Strategy::ClassName => "class_name",
            Strategy::TagName => "tag_name",
            Strategy::LinkText => "link_text",
            Strategy::PartialLinkText => "partial_link_text",
        };
        f.write_str(name)
    }
}

/// The two query languages a page session has to understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Css,
    Xpath,
}

/// An immutable locator template, usually loaded from page data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DescriptorRepr")]
pub struct LocatorDescriptor {
    strategy: Strategy,
    template: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DescriptorRepr {
    Bare(String),
    Full {
        #[serde(alias = "by")]
        strategy: Strategy,
        #[serde(alias = "value", alias = "selector")]
        template: String,
    },
}

impl TryFrom<DescriptorRepr> for LocatorDescriptor {
    type Error = String;

    fn try_from(repr: DescriptorRepr) -> std::result::Result<Self, Self::Error> {
        let descriptor = match repr {
            DescriptorRepr::Bare(template) => LocatorDescriptor::xpath(template),
            DescriptorRepr::Full { strategy, template } => {
                LocatorDescriptor::new(strategy, template)
            }
        };
        parse_template(&descriptor.template).map_err(|e| e.to_string())?;
        Ok(descriptor)
    }
}

impl LocatorDescriptor {
    pub fn new(strategy: Strategy, template: impl Into<String>) -> Self {
        Self {
            strategy,
            template: template.into(),
        }
    }

    pub fn xpath(template: impl Into<String>) -> Self {
        Self::new(Strategy::Xpath, template)
    }

    pub fn css(template: impl Into<String>) -> Self {
        Self::new(Strategy::Css, template)
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Whether the template has at least one placeholder to fill.
    pub fn needs_substitution(&self) -> Result<bool> {
        let segments = parse_template(&self.template)?;
        Ok(placeholder_kind(&segments, &self.template)?.is_some())
    }

    /// Resolves a template that has no placeholders.
    pub fn resolve(&self) -> Result<ResolvedLocator> {
        self.format(&LocatorArgs::new())
    }

    /// Substitutes `args` into the template.
    ///
    /// Exactly one of positional or named values must be supplied when the
    /// template has placeholders, and it must match the placeholder style.
    pub fn format(&self, args: &LocatorArgs) -> Result<ResolvedLocator> {
        let segments = parse_template(&self.template)?;
        let kind = placeholder_kind(&segments, &self.template)?;

        if let Some(kind) = kind {
            match (args.positional.is_empty(), args.named.is_empty()) {
                (true, true) => {
                    return Err(HarnessError::Configuration(format!(
                        "locator template '{}' requires substitution values but none were supplied",
                        self.template
                    )));
                }
                (false, false) => {
                    return Err(HarnessError::Configuration(format!(
                        "locator template '{}' was given both positional and named values",
                        self.template
                    )));
                }
                (false, true) if kind == PlaceholderKind::Named => {
                    return Err(HarnessError::Configuration(format!(
                        "locator template '{}' uses named placeholders but positional values were supplied",
                        self.template
                    )));
                }
                (true, false) if kind == PlaceholderKind::Positional => {
                    return Err(HarnessError::Configuration(format!(
                        "locator template '{}' uses positional placeholders but named values were supplied",
                        self.template
                    )));
                }
                _ => {}
            }
        }

        let mut selector = String::with_capacity(self.template.len());
        let mut next_auto = 0;
        for segment in &segments {
            match segment {
                Segment::Literal(text) => selector.push_str(text),
                Segment::Auto => {
                    selector.push_str(args.positional_at(next_auto, &self.template)?);
                    next_auto += 1;
                }
                Segment::Index(index) => {
                    selector.push_str(args.positional_at(*index, &self.template)?);
                }
                Segment::Named(name) => {
                    let value = args.named.get(name).ok_or_else(|| {
                        HarnessError::Configuration(format!(
                            "placeholder '{{{}}}' in locator template '{}' was not filled",
                            name, self.template
                        ))
                    })?;
                    selector.push_str(value);
                }
            }
        }

        Ok(ResolvedLocator {
            strategy: self.strategy,
            selector,
        })
    }
}

/// Values for a locator template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocatorArgs {
    positional: Vec<String>,
    named: BTreeMap<String, String>,
}

impl LocatorArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn positional<I, T>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            positional: values.into_iter().map(Into::into).collect(),
            named: BTreeMap::new(),
        }
    }

    pub fn named<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            positional: Vec::new(),
            named: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn arg(mut self, value: impl Into<String>) -> Self {
        self.positional.push(value.into());
        self
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.named.insert(name.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }

    fn positional_at(&self, index: usize, template: &str) -> Result<&str> {
        self.positional
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| {
                HarnessError::Configuration(format!(
                    "positional placeholder {} in locator template '{}' was not filled ({} value(s) supplied)",
                    index,
                    template,
                    self.positional.len()
                ))
            })
    }
}

/// A fully substituted locator, ready to query. Lives for one interaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedLocator {
    strategy: Strategy,
    selector: String,
}

impl ResolvedLocator {
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// Lowers the locator to the CSS or XPath query a session executes.
    pub fn query(&self) -> (QueryKind, String) {
        match self.strategy {
            Strategy::Xpath => (QueryKind::Xpath, self.selector.clone()),
            Strategy::Css | Strategy::TagName => (QueryKind::Css, self.selector.clone()),
            Strategy::Id => (QueryKind::Css, format!("[id={}]", css_string(&self.selector))),
            Strategy::Name => (
                QueryKind::Css,
                format!("[name={}]", css_string(&self.selector)),
            ),
            Strategy::ClassName => (
                QueryKind::Css,
                format!("[class~={}]", css_string(&self.selector)),
            ),
            Strategy::LinkText => (
                QueryKind::Xpath,
                format!("//a[normalize-space(.)={}]", xpath_literal(&self.selector)),
            ),
            Strategy::PartialLinkText => (
                QueryKind::Xpath,
                format!(
                    "//a[contains(normalize-space(.), {})]",
                    xpath_literal(&self.selector)
                ),
            ),
        }
    }
}

impl fmt::Display for ResolvedLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.strategy, self.selector)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Auto,
    Index(usize),
    Named(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlaceholderKind {
    Positional,
    Named,
}

fn parse_template(template: &str) -> Result<Vec<Segment>> {
    let malformed = |reason: &str| {
        HarnessError::Configuration(format!(
            "malformed locator template '{}': {}",
            template, reason
        ))
    };

    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                literal.push('{');
            }
            '{' => {
                let mut field = String::new();
                let mut closed = false;
                for f in chars.by_ref() {
                    if f == '}' {
                        closed = true;
                        break;
                    }
                    field.push(f);
                }
                if !closed {
                    return Err(malformed("unclosed '{'"));
                }
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(parse_field(&field).ok_or_else(|| {
                    malformed(&format!("unsupported placeholder '{{{}}}'", field))
                })?);
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                literal.push('}');
            }
            '}' => return Err(malformed("unmatched '}'")),
            other => literal.push(other),
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

fn parse_field(field: &str) -> Option<Segment> {
    if field.is_empty() {
        return Some(Segment::Auto);
    }
    if field.chars().all(|c| c.is_ascii_digit()) {
        return field.parse().ok().map(Segment::Index);
    }
    let mut chars = field.chars();
    let first = chars.next()?;
    if (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Some(Segment::Named(field.to_string()));
    }
    None
}

fn placeholder_kind(segments: &[Segment], template: &str) -> Result<Option<PlaceholderKind>> {
    let auto = segments.iter().any(|s| matches!(s, Segment::Auto));
    let indexed = segments.iter().any(|s| matches!(s, Segment::Index(_)));
    let named = segments.iter().any(|s| matches!(s, Segment::Named(_)));

    if auto && indexed {
        return Err(HarnessError::Configuration(format!(
            "locator template '{}' mixes automatic and manual field numbering",
            template
        )));
    }
    match (auto || indexed, named) {
        (true, true) => Err(HarnessError::Configuration(format!(
            "locator template '{}' mixes positional and named placeholders",
            template
        ))),
        (true, false) => Ok(Some(PlaceholderKind::Positional)),
        (false, true) => Ok(Some(PlaceholderKind::Named)),
        (false, false) => Ok(None),
    }
}

fn css_string(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        format!("'{}'", value)
    } else if !value.contains('"') {
        format!("\"{}\"", value)
    } else {
        let parts: Vec<String> = value.split('\'').map(|p| format!("'{}'", p)).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use super::Strategy;

    #[test]
    fn formats_automatic_positional_placeholders() {
        let descriptor = LocatorDescriptor::xpath("//nav//a[normalize-space()='{}']");
        let resolved = descriptor
            .format(&LocatorArgs::positional(["Modules"]))
            .unwrap();
        assert_eq!(resolved.selector(), "//nav//a[normalize-space()='Modules']");
        assert_eq!(resolved.strategy(), Strategy::Xpath);
    }

    #[test]
    fn formats_explicit_and_repeated_indexes() {
        let descriptor = LocatorDescriptor::xpath("//div[@id='{1}']//span[text()='{0}' or @title='{0}']");
        let resolved = descriptor
            .format(&LocatorArgs::new().arg("Bundle").arg("products"))
            .unwrap();
        assert_eq!(
            resolved.selector(),
            "//div[@id='products']//span[text()='Bundle' or @title='Bundle']"
        );
    }

    #[test]
    fn formats_named_placeholders() {
        let descriptor = LocatorDescriptor::css("section[data-module='{module}'] a.{kind}");
        let resolved = descriptor
            .format(&LocatorArgs::named([("module", "repertoire"), ("kind", "link")]))
            .unwrap();
        assert_eq!(resolved.selector(), "section[data-module='repertoire'] a.link");
    }

    #[test]
    fn escaped_braces_become_literals() {
        let descriptor = LocatorDescriptor::xpath("//p[text()='{{{}}}']");
        let resolved = descriptor.format(&LocatorArgs::positional(["x"])).unwrap();
        assert_eq!(resolved.selector(), "//p[text()='{x}']");
    }

    #[test]
    fn substituted_values_are_not_reparsed() {
        let descriptor = LocatorDescriptor::xpath("//a[text()='{}']");
        let resolved = descriptor.format(&LocatorArgs::positional(["{0}"])).unwrap();
        assert_eq!(resolved.selector(), "//a[text()='{0}']");
    }

    #[test]
    fn template_without_placeholders_ignores_arguments() {
        let descriptor = LocatorDescriptor::xpath("//h2[text()='Additional Features']");
        assert_eq!(
            descriptor.resolve().unwrap().selector(),
            "//h2[text()='Additional Features']"
        );
        assert!(descriptor.format(&LocatorArgs::positional(["unused"])).is_ok());
        assert!(!descriptor.needs_substitution().unwrap());
    }

    #[test]
    fn missing_values_are_a_configuration_error() {
        let descriptor = LocatorDescriptor::xpath("//a[text()='{}']");
        assert!(descriptor.needs_substitution().unwrap());
        let err = descriptor.resolve().unwrap_err();
        assert!(matches!(err, HarnessError::Configuration(_)), "{err}");
    }

    #[test]
    fn both_value_kinds_are_rejected() {
        let descriptor = LocatorDescriptor::xpath("//a[text()='{}']");
        let args = LocatorArgs::positional(["a"]).with("name", "b");
        assert!(matches!(
            descriptor.format(&args),
            Err(HarnessError::Configuration(_))
        ));
    }

    #[test]
    fn value_kind_must_match_placeholder_style() {
        let named = LocatorDescriptor::xpath("//a[text()='{label}']");
        assert!(matches!(
            named.format(&LocatorArgs::positional(["a"])),
            Err(HarnessError::Configuration(_))
        ));

        let positional = LocatorDescriptor::xpath("//a[text()='{}']");
        assert!(matches!(
            positional.format(&LocatorArgs::named([("label", "a")])),
            Err(HarnessError::Configuration(_))
        ));
    }

    #[test]
    fn unfilled_placeholders_are_reported() {
        let descriptor = LocatorDescriptor::xpath("//a[@id='{}' and text()='{}']");
        let err = descriptor
            .format(&LocatorArgs::positional(["only-one"]))
            .unwrap_err();
        assert!(err.to_string().contains("was not filled"), "{err}");

        let named = LocatorDescriptor::css("#{first} .{second}");
        let err = named
            .format(&LocatorArgs::named([("first", "a")]))
            .unwrap_err();
        assert!(err.to_string().contains("{second}"), "{err}");
    }

    #[test]
    fn malformed_templates_are_rejected() {
        for template in ["//a[text()='{']", "//a[text()='}']", "//a[{} and {0}]", "//a[{x} and {}]", "//a[{:>4}]"] {
            let descriptor = LocatorDescriptor::xpath(template);
            assert!(
                matches!(descriptor.resolve(), Err(HarnessError::Configuration(_))),
                "template {template} should be rejected"
            );
        }
    }

    #[test]
    fn deserializes_bare_strings_as_xpath() {
        let descriptor: LocatorDescriptor =
            serde_yaml::from_str("\"//div[@class='products']//li\"").unwrap();
        assert_eq!(descriptor.strategy(), Strategy::Xpath);
        assert_eq!(descriptor.template(), "//div[@class='products']//li");
    }

    #[test]
    fn deserializes_mappings_with_webdriver_spellings() {
        let yaml = "by: css selector\nvalue: \"ul.products > li\"\n";
        let descriptor: LocatorDescriptor = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(descriptor.strategy(), Strategy::Css);
        assert_eq!(descriptor.template(), "ul.products > li");

        let yaml = "strategy: link_text\ntemplate: \"{}\"\n";
        let descriptor: LocatorDescriptor = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(descriptor.strategy(), Strategy::LinkText);
    }

    #[test]
    fn malformed_template_fails_at_load() {
        let result: std::result::Result<LocatorDescriptor, _> =
            serde_yaml::from_str("strategy: xpath\ntemplate: \"//a[text()='{']\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn strategies_lower_to_css_or_xpath() {
        let id = LocatorDescriptor::new(Strategy::Id, "main").resolve().unwrap();
        assert_eq!(id.query(), (QueryKind::Css, "[id=\"main\"]".to_string()));

        let class = LocatorDescriptor::new(Strategy::ClassName, "nav-item")
            .resolve()
            .unwrap();
        assert_eq!(class.query(), (QueryKind::Css, "[class~=\"nav-item\"]".to_string()));

        let link = LocatorDescriptor::new(Strategy::LinkText, "{}")
            .format(&LocatorArgs::positional(["Cue Sheet / AV Work"]))
            .unwrap();
        assert_eq!(
            link.query(),
            (
                QueryKind::Xpath,
                "//a[normalize-space(.)='Cue Sheet / AV Work']".to_string()
            )
        );
    }

    #[test]
    fn xpath_literals_survive_mixed_quotes() {
        assert_eq!(xpath_literal("plain"), "'plain'");
        assert_eq!(xpath_literal("it's"), "\"it's\"");
        assert_eq!(
            xpath_literal("a'b\"c"),
            "concat('a', \"'\", 'b\"c')"
        );
    }

    #[test]
    fn displays_strategy_and_selector() {
        let resolved = LocatorDescriptor::css("h1.title").resolve().unwrap();
        assert_eq!(resolved.to_string(), "css=h1.title");
    }

    proptest! {
        #[test]
        fn formatting_fills_every_placeholder(
            pieces in proptest::collection::vec("[a-z/@=\\[\\]' ]{0,8}", 1..6),
            values in proptest::collection::vec("[A-Za-z0-9 /]{0,10}", 6),
        ) {
            let template = pieces.join("{}");
            let placeholders = pieces.len() - 1;
            let descriptor = LocatorDescriptor::xpath(template);
            let args = LocatorArgs::positional(values.iter().take(placeholders).cloned());

            let resolved = descriptor.format(&args).unwrap();
            prop_assert!(!resolved.selector().contains('{'), "selector contains '{{'");
            prop_assert!(!resolved.selector().contains('}'), "selector contains '}}'");
            for value in values.iter().take(placeholders) {
                prop_assert!(resolved.selector().contains(value.as_str()));
            }
        }

        #[test]
        fn formatting_without_values_fails_when_substitution_is_needed(
            prefix in "[a-z/]{0,8}",
            suffix in "[a-z/]{0,8}",
        ) {
            let descriptor = LocatorDescriptor::xpath(format!("{}{{}}{}", prefix, suffix));
            prop_assert!(matches!(
                descriptor.format(&LocatorArgs::new()),
                Err(HarnessError::Configuration(_))
            ));
        }
    }
}

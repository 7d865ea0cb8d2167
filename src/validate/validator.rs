use std::collections::HashSet;

use strum::EnumString;
use thiserror::Error;
use url::Url;

use crate::domain::models::SubmissionRequest;
use crate::validate::config::Config;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("cannot parse request body")]
    MalformedBody,
    #[error("invalid URL")]
    InvalidUrl,
    #[error("URL targets a reserved domain")]
    SelfReferential,
}

#[derive(EnumString, Debug, Clone, Copy, PartialEq, Eq)]
#[strum(ascii_case_insensitive)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn name(self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

/// Syntax predicate over the raw URL string.
pub trait UrlSyntax {
    fn is_valid(&self, raw: &str) -> bool;
}

/// Policy predicate deciding whether a URL points back at this service.
pub trait DomainPolicy {
    fn is_reserved(&self, raw: &str) -> bool;
}

/// Accepts absolute URLs and schemeless host/path forms, as long as a host
/// is present once a scheme is assumed.
pub struct StandardSyntax;

impl UrlSyntax for StandardSyntax {
    fn is_valid(&self, raw: &str) -> bool {
        let candidate = raw.trim();
        if candidate.is_empty() || candidate.contains(char::is_whitespace) {
            return false;
        }
        match parse_lenient(candidate) {
            Some(parsed) => parsed.host_str().is_some_and(|h| !h.is_empty()),
            None => false,
        }
    }
}

/// Reserved-domain set compared against the URL's host, ignoring scheme,
/// a leading `www.`, port, and case.
pub struct ReservedDomains {
    hosts: HashSet<String>,
}

impl ReservedDomains {
    pub fn new<I>(domains: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let hosts = domains
            .into_iter()
            .filter_map(|d| host_of(d.as_ref()))
            .collect();
        Self { hosts }
    }

    pub fn from_csv(csv: &str) -> Self {
        Self::new(csv.split(',').map(str::trim).filter(|s| !s.is_empty()))
    }
}

impl DomainPolicy for ReservedDomains {
    fn is_reserved(&self, raw: &str) -> bool {
        match host_of(raw) {
            Some(host) => self.hosts.contains(&host),
            None => false,
        }
    }
}

/// Parse an absolute URL, retrying schemeless and scheme-relative input with
/// an assumed http prefix. `example.com:8080/page` parses "successfully" as
/// scheme `example.com` with no host, so a hostless parse retries too.
fn parse_lenient(raw: &str) -> Option<Url> {
    match Url::parse(raw) {
        Ok(parsed) if has_host(&parsed) => return Some(parsed),
        Ok(_) | Err(url::ParseError::RelativeUrlWithoutBase) => {}
        Err(_) => return None,
    }
    Url::parse(&format!("http://{}", raw.trim_start_matches('/'))).ok()
}

fn has_host(parsed: &Url) -> bool {
    parsed.host_str().is_some_and(|h| !h.is_empty())
}

fn host_of(raw: &str) -> Option<String> {
    let parsed = parse_lenient(raw.trim())?;
    let host = parsed.host_str()?;
    Some(host.trim_start_matches("www.").to_ascii_lowercase())
}

/// Short-circuiting validation gates for a link submission: parse, syntax
/// check, domain exclusion, scheme normalization. Stateless; safe to share
/// across requests.
pub struct Validator<S = StandardSyntax, D = ReservedDomains> {
    syntax: S,
    domains: D,
    default_scheme: Scheme,
}

impl Validator<StandardSyntax, ReservedDomains> {
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            StandardSyntax,
            ReservedDomains::from_csv(&config.reserved_domains),
            config.default_scheme,
        )
    }
}

impl<S: UrlSyntax, D: DomainPolicy> Validator<S, D> {
    pub fn new(syntax: S, domains: D, default_scheme: Scheme) -> Self {
        Validator {
            syntax,
            domains,
            default_scheme,
        }
    }

    /// Run every gate against a raw request body.
    pub fn validate_body(&self, body: &[u8]) -> Result<SubmissionRequest, ValidationError> {
        let request: SubmissionRequest =
            serde_json::from_slice(body).map_err(|_| ValidationError::MalformedBody)?;
        self.validate(request)
    }

    /// Run the syntax, domain-exclusion, and normalization gates. The first
    /// failing gate wins; normalization itself cannot fail.
    pub fn validate(
        &self,
        mut request: SubmissionRequest,
    ) -> Result<SubmissionRequest, ValidationError> {
        if !self.syntax.is_valid(&request.url) {
            return Err(ValidationError::InvalidUrl);
        }
        if self.domains.is_reserved(&request.url) {
            return Err(ValidationError::SelfReferential);
        }
        request.url = self.enforce_scheme(&request.url);
        Ok(request)
    }

    /// Prefix the default scheme when the URL has none. Idempotent; already
    /// schemed URLs pass through untouched. A parse without a host does not
    /// count as schemed, so `example.com:8080/page` gets the prefix.
    fn enforce_scheme(&self, raw: &str) -> String {
        if Url::parse(raw).is_ok_and(|parsed| has_host(&parsed)) {
            return raw.to_string();
        }
        let rest = raw.strip_prefix("//").unwrap_or(raw);
        format!("{}://{}", self.default_scheme.name(), rest)
    }
}

use crate::validate::validator::Scheme;
use envconfig::Envconfig;

#[derive(Envconfig, Debug, Clone)]
pub struct Config {
    /// Comma-separated list of hosts this service answers on. URLs pointing
    /// at any of them are rejected to keep short links from chaining into
    /// the service itself.
    #[envconfig(from = "RESERVED_DOMAINS", default = "localhost")]
    pub reserved_domains: String,

    #[envconfig(from = "DEFAULT_SCHEME", default = "http")]
    pub default_scheme: Scheme,
}

use envconfig::Envconfig;

#[derive(Envconfig, Debug, Clone)]
pub struct Config {
    /// Public base under which short links are served; prefixed to the short
    /// code in shorten responses.
    #[envconfig(from = "BASE_URL", default = "http://localhost:8080")]
    pub base_url: String,

    #[envconfig(from = "PORT", default = "8080")]
    pub port: u16,

    /// Applied when a submission carries no expiry of its own.
    #[envconfig(from = "DEFAULT_EXPIRY_SECS", default = "86400")]
    pub default_expiry_secs: u64,
}

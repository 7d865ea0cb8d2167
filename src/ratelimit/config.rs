use envconfig::Envconfig;

#[derive(Envconfig, Debug, Clone)]
pub struct Config {
    #[envconfig(from = "API_QUOTA", default = "10")]
    pub max_requests: u32,

    #[envconfig(from = "RATE_LIMIT_WINDOW_SECS", default = "1800")]
    pub window_secs: u64,
}

pub mod logger;

use crate::{config::logger::LoggerConfig, handler, ratelimit, validate};
use envconfig::Envconfig;

#[derive(Envconfig, Debug)]
pub struct Config {
    #[envconfig(nested)]
    pub handler: handler::config::Config,
    #[envconfig(nested)]
    pub validate: validate::config::Config,
    #[envconfig(nested)]
    pub rate_limit: ratelimit::config::Config,
    #[envconfig(nested)]
    pub logger: LoggerConfig,
}

pub fn load() -> Result<Config, envconfig::Error> {
    Config::init_from_env()
}
